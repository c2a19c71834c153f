//! Prey-then-predator suitability for one year.
//!
//! The predator model takes the prey's rescaled surface as a covariate, so the
//! prey surface is finished (built and rescaled) before the predator starts.
//! Prey suitability never depends on the predator.

use crate::raster::EnvironmentalSnapshot;

use super::config::{PredatorParameters, PreyParameters, SpeciesConfig};
use super::model::{SuitabilityError, SuitabilityModel, SuitabilitySurface};

/// Prey and predator surfaces for one year.
#[derive(Debug, Clone)]
pub struct TrophicSurfaces {
    pub prey: SuitabilitySurface,
    pub predator: SuitabilitySurface,
}

/// Prey suitability from sea-surface temperature and zooplankton.
pub fn prey_suitability(
    snapshot: &EnvironmentalSnapshot,
    params: &PreyParameters,
) -> Result<SuitabilitySurface, SuitabilityError> {
    SuitabilityModel::new()
        .with_covariate("sst", &snapshot.sst, params.sst)
        .with_covariate("zoo_200", &snapshot.zoo, params.zoo)
        .build()
}

/// Predator suitability from temperature, mixed-layer depth, and the prey surface.
pub fn predator_suitability(
    snapshot: &EnvironmentalSnapshot,
    prey: &SuitabilitySurface,
    params: &PredatorParameters,
) -> Result<SuitabilitySurface, SuitabilityError> {
    SuitabilityModel::new()
        .with_covariate("sst", &snapshot.sst, params.sst)
        .with_covariate("mld", &snapshot.mld, params.mld)
        .with_covariate("prey_suitability", prey.grid(), params.prey)
        .build()
}

/// Builds both surfaces in dependency order.
pub fn build_trophic_surfaces(
    snapshot: &EnvironmentalSnapshot,
    species: &SpeciesConfig,
) -> Result<TrophicSurfaces, SuitabilityError> {
    let prey = prey_suitability(snapshot, &species.prey)?;
    let predator = predator_suitability(snapshot, &prey, &species.predator)?;
    Ok(TrophicSurfaces { prey, predator })
}
