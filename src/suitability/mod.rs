//! Habitat suitability: response curves, the multiplicative suitability model,
//! and prey-to-predator trophic coupling.

mod config;
mod model;
mod response;
mod trophic;

pub use config::{PredatorParameters, PreyParameters, SpeciesConfig};
pub use model::{Covariate, SuitabilityError, SuitabilityModel, SuitabilitySurface};
pub use response::{logistic, normal_pdf, ResponseCurve};
pub use trophic::{build_trophic_surfaces, predator_suitability, prey_suitability, TrophicSurfaces};
