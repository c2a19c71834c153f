//! Species response-curve parameters.

use serde::{Deserialize, Serialize};

use super::model::SuitabilityError;
use super::response::ResponseCurve;

/// Prey proxy species: scored on temperature and zooplankton.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreyParameters {
    pub sst: ResponseCurve,
    pub zoo: ResponseCurve,
}

impl Default for PreyParameters {
    fn default() -> Self {
        Self {
            sst: ResponseCurve::gaussian(15.0, 5.0),
            zoo: ResponseCurve::logistic(-6.0, 50.0),
        }
    }
}

/// Top predator: scored on temperature, mixed-layer depth, and prey suitability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredatorParameters {
    pub sst: ResponseCurve,
    pub mld: ResponseCurve,
    /// Curve applied to the prey's rescaled suitability surface.
    pub prey: ResponseCurve,
}

impl Default for PredatorParameters {
    fn default() -> Self {
        Self {
            sst: ResponseCurve::gaussian(15.0, 4.0),
            mld: ResponseCurve::gaussian(50.0, 25.0),
            prey: ResponseCurve::logistic(-0.05, 0.5),
        }
    }
}

/// Response curves for both species of the trophic pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpeciesConfig {
    pub prey: PreyParameters,
    pub predator: PredatorParameters,
}

impl SpeciesConfig {
    pub fn validate(&self) -> Result<(), SuitabilityError> {
        self.prey.sst.validate()?;
        self.prey.zoo.validate()?;
        self.predator.sst.validate()?;
        self.predator.mld.validate()?;
        self.predator.prey.validate()?;
        Ok(())
    }
}
