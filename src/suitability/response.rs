//! Response curves mapping a covariate value to a suitability contribution.

use serde::{Deserialize, Serialize};

use crate::raster::RasterGrid;

use super::model::SuitabilityError;

/// Normal probability density.
pub fn normal_pdf(x: f64, mean: f64, sd: f64) -> f64 {
    let z = (x - mean) / sd;
    (-0.5 * z * z).exp() / (sd * (2.0 * std::f64::consts::PI).sqrt())
}

/// Logistic curve `1 / (1 + exp((x - beta) / alpha))`.
///
/// A negative `alpha` makes the curve increase with `x`.
pub fn logistic(x: f64, alpha: f64, beta: f64) -> f64 {
    1.0 / (1.0 + ((x - beta) / alpha).exp())
}

/// How one covariate contributes to a species' suitability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResponseCurve {
    /// Normal density with its optimum at `mean`.
    Gaussian { mean: f64, sd: f64 },
    /// Logistic with slope `alpha` and midpoint `beta`.
    Logistic { alpha: f64, beta: f64 },
}

impl ResponseCurve {
    pub fn gaussian(mean: f64, sd: f64) -> Self {
        Self::Gaussian { mean, sd }
    }

    pub fn logistic(alpha: f64, beta: f64) -> Self {
        Self::Logistic { alpha, beta }
    }

    /// Rejects parameters that cannot produce a finite curve.
    pub fn validate(&self) -> Result<(), SuitabilityError> {
        match *self {
            ResponseCurve::Gaussian { mean, sd } => {
                if !mean.is_finite() || !sd.is_finite() || sd <= 0.0 {
                    return Err(SuitabilityError::InvalidCurve(format!(
                        "gaussian needs finite mean and sd > 0, got mean={}, sd={}",
                        mean, sd
                    )));
                }
            }
            ResponseCurve::Logistic { alpha, beta } => {
                if !alpha.is_finite() || !beta.is_finite() || alpha == 0.0 {
                    return Err(SuitabilityError::InvalidCurve(format!(
                        "logistic needs finite beta and non-zero alpha, got alpha={}, beta={}",
                        alpha, beta
                    )));
                }
            }
        }
        Ok(())
    }

    /// Contribution at a single covariate value.
    pub fn evaluate(&self, x: f64) -> f64 {
        match *self {
            ResponseCurve::Gaussian { mean, sd } => normal_pdf(x, mean, sd),
            ResponseCurve::Logistic { alpha, beta } => logistic(x, alpha, beta),
        }
    }

    /// Contribution grid for a covariate grid.
    pub fn apply(&self, grid: &RasterGrid) -> RasterGrid {
        let curve = *self;
        grid.map(move |x| curve.evaluate(x))
    }

    /// The largest contribution this curve is taken to reach on `grid`.
    ///
    /// Gaussian: the density at its own mean, independent of the data.
    /// Logistic: the curve at the grid's observed maximum, since it has no
    /// finite optimum.
    pub fn reference_value(&self, grid: &RasterGrid) -> Result<f64, SuitabilityError> {
        match *self {
            ResponseCurve::Gaussian { mean, .. } => Ok(self.evaluate(mean)),
            ResponseCurve::Logistic { .. } => {
                let max = grid.max_valid().ok_or(SuitabilityError::NoValidCells)?;
                Ok(self.evaluate(max))
            }
        }
    }
}
