//! Joint suitability from several covariates, with reference-maximum rescaling.

use thiserror::Error;

use crate::raster::RasterGrid;

use super::response::ResponseCurve;

/// Errors raised while building a suitability surface.
#[derive(Error, Debug)]
pub enum SuitabilityError {
    #[error("Invalid response curve: {0}")]
    InvalidCurve(String),
    #[error("Suitability model has no covariates")]
    NoCovariates,
    #[error("Covariate '{covariate}' is {found:?} but '{reference}' is {expected:?} (or extents differ)")]
    ShapeMismatch {
        covariate: String,
        reference: String,
        expected: (usize, usize),
        found: (usize, usize),
    },
    #[error("Covariate grid has no valid cells to take a maximum from")]
    NoValidCells,
    #[error("Reference maximum must be finite and positive, got {0}")]
    DegenerateReference(f64),
}

/// One environmental layer paired with the curve that scores it.
#[derive(Debug, Clone, Copy)]
pub struct Covariate<'a> {
    pub name: &'a str,
    pub grid: &'a RasterGrid,
    pub curve: ResponseCurve,
}

/// Rescaled suitability for one species and year.
#[derive(Debug, Clone, PartialEq)]
pub struct SuitabilitySurface {
    grid: RasterGrid,
    reference_max: f64,
}

impl SuitabilitySurface {
    pub fn grid(&self) -> &RasterGrid {
        &self.grid
    }

    /// The product of per-covariate maxima the joint grid was divided by.
    pub fn reference_max(&self) -> f64 {
        self.reference_max
    }

    pub fn into_grid(self) -> RasterGrid {
        self.grid
    }
}

/// Multiplicative habitat model over co-registered covariates.
///
/// Covariates are treated as independent: the joint score is the cell-wise
/// product of every contribution grid. [`SuitabilityModel::build`] divides
/// that product by the reference maximum so 1.0 marks the joint optimum.
#[derive(Debug, Clone, Default)]
pub struct SuitabilityModel<'a> {
    covariates: Vec<Covariate<'a>>,
}

impl<'a> SuitabilityModel<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a covariate.
    pub fn with_covariate(mut self, name: &'a str, grid: &'a RasterGrid, curve: ResponseCurve) -> Self {
        self.covariates.push(Covariate { name, grid, curve });
        self
    }

    pub fn covariates(&self) -> &[Covariate<'a>] {
        &self.covariates
    }

    /// Validates curves and co-registration before any cell is touched.
    fn check(&self) -> Result<&Covariate<'a>, SuitabilityError> {
        let first = self.covariates.first().ok_or(SuitabilityError::NoCovariates)?;

        for cov in &self.covariates {
            cov.curve.validate()?;
            if !first.grid.geometry().is_aligned_with(cov.grid.geometry()) {
                return Err(SuitabilityError::ShapeMismatch {
                    covariate: cov.name.to_string(),
                    reference: first.name.to_string(),
                    expected: first.grid.shape(),
                    found: cov.grid.shape(),
                });
            }
        }

        Ok(first)
    }

    /// One contribution grid per covariate, in insertion order.
    pub fn contributions(&self) -> Result<Vec<RasterGrid>, SuitabilityError> {
        self.check()?;
        Ok(self
            .covariates
            .iter()
            .map(|c| c.curve.apply(c.grid))
            .collect())
    }

    /// Cell-wise product of all contributions, not yet rescaled.
    pub fn joint(&self) -> Result<RasterGrid, SuitabilityError> {
        let first = self.check()?;
        let joint = self
            .covariates
            .iter()
            .map(|c| c.curve.apply(c.grid))
            .fold(RasterGrid::filled(*first.grid.geometry(), 1.0), |acc, g| {
                acc.product(&g)
            });
        Ok(joint)
    }

    /// Product of each covariate's reference value on its current grid.
    pub fn reference_max(&self) -> Result<f64, SuitabilityError> {
        self.check()?;
        let mut reference = 1.0;
        for cov in &self.covariates {
            reference *= cov.curve.reference_value(cov.grid)?;
        }
        if !reference.is_finite() || reference <= 0.0 {
            return Err(SuitabilityError::DegenerateReference(reference));
        }
        Ok(reference)
    }

    /// Joint suitability divided by the reference maximum.
    ///
    /// Cells may exceed 1.0 where a logistic covariate's observed maximum
    /// sits below its value elsewhere; they are left unclipped.
    pub fn build(&self) -> Result<SuitabilitySurface, SuitabilityError> {
        let reference_max = self.reference_max()?;
        let joint = self.joint()?;
        Ok(SuitabilitySurface {
            grid: joint.map(move |v| v / reference_max),
            reference_max,
        })
    }
}
