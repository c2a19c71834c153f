//! Per-year environmental layers.

use super::grid::{RasterError, RasterGrid};

/// The four layers for one year as delivered by a raster source, before any transform.
#[derive(Debug, Clone)]
pub struct RawLayers {
    /// Sea-surface temperature (°C).
    pub sst: RasterGrid,
    /// Mixed-layer depth (m).
    pub mld: RasterGrid,
    /// Depth-integrated zooplankton, top 200 m.
    pub zoo: RasterGrid,
    /// Near-surface chlorophyll, linear units (must be strictly positive where defined).
    pub chla_surface: RasterGrid,
}

/// Environmental covariates for a single year, all on one grid.
///
/// `chla_surface` holds the natural log of the source chlorophyll.
#[derive(Debug, Clone)]
pub struct EnvironmentalSnapshot {
    pub year: i32,
    pub sst: RasterGrid,
    pub mld: RasterGrid,
    pub zoo: RasterGrid,
    pub chla_surface: RasterGrid,
}

impl EnvironmentalSnapshot {
    /// Checks co-registration and log-transforms chlorophyll.
    ///
    /// No-data cells (`NaN`) stay no-data. Any other chlorophyll value that is
    /// zero or negative is rejected before it can become `-inf`/`NaN`.
    /// A cell missing from any layer is set to no-data in all four, so every
    /// sampled cell carries a value for every covariate.
    pub fn from_raw(year: i32, layers: RawLayers) -> Result<Self, RasterError> {
        let RawLayers {
            sst,
            mld,
            zoo,
            chla_surface,
        } = layers;

        sst.ensure_aligned("sst", &mld, "mld")?;
        sst.ensure_aligned("sst", &zoo, "zoo_200")?;
        sst.ensure_aligned("sst", &chla_surface, "chla_surface")?;

        let chla_surface = log_chlorophyll(&chla_surface)?;

        let layers = [&sst, &mld, &zoo, &chla_surface];
        let valid: Vec<bool> = (0..sst.values().len())
            .map(|i| layers.iter().all(|g| !g.values()[i].is_nan()))
            .collect();
        if valid.iter().all(|&ok| ok) {
            return Ok(Self {
                year,
                sst,
                mld,
                zoo,
                chla_surface,
            });
        }

        Ok(Self {
            year,
            sst: sst.masked(&valid),
            mld: mld.masked(&valid),
            zoo: zoo.masked(&valid),
            chla_surface: chla_surface.masked(&valid),
        })
    }
}

fn log_chlorophyll(chla: &RasterGrid) -> Result<RasterGrid, RasterError> {
    if let Some((i, &value)) = chla
        .values()
        .iter()
        .enumerate()
        .find(|(_, v)| !v.is_nan() && **v <= 0.0)
    {
        let (row, col) = chla.geometry().row_col(i);
        return Err(RasterError::NonPositiveChlorophyll { row, col, value });
    }
    Ok(chla.map(f64::ln))
}
