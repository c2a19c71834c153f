//! Georeferenced scalar grids.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while building, aligning, or loading raster grids.
#[derive(Error, Debug)]
pub enum RasterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid grid geometry: {0}")]
    InvalidGeometry(String),
    #[error("Grid '{name}' holds {found} cells, expected {expected}")]
    CellCount {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("Grid '{name}' is not co-registered with '{reference}'")]
    Misaligned { name: String, reference: String },
    #[error("Chlorophyll must be strictly positive before log transform: found {value} at row {row}, col {col}")]
    NonPositiveChlorophyll { row: usize, col: usize, value: f64 },
    #[error("Layer folder '{0}' does not exist")]
    MissingFolder(String),
    #[error("Layer folder '{folder}' holds {found} raster files, expected {expected}")]
    FileCount {
        folder: String,
        expected: usize,
        found: usize,
    },
    #[error("No raster available for year {0}")]
    MissingYear(i32),
}

/// Spatial extent and resolution shared by every grid of a run.
///
/// Row 0 is the northernmost row; column 0 is the westernmost column.
/// Coordinates are decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    pub rows: usize,
    pub cols: usize,
    /// Longitude of the western edge of column 0.
    pub west: f64,
    /// Latitude of the northern edge of row 0.
    pub north: f64,
    /// Cell width in degrees of longitude.
    pub cell_width: f64,
    /// Cell height in degrees of latitude.
    pub cell_height: f64,
}

impl Default for GridGeometry {
    fn default() -> Self {
        // 0.1 degree California Current domain (downscaled ROMS extent).
        Self {
            rows: 181,
            cols: 186,
            west: -134.0,
            north: 48.0,
            cell_width: 0.1,
            cell_height: 0.1,
        }
    }
}

impl GridGeometry {
    /// Creates a geometry, rejecting empty or non-finite layouts.
    pub fn new(
        rows: usize,
        cols: usize,
        west: f64,
        north: f64,
        cell_width: f64,
        cell_height: f64,
    ) -> Result<Self, RasterError> {
        let geometry = Self {
            rows,
            cols,
            west,
            north,
            cell_width,
            cell_height,
        };
        geometry.validate()?;
        Ok(geometry)
    }

    pub fn validate(&self) -> Result<(), RasterError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(RasterError::InvalidGeometry(format!(
                "grid must have at least one cell, got {}x{}",
                self.rows, self.cols
            )));
        }
        if !self.west.is_finite() || !self.north.is_finite() {
            return Err(RasterError::InvalidGeometry(
                "grid origin must be finite".to_string(),
            ));
        }
        if !(self.cell_width > 0.0 && self.cell_height > 0.0)
            || !self.cell_width.is_finite()
            || !self.cell_height.is_finite()
        {
            return Err(RasterError::InvalidGeometry(format!(
                "cell size must be positive, got {}x{}",
                self.cell_width, self.cell_height
            )));
        }
        Ok(())
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row-major index of `(row, col)`.
    pub fn index(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    /// Inverse of [`GridGeometry::index`].
    pub fn row_col(&self, index: usize) -> (usize, usize) {
        (index / self.cols, index % self.cols)
    }

    /// Returns `(longitude, latitude)` of the center of a cell.
    pub fn cell_center(&self, row: usize, col: usize) -> (f64, f64) {
        let lon = self.west + (col as f64 + 0.5) * self.cell_width;
        let lat = self.north - (row as f64 + 0.5) * self.cell_height;
        (lon, lat)
    }

    /// True when both geometries describe the same extent, resolution, and layout.
    pub fn is_aligned_with(&self, other: &GridGeometry) -> bool {
        fn close(a: f64, b: f64) -> bool {
            (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
        }

        self.rows == other.rows
            && self.cols == other.cols
            && close(self.west, other.west)
            && close(self.north, other.north)
            && close(self.cell_width, other.cell_width)
            && close(self.cell_height, other.cell_height)
    }
}

/// A 2D grid of scalar cell values stored in row-major order.
///
/// `NaN` marks a no-data cell (land, or outside the model domain). No-data
/// propagates through cell arithmetic and is skipped by [`RasterGrid::max_valid`].
#[derive(Debug, Clone, PartialEq)]
pub struct RasterGrid {
    geometry: GridGeometry,
    values: Vec<f64>,
}

impl RasterGrid {
    /// Wraps row-major `values`; the length must match the geometry.
    pub fn new(geometry: GridGeometry, values: Vec<f64>) -> Result<Self, RasterError> {
        geometry.validate()?;
        if values.len() != geometry.len() {
            return Err(RasterError::CellCount {
                name: "grid".to_string(),
                expected: geometry.len(),
                found: values.len(),
            });
        }
        Ok(Self { geometry, values })
    }

    /// Creates a grid with every cell set to `value`.
    pub fn filled(geometry: GridGeometry, value: f64) -> Self {
        Self {
            values: vec![value; geometry.len()],
            geometry,
        }
    }

    /// Creates a grid by evaluating `f(row, col)` for every cell.
    pub fn from_fn<F>(geometry: GridGeometry, f: F) -> Self
    where
        F: Fn(usize, usize) -> f64,
    {
        let values = (0..geometry.len())
            .map(|i| {
                let (row, col) = geometry.row_col(i);
                f(row, col)
            })
            .collect();
        Self { geometry, values }
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.geometry.rows, self.geometry.cols)
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[self.geometry.index(row, col)]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        let i = self.geometry.index(row, col);
        self.values[i] = value;
    }

    /// Applies `f` to every cell, producing a grid on the same geometry.
    pub fn map<F>(&self, f: F) -> RasterGrid
    where
        F: Fn(f64) -> f64 + Sync + Send,
    {
        let values = self.values.par_iter().map(|&v| f(v)).collect();
        RasterGrid {
            geometry: self.geometry,
            values,
        }
    }

    /// Copy with every cell whose `valid` flag is false set to no-data.
    pub fn masked(&self, valid: &[bool]) -> RasterGrid {
        assert_eq!(self.values.len(), valid.len());
        let values = self
            .values
            .iter()
            .zip(valid)
            .map(|(&v, &ok)| if ok { v } else { f64::NAN })
            .collect();
        RasterGrid {
            geometry: self.geometry,
            values,
        }
    }

    /// Multiplies two co-registered grids cell by cell.
    ///
    /// Callers check alignment first; mismatched lengths are a logic error.
    pub fn product(&self, other: &RasterGrid) -> RasterGrid {
        assert_eq!(self.values.len(), other.values.len());
        let values = self
            .values
            .par_iter()
            .zip(other.values.par_iter())
            .map(|(&a, &b)| a * b)
            .collect();
        RasterGrid {
            geometry: self.geometry,
            values,
        }
    }

    /// Largest non-NaN cell value, or `None` if every cell is no-data.
    pub fn max_valid(&self) -> Option<f64> {
        self.values
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))))
    }

    /// Smallest non-NaN cell value, or `None` if every cell is no-data.
    pub fn min_valid(&self) -> Option<f64> {
        self.values
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.min(v))))
    }

    /// Number of cells holding data.
    pub fn valid_count(&self) -> usize {
        self.values.iter().filter(|v| !v.is_nan()).count()
    }

    /// Fails with [`RasterError::Misaligned`] unless `other` shares this grid's geometry.
    pub fn ensure_aligned(
        &self,
        name: &str,
        other: &RasterGrid,
        other_name: &str,
    ) -> Result<(), RasterError> {
        if self.geometry.is_aligned_with(&other.geometry) {
            Ok(())
        } else {
            Err(RasterError::Misaligned {
                name: other_name.to_string(),
                reference: name.to_string(),
            })
        }
    }
}
