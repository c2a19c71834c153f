//! Suitability to a stochastic presence/absence realization.

use rand::Rng;

use crate::raster::{GridGeometry, RasterError, RasterGrid};
use crate::suitability::logistic;

use super::config::PresenceConfig;

/// Cell value for an absence.
pub const ABSENT: u8 = 0;
/// Cell value for a presence.
pub const PRESENT: u8 = 1;
/// Cell value for a no-data cell (never sampled).
pub const NO_DATA: u8 = u8::MAX;

/// One binary realization of where the species occurs.
#[derive(Debug, Clone, PartialEq)]
pub struct PresenceAbsenceField {
    geometry: GridGeometry,
    cells: Vec<u8>,
}

impl PresenceAbsenceField {
    /// Wraps row-major cells holding [`ABSENT`], [`PRESENT`] or [`NO_DATA`].
    ///
    /// The cell count must match the geometry.
    pub fn from_cells(geometry: GridGeometry, cells: Vec<u8>) -> Result<Self, RasterError> {
        geometry.validate()?;
        if cells.len() != geometry.len() {
            return Err(RasterError::CellCount {
                name: "presence_absence".to_string(),
                expected: geometry.len(),
                found: cells.len(),
            });
        }
        Ok(Self { geometry, cells })
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    /// `Some(true)` for presence, `Some(false)` for absence, `None` for no-data.
    pub fn get(&self, row: usize, col: usize) -> Option<bool> {
        self.at_index(self.geometry.index(row, col))
    }

    pub fn at_index(&self, index: usize) -> Option<bool> {
        match self.cells[index] {
            PRESENT => Some(true),
            ABSENT => Some(false),
            _ => None,
        }
    }

    /// Row-major indices of presence cells.
    pub fn presence_cells(&self) -> Vec<usize> {
        self.indices_of(PRESENT)
    }

    /// Row-major indices of absence cells.
    pub fn absence_cells(&self) -> Vec<usize> {
        self.indices_of(ABSENT)
    }

    fn indices_of(&self, value: u8) -> Vec<usize> {
        self.cells
            .iter()
            .enumerate()
            .filter(|&(_, c)| *c == value)
            .map(|(i, _)| i)
            .collect()
    }

    /// Fraction of valid cells that are presences, or `None` when no cell is valid.
    pub fn prevalence(&self) -> Option<f64> {
        let present = self.cells.iter().filter(|&&c| c == PRESENT).count();
        let absent = self.cells.iter().filter(|&&c| c == ABSENT).count();
        let valid = present + absent;
        (valid > 0).then(|| present as f64 / valid as f64)
    }
}

/// Per-cell probability of presence.
pub fn presence_probability(suitability: &RasterGrid, config: &PresenceConfig) -> RasterGrid {
    let (alpha, beta) = (config.alpha, config.beta);
    suitability.map(move |s| logistic(s, alpha, beta))
}

/// Draws one Bernoulli realization per cell.
///
/// Cells are visited in row-major order, one uniform draw per valid cell, so
/// the result depends only on the grid and the generator state. No target
/// prevalence is imposed here.
pub fn convert_to_presence_absence<R: Rng>(
    suitability: &RasterGrid,
    config: &PresenceConfig,
    rng: &mut R,
) -> PresenceAbsenceField {
    let probability = presence_probability(suitability, config);

    let cells = probability
        .values()
        .iter()
        .map(|&p| {
            if p.is_nan() {
                NO_DATA
            } else if rng.random::<f64>() < p {
                PRESENT
            } else {
                ABSENT
            }
        })
        .collect();

    PresenceAbsenceField {
        geometry: *suitability.geometry(),
        cells,
    }
}
