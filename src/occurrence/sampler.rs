//! Stratified sampling of occurrence points from a presence/absence field.
//!
//! A year's sample always holds exactly `samples_per_year` points. When a
//! stratum cannot supply its target, the shortfall is handled as follows and
//! recorded in the [`SamplingReport`]:
//!
//! - a non-empty stratum smaller than its target contributes every cell once,
//!   then tops up by drawing from itself with replacement;
//! - an empty stratum hands its whole target to the other stratum;
//! - a field with no valid cells at all is an error.

use rand::seq::{index, SliceRandom};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::config::SamplingConfig;
use super::presence::PresenceAbsenceField;

/// Errors raised by the occurrence sampler.
#[derive(Error, Debug)]
pub enum SamplingError {
    #[error("Invalid sampling configuration: {0}")]
    InvalidConfig(String),
    #[error("Presence/absence field has no valid cells to sample")]
    NoValidCells,
}

/// Presence or absence cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stratum {
    Presence,
    Absence,
}

/// A departure from plain without-replacement sampling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum Fallback {
    /// The stratum had `available` cells for `requested` draws; the rest were
    /// drawn with replacement.
    WithReplacement {
        stratum: Stratum,
        available: usize,
        requested: usize,
    },
    /// `stratum` was empty, so its `count` draws were taken from `from`.
    Borrowed {
        stratum: Stratum,
        from: Stratum,
        count: usize,
    },
}

/// What one year's sampling asked for and what it did.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SamplingReport {
    pub requested_presences: usize,
    pub requested_absences: usize,
    pub presence_cells: usize,
    pub absence_cells: usize,
    /// Sampled points whose cell is a presence.
    pub sampled_presences: usize,
    /// Sampled points whose cell is an absence.
    pub sampled_absences: usize,
    pub fallbacks: Vec<Fallback>,
}

impl SamplingReport {
    pub fn used_fallback(&self) -> bool {
        !self.fallbacks.is_empty()
    }
}

/// A sampled grid cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePoint {
    pub row: usize,
    pub col: usize,
    /// Cell-center longitude, rounded to one decimal.
    pub lon: f64,
    /// Cell-center latitude, rounded to one decimal.
    pub lat: f64,
    /// Observed label.
    pub presence: bool,
    /// The field's value at this cell.
    pub true_presence: bool,
}

/// Points drawn for one year plus the report describing the draw.
#[derive(Debug, Clone)]
pub struct OccurrenceSample {
    pub points: Vec<SamplePoint>,
    pub report: SamplingReport,
}

/// Rounds to a fixed number of decimal places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Draws `samples_per_year` points, presences first, then absences.
///
/// Labels are read back from `field` at each drawn cell, not inferred from
/// the stratum. With the default detection settings no extra draws are made.
pub fn sample_occurrences<R: Rng>(
    field: &PresenceAbsenceField,
    config: &SamplingConfig,
    rng: &mut R,
) -> Result<OccurrenceSample, SamplingError> {
    config.validate()?;

    let presence = field.presence_cells();
    let absence = field.absence_cells();
    if presence.is_empty() && absence.is_empty() {
        return Err(SamplingError::NoValidCells);
    }

    let (requested_presences, requested_absences) = config.stratum_targets();
    let (mut n_presence, mut n_absence) = (requested_presences, requested_absences);
    let mut fallbacks = Vec::new();

    if presence.is_empty() && n_presence > 0 {
        fallbacks.push(Fallback::Borrowed {
            stratum: Stratum::Presence,
            from: Stratum::Absence,
            count: n_presence,
        });
        n_absence += n_presence;
        n_presence = 0;
    }
    if absence.is_empty() && n_absence > 0 {
        fallbacks.push(Fallback::Borrowed {
            stratum: Stratum::Absence,
            from: Stratum::Presence,
            count: n_absence,
        });
        n_presence += n_absence;
        n_absence = 0;
    }

    let mut cells = draw_stratum(&presence, n_presence, Stratum::Presence, rng, &mut fallbacks);
    cells.extend(draw_stratum(&absence, n_absence, Stratum::Absence, rng, &mut fallbacks));

    let geometry = field.geometry();
    let points: Vec<SamplePoint> = cells
        .into_iter()
        .map(|i| {
            let (row, col) = geometry.row_col(i);
            let (lon, lat) = geometry.cell_center(row, col);
            let true_presence = field.at_index(i) == Some(true);
            let presence = observe(true_presence, config, rng);
            SamplePoint {
                row,
                col,
                lon: round_to(lon, 1),
                lat: round_to(lat, 1),
                presence,
                true_presence,
            }
        })
        .collect();

    let sampled_presences = points.iter().filter(|p| p.true_presence).count();
    let report = SamplingReport {
        requested_presences,
        requested_absences,
        presence_cells: presence.len(),
        absence_cells: absence.len(),
        sampled_presences,
        sampled_absences: points.len() - sampled_presences,
        fallbacks,
    };

    Ok(OccurrenceSample { points, report })
}

fn draw_stratum<R: Rng>(
    cells: &[usize],
    count: usize,
    stratum: Stratum,
    rng: &mut R,
    fallbacks: &mut Vec<Fallback>,
) -> Vec<usize> {
    if count <= cells.len() {
        return index::sample(rng, cells.len(), count)
            .into_iter()
            .map(|i| cells[i])
            .collect();
    }

    let mut drawn = cells.to_vec();
    drawn.shuffle(rng);
    while drawn.len() < count {
        drawn.push(cells[rng.random_range(0..cells.len())]);
    }

    fallbacks.push(Fallback::WithReplacement {
        stratum,
        available: cells.len(),
        requested: count,
    });
    drawn
}

fn observe<R: Rng>(true_presence: bool, config: &SamplingConfig, rng: &mut R) -> bool {
    if config.is_perfect_detection() {
        return true_presence;
    }

    let mut observed = true_presence;
    if observed && rng.random::<f64>() >= config.detection_probability {
        observed = false;
    }
    if config.error_probability > 0.0 && rng.random::<f64>() < config.error_probability {
        observed = !observed;
    }
    observed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::occurrence::presence::{ABSENT, NO_DATA, PRESENT};
    use crate::raster::GridGeometry;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    fn field(rows: usize, cols: usize, f: impl Fn(usize, usize) -> u8) -> PresenceAbsenceField {
        let g = GridGeometry::new(rows, cols, -125.0, 40.0, 0.1, 0.1).unwrap();
        let cells = (0..g.len())
            .map(|i| {
                let (r, c) = g.row_col(i);
                f(r, c)
            })
            .collect();
        PresenceAbsenceField::from_cells(g, cells).unwrap()
    }

    #[test]
    fn test_exact_count_and_prevalence() {
        // Checkerboard: 200 presences, 200 absences.
        let pa = field(20, 20, |r, c| if (r + c) % 2 == 0 { PRESENT } else { ABSENT });
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let sample = sample_occurrences(&pa, &SamplingConfig::default(), &mut rng).unwrap();

        assert_eq!(sample.points.len(), 100);
        assert_eq!(sample.points.iter().filter(|p| p.presence).count(), 50);
        assert!(!sample.report.used_fallback());
        assert_eq!(sample.report.sampled_presences, 50);
        assert_eq!(sample.report.sampled_absences, 50);

        // Without replacement: no duplicate cells.
        let unique: HashSet<(usize, usize)> = sample.points.iter().map(|p| (p.row, p.col)).collect();
        assert_eq!(unique.len(), 100);
    }

    #[test]
    fn test_labels_come_from_the_field() {
        let pa = field(10, 10, |r, _| if r < 5 { PRESENT } else { ABSENT });
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let sample = sample_occurrences(&pa, &SamplingConfig::default(), &mut rng).unwrap();

        for p in &sample.points {
            assert_eq!(Some(p.presence), pa.get(p.row, p.col));
            assert_eq!(p.presence, p.true_presence);
        }
    }

    #[test]
    fn test_coordinates_are_rounded_cell_centers() {
        let pa = field(10, 10, |_, c| if c % 2 == 0 { PRESENT } else { ABSENT });
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let cfg = SamplingConfig {
            samples_per_year: 10,
            ..Default::default()
        };
        let sample = sample_occurrences(&pa, &cfg, &mut rng).unwrap();

        for p in &sample.points {
            let (lon, lat) = pa.geometry().cell_center(p.row, p.col);
            assert!((p.lon - lon).abs() <= 0.05 + 1e-9);
            assert!((p.lat - lat).abs() <= 0.05 + 1e-9);
            assert_eq!(p.lon, round_to(p.lon, 1));
            assert_eq!(p.lat, round_to(p.lat, 1));
        }
    }

    #[test]
    fn test_small_stratum_tops_up_with_replacement() {
        // 3 presences only.
        let pa = field(10, 10, |r, c| if r == 0 && c < 3 { PRESENT } else { ABSENT });
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let sample = sample_occurrences(&pa, &SamplingConfig::default(), &mut rng).unwrap();

        assert_eq!(sample.points.len(), 100);
        assert_eq!(sample.points.iter().filter(|p| p.presence).count(), 50);
        assert_eq!(
            sample.report.fallbacks,
            vec![Fallback::WithReplacement {
                stratum: Stratum::Presence,
                available: 3,
                requested: 50,
            }]
        );

        // Every presence cell is used at least once.
        let used: HashSet<usize> = sample
            .points
            .iter()
            .filter(|p| p.presence)
            .map(|p| p.col)
            .collect();
        assert_eq!(used.len(), 3);
    }

    #[test]
    fn test_empty_stratum_borrows_from_the_other() {
        let pa = field(12, 12, |_, _| ABSENT);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let sample = sample_occurrences(&pa, &SamplingConfig::default(), &mut rng).unwrap();

        assert_eq!(sample.points.len(), 100);
        assert!(sample.points.iter().all(|p| !p.presence));
        assert_eq!(
            sample.report.fallbacks,
            vec![Fallback::Borrowed {
                stratum: Stratum::Presence,
                from: Stratum::Absence,
                count: 50,
            }]
        );
    }

    #[test]
    fn test_no_valid_cells_is_an_error() {
        let pa = field(3, 3, |_, _| NO_DATA);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(matches!(
            sample_occurrences(&pa, &SamplingConfig::default(), &mut rng),
            Err(SamplingError::NoValidCells)
        ));
    }

    #[test]
    fn test_no_data_cells_are_never_sampled() {
        let pa = field(10, 10, |r, c| match (r + c) % 3 {
            0 => NO_DATA,
            1 => PRESENT,
            _ => ABSENT,
        });
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        let cfg = SamplingConfig {
            samples_per_year: 40,
            ..Default::default()
        };
        let sample = sample_occurrences(&pa, &cfg, &mut rng).unwrap();
        assert!(sample.points.iter().all(|p| pa.get(p.row, p.col).is_some()));
    }

    #[test]
    fn test_same_seed_same_sample() {
        let pa = field(15, 15, |r, c| if (r * c) % 3 == 0 { PRESENT } else { ABSENT });
        let cfg = SamplingConfig::default();
        let a = sample_occurrences(&pa, &cfg, &mut ChaCha8Rng::seed_from_u64(77)).unwrap();
        let b = sample_occurrences(&pa, &cfg, &mut ChaCha8Rng::seed_from_u64(77)).unwrap();
        assert_eq!(a.points, b.points);
    }

    #[test]
    fn test_zero_detection_hides_every_presence() {
        let pa = field(10, 10, |r, _| if r < 5 { PRESENT } else { ABSENT });
        let cfg = SamplingConfig {
            detection_probability: 0.0,
            ..Default::default()
        };
        let sample = sample_occurrences(&pa, &cfg, &mut ChaCha8Rng::seed_from_u64(2)).unwrap();
        assert!(sample.points.iter().all(|p| !p.presence));
        assert_eq!(sample.points.iter().filter(|p| p.true_presence).count(), 50);
    }
}
