//! Abundance at sampled presences.

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::config::AbundanceConfig;

use super::runner::SimulationError;
use super::table::OutputRow;

/// Sets `abundance` on every row.
///
/// Presence rows get one normal draw of regional biomass scaled by the row's
/// suitability; absence rows get 0. Draws happen in row order, one per
/// presence row.
pub fn assign_abundance<R: Rng>(
    rows: &mut [OutputRow],
    config: &AbundanceConfig,
    rng: &mut R,
) -> Result<(), SimulationError> {
    let normal = Normal::new(config.mean, config.sd)
        .map_err(|e| SimulationError::Abundance(e.to_string()))?;

    for row in rows.iter_mut() {
        row.abundance = if row.pres == 1 {
            normal.sample(rng) * row.suitability
        } else {
            0.0
        };
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rows() -> Vec<OutputRow> {
        (0..200)
            .map(|i| OutputRow {
                pres: (i % 2) as u8,
                suitability: 0.5 + (i % 5) as f64 * 0.1,
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn test_absences_have_zero_abundance() {
        let mut rows = rows();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assign_abundance(&mut rows, &AbundanceConfig::default(), &mut rng).unwrap();

        for row in &rows {
            if row.pres == 0 {
                assert_eq!(row.abundance, 0.0);
            } else {
                assert!(row.abundance > 0.0);
            }
        }
    }

    #[test]
    fn test_presence_abundance_scales_with_suitability() {
        let mut rows = rows();
        let cfg = AbundanceConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        assign_abundance(&mut rows, &cfg, &mut rng).unwrap();

        let ratios: Vec<f64> = rows
            .iter()
            .filter(|r| r.pres == 1)
            .map(|r| r.abundance / r.suitability)
            .collect();
        let mean = ratios.iter().sum::<f64>() / ratios.len() as f64;
        // 100 draws: the sample mean lies well within 4 standard errors.
        assert!((mean - cfg.mean).abs() < 4.0 * cfg.sd / 10.0);
    }

    #[test]
    fn test_same_seed_same_abundance() {
        let cfg = AbundanceConfig::default();
        let mut a = rows();
        let mut b = rows();
        assign_abundance(&mut a, &cfg, &mut ChaCha8Rng::seed_from_u64(9)).unwrap();
        assign_abundance(&mut b, &cfg, &mut ChaCha8Rng::seed_from_u64(9)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_distribution_is_an_error() {
        let mut rows = rows();
        let cfg = AbundanceConfig {
            mean: 1.0,
            sd: f64::NAN,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(matches!(
            assign_abundance(&mut rows, &cfg, &mut rng),
            Err(SimulationError::Abundance(_))
        ));
    }
}
