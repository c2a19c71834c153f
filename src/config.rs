//! Run configuration.
//!
//! Loaded from YAML; every field has a default matching the reference run
//! (1980-2100, 100 samples per year at prevalence 0.5).

use std::path::Path;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::occurrence::{PresenceConfig, SamplingConfig, SamplingError};
use crate::raster::{RasterConfig, RasterError};
use crate::simulation::OutputRow;
use crate::suitability::{SpeciesConfig, SuitabilityError};

/// Errors raised while loading or validating a configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid year range: {start}..={end} (must be non-empty and at most {max} years)", max = MAX_YEARS)]
    YearRange { start: i32, end: i32 },
    #[error("{years} years x {samples_per_year} samples per year is too large to allocate")]
    TableTooLarge {
        years: usize,
        samples_per_year: usize,
    },
    #[error("Invalid abundance distribution: {0}")]
    Abundance(String),
    #[error(transparent)]
    Species(#[from] SuitabilityError),
    #[error(transparent)]
    Sampling(#[from] SamplingError),
    #[error(transparent)]
    Raster(#[from] RasterError),
}

/// Longest year range a configuration may request.
pub const MAX_YEARS: usize = 100_000;

/// Inclusive range of calendar years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl Default for YearRange {
    fn default() -> Self {
        Self::new(1980, 2100)
    }
}

impl YearRange {
    pub const fn new(start: i32, end: i32) -> Self {
        Self { start, end }
    }

    /// Number of years; zero when `end < start`.
    pub fn len(&self) -> usize {
        let span = self.end as i64 - self.start as i64 + 1;
        usize::try_from(span.max(0)).unwrap_or(usize::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = i32> {
        self.start..=self.end
    }

    /// Zero-based position of `year` in the range.
    pub fn index_of(&self, year: i32) -> Option<usize> {
        (self.start..=self.end)
            .contains(&year)
            .then(|| (year - self.start) as usize)
    }

    /// Calendar year at a zero-based position.
    pub fn year_at(&self, index: usize) -> i32 {
        self.start + index as i32
    }
}

/// What a random stream is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawPurpose {
    /// Bernoulli presence draws.
    Presence,
    /// Stratified sample selection.
    Sampling,
    /// Abundance normal draws.
    Abundance,
}

/// Independent seeds for each kind of random draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedConfig {
    pub presence: u64,
    pub sampling: u64,
    pub abundance: u64,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self::from_master(42)
    }
}

impl SeedConfig {
    /// Derives all three seeds from one value.
    pub fn from_master(seed: u64) -> Self {
        Self {
            presence: seed,
            sampling: seed.wrapping_add(0x9E37_79B9_7F4A_7C15),
            abundance: seed.wrapping_add(0x3C6E_F372_FE94_F82A),
        }
    }

    /// Generator for `purpose` in `year`.
    ///
    /// The ChaCha stream is selected by the year, so each year's draws are
    /// the same whatever order years are processed in.
    pub fn rng(&self, purpose: DrawPurpose, year: i32) -> ChaCha8Rng {
        let seed = match purpose {
            DrawPurpose::Presence => self.presence,
            DrawPurpose::Sampling => self.sampling,
            DrawPurpose::Abundance => self.abundance,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(year as i64 as u64);
        rng
    }
}

/// Regional biomass distribution apportioned by suitability at presences.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AbundanceConfig {
    pub mean: f64,
    pub sd: f64,
}

impl Default for AbundanceConfig {
    fn default() -> Self {
        Self {
            mean: 118_000.0 / 140.0,
            sd: 13_000.0 / 140.0,
        }
    }
}

/// Full configuration of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub years: YearRange,
    #[serde(default)]
    pub raster: RasterConfig,
    #[serde(default)]
    pub species: SpeciesConfig,
    #[serde(default)]
    pub presence: PresenceConfig,
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub abundance: AbundanceConfig,
    #[serde(default)]
    pub seeds: SeedConfig,
    /// Process years on the rayon thread pool.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

fn default_parallel() -> bool {
    true
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            years: YearRange::default(),
            raster: RasterConfig::default(),
            species: SpeciesConfig::default(),
            presence: PresenceConfig::default(),
            sampling: SamplingConfig::default(),
            abundance: AbundanceConfig::default(),
            seeds: SeedConfig::default(),
            parallel: true,
        }
    }
}

impl SimulationConfig {
    /// Loads a YAML configuration file and validates it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: SimulationConfig = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Writes this configuration as YAML.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Rows the output table will hold.
    pub fn expected_rows(&self) -> usize {
        self.years.len().saturating_mul(self.sampling.samples_per_year)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.years.is_empty() || self.years.len() > MAX_YEARS {
            return Err(ConfigError::YearRange {
                start: self.years.start,
                end: self.years.end,
            });
        }
        let table_bytes = self
            .years
            .len()
            .checked_mul(self.sampling.samples_per_year)
            .and_then(|rows| rows.checked_mul(std::mem::size_of::<OutputRow>()));
        if !matches!(table_bytes, Some(bytes) if bytes <= isize::MAX as usize) {
            return Err(ConfigError::TableTooLarge {
                years: self.years.len(),
                samples_per_year: self.sampling.samples_per_year,
            });
        }
        self.raster.geometry.validate()?;
        self.species.validate()?;
        self.sampling.validate()?;

        if !self.presence.alpha.is_finite()
            || self.presence.alpha == 0.0
            || !self.presence.beta.is_finite()
        {
            return Err(ConfigError::Species(SuitabilityError::InvalidCurve(format!(
                "presence logistic needs finite beta and non-zero alpha, got alpha={}, beta={}",
                self.presence.alpha, self.presence.beta
            ))));
        }

        if !self.abundance.mean.is_finite()
            || !self.abundance.sd.is_finite()
            || self.abundance.sd <= 0.0
        {
            return Err(ConfigError::Abundance(format!(
                "mean must be finite and sd positive, got mean={}, sd={}",
                self.abundance.mean, self.abundance.sd
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = SimulationConfig::default();
        assert_eq!(config.years.len(), 121);
        assert_eq!(config.expected_rows(), 12_100);
        assert!((config.abundance.mean - 842.857_142_857).abs() < 1e-6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_year_range_indexing() {
        let years = YearRange::new(1980, 1982);
        assert_eq!(years.len(), 3);
        assert_eq!(years.index_of(1981), Some(1));
        assert_eq!(years.index_of(1979), None);
        assert_eq!(years.index_of(1983), None);
        assert_eq!(years.year_at(2), 1982);
        assert_eq!(years.iter().collect::<Vec<_>>(), vec![1980, 1981, 1982]);
        assert!(YearRange::new(2000, 1999).is_empty());
    }

    #[test]
    fn test_yaml_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        let mut config = SimulationConfig::default();
        config.years = YearRange::new(1990, 1995);
        config.sampling.samples_per_year = 40;
        config.save(&path).unwrap();

        let loaded = SimulationConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "years:\n  start: 2000\n  end: 2010\nparallel: false\n";
        let config: SimulationConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.years.len(), 11);
        assert!(!config.parallel);
        assert_eq!(config.sampling, SamplingConfig::default());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = SimulationConfig::default();
        config.years = YearRange::new(2001, 2000);
        assert!(matches!(config.validate(), Err(ConfigError::YearRange { .. })));

        let mut config = SimulationConfig::default();
        config.abundance.sd = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::Abundance(_))));

        let mut config = SimulationConfig::default();
        config.sampling.prevalence = -0.1;
        assert!(matches!(config.validate(), Err(ConfigError::Sampling(_))));
    }

    #[test]
    fn test_wide_year_range_is_rejected_without_overflow() {
        let full = YearRange::new(i32::MIN, i32::MAX);
        assert_eq!(full.len(), 1usize << 32);
        assert!(!full.is_empty());
        assert!(YearRange::new(i32::MAX, i32::MIN).is_empty());

        let mut config = SimulationConfig::default();
        config.years = full;
        assert!(matches!(config.validate(), Err(ConfigError::YearRange { .. })));

        let mut config = SimulationConfig::default();
        config.sampling.samples_per_year = usize::MAX / 2;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TableTooLarge { .. })
        ));

        let mut config = SimulationConfig::default();
        config.years = YearRange::new(i32::MAX, i32::MIN);
        assert!(matches!(config.validate(), Err(ConfigError::YearRange { .. })));
    }

    #[test]
    fn test_streams_are_reproducible_and_distinct() {
        let seeds = SeedConfig::from_master(7);
        let a: u64 = seeds.rng(DrawPurpose::Presence, 1980).random();
        let b: u64 = seeds.rng(DrawPurpose::Presence, 1980).random();
        let c: u64 = seeds.rng(DrawPurpose::Presence, 1981).random();
        let d: u64 = seeds.rng(DrawPurpose::Sampling, 1980).random();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }
}
