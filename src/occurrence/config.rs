//! Presence conversion and sampling parameters.

use serde::{Deserialize, Serialize};

use super::sampler::SamplingError;

/// Logistic transform from suitability to probability of presence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PresenceConfig {
    pub alpha: f64,
    pub beta: f64,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            alpha: -0.05,
            beta: 0.5,
        }
    }
}

/// Per-year stratified sampling of occurrence points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Points drawn per year.
    pub samples_per_year: usize,
    /// Target fraction of points drawn from presence cells.
    pub prevalence: f64,
    /// Probability that a true presence is observed as present.
    #[serde(default = "default_detection")]
    pub detection_probability: f64,
    /// Probability that an observed label is flipped.
    #[serde(default)]
    pub error_probability: f64,
}

fn default_detection() -> f64 {
    1.0
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            samples_per_year: 100,
            prevalence: 0.5,
            detection_probability: 1.0,
            error_probability: 0.0,
        }
    }
}

impl SamplingConfig {
    /// `(presence target, absence target)` for one year.
    pub fn stratum_targets(&self) -> (usize, usize) {
        let n = self.samples_per_year;
        let presences = ((n as f64) * self.prevalence).round() as usize;
        let presences = presences.min(n);
        (presences, n - presences)
    }

    pub fn validate(&self) -> Result<(), SamplingError> {
        if self.samples_per_year == 0 {
            return Err(SamplingError::InvalidConfig(
                "samples_per_year must be positive".to_string(),
            ));
        }
        for (name, p) in [
            ("prevalence", self.prevalence),
            ("detection_probability", self.detection_probability),
            ("error_probability", self.error_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(SamplingError::InvalidConfig(format!(
                    "{} must lie in [0, 1], got {}",
                    name, p
                )));
            }
        }
        Ok(())
    }

    /// True when detection and labelling introduce no error.
    pub fn is_perfect_detection(&self) -> bool {
        self.detection_probability >= 1.0 && self.error_probability <= 0.0
    }
}
