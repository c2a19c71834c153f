//! Occurrence simulation: presence/absence realization and stratified
//! sampling of occurrence points.

mod config;
mod presence;
mod sampler;

pub use config::{PresenceConfig, SamplingConfig};
pub use presence::{
    convert_to_presence_absence, presence_probability, PresenceAbsenceField, ABSENT, NO_DATA,
    PRESENT,
};
pub use sampler::{
    round_to, sample_occurrences, Fallback, OccurrenceSample, SamplePoint, SamplingError,
    SamplingReport, Stratum,
};
