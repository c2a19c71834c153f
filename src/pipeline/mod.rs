//! Per-year pipeline orchestration.
//!
//! Each year runs a fixed sequence of stages over its environmental snapshot:
//! prey suitability, predator suitability, presence/absence, then sampling.

mod stage;

pub use stage::{
    PipelineError, PredatorSuitabilityStage, PresenceAbsenceStage, PreySuitabilityStage,
    SamplingStage, StageConfig, StageId, YearPipeline, YearStage, YearState,
};
