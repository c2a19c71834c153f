//! Year stage trait and per-year pipeline orchestration.

use thiserror::Error;

use crate::config::{DrawPurpose, SeedConfig};
use crate::occurrence::{
    convert_to_presence_absence, sample_occurrences, OccurrenceSample, PresenceAbsenceField,
    PresenceConfig, SamplingConfig, SamplingError,
};
use crate::raster::EnvironmentalSnapshot;
use crate::suitability::{
    predator_suitability, prey_suitability, PredatorParameters, PreyParameters, SpeciesConfig,
    SuitabilityError, SuitabilitySurface,
};

/// Unique identifier for year stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageId {
    /// Prey suitability from sst and zooplankton.
    PreySuitability,
    /// Predator suitability from sst, mld, and prey suitability.
    PredatorSuitability,
    /// Bernoulli presence/absence realization of the predator.
    PresenceAbsence,
    /// Stratified occurrence sampling.
    Sampling,
}

impl StageId {
    /// Returns the name of the stage.
    pub fn name(&self) -> &'static str {
        match self {
            StageId::PreySuitability => "prey_suitability",
            StageId::PredatorSuitability => "predator_suitability",
            StageId::PresenceAbsence => "presence_absence",
            StageId::Sampling => "sampling",
        }
    }
}

/// Configuration shared by every stage of a run.
#[derive(Debug, Clone, Default)]
pub struct StageConfig {
    /// Seeds for the stages that draw random numbers.
    pub seeds: SeedConfig,
}

impl StageConfig {
    pub fn with_seeds(seeds: SeedConfig) -> Self {
        Self { seeds }
    }
}

/// Errors that can occur while running a year's stages.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Stage '{stage}' failed: {source}")]
    Suitability {
        stage: String,
        #[source]
        source: SuitabilityError,
    },
    #[error("Stage '{stage}' failed: {source}")]
    Sampling {
        stage: String,
        #[source]
        source: SamplingError,
    },
    #[error("Missing dependency: stage '{0}' requires '{1}'")]
    MissingDependency(String, String),
    #[error("Stage '{0}' found no '{1}' output in the year state")]
    MissingInput(String, String),
}

/// Everything computed for one year. Stages fill the optional fields in order.
#[derive(Debug, Clone)]
pub struct YearState {
    pub snapshot: EnvironmentalSnapshot,
    pub prey: Option<SuitabilitySurface>,
    pub predator: Option<SuitabilitySurface>,
    pub presence: Option<PresenceAbsenceField>,
    pub sample: Option<OccurrenceSample>,
}

impl YearState {
    pub fn new(snapshot: EnvironmentalSnapshot) -> Self {
        Self {
            snapshot,
            prey: None,
            predator: None,
            presence: None,
            sample: None,
        }
    }

    pub fn year(&self) -> i32 {
        self.snapshot.year
    }
}

/// One step of the yearly suitability-to-occurrence pipeline.
///
/// Each stage reads what earlier stages left in the [`YearState`] and adds its
/// own output. Stages hold their parameters; per-run seeds come through
/// [`StageConfig`].
pub trait YearStage: Send + Sync {
    /// Returns the unique identifier for this stage.
    fn id(&self) -> StageId;

    /// Returns a human-readable name for the stage.
    fn name(&self) -> &str;

    /// Returns the stage IDs that must be executed before this stage.
    fn dependencies(&self) -> &[StageId] {
        &[]
    }

    /// Executes the stage, writing its output into `state`.
    ///
    /// # Arguments
    /// * `state` - The year's snapshot and the outputs of earlier stages
    /// * `config` - Run-wide stage configuration (seeds)
    ///
    /// # Returns
    /// `Ok(())` on success, or an error naming the stage that failed
    fn execute(&self, state: &mut YearState, config: &StageConfig) -> Result<(), PipelineError>;
}

/// Runs a fixed sequence of stages on one year's state.
pub struct YearPipeline {
    stages: Vec<Box<dyn YearStage>>,
    config: StageConfig,
}

impl YearPipeline {
    /// Creates a new empty pipeline with the given configuration.
    pub fn new(config: StageConfig) -> Self {
        Self {
            stages: Vec::new(),
            config,
        }
    }

    /// The standard prey → predator → presence → sampling sequence.
    pub fn standard(
        species: &SpeciesConfig,
        presence: PresenceConfig,
        sampling: SamplingConfig,
        seeds: SeedConfig,
    ) -> Self {
        let mut pipeline = Self::new(StageConfig::with_seeds(seeds));
        pipeline
            .add_stage(PreySuitabilityStage::new(species.prey.clone()))
            .add_stage(PredatorSuitabilityStage::new(species.predator.clone()))
            .add_stage(PresenceAbsenceStage::new(presence))
            .add_stage(SamplingStage::new(sampling));
        pipeline
    }

    /// Adds a stage to the pipeline.
    pub fn add_stage<S: YearStage + 'static>(&mut self, stage: S) -> &mut Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Returns the number of stages in the pipeline.
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Executes all stages in order on `state`.
    ///
    /// # Returns
    /// `Ok(())` once every stage has run, or the first error encountered
    pub fn run(&self, state: &mut YearState) -> Result<(), PipelineError> {
        self.run_with_callbacks(state, |_, _, _| {}, |_, _, _| {})
    }

    /// Executes all stages, reporting each stage's start and completion.
    ///
    /// Dependencies are checked before each stage runs.
    ///
    /// # Arguments
    /// * `state` - The year state to fill
    /// * `on_stage_start` - Called with (name, index, total) before a stage runs
    /// * `on_stage_complete` - Called with (name, index, total) after a stage succeeds
    ///
    /// # Returns
    /// `Ok(())` once every stage has run, or the first error encountered
    pub fn run_with_callbacks<F1, F2>(
        &self,
        state: &mut YearState,
        mut on_stage_start: F1,
        mut on_stage_complete: F2,
    ) -> Result<(), PipelineError>
    where
        F1: FnMut(&str, usize, usize),
        F2: FnMut(&str, usize, usize),
    {
        let total = self.stages.len();
        let mut completed: Vec<StageId> = Vec::new();

        for (i, stage) in self.stages.iter().enumerate() {
            on_stage_start(stage.name(), i, total);

            for dep in stage.dependencies() {
                if !completed.contains(dep) {
                    return Err(PipelineError::MissingDependency(
                        stage.name().to_string(),
                        dep.name().to_string(),
                    ));
                }
            }

            stage.execute(state, &self.config)?;
            completed.push(stage.id());

            on_stage_complete(stage.name(), i, total);
        }

        Ok(())
    }
}

/// Prey suitability stage.
pub struct PreySuitabilityStage {
    pub params: PreyParameters,
}

impl PreySuitabilityStage {
    pub fn new(params: PreyParameters) -> Self {
        Self { params }
    }
}

impl YearStage for PreySuitabilityStage {
    fn id(&self) -> StageId {
        StageId::PreySuitability
    }

    fn name(&self) -> &str {
        "Prey Suitability"
    }

    fn execute(&self, state: &mut YearState, _config: &StageConfig) -> Result<(), PipelineError> {
        let surface = prey_suitability(&state.snapshot, &self.params).map_err(|source| {
            PipelineError::Suitability {
                stage: self.name().to_string(),
                source,
            }
        })?;
        log::debug!(
            "year {}: prey reference max {:.6e}",
            state.year(),
            surface.reference_max()
        );
        state.prey = Some(surface);
        Ok(())
    }
}

/// Predator suitability stage, coupled to the finished prey surface.
pub struct PredatorSuitabilityStage {
    pub params: PredatorParameters,
}

impl PredatorSuitabilityStage {
    pub fn new(params: PredatorParameters) -> Self {
        Self { params }
    }
}

impl YearStage for PredatorSuitabilityStage {
    fn id(&self) -> StageId {
        StageId::PredatorSuitability
    }

    fn name(&self) -> &str {
        "Predator Suitability"
    }

    fn dependencies(&self) -> &[StageId] {
        &[StageId::PreySuitability]
    }

    fn execute(&self, state: &mut YearState, _config: &StageConfig) -> Result<(), PipelineError> {
        let prey = state.prey.as_ref().ok_or_else(|| {
            PipelineError::MissingInput(self.name().to_string(), "prey".to_string())
        })?;
        let surface = predator_suitability(&state.snapshot, prey, &self.params).map_err(
            |source| PipelineError::Suitability {
                stage: self.name().to_string(),
                source,
            },
        )?;
        log::debug!(
            "year {}: predator reference max {:.6e}",
            state.year(),
            surface.reference_max()
        );
        state.predator = Some(surface);
        Ok(())
    }
}

/// Converts predator suitability into a presence/absence field.
pub struct PresenceAbsenceStage {
    pub config: PresenceConfig,
}

impl PresenceAbsenceStage {
    pub fn new(config: PresenceConfig) -> Self {
        Self { config }
    }
}

impl YearStage for PresenceAbsenceStage {
    fn id(&self) -> StageId {
        StageId::PresenceAbsence
    }

    fn name(&self) -> &str {
        "Presence-Absence"
    }

    fn dependencies(&self) -> &[StageId] {
        &[StageId::PredatorSuitability]
    }

    fn execute(&self, state: &mut YearState, config: &StageConfig) -> Result<(), PipelineError> {
        let predator = state.predator.as_ref().ok_or_else(|| {
            PipelineError::MissingInput(self.name().to_string(), "predator".to_string())
        })?;
        let mut rng = config.seeds.rng(DrawPurpose::Presence, state.year());
        let field = convert_to_presence_absence(predator.grid(), &self.config, &mut rng);
        if let Some(p) = field.prevalence() {
            log::debug!("year {}: realized prevalence {:.3}", state.year(), p);
        }
        state.presence = Some(field);
        Ok(())
    }
}

/// Draws the year's occurrence points.
pub struct SamplingStage {
    pub config: SamplingConfig,
}

impl SamplingStage {
    pub fn new(config: SamplingConfig) -> Self {
        Self { config }
    }
}

impl YearStage for SamplingStage {
    fn id(&self) -> StageId {
        StageId::Sampling
    }

    fn name(&self) -> &str {
        "Occurrence Sampling"
    }

    fn dependencies(&self) -> &[StageId] {
        &[StageId::PresenceAbsence]
    }

    fn execute(&self, state: &mut YearState, config: &StageConfig) -> Result<(), PipelineError> {
        let field = state.presence.as_ref().ok_or_else(|| {
            PipelineError::MissingInput(self.name().to_string(), "presence".to_string())
        })?;
        let mut rng = config.seeds.rng(DrawPurpose::Sampling, state.year());
        let sample = sample_occurrences(field, &self.config, &mut rng).map_err(|source| {
            PipelineError::Sampling {
                stage: self.name().to_string(),
                source,
            }
        })?;
        for fallback in &sample.report.fallbacks {
            log::warn!("year {}: sampling fallback {:?}", state.year(), fallback);
        }
        state.sample = Some(sample);
        Ok(())
    }
}
