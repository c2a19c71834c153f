//! Synthetic predator-prey occurrence generator.
//!
//! This crate turns yearly ocean-model rasters (sea surface temperature,
//! surface chlorophyll, mixed layer depth, zooplankton) into a table of
//! sampled predator presence/absence points with covariates and abundance.
//! Prey suitability is built first and feeds the predator as a covariate.

pub mod config;
pub mod export;
pub mod occurrence;
pub mod pipeline;
pub mod raster;
pub mod simulation;
pub mod suitability;

pub use config::{ConfigError, SeedConfig, SimulationConfig, YearRange};
pub use occurrence::{PresenceAbsenceField, SamplingConfig, SamplingReport};
pub use pipeline::{YearPipeline, YearStage, YearState};
pub use raster::{DirectorySource, EnvironmentalSnapshot, GridGeometry, MemorySource, RasterGrid, RasterSource};
pub use simulation::{OccurrenceTable, OutputRow, Simulation, SimulationError};
pub use suitability::{ResponseCurve, SpeciesConfig, SuitabilityModel, SuitabilitySurface};
