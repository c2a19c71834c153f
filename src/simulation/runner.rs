//! Multi-year simulation driver.

use rayon::prelude::*;
use thiserror::Error;

use crate::config::{ConfigError, DrawPurpose, SimulationConfig};
use crate::pipeline::{PipelineError, YearPipeline, YearState};
use crate::raster::{RasterError, RasterSource};

use super::abundance::assign_abundance;
use super::table::{OccurrenceTable, OutputRow, YearReport};

/// Errors that stop a simulation run.
#[derive(Error, Debug)]
pub enum SimulationError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Year {year}: {source}")]
    Raster {
        year: i32,
        #[source]
        source: RasterError,
    },
    #[error("Year {year}: {source}")]
    Pipeline {
        year: i32,
        #[source]
        source: PipelineError,
    },
    #[error("Year {year}: expected {expected} sampled rows, found {found}")]
    RowCount {
        year: i32,
        expected: usize,
        found: usize,
    },
    #[error("Invalid abundance distribution: {0}")]
    Abundance(String),
}

/// Copies a finished year's sampled points into `rows`.
///
/// Covariates are read at each point's cell: predator suitability, raw sst,
/// zooplankton, log chlorophyll, and mixed layer depth. The snapshot shares
/// one no-data mask across layers, so sampled cells hold data in all of them.
pub fn extract_rows(state: &YearState, rows: &mut [OutputRow]) -> Result<(), SimulationError> {
    let year = state.year();
    let missing = |what: &str| SimulationError::Pipeline {
        year,
        source: PipelineError::MissingInput("row extraction".to_string(), what.to_string()),
    };
    let predator = state.predator.as_ref().ok_or_else(|| missing("predator"))?;
    let sample = state.sample.as_ref().ok_or_else(|| missing("sample"))?;

    if sample.points.len() != rows.len() {
        return Err(SimulationError::RowCount {
            year,
            expected: rows.len(),
            found: sample.points.len(),
        });
    }

    let env = &state.snapshot;
    for (row, point) in rows.iter_mut().zip(&sample.points) {
        let (r, c) = (point.row, point.col);
        *row = OutputRow {
            lon: point.lon,
            lat: point.lat,
            year,
            pres: u8::from(point.presence),
            suitability: predator.grid().get(r, c),
            sst: env.sst.get(r, c),
            zoo_200: env.zoo.get(r, c),
            chla_surface: env.chla_surface.get(r, c),
            mld: env.mld.get(r, c),
            abundance: 0.0,
        };
    }
    Ok(())
}

/// A configured simulation, ready to run against a raster source.
pub struct Simulation {
    config: SimulationConfig,
    pipeline: YearPipeline,
}

impl Simulation {
    /// Validates `config` and builds the per-year pipeline.
    pub fn new(config: SimulationConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        let pipeline = YearPipeline::standard(
            &config.species,
            config.presence,
            config.sampling,
            config.seeds,
        );
        Ok(Self { config, pipeline })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Runs one year and writes its rows into `rows`.
    pub fn run_year(
        &self,
        source: &dyn RasterSource,
        year: i32,
        rows: &mut [OutputRow],
    ) -> Result<YearReport, SimulationError> {
        let snapshot = source
            .load_year(year)
            .map_err(|source| SimulationError::Raster { year, source })?;

        let mut state = YearState::new(snapshot);
        self.pipeline
            .run_with_callbacks(
                &mut state,
                |name, _, _| log::trace!("year {}: {}", year, name),
                |_, _, _| {},
            )
            .map_err(|source| SimulationError::Pipeline { year, source })?;

        extract_rows(&state, rows)?;

        let mut report = YearReport {
            year,
            prey_reference_max: f64::NAN,
            predator_reference_max: f64::NAN,
            realized_prevalence: state.presence.as_ref().and_then(|p| p.prevalence()),
            sampling: Default::default(),
        };
        if let Some(prey) = &state.prey {
            report.prey_reference_max = prey.reference_max();
        }
        if let Some(predator) = &state.predator {
            report.predator_reference_max = predator.reference_max();
        }
        if let Some(sample) = state.sample {
            report.sampling = sample.report;
        }
        Ok(report)
    }

    /// Runs every configured year and assembles the occurrence table.
    ///
    /// Year `i` owns rows `[i * n, (i + 1) * n)`, so parallel and sequential
    /// runs produce the same table.
    pub fn run(&self, source: &dyn RasterSource) -> Result<OccurrenceTable, SimulationError> {
        let years = self.config.years;
        let n = self.config.sampling.samples_per_year;
        let mut rows = vec![OutputRow::default(); years.len() * n];

        log::info!(
            "Simulating {} years ({}..={}), {} samples per year{}",
            years.len(),
            years.start,
            years.end,
            n,
            if self.config.parallel { ", parallel" } else { "" }
        );

        let reports: Vec<YearReport> = if self.config.parallel {
            rows.par_chunks_mut(n)
                .enumerate()
                .map(|(i, block)| self.run_year(source, years.year_at(i), block))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            rows.chunks_mut(n)
                .enumerate()
                .map(|(i, block)| self.run_year(source, years.year_at(i), block))
                .collect::<Result<Vec<_>, _>>()?
        };

        let mut rng = self.config.seeds.rng(DrawPurpose::Abundance, years.start);
        assign_abundance(&mut rows, &self.config.abundance, &mut rng)?;

        let table = OccurrenceTable::new(rows, reports, years, n);
        let fallbacks = table.fallback_years();
        if !fallbacks.is_empty() {
            log::warn!(
                "{} of {} years needed a sampling fallback",
                fallbacks.len(),
                years.len()
            );
        }
        log::info!("Simulation complete: {} rows", table.len());
        Ok(table)
    }
}
