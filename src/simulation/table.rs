//! The flat occurrence table produced by a run.

use serde::{Deserialize, Serialize};

use crate::config::YearRange;
use crate::occurrence::SamplingReport;

/// One sampled point with its covariates and labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputRow {
    pub lon: f64,
    pub lat: f64,
    pub year: i32,
    /// 1 for presence, 0 for absence.
    pub pres: u8,
    /// Predator suitability at the point.
    pub suitability: f64,
    pub sst: f64,
    pub zoo_200: f64,
    /// Log chlorophyll.
    pub chla_surface: f64,
    pub mld: f64,
    pub abundance: f64,
}

impl OutputRow {
    pub const COLUMNS: [&'static str; 10] = [
        "lon",
        "lat",
        "year",
        "pres",
        "suitability",
        "sst",
        "zoo_200",
        "chla_surface",
        "mld",
        "abundance",
    ];
}

/// Per-year diagnostics kept alongside the rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearReport {
    pub year: i32,
    pub prey_reference_max: f64,
    pub predator_reference_max: f64,
    /// Fraction of valid cells present in the realized field.
    pub realized_prevalence: Option<f64>,
    pub sampling: SamplingReport,
}

/// Rows for every year, in year order, `samples_per_year` rows per year.
#[derive(Debug, Clone)]
pub struct OccurrenceTable {
    rows: Vec<OutputRow>,
    reports: Vec<YearReport>,
    years: YearRange,
    samples_per_year: usize,
}

impl OccurrenceTable {
    pub(crate) fn new(
        rows: Vec<OutputRow>,
        reports: Vec<YearReport>,
        years: YearRange,
        samples_per_year: usize,
    ) -> Self {
        debug_assert_eq!(rows.len(), years.len() * samples_per_year);
        debug_assert_eq!(reports.len(), years.len());
        Self {
            rows,
            reports,
            years,
            samples_per_year,
        }
    }

    pub fn rows(&self) -> &[OutputRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn years(&self) -> YearRange {
        self.years
    }

    pub fn samples_per_year(&self) -> usize {
        self.samples_per_year
    }

    /// Half-open row range `[start, end)` holding `year`.
    pub fn year_bounds(&self, year: i32) -> Option<(usize, usize)> {
        let i = self.years.index_of(year)?;
        Some((i * self.samples_per_year, (i + 1) * self.samples_per_year))
    }

    /// Rows belonging to `year`.
    pub fn year_block(&self, year: i32) -> Option<&[OutputRow]> {
        self.year_bounds(year).map(|(a, b)| &self.rows[a..b])
    }

    pub fn reports(&self) -> &[YearReport] {
        &self.reports
    }

    /// Years whose sampling had to fall back from plain stratified draws.
    pub fn fallback_years(&self) -> Vec<i32> {
        self.reports
            .iter()
            .filter(|r| r.sampling.used_fallback())
            .map(|r| r.year)
            .collect()
    }

    pub fn into_rows(self) -> Vec<OutputRow> {
        self.rows
    }
}
