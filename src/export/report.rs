//! YAML export of per-year run diagnostics.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::simulation::{OccurrenceTable, YearReport};

use super::ExportError;

#[derive(Serialize)]
struct RunReport<'a> {
    rows: usize,
    samples_per_year: usize,
    fallback_years: Vec<i32>,
    years: &'a [YearReport],
}

/// Writes reference maxima, realized prevalence, and sampler fallbacks for
/// every year to `path`.
pub fn write_report_yaml<P: AsRef<Path>>(
    table: &OccurrenceTable,
    path: P,
) -> Result<(), ExportError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let report = RunReport {
        rows: table.len(),
        samples_per_year: table.samples_per_year(),
        fallback_years: table.fallback_years(),
        years: table.reports(),
    };

    let mut writer = BufWriter::new(File::create(path)?);
    serde_yaml::to_writer(&mut writer, &report)?;
    writer.flush()?;
    Ok(())
}
