//! Export module for writing simulation output.
//!
//! The occurrence table goes to CSV; per-year diagnostics go to YAML.

mod csv;
mod report;

use thiserror::Error;

pub use csv::{write_table, write_table_csv};
pub use report::write_report_yaml;

/// Errors that can occur while writing output files.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
