//! CSV export of the occurrence table.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::simulation::{OccurrenceTable, OutputRow};

use super::ExportError;

/// Writes the table header and one line per row to `writer`.
pub fn write_table<W: Write>(table: &OccurrenceTable, writer: &mut W) -> Result<(), ExportError> {
    writeln!(writer, "{}", OutputRow::COLUMNS.join(","))?;

    for row in table.rows() {
        writeln!(
            writer,
            "{},{},{},{},{},{},{},{},{},{}",
            row.lon,
            row.lat,
            row.year,
            row.pres,
            row.suitability,
            row.sst,
            row.zoo_200,
            row.chla_surface,
            row.mld,
            row.abundance,
        )?;
    }
    Ok(())
}

/// Writes the table as CSV to `path`, creating parent directories.
pub fn write_table_csv<P: AsRef<Path>>(table: &OccurrenceTable, path: P) -> Result<(), ExportError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(path)?);
    write_table(table, &mut writer)?;
    writer.flush()?;

    log::info!("Wrote {} rows to {}", table.len(), path.display());
    Ok(())
}
