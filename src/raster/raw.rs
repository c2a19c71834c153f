//! Headerless 32-bit float raster files.
//!
//! Cells are stored row-major, north row first, as little-endian `f32`.
//! The geometry is not stored in the file; readers supply it.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use super::grid::{GridGeometry, RasterError, RasterGrid};

/// Returns the expected file size in bytes for a grid geometry.
pub fn expected_file_size(geometry: &GridGeometry) -> u64 {
    geometry.len() as u64 * 4
}

/// Reads a raw grid from `path`.
///
/// Fails with [`RasterError::CellCount`] if the file size does not match the
/// geometry, which is how a misaligned or truncated layer surfaces.
pub fn read_raw_grid(path: &Path, geometry: GridGeometry) -> Result<RasterGrid, RasterError> {
    let mut bytes = Vec::with_capacity(expected_file_size(&geometry) as usize);
    File::open(path)?.read_to_end(&mut bytes)?;

    if bytes.len() % 4 != 0 || bytes.len() / 4 != geometry.len() {
        return Err(RasterError::CellCount {
            name: path.display().to_string(),
            expected: geometry.len(),
            found: bytes.len() / 4,
        });
    }

    let values = bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]) as f64)
        .collect();

    RasterGrid::new(geometry, values)
}

/// Writes a grid to `path` in the raw layout, narrowing cells to `f32`.
pub fn write_raw_grid(grid: &RasterGrid, path: &Path) -> Result<(), RasterError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    for &v in grid.values() {
        writer.write_all(&(v as f32).to_le_bytes())?;
    }

    writer.flush()?;
    Ok(())
}
