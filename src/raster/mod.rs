//! Raster layer: georeferenced grids, per-year environmental snapshots, and
//! the sources that supply them.

mod config;
mod grid;
mod raw;
mod snapshot;
mod source;

pub use config::{LayerFolders, RasterConfig};
pub use grid::{GridGeometry, RasterError, RasterGrid};
pub use raw::{expected_file_size, read_raw_grid, write_raw_grid};
pub use snapshot::{EnvironmentalSnapshot, RawLayers};
pub use source::{DirectorySource, MemorySource, RasterSource};
