//! Providers of per-year environmental snapshots.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::YearRange;

use super::config::LayerFolders;
use super::grid::{GridGeometry, RasterError};
use super::raw::read_raw_grid;
use super::snapshot::{EnvironmentalSnapshot, RawLayers};

/// A supplier of co-registered environmental layers, one snapshot per year.
///
/// Implementations must be shareable across threads so years can be
/// processed in parallel.
pub trait RasterSource: Send + Sync {
    /// Loads and validates the snapshot for `year`.
    fn load_year(&self, year: i32) -> Result<EnvironmentalSnapshot, RasterError>;
}

/// Snapshots held in memory, keyed by calendar year.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    layers: BTreeMap<i32, RawLayers>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) the raw layers for `year`.
    pub fn insert(&mut self, year: i32, layers: RawLayers) -> &mut Self {
        self.layers.insert(year, layers);
        self
    }

    /// Uses the same layers for every year in `years`.
    pub fn repeated(years: YearRange, layers: RawLayers) -> Self {
        let mut source = Self::new();
        for year in years.iter() {
            source.insert(year, layers.clone());
        }
        source
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl RasterSource for MemorySource {
    fn load_year(&self, year: i32) -> Result<EnvironmentalSnapshot, RasterError> {
        let layers = self
            .layers
            .get(&year)
            .cloned()
            .ok_or(RasterError::MissingYear(year))?;
        EnvironmentalSnapshot::from_raw(year, layers)
    }
}

/// Raw layer files laid out as `<root>/<layer folder>/<one file per year>.raw`.
///
/// Files in each folder are sorted by name; the i-th file belongs to the i-th
/// year of the range, so names must sort chronologically.
///
/// Raw files carry no header, so the only alignment check possible is the
/// byte count. A file written with another layout of the same cell count
/// (rows and columns swapped, say) loads without error and is read with the
/// configured geometry.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    geometry: GridGeometry,
    years: YearRange,
    sst: Vec<PathBuf>,
    chla_surface: Vec<PathBuf>,
    mld: Vec<PathBuf>,
    zoo: Vec<PathBuf>,
}

impl DirectorySource {
    /// Scans the four layer folders under `root`.
    ///
    /// Each folder must hold exactly one `.raw` file per year.
    pub fn open(
        root: &Path,
        folders: &LayerFolders,
        geometry: GridGeometry,
        years: YearRange,
    ) -> Result<Self, RasterError> {
        geometry.validate()?;
        let expected = years.len();

        Ok(Self {
            geometry,
            years,
            sst: list_layer_files(&root.join(&folders.sst), expected)?,
            chla_surface: list_layer_files(&root.join(&folders.chla_surface), expected)?,
            mld: list_layer_files(&root.join(&folders.mld), expected)?,
            zoo: list_layer_files(&root.join(&folders.zoo), expected)?,
        })
    }

    pub fn years(&self) -> YearRange {
        self.years
    }
}

impl RasterSource for DirectorySource {
    fn load_year(&self, year: i32) -> Result<EnvironmentalSnapshot, RasterError> {
        let i = self.years.index_of(year).ok_or(RasterError::MissingYear(year))?;

        let layers = RawLayers {
            sst: read_raw_grid(&self.sst[i], self.geometry)?,
            mld: read_raw_grid(&self.mld[i], self.geometry)?,
            zoo: read_raw_grid(&self.zoo[i], self.geometry)?,
            chla_surface: read_raw_grid(&self.chla_surface[i], self.geometry)?,
        };

        EnvironmentalSnapshot::from_raw(year, layers)
    }
}

fn list_layer_files(folder: &Path, expected: usize) -> Result<Vec<PathBuf>, RasterError> {
    if !folder.is_dir() {
        return Err(RasterError::MissingFolder(folder.display().to_string()));
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(folder)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == "raw") {
            files.push(path);
        }
    }
    files.sort();

    if files.len() != expected {
        return Err(RasterError::FileCount {
            folder: folder.display().to_string(),
            expected,
            found: files.len(),
        });
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{write_raw_grid, RasterGrid};
    use tempfile::tempdir;

    fn geometry() -> GridGeometry {
        GridGeometry::new(3, 4, -125.0, 40.0, 0.1, 0.1).unwrap()
    }

    fn write_year(root: &Path, folders: &LayerFolders, year: i32, sst: f64) {
        let g = geometry();
        let name = format!("layer_{}.raw", year);
        write_raw_grid(&RasterGrid::filled(g, sst), &root.join(&folders.sst).join(&name)).unwrap();
        write_raw_grid(&RasterGrid::filled(g, 2.0), &root.join(&folders.chla_surface).join(&name)).unwrap();
        write_raw_grid(&RasterGrid::filled(g, 40.0), &root.join(&folders.mld).join(&name)).unwrap();
        write_raw_grid(&RasterGrid::filled(g, 55.0), &root.join(&folders.zoo).join(&name)).unwrap();
    }

    #[test]
    fn test_directory_source_maps_sorted_files_to_years() {
        let dir = tempdir().unwrap();
        let folders = LayerFolders::default();
        let years = YearRange::new(1980, 1982);
        for (k, year) in years.iter().enumerate() {
            write_year(dir.path(), &folders, year, 10.0 + k as f64);
        }

        let source = DirectorySource::open(dir.path(), &folders, geometry(), years).unwrap();
        let snap = source.load_year(1981).unwrap();
        assert_eq!(snap.year, 1981);
        assert_eq!(snap.sst.get(0, 0), 11.0);
        assert!((snap.chla_surface.get(2, 3) - 2f64.ln()).abs() < 1e-6);

        assert!(matches!(source.load_year(1990), Err(RasterError::MissingYear(1990))));
    }

    #[test]
    fn test_directory_source_rejects_wrong_file_count() {
        let dir = tempdir().unwrap();
        let folders = LayerFolders::default();
        write_year(dir.path(), &folders, 1980, 12.0);
        write_year(dir.path(), &folders, 1981, 12.0);

        let err = DirectorySource::open(dir.path(), &folders, geometry(), YearRange::new(1980, 1982))
            .unwrap_err();
        assert!(matches!(err, RasterError::FileCount { expected: 3, found: 2, .. }));
    }

    #[test]
    fn test_directory_source_rejects_missing_folder() {
        let dir = tempdir().unwrap();
        let err = DirectorySource::open(
            dir.path(),
            &LayerFolders::default(),
            geometry(),
            YearRange::new(1980, 1980),
        )
        .unwrap_err();
        assert!(matches!(err, RasterError::MissingFolder(_)));
    }

    #[test]
    fn test_directory_source_fails_fast_on_misaligned_file() {
        let dir = tempdir().unwrap();
        let folders = LayerFolders::default();
        write_year(dir.path(), &folders, 1980, 12.0);
        // Overwrite mld with a grid of a different size.
        let other = GridGeometry::new(2, 2, -125.0, 40.0, 0.1, 0.1).unwrap();
        write_raw_grid(
            &RasterGrid::filled(other, 40.0),
            &dir.path().join(&folders.mld).join("layer_1980.raw"),
        )
        .unwrap();

        let source =
            DirectorySource::open(dir.path(), &folders, geometry(), YearRange::new(1980, 1980)).unwrap();
        assert!(matches!(source.load_year(1980), Err(RasterError::CellCount { .. })));
    }

    #[test]
    fn test_same_cell_count_layout_is_read_with_configured_geometry() {
        let dir = tempdir().unwrap();
        let folders = LayerFolders::default();
        write_year(dir.path(), &folders, 1980, 12.0);
        // 4x3 instead of 3x4: same byte count, different layout.
        let swapped = GridGeometry::new(4, 3, -125.0, 40.0, 0.1, 0.1).unwrap();
        write_raw_grid(
            &RasterGrid::from_fn(swapped, |r, c| (r * 3 + c) as f64),
            &dir.path().join(&folders.sst).join("layer_1980.raw"),
        )
        .unwrap();

        let source =
            DirectorySource::open(dir.path(), &folders, geometry(), YearRange::new(1980, 1980)).unwrap();
        let snap = source.load_year(1980).unwrap();
        assert_eq!(snap.sst.shape(), (3, 4));
        assert_eq!(snap.sst.get(1, 0), 4.0);
    }

    #[test]
    fn test_memory_source_reports_missing_year() {
        let source = MemorySource::new();
        assert!(source.is_empty());
        assert!(matches!(source.load_year(2000), Err(RasterError::MissingYear(2000))));
    }
}
