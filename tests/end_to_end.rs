//! Full runs from raster files on disk to the CSV table.

use std::f64::consts::E;
use std::path::Path;

use oceansim::config::{SimulationConfig, YearRange};
use oceansim::export::write_table_csv;
use oceansim::raster::{
    write_raw_grid, DirectorySource, GridGeometry, LayerFolders, MemorySource, RasterError,
    RasterGrid, RasterSource, RawLayers,
};
use oceansim::simulation::{Simulation, SimulationError};
use oceansim::suitability::{build_trophic_surfaces, SpeciesConfig};
use tempfile::tempdir;

fn geometry() -> GridGeometry {
    GridGeometry::new(4, 4, -134.0, 48.0, 0.1, 0.1).unwrap()
}

fn constant_layers() -> RawLayers {
    let g = geometry();
    RawLayers {
        sst: RasterGrid::filled(g, 15.0),
        mld: RasterGrid::filled(g, 50.0),
        zoo: RasterGrid::filled(g, 50.0),
        chla_surface: RasterGrid::filled(g, E),
    }
}

fn write_years(root: &Path, years: YearRange, layers: &RawLayers) {
    let folders = LayerFolders::default();
    for year in years.iter() {
        let name = format!("{}.raw", year);
        write_raw_grid(&layers.sst, &root.join(&folders.sst).join(&name)).unwrap();
        write_raw_grid(&layers.mld, &root.join(&folders.mld).join(&name)).unwrap();
        write_raw_grid(&layers.zoo, &root.join(&folders.zoo).join(&name)).unwrap();
        write_raw_grid(&layers.chla_surface, &root.join(&folders.chla_surface).join(&name))
            .unwrap();
    }
}

fn config(years: YearRange) -> SimulationConfig {
    let mut config = SimulationConfig::default();
    config.years = years;
    config.raster.geometry = geometry();
    config
}

#[test]
fn test_constant_environment_end_to_end() {
    let years = YearRange::new(1980, 1982);
    let dir = tempdir().unwrap();
    write_years(dir.path(), years, &constant_layers());

    let config = config(years);
    let source =
        DirectorySource::open(dir.path(), &config.raster.folders, geometry(), years).unwrap();

    let snapshot = source.load_year(1981).unwrap();
    assert!(snapshot
        .chla_surface
        .values()
        .iter()
        .all(|v| (v - 1.0).abs() < 1e-6));

    let surfaces = build_trophic_surfaces(&snapshot, &SpeciesConfig::default()).unwrap();
    assert!(surfaces.prey.grid().values().iter().all(|v| (v - 1.0).abs() < 1e-9));
    assert!(surfaces
        .predator
        .grid()
        .values()
        .iter()
        .all(|v| (v - 1.0).abs() < 1e-9));

    let table = Simulation::new(config).unwrap().run(&source).unwrap();
    assert_eq!(table.len(), 300);

    for (i, year) in years.iter().enumerate() {
        let block = table.year_block(year).unwrap();
        assert_eq!(block.len(), 100);
        assert!(block.iter().all(|r| r.year == year));
        assert_eq!(table.rows()[i * 100].year, year);
    }

    for row in table.rows() {
        assert!((row.suitability - 1.0).abs() < 1e-9);
        assert_eq!(row.sst, 15.0);
        assert_eq!(row.mld, 50.0);
        assert_eq!(row.zoo_200, 50.0);
        assert!((row.chla_surface - 1.0).abs() < 1e-6);
        assert!(row.lon >= -134.0 && row.lon <= -133.6);
        assert!(row.lat <= 48.0 && row.lat >= 47.6);
        if row.pres == 0 {
            assert_eq!(row.abundance, 0.0);
        }
    }

    // Every cell is near-certainly present, so absences are borrowed.
    assert_eq!(table.fallback_years().len(), 3);

    let csv = dir.path().join("occurrences.csv");
    write_table_csv(&table, &csv).unwrap();
    let text = std::fs::read_to_string(&csv).unwrap();
    assert_eq!(text.lines().count(), 301);
    assert!(text.starts_with("lon,lat,year,pres,suitability,sst,zoo_200,chla_surface,mld,abundance\n"));
}

#[test]
fn test_non_positive_chlorophyll_is_a_domain_error() {
    let years = YearRange::new(1980, 1982);
    let mut layers = constant_layers();
    layers.chla_surface.set(2, 1, 0.0);
    let source = MemorySource::repeated(years, layers);

    let result = Simulation::new(config(years)).unwrap().run(&source);
    match result {
        Err(SimulationError::Raster { source, .. }) => assert!(matches!(
            source,
            RasterError::NonPositiveChlorophyll { row: 2, col: 1, .. }
        )),
        other => panic!("expected chlorophyll error, got {:?}", other.map(|t| t.len())),
    }
}

#[test]
fn test_parallel_and_sequential_tables_match() {
    let years = YearRange::new(2050, 2057);
    let g = GridGeometry::new(20, 25, -134.0, 48.0, 0.1, 0.1).unwrap();
    let mut source = MemorySource::new();
    for (i, year) in years.iter().enumerate() {
        let warm = 0.3 * i as f64;
        source.insert(
            year,
            RawLayers {
                sst: RasterGrid::from_fn(g, |r, c| 8.0 + warm + 0.4 * r as f64 + 0.1 * c as f64),
                mld: RasterGrid::from_fn(g, |r, c| 10.0 + 3.0 * (r + c) as f64),
                zoo: RasterGrid::from_fn(g, |r, _| if r == 0 { f64::NAN } else { 20.0 + 2.5 * r as f64 }),
                chla_surface: RasterGrid::from_fn(g, |_, c| 0.1 + 0.05 * c as f64),
            },
        );
    }

    let mut config = SimulationConfig::default();
    config.years = years;
    config.raster.geometry = g;
    config.sampling.samples_per_year = 60;

    let mut sequential = config.clone();
    sequential.parallel = false;

    let a = Simulation::new(config).unwrap().run(&source).unwrap();
    let b = Simulation::new(sequential).unwrap().run(&source).unwrap();
    assert_eq!(a.len(), 8 * 60);
    assert_eq!(a.rows(), b.rows());

    // Cells with missing zooplankton are never sampled.
    assert!(a.rows().iter().all(|r| r.zoo_200.is_finite()));
}

#[test]
fn test_wrong_file_count_fails_to_open() {
    let dir = tempdir().unwrap();
    write_years(dir.path(), YearRange::new(1980, 1981), &constant_layers());

    let result = DirectorySource::open(
        dir.path(),
        &LayerFolders::default(),
        geometry(),
        YearRange::new(1980, 1982),
    );
    assert!(matches!(result, Err(RasterError::FileCount { expected: 3, found: 2, .. })));
}
