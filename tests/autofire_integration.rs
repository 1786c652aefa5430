/// Integration tests for the full auto-fire pipeline
///
/// These tests verify:
/// 1. Reference tables load from files in their on-disk formats
/// 2. Configuration resolves relative paths against its own directory
/// 3. Default and operator plans are validated and written to the settings file
/// 4. Rejected plans leave the settings file as it was
///
/// Everything runs against files in a temporary directory; no acquisition
/// program is started.

use std::fs;
use std::path::Path;

use ctd_autofire::acquisition::{AcquisitionConfig, AcquisitionSettings, SettingsFile};
use ctd_autofire::config;
use ctd_autofire::model::{AutoFireError, LoadError, UserFireEntry};
use ctd_autofire::reference::ReferenceTables;
use ctd_autofire::service::{AutoFireService, ServiceError};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

const STATIONS: &[u8] = b"BY31\tLandsortsdjupet\r\nBY15\tGotlandsdjupet\r\nANHOLT E\tKattegatt\r\nbroken row\r\n\xC5LANDS HAV\tAlands hav\r\n";

const MATRIX: &str = "\
# Standard sampling depths
# blank cell = depth not sampled in basin
djup\tLandsortsdjupet\tGotlandsdjupet\tKattegatt\tAlands hav
0\t0.5\t0.5\t0.5\t0.5
5\t5.1\t5.1\t5.1\t5.1
10\t10.3\t10.3\t10.3\t
20\t\t20.2\t20.2\t
50\t50.5\t50.5\t\t
100\t100.7\t\t\t
\t1\t1\t1\t1
";

const ORDERS: &str = "\
24: [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24]
12: [1, 3, 5, 7, 9, 11, 2, 4, 6, 8, 10, 12]
";

const CONFIG: &str = r#"
[reference]
station_basin_file = "resources/stations.txt"
pressure_matrix_file = "resources/pressure_matrix.txt"
bottle_order_file = "resources/bottle_order.yaml"

[acquisition]
settings_file = "seasave/Seasave.json"
program_path = "Seasave.exe"
"#;

fn write_fixture(dir: &Path, rosette: usize) {
    let resources = dir.join("resources");
    fs::create_dir_all(&resources).expect("create resources dir");
    fs::write(resources.join("stations.txt"), STATIONS).expect("write stations");
    fs::write(resources.join("pressure_matrix.txt"), MATRIX).expect("write matrix");
    fs::write(resources.join("bottle_order.yaml"), ORDERS).expect("write orders");
    fs::write(dir.join("ctd_autofire.toml"), CONFIG).expect("write config");

    let settings = SettingsFile::new(
        dir.join("seasave").join("Seasave.json"),
        AcquisitionSettings { nr_of_water_bottles: rosette, ..Default::default() },
    );
    settings.save().expect("write settings");
}

fn open_service(dir: &Path) -> AutoFireService<SettingsFile> {
    let config = config::load_config(&dir.join("ctd_autofire.toml")).expect("config should load");
    let tables = ReferenceTables::load(&config.reference).expect("reference tables should load");
    let settings = SettingsFile::load(&config.acquisition.settings_file).expect("settings should load");
    AutoFireService::new(tables, settings, config.acquisition.default_total_bottles)
}

fn saved_bottles(dir: &Path) -> Vec<(usize, u32, f64)> {
    let settings = SettingsFile::load(&dir.join("seasave").join("Seasave.json")).expect("settings reload");
    settings
        .auto_fire_bottles()
        .iter()
        .map(|b| (b.index, b.bottle_number, b.fire_at))
        .collect()
}

// ---------------------------------------------------------------------------
// Reference Loading
// ---------------------------------------------------------------------------

#[test]
fn test_reference_tables_load_from_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_fixture(dir.path(), 24);
    let service = open_service(dir.path());

    let tables = service.tables();
    assert_eq!(tables.stations.len(), 4, "the malformed station row is skipped");
    assert_eq!(tables.stations.basin_for("ålands hav"), Some("ALANDS HAV"));
    assert_eq!(tables.pressures.depths(), &[0, 5, 10, 20, 50, 100]);
    assert_eq!(tables.pressures.basins().len(), 4);
    assert_eq!(tables.bottle_orders.bottle_counts(), vec![12, 24]);
}

#[test]
fn test_missing_reference_file_fails_fast() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_fixture(dir.path(), 24);
    fs::remove_file(dir.path().join("resources").join("bottle_order.yaml")).expect("remove");

    let config = config::load_config(&dir.path().join("ctd_autofire.toml")).expect("config");
    let result = ReferenceTables::load(&config.reference);
    assert!(matches!(result, Err(LoadError::Io { .. })), "got {:?}", result.map(|_| ()));
}

// ---------------------------------------------------------------------------
// Default Plans
// ---------------------------------------------------------------------------

#[test]
fn test_default_plan_written_to_settings() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_fixture(dir.path(), 24);
    let mut service = open_service(dir.path());

    let plan = service.apply_default_plan("by31").expect("BY31 default plan");
    assert_eq!(
        plan.iter().map(|e| e.depth).collect::<Vec<_>>(),
        vec![Some(0), Some(5), Some(10), Some(50), Some(100)],
        "depth 20 has no pressure for Landsortsdjupet"
    );
    assert_eq!(plan.bottle_numbers(), vec![5, 4, 3, 2, 1]);

    assert_eq!(
        saved_bottles(dir.path()),
        vec![(0, 5, 0.5), (1, 4, 5.1), (2, 3, 10.3), (3, 2, 50.5), (4, 1, 100.7)]
    );
}

#[test]
fn test_plan_with_smaller_rosette_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_fixture(dir.path(), 12);
    let service = open_service(dir.path());

    let plan = service
        .auto_fire_info_for_station("BY15", Some(12), Some(3))
        .expect("12-bottle plan");
    assert_eq!(plan.bottle_numbers(), vec![5, 3, 1]);
    assert_eq!(plan.iter().map(|e| e.fire_at).collect::<Vec<_>>(), vec![0.5, 5.1, 10.3]);
}

#[test]
fn test_default_plan_too_large_for_rosette_is_not_written() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_fixture(dir.path(), 4);
    let mut service = open_service(dir.path());

    let result = service.apply_default_plan("BY31");
    assert!(
        matches!(
            result,
            Err(ServiceError::AutoFire(AutoFireError::TooManyDepths { depths: 5, capacity: 4 }))
        ),
        "got {:?}",
        result
    );
    assert!(saved_bottles(dir.path()).is_empty(), "settings file must be unchanged");
}

#[test]
fn test_unknown_station_is_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_fixture(dir.path(), 24);
    let mut service = open_service(dir.path());

    let result = service.apply_default_plan("ZZZZ");
    assert!(
        matches!(result, Err(ServiceError::AutoFire(AutoFireError::UnknownStation { .. }))),
        "got {:?}",
        result
    );
    assert!(saved_bottles(dir.path()).is_empty());
}

// ---------------------------------------------------------------------------
// Operator Plans
// ---------------------------------------------------------------------------

#[test]
fn test_user_plan_written_deepest_first_with_offsets() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_fixture(dir.path(), 24);
    let mut service = open_service(dir.path());

    let entries = [
        UserFireEntry::new(5, 10),
        UserFireEntry::new(20, 11).with_offset(-0.2),
        UserFireEntry::new(10, 12).with_offset(2.0),
    ];
    service.apply_user_plan("anholt e", &entries).expect("Kattegatt user plan");

    let saved = saved_bottles(dir.path());
    assert_eq!(saved.len(), 3);
    assert_eq!(saved.iter().map(|b| b.1).collect::<Vec<_>>(), vec![11, 12, 10]);
    assert!((saved[0].2 - 20.0).abs() < 1e-9, "20.2 - 0.2, got {}", saved[0].2);
    assert!((saved[1].2 - 12.3).abs() < 1e-9, "10.3 + 2, got {}", saved[1].2);
    assert!((saved[2].2 - 5.1).abs() < 1e-9);
}

#[test]
fn test_user_plan_with_unsampled_depth_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_fixture(dir.path(), 24);
    let mut service = open_service(dir.path());

    let result = service.apply_user_plan("ANHOLT E", &[UserFireEntry::new(50, 1)]);
    assert!(
        matches!(
            result,
            Err(ServiceError::AutoFire(AutoFireError::UndefinedDepth { depth: 50, .. }))
        ),
        "got {:?}",
        result
    );
}

#[test]
fn test_user_plan_with_nan_offset_keeps_settings_loadable() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_fixture(dir.path(), 24);
    let mut service = open_service(dir.path());

    let result = service.apply_user_plan("BY31", &[UserFireEntry::new(10, 1).with_offset(f64::NAN)]);
    assert!(
        matches!(result, Err(ServiceError::AutoFire(AutoFireError::InvalidOffset { depth: 10, .. }))),
        "got {:?}",
        result
    );
    assert!(saved_bottles(dir.path()).is_empty(), "settings file must still load and be unchanged");
}

// ---------------------------------------------------------------------------
// Auto-fire Switches
// ---------------------------------------------------------------------------

#[test]
fn test_auto_fire_switch_persists() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_fixture(dir.path(), 24);
    let mut service = open_service(dir.path());

    service.set_auto_fire(true).expect("switch on");
    service.set_min_pressure_or_depth(2.0).expect("min pressure");

    let settings = SettingsFile::load(&dir.path().join("seasave").join("Seasave.json")).expect("reload");
    assert!(settings.auto_fire());
    assert!(settings.settings().auto_fire_allow_manual_firing);
    assert_eq!(settings.min_pressure_or_depth(), 2.0);
}
