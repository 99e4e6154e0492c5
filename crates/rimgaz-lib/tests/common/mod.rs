//! Shared fixture helpers for integration tests.

use std::path::PathBuf;

use rimgaz_lib::FleetConfig;

/// Path to the repository fixtures directory.
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../docs/fixtures")
}

#[allow(dead_code)]
pub fn fleet_path() -> PathBuf {
    fixtures_dir().join("fleet.json")
}

#[allow(dead_code)]
pub fn positions_path() -> PathBuf {
    fixtures_dir().join("positions.csv")
}

/// Fixture fleet loaded through the strict loader.
#[allow(dead_code)]
pub fn fixture_fleet() -> FleetConfig {
    FleetConfig::from_path(&fleet_path()).expect("fixture fleet.json should load")
}
