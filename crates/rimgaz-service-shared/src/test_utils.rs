//! Test utilities for handler testing.
//!
//! Every call to [`test_state`] returns a fresh [`AppState`] built from the
//! fixture fleet, so tests never see each other's positions or alerts.

use std::path::PathBuf;
use std::sync::OnceLock;

use rimgaz_lib::FleetConfig;

use crate::state::AppState;

/// Path to the fixture fleet file.
pub const TEST_FIXTURE_PATH: &str =
    concat!(env!("CARGO_MANIFEST_DIR"), "/../../docs/fixtures/fleet.json");

static FIXTURE_FLEET: OnceLock<FleetConfig> = OnceLock::new();

/// The fixture fleet, parsed once per test binary.
///
/// # Panics
///
/// Panics if the fixture cannot be loaded, which indicates a broken checkout.
pub fn fixture_fleet() -> FleetConfig {
    FIXTURE_FLEET
        .get_or_init(|| {
            let path = fixture_fleet_path();
            FleetConfig::from_path(&path)
                .unwrap_or_else(|e| panic!("failed to load test fixture from {:?}: {}", path, e))
        })
        .clone()
}

/// Fresh application state over the fixture fleet.
pub fn test_state() -> AppState {
    AppState::from_fleet(fixture_fleet())
}

/// Application state with no buses and no zones.
pub fn empty_state() -> AppState {
    AppState::from_fleet(FleetConfig::default())
}

pub fn fixture_fleet_path() -> PathBuf {
    PathBuf::from(TEST_FIXTURE_PATH)
}

/// Ids and coordinates from `docs/fixtures/fleet.json`.
pub mod fixture_fleet_ids {
    /// "Bus 1", limit "60.00" km/h.
    pub const BUS_LIMITED_60: i64 = 1;

    /// "Bus 2", limit 50 km/h.
    pub const BUS_LIMITED_50: i64 = 2;

    /// "Bus 3", no speed limit.
    pub const BUS_UNLIMITED: i64 = 3;

    /// A bus id absent from the fixture.
    pub const BUS_UNKNOWN: i64 = 99;

    /// Circle centred on the depot, radius 1500 m.
    pub const ZONE_DEPOT: i64 = 1;

    /// Inactive circle.
    pub const ZONE_AIRPORT: i64 = 3;

    /// Inside the depot circle.
    pub const DEPOT: (f64, f64) = (18.0861, -15.9751);

    /// Outside every active zone.
    pub const OPEN_DESERT: (f64, f64) = (18.2, -15.9);
}

/// Generate a unique request ID for testing.
pub fn test_request_id() -> String {
    format!("test-{}", uuid::Uuid::now_v7())
}
