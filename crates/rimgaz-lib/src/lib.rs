//! Rimgaz telemetry core.
//!
//! This crate turns raw bus telemetry into alerts: geodesic primitives, zone
//! containment, the speed guard, and the [`AlertEngine`] that combines them.
//! Fleet configuration loading and CSV replay sit alongside so the HTTP
//! service and the CLI share one implementation instead of reimplementing
//! behaviour.

#![deny(warnings)]

pub mod alerts;
pub mod error;
pub mod fleet;
pub mod geodesy;
pub mod model;
pub mod numeric;
pub mod replay;
pub mod speed;
pub mod zones;

pub use alerts::{Alert, AlertEngine, AlertKind, GEOFENCE_MESSAGE};
pub use error::{Error, Result};
pub use fleet::FleetConfig;
pub use geodesy::{distance_between, distance_meters, point_in_polygon, LatLon, EARTH_RADIUS_M};
pub use model::{
    Bus, BusId, BusLimit, PositionEvent, PositionId, PositionStatus, TourId, ZoneId,
};
pub use numeric::Numeric;
pub use replay::{load_positions, read_positions, replay, ReplayReport};
pub use speed::exceeds_limit;
pub use zones::{active_zones, is_inside_any_zone, GeofenceZone, Vertex, ZoneShape};
