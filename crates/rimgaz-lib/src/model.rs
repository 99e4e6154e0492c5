//! Telemetry domain records shared by the evaluator, the service, and the CLI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geodesy::LatLon;
use crate::numeric::{parse_optional, Numeric};

pub type BusId = i64;
pub type TourId = i64;
pub type PositionId = i64;
pub type ZoneId = i64;

/// Operational state reported alongside each GPS sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionStatus {
    #[default]
    OnTour,
    Paused,
    Returning,
    Offline,
}

impl PositionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionStatus::OnTour => "on_tour",
            PositionStatus::Paused => "paused",
            PositionStatus::Returning => "returning",
            PositionStatus::Offline => "offline",
        }
    }
}

impl std::fmt::Display for PositionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PositionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "on_tour" | "" => Ok(PositionStatus::OnTour),
            "paused" => Ok(PositionStatus::Paused),
            "returning" => Ok(PositionStatus::Returning),
            "offline" => Ok(PositionStatus::Offline),
            other => Err(format!("unknown position status '{other}'")),
        }
    }
}

/// One telemetry sample. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionEvent {
    pub id: PositionId,
    pub bus_id: BusId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tour_id: Option<TourId>,
    pub latitude: Numeric,
    pub longitude: Numeric,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_kmh: Option<Numeric>,
    #[serde(default)]
    pub status: PositionStatus,
    pub recorded_at: DateTime<Utc>,
}

impl PositionEvent {
    /// Parsed coordinates, or `None` if either component is malformed.
    pub fn coordinates(&self) -> Option<LatLon> {
        let lat = self.latitude.as_f64()?;
        let lon = self.longitude.as_f64()?;
        Some(LatLon::new(lat, lon))
    }
}

/// A vehicle of the delivery fleet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bus {
    pub id: BusId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plate_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_speed_kmh: Option<Numeric>,
}

impl Bus {
    /// The subset of the bus record the alert engine reads.
    pub fn limit(&self) -> BusLimit {
        BusLimit {
            bus_id: self.id,
            max_speed_kmh: self.max_speed_kmh.clone(),
        }
    }
}

/// Speed limit configuration for one bus. `None` disables the speed check.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BusLimit {
    pub bus_id: BusId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_speed_kmh: Option<Numeric>,
}

impl BusLimit {
    pub fn new(bus_id: BusId, max_speed_kmh: Option<Numeric>) -> Self {
        Self {
            bus_id,
            max_speed_kmh,
        }
    }

    pub fn max_speed(&self) -> Option<f64> {
        parse_optional(self.max_speed_kmh.as_ref())
    }
}
