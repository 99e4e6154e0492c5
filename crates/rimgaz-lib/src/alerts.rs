//! Alert evaluation for a single telemetry sample.
//!
//! [`AlertEngine::evaluate`] runs two independent checks against one
//! [`PositionEvent`]:
//!
//! - **speed**: reported speed strictly above the bus maximum;
//! - **geofence**: position outside every active zone.
//!
//! The geofence check only runs when at least one zone is active. With no
//! active zones geofencing is considered unconfigured, so no "outside all
//! zones" alert is raised. Malformed position coordinates abort the geofence
//! check alone; the speed check is unaffected.
//!
//! Evaluation is stateless. Consecutive violating samples each raise a new
//! alert; suppression, if wanted, belongs to whoever persists the alerts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{BusId, BusLimit, PositionEvent, PositionId};
use crate::speed::exceeds_limit;
use crate::zones::{active_zones, is_inside_any_zone, GeofenceZone};

/// Message attached to every geofence alert.
pub const GEOFENCE_MESSAGE: &str = "Bus outside authorized zones";

/// Category of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Speed,
    Geofence,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::Speed => "speed",
            AlertKind::Geofence => "geofence",
        }
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An alert raised for one position sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub bus_id: BusId,
    pub position_id: PositionId,
    pub alert_type: AlertKind,
    pub message: String,
    #[serde(default)]
    pub is_resolved: bool,
    pub created_at: DateTime<Utc>,
}

impl Alert {
    fn new(
        position: &PositionEvent,
        alert_type: AlertKind,
        message: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            bus_id: position.bus_id,
            position_id: position.id,
            alert_type,
            message,
            is_resolved: false,
            created_at: now,
        }
    }

    /// Mark the alert resolved. Resolving twice is a no-op.
    pub fn resolve(&mut self) {
        self.is_resolved = true;
    }
}

/// Stateless evaluator turning one position into zero, one, or two alerts.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlertEngine;

impl AlertEngine {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate a position, stamping alerts with the current time.
    pub fn evaluate(
        &self,
        position: &PositionEvent,
        bus: &BusLimit,
        zones: &[GeofenceZone],
    ) -> Vec<Alert> {
        self.evaluate_at(position, bus, zones, Utc::now())
    }

    /// Evaluate a position with an explicit creation timestamp.
    ///
    /// `zones` may contain inactive zones; only the active subset is used.
    /// At most one speed alert and one geofence alert are returned, speed first.
    pub fn evaluate_at(
        &self,
        position: &PositionEvent,
        bus: &BusLimit,
        zones: &[GeofenceZone],
        now: DateTime<Utc>,
    ) -> Vec<Alert> {
        let mut alerts = Vec::with_capacity(2);

        if exceeds_limit(position.speed_kmh.as_ref(), bus.max_speed_kmh.as_ref()) {
            let speed = position
                .speed_kmh
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default();
            let max = bus
                .max_speed_kmh
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default();
            alerts.push(Alert::new(
                position,
                AlertKind::Speed,
                format!("Speed {speed} km/h exceeds limit {max} km/h"),
                now,
            ));
        }

        if let Some(alert) = self.check_geofence(position, zones, now) {
            alerts.push(alert);
        }

        alerts
    }

    fn check_geofence(
        &self,
        position: &PositionEvent,
        zones: &[GeofenceZone],
        now: DateTime<Utc>,
    ) -> Option<Alert> {
        let mut active = active_zones(zones).peekable();
        active.peek()?;

        let Some(point) = position.coordinates() else {
            debug!(
                bus_id = position.bus_id,
                position_id = position.id,
                latitude = %position.latitude,
                longitude = %position.longitude,
                "malformed coordinates, skipping geofence check"
            );
            return None;
        };

        if is_inside_any_zone(point.lat, point.lon, active) {
            return None;
        }

        Some(Alert::new(
            position,
            AlertKind::Geofence,
            GEOFENCE_MESSAGE.to_string(),
            now,
        ))
    }
}
