//! Offline replay of recorded telemetry.
//!
//! Telemetry exports are CSV files with the header
//! `id,bus_id,tour_id,latitude,longitude,speed_kmh,status,recorded_at`.
//! Coordinate and speed cells are kept as raw [`Numeric`] text so that a
//! garbled export exercises the same fallbacks as live ingestion. Identifier,
//! status, and timestamp cells must parse; a bad one fails the whole read with
//! [`Error::InvalidTelemetry`].

use std::fs;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, Utc};
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::alerts::{Alert, AlertEngine};
use crate::error::{Error, Result};
use crate::fleet::FleetConfig;
use crate::model::{PositionEvent, PositionStatus};
use crate::numeric::Numeric;

#[derive(Debug, Deserialize)]
struct PositionRow {
    id: String,
    bus_id: String,
    #[serde(default)]
    tour_id: String,
    latitude: String,
    longitude: String,
    #[serde(default)]
    speed_kmh: String,
    #[serde(default)]
    status: String,
    recorded_at: String,
}

/// Read a telemetry CSV file.
pub fn load_positions(path: &Path) -> Result<Vec<PositionEvent>> {
    let file = fs::File::open(path)?;
    read_positions(file)
}

/// Read telemetry rows from any CSV source, in file order.
pub fn read_positions<R: Read>(reader: R) -> Result<Vec<PositionEvent>> {
    let mut csv_reader = ReaderBuilder::new().trim(Trim::Fields).from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let mut positions = Vec::new();
    for result in csv_reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        positions.push(decode_row(&record, &headers, line)?);
    }
    debug!(rows = positions.len(), "telemetry rows decoded");
    Ok(positions)
}

fn decode_row(record: &StringRecord, headers: &StringRecord, line: u64) -> Result<PositionEvent> {
    let invalid = |message: String| Error::InvalidTelemetry { line, message };

    let row: PositionRow = record
        .deserialize(Some(headers))
        .map_err(|e| invalid(e.to_string()))?;

    let id = row
        .id
        .parse()
        .map_err(|e| invalid(format!("invalid id '{}': {e}", row.id)))?;
    let bus_id = row
        .bus_id
        .parse()
        .map_err(|e| invalid(format!("invalid bus_id '{}': {e}", row.bus_id)))?;
    let tour_id = if row.tour_id.is_empty() {
        None
    } else {
        Some(
            row.tour_id
                .parse()
                .map_err(|e| invalid(format!("invalid tour_id '{}': {e}", row.tour_id)))?,
        )
    };
    let status: PositionStatus = row.status.parse().map_err(invalid)?;
    let recorded_at = parse_timestamp(&row.recorded_at)
        .ok_or_else(|| invalid(format!("invalid recorded_at '{}'", row.recorded_at)))?;

    Ok(PositionEvent {
        id,
        bus_id,
        tour_id,
        latitude: Numeric::Text(row.latitude),
        longitude: Numeric::Text(row.longitude),
        speed_kmh: (!row.speed_kmh.is_empty()).then(|| Numeric::Text(row.speed_kmh)),
        status,
        recorded_at,
    })
}

/// RFC 3339, or a naive `YYYY-MM-DD HH:MM:SS[.f]` taken as UTC.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Outcome of replaying a telemetry batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReplayReport {
    /// Rows evaluated.
    pub positions: usize,
    /// Rows skipped because their bus is not in the fleet.
    pub skipped: usize,
    pub alerts: Vec<Alert>,
}

/// Evaluate every position against the fleet, in order.
///
/// Alerts are stamped with the row's `recorded_at`, so a replay is
/// deterministic.
pub fn replay(
    fleet: &FleetConfig,
    positions: &[PositionEvent],
    engine: &AlertEngine,
) -> ReplayReport {
    let mut report = ReplayReport::default();
    for position in positions {
        let Some(bus) = fleet.bus(position.bus_id) else {
            warn!(
                bus_id = position.bus_id,
                position_id = position.id,
                "skipping position for unknown bus"
            );
            report.skipped += 1;
            continue;
        };
        let alerts =
            engine.evaluate_at(position, &bus.limit(), &fleet.zones, position.recorded_at);
        report.positions += 1;
        report.alerts.extend(alerts);
    }
    report
}
