// Test utilities used across `rimgaz-cli` unit tests.
// Kept under `#[cfg(test)]` so it is not part of the public crate API.
use std::io::{self, Write};

use chrono::{Duration, TimeZone, Utc};
use rimgaz_lib::{Alert, AlertKind};

/// Alert for `bus_id`/`position_id` stamped `position_id * 5` minutes after
/// 2025-03-01T06:55:00Z, matching the fixture CSV cadence.
pub fn alert_at(bus_id: i64, position_id: i64, kind: AlertKind, message: &str) -> Alert {
    let base = Utc.with_ymd_and_hms(2025, 3, 1, 6, 55, 0).unwrap();
    Alert {
        bus_id,
        position_id,
        alert_type: kind,
        message: message.to_string(),
        is_resolved: false,
        created_at: base + Duration::minutes(position_id * 5),
    }
}

/// Run a renderer against an in-memory buffer and return what it wrote.
pub fn render<F>(write: F) -> String
where
    F: FnOnce(&mut Vec<u8>) -> io::Result<()>,
{
    let mut buf = Vec::new();
    write(&mut buf).unwrap();
    buf.flush().unwrap();
    String::from_utf8(buf).unwrap()
}
