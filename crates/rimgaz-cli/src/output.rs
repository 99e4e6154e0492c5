//! Output formatting for zone listings and replay reports.
//!
//! Renderers write to any [`Write`] so they can be exercised against a
//! buffer; the command handlers pass a locked stdout.

use std::io::{self, Write};

use clap::ValueEnum;
use serde::Serialize;

use rimgaz_lib::{Alert, AlertKind, GeofenceZone, ReplayReport};

use crate::terminal::ColorPalette;

/// Output format selected with `--format`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// Pretty-printed JSON document.
    Json,
}

/// One row of the `zones` listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoneSummary {
    pub id: i64,
    pub name: String,
    pub shape: &'static str,
    pub is_active: bool,
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub problem: Option<String>,
}

impl ZoneSummary {
    pub fn from_zone(zone: &GeofenceZone) -> Self {
        let problem = zone.validate().err().map(|e| e.to_string());
        Self {
            id: zone.id,
            name: zone.name.clone(),
            shape: zone.shape().kind(),
            is_active: zone.is_active,
            valid: problem.is_none(),
            problem,
        }
    }
}

/// The `zones` listing as rendered for `--format json`.
#[derive(Debug, Serialize)]
pub struct ZoneListing {
    pub count: usize,
    pub active: usize,
    pub invalid: usize,
    pub zones: Vec<ZoneSummary>,
}

impl ZoneListing {
    pub fn new(zones: &[GeofenceZone]) -> Self {
        let zones: Vec<ZoneSummary> = zones.iter().map(ZoneSummary::from_zone).collect();
        Self {
            count: zones.len(),
            active: zones.iter().filter(|z| z.is_active).count(),
            invalid: zones.iter().filter(|z| !z.valid).count(),
            zones,
        }
    }
}

/// Write any serializable value as pretty JSON followed by a newline.
pub fn write_json<W: Write, T: Serialize>(out: &mut W, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Render the zone listing. A note follows when no zone is active, since
/// geofence checks are then skipped.
///
/// ```text
/// Geofence zones (3 total, 2 active):
///   [1] Depot (circle, active): ok
///   [3] Airport (circle, inactive): ok
/// ```
pub fn write_zones_text<W: Write>(
    out: &mut W,
    listing: &ZoneListing,
    palette: ColorPalette,
) -> io::Result<()> {
    if listing.zones.is_empty() {
        writeln!(out, "No geofence zones configured; geofence checks are disabled.")?;
        return Ok(());
    }

    writeln!(
        out,
        "Geofence zones ({} total, {} active):",
        listing.count, listing.active
    )?;
    for zone in &listing.zones {
        let state = if zone.is_active {
            "active".to_string()
        } else {
            format!("{}inactive{}", palette.gray, palette.reset)
        };
        let status = match &zone.problem {
            None => format!("{}ok{}", palette.green, palette.reset),
            Some(problem) => format!("{}INVALID{} ({})", palette.red, palette.reset, problem),
        };
        writeln!(
            out,
            "  [{}] {}{}{} ({}, {}): {}",
            zone.id, palette.white_bold, zone.name, palette.reset, zone.shape, state, status
        )?;
    }
    if listing.invalid > 0 {
        writeln!(out, "{} zone(s) failed validation.", listing.invalid)?;
    }
    if listing.active == 0 {
        writeln!(out, "No active geofence zones; geofence checks are disabled.")?;
    }
    Ok(())
}

fn alert_tag(kind: AlertKind, palette: ColorPalette) -> String {
    let (color, label) = match kind {
        AlertKind::Speed => (palette.tag_speed, "SPEED"),
        AlertKind::Geofence => (palette.tag_geofence, "GEOFENCE"),
    };
    format!("{color}{label:<8}{}", palette.reset)
}

fn write_alert_line<W: Write>(out: &mut W, alert: &Alert, palette: ColorPalette) -> io::Result<()> {
    writeln!(
        out,
        "{} bus {} position {} {}{}{}  {}",
        alert_tag(alert.alert_type, palette),
        alert.bus_id,
        alert.position_id,
        palette.gray,
        alert.created_at.format("%Y-%m-%dT%H:%M:%SZ"),
        palette.reset,
        alert.message
    )
}

/// Render a replay report: one line per alert, then a summary line.
pub fn write_replay_text<W: Write>(
    out: &mut W,
    report: &ReplayReport,
    palette: ColorPalette,
) -> io::Result<()> {
    for alert in &report.alerts {
        write_alert_line(out, alert, palette)?;
    }
    if report.alerts.is_empty() {
        writeln!(out, "No alerts raised.")?;
    }
    writeln!(
        out,
        "Replayed {} position(s), skipped {}, raised {} alert(s).",
        report.positions,
        report.skipped,
        report.alerts.len()
    )
}
