//! Replay command handler.
//!
//! Runs a telemetry CSV through the alert engine offline. Each alert is
//! stamped with the row's `recorded_at`, so replaying the same file twice
//! prints the same report.

use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};

use rimgaz_lib::{load_positions, replay, AlertEngine, FleetConfig, ReplayReport};

use crate::output::{write_json, write_replay_text, OutputFormat};
use crate::terminal::ColorPalette;

/// Handle the replay subcommand.
pub fn handle_replay(fleet_path: &Path, positions_path: &Path, format: OutputFormat) -> Result<()> {
    let report = run_replay(fleet_path, positions_path)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Json => write_json(&mut out, &report)?,
        OutputFormat::Text => write_replay_text(&mut out, &report, ColorPalette::detect())?,
    }
    out.flush()?;
    Ok(())
}

/// Load both files and replay the positions against the fleet.
pub fn run_replay(fleet_path: &Path, positions_path: &Path) -> Result<ReplayReport> {
    let fleet = FleetConfig::from_path_lenient(fleet_path)
        .with_context(|| format!("failed to load fleet from {}", fleet_path.display()))?;
    let positions = load_positions(positions_path).with_context(|| {
        format!("failed to read telemetry from {}", positions_path.display())
    })?;

    tracing::info!(
        positions = positions.len(),
        buses = fleet.buses.len(),
        active_zones = fleet.active_zone_count(),
        "replaying telemetry"
    );

    Ok(replay(&fleet, &positions, &AlertEngine::new()))
}
