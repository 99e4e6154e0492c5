//! Zones command handler for listing geofence zones.

use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};

use rimgaz_lib::FleetConfig;

use crate::output::{write_json, write_zones_text, OutputFormat, ZoneListing};
use crate::terminal::ColorPalette;

/// Handle the zones subcommand.
///
/// Loads the fleet leniently so zones that fail validation are listed with
/// the reason instead of aborting the command.
pub fn handle_zones(fleet_path: &Path, format: OutputFormat) -> Result<()> {
    let fleet = FleetConfig::from_path_lenient(fleet_path)
        .with_context(|| format!("failed to load fleet from {}", fleet_path.display()))?;
    let listing = ZoneListing::new(&fleet.zones);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Json => write_json(&mut out, &listing)?,
        OutputFormat::Text => write_zones_text(&mut out, &listing, ColorPalette::detect())?,
    }
    out.flush()?;
    Ok(())
}
