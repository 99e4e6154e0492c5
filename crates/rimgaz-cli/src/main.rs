use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use rimgaz_cli::commands::{replay::handle_replay, zones::handle_zones};
use rimgaz_cli::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(author, version, about = "Rimgaz fleet telemetry utilities")]
struct Cli {
    /// Fleet configuration file (buses and geofence zones).
    #[arg(long)]
    fleet: PathBuf,

    /// Output format.
    #[arg(long, value_enum, global = true, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List geofence zones with their shape, active flag, and validation status.
    Zones,
    /// Replay a telemetry CSV through the alert engine and report alerts.
    Replay {
        /// Telemetry CSV with columns id,bus_id,tour_id,latitude,longitude,speed_kmh,status,recorded_at.
        #[arg(long)]
        positions: PathBuf,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Zones => handle_zones(&cli.fleet, cli.format),
        Command::Replay { positions } => handle_replay(&cli.fleet, &positions, cli.format),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
