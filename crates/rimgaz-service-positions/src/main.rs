//! Rimgaz position ingestion service.
//!
//! # Configuration
//!
//! - `RIMGAZ_FLEET_PATH` - Path to the fleet JSON file (default: /data/fleet.json)
//! - `RUST_LOG` - Log level (default: info)
//! - `LOG_FORMAT` - Log format: json (default) or text
//! - `SERVICE_PORT` - HTTP port (default: 8080)
//! - `METRICS_ENABLED` / `METRICS_PATH` - Prometheus endpoint (default: enabled, /metrics)
//! - `RIMGAZ_STORE_CAPACITY` - Positions and alerts kept in memory, each (default: 10000)

use std::env;
use std::net::SocketAddr;

use tracing::{error, info};

use rimgaz_service_shared::{
    AppState, LoggingConfig, MetricsConfig, StoreConfig, init_logging, init_metrics,
    record_active_zones,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logging_config = LoggingConfig::from_env().with_service("positions");
    init_logging(&logging_config);

    let metrics_config = MetricsConfig::from_env();
    if let Err(e) = init_metrics(&metrics_config) {
        tracing::warn!(error = %e, "failed to initialize metrics, continuing without metrics");
    }

    let fleet_path =
        env::var("RIMGAZ_FLEET_PATH").unwrap_or_else(|_| "/data/fleet.json".to_string());
    let port: u16 = env::var("SERVICE_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    let store_config = StoreConfig::from_env();

    info!(
        fleet_path = %fleet_path,
        port = port,
        store_capacity = store_config.capacity,
        "starting positions service"
    );

    let state = AppState::load_with_store(&fleet_path, store_config).map_err(|e| {
        error!(error = %e, path = %fleet_path, "failed to load application state");
        e
    })?;

    record_active_zones(state.active_zone_count());
    info!(
        buses = state.bus_count(),
        active_zones = state.active_zone_count(),
        "application state loaded"
    );

    let metrics_path = if metrics_config.path.starts_with('/') {
        metrics_config.path.clone()
    } else {
        format!("/{}", metrics_config.path)
    };
    let app = rimgaz_service_positions::router(state, &metrics_path);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(addr = %addr, "listening on");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
