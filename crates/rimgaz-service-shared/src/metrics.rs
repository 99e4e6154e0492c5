//! Prometheus metrics for the telemetry services.
//!
//! HTTP request metrics are recorded by [`MetricsLayer`](crate::MetricsLayer);
//! the helpers at the bottom of this module record ingestion and alerting
//! counters from handlers.
//!
//! # Example
//!
//! ```no_run
//! use rimgaz_service_shared::metrics::{MetricsConfig, init_metrics, metrics_handler};
//! use axum::{Router, routing::get};
//!
//! let config = MetricsConfig::from_env();
//! init_metrics(&config).expect("failed to initialize metrics");
//!
//! let app: Router = Router::new().route(&config.path, get(metrics_handler));
//! ```

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

static PROMETHEUS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Configuration for the metrics system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    /// Path for the metrics endpoint (e.g., "/metrics").
    pub path: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/metrics".to_string(),
        }
    }
}

impl MetricsConfig {
    /// Create configuration from `METRICS_ENABLED` and `METRICS_PATH`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable lookup.
    ///
    /// Anything other than a case-insensitive "false" keeps metrics enabled.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let enabled = lookup("METRICS_ENABLED")
            .map(|v| !v.trim().eq_ignore_ascii_case("false"))
            .unwrap_or(true);
        let path = lookup("METRICS_PATH").unwrap_or_else(|| "/metrics".to_string());

        Self { enabled, path }
    }
}

/// Install the Prometheus recorder.
///
/// Must be called once at startup before any metrics are recorded.
///
/// # Errors
///
/// Returns an error if metrics are disabled, the recorder is already
/// installed, or the Prometheus builder fails.
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    if !config.enabled {
        return Err(MetricsError::Disabled);
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| MetricsError::InstallFailed(e.to_string()))?;

    PROMETHEUS_HANDLE
        .set(handle)
        .map_err(|_| MetricsError::AlreadyInitialized)?;

    Ok(())
}

/// Returns `None` if [`init_metrics`] has not been called.
pub fn prometheus_handle() -> Option<&'static PrometheusHandle> {
    PROMETHEUS_HANDLE.get()
}

/// Axum handler for the metrics endpoint (Prometheus exposition format).
pub async fn metrics_handler() -> String {
    PROMETHEUS_HANDLE
        .get()
        .map(|h| h.render())
        .unwrap_or_else(|| "# Metrics not initialized\n".to_string())
}

/// Errors that can occur during metrics initialization.
#[derive(Debug, Clone)]
pub enum MetricsError {
    Disabled,
    AlreadyInitialized,
    InstallFailed(String),
}

impl std::fmt::Display for MetricsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricsError::Disabled => write!(f, "metrics are disabled"),
            MetricsError::AlreadyInitialized => write!(f, "metrics recorder already initialized"),
            MetricsError::InstallFailed(e) => {
                write!(f, "failed to install metrics recorder: {}", e)
            }
        }
    }
}

impl std::error::Error for MetricsError {}

// =============================================================================
// Business Metrics Helpers
// =============================================================================

/// Increment `rimgaz_positions_ingested_total`.
///
/// `status` is the reported operational status (e.g. "on_tour", "paused").
pub fn record_position_ingested(status: &str) {
    metrics::counter!(
        "rimgaz_positions_ingested_total",
        "status" => status.to_string()
    )
    .increment(1);
}

/// Increment `rimgaz_positions_rejected_total`.
///
/// `reason` is a short machine label such as "validation_error" or "unknown_bus".
pub fn record_position_rejected(reason: &str) {
    metrics::counter!(
        "rimgaz_positions_rejected_total",
        "reason" => reason.to_string()
    )
    .increment(1);
}

/// Increment `rimgaz_alerts_raised_total` for one alert of the given kind.
pub fn record_alert_raised(kind: &str) {
    metrics::counter!(
        "rimgaz_alerts_raised_total",
        "kind" => kind.to_string()
    )
    .increment(1);
}

pub fn record_alert_resolved() {
    metrics::counter!("rimgaz_alerts_resolved_total").increment(1);
}

/// Set the `rimgaz_active_zones` gauge.
pub fn record_active_zones(count: usize) {
    metrics::gauge!("rimgaz_active_zones").set(count as f64);
}
