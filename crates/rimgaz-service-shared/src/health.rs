//! Health check handlers for liveness and readiness checks.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::AppState;

/// Health status response for liveness and readiness checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    /// "ok" or "not_ready: <reason>".
    pub status: String,

    pub service: String,

    pub version: String,

    /// Number of buses in the loaded fleet (readiness only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buses_loaded: Option<usize>,

    /// Number of active geofence zones (readiness only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_zones: Option<usize>,
}

impl HealthStatus {
    pub fn alive(service: &str, version: &str) -> Self {
        Self {
            status: "ok".to_string(),
            service: service.to_string(),
            version: version.to_string(),
            buses_loaded: None,
            active_zones: None,
        }
    }

    pub fn ready(service: &str, version: &str, buses: usize, active_zones: usize) -> Self {
        Self {
            status: "ok".to_string(),
            service: service.to_string(),
            version: version.to_string(),
            buses_loaded: Some(buses),
            active_zones: Some(active_zones),
        }
    }

    pub fn not_ready(service: &str, version: &str, reason: &str) -> Self {
        Self {
            status: format!("not_ready: {}", reason),
            service: service.to_string(),
            version: version.to_string(),
            buses_loaded: None,
            active_zones: None,
        }
    }
}

/// Liveness check handler.
///
/// ```text
/// GET /health/live
/// {"status":"ok","service":"rimgaz-service-shared","version":"0.1.0"}
/// ```
pub async fn health_live() -> impl IntoResponse {
    let status = HealthStatus::alive(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    (StatusCode::OK, Json(status))
}

/// Readiness check handler.
///
/// Ready once at least one bus is loaded. Zero active zones is a valid
/// configuration (geofencing disabled) and does not affect readiness.
///
/// ```text
/// GET /health/ready
/// {"status":"ok","service":"rimgaz-service-shared","version":"0.1.0","buses_loaded":3,"active_zones":2}
/// ```
pub async fn health_ready(State(state): State<AppState>) -> Response {
    let service = env!("CARGO_PKG_NAME");
    let version = env!("CARGO_PKG_VERSION");

    let buses = state.bus_count();
    if buses == 0 {
        let status = HealthStatus::not_ready(service, version, "no buses loaded");
        return (StatusCode::SERVICE_UNAVAILABLE, Json(status)).into_response();
    }

    let status = HealthStatus::ready(service, version, buses, state.active_zone_count());
    (StatusCode::OK, Json(status)).into_response()
}
