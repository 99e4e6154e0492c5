//! Shared infrastructure for the Rimgaz telemetry HTTP services.
//!
//! - [`AppState`]: fleet, zone snapshot, alert engine, and telemetry store
//! - [`health`]: liveness/readiness handlers
//! - [`ProblemDetails`]: RFC 9457 error responses
//! - [`ServiceResponse`]: wrapper for successful responses
//! - [`metrics`]: Prometheus recorder and business counters
//! - [`logging`]: structured JSON/text logging setup
//! - [`middleware`]: request correlation and HTTP metrics
//! - Request types with validation for each endpoint
//!
//! # Architecture
//!
//! Handlers stay thin. Geometry and alert rules live in `rimgaz-lib`; this
//! crate adds storage and HTTP glue:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  axum Handler                                               │
//! │  - Parse request JSON / query                               │
//! │  - Validate parameters                                      │
//! │  - Call AppState (store + rimgaz-lib AlertEngine)           │
//! │  - Format response                                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Testing Support
//!
//! Enable the `test-utils` feature to access [`test_utils`] from dependent
//! crates.

#![deny(warnings)]

mod health;
pub mod logging;
pub mod metrics;
pub mod middleware;
mod problem;
mod request;
mod response;
mod state;
pub mod store;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use health::{health_live, health_ready, HealthStatus};
pub use logging::{init_logging, LogFormat, LoggingConfig};
pub use metrics::{
    init_metrics, metrics_handler, record_active_zones, record_alert_raised,
    record_alert_resolved, record_position_ingested, record_position_rejected, MetricsConfig,
    MetricsError,
};
pub use middleware::{extract_or_generate_request_id, MetricsLayer, RequestId, REQUEST_ID_HEADER};
pub use problem::{
    from_lib_error, ProblemDetails, PROBLEM_INTERNAL_ERROR, PROBLEM_INVALID_REQUEST,
    PROBLEM_INVALID_ZONE, PROBLEM_SERVICE_UNAVAILABLE, PROBLEM_UNKNOWN_ALERT, PROBLEM_UNKNOWN_BUS,
    PROBLEM_UNKNOWN_ZONE,
};
pub use request::{
    AlertQuery, PositionQuery, PositionRequest, Validate, ZoneRequest, MAX_POSITION_LIMIT,
};
pub use response::ServiceResponse;
pub use state::{AppState, AppStateError, Ingestion};
pub use store::{
    AlertFilter, AlertId, NewPosition, StoreConfig, StoredAlert, TelemetryStore,
    DEFAULT_STORE_CAPACITY,
};
