//! Bus position ingestion and alerting HTTP microservice.
//!
//! # Endpoints
//!
//! - `POST /api/v1/positions` - Ingest a position and evaluate alerts
//! - `GET /api/v1/positions` - Recent positions, newest first
//! - `GET /api/v1/alerts` - Raised alerts, newest first
//! - `POST /api/v1/alerts/{id}/resolve` - Mark an alert resolved
//! - `GET /api/v1/geofences` - All geofence zones
//! - `POST /api/v1/geofences` - Create a geofence zone
//! - `PUT /api/v1/geofences/{id}` - Replace a geofence zone
//! - `GET /metrics` - Prometheus metrics endpoint
//! - `GET /health/live` - Kubernetes liveness check
//! - `GET /health/ready` - Kubernetes readiness check

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
};
use chrono::Utc;
use serde::Serialize;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use rimgaz_lib::{Error as LibError, GeofenceZone, PositionEvent};
use rimgaz_service_shared::{
    AlertFilter, AlertId, AlertQuery, AppState, Ingestion, MetricsLayer, PositionQuery,
    PositionRequest, ProblemDetails, ServiceResponse, StoredAlert, Validate, ZoneRequest,
    extract_or_generate_request_id, from_lib_error, health_live, health_ready, metrics_handler,
    record_active_zones, record_alert_raised, record_alert_resolved, record_position_ingested,
    record_position_rejected,
};

/// Positions returned by `GET /api/v1/positions`.
#[derive(Debug, Serialize)]
struct PositionList {
    count: usize,
    positions: Vec<PositionEvent>,
}

/// Alerts returned by `GET /api/v1/alerts`.
#[derive(Debug, Serialize)]
struct AlertList {
    count: usize,
    alerts: Vec<StoredAlert>,
}

/// Zones returned by `GET /api/v1/geofences`.
#[derive(Debug, Serialize)]
struct ZoneList {
    count: usize,
    active: usize,
    zones: Vec<GeofenceZone>,
}

/// HTTP response - either success or RFC 9457 error.
#[derive(Debug)]
enum Response<T> {
    Success(ServiceResponse<T>),
    Created(ServiceResponse<T>),
    Error(ProblemDetails),
}

impl<T> Response<T> {
    fn ok(data: T) -> Self {
        Response::Success(ServiceResponse::new(data))
    }

    fn created(data: T) -> Self {
        Response::Created(ServiceResponse::new(data))
    }
}

impl<T: Serialize> IntoResponse for Response<T> {
    fn into_response(self) -> axum::response::Response {
        match self {
            Response::Success(data) => (StatusCode::OK, Json(data)).into_response(),
            Response::Created(data) => (StatusCode::CREATED, Json(data)).into_response(),
            Response::Error(problem) => problem.into_response(),
        }
    }
}

impl<T> From<ProblemDetails> for Response<T> {
    fn from(problem: ProblemDetails) -> Self {
        Response::Error(problem)
    }
}

impl<T> From<Box<ProblemDetails>> for Response<T> {
    fn from(problem: Box<ProblemDetails>) -> Self {
        Response::Error(*problem)
    }
}

/// Build the service router.
///
/// `metrics_path` must start with `/`.
pub fn router(state: AppState, metrics_path: &str) -> Router {
    Router::new()
        .route(
            "/api/v1/positions",
            post(ingest_position_handler).get(list_positions_handler),
        )
        .route("/api/v1/alerts", get(list_alerts_handler))
        .route("/api/v1/alerts/{id}/resolve", post(resolve_alert_handler))
        .route(
            "/api/v1/geofences",
            get(list_zones_handler).post(create_zone_handler),
        )
        .route("/api/v1/geofences/{id}", put(replace_zone_handler))
        .route(metrics_path, get(metrics_handler))
        .route("/health/live", get(health_live))
        .route("/health/ready", get(health_ready))
        .layer(MetricsLayer)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Handle POST /api/v1/positions requests.
async fn ingest_position_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<PositionRequest>, JsonRejection>,
) -> Response<Ingestion> {
    let request_id = extract_or_generate_request_id(&headers);
    let request_id = request_id.as_str();

    if state.bus_count() == 0 {
        warn!(request_id, "position rejected: no buses loaded");
        record_position_rejected("no_fleet");
        return ProblemDetails::service_unavailable(
            "No buses are loaded; positions cannot be attributed",
            request_id,
        )
        .into();
    }

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            record_position_rejected("malformed_body");
            return ProblemDetails::bad_request(rejection.body_text(), request_id).into();
        }
    };

    if let Err(problem) = request.validate(request_id) {
        record_position_rejected("validation_error");
        return problem.into();
    }

    let status = request.status;
    let ingestion = match state.ingest(request.into_new_position(Utc::now())) {
        Ok(ingestion) => ingestion,
        Err(e) => {
            let reason = match e {
                LibError::UnknownBus { .. } => "unknown_bus",
                _ => "internal_error",
            };
            warn!(request_id, error = %e, "position rejected");
            record_position_rejected(reason);
            return from_lib_error(&e, request_id).into();
        }
    };

    record_position_ingested(status.as_str());
    for stored in &ingestion.alerts {
        record_alert_raised(stored.alert.alert_type.as_str());
    }

    info!(
        request_id,
        bus_id = ingestion.position.bus_id,
        position_id = ingestion.position.id,
        alerts = ingestion.alerts.len(),
        "position ingested"
    );

    Response::created(ingestion)
}

/// Handle GET /api/v1/positions requests.
async fn list_positions_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<PositionQuery>, QueryRejection>,
) -> Response<PositionList> {
    let request_id = extract_or_generate_request_id(&headers);
    let request_id = request_id.as_str();

    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => return ProblemDetails::bad_request(rejection.body_text(), request_id).into(),
    };
    if let Err(problem) = query.validate(request_id) {
        return problem.into();
    }

    let positions = state.store().positions(query.bus_id, query.limit);
    Response::ok(PositionList {
        count: positions.len(),
        positions,
    })
}

/// Handle GET /api/v1/alerts requests.
async fn list_alerts_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<AlertQuery>, QueryRejection>,
) -> Response<AlertList> {
    let request_id = extract_or_generate_request_id(&headers);

    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => {
            return ProblemDetails::bad_request(rejection.body_text(), request_id.as_str()).into();
        }
    };

    let alerts = state.store().alerts(AlertFilter {
        bus_id: query.bus_id,
        unresolved_only: query.unresolved,
    });
    Response::ok(AlertList {
        count: alerts.len(),
        alerts,
    })
}

/// Handle POST /api/v1/alerts/{id}/resolve requests.
async fn resolve_alert_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<Path<AlertId>, PathRejection>,
) -> Response<StoredAlert> {
    let request_id = extract_or_generate_request_id(&headers);
    let request_id = request_id.as_str();

    let id = match id {
        Ok(Path(id)) => id,
        Err(rejection) => return ProblemDetails::bad_request(rejection.body_text(), request_id).into(),
    };

    match state.store().resolve_alert(id) {
        Ok(stored) => {
            record_alert_resolved();
            info!(request_id, alert_id = id, bus_id = stored.alert.bus_id, "alert resolved");
            Response::ok(stored)
        }
        Err(e) => from_lib_error(&e, request_id).into(),
    }
}

/// Handle GET /api/v1/geofences requests.
async fn list_zones_handler(State(state): State<AppState>) -> Response<ZoneList> {
    let zones = state.zones();
    Response::ok(ZoneList {
        count: zones.len(),
        active: zones.iter().filter(|z| z.is_active).count(),
        zones: (*zones).clone(),
    })
}

/// Handle POST /api/v1/geofences requests.
async fn create_zone_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ZoneRequest>, JsonRejection>,
) -> Response<GeofenceZone> {
    let request_id = extract_or_generate_request_id(&headers);
    let request_id = request_id.as_str();

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return ProblemDetails::bad_request(rejection.body_text(), request_id).into(),
    };
    if let Err(problem) = request.validate(request_id) {
        return problem.into();
    }

    match state.create_zone(|id| request.into_zone(id)) {
        Ok(zone) => {
            record_active_zones(state.active_zone_count());
            info!(request_id, zone_id = zone.id, shape = zone.shape().kind(), "geofence created");
            Response::created(zone)
        }
        Err(e) => from_lib_error(&e, request_id).into(),
    }
}

/// Handle PUT /api/v1/geofences/{id} requests.
async fn replace_zone_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ZoneRequest>, JsonRejection>,
) -> Response<GeofenceZone> {
    let request_id = extract_or_generate_request_id(&headers);
    let request_id = request_id.as_str();

    let id = match id {
        Ok(Path(id)) => id,
        Err(rejection) => return ProblemDetails::bad_request(rejection.body_text(), request_id).into(),
    };
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return ProblemDetails::bad_request(rejection.body_text(), request_id).into(),
    };
    if let Err(problem) = request.validate(request_id) {
        return problem.into();
    }

    match state.replace_zone(id, request.into_zone(id)) {
        Ok(zone) => {
            record_active_zones(state.active_zone_count());
            info!(request_id, zone_id = id, active = zone.is_active, "geofence replaced");
            Response::ok(zone)
        }
        Err(e) => {
            warn!(request_id, zone_id = id, error = %e, "geofence replace failed");
            from_lib_error(&e, request_id).into()
        }
    }
}
