//! RFC 9457 Problem Details for HTTP APIs.
//!
//! Provides structured error responses following the Problem Details standard.
//! See: <https://www.rfc-editor.org/rfc/rfc9457.html>

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use rimgaz_lib::Error as LibError;

/// Problem type URI for invalid request parameters.
pub const PROBLEM_INVALID_REQUEST: &str = "/problems/invalid-request";

/// Problem type URI for geofence zones rejected by validation.
pub const PROBLEM_INVALID_ZONE: &str = "/problems/invalid-zone";

/// Problem type URI for bus ids missing from the fleet.
pub const PROBLEM_UNKNOWN_BUS: &str = "/problems/unknown-bus";

/// Problem type URI for unknown geofence zone ids.
pub const PROBLEM_UNKNOWN_ZONE: &str = "/problems/unknown-zone";

/// Problem type URI for unknown alert ids.
pub const PROBLEM_UNKNOWN_ALERT: &str = "/problems/unknown-alert";

/// Problem type URI for internal server errors.
pub const PROBLEM_INTERNAL_ERROR: &str = "/problems/internal-error";

/// Problem type URI for service unavailable (e.g., empty fleet).
pub const PROBLEM_SERVICE_UNAVAILABLE: &str = "/problems/service-unavailable";

/// RFC 9457 Problem Details response structure.
///
/// Provides a consistent format for error responses across all endpoints.
///
/// # Example
///
/// ```
/// use rimgaz_service_shared::{ProblemDetails, PROBLEM_UNKNOWN_BUS};
/// use axum::http::StatusCode;
///
/// let problem = ProblemDetails::new(PROBLEM_UNKNOWN_BUS, "Unknown Bus", StatusCode::NOT_FOUND)
///     .with_detail("Bus 42 is not part of the fleet")
///     .with_request_id("req-12345");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemDetails {
    /// URI reference identifying the problem type (relative).
    #[serde(rename = "type")]
    pub type_uri: String,

    /// Short, human-readable summary of the problem.
    pub title: String,

    /// HTTP status code for this problem.
    pub status: u16,

    /// Human-readable explanation specific to this occurrence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// URI reference identifying the specific occurrence (e.g., request ID).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,

    /// Content type for this response (always "application/problem+json").
    pub content_type: String,
}

impl ProblemDetails {
    /// Create a new ProblemDetails with required fields.
    pub fn new(type_uri: impl Into<String>, title: impl Into<String>, status: StatusCode) -> Self {
        Self {
            type_uri: type_uri.into(),
            title: title.into(),
            status: status.as_u16(),
            detail: None,
            instance: None,
            content_type: "application/problem+json".to_string(),
        }
    }

    /// Add a detailed explanation of this specific problem occurrence.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Add the request identifier for tracing.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.instance = Some(request_id.into());
        self
    }

    /// Create a 400 Bad Request problem for invalid input.
    pub fn bad_request(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_INVALID_REQUEST,
            "Invalid Request",
            StatusCode::BAD_REQUEST,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }

    /// Create a 400 Bad Request problem for a zone that failed validation.
    pub fn invalid_zone(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(PROBLEM_INVALID_ZONE, "Invalid Zone", StatusCode::BAD_REQUEST)
            .with_detail(detail)
            .with_request_id(request_id)
    }

    /// Create a 404 Not Found problem for a bus missing from the fleet.
    pub fn unknown_bus(id: i64, request_id: impl Into<String>) -> Self {
        Self::new(PROBLEM_UNKNOWN_BUS, "Unknown Bus", StatusCode::NOT_FOUND)
            .with_detail(format!("Bus {} is not part of the fleet", id))
            .with_request_id(request_id)
    }

    /// Create a 404 Not Found problem for an unknown geofence zone.
    pub fn unknown_zone(id: i64, request_id: impl Into<String>) -> Self {
        Self::new(PROBLEM_UNKNOWN_ZONE, "Unknown Zone", StatusCode::NOT_FOUND)
            .with_detail(format!("Geofence zone {} does not exist", id))
            .with_request_id(request_id)
    }

    /// Create a 404 Not Found problem for an unknown alert.
    pub fn unknown_alert(id: i64, request_id: impl Into<String>) -> Self {
        Self::new(PROBLEM_UNKNOWN_ALERT, "Unknown Alert", StatusCode::NOT_FOUND)
            .with_detail(format!("Alert {} does not exist", id))
            .with_request_id(request_id)
    }

    /// Create a 500 Internal Server Error problem.
    pub fn internal_error(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_INTERNAL_ERROR,
            "Internal Error",
            StatusCode::INTERNAL_SERVER_ERROR,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }

    /// Create a 503 Service Unavailable problem.
    pub fn service_unavailable(detail: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self::new(
            PROBLEM_SERVICE_UNAVAILABLE,
            "Service Unavailable",
            StatusCode::SERVICE_UNAVAILABLE,
        )
        .with_detail(detail)
        .with_request_id(request_id)
    }
}

impl std::fmt::Display for ProblemDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}",
            self.title,
            self.detail.as_deref().unwrap_or("")
        )
    }
}

impl std::error::Error for ProblemDetails {}

/// Implement IntoResponse for axum to return ProblemDetails as HTTP responses.
impl IntoResponse for ProblemDetails {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // Set the content-type header to application/problem+json
        let mut response = Json(&self).into_response();
        response.headers_mut().insert(
            axum::http::header::CONTENT_TYPE,
            axum::http::HeaderValue::from_static("application/problem+json"),
        );

        // Update status code
        *response.status_mut() = status;
        response
    }
}

/// Convert library errors to ProblemDetails.
///
/// The `request_id` must be provided separately since library errors don't have it.
pub fn from_lib_error(error: &LibError, request_id: &str) -> ProblemDetails {
    match error {
        LibError::UnknownBus { id } => ProblemDetails::unknown_bus(*id, request_id),
        LibError::UnknownZone { id } => ProblemDetails::unknown_zone(*id, request_id),
        LibError::UnknownAlert { id } => ProblemDetails::unknown_alert(*id, request_id),
        LibError::InvalidZone { .. } => ProblemDetails::invalid_zone(error.to_string(), request_id),
        LibError::DuplicateZone { id } => ProblemDetails::new(
            PROBLEM_INVALID_ZONE,
            "Invalid Zone",
            StatusCode::CONFLICT,
        )
        .with_detail(format!("Geofence zone {} already exists", id))
        .with_request_id(request_id),
        _ => ProblemDetails::internal_error(error.to_string(), request_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_problem_details_new() {
        let problem = ProblemDetails::new(PROBLEM_UNKNOWN_BUS, "Unknown Bus", StatusCode::NOT_FOUND);
        assert_eq!(problem.type_uri, PROBLEM_UNKNOWN_BUS);
        assert_eq!(problem.title, "Unknown Bus");
        assert_eq!(problem.status, 404);
        assert_eq!(problem.content_type, "application/problem+json");
    }

    #[test]
    fn test_problem_details_bad_request() {
        let problem = ProblemDetails::bad_request("latitude must be numeric", "req-123");
        assert_eq!(problem.status, 400);
        assert_eq!(problem.instance.as_deref(), Some("req-123"));
        assert_eq!(problem.to_string(), "Invalid Request: latitude must be numeric");
    }

    #[test]
    fn test_problem_details_service_unavailable() {
        let problem = ProblemDetails::service_unavailable("no buses loaded", "req-503");
        assert_eq!(problem.type_uri, PROBLEM_SERVICE_UNAVAILABLE);
        assert_eq!(problem.status, 503);
        assert_eq!(problem.instance.as_deref(), Some("req-503"));
    }

    #[test]
    fn test_problem_details_serialization() {
        let problem = ProblemDetails::bad_request("Test error", "req-test");
        let json = serde_json::to_string(&problem).unwrap();

        assert!(json.contains("\"type\":\"/problems/invalid-request\""));
        assert!(json.contains("\"title\":\"Invalid Request\""));
        assert!(json.contains("\"status\":400"));
        assert!(json.contains("\"instance\":\"req-test\""));
    }

    #[test]
    fn test_from_lib_error_unknown_ids() {
        let problem = from_lib_error(&LibError::UnknownBus { id: 42 }, "req-bus");
        assert_eq!(problem.type_uri, PROBLEM_UNKNOWN_BUS);
        assert_eq!(problem.status, 404);
        assert!(problem.detail.as_deref().unwrap().contains("42"));

        let problem = from_lib_error(&LibError::UnknownZone { id: 3 }, "req-zone");
        assert_eq!(problem.type_uri, PROBLEM_UNKNOWN_ZONE);

        let problem = from_lib_error(&LibError::UnknownAlert { id: 9 }, "req-alert");
        assert_eq!(problem.type_uri, PROBLEM_UNKNOWN_ALERT);
        assert_eq!(problem.instance.as_deref(), Some("req-alert"));
    }

    #[test]
    fn test_from_lib_error_invalid_zone() {
        let error = LibError::InvalidZone {
            zone: "#1 'Depot'".to_string(),
            reason: "zone defines both a polygon and a circle".to_string(),
        };
        let problem = from_lib_error(&error, "req-zone");
        assert_eq!(problem.type_uri, PROBLEM_INVALID_ZONE);
        assert_eq!(problem.status, 400);
        assert!(problem.detail.as_deref().unwrap().contains("both a polygon"));

        let problem = from_lib_error(&LibError::DuplicateZone { id: 1 }, "req-dup");
        assert_eq!(problem.status, 409);
    }

    #[test]
    fn test_from_lib_error_falls_back_to_internal() {
        let error = LibError::Io(std::io::Error::other("disk gone"));
        let problem = from_lib_error(&error, "req-io");
        assert_eq!(problem.type_uri, PROBLEM_INTERNAL_ERROR);
        assert_eq!(problem.status, 500);
    }
}
