//! Request types and validation for HTTP endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rimgaz_lib::{BusId, GeofenceZone, Numeric, PositionStatus, TourId, Vertex, ZoneId};

use crate::store::NewPosition;
use crate::ProblemDetails;

/// Validation trait for request types.
pub trait Validate {
    /// Validate the request, returning an error if invalid.
    ///
    /// The `request_id` populates the `instance` field of any returned
    /// `ProblemDetails`, which is boxed to keep `Result::Err` small.
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>>;
}

fn bad_request(detail: impl Into<String>, request_id: &str) -> Box<ProblemDetails> {
    Box::new(ProblemDetails::bad_request(detail, request_id))
}

fn check_numeric_range(
    field: &str,
    value: &Numeric,
    min: f64,
    max: f64,
    request_id: &str,
) -> Result<(), Box<ProblemDetails>> {
    let Some(parsed) = value.as_f64() else {
        return Err(bad_request(
            format!("The '{field}' field must be a number, got '{value}'"),
            request_id,
        ));
    };
    if !(min..=max).contains(&parsed) {
        return Err(bad_request(
            format!("The '{field}' field must be between {min} and {max}"),
            request_id,
        ));
    }
    Ok(())
}

/// A GPS sample submitted by a bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionRequest {
    pub bus_id: BusId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tour_id: Option<TourId>,

    /// Decimal degrees, as a number or decimal string.
    pub latitude: Numeric,

    /// Decimal degrees, as a number or decimal string.
    pub longitude: Numeric,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_kmh: Option<Numeric>,

    #[serde(default)]
    pub status: PositionStatus,

    /// Sample time; the server clock is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<DateTime<Utc>>,
}

impl Validate for PositionRequest {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        if self.bus_id <= 0 {
            return Err(bad_request(
                "The 'bus_id' field must be a positive integer",
                request_id,
            ));
        }

        check_numeric_range("latitude", &self.latitude, -90.0, 90.0, request_id)?;
        check_numeric_range("longitude", &self.longitude, -180.0, 180.0, request_id)?;

        if let Some(speed) = &self.speed_kmh {
            match speed.as_f64() {
                Some(value) if value >= 0.0 => {}
                _ => {
                    return Err(bad_request(
                        format!("The 'speed_kmh' field must be a non-negative number, got '{speed}'"),
                        request_id,
                    ))
                }
            }
        }

        Ok(())
    }
}

impl PositionRequest {
    /// Convert into a store record, stamping `now` when no sample time was sent.
    pub fn into_new_position(self, now: DateTime<Utc>) -> NewPosition {
        NewPosition {
            bus_id: self.bus_id,
            tour_id: self.tour_id,
            latitude: self.latitude,
            longitude: self.longitude,
            speed_kmh: self.speed_kmh,
            status: self.status,
            recorded_at: self.recorded_at.unwrap_or(now),
        }
    }
}

/// Query string for `GET /api/v1/positions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionQuery {
    #[serde(default)]
    pub bus_id: Option<BusId>,

    #[serde(default = "default_limit")]
    pub limit: usize,
}

/// Upper bound for [`PositionQuery::limit`].
pub const MAX_POSITION_LIMIT: usize = 500;

fn default_limit() -> usize {
    50
}

impl Default for PositionQuery {
    fn default() -> Self {
        Self {
            bus_id: None,
            limit: default_limit(),
        }
    }
}

impl Validate for PositionQuery {
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        if self.limit == 0 {
            return Err(bad_request("The 'limit' field must be at least 1", request_id));
        }
        if self.limit > MAX_POSITION_LIMIT {
            return Err(bad_request(
                format!("The 'limit' field cannot exceed {MAX_POSITION_LIMIT}"),
                request_id,
            ));
        }
        Ok(())
    }
}

/// Query string for `GET /api/v1/alerts`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertQuery {
    #[serde(default)]
    pub bus_id: Option<BusId>,

    /// Only return alerts that have not been resolved.
    #[serde(default)]
    pub unresolved: bool,
}

/// Body of `POST /api/v1/geofences` and `PUT /api/v1/geofences/{id}`.
///
/// Exactly one of a polygon or a complete circle must be supplied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneRequest {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center_latitude: Option<Numeric>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub center_longitude: Option<Numeric>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius_meters: Option<Numeric>,

    /// Vertices as `[lat, lon]` pairs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polygon: Option<Vec<Vertex>>,

    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl ZoneRequest {
    pub fn into_zone(self, id: ZoneId) -> GeofenceZone {
        GeofenceZone {
            id,
            name: self.name,
            center_latitude: self.center_latitude,
            center_longitude: self.center_longitude,
            radius_meters: self.radius_meters,
            polygon: self.polygon,
            is_active: self.is_active,
        }
    }
}

impl Validate for ZoneRequest {
    /// Runs the full zone validation; failures map to `/problems/invalid-zone`.
    fn validate(&self, request_id: &str) -> Result<(), Box<ProblemDetails>> {
        self.clone()
            .into_zone(0)
            .validate()
            .map_err(|e| Box::new(crate::from_lib_error(&e, request_id)))
    }
}
