use thiserror::Error;

use crate::model::{BusId, ZoneId};

/// Convenient result alias for the Rimgaz telemetry library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
///
/// None of these variants are produced by the alert evaluation path, which
/// falls back on typed defaults instead. They surface from configuration
/// loading, zone validation, and store lookups.
#[derive(Debug, Error)]
pub enum Error {
    /// A geofence zone failed validation at the configuration boundary.
    #[error("invalid geofence zone {zone}: {reason}")]
    InvalidZone { zone: String, reason: String },

    /// Two buses in a fleet file share the same identifier.
    #[error("duplicate bus id encountered: {id}")]
    DuplicateBus { id: BusId },

    /// Two zones in a fleet file share the same identifier.
    #[error("duplicate zone id encountered: {id}")]
    DuplicateZone { id: ZoneId },

    /// Raised when a bus id is not part of the loaded fleet.
    #[error("unknown bus: {id}")]
    UnknownBus { id: BusId },

    /// Raised when a zone id is not part of the current configuration.
    #[error("unknown geofence zone: {id}")]
    UnknownZone { id: ZoneId },

    /// Raised when an alert id has never been recorded.
    #[error("unknown alert: {id}")]
    UnknownAlert { id: i64 },

    /// Raised when a telemetry replay row cannot be decoded.
    #[error("invalid telemetry record at line {line}: {message}")]
    InvalidTelemetry { line: u64, message: String },

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapper for JSON decoding errors.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Wrapper for CSV decoding errors.
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl Error {
    /// Build an [`Error::InvalidZone`] for the given zone label.
    pub(crate) fn invalid_zone(zone: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidZone {
            zone: zone.into(),
            reason: reason.into(),
        }
    }
}
