//! Fleet configuration loading.
//!
//! A fleet file is a JSON document listing buses (with optional speed limits)
//! and geofence zones:
//!
//! ```json
//! {
//!   "buses": [{ "id": 1, "name": "Bus 1", "max_speed_kmh": "60.00" }],
//!   "zones": [{ "id": 1, "name": "Depot", "center_latitude": 18.08,
//!               "center_longitude": -15.97, "radius_meters": 1500 }]
//! }
//! ```
//!
//! [`FleetConfig::from_path`] is strict: duplicate ids and zones failing
//! [`GeofenceZone::validate`](crate::zones::GeofenceZone::validate) are rejected.
//! [`FleetConfig::from_path_lenient`] only rejects duplicate ids and keeps
//! invalid zones, which the evaluator tolerates. Inspection and replay tooling
//! use the lenient form so broken zone records can be reported instead of
//! aborting the load.

use std::collections::HashSet;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::model::{Bus, BusId, ZoneId};
use crate::zones::GeofenceZone;

/// Buses and zones loaded from a fleet file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FleetConfig {
    #[serde(default)]
    pub buses: Vec<Bus>,
    #[serde(default)]
    pub zones: Vec<GeofenceZone>,
    #[serde(skip)]
    source: Option<PathBuf>,
}

impl FleetConfig {
    /// Build a configuration from in-memory parts, applying the same checks as file loading.
    pub fn new(buses: Vec<Bus>, zones: Vec<GeofenceZone>) -> Result<Self> {
        let config = Self {
            buses,
            zones,
            source: None,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a fleet file.
    pub fn from_path(path: &Path) -> Result<Self> {
        Self::load(path, true)
    }

    /// Load a fleet file, keeping zones that fail validation.
    pub fn from_path_lenient(path: &Path) -> Result<Self> {
        Self::load(path, false)
    }

    /// Load and validate a fleet document from any reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let config: FleetConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a fleet document, keeping zones that fail validation.
    pub fn from_reader_lenient<R: Read>(reader: R) -> Result<Self> {
        let config: FleetConfig = serde_json::from_reader(reader)?;
        config.check_unique_ids()?;
        for zone in &config.zones {
            if let Err(err) = zone.validate() {
                warn!(zone_id = zone.id, error = %err, "keeping invalid geofence zone");
            }
        }
        Ok(config)
    }

    fn load(path: &Path, strict: bool) -> Result<Self> {
        let file = fs::File::open(path)?;
        let mut config = if strict {
            Self::from_reader(file)?
        } else {
            Self::from_reader_lenient(file)?
        };
        config.source = Some(path.to_path_buf());
        info!(
            path = %path.display(),
            buses = config.buses.len(),
            zones = config.zones.len(),
            strict,
            "fleet configuration loaded"
        );
        Ok(config)
    }

    /// File the configuration was read from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn bus(&self, id: BusId) -> Option<&Bus> {
        self.buses.iter().find(|bus| bus.id == id)
    }

    pub fn zone(&self, id: ZoneId) -> Option<&GeofenceZone> {
        self.zones.iter().find(|zone| zone.id == id)
    }

    pub fn active_zone_count(&self) -> usize {
        self.zones.iter().filter(|zone| zone.is_active).count()
    }

    fn validate(&self) -> Result<()> {
        self.check_unique_ids()?;
        self.zones.iter().try_for_each(GeofenceZone::validate)
    }

    fn check_unique_ids(&self) -> Result<()> {
        let mut bus_ids = HashSet::new();
        for bus in &self.buses {
            if !bus_ids.insert(bus.id) {
                return Err(Error::DuplicateBus { id: bus.id });
            }
        }

        let mut zone_ids = HashSet::new();
        for zone in &self.zones {
            if !zone_ids.insert(zone.id) {
                return Err(Error::DuplicateZone { id: zone.id });
            }
        }
        Ok(())
    }
}
