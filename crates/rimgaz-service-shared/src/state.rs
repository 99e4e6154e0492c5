//! Application state for the telemetry service.
//!
//! Handlers share one [`AppState`]: the fleet's buses (fixed at startup), the
//! geofence zone list (replaceable at runtime), the alert engine, and the
//! telemetry store.
//!
//! Zones are held as an `Arc<Vec<GeofenceZone>>` snapshot. Zone edits build a
//! new vector and swap it in, so an evaluation in flight keeps working on the
//! list it started with.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde::Serialize;

use rimgaz_lib::{
    AlertEngine, Bus, BusId, Error as LibError, FleetConfig, GeofenceZone, PositionEvent, ZoneId,
};

use crate::store::{NewPosition, StoreConfig, StoredAlert, TelemetryStore};

/// Error during application state initialization.
#[derive(Debug)]
pub enum AppStateError {
    /// Fleet file does not exist.
    FleetNotFound(String),

    /// Fleet file exists but could not be loaded.
    FleetLoad(LibError),
}

impl std::fmt::Display for AppStateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FleetNotFound(path) => write!(f, "fleet file not found: {}", path),
            Self::FleetLoad(e) => write!(f, "failed to load fleet: {}", e),
        }
    }
}

impl std::error::Error for AppStateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::FleetLoad(e) => Some(e),
            Self::FleetNotFound(_) => None,
        }
    }
}

impl From<LibError> for AppStateError {
    fn from(err: LibError) -> Self {
        Self::FleetLoad(err)
    }
}

/// Result of ingesting one position.
#[derive(Debug, Clone, Serialize)]
pub struct Ingestion {
    pub position: PositionEvent,
    pub alerts: Vec<StoredAlert>,
    /// Whether this ingestion raised at least one alert.
    pub has_alert: bool,
}

/// Shared application state for all axum handlers.
///
/// Cheaply cloneable; share it via axum's `State` extractor.
///
/// ```ignore
/// use axum::{Router, routing::get, extract::State};
/// use rimgaz_service_shared::AppState;
///
/// async fn handler(State(state): State<AppState>) -> String {
///     state.bus_count().to_string()
/// }
///
/// let state = AppState::load("/data/fleet.json").unwrap();
/// let app = Router::new().route("/buses", get(handler)).with_state(state);
/// ```
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    buses: HashMap<BusId, Bus>,
    zones: RwLock<Arc<Vec<GeofenceZone>>>,
    engine: AlertEngine,
    store: TelemetryStore,
    source: Option<PathBuf>,
}

impl AppState {
    /// Load application state from a fleet file with default store retention.
    pub fn load(fleet_path: impl AsRef<Path>) -> Result<Self, AppStateError> {
        Self::load_with_store(fleet_path, StoreConfig::default())
    }

    /// Load application state from a fleet file.
    pub fn load_with_store(
        fleet_path: impl AsRef<Path>,
        store: StoreConfig,
    ) -> Result<Self, AppStateError> {
        let fleet_path = fleet_path.as_ref();

        if !fleet_path.exists() {
            return Err(AppStateError::FleetNotFound(
                fleet_path.display().to_string(),
            ));
        }

        tracing::info!(path = %fleet_path.display(), "loading fleet configuration");
        let fleet = FleetConfig::from_path(fleet_path)?;
        Ok(Self::from_fleet_with_store(fleet, store))
    }

    /// Build state from an already-loaded fleet with default store retention.
    pub fn from_fleet(fleet: FleetConfig) -> Self {
        Self::from_fleet_with_store(fleet, StoreConfig::default())
    }

    /// Build state from an already-loaded fleet.
    pub fn from_fleet_with_store(fleet: FleetConfig, store: StoreConfig) -> Self {
        let source = fleet.source().map(Path::to_path_buf);
        let FleetConfig { buses, zones, .. } = fleet;

        tracing::info!(
            buses = buses.len(),
            zones = zones.len(),
            active_zones = zones.iter().filter(|z| z.is_active).count(),
            store_capacity = store.capacity,
            "application state ready"
        );

        Self {
            inner: Arc::new(AppStateInner {
                buses: buses.into_iter().map(|bus| (bus.id, bus)).collect(),
                zones: RwLock::new(Arc::new(zones)),
                engine: AlertEngine::new(),
                store: TelemetryStore::with_config(store),
                source,
            }),
        }
    }

    pub fn bus(&self, id: BusId) -> Option<&Bus> {
        self.inner.buses.get(&id)
    }

    pub fn bus_count(&self) -> usize {
        self.inner.buses.len()
    }

    pub fn store(&self) -> &TelemetryStore {
        &self.inner.store
    }

    /// Fleet file the state was loaded from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.inner.source.as_deref()
    }

    /// Current zone list (active and inactive).
    pub fn zones(&self) -> Arc<Vec<GeofenceZone>> {
        let guard = self.inner.zones.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    pub fn active_zone_count(&self) -> usize {
        self.zones().iter().filter(|z| z.is_active).count()
    }

    /// Validate and append a zone, assigning the next free id.
    pub fn create_zone(
        &self,
        build: impl FnOnce(ZoneId) -> GeofenceZone,
    ) -> rimgaz_lib::Result<GeofenceZone> {
        self.update_zones(|zones| {
            let id = zones.iter().map(|z| z.id).max().unwrap_or(0) + 1;
            let zone = build(id);
            zone.validate()?;
            zones.push(zone.clone());
            Ok(zone)
        })
    }

    /// Validate and replace the zone with the given id.
    pub fn replace_zone(&self, id: ZoneId, zone: GeofenceZone) -> rimgaz_lib::Result<GeofenceZone> {
        zone.validate()?;
        self.update_zones(|zones| {
            let slot = zones
                .iter_mut()
                .find(|z| z.id == id)
                .ok_or(LibError::UnknownZone { id })?;
            *slot = GeofenceZone { id, ..zone };
            Ok(slot.clone())
        })
    }

    fn update_zones<T>(
        &self,
        edit: impl FnOnce(&mut Vec<GeofenceZone>) -> rimgaz_lib::Result<T>,
    ) -> rimgaz_lib::Result<T> {
        let mut guard = self.inner.zones.write().unwrap_or_else(|e| e.into_inner());
        let mut next = (**guard).clone();
        let result = edit(&mut next)?;
        *guard = Arc::new(next);
        Ok(result)
    }

    /// Record a position, evaluate it against the current zone snapshot, and
    /// record any alerts raised.
    ///
    /// Fails with [`LibError::UnknownBus`] before anything is stored if the
    /// bus is not part of the fleet.
    pub fn ingest(&self, new: NewPosition) -> rimgaz_lib::Result<Ingestion> {
        let bus_id = new.bus_id;
        let limit = self
            .bus(bus_id)
            .map(Bus::limit)
            .ok_or(LibError::UnknownBus { id: bus_id })?;

        let position = self.store().record_position(new);
        let zones = self.zones();
        let raised = self.inner.engine.evaluate(&position, &limit, &zones);
        let alerts = self.store().record_alerts(raised);
        let has_alert = !alerts.is_empty();

        tracing::debug!(
            bus_id,
            position_id = position.id,
            alerts = alerts.len(),
            "position evaluated"
        );

        Ok(Ingestion {
            position,
            alerts,
            has_alert,
        })
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("bus_count", &self.bus_count())
            .field("zone_count", &self.zones().len())
            .field("position_count", &self.store().position_count())
            .finish()
    }
}
