//! In-memory telemetry store.
//!
//! Holds the most recent accepted positions and raised alerts, each in a ring
//! of fixed capacity. When a ring is full the oldest entry is evicted. Ids
//! keep counting across evictions, so an id is never reused. Positions are
//! append-only; the only mutation an alert ever sees is being marked resolved.

use std::collections::VecDeque;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rimgaz_lib::{
    Alert, BusId, Error as LibError, Numeric, PositionEvent, PositionId, PositionStatus, TourId,
};

pub type AlertId = i64;

/// Entries kept per ring when `RIMGAZ_STORE_CAPACITY` is unset.
pub const DEFAULT_STORE_CAPACITY: usize = 10_000;

/// Retention settings for [`TelemetryStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Maximum positions retained, and separately maximum alerts retained.
    pub capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_STORE_CAPACITY,
        }
    }
}

impl StoreConfig {
    /// Create configuration from `RIMGAZ_STORE_CAPACITY`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable lookup.
    ///
    /// Missing, unparseable, or zero values fall back to the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let capacity = lookup("RIMGAZ_STORE_CAPACITY")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|&n| n > 0)
            .unwrap_or(DEFAULT_STORE_CAPACITY);

        Self { capacity }
    }
}

/// A position sample that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPosition {
    pub bus_id: BusId,
    pub tour_id: Option<TourId>,
    pub latitude: Numeric,
    pub longitude: Numeric,
    pub speed_kmh: Option<Numeric>,
    pub status: PositionStatus,
    pub recorded_at: DateTime<Utc>,
}

/// An alert together with its store-assigned id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredAlert {
    pub id: AlertId,
    #[serde(flatten)]
    pub alert: Alert,
}

/// Filter for [`TelemetryStore::alerts`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AlertFilter {
    pub bus_id: Option<BusId>,
    pub unresolved_only: bool,
}

impl AlertFilter {
    fn matches(&self, stored: &StoredAlert) -> bool {
        self.bus_id.is_none_or(|id| stored.alert.bus_id == id)
            && !(self.unresolved_only && stored.alert.is_resolved)
    }
}

#[derive(Debug, Default)]
struct Inner {
    positions: VecDeque<PositionEvent>,
    alerts: VecDeque<StoredAlert>,
    last_position_id: PositionId,
    last_alert_id: AlertId,
}

/// Thread-safe position and alert storage with bounded retention.
#[derive(Debug)]
pub struct TelemetryStore {
    inner: RwLock<Inner>,
    capacity: usize,
}

impl Default for TelemetryStore {
    fn default() -> Self {
        Self::with_config(StoreConfig::default())
    }
}

/// Append to a ring, evicting from the front once `capacity` is reached.
fn push_bounded<T>(ring: &mut VecDeque<T>, capacity: usize, item: T) {
    while ring.len() >= capacity {
        ring.pop_front();
    }
    ring.push_back(item);
}

impl TelemetryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store keeping at most `config.capacity` positions and as many alerts.
    pub fn with_config(config: StoreConfig) -> Self {
        let capacity = config.capacity.max(1);
        Self {
            inner: RwLock::new(Inner {
                positions: VecDeque::with_capacity(capacity.min(1024)),
                alerts: VecDeque::with_capacity(capacity.min(1024)),
                ..Inner::default()
            }),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // A panic while holding the lock cannot leave `Inner` half-written: every
    // mutation is a single push, a single eviction, or a single flag flip.
    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Store a position, assigning the next sequential id (starting at 1).
    /// Evicts the oldest position when the store is full.
    pub fn record_position(&self, new: NewPosition) -> PositionEvent {
        let mut inner = self.write();
        inner.last_position_id += 1;
        let id = inner.last_position_id;
        let position = PositionEvent {
            id,
            bus_id: new.bus_id,
            tour_id: new.tour_id,
            latitude: new.latitude,
            longitude: new.longitude,
            speed_kmh: new.speed_kmh,
            status: new.status,
            recorded_at: new.recorded_at,
        };
        push_bounded(&mut inner.positions, self.capacity, position.clone());
        position
    }

    /// Up to `limit` positions, newest first by `recorded_at` then id.
    pub fn positions(&self, bus_id: Option<BusId>, limit: usize) -> Vec<PositionEvent> {
        let inner = self.read();
        let mut selected: Vec<&PositionEvent> = inner
            .positions
            .iter()
            .filter(|p| bus_id.is_none_or(|id| p.bus_id == id))
            .collect();
        selected.sort_by(|a, b| {
            b.recorded_at
                .cmp(&a.recorded_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        selected.into_iter().take(limit).cloned().collect()
    }

    pub fn position_count(&self) -> usize {
        self.read().positions.len()
    }

    /// Store alerts in order, assigning sequential ids (starting at 1).
    /// Evicts the oldest alerts when the store is full.
    pub fn record_alerts(&self, alerts: Vec<Alert>) -> Vec<StoredAlert> {
        if alerts.is_empty() {
            return Vec::new();
        }
        let mut inner = self.write();
        let mut stored = Vec::with_capacity(alerts.len());
        for alert in alerts {
            inner.last_alert_id += 1;
            let entry = StoredAlert {
                id: inner.last_alert_id,
                alert,
            };
            push_bounded(&mut inner.alerts, self.capacity, entry.clone());
            stored.push(entry);
        }
        stored
    }

    pub fn alert_count(&self) -> usize {
        self.read().alerts.len()
    }

    /// Alerts matching `filter`, newest first by creation time then id.
    pub fn alerts(&self, filter: AlertFilter) -> Vec<StoredAlert> {
        let inner = self.read();
        let mut selected: Vec<&StoredAlert> =
            inner.alerts.iter().filter(|a| filter.matches(a)).collect();
        selected.sort_by(|a, b| {
            b.alert
                .created_at
                .cmp(&a.alert.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        selected.into_iter().cloned().collect()
    }

    /// Mark an alert resolved. Resolving an already-resolved alert succeeds
    /// and returns it unchanged. Evicted alerts are unknown.
    pub fn resolve_alert(&self, id: AlertId) -> rimgaz_lib::Result<StoredAlert> {
        let mut inner = self.write();
        // Retained ids are contiguous, so the offset from the oldest is the index.
        let index = inner
            .alerts
            .front()
            .and_then(|oldest| id.checked_sub(oldest.id))
            .and_then(|offset| usize::try_from(offset).ok());
        let entry = match index {
            Some(i) => inner.alerts.get_mut(i).filter(|a| a.id == id),
            None => None,
        }
        .ok_or(LibError::UnknownAlert { id })?;
        entry.alert.resolve();
        Ok(entry.clone())
    }
}
