//! Session-scoped collection of resolved locations.
//!
//! Entries are kept in insertion order; the last entry is the most recent.
//! Re-adding an existing place id replaces the entry and moves it to the
//! most-recent position. Because the time lookup behind [`LocationRegistry::add`]
//! is asynchronous, "most recent" means most recently *completed* add.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::client::LocalTimeResolver;
use crate::error::GeoError;
use crate::types::{Coordinate, LocationRecord, PlaceId, ResolvedPlace};

const EVENT_CAPACITY: usize = 64;

/// Receives failures from adds that were dropped
pub type ErrorSink = Arc<dyn Fn(&PlaceId, &GeoError) + Send + Sync>;

/// Mutation notifications delivered to subscribers
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryEvent {
    Added(LocationRecord),
    /// An existing place id was overwritten and is now the most recent entry
    Replaced(LocationRecord),
    Removed(PlaceId),
}

pub struct LocationRegistry {
    resolver: Arc<dyn LocalTimeResolver>,
    entries: RwLock<Vec<LocationRecord>>,
    events: broadcast::Sender<RegistryEvent>,
    error_sink: ErrorSink,
}

impl LocationRegistry {
    pub fn new(resolver: Arc<dyn LocalTimeResolver>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            resolver,
            entries: RwLock::new(Vec::new()),
            events,
            error_sink: Arc::new(|place_id: &PlaceId, err: &GeoError| {
                error!("Dropping location {}: {}", place_id, err);
            }),
        }
    }

    pub fn with_error_sink(mut self, sink: ErrorSink) -> Self {
        self.error_sink = sink;
        self
    }

    /// Subscribe to mutations. Events sent before subscribing are not replayed.
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.events.subscribe()
    }

    /// Resolves the local time at `position` in the background and stores the
    /// record once it is known.
    ///
    /// A failed time lookup is reported to the error sink and nothing is stored.
    /// Must be called from within a Tokio runtime. The returned handle yields
    /// the stored record, if any.
    pub fn add(
        self: &Arc<Self>,
        place_id: impl Into<PlaceId>,
        address: impl Into<String>,
        position: Coordinate,
    ) -> JoinHandle<Option<LocationRecord>> {
        self.add_place(ResolvedPlace {
            place_id: place_id.into(),
            address: address.into(),
            position,
        })
    }

    pub fn add_place(self: &Arc<Self>, place: ResolvedPlace) -> JoinHandle<Option<LocationRecord>> {
        let registry = Arc::clone(self);
        tokio::spawn(async move { registry.store(place).await })
    }

    /// Awaits the time lookup for `place` and stores the resulting record.
    pub async fn store(&self, place: ResolvedPlace) -> Option<LocationRecord> {
        debug!("Resolving local time for {}", place.place_id);
        match self.resolver.resolve_local_time(place.position).await {
            Ok(time_data) => {
                let record = LocationRecord::new(place, time_data);
                self.insert(record.clone());
                Some(record)
            }
            Err(e) => {
                (self.error_sink)(&place.place_id, &e);
                None
            }
        }
    }

    fn insert(&self, record: LocationRecord) {
        let replaced = {
            let mut entries = self.entries.write();
            let existing = entries.iter().position(|r| r.place_id == record.place_id);
            if let Some(index) = existing {
                entries.remove(index);
            }
            entries.push(record.clone());
            existing.is_some()
        };

        info!("Stored location {} ({})", record.place_id, record.address);
        let event = if replaced {
            RegistryEvent::Replaced(record)
        } else {
            RegistryEvent::Added(record)
        };
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    /// Removes the entry for `place_id`; returns whether anything was removed.
    pub fn remove(&self, place_id: &PlaceId) -> bool {
        let removed = {
            let mut entries = self.entries.write();
            match entries.iter().position(|r| &r.place_id == place_id) {
                Some(index) => {
                    entries.remove(index);
                    true
                }
                None => false,
            }
        };

        if removed {
            info!("Removed location {}", place_id);
            let _ = self.events.send(RegistryEvent::Removed(place_id.clone()));
        }
        removed
    }

    /// Snapshot of all entries, oldest first.
    pub fn list(&self) -> Vec<LocationRecord> {
        self.entries.read().clone()
    }

    pub fn most_recent(&self) -> Option<LocationRecord> {
        self.entries.read().last().cloned()
    }

    pub fn get(&self, place_id: &PlaceId) -> Option<LocationRecord> {
        self.entries
            .read()
            .iter()
            .find(|r| &r.place_id == place_id)
            .cloned()
    }

    pub fn contains(&self, place_id: &PlaceId) -> bool {
        self.entries.read().iter().any(|r| &r.place_id == place_id)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
