//! Marker handles and the registry that tracks which ones are alive.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use telemetry::VehiclePosition;
use tracing::debug;

use crate::icon::{Popup, VehicleIcon};
use crate::task::Pose;

/// A marker owned by the map collaborator.
pub trait Marker: Send + Sync {
    fn set_position(&mut self, lat: f64, lng: f64);

    fn set_icon(&mut self, icon: &VehicleIcon);

    fn set_popup(&mut self, popup: &Popup);
}

/// Creates markers for newly visible vehicles.
pub trait MarkerFactory: Send + Sync {
    fn create(&self, vehicle: &VehiclePosition) -> Box<dyn Marker>;
}

struct Entry {
    marker: Box<dyn Marker>,
    rendered: Pose,
    generation: u64,
}

/// Live marker handles keyed by vehicle id.
///
/// A marker is registered for as long as the [`MarkerLease`] returned by
/// [`MarkerRegistry::register`] is alive; dropping the lease unregisters it.
/// Clones share the same registry.
#[derive(Clone, Default)]
pub struct MarkerRegistry {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    entries: DashMap<String, Entry>,
    generation: AtomicU64,
}

impl MarkerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `marker` for `vehicle_id`, rendering it at `pose`.
    ///
    /// Replaces any marker already registered for the id; the lease of the
    /// replaced marker no longer unregisters anything.
    #[must_use]
    pub fn register(&self, vehicle_id: &str, mut marker: Box<dyn Marker>, pose: Pose) -> MarkerLease {
        marker.set_position(pose.lat, pose.lng);
        marker.set_icon(&VehicleIcon::for_vehicle(vehicle_id, pose.heading));

        let generation = self.inner.generation.fetch_add(1, Ordering::Relaxed);
        self.inner.entries.insert(vehicle_id.to_string(), Entry { marker, rendered: pose, generation });
        debug!(vehicle_id, generation, "marker registered");

        MarkerLease { vehicle_id: vehicle_id.to_string(), generation, inner: Arc::clone(&self.inner) }
    }

    #[must_use]
    pub fn contains(&self, vehicle_id: &str) -> bool {
        self.inner.entries.contains_key(vehicle_id)
    }

    /// Pose the marker currently shows.
    #[must_use]
    pub fn rendered(&self, vehicle_id: &str) -> Option<Pose> {
        self.inner.entries.get(vehicle_id).map(|entry| entry.rendered)
    }

    /// Moves and rotates the marker. Returns `false` when no marker is
    /// registered for the id.
    pub fn render(&self, vehicle_id: &str, pose: Pose) -> bool {
        let Some(mut entry) = self.inner.entries.get_mut(vehicle_id) else {
            return false;
        };

        entry.marker.set_position(pose.lat, pose.lng);
        entry.marker.set_icon(&VehicleIcon::for_vehicle(vehicle_id, pose.heading));
        entry.rendered = pose;
        true
    }

    /// Replaces the marker's popup. Returns `false` when no marker is
    /// registered for the id.
    pub fn set_popup(&self, vehicle_id: &str, popup: &Popup) -> bool {
        let Some(mut entry) = self.inner.entries.get_mut(vehicle_id) else {
            return false;
        };
        entry.marker.set_popup(popup);
        true
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }
}

/// Keeps one marker registered; unregisters it on drop.
#[derive(Debug)]
pub struct MarkerLease {
    vehicle_id: String,
    generation: u64,
    inner: Arc<Inner>,
}

impl MarkerLease {
    #[must_use]
    pub fn vehicle_id(&self) -> &str {
        &self.vehicle_id
    }
}

impl Drop for MarkerLease {
    fn drop(&mut self) {
        let removed =
            self.inner.entries.remove_if(&self.vehicle_id, |_, entry| entry.generation == self.generation);
        if removed.is_some() {
            debug!(vehicle_id = %self.vehicle_id, generation = self.generation, "marker unregistered");
        }
    }
}

impl std::fmt::Debug for Inner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inner").field("markers", &self.entries.len()).finish_non_exhaustive()
    }
}
