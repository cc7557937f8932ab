//! Map layer: marker mount/unmount driven by fleet samples.

use std::collections::HashMap;
use std::time::Instant;

use telemetry::{Coordinate, VehiclePosition};
use tracing::debug;

use crate::engine::AnimationEngine;
use crate::icon::Popup;
use crate::marker::{MarkerFactory, MarkerLease, MarkerRegistry};
use crate::task::{AnimationSettings, Pose};

/// Map centre used when no vehicle is known.
pub const DEFAULT_CENTRE: Coordinate = Coordinate::new(32.219143, -7.936173);

/// One marker per visible vehicle, animated between fleet samples.
///
/// Markers are mounted through the [`MarkerFactory`] the first time a vehicle
/// appears and held by a [`MarkerLease`]; when a vehicle disappears its lease
/// is dropped, which unregisters the marker and lets the engine drop any
/// task still animating it.
pub struct MapLayer<F> {
    factory: F,
    engine: AnimationEngine,
    leases: HashMap<String, MarkerLease>,
    canonical: HashMap<String, VehiclePosition>,
    order: Vec<String>,
}

impl<F: MarkerFactory> MapLayer<F> {
    #[must_use]
    pub fn new(factory: F, settings: AnimationSettings) -> Self {
        Self {
            factory,
            engine: AnimationEngine::new(MarkerRegistry::new(), settings),
            leases: HashMap::new(),
            canonical: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Applies one fleet sample.
    pub fn update(&mut self, vehicles: &[VehiclePosition]) {
        let next: HashMap<String, VehiclePosition> =
            vehicles.iter().map(|vehicle| (vehicle.id.clone(), vehicle.clone())).collect();

        let gone = self.leases.keys().filter(|id| !next.contains_key(*id)).cloned().collect::<Vec<_>>();
        for id in gone {
            self.engine.cancel(&id);
            self.leases.remove(&id);
            debug!(vehicle_id = %id, "marker unmounted");
        }

        for vehicle in vehicles {
            let popup = Popup::new(&vehicle.id, &vehicle.name, vehicle.heading_or_zero());
            if !self.leases.contains_key(&vehicle.id) {
                let marker = self.factory.create(vehicle);
                let lease = self.engine.registry().register(&vehicle.id, marker, Pose::from(vehicle));
                self.leases.insert(vehicle.id.clone(), lease);
                debug!(vehicle_id = %vehicle.id, "marker mounted");
            }
            self.engine.registry().set_popup(&vehicle.id, &popup);
        }

        self.engine.reconcile(&self.canonical, &next);
        self.canonical = next;
        self.order = vehicles.iter().map(|vehicle| vehicle.id.clone()).collect();
    }

    /// Advances all animations by one frame.
    pub fn tick(&mut self, now: Instant) {
        self.engine.tick(now);
    }

    /// Unmounts every marker.
    pub fn clear(&mut self) {
        for id in self.leases.keys() {
            self.engine.cancel(id);
        }
        self.leases.clear();
        self.canonical.clear();
        self.order.clear();
    }

    /// First vehicle's position, or [`DEFAULT_CENTRE`].
    #[must_use]
    pub fn centre(&self) -> Coordinate {
        self.order
            .first()
            .and_then(|id| self.canonical.get(id))
            .map_or(DEFAULT_CENTRE, VehiclePosition::coordinate)
    }

    /// Vehicle ids with a mounted marker, in fleet order.
    #[must_use]
    pub fn mounted(&self) -> &[String] {
        &self.order
    }

    #[must_use]
    pub fn is_mounted(&self, vehicle_id: &str) -> bool {
        self.leases.contains_key(vehicle_id)
    }

    #[must_use]
    pub const fn engine(&self) -> &AnimationEngine {
        &self.engine
    }
}
