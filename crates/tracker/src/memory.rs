//! Per-vehicle memory of the previous fleet sample.

use std::collections::HashMap;

use telemetry::{Coordinate, VehiclePosition, normalize_heading};
use tracing::debug;

use crate::heading::estimate_heading;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Sighting {
    coordinate: Coordinate,
    heading: f64,
    last_seen: u64,
}

/// Last coordinate and heading reported for each vehicle id.
///
/// Holds exactly one entry per id seen recently. An entry is overwritten on
/// every sighting and evicted once its id has been missing from more than
/// `retention_cycles` consecutive fleet responses; with `retention_cycles`
/// of zero only ids in the latest response are kept.
#[derive(Debug, Clone, Default)]
pub struct PositionMemory {
    entries: HashMap<String, Sighting>,
    cycle: u64,
    retention_cycles: u64,
}

impl PositionMemory {
    #[must_use]
    pub fn new(retention_cycles: u64) -> Self {
        Self { entries: HashMap::new(), cycle: 0, retention_cycles }
    }

    /// Merges estimated headings into one fleet response.
    ///
    /// A vehicle seen for the first time keeps the source heading (or 0). A
    /// vehicle that moved gets the heading of its move. A vehicle that did
    /// not move keeps the source heading, or failing that the heading last
    /// reported for it. Every returned position carries a heading.
    pub fn observe(&mut self, vehicles: Vec<VehiclePosition>) -> Vec<VehiclePosition> {
        self.cycle += 1;

        let merged = vehicles
            .into_iter()
            .map(|mut vehicle| {
                let current = vehicle.coordinate();
                let heading = match self.entries.get(&vehicle.id) {
                    None => normalize_heading(vehicle.heading_or_zero()),
                    Some(prev) if prev.coordinate != current => {
                        estimate_heading(prev.coordinate, current)
                    }
                    Some(prev) => vehicle.heading.map_or(prev.heading, normalize_heading),
                };

                self.entries.insert(
                    vehicle.id.clone(),
                    Sighting { coordinate: current, heading, last_seen: self.cycle },
                );
                vehicle.heading = Some(heading);
                vehicle
            })
            .collect();

        self.evict();
        merged
    }

    fn evict(&mut self) {
        let cycle = self.cycle;
        let retention = self.retention_cycles;
        let before = self.entries.len();

        self.entries.retain(|_, sighting| cycle - sighting.last_seen <= retention);

        let evicted = before - self.entries.len();
        if evicted > 0 {
            debug!(evicted, cycle, "evicted vehicles missing from recent fleet responses");
        }
    }

    /// Last coordinate remembered for `vehicle_id`.
    #[must_use]
    pub fn coordinate(&self, vehicle_id: &str) -> Option<Coordinate> {
        self.entries.get(vehicle_id).map(|sighting| sighting.coordinate)
    }

    /// Last heading remembered for `vehicle_id`.
    #[must_use]
    pub fn heading(&self, vehicle_id: &str) -> Option<f64> {
        self.entries.get(vehicle_id).map(|sighting| sighting.heading)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of fleet responses observed so far.
    #[must_use]
    pub const fn cycle(&self) -> u64 {
        self.cycle
    }
}
