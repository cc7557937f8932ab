//! Per-vehicle animation scheduling.

use std::collections::HashMap;
use std::time::Instant;

use telemetry::VehiclePosition;
use tracing::debug;

use crate::marker::MarkerRegistry;
use crate::task::{AnimationSettings, AnimationTask, Pose};

/// Owns the animation tasks of every visible marker.
///
/// At most one task per vehicle is active. A new sample for a vehicle
/// supersedes its running task and starts a new one from the pose the marker
/// currently shows, so motion stays continuous. Superseded and finished tasks
/// are dropped on the next [`AnimationEngine::tick`], as are tasks whose
/// marker has been unregistered.
pub struct AnimationEngine {
    registry: MarkerRegistry,
    settings: AnimationSettings,
    tasks: Vec<AnimationTask>,
}

impl AnimationEngine {
    #[must_use]
    pub const fn new(registry: MarkerRegistry, settings: AnimationSettings) -> Self {
        Self { registry, settings, tasks: Vec::new() }
    }

    /// Starts tasks for vehicles whose position or heading changed between
    /// two consecutive fleet samples.
    ///
    /// Only vehicles present in both samples and with a registered marker are
    /// considered. Vehicles missing from `next` have their tasks cancelled.
    pub fn reconcile(
        &mut self, previous: &HashMap<String, VehiclePosition>, next: &HashMap<String, VehiclePosition>,
    ) {
        for (id, target) in next {
            let Some(prior) = previous.get(id) else {
                continue;
            };
            if !self.registry.contains(id) || unchanged(prior, target) {
                continue;
            }
            self.animate(id, Pose::from(target));
        }

        for id in previous.keys().filter(|id| !next.contains_key(*id)) {
            self.cancel(id);
        }
    }

    /// Supersedes any task for `vehicle_id` and animates its marker from the
    /// pose it currently shows to `target`.
    pub fn animate(&mut self, vehicle_id: &str, target: Pose) {
        let Some(source) = self.registry.rendered(vehicle_id) else {
            debug!(vehicle_id, "no marker registered, skipping animation");
            return;
        };

        self.cancel(vehicle_id);
        self.tasks.push(AnimationTask::new(vehicle_id, source, target, &self.settings));
    }

    /// Marks every active task for `vehicle_id` superseded.
    pub fn cancel(&mut self, vehicle_id: &str) {
        for task in self.tasks.iter_mut().filter(|task| task.vehicle_id() == vehicle_id && task.is_active()) {
            task.supersede();
            debug!(monotonic_counter.animations_superseded = 1, vehicle_id, "animation superseded");
        }
    }

    /// Advances every active task by at most one step and renders the result.
    pub fn tick(&mut self, now: Instant) {
        let registry = &self.registry;
        self.tasks.retain_mut(|task| {
            if !task.is_active() {
                return false;
            }
            if !registry.contains(task.vehicle_id()) {
                debug!(vehicle_id = task.vehicle_id(), "marker gone, dropping animation");
                return false;
            }
            if let Some(pose) = task.advance(now) {
                registry.render(task.vehicle_id(), pose);
            }
            true
        });
    }

    /// Number of active tasks for `vehicle_id`; never more than one.
    #[must_use]
    pub fn active_task_count(&self, vehicle_id: &str) -> usize {
        self.tasks.iter().filter(|task| task.vehicle_id() == vehicle_id && task.is_active()).count()
    }

    /// Tasks not yet dropped by a tick, including superseded ones.
    #[must_use]
    pub fn tasks(&self) -> &[AnimationTask] {
        &self.tasks
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.tasks.iter().all(|task| !task.is_active())
    }

    #[must_use]
    pub const fn registry(&self) -> &MarkerRegistry {
        &self.registry
    }

    #[must_use]
    pub const fn settings(&self) -> &AnimationSettings {
        &self.settings
    }
}

#[allow(clippy::float_cmp)]
fn unchanged(prior: &VehiclePosition, target: &VehiclePosition) -> bool {
    prior.lat == target.lat && prior.lng == target.lng && prior.heading_or_zero() == target.heading_or_zero()
}
