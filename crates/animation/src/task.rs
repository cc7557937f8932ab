use std::time::{Duration, Instant};

use telemetry::VehiclePosition;

use crate::easing::{ease_in_out_cubic, interpolate_heading, lerp};

/// Rendered marker state: position and heading.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    pub lat: f64,
    pub lng: f64,
    pub heading: f64,
}

impl Pose {
    #[must_use]
    pub const fn new(lat: f64, lng: f64, heading: f64) -> Self {
        Self { lat, lng, heading }
    }

    /// Pose `fraction` of the way to `target`: linear in lat/lng, shortest
    /// arc in heading.
    #[must_use]
    pub fn interpolate(&self, target: &Self, fraction: f64) -> Self {
        Self {
            lat: lerp(self.lat, target.lat, fraction),
            lng: lerp(self.lng, target.lng, fraction),
            heading: interpolate_heading(self.heading, target.heading, fraction),
        }
    }

    /// Euclidean distance in raw degrees.
    #[must_use]
    pub fn distance(&self, other: &Self) -> f64 {
        (other.lat - self.lat).hypot(other.lng - self.lng)
    }
}

impl From<&VehiclePosition> for Pose {
    fn from(vehicle: &VehiclePosition) -> Self {
        Self { lat: vehicle.lat, lng: vehicle.lng, heading: vehicle.heading_or_zero() }
    }
}

/// Timing of marker animations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationSettings {
    /// Steps per animation; the last one lands exactly on the target.
    pub steps: u32,

    /// Duration of an animation covering no distance.
    pub base: Duration,

    /// Milliseconds added per degree of distance.
    pub distance_scale_ms: f64,

    /// Upper bound on any animation.
    pub max: Duration,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            steps: 60,
            base: Duration::from_millis(1000),
            distance_scale_ms: 5000.0,
            max: Duration::from_millis(2000),
        }
    }
}

impl AnimationSettings {
    /// `min(base + distance * scale, max)`.
    #[must_use]
    pub fn duration(&self, distance: f64) -> Duration {
        let extra = (distance * self.distance_scale_ms / 1000.0).max(0.0);
        Duration::try_from_secs_f64(extra)
            .map_or(self.max, |extra| self.base.saturating_add(extra))
            .min(self.max)
    }
}

/// Lifecycle of an [`AnimationTask`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Active,
    Superseded,
    Done,
}

/// One in-flight interpolation for one vehicle's marker.
///
/// The task advances by step count, not by frame count: each call to
/// [`AnimationTask::advance`] moves at most one step forward, and only once
/// `duration / steps` has elapsed since the previous step. A slow frame
/// rate therefore stretches the animation rather than skipping steps.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationTask {
    vehicle_id: String,
    source: Pose,
    target: Pose,
    duration: Duration,
    steps: u32,
    step: u32,
    last_step: Option<Instant>,
    state: TaskState,
}

impl AnimationTask {
    #[must_use]
    pub fn new(vehicle_id: impl Into<String>, source: Pose, target: Pose, settings: &AnimationSettings) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            source,
            target,
            duration: settings.duration(source.distance(&target)),
            steps: settings.steps.max(1),
            step: 0,
            last_step: None,
            state: TaskState::Active,
        }
    }

    /// Advances the task, returning the pose to render when a step was taken.
    ///
    /// The first call only starts the clock. The final step returns the exact
    /// target and marks the task done.
    pub fn advance(&mut self, now: Instant) -> Option<Pose> {
        if self.state != TaskState::Active {
            return None;
        }

        let Some(last) = self.last_step else {
            self.last_step = Some(now);
            return None;
        };
        if now.saturating_duration_since(last) < self.time_step() {
            return None;
        }

        self.step += 1;
        self.last_step = Some(now);

        if self.step >= self.steps {
            self.state = TaskState::Done;
            return Some(self.target);
        }

        let progress = ease_in_out_cubic(f64::from(self.step) / f64::from(self.steps));
        Some(self.source.interpolate(&self.target, progress))
    }

    /// Marks the task superseded; the scheduler drops it on its next tick.
    pub fn supersede(&mut self) {
        if self.state == TaskState::Active {
            self.state = TaskState::Superseded;
        }
    }

    #[must_use]
    pub fn time_step(&self) -> Duration {
        self.duration / self.steps
    }

    #[must_use]
    pub fn vehicle_id(&self) -> &str {
        &self.vehicle_id
    }

    #[must_use]
    pub const fn source(&self) -> Pose {
        self.source
    }

    #[must_use]
    pub const fn target(&self) -> Pose {
        self.target
    }

    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    #[must_use]
    pub const fn step(&self) -> u32 {
        self.step
    }

    #[must_use]
    pub const fn state(&self) -> TaskState {
        self.state
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == TaskState::Active
    }
}
