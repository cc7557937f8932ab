//! Dashboard settings assembled from the environment.

use std::env;
use std::time::Duration;

use animation::AnimationSettings;
use telemetry::{FallbackFleet, SourceSettings};
use tracker::TrackerSettings;

const DEFAULT_TELEMETRY_URL: &str = "https://flespi.io";

#[derive(Debug, Clone)]
pub struct Settings {
    pub telemetry_url: String,
    pub telemetry_token: String,
    pub auth_scheme: String,
    pub tracker: TrackerSettings,
    pub animation: AnimationSettings,

    /// Period of the frame loop driving marker animations.
    pub frame_interval: Duration,
}

impl Settings {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup; unset or unparsable
    /// values fall back to their defaults.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let telemetry_url = lookup("TELEMETRY_URL").unwrap_or_else(|| {
            tracing::trace!("TELEMETRY_URL not set, using default: {DEFAULT_TELEMETRY_URL}");
            DEFAULT_TELEMETRY_URL.to_string()
        });
        let telemetry_token = lookup("TELEMETRY_TOKEN").map(|token| token.trim().to_string()).unwrap_or_default();
        if telemetry_token.is_empty() {
            tracing::warn!("TELEMETRY_TOKEN not set, requests will be unauthenticated");
        }
        let auth_scheme =
            lookup("TELEMETRY_AUTH_SCHEME").unwrap_or_else(|| telemetry::DEFAULT_AUTH_SCHEME.to_string());

        let fallback = lookup("FALLBACK_VEHICLES").map_or_else(FallbackFleet::seeded, |value| {
            value.parse().unwrap_or_else(|err| {
                tracing::warn!(error = %err, "invalid FALLBACK_VEHICLES, using seeded vehicles");
                FallbackFleet::seeded()
            })
        });

        let source = SourceSettings {
            request_timeout: millis(&lookup, "TELEMETRY_TIMEOUT_MS", 5_000),
            fallback,
        };
        let tracker = TrackerSettings {
            fleet_interval: millis(&lookup, "FLEET_POLL_INTERVAL_MS", 2_000),
            detail_interval: millis(&lookup, "DETAIL_POLL_INTERVAL_MS", 5_000),
            cycle_timeout: millis(&lookup, "FLEET_CYCLE_TIMEOUT_MS", 15_000),
            retention_cycles: env_u64(&lookup, "POSITION_RETENTION_CYCLES", 3),
            source,
        };
        let animation = AnimationSettings {
            steps: u32::try_from(env_u64(&lookup, "ANIMATION_STEPS", 60)).unwrap_or(60).max(1),
            base: millis(&lookup, "ANIMATION_BASE_MS", 1_000),
            distance_scale_ms: env_f64(&lookup, "ANIMATION_DISTANCE_SCALE_MS", 5_000.0),
            max: millis(&lookup, "ANIMATION_MAX_MS", 2_000),
        };

        Self {
            telemetry_url,
            telemetry_token,
            auth_scheme,
            tracker,
            animation,
            frame_interval: millis(&lookup, "FRAME_INTERVAL_MS", 16),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn env_u64(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> u64 {
    lookup(key).and_then(|value| value.trim().parse::<u64>().ok()).unwrap_or(default)
}

fn env_f64(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: f64) -> f64 {
    lookup(key)
        .and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .unwrap_or(default)
}

fn millis(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> Duration {
    Duration::from_millis(env_u64(lookup, key, default).max(1))
}
