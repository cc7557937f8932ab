use std::time::Duration;

use telemetry::SourceSettings;

/// Polling configuration shared by the fleet and detail streams.
#[derive(Debug, Clone)]
pub struct TrackerSettings {
    /// Period of the fleet poll.
    pub fleet_interval: Duration,

    /// Period of the selected-vehicle poll.
    pub detail_interval: Duration,

    /// Upper bound for one whole fleet cycle (device list plus every device
    /// telemetry fetch).
    pub cycle_timeout: Duration,

    /// Fleet cycles a vehicle may be missing before its previous position is
    /// forgotten.
    pub retention_cycles: u64,

    pub source: SourceSettings,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            fleet_interval: Duration::from_secs(2),
            detail_interval: Duration::from_secs(5),
            cycle_timeout: Duration::from_secs(15),
            retention_cycles: 3,
            source: SourceSettings::default(),
        }
    }
}
