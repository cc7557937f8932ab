//! Fallback records used when the telemetry source has nothing to offer.

use std::collections::BTreeMap;
use std::str::FromStr;

use anyhow::anyhow;

use crate::model::{VehicleDetails, VehiclePosition};

/// Battery level reported for synthesized detail records.
pub const PLACEHOLDER_BATTERY: f64 = 50.0;

/// Coordinates reported when nothing at all is known about a vehicle.
pub const PLACEHOLDER_LAT: f64 = 32.220923;
pub const PLACEHOLDER_LNG: f64 = -7.929113;

/// The vehicle set returned when the fleet source is unreachable or empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FallbackFleet {
    vehicles: Vec<VehiclePosition>,
}

impl FallbackFleet {
    /// No fallback: an unreachable source yields an empty fleet.
    #[must_use]
    pub const fn empty() -> Self {
        Self { vehicles: Vec::new() }
    }

    /// Static seed entries shown when the source cannot be used.
    #[must_use]
    pub fn seeded() -> Self {
        let seed = |id: &str, name: &str, lat: f64, lng: f64| VehiclePosition {
            id: id.to_string(),
            name: name.to_string(),
            lat,
            lng,
            heading: None,
        };

        Self {
            vehicles: vec![
                seed("1", "Truck 1", 32.219143, -7.936173),
                seed("2", "Truck 2", 35.7806, -78.6452),
                seed("3", "Van 1", 35.7756, -78.6302),
                seed("4", "Car 1", 35.7846, -78.6432),
            ],
        }
    }

    #[must_use]
    pub fn vehicles(&self) -> &[VehiclePosition] {
        &self.vehicles
    }

    #[must_use]
    pub fn find(&self, vehicle_id: &str) -> Option<&VehiclePosition> {
        self.vehicles.iter().find(|vehicle| vehicle.id == vehicle_id)
    }
}

impl FromStr for FallbackFleet {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "seeded" | "mock" => Ok(Self::seeded()),
            "none" | "empty" | "" => Ok(Self::empty()),
            other => Err(anyhow!("unknown fallback fleet `{other}`")),
        }
    }
}

/// Synthesizes a detail record from the last known position of a vehicle.
#[must_use]
pub fn details_from_position(position: &VehiclePosition, now_ms: i64) -> VehicleDetails {
    VehicleDetails {
        id: position.id.clone(),
        name: position.name.clone(),
        lat: position.lat,
        lng: position.lng,
        heading: Some(position.heading_or_zero()),
        speed: 0.0,
        battery: PLACEHOLDER_BATTERY,
        timestamp: now_ms,
        additional_telemetry: BTreeMap::new(),
    }
}

/// Last-resort detail record for a vehicle nothing is known about.
#[must_use]
pub fn placeholder_details(vehicle_id: &str, now_ms: i64) -> VehicleDetails {
    VehicleDetails {
        id: vehicle_id.to_string(),
        name: format!("Vehicle {vehicle_id}"),
        lat: PLACEHOLDER_LAT,
        lng: PLACEHOLDER_LNG,
        heading: Some(0.0),
        speed: 0.0,
        battery: PLACEHOLDER_BATTERY,
        timestamp: now_ms,
        additional_telemetry: BTreeMap::new(),
    }
}
