//! Mapping of raw telemetry snapshots into canonical vehicle records.

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use tracing::debug;

use crate::model::{TelemetryValue, VehicleDetails, VehiclePosition, normalize_heading};
use crate::raw::{Device, TelemetrySnapshot};

/// Raw telemetry keys surfaced as additional telemetry, with their canonical
/// names. Keys not listed here are dropped.
pub const TELEMETRY_MAPPING: [(&str, &str); 11] = [
    ("position.altitude", "altitude"),
    ("position.satellites", "satellites"),
    ("position.hdop", "hdop"),
    ("position.pdop", "pdop"),
    ("battery.voltage", "battery_voltage"),
    ("battery.current", "battery_current"),
    ("engine.ignition.status", "ignition"),
    ("gsm.signal.level", "gsm_signal"),
    ("movement.status", "movement"),
    ("external.powersource.voltage", "external_power"),
    ("sleep.mode.enum", "sleep_mode"),
];

// Epoch values below this are read as seconds (1e11 s is the year 5138).
const SECONDS_THRESHOLD: f64 = 1e11;

/// Normalizes the fleet, keeping device order.
///
/// A device contributes a position only when its snapshot is present and
/// both coordinates resolve to non-zero finite numbers. Devices without a
/// snapshot (failed or empty telemetry fetch) are dropped.
#[must_use]
pub fn normalize_fleet(
    devices: &[Device], snapshots: &HashMap<String, TelemetrySnapshot>,
) -> Vec<VehiclePosition> {
    devices
        .iter()
        .filter_map(|device| {
            let id = device.id.to_string();
            let Some(snapshot) = snapshots.get(&id) else {
                debug!(device_id = %id, "no telemetry snapshot, dropping device");
                return None;
            };
            let position = normalize_position(device, snapshot);
            if position.is_none() {
                debug!(
                    monotonic_counter.devices_dropped = 1,
                    device_id = %id,
                    "device has no usable position"
                );
            }
            position
        })
        .collect()
}

/// Normalizes a single device into a position, if it reports usable
/// coordinates.
///
/// Coordinates equal to exactly zero are treated as missing, so a vehicle
/// sitting on the equator or the prime meridian is dropped.
#[must_use]
pub fn normalize_position(device: &Device, snapshot: &TelemetrySnapshot) -> Option<VehiclePosition> {
    let lat = snapshot.latitude().filter(|v| usable(*v))?;
    let lng = snapshot.longitude().filter(|v| usable(*v))?;
    let id = device.id.to_string();

    Some(VehiclePosition {
        name: display_name(device.name.as_deref(), snapshot, &id),
        id,
        lat,
        lng,
        heading: source_heading(snapshot),
    })
}

/// Normalizes one vehicle's snapshot into a detail record, using the current
/// time when the snapshot carries no timestamp.
#[must_use]
pub fn normalize_one(vehicle_id: &str, snapshot: &TelemetrySnapshot) -> VehicleDetails {
    normalize_one_at(vehicle_id, snapshot, Utc::now().timestamp_millis())
}

/// Same as [`normalize_one`] with an explicit "now" in epoch milliseconds.
#[must_use]
pub fn normalize_one_at(vehicle_id: &str, snapshot: &TelemetrySnapshot, now_ms: i64) -> VehicleDetails {
    VehicleDetails {
        id: vehicle_id.to_string(),
        name: display_name(None, snapshot, vehicle_id),
        lat: snapshot.latitude().unwrap_or_default(),
        lng: snapshot.longitude().unwrap_or_default(),
        heading: Some(source_heading(snapshot).unwrap_or_default()),
        speed: snapshot.number("position.speed").unwrap_or_default(),
        battery: snapshot.number("battery.level").unwrap_or_default(),
        timestamp: timestamp_ms(snapshot).unwrap_or(now_ms),
        additional_telemetry: additional_telemetry(snapshot),
    }
}

/// Applies [`TELEMETRY_MAPPING`], keeping only defined scalar values.
#[must_use]
pub fn additional_telemetry(snapshot: &TelemetrySnapshot) -> BTreeMap<String, TelemetryValue> {
    TELEMETRY_MAPPING
        .iter()
        .filter_map(|(raw, canonical)| {
            let value = snapshot.value(raw).and_then(TelemetryValue::from_json)?;
            Some(((*canonical).to_string(), value))
        })
        .collect()
}

/// Snapshot timestamp in epoch milliseconds.
///
/// Looks at `timestamp` then `server.timestamp`; values that look like epoch
/// seconds are scaled to milliseconds.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn timestamp_ms(snapshot: &TelemetrySnapshot) -> Option<i64> {
    let raw = snapshot
        .number("timestamp")
        .or_else(|| snapshot.number("server.timestamp"))
        .filter(|ts| ts.is_finite() && *ts > 0.0)?;

    if raw < SECONDS_THRESHOLD {
        Some((raw * 1000.0).round() as i64)
    } else {
        Some(raw.round() as i64)
    }
}

fn display_name(device_name: Option<&str>, snapshot: &TelemetrySnapshot, id: &str) -> String {
    device_name
        .filter(|name| !name.is_empty())
        .or_else(|| snapshot.text("device.name").filter(|name| !name.is_empty()))
        .map_or_else(|| format!("Vehicle {id}"), ToString::to_string)
}

fn source_heading(snapshot: &TelemetrySnapshot) -> Option<f64> {
    snapshot.number("position.direction").filter(|h| h.is_finite()).map(normalize_heading)
}

fn usable(value: f64) -> bool {
    value.is_finite() && value != 0.0
}
