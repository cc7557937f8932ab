use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A WGS84 coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Latest position summary for one vehicle, superseded wholesale each fleet
/// poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehiclePosition {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,

    /// Compass bearing in degrees, `[0, 360)`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
}

impl VehiclePosition {
    #[must_use]
    pub const fn coordinate(&self) -> Coordinate {
        Coordinate { lat: self.lat, lng: self.lng }
    }

    #[must_use]
    pub fn heading_or_zero(&self) -> f64 {
        self.heading.unwrap_or_default()
    }

    /// Vehicles seeded by configuration rather than reported by a device.
    #[must_use]
    pub fn is_static(&self) -> bool {
        is_static_id(&self.id)
    }
}

/// Whether the id belongs to a static (non-device) vehicle.
#[must_use]
pub fn is_static_id(id: &str) -> bool {
    id.starts_with("static")
}

/// Folds any heading into `[0, 360)`; non-finite values become 0.
#[must_use]
pub fn normalize_heading(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let folded = degrees.rem_euclid(360.0);
    if folded >= 360.0 { 0.0 } else { folded }
}

/// Full live telemetry for the selected vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleDetails {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,

    /// km/h
    pub speed: f64,

    /// Percent, 0-100.
    pub battery: f64,

    /// Epoch milliseconds.
    pub timestamp: i64,

    #[serde(default)]
    pub additional_telemetry: BTreeMap<String, TelemetryValue>,
}

/// A scalar telemetry value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TelemetryValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl TelemetryValue {
    /// Converts a raw JSON value, rejecting nulls, arrays and objects.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => n.as_f64().map(Self::Number),
            Value::String(s) => Some(Self::Text(s.clone())),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    /// Truthiness as a dashboard would read it (`0`, `false`, `""` are off).
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::Text(s) => !s.is_empty(),
        }
    }
}

impl fmt::Display for TelemetryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}
