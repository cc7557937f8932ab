//! Raw payload shapes returned by the telemetry source.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response envelope wrapping every telemetry source payload.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Envelope<T> {
    pub result: Vec<T>,
}

/// Device identifier as reported by the source (numeric or string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(untagged)]
pub enum DeviceId {
    Number(u64),
    Text(String),
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// An entry of the "list devices" response.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Device {
    pub id: DeviceId,
    #[serde(default)]
    pub name: Option<String>,
}

/// An entry of the "device telemetry snapshot" response.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TelemetryRecord {
    #[serde(default)]
    pub telemetry: Option<TelemetrySnapshot>,
}

/// Flat map of dot-namespaced keys to `{ "value": .., "ts": .. }` entries.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct TelemetrySnapshot {
    entries: HashMap<String, Value>,
}

impl TelemetrySnapshot {
    /// Builds a snapshot from `key -> value` pairs, wrapping each value the way
    /// the source does.
    pub fn from_values<K: Into<String>>(values: impl IntoIterator<Item = (K, Value)>) -> Self {
        let entries = values
            .into_iter()
            .map(|(key, value)| (key.into(), serde_json::json!({ "value": value })))
            .collect();
        Self { entries }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The defined value under `key`; missing keys and nulls are `None`.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.entries.get(key).and_then(|entry| entry.get("value")).filter(|value| !value.is_null())
    }

    /// Numeric value under `key`, accepting numbers and numeric strings.
    #[must_use]
    pub fn number(&self, key: &str) -> Option<f64> {
        self.value(key).and_then(as_number)
    }

    #[must_use]
    pub fn text(&self, key: &str) -> Option<&str> {
        self.value(key).and_then(Value::as_str)
    }

    /// Latitude, preferring the flattened `position.latitude` key over the
    /// nested `position` object.
    #[must_use]
    pub fn latitude(&self) -> Option<f64> {
        self.number("position.latitude").or_else(|| self.nested_position("latitude"))
    }

    /// Longitude, preferring the flattened `position.longitude` key over the
    /// nested `position` object.
    #[must_use]
    pub fn longitude(&self) -> Option<f64> {
        self.number("position.longitude").or_else(|| self.nested_position("longitude"))
    }

    fn nested_position(&self, field: &str) -> Option<f64> {
        self.value("position").and_then(|position| position.get(field)).and_then(as_number)
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
