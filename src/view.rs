//! View models for the fleet list and the vehicle detail dialog.

use chrono::{DateTime, SecondsFormat};
use telemetry::{TelemetryValue, VehicleDetails, VehiclePosition};
use tracker::{DetailState, FleetState};

/// Additional telemetry entries shown before the list is expanded.
pub const COLLAPSED_TELEMETRY: usize = 3;

/// Battery level at or below which the detail dialog flags the battery.
pub const LOW_BATTERY: f64 = 20.0;

/// User interaction dispatched from the view to the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    VehicleSelected(String),
    DetailClosed,
}

/// The fleet list.
#[derive(Debug, Clone, PartialEq)]
pub enum FleetPanel {
    Loading,
    Error(String),
    Empty,
    Vehicles(Vec<VehicleRow>),
}

impl FleetPanel {
    #[must_use]
    pub fn from_state(state: &FleetState) -> Self {
        if state.loading && state.vehicles.is_empty() {
            return Self::Loading;
        }
        if let Some(banner) = &state.error {
            return Self::Error(banner.clone());
        }
        if state.vehicles.is_empty() {
            return Self::Empty;
        }
        Self::Vehicles(state.vehicles.iter().map(VehicleRow::from).collect())
    }

    /// Text shown in place of the list, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Loading => Some("Loading vehicles..."),
            Self::Error(banner) => Some(banner.as_str()),
            Self::Empty => Some("No vehicles found"),
            Self::Vehicles(_) => None,
        }
    }
}

/// One entry of the fleet list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehicleRow {
    pub id: String,
    pub name: String,
    pub coordinates: String,
    pub heading: String,
    pub is_static: bool,
}

impl From<&VehiclePosition> for VehicleRow {
    fn from(vehicle: &VehiclePosition) -> Self {
        Self {
            id: vehicle.id.clone(),
            name: vehicle.name.clone(),
            coordinates: coordinates(vehicle.lat, vehicle.lng),
            heading: heading(vehicle.heading_or_zero()),
            is_static: vehicle.is_static(),
        }
    }
}

/// The vehicle detail dialog.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailView {
    Closed,
    Loading { vehicle_id: String },
    Open(DetailPanel),
}

impl DetailView {
    /// `expanded` shows every additional telemetry entry instead of the
    /// first [`COLLAPSED_TELEMETRY`].
    #[must_use]
    pub fn from_state(state: &DetailState, expanded: bool) -> Self {
        match (&state.vehicle_id, &state.details) {
            (None, _) => Self::Closed,
            (Some(_), Some(details)) if !state.loading => Self::Open(DetailPanel::new(details, expanded)),
            (Some(vehicle_id), _) => Self::Loading { vehicle_id: vehicle_id.clone() },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetailPanel {
    pub title: String,
    pub location: String,
    pub speed: String,
    pub heading: Option<String>,
    pub battery: String,
    pub battery_low: bool,
    pub updated: String,

    /// Visible additional telemetry, sorted by key.
    pub telemetry: Vec<(String, String)>,

    /// Entries hidden until expanded.
    pub hidden: usize,
}

impl DetailPanel {
    #[must_use]
    pub fn new(details: &VehicleDetails, expanded: bool) -> Self {
        let total = details.additional_telemetry.len();
        let visible = if expanded { total } else { total.min(COLLAPSED_TELEMETRY) };
        let telemetry = details
            .additional_telemetry
            .iter()
            .take(visible)
            .map(|(key, value)| (key.clone(), format_telemetry(key, value)))
            .collect();

        Self {
            title: details.name.clone(),
            location: coordinates(details.lat, details.lng),
            speed: format!("{} km/h", details.speed),
            heading: details.heading.map(heading),
            battery: format!("{}%", details.battery),
            battery_low: details.battery <= LOW_BATTERY,
            updated: timestamp(details.timestamp),
            telemetry,
            hidden: total - visible,
        }
    }
}

/// Formats an additional telemetry value with the unit its key implies.
#[must_use]
pub fn format_telemetry(key: &str, value: &TelemetryValue) -> String {
    match key.to_ascii_lowercase().as_str() {
        "altitude" | "accuracy" => format!("{value} m"),
        "temperature" => format!("{value} °C"),
        "humidity" | "fuel" => format!("{value} %"),
        "odometer" | "distance" => format!("{value} km"),
        "ignition" => (if value.is_truthy() { "On" } else { "Off" }).to_string(),
        "engine" => (if value.is_truthy() { "Running" } else { "Off" }).to_string(),
        _ => value.to_string(),
    }
}

fn coordinates(lat: f64, lng: f64) -> String {
    format!("{lat:.6}, {lng:.6}")
}

fn heading(degrees: f64) -> String {
    format!("{}°", degrees.round())
}

fn timestamp(epoch_ms: i64) -> String {
    DateTime::from_timestamp_millis(epoch_ms)
        .map_or_else(|| epoch_ms.to_string(), |at| at.to_rfc3339_opts(SecondsFormat::Secs, true))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use pretty_assertions::assert_eq;
    use tracker::Phase;

    use super::*;

    fn vehicle(id: &str) -> VehiclePosition {
        VehiclePosition {
            id: id.to_string(),
            name: "Cart".to_string(),
            lat: 32.219143,
            lng: -7.936173,
            heading: Some(44.6),
        }
    }

    fn details() -> VehicleDetails {
        VehicleDetails {
            id: "1".to_string(),
            name: "Truck 1".to_string(),
            lat: 32.2191434,
            lng: -7.9361731,
            heading: Some(90.2),
            speed: 18.5,
            battery: 15.0,
            timestamp: 1_729_245_600_000,
            additional_telemetry: BTreeMap::from([
                ("satellites".to_string(), TelemetryValue::Number(11.0)),
                ("altitude".to_string(), TelemetryValue::Number(412.0)),
                ("ignition".to_string(), TelemetryValue::Bool(true)),
                ("movement".to_string(), TelemetryValue::Bool(false)),
            ]),
        }
    }

    #[test]
    fn fleet_panel_states() {
        assert_eq!(FleetPanel::from_state(&FleetState::default()), FleetPanel::Loading);

        let failed = FleetState {
            loading: false,
            error: Some("Unable to load vehicles".to_string()),
            phase: Phase::Failure,
            ..FleetState::default()
        };
        assert_eq!(FleetPanel::from_state(&failed).message(), Some("Unable to load vehicles"));

        let empty = FleetState { loading: false, ..FleetState::default() };
        assert_eq!(FleetPanel::from_state(&empty).message(), Some("No vehicles found"));
    }

    #[test]
    fn vehicle_rows() {
        let state = FleetState { vehicles: vec![vehicle("static-1")], loading: false, ..FleetState::default() };
        let FleetPanel::Vehicles(rows) = FleetPanel::from_state(&state) else {
            panic!("expected vehicles");
        };

        assert_eq!(
            rows,
            vec![VehicleRow {
                id: "static-1".to_string(),
                name: "Cart".to_string(),
                coordinates: "32.219143, -7.936173".to_string(),
                heading: "45°".to_string(),
                is_static: true,
            }]
        );
    }

    #[test]
    fn detail_panel() {
        let panel = DetailPanel::new(&details(), false);

        assert_eq!(panel.title, "Truck 1");
        assert_eq!(panel.location, "32.219143, -7.936173");
        assert_eq!(panel.speed, "18.5 km/h");
        assert_eq!(panel.heading.as_deref(), Some("90°"));
        assert_eq!(panel.battery, "15%");
        assert!(panel.battery_low);
        assert_eq!(panel.updated, "2024-10-18T10:00:00Z");
        assert_eq!(
            panel.telemetry,
            vec![
                ("altitude".to_string(), "412 m".to_string()),
                ("ignition".to_string(), "On".to_string()),
                ("movement".to_string(), "false".to_string()),
            ]
        );
        assert_eq!(panel.hidden, 1);

        let expanded = DetailPanel::new(&details(), true);
        assert_eq!(expanded.telemetry.len(), 4);
        assert_eq!(expanded.hidden, 0);
    }

    #[test]
    fn detail_view_states() {
        assert_eq!(DetailView::from_state(&DetailState::default(), false), DetailView::Closed);

        let loading = DetailState {
            vehicle_id: Some("1".to_string()),
            details: None,
            loading: true,
            phase: Phase::Fetching,
        };
        assert_eq!(
            DetailView::from_state(&loading, false),
            DetailView::Loading { vehicle_id: "1".to_string() }
        );

        let open = DetailState { details: Some(details()), loading: false, phase: Phase::Success, ..loading };
        assert!(matches!(DetailView::from_state(&open, false), DetailView::Open(_)));
    }

    #[test]
    fn telemetry_units() {
        assert_eq!(format_telemetry("temperature", &TelemetryValue::Number(21.5)), "21.5 °C");
        assert_eq!(format_telemetry("Fuel", &TelemetryValue::Number(40.0)), "40 %");
        assert_eq!(format_telemetry("odometer", &TelemetryValue::Number(1200.0)), "1200 km");
        assert_eq!(format_telemetry("engine", &TelemetryValue::Number(0.0)), "Off");
        assert_eq!(format_telemetry("gsm_signal", &TelemetryValue::Number(74.0)), "74");
    }
}
