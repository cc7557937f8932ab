use telemetry::is_static_id;

/// Icon asset for vehicles reported by a device.
pub const LIVE_ASSET: &str = "/golf-cart.png";

/// Icon asset for static (configured) vehicles.
pub const STATIC_ASSET: &str = "/golf-cart-static.png";

/// Description of a rotated marker icon, handed to the map collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleIcon {
    pub asset: &'static str,

    /// Clockwise rotation in degrees.
    pub rotation_deg: f64,
    pub size: (u32, u32),
    pub anchor: (i32, i32),
    pub popup_anchor: (i32, i32),
}

impl VehicleIcon {
    #[must_use]
    pub fn for_vehicle(vehicle_id: &str, heading: f64) -> Self {
        let asset = if is_static_id(vehicle_id) { STATIC_ASSET } else { LIVE_ASSET };
        Self { asset, rotation_deg: heading, size: (32, 32), anchor: (16, 16), popup_anchor: (0, -16) }
    }

    /// Markup of the rotated icon.
    #[must_use]
    pub fn html(&self) -> String {
        let (width, height) = self.size;
        format!(
            r#"<div style="transform: rotate({rotation}deg); transform-origin: center; width: {width}px; height: {height}px;"><img src="{asset}" style="width: 100%; height: 100%;" /></div>"#,
            rotation = self.rotation_deg,
            asset = self.asset,
        )
    }
}

/// Popup shown when a marker is clicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Popup {
    pub name: String,

    /// Heading rounded to whole degrees.
    pub heading: i64,
    pub is_static: bool,
}

impl Popup {
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(vehicle_id: &str, name: &str, heading: f64) -> Self {
        Self { name: name.to_string(), heading: heading.round() as i64, is_static: is_static_id(vehicle_id) }
    }

    #[must_use]
    pub fn heading_line(&self) -> String {
        format!("Heading: {}°", self.heading)
    }

    #[must_use]
    pub fn html(&self) -> String {
        let tag = if self.is_static { "<br/><small>Static Vehicle</small>" } else { "" };
        format!("<strong>{}</strong><br/>{}{tag}", escape(&self.name), self.heading_line())
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
