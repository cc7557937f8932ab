use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use animation::{AnimationSettings, MapLayer, Marker, MarkerFactory, Popup, Pose, VehicleIcon};
use pretty_assertions::assert_eq;
use telemetry::VehiclePosition;

#[derive(Debug, Clone, Default, PartialEq)]
struct Rendered {
    position: Option<(f64, f64)>,
    rotation: Option<f64>,
    popup: Option<String>,
}

type Screen = Arc<Mutex<HashMap<String, Rendered>>>;

struct RecordingMarker {
    id: String,
    screen: Screen,
}

impl RecordingMarker {
    fn with(&self, update: impl FnOnce(&mut Rendered)) {
        let mut screen = self.screen.lock().expect("should lock");
        update(screen.entry(self.id.clone()).or_default());
    }
}

impl Marker for RecordingMarker {
    fn set_position(&mut self, lat: f64, lng: f64) {
        self.with(|rendered| rendered.position = Some((lat, lng)));
    }

    fn set_icon(&mut self, icon: &VehicleIcon) {
        self.with(|rendered| rendered.rotation = Some(icon.rotation_deg));
    }

    fn set_popup(&mut self, popup: &Popup) {
        self.with(|rendered| rendered.popup = Some(popup.heading_line()));
    }
}

#[derive(Clone, Default)]
struct RecordingFactory {
    screen: Screen,
}

impl RecordingFactory {
    fn rendered(&self, id: &str) -> Rendered {
        self.screen.lock().expect("should lock").get(id).cloned().unwrap_or_default()
    }
}

impl MarkerFactory for RecordingFactory {
    fn create(&self, vehicle: &VehiclePosition) -> Box<dyn Marker> {
        Box::new(RecordingMarker { id: vehicle.id.clone(), screen: Arc::clone(&self.screen) })
    }
}

fn vehicle(lat: f64, lng: f64, heading: f64) -> VehiclePosition {
    VehiclePosition { id: "1".to_string(), name: "Cart 1".to_string(), lat, lng, heading: Some(heading) }
}

fn settings() -> AnimationSettings {
    AnimationSettings { steps: 10, ..AnimationSettings::default() }
}

// Ticks at 60 fps until the layer has no active animation.
fn run_to_completion(layer: &mut MapLayer<RecordingFactory>, mut now: Instant) -> Instant {
    for _ in 0..10_000 {
        if layer.engine().is_idle() {
            break;
        }
        now += Duration::from_millis(16);
        layer.tick(now);
    }
    now
}

#[test]
fn second_update_supersedes_first() {
    let factory = RecordingFactory::default();
    let mut layer = MapLayer::new(factory.clone(), settings());
    layer.update(&[vehicle(32.219143, -7.936173, 0.0)]);

    layer.update(&[vehicle(32.219243, -7.935573, 80.0)]);
    let mut now = Instant::now();
    layer.tick(now);
    for _ in 0..20 {
        now += Duration::from_millis(16);
        layer.tick(now);
    }

    layer.update(&[vehicle(32.219343, -7.934973, 80.0)]);
    assert_eq!(layer.engine().active_task_count("1"), 1);

    run_to_completion(&mut layer, now);
    let rendered = factory.rendered("1");
    assert_eq!(rendered.position, Some((32.219343, -7.934973)));
    assert_eq!(rendered.rotation, Some(80.0));
    assert_eq!(rendered.popup.as_deref(), Some("Heading: 80°"));
}

#[test]
fn heading_wraps_through_north() {
    let factory = RecordingFactory::default();
    let mut layer = MapLayer::new(factory.clone(), settings());
    layer.update(&[vehicle(1.0, 1.0, 350.0)]);
    layer.update(&[vehicle(1.0, 1.0, 10.0)]);

    let mut now = Instant::now();
    layer.tick(now);
    while !layer.engine().is_idle() {
        now += Duration::from_millis(16);
        layer.tick(now);
        let rotation = factory.rendered("1").rotation.expect("rotation");
        assert!(rotation >= 350.0 || rotation <= 10.0, "rotation {rotation}");
    }
    assert_eq!(factory.rendered("1").rotation, Some(10.0));
}

#[test]
fn unmount_cancels_animation() {
    let factory = RecordingFactory::default();
    let mut layer = MapLayer::new(factory.clone(), settings());
    layer.update(&[vehicle(1.0, 1.0, 0.0)]);
    layer.update(&[vehicle(1.1, 1.1, 45.0)]);
    assert_eq!(layer.engine().active_task_count("1"), 1);

    let now = Instant::now();
    layer.tick(now);
    layer.update(&[]);
    assert_eq!(layer.engine().active_task_count("1"), 0);

    let before = factory.rendered("1");
    layer.tick(now + Duration::from_secs(1));
    assert!(layer.engine().tasks().is_empty());
    assert_eq!(factory.rendered("1"), before);
    assert_eq!(layer.engine().registry().rendered("1"), None::<Pose>);
}

#[test]
fn unchanged_sample_does_not_animate() {
    let mut layer = MapLayer::new(RecordingFactory::default(), settings());
    layer.update(&[vehicle(1.0, 1.0, 0.0)]);
    layer.update(&[vehicle(1.0, 1.0, 0.0)]);

    assert!(layer.engine().tasks().is_empty());
}
