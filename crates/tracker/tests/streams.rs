
use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use telemetry::{FallbackFleet, Origin, VehiclePosition};
use tokio::sync::watch;
use tokio::time::sleep;
use tracker::{DetailState, DetailStream, FleetState, FleetStream, Phase, TrackerSettings};

use self::provider::{MockProvider, Reply, snapshot, telemetry_path};

fn settings() -> TrackerSettings {
    TrackerSettings {
        fleet_interval: Duration::from_secs(2),
        detail_interval: Duration::from_secs(5),
        ..TrackerSettings::default()
    }
}

async fn wait_cycle(rx: &mut watch::Receiver<FleetState>, cycle: u64) -> FleetState {
    rx.wait_for(|state| state.cycle >= cycle).await.expect("stream should publish").clone()
}

#[tokio::test(start_paused = true)]
async fn heading_from_consecutive_polls() {
    let provider = Arc::new(MockProvider::new());
    provider.devices(&[("1", "Cart 1")]);
    provider.position("1", 32.219143, -7.936173);

    let stream = FleetStream::start(Arc::clone(&provider), settings());
    let mut rx = stream.subscribe();

    let first = wait_cycle(&mut rx, 1).await;
    assert!(!first.loading);
    assert_eq!(first.phase, Phase::Success);
    assert_eq!(first.origin, Some(Origin::Live));
    assert_eq!(first.vehicles[0].heading, Some(0.0));

    provider.position("1", 32.219243, -7.935573);
    let second = wait_cycle(&mut rx, 2).await;
    let heading = second.vehicles[0].heading.expect("heading");
    assert!(heading > 0.0 && heading < 90.0, "heading {heading}");

    let third = wait_cycle(&mut rx, 3).await;
    assert_eq!(third.vehicles[0].heading, Some(heading));

    stream.stop().await;
}

#[tokio::test(start_paused = true)]
async fn drop_stops_polling() {
    let provider = Arc::new(MockProvider::new());
    provider.devices(&[("1", "Cart 1")]);
    provider.position("1", 32.219143, -7.936173);

    let stream = FleetStream::start(Arc::clone(&provider), settings());
    let mut rx = stream.subscribe();
    wait_cycle(&mut rx, 1).await;

    drop(stream);
    sleep(Duration::from_secs(10)).await;

    assert_eq!(provider.calls("/gw/devices/all"), 1);
}

#[tokio::test(start_paused = true)]
async fn failure_keeps_vehicles() {
    let provider = Arc::new(MockProvider::new());
    provider.devices(&[("1", "Cart 1")]);
    provider.position("1", 32.219143, -7.936173);

    let stream = FleetStream::start(Arc::clone(&provider), settings());
    let mut rx = stream.subscribe();
    let first = wait_cycle(&mut rx, 1).await;

    provider.route("/gw/devices/all", Reply::Fail);
    let second = wait_cycle(&mut rx, 2).await;

    assert_eq!(second.phase, Phase::Failure);
    assert_eq!(second.vehicles, first.vehicles);
    assert_eq!(second.error, None);
}

#[tokio::test(start_paused = true)]
async fn banner_without_fallback() {
    let provider = Arc::new(MockProvider::new());
    provider.route("/gw/devices/all", Reply::Fail);

    let mut settings = settings();
    settings.source.fallback = FallbackFleet::empty();

    let stream = FleetStream::start(Arc::clone(&provider), settings);
    let mut rx = stream.subscribe();
    let state = wait_cycle(&mut rx, 1).await;

    assert!(state.vehicles.is_empty());
    assert!(!state.loading);
    assert!(state.error.is_some());
}

#[tokio::test(start_paused = true)]
async fn stale_detail_discarded() {
    let provider = Arc::new(MockProvider::new());
    provider.route(&telemetry_path("A"), Reply::Delayed(Duration::from_secs(3), snapshot(1.0, 1.0)));
    provider.position("B", 2.0, 2.0);

    let (_fleet_tx, fleet_rx) = watch::channel(FleetState::default());
    let mut detail = DetailStream::new(Arc::clone(&provider), settings(), fleet_rx);
    let mut rx = detail.subscribe();

    detail.select("A");
    sleep(Duration::from_millis(100)).await;
    detail.select("B");

    let state = rx.wait_for(|state| state.details.is_some()).await.expect("details").clone();
    assert_eq!(state.vehicle_id.as_deref(), Some("B"));
    assert_eq!(state.details.as_ref().map(|d| d.id.as_str()), Some("B"));

    sleep(Duration::from_secs(4)).await;
    let state = detail.state();
    assert_eq!(state.vehicle_id.as_deref(), Some("B"));
    assert_eq!(state.details.map(|d| d.id), Some("B".to_string()));
    assert_eq!(provider.calls(&telemetry_path("A")), 1);
}

#[tokio::test(start_paused = true)]
async fn detail_falls_back_to_last_known() {
    let provider = Arc::new(MockProvider::new());
    let fleet = FleetState {
        vehicles: vec![VehiclePosition {
            id: "7".to_string(),
            name: "Cart 7".to_string(),
            lat: 32.2,
            lng: -7.9,
            heading: Some(135.0),
        }],
        ..FleetState::default()
    };
    let (_fleet_tx, fleet_rx) = watch::channel(fleet);

    let mut detail = DetailStream::new(Arc::clone(&provider), settings(), fleet_rx);
    let mut rx = detail.subscribe();
    detail.select("7");

    let state = rx.wait_for(|state| !state.loading).await.expect("details").clone();
    let details = state.details.expect("details");
    assert_eq!(details.name, "Cart 7");
    assert_eq!(details.speed, 0.0);
    assert_eq!(details.battery, 50.0);
    assert_eq!(details.heading, Some(135.0));
    assert_eq!(state.phase, Phase::Success);
}

#[tokio::test(start_paused = true)]
async fn detail_polls_until_deselected() {
    let provider = Arc::new(MockProvider::new());
    provider.position("B", 2.0, 2.0);

    let (_fleet_tx, fleet_rx) = watch::channel(FleetState::default());
    let mut detail = DetailStream::new(Arc::clone(&provider), settings(), fleet_rx);
    let mut rx = detail.subscribe();

    detail.select("B");
    rx.wait_for(|state| state.details.is_some()).await.expect("details");
    assert_eq!(detail.selected().as_deref(), Some("B"));

    sleep(Duration::from_millis(5_500)).await;
    assert_eq!(provider.calls(&telemetry_path("B")), 2);

    detail.deselect();
    assert_eq!(detail.state(), DetailState::default());

    sleep(Duration::from_secs(20)).await;
    assert_eq!(provider.calls(&telemetry_path("B")), 2);
    assert_eq!(detail.state(), DetailState::default());
}
