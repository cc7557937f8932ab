//! # Fleet Dashboard
//!
//! Host wiring for the live fleet map: settings from the environment, a
//! `reqwest` provider for the telemetry source, view models, and the
//! [`Dashboard`] runtime joining the polling streams to the animated map.

mod config;
mod provider;
mod view;

use std::sync::Arc;

use animation::{MapLayer, MarkerFactory};
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry, fmt};
use tracker::{DetailState, DetailStream, FleetState, FleetStream};

pub use self::config::*;
pub use self::provider::*;
pub use self::view::*;

/// Initializes `tracing` output filtered by `RUST_LOG`. Safe to call more
/// than once.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if Registry::default().with(filter).with(fmt::layer()).try_init().is_err() {
        tracing::debug!("tracing already initialized");
    }
}

/// The running dashboard: fleet and detail streams feeding the map layer.
pub struct Dashboard<P, F> {
    fleet: FleetStream,
    fleet_rx: watch::Receiver<FleetState>,
    detail: DetailStream<P>,
    map: MapLayer<F>,
    settings: Arc<Settings>,
    expanded: bool,
}

impl<P, F> Dashboard<P, F>
where
    P: realtime::Provider + 'static,
    F: MarkerFactory,
{
    /// Starts the fleet stream. The detail stream stays idle until a vehicle
    /// is selected.
    #[must_use]
    pub fn start(provider: Arc<P>, factory: F, settings: Arc<Settings>) -> Self {
        let fleet = FleetStream::start(Arc::clone(&provider), settings.tracker.clone());
        let fleet_rx = fleet.subscribe();
        let detail = DetailStream::new(provider, settings.tracker.clone(), fleet.subscribe());
        let map = MapLayer::new(factory, settings.animation);

        Self { fleet, fleet_rx, detail, map, settings, expanded: false }
    }

    /// Applies a user interaction.
    pub fn handle(&mut self, event: ViewEvent) {
        match event {
            ViewEvent::VehicleSelected(vehicle_id) => {
                self.expanded = false;
                self.detail.select(&vehicle_id);
            }
            ViewEvent::DetailClosed => self.detail.deselect(),
        }
    }

    /// Pushes the latest fleet sample to the map if it changed since the last
    /// call. Returns whether the map was updated.
    pub fn sync(&mut self) -> bool {
        if !self.fleet_rx.has_changed().unwrap_or(false) {
            return false;
        }
        self.apply_fleet();
        true
    }

    fn apply_fleet(&mut self) {
        let vehicles = self.fleet_rx.borrow_and_update().vehicles.clone();
        self.map.update(&vehicles);
    }

    /// Advances marker animations by one frame.
    pub fn frame(&mut self, now: Instant) {
        self.map.tick(now.into_std());
    }

    /// Shows or hides the additional telemetry beyond the first few entries.
    pub const fn toggle_telemetry(&mut self) {
        self.expanded = !self.expanded;
    }

    #[must_use]
    pub fn fleet_panel(&self) -> FleetPanel {
        FleetPanel::from_state(&self.fleet.state())
    }

    #[must_use]
    pub fn detail_view(&self) -> DetailView {
        DetailView::from_state(&self.detail.state(), self.expanded)
    }

    #[must_use]
    pub fn fleet_state(&self) -> FleetState {
        self.fleet.state()
    }

    #[must_use]
    pub fn subscribe_fleet(&self) -> watch::Receiver<FleetState> {
        self.fleet.subscribe()
    }

    #[must_use]
    pub fn subscribe_detail(&self) -> watch::Receiver<DetailState> {
        self.detail.subscribe()
    }

    #[must_use]
    pub const fn map(&self) -> &MapLayer<F> {
        &self.map
    }

    /// Runs the frame loop until `cancel` fires, applying view events and
    /// fleet samples as they arrive.
    pub async fn run(mut self, mut events: mpsc::Receiver<ViewEvent>, cancel: CancellationToken) {
        let mut frames = interval(self.settings.frame_interval);
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(frame_interval = ?self.settings.frame_interval, "dashboard started");

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                Some(event) = events.recv() => self.handle(event),
                changed = self.fleet_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    self.apply_fleet();
                }
                now = frames.tick() => self.frame(now),
            }
        }

        self.detail.deselect();
        self.map.clear();
        self.fleet.stop().await;
        info!("dashboard stopped");
    }
}
