//! Fleet polling stream.

use std::sync::Arc;

use realtime::Provider;
use telemetry::{FleetBatch, Origin, VehiclePosition, fleet_positions};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::memory::PositionMemory;
use crate::settings::TrackerSettings;

/// Where a polling stream is in its fetch cycle.
///
/// `Success` and `Failure` describe the latest completed cycle and hold until
/// the next fetch begins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Fetching,
    Success,
    Failure,
}

/// Fleet view published to consumers after every cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct FleetState {
    /// Vehicles with merged headings, in source order.
    pub vehicles: Vec<VehiclePosition>,
    pub phase: Phase,

    /// True until the first cycle completes.
    pub loading: bool,

    /// User-facing banner, set only when a failure leaves nothing to show.
    pub error: Option<String>,

    /// Origin of `vehicles`; `None` before the first cycle.
    pub origin: Option<Origin>,

    /// Number of completed cycles.
    pub cycle: u64,
}

impl Default for FleetState {
    fn default() -> Self {
        Self { vehicles: Vec::new(), phase: Phase::Idle, loading: true, error: None, origin: None, cycle: 0 }
    }
}

impl FleetState {
    /// Whether the displayed vehicles came from the live source.
    #[must_use]
    pub fn has_live_vehicles(&self) -> bool {
        matches!(self.origin, Some(Origin::Live)) && !self.vehicles.is_empty()
    }

    #[must_use]
    pub fn find(&self, vehicle_id: &str) -> Option<&VehiclePosition> {
        self.vehicles.iter().find(|vehicle| vehicle.id == vehicle_id)
    }
}

/// How one fleet cycle ended.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Fetched(FleetBatch),
    TimedOut,
}

/// Computes the state following `state` once a cycle completes.
///
/// A live batch replaces the vehicles. A fallback batch replaces them too,
/// unless the source failed while live vehicles are on display: those are
/// kept. A timed out cycle keeps whatever is displayed. The banner is raised
/// only when a failure leaves no vehicles at all.
#[must_use]
pub fn next_state(state: &FleetState, outcome: CycleOutcome, memory: &mut PositionMemory) -> FleetState {
    let cycle = state.cycle + 1;

    let batch = match outcome {
        CycleOutcome::TimedOut => return failed(state, cycle, "fleet poll timed out"),
        CycleOutcome::Fetched(batch) => batch,
    };

    let failure = match &batch.origin {
        Origin::Live => None,
        Origin::Fallback(reason) if reason.is_source_failure() => {
            if state.has_live_vehicles() {
                return failed(state, cycle, &reason.to_string());
            }
            Some(reason.to_string())
        }
        Origin::Fallback(_) => None,
    };

    let vehicles = memory.observe(batch.vehicles);
    let error = failure.as_ref().filter(|_| vehicles.is_empty()).map(|reason| banner(reason));
    if let Some(banner) = &error {
        error!(monotonic_counter.fleet_banners = 1, cycle, "{banner}");
    }

    FleetState {
        vehicles,
        phase: if failure.is_some() { Phase::Failure } else { Phase::Success },
        loading: false,
        error,
        origin: Some(batch.origin),
        cycle,
    }
}

fn failed(state: &FleetState, cycle: u64, reason: &str) -> FleetState {
    warn!(monotonic_counter.fleet_failures = 1, cycle, reason, "fleet poll failed");

    let error = state.vehicles.is_empty().then(|| banner(reason));
    if let Some(banner) = &error {
        error!(monotonic_counter.fleet_banners = 1, cycle, "{banner}");
    }

    FleetState {
        vehicles: state.vehicles.clone(),
        phase: Phase::Failure,
        loading: false,
        error,
        origin: state.origin.clone(),
        cycle,
    }
}

fn banner(reason: &str) -> String {
    format!("Unable to load vehicles: {reason}")
}

/// Periodic fleet poll running on its own task.
///
/// The task stops when the stream is dropped or [`FleetStream::stop`] is
/// called; a cycle in flight at that point is abandoned without publishing.
#[derive(Debug)]
pub struct FleetStream {
    state: watch::Receiver<FleetState>,
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl FleetStream {
    /// Starts polling immediately, then every `settings.fleet_interval`.
    #[must_use]
    pub fn start<P>(provider: Arc<P>, settings: TrackerSettings) -> Self
    where
        P: Provider + 'static,
    {
        let (tx, rx) = watch::channel(FleetState::default());
        let cancel = CancellationToken::new();
        let join = tokio::spawn(run(provider, settings, tx, cancel.clone()));

        Self { state: rx, cancel, join }
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<FleetState> {
        self.state.clone()
    }

    /// Latest published state.
    #[must_use]
    pub fn state(&self) -> FleetState {
        self.state.borrow().clone()
    }

    /// Stops polling and waits for the task to finish.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Err(err) = (&mut self.join).await {
            warn!(error = %err, "fleet stream task failed");
        }
    }
}

impl Drop for FleetStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run<P: Provider>(
    provider: Arc<P>, settings: TrackerSettings, tx: watch::Sender<FleetState>,
    cancel: CancellationToken,
) {
    let mut memory = PositionMemory::new(settings.retention_cycles);
    let mut ticker = interval(settings.fleet_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(interval = ?settings.fleet_interval, "fleet stream started");

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        tx.send_modify(|state| state.phase = Phase::Fetching);

        let fetch = timeout(settings.cycle_timeout, fleet_positions(provider.as_ref(), &settings.source));
        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = fetch => result.map_or(CycleOutcome::TimedOut, CycleOutcome::Fetched),
        };

        tx.send_modify(|state| *state = next_state(state, outcome, &mut memory));
        info!(monotonic_counter.fleet_polls = 1, cycle = memory.cycle(), "fleet poll completed");
    }

    info!("fleet stream stopped");
}
