//! Selected-vehicle polling stream.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use realtime::{Error, Provider};
use telemetry::{VehicleDetails, vehicle_details};
use tokio::sync::watch;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::fleet::{FleetState, Phase};
use crate::settings::TrackerSettings;

/// Detail view for the selected vehicle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailState {
    /// Selected vehicle, `None` when nothing is selected.
    pub vehicle_id: Option<String>,

    /// Latest details for `vehicle_id`, fully replaced on every fetch.
    pub details: Option<VehicleDetails>,

    /// True from selection until the first details arrive.
    pub loading: bool,
    pub phase: Phase,
}

/// Periodic detail poll for at most one selected vehicle.
///
/// Selecting a vehicle fetches immediately and then every
/// `settings.detail_interval`. Every selection gets a new epoch; a response
/// belonging to an older epoch is discarded instead of published, so rapid
/// switching never shows the details of a previously selected vehicle.
pub struct DetailStream<P> {
    provider: Arc<P>,
    settings: TrackerSettings,
    fleet: watch::Receiver<FleetState>,
    tx: watch::Sender<DetailState>,
    epoch: Arc<AtomicU64>,
    current: Option<CancellationToken>,
}

impl<P: Provider + 'static> DetailStream<P> {
    /// Creates an idle stream. `fleet` supplies the last known positions
    /// used when a vehicle has no live telemetry.
    #[must_use]
    pub fn new(provider: Arc<P>, settings: TrackerSettings, fleet: watch::Receiver<FleetState>) -> Self {
        let (tx, _) = watch::channel(DetailState::default());
        Self { provider, settings, fleet, tx, epoch: Arc::new(AtomicU64::new(0)), current: None }
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<DetailState> {
        self.tx.subscribe()
    }

    /// Latest published state.
    #[must_use]
    pub fn state(&self) -> DetailState {
        self.tx.borrow().clone()
    }

    /// Selects `vehicle_id`, replacing any previous selection.
    pub fn select(&mut self, vehicle_id: &str) {
        let epoch = self.cancel_current();
        info!(vehicle_id, epoch, "vehicle selected");

        self.tx.send_replace(DetailState {
            vehicle_id: Some(vehicle_id.to_string()),
            details: None,
            loading: true,
            phase: Phase::Fetching,
        });

        let cancel = CancellationToken::new();
        self.current = Some(cancel.clone());

        let poll = Poll {
            provider: Arc::clone(&self.provider),
            settings: self.settings.clone(),
            fleet: self.fleet.clone(),
            tx: self.tx.clone(),
            epoch: Arc::clone(&self.epoch),
            mine: epoch,
            vehicle_id: vehicle_id.to_string(),
        };
        tokio::spawn(poll.run(cancel));
    }

    /// Stops polling and clears the cached details.
    pub fn deselect(&mut self) {
        let epoch = self.cancel_current();
        info!(epoch, "vehicle deselected");
        self.tx.send_replace(DetailState::default());
    }

    #[must_use]
    pub fn selected(&self) -> Option<String> {
        self.tx.borrow().vehicle_id.clone()
    }

    // Invalidates the running poll and returns the new epoch.
    fn cancel_current(&mut self) -> u64 {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(cancel) = self.current.take() {
            cancel.cancel();
        }
        epoch
    }
}

impl<P> Drop for DetailStream<P> {
    fn drop(&mut self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        if let Some(cancel) = self.current.take() {
            cancel.cancel();
        }
    }
}

struct Poll<P> {
    provider: Arc<P>,
    settings: TrackerSettings,
    fleet: watch::Receiver<FleetState>,
    tx: watch::Sender<DetailState>,
    epoch: Arc<AtomicU64>,
    mine: u64,
    vehicle_id: String,
}

impl<P: Provider> Poll<P> {
    async fn run(self, cancel: CancellationToken) {
        let mut ticker = interval(self.settings.detail_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            if self.publish(|state| state.phase = Phase::Fetching).is_err() {
                break;
            }

            let last_known = self.fleet.borrow().find(&self.vehicle_id).cloned();
            let fetch = vehicle_details(
                self.provider.as_ref(),
                &self.vehicle_id,
                last_known.as_ref(),
                &self.settings.source,
            );

            let details = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    self.discard(&self.stale());
                    break;
                }
                details = fetch => details,
            };

            let published = self.publish(|state| {
                state.details = Some(details);
                state.loading = false;
                state.phase = Phase::Success;
            });
            if let Err(err) = published {
                self.discard(&err);
                break;
            }
        }

        debug!(vehicle_id = %self.vehicle_id, epoch = self.mine, "detail poll stopped");
    }
}

impl<P> Poll<P> {
    // Applies `update` only while this poll still owns the selection.
    fn publish(&self, update: impl FnOnce(&mut DetailState)) -> Result<(), Error> {
        let published = self.tx.send_if_modified(|state| {
            let current = self.epoch.load(Ordering::SeqCst) == self.mine
                && state.vehicle_id.as_deref() == Some(self.vehicle_id.as_str());
            if current {
                update(state);
            }
            current
        });
        if published { Ok(()) } else { Err(self.stale()) }
    }

    fn stale(&self) -> Error {
        Error::Stale(format!("selection of vehicle {} at epoch {} was superseded", self.vehicle_id, self.mine))
    }

    fn discard(&self, err: &Error) {
        debug!(
            monotonic_counter.stale_responses_discarded = 1,
            vehicle_id = %self.vehicle_id,
            epoch = self.mine,
            error = %err,
            "discarding detail response"
        );
    }
}
