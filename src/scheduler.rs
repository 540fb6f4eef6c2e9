//! Refresh scheduler.
//!
//! One task runs fetch → decode → classify → commit cycles, driven by a fixed
//! interval and by manual requests. Only one cycle is ever in flight; a
//! trigger that arrives while a cycle runs is dropped, not queued.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::classify::Classifier;
use crate::config::Config;
use crate::error::RefreshError;
use crate::fetch::FeedClient;
use crate::models::Snapshot;
use crate::parser::{DecodedFeed, decode};
use crate::snapshot::SnapshotStore;
use crate::stats::DecodeStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleState {
    Idle,
    Fetching,
    Decoding,
    Committing,
}

/// What started a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Timer,
    Manual,
}

#[derive(Debug)]
pub enum CycleOutcome {
    Committed { records: usize, stats: DecodeStats },
    /// The store was flagged with the error and kept its records.
    Failed(RefreshError),
    /// Another cycle was already running.
    Coalesced,
}

/// Result of asking for a manual refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshRequest {
    Accepted,
    /// A cycle is running or already pending.
    Coalesced,
    /// The scheduler task has exited.
    Stopped,
}

type SharedState = Arc<Mutex<CycleState>>;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Marks a cycle as in flight and puts the state back to idle when dropped,
/// including when the cycle future is dropped mid-fetch.
struct CycleGuard<'a> {
    state: &'a Mutex<CycleState>,
}

impl CycleGuard<'_> {
    fn enter(&self, next: CycleState) {
        *lock(self.state) = next;
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        *lock(self.state) = CycleState::Idle;
    }
}

pub struct Scheduler<F> {
    feed: F,
    classifier: Classifier,
    store: Arc<SnapshotStore>,
    state: SharedState,
    interval: Duration,
    min_request_interval: Duration,
    last_fetch: Mutex<Option<Instant>>,
}

impl<F: FeedClient> Scheduler<F> {
    pub fn new(feed: F, store: Arc<SnapshotStore>, config: &Config) -> Self {
        Self {
            feed,
            classifier: Classifier::new(config.moving_speed_threshold),
            store,
            state: Arc::new(Mutex::new(CycleState::Idle)),
            interval: config.refresh_interval(),
            min_request_interval: config.min_request_interval(),
            last_fetch: Mutex::new(None),
        }
    }

    pub fn state(&self) -> CycleState {
        *lock(&self.state)
    }

    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    fn try_begin(&self) -> Option<CycleGuard<'_>> {
        let mut state = lock(&self.state);
        if *state != CycleState::Idle {
            return None;
        }
        *state = CycleState::Fetching;
        Some(CycleGuard { state: &self.state })
    }

    /// Runs one cycle unless another is already in flight.
    ///
    /// A failed fetch or decode never propagates: the store keeps its
    /// records, its status becomes `ERROR`, and the error is returned in the
    /// outcome for the caller to inspect.
    #[tracing::instrument(skip(self), fields(source = self.feed.source()))]
    pub async fn run_cycle(&self, trigger: Trigger) -> CycleOutcome {
        let Some(guard) = self.try_begin() else {
            debug!("Cycle already in flight, coalescing trigger");
            return CycleOutcome::Coalesced;
        };

        self.wait_for_request_slot().await;
        let started = Instant::now();

        match self.fetch_and_decode(&guard).await {
            Ok(decoded) => {
                guard.enter(CycleState::Committing);
                let records = self.classifier.classify_all(&decoded.entities);
                let count = records.len();
                let moving = records.iter().filter(|r| r.moving).count();
                self.store
                    .commit(Snapshot::fresh(records, Utc::now().timestamp()));

                info!(
                    records = count,
                    moving,
                    dropped = decoded.stats.dropped_without_position,
                    duplicates = decoded.stats.duplicate_ids,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Snapshot committed"
                );
                CycleOutcome::Committed {
                    records: count,
                    stats: decoded.stats,
                }
            }
            Err(err) => {
                warn!(
                    error = %err,
                    kind = err.kind(),
                    "Refresh cycle failed, keeping previous records"
                );
                self.store.mark_error(err.to_string(), Utc::now().timestamp());
                CycleOutcome::Failed(err)
            }
        }
    }

    async fn fetch_and_decode(&self, guard: &CycleGuard<'_>) -> Result<DecodedFeed, RefreshError> {
        guard.enter(CycleState::Fetching);
        let bytes = self.feed.fetch().await?;
        debug!(bytes = bytes.len(), "Feed bytes received, decoding");

        guard.enter(CycleState::Decoding);
        Ok(decode(&bytes)?)
    }

    /// Sleeps until at least `min_request_interval` has passed since the
    /// previous fetch started.
    ///
    /// The slot is taken before the fetch, so failed requests count towards
    /// the spacing as well as successful ones.
    async fn wait_for_request_slot(&self) {
        let earliest = lock(&self.last_fetch).map(|last| last + self.min_request_interval);
        if let Some(earliest) = earliest {
            let now = Instant::now();
            if earliest > now {
                debug!(
                    wait_ms = (earliest - now).as_millis() as u64,
                    "Spacing out feed requests"
                );
                tokio::time::sleep_until(earliest).await;
            }
        }
        *lock(&self.last_fetch) = Some(Instant::now());
    }
}

impl<F: FeedClient + 'static> Scheduler<F> {
    /// Starts the refresh loop on the current runtime.
    ///
    /// The first timer tick fires immediately, so the store is populated
    /// without waiting a full interval.
    pub fn spawn(self) -> (RefreshHandle, JoinHandle<()>) {
        let (handle, rx) = RefreshHandle::new(Arc::clone(&self.state));
        let task = tokio::spawn(self.run(rx));
        (handle, task)
    }

    async fn run(self, mut triggers: mpsc::Receiver<Trigger>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut manual_open = true;

        info!(
            interval_secs = self.interval.as_secs(),
            source = self.feed.source(),
            "Refresh scheduler started"
        );

        loop {
            let trigger = tokio::select! {
                _ = ticker.tick() => Trigger::Timer,
                msg = triggers.recv(), if manual_open => match msg {
                    Some(trigger) => trigger,
                    None => {
                        debug!("All refresh handles dropped, timer only from now on");
                        manual_open = false;
                        continue;
                    }
                },
            };

            // Requests made mid-cycle were already refused by the handle, so
            // anything left in the channel was accepted and must still run.
            self.run_cycle(trigger).await;
        }
    }
}

/// Cloneable handle for requesting a refresh outside the timer.
#[derive(Debug, Clone)]
pub struct RefreshHandle {
    tx: mpsc::Sender<Trigger>,
    state: SharedState,
}

impl RefreshHandle {
    fn new(state: SharedState) -> (Self, mpsc::Receiver<Trigger>) {
        let (tx, rx) = mpsc::channel(1);
        (Self { tx, state }, rx)
    }

    /// A handle with no scheduler behind it; the caller owns the receiver.
    #[cfg(test)]
    pub(crate) fn unattached() -> (Self, mpsc::Receiver<Trigger>) {
        Self::new(Arc::new(Mutex::new(CycleState::Idle)))
    }

    pub fn request(&self) -> RefreshRequest {
        if self.state() != CycleState::Idle {
            return RefreshRequest::Coalesced;
        }
        match self.tx.try_send(Trigger::Manual) {
            Ok(()) => RefreshRequest::Accepted,
            Err(TrySendError::Full(_)) => RefreshRequest::Coalesced,
            Err(TrySendError::Closed(_)) => RefreshRequest::Stopped,
        }
    }

    pub fn state(&self) -> CycleState {
        *lock(&self.state)
    }
}
