//! Background polling loop.
//!
//! The poller owns the two most recent snapshots and the only long-lived
//! task: refresh immediately, then once per interval until stopped.
//! Cancellation stops the wait between cycles; a cycle already running is
//! allowed to finish, but its result is discarded. A cycle lock guarantees
//! at most one aggregation in flight, even across a restart.

use crate::error::AppError;
use crate::models::{MergeRequestFilters, Snapshot, Transition, WatchedRepository};
use crate::services::aggregator::{aggregate, AggregateOptions, RepositoryFailure};
use crate::services::differ::diff;
use crate::services::gateway::MergeRequestGateway;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio_util::sync::CancellationToken;

/// Default refresh interval in seconds.
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 60;

/// Shortest wait between cycles the loop will honor.
const MIN_LOOP_INTERVAL: Duration = Duration::from_secs(1);

/// Buffered transition batches per subscriber.
const TRANSITION_CHANNEL_CAPACITY: usize = 64;

/// Everything one cycle needs. Read once at the start of each cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct PollerConfig {
    pub repositories: Vec<WatchedRepository>,
    pub filters: MergeRequestFilters,
    pub interval: Duration,
    pub options: AggregateOptions,
    /// Whether consecutive snapshots are diffed for notifications.
    pub notifications_enabled: bool,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            repositories: Vec::new(),
            filters: MergeRequestFilters::default(),
            interval: Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS),
            options: AggregateOptions::default(),
            notifications_enabled: true,
        }
    }
}

/// Lifecycle of the polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PollerPhase {
    /// Never started.
    Idle,
    Running,
    /// Stopped; may be started again.
    Cancelled,
}

/// Status of the poller, for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollerStatus {
    pub phase: PollerPhase,

    /// Whether a cycle is currently running.
    pub is_refreshing: bool,

    /// Completion time of the last successful cycle.
    pub last_refresh: Option<DateTime<Utc>>,

    /// Error of the last cycle, cleared by the next successful one.
    pub last_error: Option<AppError>,

    /// Repositories skipped by the last successful cycle.
    pub warnings: Vec<RepositoryFailure>,

    /// Number of MRs in the current snapshot.
    pub mr_count: usize,
}

#[derive(Debug)]
struct PollerState {
    phase: PollerPhase,
    is_refreshing: bool,
    current: Option<Arc<Snapshot>>,
    previous: Option<Arc<Snapshot>>,
    last_refresh: Option<DateTime<Utc>>,
    last_error: Option<AppError>,
    warnings: Vec<RepositoryFailure>,
}

impl Default for PollerState {
    fn default() -> Self {
        Self {
            phase: PollerPhase::Idle,
            is_refreshing: false,
            current: None,
            previous: None,
            last_refresh: None,
            last_error: None,
            warnings: Vec::new(),
        }
    }
}

/// State shared between the poller handle and its loop task.
struct Shared<G: ?Sized> {
    config: RwLock<PollerConfig>,
    state: RwLock<PollerState>,
    cycle_lock: Mutex<()>,
    transitions: broadcast::Sender<Vec<Transition>>,
    gateway: Arc<G>,
}

/// The running loop, if any.
struct LoopHandle {
    cancel_token: CancellationToken,
    task: tokio::task::JoinHandle<()>,
}

impl LoopHandle {
    fn is_active(&self) -> bool {
        !self.cancel_token.is_cancelled() && !self.task.is_finished()
    }
}

/// Periodic refresh of merge requests across watched repositories.
pub struct Poller<G: ?Sized> {
    shared: Arc<Shared<G>>,
    loop_handle: Mutex<Option<LoopHandle>>,
    /// Parent of every loop token; cancelled when the poller is dropped.
    root_token: CancellationToken,
}

impl<G> Poller<G>
where
    G: MergeRequestGateway + ?Sized + 'static,
{
    /// Create an idle poller.
    pub fn new(gateway: Arc<G>, config: PollerConfig) -> Self {
        let (transitions, _) = broadcast::channel(TRANSITION_CHANNEL_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                config: RwLock::new(config),
                state: RwLock::new(PollerState::default()),
                cycle_lock: Mutex::new(()),
                transitions,
                gateway,
            }),
            loop_handle: Mutex::new(None),
            root_token: CancellationToken::new(),
        }
    }

    /// Start the background loop, refreshing immediately.
    ///
    /// Returns `false` without doing anything if the loop is already running.
    pub async fn start_polling(&self) -> bool {
        let mut handle = self.loop_handle.lock().await;
        if handle.as_ref().is_some_and(LoopHandle::is_active) {
            log::debug!("[poller] Already running");
            return false;
        }

        *handle = Some(self.spawn_loop().await);
        true
    }

    /// Stop scheduling cycles. A cycle in flight finishes but is discarded.
    pub async fn stop_polling(&self) {
        let mut handle = self.loop_handle.lock().await;
        if let Some(running) = handle.take() {
            log::info!("[poller] Stopping");
            running.cancel_token.cancel();
        }
        self.shared.state.write().await.phase = PollerPhase::Cancelled;
    }

    /// Apply a new interval and filters, then start over immediately.
    pub async fn restart_polling(&self, interval: Duration, filters: MergeRequestFilters) {
        {
            let mut config = self.shared.config.write().await;
            config.interval = interval;
            config.filters = filters;
        }
        self.restart().await;
    }

    /// Replace the whole configuration, then start over immediately.
    pub async fn restart_with_config(&self, config: PollerConfig) {
        *self.shared.config.write().await = config;
        self.restart().await;
    }

    async fn restart(&self) {
        let mut handle = self.loop_handle.lock().await;
        if let Some(old) = handle.take() {
            old.cancel_token.cancel();
        }
        log::info!("[poller] Restarting with new configuration");
        *handle = Some(self.spawn_loop().await);
    }

    async fn spawn_loop(&self) -> LoopHandle {
        let cancel_token = self.root_token.child_token();
        self.shared.state.write().await.phase = PollerPhase::Running;

        let shared = self.shared.clone();
        let token = cancel_token.clone();
        let task = tokio::spawn(async move { shared.run_loop(token).await });

        LoopHandle { cancel_token, task }
    }

    /// Run one cycle now, outside the schedule.
    ///
    /// Waits for a cycle already in flight rather than overlapping it.
    pub async fn refresh_now(&self) -> Result<Arc<Snapshot>, AppError> {
        let config = self.shared.config.read().await.clone();
        self.shared
            .run_cycle(&config, None)
            .await?
            .ok_or_else(|| AppError::internal("Refresh was cancelled"))
    }

    /// Snapshot of the last successful cycle.
    pub async fn current_snapshot(&self) -> Option<Arc<Snapshot>> {
        self.shared.state.read().await.current.clone()
    }

    /// Snapshot of the successful cycle before that.
    pub async fn previous_snapshot(&self) -> Option<Arc<Snapshot>> {
        self.shared.state.read().await.previous.clone()
    }

    /// Error of the last cycle, if it failed.
    pub async fn last_error(&self) -> Option<AppError> {
        self.shared.state.read().await.last_error.clone()
    }

    pub async fn status(&self) -> PollerStatus {
        let state = self.shared.state.read().await;
        PollerStatus {
            phase: state.phase,
            is_refreshing: state.is_refreshing,
            last_refresh: state.last_refresh,
            last_error: state.last_error.clone(),
            warnings: state.warnings.clone(),
            mr_count: state.current.as_ref().map_or(0, |s| s.len()),
        }
    }

    /// Current configuration.
    pub async fn config(&self) -> PollerConfig {
        self.shared.config.read().await.clone()
    }

    /// Receive the transitions detected by each cycle.
    pub fn subscribe(&self) -> broadcast::Receiver<Vec<Transition>> {
        self.shared.transitions.subscribe()
    }
}

impl<G: ?Sized> Drop for Poller<G> {
    fn drop(&mut self) {
        self.root_token.cancel();
    }
}

impl<G> Shared<G>
where
    G: MergeRequestGateway + ?Sized,
{
    async fn run_loop(&self, token: CancellationToken) {
        log::info!("[poller] Started");

        while !token.is_cancelled() {
            let config = self.config.read().await.clone();

            match self.run_cycle(&config, Some(&token)).await {
                Ok(Some(snapshot)) => {
                    log::info!("[poller] Cycle complete: {} MRs", snapshot.len())
                }
                Ok(None) => {}
                Err(e) => log::error!("[poller] Cycle failed: {}", e),
            }

            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(config.interval.max(MIN_LOOP_INTERVAL)) => {}
            }
        }

        log::info!("[poller] Stopped");
    }

    /// Run one aggregation and publish its result.
    ///
    /// Returns `Ok(None)` when `token` was cancelled before the cycle could
    /// publish; nothing is stored in that case.
    async fn run_cycle(
        &self,
        config: &PollerConfig,
        token: Option<&CancellationToken>,
    ) -> Result<Option<Arc<Snapshot>>, AppError> {
        let is_cancelled = || token.is_some_and(CancellationToken::is_cancelled);

        let _cycle = self.cycle_lock.lock().await;
        if is_cancelled() {
            return Ok(None);
        }

        self.state.write().await.is_refreshing = true;

        let result = aggregate(
            self.gateway.as_ref(),
            &config.repositories,
            &config.filters,
            &config.options,
        )
        .await;

        let mut state = self.state.write().await;
        state.is_refreshing = false;

        if is_cancelled() {
            log::debug!("[poller] Discarding result of a cancelled cycle");
            return Ok(None);
        }

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                // Keep showing the last good snapshot
                state.last_error = Some(e.clone());
                return Err(e);
            }
        };

        let snapshot = Arc::new(outcome.snapshot);
        let prior = state.current.replace(snapshot.clone());

        let transitions = match &prior {
            Some(previous) if config.notifications_enabled && !previous.is_empty() => {
                diff(previous, &snapshot)
            }
            _ => Vec::new(),
        };

        if prior.is_some() {
            state.previous = prior;
        }
        state.last_error = None;
        state.warnings = outcome.failures;
        state.last_refresh = Some(Utc::now());
        drop(state);

        if !transitions.is_empty() {
            log::info!("[poller] {} transition(s) detected", transitions.len());
            // No subscribers is fine
            let _ = self.transitions.send(transitions);
        }

        Ok(Some(snapshot))
    }
}
