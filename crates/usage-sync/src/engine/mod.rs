//! Synchronization engine.
//!
//! [`SyncEngine`] owns the [`SyncState`] and is the only code that mutates
//! it. It runs as a single task that waits on three sources:
//!
//! - a fixed-interval timer (the first tick fires immediately and is the
//!   start cycle)
//! - the command queue fed by [`EngineHandle`] (`Refresh`, `Quit`)
//! - the completion queue a spawned usage request reports back on
//!
//! A cycle reloads local stats, reads the credential fresh from the store
//! and, when one is present, spawns exactly one usage request. While that
//! request is in flight the phase is [`Phase::Refreshing`] and further
//! cycle requests from either trigger are dropped.
//!
//! Every change is published as a cloned snapshot on a `watch` channel.

mod state;

#[cfg(test)]
mod tests;

pub use state::{Phase, SyncState, NOT_AUTHENTICATED_MESSAGE};

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use claude_usage::{
    fetch_credential, load_historical_stats, ApiError, CredentialStore, UsageApi, UsageData,
};
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, EngineSection};

/// Default time between periodic cycles.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Capacity of the command queue. Refresh requests beyond this are
/// redundant and dropped.
const COMMAND_QUEUE_CAPACITY: usize = 8;

/// Engine settings resolved from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub refresh_interval: Duration,
    pub stats_path: PathBuf,
    pub credential_service: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            stats_path: EngineSection::default().stats_path(),
            credential_service: claude_usage::KEYCHAIN_SERVICE.to_string(),
        }
    }
}

impl EngineConfig {
    /// Resolves durations and paths from the `[engine]` section.
    pub fn from_section(section: &EngineSection) -> Result<Self, ConfigError> {
        Ok(Self {
            refresh_interval: section.refresh_interval()?,
            stats_path: section.stats_path(),
            credential_service: section.credential_service.clone(),
        })
    }
}

/// Requests accepted by the engine task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Run a cycle now unless one is in flight.
    Refresh,
    /// Stop the engine task.
    Quit,
}

type FetchOutcome = Result<UsageData, ApiError>;

/// Owner of the sync state.
pub struct SyncEngine {
    api: Arc<dyn UsageApi>,
    credentials: Box<dyn CredentialStore>,
    config: EngineConfig,
    state: SyncState,
    state_tx: watch::Sender<SyncState>,
    commands: mpsc::Receiver<Command>,
    completion_tx: mpsc::Sender<FetchOutcome>,
    completions: mpsc::Receiver<FetchOutcome>,
}

/// Cloneable handle used by consumers of the engine.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<SyncState>,
}

impl EngineHandle {
    /// The current state.
    pub fn snapshot(&self) -> SyncState {
        self.state.borrow().clone()
    }

    /// A receiver notified on every published change.
    pub fn subscribe(&self) -> watch::Receiver<SyncState> {
        self.state.clone()
    }

    /// Asks for a cycle. Never blocks; a full queue already holds a pending
    /// refresh, so the request is dropped.
    pub fn refresh(&self) {
        if let Err(e) = self.commands.try_send(Command::Refresh) {
            debug!(error = %e, "refresh request dropped");
        }
    }

    /// Asks the engine task to stop.
    pub async fn quit(&self) {
        if self.commands.send(Command::Quit).await.is_err() {
            debug!("engine already stopped");
        }
    }
}

impl SyncEngine {
    /// Creates the engine and its handle. Nothing runs until [`run`](Self::run)
    /// or [`refresh_once`](Self::refresh_once) is called.
    pub fn new(
        api: Arc<dyn UsageApi>,
        credentials: Box<dyn CredentialStore>,
        config: EngineConfig,
    ) -> (Self, EngineHandle) {
        let state = SyncState::default();
        let (state_tx, state_rx) = watch::channel(state.clone());
        let (command_tx, commands) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let (completion_tx, completions) = mpsc::channel(1);

        let engine = Self {
            api,
            credentials,
            config,
            state,
            state_tx,
            commands,
            completion_tx,
            completions,
        };
        let handle = EngineHandle {
            commands: command_tx,
            state: state_rx,
        };
        (engine, handle)
    }

    /// The state as last published.
    pub fn state(&self) -> &SyncState {
        &self.state
    }

    /// Runs until [`Command::Quit`] arrives or every handle is dropped.
    pub async fn run(mut self) {
        // `interval` panics on a zero period.
        let period = self.config.refresh_interval.max(Duration::from_millis(1));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            interval_secs = self.config.refresh_interval.as_secs(),
            "sync engine started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => self.start_cycle("timer"),
                command = self.commands.recv() => match command {
                    Some(Command::Refresh) => self.start_cycle("manual"),
                    Some(Command::Quit) | None => {
                        info!("sync engine shutting down");
                        break;
                    }
                },
                Some(outcome) = self.completions.recv() => self.apply_outcome(outcome),
            }
        }
    }

    /// Runs one cycle to completion, including its usage request, and
    /// returns the resulting state.
    pub async fn refresh_once(&mut self) -> SyncState {
        self.start_cycle("once");
        if self.state.phase == Phase::Refreshing {
            if let Some(outcome) = self.completions.recv().await {
                self.apply_outcome(outcome);
            }
        }
        self.state.clone()
    }

    fn start_cycle(&mut self, trigger: &'static str) {
        if self.state.phase == Phase::Refreshing {
            debug!(trigger, "usage request in flight, coalescing");
            return;
        }
        debug!(trigger, "starting sync cycle");

        self.reload_stats();

        let Some(credential) =
            fetch_credential(self.credentials.as_ref(), &self.config.credential_service)
        else {
            debug!("not authenticated, skipping usage request");
            self.state.needs_auth = true;
            self.state.error_message = Some(NOT_AUTHENTICATED_MESSAGE.to_string());
            self.state.phase = Phase::Unauthenticated;
            self.publish();
            return;
        };

        if credential.is_expired_at(Utc::now()) {
            debug!(expires_at = %credential.expires_at, "stored token looks expired, sending anyway");
        }

        self.state.subscription_label = credential.subscription_label();
        self.state.phase = Phase::Refreshing;
        self.state.is_loading = true;
        self.state.error_message = None;
        self.publish();

        let api = Arc::clone(&self.api);
        let completion_tx = self.completion_tx.clone();
        let token = credential.access_token;
        tokio::spawn(async move {
            // A panicking request still has to report back, or the phase
            // would stay `Refreshing`.
            let request = tokio::spawn(async move { api.fetch_usage(&token).await });
            let outcome = match request.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(error = %e, "usage request task failed");
                    Err(ApiError::Transport(format!("Usage request failed: {e}")))
                }
            };
            if completion_tx.send(outcome).await.is_err() {
                debug!("engine stopped before usage request completed");
            }
        });
    }

    fn reload_stats(&mut self) {
        match load_historical_stats(&self.config.stats_path) {
            Ok(Some(stats)) => self.state.historical_stats = Some(stats),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "failed to reload local stats, keeping previous snapshot"),
        }
    }

    fn apply_outcome(&mut self, outcome: FetchOutcome) {
        self.state.is_loading = false;

        match outcome {
            Ok(usage) => {
                self.state.session_limit = usage.five_hour;
                self.state.weekly_limit = usage.seven_day;
                self.state.sonnet_limit = usage.seven_day_sonnet;
                self.state.opus_limit = usage.seven_day_opus;
                self.state.extra_usage = usage.extra_usage;
                self.state.last_updated = Some(Utc::now());
                self.state.error_message = None;
                self.state.needs_auth = false;
                self.state.phase = Phase::Idle;
                debug!("usage refreshed");
            }
            Err(ApiError::Unauthorized) => {
                warn!("usage request rejected, token expired");
                self.state.needs_auth = true;
                self.state.error_message = Some(ApiError::Unauthorized.to_string());
                self.state.phase = Phase::AuthExpiredRecently;
            }
            Err(e) => {
                match &e {
                    ApiError::Http {
                        status,
                        retry_after,
                    } => warn!(status, retry_after = ?retry_after, "usage request failed"),
                    _ => warn!(error = %e, "usage request failed"),
                }
                self.state.error_message = Some(e.to_string());
                self.state.phase = Phase::Idle;
            }
        }

        self.publish();
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.state.clone());
    }
}
