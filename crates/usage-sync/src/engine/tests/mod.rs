//! Tests for the sync engine.
//!
//! - `cycle`: outcome handling for one complete cycle
//! - `stats`: local stats reload rules
//! - `inflight`: the at-most-one-request guard
//! - `handle`: the running task driven through `EngineHandle`

mod inflight;

use super::{EngineConfig, EngineHandle, SyncEngine};
use async_trait::async_trait;
use claude_usage::{ApiError, MemoryStore, RateLimitWindow, UsageApi, UsageData};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

pub(super) const SERVICE: &str = "test-credentials";

/// Usage API returning scripted outcomes in order, optionally holding each
/// request until the gate is notified.
pub(super) struct ScriptedApi {
    responses: Mutex<VecDeque<Result<UsageData, ApiError>>>,
    calls: AtomicUsize,
    gate: Option<Arc<Notify>>,
}

impl ScriptedApi {
    pub(super) fn new(responses: Vec<Result<UsageData, ApiError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
            gate: None,
        }
    }

    pub(super) fn gated(gate: Arc<Notify>, responses: Vec<Result<UsageData, ApiError>>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(responses)
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UsageApi for ScriptedApi {
    async fn fetch_usage(&self, token: &str) -> Result<UsageData, ApiError> {
        assert_eq!(token, "sk-ant-oat01-test");
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.responses
            .lock()
            .expect("responses lock")
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::Transport("no scripted response".to_string())))
    }
}

/// Stored credential payload in Claude Code's format.
pub(super) fn credential_json(subscription: Option<&str>) -> String {
    serde_json::json!({
        "claudeAiOauth": {
            "accessToken": "sk-ant-oat01-test",
            "refreshToken": "sk-ant-ort01-test",
            "expiresAt": 4_102_444_800_000_i64,
            "subscriptionType": subscription,
        }
    })
    .to_string()
}

pub(super) fn logged_in_store() -> MemoryStore {
    MemoryStore::with_entry(SERVICE, credential_json(Some("max")))
}

pub(super) fn window(utilization: f64) -> RateLimitWindow {
    RateLimitWindow {
        utilization,
        resets_at: None,
    }
}

/// A usage snapshot with every window the engine tracks at `utilization`.
pub(super) fn usage(utilization: f64) -> UsageData {
    UsageData {
        five_hour: Some(window(utilization)),
        seven_day: Some(window(utilization / 2.0)),
        seven_day_sonnet: Some(window(1.0)),
        seven_day_opus: Some(window(2.0)),
        ..UsageData::default()
    }
}

pub(super) fn config(stats_path: &Path, refresh_interval: Duration) -> EngineConfig {
    EngineConfig {
        refresh_interval,
        stats_path: stats_path.to_path_buf(),
        credential_service: SERVICE.to_string(),
    }
}

/// Engine over `api` and `store` with stats at `stats_path` and a one-hour
/// interval, so only the immediate first tick fires during a test.
pub(super) fn engine(
    api: Arc<ScriptedApi>,
    store: MemoryStore,
    stats_path: &Path,
) -> (SyncEngine, EngineHandle) {
    SyncEngine::new(
        api,
        Box::new(store),
        config(stats_path, Duration::from_secs(3600)),
    )
}
