//! At most one usage request in flight.

use super::{config, engine, logged_in_store, usage, ScriptedApi};
use crate::engine::{Phase, SyncEngine, SyncState};
use claude_usage::ApiError;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::{watch, Notify};

async fn wait_until(rx: &mut watch::Receiver<SyncState>, pred: impl FnMut(&SyncState) -> bool) {
    tokio::time::timeout(Duration::from_secs(2), rx.wait_for(pred))
        .await
        .expect("state should be reached in time")
        .expect("engine should still be running");
}

#[tokio::test]
async fn test_manual_refresh_while_refreshing_is_coalesced() {
    let dir = TempDir::new().expect("temp dir");
    let gate = Arc::new(Notify::new());
    let api = Arc::new(ScriptedApi::gated(
        gate.clone(),
        vec![Ok(usage(10.0)), Ok(usage(20.0))],
    ));
    let (engine, handle) = engine(api.clone(), logged_in_store(), &dir.path().join("stats.json"));
    let mut rx = handle.subscribe();
    let task = tokio::spawn(engine.run());

    wait_until(&mut rx, |s| s.phase == Phase::Refreshing).await;
    handle.refresh();
    handle.refresh();
    handle.refresh();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(api.calls(), 1, "no second request while one is in flight");
    assert!(handle.snapshot().is_loading);

    gate.notify_one();
    wait_until(&mut rx, |s| s.phase == Phase::Idle && s.last_updated.is_some()).await;
    assert_eq!(api.calls(), 1);
    assert_eq!(
        handle.snapshot().session_limit.expect("session").utilization,
        10.0
    );

    handle.quit().await;
    tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .expect("engine should stop")
        .expect("engine task should not panic");
}

#[tokio::test]
async fn test_timer_tick_while_refreshing_is_coalesced() {
    let dir = TempDir::new().expect("temp dir");
    let gate = Arc::new(Notify::new());
    let api = Arc::new(ScriptedApi::gated(gate.clone(), vec![Ok(usage(10.0))]));
    let (engine, handle) = SyncEngine::new(
        api.clone(),
        Box::new(logged_in_store()),
        config(&dir.path().join("stats.json"), Duration::from_millis(10)),
    );
    let mut rx = handle.subscribe();
    let task = tokio::spawn(engine.run());

    wait_until(&mut rx, |s| s.phase == Phase::Refreshing).await;
    // several ticks elapse with the first request still held
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(api.calls(), 1, "timer must not start a second request");
    assert_eq!(handle.snapshot().phase, Phase::Refreshing);

    gate.notify_one();
    wait_until(&mut rx, |s| s.last_updated.is_some()).await;

    handle.quit().await;
    tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .expect("engine should stop")
        .expect("engine task should not panic");
}

#[tokio::test]
async fn test_refresh_after_completion_starts_new_request() {
    let dir = TempDir::new().expect("temp dir");
    let gate = Arc::new(Notify::new());
    let api = Arc::new(ScriptedApi::gated(
        gate.clone(),
        vec![Ok(usage(10.0)), Ok(usage(20.0))],
    ));
    let (engine, handle) = engine(api.clone(), logged_in_store(), &dir.path().join("stats.json"));
    let mut rx = handle.subscribe();
    let task = tokio::spawn(engine.run());

    wait_until(&mut rx, |s| s.phase == Phase::Refreshing).await;
    gate.notify_one();
    wait_until(&mut rx, |s| s.phase == Phase::Idle).await;

    handle.refresh();
    wait_until(&mut rx, |s| s.phase == Phase::Refreshing).await;
    assert_eq!(api.calls(), 2);
    gate.notify_one();
    wait_until(&mut rx, |s| {
        s.session_limit.as_ref().map(|w| w.utilization) == Some(20.0)
    })
    .await;

    handle.quit().await;
    task.await.expect("engine task should not panic");
}

#[tokio::test]
async fn test_error_cleared_while_request_in_flight() {
    let dir = TempDir::new().expect("temp dir");
    let gate = Arc::new(Notify::new());
    let api = Arc::new(ScriptedApi::gated(
        gate.clone(),
        vec![
            Err(ApiError::Http {
                status: 503,
                retry_after: None,
            }),
            Ok(usage(1.0)),
        ],
    ));
    let (engine, handle) = engine(api, logged_in_store(), &dir.path().join("stats.json"));
    let mut rx = handle.subscribe();
    let task = tokio::spawn(engine.run());

    gate.notify_one();
    wait_until(&mut rx, |s| s.error_message.as_deref() == Some("HTTP error 503")).await;

    handle.refresh();
    wait_until(&mut rx, |s| s.phase == Phase::Refreshing).await;
    let in_flight = handle.snapshot();
    assert!(in_flight.is_loading);
    assert!(in_flight.error_message.is_none());

    gate.notify_one();
    wait_until(&mut rx, |s| s.phase == Phase::Idle && s.last_updated.is_some()).await;

    handle.quit().await;
    task.await.expect("engine task should not panic");
}
