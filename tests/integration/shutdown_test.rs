// tests/integration/shutdown_test.rs

//! Tests for the graceful shutdown sequence: warning, grace period, forced
//! close, and the single final save.

use super::test_helpers::{TestClient, TestContext};
use memorydb::server::{ListenerState, shutdown_warning};
use std::time::{Duration, Instant};
use tokio::net::TcpStream;

#[tokio::test]
async fn test_shutdown_without_clients_saves_and_reports() {
    let ctx = TestContext::new().await;
    assert_eq!(ctx.server.listener_state(), ListenerState::Running);
    let path = ctx.snapshot_path();

    let (report, _dir) = ctx.stop().await;
    assert_eq!(report.warned, 0);
    assert_eq!(report.force_closed, 0);
    assert_eq!(report.aborted, 0);
    assert!(report.saved);
    assert!(path.exists());
}

#[tokio::test]
async fn test_idle_clients_are_warned_then_force_closed() {
    let ctx = TestContext::new().await;
    let mut clients = Vec::new();
    for _ in 0..3 {
        clients.push(ctx.connect().await);
    }
    let expected = shutdown_warning(Duration::from_millis(300));
    assert_eq!(expected, "host wants to shut down the server in: 300ms");

    let stop = tokio::spawn(ctx.stop());

    for client in clients.iter_mut() {
        assert_eq!(client.read_reply().await, expected);
    }
    for client in clients.iter_mut() {
        assert_eq!(client.read_until_closed().await, "");
    }

    let (report, _dir) = stop.await.unwrap();
    assert_eq!(report.warned, 3);
    assert_eq!(report.force_closed, 3);
    assert_eq!(report.aborted, 0);
    assert!(report.saved);
}

#[tokio::test]
async fn test_clients_leaving_during_grace_are_not_force_closed() {
    let ctx = TestContext::with_config(|config| {
        config.shutdown.grace_period = Duration::from_secs(3);
    })
    .await;
    let mut client = ctx.connect().await;

    let started = Instant::now();
    let stop = tokio::spawn(ctx.stop());

    assert_eq!(
        client.read_reply().await,
        "host wants to shut down the server in: 3s"
    );
    client.send_line("exit").await;
    client.read_until_closed().await;

    let (report, _dir) = stop.await.unwrap();
    assert_eq!(report.warned, 1);
    assert_eq!(report.force_closed, 0);
    // Shutdown did not sit out the whole grace period once everyone left.
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn test_commands_during_grace_period_are_persisted() {
    let ctx = TestContext::with_config(|config| {
        config.shutdown.grace_period = Duration::from_millis(500);
    })
    .await;
    let path = ctx.snapshot_path();
    let mut client = ctx.connect().await;

    let stop = tokio::spawn(ctx.stop());
    let warning = client.read_reply().await;
    assert!(warning.starts_with("host wants to shut down the server in:"));
    assert_eq!(client.command("set late arrival").await, "OK");

    let (report, _dir) = stop.await.unwrap();
    assert!(report.saved);
    let contents = tokio::fs::read_to_string(&path).await.unwrap();
    let snapshot: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(snapshot["late"], "arrival");
}

#[tokio::test]
async fn test_listener_is_closed_after_shutdown() {
    let ctx = TestContext::new().await;
    let addr = ctx.addr();
    let _ = ctx.stop().await;
    assert!(TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn test_shutdown_handle_is_idempotent_and_wait_completes() {
    let ctx = TestContext::new().await;
    let handle = ctx.server.shutdown_handle();
    assert!(!handle.is_shutdown_requested());

    handle.shutdown();
    handle.shutdown();
    assert!(handle.is_shutdown_requested());

    let report = tokio::time::timeout(Duration::from_secs(10), ctx.server.wait())
        .await
        .unwrap();
    assert!(report.saved);
}

#[tokio::test]
async fn test_save_failure_is_reported_but_shutdown_completes() {
    let ctx = TestContext::new().await;
    // Occupy the snapshot path with a non-empty directory so the rename fails.
    let path = ctx.snapshot_path();
    tokio::fs::create_dir_all(path.join("blocker")).await.unwrap();

    let mut client = ctx.connect().await;
    assert_eq!(client.command("set k v").await, "OK");
    drop(client);

    let (report, _dir) = ctx.stop().await;
    assert!(!report.saved);
}

#[tokio::test]
async fn test_new_connections_are_served_until_shutdown() {
    let ctx = TestContext::new().await;
    let addr = ctx.addr();
    for i in 0..5 {
        let mut client = TestClient::connect(addr).await;
        assert_eq!(client.command(&format!("set k{i} v{i}")).await, "OK");
    }
    let (report, _dir) = ctx.stop().await;
    assert!(report.saved);
}

#[tokio::test]
async fn test_listener_moves_through_draining_to_stopped() {
    let ctx = TestContext::new().await;
    let mut states = ctx.server.listener_state_watch();
    assert_eq!(*states.borrow(), ListenerState::Running);
    let mut client = ctx.connect().await;

    let stop = tokio::spawn(ctx.stop());

    // The warning is only sent once the listener is draining.
    assert_eq!(
        client.read_reply().await,
        shutdown_warning(Duration::from_millis(300))
    );
    assert_eq!(*states.borrow_and_update(), ListenerState::Draining);

    let (report, _dir) = stop.await.unwrap();
    assert!(report.saved);
    // The sender is dropped with the listener task, after the final update.
    while states.changed().await.is_ok() {}
    assert_eq!(*states.borrow(), ListenerState::Stopped);
}
