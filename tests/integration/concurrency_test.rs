// tests/integration/concurrency_test.rs

//! Tests with many clients working against the same server at once.

use super::test_helpers::{TestClient, TestContext};
use std::collections::HashSet;

#[tokio::test]
async fn test_concurrent_sets_on_distinct_keys_all_persist() {
    let ctx = TestContext::new().await;
    let addr = ctx.addr();
    let path = ctx.snapshot_path();

    let mut tasks = Vec::new();
    for client_id in 0..10 {
        tasks.push(tokio::spawn(async move {
            let mut client = TestClient::connect(addr).await;
            for i in 0..20 {
                let reply = client
                    .command(&format!("set c{client_id}_k{i} v{i}"))
                    .await;
                assert_eq!(reply, "OK");
            }
            client.send_line("exit").await;
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let (report, _dir) = ctx.stop().await;
    assert!(report.saved);

    let contents = tokio::fs::read_to_string(&path).await.unwrap();
    let snapshot: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(&contents).unwrap();
    assert_eq!(snapshot.len(), 200);
    assert_eq!(snapshot["c3_k7"], "v7");
}

#[tokio::test]
async fn test_concurrent_sets_on_same_key_leave_one_value() {
    let ctx = TestContext::new().await;
    let addr = ctx.addr();

    let mut tasks = Vec::new();
    for client_id in 0..8 {
        tasks.push(tokio::spawn(async move {
            let mut client = TestClient::connect(addr).await;
            for _ in 0..25 {
                assert_eq!(
                    client.command(&format!("set shared writer{client_id}")).await,
                    "OK"
                );
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let mut client = ctx.connect().await;
    let value = client.command("get shared").await;
    let writers: HashSet<String> = (0..8).map(|i| format!("writer{i}")).collect();
    assert!(writers.contains(&value), "unexpected value {value}");

    let _ = ctx.stop().await;
}

#[tokio::test]
async fn test_writes_are_visible_to_other_sessions() {
    let ctx = TestContext::new().await;
    let mut writer = ctx.connect().await;
    let mut reader = ctx.connect().await;

    assert_eq!(writer.command("set shared hello").await, "OK");
    assert_eq!(reader.command("get shared").await, "hello");
    assert_eq!(reader.command("delete shared").await, "OK");
    assert_eq!(writer.command("get shared").await, "key shared not found");

    let _ = ctx.stop().await;
}

#[tokio::test]
async fn test_max_clients_defers_extra_connections() {
    let ctx = TestContext::with_config(|config| config.max_clients = 1).await;
    let addr = ctx.addr();

    let mut first = ctx.connect().await;
    assert_eq!(first.command("set k v").await, "OK");

    // The second client is not greeted until the first one leaves.
    let second = tokio::spawn(async move { TestClient::connect(addr).await });
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    assert!(!second.is_finished());

    first.send_line("exit").await;
    first.read_until_closed().await;

    let mut second = second.await.unwrap();
    assert_eq!(second.command("get k").await, "v");

    let _ = ctx.stop().await;
}
