// tests/integration/persistence_test.rs

//! Integration tests for snapshot persistence across server restarts.

use super::test_helpers::TestContext;
use std::time::Duration;

#[tokio::test]
async fn test_data_survives_restart() {
    let ctx = TestContext::new().await;
    let mut client = ctx.connect().await;
    assert_eq!(client.command("set Greeting Hello").await, "OK");
    assert_eq!(client.command("set doomed soon").await, "OK");
    assert_eq!(client.command("delete doomed").await, "OK");
    drop(client);

    let (report, dir) = ctx.stop().await;
    assert!(report.saved);

    let ctx = TestContext::in_dir(dir, |_| {}).await;
    let mut client = ctx.connect().await;
    assert_eq!(client.command("get greeting").await, "Hello");
    assert_eq!(client.command("get doomed").await, "key doomed not found");
    assert_eq!(client.command("keys *").await, "[greeting]");
    let _ = ctx.stop().await;
}

#[tokio::test]
async fn test_snapshot_is_a_json_object() {
    let ctx = TestContext::new().await;
    let path = ctx.snapshot_path();
    let mut client = ctx.connect().await;
    assert_eq!(client.command("set a 1").await, "OK");
    assert_eq!(client.command("set B two").await, "OK");
    drop(client);
    let (report, _dir) = ctx.stop().await;
    assert!(report.saved);

    let contents = tokio::fs::read_to_string(&path).await.unwrap();
    let snapshot: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(snapshot, serde_json::json!({"a": "1", "b": "two"}));
}

#[tokio::test]
async fn test_malformed_snapshot_starts_empty() {
    let dir = tempfile::TempDir::new().unwrap();
    tokio::fs::write(dir.path().join("db.json"), b"this is not json")
        .await
        .unwrap();

    let ctx = TestContext::in_dir(dir, |_| {}).await;
    let mut client = ctx.connect().await;
    assert_eq!(client.command("keys *").await, "[]");
    let _ = ctx.stop().await;
}

#[tokio::test]
async fn test_snapshot_with_non_string_values_is_served_as_json() {
    let dir = tempfile::TempDir::new().unwrap();
    tokio::fs::write(
        dir.path().join("db.json"),
        br#"{"Count": 7, "tags": ["x", "y"], "name": "plain"}"#,
    )
    .await
    .unwrap();

    let ctx = TestContext::in_dir(dir, |_| {}).await;
    let mut client = ctx.connect().await;
    assert_eq!(client.command("get count").await, "7");
    assert_eq!(client.command("get tags").await, r#"["x","y"]"#);
    assert_eq!(client.command("get name").await, "plain");
    let _ = ctx.stop().await;
}

#[tokio::test]
async fn test_autosave_writes_snapshot_before_shutdown() {
    let ctx = TestContext::with_config(|config| {
        config.snapshot.autosave_interval = Some(Duration::from_millis(100));
    })
    .await;
    let path = ctx.snapshot_path();
    let mut client = ctx.connect().await;
    assert_eq!(client.command("set saved early").await, "OK");

    let mut attempts = 0;
    loop {
        if let Ok(contents) = tokio::fs::read_to_string(&path).await
            && contents.contains("early")
        {
            break;
        }
        attempts += 1;
        assert!(attempts < 100, "autosave never wrote the snapshot");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    drop(client);
    let _ = ctx.stop().await;
}

#[tokio::test]
async fn test_without_autosave_nothing_is_written_until_shutdown() {
    let ctx = TestContext::new().await;
    let path = ctx.snapshot_path();
    let mut client = ctx.connect().await;
    assert_eq!(client.command("set k v").await, "OK");
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!path.exists());

    drop(client);
    let (report, _dir) = ctx.stop().await;
    assert!(report.saved);
    assert!(path.exists());
}
