// tests/integration/metrics_test.rs

//! Tests for the Prometheus counters and the `/metrics` exporter.

use super::test_helpers::{IO_TIMEOUT, TestContext};
use memorydb::core::metrics::{self, gather_metrics};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Reserves a free loopback port by binding and immediately releasing it.
fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    listener.local_addr().expect("No local addr").port()
}

/// Issues a plain HTTP/1.0 GET, retrying while the exporter is still binding.
async fn http_get(port: u16, path: &str) -> String {
    let mut attempts = 0;
    let mut stream = loop {
        match TcpStream::connect(("127.0.0.1", port)).await {
            Ok(stream) => break stream,
            Err(e) => {
                attempts += 1;
                assert!(attempts < 50, "metrics server never came up: {e}");
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        }
    };
    let request = format!("GET {path} HTTP/1.0\r\nHost: 127.0.0.1\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = String::new();
    tokio::time::timeout(IO_TIMEOUT, stream.read_to_string(&mut response))
        .await
        .expect("Timed out reading metrics response")
        .expect("Failed to read metrics response");
    response
}

#[tokio::test]
async fn test_commands_are_counted() {
    let ctx = TestContext::new().await;
    let mut client = ctx.connect().await;

    // Counters are process-wide and other tests run concurrently, so only
    // check that they moved forward.
    let processed_before = metrics::COMMANDS_PROCESSED_TOTAL.get();
    let unknown_before = metrics::UNKNOWN_COMMANDS_TOTAL.get();

    assert_eq!(client.command("set a 1").await, "OK");
    assert_eq!(client.command("nonsense").await, "UNKNOWN: nonsense");

    assert!(metrics::COMMANDS_PROCESSED_TOTAL.get() >= processed_before + 2.0);
    assert!(metrics::UNKNOWN_COMMANDS_TOTAL.get() >= unknown_before + 1.0);

    let text = gather_metrics();
    assert!(text.contains("memorydb_commands_processed_total"));
    assert!(text.contains("memorydb_connections_received_total"));

    let _ = ctx.stop().await;
}

#[tokio::test]
async fn test_metrics_endpoint_serves_text_exposition() {
    let metrics_port = free_port();
    let ctx = TestContext::with_config(|config| {
        config.metrics.enabled = true;
        config.metrics.port = metrics_port;
    })
    .await;
    let mut client = ctx.connect().await;
    assert_eq!(client.command("set k v").await, "OK");

    let response = http_get(metrics_port, "/metrics").await;
    assert!(response.starts_with("HTTP/1.0 200") || response.starts_with("HTTP/1.1 200"));
    assert!(response.contains("memorydb_stored_keys"));
    assert!(response.contains("memorydb_connected_clients"));

    drop(client);
    let _ = ctx.stop().await;

    // The exporter stops with the server.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(TcpStream::connect(("127.0.0.1", metrics_port)).await.is_err());
}
