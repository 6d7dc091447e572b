//! Unit tests for graphfmt-server

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use graphfmt_core::ConversionStats;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot;

use crate::handlers::get_stats;
use crate::*;

async fn get(addr: SocketAddr, path: &str) -> (String, serde_json::Value) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    let (head, body) = response.split_once("\r\n\r\n").unwrap();
    let status = head.lines().next().unwrap().to_string();
    let json = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_str(body).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn test_stats_handler_reflects_counters() {
    let stats = Arc::new(ConversionStats::new(4));
    stats.record_converted(120);
    stats.record_failed();

    let snapshot = get_stats(State(Arc::new(ServerState::new(Arc::clone(&stats))))).await.0;
    assert_eq!(snapshot.total, 4);
    assert_eq!(snapshot.converted, 1);
    assert_eq!(snapshot.failed, 1);
    assert_eq!(snapshot.pending, 2);
    assert_eq!(snapshot.bytes_written, 120);
}

#[tokio::test]
async fn test_endpoints_over_http() {
    let stats = Arc::new(ConversionStats::new(2));
    let server = DiagnosticsServer::bind("127.0.0.1:0".parse().unwrap(), Arc::clone(&stats))
        .await
        .unwrap();
    let addr = server.local_addr().unwrap();

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(server.serve(async move {
        stop_rx.await.ok();
    }));

    let (status, health) = get(addr, "/api/health").await;
    assert!(status.contains("200"), "{status}");
    assert_eq!(health["status"], "ok");
    assert_eq!(health["version"], env!("CARGO_PKG_VERSION"));

    stats.record_converted(64);
    let (status, body) = get(addr, "/api/stats").await;
    assert!(status.contains("200"), "{status}");
    assert_eq!(body["total"], 2);
    assert_eq!(body["converted"], 1);
    assert_eq!(body["pending"], 1);
    assert_eq!(body["bytes_written"], 64);
    assert!(body["started_at"].as_str().is_some());

    let (status, _) = get(addr, "/api/missing").await;
    assert!(status.contains("404"), "{status}");

    stop_tx.send(()).unwrap();
    handle.await.unwrap().unwrap();
}
