//! Integration tests for the network detector registry

use detectors::{CheckKind, Detector, NetworkDetector};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Spawn a tiny HTTP server answering every request with `status_line`
async fn spawn_http_server(status_line: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                    status_line
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{}/health", addr)
}

#[tokio::test]
async fn test_get_reports_alive_on_success() {
    let url = spawn_http_server("200 OK").await;
    let detector = NetworkDetector::new().unwrap();

    let detection = detector
        .detect(CheckKind::Get, &url, Duration::from_secs(2))
        .await;

    assert!(detection.healthy, "unexpected detection: {:?}", detection);
    assert_eq!(detection.info, "Alive");
}

#[tokio::test]
async fn test_get_reports_alive_on_server_error() {
    // Liveness only: an answering server is alive whatever the status code
    let url = spawn_http_server("503 Service Unavailable").await;
    let detector = NetworkDetector::new().unwrap();

    let detection = detector
        .detect(CheckKind::Get, &url, Duration::from_secs(2))
        .await;

    assert!(detection.healthy);
    assert_eq!(detection.info, "Alive");
}

#[tokio::test]
async fn test_port_dispatch() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let target = listener.local_addr().unwrap().to_string();
    let detector = NetworkDetector::new().unwrap();

    let detection = detector
        .detect(CheckKind::Port, &target, Duration::from_secs(1))
        .await;

    assert!(detection.healthy);
    assert_eq!(detection.info, "Port Open");
}

#[tokio::test]
async fn test_ping_always_returns_info() {
    // Without raw socket privileges this fails with "New Pinger Error";
    // either way the detection must carry an info string.
    let detector = NetworkDetector::new().unwrap();

    let detection = detector
        .detect(CheckKind::Ping, "127.0.0.1", Duration::from_millis(400))
        .await;

    assert!(!detection.info.is_empty());
    if !detection.healthy {
        assert!(
            detection.info == "New Pinger Error" || detection.info == "Time Out, Loss 100%",
            "unexpected info: {}",
            detection.info
        );
    }
}

#[tokio::test]
async fn test_ping_stays_within_timeout() {
    // TEST-NET-1 address, never answers
    let detector = NetworkDetector::new().unwrap();
    let timeout = Duration::from_millis(400);

    let start = std::time::Instant::now();
    let detection = detector.detect(CheckKind::Ping, "192.0.2.1", timeout).await;
    let elapsed = start.elapsed();

    assert!(!detection.healthy);
    assert!(
        elapsed < timeout + Duration::from_millis(100),
        "ping took {:?} with a {:?} timeout",
        elapsed,
        timeout
    );
}
