//! HTTP gateway tests against a one-shot local server

use ai_cleaner_client::api::{DeleteRequest, ScanRequest};
use ai_cleaner_client::{ApiGateway, BaseUrl, CleanerError, HttpGateway};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Answer one request with `status` and `body`; yields the raw request
async fn respond_once(status: u16, body: &'static str) -> (HttpGateway, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut raw = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&raw);
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())?
                    })
                    .unwrap_or(0);
                if raw.len() >= end + 4 + length {
                    break;
                }
            }
        }

        let reply = format!(
            "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(reply.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
        let _ = tx.send(String::from_utf8_lossy(&raw).into_owned());
    });

    let base_url = BaseUrl::resolve(Some(&format!("http://{addr}/")));
    let gateway = HttpGateway::new(base_url, Duration::from_secs(5)).unwrap();
    (gateway, rx)
}

fn body_of(request: &str) -> serde_json::Value {
    let (_, body) = request.split_once("\r\n\r\n").unwrap();
    serde_json::from_str(body).unwrap()
}

#[tokio::test]
async fn test_scan_posts_json_body() {
    let (gateway, request) = respond_once(200, r#"{"ok": true}"#).await;

    let response = gateway
        .scan(ScanRequest {
            path: "/tmp/x".into(),
            categories: vec!["Images".into()],
            min_age_days: 30,
            min_size_mb: 0.5,
        })
        .await
        .unwrap();
    assert!(response.ok);

    let request = request.await.unwrap();
    assert!(request.starts_with("POST /api/scan HTTP/1.1"));
    assert_eq!(
        body_of(&request),
        serde_json::json!({
            "path": "/tmp/x",
            "categories": ["Images"],
            "min_age_days": 30,
            "min_size_mb": 0.5
        })
    );
}

#[tokio::test]
async fn test_ai_status_passes_model_in_query() {
    let (gateway, request) =
        respond_once(200, r#"{"ok": true, "ollama_url": "http://127.0.0.1:11434"}"#).await;

    let status = gateway.ai_status("llama3:8b").await.unwrap();

    assert_eq!(status.ollama_url.as_deref(), Some("http://127.0.0.1:11434"));
    let request = request.await.unwrap();
    assert!(request.starts_with("GET /api/ai_status?model=llama3%3A8b HTTP/1.1"));
}

#[tokio::test]
async fn test_not_ok_body_is_a_backend_error() {
    let (gateway, _request) = respond_once(200, r#"{"ok": false, "error": "Path not found"}"#).await;

    let err = gateway.stop().await.unwrap_err();
    assert!(matches!(err, CleanerError::Backend(ref m) if m == "Path not found"));
}

#[tokio::test]
async fn test_rejected_status_prefers_json_message() {
    let (gateway, _request) =
        respond_once(409, r#"{"ok": false, "error": "Scan already running"}"#).await;

    let err = gateway
        .delete(DeleteRequest {
            files: vec!["/tmp/x/a.jpg".into()],
            simulate: false,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CleanerError::Backend(ref m) if m == "Scan already running"));
}

#[tokio::test]
async fn test_bare_error_status_is_a_transport_error() {
    let (gateway, _request) = respond_once(502, "bad gateway").await;

    let err = gateway.stop().await.unwrap_err();
    assert!(matches!(err, CleanerError::Transport(ref m) if m.starts_with("HTTP 502")));
}

#[tokio::test]
async fn test_delete_accepts_error_list() {
    let (gateway, _request) = respond_once(
        200,
        r#"{"ok": true, "deleted": 1, "size_freed_h": "1.0KB", "errors": [{"file": "/tmp/x/b.jpg"}]}"#,
    )
    .await;

    let response = gateway
        .delete(DeleteRequest {
            files: vec!["/tmp/x/a.jpg".into(), "/tmp/x/b.jpg".into()],
            simulate: false,
        })
        .await
        .unwrap();
    assert_eq!(response.deleted, 1);
    assert_eq!(response.errors.count(), 1);
}
