//! Push channel tests against a local event-stream server

use ai_cleaner_client::transport::sse::{DEFAULT_EVENT, SseCodec, SseFrame};
use ai_cleaner_client::{BaseUrl, ClientOptions, EventChannel, ServerEvent, Severity, Subscription};
use futures::StreamExt;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_util::codec::FramedRead;

const WAIT: Duration = Duration::from_secs(5);

/// Serve one event-stream response with `body`, then close
async fn serve_once(body: &'static str) -> BaseUrl {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                return;
            }
            request.extend_from_slice(&buf[..n]);
        }
        let head = "HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nConnection: close\r\n\r\n";
        socket.write_all(head.as_bytes()).await.unwrap();
        socket.write_all(body.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
        // Keep the listener alive so reconnects queue instead of failing
        tokio::time::sleep(Duration::from_secs(30)).await;
    });
    BaseUrl::resolve(Some(&format!("http://{addr}")))
}

/// Serve an event-stream head and keep the connection open
async fn serve_open() -> BaseUrl {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 1024];
        let _ = socket.read(&mut buf).await.unwrap();
        let head = "HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\n\r\n";
        socket.write_all(head.as_bytes()).await.unwrap();
        socket.write_all(b": hello\n\n").await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
    });
    BaseUrl::resolve(Some(&format!("http://{addr}")))
}

fn options(base_url: BaseUrl) -> ClientOptions {
    ClientOptions::builder()
        .base_url(base_url)
        .reconnect_backoff(Duration::from_millis(20), Duration::from_millis(100))
        .build()
        .unwrap()
}

async fn next(subscription: &mut Subscription) -> ServerEvent {
    tokio::time::timeout(WAIT, subscription.recv())
        .await
        .expect("timed out waiting for an event")
        .expect("channel closed")
}

#[tokio::test]
async fn test_stream_frames_are_validated_and_fanned_out() {
    let base_url = serve_once(concat!(
        ": keep-alive\n\n",
        "event: scan_started\ndata: {\"path\":\"/tmp/x\"}\n\n",
        "event: no_such_event\ndata: {}\n\n",
        "event: log\ndata: not json\n\n",
        "event: analyze_complete\ndata: {}\n\n",
        "event: log\r\ndata: {\"msg\":\"multi\",\r\ndata: \"type\":\"warning\"}\r\n\r\n",
    ))
    .await;

    let channel = EventChannel::connect(&options(base_url)).unwrap();
    let mut first = channel.subscribe();
    let mut second = channel.subscribe();

    for subscription in [&mut first, &mut second] {
        assert_eq!(
            next(subscription).await,
            ServerEvent::ScanStarted {
                path: "/tmp/x".into()
            }
        );
        assert_eq!(
            next(subscription).await,
            ServerEvent::Log {
                message: "multi".into(),
                severity: Severity::Warning
            }
        );
    }
}

#[tokio::test]
async fn test_unreachable_backend_keeps_channel_usable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut channel =
        EventChannel::connect(&options(BaseUrl::resolve(Some(&format!("http://{addr}"))))).unwrap();
    let mut subscription = channel.subscribe();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!channel.is_connected());

    assert_eq!(channel.inject(ServerEvent::AiResult), 1);
    assert_eq!(next(&mut subscription).await, ServerEvent::AiResult);

    channel.close();
    assert_eq!(channel.subscriber_count(), 0);
    assert_eq!(subscription.recv().await, None);
}

#[tokio::test]
async fn test_wait_connected_reports_open_stream() {
    let channel = EventChannel::connect(&options(serve_open().await)).unwrap();
    assert!(channel.wait_connected(WAIT).await);
    assert!(channel.is_connected());
}

#[tokio::test]
async fn test_wait_connected_gives_up_on_unreachable_backend() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let channel =
        EventChannel::connect(&options(BaseUrl::resolve(Some(&format!("http://{addr}"))))).unwrap();
    assert!(!channel.wait_connected(Duration::from_millis(300)).await);
}

#[tokio::test]
async fn test_subscription_as_stream() {
    let channel = EventChannel::detached();
    let stream = channel.subscribe().into_stream();
    channel.inject(ServerEvent::Connected);
    channel.inject(ServerEvent::AiResult);
    drop(channel);

    let events: Vec<_> = stream.collect().await;
    assert_eq!(events, vec![ServerEvent::Connected, ServerEvent::AiResult]);
}

#[tokio::test]
async fn test_codec_over_reader() {
    let input: &[u8] = b"data: {\"a\":1}\n\nevent: ai_result\ndata:\n\nevent: log\ndata: {\"msg\":\"tail\"}";
    let frames: Vec<SseFrame> = FramedRead::new(input, SseCodec::new(1024))
        .map(|frame| frame.unwrap())
        .collect()
        .await;

    assert_eq!(
        frames,
        vec![
            SseFrame {
                event: DEFAULT_EVENT.into(),
                data: "{\"a\":1}".into()
            },
            SseFrame {
                event: "ai_result".into(),
                data: String::new()
            },
            SseFrame {
                event: "log".into(),
                data: "{\"msg\":\"tail\"}".into()
            },
        ]
    );
}
