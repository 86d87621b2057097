//! Event channel: the process-wide push connection to the backend
//!
//! [`EventChannel::connect`] spawns one reader task that streams
//! `GET /api/events`, decodes server-sent-event frames, validates each
//! payload into a [`ServerEvent`] and fans it out to every live
//! [`Subscription`]. Malformed frames are logged and dropped. When the stream
//! ends or fails, the reader reconnects with exponential backoff.
//!
//! Subscriptions remove themselves on drop and
//! [`EventChannel::unsubscribe`] is idempotent, so a component can detach
//! any number of times without leaving duplicate handlers behind.

pub mod sse;

use futures::{Stream, StreamExt};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::codec::FramedRead;
use tokio_util::io::StreamReader;

use crate::error::{CleanerError, Result};
use crate::events::{ServerEvent, parse_event};
use crate::types::identifiers::SubscriptionId;
use crate::types::options::ClientOptions;

use sse::{SseCodec, SseFrame};

/// Path of the push stream
pub const EVENTS_PATH: &str = "/api/events";

type Registry = Mutex<HashMap<SubscriptionId, mpsc::UnboundedSender<ServerEvent>>>;

/// Push connection shared by every subscriber
#[derive(Debug)]
pub struct EventChannel {
    subscribers: Arc<Registry>,
    connected: Arc<watch::Sender<bool>>,
    reader: Option<JoinHandle<()>>,
}

impl EventChannel {
    /// Open the push stream at `options.base_url`
    ///
    /// Returns once the reader task is spawned; the connection itself is
    /// established (and re-established) in the background.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built
    pub fn connect(options: &ClientOptions) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(options.request_timeout)
            .build()?;
        let reader = Reader {
            http,
            url: options.base_url.url(EVENTS_PATH),
            initial_delay: options.reconnect_initial,
            max_delay: options.reconnect_max,
            max_frame_size: options.max_frame_size,
        };

        let mut channel = Self::detached();
        let subscribers = Arc::clone(&channel.subscribers);
        let connected = Arc::clone(&channel.connected);
        channel.reader = Some(tokio::spawn(async move {
            reader.run(subscribers, connected).await;
        }));
        Ok(channel)
    }

    /// Channel without a backend connection; events arrive via [`inject`](Self::inject)
    #[must_use]
    pub fn detached() -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(HashMap::new())),
            connected: Arc::new(watch::Sender::new(false)),
            reader: None,
        }
    }

    /// Register a new subscriber
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = SubscriptionId::new();
        self.subscribers.lock().insert(id, tx);
        log::debug!("Subscribed {id}");
        Subscription {
            id,
            receiver: rx,
            registry: Arc::downgrade(&self.subscribers),
        }
    }

    /// Remove a subscriber; returns whether it was still registered
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.lock().remove(&id).is_some()
    }

    /// Number of live subscribers
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Whether the push stream is currently open
    #[must_use]
    pub fn is_connected(&self) -> bool {
        *self.connected.borrow()
    }

    /// Wait until the push stream is open, up to `timeout`
    ///
    /// Returns whether it opened. A detached channel never does.
    pub async fn wait_connected(&self, timeout: Duration) -> bool {
        let mut connected = self.connected.subscribe();
        let open = async { connected.wait_for(|up| *up).await.is_ok() };
        tokio::time::timeout(timeout, open).await.unwrap_or(false)
    }

    /// Deliver an event to every subscriber; returns how many received it
    pub fn inject(&self, event: ServerEvent) -> usize {
        broadcast(&self.subscribers, &event)
    }

    /// Validate a raw named payload and deliver it
    ///
    /// # Errors
    /// Returns error if the payload does not parse
    pub fn inject_raw(&self, name: &str, data: Value) -> Result<usize> {
        Ok(self.inject(parse_event(name, data)?))
    }

    /// Stop the reader task; subscribers see their streams end
    pub fn close(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        self.connected.send_replace(false);
        self.subscribers.lock().clear();
    }
}

impl Drop for EventChannel {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

fn broadcast(registry: &Registry, event: &ServerEvent) -> usize {
    let mut subscribers = registry.lock();
    subscribers.retain(|id, tx| {
        let alive = tx.send(event.clone()).is_ok();
        if !alive {
            log::debug!("Dropping closed subscriber {id}");
        }
        alive
    });
    subscribers.len()
}

/// Receiving end of one subscription
///
/// Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    receiver: mpsc::UnboundedReceiver<ServerEvent>,
    registry: Weak<Registry>,
}

impl Subscription {
    /// Subscription identifier
    #[must_use]
    pub const fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Next event; `None` once the channel is closed
    pub async fn recv(&mut self) -> Option<ServerEvent> {
        self.receiver.recv().await
    }

    /// Next event if one is already queued
    pub fn try_recv(&mut self) -> Option<ServerEvent> {
        self.receiver.try_recv().ok()
    }

    /// Consume the subscription as a stream of events
    pub fn into_stream(mut self) -> impl Stream<Item = ServerEvent> + Send {
        async_stream::stream! {
            while let Some(event) = self.recv().await {
                yield event;
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.lock().remove(&self.id);
        }
    }
}

// ============================================================================
// Reader task
// ============================================================================

struct Reader {
    http: reqwest::Client,
    url: String,
    initial_delay: Duration,
    max_delay: Duration,
    max_frame_size: usize,
}

impl Reader {
    async fn run(self, subscribers: Arc<Registry>, connected: Arc<watch::Sender<bool>>) {
        let mut delay = self.initial_delay;
        loop {
            match self.stream(&subscribers, &connected, &mut delay).await {
                Ok(()) => log::info!("Event stream closed by server"),
                Err(e) => log::warn!("Event stream error: {e}"),
            }
            connected.send_replace(false);

            log::debug!("Reconnecting to {} in {delay:?}", self.url);
            tokio::time::sleep(delay).await;
            delay = (delay * 2).min(self.max_delay);
        }
    }

    async fn stream(
        &self,
        subscribers: &Registry,
        connected: &watch::Sender<bool>,
        delay: &mut Duration,
    ) -> Result<()> {
        let response = self
            .http
            .get(&self.url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| CleanerError::connection(format!("{}: {e}", self.url)))?;
        let status = response.status();
        if !status.is_success() {
            return Err(CleanerError::connection(format!(
                "HTTP {} on {}",
                status.as_u16(),
                self.url
            )));
        }

        connected.send_replace(true);
        *delay = self.initial_delay;
        log::info!("Event stream connected: {}", self.url);

        let bytes = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(std::io::Error::other));
        let mut frames = Box::pin(FramedRead::new(
            StreamReader::new(bytes),
            SseCodec::new(self.max_frame_size),
        ));

        while let Some(frame) = frames.next().await {
            if let Some(event) = decode_frame(frame?) {
                broadcast(subscribers, &event);
            }
        }
        Ok(())
    }
}

/// Turn a raw frame into an event, logging and dropping anything malformed
fn decode_frame(frame: SseFrame) -> Option<ServerEvent> {
    let data = if frame.data.trim().is_empty() {
        Value::Null
    } else {
        match serde_json::from_str(&frame.data) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Dropping '{}' frame with invalid JSON: {e}", frame.event);
                return None;
            }
        }
    };
    match parse_event(&frame.event, data) {
        Ok(event) => Some(event),
        Err(CleanerError::EventParse { event, message }) => {
            log::warn!("Dropping '{event}' frame: {message}");
            None
        }
        Err(e) => {
            log::warn!("Dropping '{}' frame: {e}", frame.event);
            None
        }
    }
}
