//! Command dispatcher
//!
//! [`CleanerClient`] turns user intent into backend requests and keeps the
//! session consistent while the backend reports progress over the event
//! channel. It is cheap to clone; every clone drives the same session.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      CleanerClient                       │
//! │                                                          │
//! │  commands ──→ ApiGateway ──→ backend                     │
//! │     │                           │                        │
//! │     │ pending / local edits     │ push events            │
//! │     ▼                           ▼                        │
//! │  ┌─────────────────┐    ┌──────────────────┐             │
//! │  │ Session (Mutex) │ ←──│ Event pump task  │←─ EventChannel
//! │  │ state + store   │    │ (reducer)        │             │
//! │  └─────────────────┘    └──────────────────┘             │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! - The authoritative `status` is moved by backend events. A command that
//!   starts work only records a pending operation until the backend confirms.
//! - Scan and analyze requests each own a cancellation token;
//!   [`CleanerClient::stop_process`] fires them and resets the session.
//! - The session lock is never held across an `.await`.
//!
//! # Example
//!
//! ```no_run
//! use ai_cleaner_client::{CleanerClient, ClientOptions, EventChannel};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let options = ClientOptions::from_env()?;
//! let client = CleanerClient::from_options(&options)?;
//! let channel = EventChannel::connect(&options)?;
//! client.attach(&channel);
//!
//! client.set_target_path("/home/me/Downloads");
//! client.start_scan().await?;
//! # Ok(())
//! # }
//! ```

mod confirm;
mod deletion;
mod edits;
mod operations;
mod pump;

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::api::{ApiGateway, HttpGateway};
use crate::error::{CleanerError, Result};
use crate::events::ServerEvent;
use crate::session::Session;
use crate::store::{FileStore, PersistedStore};
use crate::types::identifiers::OperationId;
use crate::types::options::ClientOptions;
use crate::types::state::{OperationKind, SessionState, Severity};

pub use confirm::{AlwaysConfirm, Confirm, NeverConfirm};
pub use deletion::DeleteReport;

/// Abort handle of a scan or analyze request
#[derive(Debug)]
struct InFlight {
    id: OperationId,
    token: CancellationToken,
}

struct Inner<G> {
    gateway: G,
    session: Mutex<Session>,
    operations: Mutex<HashMap<OperationKind, InFlight>>,
    pump: Mutex<Option<pump::EventPump>>,
    revision: watch::Sender<u64>,
}

impl<G> Inner<G> {
    fn update<R>(&self, edit: impl FnOnce(&mut SessionState) -> R) -> R {
        let out = self.session.lock().update(edit);
        self.revision.send_modify(|rev| *rev = rev.wrapping_add(1));
        out
    }

    fn apply(&self, event: ServerEvent) {
        self.session.lock().apply(event);
        self.revision.send_modify(|rev| *rev = rev.wrapping_add(1));
    }
}

impl<G> Drop for Inner<G> {
    fn drop(&mut self) {
        if let Some(pump) = self.pump.get_mut().take() {
            pump.stop();
        }
        for (_, op) in self.operations.get_mut().drain() {
            op.token.cancel();
        }
    }
}

/// Client for the cleanup backend
pub struct CleanerClient<G = HttpGateway> {
    inner: Arc<Inner<G>>,
}

impl<G> Clone for CleanerClient<G> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<G> std::fmt::Debug for CleanerClient<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let session = self.inner.session.lock();
        f.debug_struct("CleanerClient")
            .field("status", &session.state().status)
            .field("pending", &session.state().pending)
            .finish_non_exhaustive()
    }
}

impl CleanerClient<HttpGateway> {
    /// HTTP client with the session restored from `options.state_dir`
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built
    pub fn from_options(options: &ClientOptions) -> Result<Self> {
        let gateway = HttpGateway::from_options(options)?;
        let store = match &options.state_dir {
            Some(dir) => PersistedStore::new(FileStore::new(dir)),
            None => PersistedStore::in_memory(),
        };
        Ok(Self::new(
            gateway,
            Session::load(store, options.max_log_entries),
        ))
    }
}

impl<G: ApiGateway> CleanerClient<G> {
    /// Client over `gateway` driving `session`
    pub fn new(gateway: G, session: Session) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                gateway,
                session: Mutex::new(session),
                operations: Mutex::new(HashMap::new()),
                pump: Mutex::new(None),
                revision,
            }),
        }
    }

    /// The gateway
    #[must_use]
    pub fn gateway(&self) -> &G {
        &self.inner.gateway
    }

    /// Snapshot of the current state
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner.session.lock().state().clone()
    }

    /// Read the current state without cloning it
    pub fn with_state<R>(&self, read: impl FnOnce(&SessionState) -> R) -> R {
        read(self.inner.session.lock().state())
    }

    /// Receiver bumped after every state change
    #[must_use]
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    /// Wait until `ready` holds for the state, up to `timeout`
    ///
    /// Returns whether the condition was met.
    pub async fn wait_until(
        &self,
        ready: impl Fn(&SessionState) -> bool,
        timeout: Duration,
    ) -> bool {
        let mut changes = self.changes();
        let wait = async {
            loop {
                if self.with_state(&ready) {
                    return true;
                }
                if changes.changed().await.is_err() {
                    return false;
                }
            }
        };
        tokio::time::timeout(timeout, wait).await.unwrap_or(false)
    }

    /// Whether a scan or analyze request is in flight
    #[must_use]
    pub fn has_in_flight(&self, kind: OperationKind) -> bool {
        self.inner.operations.lock().contains_key(&kind)
    }

    /// Fold a backend event into the session
    pub fn apply_event(&self, event: ServerEvent) {
        self.inner.apply(event);
    }

    fn update<R>(&self, edit: impl FnOnce(&mut SessionState) -> R) -> R {
        self.inner.update(edit)
    }

    fn log(&self, severity: Severity, message: impl Into<String>) {
        let message = message.into();
        self.update(|state| state.log(severity, message));
    }

    /// Log a failed precondition and build the matching error
    fn reject(&self, severity: Severity, message: &str) -> CleanerError {
        log::debug!("Rejected command: {message}");
        self.log(severity, message);
        CleanerError::validation(message)
    }
}
