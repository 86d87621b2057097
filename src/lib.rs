//! # AI Cleaner client
//!
//! Client-side orchestration for the AI file-cleanup backend. The backend
//! scans a folder for deletion candidates, asks a language model to classify
//! each one as DELETE, KEEP or REVIEW, and removes what the user confirms.
//! This crate owns everything on the client side of that contract:
//!
//! - a reconciled, persisted [`SessionState`] (status, configuration,
//!   candidates, classified results, delete selection, activity log),
//! - an event reducer folding asynchronous backend events into that state,
//! - a command dispatcher ([`CleanerClient`]) issuing cancellable requests,
//! - the push [`EventChannel`] and the HTTP [`ApiGateway`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use ai_cleaner_client::{AlwaysConfirm, CleanerClient, ClientOptions, EventChannel, Status};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let options = ClientOptions::builder().state_dir("/tmp/ai-cleaner").build()?;
//! let client = CleanerClient::from_options(&options)?;
//! let channel = EventChannel::connect(&options)?;
//! client.attach(&channel);
//!
//! client.set_target_path("/home/me/Downloads");
//! client.start_scan().await?;
//! client
//!     .wait_until(|s| s.status == Status::Idle && s.stats.is_some(), Duration::from_secs(600))
//!     .await;
//!
//! client.start_analyze().await?;
//! client
//!     .wait_until(|s| s.status == Status::Complete, Duration::from_secs(3600))
//!     .await;
//!
//! client.delete_selected(&AlwaysConfirm).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Offline reduction
//!
//! The reducer is a plain function and can be driven without a backend:
//!
//! ```
//! use ai_cleaner_client::events::parse_event;
//! use ai_cleaner_client::session::apply_event;
//! use ai_cleaner_client::{SessionState, Status};
//! use serde_json::json;
//!
//! let mut state = SessionState::default();
//! apply_event(&mut state, parse_event("scan_started", json!({"path": "/tmp/x"})).unwrap());
//! assert_eq!(state.status, Status::Scanning);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod api;
pub mod client;
pub mod error;
pub mod events;
pub mod session;
pub mod store;
pub mod transport;
pub mod types;

// Re-export commonly used types for external API
pub use api::{ApiGateway, BaseUrl, HttpGateway};
pub use client::{AlwaysConfirm, CleanerClient, Confirm, DeleteReport, NeverConfirm};
pub use error::{CleanerError, Result};
pub use events::{ServerEvent, parse_event};
pub use session::Session;
pub use store::{FileStore, KeyValueStore, MemoryStore, PersistedStore};
pub use transport::{EventChannel, Subscription};

// Re-export type submodules for flat public API
pub use types::config::ScanConfig;
pub use types::files::{ClassifiedEntry, Decision, FileCategory, FileEntry, ProtectedEntry};
pub use types::identifiers::{OperationId, SubscriptionId};
pub use types::options::{ClientOptions, ClientOptionsBuilder};
pub use types::state::{
    LogEntry, OperationKind, Overview, PendingOperation, Results, SessionState, Severity, Status,
};

/// Version of the client
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
