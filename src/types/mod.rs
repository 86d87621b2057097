//! Type definitions for the cleanup client
//!
//! This module contains all the type definitions used throughout the crate,
//! organized into logical submodules:
//!
//! - [`identifiers`] - Type-safe handles (`OperationId`, `SubscriptionId`)
//! - [`files`] - Scan candidates, protected files and classified entries
//! - [`config`] - User-editable scan and analysis configuration
//! - [`state`] - The reconciled session state and its derived views
//! - [`options`] - Runtime options of the client

pub mod config;
pub mod files;
pub mod identifiers;
pub mod options;
pub mod state;

// Re-export commonly used types
pub use config::{DEFAULT_MAX_FILES, DEFAULT_MODEL, ScanConfig};
pub use files::{ClassifiedEntry, Decision, FileCategory, FileEntry, ProtectedEntry, base_name};
pub use identifiers::{OperationId, SubscriptionId};
pub use options::{ClientOptions, ClientOptionsBuilder};
pub use state::{
    AiThinking, AnalyzeProgress, LogEntry, OperationKind, Overview, PendingOperation, Results,
    ScanProgress, ScanStats, SessionState, Severity, Status, format_size,
};
