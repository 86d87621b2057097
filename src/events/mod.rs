//! Typed push events
//!
//! The backend pushes named events with JSON payloads. Every payload is
//! validated and defaulted into a [`ServerEvent`] by [`parse_event`] before
//! it reaches the reducer, so a malformed frame is rejected at the boundary
//! instead of corrupting session state.
//!
//! # Example
//!
//! ```
//! use ai_cleaner_client::events::{ServerEvent, parse_event};
//! use serde_json::json;
//!
//! let event = parse_event("scan_started", json!({"path": "/tmp/x"})).unwrap();
//! assert_eq!(event, ServerEvent::ScanStarted { path: "/tmp/x".into() });
//! ```

mod parser;

use std::collections::BTreeMap;

use crate::types::files::{ClassifiedEntry, Decision, FileEntry, ProtectedEntry};
use crate::types::state::Severity;

pub use parser::parse_event;

/// Final payload of a scan
#[derive(Debug, Clone, PartialEq)]
pub struct ScanFinished {
    /// Candidates offered to the model
    pub files: Vec<FileEntry>,
    /// Files protected by keyword
    pub protected: Vec<ProtectedEntry>,
    /// Files visited
    pub total_files: u64,
    /// Candidate count as reported
    pub count: u64,
    /// Per-category counts
    pub stats: BTreeMap<String, u64>,
    /// Categories the scan covered
    pub selected_categories: Option<Vec<String>>,
    /// Whether the backend stopped early
    pub cancelled: bool,
}

/// One classified file during analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzeTick {
    /// Files classified so far
    pub current: u64,
    /// Files to classify
    pub total: u64,
    /// File just classified
    pub file: String,
    /// Verdict, when the backend reports it
    pub decision: Option<Decision>,
    /// Model's justification
    pub reason: Option<String>,
}

/// A push event from the backend
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// The push channel is (re)connected
    Connected,
    /// A scan began
    ScanStarted {
        /// Folder being scanned
        path: String,
    },
    /// Scan progress
    ScanProgress {
        /// Files visited so far
        scanned: u64,
        /// Status line
        message: String,
    },
    /// A scan produced its candidates
    ScanFinished(ScanFinished),
    /// A scan was stopped
    ScanCancelled,
    /// A scan failed
    ScanError {
        /// Backend message
        error: String,
        /// Folder that failed
        path: Option<String>,
    },
    /// Analysis began
    AnalyzeStarted {
        /// Files to classify
        total: u64,
    },
    /// One file classified
    AnalyzeProgress(AnalyzeTick),
    /// Analysis produced its verdicts
    AnalyzeComplete {
        /// All verdicts
        results: Vec<ClassifiedEntry>,
    },
    /// Analysis failed
    AnalyzeError {
        /// Backend message
        error: String,
    },
    /// A model call is outstanding
    AiThinking {
        /// File being classified
        file: Option<String>,
        /// Prompt sent to the model
        prompt: Option<String>,
    },
    /// A model call returned
    AiResult,
    /// A file was removed from disk
    FileDeleted {
        /// Removed file
        path: String,
    },
    /// A deletion request finished
    DeletionComplete {
        /// Files removed
        deleted: u64,
        /// Space freed, human readable
        size_freed: Option<String>,
    },
    /// Raw log line
    Log {
        /// Text
        message: String,
        /// Severity
        severity: Severity,
    },
}

impl ServerEvent {
    /// Canonical event name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Connected => "connected",
            Self::ScanStarted { .. } => "scan_started",
            Self::ScanProgress { .. } => "scan_progress",
            Self::ScanFinished(_) => "scan_finished",
            Self::ScanCancelled => "scan_cancelled",
            Self::ScanError { .. } => "scan_error",
            Self::AnalyzeStarted { .. } => "analyze_started",
            Self::AnalyzeProgress(_) => "analyze_progress",
            Self::AnalyzeComplete { .. } => "analyze_complete",
            Self::AnalyzeError { .. } => "analyze_error",
            Self::AiThinking { .. } => "ai_thinking",
            Self::AiResult => "ai_result",
            Self::FileDeleted { .. } => "file_deleted",
            Self::DeletionComplete { .. } => "deletion_complete",
            Self::Log { .. } => "log",
        }
    }

    /// Whether this event ends a scan or an analysis
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::ScanFinished(_)
                | Self::ScanCancelled
                | Self::ScanError { .. }
                | Self::AnalyzeComplete { .. }
                | Self::AnalyzeError { .. }
        )
    }
}
