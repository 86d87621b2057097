//! Session state: the reconciled view of scan and analysis results
//!
//! [`SessionState`] is the single aggregate the reducer and the dispatcher
//! mutate. Every helper here is total: it leaves the state fully formed so a
//! reader never observes a half-applied transition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::hash::Hasher as _;
use twox_hash::XxHash64;

use super::config::{ScanConfig, default_quick_delete_categories};
use super::files::{ClassifiedEntry, Decision, FileCategory, FileEntry, ProtectedEntry};
use super::identifiers::OperationId;

// ============================================================================
// Status and progress
// ============================================================================

/// Authoritative lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Nothing running
    #[default]
    Idle,
    /// Backend is walking the folder
    Scanning,
    /// Backend is classifying candidates
    Analyzing,
    /// Last analysis produced results
    Complete,
}

impl Status {
    /// Lowercase label
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Scanning => "scanning",
            Self::Analyzing => "analyzing",
            Self::Complete => "complete",
        }
    }
}

/// Scan progress as last reported
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanProgress {
    /// Files visited so far
    pub scanned_count: u64,
    /// Free-form status line
    pub message: String,
}

/// Analysis progress as last reported
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzeProgress {
    /// Files classified so far
    pub current: u64,
    /// Files to classify
    pub total: u64,
    /// File currently being classified
    pub current_file: String,
}

/// An outstanding per-file model call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiThinking {
    /// File being classified
    pub file: String,
    /// Prompt sent to the model, when the backend shares it
    #[serde(default)]
    pub prompt: Option<String>,
}

/// Summary computed when a scan finishes
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanStats {
    /// Files visited
    pub total_files: u64,
    /// Files offered to the model
    pub candidate_count: u64,
    /// Candidate count per backend category name
    pub per_category: BTreeMap<String, u64>,
    /// Categories the scan was restricted to
    pub selected_categories: Option<Vec<String>>,
}

// ============================================================================
// Results
// ============================================================================

/// Classified candidates partitioned by decision
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Results {
    /// Entries the model would delete
    pub delete: Vec<ClassifiedEntry>,
    /// Entries the model would keep
    pub keep: Vec<ClassifiedEntry>,
    /// Entries left for the user to decide
    pub review: Vec<ClassifiedEntry>,
}

impl Results {
    /// Partition entries by decision
    ///
    /// The first occurrence of a path wins, so the three lists are disjoint
    /// even when the input repeats a file.
    #[must_use]
    pub fn partition(entries: impl IntoIterator<Item = ClassifiedEntry>) -> Self {
        let mut seen = HashSet::new();
        let mut results = Self::default();
        for entry in entries {
            if !seen.insert(entry.file.path.clone()) {
                continue;
            }
            match entry.decision {
                Decision::Delete => results.delete.push(entry),
                Decision::Keep => results.keep.push(entry),
                Decision::Review => results.review.push(entry),
            }
        }
        results
    }

    /// Total classified entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.delete.len() + self.keep.len() + self.review.len()
    }

    /// Whether no entry is classified
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stable digest of paths, decisions and reasons in list order
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = XxHash64::with_seed(0);
        for entry in self.delete.iter().chain(&self.keep).chain(&self.review) {
            hasher.write(entry.path().as_bytes());
            hasher.write_u8(0);
            hasher.write(entry.decision.as_str().as_bytes());
            hasher.write_u8(0);
            hasher.write(entry.reason.as_bytes());
            hasher.write_u8(0xff);
        }
        hasher.finish()
    }

    /// Drop entries whose path matches
    pub fn retain(&mut self, mut keep: impl FnMut(&ClassifiedEntry) -> bool) {
        self.delete.retain(&mut keep);
        self.keep.retain(&mut keep);
        self.review.retain(&mut keep);
    }
}

// ============================================================================
// Activity log
// ============================================================================

/// Severity of an activity-log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Neutral information
    #[default]
    Info,
    /// Something finished well
    Success,
    /// Worth a look, not a failure
    Warning,
    /// Something failed
    Error,
}

impl Severity {
    /// Map a backend `type` field
    #[must_use]
    pub fn from_wire(value: Option<&str>) -> Self {
        match value.map(str::to_ascii_lowercase).as_deref() {
            Some("success" | "ok") => Self::Success,
            Some("warn" | "warning") => Self::Warning,
            Some("error" | "err") => Self::Error,
            _ => Self::Info,
        }
    }

    /// Color used for a per-file verdict line
    #[must_use]
    pub const fn for_decision(decision: Decision) -> Self {
        match decision {
            Decision::Delete => Self::Success,
            Decision::Keep => Self::Info,
            Decision::Review => Self::Warning,
        }
    }
}

/// One line of the user-visible activity log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// When the line was appended
    pub timestamp: DateTime<Utc>,
    /// Main text
    pub message: String,
    /// Secondary text, e.g. the model's reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Severity
    #[serde(default)]
    pub severity: Severity,
}

impl LogEntry {
    /// Create a line stamped now
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            message: message.into(),
            detail: None,
            severity,
        }
    }

    /// Attach a detail line
    #[must_use]
    pub fn with_detail(mut self, detail: Option<String>) -> Self {
        self.detail = detail.filter(|d| !d.is_empty());
        self
    }
}

// ============================================================================
// Pending operations
// ============================================================================

/// Kind of cancellable operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// `POST /api/scan`
    Scan,
    /// `POST /api/analyze`
    Analyze,
}

impl OperationKind {
    /// Lowercase label
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scan => "scan",
            Self::Analyze => "analyze",
        }
    }
}

/// A start request the backend has not yet confirmed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingOperation {
    /// What was requested
    pub kind: OperationKind,
    /// Handle of the request
    pub id: OperationId,
}

// ============================================================================
// Session state
// ============================================================================

/// The reconciled application state
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    /// Authoritative status, driven by backend events
    pub status: Status,
    /// Scan and analysis parameters
    pub config: ScanConfig,
    /// Quick-delete category toggles
    pub quick_delete_categories: BTreeMap<FileCategory, bool>,
    /// Last scan progress
    pub scan_progress: ScanProgress,
    /// Last analysis progress
    pub analyze_progress: AnalyzeProgress,
    /// Outstanding model call, if any
    pub ai_thinking: Option<AiThinking>,
    /// Summary of the last finished scan
    pub stats: Option<ScanStats>,
    /// Candidates from the last finished scan
    pub candidates: Vec<FileEntry>,
    /// Protected files from the last finished scan
    pub protected_files: Vec<ProtectedEntry>,
    /// Classified candidates
    pub results: Results,
    /// Per-path delete selection; keys mirror `results.delete`
    pub selected_for_deletion: HashMap<String, bool>,
    /// Fingerprint of the last applied `analyze_complete` payload
    pub analysis_fingerprint: Option<u64>,
    /// Activity log, oldest first
    pub logs: VecDeque<LogEntry>,
    /// Log lines ever appended, including evicted ones
    pub log_seq: u64,
    /// Start request awaiting backend confirmation (never persisted)
    pub pending: Option<PendingOperation>,
    /// Maximum retained log lines, 0 for unbounded (never persisted)
    pub log_capacity: usize,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            status: Status::Idle,
            config: ScanConfig::default(),
            quick_delete_categories: default_quick_delete_categories(),
            scan_progress: ScanProgress::default(),
            analyze_progress: AnalyzeProgress::default(),
            ai_thinking: None,
            stats: None,
            candidates: Vec::new(),
            protected_files: Vec::new(),
            results: Results::default(),
            selected_for_deletion: HashMap::new(),
            analysis_fingerprint: None,
            logs: VecDeque::new(),
            log_seq: 0,
            pending: None,
            log_capacity: 0,
        }
    }
}

impl SessionState {
    /// Fresh state retaining at most `log_capacity` log lines
    #[must_use]
    pub fn with_log_capacity(log_capacity: usize) -> Self {
        Self {
            log_capacity,
            ..Self::default()
        }
    }

    /// Append a log line, evicting the oldest past capacity
    pub fn push_log(&mut self, entry: LogEntry) {
        if self.log_capacity > 0 {
            while self.logs.len() >= self.log_capacity {
                self.logs.pop_front();
            }
        }
        self.logs.push_back(entry);
        self.log_seq += 1;
    }

    /// Retained log lines appended after sequence number `seen`
    pub fn logs_since(&self, seen: u64) -> impl Iterator<Item = &LogEntry> {
        let fresh = usize::try_from(self.log_seq.saturating_sub(seen)).unwrap_or(usize::MAX);
        let skip = self.logs.len().saturating_sub(fresh);
        self.logs.iter().skip(skip)
    }

    /// Append a plain log line
    pub fn log(&mut self, severity: Severity, message: impl Into<String>) {
        self.push_log(LogEntry::new(severity, message));
    }

    /// Rebuild the selection map from `results.delete`
    ///
    /// Existing choices survive; paths new to the delete list start selected;
    /// paths no longer listed are dropped.
    pub fn reseed_selection(&mut self) {
        let previous = std::mem::take(&mut self.selected_for_deletion);
        self.selected_for_deletion = self
            .results
            .delete
            .iter()
            .map(|entry| {
                let selected = previous.get(entry.path()).copied().unwrap_or(true);
                (entry.path().to_string(), selected)
            })
            .collect();
    }

    /// Paths in `results.delete` currently selected, in list order
    #[must_use]
    pub fn selected_delete_paths(&self) -> Vec<String> {
        self.results
            .delete
            .iter()
            .filter(|entry| self.is_selected(entry.path()))
            .map(|entry| entry.path().to_string())
            .collect()
    }

    /// Whether a delete entry is selected
    #[must_use]
    pub fn is_selected(&self, path: &str) -> bool {
        self.selected_for_deletion.get(path).copied().unwrap_or(false)
    }

    /// Status a UI should show: the authoritative one, or the pending start
    #[must_use]
    pub fn display_status(&self) -> Status {
        match (self.status, self.pending) {
            (Status::Idle | Status::Complete, Some(pending)) => match pending.kind {
                OperationKind::Scan => Status::Scanning,
                OperationKind::Analyze => Status::Analyzing,
            },
            (status, _) => status,
        }
    }

    /// Whether an operation of `kind` is running or being started
    #[must_use]
    pub fn is_busy_with(&self, kind: OperationKind) -> bool {
        let running = match kind {
            OperationKind::Scan => self.status == Status::Scanning,
            OperationKind::Analyze => self.status == Status::Analyzing,
        };
        running || self.pending.is_some_and(|p| p.kind == kind)
    }

    /// Derived figures for a dashboard
    #[must_use]
    pub fn overview(&self) -> Overview {
        let total_candidate_bytes = self.candidates.iter().map(|f| f.size_bytes).sum();
        let scan_label = match self.display_status() {
            Status::Scanning => "Scanning",
            _ if self.config.target_path.is_empty() => "Choose a folder",
            _ => "Ready",
        };
        let ai_label = match self.display_status() {
            Status::Analyzing => "Analyzing",
            _ if !self.results.delete.is_empty() || !self.results.keep.is_empty() => "Done",
            _ => "Waiting",
        };
        Overview {
            total_candidate_bytes,
            total_candidate_size: format_size(total_candidate_bytes),
            candidate_count: self.candidates.len(),
            protected_count: self.protected_files.len(),
            selected_delete_count: self.selected_delete_paths().len(),
            scan_label,
            ai_label,
        }
    }
}

/// Dashboard figures derived from [`SessionState`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overview {
    /// Sum of candidate sizes
    pub total_candidate_bytes: u64,
    /// Same, human readable
    pub total_candidate_size: String,
    /// Number of candidates
    pub candidate_count: usize,
    /// Number of protected files
    pub protected_count: usize,
    /// Delete entries currently selected
    pub selected_delete_count: usize,
    /// Scan step label
    pub scan_label: &'static str,
    /// AI step label
    pub ai_label: &'static str,
}

/// Format a byte count for display, e.g. `2.0 KB`
#[must_use]
pub fn format_size(bytes: u64) -> String {
    bytesize::to_string(bytes, false)
}
