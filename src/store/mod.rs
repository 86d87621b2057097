//! Persisted key-value store for session state
//!
//! Each field of [`SessionState`] is stored under its own key so that a
//! single malformed value only resets that field. Loading never fails: a
//! missing or corrupt entry falls back to its default.
//!
//! # Example
//!
//! ```
//! use ai_cleaner_client::store::{MemoryStore, PersistedStore};
//!
//! let store = PersistedStore::new(MemoryStore::new());
//! store.save("answer", &42u32);
//! assert_eq!(store.load_or("answer", 0u32), 42);
//! assert_eq!(store.load_or("missing", 7u32), 7);
//! ```

mod backends;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::types::config::{ScanConfig, default_quick_delete_categories};
use crate::types::state::{Results, SessionState, Status};

pub use backends::{FileStore, MemoryStore};

/// Keys under which session fields are stored
pub mod keys {
    /// `SessionState::status`
    pub const STATUS: &str = "status";
    /// `SessionState::config`
    pub const CONFIG: &str = "config";
    /// `SessionState::quick_delete_categories`
    pub const QUICK_DELETE_CATEGORIES: &str = "quick_delete_categories";
    /// `SessionState::scan_progress`
    pub const SCAN_PROGRESS: &str = "scan_progress";
    /// `SessionState::analyze_progress`
    pub const ANALYZE_PROGRESS: &str = "analyze_progress";
    /// `SessionState::ai_thinking`
    pub const AI_THINKING: &str = "ai_thinking";
    /// `SessionState::stats`
    pub const STATS: &str = "stats";
    /// `SessionState::candidates`
    pub const CANDIDATES: &str = "candidates";
    /// `SessionState::protected_files`
    pub const PROTECTED_FILES: &str = "protected_files";
    /// `SessionState::results`
    pub const RESULTS: &str = "results";
    /// `SessionState::selected_for_deletion`
    pub const SELECTED_FOR_DELETION: &str = "selected_for_deletion";
    /// `SessionState::analysis_fingerprint`
    pub const ANALYSIS_FINGERPRINT: &str = "analysis_fingerprint";
    /// `SessionState::logs`
    pub const LOGS: &str = "logs";
    /// `SessionState::log_seq`
    pub const LOG_SEQ: &str = "log_seq";

    /// Every key, in save order
    pub const ALL: [&str; 14] = [
        STATUS,
        CONFIG,
        QUICK_DELETE_CATEGORIES,
        SCAN_PROGRESS,
        ANALYZE_PROGRESS,
        AI_THINKING,
        STATS,
        CANDIDATES,
        PROTECTED_FILES,
        RESULTS,
        SELECTED_FOR_DELETION,
        ANALYSIS_FINGERPRINT,
        LOGS,
        LOG_SEQ,
    ];
}

/// Raw string storage
///
/// Implementations must be safe to share between the dispatcher and the
/// event pump.
pub trait KeyValueStore: Send + Sync {
    /// Read a value
    ///
    /// # Errors
    /// Returns error if the backend cannot be read
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value
    ///
    /// # Errors
    /// Returns error if the backend cannot be written
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a value; removing a missing key is not an error
    ///
    /// # Errors
    /// Returns error if the backend cannot be written
    fn remove(&self, key: &str) -> Result<()>;

    /// Remove every value
    ///
    /// # Errors
    /// Returns error if the backend cannot be written
    fn clear(&self) -> Result<()>;
}

/// Typed JSON persistence over a [`KeyValueStore`]
pub struct PersistedStore {
    backend: Box<dyn KeyValueStore>,
}

impl PersistedStore {
    /// Wrap a backend
    pub fn new(backend: impl KeyValueStore + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    /// In-memory store
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    /// Serialize and store a value; failures are logged, never fatal
    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                log::error!("Failed to serialize '{key}': {e}");
                return;
            }
        };
        if let Err(e) = self.backend.set(key, &json) {
            log::error!("Failed to persist '{key}': {e}");
        }
    }

    /// Load a value, substituting `default` when missing or malformed
    pub fn load_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.backend.get(key) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => value,
                Err(e) => {
                    log::warn!("Ignoring malformed '{key}': {e}");
                    default
                }
            },
            Ok(None) => default,
            Err(e) => {
                log::warn!("Failed to read '{key}': {e}");
                default
            }
        }
    }

    /// Remove every stored value; failures are logged
    pub fn clear(&self) {
        if let Err(e) = self.backend.clear() {
            log::error!("Failed to clear persisted state: {e}");
        }
    }

    /// Rebuild session state from storage
    ///
    /// Config toggles are merged over defaults and the delete selection is
    /// re-seeded from the stored results, so the loaded state satisfies the
    /// same invariants as a live one.
    #[must_use]
    pub fn load_state(&self, log_capacity: usize) -> SessionState {
        let mut state = SessionState::with_log_capacity(log_capacity);
        state.status = self.load_or(keys::STATUS, Status::Idle);
        state.config = self
            .load_or::<ScanConfig>(keys::CONFIG, ScanConfig::default())
            .normalized();
        let mut quick = default_quick_delete_categories();
        for (category, enabled) in
            self.load_or(keys::QUICK_DELETE_CATEGORIES, default_quick_delete_categories())
        {
            if let Some(slot) = quick.get_mut(&category) {
                *slot = enabled;
            }
        }
        state.quick_delete_categories = quick;
        state.scan_progress = self.load_or(keys::SCAN_PROGRESS, Default::default());
        state.analyze_progress = self.load_or(keys::ANALYZE_PROGRESS, Default::default());
        state.ai_thinking = self.load_or(keys::AI_THINKING, None);
        state.stats = self.load_or(keys::STATS, None);
        state.candidates = self.load_or(keys::CANDIDATES, Vec::new());
        state.protected_files = self.load_or(keys::PROTECTED_FILES, Vec::new());
        state.results = self.load_or(keys::RESULTS, Results::default());
        state.selected_for_deletion = self.load_or(keys::SELECTED_FOR_DELETION, Default::default());
        state.reseed_selection();
        state.analysis_fingerprint = self.load_or(keys::ANALYSIS_FINGERPRINT, None);
        state.logs = self.load_or(keys::LOGS, Default::default());
        state.log_seq = self
            .load_or(keys::LOG_SEQ, 0u64)
            .max(state.logs.len() as u64);
        if log_capacity > 0 {
            while state.logs.len() > log_capacity {
                state.logs.pop_front();
            }
        }
        state
    }

    /// Store every persisted field of `state`
    pub fn save_state(&self, state: &SessionState) {
        self.save_changes(None, state);
    }

    /// Store the fields of `after` that differ from `before`
    ///
    /// With no `before`, every field is stored.
    pub fn save_changes(&self, before: Option<&SessionState>, after: &SessionState) {
        macro_rules! mirror {
            ($key:expr, $field:ident) => {
                if before.is_none_or(|b| b.$field != after.$field) {
                    self.save($key, &after.$field);
                }
            };
        }
        mirror!(keys::STATUS, status);
        mirror!(keys::CONFIG, config);
        mirror!(keys::QUICK_DELETE_CATEGORIES, quick_delete_categories);
        mirror!(keys::SCAN_PROGRESS, scan_progress);
        mirror!(keys::ANALYZE_PROGRESS, analyze_progress);
        mirror!(keys::AI_THINKING, ai_thinking);
        mirror!(keys::STATS, stats);
        mirror!(keys::CANDIDATES, candidates);
        mirror!(keys::PROTECTED_FILES, protected_files);
        mirror!(keys::RESULTS, results);
        mirror!(keys::SELECTED_FOR_DELETION, selected_for_deletion);
        mirror!(keys::ANALYSIS_FINGERPRINT, analysis_fingerprint);
        mirror!(keys::LOGS, logs);
        mirror!(keys::LOG_SEQ, log_seq);
    }
}

impl std::fmt::Debug for PersistedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistedStore").finish_non_exhaustive()
    }
}
