//! User-editable scan and analysis configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::files::FileCategory;

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "llama3:8b";

/// Files sent to the model per analysis when none is configured
pub const DEFAULT_MAX_FILES: u32 = 100;

/// Scan and analysis parameters chosen by the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Folder to scan; empty until one is selected
    pub target_path: String,
    /// Ignore files modified more recently than this
    pub min_age_days: u32,
    /// Ignore files smaller than this
    pub min_size_mb: f64,
    /// Upper bound of candidates sent to the model
    pub max_files: u32,
    /// Model identifier passed to the backend
    pub model_id: String,
    /// Which categories a scan covers
    pub file_type_toggles: BTreeMap<FileCategory, bool>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            target_path: String::new(),
            min_age_days: 0,
            min_size_mb: 0.0,
            max_files: DEFAULT_MAX_FILES,
            model_id: DEFAULT_MODEL.to_string(),
            file_type_toggles: default_file_type_toggles(),
        }
    }
}

impl ScanConfig {
    /// Restore invariants on a value that came from storage
    ///
    /// Missing toggles are filled from the defaults, out-of-range numbers are
    /// clamped and a blank model falls back to [`DEFAULT_MODEL`].
    #[must_use]
    pub fn normalized(mut self) -> Self {
        let mut toggles = default_file_type_toggles();
        for (category, enabled) in self.file_type_toggles {
            if toggles.contains_key(&category) {
                toggles.insert(category, enabled);
            }
        }
        self.file_type_toggles = toggles;
        if !self.min_size_mb.is_finite() || self.min_size_mb < 0.0 {
            self.min_size_mb = 0.0;
        }
        if self.max_files == 0 {
            self.max_files = DEFAULT_MAX_FILES;
        }
        if self.model_id.trim().is_empty() {
            self.model_id = DEFAULT_MODEL.to_string();
        }
        self
    }

    /// Enabled categories in display order
    #[must_use]
    pub fn selected_categories(&self) -> Vec<FileCategory> {
        FileCategory::SCANNABLE
            .into_iter()
            .filter(|category| self.file_type_toggles.get(category).copied().unwrap_or(false))
            .collect()
    }

    /// Model to send, never blank
    #[must_use]
    pub fn effective_model(&self) -> &str {
        let trimmed = self.model_id.trim();
        if trimmed.is_empty() {
            DEFAULT_MODEL
        } else {
            trimmed
        }
    }
}

/// Scan toggles with their default state
#[must_use]
pub fn default_file_type_toggles() -> BTreeMap<FileCategory, bool> {
    FileCategory::SCANNABLE
        .into_iter()
        .map(|category| (category, category.enabled_by_default()))
        .collect()
}

/// Quick-delete toggles, all off
#[must_use]
pub fn default_quick_delete_categories() -> BTreeMap<FileCategory, bool> {
    FileCategory::QUICK_DELETE
        .into_iter()
        .map(|category| (category, false))
        .collect()
}
