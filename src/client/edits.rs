//! Local edits: configuration, selection and re-triage
//!
//! None of these send a request.

use std::collections::HashSet;

use crate::api::ApiGateway;
use crate::types::config::DEFAULT_MODEL;
use crate::types::files::{Decision, FileCategory};
use crate::types::state::Severity;

use super::CleanerClient;

impl<G: ApiGateway> CleanerClient<G> {
    /// Set the folder to scan
    pub fn set_target_path(&self, path: impl Into<String>) {
        let path = path.into();
        self.update(|state| state.config.target_path = path.trim().to_string());
    }

    /// Ignore files modified more recently than `days`
    pub fn set_min_age_days(&self, days: u32) {
        self.update(|state| state.config.min_age_days = days);
    }

    /// Ignore files smaller than `mb`; negative or non-finite values mean 0
    pub fn set_min_size_mb(&self, mb: f64) {
        let mb = if mb.is_finite() { mb.max(0.0) } else { 0.0 };
        self.update(|state| state.config.min_size_mb = mb);
    }

    /// Send at most `max` candidates to the model; 0 is raised to 1
    pub fn set_max_files(&self, max: u32) {
        self.update(|state| state.config.max_files = max.max(1));
    }

    /// Choose the model; blank selects the default
    pub fn set_model(&self, model: &str) {
        let model = match model.trim() {
            "" => DEFAULT_MODEL.to_string(),
            trimmed => trimmed.to_string(),
        };
        self.update(|state| state.config.model_id = model);
    }

    /// Flip a scan category; returns its new state
    ///
    /// Categories a scan cannot cover are left alone and report `false`.
    pub fn toggle_file_type(&self, category: FileCategory) -> bool {
        self.update(|state| match state.config.file_type_toggles.get_mut(&category) {
            Some(enabled) => {
                *enabled = !*enabled;
                *enabled
            }
            None => {
                log::warn!("{category} is not a scannable category");
                false
            }
        })
    }

    /// Flip a quick-delete category; returns its new state
    pub fn toggle_quick_delete_category(&self, category: FileCategory) -> bool {
        self.update(|state| match state.quick_delete_categories.get_mut(&category) {
            Some(enabled) => {
                *enabled = !*enabled;
                *enabled
            }
            None => {
                log::warn!("{category} has no quick delete");
                false
            }
        })
    }

    /// Select or unselect one delete entry
    ///
    /// Returns `false` when `path` is not in the delete list.
    pub fn toggle_delete_selection(&self, path: &str, checked: bool) -> bool {
        self.update(|state| match state.selected_for_deletion.get_mut(path) {
            Some(selected) => {
                *selected = checked;
                true
            }
            None => false,
        })
    }

    /// Select or unselect every delete entry
    pub fn toggle_select_all(&self, checked: bool) {
        self.update(|state| {
            for selected in state.selected_for_deletion.values_mut() {
                *selected = checked;
            }
        });
    }

    /// Move review entries to the delete list; returns how many moved
    ///
    /// Moved entries start selected.
    pub fn move_review_to_delete(&self, paths: &[String]) -> usize {
        let wanted: HashSet<&str> = paths.iter().map(String::as_str).collect();
        self.update(|state| {
            let (moving, staying): (Vec<_>, Vec<_>) = std::mem::take(&mut state.results.review)
                .into_iter()
                .partition(|entry| wanted.contains(entry.path()));
            state.results.review = staying;

            let moved = moving.len();
            for mut entry in moving {
                entry.decision = Decision::Delete;
                state.selected_for_deletion.remove(entry.path());
                state.results.delete.push(entry);
            }
            state.reseed_selection();
            if moved > 0 {
                state.log(Severity::Info, format!("Moved {moved} file(s) to delete"));
            }
            moved
        })
    }

    /// Empty the activity log
    pub fn clear_logs(&self) {
        self.update(|state| state.logs.clear());
    }
}
