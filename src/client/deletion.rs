//! Deletion commands

use std::collections::HashSet;

use crate::api::{ApiGateway, CategoryDeleteRequest, DeleteRequest, DeleteResponse};
use crate::error::Result;
use crate::types::files::FileCategory;
use crate::types::state::{SessionState, Severity};

use super::{CleanerClient, Confirm};

/// Outcome of an accepted deletion request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteReport {
    /// Files the backend removed
    pub deleted: u64,
    /// Space freed, human readable
    pub size_freed: Option<String>,
    /// Files the backend failed to remove
    pub errors: u64,
    /// Entries dropped from the session
    pub removed_paths: Vec<String>,
}

impl<G: ApiGateway> CleanerClient<G> {
    /// Delete the selected entries of `results.delete`
    ///
    /// Returns `Ok(None)` when the user declines. Entries are removed from
    /// the session by the paths the backend echoes in `deleted_paths`; a
    /// backend that does not echo them has every attempted path removed.
    ///
    /// # Errors
    /// Returns `Validation` without sending anything when nothing is
    /// selected, or the request failure
    pub async fn delete_selected<C>(&self, confirm: &C) -> Result<Option<DeleteReport>>
    where
        C: Confirm + ?Sized,
    {
        let paths = self.with_state(SessionState::selected_delete_paths);
        if paths.is_empty() {
            return Err(self.reject(Severity::Warning, "Select at least one file to delete"));
        }
        if !confirm.confirm(&format!("Delete {} file(s)?", paths.len())) {
            log::info!("Deletion declined");
            return Ok(None);
        }

        let request = DeleteRequest {
            files: paths.clone(),
            simulate: false,
        };
        let response = match self.inner.gateway.delete(request).await {
            Ok(response) => response,
            Err(e) => {
                self.log(Severity::Error, format!("Deletion failed: {e}"));
                return Err(e);
            }
        };

        let attempted: HashSet<String> = paths.into_iter().collect();
        let removed: HashSet<String> = match &response.deleted_paths {
            Some(echoed) => echoed
                .iter()
                .filter(|p| attempted.contains(*p))
                .cloned()
                .collect(),
            None => attempted,
        };
        Ok(Some(self.finish_deletion("Deleted", &response, |path, _| {
            removed.contains(path)
        })))
    }

    /// Delete every scanned file of the enabled quick-delete categories
    ///
    /// Returns `Ok(None)` when the user declines. Candidates and classified
    /// entries are reconciled by the echoed paths, or by category when the
    /// backend does not echo them.
    ///
    /// # Errors
    /// Returns `Validation` without sending anything when no category is
    /// enabled, or the request failure
    pub async fn quick_delete_by_category<C>(&self, confirm: &C) -> Result<Option<DeleteReport>>
    where
        C: Confirm + ?Sized,
    {
        let categories: Vec<FileCategory> = self.with_state(|state| {
            state
                .quick_delete_categories
                .iter()
                .filter(|&(_, &enabled)| enabled)
                .map(|(&category, _)| category)
                .collect()
        });
        if categories.is_empty() {
            return Err(self.reject(Severity::Warning, "No category selected"));
        }

        let names: Vec<String> = categories
            .iter()
            .map(|c| c.wire_name().to_string())
            .collect();
        if !confirm.confirm(&format!(
            "Delete ALL files in categories: {}?",
            names.join(", ")
        )) {
            log::info!("Quick delete declined");
            return Ok(None);
        }

        let request = CategoryDeleteRequest { categories: names };
        let response = match self.inner.gateway.delete_by_category(request).await {
            Ok(response) => response,
            Err(e) => {
                self.log(Severity::Error, format!("Quick delete failed: {e}"));
                return Err(e);
            }
        };

        let echoed: Option<HashSet<String>> = response
            .deleted_paths
            .as_ref()
            .map(|paths| paths.iter().cloned().collect());
        let wiped: HashSet<FileCategory> = categories.into_iter().collect();
        Ok(Some(self.finish_deletion(
            "Quick delete",
            &response,
            |path, category| match &echoed {
                Some(paths) => paths.contains(path),
                None => category.is_some_and(|c| wiped.contains(&c)),
            },
        )))
    }

    /// Drop removed entries from the session and log the outcome
    fn finish_deletion(
        &self,
        label: &str,
        response: &DeleteResponse,
        is_removed: impl Fn(&str, Option<FileCategory>) -> bool,
    ) -> DeleteReport {
        let errors = response.errors.count();
        let size_freed = response.size_freed_h.clone();

        let removed_paths = self.update(|state| {
            let mut removed = Vec::new();
            state.results.retain(|entry| {
                let gone = is_removed(entry.path(), entry.file.category);
                if gone {
                    removed.push(entry.path().to_string());
                }
                !gone
            });
            state
                .candidates
                .retain(|file| !is_removed(&file.path, file.category));
            state.reseed_selection();

            state.log(
                Severity::Success,
                format!(
                    "{label}: {} files ({} freed)",
                    response.deleted,
                    size_freed.as_deref().unwrap_or("0B")
                ),
            );
            if errors > 0 {
                state.log(
                    Severity::Warning,
                    format!("{errors} file(s) could not be deleted"),
                );
            }
            removed
        });

        DeleteReport {
            deleted: response.deleted,
            size_freed,
            errors,
            removed_paths,
        }
    }
}
