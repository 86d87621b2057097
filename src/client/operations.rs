//! Scan, analyze, stop and restart commands

use std::future::Future;
use tokio_util::sync::CancellationToken;

use crate::api::{AiStatusResponse, AnalyzeRequest, ApiGateway, ScanRequest, SelectFolderRequest};
use crate::error::{CleanerError, Result};
use crate::types::identifiers::OperationId;
use crate::types::state::{AnalyzeProgress, OperationKind, PendingOperation, Severity, Status};

use super::{CleanerClient, InFlight};

impl<G: ApiGateway> CleanerClient<G> {
    /// Ask the backend for a folder and make it the scan target
    ///
    /// # Errors
    /// Returns error if the request fails or no folder was chosen
    pub async fn select_folder(&self, use_native: bool) -> Result<String> {
        let response = match self
            .inner
            .gateway
            .select_folder(SelectFolderRequest { use_native })
            .await
        {
            Ok(response) => response,
            Err(e) => {
                self.log(Severity::Error, format!("Folder selection failed: {e}"));
                return Err(e);
            }
        };

        let Some(path) = response.path.filter(|p| !p.trim().is_empty()) else {
            self.log(Severity::Error, "Folder selection failed: no folder returned");
            return Err(CleanerError::backend("no folder returned"));
        };

        self.update(|state| {
            state.config.target_path.clone_from(&path);
            state.log(Severity::Info, format!("Folder selected: {path}"));
            if let Some(warning) = response.warning.filter(|w| !w.is_empty()) {
                state.log(Severity::Warning, warning);
            }
        });
        Ok(path)
    }

    /// Start scanning the target folder
    ///
    /// The session only switches to scanning when the backend reports
    /// `scan_started`; until then the request shows as pending.
    ///
    /// # Errors
    /// Returns `Validation` without sending anything when no folder or no
    /// category is selected or an operation is already running, `Cancelled`
    /// when stopped locally, or the request failure
    pub async fn start_scan(&self) -> Result<()> {
        let request = self.with_state(|state| {
            if state.config.target_path.trim().is_empty() {
                return Err((Severity::Error, "Select a folder first".to_string()));
            }
            let categories = state.config.selected_categories();
            if categories.is_empty() {
                return Err((
                    Severity::Warning,
                    "Select at least one file type to scan".to_string(),
                ));
            }
            Ok(ScanRequest {
                path: state.config.target_path.clone(),
                categories: categories
                    .iter()
                    .map(|c| c.wire_name().to_string())
                    .collect(),
                min_age_days: state.config.min_age_days,
                min_size_mb: state.config.min_size_mb,
            })
        });
        let request = request.map_err(|(severity, message)| self.reject(severity, &message))?;
        let (id, token) = self.claim(OperationKind::Scan)?;

        self.log(
            Severity::Info,
            format!("Scanning file types: {}", request.categories.join(", ")),
        );

        let scan = self.inner.gateway.scan(request);
        match self.run_cancellable(OperationKind::Scan, id, token, scan).await {
            Ok(_) => Ok(()),
            Err(e) => Err(self.operation_failed(OperationKind::Scan, e)),
        }
    }

    /// Send the first `max_files` candidates to the model
    ///
    /// # Errors
    /// Returns `Validation` without sending anything when there are no
    /// candidates or an operation is already running, `Cancelled` when
    /// stopped locally, or the request failure
    pub async fn start_analyze(&self) -> Result<()> {
        let request = self.with_state(|state| {
            if state.candidates.is_empty() {
                return Err((
                    Severity::Error,
                    "No files to analyze, run a scan first".to_string(),
                ));
            }
            let max_files = state.config.max_files.max(1);
            Ok(AnalyzeRequest {
                paths: state
                    .candidates
                    .iter()
                    .take(max_files as usize)
                    .map(|file| file.path.clone())
                    .collect(),
                model: state.config.effective_model().to_string(),
                max_files,
            })
        });
        let request = request.map_err(|(severity, message)| self.reject(severity, &message))?;
        let (id, token) = self.claim(OperationKind::Analyze)?;

        let total = request.paths.len() as u64;
        self.update(|state| {
            state.analyze_progress = AnalyzeProgress {
                current: 0,
                total,
                current_file: String::new(),
            };
            state.log(
                Severity::Info,
                format!("Starting analysis of {total} files with {}", request.model),
            );
        });

        let analyze = self.inner.gateway.analyze(request);
        match self.run_cancellable(OperationKind::Analyze, id, token, analyze).await {
            Ok(response) => {
                let count = response.count.unwrap_or(total);
                self.log(
                    Severity::Success,
                    format!("Analysis accepted: {count} files queued"),
                );
                Ok(())
            }
            Err(e) => Err(self.operation_failed(OperationKind::Analyze, e)),
        }
    }

    /// Abort local requests and ask the backend to stop
    ///
    /// The session is reset to idle before the stop request is sent and
    /// stays idle whatever its outcome. Safe to call when nothing runs.
    ///
    /// # Errors
    /// Returns the stop request failure; the local reset has already happened
    pub async fn stop_process(&self) -> Result<()> {
        let aborted: Vec<InFlight> = self
            .inner
            .operations
            .lock()
            .drain()
            .map(|(_, op)| op)
            .collect();
        for op in &aborted {
            log::debug!("Aborting {}", op.id);
            op.token.cancel();
        }

        self.update(|state| {
            state.pending = None;
            state.status = Status::Idle;
            state.ai_thinking = None;
        });

        match self.inner.gateway.stop().await {
            Ok(_) => {
                self.log(Severity::Info, "Process stopped");
                Ok(())
            }
            Err(e) => {
                self.log(Severity::Warning, format!("Stop request failed: {e}"));
                Err(e)
            }
        }
    }

    /// Stop everything, then reset the session and wipe the store
    pub async fn restart_process(&self) {
        if let Err(e) = self.stop_process().await {
            log::warn!("Stop before restart failed: {e}");
        }
        self.inner.session.lock().reset();
        self.inner.revision.send_modify(|rev| *rev = rev.wrapping_add(1));
    }

    /// Check that the configured model is reachable
    ///
    /// # Errors
    /// Returns error if the request fails or the model is not ready
    pub async fn check_ai_status(&self) -> Result<AiStatusResponse> {
        let model = self.with_state(|state| state.config.effective_model().to_string());
        match self.inner.gateway.ai_status(&model).await {
            Ok(response) => {
                let via = response.ollama_url.as_deref().unwrap_or("default endpoint");
                self.log(Severity::Success, format!("Model ready ({model}) via {via}"));
                Ok(response)
            }
            Err(e) => {
                self.log(Severity::Error, format!("AI status check failed: {e}"));
                Err(e)
            }
        }
    }

    /// Reserve the operation slot for `kind`
    ///
    /// The busy check, the pending marker and the abort handle are set under
    /// one session lock; of two racing starts only one gets through.
    ///
    /// # Errors
    /// Returns `Validation` when a scan or analysis is running or pending
    fn claim(&self, kind: OperationKind) -> Result<(OperationId, CancellationToken)> {
        let id = OperationId::new();
        let token = CancellationToken::new();
        let claimed = self.update(|state| {
            if let Some(busy) = busy_message(state.display_status()) {
                return Err(busy);
            }
            self.inner.operations.lock().insert(
                kind,
                InFlight {
                    id,
                    token: token.clone(),
                },
            );
            state.pending = Some(PendingOperation { kind, id });
            Ok(())
        });
        claimed.map_err(|busy| self.reject(Severity::Warning, &busy))?;
        log::debug!("Started {} request {id}", kind.as_str());
        Ok((id, token))
    }

    /// Run a claimed request until it finishes or its token fires
    async fn run_cancellable<T>(
        &self,
        kind: OperationKind,
        id: OperationId,
        token: CancellationToken,
        request: impl Future<Output = Result<T>>,
    ) -> Result<T> {

        let result = tokio::select! {
            () = token.cancelled() => Err(CleanerError::Cancelled),
            result = request => result,
        };

        let mut operations = self.inner.operations.lock();
        if operations.get(&kind).is_some_and(|op| op.id == id) {
            operations.remove(&kind);
        }
        drop(operations);

        if result.is_err() {
            self.update(|state| {
                if state.pending.is_some_and(|p| p.id == id) {
                    state.pending = None;
                }
            });
        }
        result
    }

    /// Record a failed scan or analyze request
    ///
    /// Cancellation stays silent; anything else is logged and the status of
    /// that operation falls back to idle.
    fn operation_failed(&self, kind: OperationKind, error: CleanerError) -> CleanerError {
        if error.is_cancelled() {
            log::debug!("{} request cancelled", kind.as_str());
            return error;
        }
        let (running, label) = match kind {
            OperationKind::Scan => (Status::Scanning, "Scan"),
            OperationKind::Analyze => (Status::Analyzing, "Analysis"),
        };
        self.update(|state| {
            if state.status == running {
                state.status = Status::Idle;
            }
            state.log(Severity::Error, format!("{label} error: {error}"));
        });
        error
    }
}

fn busy_message(status: Status) -> Option<String> {
    match status {
        Status::Scanning => Some("A scan is already running".to_string()),
        Status::Analyzing => Some("An analysis is already running".to_string()),
        Status::Idle | Status::Complete => None,
    }
}
