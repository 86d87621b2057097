//! Event reducer: folds one push event into [`SessionState`]
//!
//! Events whose declared transition does not match the current status are
//! still applied to their data fields; only the status change is guarded.
//! Terminal events of one operation never overwrite the status of the other
//! (a late `analyze_error` must not knock a running scan back to idle), and a
//! terminal event delivered twice leaves the state as after the first.

use std::collections::BTreeMap;

use crate::events::{AnalyzeTick, ScanFinished, ServerEvent};
use crate::types::files::base_name;
use crate::types::state::{
    AiThinking, AnalyzeProgress, LogEntry, OperationKind, Results, ScanProgress, ScanStats,
    SessionState, Severity, Status,
};

/// Apply `event` to `state`
pub fn apply_event(state: &mut SessionState, event: ServerEvent) {
    log::trace!("Applying {} in status {}", event.name(), state.status.as_str());

    match event {
        ServerEvent::Connected => state.log(Severity::Success, "Connected to server"),
        ServerEvent::ScanStarted { path } => scan_started(state, &path),
        ServerEvent::ScanProgress { scanned, message } => {
            state.scan_progress = ScanProgress {
                scanned_count: scanned,
                message,
            };
        }
        ServerEvent::ScanFinished(finished) => scan_finished(state, finished),
        ServerEvent::ScanCancelled => {
            end_scan(state);
            state.log(Severity::Warning, "Scan cancelled");
        }
        ServerEvent::ScanError { error, path } => {
            end_scan(state);
            state.push_log(
                LogEntry::new(Severity::Error, format!("Scan error: {error}"))
                    .with_detail(path.map(|p| format!("Path: {p}"))),
            );
        }
        ServerEvent::AnalyzeStarted { total } => {
            state.status = Status::Analyzing;
            clear_pending(state, OperationKind::Analyze);
            state.analysis_fingerprint = None;
            state.analyze_progress = AnalyzeProgress {
                current: 0,
                total,
                current_file: String::new(),
            };
        }
        ServerEvent::AnalyzeProgress(tick) => analyze_progress(state, tick),
        ServerEvent::AnalyzeComplete { results } => {
            let results = Results::partition(results);
            let fingerprint = results.fingerprint();
            if state.analysis_fingerprint == Some(fingerprint)
                && !state.is_busy_with(OperationKind::Analyze)
            {
                log::debug!("Ignoring duplicate analyze_complete");
                return;
            }
            state.results = results;
            state.analysis_fingerprint = Some(fingerprint);
            state.reseed_selection();
            end_analyze(state, Status::Complete);
            state.log(
                Severity::Success,
                format!(
                    "Analysis finished: {} to delete, {} to keep, {} to review",
                    state.results.delete.len(),
                    state.results.keep.len(),
                    state.results.review.len()
                ),
            );
        }
        ServerEvent::AnalyzeError { error } => {
            end_analyze(state, Status::Idle);
            state.log(Severity::Error, format!("Analysis error: {error}"));
        }
        ServerEvent::AiThinking { file, prompt } => {
            if let Some(file) = file {
                state.ai_thinking = Some(AiThinking { file, prompt });
            }
        }
        ServerEvent::AiResult => state.ai_thinking = None,
        ServerEvent::FileDeleted { path } => {
            state.log(Severity::Info, format!("Deleted: {}", base_name(&path)));
        }
        ServerEvent::DeletionComplete {
            deleted,
            size_freed,
        } => {
            let freed = size_freed.unwrap_or_else(|| "0B".to_string());
            state.log(
                Severity::Success,
                format!("Deletion finished: {deleted} files removed ({freed} freed)"),
            );
        }
        ServerEvent::Log { message, severity } => state.log(severity, message),
    }
}

fn scan_started(state: &mut SessionState, path: &str) {
    state.status = Status::Scanning;
    clear_pending(state, OperationKind::Scan);
    state.candidates.clear();
    state.protected_files.clear();
    state.stats = None;
    state.results = Results::default();
    state.selected_for_deletion.clear();
    state.analysis_fingerprint = None;
    state.ai_thinking = None;
    state.scan_progress = ScanProgress {
        scanned_count: 0,
        message: "Scan started".to_string(),
    };
    state.log(Severity::Info, format!("Scan started: {path}"));
}

fn scan_finished(state: &mut SessionState, finished: ScanFinished) {
    if state.status != Status::Scanning
        && state.candidates == finished.files
        && state.protected_files == finished.protected
        && state.stats.is_some()
    {
        log::debug!("Ignoring duplicate scan_finished");
        return;
    }

    let per_category = if finished.stats.is_empty() {
        count_by_category(&finished)
    } else {
        finished.stats
    };
    state.stats = Some(ScanStats {
        total_files: finished.total_files,
        candidate_count: finished.count,
        per_category,
        selected_categories: finished.selected_categories,
    });
    state.candidates = finished.files;
    state.protected_files = finished.protected;
    end_scan(state);

    let message = format!(
        "Scan finished: {} candidates, {} protected",
        finished.count,
        state.protected_files.len()
    );
    if finished.cancelled {
        state.log(Severity::Warning, format!("{message} (stopped early)"));
    } else {
        state.log(Severity::Success, message);
    }
}

fn count_by_category(finished: &ScanFinished) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    for file in &finished.files {
        if let Some(category) = file.category {
            *counts.entry(category.wire_name().to_string()).or_insert(0) += 1;
        }
    }
    counts
}

fn analyze_progress(state: &mut SessionState, tick: AnalyzeTick) {
    let current = if tick.total > 0 {
        tick.current.min(tick.total)
    } else {
        tick.current
    };
    state.analyze_progress = AnalyzeProgress {
        current,
        total: tick.total,
        current_file: tick.file.clone(),
    };
    if let Some(decision) = tick.decision {
        state.push_log(
            LogEntry::new(
                Severity::for_decision(decision),
                format!("{}: {}", decision.as_str(), tick.file),
            )
            .with_detail(tick.reason),
        );
    }
}

/// Scan terminal: back to idle unless another operation owns the status
fn end_scan(state: &mut SessionState) {
    clear_pending(state, OperationKind::Scan);
    if state.status == Status::Scanning {
        state.status = Status::Idle;
    }
}

/// Analysis terminal: a running scan keeps the status
fn end_analyze(state: &mut SessionState, next: Status) {
    clear_pending(state, OperationKind::Analyze);
    state.ai_thinking = None;
    if state.status != Status::Scanning {
        state.status = next;
    }
}

fn clear_pending(state: &mut SessionState, kind: OperationKind) {
    if state.pending.is_some_and(|pending| pending.kind == kind) {
        state.pending = None;
    }
}
