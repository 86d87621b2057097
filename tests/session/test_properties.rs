//! Reducer and persistence properties
//!
//! Event sequences are applied through `Session` so every step is also
//! mirrored to the store.

use ai_cleaner_client::store::keys;
use ai_cleaner_client::{
    FileCategory, FileStore, PersistedStore, ServerEvent, Session, SessionState, Severity, Status,
    parse_event,
};
use serde_json::{Value, json};
use std::collections::HashSet;

fn event(name: &str, data: Value) -> ServerEvent {
    parse_event(name, data).unwrap()
}

fn scan_finished(paths: &[&str]) -> ServerEvent {
    let files: Vec<Value> = paths
        .iter()
        .map(|p| json!({"file": p, "size": 1024, "category": "Images"}))
        .collect();
    event(
        "scan_finished",
        json!({"files": files, "protected": [], "count": paths.len(), "total_files": 50}),
    )
}

fn analyze_payload() -> ServerEvent {
    event(
        "analyze_complete",
        json!({"results": [
            {"file": "/tmp/x/a.jpg", "decision": "DELETE", "reason": "old"},
            {"file": "/tmp/x/b.jpg", "decision": "KEEP", "reason": "recent"},
            {"file": "/tmp/x/c.jpg", "decision": "maybe", "reason": "?"},
            {"file": "/tmp/x/a.jpg", "decision": "KEEP", "reason": "dup"}
        ]}),
    )
}

fn assert_selection_mirrors_delete(state: &SessionState) {
    let keys: HashSet<&str> = state
        .selected_for_deletion
        .keys()
        .map(String::as_str)
        .collect();
    let paths: HashSet<&str> = state.results.delete.iter().map(|e| e.path()).collect();
    assert_eq!(keys, paths);
}

#[test]
fn test_scan_reflects_only_last_payload() {
    let mut session = Session::in_memory(100);

    session.apply(event("scan_started", json!({"path": "/tmp/x"})));
    session.apply(scan_finished(&["/tmp/x/old1.jpg", "/tmp/x/old2.jpg"]));

    session.apply(event("scan_started", json!({"path": "/tmp/x"})));
    assert!(session.state().candidates.is_empty());
    for scanned in [10, 20, 30] {
        session.apply(event(
            "scan_progress",
            json!({"scanned": scanned, "message": "walking"}),
        ));
    }
    assert_eq!(session.state().scan_progress.scanned_count, 30);
    session.apply(scan_finished(&["/tmp/x/new.jpg"]));

    let state = session.state();
    assert_eq!(state.status, Status::Idle);
    let paths: Vec<_> = state.candidates.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["/tmp/x/new.jpg"]);
    assert!(state.protected_files.is_empty());
}

#[test]
fn test_cancelled_and_failed_scans_end_idle() {
    for terminal in [
        event("scan_cancelled", json!({})),
        event("scan_error", json!({"error": "permission denied", "path": "/tmp/x"})),
    ] {
        let mut session = Session::in_memory(100);
        session.apply(event("scan_started", json!({"path": "/tmp/x"})));
        session.apply(event("scan_progress", json!({"scanned": 5})));
        session.apply(terminal);
        assert_eq!(session.state().status, Status::Idle);
    }
}

#[test]
fn test_scan_error_keeps_path_detail() {
    let mut session = Session::in_memory(100);
    session.apply(event("scan_started", json!({"path": "/tmp/x"})));
    session.apply(event(
        "scan_error",
        json!({"error": "permission denied", "path": "/tmp/x"}),
    ));

    let last = session.state().logs.back().unwrap();
    assert_eq!(last.severity, Severity::Error);
    assert_eq!(last.message, "Scan error: permission denied");
    assert_eq!(last.detail.as_deref(), Some("Path: /tmp/x"));
}

#[test]
fn test_persisted_state_reloads_equal() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::load(PersistedStore::new(FileStore::new(dir.path())), 100);

    session.update(|state| {
        state.config.target_path = "/tmp/x".into();
        state.config.min_age_days = 90;
        state.config.min_size_mb = 1.5;
        state.config.model_id = "mistral:7b".into();
        state.config.file_type_toggles.insert(FileCategory::Archives, true);
        state.quick_delete_categories.insert(FileCategory::Installers, true);
    });
    session.apply(event("scan_started", json!({"path": "/tmp/x"})));
    session.apply(scan_finished(&["/tmp/x/a.jpg", "/tmp/x/b.jpg", "/tmp/x/c.jpg"]));
    session.apply(event(
        "analyze_progress",
        json!({"current": 1, "total": 3, "file": "/tmp/x/a.jpg"}),
    ));
    session.apply(event("ai_thinking", json!({"file": "/tmp/x/b.jpg"})));
    session.apply(analyze_payload());
    session.update(|state| {
        state.selected_for_deletion.insert("/tmp/x/a.jpg".into(), false);
    });

    let reloaded = Session::load(PersistedStore::new(FileStore::new(dir.path())), 100);
    assert_eq!(reloaded.state(), session.state());
}

#[test]
fn test_missing_store_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let session = Session::load(
        PersistedStore::new(FileStore::new(dir.path().join("absent"))),
        100,
    );
    assert_eq!(session.state(), &SessionState::with_log_capacity(100));
}

#[test]
fn test_malformed_key_falls_back_alone() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::load(PersistedStore::new(FileStore::new(dir.path())), 100);
    session.update(|state| state.config.target_path = "/tmp/x".into());
    session.apply(event("scan_started", json!({"path": "/tmp/x"})));

    std::fs::write(
        dir.path().join(format!("{}.json", keys::STATUS)),
        "\"exploded\"",
    )
    .unwrap();

    let reloaded = Session::load(PersistedStore::new(FileStore::new(dir.path())), 100);
    assert_eq!(reloaded.state().status, Status::Idle);
    assert_eq!(reloaded.state().config.target_path, "/tmp/x");
}

#[test]
fn test_duplicate_analyze_complete_is_idempotent() {
    let mut once = Session::in_memory(100);
    once.apply(analyze_payload());

    let mut twice = Session::in_memory(100);
    twice.apply(analyze_payload());
    twice.apply(analyze_payload());

    assert_eq!(once.state().results, twice.state().results);
    assert_eq!(
        once.state().selected_for_deletion,
        twice.state().selected_for_deletion
    );
    assert_eq!(once.state().logs.len(), twice.state().logs.len());
}

#[test]
fn test_results_partition_is_disjoint() {
    let mut session = Session::in_memory(100);
    session.apply(analyze_payload());
    let results = &session.state().results;

    let mut seen = HashSet::new();
    for entry in results
        .delete
        .iter()
        .chain(&results.keep)
        .chain(&results.review)
    {
        assert!(seen.insert(entry.path()), "{} listed twice", entry.path());
    }
    assert_eq!(
        seen,
        HashSet::from(["/tmp/x/a.jpg", "/tmp/x/b.jpg", "/tmp/x/c.jpg"])
    );
    assert_eq!(results.delete[0].reason, "old");
    assert_eq!(results.review[0].path(), "/tmp/x/c.jpg");
}

#[test]
fn test_selection_tracks_delete_list() {
    let mut session = Session::in_memory(100);
    session.apply(analyze_payload());
    assert_selection_mirrors_delete(session.state());

    session.apply(event(
        "analyze_complete",
        json!({"results": [
            {"file": "/tmp/x/d.jpg", "decision": "DELETE", "reason": "dup"},
            {"file": "/tmp/x/e.jpg", "decision": "DELETE", "reason": "tmp"}
        ]}),
    ));
    assert_selection_mirrors_delete(session.state());

    session.apply(event("scan_started", json!({"path": "/tmp/x"})));
    assert_selection_mirrors_delete(session.state());
    assert!(session.state().selected_for_deletion.is_empty());
}

#[test]
fn test_basic_scan_flow() {
    let mut session = Session::in_memory(100);
    session.update(|state| {
        state.config.target_path = "/tmp/x".into();
        for enabled in state.config.file_type_toggles.values_mut() {
            *enabled = false;
        }
        state.config.file_type_toggles.insert(FileCategory::Images, true);
    });

    session.apply(event("scan_started", json!({"path": "/tmp/x"})));
    assert_eq!(session.state().status, Status::Scanning);
    assert!(session.state().candidates.is_empty());

    session.apply(event(
        "scan_finished",
        json!({
            "files": [{"file": "/tmp/x/a.jpg", "name": "a.jpg", "size": 2048}],
            "protected": [],
            "count": 1,
            "total_files": 10
        }),
    ));

    let state = session.state();
    assert_eq!(state.status, Status::Idle);
    assert_eq!(state.candidates.len(), 1);
    assert_eq!(state.candidates[0].size_bytes, 2048);
    assert_eq!(state.candidates[0].display_name, "a.jpg");
    let stats = state.stats.as_ref().unwrap();
    assert_eq!(stats.total_files, 10);
    assert_eq!(stats.candidate_count, 1);
}

#[test]
fn test_analyze_partition_scenario() {
    let mut session = Session::in_memory(100);
    session.apply(event(
        "analyze_complete",
        json!({"results": [
            {"file": "/tmp/x/a.jpg", "decision": "DELETE", "reason": "old"},
            {"file": "/tmp/x/b.jpg", "decision": "KEEP", "reason": "recent"}
        ]}),
    ));

    let state = session.state();
    assert_eq!(state.status, Status::Complete);
    let delete: Vec<_> = state.results.delete.iter().map(|e| e.path()).collect();
    let keep: Vec<_> = state.results.keep.iter().map(|e| e.path()).collect();
    assert_eq!(delete, vec!["/tmp/x/a.jpg"]);
    assert_eq!(keep, vec!["/tmp/x/b.jpg"]);
    assert!(state.results.review.is_empty());
    assert_eq!(state.selected_for_deletion.len(), 1);
    assert_eq!(state.selected_for_deletion.get("/tmp/x/a.jpg"), Some(&true));
}

#[test]
fn test_late_analyze_error_does_not_end_scan() {
    let mut session = Session::in_memory(100);
    session.apply(event("scan_started", json!({"path": "/tmp/x"})));
    session.apply(event("analyze_error", json!({"error": "model crashed"})));

    assert_eq!(session.state().status, Status::Scanning);
    assert_eq!(session.state().logs.back().unwrap().severity, Severity::Error);
}

#[test]
fn test_verdict_log_severity() {
    let mut session = Session::in_memory(100);
    for (decision, severity) in [
        ("DELETE", Severity::Success),
        ("KEEP", Severity::Info),
        ("REVIEW", Severity::Warning),
    ] {
        session.apply(event(
            "analyze_progress",
            json!({"current": 1, "total": 3, "file": "/tmp/x/a.jpg",
                   "decision": decision, "reason": "because"}),
        ));
        let last = session.state().logs.back().unwrap();
        assert_eq!(last.severity, severity);
        assert_eq!(last.message, format!("{decision}: /tmp/x/a.jpg"));
        assert_eq!(last.detail.as_deref(), Some("because"));
    }
}

#[test]
fn test_progress_is_clamped_to_total() {
    let mut session = Session::in_memory(100);
    session.apply(event(
        "analyze_progress",
        json!({"current": 9, "total": 3, "file": "/tmp/x/a.jpg"}),
    ));
    assert_eq!(session.state().analyze_progress.current, 3);
}

#[test]
fn test_log_ring_is_bounded() {
    let mut session = Session::in_memory(3);
    for i in 0..5 {
        session.apply(event("log", json!({"message": format!("line {i}")})));
    }
    let messages: Vec<_> = session
        .state()
        .logs
        .iter()
        .map(|l| l.message.as_str())
        .collect();
    assert_eq!(messages, vec!["line 2", "line 3", "line 4"]);
}
