//! Push event parser
//!
//! Payloads are read field by field from the raw JSON so that the legacy
//! names the backend still emits (`scan_complete`, `analyze_update`,
//! `candidates`, `total_candidates` ...) land on the same typed event.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::{CleanerError, Result};
use crate::types::files::{
    ClassifiedEntry, Decision, FileCategory, FileEntry, ProtectedEntry, base_name,
};
use crate::types::state::Severity;

use super::{AnalyzeTick, ScanFinished, ServerEvent};

/// Parse a named push event into a typed [`ServerEvent`]
///
/// # Arguments
/// * `name` - Event name as received
/// * `data` - Raw JSON payload (`null` for events without one)
///
/// # Errors
/// Returns `CleanerError::EventParse` for unknown names and for payloads
/// missing a field the reducer cannot default
pub fn parse_event(name: &str, data: Value) -> Result<ServerEvent> {
    let empty = Map::new();
    let obj = match &data {
        Value::Object(map) => map,
        Value::Null => &empty,
        other => {
            return Err(CleanerError::event_parse(
                name,
                format!("expected an object payload, got {}", type_name(other)),
            ));
        }
    };

    let event = match name {
        "connected" => ServerEvent::Connected,
        "scan_started" => ServerEvent::ScanStarted {
            path: str_field(obj, &["path"]).unwrap_or_default(),
        },
        "scan_progress" | "scan_update" => ServerEvent::ScanProgress {
            scanned: u64_field(obj, &["scanned", "total_files"]).unwrap_or(0),
            message: str_field(obj, &["message"]).unwrap_or_default(),
        },
        "scan_finished" | "scan_complete" => ServerEvent::ScanFinished(parse_scan_finished(name, obj)?),
        "scan_cancelled" => ServerEvent::ScanCancelled,
        "scan_error" => ServerEvent::ScanError {
            error: str_field(obj, &["error"]).unwrap_or_else(|| "Unknown error".to_string()),
            path: str_field(obj, &["path"]),
        },
        "analyze_started" => ServerEvent::AnalyzeStarted {
            total: u64_field(obj, &["total", "total_candidates"]).unwrap_or(0),
        },
        "analyze_progress" | "analyze_update" => ServerEvent::AnalyzeProgress(AnalyzeTick {
            current: u64_field(obj, &["current", "analyzed_files"]).unwrap_or(0),
            total: u64_field(obj, &["total", "total_candidates"]).unwrap_or(0),
            file: str_field(obj, &["file", "current_file"]).unwrap_or_default(),
            decision: str_field(obj, &["decision"]).and_then(|d| known_decision(&d)),
            reason: str_field(obj, &["reason"]),
        }),
        "analyze_complete" => ServerEvent::AnalyzeComplete {
            results: parse_classified_list(name, obj)?,
        },
        "analyze_error" => ServerEvent::AnalyzeError {
            error: str_field(obj, &["error"]).unwrap_or_else(|| "Unknown error".to_string()),
        },
        "ai_thinking" => ServerEvent::AiThinking {
            file: str_field(obj, &["file"]).filter(|f| !f.is_empty()),
            prompt: str_field(obj, &["prompt"]),
        },
        "ai_result" => ServerEvent::AiResult,
        "file_deleted" => ServerEvent::FileDeleted {
            path: str_field(obj, &["path"])
                .ok_or_else(|| CleanerError::event_parse(name, "missing path"))?,
        },
        "deletion_complete" => ServerEvent::DeletionComplete {
            deleted: u64_field(obj, &["deleted"]).unwrap_or(0),
            size_freed: str_field(obj, &["size_freed_h"]),
        },
        "log" => ServerEvent::Log {
            message: str_field(obj, &["msg", "message"])
                .ok_or_else(|| CleanerError::event_parse(name, "missing msg"))?,
            severity: Severity::from_wire(str_field(obj, &["type"]).as_deref()),
        },
        other => {
            return Err(CleanerError::event_parse(other, "unknown event"));
        }
    };

    Ok(event)
}

fn parse_scan_finished(name: &str, obj: &Map<String, Value>) -> Result<ScanFinished> {
    let files_value = field(obj, &["files", "candidates"])
        .ok_or_else(|| CleanerError::event_parse(name, "missing files"))?;
    let files = list(name, "files", files_value)?
        .iter()
        .filter_map(|item| parse_file(name, item))
        .collect::<Vec<_>>();

    let protected = match field(obj, &["protected"]) {
        Some(value) => list(name, "protected", value)?
            .iter()
            .filter_map(|item| {
                let file = parse_file(name, item)?;
                let keyword = item.as_object().and_then(|o| str_field(o, &["keyword"]));
                Some(ProtectedEntry { file, keyword })
            })
            .collect(),
        None => Vec::new(),
    };

    let count = u64_field(obj, &["count", "candidates_count"]).unwrap_or(files.len() as u64);
    let total_files = u64_field(obj, &["total_files"]).unwrap_or(count);

    let stats = field(obj, &["stats"])
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| lenient_u64(v).map(|n| (k.clone(), n)))
                .collect::<BTreeMap<_, _>>()
        })
        .unwrap_or_default();

    let selected_categories = field(obj, &["selected_categories"])
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        });

    Ok(ScanFinished {
        files,
        protected,
        total_files,
        count,
        stats,
        selected_categories,
        cancelled: field(obj, &["cancelled"])
            .and_then(Value::as_bool)
            .unwrap_or(false),
    })
}

fn parse_classified_list(name: &str, obj: &Map<String, Value>) -> Result<Vec<ClassifiedEntry>> {
    let value = field(obj, &["results"])
        .ok_or_else(|| CleanerError::event_parse(name, "missing results"))?;
    Ok(list(name, "results", value)?
        .iter()
        .filter_map(|item| {
            let file = parse_file(name, item)?;
            let entry = item.as_object()?;
            Some(ClassifiedEntry {
                file,
                decision: Decision::from_wire(str_field(entry, &["decision"]).as_deref()),
                reason: str_field(entry, &["reason"]).unwrap_or_default(),
                size_label: str_field(entry, &["size_h"]),
                importance: str_field(entry, &["importance"]),
            })
        })
        .collect())
}

/// Parse one file object; entries without a path are skipped with a warning
fn parse_file(event: &str, value: &Value) -> Option<FileEntry> {
    let Some(obj) = value.as_object() else {
        log::warn!("{event}: skipping non-object file entry");
        return None;
    };
    let Some(path) = str_field(obj, &["file", "path"]).filter(|p| !p.is_empty()) else {
        log::warn!("{event}: skipping file entry without a path");
        return None;
    };
    let display_name = str_field(obj, &["name"])
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| base_name(&path).to_string());
    Some(FileEntry {
        display_name,
        size_bytes: u64_field(obj, &["size", "size_bytes"]).unwrap_or(0),
        category: str_field(obj, &["category"]).and_then(|c| FileCategory::from_wire(&c)),
        age_days: u64_field(obj, &["age_days", "age"]),
        path,
    })
}

fn known_decision(raw: &str) -> Option<Decision> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "DELETE" => Some(Decision::Delete),
        "KEEP" => Some(Decision::Keep),
        "REVIEW" => Some(Decision::Review),
        _ => None,
    }
}

// ============================================================================
// Field helpers
// ============================================================================

fn field<'a>(obj: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|name| obj.get(*name))
        .find(|value| !value.is_null())
}

fn str_field(obj: &Map<String, Value>, names: &[&str]) -> Option<String> {
    field(obj, names).and_then(|value| match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn u64_field(obj: &Map<String, Value>, names: &[&str]) -> Option<u64> {
    field(obj, names).and_then(lenient_u64)
}

/// Accept integers, non-negative floats and numeric strings
fn lenient_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn list<'a>(event: &str, what: &str, value: &'a Value) -> Result<&'a Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| CleanerError::event_parse(event, format!("{what} is not an array")))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
