//! Request and response bodies of the backend HTTP API

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Common shape of every response: `ok` plus an optional message
pub trait Acknowledged {
    /// Whether the backend accepted the request
    fn ok(&self) -> bool;

    /// Backend-provided failure message
    fn error(&self) -> Option<&str>;
}

macro_rules! acknowledged {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Acknowledged for $ty {
                fn ok(&self) -> bool {
                    self.ok
                }

                fn error(&self) -> Option<&str> {
                    self.error.as_deref()
                }
            }
        )*
    };
}

// ============================================================================
// Requests
// ============================================================================

/// Body of `POST /api/select_folder`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectFolderRequest {
    /// Ask the backend for the platform folder picker
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub use_native: bool,
}

/// Body of `POST /api/scan`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanRequest {
    /// Folder to scan
    pub path: String,
    /// Backend category names to include
    pub categories: Vec<String>,
    /// Ignore files modified more recently than this
    pub min_age_days: u32,
    /// Ignore files smaller than this
    pub min_size_mb: f64,
}

/// Body of `POST /api/analyze`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyzeRequest {
    /// Candidate paths, already truncated to `max_files`
    pub paths: Vec<String>,
    /// Model identifier
    pub model: String,
    /// Upper bound the backend should honor as well
    pub max_files: u32,
}

/// Body of `POST /api/delete`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteRequest {
    /// Paths to remove
    pub files: Vec<String>,
    /// Dry run
    pub simulate: bool,
}

/// Body of `POST /api/delete_by_category`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryDeleteRequest {
    /// Backend category names
    pub categories: Vec<String>,
}

// ============================================================================
// Responses
// ============================================================================

/// Response of `POST /api/select_folder`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SelectFolderResponse {
    /// Accepted
    pub ok: bool,
    /// Chosen folder
    pub path: Option<String>,
    /// Failure message
    pub error: Option<String>,
    /// Non-fatal remark about the folder
    pub warning: Option<String>,
}

/// Response of `POST /api/scan`, `POST /api/analyze` and `POST /api/stop`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StartResponse {
    /// Accepted
    pub ok: bool,
    /// Files the backend will process
    pub count: Option<u64>,
    /// Informational message
    pub message: Option<String>,
    /// Failure message
    pub error: Option<String>,
}

/// Deletion failures, reported either as a count or as a list
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DeleteErrors {
    /// Number of failed files
    Count(u64),
    /// One entry per failed file
    List(Vec<Value>),
}

impl Default for DeleteErrors {
    fn default() -> Self {
        Self::Count(0)
    }
}

impl DeleteErrors {
    /// Number of failed files
    #[must_use]
    pub fn count(&self) -> u64 {
        match self {
            Self::Count(n) => *n,
            Self::List(items) => items.len() as u64,
        }
    }
}

/// Response of `POST /api/delete` and `POST /api/delete_by_category`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DeleteResponse {
    /// Accepted
    pub ok: bool,
    /// Files removed
    pub deleted: u64,
    /// Space freed, human readable
    pub size_freed_h: Option<String>,
    /// Files that could not be removed
    pub errors: DeleteErrors,
    /// Paths actually removed, when the backend echoes them
    pub deleted_paths: Option<Vec<String>>,
    /// Failure message
    pub error: Option<String>,
}

/// Response of `GET /api/ai_status`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AiStatusResponse {
    /// Model is reachable
    pub ok: bool,
    /// Model server address
    pub ollama_url: Option<String>,
    /// Failure message
    pub error: Option<String>,
}

acknowledged!(
    SelectFolderResponse,
    StartResponse,
    DeleteResponse,
    AiStatusResponse,
);
