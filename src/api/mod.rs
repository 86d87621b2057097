//! API gateway for the cleanup backend
//!
//! [`ApiGateway`] is the request/response seam of the client: the dispatcher
//! only talks to the backend through it, which lets tests substitute a fake.
//! [`HttpGateway`] is the production implementation over `reqwest`.
//!
//! Every method resolves to the decoded response of an accepted request. A
//! response with `ok: false` is turned into `CleanerError::Backend` carrying
//! the server's message, so callers never inspect `ok` themselves.

mod http;
pub mod types;

use std::fmt;
use std::future::Future;

use crate::error::Result;

pub use http::HttpGateway;
pub use types::{
    AiStatusResponse, AnalyzeRequest, CategoryDeleteRequest, DeleteErrors, DeleteRequest,
    DeleteResponse, ScanRequest, SelectFolderRequest, SelectFolderResponse, StartResponse,
};

/// Backend address used when none is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Backend base URL without a trailing slash
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BaseUrl(String);

impl Default for BaseUrl {
    fn default() -> Self {
        Self(DEFAULT_BASE_URL.to_string())
    }
}

impl BaseUrl {
    /// Derive the base URL from the hosting origin
    ///
    /// An `http`/`https` origin is used as is (minus trailing slashes);
    /// anything else falls back to [`DEFAULT_BASE_URL`].
    ///
    /// # Example
    ///
    /// ```
    /// use ai_cleaner_client::api::BaseUrl;
    ///
    /// assert_eq!(BaseUrl::resolve(Some("http://10.0.0.2:8080/")).as_str(), "http://10.0.0.2:8080");
    /// assert_eq!(BaseUrl::resolve(Some("file:///index.html")).as_str(), "http://localhost:5000");
    /// assert_eq!(BaseUrl::resolve(None).as_str(), "http://localhost:5000");
    /// ```
    #[must_use]
    pub fn resolve(origin: Option<&str>) -> Self {
        match origin.map(str::trim) {
            Some(origin) if origin.starts_with("http") => {
                Self(origin.trim_end_matches('/').to_string())
            }
            _ => Self::default(),
        }
    }

    /// The base URL
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Absolute URL of `path`, with or without a leading slash
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.0)
        } else {
            format!("{}/{path}", self.0)
        }
    }
}

impl fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Request/response calls to the backend
pub trait ApiGateway: Send + Sync + 'static {
    /// `POST /api/select_folder`
    ///
    /// # Errors
    /// Returns error on transport failure or when the backend rejects the request
    fn select_folder(
        &self,
        request: SelectFolderRequest,
    ) -> impl Future<Output = Result<SelectFolderResponse>> + Send;

    /// `POST /api/scan`
    ///
    /// # Errors
    /// Returns error on transport failure or when the backend rejects the request
    fn scan(&self, request: ScanRequest) -> impl Future<Output = Result<StartResponse>> + Send;

    /// `POST /api/analyze`
    ///
    /// # Errors
    /// Returns error on transport failure or when the backend rejects the request
    fn analyze(&self, request: AnalyzeRequest)
    -> impl Future<Output = Result<StartResponse>> + Send;

    /// `POST /api/stop`
    ///
    /// # Errors
    /// Returns error on transport failure or when the backend rejects the request
    fn stop(&self) -> impl Future<Output = Result<StartResponse>> + Send;

    /// `POST /api/delete`
    ///
    /// # Errors
    /// Returns error on transport failure or when the backend rejects the request
    fn delete(&self, request: DeleteRequest) -> impl Future<Output = Result<DeleteResponse>> + Send;

    /// `POST /api/delete_by_category`
    ///
    /// # Errors
    /// Returns error on transport failure or when the backend rejects the request
    fn delete_by_category(
        &self,
        request: CategoryDeleteRequest,
    ) -> impl Future<Output = Result<DeleteResponse>> + Send;

    /// `GET /api/ai_status?model=`
    ///
    /// # Errors
    /// Returns error on transport failure or when the model is not ready
    fn ai_status(&self, model: &str) -> impl Future<Output = Result<AiStatusResponse>> + Send;
}
