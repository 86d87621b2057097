//! `reqwest` implementation of [`ApiGateway`]

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use crate::error::{CleanerError, Result};
use crate::types::options::ClientOptions;

use super::types::Acknowledged;
use super::{
    AiStatusResponse, AnalyzeRequest, ApiGateway, BaseUrl, CategoryDeleteRequest, DeleteRequest,
    DeleteResponse, ScanRequest, SelectFolderRequest, SelectFolderResponse, StartResponse,
};

/// HTTP gateway to the backend
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: BaseUrl,
}

impl HttpGateway {
    /// Create a gateway with a per-request timeout
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built
    pub fn new(base_url: BaseUrl, request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(Self { client, base_url })
    }

    /// Create a gateway from client options
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built
    pub fn from_options(options: &ClientOptions) -> Result<Self> {
        Self::new(options.base_url.clone(), options.request_timeout)
    }

    /// Backend base URL
    #[must_use]
    pub fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned + Acknowledged,
    {
        let url = self.base_url.url(path);
        log::debug!("POST {url}");
        let response = self.client.post(&url).json(body).send().await?;
        decode(response).await
    }

    async fn get<T>(&self, path: &str, query: &[(&str, &str)]) -> Result<T>
    where
        T: DeserializeOwned + Acknowledged,
    {
        let url = self.base_url.url(path);
        log::debug!("GET {url}");
        let response = self.client.get(&url).query(query).send().await?;
        decode(response).await
    }
}

/// Decode a response body, mapping rejections to errors
///
/// The backend answers refused requests with a 4xx/5xx status and a JSON
/// `error`; that message wins over the bare status line.
async fn decode<T>(response: reqwest::Response) -> Result<T>
where
    T: DeserializeOwned + Acknowledged,
{
    let status = response.status();
    let url = response.url().to_string();
    let bytes = response.bytes().await?;

    if !status.is_success() {
        let message = serde_json::from_slice::<Value>(&bytes).ok().and_then(|value| {
            ["error", "message"]
                .iter()
                .find_map(|key| value.get(*key).and_then(Value::as_str).map(str::to_string))
        });
        return Err(match message {
            Some(message) => CleanerError::backend(message),
            None => CleanerError::transport(format!("HTTP {} on {url}", status.as_u16())),
        });
    }

    let body: T = serde_json::from_slice(&bytes)
        .map_err(|e| CleanerError::transport(format!("Malformed response from {url}: {e}")))?;
    if body.ok() {
        Ok(body)
    } else {
        Err(CleanerError::backend(
            body.error().unwrap_or("Unknown error").to_string(),
        ))
    }
}

impl ApiGateway for HttpGateway {
    async fn select_folder(&self, request: SelectFolderRequest) -> Result<SelectFolderResponse> {
        self.post("/api/select_folder", &request).await
    }

    async fn scan(&self, request: ScanRequest) -> Result<StartResponse> {
        self.post("/api/scan", &request).await
    }

    async fn analyze(&self, request: AnalyzeRequest) -> Result<StartResponse> {
        self.post("/api/analyze", &request).await
    }

    async fn stop(&self) -> Result<StartResponse> {
        self.post("/api/stop", &serde_json::json!({})).await
    }

    async fn delete(&self, request: DeleteRequest) -> Result<DeleteResponse> {
        self.post("/api/delete", &request).await
    }

    async fn delete_by_category(&self, request: CategoryDeleteRequest) -> Result<DeleteResponse> {
        self.post("/api/delete_by_category", &request).await
    }

    async fn ai_status(&self, model: &str) -> Result<AiStatusResponse> {
        self.get("/api/ai_status", &[("model", model)]).await
    }
}
