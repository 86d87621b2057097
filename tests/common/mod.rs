//! Shared fixtures: a scripted in-process gateway

#![allow(dead_code)]

use ai_cleaner_client::api::{
    AiStatusResponse, AnalyzeRequest, ApiGateway, CategoryDeleteRequest, DeleteRequest,
    DeleteResponse, ScanRequest, SelectFolderRequest, SelectFolderResponse, StartResponse,
};
use ai_cleaner_client::{CleanerClient, CleanerError, Result, Session};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// A request the fake received
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    SelectFolder(bool),
    Scan(ScanRequest),
    Analyze(AnalyzeRequest),
    Stop,
    Delete(DeleteRequest),
    DeleteByCategory(CategoryDeleteRequest),
    AiStatus(String),
}

/// Gateway answering from scripted values
#[derive(Default)]
pub struct FakeGateway {
    pub calls: Mutex<Vec<Call>>,
    pub hang_scan: AtomicBool,
    pub fail_scan: Mutex<Option<CleanerError>>,
    pub fail_analyze: Mutex<Option<CleanerError>>,
    pub fail_stop: Mutex<Option<CleanerError>>,
    pub folder: Mutex<Option<SelectFolderResponse>>,
    pub delete_response: Mutex<Option<DeleteResponse>>,
}

impl FakeGateway {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }

    fn deleted(&self, attempted: usize) -> DeleteResponse {
        self.delete_response
            .lock()
            .clone()
            .unwrap_or_else(|| DeleteResponse {
                ok: true,
                deleted: attempted as u64,
                size_freed_h: Some("2.0KB".into()),
                ..DeleteResponse::default()
            })
    }
}

fn accepted() -> StartResponse {
    StartResponse {
        ok: true,
        ..StartResponse::default()
    }
}

impl ApiGateway for FakeGateway {
    async fn select_folder(&self, request: SelectFolderRequest) -> Result<SelectFolderResponse> {
        self.record(Call::SelectFolder(request.use_native));
        self.folder
            .lock()
            .clone()
            .ok_or_else(|| CleanerError::backend("Picker closed"))
    }

    async fn scan(&self, request: ScanRequest) -> Result<StartResponse> {
        self.record(Call::Scan(request));
        if self.hang_scan.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        match self.fail_scan.lock().take() {
            Some(e) => Err(e),
            None => Ok(accepted()),
        }
    }

    async fn analyze(&self, request: AnalyzeRequest) -> Result<StartResponse> {
        let count = request.paths.len() as u64;
        self.record(Call::Analyze(request));
        match self.fail_analyze.lock().take() {
            Some(e) => Err(e),
            None => Ok(StartResponse {
                count: Some(count),
                ..accepted()
            }),
        }
    }

    async fn stop(&self) -> Result<StartResponse> {
        self.record(Call::Stop);
        match self.fail_stop.lock().take() {
            Some(e) => Err(e),
            None => Ok(accepted()),
        }
    }

    async fn delete(&self, request: DeleteRequest) -> Result<DeleteResponse> {
        let attempted = request.files.len();
        self.record(Call::Delete(request));
        Ok(self.deleted(attempted))
    }

    async fn delete_by_category(&self, request: CategoryDeleteRequest) -> Result<DeleteResponse> {
        self.record(Call::DeleteByCategory(request));
        Ok(self.deleted(0))
    }

    async fn ai_status(&self, model: &str) -> Result<AiStatusResponse> {
        self.record(Call::AiStatus(model.to_string()));
        Ok(AiStatusResponse {
            ok: true,
            ollama_url: Some("http://127.0.0.1:11434".into()),
            error: None,
        })
    }
}

/// Client over a fresh fake and an in-memory session
pub fn client() -> CleanerClient<FakeGateway> {
    let _ = env_logger::builder().is_test(true).try_init();
    CleanerClient::new(FakeGateway::default(), Session::in_memory(1000))
}
