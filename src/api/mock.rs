//! In-memory transport for tests
//!
//! Requests are routed by GraphQL operation name to per-test handlers and
//! recorded in order.

use super::types::{GraphqlRequest, TransferResponse, UploadTarget};
use super::Transport;
use crate::error::ApiError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

type QueryHandler = Box<dyn Fn(&GraphqlRequest) -> Result<Value, ApiError> + Send + Sync>;
type TransferHandler =
    Box<dyn Fn(&UploadTarget, &Path) -> Result<TransferResponse, ApiError> + Send + Sync>;

pub struct MockTransport {
    handlers: HashMap<String, QueryHandler>,
    transfer: TransferHandler,
    requests: Mutex<Vec<GraphqlRequest>>,
    transfers: Mutex<Vec<(String, PathBuf)>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
            transfer: Box::new(|_, _| {
                Ok(TransferResponse {
                    status: 204,
                    body: String::new(),
                })
            }),
            requests: Mutex::new(Vec::new()),
            transfers: Mutex::new(Vec::new()),
        }
    }

    /// Answer every request named `operation` with `handler`
    pub fn on<F>(mut self, operation: &str, handler: F) -> Self
    where
        F: Fn(&GraphqlRequest) -> Result<Value, ApiError> + Send + Sync + 'static,
    {
        self.handlers.insert(operation.to_string(), Box::new(handler));
        self
    }

    pub fn on_transfer<F>(mut self, handler: F) -> Self
    where
        F: Fn(&UploadTarget, &Path) -> Result<TransferResponse, ApiError> + Send + Sync + 'static,
    {
        self.transfer = Box::new(handler);
        self
    }

    pub fn requests(&self) -> Vec<GraphqlRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_for(&self, operation: &str) -> Vec<GraphqlRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.operation_name() == Some(operation))
            .collect()
    }

    pub fn count(&self, operation: &str) -> usize {
        self.requests_for(operation).len()
    }

    /// `(upload id, file)` of every signed transfer
    pub fn transfers(&self) -> Vec<(String, PathBuf)> {
        self.transfers.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn run_query(&self, request: GraphqlRequest) -> Result<Value, ApiError> {
        self.requests.lock().unwrap().push(request.clone());
        let operation = request.operation_name().unwrap_or_default().to_string();
        match self.handlers.get(&operation) {
            Some(handler) => handler(&request),
            None => Err(ApiError::UnexpectedResponse(format!(
                "no mock handler for operation '{}'",
                operation
            ))),
        }
    }

    async fn post_signed_upload(
        &self,
        target: &UploadTarget,
        file: &Path,
    ) -> Result<TransferResponse, ApiError> {
        self.transfers
            .lock()
            .unwrap()
            .push((target.upload_id.clone(), file.to_path_buf()));
        (self.transfer)(target, file)
    }
}
