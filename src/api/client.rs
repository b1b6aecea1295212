//! reqwest-backed Bluescape transport
//!
//! - GraphQL over HTTPS with a bearer token
//! - Retry with exponential backoff, policy fixed at construction
//! - Streamed multipart uploads to signed destinations

use super::types::{GraphQlError, GraphqlRequest, TransferResponse, UploadTarget};
use super::Transport;
use crate::config::ApiConfig;
use crate::error::ApiError;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

/// Shared client for the GraphQL endpoint and signed uploads
///
/// Cheap to clone; clones share the connection pool and the retry policy.
#[derive(Clone)]
pub struct BluescapeClient {
    client: Client,
    config: ApiConfig,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    #[serde(default)]
    data: Option<Value>,

    #[serde(default)]
    errors: Option<Vec<GraphQlError>>,
}

impl BluescapeClient {
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .pool_max_idle_per_host(20)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .tcp_nodelay(true)
            .build()?;

        let endpoint = config.graphql_url();
        Ok(Self {
            client,
            config,
            endpoint,
        })
    }

    /// Underlying HTTP client, reused for remote image header fetches
    pub fn http_client(&self) -> Client {
        self.client.clone()
    }

    /// Send request with retry logic
    async fn send_request(&self, request: &GraphqlRequest) -> Result<Value, ApiError> {
        let policy = &self.config.retry;
        let is_mutation = request.is_mutation();
        let operation = request.operation_name().unwrap_or("anonymous");

        let mut attempt = 0;
        loop {
            match self.send_once(request).await {
                Ok(data) => return Ok(data),
                Err(e) if attempt < policy.max_retries && policy.should_retry(&e, is_mutation) => {
                    attempt += 1;
                    let delay = policy.delay_for(attempt);
                    tracing::warn!(
                        operation,
                        "Request failed ({}), retry {}/{} in {:?}",
                        e,
                        attempt,
                        policy.max_retries,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    if attempt > 0 {
                        tracing::error!(operation, "Request failed after {} retries: {}", attempt, e);
                    }
                    return Err(e);
                }
            }
        }
    }

    async fn send_once(&self, request: &GraphqlRequest) -> Result<Value, ApiError> {
        let mut builder = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.config.token)
            .json(request);
        if let Some(timeout) = request.timeout.or(self.config.request_timeout) {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        let parsed: Option<GraphqlResponse> = serde_json::from_str(&body).ok();

        if !status.is_success() {
            return Err(match parsed.and_then(|p| p.errors).filter(|e| !e.is_empty()) {
                Some(errors) => ApiError::GraphQl(errors),
                None => ApiError::Status {
                    status: status.as_u16(),
                    body,
                },
            });
        }

        let parsed = parsed.ok_or_else(|| {
            ApiError::UnexpectedResponse(format!("response body is not GraphQL JSON: {}", body))
        })?;
        let errors = parsed.errors.unwrap_or_default();

        match parsed.data {
            Some(data) if !data.is_null() => {
                if !errors.is_empty() {
                    tracing::warn!(
                        operation = request.operation_name().unwrap_or("anonymous"),
                        "Partial GraphQL response: {}",
                        ApiError::GraphQl(errors)
                    );
                }
                Ok(data)
            }
            _ if !errors.is_empty() => Err(ApiError::GraphQl(errors)),
            _ => Err(ApiError::UnexpectedResponse(
                "response carries neither data nor errors".to_string(),
            )),
        }
    }
}

#[async_trait]
impl Transport for BluescapeClient {
    async fn run_query(&self, request: GraphqlRequest) -> Result<Value, ApiError> {
        self.send_request(&request).await
    }

    async fn post_signed_upload(
        &self,
        target: &UploadTarget,
        file: &Path,
    ) -> Result<TransferResponse, ApiError> {
        let mut form = Form::new();
        for (name, value) in &target.fields {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            form = form.text(name.clone(), value);
        }

        // File part goes last, after every signed field
        let handle = tokio::fs::File::open(file).await?;
        let length = handle.metadata().await?.len();
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());
        let mime = mime_guess::from_path(file).first_or_octet_stream();

        let part = Part::stream_with_length(Body::from(handle), length)
            .file_name(file_name)
            .mime_str(mime.as_ref())?;
        form = form.part("file", part);

        let response = self.client.post(&target.url).multipart(form).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Ok(TransferResponse { status, body })
    }
}
