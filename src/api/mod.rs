//! Bluescape API access
//!
//! Everything that leaves the process goes through [`Transport`]: GraphQL
//! documents and the multipart POST to a signed upload destination.

mod client;
#[cfg(test)]
pub mod mock;
pub mod queries;
pub mod types;
pub mod workspace;

pub use client::BluescapeClient;
pub use types::*;
pub use workspace::{fetch_canvas, fetch_workspace};

use crate::error::ApiError;
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute a GraphQL document and return its `data` object
    async fn run_query(&self, request: GraphqlRequest) -> Result<Value, ApiError>;

    /// POST `file` to a signed destination, preceded by the target's form fields
    async fn post_signed_upload(
        &self,
        target: &UploadTarget,
        file: &Path,
    ) -> Result<TransferResponse, ApiError>;
}
