//! Per-asset upload executors
//!
//! Both executors resolve ordinary failures (network, GraphQL, transfer,
//! ingestion) into a failure [`UploadOutcome`]. Only a missing element id
//! after creation is returned as an error.

pub mod by_url;
pub mod from_local;
pub mod ingestion;
pub mod report;

pub use by_url::upload_by_url;
pub use from_local::{sanitize_error_message, upload_from_local};
pub use ingestion::{await_ingestion, IngestionStatus};
pub use report::UploadReport;

use crate::api::types::Point;
use crate::api::Transport;
use crate::assets::{AssetDescriptor, AssetKind, Dimensions};
use crate::config::{IngestionPolicy, UploadMethod};
use crate::error::UploadError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadResult {
    Success,
    Failure,
}

/// Terminal result of one asset's upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadOutcome {
    pub asset_kind: AssetKind,

    /// Created element (by URL) or upload id (from local), when creation got that far
    pub element_id: Option<String>,

    pub result: UploadResult,

    /// URL or local path of the asset
    pub asset_path: String,

    /// Reason of a failure, as reported by the platform when available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl UploadOutcome {
    pub fn success(asset: &AssetDescriptor, element_id: impl Into<String>) -> Self {
        Self {
            asset_kind: asset.kind,
            element_id: Some(element_id.into()),
            result: UploadResult::Success,
            asset_path: asset.location.clone(),
            error_message: None,
        }
    }

    pub fn failure(
        asset: &AssetDescriptor,
        element_id: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            asset_kind: asset.kind,
            element_id,
            result: UploadResult::Failure,
            asset_path: asset.location.clone(),
            error_message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.result == UploadResult::Success
    }
}

/// One asset ready to upload: probed and placed in absolute workspace coordinates
#[derive(Debug, Clone)]
pub struct AssetUpload {
    pub asset: AssetDescriptor,
    pub dimensions: Dimensions,
    pub position: Point,
}

/// Run the executor matching `method`
pub async fn upload_asset(
    transport: &dyn Transport,
    workspace_id: &str,
    upload: &AssetUpload,
    method: UploadMethod,
    ingestion: &IngestionPolicy,
) -> Result<UploadOutcome, UploadError> {
    match method {
        UploadMethod::Url => upload_by_url(transport, workspace_id, upload, ingestion).await,
        UploadMethod::Local => upload_from_local(transport, workspace_id, upload).await,
    }
}
