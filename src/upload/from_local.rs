//! Upload from the local drive
//!
//! 1. Create a placeholder element, receiving signed upload credentials
//! 2. Stream the file to the signed destination
//! 3. Link the placeholder to the upload, with the error when step 2 failed,
//!    so viewers see a cancelable error instead of a pending upload

use super::{AssetUpload, UploadOutcome};
use crate::api::types::UploadTarget;
use crate::api::{queries, Transport};
use crate::error::UploadError;
use std::path::Path;

const UNKNOWN_STATUS: &str = "Status code not returned";

pub async fn upload_from_local(
    transport: &dyn Transport,
    workspace_id: &str,
    upload: &AssetUpload,
) -> Result<UploadOutcome, UploadError> {
    let asset = &upload.asset;
    tracing::info!("Starting upload of: {}", asset.location);

    let request = queries::create_asset_placeholder(
        workspace_id,
        asset.kind,
        asset.title(),
        &asset.extension,
        upload.position,
        upload.dimensions,
    );
    let data = match transport.run_query(request).await {
        Ok(data) => data,
        Err(e) => {
            tracing::error!(asset = %asset.location, "Failure creating the placeholder: {}", e);
            return Ok(UploadOutcome::failure(asset, None, e.to_string()));
        }
    };

    let target: UploadTarget = data
        .get("newAsset")
        .and_then(|a| a.get("content"))
        .and_then(|c| serde_json::from_value(c.clone()).ok())
        .filter(|t: &UploadTarget| !t.upload_id.is_empty())
        .ok_or_else(|| UploadError::MissingElementId(asset.location.clone()))?;
    let upload_id = target.upload_id.clone();

    let failure = match transport
        .post_signed_upload(&target, Path::new(&asset.location))
        .await
    {
        Ok(response) if response.is_complete() => None,
        Ok(response) => {
            let message = if response.body.trim().is_empty() {
                format!("Response status: {}", response.status)
            } else {
                response.body
            };
            Some((response.status.to_string(), message))
        }
        Err(e) => Some((UNKNOWN_STATUS.to_string(), e.to_string())),
    };

    match failure {
        None => {
            link_upload(transport, workspace_id, &upload_id, None).await;
            tracing::info!("Upload successfully finished for {}", asset.location);
            Ok(UploadOutcome::success(asset, upload_id))
        }
        Some((code, message)) => {
            let message = sanitize_error_message(&message);
            tracing::error!(
                "Failure uploading {}. Error reported: {}",
                asset.location,
                message
            );
            link_upload(
                transport,
                workspace_id,
                &upload_id,
                Some((code.as_str(), message.as_str())),
            )
            .await;
            Ok(UploadOutcome::failure(asset, Some(upload_id), message))
        }
    }
}

/// Link the placeholder to its upload; failures are logged only
async fn link_upload(
    transport: &dyn Transport,
    workspace_id: &str,
    upload_id: &str,
    error: Option<(&str, &str)>,
) {
    match transport
        .run_query(queries::process_asset(workspace_id, upload_id, error))
        .await
    {
        Ok(data) if data.get("processAsset").and_then(|v| v.as_bool()) == Some(true) => {
            tracing::debug!(upload_id, "Placeholder linked to upload");
        }
        Ok(_) => {
            tracing::warn!(upload_id, "Error linking the upload to its placeholder");
        }
        Err(e) => {
            tracing::warn!(upload_id, "Error linking the upload to its placeholder: {}", e);
        }
    }
}

/// Make a message safe to embed in a GraphQL string literal
pub fn sanitize_error_message(message: &str) -> String {
    message
        .replace('"', "'")
        .replace('\\', "/")
        .replace(['\r', '\n'], "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockTransport;
    use crate::api::types::{Point, TransferResponse};
    use crate::assets::{AssetDescriptor, AssetKind, Dimensions};
    use crate::error::ApiError;
    use crate::upload::UploadResult;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    fn placeholder_answer() -> serde_json::Value {
        json!({ "newAsset": {
            "__typename": "CreateDocumentPayload",
            "content": {
                "uploadId": "up-1",
                "url": "https://bucket.example.com/",
                "fields": { "key": "k/1", "Policy": "p", "X-Amz-Signature": "sig" }
            },
            "document": { "id": "doc-1", "width": 1500, "height": 1500, "ingestionState": "transferring" }
        } })
    }

    fn document_upload(path: &Path) -> AssetUpload {
        AssetUpload {
            asset: AssetDescriptor::new(path.to_string_lossy(), AssetKind::Document, "pdf"),
            dimensions: Dimensions::new(1500, 1500),
            position: Point::new(100, 100),
        }
    }

    #[test]
    fn test_sanitize_error_message() {
        assert_eq!(
            sanitize_error_message("<Error>\n<Code>\"AccessDenied\"</Code>\r\n</Error>"),
            "<Error><Code>'AccessDenied'</Code></Error>"
        );
        assert_eq!(sanitize_error_message(r"C:\tmp"), "C:/tmp");
    }

    #[tokio::test]
    async fn test_successful_transfer_links_without_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        fs::write(&path, b"%PDF-1.4").unwrap();

        let transport = MockTransport::new()
            .on("createAssetPlaceholder", |_| Ok(placeholder_answer()))
            .on("linkUploadToZygote", |_| Ok(json!({ "processAsset": true })));

        let outcome = upload_from_local(&transport, "ws-1", &document_upload(&path))
            .await
            .unwrap();
        assert_eq!(outcome.result, UploadResult::Success);
        assert_eq!(outcome.element_id.as_deref(), Some("up-1"));

        assert_eq!(transport.transfers(), vec![("up-1".to_string(), path.clone())]);
        let link = &transport.requests_for("linkUploadToZygote")[0];
        assert!(!link.query.contains("errorCode"));
        assert_eq!(link.variables["uploadId"], "up-1");
    }

    #[tokio::test]
    async fn test_rejected_transfer_links_with_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        fs::write(&path, b"%PDF-1.4").unwrap();

        let transport = MockTransport::new()
            .on("createAssetPlaceholder", |_| Ok(placeholder_answer()))
            .on("linkUploadToZygote", |_| Ok(json!({ "processAsset": true })))
            .on_transfer(|_, _| {
                Ok(TransferResponse {
                    status: 403,
                    body: "<Code>\"AccessDenied\"</Code>\n".to_string(),
                })
            });

        let outcome = upload_from_local(&transport, "ws-1", &document_upload(&path))
            .await
            .unwrap();
        assert_eq!(outcome.result, UploadResult::Failure);

        let link = &transport.requests_for("linkUploadToZygote")[0];
        assert!(link
            .query
            .contains(r#"errorCode: "403", errorMessage: "<Code>'AccessDenied'</Code>""#));
    }

    #[tokio::test]
    async fn test_link_failure_does_not_change_outcome() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        fs::write(&path, b"%PDF-1.4").unwrap();

        let transport = MockTransport::new()
            .on("createAssetPlaceholder", |_| Ok(placeholder_answer()))
            .on("linkUploadToZygote", |_| {
                Err(ApiError::UnexpectedResponse("link refused".to_string()))
            });

        let outcome = upload_from_local(&transport, "ws-1", &document_upload(&path))
            .await
            .unwrap();
        assert_eq!(outcome.result, UploadResult::Success);
    }

    #[tokio::test]
    async fn test_transfer_error_uses_unknown_status() {
        let transport = MockTransport::new()
            .on("createAssetPlaceholder", |_| Ok(placeholder_answer()))
            .on("linkUploadToZygote", |_| Ok(json!({ "processAsset": true })))
            .on_transfer(|_, _| {
                Err(ApiError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "missing file",
                )))
            });

        let outcome = upload_from_local(&transport, "ws-1", &document_upload(Path::new("/nope.pdf")))
            .await
            .unwrap();
        assert_eq!(outcome.result, UploadResult::Failure);
        let link = &transport.requests_for("linkUploadToZygote")[0];
        assert!(link.query.contains("errorCode: \"Status code not returned\""));
    }

    #[tokio::test]
    async fn test_missing_upload_credentials_is_an_error() {
        let transport = MockTransport::new()
            .on("createAssetPlaceholder", |_| Ok(json!({ "newAsset": { "content": null } })));

        let result = upload_from_local(&transport, "ws-1", &document_upload(Path::new("/a.pdf"))).await;
        assert!(matches!(result, Err(UploadError::MissingElementId(_))));
        assert!(transport.transfers().is_empty());
    }
}
