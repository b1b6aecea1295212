//! Upload by URL: the platform fetches the asset itself
//!
//! create element → poll ingestion → outcome

use super::ingestion::{await_ingestion, IngestionStatus};
use super::{AssetUpload, UploadOutcome};
use crate::api::{queries, Transport};
use crate::config::IngestionPolicy;
use crate::error::UploadError;

const DEFAULT_FAILURE_MESSAGE: &str = "The object was not uploaded correctly";

pub async fn upload_by_url(
    transport: &dyn Transport,
    workspace_id: &str,
    upload: &AssetUpload,
    ingestion: &IngestionPolicy,
) -> Result<UploadOutcome, UploadError> {
    let asset = &upload.asset;
    tracing::info!("Starting upload of: {}", asset.location);

    let request = queries::create_asset_by_url(
        workspace_id,
        asset.kind,
        &asset.location,
        &asset.extension,
        upload.position,
        upload.dimensions,
    );
    let data = match transport.run_query(request).await {
        Ok(data) => data,
        Err(e) => {
            tracing::error!(asset = %asset.location, "Failure creating the asset: {}", e);
            return Ok(UploadOutcome::failure(asset, None, e.to_string()));
        }
    };

    let mutation = asset.kind.create_mutation();
    let element_id = data
        .get(mutation.mutation_name)
        .and_then(|m| m.get(mutation.result_field))
        .and_then(|r| r.get("id"))
        .and_then(|id| id.as_str())
        .ok_or_else(|| UploadError::MissingElementId(asset.location.clone()))?
        .to_string();

    match await_ingestion(transport, workspace_id, &element_id, ingestion).await {
        Ok(IngestionStatus::Succeeded) => {
            tracing::info!("Finished successful upload of {}", asset.location);
            Ok(UploadOutcome::success(asset, element_id))
        }
        Ok(IngestionStatus::Failed { message }) => {
            let message = message.unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string());
            tracing::error!(
                "Failure uploading this asset: {}. Error reported: {}",
                asset.location,
                message
            );
            Ok(UploadOutcome::failure(asset, Some(element_id), message))
        }
        Err(e) => {
            tracing::error!(
                "Failure uploading this asset: {}. Error reported: {}",
                asset.location,
                e
            );
            Ok(UploadOutcome::failure(asset, Some(element_id), e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockTransport;
    use crate::api::types::Point;
    use crate::assets::{AssetDescriptor, AssetKind, Dimensions};
    use crate::error::ApiError;
    use crate::upload::UploadResult;
    use serde_json::json;
    use std::time::Duration;

    fn image_upload() -> AssetUpload {
        AssetUpload {
            asset: AssetDescriptor::new("https://example.com/photo.png", AssetKind::Image, "png"),
            dimensions: Dimensions::new(640, 480),
            position: Point::new(1100, 2200),
        }
    }

    fn policy() -> IngestionPolicy {
        IngestionPolicy {
            poll_interval: Duration::from_millis(1),
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn test_successful_ingestion() {
        let transport = MockTransport::new()
            .on("createAssetByUrl", |_| {
                Ok(json!({ "createImage": { "__typename": "CreateImagePayload", "image": { "id": "img-1" } } }))
            })
            .on("getElementIngestionStatus", |_| {
                Ok(json!({ "elements": [{ "ingestionState": "complete_success", "traits": {} }] }))
            });

        let outcome = upload_by_url(&transport, "ws-1", &image_upload(), &policy())
            .await
            .unwrap();
        assert_eq!(outcome.result, UploadResult::Success);
        assert_eq!(outcome.element_id.as_deref(), Some("img-1"));

        let create = &transport.requests_for("createAssetByUrl")[0];
        assert_eq!(create.variables["input"]["transform"], json!({ "x": 1100, "y": 2200 }));
        assert_eq!(create.variables["input"]["imageFormat"], "png");
    }

    #[tokio::test]
    async fn test_reported_failure_keeps_platform_message() {
        let transport = MockTransport::new()
            .on("createAssetByUrl", |_| Ok(json!({ "createImage": { "image": { "id": "img-2" } } })))
            .on("getElementIngestionStatus", |_| {
                Ok(json!({ "elements": [{
                    "ingestionState": "complete_failure",
                    "traits": { "http://bluescape.dev/zygote/v1/ingestionState": {
                        "http://bluescape.dev/zygote/v1/ingestionState/errorMessage": "Unsupported image"
                    } }
                }] }))
            });

        let outcome = upload_by_url(&transport, "ws-1", &image_upload(), &policy())
            .await
            .unwrap();
        assert_eq!(outcome.result, UploadResult::Failure);
        assert_eq!(outcome.error_message.as_deref(), Some("Unsupported image"));
    }

    #[tokio::test]
    async fn test_creation_error_becomes_failure() {
        let transport = MockTransport::new().on("createAssetByUrl", |_| {
            Err(ApiError::Status {
                status: 500,
                body: "internal".to_string(),
            })
        });

        let outcome = upload_by_url(&transport, "ws-1", &image_upload(), &policy())
            .await
            .unwrap();
        assert_eq!(outcome.result, UploadResult::Failure);
        assert_eq!(outcome.element_id, None);
        assert_eq!(transport.count("getElementIngestionStatus"), 0);
    }

    #[tokio::test]
    async fn test_missing_element_id_is_an_error() {
        let transport = MockTransport::new()
            .on("createAssetByUrl", |_| Ok(json!({ "createImage": { "image": null } })));

        let result = upload_by_url(&transport, "ws-1", &image_upload(), &policy()).await;
        assert!(matches!(result, Err(UploadError::MissingElementId(_))));
    }
}
