//! Layout Orchestrator
//!
//! ## Pipeline
//!
//! ```text
//! grid size → probe all assets → max dimensions → cell positions → canvas size
//!   → findAvailableArea → createCanvas → upload every asset at canvas origin + cell
//! ```
//!
//! Probing and canvas setup are batch-wide: any error aborts the run. Uploads
//! are isolated per asset and always resolve to an outcome.

use super::grid::{place_in_cell, FlowCursor, GridLayout};
use crate::api::types::{Point, Rect, Size};
use crate::api::{fetch_canvas, queries, Transport};
use crate::assets::{AssetDescriptor, DimensionProber, Dimensions};
use crate::config::{LayoutConfig, UploadMethod};
use crate::error::{ApiError, ConfigError, LayoutError};
use crate::upload::{upload_asset, AssetUpload, UploadOutcome};
use futures::future::try_join_all;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::sync::Arc;

/// Places a batch of assets on a canvas and uploads them
pub struct LayoutOrchestrator {
    transport: Arc<dyn Transport>,
    http: Client,
}

impl LayoutOrchestrator {
    /// `http` is used for remote image header fetches only
    pub fn new(transport: Arc<dyn Transport>, http: Client) -> Self {
        Self { transport, http }
    }

    /// Create a canvas sized for `assets` in a grid and upload them into it
    ///
    /// Outcomes are returned in input order.
    pub async fn layout(
        &self,
        assets: &[AssetDescriptor],
        config: &LayoutConfig,
    ) -> Result<Vec<UploadOutcome>, LayoutError> {
        config.validate()?;
        let grid = GridLayout::for_count(assets.len()).ok_or(ConfigError::EmptyAssetList)?;

        tracing::info!("Number of assets to upload: {}", assets.len());
        tracing::info!(
            "Grid to use to upload the assets: {} columns x {} rows",
            grid.columns,
            grid.rows
        );

        let dimensions = self.probe_all(assets, config).await?;
        let cell_size = Dimensions::max_of(&dimensions).ok_or(ConfigError::EmptyAssetList)?;

        let relative: Vec<Point> = dimensions
            .iter()
            .enumerate()
            .map(|(index, dims)| {
                place_in_cell(
                    *dims,
                    grid.cell_at(index),
                    cell_size,
                    config.vertical_alignment,
                    config.spacing,
                )
            })
            .collect();

        let canvas_size = grid.canvas_size(cell_size, config.spacing);
        let origin = self.find_available_area(config, canvas_size).await?;
        tracing::info!(
            "Available area for canvas found at: ({},{})",
            origin.x,
            origin.y
        );

        let canvas_id = self.create_canvas(config, origin, canvas_size).await?;
        tracing::info!(canvas_id = %canvas_id, "Canvas \"{}\" created", config.canvas_name);

        let uploads: Vec<AssetUpload> = assets
            .iter()
            .zip(dimensions)
            .zip(relative)
            .map(|((asset, dimensions), position)| AssetUpload {
                asset: asset.clone(),
                dimensions,
                position: position.offset_by(origin),
            })
            .collect();

        Ok(self.upload_all(&uploads, config).await)
    }

    /// Upload `assets` left to right into an existing canvas, growing it downward as needed
    ///
    /// Assets wider than the canvas are scaled down, keeping their aspect ratio.
    pub async fn layout_into_canvas(
        &self,
        assets: &[AssetDescriptor],
        canvas_id: &str,
        config: &LayoutConfig,
    ) -> Result<Vec<UploadOutcome>, LayoutError> {
        if config.workspace_id.trim().is_empty() {
            return Err(ConfigError::MissingArgument("workspaceId").into());
        }
        if assets.is_empty() {
            return Err(ConfigError::EmptyAssetList.into());
        }

        let canvas = fetch_canvas(self.transport.as_ref(), &config.workspace_id, canvas_id).await?;
        let bounds = canvas.bounding_box.ok_or_else(|| {
            ApiError::UnexpectedResponse(format!("canvas {} has no bounding box", canvas_id))
        })?;

        let dimensions = self.probe_all(assets, config).await?;

        let mut cursor = FlowCursor::new(
            Size {
                width: bounds.width,
                height: bounds.height,
            },
            config.spacing,
        );
        let uploads: Vec<AssetUpload> = assets
            .iter()
            .zip(dimensions)
            .map(|(asset, dims)| {
                let dimensions = dims.fit_to_width(cursor.inner_width());
                let position = cursor.place(dimensions).offset_by(bounds.origin());
                AssetUpload {
                    asset: asset.clone(),
                    dimensions,
                    position,
                }
            })
            .collect();

        if cursor.canvas_height() > bounds.height {
            let size = Size {
                width: bounds.width,
                height: cursor.canvas_height(),
            };
            self.transport
                .run_query(queries::resize_canvas(&config.workspace_id, canvas_id, size))
                .await?;
            tracing::info!(canvas_id, "Canvas height extended to {}", size.height);
        }

        Ok(self.upload_all(&uploads, config).await)
    }

    /// Probe every asset concurrently; the first error aborts the batch
    async fn probe_all(
        &self,
        assets: &[AssetDescriptor],
        config: &LayoutConfig,
    ) -> Result<Vec<Dimensions>, LayoutError> {
        let prober = DimensionProber::from_config(self.http.clone(), config);
        let method = config.upload_method;
        let dimensions = try_join_all(assets.iter().map(|asset| prober.probe(asset, method))).await?;
        Ok(dimensions)
    }

    async fn find_available_area(
        &self,
        config: &LayoutConfig,
        size: Size,
    ) -> Result<Point, LayoutError> {
        let proposed = Rect::new(config.canvas_origin, size);
        let data = self
            .transport
            .run_query(queries::find_available_area(
                &config.workspace_id,
                proposed,
                config.direction,
            ))
            .await?;

        match data.get("findAvailableArea") {
            Some(area) if !area.is_null() => {
                let area: Rect = serde_json::from_value(area.clone()).map_err(|e| {
                    ApiError::UnexpectedResponse(format!("findAvailableArea: {}", e))
                })?;
                Ok(area.origin())
            }
            _ => Err(LayoutError::NoAvailableArea),
        }
    }

    async fn create_canvas(
        &self,
        config: &LayoutConfig,
        origin: Point,
        size: Size,
    ) -> Result<String, LayoutError> {
        let data = self
            .transport
            .run_query(queries::create_canvas(
                &config.workspace_id,
                &config.canvas_name,
                origin,
                size,
            ))
            .await?;

        data.get("createCanvas")
            .and_then(|c| c.get("id"))
            .and_then(|id| id.as_str())
            .map(str::to_string)
            .ok_or(LayoutError::CanvasCreationFailed)
    }

    /// Upload concurrently, keeping input order; never fails the batch
    async fn upload_all(&self, uploads: &[AssetUpload], config: &LayoutConfig) -> Vec<UploadOutcome> {
        let limit = config
            .max_concurrent_uploads
            .unwrap_or(uploads.len())
            .max(1);
        let transport = self.transport.as_ref();
        let method: UploadMethod = config.upload_method;

        let outcomes: Vec<UploadOutcome> = stream::iter(uploads.iter().map(|upload| async move {
            match upload_asset(
                transport,
                &config.workspace_id,
                upload,
                method,
                &config.ingestion,
            )
            .await
            {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!(asset = %upload.asset.location, "Upload aborted: {}", e);
                    UploadOutcome::failure(&upload.asset, None, e.to_string())
                }
            }
        }))
        .buffered(limit)
        .collect()
        .await;

        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        tracing::info!(
            "Uploads finished: {} succeeded, {} failed",
            succeeded,
            outcomes.len() - succeeded
        );
        outcomes
    }
}
