//! Workspace and canvas lookups

use super::queries;
use super::types::{CanvasElement, Workspace};
use super::Transport;
use crate::error::ApiError;

pub async fn fetch_workspace(
    transport: &dyn Transport,
    workspace_id: &str,
) -> Result<Workspace, ApiError> {
    let data = transport.run_query(queries::workspace(workspace_id)).await?;
    match data.get("workspace") {
        Some(value) if !value.is_null() => serde_json::from_value(value.clone())
            .map_err(|e| ApiError::UnexpectedResponse(format!("workspace: {}", e))),
        _ => Err(ApiError::NotFound(format!("workspace \"{}\"", workspace_id))),
    }
}

/// The canvas `canvas_id`; exactly one match is required
pub async fn fetch_canvas(
    transport: &dyn Transport,
    workspace_id: &str,
    canvas_id: &str,
) -> Result<CanvasElement, ApiError> {
    let data = transport
        .run_query(queries::canvas(workspace_id, canvas_id))
        .await?;

    // Non-canvas elements with this id come back as empty objects
    let mut canvases: Vec<CanvasElement> = data
        .get("elements")
        .and_then(|e| e.as_array())
        .map(|elements| {
            elements
                .iter()
                .filter_map(|e| serde_json::from_value(e.clone()).ok())
                .collect()
        })
        .unwrap_or_default();

    if canvases.len() != 1 {
        return Err(ApiError::NotFound(format!(
            "there is no canvas with Id \"{}\" in workspace \"{}\"",
            canvas_id, workspace_id
        )));
    }
    Ok(canvases.remove(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::MockTransport;
    use serde_json::json;

    #[tokio::test]
    async fn test_fetch_workspace() {
        let transport = MockTransport::new().on("getWorkspace", |_| {
            Ok(json!({ "workspace": { "id": "ws-1", "name": "Planning" } }))
        });
        let workspace = fetch_workspace(&transport, "ws-1").await.unwrap();
        assert_eq!(workspace.name, "Planning");
        assert_eq!(transport.requests()[0].variables["workspaceId"], "ws-1");
    }

    #[tokio::test]
    async fn test_fetch_canvas_requires_single_match() {
        let transport = MockTransport::new().on("getCanvas", |_| {
            Ok(json!({ "elements": [
                { "id": "cv-1", "name": "Board", "boundingBox": { "x": 10, "y": 20, "width": 3000, "height": 2000 } }
            ] }))
        });
        let canvas = fetch_canvas(&transport, "ws-1", "cv-1").await.unwrap();
        assert_eq!(canvas.id, "cv-1");
        assert_eq!(canvas.bounding_box.unwrap().width, 3000);

        let empty = MockTransport::new().on("getCanvas", |_| Ok(json!({ "elements": [{}] })));
        assert!(matches!(
            fetch_canvas(&empty, "ws-1", "image-7").await,
            Err(ApiError::NotFound(_))
        ));
    }
}
