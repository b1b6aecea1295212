//! GraphQL documents
//!
//! Field and type names are the platform's contract and must match exactly.
//! Builders return a ready-to-send [`GraphqlRequest`]; callers parse `data`.

use super::types::{GraphqlRequest, Point, Rect, Size};
use crate::assets::{AssetKind, Dimensions};
use crate::config::Direction;
use serde_json::json;

/// Trait key holding the nested ingestion state of an element
pub const INGESTION_STATE_TRAIT: &str = "http://bluescape.dev/zygote/v1/ingestionState";
/// Key of the error message inside [`INGESTION_STATE_TRAIT`]
pub const INGESTION_ERROR_MESSAGE_TRAIT: &str =
    "http://bluescape.dev/zygote/v1/ingestionState/errorMessage";

const FIND_AVAILABLE_AREA: &str = r#"query findAvailableArea($workspaceId: String!, $proposedArea: BoxInput!, $direction: FindAvailableAreaDirection!) {
    findAvailableArea(workspaceId: $workspaceId, proposedArea: $proposedArea, direction: $direction) {
        x
        y
        width
        height
    }
}"#;

const CREATE_CANVAS: &str = r#"mutation createCanvas($workspaceId: String!, $input: CreateCanvasInput!) {
    createCanvas(workspaceId: $workspaceId, input: $input) {
        id
    }
}"#;

const UPDATE_CANVAS: &str = r#"mutation updateCanvas($workspaceId: String!, $id: String!, $input: UpdateCanvasInput!) {
    updateCanvas(workspaceId: $workspaceId, id: $id, input: $input) {
        id
    }
}"#;

const INGESTION_STATUS: &str = r#"query getElementIngestionStatus($workspaceId: String!, $elementId: String!) {
    elements(workspaceId: $workspaceId, id: $elementId) {
        ... on Video {
            ingestionState
            traits
        }
        ... on Document {
            ingestionState
            traits
        }
        ... on Image {
            ingestionState
            traits
        }
    }
}"#;

const WORKSPACE: &str = r#"query getWorkspace($workspaceId: String!) {
    workspace(workspaceId: $workspaceId) {
        id
        name
    }
}"#;

const CANVAS: &str = r#"query getCanvas($workspaceId: String!, $canvasId: String!) {
    elements(workspaceId: $workspaceId, id: $canvasId) {
        ... on Canvas {
            id
            name
            boundingBox {
                x
                y
                width
                height
            }
        }
    }
}"#;

const NOTE_SELECTION: &str = r#"{
        __typename
        ... on Shape {
            kind
            ShapeText: text
        }
        ... on LegacyNote {
            LegacyText: text
        }
    }
}"#;

pub fn find_available_area(
    workspace_id: &str,
    proposed: Rect,
    direction: Direction,
) -> GraphqlRequest {
    GraphqlRequest::new(FIND_AVAILABLE_AREA).with_variables(json!({
        "workspaceId": workspace_id,
        "proposedArea": proposed,
        "direction": direction,
    }))
}

pub fn create_canvas(workspace_id: &str, name: &str, origin: Point, size: Size) -> GraphqlRequest {
    GraphqlRequest::new(CREATE_CANVAS).with_variables(json!({
        "workspaceId": workspace_id,
        "input": {
            "name": name,
            "transform": origin,
            "style": size,
        },
    }))
}

pub fn resize_canvas(workspace_id: &str, canvas_id: &str, size: Size) -> GraphqlRequest {
    GraphqlRequest::new(UPDATE_CANVAS).with_variables(json!({
        "workspaceId": workspace_id,
        "id": canvas_id,
        "input": { "style": size },
    }))
}

/// Create an asset whose content the platform fetches from `source_url`
pub fn create_asset_by_url(
    workspace_id: &str,
    kind: AssetKind,
    source_url: &str,
    extension: &str,
    position: Point,
    dimensions: Dimensions,
) -> GraphqlRequest {
    let mutation = kind.create_mutation();
    let document = format!(
        r#"mutation createAssetByUrl($workspaceId: String!, $input: {input_type}!) {{
    {name}(workspaceId: $workspaceId, input: $input) {{
        __typename
        {result} {{ id }}
    }}
}}"#,
        input_type = mutation.input_type,
        name = mutation.mutation_name,
        result = mutation.result_field,
    );

    let mut input = json!({
        "sourceUrl": source_url,
        "transform": position,
        "width": dimensions.width,
        "height": dimensions.height,
        "title": source_url,
    });
    input[mutation.format_field] = json!(extension);

    GraphqlRequest::new(document).with_variables(json!({
        "workspaceId": workspace_id,
        "input": input,
    }))
}

/// Create a placeholder element and receive signed upload credentials
pub fn create_asset_placeholder(
    workspace_id: &str,
    kind: AssetKind,
    title: &str,
    extension: &str,
    position: Point,
    dimensions: Dimensions,
) -> GraphqlRequest {
    let mutation = kind.create_mutation();
    let document = format!(
        r#"mutation createAssetPlaceholder($workspaceId: String!, $input: {input_type}!) {{
    newAsset: {name}(workspaceId: $workspaceId, input: $input) {{
        __typename
        content {{ uploadId url fields }}
        {result} {{ id width height ingestionState }}
    }}
}}"#,
        input_type = mutation.input_type,
        name = mutation.mutation_name,
        result = mutation.result_field,
    );

    let mut input = json!({
        "title": title,
        "filename": title,
        "transform": position,
        "width": dimensions.width,
        "height": dimensions.height,
    });
    input[mutation.format_field] = json!(extension);

    GraphqlRequest::new(document).with_variables(json!({
        "workspaceId": workspace_id,
        "input": input,
    }))
}

/// Link a placeholder to its uploaded content, optionally reporting a failed transfer
///
/// The error fields are written inline into the document, so `message` must
/// already be sanitized (no double quotes or newlines).
pub fn process_asset(
    workspace_id: &str,
    upload_id: &str,
    error: Option<(&str, &str)>,
) -> GraphqlRequest {
    let error_fields = match error {
        Some((code, message)) => format!(r#"errorCode: "{}", errorMessage: "{}""#, code, message),
        None => String::new(),
    };
    let document = format!(
        r#"mutation linkUploadToZygote($workspaceId: String!, $uploadId: String!) {{
    processAsset(workspaceId: $workspaceId, id: $uploadId, input: {{ {} }})
}}"#,
        error_fields
    );

    GraphqlRequest::new(document).with_variables(json!({
        "workspaceId": workspace_id,
        "uploadId": upload_id,
    }))
}

pub fn ingestion_status(workspace_id: &str, element_id: &str) -> GraphqlRequest {
    GraphqlRequest::new(INGESTION_STATUS).with_variables(json!({
        "workspaceId": workspace_id,
        "elementId": element_id,
    }))
}

pub fn workspace(workspace_id: &str) -> GraphqlRequest {
    GraphqlRequest::new(WORKSPACE).with_variables(json!({ "workspaceId": workspace_id }))
}

pub fn canvas(workspace_id: &str, canvas_id: &str) -> GraphqlRequest {
    GraphqlRequest::new(CANVAS).with_variables(json!({
        "workspaceId": workspace_id,
        "canvasId": canvas_id,
    }))
}

/// Shapes and legacy notes of a workspace, optionally limited to one canvas
pub fn note_elements(workspace_id: &str, canvas_id: Option<&str>) -> GraphqlRequest {
    let (params, canvas_arg) = match canvas_id {
        Some(_) => (", $canvasId: String!", ", canvasId: $canvasId"),
        None => ("", ""),
    };
    let document = format!(
        "query getNoteElements($workspaceId: String!{params}) {{\n    elements(workspaceId: $workspaceId, type: [Shape, LegacyNote]{canvas_arg}) {NOTE_SELECTION}"
    );

    let mut variables = json!({ "workspaceId": workspace_id });
    if let Some(id) = canvas_id {
        variables["canvasId"] = json!(id);
    }
    GraphqlRequest::new(document).with_variables(variables)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_by_url_uses_kind_table() {
        let request = create_asset_by_url(
            "ws-1",
            AssetKind::Video,
            "https://example.com/clip.mp4",
            "mp4",
            Point::new(150, 250),
            Dimensions::new(1080, 1920),
        );
        assert!(request.is_mutation());
        assert_eq!(request.operation_name(), Some("createAssetByUrl"));
        assert!(request.query.contains("$input: CreateVideoInput!"));
        assert!(request.query.contains("createVideo(workspaceId: $workspaceId"));
        assert!(request.query.contains("video { id }"));

        let input = &request.variables["input"];
        assert_eq!(input["videoFormat"], "mp4");
        assert_eq!(input["sourceUrl"], "https://example.com/clip.mp4");
        assert_eq!(input["transform"]["x"], 150);
        assert_eq!(input["height"], 1920);
    }

    #[test]
    fn test_placeholder_requests_upload_credentials() {
        let request = create_asset_placeholder(
            "ws-1",
            AssetKind::Document,
            "/tmp/report.pdf",
            "pdf",
            Point::new(0, 0),
            Dimensions::new(1500, 1500),
        );
        assert!(request.query.contains("newAsset: createDocument("));
        assert!(request.query.contains("content { uploadId url fields }"));
        assert_eq!(request.variables["input"]["documentFormat"], "pdf");
        assert_eq!(request.variables["input"]["filename"], "/tmp/report.pdf");
    }

    #[test]
    fn test_process_asset_error_payload() {
        let clean = process_asset("ws-1", "up-1", None);
        assert!(clean.query.contains("input: {  }"));
        assert_eq!(clean.operation_name(), Some("linkUploadToZygote"));

        let failed = process_asset("ws-1", "up-1", Some(("403", "Access Denied")));
        assert!(failed
            .query
            .contains(r#"errorCode: "403", errorMessage: "Access Denied""#));
    }

    #[test]
    fn test_note_elements_canvas_filter() {
        let all = note_elements("ws-1", None);
        assert!(!all.query.contains("canvasId"));
        assert!(all.query.contains("type: [Shape, LegacyNote]"));

        let scoped = note_elements("ws-1", Some("cv-9"));
        assert!(scoped.query.contains("canvasId: $canvasId"));
        assert_eq!(scoped.variables["canvasId"], "cv-9");
    }

    #[test]
    fn test_find_available_area_variables() {
        let request = find_available_area(
            "ws-1",
            Rect::new(Point::new(10, 20), Size { width: 2800, height: 1500 }),
            Direction::Right,
        );
        assert_eq!(request.variables["direction"], "right");
        assert_eq!(request.variables["proposedArea"]["width"], 2800);
        assert!(!request.is_mutation());
    }
}
