//! Sticky-note text retrieval
//!
//! Notes are `Shape` elements of kind `StickySquare` plus `LegacyNote`
//! elements. Empty notes are skipped.

use crate::api::{queries, Transport};
use crate::error::ApiError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const STICKY_SHAPE_KIND: &str = "StickySquare";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NoteKind {
    Shape { kind: String },
    LegacyNote,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteText {
    pub kind: NoteKind,
    pub text: String,
}

/// Text of every note in a workspace, or in one of its canvases
pub async fn fetch_note_texts(
    transport: &dyn Transport,
    workspace_id: &str,
    canvas_id: Option<&str>,
) -> Result<Vec<NoteText>, ApiError> {
    let data = transport
        .run_query(queries::note_elements(workspace_id, canvas_id))
        .await?;

    let elements = data
        .get("elements")
        .and_then(Value::as_array)
        .ok_or_else(|| ApiError::UnexpectedResponse("note query returned no elements".to_string()))?;

    let notes: Vec<NoteText> = elements.iter().filter_map(note_from_element).collect();
    tracing::info!(
        workspace_id,
        canvas_id = canvas_id.unwrap_or("-"),
        "Retrieved {} notes from {} elements",
        notes.len(),
        elements.len()
    );
    Ok(notes)
}

fn note_from_element(element: &Value) -> Option<NoteText> {
    let text_of = |field: &str| {
        element
            .get(field)
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    };

    match element.get("__typename").and_then(Value::as_str)? {
        "Shape" => {
            let kind = element.get("kind").and_then(Value::as_str)?;
            if kind != STICKY_SHAPE_KIND {
                return None;
            }
            Some(NoteText {
                kind: NoteKind::Shape {
                    kind: kind.to_string(),
                },
                text: text_of("ShapeText")?,
            })
        }
        "LegacyNote" => Some(NoteText {
            kind: NoteKind::LegacyNote,
            text: text_of("LegacyText")?,
        }),
        _ => None,
    }
}
