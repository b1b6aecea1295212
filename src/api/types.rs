//! Wire types shared by the GraphQL transport and its callers

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// A GraphQL document plus its variables
#[derive(Debug, Clone, Serialize)]
pub struct GraphqlRequest {
    pub query: String,

    #[serde(skip_serializing_if = "Value::is_null")]
    pub variables: Value,

    /// Per-request timeout, overrides the client default
    #[serde(skip)]
    pub timeout: Option<Duration>,
}

impl GraphqlRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            variables: Value::Null,
            timeout: None,
        }
    }

    pub fn with_variables(mut self, variables: Value) -> Self {
        self.variables = variables;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Whether the document is a mutation (not safe to replay after a server error)
    pub fn is_mutation(&self) -> bool {
        self.query.trim_start().starts_with("mutation")
    }

    /// Operation name, e.g. `findAvailableArea` for `query findAvailableArea(...)`
    pub fn operation_name(&self) -> Option<&str> {
        let rest = self
            .query
            .trim_start()
            .strip_prefix("mutation")
            .or_else(|| self.query.trim_start().strip_prefix("query"))?;
        let name: &str = rest
            .trim_start()
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .next()?;
        (!name.is_empty()).then_some(name)
    }
}

/// One entry of a GraphQL `errors` array
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphQlError {
    pub message: String,

    #[serde(default)]
    pub extensions: Option<GraphQlErrorExtensions>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GraphQlErrorExtensions {
    #[serde(default)]
    pub status_code: Option<u16>,
}

impl fmt::Display for GraphQlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(code) = self.extensions.as_ref().and_then(|e| e.status_code) {
            write!(f, " (Status code: {})", code)?;
        }
        Ok(())
    }
}

/// Absolute workspace coordinates (`transform`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    pub fn offset_by(self, origin: Point) -> Point {
        Point::new(self.x + origin.x, self.y + origin.y)
    }
}

/// Element size (`style { width height }`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: i64,
    pub height: i64,
}

/// Rectangle in workspace coordinates (`BoxInput`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl Rect {
    pub fn new(origin: Point, size: Size) -> Self {
        Self {
            x: origin.x,
            y: origin.y,
            width: size.width,
            height: size.height,
        }
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Signed upload credentials returned when a placeholder element is created
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadTarget {
    pub upload_id: String,
    pub url: String,

    /// Form fields that must precede the file part
    #[serde(default)]
    pub fields: serde_json::Map<String, Value>,
}

/// Raw answer of the signed upload destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferResponse {
    pub status: u16,
    pub body: String,
}

impl TransferResponse {
    /// The storage service answers a completed POST upload with 204 No Content
    pub fn is_complete(&self) -> bool {
        self.status == 204
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasElement {
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,

    /// Absolute position and size; only selected by queries that need it
    #[serde(default)]
    pub bounding_box: Option<Rect>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    pub id: String,
    pub name: String,
}
