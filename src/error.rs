//! Error types
//!
//! - `ConfigError`: missing or invalid arguments, raised before any network call
//! - `ApiError`: transport failures after retries, GraphQL errors, malformed answers
//! - `ProbeError`: asset dimension probing failures that must not be swallowed
//! - `IngestionError`: the bounded ingestion poll gave up
//! - `UploadError`: per-asset pipeline aborts (missing identifiers)
//! - `LayoutError`: batch-wide failures of the layout orchestrator

use crate::api::types::GraphQlError;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("the {0} argument is required")]
    MissingArgument(&'static str),

    #[error("upload method '{0}' is not allowed, use 'URL' or 'LOCAL'")]
    UnknownUploadMethod(String),

    #[error("vertical alignment '{0}' is not allowed, use 'top', 'center' or 'bottom'")]
    UnknownAlignment(String),

    #[error("direction '{0}' is not allowed, use 'up', 'down', 'left' or 'right'")]
    UnknownDirection(String),

    #[error("canvas position '{0}' is not in the '(x,y)' format")]
    InvalidCanvasPosition(String),

    #[error("no uploadable assets were found")]
    EmptyAssetList,

    #[error("unable to read directory \"{path}\": {source}")]
    UnreadableDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API call failed with status code {status}: {body}")]
    Status { status: u16, body: String },

    #[error("GraphQL error: {}", join_errors(.0))]
    GraphQl(Vec<GraphQlError>),

    #[error("unexpected API response: {0}")]
    UnexpectedResponse(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// The connection was never established, so the server saw nothing
    pub fn is_connect(&self) -> bool {
        matches!(self, Self::Network(e) if e.is_connect())
    }

    /// No HTTP response came back: refused, reset, or closed after sending
    pub fn is_network(&self) -> bool {
        match self {
            Self::Network(e) => !e.is_timeout() && (e.is_connect() || e.is_request()),
            _ => false,
        }
    }

    /// The server answered with a status worth retrying
    pub fn is_retryable_status(&self) -> bool {
        matches!(self, Self::Status { status, .. } if *status >= 500 || *status == 429)
    }
}

fn join_errors(errors: &[GraphQlError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("could not read image dimensions of {location}: {reason}")]
    UnrecognizedImage { location: String, reason: String },

    #[error("ffprobe failed for {location}: {reason}")]
    Ffprobe { location: String, reason: String },

    #[error("video stream not found in {0}")]
    NoVideoStream(String),

    #[error("duration ({duration}) of video '{location}' was zero or less or not found")]
    InvalidDuration { location: String, duration: f64 },

    #[error("probe task failed: {0}")]
    Task(String),
}

#[derive(Debug, thiserror::Error)]
pub enum IngestionError {
    #[error("ingestion of element {element_id} did not finish within {waited:?}")]
    Timeout { element_id: String, waited: Duration },

    #[error("error reading ingestion status of element {0} from API response")]
    MissingStatus(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("could not get the new element id for {0}")]
    MissingElementId(String),
}

#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("could not find available area for the canvas")]
    NoAvailableArea,

    #[error("error creating the canvas")]
    CanvasCreationFailed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::GraphQlErrorExtensions;

    #[test]
    fn test_graphql_errors_are_joined() {
        let err = ApiError::GraphQl(vec![
            GraphQlError {
                message: "first".to_string(),
                extensions: None,
            },
            GraphQlError {
                message: "second".to_string(),
                extensions: Some(GraphQlErrorExtensions {
                    status_code: Some(404),
                }),
            },
        ]);
        assert_eq!(
            err.to_string(),
            "GraphQL error: first; second (Status code: 404)"
        );
    }

    #[test]
    fn test_retryable_status() {
        let server = ApiError::Status {
            status: 503,
            body: String::new(),
        };
        let throttled = ApiError::Status {
            status: 429,
            body: String::new(),
        };
        let client = ApiError::Status {
            status: 400,
            body: String::new(),
        };
        assert!(server.is_retryable_status());
        assert!(throttled.is_retryable_status());
        assert!(!client.is_retryable_status());
        assert!(!client.is_network());
        assert!(!client.is_connect());
    }
}
