//! Configuration for the API client and the layout run

use crate::api::types::Point;
use crate::assets::Dimensions;
use crate::error::{ApiError, ConfigError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_PORTAL_URL: &str = "https://api.apps.us.bluescape.com";
pub const DEFAULT_API_VERSION: &str = "v3";

/// Connection settings for the Bluescape API
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// OAuth2 access token
    pub token: String,

    /// Portal URL (default: https://api.apps.us.bluescape.com)
    pub portal_url: String,

    /// API version path segment (default: v3)
    pub api_version: String,

    /// Default timeout for GraphQL requests, `None` waits indefinitely
    pub request_timeout: Option<Duration>,

    /// Retry policy, fixed for the lifetime of the client
    pub retry: RetryPolicy,
}

impl ApiConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            portal_url: DEFAULT_PORTAL_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            request_timeout: None,
            retry: RetryPolicy::default(),
        }
    }

    pub fn graphql_url(&self) -> String {
        format!(
            "{}/{}/graphql",
            self.portal_url.trim_end_matches('/'),
            self.api_version.trim_matches('/')
        )
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token.trim().is_empty() {
            return Err(ConfigError::MissingArgument("token"));
        }
        Ok(())
    }
}

/// Retry behaviour of the GraphQL transport
///
/// Queries are replayed on any network failure and on 5xx/429 answers.
/// Mutations are replayed only when the connection was never established;
/// once sent, a create mutation may already have created its element. Set
/// `retry_mutations_on_server_error` to also replay them on 5xx/429 answers.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub retry_mutations_on_server_error: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
            retry_mutations_on_server_error: false,
        }
    }
}

impl RetryPolicy {
    /// Exponential backoff: base, 2×base, 4×base, ...
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }

    pub fn should_retry(&self, error: &ApiError, is_mutation: bool) -> bool {
        if is_mutation {
            return error.is_connect()
                || (self.retry_mutations_on_server_error && error.is_retryable_status());
        }
        error.is_network() || error.is_retryable_status()
    }
}

/// Bounds for the by-URL ingestion status poll
#[derive(Debug, Clone)]
pub struct IngestionPolicy {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for IngestionPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            timeout: Duration::from_secs(600),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UploadMethod {
    Url,
    Local,
}

impl FromStr for UploadMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "URL" => Ok(Self::Url),
            "LOCAL" => Ok(Self::Local),
            _ => Err(ConfigError::UnknownUploadMethod(s.to_string())),
        }
    }
}

/// Vertical position of an asset inside its grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlignment {
    Top,
    #[default]
    Center,
    Bottom,
}

impl FromStr for VerticalAlignment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "top" => Ok(Self::Top),
            "center" => Ok(Self::Center),
            "bottom" => Ok(Self::Bottom),
            _ => Err(ConfigError::UnknownAlignment(s.to_string())),
        }
    }
}

/// Search direction for `findAvailableArea` (`FindAvailableAreaDirection`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    #[default]
    Right,
}

impl FromStr for Direction {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            _ => Err(ConfigError::UnknownDirection(s.to_string())),
        }
    }
}

/// Spacing between assets, and between assets and the canvas border
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spacing {
    pub horizontal: i64,
    pub vertical: i64,
}

impl Default for Spacing {
    fn default() -> Self {
        Self {
            horizontal: 100,
            vertical: 100,
        }
    }
}

/// Parameters of one layout run
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    /// Workspace receiving the canvas and the assets
    pub workspace_id: String,

    /// Name of the created canvas
    pub canvas_name: String,

    /// Proposed canvas origin, adjusted by `findAvailableArea`
    pub canvas_origin: Point,

    /// Direction to search for free space
    pub direction: Direction,

    pub upload_method: UploadMethod,

    /// ffprobe executable used to read video dimensions
    pub ffprobe_path: PathBuf,

    /// Used when an asset's dimensions cannot be read
    pub default_dimensions: Dimensions,

    pub spacing: Spacing,

    pub vertical_alignment: VerticalAlignment,

    pub ingestion: IngestionPolicy,

    /// Upper bound of simultaneous uploads, `None` uploads every asset at once
    pub max_concurrent_uploads: Option<usize>,
}

impl LayoutConfig {
    pub fn new(workspace_id: impl Into<String>, upload_method: UploadMethod) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            canvas_name: default_canvas_name(),
            canvas_origin: Point::default(),
            direction: Direction::default(),
            upload_method,
            ffprobe_path: PathBuf::from("ffprobe"),
            default_dimensions: Dimensions::new(1500, 1500),
            spacing: Spacing::default(),
            vertical_alignment: VerticalAlignment::default(),
            ingestion: IngestionPolicy::default(),
            max_concurrent_uploads: None,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workspace_id.trim().is_empty() {
            return Err(ConfigError::MissingArgument("workspaceId"));
        }
        if self.canvas_name.trim().is_empty() {
            return Err(ConfigError::MissingArgument("canvasName"));
        }
        Ok(())
    }
}

pub fn default_canvas_name() -> String {
    format!(
        "UPLOADED CONTENT - {}",
        chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
    )
}

static CANVAS_POSITION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*\(?\s*(-?\d+)\s*,\s*(-?\d+)\s*\)?\s*$")
        .expect("Failed to compile canvas position regex")
});

/// Parse a canvas position given as `(x,y)`
pub fn parse_canvas_position(value: &str) -> Result<Point, ConfigError> {
    let invalid = || ConfigError::InvalidCanvasPosition(value.to_string());

    let captures = CANVAS_POSITION.captures(value).ok_or_else(invalid)?;
    let x = captures[1].parse::<i64>().map_err(|_| invalid())?;
    let y = captures[2].parse::<i64>().map_err(|_| invalid())?;
    Ok(Point::new(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graphql_url() {
        let mut config = ApiConfig::new("token");
        assert_eq!(
            config.graphql_url(),
            "https://api.apps.us.bluescape.com/v3/graphql"
        );

        config.portal_url = "http://localhost:8080/api/".to_string();
        assert_eq!(config.graphql_url(), "http://localhost:8080/api/v3/graphql");
    }

    #[test]
    fn test_parse_canvas_position() {
        assert_eq!(parse_canvas_position("(1000,3000)").unwrap(), Point::new(1000, 3000));
        assert_eq!(parse_canvas_position(" ( -50 , 20 ) ").unwrap(), Point::new(-50, 20));
        assert_eq!(parse_canvas_position("0,0").unwrap(), Point::new(0, 0));
        assert!(parse_canvas_position("(1000)").is_err());
        assert!(parse_canvas_position("(a,b)").is_err());
    }

    #[test]
    fn test_upload_method_from_str() {
        assert_eq!("URL".parse::<UploadMethod>().unwrap(), UploadMethod::Url);
        assert_eq!("local".parse::<UploadMethod>().unwrap(), UploadMethod::Local);
        assert!(matches!(
            "FTP".parse::<UploadMethod>(),
            Err(ConfigError::UnknownUploadMethod(_))
        ));
    }

    #[test]
    fn test_alignment_and_direction_from_str() {
        assert_eq!("Top".parse::<VerticalAlignment>().unwrap(), VerticalAlignment::Top);
        assert_eq!(VerticalAlignment::default(), VerticalAlignment::Center);
        assert!("middle".parse::<VerticalAlignment>().is_err());

        assert_eq!("LEFT".parse::<Direction>().unwrap(), Direction::Left);
        assert_eq!(serde_json::to_value(Direction::Right).unwrap(), "right");
        assert!("north".parse::<Direction>().is_err());
    }

    #[test]
    fn test_retry_delay_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(400));
    }

    #[test]
    fn test_mutations_not_retried_on_server_error() {
        let policy = RetryPolicy::default();
        let err = ApiError::Status {
            status: 502,
            body: String::new(),
        };
        assert!(policy.should_retry(&err, false));
        assert!(!policy.should_retry(&err, true));

        let permissive = RetryPolicy {
            retry_mutations_on_server_error: true,
            ..RetryPolicy::default()
        };
        assert!(permissive.should_retry(&err, true));
    }

    #[test]
    fn test_layout_config_validation() {
        let config = LayoutConfig::new("ws-1", UploadMethod::Url);
        assert!(config.validate().is_ok());
        assert!(config.canvas_name.starts_with("UPLOADED CONTENT - "));

        let missing = LayoutConfig::new("  ", UploadMethod::Url);
        assert!(matches!(
            missing.validate(),
            Err(ConfigError::MissingArgument("workspaceId"))
        ));
    }
}
