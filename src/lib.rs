//! Upload assets into an auto-sized canvas grid in a Bluescape workspace
//!
//! ```text
//! classify → probe dimensions → grid + canvas size → findAvailableArea
//!   → createCanvas → upload (by URL or from local) → report
//! ```

pub mod api;
pub mod assets;
pub mod config;
pub mod error;
pub mod layout;
pub mod notes;
pub mod upload;

pub use api::{BluescapeClient, Transport};
pub use assets::{classify, AssetDescriptor, AssetKind, DimensionProber, Dimensions};
pub use config::{ApiConfig, LayoutConfig, UploadMethod, VerticalAlignment};
pub use error::{ApiError, ConfigError, LayoutError};
pub use layout::LayoutOrchestrator;
pub use upload::{UploadOutcome, UploadReport, UploadResult};

use tracing_subscriber::EnvFilter;

/// Load `.env` and install the tracing subscriber
pub fn init_tracing() {
    if dotenvy::dotenv().is_err() {
        let _ = dotenvy::from_path("../.env");
    }

    // Honour RUST_LOG, defaulting to info for this crate only
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,canvas_grid_uploader=info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
