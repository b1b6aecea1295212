//! Upload-eligible assets: classification, types and dimension probing

pub mod classify;
pub mod dimensions;
pub mod types;

pub use classify::{classify, list_directory};
pub use dimensions::DimensionProber;
pub use types::{AssetDescriptor, AssetKind, CreateMutation, Dimensions, PartialDimensions};
