//! Asset descriptors and the per-kind creation mutation table

use serde::{Deserialize, Serialize};

/// Kind of uploadable asset, as named by the platform's element types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetKind {
    Image,
    Document,
    Video,
}

/// GraphQL names used to create one kind of asset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateMutation {
    /// e.g. `createImage`
    pub mutation_name: &'static str,
    /// e.g. `CreateImageInput`
    pub input_type: &'static str,
    /// Input field carrying the file extension, e.g. `imageFormat`
    pub format_field: &'static str,
    /// Selection on the payload holding the new element, e.g. `image`
    pub result_field: &'static str,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "Image",
            Self::Document => "Document",
            Self::Video => "Video",
        }
    }

    pub const fn create_mutation(self) -> CreateMutation {
        match self {
            Self::Image => CreateMutation {
                mutation_name: "createImage",
                input_type: "CreateImageInput",
                format_field: "imageFormat",
                result_field: "image",
            },
            Self::Document => CreateMutation {
                mutation_name: "createDocument",
                input_type: "CreateDocumentInput",
                format_field: "documentFormat",
                result_field: "document",
            },
            Self::Video => CreateMutation {
                mutation_name: "createVideo",
                input_type: "CreateVideoInput",
                format_field: "videoFormat",
                result_field: "video",
            },
        }
    }
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An upload-eligible asset: a URL or a local path with a recognised extension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetDescriptor {
    /// URL or full local path
    pub location: String,

    pub kind: AssetKind,

    /// Lowercase extension without the dot
    pub extension: String,
}

impl AssetDescriptor {
    pub fn new(location: impl Into<String>, kind: AssetKind, extension: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            kind,
            extension: extension.into(),
        }
    }

    /// Title shown on the created element
    pub fn title(&self) -> &str {
        &self.location
    }
}

/// Width and height of an asset, in workspace units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Scale down to `max_width`, keeping the aspect ratio
    pub fn fit_to_width(self, max_width: u32) -> Self {
        if self.width <= max_width || self.width == 0 || max_width == 0 {
            return self;
        }
        let scaled = (u64::from(self.height) * u64::from(max_width) + u64::from(self.width) / 2)
            / u64::from(self.width);
        Self {
            width: max_width,
            height: (scaled as u32).max(1),
        }
    }

    /// Component-wise maximum over a set of dimensions
    pub fn max_of<'a>(dims: impl IntoIterator<Item = &'a Dimensions>) -> Option<Dimensions> {
        dims.into_iter().fold(None, |acc, d| {
            Some(match acc {
                None => *d,
                Some(m) => Dimensions::new(m.width.max(d.width), m.height.max(d.height)),
            })
        })
    }
}

/// Probe result where either side may be unknown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PartialDimensions {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl PartialDimensions {
    pub fn known(dims: Dimensions) -> Self {
        Self {
            width: Some(dims.width),
            height: Some(dims.height),
        }
    }

    /// Fill whichever side is unknown from `defaults`
    pub fn or_defaults(self, defaults: Dimensions) -> Dimensions {
        Dimensions {
            width: self.width.unwrap_or(defaults.width),
            height: self.height.unwrap_or(defaults.height),
        }
    }
}
