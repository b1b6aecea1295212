//! Asset dimension probing
//!
//! - Images: read only the header (local file or the first bytes of a URL)
//! - Videos: ffprobe metadata, rotation aware
//! - Documents: never probed, defaults apply

use super::types::{AssetDescriptor, AssetKind, Dimensions, PartialDimensions};
use crate::config::{LayoutConfig, UploadMethod};
use crate::error::ProbeError;
use image::ImageReader;
use reqwest::Client;
use serde::{Deserialize, Deserializer};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Stop reading a remote image once this many bytes were fetched without a usable header
const MAX_HEADER_BYTES: usize = 1024 * 1024;

/// Resolves the width and height of assets before upload
#[derive(Clone)]
pub struct DimensionProber {
    http: Client,
    ffprobe_path: PathBuf,
    defaults: Dimensions,
}

impl DimensionProber {
    pub fn new(http: Client, ffprobe_path: impl Into<PathBuf>, defaults: Dimensions) -> Self {
        Self {
            http,
            ffprobe_path: ffprobe_path.into(),
            defaults,
        }
    }

    pub fn from_config(http: Client, config: &LayoutConfig) -> Self {
        Self::new(http, config.ffprobe_path.clone(), config.default_dimensions)
    }

    /// Dimensions of `asset`, falling back to the defaults for unknown sides
    ///
    /// Video probe failures are logged and swallowed, except a missing or
    /// non-positive duration which is returned as an error. Image read or
    /// fetch failures are returned as errors.
    pub async fn probe(
        &self,
        asset: &AssetDescriptor,
        method: UploadMethod,
    ) -> Result<Dimensions, ProbeError> {
        let probed = match (asset.kind, method) {
            (AssetKind::Video, _) => match self.probe_video(&asset.location).await {
                Ok(dims) => dims,
                Err(e @ ProbeError::InvalidDuration { .. }) => return Err(e),
                Err(e) => {
                    tracing::error!(
                        asset = %asset.location,
                        "Error trying to get dimensions for video: {}",
                        e
                    );
                    PartialDimensions::default()
                }
            },
            (AssetKind::Image, UploadMethod::Local) => {
                PartialDimensions::known(probe_local_image(Path::new(&asset.location)).await?)
            }
            (AssetKind::Image, UploadMethod::Url) => {
                PartialDimensions::known(self.probe_remote_image(&asset.location).await?)
            }
            (AssetKind::Document, _) => PartialDimensions::default(),
        };

        let dims = probed.or_defaults(self.defaults);
        tracing::debug!(
            asset = %asset.location,
            width = dims.width,
            height = dims.height,
            "Resolved asset dimensions"
        );
        Ok(dims)
    }

    /// Fetch the image progressively until its header can be parsed
    ///
    /// TIFF keeps its dimensions in the first IFD, usually written after the
    /// pixel data, so TIFF streams are read up to the end of that IFD.
    async fn probe_remote_image(&self, url: &str) -> Result<Dimensions, ProbeError> {
        let fetch_error = |source| ProbeError::Fetch {
            url: url.to_string(),
            source,
        };

        let mut response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(fetch_error)?;

        let mut buffer = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(fetch_error)? {
            buffer.extend_from_slice(&chunk);
            match tiff_header_len(&buffer) {
                Some(needed) if buffer.len() < needed => continue,
                Some(_) => break,
                None => {
                    if let Some(dims) = sniff_image_dimensions(&buffer) {
                        return Ok(dims);
                    }
                    if buffer.len() >= MAX_HEADER_BYTES {
                        break;
                    }
                }
            }
        }

        sniff_image_dimensions(&buffer).ok_or_else(|| ProbeError::UnrecognizedImage {
            location: url.to_string(),
            reason: format!("no readable header in the first {} bytes", buffer.len()),
        })
    }

    async fn probe_video(&self, location: &str) -> Result<PartialDimensions, ProbeError> {
        let output = Command::new(&self.ffprobe_path)
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(location)
            .output()
            .await
            .map_err(|e| ProbeError::Ffprobe {
                location: location.to_string(),
                reason: format!("failed to run {}: {}", self.ffprobe_path.display(), e),
            })?;

        if !output.status.success() {
            return Err(ProbeError::Ffprobe {
                location: location.to_string(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let metadata: FfprobeOutput =
            serde_json::from_slice(&output.stdout).map_err(|e| ProbeError::Ffprobe {
                location: location.to_string(),
                reason: format!("invalid ffprobe output: {}", e),
            })?;

        video_dimensions(&metadata, location)
    }
}

/// Read a local image header on the blocking pool
async fn probe_local_image(path: &Path) -> Result<Dimensions, ProbeError> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || read_local_image_dimensions(&path))
        .await
        .map_err(|e| ProbeError::Task(e.to_string()))?
}

fn read_local_image_dimensions(path: &Path) -> Result<Dimensions, ProbeError> {
    let reader = ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(|source| ProbeError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| ProbeError::UnrecognizedImage {
            location: path.display().to_string(),
            reason: e.to_string(),
        })?;
    Ok(Dimensions::new(width, height))
}

/// Dimensions from an image header, `None` when the bytes are not (yet) enough
pub fn sniff_image_dimensions(bytes: &[u8]) -> Option<Dimensions> {
    let decoded = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()
        .filter(|reader| reader.format().is_some())
        .and_then(|reader| reader.into_dimensions().ok());

    match decoded {
        Some((width, height)) => Some(Dimensions::new(width, height)),
        None => tiff_ifd_dimensions(bytes),
    }
}

const TIFF_IMAGE_WIDTH: u16 = 256;
const TIFF_IMAGE_LENGTH: u16 = 257;
const TIFF_SHORT: u16 = 3;
const TIFF_LONG: u16 = 4;
const TIFF_ENTRY_LEN: usize = 12;

#[derive(Debug, Clone, Copy)]
enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    fn of_tiff(bytes: &[u8]) -> Option<Self> {
        match bytes.get(..4)? {
            b"II*\0" => Some(Self::Little),
            b"MM\0*" => Some(Self::Big),
            _ => None,
        }
    }

    fn u16_at(self, bytes: &[u8], offset: usize) -> Option<u16> {
        let raw: [u8; 2] = bytes.get(offset..offset.checked_add(2)?)?.try_into().ok()?;
        Some(match self {
            Self::Little => u16::from_le_bytes(raw),
            Self::Big => u16::from_be_bytes(raw),
        })
    }

    fn u32_at(self, bytes: &[u8], offset: usize) -> Option<u32> {
        let raw: [u8; 4] = bytes.get(offset..offset.checked_add(4)?)?.try_into().ok()?;
        Some(match self {
            Self::Little => u32::from_le_bytes(raw),
            Self::Big => u32::from_be_bytes(raw),
        })
    }
}

/// Bytes needed to hold the first TIFF IFD, `None` when `bytes` is not a TIFF stream
///
/// Grows as more of the stream is known: first the 8-byte header, then the
/// IFD entry count, then the whole IFD.
fn tiff_header_len(bytes: &[u8]) -> Option<usize> {
    let order = ByteOrder::of_tiff(bytes)?;
    let Some(ifd) = order.u32_at(bytes, 4) else {
        return Some(8);
    };
    let ifd = ifd as usize;

    Some(match order.u16_at(bytes, ifd) {
        Some(entries) => ifd + 2 + usize::from(entries) * TIFF_ENTRY_LEN + 4,
        None => ifd + 2,
    })
}

/// ImageWidth and ImageLength read straight from the first TIFF IFD
fn tiff_ifd_dimensions(bytes: &[u8]) -> Option<Dimensions> {
    let order = ByteOrder::of_tiff(bytes)?;
    let ifd = order.u32_at(bytes, 4)? as usize;
    let entries = usize::from(order.u16_at(bytes, ifd)?);

    let mut width = None;
    let mut height = None;
    for index in 0..entries {
        let entry = ifd + 2 + index * TIFF_ENTRY_LEN;
        let value = match order.u16_at(bytes, entry + 2)? {
            TIFF_SHORT => u32::from(order.u16_at(bytes, entry + 8)?),
            TIFF_LONG => order.u32_at(bytes, entry + 8)?,
            _ => continue,
        };
        match order.u16_at(bytes, entry)? {
            TIFF_IMAGE_WIDTH => width = Some(value),
            TIFF_IMAGE_LENGTH => height = Some(value),
            _ => {}
        }
    }

    Some(Dimensions::new(width?, height?))
}

/// Subset of `ffprobe -print_format json -show_format -show_streams`
#[derive(Debug, Default, Deserialize)]
pub struct FfprobeOutput {
    #[serde(default)]
    pub streams: Vec<FfprobeStream>,

    #[serde(default)]
    pub format: Option<FfprobeFormat>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FfprobeStream {
    #[serde(default)]
    pub codec_type: Option<String>,

    #[serde(default)]
    pub width: Option<u32>,

    #[serde(default)]
    pub height: Option<u32>,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub rotation: Option<f64>,

    #[serde(default)]
    pub side_data_list: Vec<FfprobeSideData>,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub duration: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FfprobeSideData {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub rotation: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FfprobeFormat {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub duration: Option<f64>,
}

/// ffprobe prints most numbers as strings ("12.480000"); accept both forms
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(f64),
        String(String),
    }

    Ok(
        match Option::<NumberOrString>::deserialize(deserializer)? {
            Some(NumberOrString::Number(n)) => Some(n),
            Some(NumberOrString::String(s)) => s.trim().parse().ok(),
            None => None,
        },
    )
}

/// Width and height of the first video stream, swapped for portrait rotations
pub fn video_dimensions(
    metadata: &FfprobeOutput,
    location: &str,
) -> Result<PartialDimensions, ProbeError> {
    let stream = metadata
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| ProbeError::NoVideoStream(location.to_string()))?;

    let rotation = stream
        .rotation
        .filter(|r| *r != 0.0)
        .or_else(|| {
            stream
                .side_data_list
                .iter()
                .filter_map(|sd| sd.rotation)
                .find(|r| *r != 0.0)
        })
        .unwrap_or(0.0);

    let duration = match stream.duration {
        Some(d) => d,
        None => metadata
            .format
            .as_ref()
            .and_then(|f| f.duration)
            .unwrap_or(0.0),
    };
    if duration <= 0.0 {
        tracing::warn!(
            asset = location,
            "Duration was not found correctly for the video"
        );
        return Err(ProbeError::InvalidDuration {
            location: location.to_string(),
            duration,
        });
    }

    let dims = PartialDimensions {
        width: stream.width,
        height: stream.height,
    };
    if (rotation % 180.0).abs() == 90.0 {
        Ok(PartialDimensions {
            width: dims.height,
            height: dims.width,
        })
    } else {
        Ok(dims)
    }
}
