//! Extension-based asset classification

use super::types::{AssetDescriptor, AssetKind};
use std::io;
use std::path::Path;
use walkdir::WalkDir;

pub const IMAGE_EXTENSIONS: &[&str] = &["jpeg", "jpg", "gif", "png", "tiff", "tif"];
pub const DOCUMENT_EXTENSIONS: &[&str] = &["doc", "docx", "ppt", "pptx", "xls", "xlsx", "pdf"];
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "m4v"];

/// Trailing extension of a name, path or URL: the alphanumeric run after the final `.`
pub fn trailing_extension(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_lowercase())
}

/// Map a lowercase extension to its asset kind
pub fn kind_for_extension(extension: &str) -> Option<AssetKind> {
    if IMAGE_EXTENSIONS.contains(&extension) {
        Some(AssetKind::Image)
    } else if DOCUMENT_EXTENSIONS.contains(&extension) {
        Some(AssetKind::Document)
    } else if VIDEO_EXTENSIONS.contains(&extension) {
        Some(AssetKind::Video)
    } else {
        None
    }
}

/// Keep the names whose extension can be uploaded, in input order
///
/// Names without an extension are skipped; unsupported extensions are logged
/// and skipped. Never fails the batch.
pub fn classify<I, S>(names: I) -> Vec<AssetDescriptor>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .filter_map(|name| {
            let name = name.as_ref();
            let Some(extension) = trailing_extension(name) else {
                tracing::debug!(asset = name, "Skipping asset without extension");
                return None;
            };

            match kind_for_extension(&extension) {
                Some(kind) => Some(AssetDescriptor::new(name, kind, extension)),
                None => {
                    tracing::warn!(
                        asset = name,
                        "Extension \".{}\" is not an allowed format to upload",
                        extension
                    );
                    None
                }
            }
        })
        .collect()
}

/// Files directly inside `dir` (not recursive), sorted by file name
pub fn list_directory(dir: &Path) -> io::Result<Vec<String>> {
    if !dir.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("Unable to read directory \"{}\"", dir.display()),
        ));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(io::Error::from)?;
        if entry.file_type().is_file() {
            files.push(entry.path().to_string_lossy().to_string());
        }
    }
    Ok(files)
}
