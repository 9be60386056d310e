//! Listing of the images available under the images directory.

use std::path::Path;

use crate::error::{AssetError, AssetResult};

/// Image file names directly inside `dir`, sorted. Files whose extension
/// is not a known image format are skipped.
pub fn scan(dir: impl AsRef<Path>) -> AssetResult<Vec<String>> {
    let dir = dir.as_ref();
    let entries = std::fs::read_dir(dir).map_err(|e| AssetError::io(dir, e))?;

    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|entry| entry.path())
        .filter(|path| image::ImageFormat::from_path(path).is_ok())
        .filter_map(|path| path.file_name().map(|n| n.to_string_lossy().into_owned()))
        .collect();
    names.sort();

    log::info!("Found {} images in {}", names.len(), dir.display());
    Ok(names)
}

/// Like [`scan`], but an unreadable directory yields an empty catalog.
pub fn scan_or_empty(dir: impl AsRef<Path>) -> Vec<String> {
    let dir = dir.as_ref();
    scan(dir).unwrap_or_else(|e| {
        log::warn!("Image catalog unavailable: {e}");
        Vec::new()
    })
}
