//! Errors produced while fetching and decoding texture assets.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Malformed data URL: {0}")]
    InvalidDataUrl(String),
    #[error("Not an image: {0}")]
    UnsupportedMedia(String),
    #[error("Asset not found: {0}")]
    NotFound(String),
    #[error("Image has zero width or height")]
    EmptyImage,
    #[error("Could not start texture loader thread: {0}")]
    Worker(#[source] std::io::Error),
}

impl AssetError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type AssetResult<T> = Result<T, AssetError>;
