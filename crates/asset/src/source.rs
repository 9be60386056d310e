//! Where a texture comes from.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Identifies the image behind a texture.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TextureSource {
    /// File name relative to the images directory.
    Asset(String),
    /// Absolute or working-directory relative file path.
    Path(PathBuf),
    /// Inline `data:` URL, as produced by a file import.
    DataUrl(Arc<str>),
}

impl TextureSource {
    pub fn asset(name: impl Into<String>) -> Self {
        Self::Asset(name.into())
    }

    pub fn data_url(url: impl Into<Arc<str>>) -> Self {
        Self::DataUrl(url.into())
    }

    /// Parse a user-provided string: `data:` URLs stay inline, anything
    /// containing a path separator is a path, the rest are asset names.
    pub fn parse(value: &str) -> Self {
        if value.starts_with("data:") {
            Self::data_url(value)
        } else if value.contains('/') || value.contains('\\') {
            Self::Path(PathBuf::from(value))
        } else {
            Self::asset(value)
        }
    }

    #[inline]
    pub fn is_data_url(&self) -> bool {
        matches!(self, Self::DataUrl(_))
    }

    /// Short human-readable label (data URLs are abbreviated).
    pub fn label(&self) -> String {
        match self {
            Self::Asset(name) => name.clone(),
            Self::Path(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            Self::DataUrl(url) => {
                let header = url.split(',').next().unwrap_or("data:");
                format!("{header},… ({} chars)", url.len())
            }
        }
    }
}

impl fmt::Display for TextureSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asset(name) => write!(f, "asset:{name}"),
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::DataUrl(_) => f.write_str(&self.label()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_picks_variant_by_shape() {
        assert_eq!(
            TextureSource::parse("CORE_DECOR_COLD_60X60.jpg"),
            TextureSource::asset("CORE_DECOR_COLD_60X60.jpg")
        );
        assert_eq!(
            TextureSource::parse("/tmp/tiles/oak.png"),
            TextureSource::Path(PathBuf::from("/tmp/tiles/oak.png"))
        );
        assert!(TextureSource::parse("data:image/png;base64,AAAA").is_data_url());
    }

    #[test]
    fn data_url_label_is_abbreviated() {
        let src = TextureSource::data_url("data:image/png;base64,AAAAAAAA");
        assert_eq!(src.label(), "data:image/png;base64,… (30 chars)");
    }
}
