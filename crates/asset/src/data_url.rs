//! `data:` URL encoding for imported image files.
//!
//! Only the base64 form is produced; decoding additionally accepts
//! percent-free plain payloads so hand-written URLs in tests and configs work.

use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::error::{AssetError, AssetResult};

/// Encode raw bytes as `data:<mime>;base64,<payload>`.
pub fn encode(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Split a data URL into its media type and decoded payload.
pub fn decode(url: &str) -> AssetResult<(String, Vec<u8>)> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| AssetError::InvalidDataUrl("missing 'data:' scheme".into()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| AssetError::InvalidDataUrl("missing ',' separator".into()))?;

    let (mime, is_base64) = match header.strip_suffix(";base64") {
        Some(mime) => (mime, true),
        None => (header, false),
    };
    let mime = if mime.is_empty() { "text/plain" } else { mime };

    let bytes = if is_base64 {
        STANDARD
            .decode(payload.trim())
            .map_err(|e| AssetError::InvalidDataUrl(format!("bad base64 payload: {e}")))?
    } else {
        payload.as_bytes().to_vec()
    };

    Ok((mime.to_string(), bytes))
}

/// Media type for an image path, judged by its extension.
pub fn image_mime_for_path(path: &Path) -> AssetResult<&'static str> {
    image::ImageFormat::from_path(path)
        .map(|format| format.to_mime_type())
        .map_err(|_| AssetError::UnsupportedMedia(path.display().to_string()))
}

/// Read an image file and encode it as a data URL.
pub fn from_file(path: impl AsRef<Path>) -> AssetResult<String> {
    let path = path.as_ref();
    let mime = image_mime_for_path(path)?;
    let bytes = std::fs::read(path).map_err(|e| AssetError::io(path, e))?;
    log::info!(
        "Encoded {} ({} bytes) as {} data URL",
        path.display(),
        bytes.len(),
        mime
    );
    Ok(encode(mime, &bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_then_decode_keeps_mime_and_bytes() {
        let url = encode("image/png", &[0x89, b'P', b'N', b'G', 0, 255]);
        assert!(url.starts_with("data:image/png;base64,"));
        let (mime, bytes) = decode(&url).expect("decode");
        assert_eq!(mime, "image/png");
        assert_eq!(bytes, vec![0x89, b'P', b'N', b'G', 0, 255]);
    }

    #[test]
    fn decode_rejects_other_schemes() {
        let err = decode("images/floor.jpg").unwrap_err();
        assert!(matches!(err, AssetError::InvalidDataUrl(_)));
    }

    #[test]
    fn decode_plain_payload_without_mime() {
        let (mime, bytes) = decode("data:,hello").expect("decode");
        assert_eq!(mime, "text/plain");
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn non_image_extension_is_refused() {
        let err = image_mime_for_path(Path::new("notes.txt")).unwrap_err();
        assert!(matches!(err, AssetError::UnsupportedMedia(_)));
        assert_eq!(
            image_mime_for_path(Path::new("tile.JPG")).expect("jpeg"),
            "image/jpeg"
        );
    }
}
