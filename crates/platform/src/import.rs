//! Native file picker for texture imports.

use std::path::PathBuf;

/// Extensions offered by the picker; all decodable by the asset crate.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif", "webp"];

/// Block on a file dialog that only offers image files.
pub fn pick_image_file(title: &str) -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title(title)
        .add_filter("Images", IMAGE_EXTENSIONS)
        .pick_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offered_extensions_are_image_formats() {
        for ext in IMAGE_EXTENSIONS {
            assert!(
                image_format_known(ext),
                "extension {ext} should map to an image format"
            );
        }
    }

    fn image_format_known(ext: &str) -> bool {
        asset::data_url::image_mime_for_path(std::path::Path::new(&format!("x.{ext}"))).is_ok()
    }
}
