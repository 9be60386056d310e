//! Startup configuration: where images live and what each surface shows first.

use std::path::PathBuf;

use asset::{LoadRequest, TextureSource};

use crate::error::{CoreError, CoreResult};
use crate::scene::SurfaceKind;

pub const DEFAULT_IMAGES_DIR: &str = "images";

#[derive(Clone, Debug, PartialEq)]
pub struct RoomConfig {
    pub images_dir: PathBuf,
    /// Surface that dropped files are imported into until the panel picks another.
    pub import_target: SurfaceKind,
    defaults: [LoadRequest; 3],
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            images_dir: PathBuf::from(DEFAULT_IMAGES_DIR),
            import_target: SurfaceKind::Floor,
            defaults: [
                LoadRequest::new(TextureSource::asset("CORE_DECOR_COLD_60X60.jpg")),
                LoadRequest::new(TextureSource::asset("1ANIKSA_PULIDO_120x260.jpg")),
                LoadRequest::new(TextureSource::asset("DUC_BLANC_BURGUINI_S.T_89.8x269.8.jpg")),
            ],
        }
    }
}

impl RoomConfig {
    #[inline]
    pub fn default_for(&self, kind: SurfaceKind) -> &LoadRequest {
        &self.defaults[kind.index()]
    }

    pub fn with_default(mut self, kind: SurfaceKind, request: LoadRequest) -> Self {
        self.defaults[kind.index()] = request;
        self
    }

    /// Replace the primary default texture of a surface, keeping its fallback.
    pub fn set_primary(&mut self, kind: SurfaceKind, value: &str) -> CoreResult<()> {
        self.defaults[kind.index()].primary = parse_source(value)?;
        Ok(())
    }

    pub fn set_fallback(&mut self, kind: SurfaceKind, value: &str) -> CoreResult<()> {
        self.defaults[kind.index()].fallback = Some(parse_source(value)?);
        Ok(())
    }

    /// Apply one `--key=value` command line flag if it is a room option.
    /// Returns `Ok(false)` for flags that belong to someone else.
    pub fn apply_flag(&mut self, arg: &str) -> CoreResult<bool> {
        let Some((key, value)) = arg.strip_prefix("--").and_then(|a| a.split_once('=')) else {
            return Ok(false);
        };

        if key == "images-dir" {
            if value.is_empty() {
                return Err(CoreError::InvalidArgument("--images-dir needs a path".into()));
            }
            self.images_dir = PathBuf::from(value);
            return Ok(true);
        }

        if key == "import-target" {
            self.import_target = value.parse()?;
            return Ok(true);
        }

        let (name, is_fallback) = match key.strip_suffix("-fallback") {
            Some(name) => (name, true),
            None => (key, false),
        };
        let Some(kind) = SurfaceKind::ALL.into_iter().find(|k| k.key() == name) else {
            return Ok(false);
        };

        if is_fallback {
            self.set_fallback(kind, value)?;
        } else {
            self.set_primary(kind, value)?;
        }
        Ok(true)
    }
}

fn parse_source(value: &str) -> CoreResult<TextureSource> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CoreError::InvalidArgument("empty texture name".into()));
    }
    Ok(TextureSource::parse(value))
}
