//! Texture loading: byte fetching, decoding and the fallback chain.
//!
//! Loads are blocking functions returning `Result<Texture, AssetError>`;
//! [`TextureLoader::spawn`] moves one onto a worker thread and hands the
//! result to a continuation, which is expected to forward it to the thread
//! that owns the scene.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use parking_lot::RwLock;

use crate::data_url;
use crate::error::{AssetError, AssetResult};
use crate::source::TextureSource;
use crate::texture::{Texture, TextureData, TextureSettings};

/// Resolves a [`TextureSource`] to the raw bytes of an encoded image.
pub trait Fetch: Send + Sync {
    fn fetch(&self, source: &TextureSource) -> AssetResult<Vec<u8>>;
}

/// Reads assets from an images directory on disk.
#[derive(Clone, Debug)]
pub struct FsFetcher {
    images_dir: PathBuf,
}

impl FsFetcher {
    pub fn new(images_dir: impl Into<PathBuf>) -> Self {
        Self {
            images_dir: images_dir.into(),
        }
    }

    /// Asset names are joined onto the images directory; names that try to
    /// climb out of it are refused.
    fn resolve_asset(&self, name: &str) -> AssetResult<PathBuf> {
        let rel = Path::new(name);
        let escapes = rel.components().any(|c| {
            !matches!(c, std::path::Component::Normal(_) | std::path::Component::CurDir)
        });
        if escapes {
            return Err(AssetError::NotFound(name.to_string()));
        }
        Ok(self.images_dir.join(rel))
    }
}

impl Fetch for FsFetcher {
    fn fetch(&self, source: &TextureSource) -> AssetResult<Vec<u8>> {
        match source {
            TextureSource::Asset(name) => {
                let path = self.resolve_asset(name)?;
                std::fs::read(&path).map_err(|e| AssetError::io(path, e))
            }
            TextureSource::Path(path) => std::fs::read(path).map_err(|e| AssetError::io(path, e)),
            TextureSource::DataUrl(url) => data_url::decode(url).map(|(_, bytes)| bytes),
        }
    }
}

/// In-memory asset table, keyed by asset name. Paths are looked up by their
/// full string form.
#[derive(Default)]
pub struct MemoryFetcher {
    assets: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, name: impl Into<String>, bytes: Vec<u8>) {
        self.assets.write().insert(name.into(), bytes);
    }
}

impl Fetch for MemoryFetcher {
    fn fetch(&self, source: &TextureSource) -> AssetResult<Vec<u8>> {
        let key = match source {
            TextureSource::Asset(name) => name.clone(),
            TextureSource::Path(path) => path.display().to_string(),
            TextureSource::DataUrl(url) => return data_url::decode(url).map(|(_, bytes)| bytes),
        };
        let found = self.assets.read().get(&key).cloned();
        found.ok_or(AssetError::NotFound(key))
    }
}

/// A primary source plus an optional single fallback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadRequest {
    pub primary: TextureSource,
    pub fallback: Option<TextureSource>,
}

impl LoadRequest {
    pub fn new(primary: TextureSource) -> Self {
        Self {
            primary,
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, fallback: TextureSource) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Retry the primary source once more if the first attempt fails.
    pub fn retrying(primary: TextureSource) -> Self {
        Self {
            fallback: Some(primary.clone()),
            primary,
        }
    }
}

impl From<TextureSource> for LoadRequest {
    fn from(primary: TextureSource) -> Self {
        Self::new(primary)
    }
}

/// Fetches, decodes and post-processes textures.
#[derive(Clone)]
pub struct TextureLoader {
    fetcher: Arc<dyn Fetch>,
    settings: TextureSettings,
}

impl TextureLoader {
    pub fn new(fetcher: Arc<dyn Fetch>) -> Self {
        Self {
            fetcher,
            settings: TextureSettings::SURFACE,
        }
    }

    /// Loader reading from `images_dir` on disk.
    pub fn from_dir(images_dir: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FsFetcher::new(images_dir)))
    }

    /// Load one source, no fallback.
    pub fn load(&self, source: &TextureSource) -> AssetResult<Texture> {
        let bytes = self.fetcher.fetch(source)?;
        let data = TextureData::decode(&bytes)?;
        log::info!(
            "Loaded texture {} ({}x{})",
            source.label(),
            data.width,
            data.height
        );
        Ok(Texture::new(source.clone(), data, self.settings))
    }

    /// Load the primary source, trying the fallback once if it fails. The
    /// error returned is the one from the last attempt.
    pub fn load_with_fallback(&self, request: &LoadRequest) -> AssetResult<Texture> {
        self.load(&request.primary).or_else(|err| match &request.fallback {
            Some(fallback) => {
                log::warn!(
                    "Texture {} failed ({err}); trying fallback {}",
                    request.primary.label(),
                    fallback.label()
                );
                self.load(fallback)
            }
            None => Err(err),
        })
    }

    /// Run [`Self::load_with_fallback`] on a worker thread and pass the
    /// result to `on_done` there. If the thread cannot be started, `on_done`
    /// is dropped without being called.
    pub fn spawn<F>(&self, request: LoadRequest, on_done: F) -> AssetResult<()>
    where
        F: FnOnce(AssetResult<Texture>) + Send + 'static,
    {
        let loader = self.clone();
        thread::Builder::new()
            .name("texture-loader".into())
            .spawn(move || on_done(loader.load_with_fallback(&request)))
            .map(drop)
            .map_err(AssetError::Worker)
    }
}
