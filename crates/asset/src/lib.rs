//! Asset loading for the room visualizer.
//! Texture sources and data URLs, image decoding with mip chains, the
//! fallback-aware texture loader, the image catalog and plane meshes.

pub mod catalog;
pub mod data_url;
pub mod error;
pub mod loader;
pub mod mesh;
pub mod source;
pub mod texture;

pub use error::{AssetError, AssetResult};
pub use loader::{Fetch, FsFetcher, LoadRequest, MemoryFetcher, TextureLoader};
pub use source::TextureSource;
pub use texture::{Texture, TextureData, TextureId, TextureSettings};
