//! Texture pixel data, sampling settings and loaded texture handles.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{AssetError, AssetResult};
use crate::source::TextureSource;

/// Texture data in CPU-friendly format before GPU upload.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureData {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
}

/// Supported texture formats.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TextureFormat {
    Rgba8,
}

impl TextureData {
    /// Create a new texture with given dimensions and RGBA8 format.
    pub fn new_rgba8(width: u32, height: u32, data: Vec<u8>) -> AssetResult<Self> {
        if width == 0 || height == 0 {
            return Err(AssetError::EmptyImage);
        }
        let expected = (width as usize) * (height as usize) * 4;
        if data.len() != expected {
            return Err(AssetError::UnsupportedMedia(format!(
                "RGBA8 buffer of {} bytes for {width}x{height} (expected {expected})",
                data.len()
            )));
        }
        Ok(Self {
            data,
            width,
            height,
            format: TextureFormat::Rgba8,
        })
    }

    /// Decode any supported image container (PNG, JPEG, ...) from memory.
    pub fn decode(bytes: &[u8]) -> AssetResult<Self> {
        let img = image::load_from_memory(bytes)?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self::new_rgba8(width, height, rgba.into_raw())
    }

    /// Checkerboard pattern shown while a surface has no image yet.
    pub fn checkerboard(size: u32) -> Self {
        let size = size.max(1);
        let mut data = Vec::with_capacity((size * size * 4) as usize);

        for y in 0..size {
            for x in 0..size {
                let checker = ((x / 8) + (y / 8)) % 2;
                if checker == 0 {
                    data.extend_from_slice(&[255, 255, 255, 255]);
                } else {
                    data.extend_from_slice(&[128, 128, 128, 255]);
                }
            }
        }

        Self {
            data,
            width: size,
            height: size,
            format: TextureFormat::Rgba8,
        }
    }

    /// Get the number of bytes per pixel for the format.
    pub fn bytes_per_pixel(&self) -> u32 {
        match self.format {
            TextureFormat::Rgba8 => 4,
        }
    }

    /// Check if the texture data is valid.
    pub fn is_valid(&self) -> bool {
        let expected_size = (self.width * self.height * self.bytes_per_pixel()) as usize;
        self.data.len() == expected_size && self.width > 0 && self.height > 0
    }

    /// Number of levels in a full mip chain for this size.
    pub fn mip_level_count(&self) -> u32 {
        32 - self.width.max(self.height).leading_zeros()
    }

    /// Half-size copy using a 2x2 box filter (edge texels are averaged over
    /// whatever part of the block exists).
    pub fn downsample(&self) -> Self {
        let new_width = (self.width / 2).max(1);
        let new_height = (self.height / 2).max(1);
        let (w, h) = (self.width as usize, self.height as usize);
        let mut out = vec![0u8; (new_width * new_height * 4) as usize];

        for y in 0..new_height as usize {
            for x in 0..new_width as usize {
                let mut sum = [0u32; 4];
                let mut count = 0u32;
                for (sx, sy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                    let px = x * 2 + sx;
                    let py = y * 2 + sy;
                    if px < w && py < h {
                        let idx = (py * w + px) * 4;
                        for (c, s) in sum.iter_mut().enumerate() {
                            *s += u32::from(self.data[idx + c]);
                        }
                        count += 1;
                    }
                }
                let dst = (y * new_width as usize + x) * 4;
                for (c, s) in sum.iter().enumerate() {
                    out[dst + c] = (s / count.max(1)) as u8;
                }
            }
        }

        Self {
            data: out,
            width: new_width,
            height: new_height,
            format: self.format,
        }
    }

    /// Base level followed by every downsampled level down to 1x1.
    pub fn mip_chain(self) -> Vec<TextureData> {
        let count = self.mip_level_count() as usize;
        let mut levels = Vec::with_capacity(count);
        levels.push(self);
        while levels.len() < count {
            let next = levels[levels.len() - 1].downsample();
            levels.push(next);
        }
        levels
    }
}

/// How stored texel values are interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorSpace {
    Srgb,
    Linear,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WrapMode {
    Repeat,
    MirroredRepeat,
    ClampToEdge,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterMode {
    Nearest,
    Linear,
}

/// Sampling parameters applied to every texture after it loads.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextureSettings {
    pub color_space: ColorSpace,
    pub wrap_u: WrapMode,
    pub wrap_v: WrapMode,
    /// UV multiplier; `[2.0, 2.0]` tiles the image twice along each axis.
    pub repeat: [f32; 2],
    pub generate_mipmaps: bool,
    pub mag_filter: FilterMode,
    pub min_filter: FilterMode,
    pub mipmap_filter: FilterMode,
}

impl TextureSettings {
    /// sRGB, repeat wrapping tiled 2x2, full mip chain, trilinear filtering.
    pub const SURFACE: Self = Self {
        color_space: ColorSpace::Srgb,
        wrap_u: WrapMode::Repeat,
        wrap_v: WrapMode::Repeat,
        repeat: [2.0, 2.0],
        generate_mipmaps: true,
        mag_filter: FilterMode::Linear,
        min_filter: FilterMode::Linear,
        mipmap_filter: FilterMode::Linear,
    };
}

impl Default for TextureSettings {
    fn default() -> Self {
        Self::SURFACE
    }
}

/// Process-unique identity of one loaded texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(u64);

impl TextureId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A loaded, immutable texture. Cloning shares the pixel data but keeps the
/// same [`TextureId`]; each load produces a new id.
#[derive(Clone, Debug)]
pub struct Texture {
    id: TextureId,
    source: TextureSource,
    levels: Arc<[TextureData]>,
    settings: TextureSettings,
}

impl Texture {
    /// Wrap decoded pixels, building mip levels when the settings ask for them.
    pub fn new(source: TextureSource, base: TextureData, settings: TextureSettings) -> Self {
        let levels = if settings.generate_mipmaps {
            base.mip_chain()
        } else {
            vec![base]
        };
        Self {
            id: TextureId::next(),
            source,
            levels: levels.into(),
            settings,
        }
    }

    /// Checkerboard texture bound to surfaces before their image arrives.
    pub fn placeholder() -> Self {
        Self::new(
            TextureSource::asset("<placeholder>"),
            TextureData::checkerboard(64),
            TextureSettings::SURFACE,
        )
    }

    #[inline]
    pub fn id(&self) -> TextureId {
        self.id
    }

    #[inline]
    pub fn source(&self) -> &TextureSource {
        &self.source
    }

    #[inline]
    pub fn settings(&self) -> &TextureSettings {
        &self.settings
    }

    /// Mip levels, base first. Never empty.
    #[inline]
    pub fn levels(&self) -> &[TextureData] {
        &self.levels
    }

    #[inline]
    pub fn base(&self) -> &TextureData {
        &self.levels[0]
    }

    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.base().width, self.base().height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, rgba: [u8; 4]) -> TextureData {
        let data = rgba
            .iter()
            .copied()
            .cycle()
            .take((width * height * 4) as usize)
            .collect();
        TextureData::new_rgba8(width, height, data).expect("valid rgba")
    }

    #[test]
    fn new_rgba8_rejects_mismatched_buffer() {
        assert!(matches!(
            TextureData::new_rgba8(0, 4, Vec::new()),
            Err(AssetError::EmptyImage)
        ));
        assert!(TextureData::new_rgba8(2, 2, vec![0; 15]).is_err());
    }

    #[test]
    fn decode_png_from_memory() {
        let img = image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .expect("encode png");

        let tex = TextureData::decode(&bytes).expect("decode");
        assert_eq!((tex.width, tex.height), (3, 2));
        assert_eq!(&tex.data[..4], &[10, 20, 30, 255]);
        assert!(tex.is_valid());
    }

    #[test]
    fn decode_garbage_is_an_error() {
        assert!(matches!(
            TextureData::decode(b"definitely not an image"),
            Err(AssetError::Decode(_))
        ));
    }

    #[test]
    fn mip_chain_reaches_one_by_one() {
        let levels = solid(8, 2, [200, 100, 50, 255]).mip_chain();
        let sizes: Vec<_> = levels.iter().map(|l| (l.width, l.height)).collect();
        assert_eq!(sizes, vec![(8, 2), (4, 1), (2, 1), (1, 1)]);
        assert!(levels.iter().all(TextureData::is_valid));
        // A solid color stays the same color at every level.
        assert_eq!(&levels[3].data, &[200, 100, 50, 255]);
    }

    #[test]
    fn downsample_averages_blocks() {
        let data = vec![
            0, 0, 0, 255, 255, 255, 255, 255, //
            255, 255, 255, 255, 0, 0, 0, 255,
        ];
        let half = TextureData::new_rgba8(2, 2, data).unwrap().downsample();
        assert_eq!(half.data, vec![127, 127, 127, 255]);
    }

    #[test]
    fn every_texture_gets_a_fresh_id() {
        let a = Texture::new(
            TextureSource::asset("a.png"),
            solid(2, 2, [1, 2, 3, 4]),
            TextureSettings::SURFACE,
        );
        let b = Texture::new(
            TextureSource::asset("a.png"),
            solid(2, 2, [1, 2, 3, 4]),
            TextureSettings::SURFACE,
        );
        assert_ne!(a.id(), b.id());
        assert_eq!(a.clone().id(), a.id());
        assert_eq!(a.levels().len(), 2);
    }

    #[test]
    fn surface_settings_match_room_defaults() {
        let s = TextureSettings::default();
        assert_eq!(s.color_space, ColorSpace::Srgb);
        assert_eq!((s.wrap_u, s.wrap_v), (WrapMode::Repeat, WrapMode::Repeat));
        assert_eq!(s.repeat, [2.0, 2.0]);
        assert!(s.generate_mipmaps);
        assert_eq!(s.min_filter, FilterMode::Linear);
        assert_eq!(s.mipmap_filter, FilterMode::Linear);
    }
}
