//! Uploading loaded textures (with their mip chains) to the GPU.

use asset::texture::{ColorSpace, FilterMode, TextureSettings, WrapMode};
use asset::{Texture, TextureId};
use wgpu::{Device, Queue};

/// GPU copy of one [`Texture`].
pub struct GpuTexture {
    pub id: TextureId,
    /// Owns the GPU allocation behind `view`.
    _texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

fn address_mode(wrap: WrapMode) -> wgpu::AddressMode {
    match wrap {
        WrapMode::Repeat => wgpu::AddressMode::Repeat,
        WrapMode::MirroredRepeat => wgpu::AddressMode::MirrorRepeat,
        WrapMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
    }
}

fn filter_mode(filter: FilterMode) -> wgpu::FilterMode {
    match filter {
        FilterMode::Nearest => wgpu::FilterMode::Nearest,
        FilterMode::Linear => wgpu::FilterMode::Linear,
    }
}

fn texture_format(settings: &TextureSettings) -> wgpu::TextureFormat {
    match settings.color_space {
        ColorSpace::Srgb => wgpu::TextureFormat::Rgba8UnormSrgb,
        ColorSpace::Linear => wgpu::TextureFormat::Rgba8Unorm,
    }
}

impl GpuTexture {
    /// Create the texture, write every mip level and build its sampler.
    /// Levels larger than the device allows are skipped, so oversized
    /// images are shown at the biggest mip that fits.
    pub fn upload(device: &Device, queue: &Queue, texture: &Texture) -> Self {
        let max_side = device.limits().max_texture_dimension_2d;
        let levels = texture.levels();
        let first = levels
            .iter()
            .position(|l| l.width <= max_side && l.height <= max_side)
            .unwrap_or(levels.len() - 1);
        let levels = &levels[first..];
        if first > 0 {
            log::warn!(
                "Texture {} is {}x{}, above the {max_side}px limit; using mip {first}",
                texture.source().label(),
                texture.base().width,
                texture.base().height
            );
        }

        let base = &levels[0];
        let settings = texture.settings();
        let gpu = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Surface map"),
            size: wgpu::Extent3d {
                width: base.width,
                height: base.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: levels.len() as u32,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: texture_format(settings),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (mip_level, level) in levels.iter().enumerate() {
            queue.write_texture(
                wgpu::ImageCopyTexture {
                    texture: &gpu,
                    mip_level: mip_level as u32,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                &level.data,
                wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(level.width * level.bytes_per_pixel()),
                    rows_per_image: Some(level.height),
                },
                wgpu::Extent3d {
                    width: level.width,
                    height: level.height,
                    depth_or_array_layers: 1,
                },
            );
        }

        let view = gpu.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Surface sampler"),
            address_mode_u: address_mode(settings.wrap_u),
            address_mode_v: address_mode(settings.wrap_v),
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: filter_mode(settings.mag_filter),
            min_filter: filter_mode(settings.min_filter),
            mipmap_filter: filter_mode(settings.mipmap_filter),
            ..Default::default()
        });

        log::debug!(
            "Uploaded texture {} ({} mip levels)",
            texture.source().label(),
            levels.len()
        );

        Self {
            id: texture.id(),
            _texture: gpu,
            view,
            sampler,
        }
    }
}
