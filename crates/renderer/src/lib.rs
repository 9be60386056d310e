//! Renderer: wgpu init + depth + textured room surfaces.
//! wgpu = 23.x, winit = 0.30.x

mod gpu_texture;

use std::f32::consts::FRAC_1_PI;
use std::sync::Arc;

use anyhow::{Context, Result};
use bytemuck::{Pod, Zeroable};
use corelib::scene::{SceneState, Surface};
use glam::Vec4;
use wgpu::{
    BindGroup, BindGroupLayout, BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingType,
    BlendState, Buffer, BufferBindingType, BufferUsages, ColorTargetState, ColorWrites,
    CommandBuffer, CommandEncoder, CommandEncoderDescriptor, DepthBiasState, DepthStencilState,
    Device, DeviceDescriptor, Extent3d, Features, FragmentState, Instance, InstanceDescriptor,
    Limits, LoadOp, Operations, PipelineLayoutDescriptor, PowerPreference, PresentMode, Queue,
    RenderPassColorAttachment, RenderPassDescriptor, RenderPipeline, RenderPipelineDescriptor,
    ShaderModuleDescriptor, ShaderSource, ShaderStages, StoreOp, Surface as WgpuSurface,
    SurfaceConfiguration, SurfaceError, TextureDescriptor, TextureDimension, TextureFormat,
    TextureUsages, TextureView, TextureViewDescriptor, VertexBufferLayout, VertexState,
    VertexStepMode, util::DeviceExt,
};
use winit::{dpi::PhysicalSize, window::Window};

pub use gpu_texture::GpuTexture;

/// Vertex: position + normal + uv.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}
impl Vertex {
    pub const LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2],
    };
}

/// Per-frame UBO (16-byte aligned).
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct FrameUniform {
    view_proj: [[f32; 4]; 4],
    camera_pos: [f32; 4],
    ambient: [f32; 4],
    light_dir: [f32; 4],
    light_color: [f32; 4],
}

/// Per-surface UBO.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct SurfaceUniform {
    model: [[f32; 4]; 4],
    emissive: [f32; 4],
    params: [f32; 4],
}

const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

/// Resources for drawing one room surface.
struct GpuSurface {
    vertex_buf: Buffer,
    index_buf: Buffer,
    index_count: u32,
    uniform_buf: Buffer,
    map: GpuTexture,
    bind_group: BindGroup,
}

/// What an overlay (UI) pass gets to draw into the current frame.
pub struct FrameTarget<'a> {
    pub device: &'a Device,
    pub queue: &'a Queue,
    pub encoder: &'a mut CommandEncoder,
    pub view: &'a TextureView,
    pub size: (u32, u32),
}

pub struct GpuState {
    // Surface
    surface: WgpuSurface<'static>,
    surface_format: TextureFormat,
    surface_config: SurfaceConfiguration,

    // Device/queue
    device: Device,
    queue: Queue,

    // Pipeline
    pipeline: RenderPipeline,
    surface_bgl: BindGroupLayout,
    frame_bg: BindGroup,
    frame_buf: Buffer,
    surfaces: Vec<GpuSurface>,

    // Depth
    depth_view: TextureView,

    // Size cache
    width: u32,
    height: u32,
}

impl GpuState {
    /// Create GPU state bound to an Arc<Window> and upload the scene.
    pub async fn new(
        window: Arc<Window>,
        backends: wgpu::Backends,
        scene: &mut SceneState,
    ) -> Result<Self> {
        let PhysicalSize { width, height } = window.inner_size();
        let width = width.max(1);
        let height = height.max(1);

        // Instance & surface
        let instance = Instance::new(InstanceDescriptor {
            backends,
            ..Default::default()
        });
        let surface: WgpuSurface<'static> = instance
            .create_surface(window.clone())
            .context("create_surface failed")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No suitable GPU adapter")?;
        log::info!("Using adapter: {:?}", adapter.get_info());

        let (device, queue) = adapter
            .request_device(
                &DeviceDescriptor {
                    label: Some("Room Device"),
                    required_features: Features::empty(),
                    required_limits: Limits::downlevel_webgl2_defaults()
                        .using_resolution(adapter.limits()),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .context("request_device failed")?;

        // Surface format (prefer sRGB)
        let caps = surface.get_capabilities(&adapter);
        let surface_format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .context("Surface reports no formats")?;

        let surface_config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: PresentMode::AutoVsync,
            alpha_mode: caps.alpha_modes.first().copied().unwrap_or_default(),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let depth_view = create_depth_view(&device, &surface_config);

        // ==== Shaders ====
        let shader = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("Surface WGSL"),
            source: ShaderSource::Wgsl(include_str!("shaders/surface.wgsl").into()),
        });

        // ==== Frame BGL/BG ====
        let frame_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("Frame BGL"),
            entries: &[uniform_entry(0, ShaderStages::VERTEX_FRAGMENT)],
        });
        let frame_buf = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Frame UBO"),
            size: std::mem::size_of::<FrameUniform>() as u64,
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let frame_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Frame BG"),
            layout: &frame_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buf.as_entire_binding(),
            }],
        });

        // ==== Surface BGL: params + color map + sampler ====
        let surface_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("Surface BGL"),
            entries: &[
                uniform_entry(0, ShaderStages::VERTEX_FRAGMENT),
                BindGroupLayoutEntry {
                    binding: 1,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 2,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        // ==== Pipeline ====
        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("Surface PipelineLayout"),
            bind_group_layouts: &[&frame_bgl, &surface_bgl],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("Surface Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::LAYOUT],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(ColorTargetState {
                    format: surface_format,
                    blend: Some(BlendState::REPLACE),
                    write_mask: ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            // Planes are visible from both sides.
            primitive: wgpu::PrimitiveState {
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let mut state = Self {
            surface,
            surface_format,
            surface_config,
            device,
            queue,
            pipeline,
            surface_bgl,
            frame_bg,
            frame_buf,
            surfaces: Vec::new(),
            depth_view,
            width,
            height,
        };
        let surfaces: Vec<GpuSurface> = scene
            .surfaces_mut()
            .map(|s| state.create_surface(s))
            .collect();
        state.surfaces = surfaces;
        Ok(state)
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> TextureFormat {
        self.surface_format
    }

    fn create_surface(&self, surface: &mut Surface) -> GpuSurface {
        let mesh = surface.mesh();
        let vertices: Vec<Vertex> = mesh
            .vertices
            .iter()
            .map(|v| Vertex {
                pos: v.position,
                normal: v.normal,
                uv: v.uv,
            })
            .collect();
        let label = surface.kind().label();
        let vertex_buf = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(&vertices),
                usage: BufferUsages::VERTEX,
            });
        let index_buf = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::cast_slice(&mesh.indices),
                usage: BufferUsages::INDEX,
            });
        let uniform_buf = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents: bytemuck::bytes_of(&surface_uniform(surface)),
                usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            });

        surface.material.take_needs_update();
        let map = GpuTexture::upload(&self.device, &self.queue, surface.texture());
        let bind_group = surface_bind_group(&self.device, &self.surface_bgl, &uniform_buf, &map);

        GpuSurface {
            vertex_buf,
            index_buf,
            index_count: mesh.indices.len() as u32,
            uniform_buf,
            map,
            bind_group,
        }
    }

    /// Upload textures of materials marked dirty since the last sync.
    pub fn sync_scene(&mut self, scene: &mut SceneState) {
        for (gpu, surface) in self.surfaces.iter_mut().zip(scene.surfaces_mut()) {
            let dirty = surface.material.take_needs_update();
            if !dirty && gpu.map.id == surface.material.map_id() {
                continue;
            }
            gpu.map = GpuTexture::upload(&self.device, &self.queue, surface.texture());
            gpu.bind_group =
                surface_bind_group(&self.device, &self.surface_bgl, &gpu.uniform_buf, &gpu.map);
            self.queue.write_buffer(
                &gpu.uniform_buf,
                0,
                bytemuck::bytes_of(&surface_uniform(surface)),
            );
        }
    }

    /// Resize: reconfigure surface & recreate depth view.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.surface_config.width = self.width;
        self.surface_config.height = self.height;
        self.surface.configure(&self.device, &self.surface_config);
        self.depth_view = create_depth_view(&self.device, &self.surface_config);
    }

    /// Render one frame of the scene, then let `overlay` record more work
    /// (e.g. UI) into the same encoder. Command buffers it returns are
    /// submitted ahead of the frame.
    pub fn render<F>(&mut self, scene: &SceneState, overlay: F) -> Result<(), SurfaceError>
    where
        F: FnOnce(FrameTarget<'_>) -> Vec<CommandBuffer>,
    {
        self.queue
            .write_buffer(&self.frame_buf, 0, bytemuck::bytes_of(&frame_uniform(scene)));

        let frame = self.surface.get_current_texture()?;
        let view = frame.texture.create_view(&Default::default());

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("MainEncoder"),
            });

        {
            let mut rpass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("MainPass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(wgpu::Color {
                            r: 0.05,
                            g: 0.05,
                            b: 0.08,
                            a: 1.0,
                        }),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            rpass.set_pipeline(&self.pipeline);
            rpass.set_bind_group(0, &self.frame_bg, &[]);
            for gpu in &self.surfaces {
                rpass.set_bind_group(1, &gpu.bind_group, &[]);
                rpass.set_vertex_buffer(0, gpu.vertex_buf.slice(..));
                rpass.set_index_buffer(gpu.index_buf.slice(..), wgpu::IndexFormat::Uint32);
                rpass.draw_indexed(0..gpu.index_count, 0, 0..1);
            }
        }

        let extra = overlay(FrameTarget {
            device: &self.device,
            queue: &self.queue,
            encoder: &mut encoder,
            view: &view,
            size: (self.width, self.height),
        });

        self.queue
            .submit(extra.into_iter().chain(Some(encoder.finish())));
        frame.present();
        Ok(())
    }

    pub fn is_surface_lost(err: &SurfaceError) -> bool {
        matches!(err, SurfaceError::Lost | SurfaceError::Outdated)
    }

    pub fn recreate_surface(&mut self) {
        self.resize(self.width, self.height);
    }
}

fn surface_bind_group(
    device: &Device,
    layout: &BindGroupLayout,
    uniform_buf: &Buffer,
    map: &GpuTexture,
) -> BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Surface BG"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buf.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(&map.view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(&map.sampler),
            },
        ],
    })
}

fn uniform_entry(binding: u32, visibility: ShaderStages) -> BindGroupLayoutEntry {
    BindGroupLayoutEntry {
        binding,
        visibility,
        ty: BindingType::Buffer {
            ty: BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Light intensities are physical; divide by π for a Lambert response.
fn frame_uniform(scene: &SceneState) -> FrameUniform {
    let lights = &scene.lights;
    let ambient = lights.ambient.color * lights.ambient.intensity * FRAC_1_PI;
    let sun = &lights.directional;
    let light_color = sun.color * sun.intensity * FRAC_1_PI;
    FrameUniform {
        view_proj: scene.camera.proj_view().to_cols_array_2d(),
        camera_pos: scene.camera.eye.extend(1.0).to_array(),
        ambient: ambient.extend(1.0).to_array(),
        light_dir: sun.direction().extend(0.0).to_array(),
        light_color: light_color.extend(1.0).to_array(),
    }
}

fn surface_uniform(surface: &Surface) -> SurfaceUniform {
    let material = &surface.material;
    let [repeat_u, repeat_v] = material.map().settings().repeat;
    SurfaceUniform {
        model: surface.transform().matrix().to_cols_array_2d(),
        emissive: material.emissive_radiance().extend(1.0).to_array(),
        params: Vec4::new(material.roughness, material.metalness, repeat_u, repeat_v).to_array(),
    }
}

/// Create a depth texture view matching the surface config.
fn create_depth_view(device: &Device, sc: &SurfaceConfiguration) -> TextureView {
    let tex = device.create_texture(&TextureDescriptor {
        label: Some("DepthTex"),
        size: Extent3d {
            width: sc.width.max(1),
            height: sc.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    tex.create_view(&TextureViewDescriptor::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Mat4, Vec3};

    #[test]
    fn uniforms_are_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<FrameUniform>() % 16, 0);
        assert_eq!(std::mem::size_of::<SurfaceUniform>() % 16, 0);
        assert_eq!(std::mem::size_of::<Vertex>(), 32);
    }

    #[test]
    fn surface_uniform_carries_material_and_repeat() {
        let scene = SceneState::new(640, 480);
        let floor = scene.surface(corelib::SurfaceKind::Floor);
        let u = surface_uniform(floor);
        assert_eq!(u.params, [0.4, 0.1, 2.0, 2.0]);
        assert!((u.emissive[0] - 0.0376).abs() < 1e-3);
    }

    #[test]
    fn frame_uniform_points_light_at_origin() {
        let scene = SceneState::new(640, 480);
        let u = frame_uniform(&scene);
        let dir = Vec3::from_slice(&u.light_dir[..3]);
        assert!((dir + Vec3::ONE.normalize()).length() < 1e-5);
        assert_eq!(u.camera_pos, [0.0, 3.0, 7.0, 1.0]);
        let view_proj = Mat4::from_cols_array_2d(&u.view_proj);
        assert_eq!(view_proj, scene.camera.proj_view());
    }
}
