//! wgpu backend
//!
//! Draws walls, two-pass water and the model for every pool, and projects
//! caustics into per-pool targets. The fluid height field and the WGSL
//! sources come from the caller.

use std::collections::HashMap;
use std::marker::PhantomData;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3};
use wgpu::util::DeviceExt;

use super::backend::{FrameView, PoolRenderContext, RenderBackend, WaterPass};
use super::shapes::{self, MeshData, WATER_DETAIL};
use super::vertex::{MeshVertex, colors};
use crate::error::InitError;
use crate::mesh::Model;
use crate::sim::camera::Viewport;
use crate::sim::fluid::FluidSurface;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const CAUSTICS_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
/// Draw slots the uniform ring starts with; it doubles when a frame needs more
const INITIAL_UNIFORM_SLOTS: usize = 64;

// ============================================================================
// GPU DATA STRUCTURES (must match shader)
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
struct PoolUniform {
    view_proj: [[f32; 4]; 4], // offset 0
    model: [[f32; 4]; 4],     // offset 64
    eye: [f32; 4],            // offset 128 (pool-local)
    light_dir: [f32; 4],      // offset 144
    sphere: [f32; 4],         // offset 160 - xyz center, w radius
    color: [f32; 4],          // offset 176 - model color
    water_level: f32,         // offset 192
    pool_height: f32,         // offset 196
    _pad: [f32; 2],           // pad to 208
}

impl PoolUniform {
    fn new(view_proj: Mat4, model: Mat4, ctx: &PoolRenderContext, color: [f32; 3]) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            eye: ctx.eye.extend(1.0).to_array(),
            light_dir: ctx.light_dir.extend(0.0).to_array(),
            sphere: ctx.sphere_center.extend(ctx.sphere_radius).to_array(),
            color: [color[0], color[1], color[2], 1.0],
            water_level: ctx.water_level,
            pool_height: ctx.pool_height,
            _pad: [0.0; 2],
        }
    }
}

/// Uniform slot size rounded up to the device's dynamic offset alignment
fn uniform_stride(alignment: u64) -> u64 {
    let size = std::mem::size_of::<PoolUniform>() as u64;
    let alignment = alignment.max(1);
    size.div_ceil(alignment) * alignment
}

// ============================================================================
// RESOURCES
// ============================================================================

/// A height field living on the GPU
pub trait GpuFluid: FluidSurface + Sized {
    fn create(device: &wgpu::Device, queue: &wgpu::Queue) -> Result<Self, InitError>;

    /// Current field: height in r, velocity in g, normal xz in ba
    fn texture_view(&self) -> &wgpu::TextureView;
}

/// Per-pool caustic target
pub struct GpuCaustics {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub size: u32,
}

/// WGSL sources. Every module has `vs_main`; walls, model and caustics have
/// `fs_main`, water has `fs_underside` and `fs_topside`.
#[derive(Debug, Clone, Copy)]
pub struct ShaderSet<'a> {
    pub walls: &'a str,
    pub water: &'a str,
    pub model: &'a str,
    pub caustics: &'a str,
}

struct GpuMesh {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
}

impl GpuMesh {
    fn upload(device: &wgpu::Device, label: &str, data: &MeshData) -> Self {
        let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&data.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&data.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertices,
            indices,
            index_count: data.indices.len() as u32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DrawKind {
    Walls,
    Water(WaterPass),
    Model,
}

struct PendingDraw {
    kind: DrawKind,
    /// Slot in the frame's pool textures
    textures: Option<usize>,
}

/// One resource per pool, shared by every draw of that pool in a frame
#[derive(Debug)]
struct PoolSlots<T> {
    items: Vec<T>,
    by_pool: HashMap<usize, usize>,
}

impl<T> PoolSlots<T> {
    fn new() -> Self {
        Self {
            items: Vec::new(),
            by_pool: HashMap::new(),
        }
    }

    fn slot(&self, pool: usize) -> Option<usize> {
        self.by_pool.get(&pool).copied()
    }

    fn insert(&mut self, pool: usize, item: T) -> usize {
        let slot = self.items.len();
        self.items.push(item);
        self.by_pool.insert(pool, slot);
        slot
    }

    fn get(&self, slot: usize) -> Option<&T> {
        self.items.get(slot)
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

/// Draws collected between `begin_frame` and `end_frame`
struct Frame {
    output: wgpu::SurfaceTexture,
    view_proj: Mat4,
    uniforms: Vec<PoolUniform>,
    draws: Vec<PendingDraw>,
    textures: PoolSlots<wgpu::BindGroup>,
}

struct Pipelines {
    walls: wgpu::RenderPipeline,
    water_underside: wgpu::RenderPipeline,
    water_topside: wgpu::RenderPipeline,
    model: wgpu::RenderPipeline,
    caustics: wgpu::RenderPipeline,
}

// ============================================================================
// BACKEND
// ============================================================================

pub struct GpuBackend<F: GpuFluid> {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    float_targets: bool,
    depth_view: wgpu::TextureView,
    pipelines: Pipelines,

    uniform_layout: wgpu::BindGroupLayout,
    pool_layout: wgpu::BindGroupLayout,
    fluid_layout: wgpu::BindGroupLayout,
    uniform_stride: u64,
    uniform_slots: usize,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    caustics_uniform: wgpu::Buffer,
    caustics_bind_group: wgpu::BindGroup,

    linear_sampler: wgpu::Sampler,
    nearest_sampler: wgpu::Sampler,
    tiles: wgpu::TextureView,
    sky: wgpu::TextureView,

    plane: GpuMesh,
    cube: GpuMesh,
    model: Option<GpuMesh>,
    frame: Option<Frame>,
    _fluid: PhantomData<F>,
}

impl<F: GpuFluid> GpuBackend<F> {
    pub async fn new(
        surface: wgpu::Surface<'static>,
        adapter: &wgpu::Adapter,
        width: u32,
        height: u32,
        shaders: &ShaderSet<'_>,
    ) -> Result<Self, InitError> {
        let float_targets = float_targets_renderable(adapter);
        log::info!("Float render targets: {float_targets}");

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("water-cascade-device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_webgl2_defaults(),
                memory_hints: Default::default(),
                trace: Default::default(),
                experimental_features: Default::default(),
            })
            .await?;

        let surface_caps = surface.get_capabilities(adapter);
        log::info!("Surface formats: {:?}", surface_caps.formats);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(InitError::NoSurfaceFormat)?;
        log::info!("Using surface format: {surface_format:?}");

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        let depth_view = create_depth_view(&device, config.width, config.height);

        // Bind group layouts
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("pool_uniform_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<PoolUniform>() as u64,
                    ),
                },
                count: None,
            }],
        });
        let pool_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("pool_textures_layout"),
            entries: &[
                sampler_entry(0, wgpu::SamplerBindingType::Filtering),
                texture_entry(1, false, wgpu::TextureViewDimension::D2),
                texture_entry(2, true, wgpu::TextureViewDimension::D2),
                texture_entry(3, true, wgpu::TextureViewDimension::D2),
                texture_entry(4, true, wgpu::TextureViewDimension::Cube),
                sampler_entry(5, wgpu::SamplerBindingType::NonFiltering),
            ],
        });
        let fluid_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("fluid_layout"),
            entries: &[
                sampler_entry(0, wgpu::SamplerBindingType::NonFiltering),
                texture_entry(1, false, wgpu::TextureViewDimension::D2),
            ],
        });

        let pipelines = create_pipelines(
            &device,
            shaders,
            config.format,
            &uniform_layout,
            &pool_layout,
            &fluid_layout,
        );

        let uniform_stride = uniform_stride(device.limits().min_uniform_buffer_offset_alignment as u64);
        let uniform_buffer = create_uniform_buffer(&device, uniform_stride, INITIAL_UNIFORM_SLOTS);
        let uniform_bind_group =
            create_uniform_bind_group(&device, &uniform_layout, &uniform_buffer);
        let caustics_uniform = create_uniform_buffer(&device, uniform_stride, 1);
        let caustics_bind_group =
            create_uniform_bind_group(&device, &uniform_layout, &caustics_uniform);

        let linear_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("linear_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let nearest_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("nearest_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            ..Default::default()
        });

        let (tiles, sky) = placeholder_scene_textures(&device, &queue);
        let plane = GpuMesh::upload(&device, "water_plane", &shapes::water_plane(WATER_DETAIL));
        let cube = GpuMesh::upload(&device, "pool_cube", &shapes::open_cube());

        Ok(Self {
            surface,
            device,
            queue,
            config,
            float_targets,
            depth_view,
            pipelines,
            uniform_layout,
            pool_layout,
            fluid_layout,
            uniform_stride,
            uniform_slots: INITIAL_UNIFORM_SLOTS,
            uniform_buffer,
            uniform_bind_group,
            caustics_uniform,
            caustics_bind_group,
            linear_sampler,
            nearest_sampler,
            tiles,
            sky,
            plane,
            cube,
            model: None,
            frame: None,
            _fluid: PhantomData,
        })
    }

    /// Replace the placeholder tile texture and sky cubemap
    pub fn set_scene_textures(&mut self, tiles: wgpu::TextureView, sky: wgpu::TextureView) {
        self.tiles = tiles;
        self.sky = sky;
    }

    fn pool_bind_group(&self, fluid: &F, caustics: &GpuCaustics) -> wgpu::BindGroup {
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("pool_textures"),
            layout: &self.pool_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Sampler(&self.linear_sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(fluid.texture_view()),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&caustics.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&self.tiles),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::TextureView(&self.sky),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: wgpu::BindingResource::Sampler(&self.nearest_sampler),
                },
            ],
        })
    }

    fn fluid_bind_group(&self, fluid: &F) -> wgpu::BindGroup {
        self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("fluid_texture"),
            layout: &self.fluid_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Sampler(&self.nearest_sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(fluid.texture_view()),
                },
            ],
        })
    }

    fn push_draw(
        &mut self,
        kind: DrawKind,
        model: Mat4,
        ctx: &PoolRenderContext,
        color: [f32; 3],
        textures: Option<usize>,
    ) {
        let Some(frame) = self.frame.as_mut() else {
            log::debug!("Draw outside a frame ignored: {kind:?}");
            return;
        };
        frame
            .uniforms
            .push(PoolUniform::new(frame.view_proj, model, ctx, color));
        frame.draws.push(PendingDraw { kind, textures });
    }

    /// The frame's texture bind group for pool `index`, built on first use
    fn pool_textures(&mut self, fluid: &F, caustics: &GpuCaustics, index: usize) -> Option<usize> {
        if let Some(slot) = self.frame.as_ref()?.textures.slot(index) {
            return Some(slot);
        }
        let group = self.pool_bind_group(fluid, caustics);
        self.frame
            .as_mut()
            .map(|frame| frame.textures.insert(index, group))
    }

    /// Grow the uniform ring so `slots` draws fit
    fn reserve_uniform_slots(&mut self, slots: usize) {
        if slots <= self.uniform_slots {
            return;
        }
        let mut capacity = self.uniform_slots.max(1);
        while capacity < slots {
            capacity *= 2;
        }
        log::debug!("Growing uniform ring to {capacity} slots");
        self.uniform_buffer = create_uniform_buffer(&self.device, self.uniform_stride, capacity);
        self.uniform_bind_group =
            create_uniform_bind_group(&self.device, &self.uniform_layout, &self.uniform_buffer);
        self.uniform_slots = capacity;
    }
}

impl<F: GpuFluid> RenderBackend for GpuBackend<F> {
    type Fluid = F;
    type Caustics = GpuCaustics;
    type Error = wgpu::SurfaceError;

    fn supports_float_render_targets(&self) -> bool {
        self.float_targets
    }

    fn create_fluid(&mut self) -> Result<F, InitError> {
        F::create(&self.device, &self.queue)
    }

    fn create_caustics(&mut self, size: u32) -> Result<GpuCaustics, InitError> {
        let max = self.device.limits().max_texture_dimension_2d;
        if size == 0 || size > max {
            return Err(InitError::Allocation {
                what: "caustic target",
                reason: format!("size {size} outside 1..={max}"),
            });
        }
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("caustics"),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: CAUSTICS_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Ok(GpuCaustics {
            texture,
            view,
            size,
        })
    }

    fn update_caustics(&mut self, fluid: &F, caustics: &mut GpuCaustics, ctx: &PoolRenderContext) {
        let uniform = PoolUniform::new(Mat4::IDENTITY, Mat4::IDENTITY, ctx, [1.0; 3]);
        self.queue
            .write_buffer(&self.caustics_uniform, 0, bytemuck::bytes_of(&uniform));
        let textures = self.fluid_bind_group(fluid);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("caustics_encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("caustics_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &caustics.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
            pass.set_pipeline(&self.pipelines.caustics);
            pass.set_bind_group(0, &self.caustics_bind_group, &[0]);
            pass.set_bind_group(1, &textures, &[]);
            pass.set_vertex_buffer(0, self.plane.vertices.slice(..));
            pass.set_index_buffer(self.plane.indices.slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..self.plane.index_count, 0, 0..1);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }

    fn prepare_model(&mut self, model: &Model) {
        let data = shapes::model_mesh(&model.mesh);
        self.model = Some(GpuMesh::upload(&self.device, "model", &data));
    }

    fn resize(&mut self, viewport: Viewport) {
        let (width, height) = (viewport.width as u32, viewport.height as u32);
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
            self.depth_view = create_depth_view(&self.device, width, height);
        }
    }

    fn begin_frame(&mut self, frame: &FrameView) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        self.frame = Some(Frame {
            output,
            view_proj: frame.view_proj,
            uniforms: Vec::new(),
            draws: Vec::new(),
            textures: PoolSlots::new(),
        });
        Ok(())
    }

    fn draw_walls(&mut self, fluid: &F, caustics: &GpuCaustics, ctx: &PoolRenderContext) {
        let textures = self.pool_textures(fluid, caustics, ctx.index);
        self.push_draw(DrawKind::Walls, ctx.model_matrix(), ctx, [1.0; 3], textures);
    }

    fn draw_water(&mut self, fluid: &F, caustics: &GpuCaustics, ctx: &PoolRenderContext, pass: WaterPass) {
        let textures = self.pool_textures(fluid, caustics, ctx.index);
        self.push_draw(DrawKind::Water(pass), ctx.model_matrix(), ctx, [1.0; 3], textures);
    }

    fn draw_model(&mut self, model: &Model, ctx: &PoolRenderContext) {
        let transform = ctx.model_matrix()
            * Mat4::from_scale_rotation_translation(
                Vec3::splat(model.scale),
                Quat::IDENTITY,
                model.position,
            );
        self.push_draw(DrawKind::Model, transform, ctx, model.color, None);
    }

    fn end_frame(&mut self) -> Result<(), wgpu::SurfaceError> {
        let Some(frame) = self.frame.take() else {
            return Ok(());
        };
        log::trace!(
            "Frame: {} draws, {} pool bind groups",
            frame.draws.len(),
            frame.textures.len()
        );
        self.reserve_uniform_slots(frame.uniforms.len());

        let stride = self.uniform_stride as usize;
        let mut bytes = vec![0u8; stride * frame.uniforms.len()];
        for (slot, uniform) in bytes.chunks_mut(stride).zip(&frame.uniforms) {
            let raw = bytemuck::bytes_of(uniform);
            slot[..raw.len()].copy_from_slice(raw);
        }
        if !bytes.is_empty() {
            self.queue.write_buffer(&self.uniform_buffer, 0, &bytes);
        }

        let view = frame
            .output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("pools_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: colors::BACKGROUND[0] as f64,
                            g: colors::BACKGROUND[1] as f64,
                            b: colors::BACKGROUND[2] as f64,
                            a: colors::BACKGROUND[3] as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            for (i, draw) in frame.draws.iter().enumerate() {
                let (pipeline, mesh) = match draw.kind {
                    DrawKind::Walls => (&self.pipelines.walls, &self.cube),
                    DrawKind::Water(WaterPass::Underside) => {
                        (&self.pipelines.water_underside, &self.plane)
                    }
                    DrawKind::Water(WaterPass::Topside) => {
                        (&self.pipelines.water_topside, &self.plane)
                    }
                    DrawKind::Model => match &self.model {
                        Some(mesh) => (&self.pipelines.model, mesh),
                        None => continue,
                    },
                };
                pass.set_pipeline(pipeline);
                pass.set_bind_group(0, &self.uniform_bind_group, &[(i * stride) as u32]);
                if let Some(textures) = draw.textures.and_then(|slot| frame.textures.get(slot)) {
                    pass.set_bind_group(1, textures, &[]);
                }
                pass.set_vertex_buffer(0, mesh.vertices.slice(..));
                pass.set_index_buffer(mesh.indices.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        frame.output.present();
        Ok(())
    }
}

// ============================================================================
// SETUP HELPERS
// ============================================================================

fn float_targets_renderable(adapter: &wgpu::Adapter) -> bool {
    [wgpu::TextureFormat::Rgba32Float, wgpu::TextureFormat::Rgba16Float]
        .into_iter()
        .any(|format| {
            adapter
                .get_texture_format_features(format)
                .allowed_usages
                .contains(wgpu::TextureUsages::RENDER_ATTACHMENT)
        })
}

fn sampler_entry(binding: u32, ty: wgpu::SamplerBindingType) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
        ty: wgpu::BindingType::Sampler(ty),
        count: None,
    }
}

fn texture_entry(
    binding: u32,
    filterable: bool,
    view_dimension: wgpu::TextureViewDimension,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable },
            view_dimension,
            multisampled: false,
        },
        count: None,
    }
}

fn create_uniform_buffer(device: &wgpu::Device, stride: u64, slots: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("pool_uniforms"),
        size: stride * slots as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_uniform_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("pool_uniforms"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer,
                offset: 0,
                size: wgpu::BufferSize::new(std::mem::size_of::<PoolUniform>() as u64),
            }),
        }],
    })
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    device
        .create_texture(&wgpu::TextureDescriptor {
            label: Some("depth"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
        .create_view(&wgpu::TextureViewDescriptor::default())
}

/// 1x1 white tiles and a 1x1 grey sky, until real assets are supplied
fn placeholder_scene_textures(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
) -> (wgpu::TextureView, wgpu::TextureView) {
    let tiles = device
        .create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some("tiles_placeholder"),
                size: wgpu::Extent3d {
                    width: 1,
                    height: 1,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &[255, 255, 255, 255],
        )
        .create_view(&wgpu::TextureViewDescriptor::default());

    let sky = device
        .create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some("sky_placeholder"),
                size: wgpu::Extent3d {
                    width: 1,
                    height: 1,
                    depth_or_array_layers: 6,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            &[128u8; 4 * 6],
        )
        .create_view(&wgpu::TextureViewDescriptor {
            label: Some("sky_cube"),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });

    (tiles, sky)
}

fn create_pipelines(
    device: &wgpu::Device,
    shaders: &ShaderSet<'_>,
    format: wgpu::TextureFormat,
    uniform_layout: &wgpu::BindGroupLayout,
    pool_layout: &wgpu::BindGroupLayout,
    fluid_layout: &wgpu::BindGroupLayout,
) -> Pipelines {
    let module = |label: &str, source: &str| {
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(source.to_owned().into()),
        })
    };
    let walls = module("walls_shader", shaders.walls);
    let water = module("water_shader", shaders.water);
    let model = module("model_shader", shaders.model);
    let caustics = module("caustics_shader", shaders.caustics);

    let pool_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("pool_pipeline_layout"),
        bind_group_layouts: &[uniform_layout, pool_layout],
        immediate_size: 0,
    });
    let model_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("model_pipeline_layout"),
        bind_group_layouts: &[uniform_layout],
        immediate_size: 0,
    });
    let caustics_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("caustics_pipeline_layout"),
        bind_group_layouts: &[uniform_layout, fluid_layout],
        immediate_size: 0,
    });

    let depth = Some(wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: true,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    });

    let mesh_pipeline = |label: &str,
                         layout: &wgpu::PipelineLayout,
                         shader: &wgpu::ShaderModule,
                         fs_entry: &str,
                         target: wgpu::TextureFormat,
                         cull_mode: Option<wgpu::Face>,
                         depth_stencil: Option<wgpu::DepthStencilState>| {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(layout),
            vertex: wgpu::VertexState {
                module: shader,
                entry_point: Some("vs_main"),
                buffers: &[MeshVertex::desc()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: shader,
                entry_point: Some(fs_entry),
                targets: &[Some(wgpu::ColorTargetState {
                    format: target,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        })
    };

    Pipelines {
        walls: mesh_pipeline(
            "walls_pipeline",
            &pool_pipeline_layout,
            &walls,
            "fs_main",
            format,
            Some(wgpu::Face::Back),
            depth.clone(),
        ),
        water_underside: mesh_pipeline(
            "water_underside_pipeline",
            &pool_pipeline_layout,
            &water,
            "fs_underside",
            format,
            Some(wgpu::Face::Front),
            depth.clone(),
        ),
        water_topside: mesh_pipeline(
            "water_topside_pipeline",
            &pool_pipeline_layout,
            &water,
            "fs_topside",
            format,
            Some(wgpu::Face::Back),
            depth.clone(),
        ),
        model: mesh_pipeline(
            "model_pipeline",
            &model_pipeline_layout,
            &model,
            "fs_main",
            format,
            Some(wgpu::Face::Back),
            depth,
        ),
        caustics: mesh_pipeline(
            "caustics_pipeline",
            &caustics_pipeline_layout,
            &caustics,
            "fs_main",
            CAUSTICS_FORMAT,
            None,
            None,
        ),
    }
}
