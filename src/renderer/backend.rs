//! Render seam between the simulation and a graphics API
//!
//! Every draw receives the pool it belongs to as an explicit
//! [`PoolRenderContext`]; backends keep no per-pool scalars of their own.

use glam::{Mat4, Vec3};

use crate::error::InitError;
use crate::mesh::Model;
use crate::sim::camera::Viewport;
use crate::sim::fluid::FluidSurface;

/// Which side of the water surface a pass shades
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaterPass {
    /// Seen from below (front faces culled)
    Underside,
    /// Seen from above (back faces culled)
    Topside,
}

impl WaterPass {
    /// Draw order for the two surface passes
    pub const ORDER: [WaterPass; 2] = [WaterPass::Underside, WaterPass::Topside];
}

/// Camera for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameView {
    pub view_proj: Mat4,
    /// Eye in world space
    pub eye: Vec3,
    pub viewport: Viewport,
}

/// Everything a shader needs to draw one pool
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoolRenderContext {
    pub index: usize,
    /// World translation of the pool
    pub origin: Vec3,
    pub water_level: f32,
    pub pool_height: f32,
    pub light_dir: Vec3,
    /// Pool-local sphere center
    pub sphere_center: Vec3,
    /// Zero hides the sphere from the wall and water shaders
    pub sphere_radius: f32,
    /// Eye relative to the pool origin
    pub eye: Vec3,
}

impl PoolRenderContext {
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.origin)
    }
}

/// A graphics backend able to host any number of pools
pub trait RenderBackend {
    type Fluid: FluidSurface;
    type Caustics;
    type Error: std::error::Error;

    /// Float textures must be renderable for the height field
    fn supports_float_render_targets(&self) -> bool;

    fn create_fluid(&mut self) -> Result<Self::Fluid, InitError>;

    /// Square caustic target with `size` texels per side
    fn create_caustics(&mut self, size: u32) -> Result<Self::Caustics, InitError>;

    /// Project light through the deformed surface into the caustic target
    fn update_caustics(
        &mut self,
        fluid: &Self::Fluid,
        caustics: &mut Self::Caustics,
        ctx: &PoolRenderContext,
    );

    /// Upload a freshly imported model
    fn prepare_model(&mut self, _model: &Model) {}

    fn resize(&mut self, _viewport: Viewport) {}

    fn begin_frame(&mut self, frame: &FrameView) -> Result<(), Self::Error>;

    fn draw_walls(&mut self, fluid: &Self::Fluid, caustics: &Self::Caustics, ctx: &PoolRenderContext);

    fn draw_water(
        &mut self,
        fluid: &Self::Fluid,
        caustics: &Self::Caustics,
        ctx: &PoolRenderContext,
        pass: WaterPass,
    );

    fn draw_model(&mut self, model: &Model, ctx: &PoolRenderContext);

    fn end_frame(&mut self) -> Result<(), Self::Error>;
}
