//! Recording backend without a GPU
//!
//! Used by the native driver and by tests: fluid handles log the operations
//! applied to them, and the backend logs every draw with the pool context it
//! received.

use std::convert::Infallible;

use glam::Vec3;

use super::backend::{FrameView, PoolRenderContext, RenderBackend, WaterPass};
use crate::error::InitError;
use crate::mesh::Model;
use crate::sim::camera::Viewport;
use crate::sim::fluid::FluidSurface;
use crate::sim::state::World;

/// One call made on a [`HeadlessFluid`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FluidOp {
    AddDrop {
        x: f32,
        z: f32,
        radius: f32,
        strength: f32,
    },
    MoveSphere {
        from: Vec3,
        to: Vec3,
        radius: f32,
    },
    Step,
    UpdateNormals,
}

#[derive(Debug, Clone, Default)]
pub struct HeadlessFluid {
    pub id: usize,
    ops: Vec<FluidOp>,
}

impl HeadlessFluid {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            ops: Vec::new(),
        }
    }

    pub fn ops(&self) -> &[FluidOp] {
        &self.ops
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }
}

impl FluidSurface for HeadlessFluid {
    fn add_drop(&mut self, x: f32, z: f32, radius: f32, strength: f32) {
        self.ops.push(FluidOp::AddDrop {
            x,
            z,
            radius,
            strength,
        });
    }

    fn move_sphere(&mut self, old_center: Vec3, new_center: Vec3, radius: f32) {
        self.ops.push(FluidOp::MoveSphere {
            from: old_center,
            to: new_center,
            radius,
        });
    }

    fn step_simulation(&mut self) {
        self.ops.push(FluidOp::Step);
    }

    fn update_normals(&mut self) {
        self.ops.push(FluidOp::UpdateNormals);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadlessCaustics {
    pub id: usize,
    pub size: u32,
    /// Times this target was re-projected
    pub refreshes: u32,
}

/// A recorded backend call
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawCall {
    BeginFrame,
    Caustics { fluid: usize, water_level: f32 },
    Walls { fluid: usize, ctx: PoolRenderContext },
    Water { fluid: usize, ctx: PoolRenderContext, pass: WaterPass },
    Model { ctx: PoolRenderContext },
    EndFrame,
}

#[derive(Debug, Clone)]
pub struct HeadlessBackend {
    float_targets: bool,
    next_id: usize,
    /// Remaining allocations before `create_*` starts failing (None: unlimited)
    allocation_budget: Option<usize>,
    pub calls: Vec<DrawCall>,
    pub viewport: Viewport,
    pub prepared_models: usize,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self {
            float_targets: true,
            next_id: 0,
            allocation_budget: None,
            calls: Vec::new(),
            viewport: Viewport::default(),
            prepared_models: 0,
        }
    }

    /// A backend that reports float render targets as unsupported
    pub fn without_float_targets() -> Self {
        Self {
            float_targets: false,
            ..Self::new()
        }
    }

    /// Fail every allocation after the next `count`
    pub fn with_allocation_budget(mut self, count: usize) -> Self {
        self.allocation_budget = Some(count);
        self
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    fn allocate(&mut self, what: &'static str) -> Result<usize, InitError> {
        if let Some(budget) = self.allocation_budget.as_mut() {
            if *budget == 0 {
                return Err(InitError::Allocation {
                    what,
                    reason: "allocation budget exhausted".into(),
                });
            }
            *budget -= 1;
        }
        let id = self.next_id;
        self.next_id += 1;
        Ok(id)
    }
}

impl RenderBackend for HeadlessBackend {
    type Fluid = HeadlessFluid;
    type Caustics = HeadlessCaustics;
    type Error = Infallible;

    fn supports_float_render_targets(&self) -> bool {
        self.float_targets
    }

    fn create_fluid(&mut self) -> Result<HeadlessFluid, InitError> {
        self.allocate("fluid").map(HeadlessFluid::new)
    }

    fn create_caustics(&mut self, size: u32) -> Result<HeadlessCaustics, InitError> {
        let id = self.allocate("caustic target")?;
        Ok(HeadlessCaustics {
            id,
            size,
            refreshes: 0,
        })
    }

    fn update_caustics(
        &mut self,
        fluid: &HeadlessFluid,
        caustics: &mut HeadlessCaustics,
        ctx: &PoolRenderContext,
    ) {
        caustics.refreshes += 1;
        self.calls.push(DrawCall::Caustics {
            fluid: fluid.id,
            water_level: ctx.water_level,
        });
    }

    fn prepare_model(&mut self, _model: &Model) {
        self.prepared_models += 1;
    }

    fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn begin_frame(&mut self, _frame: &FrameView) -> Result<(), Infallible> {
        self.calls.push(DrawCall::BeginFrame);
        Ok(())
    }

    fn draw_walls(&mut self, fluid: &HeadlessFluid, _caustics: &HeadlessCaustics, ctx: &PoolRenderContext) {
        self.calls.push(DrawCall::Walls {
            fluid: fluid.id,
            ctx: *ctx,
        });
    }

    fn draw_water(
        &mut self,
        fluid: &HeadlessFluid,
        _caustics: &HeadlessCaustics,
        ctx: &PoolRenderContext,
        pass: WaterPass,
    ) {
        self.calls.push(DrawCall::Water {
            fluid: fluid.id,
            ctx: *ctx,
            pass,
        });
    }

    fn draw_model(&mut self, _model: &Model, ctx: &PoolRenderContext) {
        self.calls.push(DrawCall::Model { ctx: *ctx });
    }

    fn end_frame(&mut self) -> Result<(), Infallible> {
        self.calls.push(DrawCall::EndFrame);
        Ok(())
    }
}

impl World<HeadlessBackend> {
    /// Drop every recorded draw call and fluid op
    pub fn clear_recordings(&mut self) {
        self.backend_mut().clear_calls();
        for pool in self.registry.iter_mut() {
            pool.fluid.clear_ops();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::input::InputEvent;
    use crate::sim::tick::tick;

    #[test]
    fn test_clear_recordings_keeps_long_runs_bounded() {
        let settings = Settings {
            fill_rate_lps: 100_000.0,
            ..Default::default()
        };
        let mut world = World::new(settings, HeadlessBackend::new()).unwrap();
        world.push_input(InputEvent::ToggleRising);
        world.push_input(InputEvent::TogglePhysics);

        let mut most = 0;
        for _ in 0..1200 {
            tick(&mut world, 1.0 / 60.0);
            world.render().unwrap();
            let recorded = world.backend().calls.len()
                + world
                    .registry
                    .iter()
                    .map(|pool| pool.fluid.ops().len())
                    .sum::<usize>();
            most = most.max(recorded);
            world.clear_recordings();
        }
        assert!(world.registry.len() > 2);
        assert!(world.backend().calls.is_empty());
        assert!(world.registry.iter().all(|pool| pool.fluid.ops().is_empty()));
        // One tick and one frame worth of recordings at most
        assert!(most < 200, "recorded {most} entries in a single tick");
    }
}
