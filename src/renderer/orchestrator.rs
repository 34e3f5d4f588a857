//! Multi-pool frame drawing

use super::backend::{FrameView, PoolRenderContext, RenderBackend, WaterPass};
use crate::mesh::Model;
use crate::sim::pool::Pool;

/// Draws every pool in registry order. Each pool gets its own context, so
/// one pool's level or sphere never leaks into the next.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOrchestrator;

impl RenderOrchestrator {
    pub fn render<'a, B, I>(
        backend: &mut B,
        frame: &FrameView,
        pools: I,
        model: Option<&Model>,
    ) -> Result<(), B::Error>
    where
        B: RenderBackend,
        B::Fluid: 'a,
        B::Caustics: 'a,
        I: IntoIterator<Item = (&'a Pool<B::Fluid, B::Caustics>, PoolRenderContext)>,
    {
        backend.begin_frame(frame)?;
        for (pool, ctx) in pools {
            backend.draw_walls(&pool.fluid, &pool.caustics, &ctx);
            for pass in WaterPass::ORDER {
                backend.draw_water(&pool.fluid, &pool.caustics, &ctx, pass);
            }
            if let Some(model) = model {
                backend.draw_model(model, &ctx);
            }
        }
        backend.end_frame()
    }
}
