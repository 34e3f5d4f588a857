//! Rendering module
//!
//! The simulation talks to graphics through [`RenderBackend`]. The wgpu
//! backend draws real frames; the headless backend records calls for tests
//! and the native driver.

pub mod backend;
pub mod gpu;
pub mod headless;
pub mod orchestrator;
pub mod shapes;
pub mod vertex;

pub use backend::{FrameView, PoolRenderContext, RenderBackend, WaterPass};
pub use gpu::{GpuBackend, GpuCaustics, GpuFluid, ShaderSet};
pub use headless::{DrawCall, FluidOp, HeadlessBackend, HeadlessCaustics, HeadlessFluid};
pub use orchestrator::RenderOrchestrator;
