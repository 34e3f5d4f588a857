//! Deterministic simulation module
//!
//! Pools, sphere physics, rising water and the camera live here. This module
//! stays free of graphics APIs:
//! - Seeded RNG only
//! - Input arrives through a queue drained at tick start
//! - Fluid handles and caustic targets are reached through the render seam

pub mod camera;
pub mod fluid;
pub mod input;
pub mod interaction;
pub mod physics;
pub mod pool;
pub mod ray;
pub mod rising;
pub mod state;
pub mod tick;
pub mod transition;

pub use camera::{CameraState, Lens, PixelRaycaster, Viewport};
pub use fluid::FluidSurface;
pub use input::{InputEvent, InputQueue};
pub use interaction::{
    DragPlane, DropBrush, Feedback, HitTarget, InteractionDispatcher, InteractionMode, hit_test,
};
pub use physics::{Bounce, PhysicsIntegrator, RigidSphere};
pub use pool::{ContainerRegistry, Pool, ScrollState};
pub use ray::Ray;
pub use rising::{LevelStep, Ripple, RippleScheduler, RisingWaterController};
pub use state::{SimEvent, TickReport, World};
pub use tick::tick;
pub use transition::{CameraTransition, CameraTransitionController, TransitionStep, ease_in_out};
