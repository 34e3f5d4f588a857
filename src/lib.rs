//! Water Cascade - interactive multi-pool water surface simulation
//!
//! Core modules:
//! - `sim`: Deterministic simulation (pools, sphere physics, rising water, camera)
//! - `renderer`: Per-frame multi-pool draw orchestration and GPU backends
//! - `mesh`: OBJ/MTL import for the optional dynamic model
//! - `settings`: Data-driven configuration

pub mod error;
pub mod mesh;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use error::{InitError, MeshError, SettingsError};
pub use settings::{RippleSettings, Settings};

use glam::Vec3;

/// Simulation constants that are not exposed as settings
pub mod consts {
    /// Ticks longer than this (seconds) are discarded entirely
    pub const MAX_TICK_DT: f32 = 1.0;
    /// Fluid PDE steps per tick (two half steps for finer effective resolution)
    pub const FLUID_STEPS_PER_TICK: u32 = 2;

    /// Vertical velocity kept after bouncing off the pool floor
    pub const FLOOR_RESTITUTION: f32 = 0.7;
    /// Gravity cancellation factor at full submersion (>1 makes the sphere float up)
    pub const BUOYANCY_FACTOR: f32 = 1.1;
    /// Highest a dragged sphere may be lifted
    pub const SPHERE_MAX_Y: f32 = 10.0;

    /// Pitch limit in degrees (keeps the orbit camera from flipping over the pole)
    pub const PITCH_LIMIT_DEG: f32 = 89.999;

    /// Pool walls span [-1, 1] on x and z in pool-local space
    pub const POOL_HALF_EXTENT: f32 = 1.0;
    /// Height of the pool rim above the still-water plane
    pub const RIM_HEIGHT: f32 = 2.0 / 12.0;

    /// Where the model is placed on reset (pool-local)
    pub const MODEL_HOME: glam::Vec3 = glam::Vec3::new(0.0, -0.75, 0.2);

    /// Shortest allowed time between rising-water ripples (seconds)
    pub const MIN_RIPPLE_INTERVAL: f32 = 1e-3;

    /// One liter in cubic meters
    pub const LITERS_TO_CUBIC_METERS: f32 = 0.001;
}

/// Direction vector from spherical angles (radians), y up
#[inline]
pub fn direction_from_angles(theta: f32, phi: f32) -> Vec3 {
    Vec3::new(theta.cos() * phi.cos(), phi.sin(), theta.sin() * phi.cos())
}

/// Linear interpolation between two scalars
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
