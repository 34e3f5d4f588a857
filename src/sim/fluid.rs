//! Fluid height-field handle
//!
//! The per-texel PDE lives on the GPU side; the simulation only drives it
//! through this interface.

use glam::Vec3;

/// One pool's height field (two ping-pong textures behind the scenes)
pub trait FluidSurface {
    /// Perturb the surface around `(x, z)` in pool-local [-1, 1] coordinates
    fn add_drop(&mut self, x: f32, z: f32, radius: f32, strength: f32);

    /// Displace the volume swept by a sphere moving between two centers
    fn move_sphere(&mut self, old_center: Vec3, new_center: Vec3, radius: f32);

    /// Advance the wave equation one discrete step
    fn step_simulation(&mut self);

    /// Rebuild the normal channel from heights. Must run before any shader
    /// samples the field after an out-of-band edit.
    fn update_normals(&mut self);
}
