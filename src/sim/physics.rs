//! Rigid sphere floating in the active pool
//!
//! Gravity is damped by how much of the sphere is under water, with a
//! quadratic drag that also scales with submersion. Coupling to the fluid is
//! a swept-volume displacement between the previous and current centers.

use glam::Vec3;

use super::fluid::FluidSurface;
use crate::consts::{BUOYANCY_FACTOR, FLOOR_RESTITUTION, POOL_HALF_EXTENT, SPHERE_MAX_Y};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidSphere {
    pub center: Vec3,
    /// Center at the last fluid coupling
    pub previous_center: Vec3,
    pub velocity: Vec3,
    pub radius: f32,
}

impl RigidSphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self {
            center,
            previous_center: center,
            velocity: Vec3::ZERO,
            radius,
        }
    }

    /// Fraction of the sphere's height below `surface_y`, in [0, 1]
    pub fn submersion(&self, surface_y: f32) -> f32 {
        ((self.radius - (self.center.y - surface_y)) / (2.0 * self.radius)).clamp(0.0, 1.0)
    }

    /// Height of the pool floor the sphere rests on
    pub fn floor_y(&self) -> f32 {
        self.radius - POOL_HALF_EXTENT
    }

    /// Keep a dragged sphere inside the pool walls and below the lift ceiling
    pub fn clamp_to_pool(&mut self) {
        let wall = POOL_HALF_EXTENT - self.radius;
        self.center.x = self.center.x.clamp(-wall, wall);
        self.center.y = self.center.y.clamp(self.floor_y(), SPHERE_MAX_Y);
        self.center.z = self.center.z.clamp(-wall, wall);
    }
}

/// A floor impact during integration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounce {
    /// Downward speed just before the impact
    pub impact_speed: f32,
}

/// Moves the sphere and couples it to a fluid surface
#[derive(Debug, Clone, Copy)]
pub struct PhysicsIntegrator {
    pub enabled: bool,
    pub gravity: Vec3,
}

impl PhysicsIntegrator {
    pub fn new(enabled: bool, gravity: Vec3) -> Self {
        Self { enabled, gravity }
    }

    /// Advance the sphere by `dt`. A held sphere only has its velocity
    /// cleared so it starts from rest when released.
    pub fn integrate(
        &self,
        sphere: &mut RigidSphere,
        held: bool,
        surface_y: f32,
        dt: f32,
    ) -> Option<Bounce> {
        if held {
            sphere.velocity = Vec3::ZERO;
            return None;
        }
        if !self.enabled {
            return None;
        }

        let submerged = sphere.submersion(surface_y);
        sphere.velocity += self.gravity * (dt - BUOYANCY_FACTOR * dt * submerged);
        let speed_sq = sphere.velocity.length_squared();
        sphere.velocity -= sphere.velocity.normalize_or_zero() * (submerged * dt * speed_sq);
        sphere.center += sphere.velocity * dt;

        let floor = sphere.floor_y();
        if sphere.center.y < floor {
            let impact_speed = sphere.velocity.y.abs();
            sphere.center.y = floor;
            sphere.velocity.y = impact_speed * FLOOR_RESTITUTION;
            return Some(Bounce { impact_speed });
        }
        None
    }

    /// Sweep the sphere's displacement into the fluid. Does nothing while
    /// physics is off: the sphere is then invisible to the water.
    pub fn couple<F: FluidSurface + ?Sized>(&self, sphere: &mut RigidSphere, fluid: &mut F) {
        if !self.enabled {
            return;
        }
        fluid.move_sphere(sphere.previous_center, sphere.center, sphere.radius);
        sphere.previous_center = sphere.center;
    }

    /// Radius the shaders should see for this sphere
    pub fn render_radius(&self, sphere: &RigidSphere, visible: bool) -> f32 {
        if self.enabled && visible {
            sphere.radius
        } else {
            0.0
        }
    }
}
