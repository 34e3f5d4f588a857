//! Pointer gestures: hit-test cascade and per-mode drag handling
//!
//! Rays are expressed in the active pool's local space, so picking works the
//! same for every pool regardless of where it sits on the stacking axis.

use glam::{Vec2, Vec3};

use super::camera::{CameraState, PixelRaycaster};
use super::fluid::FluidSurface;
use super::physics::RigidSphere;
use super::ray::Ray;
use crate::consts::POOL_HALF_EXTENT;
use crate::mesh::Model;

/// What a gesture-start ray picked, in priority order
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitTarget {
    Sphere { point: Vec3 },
    Model { point: Vec3 },
    Plane { point: Vec3 },
    None,
}

/// First match wins: sphere, then the model's bounding sphere, then the
/// still-water plane inside the pool walls.
pub fn hit_test(ray: &Ray, sphere: &RigidSphere, model: Option<&Model>) -> HitTarget {
    if let Some(hit) = ray.hit_sphere(sphere.center, sphere.radius) {
        return HitTarget::Sphere { point: hit.point };
    }
    if let Some(model) = model {
        let bounds = model.world_bounds();
        if let Some(hit) = ray.hit_sphere(bounds.center, bounds.radius) {
            return HitTarget::Model { point: hit.point };
        }
    }
    if let Some(point) = ray.hit_horizontal(0.0)
        && point.x.abs() < POOL_HALF_EXTENT
        && point.z.abs() < POOL_HALF_EXTENT
    {
        return HitTarget::Plane { point };
    }
    HitTarget::None
}

/// Plane through the grab point facing the camera; successive rays are
/// intersected with it to turn pointer motion into world motion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragPlane {
    pub anchor: Vec3,
    pub normal: Vec3,
}

impl DragPlane {
    pub fn new(anchor: Vec3, normal: Vec3) -> Self {
        Self { anchor, normal }
    }

    /// World delta since the last sample. A ray parallel to the plane is a
    /// no-op: `None`, anchor kept.
    pub fn drag(&mut self, ray: &Ray) -> Option<Vec3> {
        let hit = ray.hit_plane(self.anchor, self.normal)?;
        let delta = hit - self.anchor;
        self.anchor = hit;
        Some(delta)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InteractionMode {
    #[default]
    Idle,
    AddDrops,
    MoveSphere(DragPlane),
    MoveModel(DragPlane),
    OrbitCamera,
}

/// Drop painted under the pointer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropBrush {
    pub radius: f32,
    pub strength: f32,
}

/// What a gesture changed, so a paused world knows how much to refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Feedback {
    None,
    /// View changed: redraw only
    Redraw,
    /// Something the caustics depend on moved
    Refresh,
    /// The height field was edited: normals, caustics and a redraw
    Surface,
}

/// Mutable state a gesture may touch
pub struct Scene<'a, F: FluidSurface + ?Sized> {
    pub sphere: &'a mut RigidSphere,
    pub model: Option<&'a mut Model>,
    pub fluid: &'a mut F,
    pub camera: &'a mut CameraState,
}

#[derive(Debug, Clone)]
pub struct InteractionDispatcher {
    mode: InteractionMode,
    /// Last pointer position in CSS pixels
    last_pointer: Vec2,
    pub brush: DropBrush,
}

impl InteractionDispatcher {
    pub fn new(brush: DropBrush) -> Self {
        Self {
            mode: InteractionMode::Idle,
            last_pointer: Vec2::ZERO,
            brush,
        }
    }

    pub fn mode(&self) -> &InteractionMode {
        &self.mode
    }

    pub fn is_holding_sphere(&self) -> bool {
        matches!(self.mode, InteractionMode::MoveSphere(_))
    }

    /// Gesture start. A new gesture supersedes whatever was in progress.
    pub fn begin<F: FluidSurface + ?Sized>(
        &mut self,
        pointer: Vec2,
        caster: &PixelRaycaster,
        pool_origin: Vec3,
        scene: Scene<'_, F>,
    ) -> Feedback {
        self.last_pointer = pointer;
        let ray = caster
            .ray_for_pointer(pointer.x, pointer.y)
            .relative_to(pool_origin);
        let facing = -caster.forward();

        let (mode, feedback) = match hit_test(&ray, scene.sphere, scene.model.as_deref()) {
            HitTarget::Sphere { point } => (
                InteractionMode::MoveSphere(DragPlane::new(point, facing)),
                Feedback::None,
            ),
            HitTarget::Model { point } => (
                InteractionMode::MoveModel(DragPlane::new(point, facing)),
                Feedback::None,
            ),
            HitTarget::Plane { point } => {
                scene
                    .fluid
                    .add_drop(point.x, point.z, self.brush.radius, self.brush.strength);
                (InteractionMode::AddDrops, Feedback::Surface)
            }
            HitTarget::None => (InteractionMode::OrbitCamera, Feedback::None),
        };
        log::debug!("Gesture started: {mode:?}");
        self.mode = mode;
        feedback
    }

    /// Gesture move
    pub fn update<F: FluidSurface + ?Sized>(
        &mut self,
        pointer: Vec2,
        caster: &PixelRaycaster,
        pool_origin: Vec3,
        scene: Scene<'_, F>,
    ) -> Feedback {
        let delta = pointer - self.last_pointer;
        self.last_pointer = pointer;
        let ray = caster
            .ray_for_pointer(pointer.x, pointer.y)
            .relative_to(pool_origin);

        match &mut self.mode {
            InteractionMode::Idle => Feedback::None,
            InteractionMode::AddDrops => match ray.hit_horizontal(0.0) {
                Some(point) => {
                    scene
                        .fluid
                        .add_drop(point.x, point.z, self.brush.radius, self.brush.strength);
                    Feedback::Surface
                }
                None => Feedback::None,
            },
            InteractionMode::MoveSphere(plane) => match plane.drag(&ray) {
                Some(offset) => {
                    scene.sphere.center += offset;
                    scene.sphere.clamp_to_pool();
                    Feedback::Refresh
                }
                None => Feedback::None,
            },
            InteractionMode::MoveModel(plane) => match (plane.drag(&ray), scene.model) {
                (Some(offset), Some(model)) => {
                    model.position += offset;
                    Feedback::Refresh
                }
                _ => Feedback::None,
            },
            InteractionMode::OrbitCamera => {
                scene.camera.orbit(delta.x, delta.y);
                Feedback::Redraw
            }
        }
    }

    /// Gesture end
    pub fn end(&mut self) {
        self.mode = InteractionMode::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Mesh;
    use crate::renderer::headless::{FluidOp, HeadlessFluid};
    use crate::settings::{Settings, StackLayout};
    use crate::sim::camera::{Lens, Viewport};

    struct Fixture {
        sphere: RigidSphere,
        model: Option<Model>,
        fluid: HeadlessFluid,
        camera: CameraState,
        dispatcher: InteractionDispatcher,
    }

    impl Fixture {
        fn new() -> Self {
            let settings = Settings::default();
            Self {
                sphere: RigidSphere::new(settings.sphere_start, settings.sphere_radius),
                model: None,
                fluid: HeadlessFluid::new(0),
                camera: CameraState::new(settings.initial_pitch_deg, settings.initial_yaw_deg),
                dispatcher: InteractionDispatcher::new(DropBrush {
                    radius: 0.03,
                    strength: 0.01,
                }),
            }
        }

        fn caster(&self) -> PixelRaycaster {
            let lens = Lens::from_settings(&Settings::default());
            PixelRaycaster::new(&self.camera, StackLayout::Vertical, &lens, Viewport::default())
        }

        fn pixel_of(&self, point: Vec3) -> Vec2 {
            self.caster().project(point).unwrap()
        }

        fn begin(&mut self, pointer: Vec2) -> Feedback {
            let caster = self.caster();
            let scene = Scene {
                sphere: &mut self.sphere,
                model: self.model.as_mut(),
                fluid: &mut self.fluid,
                camera: &mut self.camera,
            };
            self.dispatcher.begin(pointer, &caster, Vec3::ZERO, scene)
        }

        fn update(&mut self, pointer: Vec2) -> Feedback {
            let caster = self.caster();
            let scene = Scene {
                sphere: &mut self.sphere,
                model: self.model.as_mut(),
                fluid: &mut self.fluid,
                camera: &mut self.camera,
            };
            self.dispatcher.update(pointer, &caster, Vec3::ZERO, scene)
        }
    }

    fn small_model(position: Vec3) -> Model {
        let mesh = Mesh::from_obj("v -1 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();
        Model::new(mesh, position, 0.2)
    }

    #[test]
    fn test_sphere_beats_water_plane() {
        let mut fx = Fixture::new();
        // The sphere sits under the water, so this ray crosses the plane first
        let pixel = fx.pixel_of(fx.sphere.center);
        assert_eq!(fx.begin(pixel), Feedback::None);
        assert!(fx.dispatcher.is_holding_sphere());
        assert!(fx.fluid.ops().is_empty());
    }

    #[test]
    fn test_plane_hit_adds_drop_immediately() {
        let mut fx = Fixture::new();
        let pixel = fx.pixel_of(Vec3::new(0.5, 0.0, 0.5));
        assert_eq!(fx.begin(pixel), Feedback::Surface);
        assert_eq!(fx.dispatcher.mode(), &InteractionMode::AddDrops);
        match fx.fluid.ops() {
            [FluidOp::AddDrop { x, z, radius, strength }] => {
                assert!((x - 0.5).abs() < 1e-3 && (z - 0.5).abs() < 1e-3);
                assert_eq!((*radius, *strength), (0.03, 0.01));
            }
            other => panic!("unexpected ops {other:?}"),
        }

        // Every move sample paints another drop
        let next = fx.pixel_of(Vec3::new(0.4, 0.0, 0.4));
        assert_eq!(fx.update(next), Feedback::Surface);
        assert_eq!(fx.fluid.ops().len(), 2);

        fx.dispatcher.end();
        assert_eq!(fx.dispatcher.mode(), &InteractionMode::Idle);
        assert_eq!(fx.update(pixel), Feedback::None);
    }

    #[test]
    fn test_miss_orbits_camera() {
        let mut fx = Fixture::new();
        // Top-left corner looks far past the pool
        assert_eq!(fx.begin(Vec2::ZERO), Feedback::None);
        assert_eq!(fx.dispatcher.mode(), &InteractionMode::OrbitCamera);
        assert_eq!(fx.update(Vec2::new(10.0, 5.0)), Feedback::Redraw);
        assert_eq!(fx.camera.yaw_deg, -210.5);
        assert_eq!(fx.camera.pitch_deg, -30.0);
        assert!(fx.fluid.ops().is_empty());
    }

    #[test]
    fn test_model_hit_and_drag() {
        let mut fx = Fixture::new();
        fx.model = Some(small_model(Vec3::new(0.5, 0.5, 0.5)));
        let center = fx.model.as_ref().unwrap().world_bounds().center;
        let pixel = fx.pixel_of(center);
        fx.begin(pixel);
        assert!(matches!(fx.dispatcher.mode(), InteractionMode::MoveModel(_)));

        let before = fx.model.as_ref().unwrap().position;
        assert_eq!(fx.update(pixel + Vec2::new(40.0, 0.0)), Feedback::Refresh);
        let after = fx.model.as_ref().unwrap().position;
        assert!(before.distance(after) > 1e-3);
    }

    #[test]
    fn test_sphere_drag_is_clamped_to_pool() {
        let mut fx = Fixture::new();
        let pixel = fx.pixel_of(fx.sphere.center);
        fx.begin(pixel);
        let start = fx.sphere.center;
        assert_eq!(fx.update(pixel + Vec2::new(5.0, 0.0)), Feedback::Refresh);
        assert!(fx.sphere.center.distance(start) > 1e-4);

        fx.update(pixel + Vec2::new(900.0, 0.0));
        let limit = POOL_HALF_EXTENT - fx.sphere.radius + 1e-5;
        assert!(fx.sphere.center.x.abs() <= limit);
        assert!(fx.sphere.center.z.abs() <= limit);
        assert!(fx.sphere.center.y >= fx.sphere.floor_y() - 1e-5);
    }

    #[test]
    fn test_parallel_drag_plane_is_noop() {
        let anchor = Vec3::new(0.2, 0.3, 0.4);
        let mut plane = DragPlane::new(anchor, Vec3::Y);
        let ray = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::X);
        assert_eq!(plane.drag(&ray), None);
        assert_eq!(plane.anchor, anchor);
    }

    #[test]
    fn test_hit_test_ignores_plane_outside_walls() {
        let sphere = RigidSphere::new(Vec3::new(0.0, -0.8, 0.0), 0.1);
        let ray = Ray::new(Vec3::new(3.0, 1.0, 0.0), Vec3::new(0.0, -1.0, 0.0));
        assert_eq!(hit_test(&ray, &sphere, None), HitTarget::None);
        let inside = Ray::new(Vec3::new(0.5, 1.0, 0.0), Vec3::new(0.0, -1.0, 0.0));
        assert!(matches!(hit_test(&inside, &sphere, None), HitTarget::Plane { .. }));
    }
}
