//! World state and its host-facing API
//!
//! Everything the simulation mutates lives in one owned [`World`]; the host
//! queues [`InputEvent`]s and calls [`tick`](super::tick::tick) once per frame.

use glam::{Vec2, Vec3};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::camera::{CameraState, Lens, PixelRaycaster, Viewport};
use super::fluid::FluidSurface;
use super::input::{InputEvent, InputQueue};
use super::interaction::{DropBrush, Feedback, InteractionDispatcher, Scene};
use super::physics::{PhysicsIntegrator, RigidSphere};
use super::pool::{ContainerRegistry, Pool};
use super::rising::RisingWaterController;
use super::transition::CameraTransitionController;
use crate::consts::MODEL_HOME;
use crate::error::{InitError, MeshError};
use crate::lerp;
use crate::mesh::{Mesh, Model, parse_mtl_color};
use crate::renderer::{FrameView, PoolRenderContext, RenderBackend, RenderOrchestrator};
use crate::settings::Settings;

/// Something observable that happened during a tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimEvent {
    PoolSpawned { index: usize, offset: f32 },
    TransitionStarted { from: usize, to: usize },
    TransitionFinished { active: usize },
    SphereBounced { impact_speed: f32 },
    /// The tick's `dt` was out of range and nothing advanced
    TickDiscarded { dt: f32 },
}

/// What a tick produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub events: Vec<SimEvent>,
    /// The host should draw a frame
    pub redraw: bool,
}

pub struct World<B: RenderBackend> {
    pub settings: Settings,
    backend: B,
    pub registry: ContainerRegistry<B::Fluid, B::Caustics>,
    pub camera: CameraState,
    pub lens: Lens,
    pub viewport: Viewport,
    pub sphere: RigidSphere,
    pub physics: PhysicsIntegrator,
    pub rising: RisingWaterController,
    pub transition: CameraTransitionController,
    pub interaction: InteractionDispatcher,
    /// Optional imported model, drawn in every pool
    pub model: Option<Model>,
    pub light_dir: Vec3,
    pub paused: bool,
    pub(super) inputs: InputQueue,
    pub(super) rng: Pcg32,
    /// Ticks that actually advanced the simulation
    pub time_ticks: u64,
}

impl<B: RenderBackend> World<B> {
    /// Validate settings, check the backend and create the first pool,
    /// seeded with a scatter of small drops
    pub fn new(settings: Settings, mut backend: B) -> Result<Self, InitError> {
        settings.validate()?;
        if !backend.supports_float_render_targets() {
            return Err(InitError::UnsupportedRenderTarget);
        }

        let first = create_pool(&mut backend, &settings, settings.default_level, 0.0)?;
        let viewport = Viewport::default();
        let mut world = Self {
            registry: ContainerRegistry::new(first, viewport.css_height()),
            camera: CameraState::new(settings.initial_pitch_deg, settings.initial_yaw_deg),
            lens: Lens::from_settings(&settings),
            viewport,
            sphere: RigidSphere::new(settings.sphere_start, settings.sphere_radius),
            physics: PhysicsIntegrator::new(settings.physics_enabled, settings.gravity),
            rising: RisingWaterController::new(&settings, settings.default_level),
            transition: CameraTransitionController::new(),
            interaction: InteractionDispatcher::new(DropBrush {
                radius: settings.drop_radius,
                strength: settings.drop_strength,
            }),
            model: None,
            light_dir: settings.light_dir.normalize_or_zero(),
            paused: false,
            inputs: InputQueue::default(),
            rng: Pcg32::seed_from_u64(settings.seed),
            time_ticks: 0,
            backend,
            settings,
        };

        let (radius, strength) = (world.settings.drop_radius, world.settings.drop_strength);
        for i in 0..world.settings.startup_drops {
            let x = world.rng.random::<f32>() * 2.0 - 1.0;
            let z = world.rng.random::<f32>() * 2.0 - 1.0;
            let sign = if i & 1 == 1 { 1.0 } else { -1.0 };
            world.registry.active_mut().fluid.add_drop(x, z, radius, strength * sign);
        }
        world.refresh_surface();

        log::info!(
            "World ready: {:?} layout, level {:.2}, {} startup drops",
            world.settings.layout,
            world.rising.level(),
            world.settings.startup_drops
        );
        Ok(world)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Queue an event for the next tick
    pub fn push_input(&mut self, event: InputEvent) {
        self.inputs.push(event);
    }

    pub fn pending_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// World translation of pool `index`
    pub fn pool_origin(&self, index: usize) -> Vec3 {
        let offset = self.registry.get(index).map(Pool::offset).unwrap_or(0.0);
        self.settings.layout.axis(offset)
    }

    pub fn raycaster(&self) -> PixelRaycaster {
        PixelRaycaster::new(&self.camera, self.settings.layout, &self.lens, self.viewport)
    }

    pub fn frame_view(&self) -> FrameView {
        let caster = self.raycaster();
        FrameView {
            view_proj: caster.view_proj(),
            eye: caster.eye(),
            viewport: self.viewport,
        }
    }

    /// Draw context for pool `index`. The sphere only exists in the active pool.
    pub fn render_context(&self, index: usize) -> PoolRenderContext {
        let origin = self.pool_origin(index);
        let water_level = self
            .registry
            .get(index)
            .map(Pool::water_level)
            .unwrap_or(self.settings.default_level);
        let sphere_radius = if index == self.registry.active_index() {
            self.physics
                .render_radius(&self.sphere, self.settings.render_sphere)
        } else {
            0.0
        };
        PoolRenderContext {
            index,
            origin,
            water_level,
            pool_height: self.settings.pool_height,
            light_dir: self.light_dir,
            sphere_center: self.sphere.center,
            sphere_radius,
            eye: self.raycaster().eye() - origin,
        }
    }

    /// Re-project the active pool's caustics
    pub fn refresh_caustics(&mut self) {
        let ctx = self.render_context(self.registry.active_index());
        let pool = self.registry.active_mut();
        self.backend
            .update_caustics(&pool.fluid, &mut pool.caustics, &ctx);
    }

    /// Rebuild normals, then caustics, for the active pool
    pub fn refresh_surface(&mut self) {
        self.registry.active_mut().fluid.update_normals();
        self.refresh_caustics();
    }

    /// Draw every pool
    pub fn render(&mut self) -> Result<(), B::Error> {
        let frame = self.frame_view();
        let contexts: Vec<PoolRenderContext> =
            (0..self.registry.len()).map(|i| self.render_context(i)).collect();
        RenderOrchestrator::render(
            &mut self.backend,
            &frame,
            self.registry.iter().zip(contexts),
            self.model.as_ref(),
        )
    }

    /// Allocate the next pool along the stacking axis (not yet appended)
    pub(super) fn create_next_pool(&mut self) -> Result<Pool<B::Fluid, B::Caustics>, InitError> {
        let offset = self
            .registry
            .next_offset(self.settings.pool_spacing, self.settings.layout);
        create_pool(&mut self.backend, &self.settings, self.settings.min_level, offset)
    }

    /// Slider: set the level of the controller and the active pool
    pub fn set_water_level(&mut self, level: f32) {
        if !level.is_finite() {
            log::warn!("Ignoring water level {level}");
            return;
        }
        self.rising.set_level(level);
        let (min, max) = (self.settings.min_level, self.settings.max_level);
        self.registry
            .active_mut()
            .set_water_level(self.rising.level(), min, max);
    }

    /// Map the page scroll onto the vertical camera offset, between the top
    /// and bottom pools. Ignored mid-transition and in horizontal layout.
    pub fn scroll_to(&mut self, position: f32) {
        self.registry.set_scroll_position(position);
        if self.transition.is_active() || !self.settings.layout.is_vertical() {
            return;
        }
        let fraction = self.registry.scroll().fraction(self.registry.len());
        let (bottom, top) = self.registry.offset_bounds();
        self.camera.vertical_offset = lerp(top, bottom, fraction);
    }

    pub fn resize(&mut self, width: f32, height: f32, device_pixel_ratio: f32) {
        self.viewport = Viewport {
            width: width * device_pixel_ratio,
            height: height * device_pixel_ratio,
            device_pixel_ratio,
        };
        self.registry.set_viewport_height(height);
        self.backend.resize(self.viewport);
    }

    /// Point the light along the current view direction
    pub fn light_from_camera(&mut self) {
        self.light_dir = self.camera.light_direction();
    }

    /// Import the optional model. On failure the world carries on without one.
    pub fn load_model(&mut self, obj: &str, mtl: Option<&str>) -> Result<(), MeshError> {
        let mesh = match Mesh::from_obj(obj) {
            Ok(mesh) => mesh,
            Err(e) => {
                log::warn!("Model import failed, continuing without it: {e}");
                self.model = None;
                return Err(e);
            }
        };
        let mut model = Model::new(mesh, self.sphere.center, self.settings.sphere_radius);
        if let Some(color) = mtl.and_then(parse_mtl_color) {
            model.color = color;
        }
        self.backend.prepare_model(&model);
        self.model = Some(model);
        Ok(())
    }

    pub fn reset_model(&mut self) {
        if let Some(model) = self.model.as_mut() {
            model.position = MODEL_HOME;
            model.scale = self.settings.sphere_radius;
        }
    }

    /// Route a pointer event through the interaction dispatcher
    pub(super) fn pointer(&mut self, pointer: Vec2, starting: bool) -> Feedback {
        let caster = self.raycaster();
        let origin = self.pool_origin(self.registry.active_index());
        let scene = Scene {
            sphere: &mut self.sphere,
            model: self.model.as_mut(),
            fluid: &mut self.registry.active_mut().fluid,
            camera: &mut self.camera,
        };
        if starting {
            self.interaction.begin(pointer, &caster, origin, scene)
        } else {
            self.interaction.update(pointer, &caster, origin, scene)
        }
    }
}

fn create_pool<B: RenderBackend>(
    backend: &mut B,
    settings: &Settings,
    level: f32,
    offset: f32,
) -> Result<Pool<B::Fluid, B::Caustics>, InitError> {
    let fluid = backend.create_fluid()?;
    let caustics = backend.create_caustics(settings.caustic_size)?;
    Ok(Pool::new(fluid, caustics, settings.clamp_level(level), offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::headless::{DrawCall, FluidOp, HeadlessBackend};

    fn world() -> World<HeadlessBackend> {
        World::new(Settings::default(), HeadlessBackend::new()).unwrap()
    }

    #[test]
    fn test_missing_float_targets_is_fatal() {
        let result = World::new(Settings::default(), HeadlessBackend::without_float_targets());
        assert!(matches!(result, Err(InitError::UnsupportedRenderTarget)));
    }

    #[test]
    fn test_invalid_settings_are_fatal() {
        let settings = Settings {
            transition_duration: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            World::new(settings, HeadlessBackend::new()),
            Err(InitError::Settings(_))
        ));
    }

    #[test]
    fn test_startup_drops_alternate_sign() {
        let world = world();
        let ops = world.registry.active().fluid.ops();
        let strengths: Vec<f32> = ops
            .iter()
            .filter_map(|op| match op {
                FluidOp::AddDrop { strength, x, z, .. } => {
                    assert!(x.abs() <= 1.0 && z.abs() <= 1.0);
                    Some(*strength)
                }
                _ => None,
            })
            .collect();
        assert_eq!(strengths.len(), 20);
        assert_eq!(strengths[0], -0.01);
        assert_eq!(strengths[1], 0.01);
        // Normals are rebuilt before the first caustics pass
        assert_eq!(ops.last(), Some(&FluidOp::UpdateNormals));
        assert_eq!(world.registry.active().caustics.refreshes, 1);
    }

    #[test]
    fn test_same_seed_same_world() {
        let a = world();
        let b = world();
        assert_eq!(a.registry.active().fluid.ops(), b.registry.active().fluid.ops());
    }

    #[test]
    fn test_set_water_level_clamps_and_syncs() {
        let mut world = world();
        world.set_water_level(3.0);
        assert_eq!(world.rising.level(), 0.15);
        assert_eq!(world.registry.active().water_level(), 0.15);
        world.set_water_level(-0.5);
        assert_eq!(world.registry.active().water_level(), -0.5);
    }

    #[test]
    fn test_sphere_hidden_from_shaders_by_default() {
        let mut world = world();
        world.physics.enabled = true;
        assert_eq!(world.render_context(0).sphere_radius, 0.0);
        world.settings.render_sphere = true;
        assert!(world.render_context(0).sphere_radius > 0.0);
    }

    #[test]
    fn test_bad_model_degrades_to_none() {
        let mut world = world();
        assert!(world.load_model("v 1 2\n", None).is_err());
        assert!(world.model.is_none());
        assert_eq!(world.backend().prepared_models, 0);

        world
            .load_model("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n", Some("Kd 1 0 0\n"))
            .unwrap();
        let model = world.model.as_ref().unwrap();
        assert_eq!(model.color, [1.0, 0.0, 0.0]);
        assert_eq!(model.position, world.sphere.center);
        assert_eq!(world.backend().prepared_models, 1);
    }

    #[test]
    fn test_render_draws_every_pool() {
        let mut world = world();
        let pool = world.create_next_pool().unwrap();
        world.registry.append(pool);
        world.backend_mut().clear_calls();
        world.render().unwrap();
        let walls = world
            .backend()
            .calls
            .iter()
            .filter(|c| matches!(c, DrawCall::Walls { .. }))
            .count();
        assert_eq!(walls, 2);
    }

    #[test]
    fn test_scroll_maps_onto_pool_offsets() {
        let mut world = world();
        for _ in 0..2 {
            let pool = world.create_next_pool().unwrap();
            world.registry.append(pool);
        }
        let height = world.registry.scroll().viewport_height;
        world.scroll_to(height);
        assert_eq!(world.camera.vertical_offset, -3.0);
        world.scroll_to(2.0 * height);
        assert_eq!(world.camera.vertical_offset, -6.0);
        world.scroll_to(0.0);
        assert_eq!(world.camera.vertical_offset, 0.0);
    }
}
