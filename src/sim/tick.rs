//! Per-frame simulation tick
//!
//! Order: queued input, sphere physics and fluid steps, rising water,
//! ripples, camera transition. The host renders afterwards.

use glam::Vec2;

use super::fluid::FluidSurface;
use super::input::InputEvent;
use super::interaction::Feedback;
use super::rising::LevelStep;
use super::state::{SimEvent, TickReport, World};
use super::transition::TransitionStep;
use crate::consts::{FLUID_STEPS_PER_TICK, MAX_TICK_DT};
use crate::renderer::RenderBackend;

/// Advance the world by `dt` seconds
pub fn tick<B: RenderBackend>(world: &mut World<B>, dt: f32) -> TickReport {
    let mut report = TickReport::default();

    let events: Vec<InputEvent> = world.inputs.drain().collect();
    let mut feedback = Feedback::None;
    for event in events {
        feedback = feedback.max(apply_input(world, event));
    }

    // Negated so NaN is rejected too
    if !(0.0..=MAX_TICK_DT).contains(&dt) {
        log::warn!("Discarding tick with dt = {dt}");
        report.events.push(SimEvent::TickDiscarded { dt });
        settle(world, feedback, &mut report);
        return report;
    }

    if !world.paused {
        step_physics(world, dt, &mut report);
        report.redraw = true;
    }

    feedback = feedback.max(step_rising(world, dt, &mut report));

    if !world.paused {
        step_transition(world, dt, &mut report);
    }

    world.time_ticks += 1;
    settle(world, feedback, &mut report);
    report
}

fn apply_input<B: RenderBackend>(world: &mut World<B>, event: InputEvent) -> Feedback {
    match event {
        InputEvent::DragStart { x, y } => world.pointer(Vec2::new(x, y), true),
        InputEvent::DragMove { x, y } => world.pointer(Vec2::new(x, y), false),
        InputEvent::DragEnd => {
            world.interaction.end();
            Feedback::None
        }
        InputEvent::SetWaterLevel(value)
        | InputEvent::ResetToLevel(value)
        | InputEvent::SetFillRate(value)
            if !value.is_finite() =>
        {
            log::warn!("Ignoring non-finite input {event:?}");
            Feedback::None
        }
        InputEvent::SetWaterLevel(level) => {
            world.set_water_level(level);
            Feedback::Surface
        }
        InputEvent::ResetToLevel(level) => {
            world.set_water_level(level);
            world.rising.enabled = false;
            Feedback::Surface
        }
        InputEvent::ToggleRising => {
            world.rising.enabled = !world.rising.enabled;
            log::info!(
                "Rising water {}",
                if world.rising.enabled { "on" } else { "off" }
            );
            Feedback::None
        }
        InputEvent::SetFillRate(liters_per_second) => {
            world.rising.set_fill_rate(liters_per_second);
            Feedback::None
        }
        InputEvent::TogglePause => {
            world.paused = !world.paused;
            log::info!("{}", if world.paused { "Paused" } else { "Resumed" });
            Feedback::Redraw
        }
        InputEvent::TogglePhysics => {
            world.physics.enabled = !world.physics.enabled;
            log::info!(
                "Sphere physics {}",
                if world.physics.enabled { "on" } else { "off" }
            );
            Feedback::Refresh
        }
        InputEvent::Scroll { position } => {
            world.scroll_to(position);
            Feedback::Redraw
        }
        InputEvent::Resize {
            width,
            height,
            device_pixel_ratio,
        } => {
            world.resize(width, height, device_pixel_ratio);
            Feedback::Redraw
        }
        InputEvent::LightFromCamera => {
            world.light_from_camera();
            Feedback::Refresh
        }
        InputEvent::ScaleModel { up } => match world.model.as_mut() {
            Some(model) => {
                if up {
                    model.scale_up();
                } else {
                    model.scale_down();
                }
                Feedback::Refresh
            }
            None => Feedback::None,
        },
        InputEvent::ResetModel => {
            world.reset_model();
            Feedback::Refresh
        }
    }
}

/// Integrate the sphere, couple it, then step the active pool's fluid.
/// Normals and caustics are rebuilt after the steps, in that order.
fn step_physics<B: RenderBackend>(world: &mut World<B>, dt: f32, report: &mut TickReport) {
    let held = world.interaction.is_holding_sphere();
    let surface_y = world.registry.active().water_level();
    if let Some(bounce) = world.physics.integrate(&mut world.sphere, held, surface_y, dt) {
        report.events.push(SimEvent::SphereBounced {
            impact_speed: bounce.impact_speed,
        });
    }

    let fluid = &mut world.registry.active_mut().fluid;
    world.physics.couple(&mut world.sphere, fluid);
    for _ in 0..FLUID_STEPS_PER_TICK {
        fluid.step_simulation();
    }
    fluid.update_normals();
    world.refresh_caustics();
}

fn step_rising<B: RenderBackend>(world: &mut World<B>, dt: f32, report: &mut TickReport) -> Feedback {
    if !world.rising.enabled {
        return Feedback::None;
    }
    let (min, max) = (world.settings.min_level, world.settings.max_level);
    let mut feedback = Feedback::None;

    match world.rising.advance(dt, world.transition.is_active()) {
        LevelStep::Idle => {}
        LevelStep::Rose { level } => {
            world.registry.active_mut().set_water_level(level, min, max);
            feedback = Feedback::Surface;
        }
        LevelStep::Overflow { level } => {
            world.registry.active_mut().set_water_level(level, min, max);
            spawn_successor(world, report);
            feedback = Feedback::Surface;
        }
    }

    let ripples = world.rising.ripples.advance(dt, &mut world.rng);
    if !ripples.is_empty() {
        let fluid = &mut world.registry.active_mut().fluid;
        for ripple in ripples {
            fluid.add_drop(ripple.x, ripple.z, ripple.radius, ripple.strength);
        }
        feedback = Feedback::Surface;
    }
    feedback
}

/// Append an empty pool past the last one and start moving the camera to it
fn spawn_successor<B: RenderBackend>(world: &mut World<B>, report: &mut TickReport) {
    let pool = match world.create_next_pool() {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("Could not spawn a new pool, stopping the rise: {e}");
            world.rising.enabled = false;
            return;
        }
    };
    let offset = pool.offset();
    let from = world.registry.active_index();
    let index = world.registry.append(pool);
    log::info!("Pool {index} spawned at offset {offset:.2}");
    world
        .transition
        .start(from, index, world.settings.transition_duration);
    report.events.push(SimEvent::PoolSpawned { index, offset });
    report
        .events
        .push(SimEvent::TransitionStarted { from, to: index });
}

fn step_transition<B: RenderBackend>(world: &mut World<B>, dt: f32, report: &mut TickReport) {
    let layout = world.settings.layout;
    if let TransitionStep::Finished { active_index } =
        world
            .transition
            .update(dt, &mut world.registry, &mut world.camera, layout)
    {
        let level = world.registry.active().water_level();
        world.rising.set_level(level);
        report
            .events
            .push(SimEvent::TransitionFinished { active: active_index });
    }
}

/// While paused nothing refreshes on its own, so edits made this tick
/// refresh the active pool here
fn settle<B: RenderBackend>(world: &mut World<B>, feedback: Feedback, report: &mut TickReport) {
    if feedback == Feedback::None {
        return;
    }
    if world.paused {
        match feedback {
            Feedback::Surface => world.refresh_surface(),
            Feedback::Refresh => world.refresh_caustics(),
            Feedback::Redraw | Feedback::None => {}
        }
    }
    report.redraw = true;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::headless::{DrawCall, FluidOp, HeadlessBackend};
    use crate::settings::Settings;
    use glam::Vec3;
    use proptest::prelude::*;

    const DT: f32 = 1.0 / 60.0;

    fn world_with(settings: Settings) -> World<HeadlessBackend> {
        let mut world = World::new(settings, HeadlessBackend::new()).unwrap();
        world.registry.active_mut().fluid.clear_ops();
        world.backend_mut().clear_calls();
        world
    }

    fn world() -> World<HeadlessBackend> {
        world_with(Settings::default())
    }

    fn fast_fill() -> Settings {
        // 1 world unit per second
        Settings {
            fill_rate_lps: 100_000.0,
            ..Default::default()
        }
    }

    fn pixel_of(world: &World<HeadlessBackend>, point: Vec3) -> Vec2 {
        world.raycaster().project(point).unwrap()
    }

    #[test]
    fn test_fluid_op_order_with_physics() {
        let mut world = world();
        world.physics.enabled = true;
        let report = tick(&mut world, DT);
        assert!(report.redraw);
        let ops = world.registry.active().fluid.ops();
        assert!(matches!(ops[0], FluidOp::MoveSphere { .. }));
        assert_eq!(&ops[1..], &[FluidOp::Step, FluidOp::Step, FluidOp::UpdateNormals]);
        assert!(matches!(
            world.backend().calls.last(),
            Some(DrawCall::Caustics { .. })
        ));
        assert_eq!(world.time_ticks, 1);
    }

    #[test]
    fn test_disabled_physics_skips_coupling() {
        let mut world = world();
        let start = world.sphere.center;
        tick(&mut world, DT);
        assert_eq!(
            world.registry.active().fluid.ops(),
            &[FluidOp::Step, FluidOp::Step, FluidOp::UpdateNormals]
        );
        assert_eq!(world.sphere.center, start);
    }

    #[test]
    fn test_long_tick_is_discarded() {
        let mut world = world_with(fast_fill());
        world.physics.enabled = true;
        world.rising.enabled = true;
        let center = world.sphere.center;
        let level = world.rising.level();

        for dt in [2.0, f32::NAN, -0.1] {
            let report = tick(&mut world, dt);
            assert!(matches!(report.events[..], [SimEvent::TickDiscarded { .. }]));
        }
        assert_eq!(world.sphere.center, center);
        assert_eq!(world.rising.level(), level);
        assert!(world.registry.active().fluid.ops().is_empty());
        assert_eq!(world.time_ticks, 0);
    }

    #[test]
    fn test_inputs_apply_even_on_discarded_tick() {
        let mut world = world();
        world.push_input(InputEvent::SetWaterLevel(-0.3));
        tick(&mut world, 5.0);
        assert_eq!(world.registry.active().water_level(), -0.3);
        assert_eq!(world.pending_inputs(), 0);
    }

    #[test]
    fn test_non_finite_levels_and_rates_are_ignored() {
        let mut world = world_with(fast_fill());
        world.push_input(InputEvent::SetWaterLevel(-0.5));
        world.push_input(InputEvent::SetWaterLevel(f32::NAN));
        world.push_input(InputEvent::ResetToLevel(f32::INFINITY));
        world.push_input(InputEvent::SetFillRate(f32::NAN));
        world.push_input(InputEvent::ToggleRising);
        tick(&mut world, DT);
        assert!(world.rising.enabled);
        assert!((world.rising.rate() - 1.0).abs() < 1e-6);

        for _ in 0..10 {
            tick(&mut world, DT);
        }
        let level = world.registry.active().water_level();
        assert!(level.is_finite());
        assert!((world.settings.min_level..=world.settings.max_level).contains(&level));
        assert!(level > -0.5);
        assert_eq!(world.rising.level(), level);

        // Direct setter calls are guarded too
        world.set_water_level(f32::NAN);
        assert_eq!(world.registry.active().water_level(), level);
    }

    #[test]
    fn test_overflow_spawns_one_pool_and_transitions() {
        let mut world = world_with(fast_fill());
        world.set_water_level(0.14);
        world.push_input(InputEvent::ToggleRising);

        let mut spawned = Vec::new();
        let mut started = Vec::new();
        let mut finished = None;
        for _ in 0..120 {
            let report = tick(&mut world, DT);
            for event in report.events {
                match event {
                    SimEvent::PoolSpawned { index, offset } => spawned.push((index, offset)),
                    SimEvent::TransitionStarted { from, to } => started.push((from, to)),
                    SimEvent::TransitionFinished { active } => finished = Some(active),
                    _ => {}
                }
            }
            if finished.is_some() {
                break;
            }
        }

        assert_eq!(spawned, vec![(1, -3.0)]);
        assert_eq!(started, vec![(0, 1)]);
        assert_eq!(finished, Some(1));
        assert_eq!(world.registry.len(), 2);
        assert_eq!(world.registry.active_index(), 1);
        assert_eq!(world.camera.vertical_offset, -3.0);
        // The old pool stays full, the new one starts empty
        assert_eq!(world.registry.get(0).unwrap().water_level(), 0.15);
        assert!(world.registry.active().water_level() < -0.9);
        assert_eq!(world.rising.level(), world.registry.active().water_level());
        assert_eq!(
            world.registry.scroll().position,
            world.registry.scroll().viewport_height
        );
    }

    #[test]
    fn test_ripples_follow_the_active_pool() {
        let mut world = world();
        world.push_input(InputEvent::ToggleRising);
        tick(&mut world, 0.5);
        let drops = world
            .registry
            .active()
            .fluid
            .ops()
            .iter()
            .filter(|op| matches!(op, FluidOp::AddDrop { .. }))
            .count();
        assert_eq!(drops, 2);
    }

    #[test]
    fn test_failed_spawn_stops_rising() {
        let settings = fast_fill();
        // Two allocations for the first pool, none left for a successor
        let backend = HeadlessBackend::new().with_allocation_budget(2);
        let mut world = World::new(settings, backend).unwrap();
        world.set_water_level(0.149);
        world.rising.enabled = true;
        let report = tick(&mut world, DT);
        assert!(report.events.is_empty());
        assert_eq!(world.registry.len(), 1);
        assert!(!world.rising.enabled);
        assert_eq!(world.registry.active().water_level(), 0.15);
    }

    #[test]
    fn test_paused_freezes_physics_but_keeps_rising() {
        let mut world = world_with(fast_fill());
        world.physics.enabled = true;
        world.push_input(InputEvent::TogglePause);
        world.push_input(InputEvent::ToggleRising);
        let center = world.sphere.center;
        let level = world.rising.level();

        let report = tick(&mut world, DT);
        assert!(report.redraw);
        assert_eq!(world.sphere.center, center);
        assert!(world.rising.level() > level);
        let ops = world.registry.active().fluid.ops();
        assert!(!ops.contains(&FluidOp::Step));
        // The level edit still refreshes the surface
        assert_eq!(ops.last(), Some(&FluidOp::UpdateNormals));
        assert!(matches!(
            world.backend().calls.last(),
            Some(DrawCall::Caustics { .. })
        ));
    }

    #[test]
    fn test_paused_transition_does_not_advance() {
        let mut world = world();
        let pool = world.create_next_pool().unwrap();
        world.registry.append(pool);
        world.transition.start(0, 1, 1.2);
        world.paused = true;
        tick(&mut world, 0.5);
        assert_eq!(world.camera.vertical_offset, 0.0);
        assert_eq!(world.transition.current().unwrap().progress, 0.0);
    }

    #[test]
    fn test_drag_on_water_paints_drops_through_queue() {
        let mut world = world();
        world.paused = true;
        let pixel = pixel_of(&world, Vec3::new(0.2, 0.0, -0.3));
        world.push_input(InputEvent::DragStart {
            x: pixel.x,
            y: pixel.y,
        });
        let report = tick(&mut world, DT);
        assert!(report.redraw);
        let ops = world.registry.active().fluid.ops();
        assert!(matches!(ops[0], FluidOp::AddDrop { .. }));
        assert_eq!(ops[1], FluidOp::UpdateNormals);

        world.push_input(InputEvent::DragEnd);
        tick(&mut world, DT);
        assert!(!world.interaction.is_holding_sphere());
    }

    #[test]
    fn test_held_sphere_does_not_fall() {
        let mut world = world();
        world.physics.enabled = true;
        world.sphere.velocity = Vec3::new(0.0, -3.0, 0.0);
        let pixel = pixel_of(&world, world.sphere.center);
        world.push_input(InputEvent::DragStart {
            x: pixel.x,
            y: pixel.y,
        });
        let center = world.sphere.center;
        tick(&mut world, DT);
        assert!(world.interaction.is_holding_sphere());
        assert_eq!(world.sphere.velocity, Vec3::ZERO);
        assert_eq!(world.sphere.center, center);
    }

    #[test]
    fn test_drag_picks_in_active_pool_space() {
        let mut world = world();
        let pool = world.create_next_pool().unwrap();
        world.registry.append(pool);
        world.registry.set_active(1);
        world.camera.vertical_offset = -3.0;
        // The sphere lives in the active pool, three units down in world space
        let world_point = world.sphere.center + world.pool_origin(1);
        let pixel = pixel_of(&world, world_point);
        world.push_input(InputEvent::DragStart {
            x: pixel.x,
            y: pixel.y,
        });
        tick(&mut world, DT);
        assert!(world.interaction.is_holding_sphere());
    }

    #[test]
    fn test_light_from_camera() {
        let mut world = world();
        world.push_input(InputEvent::LightFromCamera);
        tick(&mut world, DT);
        assert_eq!(world.light_dir, world.camera.light_direction());
    }

    #[test]
    fn test_model_keys() {
        let mut world = world();
        world
            .load_model("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n", None)
            .unwrap();
        let base = world.settings.sphere_radius;
        world.push_input(InputEvent::ScaleModel { up: true });
        tick(&mut world, DT);
        assert!((world.model.as_ref().unwrap().scale - base * 1.1).abs() < 1e-6);

        world.model.as_mut().unwrap().position = Vec3::ONE;
        world.push_input(InputEvent::ResetModel);
        tick(&mut world, DT);
        let model = world.model.as_ref().unwrap();
        assert_eq!(model.position, Vec3::new(0.0, -0.75, 0.2));
        assert_eq!(model.scale, base);
    }

    proptest! {
        #[test]
        fn prop_registry_and_levels_stay_valid(
            steps in prop::collection::vec((0.0f32..0.3, 0u8..6), 1..120),
        ) {
            let mut world = world_with(Settings { fill_rate_lps: 400_000.0, ..Default::default() });
            world.rising.enabled = true;
            let mut last_len = world.registry.len();
            for (dt, action) in steps {
                match action {
                    0 => world.push_input(InputEvent::TogglePause),
                    1 => world.push_input(InputEvent::SetWaterLevel(dt * 10.0 - 1.5)),
                    2 => world.push_input(InputEvent::Scroll { position: dt * 4000.0 }),
                    _ => {}
                }
                tick(&mut world, dt);
                prop_assert!(world.registry.active_index() < world.registry.len());
                prop_assert!(world.registry.len() >= last_len);
                last_len = world.registry.len();
                for pool in world.registry.iter() {
                    prop_assert!(pool.water_level() >= world.settings.min_level);
                    prop_assert!(pool.water_level() <= world.settings.max_level);
                }
            }
        }
    }
}
