//! Water Cascade entry point
//!
//! Native builds run the simulation headlessly against the recording backend
//! and log what happens. Window integration lives with the embedding host.

#[cfg(not(target_arch = "wasm32"))]
use std::path::Path;

#[cfg(not(target_arch = "wasm32"))]
use water_cascade::renderer::HeadlessBackend;
#[cfg(not(target_arch = "wasm32"))]
use water_cascade::sim::{InputEvent, SimEvent, World, tick};
#[cfg(not(target_arch = "wasm32"))]
use water_cascade::{InitError, Settings};

#[cfg(not(target_arch = "wasm32"))]
const TICK_DT: f32 = 1.0 / 60.0;
#[cfg(not(target_arch = "wasm32"))]
const DEFAULT_SECONDS: f32 = 30.0;

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Water Cascade (native) starting...");

    let mut args = std::env::args().skip(1);
    let settings = args.next().map(|path| load_or_create(Path::new(&path))).unwrap_or_default();
    let seconds = args
        .next()
        .and_then(|s| s.parse::<f32>().ok())
        .filter(|s| s.is_finite() && *s > 0.0)
        .unwrap_or(DEFAULT_SECONDS);

    if let Err(e) = run(settings, seconds) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

/// Load settings from `path`, writing the defaults there first if it is missing
#[cfg(not(target_arch = "wasm32"))]
fn load_or_create(path: &Path) -> Settings {
    if !path.exists() {
        let settings = Settings::default();
        if let Err(e) = settings.save(path) {
            log::warn!("Could not write default settings: {e}");
        }
        return settings;
    }
    Settings::load(path)
}

#[cfg(not(target_arch = "wasm32"))]
fn run(settings: Settings, seconds: f32) -> Result<(), InitError> {
    let mut world = World::new(settings, HeadlessBackend::new())?;
    world.push_input(InputEvent::ToggleRising);
    world.push_input(InputEvent::TogglePhysics);

    let ticks = (seconds / TICK_DT).ceil() as u64;
    log::info!("Running {ticks} ticks ({seconds:.1}s)");

    for _ in 0..ticks {
        let report = tick(&mut world, TICK_DT);
        for event in &report.events {
            match event {
                SimEvent::PoolSpawned { index, offset } => {
                    log::info!("Pool {index} spawned at offset {offset:.2}")
                }
                SimEvent::TransitionStarted { from, to } => {
                    log::info!("Camera moving from pool {from} to {to}")
                }
                SimEvent::TransitionFinished { active } => {
                    log::info!("Pool {active} is now active")
                }
                SimEvent::SphereBounced { impact_speed } => {
                    log::debug!("Sphere bounced at {impact_speed:.3}")
                }
                SimEvent::TickDiscarded { dt } => log::warn!("Tick discarded (dt = {dt})"),
            }
        }
        if report.redraw {
            // Headless frames cannot fail
            let _ = world.render();
        }
        world.clear_recordings();
    }

    log::info!(
        "Finished after {} ticks with {} pools, active pool {} at level {:.3}",
        world.time_ticks,
        world.registry.len(),
        world.registry.active_index(),
        world.registry.active().water_level(),
    );
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The host drives the library directly on the web
}
