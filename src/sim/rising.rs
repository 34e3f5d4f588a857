//! Rising water: fill-rate level controller and ripple scheduler
//!
//! The controller only reports an overflow; spawning the next pool and
//! starting the camera transition happen in the tick, which owns the pools.

use rand::Rng;

use crate::consts::{LITERS_TO_CUBIC_METERS, MIN_RIPPLE_INTERVAL};
use crate::settings::{RippleSettings, Settings};

/// Drop injected into the active pool while it fills
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ripple {
    pub x: f32,
    pub z: f32,
    pub radius: f32,
    pub strength: f32,
}

/// Fixed-interval ripple emitter (one ripple per `frequency` seconds)
#[derive(Debug, Clone)]
pub struct RippleScheduler {
    accumulator: f32,
    pub settings: RippleSettings,
}

impl RippleScheduler {
    pub fn new(settings: RippleSettings) -> Self {
        Self {
            accumulator: 0.0,
            settings,
        }
    }

    /// Seconds accumulated toward the next ripple
    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }

    /// Accumulate `dt` and emit every ripple that came due
    pub fn advance<R: Rng + ?Sized>(&mut self, dt: f32, rng: &mut R) -> Vec<Ripple> {
        let interval = self.settings.frequency;
        if !(interval > 0.0) {
            return Vec::new();
        }
        let interval = interval.max(MIN_RIPPLE_INTERVAL);
        self.accumulator += dt;
        let due = (self.accumulator / interval).floor();
        if !(due >= 1.0) {
            return Vec::new();
        }
        self.accumulator = (self.accumulator - due * interval).max(0.0);
        (0..due as usize).map(|_| self.sample(rng)).collect()
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Ripple {
        let s = &self.settings;
        let x = (rng.random::<f32>() * 2.0 - 1.0) * s.spread;
        let z = (rng.random::<f32>() * 2.0 - 1.0) * s.spread;
        let radius = s.radius * jitter(rng, s.radius_jitter);
        let sign = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
        let strength = s.strength * jitter(rng, s.strength_jitter) * sign;
        Ripple {
            x,
            z,
            radius,
            strength,
        }
    }
}

/// Uniform factor in `[range[0], range[1])`; a degenerate range yields its bound
fn jitter<R: Rng + ?Sized>(rng: &mut R, range: [f32; 2]) -> f32 {
    range[0] + rng.random::<f32>() * (range[1] - range[0])
}

/// Outcome of one level update
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LevelStep {
    /// Rising is off
    Idle,
    /// Level moved (possibly clamped) without overflowing
    Rose { level: f32 },
    /// Level hit the maximum; a new pool should be spawned
    Overflow { level: f32 },
}

/// Raises the active pool's level at the configured fill rate
#[derive(Debug, Clone)]
pub struct RisingWaterController {
    pub enabled: bool,
    /// World units per second
    rate: f32,
    /// Pool footprint in square meters
    area_m2: f32,
    level: f32,
    min_level: f32,
    max_level: f32,
    pub ripples: RippleScheduler,
}

impl RisingWaterController {
    pub fn new(settings: &Settings, level: f32) -> Self {
        Self {
            enabled: false,
            rate: settings.rise_rate(),
            area_m2: settings.pool_width_m * settings.pool_depth_m,
            level: settings.clamp_level(level),
            min_level: settings.min_level,
            max_level: settings.max_level,
            ripples: RippleScheduler::new(settings.ripples.clone()),
        }
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    /// Change the fill rate (liters per second)
    /// Non-finite rates are ignored
    pub fn set_fill_rate(&mut self, liters_per_second: f32) {
        if !liters_per_second.is_finite() {
            return;
        }
        self.rate = if self.area_m2 > 0.0 {
            liters_per_second * LITERS_TO_CUBIC_METERS / self.area_m2
        } else {
            0.0
        };
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    /// Sync the level from outside (slider, pool switch), clamped
    pub fn set_level(&mut self, level: f32) {
        if level.is_nan() {
            return;
        }
        self.level = level.clamp(self.min_level, self.max_level);
    }

    pub fn max_level(&self) -> f32 {
        self.max_level
    }

    pub fn min_level(&self) -> f32 {
        self.min_level
    }

    /// Raise the level by `rate * dt`. Overflow is only reported when no
    /// transition is running, so one full pool spawns exactly one successor.
    pub fn advance(&mut self, dt: f32, transition_active: bool) -> LevelStep {
        if !self.enabled {
            return LevelStep::Idle;
        }
        let next = self.level + self.rate * dt;
        if next >= self.max_level && !transition_active {
            self.level = self.max_level;
            return LevelStep::Overflow {
                level: self.max_level,
            };
        }
        self.level = next.clamp(self.min_level, self.max_level);
        LevelStep::Rose { level: self.level }
    }
}
