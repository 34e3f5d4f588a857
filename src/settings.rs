//! Simulation settings
//!
//! Loaded from a JSON file; every field falls back to its default so partial
//! files are fine.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::consts::{LITERS_TO_CUBIC_METERS, MIN_RIPPLE_INTERVAL};
use crate::error::SettingsError;

/// How new pools are placed relative to the previous one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum StackLayout {
    /// Each new pool sits below the last; the camera pans on Y
    #[default]
    Vertical,
    /// Each new pool sits to the right of the last; the camera pans on X
    Horizontal,
}

impl StackLayout {
    pub fn is_vertical(&self) -> bool {
        matches!(self, StackLayout::Vertical)
    }

    /// Signed distance from one pool offset to the next
    pub fn step(&self, spacing: f32) -> f32 {
        match self {
            StackLayout::Vertical => -spacing,
            StackLayout::Horizontal => spacing,
        }
    }

    /// World-space translation for a scalar pool offset
    pub fn axis(&self, offset: f32) -> Vec3 {
        match self {
            StackLayout::Vertical => Vec3::new(0.0, offset, 0.0),
            StackLayout::Horizontal => Vec3::new(offset, 0.0, 0.0),
        }
    }
}

/// Ripples injected while the water is rising
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RippleSettings {
    /// Mean seconds between ripples (0 disables emission)
    pub frequency: f32,
    /// Base drop radius
    pub radius: f32,
    /// Base drop strength (sign is randomized per ripple)
    pub strength: f32,
    /// Half-size of the square on the water plane ripples land in
    pub spread: f32,
    /// Multiplicative radius jitter range [min, max)
    pub radius_jitter: [f32; 2],
    /// Multiplicative strength jitter range [min, max)
    pub strength_jitter: [f32; 2],
}

impl Default for RippleSettings {
    fn default() -> Self {
        Self {
            frequency: 0.25,
            radius: 0.12,
            strength: 0.09,
            spread: 0.9,
            radius_jitter: [0.7, 1.3],
            strength_jitter: [0.6, 1.4],
        }
    }
}

/// All tunables for a simulation run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Pool ===
    /// Physical pool width in meters (for the fill-rate conversion)
    pub pool_width_m: f32,
    /// Physical pool depth in meters
    pub pool_depth_m: f32,
    /// Pool height scalar handed to the wall/water shaders
    pub pool_height: f32,
    /// Lowest water level (the pool floor)
    pub min_level: f32,
    /// Highest water level before the pool overflows into a new one
    pub max_level: f32,
    /// Level of the first pool
    pub default_level: f32,
    /// Caustic target edge length in texels
    pub caustic_size: u32,

    // === Layout ===
    pub layout: StackLayout,
    /// World units between consecutive pools
    pub pool_spacing: f32,

    // === Rising water ===
    /// Fill rate in liters per second
    pub fill_rate_lps: f32,
    /// Camera transition duration in seconds
    pub transition_duration: f32,
    pub ripples: RippleSettings,

    // === Sphere ===
    pub sphere_radius: f32,
    pub sphere_start: Vec3,
    pub gravity: Vec3,
    /// Sphere physics on at startup
    pub physics_enabled: bool,
    /// Show the sphere in wall/water shaders (off: avoids reflection artifacts)
    pub render_sphere: bool,

    // === Camera ===
    pub initial_pitch_deg: f32,
    pub initial_yaw_deg: f32,
    pub fov_y_deg: f32,
    pub near: f32,
    pub far: f32,
    /// Distance from the eye to the orbit pivot
    pub eye_distance: f32,
    /// Scene lift applied after the orbit rotation
    pub scene_lift: f32,

    // === Drops ===
    /// Radius of drops painted by dragging on the water
    pub drop_radius: f32,
    /// Strength of drops painted by dragging on the water
    pub drop_strength: f32,
    /// Random drops seeded into the first pool at startup
    pub startup_drops: u32,

    // === Lighting ===
    pub light_dir: Vec3,

    /// Seed for the ripple/drop RNG
    pub seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            // 10 x 10 m pool
            pool_width_m: 10.0,
            pool_depth_m: 10.0,
            pool_height: 1.0,
            min_level: -1.0,
            max_level: 0.15,
            default_level: 0.0,
            caustic_size: 1024,

            layout: StackLayout::Vertical,
            pool_spacing: 3.0,

            fill_rate_lps: 36.0,
            transition_duration: 1.2,
            ripples: RippleSettings::default(),

            sphere_radius: 0.155_230_33,
            sphere_start: Vec3::new(-0.4, -0.75, 0.2),
            gravity: Vec3::new(0.0, -4.0, 0.0),
            physics_enabled: false,
            render_sphere: false,

            initial_pitch_deg: -25.0,
            initial_yaw_deg: -200.5,
            fov_y_deg: 45.0,
            near: 0.01,
            far: 100.0,
            eye_distance: 4.0,
            scene_lift: 0.5,

            drop_radius: 0.03,
            drop_strength: 0.01,
            startup_drops: 20,

            light_dir: Vec3::new(2.0, 2.0, -1.0).normalize(),

            seed: 0x5eed_7a7e,
        }
    }
}

impl Settings {
    /// Level rise in world units per second for the configured fill rate
    pub fn rise_rate(&self) -> f32 {
        let area = self.pool_width_m * self.pool_depth_m;
        if area <= 0.0 {
            return 0.0;
        }
        self.fill_rate_lps * LITERS_TO_CUBIC_METERS / area
    }

    /// Clamp a level into [min_level, max_level]
    pub fn clamp_level(&self, level: f32) -> f32 {
        level.clamp(self.min_level, self.max_level)
    }

    /// Reject combinations the simulation cannot run with
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(self.min_level < self.max_level) {
            return Err(SettingsError::Invalid {
                field: "max_level",
                reason: format!("{} must exceed min_level {}", self.max_level, self.min_level),
            });
        }
        if !(self.transition_duration > 0.0) {
            return Err(SettingsError::Invalid {
                field: "transition_duration",
                reason: "must be positive".into(),
            });
        }
        if self.sphere_radius <= 0.0 || self.sphere_radius >= 1.0 {
            return Err(SettingsError::Invalid {
                field: "sphere_radius",
                reason: "must be inside (0, 1)".into(),
            });
        }
        let frequency = self.ripples.frequency;
        if !(frequency == 0.0 || frequency >= MIN_RIPPLE_INTERVAL) {
            return Err(SettingsError::Invalid {
                field: "ripples.frequency",
                reason: format!("{frequency} must be 0 or at least {MIN_RIPPLE_INTERVAL}"),
            });
        }
        if self.caustic_size == 0 {
            return Err(SettingsError::Invalid {
                field: "caustic_size",
                reason: "must be non-zero".into(),
            });
        }
        Ok(())
    }

    /// Read and validate settings from a JSON file
    pub fn try_load(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings, falling back to defaults on any error
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("{e}; using default settings");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rise_rate_for_ten_meter_pool() {
        let settings = Settings::default();
        let rate = settings.rise_rate();
        assert!((rate - 0.00036).abs() < 1e-9);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{ "fill_rate_lps": 72.0, "layout": "Horizontal" }"#).unwrap();
        assert_eq!(settings.fill_rate_lps, 72.0);
        assert_eq!(settings.layout, StackLayout::Horizontal);
        assert_eq!(settings.pool_spacing, 3.0);
        assert_eq!(settings.ripples.frequency, 0.25);
    }

    #[test]
    fn test_validate_rejects_inverted_levels() {
        let settings = Settings {
            min_level: 0.5,
            max_level: 0.1,
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::Invalid { field: "max_level", .. })
        ));
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn test_layout_step_direction() {
        assert_eq!(StackLayout::Vertical.step(3.0), -3.0);
        assert_eq!(StackLayout::Horizontal.step(3.0), 3.0);
        assert_eq!(StackLayout::Vertical.axis(-3.0), Vec3::new(0.0, -3.0, 0.0));
    }

    #[test]
    fn test_validate_rejects_tiny_ripple_interval() {
        for frequency in [1e-9, 1e-4, -0.25, f32::NAN] {
            let settings = Settings {
                ripples: RippleSettings {
                    frequency,
                    ..Default::default()
                },
                ..Default::default()
            };
            assert!(matches!(
                settings.validate(),
                Err(SettingsError::Invalid { field: "ripples.frequency", .. })
            ));
        }
        let disabled = Settings {
            ripples: RippleSettings {
                frequency: 0.0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(disabled.validate().is_ok());
    }

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir().join(format!(
            "water-cascade-settings-{}.json",
            std::process::id()
        ));
        let settings = Settings {
            fill_rate_lps: 72.0,
            layout: StackLayout::Horizontal,
            ..Default::default()
        };
        settings.save(&path).unwrap();
        let loaded = Settings::try_load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded.fill_rate_lps, 72.0);
        assert_eq!(loaded.layout, StackLayout::Horizontal);
    }

    #[test]
    fn test_load_missing_file_falls_back() {
        let settings = Settings::load(Path::new("/definitely/not/here.json"));
        assert_eq!(settings.caustic_size, 1024);
    }
}
