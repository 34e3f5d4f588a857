//! Orbit camera and pixel picking
//!
//! The view is an orbit around the pool pivot, shifted along the stacking
//! axis so the active pool sits in the middle of the screen.

use glam::{Mat4, Vec2, Vec3, Vec4Swizzles};

use super::ray::Ray;
use crate::consts::PITCH_LIMIT_DEG;
use crate::direction_from_angles;
use crate::settings::{Settings, StackLayout};

/// Orbit angles (degrees) and the pan offsets along both stacking axes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub lateral_offset: f32,
    pub vertical_offset: f32,
    pub yaw_deg: f32,
    pub pitch_deg: f32,
}

impl CameraState {
    pub fn new(pitch_deg: f32, yaw_deg: f32) -> Self {
        Self {
            lateral_offset: 0.0,
            vertical_offset: 0.0,
            yaw_deg,
            pitch_deg: pitch_deg.clamp(-PITCH_LIMIT_DEG, PITCH_LIMIT_DEG),
        }
    }

    /// Rotate by a pointer delta in CSS pixels (one degree per pixel)
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.yaw_deg -= dx;
        self.pitch_deg = (self.pitch_deg - dy).clamp(-PITCH_LIMIT_DEG, PITCH_LIMIT_DEG);
    }

    /// Offset along the axis the layout pans on
    pub fn axis_offset(&self, layout: StackLayout) -> f32 {
        match layout {
            StackLayout::Vertical => self.vertical_offset,
            StackLayout::Horizontal => self.lateral_offset,
        }
    }

    pub fn set_axis_offset(&mut self, layout: StackLayout, offset: f32) {
        match layout {
            StackLayout::Vertical => self.vertical_offset = offset,
            StackLayout::Horizontal => self.lateral_offset = offset,
        }
    }

    /// Light direction pointing along the current look vector
    pub fn light_direction(&self) -> Vec3 {
        direction_from_angles(
            (90.0 - self.yaw_deg).to_radians(),
            (-self.pitch_deg).to_radians(),
        )
    }

    pub fn view_matrix(&self, layout: StackLayout, lens: &Lens) -> Mat4 {
        let pan = match layout {
            StackLayout::Vertical => Vec3::new(0.0, -self.vertical_offset, -lens.eye_distance),
            StackLayout::Horizontal => Vec3::new(-self.lateral_offset, 0.0, -lens.eye_distance),
        };
        Mat4::from_translation(pan)
            * Mat4::from_rotation_x((-self.pitch_deg).to_radians())
            * Mat4::from_rotation_y((-self.yaw_deg).to_radians())
            * Mat4::from_translation(Vec3::new(0.0, lens.scene_lift, 0.0))
    }
}

/// Projection and orbit distance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lens {
    pub fov_y_deg: f32,
    pub near: f32,
    pub far: f32,
    pub eye_distance: f32,
    pub scene_lift: f32,
}

impl Lens {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            fov_y_deg: settings.fov_y_deg,
            near: settings.near,
            far: settings.far,
            eye_distance: settings.eye_distance,
            scene_lift: settings.scene_lift,
        }
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_deg.to_radians(), aspect, self.near, self.far)
    }
}

/// Drawable size in device pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub device_pixel_ratio: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
            device_pixel_ratio: 1.0,
        }
    }
}

impl Viewport {
    pub fn aspect(&self) -> f32 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }

    /// Viewport height in CSS pixels (what page scrolling is measured in)
    pub fn css_height(&self) -> f32 {
        self.height / self.device_pixel_ratio.max(f32::EPSILON)
    }
}

/// Casts rays through screen pixels for one camera pose
#[derive(Debug, Clone, Copy)]
pub struct PixelRaycaster {
    view_proj: Mat4,
    inv_view_proj: Mat4,
    eye: Vec3,
    viewport: Viewport,
}

impl PixelRaycaster {
    pub fn new(camera: &CameraState, layout: StackLayout, lens: &Lens, viewport: Viewport) -> Self {
        let view = camera.view_matrix(layout, lens);
        let view_proj = lens.projection(viewport.aspect()) * view;
        Self {
            view_proj,
            inv_view_proj: view_proj.inverse(),
            eye: view.inverse().transform_point3(Vec3::ZERO),
            viewport,
        }
    }

    /// Camera position in world space
    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    pub fn view_proj(&self) -> Mat4 {
        self.view_proj
    }

    /// Ray through a device-pixel position (origin top-left)
    pub fn ray_for_pixel(&self, x: f32, y: f32) -> Ray {
        let ndc_x = 2.0 * x / self.viewport.width - 1.0;
        let ndc_y = 1.0 - 2.0 * y / self.viewport.height;
        let far = self.inv_view_proj.project_point3(Vec3::new(ndc_x, ndc_y, 1.0));
        Ray::new(self.eye, (far - self.eye).normalize_or_zero())
    }

    /// Ray through a pointer position in CSS pixels
    pub fn ray_for_pointer(&self, x: f32, y: f32) -> Ray {
        let ratio = self.viewport.device_pixel_ratio;
        self.ray_for_pixel(x * ratio, y * ratio)
    }

    /// Look direction: the ray through the middle of the viewport
    pub fn forward(&self) -> Vec3 {
        self.ray_for_pixel(self.viewport.width / 2.0, self.viewport.height / 2.0)
            .dir
    }

    /// Device-pixel position of a world point, `None` when behind the eye
    pub fn project(&self, point: Vec3) -> Option<Vec2> {
        let clip = self.view_proj * point.extend(1.0);
        if clip.w <= 0.0 {
            return None;
        }
        let ndc = clip.xy() / clip.w;
        Some(Vec2::new(
            (ndc.x + 1.0) * 0.5 * self.viewport.width,
            (1.0 - ndc.y) * 0.5 * self.viewport.height,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn raycaster(camera: &CameraState) -> PixelRaycaster {
        let lens = Lens::from_settings(&Settings::default());
        PixelRaycaster::new(camera, StackLayout::Vertical, &lens, Viewport::default())
    }

    #[test]
    fn test_orbit_clamps_pitch() {
        let mut camera = CameraState::new(-25.0, -200.5);
        camera.orbit(10.0, 500.0);
        assert_eq!(camera.yaw_deg, -210.5);
        assert_eq!(camera.pitch_deg, -PITCH_LIMIT_DEG);
        camera.orbit(0.0, -1000.0);
        assert_eq!(camera.pitch_deg, PITCH_LIMIT_DEG);
    }

    #[test]
    fn test_eye_sits_at_orbit_distance_from_pivot() {
        let camera = CameraState::new(-25.0, -200.5);
        let caster = raycaster(&camera);
        // Pivot is the scene origin lowered by the scene lift
        let pivot = Vec3::new(0.0, -0.5, 0.0);
        assert!((caster.eye().distance(pivot) - 4.0).abs() < 1e-4);
        // Looking down at the pool from above
        assert!(caster.eye().y > 0.0);
        let toward_pivot = (pivot - caster.eye()).normalize();
        assert!(caster.forward().dot(toward_pivot) > 0.9999);
    }

    #[test]
    fn test_project_round_trips_through_pixel_ray() {
        let camera = CameraState::new(-25.0, -200.5);
        let caster = raycaster(&camera);
        let target = Vec3::new(0.3, -0.2, 0.1);
        let pixel = caster.project(target).unwrap();
        let ray = caster.ray_for_pixel(pixel.x, pixel.y);
        let to_target = (target - ray.origin).normalize();
        assert!(ray.dir.dot(to_target) > 0.99999);
    }

    #[test]
    fn test_vertical_offset_moves_eye() {
        let mut camera = CameraState::new(-25.0, -200.5);
        let before = raycaster(&camera).eye();
        camera.set_axis_offset(StackLayout::Vertical, -3.0);
        let after = raycaster(&camera).eye();
        // The pan applies in view space, so the eye slides along the camera's up axis
        let rotation = Mat4::from_rotation_x((-camera.pitch_deg).to_radians())
            * Mat4::from_rotation_y((-camera.yaw_deg).to_radians());
        let expected = rotation.inverse().transform_vector3(Vec3::new(0.0, -3.0, 0.0));
        assert!((after - before - expected).length() < 1e-4);
        assert!(after.y < before.y);
        assert_eq!(camera.axis_offset(StackLayout::Horizontal), 0.0);
    }

    #[test]
    fn test_light_direction_is_unit() {
        let camera = CameraState::new(-25.0, -200.5);
        assert!((camera.light_direction().length() - 1.0).abs() < 1e-5);
        // Pitching down points the light up
        assert!(camera.light_direction().y > 0.0);
    }

    proptest! {
        #[test]
        fn prop_pitch_stays_clamped(
            start in -200.0f32..200.0,
            moves in prop::collection::vec((-500.0f32..500.0, -500.0f32..500.0), 0..32),
        ) {
            let mut camera = CameraState::new(start, 0.0);
            prop_assert!(camera.pitch_deg.abs() <= PITCH_LIMIT_DEG);
            for (dx, dy) in moves {
                camera.orbit(dx, dy);
                prop_assert!(camera.pitch_deg.abs() <= PITCH_LIMIT_DEG);
            }
        }
    }
}
