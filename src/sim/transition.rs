//! Eased camera moves between pools

use super::camera::CameraState;
use super::pool::ContainerRegistry;
use crate::lerp;
use crate::settings::StackLayout;

/// Symmetric quadratic ease-in-out on [0, 1]
#[inline]
pub fn ease_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        -1.0 + (4.0 - 2.0 * t) * t
    }
}

/// A camera move in flight
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraTransition {
    /// Elapsed seconds
    pub progress: f32,
    pub duration: f32,
    pub start_index: usize,
    pub end_index: usize,
}

impl CameraTransition {
    /// Normalized progress in [0, 1]
    pub fn t(&self) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        (self.progress / self.duration).clamp(0.0, 1.0)
    }
}

/// Result of advancing the controller by one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransitionStep {
    Idle,
    Moving { eased: f32 },
    Finished { active_index: usize },
}

#[derive(Debug, Clone, Default)]
pub struct CameraTransitionController {
    current: Option<CameraTransition>,
}

impl CameraTransitionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin moving from `start_index` to `end_index`, replacing any move in flight
    pub fn start(&mut self, start_index: usize, end_index: usize, duration: f32) {
        log::info!("Camera transition {start_index} -> {end_index} over {duration:.2}s");
        self.current = Some(CameraTransition {
            progress: 0.0,
            duration,
            start_index,
            end_index,
        });
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    pub fn current(&self) -> Option<&CameraTransition> {
        self.current.as_ref()
    }

    /// Advance by `dt` and place the camera. On completion the end pool
    /// becomes active, the camera snaps onto its offset and the scroll
    /// position is aligned to it.
    pub fn update<F, C>(
        &mut self,
        dt: f32,
        registry: &mut ContainerRegistry<F, C>,
        camera: &mut CameraState,
        layout: StackLayout,
    ) -> TransitionStep {
        let Some(transition) = self.current.as_mut() else {
            return TransitionStep::Idle;
        };
        transition.progress += dt;
        let transition = *transition;

        let offset_of = |index: usize| registry.get(index).map(|p| p.offset()).unwrap_or(0.0);
        let start = offset_of(transition.start_index);
        let end = offset_of(transition.end_index);

        let t = transition.t();
        if t >= 1.0 {
            self.current = None;
            registry.set_active(transition.end_index);
            camera.set_axis_offset(layout, end);
            registry.align_scroll(transition.end_index);
            log::info!("Camera transition finished on pool {}", transition.end_index);
            return TransitionStep::Finished {
                active_index: transition.end_index,
            };
        }

        let eased = ease_in_out(t);
        camera.set_axis_offset(layout, lerp(start, end, eased));
        TransitionStep::Moving { eased }
    }
}
