//! Input events, queued by the host and drained at the start of each tick

use std::collections::VecDeque;

/// Everything the host can ask of the world. Pointer coordinates are CSS
/// pixels; the world scales them by the device pixel ratio for picking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    DragStart { x: f32, y: f32 },
    DragMove { x: f32, y: f32 },
    DragEnd,
    /// Level slider
    SetWaterLevel(f32),
    /// Apply a level and stop rising
    ResetToLevel(f32),
    ToggleRising,
    /// Liters per second
    SetFillRate(f32),
    TogglePause,
    TogglePhysics,
    /// Page scroll position in CSS pixels
    Scroll { position: f32 },
    Resize {
        width: f32,
        height: f32,
        device_pixel_ratio: f32,
    },
    LightFromCamera,
    ScaleModel { up: bool },
    ResetModel,
}

impl InputEvent {
    /// Keyboard shortcut for a key name (`KeyboardEvent.key` style)
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            " " | "Space" | "space" => Some(InputEvent::TogglePause),
            "g" | "G" => Some(InputEvent::TogglePhysics),
            "l" | "L" => Some(InputEvent::LightFromCamera),
            "+" | "=" => Some(InputEvent::ScaleModel { up: true }),
            "-" | "_" => Some(InputEvent::ScaleModel { up: false }),
            "r" | "R" => Some(InputEvent::ResetModel),
            _ => None,
        }
    }
}

/// FIFO of pending events
#[derive(Debug, Clone, Default)]
pub struct InputQueue {
    events: VecDeque<InputEvent>,
}

impl InputQueue {
    pub fn push(&mut self, event: InputEvent) {
        self.events.push_back(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Take every pending event in arrival order
    pub fn drain(&mut self) -> impl Iterator<Item = InputEvent> + '_ {
        self.events.drain(..)
    }
}
