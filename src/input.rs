//! Host input: pixel-space events and the normalized pointer they drive.
//!
//! Window events arrive in host pixel coordinates. [`HostInput`] turns the
//! few winit events the field cares about into [`HostEvent`]s, and
//! [`PointerState`] holds the normalized pointer consumed by the next step.

use glam::{Vec2, Vec3};
use winit::event::{ElementState, MouseButton, WindowEvent};

use crate::config::InteractionConfig;

/// Input the field reacts to, in host pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostEvent {
    PointerMoved { x: f32, y: f32 },
    Click { x: f32, y: f32 },
    Resized { width: u32, height: u32 },
}

/// Pixel coordinates to `[-1, 1]` on both axes, Y up.
///
/// Points outside the viewport are clamped; a zero-sized viewport maps
/// everything to the centre.
pub fn normalize_pointer(x: f32, y: f32, width: u32, height: u32) -> Vec2 {
    if width == 0 || height == 0 || !x.is_finite() || !y.is_finite() {
        return Vec2::ZERO;
    }
    let ndc = Vec2::new(
        (x / width as f32) * 2.0 - 1.0,
        1.0 - (y / height as f32) * 2.0, // Y flipped
    );
    ndc.clamp(Vec2::NEG_ONE, Vec2::ONE)
}

/// Normalized pointer plus the particle currently under it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerState {
    normalized: Vec2,
    pub hovered: Option<usize>,
}

impl PointerState {
    /// Pointer position in `[-1, 1] x [-1, 1]`.
    pub fn normalized(&self) -> Vec2 {
        self.normalized
    }

    /// Set the normalized position, clamping it into range.
    pub fn set_normalized(&mut self, ndc: Vec2) {
        self.normalized = if ndc.is_finite() {
            ndc.clamp(Vec2::NEG_ONE, Vec2::ONE)
        } else {
            Vec2::ZERO
        };
    }

    /// The pointer projected onto the interaction plane in world space.
    pub fn world_point(&self, config: &InteractionConfig) -> Vec3 {
        (self.normalized * config.pointer_scale).extend(config.pointer_depth)
    }
}

/// Translates winit window events into [`HostEvent`]s.
///
/// Clicks carry the last cursor position, since winit button events have none.
#[derive(Debug, Clone)]
pub struct HostInput {
    cursor: Vec2,
}

impl HostInput {
    pub fn new() -> Self {
        Self { cursor: Vec2::ZERO }
    }

    /// Last known cursor position in pixels.
    pub fn cursor(&self) -> Vec2 {
        self.cursor
    }

    pub fn translate(&mut self, event: &WindowEvent) -> Option<HostEvent> {
        match event {
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Vec2::new(position.x as f32, position.y as f32);
                Some(HostEvent::PointerMoved {
                    x: self.cursor.x,
                    y: self.cursor.y,
                })
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => Some(HostEvent::Click {
                x: self.cursor.x,
                y: self.cursor.y,
            }),
            WindowEvent::Resized(size) => Some(HostEvent::Resized {
                width: size.width,
                height: size.height,
            }),
            _ => None,
        }
    }
}

impl Default for HostInput {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalSize;

    #[test]
    fn test_normalize_center_and_corners() {
        assert!(normalize_pointer(400.0, 300.0, 800, 600).length() < 1e-6);
        assert_eq!(normalize_pointer(0.0, 0.0, 800, 600), Vec2::new(-1.0, 1.0));
        assert_eq!(normalize_pointer(800.0, 600.0, 800, 600), Vec2::new(1.0, -1.0));
    }

    #[test]
    fn test_normalize_clamps_out_of_range() {
        assert_eq!(normalize_pointer(-500.0, 5000.0, 800, 600), Vec2::new(-1.0, -1.0));
        assert_eq!(normalize_pointer(f32::NAN, 0.0, 800, 600), Vec2::ZERO);
        assert_eq!(normalize_pointer(10.0, 10.0, 0, 600), Vec2::ZERO);
    }

    #[test]
    fn test_world_point() {
        let config = InteractionConfig::default();
        let mut pointer = PointerState::default();
        pointer.set_normalized(Vec2::new(0.5, -2.0));
        assert_eq!(pointer.normalized(), Vec2::new(0.5, -1.0));
        assert_eq!(pointer.world_point(&config), Vec3::new(10.0, -20.0, 0.0));
    }

    #[test]
    fn test_translate_resize() {
        let mut input = HostInput::new();
        let event = WindowEvent::Resized(PhysicalSize::new(640, 480));
        assert_eq!(
            input.translate(&event),
            Some(HostEvent::Resized { width: 640, height: 480 })
        );
        assert_eq!(input.translate(&WindowEvent::Focused(true)), None);
    }
}
