//! Pointer and keyboard tracking.
//!
//! Turns raw winit window events into the few signals a loader reacts to:
//! where the pointer is (in pixels and normalized to the window), whether
//! the primary button was clicked this frame, and whether one of a handful
//! of keys was pressed.

use glam::Vec2;
use std::collections::HashSet;
use winit::event::{ElementState, MouseButton as WinitMouseButton, WindowEvent};
use winit::keyboard::{KeyCode as WinitKeyCode, PhysicalKey};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

impl From<WinitMouseButton> for MouseButton {
    fn from(btn: WinitMouseButton) -> Self {
        match btn {
            WinitMouseButton::Right => MouseButton::Right,
            WinitMouseButton::Middle => MouseButton::Middle,
            _ => MouseButton::Left,
        }
    }
}

/// The keys a loader listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Enter,
    Space,
    Escape,
    Other(u32),
}

impl From<WinitKeyCode> for KeyCode {
    fn from(key: WinitKeyCode) -> Self {
        match key {
            WinitKeyCode::Enter | WinitKeyCode::NumpadEnter => KeyCode::Enter,
            WinitKeyCode::Space => KeyCode::Space,
            WinitKeyCode::Escape => KeyCode::Escape,
            _ => KeyCode::Other(key as u32),
        }
    }
}

/// Per-frame input state.
#[derive(Debug)]
pub struct Input {
    keys_held: HashSet<KeyCode>,
    keys_pressed: HashSet<KeyCode>,

    mouse_held: HashSet<MouseButton>,
    mouse_pressed: HashSet<MouseButton>,

    mouse_position: Vec2,
    /// Set once the pointer has entered the window at least once.
    pointer_seen: bool,

    window_size: (u32, u32),
}

impl Default for Input {
    fn default() -> Self {
        Self::new()
    }
}

impl Input {
    pub fn new() -> Self {
        Self {
            keys_held: HashSet::new(),
            keys_pressed: HashSet::new(),
            mouse_held: HashSet::new(),
            mouse_pressed: HashSet::new(),
            mouse_position: Vec2::ZERO,
            pointer_seen: false,
            window_size: (800, 600),
        }
    }

    /// Key went down this frame (repeats ignored).
    pub fn key_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    pub fn key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    /// Button went down this frame.
    pub fn mouse_pressed(&self, button: MouseButton) -> bool {
        self.mouse_pressed.contains(&button)
    }

    pub fn mouse_held(&self, button: MouseButton) -> bool {
        self.mouse_held.contains(&button)
    }

    /// Pointer position in window pixels.
    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }

    /// Pointer position divided by the window size, `0..1` on both axes
    /// with the origin at the top left. Centered until the pointer moves.
    pub fn mouse_normalized(&self) -> Vec2 {
        let (w, h) = self.window_size;
        if !self.pointer_seen || w == 0 || h == 0 {
            return Vec2::splat(0.5);
        }
        self.mouse_position / Vec2::new(w as f32, h as f32)
    }

    pub fn window_size(&self) -> (u32, u32) {
        self.window_size
    }

    /// Clear per-frame state. Call after the frame has consumed it.
    pub(crate) fn begin_frame(&mut self) {
        self.keys_pressed.clear();
        self.mouse_pressed.clear();
    }

    pub(crate) fn set_window_size(&mut self, width: u32, height: u32) {
        self.window_size = (width, height);
    }

    pub(crate) fn move_pointer(&mut self, position: Vec2) {
        self.mouse_position = position;
        self.pointer_seen = true;
    }

    pub(crate) fn key_event(&mut self, key: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if !self.keys_held.contains(&key) {
                    self.keys_pressed.insert(key);
                }
                self.keys_held.insert(key);
            }
            ElementState::Released => {
                self.keys_held.remove(&key);
            }
        }
    }

    pub(crate) fn mouse_event(&mut self, button: MouseButton, state: ElementState) {
        match state {
            ElementState::Pressed => {
                self.mouse_pressed.insert(button);
                self.mouse_held.insert(button);
            }
            ElementState::Released => {
                self.mouse_held.remove(&button);
            }
        }
    }

    /// Process a winit window event.
    pub(crate) fn handle_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    self.key_event(KeyCode::from(code), event.state);
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.mouse_event(MouseButton::from(*button), *state);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.move_pointer(Vec2::new(position.x as f32, position.y as f32));
            }
            WindowEvent::Resized(size) => {
                self.set_window_size(size.width, size.height);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_press_is_edge_triggered() {
        let mut input = Input::new();
        input.key_event(KeyCode::Enter, ElementState::Pressed);
        assert!(input.key_pressed(KeyCode::Enter));

        input.begin_frame();
        // OS key repeat while held
        input.key_event(KeyCode::Enter, ElementState::Pressed);
        assert!(!input.key_pressed(KeyCode::Enter));
        assert!(input.key_held(KeyCode::Enter));

        input.key_event(KeyCode::Enter, ElementState::Released);
        assert!(!input.key_held(KeyCode::Enter));
    }

    #[test]
    fn test_click_cleared_each_frame() {
        let mut input = Input::new();
        input.mouse_event(MouseButton::Left, ElementState::Pressed);
        assert!(input.mouse_pressed(MouseButton::Left));
        input.begin_frame();
        assert!(!input.mouse_pressed(MouseButton::Left));
        assert!(input.mouse_held(MouseButton::Left));
    }

    #[test]
    fn test_mouse_normalized() {
        let mut input = Input::new();
        input.set_window_size(800, 600);
        assert_eq!(input.mouse_normalized(), Vec2::splat(0.5));

        input.move_pointer(Vec2::new(200.0, 450.0));
        assert_eq!(input.mouse_normalized(), Vec2::new(0.25, 0.75));
    }
}
