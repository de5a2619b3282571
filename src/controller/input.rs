/// Platform-agnostic input handling system
use glam::Vec2;
use std::collections::HashSet;

/// Platform-independent input events
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    // Keyboard events
    KeyDown(String),
    KeyUp(String),

    // Mouse events
    MouseMove { dx: f32, dy: f32 },
    MouseButton { button: MouseButton, is_down: bool },
    MouseWheel { delta_y: f32 },

    // Window events
    FocusLost,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Polled keyboard/mouse state for one tick.
pub trait InputSource {
    /// Key is held this tick.
    fn key_held(&self, key: &str) -> bool;
    /// Key went down this tick.
    fn key_down(&self, key: &str) -> bool;
    fn mouse_button_down(&self, button: MouseButton) -> bool;
    fn mouse_button_up(&self, button: MouseButton) -> bool;
    /// Mouse movement since last tick, +y is up.
    fn mouse_delta(&self) -> Vec2;
    fn scroll_delta(&self) -> f32;
}

/// Accumulates events between ticks; [`InputState::end_frame`] clears the per-tick edges.
#[derive(Debug, Default, Clone)]
pub struct InputState {
    pub pressed_keys: HashSet<String>,
    pressed_this_frame: HashSet<String>,
    buttons: HashSet<MouseButton>,
    buttons_down: HashSet<MouseButton>,
    buttons_up: HashSet<MouseButton>,
    look_delta: Vec2,
    scroll: f32,
}

fn key_id(key: &str) -> String {
    key.to_ascii_lowercase()
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process an input event and update state
    pub fn process_event(&mut self, event: &InputEvent) {
        match event {
            InputEvent::KeyDown(key) => {
                let id = key_id(key);
                // Auto-repeat keeps the key held without a new edge
                if self.pressed_keys.insert(id.clone()) {
                    self.pressed_this_frame.insert(id);
                }
            }
            InputEvent::KeyUp(key) => {
                self.pressed_keys.remove(&key_id(key));
            }
            InputEvent::MouseMove { dx, dy } => {
                self.look_delta += Vec2::new(*dx, *dy);
            }
            InputEvent::MouseButton { button, is_down } => {
                if *is_down {
                    if self.buttons.insert(*button) {
                        self.buttons_down.insert(*button);
                    }
                } else if self.buttons.remove(button) {
                    self.buttons_up.insert(*button);
                }
            }
            InputEvent::MouseWheel { delta_y } => {
                self.scroll += delta_y;
            }
            InputEvent::FocusLost => {
                self.clear_keys();
            }
        }
    }

    pub fn is_key_pressed(&self, key: &str) -> bool {
        self.pressed_keys.contains(&key_id(key))
    }

    pub fn is_button_held(&self, button: MouseButton) -> bool {
        self.buttons.contains(&button)
    }

    pub fn clear_keys(&mut self) {
        self.pressed_keys.clear();
        self.pressed_this_frame.clear();
        for b in self.buttons.drain() {
            self.buttons_up.insert(b);
        }
    }

    /// Drop edges and deltas once the tick has consumed them.
    pub fn end_frame(&mut self) {
        self.pressed_this_frame.clear();
        self.buttons_down.clear();
        self.buttons_up.clear();
        self.look_delta = Vec2::ZERO;
        self.scroll = 0.0;
    }
}

impl InputSource for InputState {
    fn key_held(&self, key: &str) -> bool {
        self.is_key_pressed(key)
    }

    fn key_down(&self, key: &str) -> bool {
        self.pressed_this_frame.contains(&key_id(key))
    }

    fn mouse_button_down(&self, button: MouseButton) -> bool {
        self.buttons_down.contains(&button)
    }

    fn mouse_button_up(&self, button: MouseButton) -> bool {
        self.buttons_up.contains(&button)
    }

    fn mouse_delta(&self) -> Vec2 {
        // Screen space grows downward
        Vec2::new(self.look_delta.x, -self.look_delta.y)
    }

    fn scroll_delta(&self) -> f32 {
        self.scroll
    }
}

/// Key mapping configuration
#[derive(Debug, Clone, PartialEq)]
pub struct KeyBindings {
    pub forward: String,
    pub backward: String,
    pub left: String,
    pub right: String,
    pub up: String,
    pub down: String,
    pub sprint: String,
    pub slow: String,
    pub roll_left: String,
    pub roll_right: String,
    pub roll_reset: String,
    pub toggle_lock: String,
    pub capture: String,
    pub toggle_scene_sync: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            forward: "w".to_string(),
            backward: "s".to_string(),
            left: "a".to_string(),
            right: "d".to_string(),
            up: "e".to_string(),
            down: "q".to_string(),
            sprint: "Shift".to_string(),
            slow: "Control".to_string(),
            roll_left: "z".to_string(),
            roll_right: "c".to_string(),
            roll_reset: "x".to_string(),
            toggle_lock: "r".to_string(),
            capture: "p".to_string(),
            toggle_scene_sync: "o".to_string(),
        }
    }
}

#[cfg(feature = "native")]
pub mod native {
    use super::*;
    use winit::event::{DeviceEvent, ElementState, MouseScrollDelta, WindowEvent};
    use winit::keyboard::Key;

    fn key_name(key: &Key) -> Option<String> {
        match key {
            Key::Character(s) => Some(s.to_string()),
            Key::Named(named) => Some(format!("{:?}", named)),
            _ => None,
        }
    }

    pub fn key_to_input(key: &Key, state: ElementState) -> Option<InputEvent> {
        let key = key_name(key)?;
        Some(match state {
            ElementState::Pressed => InputEvent::KeyDown(key),
            ElementState::Released => InputEvent::KeyUp(key),
        })
    }

    pub fn window_event_to_input(event: &WindowEvent) -> Option<InputEvent> {
        match event {
            WindowEvent::KeyboardInput { event, .. } => key_to_input(&event.logical_key, event.state),
            WindowEvent::MouseInput { state, button, .. } => {
                let button = match button {
                    winit::event::MouseButton::Left => MouseButton::Left,
                    winit::event::MouseButton::Right => MouseButton::Right,
                    winit::event::MouseButton::Middle => MouseButton::Middle,
                    _ => return None,
                };
                Some(InputEvent::MouseButton { button, is_down: *state == ElementState::Pressed })
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let delta_y = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(p) => (p.y / 120.0) as f32,
                };
                Some(InputEvent::MouseWheel { delta_y })
            }
            WindowEvent::Focused(false) => Some(InputEvent::FocusLost),
            _ => None,
        }
    }

    pub fn device_event_to_input(event: &DeviceEvent) -> Option<InputEvent> {
        match event {
            DeviceEvent::MouseMotion { delta } => {
                Some(InputEvent::MouseMove { dx: delta.0 as f32, dy: delta.1 as f32 })
            }
            _ => None,
        }
    }

}
