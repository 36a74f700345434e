//! Per-frame input snapshot built from winit events. The game step reads it,
//! then `begin_frame` clears the edge-triggered parts before the next batch
//! of events arrives.

use rustc_hash::FxHashSet;
use winit::event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta};
use winit::keyboard::{KeyCode, PhysicalKey};

#[derive(Default)]
pub struct InputState {
    held: FxHashSet<KeyCode>,
    pressed: FxHashSet<KeyCode>,
    pub mouse_x: f32,
    pub mouse_y: f32,
    pub left_down: bool,
    /// Accumulated scroll for this frame, positive away from the user.
    pub wheel: f32,
}

pub fn init_state() -> InputState {
    InputState::default()
}

pub fn handle_keyboard_input(event: &KeyEvent, state: &mut InputState) {
    let PhysicalKey::Code(code) = event.physical_key else {
        return;
    };
    state.apply_key(code, event.state == ElementState::Pressed);
}

pub fn handle_mouse_button(button: MouseButton, pressed: bool, state: &mut InputState) {
    if button == MouseButton::Left {
        state.left_down = pressed;
    }
}

pub fn handle_mouse_wheel(delta: MouseScrollDelta, state: &mut InputState) {
    state.wheel += match delta {
        MouseScrollDelta::LineDelta(_, y) => y,
        MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 120.0,
    };
}

impl InputState {
    pub(crate) fn apply_key(&mut self, code: KeyCode, pressed: bool) {
        if pressed {
            if self.held.insert(code) {
                self.pressed.insert(code);
            }
        } else {
            self.held.remove(&code);
        }
    }

    /// True only on the frame the key went down.
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.pressed.contains(&code)
    }

    /// Drop edge-triggered state after the game step has consumed it.
    pub fn begin_frame(&mut self) {
        self.pressed.clear();
        self.wheel = 0.0;
    }
}
