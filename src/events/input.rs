//! Keyboard and mouse state, multiplexed over windows.
//!
//! Several keyboards and mice may share the same windows. A window loses
//! input (or mouse) focus only when no device focuses it any more, and
//! gains it only when the first device does.

use std::collections::HashSet;

use bitflags::bitflags;

use crate::events::{Event, WindowEventKind};
use crate::video::device::VideoDevice;
use crate::video::window::WindowId;

/// Virtual key code.
pub type Keycode = i32;

/// Key codes with modifier meaning.
pub mod keys {
    use super::Keycode;

    pub const UNKNOWN: Keycode = 0;
    pub const NUMLOCK: Keycode = 300;
    pub const CAPSLOCK: Keycode = 301;
    pub const SCROLLOCK: Keycode = 302;
    pub const RSHIFT: Keycode = 303;
    pub const LSHIFT: Keycode = 304;
    pub const RCTRL: Keycode = 305;
    pub const LCTRL: Keycode = 306;
    pub const RALT: Keycode = 307;
    pub const LALT: Keycode = 308;
    pub const RMETA: Keycode = 309;
    pub const LMETA: Keycode = 310;
    pub const MODE: Keycode = 313;
}

bitflags! {
    /// Modifier key state.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct KeyMod: u16 {
        const LSHIFT = 0x0001;
        const RSHIFT = 0x0002;
        const LCTRL = 0x0040;
        const RCTRL = 0x0080;
        const LALT = 0x0100;
        const RALT = 0x0200;
        const LMETA = 0x0400;
        const RMETA = 0x0800;
        const NUM = 0x1000;
        const CAPS = 0x2000;
        const MODE = 0x4000;
    }
}

/// Longest text input event payload, in bytes.
pub const TEXT_INPUT_SIZE: usize = 31;

fn held_modifier(key: Keycode) -> Option<KeyMod> {
    Some(match key {
        keys::LCTRL => KeyMod::LCTRL,
        keys::RCTRL => KeyMod::RCTRL,
        keys::LSHIFT => KeyMod::LSHIFT,
        keys::RSHIFT => KeyMod::RSHIFT,
        keys::LALT => KeyMod::LALT,
        keys::RALT => KeyMod::RALT,
        keys::LMETA => KeyMod::LMETA,
        keys::RMETA => KeyMod::RMETA,
        keys::MODE => KeyMod::MODE,
        _ => return None,
    })
}

#[derive(Debug, Clone, Default)]
pub struct Keyboard {
    pub focus: Option<WindowId>,
    pub modstate: KeyMod,
    pressed: HashSet<Keycode>,
}

impl Keyboard {
    #[must_use]
    pub fn is_pressed(&self, key: Keycode) -> bool {
        self.pressed.contains(&key)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Mouse {
    pub focus: Option<WindowId>,
    pub x: i32,
    pub y: i32,
    /// Bit `n - 1` is set while button `n` is down.
    pub buttonstate: u32,
    /// Motion is tracked as deltas only; the position stays put.
    pub relative_mode: bool,
    pub xdelta: i32,
    pub ydelta: i32,
}

/// Focus hand-over produced by a focus change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct FocusChange {
    pub lost: Option<WindowId>,
    pub gained: Option<WindowId>,
}

/// Every keyboard and mouse known to the device.
#[derive(Debug, Default)]
pub struct InputDevices {
    keyboards: Vec<Keyboard>,
    mice: Vec<Mouse>,
}

impl InputDevices {
    pub fn add_keyboard(&mut self) -> usize {
        self.keyboards.push(Keyboard::default());
        self.keyboards.len() - 1
    }

    pub fn add_mouse(&mut self) -> usize {
        self.mice.push(Mouse::default());
        self.mice.len() - 1
    }

    #[must_use]
    pub fn keyboard(&self, index: usize) -> Option<&Keyboard> {
        self.keyboards.get(index)
    }

    #[must_use]
    pub fn mouse(&self, index: usize) -> Option<&Mouse> {
        self.mice.get(index)
    }

    #[must_use]
    pub fn num_keyboards(&self) -> usize {
        self.keyboards.len()
    }

    #[must_use]
    pub fn num_mice(&self) -> usize {
        self.mice.len()
    }

    pub(crate) fn set_keyboard_focus(
        &mut self,
        index: usize,
        window: Option<WindowId>,
    ) -> FocusChange {
        let foci: Vec<Option<WindowId>> = self.keyboards.iter().map(|k| k.focus).collect();
        let Some(keyboard) = self.keyboards.get_mut(index) else {
            return FocusChange::default();
        };
        let change = focus_change(&foci, index, window);
        keyboard.focus = window;
        change
    }

    pub(crate) fn set_mouse_focus(&mut self, index: usize, window: Option<WindowId>) -> FocusChange {
        let foci: Vec<Option<WindowId>> = self.mice.iter().map(|m| m.focus).collect();
        let Some(mouse) = self.mice.get_mut(index) else {
            return FocusChange::default();
        };
        let change = focus_change(&foci, index, window);
        mouse.focus = window;
        change
    }

    /// Drop every reference to a destroyed window.
    pub(crate) fn forget_window(&mut self, id: WindowId) {
        for keyboard in &mut self.keyboards {
            if keyboard.focus == Some(id) {
                keyboard.focus = None;
            }
        }
        for mouse in &mut self.mice {
            if mouse.focus == Some(id) {
                mouse.focus = None;
            }
        }
    }
}

/// Which windows lose and gain focus when device `index` moves from its
/// current window to `window`, given every device's current focus.
fn focus_change(foci: &[Option<WindowId>], index: usize, window: Option<WindowId>) -> FocusChange {
    let current = foci.get(index).copied().flatten();
    if current == window {
        return FocusChange::default();
    }
    let held_elsewhere = |id: WindowId| {
        foci.iter()
            .enumerate()
            .any(|(i, focus)| i != index && *focus == Some(id))
    };
    FocusChange {
        lost: current.filter(|id| !held_elsewhere(*id)),
        gained: window.filter(|id| !held_elsewhere(*id)),
    }
}

impl VideoDevice {
    pub fn add_keyboard(&mut self) -> usize {
        self.input.add_keyboard()
    }

    pub fn add_mouse(&mut self) -> usize {
        self.input.add_mouse()
    }

    #[must_use]
    pub fn input(&self) -> &InputDevices {
        &self.input
    }

    /// Point a keyboard at a window, or at nothing.
    pub fn set_keyboard_focus(&mut self, index: usize, window: Option<WindowId>) {
        let change = self.input.set_keyboard_focus(index, window);
        if let Some(lost) = change.lost {
            self.send_window_event(lost, WindowEventKind::FocusLost, 0, 0);
        }
        if let Some(gained) = change.gained {
            self.send_window_event(gained, WindowEventKind::FocusGained, 0, 0);
        }
    }

    /// Point a mouse at a window, or at nothing.
    pub fn set_mouse_focus(&mut self, index: usize, window: Option<WindowId>) {
        let change = self.input.set_mouse_focus(index, window);
        if let Some(lost) = change.lost {
            self.send_window_event(lost, WindowEventKind::Leave, 0, 0);
        }
        if let Some(gained) = change.gained {
            self.send_window_event(gained, WindowEventKind::Enter, 0, 0);
        }
    }

    /// Report a key press or release.
    ///
    /// Modifier state is updated first. A key that is already in the
    /// reported state produces no event.
    pub fn send_keyboard_key(
        &mut self,
        index: usize,
        pressed: bool,
        scancode: u8,
        key: Keycode,
    ) -> bool {
        let Some(keyboard) = self.input.keyboards.get_mut(index) else {
            return false;
        };

        let modstate = if pressed {
            let before = keyboard.modstate;
            match key {
                keys::NUMLOCK => keyboard.modstate.toggle(KeyMod::NUM),
                keys::CAPSLOCK => keyboard.modstate.toggle(KeyMod::CAPS),
                _ => {
                    if let Some(held) = held_modifier(key) {
                        keyboard.modstate.insert(held);
                    }
                }
            }
            before
        } else {
            if let Some(held) = held_modifier(key) {
                keyboard.modstate.remove(held);
            }
            keyboard.modstate
        };

        if key != keys::UNKNOWN {
            if keyboard.pressed.contains(&key) == pressed {
                return false;
            }
            if pressed {
                keyboard.pressed.insert(key);
            } else {
                keyboard.pressed.remove(&key);
            }
        }

        let window = keyboard.focus;
        let event = if pressed {
            Event::KeyDown {
                which: index,
                window,
                scancode,
                key,
                modstate,
            }
        } else {
            Event::KeyUp {
                which: index,
                window,
                scancode,
                key,
                modstate,
            }
        };
        self.events.push(event)
    }

    /// Report composed text. Long text is cut at [`TEXT_INPUT_SIZE`] bytes.
    pub fn send_keyboard_text(&mut self, index: usize, text: &str) -> bool {
        let Some(keyboard) = self.input.keyboards.get(index) else {
            return false;
        };
        let mut end = text.len().min(TEXT_INPUT_SIZE);
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        let event = Event::TextInput {
            which: index,
            window: keyboard.focus,
            text: text[..end].to_owned(),
        };
        self.events.push(event)
    }

    /// Report pointer motion, absolute or relative. Motion that goes
    /// nowhere is dropped.
    pub fn send_mouse_motion(&mut self, index: usize, relative: bool, x: i32, y: i32) -> bool {
        let Some(mouse) = self.input.mice.get_mut(index) else {
            return false;
        };
        let (x, y, xrel, yrel) = if relative {
            (mouse.x.saturating_add(x), mouse.y.saturating_add(y), x, y)
        } else {
            (x, y, x.saturating_sub(mouse.x), y.saturating_sub(mouse.y))
        };
        if xrel == 0 && yrel == 0 {
            return false;
        }
        if !mouse.relative_mode {
            mouse.x = x;
            mouse.y = y;
        }
        mouse.xdelta = mouse.xdelta.saturating_add(xrel);
        mouse.ydelta = mouse.ydelta.saturating_add(yrel);

        let event = Event::MouseMotion {
            which: index,
            window: mouse.focus,
            state: mouse.buttonstate,
            x: mouse.x,
            y: mouse.y,
            xrel,
            yrel,
        };
        self.events.push(event)
    }

    /// Report a button press or release. Buttons are numbered from 1.
    pub fn send_mouse_button(&mut self, index: usize, pressed: bool, button: u8) -> bool {
        let Some(mouse) = self.input.mice.get_mut(index) else {
            return false;
        };
        let Some(mask) = button
            .checked_sub(1)
            .and_then(|bit| 1u32.checked_shl(u32::from(bit)))
        else {
            return false;
        };
        if (mouse.buttonstate & mask != 0) == pressed {
            return false;
        }
        mouse.buttonstate ^= mask;

        let (which, window, x, y) = (index, mouse.focus, mouse.x, mouse.y);
        let event = if pressed {
            Event::MouseButtonDown {
                which,
                window,
                button,
                x,
                y,
            }
        } else {
            Event::MouseButtonUp {
                which,
                window,
                button,
                x,
                y,
            }
        };
        self.events.push(event)
    }

    pub fn send_mouse_wheel(&mut self, index: usize, motion: i32) -> bool {
        let Some(mouse) = self.input.mice.get(index) else {
            return false;
        };
        if motion == 0 {
            return false;
        }
        let event = Event::MouseWheel {
            which: index,
            window: mouse.focus,
            motion,
        };
        self.events.push(event)
    }

    /// Track motion as deltas only.
    pub fn set_relative_mouse_mode(&mut self, index: usize, enabled: bool) {
        if let Some(mouse) = self.input.mice.get_mut(index) {
            mouse.relative_mode = enabled;
        }
    }
}
