//! Event bridge between backends and the application's event queue.
//!
//! Backends report what happened on the platform; the bridge applies the
//! state change to the window, drops events that would not change anything
//! and forwards the rest to an [`EventSink`].

pub mod input;

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use log::{debug, warn};
use parking_lot::Mutex;

use crate::error::VideoResult;
use crate::video::device::VideoDevice;
use crate::video::window::{WindowFlags, WindowId};

use self::input::{KeyMod, Keycode};

/// Largest number of events an [`EventQueue`] holds before refusing more.
pub const MAX_EVENTS: usize = 128;

/// What happened to a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowEventKind {
    Shown,
    Hidden,
    Exposed,
    Moved,
    Resized,
    Minimized,
    Maximized,
    Restored,
    Enter,
    Leave,
    FocusGained,
    FocusLost,
    Close,
}

/// Event categories that can be enabled or disabled as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Window,
    KeyDown,
    KeyUp,
    TextInput,
    MouseMotion,
    MouseButtonDown,
    MouseButtonUp,
    MouseWheel,
    Quit,
}

/// An event delivered to the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Window {
        window: WindowId,
        event: WindowEventKind,
        data1: i32,
        data2: i32,
    },
    KeyDown {
        which: usize,
        window: Option<WindowId>,
        scancode: u8,
        key: Keycode,
        modstate: KeyMod,
    },
    KeyUp {
        which: usize,
        window: Option<WindowId>,
        scancode: u8,
        key: Keycode,
        modstate: KeyMod,
    },
    TextInput {
        which: usize,
        window: Option<WindowId>,
        text: String,
    },
    MouseMotion {
        which: usize,
        window: Option<WindowId>,
        state: u32,
        x: i32,
        y: i32,
        xrel: i32,
        yrel: i32,
    },
    MouseButtonDown {
        which: usize,
        window: Option<WindowId>,
        button: u8,
        x: i32,
        y: i32,
    },
    MouseButtonUp {
        which: usize,
        window: Option<WindowId>,
        button: u8,
        x: i32,
        y: i32,
    },
    MouseWheel {
        which: usize,
        window: Option<WindowId>,
        motion: i32,
    },
    Quit,
}

impl Event {
    #[must_use]
    pub fn event_type(&self) -> EventType {
        match self {
            Event::Window { .. } => EventType::Window,
            Event::KeyDown { .. } => EventType::KeyDown,
            Event::KeyUp { .. } => EventType::KeyUp,
            Event::TextInput { .. } => EventType::TextInput,
            Event::MouseMotion { .. } => EventType::MouseMotion,
            Event::MouseButtonDown { .. } => EventType::MouseButtonDown,
            Event::MouseButtonUp { .. } => EventType::MouseButtonUp,
            Event::MouseWheel { .. } => EventType::MouseWheel,
            Event::Quit => EventType::Quit,
        }
    }
}

/// Destination of bridged events.
pub trait EventSink: Send {
    /// Start accepting events. `threaded` asks for a dedicated pump thread.
    fn start(&mut self, threaded: bool) -> VideoResult<()>;

    /// Stop accepting events.
    fn stop(&mut self);

    /// Offer an event. Returns whether it was accepted.
    fn push(&mut self, event: Event) -> bool;
}

#[derive(Debug, Default)]
struct QueueState {
    events: VecDeque<Event>,
    disabled: HashSet<EventType>,
    running: bool,
    threaded: bool,
}

/// A bounded FIFO event queue.
///
/// Clones share the same queue, so the application keeps one handle while
/// the device owns another.
#[derive(Debug, Clone, Default)]
pub struct EventQueue {
    state: Arc<Mutex<QueueState>>,
}

impl EventQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable delivery of one event type.
    pub fn set_enabled(&self, event_type: EventType, enabled: bool) {
        let mut state = self.state.lock();
        if enabled {
            state.disabled.remove(&event_type);
        } else {
            state.disabled.insert(event_type);
        }
    }

    #[must_use]
    pub fn is_enabled(&self, event_type: EventType) -> bool {
        !self.state.lock().disabled.contains(&event_type)
    }

    /// Take the oldest event.
    pub fn poll(&self) -> Option<Event> {
        self.state.lock().events.pop_front()
    }

    /// Take every queued event, oldest first.
    pub fn drain(&self) -> Vec<Event> {
        self.state.lock().events.drain(..).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().events.is_empty()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state.lock().running
    }

    #[must_use]
    pub fn is_threaded(&self) -> bool {
        self.state.lock().threaded
    }
}

impl EventSink for EventQueue {
    fn start(&mut self, threaded: bool) -> VideoResult<()> {
        let mut state = self.state.lock();
        state.running = true;
        state.threaded = threaded;
        Ok(())
    }

    fn stop(&mut self) {
        let mut state = self.state.lock();
        state.running = false;
        state.threaded = false;
    }

    fn push(&mut self, event: Event) -> bool {
        let mut state = self.state.lock();
        if !state.running
            || state.disabled.contains(&event.event_type())
            || state.events.len() >= MAX_EVENTS
        {
            return false;
        }
        state.events.push_back(event);
        true
    }
}

/// A platform event as reported by a backend's event pump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeEvent {
    Window {
        window: WindowId,
        event: WindowEventKind,
        data1: i32,
        data2: i32,
    },
    KeyboardFocus {
        keyboard: usize,
        window: Option<WindowId>,
    },
    Key {
        keyboard: usize,
        pressed: bool,
        scancode: u8,
        key: Keycode,
    },
    Text {
        keyboard: usize,
        text: String,
    },
    MouseFocus {
        mouse: usize,
        window: Option<WindowId>,
    },
    MouseMotion {
        mouse: usize,
        relative: bool,
        x: i32,
        y: i32,
    },
    MouseButton {
        mouse: usize,
        pressed: bool,
        button: u8,
    },
    MouseWheel {
        mouse: usize,
        motion: i32,
    },
    Quit,
}

impl VideoDevice {
    /// Apply a window event and forward it to the sink.
    ///
    /// Events that would not change the window's state are dropped, except
    /// `FocusLost`, which is always processed. A fullscreen window that
    /// becomes visible takes the display over from any other. Returns
    /// whether the event reached the sink.
    pub fn send_window_event(
        &mut self,
        id: WindowId,
        event: WindowEventKind,
        data1: i32,
        data2: i32,
    ) -> bool {
        let Some(window) = self.displays.window_mut(id) else {
            return false;
        };
        let flags = &mut window.flags;
        match event {
            WindowEventKind::Shown => {
                if flags.contains(WindowFlags::SHOWN) {
                    return false;
                }
                flags.insert(WindowFlags::SHOWN);
            }
            WindowEventKind::Hidden => {
                if !flags.contains(WindowFlags::SHOWN) {
                    return false;
                }
                flags.remove(WindowFlags::SHOWN);
            }
            WindowEventKind::Moved => {
                if window.x == data1 && window.y == data2 {
                    return false;
                }
                window.x = data1;
                window.y = data2;
            }
            WindowEventKind::Resized => {
                if window.w == data1 && window.h == data2 {
                    return false;
                }
                window.w = data1;
                window.h = data2;
            }
            WindowEventKind::Minimized => {
                if flags.contains(WindowFlags::MINIMIZED) {
                    return false;
                }
                flags.remove(WindowFlags::MAXIMIZED);
                flags.insert(WindowFlags::MINIMIZED);
            }
            WindowEventKind::Maximized => {
                if flags.contains(WindowFlags::MAXIMIZED) {
                    return false;
                }
                flags.remove(WindowFlags::MINIMIZED);
                flags.insert(WindowFlags::MAXIMIZED);
            }
            WindowEventKind::Restored => {
                if !flags.intersects(WindowFlags::MAXIMIZED | WindowFlags::MINIMIZED) {
                    return false;
                }
                flags.remove(WindowFlags::MAXIMIZED | WindowFlags::MINIMIZED);
            }
            WindowEventKind::Enter => {
                if flags.contains(WindowFlags::MOUSE_FOCUS) {
                    return false;
                }
                flags.insert(WindowFlags::MOUSE_FOCUS);
            }
            WindowEventKind::Leave => {
                if !flags.contains(WindowFlags::MOUSE_FOCUS) {
                    return false;
                }
                flags.remove(WindowFlags::MOUSE_FOCUS);
            }
            WindowEventKind::FocusGained => {
                if flags.contains(WindowFlags::INPUT_FOCUS) {
                    return false;
                }
                flags.insert(WindowFlags::INPUT_FOCUS);
                self.on_focus_gained(id);
            }
            WindowEventKind::FocusLost => {
                flags.remove(WindowFlags::INPUT_FOCUS);
                self.on_focus_lost(id);
            }
            WindowEventKind::Exposed | WindowEventKind::Close => {}
        }

        let delivered = self.events.push(Event::Window {
            window: id,
            event,
            data1,
            data2,
        });

        if matches!(
            event,
            WindowEventKind::Shown | WindowEventKind::Maximized | WindowEventKind::Restored
        ) {
            if let Some(window) = self
                .displays
                .window(id)
                .filter(|window| window.is_fullscreen_visible())
            {
                let display = window.display();
                self.activate_fullscreen(id, display);
            }
        }
        delivered
    }

    fn on_focus_gained(&mut self, id: WindowId) {
        let Some(window) = self.displays.window(id) else {
            return;
        };
        let display = window.display();
        let flags = window.flags;

        if flags.contains(WindowFlags::FULLSCREEN) {
            let mode = self
                .displays
                .get(display)
                .and_then(|display| display.fullscreen_mode.clone());
            if let Err(err) = self.set_display_mode_on(display, mode.as_ref()) {
                warn!("Couldn't switch to the fullscreen mode: {}", err);
            }
        }
        self.reapply_gamma(display);
        if flags.contains(WindowFlags::INPUT_GRABBED) {
            self.with_window_hook(id, |hooks, window| hooks.set_window_grab(window));
        }
    }

    fn on_focus_lost(&mut self, id: WindowId) {
        let Some(window) = self.displays.window(id) else {
            return;
        };
        let display = window.display();
        let flags = window.flags;

        // Another fullscreen window still showing keeps the display.
        let display_taken = self.displays.get(display).is_some_and(|display| {
            display
                .windows()
                .any(|other| other.id() != id && other.is_fullscreen_visible())
        });
        if flags.contains(WindowFlags::FULLSCREEN) && !display_taken {
            if let Err(err) = self.minimize_window(id) {
                warn!("Couldn't minimize window {}: {}", id, err);
            }
            if let Err(err) = self.set_display_mode_on(display, None) {
                warn!("Couldn't restore the desktop mode: {}", err);
            }
        }
        self.restore_saved_gamma(display);
        if flags.contains(WindowFlags::INPUT_GRABBED) {
            self.with_window_hook(id, |hooks, window| hooks.set_window_grab(window));
        }
    }

    /// Ask the application to quit.
    pub fn send_quit(&mut self) -> bool {
        self.events.push(Event::Quit)
    }

    /// Route one backend event through the bridge.
    pub fn dispatch_native_event(&mut self, event: NativeEvent) -> bool {
        match event {
            NativeEvent::Window {
                window,
                event,
                data1,
                data2,
            } => self.send_window_event(window, event, data1, data2),
            NativeEvent::KeyboardFocus { keyboard, window } => {
                self.set_keyboard_focus(keyboard, window);
                true
            }
            NativeEvent::Key {
                keyboard,
                pressed,
                scancode,
                key,
            } => self.send_keyboard_key(keyboard, pressed, scancode, key),
            NativeEvent::Text { keyboard, text } => self.send_keyboard_text(keyboard, &text),
            NativeEvent::MouseFocus { mouse, window } => {
                self.set_mouse_focus(mouse, window);
                true
            }
            NativeEvent::MouseMotion {
                mouse,
                relative,
                x,
                y,
            } => self.send_mouse_motion(mouse, relative, x, y),
            NativeEvent::MouseButton {
                mouse,
                pressed,
                button,
            } => self.send_mouse_button(mouse, pressed, button),
            NativeEvent::MouseWheel { mouse, motion } => self.send_mouse_wheel(mouse, motion),
            NativeEvent::Quit => {
                debug!("Quit requested by the platform");
                self.send_quit()
            }
        }
    }
}
