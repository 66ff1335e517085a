//!
//! Windows and their lifecycle.
//!
//! Windows live in their display's id-keyed map. Removing one never moves
//! the others, so every reference to a window is by [`WindowId`].
//!
//! At most one window per display may be fullscreen-visible at a time:
//! when a window becomes fullscreen-visible, every other fullscreen-visible
//! window on that display is minimized before the display switches to its
//! fullscreen mode.
//!

use std::any::Any;
use std::fmt;

use bitflags::bitflags;
use log::{debug, warn};

use crate::error::{VideoError, VideoResult};
use crate::events::WindowEventKind;
use crate::render::renderer::Renderer;
use crate::video::backend::WindowBackend;
use crate::video::device::VideoDevice;

/// Window identifier. Zero is never a valid id.
pub type WindowId = u32;

/// Position value that leaves an axis unchanged.
pub const WINDOWPOS_UNDEFINED: i32 = 0x7FF_FFFF;
/// Position value asking the backend to center the window.
pub const WINDOWPOS_CENTERED: i32 = 0x7FF_FFFE;

bitflags! {
    /// Window state flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct WindowFlags: u32 {
        const FULLSCREEN = 0x0000_0001;
        const OPENGL = 0x0000_0002;
        const SHOWN = 0x0000_0004;
        const BORDERLESS = 0x0000_0008;
        const RESIZABLE = 0x0000_0010;
        const MAXIMIZED = 0x0000_0020;
        const MINIMIZED = 0x0000_0040;
        const INPUT_GRABBED = 0x0000_0100;
        const INPUT_FOCUS = 0x0000_0200;
        const MOUSE_FOCUS = 0x0000_0400;
        /// Created from a native window handle.
        const FOREIGN = 0x0000_0800;
    }
}

impl WindowFlags {
    /// Flags a caller may request at creation. Anything else is dropped.
    pub const CREATION_ALLOWED: Self = Self::FULLSCREEN
        .union(Self::OPENGL)
        .union(Self::SHOWN)
        .union(Self::BORDERLESS)
        .union(Self::RESIZABLE)
        .union(Self::MAXIMIZED)
        .union(Self::MINIMIZED)
        .union(Self::INPUT_GRABBED);
}

/// One on-screen window.
pub struct Window {
    pub(crate) id: WindowId,
    pub title: Option<String>,
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
    pub flags: WindowFlags,
    pub(crate) display: usize,
    pub(crate) userdata: Option<Box<dyn Any + Send>>,
    pub(crate) renderer: Option<Renderer>,
    /// Backend-private state.
    pub driverdata: Option<Box<dyn Any + Send>>,
}

impl Window {
    pub(crate) fn new(id: WindowId, display: usize) -> Self {
        Self {
            id,
            title: None,
            x: 0,
            y: 0,
            w: 0,
            h: 0,
            flags: WindowFlags::empty(),
            display,
            userdata: None,
            renderer: None,
            driverdata: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> WindowId {
        self.id
    }

    /// Index of the display that owns the window.
    #[must_use]
    pub fn display(&self) -> usize {
        self.display
    }

    #[must_use]
    pub fn renderer(&self) -> Option<&Renderer> {
        self.renderer.as_ref()
    }

    /// Fullscreen, shown and not minimized.
    #[must_use]
    pub fn is_fullscreen_visible(&self) -> bool {
        self.flags.contains(WindowFlags::FULLSCREEN | WindowFlags::SHOWN)
            && !self.flags.contains(WindowFlags::MINIMIZED)
    }
}

impl fmt::Debug for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Window")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("x", &self.x)
            .field("y", &self.y)
            .field("w", &self.w)
            .field("h", &self.h)
            .field("flags", &self.flags)
            .field("display", &self.display)
            .field("renderer", &self.renderer.as_ref().map(Renderer::id))
            .finish_non_exhaustive()
    }
}

impl VideoDevice {
    /// Create a window on the current display and return its id.
    ///
    /// Flags outside [`WindowFlags::CREATION_ALLOWED`] are dropped.
    pub fn create_window(
        &mut self,
        title: Option<&str>,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        flags: WindowFlags,
    ) -> VideoResult<WindowId> {
        let display_index = self.current_display;
        let mut window = Window::new(self.next_object_id()?, display_index);
        window.title = title.map(str::to_owned);
        window.x = x;
        window.y = y;
        window.w = w;
        window.h = h;
        window.flags = flags & WindowFlags::CREATION_ALLOWED;

        if let Some(windows) = self.backend.windows() {
            windows.create_window(&mut window)?;
        }

        let id = window.id;
        let fullscreen_visible = window.is_fullscreen_visible();
        self.displays.display_mut(display_index)?.windows.insert(id, window);
        debug!("Created window {} on display {}", id, display_index);

        if fullscreen_visible {
            self.activate_fullscreen(id, display_index);
        }
        Ok(id)
    }

    /// Wrap an existing native window.
    pub fn create_window_from(&mut self, data: &dyn Any) -> VideoResult<WindowId> {
        let display_index = self.current_display;
        let mut window = Window::new(self.next_object_id()?, display_index);

        let windows = self
            .backend
            .windows()
            .ok_or(VideoError::Unsupported("CreateWindowFrom"))?;
        windows.create_window_from(&mut window, data)?;
        window.flags |= WindowFlags::FOREIGN;

        let id = window.id;
        self.displays.display_mut(display_index)?.windows.insert(id, window);
        debug!("Created foreign window {} on display {}", id, display_index);
        Ok(id)
    }

    #[must_use]
    pub fn window(&self, id: WindowId) -> Option<&Window> {
        self.displays.window(id)
    }

    pub fn window_mut(&mut self, id: WindowId) -> Option<&mut Window> {
        self.displays.window_mut(id)
    }

    /// Ids of every window on every display.
    #[must_use]
    pub fn window_ids(&self) -> Vec<WindowId> {
        self.displays
            .iter()
            .flat_map(|display| display.windows.keys().copied())
            .collect()
    }

    pub fn window_flags(&self, id: WindowId) -> VideoResult<WindowFlags> {
        self.window_ref(id).map(|window| window.flags)
    }

    pub fn set_window_title(&mut self, id: WindowId, title: &str) -> VideoResult<()> {
        self.window_mut_ref(id)?.title = Some(title.to_owned());
        self.with_window_hook(id, |hooks, window| hooks.set_window_title(window));
        Ok(())
    }

    pub fn window_title(&self, id: WindowId) -> VideoResult<Option<&str>> {
        self.window_ref(id).map(|window| window.title.as_deref())
    }

    /// Attach caller data to a window, returning the previous data.
    pub fn set_window_data(
        &mut self,
        id: WindowId,
        data: Option<Box<dyn Any + Send>>,
    ) -> VideoResult<Option<Box<dyn Any + Send>>> {
        let window = self.window_mut_ref(id)?;
        Ok(std::mem::replace(&mut window.userdata, data))
    }

    pub fn window_data(&self, id: WindowId) -> VideoResult<Option<&(dyn Any + Send)>> {
        self.window_ref(id).map(|window| window.userdata.as_deref())
    }

    /// Move a window. [`WINDOWPOS_UNDEFINED`] keeps that axis.
    pub fn set_window_position(&mut self, id: WindowId, x: i32, y: i32) -> VideoResult<()> {
        let window = self.window_mut_ref(id)?;
        if x != WINDOWPOS_UNDEFINED {
            window.x = x;
        }
        if y != WINDOWPOS_UNDEFINED {
            window.y = y;
        }
        self.with_window_hook(id, |hooks, window| hooks.set_window_position(window));
        Ok(())
    }

    pub fn window_position(&self, id: WindowId) -> VideoResult<(i32, i32)> {
        self.window_ref(id).map(|window| (window.x, window.y))
    }

    pub fn set_window_size(&mut self, id: WindowId, w: i32, h: i32) -> VideoResult<()> {
        let window = self.window_mut_ref(id)?;
        window.w = w;
        window.h = h;
        self.with_window_hook(id, |hooks, window| hooks.set_window_size(window));
        Ok(())
    }

    pub fn window_size(&self, id: WindowId) -> VideoResult<(i32, i32)> {
        self.window_ref(id).map(|window| (window.w, window.h))
    }

    pub fn show_window(&mut self, id: WindowId) -> VideoResult<()> {
        if self.window_flags(id)?.contains(WindowFlags::SHOWN) {
            return Ok(());
        }
        self.send_window_event(id, WindowEventKind::Shown, 0, 0);
        self.with_window_hook(id, |hooks, window| hooks.show_window(window));
        Ok(())
    }

    pub fn hide_window(&mut self, id: WindowId) -> VideoResult<()> {
        if !self.window_flags(id)?.contains(WindowFlags::SHOWN) {
            return Ok(());
        }
        self.send_window_event(id, WindowEventKind::Hidden, 0, 0);
        self.with_window_hook(id, |hooks, window| hooks.hide_window(window));
        Ok(())
    }

    pub fn raise_window(&mut self, id: WindowId) -> VideoResult<()> {
        self.window_ref(id)?;
        self.with_window_hook(id, |hooks, window| hooks.raise_window(window));
        Ok(())
    }

    pub fn maximize_window(&mut self, id: WindowId) -> VideoResult<()> {
        if self.window_flags(id)?.contains(WindowFlags::MAXIMIZED) {
            return Ok(());
        }
        self.send_window_event(id, WindowEventKind::Maximized, 0, 0);
        self.with_window_hook(id, |hooks, window| hooks.maximize_window(window));
        Ok(())
    }

    pub fn minimize_window(&mut self, id: WindowId) -> VideoResult<()> {
        if self.window_flags(id)?.contains(WindowFlags::MINIMIZED) {
            return Ok(());
        }
        self.send_window_event(id, WindowEventKind::Minimized, 0, 0);
        self.with_window_hook(id, |hooks, window| hooks.minimize_window(window));
        Ok(())
    }

    /// Restore a maximized or minimized window. Other windows are left alone.
    pub fn restore_window(&mut self, id: WindowId) -> VideoResult<()> {
        if !self
            .window_flags(id)?
            .intersects(WindowFlags::MAXIMIZED | WindowFlags::MINIMIZED)
        {
            return Ok(());
        }
        self.send_window_event(id, WindowEventKind::Restored, 0, 0);
        self.with_window_hook(id, |hooks, window| hooks.restore_window(window));
        Ok(())
    }

    /// Turn fullscreen on or off for a window.
    pub fn set_window_fullscreen(&mut self, id: WindowId, fullscreen: bool) -> VideoResult<()> {
        let window = self.window_mut_ref(id)?;
        if window.flags.contains(WindowFlags::FULLSCREEN) == fullscreen {
            return Ok(());
        }
        let display_index = window.display;

        if fullscreen {
            window.flags.insert(WindowFlags::FULLSCREEN);
            if window.is_fullscreen_visible() {
                self.activate_fullscreen(id, display_index);
            }
        } else {
            let was_visible = window.is_fullscreen_visible();
            window.flags.remove(WindowFlags::FULLSCREEN);
            if was_visible {
                if let Err(err) = self.set_display_mode_on(display_index, None) {
                    warn!("Couldn't restore the desktop mode: {}", err);
                }
            }
        }
        Ok(())
    }

    /// Grab or release input for a window.
    ///
    /// The backend is only told while the window has input focus.
    pub fn set_window_grab(&mut self, id: WindowId, grab: bool) -> VideoResult<()> {
        let window = self.window_mut_ref(id)?;
        if window.flags.contains(WindowFlags::INPUT_GRABBED) == grab {
            return Ok(());
        }
        window.flags.set(WindowFlags::INPUT_GRABBED, grab);
        if window.flags.contains(WindowFlags::INPUT_FOCUS) {
            self.with_window_hook(id, |hooks, window| hooks.set_window_grab(window));
        }
        Ok(())
    }

    pub fn window_grab(&self, id: WindowId) -> VideoResult<bool> {
        self.window_flags(id)
            .map(|flags| flags.contains(WindowFlags::INPUT_GRABBED))
    }

    /// The window with input focus on the current display, if any.
    #[must_use]
    pub fn focus_window(&self) -> Option<WindowId> {
        self.displays.get(self.current_display).and_then(|display| {
            display
                .windows
                .values()
                .find(|window| window.flags.contains(WindowFlags::INPUT_FOCUS))
                .map(Window::id)
        })
    }

    /// Destroy a window and its renderer.
    ///
    /// A focus-lost notification is always sent first, whether or not the
    /// window had focus, so a fullscreen window gives the desktop mode back
    /// unless another fullscreen window is showing on that display.
    pub fn destroy_window(&mut self, id: WindowId) -> VideoResult<()> {
        self.send_window_event(id, WindowEventKind::FocusLost, 0, 0);

        let display_index = self.window_ref(id)?.display;
        self.destroy_renderer(id)?;
        self.with_window_hook(id, |hooks, window| hooks.destroy_window(window));
        self.displays.display_mut(display_index)?.windows.remove(&id);
        self.input.forget_window(id);
        debug!("Destroyed window {}", id);
        Ok(())
    }

    /// Minimize competing fullscreen windows, then switch the display to
    /// its fullscreen mode.
    pub(crate) fn activate_fullscreen(&mut self, id: WindowId, display_index: usize) {
        let others: Vec<WindowId> = self
            .displays
            .get(display_index)
            .map(|display| {
                display
                    .windows
                    .values()
                    .filter(|other| other.id != id && other.is_fullscreen_visible())
                    .map(Window::id)
                    .collect()
            })
            .unwrap_or_default();
        for other in others {
            if let Err(err) = self.minimize_window(other) {
                warn!("Couldn't minimize window {}: {}", other, err);
            }
        }

        let fullscreen_mode = self
            .displays
            .get(display_index)
            .and_then(|display| display.fullscreen_mode.clone());
        if let Err(err) = self.set_display_mode_on(display_index, fullscreen_mode.as_ref()) {
            warn!("Couldn't switch to the fullscreen mode: {}", err);
        }
    }

    pub(crate) fn window_ref(&self, id: WindowId) -> VideoResult<&Window> {
        self.displays.window(id).ok_or(VideoError::InvalidWindow(id))
    }

    pub(crate) fn window_mut_ref(&mut self, id: WindowId) -> VideoResult<&mut Window> {
        self.displays
            .window_mut(id)
            .ok_or(VideoError::InvalidWindow(id))
    }

    /// Run an optional backend window hook against a live window.
    pub(crate) fn with_window_hook<F>(&mut self, id: WindowId, hook: F)
    where
        F: FnOnce(&mut dyn WindowBackend, &mut Window),
    {
        let Some(window) = self.displays.window_mut(id) else {
            return;
        };
        if let Some(hooks) = self.backend.windows() {
            hook(hooks, window);
        }
    }
}
