//!
//! Capability interfaces implemented by platform backends.
//!
//! A backend must implement [`VideoBackend`]. Everything else is optional:
//! each sub-interface is reached through an accessor that returns `None`
//! when the platform lacks that capability, and the core treats `None` as
//! "unsupported on this backend".
//!

use std::any::Any;
use std::ffi::c_void;

use crate::error::{VideoError, VideoResult};
use crate::events::NativeEvent;
use crate::pixels::Palette;
use crate::video::display::DisplayList;
use crate::video::gamma::GammaRamp;
use crate::video::gl::{GlAttr, GlConfig, GlContext};
use crate::video::mode::DisplayMode;
use crate::video::window::Window;

/// The mandatory part of a backend.
///
/// The trait is object safe; the device holds the selected backend as a
/// `Box<dyn VideoBackend>`.
pub trait VideoBackend: Send {
    /// Bring the platform up and add at least one display to `displays`.
    ///
    /// Render drivers the platform offers are registered per display here
    /// too, via [`DisplayList::add_render_driver`].
    fn video_init(&mut self, displays: &mut DisplayList) -> VideoResult<()>;

    /// Release every platform resource. Called exactly once.
    fn video_quit(&mut self);

    /// Display mode enumeration and switching.
    fn modes(&mut self) -> Option<&mut dyn ModeBackend> {
        None
    }

    /// Native window management.
    fn windows(&mut self) -> Option<&mut dyn WindowBackend> {
        None
    }

    /// Hardware palette for indexed display modes.
    fn palette(&mut self) -> Option<&mut dyn PaletteBackend> {
        None
    }

    /// Hardware gamma ramps.
    fn gamma(&mut self) -> Option<&mut dyn GammaBackend> {
        None
    }

    /// Dynamic OpenGL support.
    fn gl(&mut self) -> Option<&mut dyn GlBackend> {
        None
    }

    /// Collect pending native events.
    ///
    /// The device routes each returned event through the event bridge.
    fn pump_events(&mut self) -> Vec<NativeEvent> {
        Vec::new()
    }
}

/// Display mode enumeration and switching.
pub trait ModeBackend {
    /// All modes the display supports, in any order.
    fn display_modes(&mut self, display: usize) -> Vec<DisplayMode>;

    /// Switch the display to `mode`, which is one of its listed modes.
    fn set_display_mode(&mut self, display: usize, mode: &DisplayMode) -> VideoResult<()>;
}

/// Hardware palette access.
pub trait PaletteBackend {
    fn set_display_palette(&mut self, display: usize, palette: &Palette) -> VideoResult<()>;

    fn display_palette(&mut self, _display: usize, _palette: &mut Palette) -> VideoResult<()> {
        Err(VideoError::Unsupported("GetDisplayPalette"))
    }
}

/// Hardware gamma ramp access.
pub trait GammaBackend {
    fn set_gamma_ramp(&mut self, display: usize, ramp: &GammaRamp) -> VideoResult<()>;

    /// The ramp currently programmed in hardware, if the platform can tell.
    fn gamma_ramp(&mut self, _display: usize) -> Option<GammaRamp> {
        None
    }
}

/// Native window hooks.
///
/// Every hook has a default so a backend only overrides what its platform
/// needs. Hooks run after the core has updated the window's state.
pub trait WindowBackend {
    /// Create the native window. A failure aborts window creation.
    fn create_window(&mut self, _window: &mut Window) -> VideoResult<()> {
        Ok(())
    }

    /// Adopt an existing native window described by `data`.
    fn create_window_from(&mut self, _window: &mut Window, _data: &dyn Any) -> VideoResult<()> {
        Err(VideoError::Unsupported("CreateWindowFrom"))
    }

    fn set_window_title(&mut self, _window: &mut Window) {}

    fn set_window_position(&mut self, _window: &mut Window) {}

    fn set_window_size(&mut self, _window: &mut Window) {}

    fn show_window(&mut self, _window: &mut Window) {}

    fn hide_window(&mut self, _window: &mut Window) {}

    fn raise_window(&mut self, _window: &mut Window) {}

    fn maximize_window(&mut self, _window: &mut Window) {}

    fn minimize_window(&mut self, _window: &mut Window) {}

    fn restore_window(&mut self, _window: &mut Window) {}

    /// Apply the window's current grab state.
    fn set_window_grab(&mut self, _window: &mut Window) {}

    fn destroy_window(&mut self, _window: &mut Window) {}
}

/// Address of a GL entry point.
pub type GlProc = *const c_void;

/// Dynamic OpenGL support.
pub trait GlBackend {
    /// Load the GL library, or the platform default when `path` is `None`.
    fn load_library(&mut self, path: Option<&str>) -> VideoResult<()>;

    fn get_proc_address(&mut self, name: &str) -> Option<GlProc>;

    /// Report the value the platform actually granted for `attr`.
    fn attribute(&mut self, _attr: GlAttr) -> VideoResult<i32> {
        Err(VideoError::Unsupported("GL_GetAttribute"))
    }

    fn create_context(&mut self, window: &mut Window, config: &GlConfig) -> VideoResult<GlContext>;

    fn make_current(&mut self, window: Option<&mut Window>, context: Option<GlContext>) -> VideoResult<()>;

    fn set_swap_interval(&mut self, _interval: i32) -> VideoResult<()> {
        Err(VideoError::Unsupported("GL_SetSwapInterval"))
    }

    fn swap_interval(&mut self) -> VideoResult<i32> {
        Err(VideoError::Unsupported("GL_GetSwapInterval"))
    }

    fn swap_window(&mut self, window: &mut Window);

    fn delete_context(&mut self, context: GlContext);
}
