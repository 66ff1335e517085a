//!
//! Displays and the display list a backend fills during initialization.
//!

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{VideoError, VideoResult};
use crate::pixels::Palette;
use crate::render::renderer::RenderDriver;
use crate::render::texture::TextureTable;
use crate::video::gamma::GammaRamp;
use crate::video::mode::DisplayMode;
use crate::video::window::{Window, WindowId};

/// Growth step of a display's mode list.
pub const MODE_CHUNK: usize = 32;

/// One physical or logical display.
#[derive(Default)]
pub struct VideoDisplay {
    pub desktop_mode: DisplayMode,
    pub current_mode: DisplayMode,
    pub(crate) fullscreen_mode: Option<DisplayMode>,
    pub(crate) display_modes: Vec<DisplayMode>,
    pub(crate) palette: Option<Palette>,
    pub(crate) gamma: Option<Box<GammaRamp>>,
    pub(crate) saved_gamma: Option<Box<GammaRamp>>,
    pub(crate) windows: BTreeMap<WindowId, Window>,
    pub(crate) render_drivers: Vec<RenderDriver>,
    /// Window whose renderer receives draw calls.
    pub(crate) current_renderer: Option<WindowId>,
    pub(crate) textures: TextureTable,
    /// Backend-private state.
    pub driverdata: Option<Box<dyn Any + Send>>,
}

impl VideoDisplay {
    /// A display whose desktop and current mode are both `desktop_mode`.
    #[must_use]
    pub fn new(desktop_mode: DisplayMode) -> Self {
        Self {
            current_mode: desktop_mode.clone(),
            desktop_mode,
            ..Self::default()
        }
    }

    /// Add a mode unless an equal one is already listed.
    ///
    /// Returns `false` for duplicates and when the list cannot grow.
    pub fn add_display_mode(&mut self, mode: DisplayMode) -> bool {
        if self.display_modes.iter().any(|existing| *existing == mode) {
            return false;
        }
        if self.display_modes.len() == self.display_modes.capacity()
            && self.display_modes.try_reserve_exact(MODE_CHUNK).is_err()
        {
            return false;
        }
        self.display_modes.push(mode);
        true
    }

    /// Register a render driver template.
    pub fn add_render_driver(&mut self, driver: RenderDriver) {
        self.render_drivers.push(driver);
    }

    #[must_use]
    pub fn display_modes(&self) -> &[DisplayMode] {
        &self.display_modes
    }

    #[must_use]
    pub fn fullscreen_mode(&self) -> Option<&DisplayMode> {
        self.fullscreen_mode.as_ref()
    }

    #[must_use]
    pub fn palette(&self) -> Option<&Palette> {
        self.palette.as_ref()
    }

    #[must_use]
    pub fn num_windows(&self) -> usize {
        self.windows.len()
    }

    pub fn windows(&self) -> impl Iterator<Item = &Window> {
        self.windows.values()
    }

    #[must_use]
    pub fn render_drivers(&self) -> &[RenderDriver] {
        &self.render_drivers
    }

    #[must_use]
    pub fn current_renderer(&self) -> Option<WindowId> {
        self.current_renderer
    }

    #[must_use]
    pub fn textures(&self) -> &TextureTable {
        &self.textures
    }
}

impl fmt::Debug for VideoDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VideoDisplay")
            .field("desktop_mode", &self.desktop_mode)
            .field("current_mode", &self.current_mode)
            .field("fullscreen_mode", &self.fullscreen_mode)
            .field("display_modes", &self.display_modes.len())
            .field("windows", &self.windows.keys().collect::<Vec<_>>())
            .field("render_drivers", &self.render_drivers.len())
            .field("current_renderer", &self.current_renderer)
            .field("textures", &self.textures.len())
            .finish_non_exhaustive()
    }
}

/// The displays owned by a video device.
#[derive(Debug, Default)]
pub struct DisplayList {
    displays: Vec<VideoDisplay>,
}

impl DisplayList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a display with only a desktop mode and return its index.
    pub fn add_basic_display(&mut self, desktop_mode: DisplayMode) -> VideoResult<usize> {
        self.add_display(VideoDisplay::new(desktop_mode))
    }

    /// Add a fully built display and return its index.
    ///
    /// The list is left untouched when it cannot grow.
    pub fn add_display(&mut self, display: VideoDisplay) -> VideoResult<usize> {
        self.displays
            .try_reserve(1)
            .map_err(|_| VideoError::OutOfMemory)?;
        self.displays.push(display);
        Ok(self.displays.len() - 1)
    }

    /// Add a mode to a display. See [`VideoDisplay::add_display_mode`].
    pub fn add_display_mode(&mut self, index: usize, mode: DisplayMode) -> bool {
        self.displays
            .get_mut(index)
            .is_some_and(|display| display.add_display_mode(mode))
    }

    /// Register a render driver template on a display.
    pub fn add_render_driver(&mut self, index: usize, driver: RenderDriver) -> VideoResult<()> {
        self.display_mut(index)?.add_render_driver(driver);
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.displays.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.displays.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&VideoDisplay> {
        self.displays.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut VideoDisplay> {
        self.displays.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &VideoDisplay> {
        self.displays.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut VideoDisplay> {
        self.displays.iter_mut()
    }

    pub(crate) fn display(&self, index: usize) -> VideoResult<&VideoDisplay> {
        let count = self.displays.len();
        self.displays.get(index).ok_or(VideoError::IndexOutOfRange {
            what: "display",
            index,
            count,
        })
    }

    pub(crate) fn display_mut(&mut self, index: usize) -> VideoResult<&mut VideoDisplay> {
        let count = self.displays.len();
        self.displays.get_mut(index).ok_or(VideoError::IndexOutOfRange {
            what: "display",
            index,
            count,
        })
    }

    pub(crate) fn window(&self, id: WindowId) -> Option<&Window> {
        self.displays
            .iter()
            .find_map(|display| display.windows.get(&id))
    }

    pub(crate) fn window_mut(&mut self, id: WindowId) -> Option<&mut Window> {
        self.displays
            .iter_mut()
            .find_map(|display| display.windows.get_mut(&id))
    }

    pub(crate) fn clear(&mut self) {
        self.displays.clear();
    }
}
