//!
//! The video device: one selected backend and everything it owns.
//!
//! A [`VideoDevice`] is an explicit context object. It is created by
//! [`VideoDevice::init`] and torn down by [`VideoDevice::quit`] (or by
//! dropping it). Every display, window, renderer and texture lives inside
//! it, so there is never more than one set of video state per device.
//!

use bitflags::bitflags;
use log::{debug, info, warn};

use crate::error::{VideoError, VideoResult};
use crate::events::input::InputDevices;
use crate::events::EventSink;
use crate::pixels::{dither_colors, Color, Palette};
use crate::render::renderer::RenderDriver;
use crate::render::software;
use crate::video::backend::VideoBackend;
use crate::video::bootstrap::DriverRegistry;
use crate::video::display::{DisplayList, VideoDisplay};
use crate::video::gl::GlConfig;
use crate::video::mode::{closest_mode, cmp_modes, DisplayMode};
use crate::video::window::WindowId;

bitflags! {
    /// Subsystem initialization flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct InitFlags: u32 {
        /// Pump events on a dedicated thread.
        const EVENT_THREAD = 0x0100_0000;
    }
}

/// Platform rule for the dedicated event thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventThreadPolicy {
    /// The caller decides.
    Optional,
    /// The platform always needs the thread.
    MustThread,
    /// The platform cannot run one.
    CantThread,
}

/// Event thread policy of the build target.
pub const EVENT_THREAD_POLICY: EventThreadPolicy = EventThreadPolicy::Optional;

/// One active backend instance with its displays and windows.
pub struct VideoDevice {
    pub(crate) name: &'static str,
    pub(crate) backend: Box<dyn VideoBackend>,
    pub(crate) displays: DisplayList,
    pub(crate) current_display: usize,
    next_object_id: u32,
    next_renderer_id: u32,
    pub(crate) gl_config: GlConfig,
    pub(crate) events: Box<dyn EventSink>,
    pub(crate) input: InputDevices,
    active: bool,
}

impl VideoDevice {
    /// Select a driver from `registry`, start the event loop on `events`
    /// and bring the backend up.
    ///
    /// With `driver_name`, only the first registry entry whose name is
    /// prefix-compatible is tried. Without one, the first available driver
    /// that constructs wins.
    pub fn init(
        registry: &DriverRegistry,
        driver_name: Option<&str>,
        flags: InitFlags,
        events: Box<dyn EventSink>,
    ) -> VideoResult<Self> {
        Self::init_with_policy(registry, driver_name, flags, events, EVENT_THREAD_POLICY)
    }

    /// [`VideoDevice::init`] under an explicit event thread policy.
    pub fn init_with_policy(
        registry: &DriverRegistry,
        driver_name: Option<&str>,
        mut flags: InitFlags,
        mut events: Box<dyn EventSink>,
        policy: EventThreadPolicy,
    ) -> VideoResult<Self> {
        match policy {
            EventThreadPolicy::MustThread => flags.insert(InitFlags::EVENT_THREAD),
            EventThreadPolicy::CantThread if flags.contains(InitFlags::EVENT_THREAD) => {
                return Err(VideoError::ThreadedEventsUnsupported);
            }
            _ => {}
        }

        events.start(flags.contains(InitFlags::EVENT_THREAD))?;

        let Some((name, backend)) = registry.select(driver_name, 0) else {
            events.stop();
            return Err(match driver_name {
                Some(requested) => VideoError::DriverNotAvailable(requested.to_owned()),
                None => VideoError::NoAvailableDevice,
            });
        };
        info!("Selected video driver '{}'", name);

        let mut device = Self {
            name,
            backend,
            displays: DisplayList::new(),
            current_display: 0,
            next_object_id: 1,
            next_renderer_id: 1,
            gl_config: GlConfig::default(),
            events,
            input: InputDevices::default(),
            active: true,
        };

        if let Err(err) = device.backend.video_init(&mut device.displays) {
            warn!("Video driver '{}' failed to initialize: {}", name, err);
            device.shutdown();
            return Err(err);
        }
        if device.displays.is_empty() {
            device.shutdown();
            return Err(VideoError::NoDisplays);
        }

        for display in device.displays.iter_mut() {
            if !display.render_drivers.is_empty() {
                display.add_render_driver(software::render_driver());
            }
        }

        info!(
            "Video subsystem initialized: driver '{}', {} display(s)",
            name,
            device.displays.len()
        );
        Ok(device)
    }

    /// Tear the device down.
    pub fn quit(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;

        self.events.stop();

        for id in self.window_ids().into_iter().rev() {
            if let Err(err) = self.destroy_window(id) {
                warn!("Couldn't destroy window {} during shutdown: {}", id, err);
            }
        }
        self.backend.video_quit();
        self.displays.clear();
        info!("Video subsystem shut down (driver '{}')", self.name);
    }

    /// Name of the selected driver.
    #[must_use]
    pub fn current_driver(&self) -> &'static str {
        self.name
    }

    /// Next id from the counter shared by windows and textures. Never zero.
    pub(crate) fn next_object_id(&mut self) -> VideoResult<u32> {
        let id = self.next_object_id;
        self.next_object_id = id.checked_add(1).ok_or(VideoError::IdsExhausted)?;
        Ok(id)
    }

    pub(crate) fn next_renderer_id(&mut self) -> VideoResult<u32> {
        let id = self.next_renderer_id;
        self.next_renderer_id = id.checked_add(1).ok_or(VideoError::IdsExhausted)?;
        Ok(id)
    }

    #[must_use]
    pub fn displays(&self) -> &DisplayList {
        &self.displays
    }

    /// Backend access for register-style setup, such as adding modes to a
    /// display after initialization.
    pub fn displays_mut(&mut self) -> &mut DisplayList {
        &mut self.displays
    }

    #[must_use]
    pub fn num_displays(&self) -> usize {
        self.displays.len()
    }

    /// Make `index` the current display. A negative index only queries.
    pub fn select_display(&mut self, index: i32) -> VideoResult<usize> {
        if let Ok(index) = usize::try_from(index) {
            self.displays.display(index)?;
            self.current_display = index;
        }
        Ok(self.current_display)
    }

    #[must_use]
    pub fn current_display_index(&self) -> usize {
        self.current_display
    }

    pub(crate) fn current(&self) -> VideoResult<&VideoDisplay> {
        self.displays.display(self.current_display)
    }

    pub(crate) fn current_mut(&mut self) -> VideoResult<&mut VideoDisplay> {
        self.displays.display_mut(self.current_display)
    }

    /// Register a render driver on a display.
    pub fn add_render_driver(&mut self, display: usize, driver: RenderDriver) -> VideoResult<()> {
        self.displays.add_render_driver(display, driver)
    }

    /// Fetch the mode list from the backend if it is still empty, then keep
    /// it in canonical order.
    fn ensure_display_modes(&mut self, index: usize) -> VideoResult<()> {
        let display = self.displays.display_mut(index)?;
        if display.display_modes.is_empty() {
            if let Some(modes) = self.backend.modes() {
                for mode in modes.display_modes(index) {
                    display.add_display_mode(mode);
                }
                debug!(
                    "Display {} reports {} mode(s)",
                    index,
                    display.display_modes.len()
                );
            }
        }
        display.display_modes.sort_by(cmp_modes);
        Ok(())
    }

    /// Number of modes the current display supports.
    pub fn num_display_modes(&mut self) -> usize {
        let index = self.current_display;
        match self.ensure_display_modes(index) {
            Ok(()) => self
                .displays
                .get(index)
                .map_or(0, |display| display.display_modes.len()),
            Err(_) => 0,
        }
    }

    /// A mode of the current display, in canonical order.
    pub fn display_mode(&mut self, index: usize) -> VideoResult<DisplayMode> {
        let count = self.num_display_modes();
        self.current()?
            .display_modes
            .get(index)
            .cloned()
            .ok_or(VideoError::IndexOutOfRange {
                what: "display mode",
                index,
                count,
            })
    }

    pub fn desktop_display_mode(&self) -> VideoResult<&DisplayMode> {
        Ok(&self.current()?.desktop_mode)
    }

    pub fn current_display_mode(&self) -> VideoResult<&DisplayMode> {
        Ok(&self.current()?.current_mode)
    }

    /// The current display's mode closest to `mode`, or `None` when no mode
    /// is large enough.
    pub fn closest_display_mode(&mut self, mode: &DisplayMode) -> Option<DisplayMode> {
        self.closest_mode_on(self.current_display, mode)
    }

    fn closest_mode_on(&mut self, index: usize, mode: &DisplayMode) -> Option<DisplayMode> {
        self.ensure_display_modes(index).ok()?;
        let display = self.displays.get(index)?;
        closest_mode(&display.display_modes, &display.desktop_mode, mode)
    }

    /// Switch the current display to the mode closest to `mode`.
    ///
    /// `None` asks for the desktop mode. Zero fields default to the current
    /// mode.
    pub fn set_display_mode(&mut self, mode: Option<&DisplayMode>) -> VideoResult<()> {
        self.set_display_mode_on(self.current_display, mode)
    }

    pub(crate) fn set_display_mode_on(
        &mut self,
        index: usize,
        mode: Option<&DisplayMode>,
    ) -> VideoResult<()> {
        let display = self.displays.display(index)?;
        let requested = mode
            .unwrap_or(&display.desktop_mode)
            .or_defaults(&display.current_mode);

        let closest = self
            .closest_mode_on(index, &requested)
            .ok_or(VideoError::NoModeLargeEnough {
                w: requested.w,
                h: requested.h,
            })?;
        if closest == self.displays.display(index)?.current_mode {
            return Ok(());
        }

        self.backend
            .modes()
            .ok_or(VideoError::Unsupported("SetDisplayMode"))?
            .set_display_mode(index, &closest)?;
        debug!("Display {} switched to {}", index, closest);

        let display = self.displays.display_mut(index)?;
        display.current_mode = closest.clone();

        let ncolors = closest.format.palette_size();
        if display.palette.as_ref().map_or(0, Palette::len) != ncolors {
            display.palette = (ncolors > 0).then(|| {
                let mut palette = Palette::new(ncolors);
                dither_colors(&mut palette.colors, closest.format.bits_per_pixel());
                palette
            });
        }

        let centered: Vec<(WindowId, i32, i32)> = display
            .windows
            .values()
            .filter(|window| window.is_fullscreen_visible())
            .map(|window| {
                (
                    window.id(),
                    (closest.w - window.w) / 2,
                    (closest.h - window.h) / 2,
                )
            })
            .collect();
        for (id, x, y) in centered {
            self.set_window_position(id, x, y)?;
        }
        Ok(())
    }

    /// Choose the mode fullscreen windows on the current display use.
    ///
    /// The closest available mode is stored. `None` clears the choice so
    /// fullscreen windows use the desktop mode. A visible fullscreen window
    /// gets the new mode at once.
    pub fn set_fullscreen_display_mode(&mut self, mode: Option<&DisplayMode>) -> VideoResult<()> {
        let index = self.current_display;
        let fullscreen_mode = match mode {
            Some(mode) => Some(self.closest_mode_on(index, mode).ok_or(
                VideoError::NoModeLargeEnough {
                    w: mode.w,
                    h: mode.h,
                },
            )?),
            None => None,
        };

        let display = self.displays.display_mut(index)?;
        display.fullscreen_mode = fullscreen_mode.clone();
        let has_visible = display
            .windows
            .values()
            .any(|window| window.is_fullscreen_visible());
        if has_visible {
            self.set_display_mode_on(index, fullscreen_mode.as_ref())?;
        }
        Ok(())
    }

    /// The current display's fullscreen mode, if one was chosen.
    pub fn fullscreen_display_mode(&self) -> VideoResult<Option<&DisplayMode>> {
        Ok(self.current()?.fullscreen_mode.as_ref())
    }

    /// Replace palette entries of the current display starting at `first`.
    ///
    /// The backend palette hook runs even when the range was rejected, so it
    /// always sees the palette the display really holds.
    pub fn set_display_palette(&mut self, colors: &[Color], first: usize) -> VideoResult<()> {
        let index = self.current_display;
        let palette = self
            .displays
            .display_mut(index)?
            .palette
            .as_mut()
            .ok_or(VideoError::NoPalette)?;
        let status = palette.set_colors(colors, first);
        let snapshot = palette.clone();
        if let Some(hook) = self.backend.palette() {
            hook.set_display_palette(index, &snapshot)?;
        }
        status
    }

    /// Copy `count` palette entries of the current display.
    pub fn display_palette(&self, first: usize, count: usize) -> VideoResult<Vec<Color>> {
        self.current()?
            .palette
            .as_ref()
            .filter(|palette| !palette.is_empty())
            .ok_or(VideoError::NoPalette)?
            .get_colors(first, count)
    }

    /// Collect native events from the backend and route them through the
    /// event bridge.
    pub fn pump_events(&mut self) {
        for event in self.backend.pump_events() {
            self.dispatch_native_event(event);
        }
    }
}

impl Drop for VideoDevice {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for VideoDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoDevice")
            .field("name", &self.name)
            .field("displays", &self.displays)
            .field("current_display", &self.current_display)
            .field("next_object_id", &self.next_object_id)
            .field("gl_config", &self.gl_config)
            .finish_non_exhaustive()
    }
}
