//! Shared fixtures for the integration tests.
//!
//! `ScriptedBackend` reports a configurable mode list and records every
//! mode switch and window hook it receives.

#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;

use sdl_video::backends::dummy;
use sdl_video::events::{EventQueue, NativeEvent};
use sdl_video::video::{
    DisplayList, DisplayMode, DriverRegistry, GammaBackend, GammaRamp, InitFlags, ModeBackend,
    VideoBackend, VideoBootstrap, VideoDevice, Window, WindowBackend,
};
use sdl_video::{PixelFormat, VideoResult};

/// Something the backend was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SetMode(DisplayMode),
    CreateWindow(u32),
    Minimize(u32),
    Restore(u32),
    Grab(u32),
    DestroyWindow(u32),
    Gamma,
    Quit,
}

pub type CallLog = Arc<Mutex<Vec<Call>>>;

pub struct ScriptedBackend {
    desktop: DisplayMode,
    modes: Vec<DisplayMode>,
    calls: CallLog,
    pending: Arc<Mutex<Vec<NativeEvent>>>,
}

impl VideoBackend for ScriptedBackend {
    fn video_init(&mut self, displays: &mut DisplayList) -> VideoResult<()> {
        let index = displays.add_basic_display(self.desktop.clone())?;
        displays.add_render_driver(index, dummy::render_driver())
    }

    fn video_quit(&mut self) {
        self.calls.lock().push(Call::Quit);
    }

    fn modes(&mut self) -> Option<&mut dyn ModeBackend> {
        Some(self)
    }

    fn windows(&mut self) -> Option<&mut dyn WindowBackend> {
        Some(self)
    }

    fn gamma(&mut self) -> Option<&mut dyn GammaBackend> {
        Some(self)
    }

    fn pump_events(&mut self) -> Vec<NativeEvent> {
        std::mem::take(&mut *self.pending.lock())
    }
}

impl ModeBackend for ScriptedBackend {
    fn display_modes(&mut self, _display: usize) -> Vec<DisplayMode> {
        self.modes.clone()
    }

    fn set_display_mode(&mut self, _display: usize, mode: &DisplayMode) -> VideoResult<()> {
        self.calls.lock().push(Call::SetMode(mode.clone()));
        Ok(())
    }
}

impl WindowBackend for ScriptedBackend {
    fn create_window(&mut self, window: &mut Window) -> VideoResult<()> {
        self.calls.lock().push(Call::CreateWindow(window.id()));
        Ok(())
    }

    fn minimize_window(&mut self, window: &mut Window) {
        self.calls.lock().push(Call::Minimize(window.id()));
    }

    fn restore_window(&mut self, window: &mut Window) {
        self.calls.lock().push(Call::Restore(window.id()));
    }

    fn set_window_grab(&mut self, window: &mut Window) {
        self.calls.lock().push(Call::Grab(window.id()));
    }

    fn destroy_window(&mut self, window: &mut Window) {
        self.calls.lock().push(Call::DestroyWindow(window.id()));
    }
}

impl GammaBackend for ScriptedBackend {
    fn set_gamma_ramp(&mut self, _display: usize, _ramp: &GammaRamp) -> VideoResult<()> {
        self.calls.lock().push(Call::Gamma);
        Ok(())
    }
}

/// A device running on a scripted backend, plus handles to observe it.
pub struct Harness {
    pub device: VideoDevice,
    pub events: EventQueue,
    pub calls: CallLog,
    pub pending: Arc<Mutex<Vec<NativeEvent>>>,
}

impl Harness {
    pub fn mode_switches(&self) -> Vec<DisplayMode> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                Call::SetMode(mode) => Some(mode.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn queue_native(&self, event: NativeEvent) {
        self.pending.lock().push(event);
    }
}

pub fn mode(format: PixelFormat, w: i32, h: i32, refresh_rate: i32) -> DisplayMode {
    DisplayMode::new(format, w, h, refresh_rate)
}

/// The two-mode display used by most scenarios: 1024x768 RGB888 desktop
/// plus an 800x600 RGB565 mode.
pub fn standard_modes() -> Vec<DisplayMode> {
    vec![
        mode(PixelFormat::RGB565, 800, 600, 60),
        mode(PixelFormat::RGB888, 1024, 768, 60),
    ]
}

pub fn harness_with_modes(desktop: DisplayMode, modes: Vec<DisplayMode>) -> Harness {
    let calls = CallLog::default();
    let pending = Arc::new(Mutex::new(Vec::new()));

    let mut registry = DriverRegistry::empty();
    let (backend_calls, backend_pending) = (calls.clone(), pending.clone());
    registry.register(VideoBootstrap::new(
        "scripted",
        "Scripted test backend",
        || true,
        move |_| {
            Some(Box::new(ScriptedBackend {
                desktop: desktop.clone(),
                modes: modes.clone(),
                calls: backend_calls.clone(),
                pending: backend_pending.clone(),
            }) as Box<dyn VideoBackend>)
        },
    ));

    let events = EventQueue::new();
    let device = VideoDevice::init(
        &registry,
        Some("scripted"),
        InitFlags::empty(),
        Box::new(events.clone()),
    )
    .expect("scripted backend initializes");

    Harness {
        device,
        events,
        calls,
        pending,
    }
}

pub fn harness() -> Harness {
    harness_with_modes(mode(PixelFormat::RGB888, 1024, 768, 60), standard_modes())
}
