//!
//! Headless backend.
//!
//! Reports one display with a fixed mode list and keeps every window and
//! frame in memory. Its "minimal" render driver holds one framebuffer per
//! window and only supports raw pixel reads and writes, which is enough for
//! the software renderer to present through.
//!

use log::{debug, trace};

use crate::error::{VideoError, VideoResult};
use crate::pixels::{format_to_masks, PixelFormat};
use crate::rect::Rect;
use crate::render::renderer::{
    BlendMode, RenderDriver, RenderTarget, RendererBackend, RendererFlags, RendererInfo, ScaleMode,
};
use crate::render::surface::Surface;
use crate::render::texture::Texture;
use crate::video::backend::{ModeBackend, VideoBackend, WindowBackend};
use crate::video::bootstrap::VideoBootstrap;
use crate::video::display::DisplayList;
use crate::video::mode::DisplayMode;
use crate::video::window::WindowId;

pub const NAME: &str = "dummy";

/// Registry entry for the headless backend. Always available.
#[must_use]
pub fn bootstrap() -> VideoBootstrap {
    VideoBootstrap::new(NAME, "Headless video driver", || true, |_| {
        Some(Box::new(DummyBackend::default()) as Box<dyn VideoBackend>)
    })
}

fn desktop_mode() -> DisplayMode {
    DisplayMode::new(PixelFormat::RGB888, 1024, 768, 60)
}

/// The headless backend.
#[derive(Debug, Default)]
pub struct DummyBackend {
    mode_switches: usize,
}

impl VideoBackend for DummyBackend {
    fn video_init(&mut self, displays: &mut DisplayList) -> VideoResult<()> {
        let index = displays.add_basic_display(desktop_mode())?;
        displays.add_render_driver(index, render_driver())?;
        debug!("Dummy display {} at {}", index, desktop_mode());
        Ok(())
    }

    fn video_quit(&mut self) {
        debug!("Dummy backend quit after {} mode switch(es)", self.mode_switches);
    }

    fn modes(&mut self) -> Option<&mut dyn ModeBackend> {
        Some(self)
    }

    fn windows(&mut self) -> Option<&mut dyn WindowBackend> {
        Some(self)
    }
}

impl ModeBackend for DummyBackend {
    fn display_modes(&mut self, _display: usize) -> Vec<DisplayMode> {
        vec![
            desktop_mode(),
            DisplayMode::new(PixelFormat::RGB888, 800, 600, 60),
            DisplayMode::new(PixelFormat::RGB565, 800, 600, 60),
            DisplayMode::new(PixelFormat::RGB888, 640, 480, 60),
            DisplayMode::new(PixelFormat::INDEX8, 640, 480, 60),
        ]
    }

    fn set_display_mode(&mut self, display: usize, mode: &DisplayMode) -> VideoResult<()> {
        self.mode_switches += 1;
        trace!("Dummy display {} now at {}", display, mode);
        Ok(())
    }
}

impl WindowBackend for DummyBackend {}

fn info() -> RendererInfo {
    RendererInfo {
        name: "minimal",
        flags: RendererFlags::MINIMAL | RendererFlags::PRESENT_DISCARD | RendererFlags::PRESENT_COPY,
        blend_modes: BlendMode::NONE,
        scale_modes: ScaleMode::NONE,
        texture_formats: Vec::new(),
        max_texture_width: 0,
        max_texture_height: 0,
    }
}

/// The "minimal" render driver.
#[must_use]
pub fn render_driver() -> RenderDriver {
    RenderDriver::new(info(), |target, _flags| {
        MinimalRenderer::new(target).map(|renderer| Box::new(renderer) as Box<dyn RendererBackend>)
    })
}

/// A window-sized framebuffer in the display format.
#[derive(Debug)]
pub struct MinimalRenderer {
    info: RendererInfo,
    window: WindowId,
    framebuffer: Surface,
    frames: u64,
}

impl MinimalRenderer {
    pub fn new(target: &RenderTarget) -> VideoResult<Self> {
        let masks = format_to_masks(target.display_mode.format)?;
        let mut framebuffer = Surface::new(target.w, target.h, masks);
        if let Some(palette) = &target.palette {
            framebuffer.palette = Some(palette.clone());
        }
        Ok(Self {
            info: info(),
            window: target.window,
            framebuffer,
            frames: 0,
        })
    }

    /// Frames presented so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    #[must_use]
    pub fn framebuffer(&self) -> &Surface {
        &self.framebuffer
    }
}

impl RendererBackend for MinimalRenderer {
    fn info(&self) -> &RendererInfo {
        &self.info
    }

    fn create_texture(&mut self, _texture: &Texture) -> VideoResult<()> {
        Err(VideoError::Unsupported("CreateTexture"))
    }

    fn destroy_texture(&mut self, _texture: &Texture) {}

    fn render_read_pixels(&mut self, rect: &Rect, pixels: &mut [u8], pitch: usize) -> VideoResult<()> {
        self.framebuffer.read_rect(rect, pixels, pitch)
    }

    fn render_write_pixels(&mut self, rect: &Rect, pixels: &[u8], pitch: usize) -> VideoResult<()> {
        self.framebuffer.write_rect(rect, pixels, pitch)
    }

    fn render_present(&mut self) -> VideoResult<()> {
        self.frames += 1;
        trace!("Window {} frame {}", self.window, self.frames);
        Ok(())
    }
}
