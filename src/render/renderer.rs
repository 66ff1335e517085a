//!
//! Renderers and the draw calls routed to them.
//!
//! A display lists [`RenderDriver`] templates. Creating a renderer for a
//! window instantiates one of them into a [`Renderer`] the window owns.
//! Each display remembers one current renderer; draw calls always go to it,
//! so callers drawing into several windows select the right renderer first.
//!

use std::fmt;
use std::sync::Arc;

use bitflags::bitflags;
use log::{debug, warn};

use crate::error::{VideoError, VideoResult};
use crate::pixels::{Color, Palette, PixelFormat};
use crate::rect::Rect;
use crate::render::texture::{Texture, TextureId};
use crate::video::device::VideoDevice;
use crate::video::mode::DisplayMode;
use crate::video::window::{WindowFlags, WindowId};

bitflags! {
    /// Renderer capabilities and presentation strategies.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RendererFlags: u32 {
        const SINGLE_BUFFER = 0x0000_0001;
        const PRESENT_COPY = 0x0000_0002;
        const PRESENT_FLIP2 = 0x0000_0004;
        const PRESENT_FLIP3 = 0x0000_0008;
        const PRESENT_DISCARD = 0x0000_0010;
        const PRESENT_VSYNC = 0x0000_0020;
        const ACCELERATED = 0x0000_0040;
        const RENDER_TARGET = 0x0000_0080;
        /// Bare presentation driver; skipped by automatic selection.
        const MINIMAL = 0x0000_0100;
    }
}

bitflags! {
    /// How a texture copy combines with the destination.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BlendMode: u32 {
        const MASK = 0x0000_0001;
        const BLEND = 0x0000_0002;
        const ADD = 0x0000_0004;
        const MOD = 0x0000_0008;
    }
}

impl BlendMode {
    pub const NONE: Self = Self::empty();
}

bitflags! {
    /// How a texture copy is resampled when the rectangles differ in size.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ScaleMode: u32 {
        const FAST = 0x0000_0001;
        const SLOW = 0x0000_0002;
        const BEST = 0x0000_0004;
    }
}

impl ScaleMode {
    pub const NONE: Self = Self::empty();
}

/// Capability descriptor of a render driver or live renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererInfo {
    pub name: &'static str,
    pub flags: RendererFlags,
    pub blend_modes: BlendMode,
    pub scale_modes: ScaleMode,
    pub texture_formats: Vec<PixelFormat>,
    /// Zero means unlimited.
    pub max_texture_width: i32,
    pub max_texture_height: i32,
}

/// Everything a render driver factory may look at when it instantiates a
/// renderer for a window.
#[derive(Debug, Clone)]
pub struct RenderTarget {
    pub window: WindowId,
    pub w: i32,
    pub h: i32,
    pub window_flags: WindowFlags,
    /// Current mode of the window's display.
    pub display_mode: DisplayMode,
    pub palette: Option<Palette>,
    /// Render drivers of the window's display, for renderers that stack on
    /// another one.
    pub drivers: Vec<RenderDriver>,
}

/// Builds a renderer backend for a window.
pub type RenderFactory =
    Arc<dyn Fn(&RenderTarget, RendererFlags) -> VideoResult<Box<dyn RendererBackend>> + Send + Sync>;

/// A render driver template registered on a display.
#[derive(Clone)]
pub struct RenderDriver {
    pub info: RendererInfo,
    pub create: RenderFactory,
}

impl RenderDriver {
    pub fn new<F>(info: RendererInfo, create: F) -> Self
    where
        F: Fn(&RenderTarget, RendererFlags) -> VideoResult<Box<dyn RendererBackend>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            info,
            create: Arc::new(create),
        }
    }
}

impl fmt::Debug for RenderDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderDriver")
            .field("name", &self.info.name)
            .field("flags", &self.info.flags)
            .finish_non_exhaustive()
    }
}

/// Locked or queried texture memory.
#[derive(Debug)]
pub struct TexturePixels<'a> {
    /// Starts at the first requested pixel.
    pub pixels: &'a mut [u8],
    pub pitch: usize,
}

/// The operations a live renderer implements.
///
/// Only texture creation, destruction and the capability descriptor are
/// required. Everything else reports [`VideoError::Unsupported`] unless the
/// renderer overrides it.
pub trait RendererBackend: Send {
    fn info(&self) -> &RendererInfo;

    fn create_texture(&mut self, texture: &Texture) -> VideoResult<()>;

    fn destroy_texture(&mut self, texture: &Texture);

    fn query_texture_pixels(&mut self, _texture: &Texture) -> VideoResult<TexturePixels<'_>> {
        Err(VideoError::Unsupported("QueryTexturePixels"))
    }

    fn set_texture_palette(
        &mut self,
        _texture: &Texture,
        _colors: &[Color],
        _first: usize,
    ) -> VideoResult<()> {
        Err(VideoError::Unsupported("SetTexturePalette"))
    }

    fn texture_palette(
        &mut self,
        _texture: &Texture,
        _first: usize,
        _count: usize,
    ) -> VideoResult<Vec<Color>> {
        Err(VideoError::Unsupported("GetTexturePalette"))
    }

    fn update_texture(
        &mut self,
        _texture: &Texture,
        _rect: &Rect,
        _pixels: &[u8],
        _pitch: usize,
    ) -> VideoResult<()> {
        Err(VideoError::Unsupported("UpdateTexture"))
    }

    fn lock_texture(
        &mut self,
        _texture: &Texture,
        _rect: &Rect,
        _mark_dirty: bool,
    ) -> VideoResult<TexturePixels<'_>> {
        Err(VideoError::Unsupported("LockTexture"))
    }

    fn unlock_texture(&mut self, _texture: &Texture) -> VideoResult<()> {
        Err(VideoError::Unsupported("UnlockTexture"))
    }

    fn dirty_texture(&mut self, _texture: &Texture, _rects: &[Rect]) -> VideoResult<()> {
        Err(VideoError::Unsupported("DirtyTexture"))
    }

    /// Draw into `texture`, or back into the window when `None`.
    fn select_render_texture(&mut self, _texture: Option<&Texture>) -> VideoResult<()> {
        Err(VideoError::Unsupported("SelectRenderTexture"))
    }

    fn render_fill(&mut self, _rect: &Rect, _color: Color) -> VideoResult<()> {
        Err(VideoError::Unsupported("RenderFill"))
    }

    fn render_copy(
        &mut self,
        _texture: &Texture,
        _src: &Rect,
        _dst: &Rect,
        _blend: BlendMode,
        _scale: ScaleMode,
    ) -> VideoResult<()> {
        Err(VideoError::Unsupported("RenderCopy"))
    }

    fn render_read_pixels(&mut self, _rect: &Rect, _pixels: &mut [u8], _pitch: usize) -> VideoResult<()> {
        Err(VideoError::Unsupported("RenderReadPixels"))
    }

    fn render_write_pixels(&mut self, _rect: &Rect, _pixels: &[u8], _pitch: usize) -> VideoResult<()> {
        Err(VideoError::Unsupported("RenderWritePixels"))
    }

    fn render_present(&mut self) -> VideoResult<()> {
        Err(VideoError::Unsupported("RenderPresent"))
    }
}

/// Renderer identifier, unique for the lifetime of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RendererId(pub u32);

/// A live renderer, owned by the window it draws into.
pub struct Renderer {
    pub(crate) id: RendererId,
    pub(crate) window: WindowId,
    pub(crate) backend: Box<dyn RendererBackend>,
}

impl Renderer {
    #[must_use]
    pub fn id(&self) -> RendererId {
        self.id
    }

    #[must_use]
    pub fn window(&self) -> WindowId {
        self.window
    }

    /// Capabilities of this instance, which may be narrower than its
    /// driver's.
    #[must_use]
    pub fn info(&self) -> &RendererInfo {
        self.backend.info()
    }
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("id", &self.id)
            .field("window", &self.window)
            .field("name", &self.info().name)
            .finish()
    }
}

impl VideoDevice {
    /// Number of render drivers on the current display.
    #[must_use]
    pub fn num_render_drivers(&self) -> usize {
        self.current().map_or(0, |display| display.render_drivers.len())
    }

    pub fn render_driver_info(&self, index: usize) -> VideoResult<&RendererInfo> {
        let drivers = &self.current()?.render_drivers;
        drivers
            .get(index)
            .map(|driver| &driver.info)
            .ok_or(VideoError::IndexOutOfRange {
                what: "render driver",
                index,
                count: drivers.len(),
            })
    }

    /// Give `window` a renderer from the current display's drivers and make
    /// it the current renderer.
    ///
    /// Without an index, the first driver whose flags cover `flags` is used.
    /// Minimal drivers only qualify when `flags` asks for
    /// [`RendererFlags::MINIMAL`]. A renderer the window already had is
    /// destroyed first.
    pub fn create_renderer(
        &mut self,
        window: WindowId,
        index: Option<usize>,
        flags: RendererFlags,
    ) -> VideoResult<()> {
        self.window_ref(window)?;
        let drivers = self.current()?.render_drivers.clone();

        let index = match index {
            Some(index) => index,
            None => drivers
                .iter()
                .position(|driver| {
                    let minimal = driver.info.flags.contains(RendererFlags::MINIMAL);
                    (flags.contains(RendererFlags::MINIMAL) || !minimal)
                        && driver.info.flags.contains(flags)
                })
                .ok_or(VideoError::NoMatchingRenderDriver)?,
        };
        let driver = drivers.get(index).ok_or(VideoError::IndexOutOfRange {
            what: "render driver",
            index,
            count: drivers.len(),
        })?;

        let id = RendererId(self.next_renderer_id()?);
        self.destroy_renderer(window)?;

        let target = self.render_target(window, drivers.clone())?;
        let backend = (driver.create)(&target, flags)?;
        let renderer = Renderer {
            id,
            window,
            backend,
        };
        debug!(
            "Created '{}' renderer {:?} for window {}",
            driver.info.name, renderer.id, window
        );
        self.window_mut_ref(window)?.renderer = Some(renderer);
        self.current_mut()?.current_renderer = Some(window);
        Ok(())
    }

    fn render_target(&self, window: WindowId, drivers: Vec<RenderDriver>) -> VideoResult<RenderTarget> {
        let win = self.window_ref(window)?;
        let display = self.displays.display(win.display)?;
        Ok(RenderTarget {
            window,
            w: win.w,
            h: win.h,
            window_flags: win.flags,
            display_mode: display.current_mode.clone(),
            palette: display.palette.clone(),
            drivers,
        })
    }

    /// Make the renderer of `window` the current display's current renderer.
    pub fn select_renderer(&mut self, window: WindowId) -> VideoResult<()> {
        if self.window_ref(window)?.renderer.is_none() {
            return Err(VideoError::InvalidRenderer);
        }
        self.current_mut()?.current_renderer = Some(window);
        Ok(())
    }

    /// Destroy the renderer of `window` together with every texture it owns.
    ///
    /// A window without a renderer is left alone.
    pub fn destroy_renderer(&mut self, window: WindowId) -> VideoResult<()> {
        let Some(mut renderer) = self.window_mut_ref(window)?.renderer.take() else {
            return Ok(());
        };

        let mut destroyed = 0;
        for display in self.displays.iter_mut() {
            for texture in display.textures.remove_by_renderer(renderer.id) {
                renderer.backend.destroy_texture(&texture);
                destroyed += 1;
            }
            if display.current_renderer == Some(window) {
                display.current_renderer = None;
            }
        }
        debug!(
            "Destroyed renderer {:?} of window {} ({} texture(s))",
            renderer.id, window, destroyed
        );
        Ok(())
    }

    /// Capabilities of the renderer attached to `window`.
    pub fn renderer_info(&self, window: WindowId) -> VideoResult<&RendererInfo> {
        self.window_ref(window)?
            .renderer
            .as_ref()
            .map(Renderer::info)
            .ok_or(VideoError::InvalidRenderer)
    }

    /// Window whose renderer is current on the current display.
    #[must_use]
    pub fn current_renderer(&self) -> Option<WindowId> {
        self.current().ok().and_then(|display| display.current_renderer)
    }

    fn active_renderer(&mut self) -> VideoResult<(&mut Renderer, Rect)> {
        let window = self.current_renderer().ok_or(VideoError::InvalidRenderer)?;
        let win = self.window_mut_ref(window)?;
        let bounds = Rect::new(0, 0, win.w, win.h);
        let renderer = win.renderer.as_mut().ok_or(VideoError::InvalidRenderer)?;
        Ok((renderer, bounds))
    }

    /// The renderer that owns `texture`.
    pub(crate) fn texture_renderer_mut(&mut self, texture: &Texture) -> VideoResult<&mut Renderer> {
        self.window_mut_ref(texture.window)?
            .renderer
            .as_mut()
            .filter(|renderer| renderer.id == texture.renderer)
            .ok_or(VideoError::InvalidRenderer)
    }

    /// Fill `rect`, or the whole window, with `color`.
    ///
    /// The rectangle is clipped to the window; nothing left to fill is not
    /// an error.
    pub fn render_fill(&mut self, rect: Option<&Rect>, color: Color) -> VideoResult<()> {
        let (renderer, bounds) = self.active_renderer()?;
        let rect = match rect {
            Some(rect) => match rect.intersection(&bounds) {
                Some(clipped) => clipped,
                None => return Ok(()),
            },
            None => bounds,
        };
        renderer.backend.render_fill(&rect, color)
    }

    /// Copy part of a texture into the window.
    ///
    /// The texture must belong to the current renderer. `src` defaults to
    /// the whole texture and `dst` to the whole window.
    pub fn render_copy(
        &mut self,
        texture: TextureId,
        src: Option<&Rect>,
        dst: Option<&Rect>,
        blend: BlendMode,
        scale: ScaleMode,
    ) -> VideoResult<()> {
        let texture = self.texture_ref(texture)?.clone();
        let (renderer, bounds) = self.active_renderer()?;
        if renderer.id != texture.renderer {
            return Err(VideoError::InvalidRenderer);
        }
        let src = src.copied().unwrap_or(Rect::new(0, 0, texture.w, texture.h));
        let dst = dst.copied().unwrap_or(bounds);
        renderer.backend.render_copy(&texture, &src, &dst, blend, scale)
    }

    pub fn render_read_pixels(
        &mut self,
        rect: Option<&Rect>,
        pixels: &mut [u8],
        pitch: usize,
    ) -> VideoResult<()> {
        let (renderer, bounds) = self.active_renderer()?;
        let rect = rect.copied().unwrap_or(bounds);
        renderer.backend.render_read_pixels(&rect, pixels, pitch)
    }

    pub fn render_write_pixels(&mut self, rect: Option<&Rect>, pixels: &[u8], pitch: usize) -> VideoResult<()> {
        let (renderer, bounds) = self.active_renderer()?;
        let rect = rect.copied().unwrap_or(bounds);
        renderer.backend.render_write_pixels(&rect, pixels, pitch)
    }

    /// Show what has been drawn since the last present.
    pub fn render_present(&mut self) -> VideoResult<()> {
        let (renderer, _) = self.active_renderer()?;
        if let Err(err) = renderer.backend.render_present() {
            warn!("Present failed on renderer {:?}: {}", renderer.id, err);
            return Err(err);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventQueue;
    use crate::video::bootstrap::DriverRegistry;
    use crate::video::device::InitFlags;

    fn device_with_window() -> (VideoDevice, WindowId) {
        let mut device = VideoDevice::init(
            &DriverRegistry::default(),
            None,
            InitFlags::empty(),
            Box::new(EventQueue::new()),
        )
        .unwrap();
        let window = device
            .create_window(Some("test"), 0, 0, 64, 48, WindowFlags::SHOWN)
            .unwrap();
        (device, window)
    }

    #[test]
    fn test_automatic_selection_skips_minimal() {
        let (mut device, window) = device_with_window();
        device.create_renderer(window, None, RendererFlags::empty()).unwrap();
        assert_eq!(device.renderer_info(window).unwrap().name, "software");
        assert_eq!(device.current_renderer(), Some(window));
    }

    #[test]
    fn test_minimal_requested() {
        let (mut device, window) = device_with_window();
        device.create_renderer(window, None, RendererFlags::MINIMAL).unwrap();
        assert_eq!(device.renderer_info(window).unwrap().name, "minimal");
    }

    #[test]
    fn test_no_matching_driver() {
        let (mut device, window) = device_with_window();
        assert_eq!(
            device.create_renderer(window, None, RendererFlags::ACCELERATED),
            Err(VideoError::NoMatchingRenderDriver)
        );
        assert!(matches!(
            device.create_renderer(window, Some(9), RendererFlags::empty()),
            Err(VideoError::IndexOutOfRange { what: "render driver", .. })
        ));
    }

    #[test]
    fn test_instance_flags() {
        let (mut device, window) = device_with_window();
        device
            .create_renderer(window, None, RendererFlags::PRESENT_FLIP2)
            .unwrap();
        let flags = device.renderer_info(window).unwrap().flags;
        assert_eq!(flags, RendererFlags::RENDER_TARGET | RendererFlags::PRESENT_FLIP2);
    }

    #[test]
    fn test_draw_without_renderer() {
        let (mut device, _window) = device_with_window();
        assert_eq!(
            device.render_fill(None, Color::rgb(0, 0, 0)),
            Err(VideoError::InvalidRenderer)
        );
        assert_eq!(device.render_present(), Err(VideoError::InvalidRenderer));
    }

    #[test]
    fn test_fill_outside_window_is_noop() {
        let (mut device, window) = device_with_window();
        device.create_renderer(window, None, RendererFlags::empty()).unwrap();
        device
            .render_fill(Some(&Rect::new(500, 500, 10, 10)), Color::rgb(1, 2, 3))
            .unwrap();
    }

    #[test]
    fn test_select_and_destroy() {
        let (mut device, first) = device_with_window();
        let second = device
            .create_window(None, 0, 0, 32, 32, WindowFlags::SHOWN)
            .unwrap();
        assert_eq!(device.select_renderer(first), Err(VideoError::InvalidRenderer));

        device.create_renderer(first, None, RendererFlags::empty()).unwrap();
        device.create_renderer(second, None, RendererFlags::empty()).unwrap();
        assert_eq!(device.current_renderer(), Some(second));
        device.select_renderer(first).unwrap();
        assert_eq!(device.current_renderer(), Some(first));

        device.destroy_renderer(first).unwrap();
        assert_eq!(device.current_renderer(), None);
        assert!(device.window(first).unwrap().renderer().is_none());
        device.destroy_renderer(first).unwrap();
    }

    #[test]
    fn test_write_read_present() {
        let (mut device, window) = device_with_window();
        device.create_renderer(window, None, RendererFlags::empty()).unwrap();
        device
            .render_fill(Some(&Rect::new(0, 0, 2, 1)), Color::new(0x12, 0x34, 0x56, 0xFF))
            .unwrap();
        let mut out = [0u8; 8];
        device
            .render_read_pixels(Some(&Rect::new(0, 0, 2, 1)), &mut out, 8)
            .unwrap();
        assert_eq!(&out[..4], &[0x56, 0x34, 0x12, 0x00]);
        device.render_present().unwrap();
    }
}
