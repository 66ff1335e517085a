//!
//! The software renderer.
//!
//! Draws into system-memory screens in the display format and pushes the
//! changed rectangles to another renderer of the same display on present.
//! It is registered on every display that has at least one other render
//! driver to present through.
//!

use std::collections::HashMap;

use log::debug;

use crate::error::{VideoError, VideoResult};
use crate::pixels::{format_to_masks, Color, PixelFormat, PixelMasks};
use crate::rect::Rect;
use crate::render::renderer::{
    BlendMode, RenderDriver, RenderTarget, RendererBackend, RendererFlags, RendererInfo, ScaleMode,
    TexturePixels,
};
use crate::render::surface::Surface;
use crate::render::texture::{Texture, TextureAccess, TextureId};

pub const NAME: &str = "software";

/// Capabilities of the software render driver.
#[must_use]
pub fn info() -> RendererInfo {
    RendererInfo {
        name: NAME,
        flags: RendererFlags::PRESENT_DISCARD
            | RendererFlags::PRESENT_COPY
            | RendererFlags::PRESENT_FLIP2
            | RendererFlags::PRESENT_FLIP3
            | RendererFlags::RENDER_TARGET,
        blend_modes: BlendMode::NONE | BlendMode::MASK | BlendMode::BLEND,
        scale_modes: ScaleMode::NONE | ScaleMode::FAST,
        texture_formats: vec![
            PixelFormat::INDEX8,
            PixelFormat::RGB555,
            PixelFormat::RGB565,
            PixelFormat::RGB888,
            PixelFormat::BGR888,
            PixelFormat::ARGB8888,
            PixelFormat::RGBA8888,
            PixelFormat::ABGR8888,
            PixelFormat::BGRA8888,
            PixelFormat::YUY2,
            PixelFormat::UYVY,
        ],
        max_texture_width: 0,
        max_texture_height: 0,
    }
}

#[must_use]
pub fn render_driver() -> RenderDriver {
    RenderDriver::new(info(), |target, flags| {
        SoftwareRenderer::new(target, flags).map(|renderer| Box::new(renderer) as Box<dyn RendererBackend>)
    })
}

/// Storage for packed YUV textures: two bytes per pixel, no channel masks.
const PACKED_YUV_MASKS: PixelMasks = PixelMasks::new(16, 0, 0, 0, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DrawTarget {
    Screen,
    Texture(TextureId),
}

pub struct SoftwareRenderer {
    info: RendererInfo,
    screens: Vec<Surface>,
    current_screen: usize,
    target: DrawTarget,
    dirty: Vec<Rect>,
    display: Box<dyn RendererBackend>,
    textures: HashMap<TextureId, Surface>,
}

impl SoftwareRenderer {
    /// Build the screens for `target` and find a renderer to present
    /// through.
    pub fn new(target: &RenderTarget, flags: RendererFlags) -> VideoResult<Self> {
        let masks = format_to_masks(target.display_mode.format)?;

        let mut info = info();
        let count = if flags.contains(RendererFlags::PRESENT_FLIP2) {
            info.flags = RendererFlags::RENDER_TARGET | RendererFlags::PRESENT_FLIP2;
            2
        } else if flags.contains(RendererFlags::PRESENT_FLIP3) {
            info.flags = RendererFlags::RENDER_TARGET | RendererFlags::PRESENT_FLIP3;
            3
        } else {
            info.flags = RendererFlags::RENDER_TARGET | RendererFlags::PRESENT_COPY;
            1
        };

        let screens = (0..count)
            .map(|_| {
                let mut screen = Surface::new(target.w, target.h, masks);
                if let Some(palette) = &target.palette {
                    screen.palette = Some(palette.clone());
                }
                screen
            })
            .collect();

        let display = target
            .drivers
            .iter()
            .filter(|driver| driver.info.name != NAME)
            .find_map(|driver| (driver.create)(target, RendererFlags::PRESENT_DISCARD).ok())
            .ok_or(VideoError::NoMatchingRenderDriver)?;
        debug!(
            "Software renderer for window {} presents through '{}' with {} screen(s)",
            target.window,
            display.info().name,
            count
        );

        Ok(Self {
            info,
            screens,
            current_screen: 0,
            target: DrawTarget::Screen,
            dirty: Vec::new(),
            display,
            textures: HashMap::new(),
        })
    }

    fn target_mut(&mut self) -> VideoResult<&mut Surface> {
        match self.target {
            DrawTarget::Screen => self
                .screens
                .get_mut(self.current_screen)
                .ok_or(VideoError::InvalidRenderer),
            DrawTarget::Texture(id) => self.textures.get_mut(&id).ok_or(VideoError::InvalidTexture(id)),
        }
    }

    fn surface(&self, texture: &Texture) -> VideoResult<&Surface> {
        self.textures
            .get(&texture.id)
            .ok_or(VideoError::InvalidTexture(texture.id))
    }

    fn surface_mut(&mut self, texture: &Texture) -> VideoResult<&mut Surface> {
        self.textures
            .get_mut(&texture.id)
            .ok_or(VideoError::InvalidTexture(texture.id))
    }

    fn add_dirty(&mut self, rect: &Rect) {
        if rect.is_empty() {
            return;
        }
        let covered = self.dirty.iter().any(|dirty| dirty.encloses(rect));
        if !covered {
            self.dirty.push(*rect);
        }
    }
}

impl RendererBackend for SoftwareRenderer {
    fn info(&self) -> &RendererInfo {
        &self.info
    }

    fn create_texture(&mut self, texture: &Texture) -> VideoResult<()> {
        let surface = if texture.format.is_fourcc() {
            if texture.access == TextureAccess::RenderTarget {
                return Err(VideoError::Unsupported("rendering to YUV textures"));
            }
            if texture.format != PixelFormat::YUY2
                && texture.format != PixelFormat::UYVY
                && texture.format != PixelFormat::YVYU
            {
                return Err(VideoError::Unsupported("planar YUV textures"));
            }
            Surface::new(texture.w, texture.h, PACKED_YUV_MASKS)
        } else {
            Surface::with_format(texture.w, texture.h, texture.format)?
        };
        self.textures.insert(texture.id, surface);
        Ok(())
    }

    fn destroy_texture(&mut self, texture: &Texture) {
        self.textures.remove(&texture.id);
        if self.target == DrawTarget::Texture(texture.id) {
            self.target = DrawTarget::Screen;
        }
    }

    fn query_texture_pixels(&mut self, texture: &Texture) -> VideoResult<TexturePixels<'_>> {
        let surface = self.surface_mut(texture)?;
        Ok(TexturePixels {
            pitch: surface.pitch,
            pixels: &mut surface.pixels,
        })
    }

    fn set_texture_palette(&mut self, texture: &Texture, colors: &[Color], first: usize) -> VideoResult<()> {
        if texture.format.is_fourcc() {
            return Err(VideoError::NoPalette);
        }
        self.surface_mut(texture)?
            .palette
            .as_mut()
            .ok_or(VideoError::NoPalette)?
            .set_colors(colors, first)
    }

    fn texture_palette(&mut self, texture: &Texture, first: usize, count: usize) -> VideoResult<Vec<Color>> {
        if texture.format.is_fourcc() {
            return Err(VideoError::NoPalette);
        }
        self.surface(texture)?
            .palette
            .as_ref()
            .ok_or(VideoError::NoPalette)?
            .get_colors(first, count)
    }

    fn update_texture(&mut self, texture: &Texture, rect: &Rect, pixels: &[u8], pitch: usize) -> VideoResult<()> {
        self.surface_mut(texture)?.write_rect(rect, pixels, pitch)
    }

    fn lock_texture(&mut self, texture: &Texture, rect: &Rect, _mark_dirty: bool) -> VideoResult<TexturePixels<'_>> {
        let surface = self.surface_mut(texture)?;
        let pitch = surface.pitch;
        Ok(TexturePixels {
            pixels: surface.pixels_at_mut(rect.x, rect.y),
            pitch,
        })
    }

    fn unlock_texture(&mut self, texture: &Texture) -> VideoResult<()> {
        self.surface(texture).map(|_| ())
    }

    fn dirty_texture(&mut self, texture: &Texture, _rects: &[Rect]) -> VideoResult<()> {
        self.surface(texture).map(|_| ())
    }

    fn select_render_texture(&mut self, texture: Option<&Texture>) -> VideoResult<()> {
        self.target = match texture {
            Some(texture) => {
                self.surface(texture)?;
                DrawTarget::Texture(texture.id)
            }
            None => DrawTarget::Screen,
        };
        Ok(())
    }

    fn render_fill(&mut self, rect: &Rect, color: Color) -> VideoResult<()> {
        self.add_dirty(rect);
        self.target_mut()?.fill_rect(rect, color);
        Ok(())
    }

    fn render_copy(
        &mut self,
        texture: &Texture,
        src: &Rect,
        dst: &Rect,
        blend: BlendMode,
        scale: ScaleMode,
    ) -> VideoResult<()> {
        if texture.format.is_fourcc() {
            return Err(VideoError::Unsupported("copying from YUV textures"));
        }
        self.add_dirty(dst);

        let mut source = self
            .textures
            .remove(&texture.id)
            .ok_or(VideoError::InvalidTexture(texture.id))?;
        if blend.intersects(BlendMode::MASK | BlendMode::BLEND) {
            source.set_alpha(Some(0xFF));
        } else {
            source.set_alpha(None);
        }
        let stretch = scale != ScaleMode::NONE && (src.w != dst.w || src.h != dst.h);

        let status = self.target_mut().map(|target| {
            source.blit_to(src, &mut target.target(), dst, stretch);
        });
        self.textures.insert(texture.id, source);
        status
    }

    fn render_read_pixels(&mut self, rect: &Rect, pixels: &mut [u8], pitch: usize) -> VideoResult<()> {
        self.target_mut()?.read_rect(rect, pixels, pitch)
    }

    fn render_write_pixels(&mut self, rect: &Rect, pixels: &[u8], pitch: usize) -> VideoResult<()> {
        self.target_mut()?.write_rect(rect, pixels, pitch)?;
        self.add_dirty(rect);
        Ok(())
    }

    fn render_present(&mut self) -> VideoResult<()> {
        let screen = self
            .screens
            .get(self.current_screen)
            .ok_or(VideoError::InvalidRenderer)?;
        for dirty in self.dirty.drain(..) {
            let Some(rect) = dirty.intersection(&screen.bounds()) else {
                continue;
            };
            self.display
                .render_write_pixels(&rect, screen.pixels_at(rect.x, rect.y), screen.pitch)?;
        }
        self.display.render_present()?;

        let count = self.screens.len();
        self.current_screen = (self.current_screen + 1) % count;
        Ok(())
    }
}
