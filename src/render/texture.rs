//!
//! Textures and the per-display texture table.
//!
//! Texture ids come from the same counter as window ids. The table hashes
//! them into a fixed number of buckets and never rehashes; a lookup scans
//! one bucket.
//!

use std::collections::VecDeque;

use log::{debug, warn};

use crate::error::{VideoError, VideoResult};
use crate::pixels::{
    dither_colors, format_to_masks, masks_to_format, Color, Palette, PixelFormat, PixelMasks,
};
use crate::rect::Rect;
use crate::render::renderer::{RendererId, TexturePixels};
use crate::render::surface::{calculate_pitch, PixelTarget, Surface, SurfaceFlags};
use crate::video::device::VideoDevice;
use crate::video::window::WindowId;

/// Texture identifier. Zero is never a valid id.
pub type TextureId = u32;

/// Number of buckets in a display's texture table.
pub const TEXTURE_BUCKETS: usize = 64;

/// How a texture is going to be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureAccess {
    /// Changes rarely.
    #[default]
    Static,
    /// Locked and rewritten frequently.
    Streaming,
    /// Can be selected as a draw target.
    RenderTarget,
}

/// A pixel buffer owned by one renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    pub id: TextureId,
    pub format: PixelFormat,
    pub access: TextureAccess,
    pub w: i32,
    pub h: i32,
    /// Owning renderer.
    pub renderer: RendererId,
    /// Window the owning renderer draws into.
    pub window: WindowId,
}

impl Texture {
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.w, self.h)
    }
}

/// Hash table of textures keyed by `id % TEXTURE_BUCKETS`.
#[derive(Debug)]
pub struct TextureTable {
    buckets: [VecDeque<Texture>; TEXTURE_BUCKETS],
}

impl Default for TextureTable {
    fn default() -> Self {
        const EMPTY_BUCKET: VecDeque<Texture> = VecDeque::new();
        Self {
            buckets: [EMPTY_BUCKET; TEXTURE_BUCKETS],
        }
    }
}

impl TextureTable {
    fn bucket_index(id: TextureId) -> usize {
        id as usize % TEXTURE_BUCKETS
    }

    /// Add a texture at the front of its bucket.
    pub fn insert(&mut self, texture: Texture) {
        self.buckets[Self::bucket_index(texture.id)].push_front(texture);
    }

    #[must_use]
    pub fn get(&self, id: TextureId) -> Option<&Texture> {
        self.buckets[Self::bucket_index(id)]
            .iter()
            .find(|texture| texture.id == id)
    }

    pub fn remove(&mut self, id: TextureId) -> Option<Texture> {
        let bucket = &mut self.buckets[Self::bucket_index(id)];
        let position = bucket.iter().position(|texture| texture.id == id)?;
        bucket.remove(position)
    }

    /// Remove every texture owned by `renderer`, scanning all buckets.
    pub fn remove_by_renderer(&mut self, renderer: RendererId) -> Vec<Texture> {
        let mut removed = Vec::new();
        for bucket in &mut self.buckets {
            let mut kept = VecDeque::with_capacity(bucket.len());
            for texture in bucket.drain(..) {
                if texture.renderer == renderer {
                    removed.push(texture);
                } else {
                    kept.push_back(texture);
                }
            }
            *bucket = kept;
        }
        removed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.iter().map(VecDeque::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(VecDeque::is_empty)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Texture> {
        self.buckets.iter().flatten()
    }

    /// Number of textures chained in the bucket `id` hashes to.
    #[must_use]
    pub fn bucket_len(&self, id: TextureId) -> usize {
        self.buckets[Self::bucket_index(id)].len()
    }
}

/// Alpha-capable format used for keyed or blended surfaces without an
/// alpha channel.
const ARGB_MASKS: PixelMasks = PixelMasks::new(32, 0x00FF_0000, 0x0000_FF00, 0x0000_00FF, 0xFF00_0000);

impl VideoDevice {
    pub(crate) fn texture_ref(&self, id: TextureId) -> VideoResult<&Texture> {
        self.current()?
            .textures
            .get(id)
            .ok_or(VideoError::InvalidTexture(id))
    }

    /// Look a texture up on the current display.
    #[must_use]
    pub fn texture(&self, id: TextureId) -> Option<&Texture> {
        self.texture_ref(id).ok()
    }

    /// Create a texture on the current renderer.
    ///
    /// The id is taken from the device counter before the renderer is asked,
    /// so a failed creation still uses one up.
    pub fn create_texture(
        &mut self,
        format: PixelFormat,
        access: TextureAccess,
        w: i32,
        h: i32,
    ) -> VideoResult<TextureId> {
        let window = self.current_renderer().ok_or(VideoError::InvalidRenderer)?;
        let renderer = self
            .window_ref(window)?
            .renderer
            .as_ref()
            .map(|renderer| renderer.id())
            .ok_or(VideoError::InvalidRenderer)?;

        let texture = Texture {
            id: self.next_object_id()?,
            format,
            access,
            w,
            h,
            renderer,
            window,
        };
        self.texture_renderer_mut(&texture)?
            .backend
            .create_texture(&texture)?;

        let id = texture.id;
        debug!("Created {}x{} {} texture {}", w, h, format, id);
        self.current_mut()?.textures.insert(texture);
        Ok(id)
    }

    /// Create a texture holding a converted copy of `surface`.
    ///
    /// Without a `format`, the surface's own format is used unless the
    /// surface is keyed or blended without an alpha channel, in which case
    /// the texture gets 32-bit ARGB. Keyed pixels end up fully transparent.
    /// The surface's alpha flag is suspended while its pixels are copied.
    pub fn create_texture_from_surface(
        &mut self,
        format: Option<PixelFormat>,
        access: TextureAccess,
        surface: &mut Surface,
    ) -> VideoResult<TextureId> {
        let (format, masks) = match format {
            Some(format) => (format, format_to_masks(format)?),
            None => {
                let masks = if surface.masks.a != 0
                    || !surface
                        .flags
                        .intersects(SurfaceFlags::SRCCOLORKEY | SurfaceFlags::SRCALPHA)
                {
                    surface.masks
                } else {
                    ARGB_MASKS
                };
                let format = masks_to_format(masks).ok_or(VideoError::UnknownPixelFormat)?;
                (format, masks)
            }
        };

        let id = self.create_texture(format, access, surface.w, surface.h)?;
        if let Err(err) = self.upload_surface(id, format, masks, surface) {
            if let Err(cleanup) = self.destroy_texture(id) {
                warn!("Couldn't release texture {}: {}", id, cleanup);
            }
            return Err(err);
        }
        Ok(id)
    }

    fn upload_surface(
        &mut self,
        id: TextureId,
        format: PixelFormat,
        masks: PixelMasks,
        surface: &mut Surface,
    ) -> VideoResult<()> {
        let palette = if format.is_indexed() {
            match surface.palette.clone() {
                Some(palette) => {
                    if let Err(err) = self.set_texture_palette(id, &palette.colors, 0) {
                        debug!("Texture {} keeps its own palette: {}", id, err);
                    }
                    Some(palette)
                }
                None => {
                    let mut palette = Palette::new(1 << format.bits_per_pixel());
                    dither_colors(&mut palette.colors, format.bits_per_pixel());
                    Some(palette)
                }
            }
        } else {
            None
        };

        let (w, h) = (surface.w, surface.h);
        let uploaded = match self.lock_texture(id, None, true) {
            Ok(locked) => {
                let mut target = PixelTarget {
                    pixels: locked.pixels,
                    pitch: locked.pitch,
                    w,
                    h,
                    masks,
                    palette: palette.as_ref(),
                };
                copy_surface(surface, &mut target);
                true
            }
            Err(_) => false,
        };
        if uploaded {
            return self.unlock_texture(id);
        }

        let pitch = calculate_pitch(w, &masks);
        let mut scratch = Vec::new();
        scratch
            .try_reserve_exact(pitch * h.max(0) as usize)
            .map_err(|_| VideoError::OutOfMemory)?;
        scratch.resize(pitch * h.max(0) as usize, 0);
        let mut target = PixelTarget {
            pixels: &mut scratch,
            pitch,
            w,
            h,
            masks,
            palette: palette.as_ref(),
        };
        copy_surface(surface, &mut target);
        self.update_texture(id, None, &scratch, pitch)
    }

    /// Format, access and size of a texture.
    pub fn query_texture(&self, id: TextureId) -> VideoResult<(PixelFormat, TextureAccess, i32, i32)> {
        let texture = self.texture_ref(id)?;
        Ok((texture.format, texture.access, texture.w, texture.h))
    }

    /// Direct access to the texture's pixel memory, if the renderer keeps
    /// it in system memory.
    pub fn query_texture_pixels(&mut self, id: TextureId) -> VideoResult<TexturePixels<'_>> {
        let texture = self.texture_ref(id)?.clone();
        self.texture_renderer_mut(&texture)?
            .backend
            .query_texture_pixels(&texture)
    }

    pub fn set_texture_palette(&mut self, id: TextureId, colors: &[Color], first: usize) -> VideoResult<()> {
        let texture = self.texture_ref(id)?.clone();
        self.texture_renderer_mut(&texture)?
            .backend
            .set_texture_palette(&texture, colors, first)
    }

    pub fn texture_palette(&mut self, id: TextureId, first: usize, count: usize) -> VideoResult<Vec<Color>> {
        let texture = self.texture_ref(id)?.clone();
        self.texture_renderer_mut(&texture)?
            .backend
            .texture_palette(&texture, first, count)
    }

    /// Replace the pixels of `rect`, or of the whole texture.
    pub fn update_texture(
        &mut self,
        id: TextureId,
        rect: Option<&Rect>,
        pixels: &[u8],
        pitch: usize,
    ) -> VideoResult<()> {
        let texture = self.texture_ref(id)?.clone();
        let rect = rect.copied().unwrap_or(texture.bounds());
        self.texture_renderer_mut(&texture)?
            .backend
            .update_texture(&texture, &rect, pixels, pitch)
    }

    /// Lock `rect`, or the whole texture, for writing.
    pub fn lock_texture(
        &mut self,
        id: TextureId,
        rect: Option<&Rect>,
        mark_dirty: bool,
    ) -> VideoResult<TexturePixels<'_>> {
        let texture = self.texture_ref(id)?.clone();
        let rect = rect.copied().unwrap_or(texture.bounds());
        self.texture_renderer_mut(&texture)?
            .backend
            .lock_texture(&texture, &rect, mark_dirty)
    }

    pub fn unlock_texture(&mut self, id: TextureId) -> VideoResult<()> {
        let texture = self.texture_ref(id)?.clone();
        self.texture_renderer_mut(&texture)?
            .backend
            .unlock_texture(&texture)
    }

    /// Tell the renderer which parts of a texture changed.
    pub fn dirty_texture(&mut self, id: TextureId, rects: &[Rect]) -> VideoResult<()> {
        let texture = self.texture_ref(id)?.clone();
        self.texture_renderer_mut(&texture)?
            .backend
            .dirty_texture(&texture, rects)
    }

    /// Draw into a render-target texture, or back into the window with
    /// `None`.
    pub fn select_render_texture(&mut self, id: Option<TextureId>) -> VideoResult<()> {
        let Some(id) = id else {
            let window = self.current_renderer().ok_or(VideoError::InvalidRenderer)?;
            return self
                .window_mut_ref(window)?
                .renderer
                .as_mut()
                .ok_or(VideoError::InvalidRenderer)?
                .backend
                .select_render_texture(None);
        };
        let texture = self.texture_ref(id)?.clone();
        if texture.access != TextureAccess::RenderTarget {
            return Err(VideoError::InvalidTexture(id));
        }
        self.texture_renderer_mut(&texture)?
            .backend
            .select_render_texture(Some(&texture))
    }

    /// Remove a texture from the current display and release it.
    pub fn destroy_texture(&mut self, id: TextureId) -> VideoResult<()> {
        let texture = self
            .current_mut()?
            .textures
            .remove(id)
            .ok_or(VideoError::InvalidTexture(id))?;
        self.texture_renderer_mut(&texture)?
            .backend
            .destroy_texture(&texture);
        debug!("Destroyed texture {}", id);
        Ok(())
    }
}

/// Copy a whole surface into `target`, leaving keyed pixels transparent.
fn copy_surface(surface: &mut Surface, target: &mut PixelTarget<'_>) {
    if surface.flags.contains(SurfaceFlags::SRCCOLORKEY) {
        let length = target.w.max(0) as usize * target.masks.bytes_per_pixel();
        for row in 0..target.h.max(0) as usize {
            let start = row * target.pitch;
            if let Some(bytes) = target.pixels.get_mut(start..start + length) {
                bytes.fill(0);
            }
        }
    }

    let blended = surface.flags.contains(SurfaceFlags::SRCALPHA);
    surface.flags.remove(SurfaceFlags::SRCALPHA);
    let bounds = surface.bounds();
    surface.blit_to(&bounds, target, &bounds, false);
    if blended {
        surface.flags.insert(SurfaceFlags::SRCALPHA);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventQueue;
    use crate::render::renderer::RendererFlags;
    use crate::video::bootstrap::DriverRegistry;
    use crate::video::device::InitFlags;
    use crate::video::window::WindowFlags;

    fn texture(id: TextureId, renderer: u32) -> Texture {
        Texture {
            id,
            format: PixelFormat::ARGB8888,
            access: TextureAccess::Static,
            w: 1,
            h: 1,
            renderer: RendererId(renderer),
            window: 1,
        }
    }

    fn rendering_device() -> (VideoDevice, WindowId) {
        let mut device = VideoDevice::init(
            &DriverRegistry::default(),
            None,
            InitFlags::empty(),
            Box::new(EventQueue::new()),
        )
        .unwrap();
        let window = device
            .create_window(Some("textures"), 0, 0, 16, 16, WindowFlags::SHOWN)
            .unwrap();
        device.create_renderer(window, None, RendererFlags::empty()).unwrap();
        (device, window)
    }

    #[test]
    fn test_table_chains_colliding_ids() {
        let mut table = TextureTable::default();
        table.insert(texture(3, 1));
        table.insert(texture(3 + TEXTURE_BUCKETS as u32, 1));
        table.insert(texture(4, 2));
        assert_eq!(table.bucket_len(3), 2);
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(67).map(|t| t.id), Some(67));

        assert_eq!(table.remove(3).map(|t| t.id), Some(3));
        assert!(table.get(3).is_none());
        assert!(table.get(67).is_some());
        assert!(table.remove(3).is_none());
    }

    #[test]
    fn test_table_remove_by_renderer() {
        let mut table = TextureTable::default();
        for id in 1..200 {
            table.insert(texture(id, id % 3));
        }
        let removed = table.remove_by_renderer(RendererId(1));
        assert!(removed.iter().all(|t| t.renderer == RendererId(1)));
        assert!(table.iter().all(|t| t.renderer != RendererId(1)));
        assert_eq!(table.len() + removed.len(), 199);
    }

    #[test]
    fn test_create_without_renderer() {
        let mut device = VideoDevice::init(
            &DriverRegistry::default(),
            None,
            InitFlags::empty(),
            Box::new(EventQueue::new()),
        )
        .unwrap();
        assert_eq!(
            device.create_texture(PixelFormat::ARGB8888, TextureAccess::Static, 4, 4),
            Err(VideoError::InvalidRenderer)
        );
    }

    #[test]
    fn test_query_and_destroy() {
        let (mut device, window) = rendering_device();
        let id = device
            .create_texture(PixelFormat::RGB565, TextureAccess::Streaming, 8, 4)
            .unwrap();
        assert!(id > window);
        assert_eq!(
            device.query_texture(id).unwrap(),
            (PixelFormat::RGB565, TextureAccess::Streaming, 8, 4)
        );
        assert_eq!(device.query_texture_pixels(id).unwrap().pitch, 16);

        device.destroy_texture(id).unwrap();
        assert_eq!(device.query_texture(id), Err(VideoError::InvalidTexture(id)));
        assert_eq!(device.destroy_texture(id), Err(VideoError::InvalidTexture(id)));
    }

    #[test]
    fn test_failed_create_consumes_id() {
        let (mut device, _window) = rendering_device();
        assert!(device
            .create_texture(PixelFormat::YV12, TextureAccess::Static, 4, 4)
            .is_err());
        let first = device
            .create_texture(PixelFormat::ARGB8888, TextureAccess::Static, 4, 4)
            .unwrap();
        let second = device
            .create_texture(PixelFormat::ARGB8888, TextureAccess::Static, 4, 4)
            .unwrap();
        assert_eq!(second, first + 1);
        assert!(device.texture(first - 1).is_none());
    }

    #[test]
    fn test_render_target_selection() {
        let (mut device, _window) = rendering_device();
        let plain = device
            .create_texture(PixelFormat::ARGB8888, TextureAccess::Static, 4, 4)
            .unwrap();
        assert_eq!(
            device.select_render_texture(Some(plain)),
            Err(VideoError::InvalidTexture(plain))
        );
        let target = device
            .create_texture(PixelFormat::ARGB8888, TextureAccess::RenderTarget, 4, 4)
            .unwrap();
        device.select_render_texture(Some(target)).unwrap();
        device.render_fill(None, Color::new(0, 0xFF, 0, 0xFF)).unwrap();
        device.select_render_texture(None).unwrap();

        let pixels = device.query_texture_pixels(target).unwrap();
        assert_eq!(&pixels.pixels[..4], &[0x00, 0xFF, 0x00, 0xFF]);
    }

    #[test]
    fn test_from_surface_keyed_gets_alpha() {
        let (mut device, _window) = rendering_device();
        let mut surface = Surface::with_format(2, 1, PixelFormat::RGB565).unwrap();
        surface.put_pixel(0, 0, 0xF800);
        surface.put_pixel(1, 0, 0x07E0);
        surface.set_color_key(Some(0x07E0));

        let id = device
            .create_texture_from_surface(None, TextureAccess::Static, &mut surface)
            .unwrap();
        assert_eq!(device.query_texture(id).unwrap().0, PixelFormat::ARGB8888);

        let pixels = device.query_texture_pixels(id).unwrap();
        assert_eq!(&pixels.pixels[..8], &[0x00, 0x00, 0xFF, 0xFF, 0, 0, 0, 0]);
    }

    #[test]
    fn test_from_surface_restores_alpha_flag() {
        let (mut device, _window) = rendering_device();
        let mut surface = Surface::with_format(1, 1, PixelFormat::ARGB8888).unwrap();
        surface.set_alpha(Some(0x40));
        device
            .create_texture_from_surface(None, TextureAccess::Static, &mut surface)
            .unwrap();
        assert!(surface.flags.contains(SurfaceFlags::SRCALPHA));
        assert_eq!(surface.alpha, 0x40);
    }

    #[test]
    fn test_from_surface_copies_palette() {
        let (mut device, _window) = rendering_device();
        let mut surface = Surface::with_format(1, 1, PixelFormat::INDEX8).unwrap();
        if let Some(palette) = surface.palette.as_mut() {
            palette.colors[5] = Color::rgb(9, 8, 7);
        }
        surface.put_pixel(0, 0, 5);
        let id = device
            .create_texture_from_surface(None, TextureAccess::Static, &mut surface)
            .unwrap();
        assert_eq!(device.texture_palette(id, 5, 1).unwrap(), vec![Color::rgb(9, 8, 7)]);
        assert_eq!(device.query_texture_pixels(id).unwrap().pixels[0], 5);
    }

    #[test]
    fn test_from_surface_unknown_format() {
        let (mut device, _window) = rendering_device();
        let mut surface = Surface::with_format(1, 1, PixelFormat::RGB565).unwrap();
        assert_eq!(
            device.create_texture_from_surface(Some(PixelFormat::YUY2), TextureAccess::Static, &mut surface),
            Err(VideoError::UnknownPixelFormat)
        );
    }
}
