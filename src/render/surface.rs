//! In-memory pixel surfaces.
//!
//! A [`Surface`] is the source image for textures created from pixels and
//! the backing store of the software renderers. Copies between surfaces
//! convert every pixel through 8-bit RGBA.

use bitflags::bitflags;

use crate::error::{VideoError, VideoResult};
use crate::pixels::{format_to_masks, read_pixel, write_pixel, Color, Palette, PixelFormat, PixelMasks};
use crate::rect::Rect;

bitflags! {
    /// Surface blit flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SurfaceFlags: u32 {
        /// Pixels equal to the color key are not copied.
        const SRCCOLORKEY = 0x0000_1000;
        /// Copies blend with the destination.
        const SRCALPHA = 0x0001_0000;
    }
}

/// Row length in bytes, padded to four.
#[must_use]
pub fn calculate_pitch(w: i32, masks: &PixelMasks) -> usize {
    let row = w.max(0) as usize * masks.bytes_per_pixel();
    (row + 3) & !3
}

/// A destination for converted pixels: a raw buffer with its layout.
pub struct PixelTarget<'a> {
    pub pixels: &'a mut [u8],
    pub pitch: usize,
    pub w: i32,
    pub h: i32,
    pub masks: PixelMasks,
    pub palette: Option<&'a Palette>,
}

impl PixelTarget<'_> {
    fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.w, self.h)
    }

    fn offset(&self, x: i32, y: i32) -> usize {
        y as usize * self.pitch + x as usize * self.masks.bytes_per_pixel()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    pub flags: SurfaceFlags,
    pub w: i32,
    pub h: i32,
    pub pitch: usize,
    pub pixels: Vec<u8>,
    pub masks: PixelMasks,
    pub palette: Option<Palette>,
    pub colorkey: u32,
    /// Surface-wide alpha, used when the masks carry no alpha channel.
    pub alpha: u8,
}

impl Surface {
    /// A zeroed surface. Indexed surfaces get an all-white palette.
    #[must_use]
    pub fn new(w: i32, h: i32, masks: PixelMasks) -> Self {
        let pitch = calculate_pitch(w, &masks);
        let indexed = masks.r == 0 && masks.g == 0 && masks.b == 0 && masks.a == 0;
        Self {
            flags: SurfaceFlags::empty(),
            w: w.max(0),
            h: h.max(0),
            pitch,
            pixels: vec![0; pitch * h.max(0) as usize],
            masks,
            palette: (indexed && masks.bpp <= 8).then(|| Palette::new(1 << masks.bpp)),
            colorkey: 0,
            alpha: 0xFF,
        }
    }

    pub fn with_format(w: i32, h: i32, format: PixelFormat) -> VideoResult<Self> {
        Ok(Self::new(w, h, format_to_masks(format)?))
    }

    #[must_use]
    pub fn bytes_per_pixel(&self) -> usize {
        self.masks.bytes_per_pixel()
    }

    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.w, self.h)
    }

    /// Set or clear the color key.
    pub fn set_color_key(&mut self, key: Option<u32>) {
        match key {
            Some(key) => {
                self.colorkey = key;
                self.flags.insert(SurfaceFlags::SRCCOLORKEY);
            }
            None => self.flags.remove(SurfaceFlags::SRCCOLORKEY),
        }
    }

    /// Turn alpha blending on with the given surface alpha, or off.
    pub fn set_alpha(&mut self, alpha: Option<u8>) {
        match alpha {
            Some(alpha) => {
                self.alpha = alpha;
                self.flags.insert(SurfaceFlags::SRCALPHA);
            }
            None => self.flags.remove(SurfaceFlags::SRCALPHA),
        }
    }

    fn offset(&self, x: i32, y: i32) -> usize {
        y as usize * self.pitch + x as usize * self.bytes_per_pixel()
    }

    /// Pixel bytes from `(x, y)` to the end of the buffer.
    ///
    /// The point is clamped to the surface.
    #[must_use]
    pub fn pixels_at(&self, x: i32, y: i32) -> &[u8] {
        let at = self.offset(x.clamp(0, self.w), y.clamp(0, self.h)).min(self.pixels.len());
        &self.pixels[at..]
    }

    pub fn pixels_at_mut(&mut self, x: i32, y: i32) -> &mut [u8] {
        let at = self.offset(x.clamp(0, self.w), y.clamp(0, self.h)).min(self.pixels.len());
        &mut self.pixels[at..]
    }

    /// Raw pixel value. Out-of-bounds reads return zero.
    #[must_use]
    pub fn pixel(&self, x: i32, y: i32) -> u32 {
        if !self.bounds().contains(x, y) {
            return 0;
        }
        let at = self.offset(x, y);
        read_pixel(&self.pixels[at..], self.bytes_per_pixel())
    }

    pub fn put_pixel(&mut self, x: i32, y: i32, value: u32) {
        if !self.bounds().contains(x, y) {
            return;
        }
        let at = self.offset(x, y);
        let bpp = self.bytes_per_pixel();
        write_pixel(&mut self.pixels[at..], bpp, value);
    }

    #[must_use]
    pub fn color_at(&self, x: i32, y: i32) -> Color {
        self.masks.to_rgba(self.pixel(x, y), self.palette.as_ref())
    }

    /// Fill a rectangle, clipped to the surface.
    pub fn fill_rect(&mut self, rect: &Rect, color: Color) {
        let Some(rect) = rect.intersection(&self.bounds()) else {
            return;
        };
        let value = self.masks.from_rgba(color, self.palette.as_ref());
        for y in rect.y..rect.bottom() as i32 {
            for x in rect.x..rect.right() as i32 {
                self.put_pixel(x, y, value);
            }
        }
    }

    /// Reject rectangles that are empty or reach outside the surface.
    fn check_rect(&self, rect: &Rect) -> VideoResult<()> {
        if rect.is_empty() || !self.bounds().encloses(rect) {
            return Err(VideoError::InvalidParam("rect"));
        }
        Ok(())
    }

    /// Byte range of `row` in a caller buffer laid out with `pitch`.
    fn row_span(row: usize, pitch: usize, length: usize) -> VideoResult<std::ops::Range<usize>> {
        let start = row.checked_mul(pitch).ok_or(VideoError::InvalidParam("pitch"))?;
        let end = start.checked_add(length).ok_or(VideoError::InvalidParam("pitch"))?;
        Ok(start..end)
    }

    /// Copy raw rows out of the surface.
    pub fn read_rect(&self, rect: &Rect, out: &mut [u8], pitch: usize) -> VideoResult<()> {
        self.check_rect(rect)?;
        let length = rect.w as usize * self.bytes_per_pixel();
        for row in 0..rect.h as usize {
            let src = self.offset(rect.x, rect.y + row as i32);
            let dst_row = out
                .get_mut(Self::row_span(row, pitch, length)?)
                .ok_or(VideoError::InvalidParam("pixels"))?;
            dst_row.copy_from_slice(&self.pixels[src..src + length]);
        }
        Ok(())
    }

    /// Copy raw rows into the surface.
    pub fn write_rect(&mut self, rect: &Rect, pixels: &[u8], pitch: usize) -> VideoResult<()> {
        self.check_rect(rect)?;
        let length = rect.w as usize * self.bytes_per_pixel();
        for row in 0..rect.h as usize {
            let dst = self.offset(rect.x, rect.y + row as i32);
            let src_row = pixels
                .get(Self::row_span(row, pitch, length)?)
                .ok_or(VideoError::InvalidParam("pixels"))?;
            self.pixels[dst..dst + length].copy_from_slice(src_row);
        }
        Ok(())
    }

    /// Borrow the surface as a conversion target.
    pub fn target(&mut self) -> PixelTarget<'_> {
        PixelTarget {
            pixels: &mut self.pixels,
            pitch: self.pitch,
            w: self.w,
            h: self.h,
            masks: self.masks,
            palette: self.palette.as_ref(),
        }
    }

    /// Copy `src` from this surface into `dst` of `target`.
    ///
    /// When the rectangles differ in size the copy is stretched by nearest
    /// neighbour if `stretch` is set, and otherwise copies the overlapping
    /// size only. Destination pixels outside the target are skipped.
    /// Keyed pixels are skipped under [`SurfaceFlags::SRCCOLORKEY`], and
    /// [`SurfaceFlags::SRCALPHA`] blends with what the target holds.
    pub fn blit_to(&self, src: &Rect, target: &mut PixelTarget<'_>, dst: &Rect, stretch: bool) {
        let Some(src) = src.intersection(&self.bounds()) else {
            return;
        };
        let (w, h) = if stretch {
            (dst.w, dst.h)
        } else {
            (src.w.min(dst.w), src.h.min(dst.h))
        };
        let Some(visible) = Rect::new(dst.x, dst.y, w, h).intersection(&target.bounds()) else {
            return;
        };
        let dst_bpp = target.masks.bytes_per_pixel();
        let keyed = self.flags.contains(SurfaceFlags::SRCCOLORKEY);
        let blended = self.flags.contains(SurfaceFlags::SRCALPHA);
        let src_palette = self.palette.as_ref();

        for ty in visible.y..visible.y + visible.h {
            for tx in visible.x..visible.x + visible.w {
                let dx = i64::from(tx) - i64::from(dst.x);
                let dy = i64::from(ty) - i64::from(dst.y);
                let (sx, sy) = if stretch {
                    (
                        i64::from(src.x) + dx * i64::from(src.w) / i64::from(w),
                        i64::from(src.y) + dy * i64::from(src.h) / i64::from(h),
                    )
                } else {
                    (i64::from(src.x) + dx, i64::from(src.y) + dy)
                };
                // Both land inside `src`, which lies inside this surface.
                let raw = self.pixel(sx as i32, sy as i32);
                if keyed && raw == self.colorkey {
                    continue;
                }
                let mut color = self.masks.to_rgba(raw, src_palette);
                let at = target.offset(tx, ty);
                if blended {
                    let alpha = if self.masks.a != 0 { color.a } else { self.alpha };
                    let under = target
                        .masks
                        .to_rgba(read_pixel(&target.pixels[at..], dst_bpp), target.palette);
                    color = blend(color, under, alpha);
                }
                let value = target.masks.from_rgba(color, target.palette);
                write_pixel(&mut target.pixels[at..], dst_bpp, value);
            }
        }
    }
}

fn blend(src: Color, dst: Color, alpha: u8) -> Color {
    let mix = |s: u8, d: u8| {
        let a = u32::from(alpha);
        ((u32::from(s) * a + u32::from(d) * (255 - a) + 127) / 255) as u8
    };
    Color::new(mix(src.r, dst.r), mix(src.g, dst.g), mix(src.b, dst.b), dst.a.max(alpha))
}
