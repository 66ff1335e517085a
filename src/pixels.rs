//!
//! Pixel format enumeration, channel masks, colors and palettes.
//!
//! Pixel formats are packed 32-bit descriptors: the top bit marks a
//! non-FourCC format, followed by pixel type, component order, packed
//! layout, bits per pixel and bytes per pixel.
//!

use std::fmt;

use crate::error::{VideoError, VideoResult};

/// Pixel storage class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum PixelType {
    Unknown = 0,
    Index1 = 1,
    Index4 = 2,
    Index8 = 3,
    Packed8 = 4,
    Packed16 = 5,
    Packed32 = 6,
    ArrayU8 = 7,
    ArrayU16 = 8,
    ArrayU32 = 9,
    ArrayF16 = 10,
    ArrayF32 = 11,
}

impl PixelType {
    /// Decode the type nibble of a format descriptor.
    #[must_use]
    pub const fn from_bits(value: u32) -> Self {
        match value {
            1 => Self::Index1,
            2 => Self::Index4,
            3 => Self::Index8,
            4 => Self::Packed8,
            5 => Self::Packed16,
            6 => Self::Packed32,
            7 => Self::ArrayU8,
            8 => Self::ArrayU16,
            9 => Self::ArrayU32,
            10 => Self::ArrayF16,
            11 => Self::ArrayF32,
            _ => Self::Unknown,
        }
    }
}

const fn define_format(ty: u32, order: u32, layout: u32, bits: u32, bytes: u32) -> u32 {
    (1 << 31) | (ty << 24) | (order << 20) | (layout << 16) | (bits << 8) | bytes
}

const fn define_fourcc(a: u8, b: u8, c: u8, d: u8) -> u32 {
    (a as u32) | ((b as u32) << 8) | ((c as u32) << 16) | ((d as u32) << 24)
}

// Component orders and layouts used by the format table below.
const BITMAP_ORDER_4321: u32 = 1;
const BITMAP_ORDER_1234: u32 = 2;
const PACKED_ORDER_XRGB: u32 = 1;
const PACKED_ORDER_ARGB: u32 = 3;
const PACKED_ORDER_RGBA: u32 = 4;
const PACKED_ORDER_XBGR: u32 = 5;
const PACKED_ORDER_ABGR: u32 = 7;
const PACKED_ORDER_BGRA: u32 = 8;
const ARRAY_ORDER_RGB: u32 = 1;
const ARRAY_ORDER_BGR: u32 = 4;
const LAYOUT_332: u32 = 1;
const LAYOUT_4444: u32 = 2;
const LAYOUT_1555: u32 = 3;
const LAYOUT_565: u32 = 5;
const LAYOUT_8888: u32 = 6;
const LAYOUT_2101010: u32 = 7;

/// A pixel format descriptor.
///
/// Zero ([`PixelFormat::UNKNOWN`]) means "unspecified" in display mode
/// requests and is filled in from defaults.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PixelFormat(pub u32);

impl PixelFormat {
    pub const UNKNOWN: Self = Self(0);
    pub const INDEX1LSB: Self = Self(define_format(PixelType::Index1 as u32, BITMAP_ORDER_1234, 0, 1, 0));
    pub const INDEX1MSB: Self = Self(define_format(PixelType::Index1 as u32, BITMAP_ORDER_4321, 0, 1, 0));
    pub const INDEX4LSB: Self = Self(define_format(PixelType::Index4 as u32, BITMAP_ORDER_1234, 0, 4, 0));
    pub const INDEX4MSB: Self = Self(define_format(PixelType::Index4 as u32, BITMAP_ORDER_4321, 0, 4, 0));
    pub const INDEX8: Self = Self(define_format(PixelType::Index8 as u32, 0, 0, 8, 1));
    pub const RGB332: Self = Self(define_format(PixelType::Packed8 as u32, PACKED_ORDER_XRGB, LAYOUT_332, 8, 1));
    pub const RGB444: Self = Self(define_format(PixelType::Packed16 as u32, PACKED_ORDER_XRGB, LAYOUT_4444, 12, 2));
    pub const RGB555: Self = Self(define_format(PixelType::Packed16 as u32, PACKED_ORDER_XRGB, LAYOUT_1555, 15, 2));
    pub const ARGB4444: Self = Self(define_format(PixelType::Packed16 as u32, PACKED_ORDER_ARGB, LAYOUT_4444, 16, 2));
    pub const ARGB1555: Self = Self(define_format(PixelType::Packed16 as u32, PACKED_ORDER_ARGB, LAYOUT_1555, 16, 2));
    pub const RGB565: Self = Self(define_format(PixelType::Packed16 as u32, PACKED_ORDER_XRGB, LAYOUT_565, 16, 2));
    pub const RGB24: Self = Self(define_format(PixelType::ArrayU8 as u32, ARRAY_ORDER_RGB, 0, 24, 3));
    pub const BGR24: Self = Self(define_format(PixelType::ArrayU8 as u32, ARRAY_ORDER_BGR, 0, 24, 3));
    pub const RGB888: Self = Self(define_format(PixelType::Packed32 as u32, PACKED_ORDER_XRGB, LAYOUT_8888, 24, 4));
    pub const BGR888: Self = Self(define_format(PixelType::Packed32 as u32, PACKED_ORDER_XBGR, LAYOUT_8888, 24, 4));
    pub const ARGB8888: Self = Self(define_format(PixelType::Packed32 as u32, PACKED_ORDER_ARGB, LAYOUT_8888, 32, 4));
    pub const RGBA8888: Self = Self(define_format(PixelType::Packed32 as u32, PACKED_ORDER_RGBA, LAYOUT_8888, 32, 4));
    pub const ABGR8888: Self = Self(define_format(PixelType::Packed32 as u32, PACKED_ORDER_ABGR, LAYOUT_8888, 32, 4));
    pub const BGRA8888: Self = Self(define_format(PixelType::Packed32 as u32, PACKED_ORDER_BGRA, LAYOUT_8888, 32, 4));
    pub const ARGB2101010: Self = Self(define_format(PixelType::Packed32 as u32, PACKED_ORDER_ARGB, LAYOUT_2101010, 32, 4));
    /// Planar Y + V + U.
    pub const YV12: Self = Self(define_fourcc(b'Y', b'V', b'1', b'2'));
    /// Planar Y + U + V.
    pub const IYUV: Self = Self(define_fourcc(b'I', b'Y', b'U', b'V'));
    /// Packed Y0 U0 Y1 V0.
    pub const YUY2: Self = Self(define_fourcc(b'Y', b'U', b'Y', b'2'));
    /// Packed U0 Y0 V0 Y1.
    pub const UYVY: Self = Self(define_fourcc(b'U', b'Y', b'V', b'Y'));
    /// Packed Y0 V0 Y1 U0.
    pub const YVYU: Self = Self(define_fourcc(b'Y', b'V', b'Y', b'U'));

    /// Whether the format is unspecified.
    #[must_use]
    pub const fn is_unknown(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub const fn pixel_type(self) -> PixelType {
        PixelType::from_bits((self.0 >> 24) & 0x0F)
    }

    #[must_use]
    pub const fn bits_per_pixel(self) -> u32 {
        (self.0 >> 8) & 0xFF
    }

    #[must_use]
    pub const fn bytes_per_pixel(self) -> u32 {
        self.0 & 0xFF
    }

    /// Whether the format indexes into a palette.
    #[must_use]
    pub const fn is_indexed(self) -> bool {
        matches!(
            self.pixel_type(),
            PixelType::Index1 | PixelType::Index4 | PixelType::Index8
        )
    }

    #[must_use]
    pub const fn is_fourcc(self) -> bool {
        self.0 != 0 && (self.0 & 0x8000_0000) == 0
    }

    /// Number of palette entries a display in this format needs (0 if none).
    #[must_use]
    pub const fn palette_size(self) -> usize {
        if self.is_indexed() {
            1 << self.bits_per_pixel()
        } else {
            0
        }
    }

    /// Human-readable name of the format.
    #[must_use]
    pub fn name(self) -> &'static str {
        FORMAT_NAMES
            .iter()
            .find(|(format, _)| *format == self)
            .map_or("Unknown", |(_, name)| name)
    }
}

impl fmt::Debug for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PixelFormat({}, {:#010x})", self.name(), self.0)
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const FORMAT_NAMES: &[(PixelFormat, &str)] = &[
    (PixelFormat::INDEX1LSB, "INDEX1LSB"),
    (PixelFormat::INDEX1MSB, "INDEX1MSB"),
    (PixelFormat::INDEX4LSB, "INDEX4LSB"),
    (PixelFormat::INDEX4MSB, "INDEX4MSB"),
    (PixelFormat::INDEX8, "INDEX8"),
    (PixelFormat::RGB332, "RGB332"),
    (PixelFormat::RGB444, "RGB444"),
    (PixelFormat::RGB555, "RGB555"),
    (PixelFormat::ARGB4444, "ARGB4444"),
    (PixelFormat::ARGB1555, "ARGB1555"),
    (PixelFormat::RGB565, "RGB565"),
    (PixelFormat::RGB24, "RGB24"),
    (PixelFormat::BGR24, "BGR24"),
    (PixelFormat::RGB888, "RGB888"),
    (PixelFormat::BGR888, "BGR888"),
    (PixelFormat::ARGB8888, "ARGB8888"),
    (PixelFormat::RGBA8888, "RGBA8888"),
    (PixelFormat::ABGR8888, "ABGR8888"),
    (PixelFormat::BGRA8888, "BGRA8888"),
    (PixelFormat::ARGB2101010, "ARGB2101010"),
    (PixelFormat::YV12, "YV12"),
    (PixelFormat::IYUV, "IYUV"),
    (PixelFormat::YUY2, "YUY2"),
    (PixelFormat::UYVY, "UYVY"),
    (PixelFormat::YVYU, "YVYU"),
];

/// Storage depth and channel masks of a pixel format.
///
/// Multi-byte pixels are read little-endian from memory, so array formats
/// such as RGB24 have their first byte in the low bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelMasks {
    pub bpp: u32,
    pub r: u32,
    pub g: u32,
    pub b: u32,
    pub a: u32,
}

impl PixelMasks {
    #[must_use]
    pub const fn new(bpp: u32, r: u32, g: u32, b: u32, a: u32) -> Self {
        Self { bpp, r, g, b, a }
    }

    /// Bytes used to store one pixel.
    #[must_use]
    pub const fn bytes_per_pixel(&self) -> usize {
        ((self.bpp + 7) / 8) as usize
    }

    /// Decode a stored pixel value into 8-bit RGBA.
    ///
    /// Indexed pixels are looked up in `palette`; a missing palette or entry
    /// decodes as opaque black.
    #[must_use]
    pub fn to_rgba(&self, pixel: u32, palette: Option<&Palette>) -> Color {
        if self.r == 0 && self.g == 0 && self.b == 0 {
            let mut color = palette
                .and_then(|p| p.colors.get(pixel as usize).copied())
                .unwrap_or(Color::rgb(0, 0, 0));
            color.a = 0xFF;
            return color;
        }
        Color {
            r: expand_channel(pixel, self.r),
            g: expand_channel(pixel, self.g),
            b: expand_channel(pixel, self.b),
            a: if self.a == 0 {
                0xFF
            } else {
                expand_channel(pixel, self.a)
            },
        }
    }

    /// Encode an RGBA color into a stored pixel value.
    ///
    /// Indexed formats map to the nearest palette entry.
    #[must_use]
    pub fn from_rgba(&self, color: Color, palette: Option<&Palette>) -> u32 {
        if self.r == 0 && self.g == 0 && self.b == 0 {
            return palette.map_or(0, |p| p.nearest(color) as u32);
        }
        pack_channel(color.r, self.r)
            | pack_channel(color.g, self.g)
            | pack_channel(color.b, self.b)
            | pack_channel(color.a, self.a)
    }
}

fn expand_channel(pixel: u32, mask: u32) -> u8 {
    if mask == 0 {
        return 0;
    }
    let shift = mask.trailing_zeros();
    let max = u64::from(mask >> shift);
    let value = u64::from((pixel & mask) >> shift);
    ((value * 255 + max / 2) / max) as u8
}

fn pack_channel(value: u8, mask: u32) -> u32 {
    if mask == 0 {
        return 0;
    }
    let shift = mask.trailing_zeros();
    let max = u64::from(mask >> shift);
    let scaled = (u64::from(value) * max + 127) / 255;
    ((scaled as u32) << shift) & mask
}

const MASK_TABLE: &[(PixelFormat, PixelMasks)] = &[
    (PixelFormat::RGB332, PixelMasks::new(8, 0xE0, 0x1C, 0x03, 0)),
    (PixelFormat::RGB444, PixelMasks::new(12, 0x0F00, 0x00F0, 0x000F, 0)),
    (PixelFormat::RGB555, PixelMasks::new(15, 0x7C00, 0x03E0, 0x001F, 0)),
    (PixelFormat::ARGB4444, PixelMasks::new(16, 0x0F00, 0x00F0, 0x000F, 0xF000)),
    (PixelFormat::ARGB1555, PixelMasks::new(16, 0x7C00, 0x03E0, 0x001F, 0x8000)),
    (PixelFormat::RGB565, PixelMasks::new(16, 0xF800, 0x07E0, 0x001F, 0)),
    (PixelFormat::RGB24, PixelMasks::new(24, 0x0000_00FF, 0x0000_FF00, 0x00FF_0000, 0)),
    (PixelFormat::BGR24, PixelMasks::new(24, 0x00FF_0000, 0x0000_FF00, 0x0000_00FF, 0)),
    (PixelFormat::RGB888, PixelMasks::new(32, 0x00FF_0000, 0x0000_FF00, 0x0000_00FF, 0)),
    (PixelFormat::BGR888, PixelMasks::new(32, 0x0000_00FF, 0x0000_FF00, 0x00FF_0000, 0)),
    (PixelFormat::ARGB8888, PixelMasks::new(32, 0x00FF_0000, 0x0000_FF00, 0x0000_00FF, 0xFF00_0000)),
    (PixelFormat::RGBA8888, PixelMasks::new(32, 0xFF00_0000, 0x00FF_0000, 0x0000_FF00, 0x0000_00FF)),
    (PixelFormat::ABGR8888, PixelMasks::new(32, 0x0000_00FF, 0x0000_FF00, 0x00FF_0000, 0xFF00_0000)),
    (PixelFormat::BGRA8888, PixelMasks::new(32, 0x0000_FF00, 0x00FF_0000, 0xFF00_0000, 0x0000_00FF)),
    (PixelFormat::ARGB2101010, PixelMasks::new(32, 0x3FF0_0000, 0x000F_FC00, 0x0000_03FF, 0xC000_0000)),
];

/// Describe a pixel format as depth and channel masks.
///
/// Indexed formats have all masks zero. FourCC formats have no mask
/// description.
pub fn format_to_masks(format: PixelFormat) -> VideoResult<PixelMasks> {
    if format.is_indexed() {
        return Ok(PixelMasks::new(format.bits_per_pixel(), 0, 0, 0, 0));
    }
    MASK_TABLE
        .iter()
        .find(|(f, _)| *f == format)
        .map(|(_, masks)| *masks)
        .ok_or(VideoError::UnknownPixelFormat)
}

/// Find the enumerated pixel format matching a depth and channel masks.
#[must_use]
pub fn masks_to_format(masks: PixelMasks) -> Option<PixelFormat> {
    if masks.r == 0 && masks.g == 0 && masks.b == 0 && masks.a == 0 {
        return match masks.bpp {
            1 => Some(PixelFormat::INDEX1MSB),
            4 => Some(PixelFormat::INDEX4MSB),
            8 => Some(PixelFormat::INDEX8),
            _ => None,
        };
    }
    MASK_TABLE
        .iter()
        .find(|(_, m)| *m == masks)
        .map(|(f, _)| *f)
        .or_else(|| {
            // 24-bit depth is accepted for the 32-bit storage formats.
            if masks.bpp == 24 && masks.a == 0 {
                MASK_TABLE
                    .iter()
                    .find(|(_, m)| m.bpp == 32 && m.r == masks.r && m.g == masks.g && m.b == masks.b && m.a == 0)
                    .map(|(f, _)| *f)
            } else {
                None
            }
        })
}

/// Read one little-endian pixel of `bytes_per_pixel` bytes.
#[must_use]
pub fn read_pixel(data: &[u8], bytes_per_pixel: usize) -> u32 {
    data.iter()
        .take(bytes_per_pixel)
        .enumerate()
        .fold(0u32, |acc, (i, byte)| acc | (u32::from(*byte) << (8 * i)))
}

/// Write one little-endian pixel of `bytes_per_pixel` bytes.
pub fn write_pixel(data: &mut [u8], bytes_per_pixel: usize, value: u32) {
    for (i, byte) in data.iter_mut().take(bytes_per_pixel).enumerate() {
        *byte = (value >> (8 * i)) as u8;
    }
}

/// An 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0 }
    }

    /// Decode a packed 0xAARRGGBB value.
    #[must_use]
    pub const fn from_argb(value: u32) -> Self {
        Self {
            a: (value >> 24) as u8,
            r: (value >> 16) as u8,
            g: (value >> 8) as u8,
            b: value as u8,
        }
    }
}

/// A color palette for indexed pixel formats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    pub colors: Vec<Color>,
}

impl Palette {
    /// Allocate a palette of `ncolors` entries, all white.
    #[must_use]
    pub fn new(ncolors: usize) -> Self {
        Self {
            colors: vec![Color::rgb(0xFF, 0xFF, 0xFF); ncolors],
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Replace entries starting at `first`.
    pub fn set_colors(&mut self, colors: &[Color], first: usize) -> VideoResult<()> {
        let end = first
            .checked_add(colors.len())
            .filter(|end| *end <= self.colors.len())
            .ok_or(VideoError::PaletteRange)?;
        self.colors[first..end].copy_from_slice(colors);
        Ok(())
    }

    /// Copy `count` entries starting at `first`.
    pub fn get_colors(&self, first: usize, count: usize) -> VideoResult<Vec<Color>> {
        let end = first
            .checked_add(count)
            .filter(|end| *end <= self.colors.len())
            .ok_or(VideoError::PaletteRange)?;
        Ok(self.colors[first..end].to_vec())
    }

    /// Index of the entry closest to `color` in RGB space.
    #[must_use]
    pub fn nearest(&self, color: Color) -> usize {
        let distance = |c: &Color| {
            let dr = i32::from(c.r) - i32::from(color.r);
            let dg = i32::from(c.g) - i32::from(color.g);
            let db = i32::from(c.b) - i32::from(color.b);
            dr * dr + dg * dg + db * db
        };
        self.colors
            .iter()
            .enumerate()
            .min_by_key(|(_, c)| distance(c))
            .map_or(0, |(i, _)| i)
    }
}

/// Fill `colors` with the default 3-3-2 color cube for an 8-bit palette.
///
/// Other depths are left untouched.
pub fn dither_colors(colors: &mut [Color], bpp: u32) {
    if bpp != 8 {
        return;
    }
    for (i, color) in colors.iter_mut().enumerate().take(256) {
        let i = i as u32;
        let mut r = i & 0xE0;
        r |= (r >> 3) | (r >> 6);
        let mut g = (i << 3) & 0xE0;
        g |= (g >> 3) | (g >> 6);
        let mut b = i & 0x3;
        b |= b << 2;
        b |= b << 4;
        *color = Color::rgb(r as u8, g as u8, b as u8);
    }
}
