//!
//! Display modes, their canonical ordering and the closest-mode search.
//!

use std::any::Any;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::pixels::PixelFormat;

/// Opaque backend data attached to a display mode.
pub type ModeData = Arc<dyn Any + Send + Sync>;

/// Width used when neither the request nor the match specify one.
pub const FALLBACK_WIDTH: i32 = 640;
/// Height used when neither the request nor the match specify one.
pub const FALLBACK_HEIGHT: i32 = 480;
/// Format used when neither the request nor the match specify one.
pub const FALLBACK_FORMAT: PixelFormat = PixelFormat::RGB888;

/// A display mode: pixel format, resolution and refresh rate.
///
/// Zero in any field means "unspecified" in a request. Two modes are equal
/// when their format, size and refresh rate are equal; `driverdata` never
/// takes part in comparisons.
#[derive(Clone, Default)]
pub struct DisplayMode {
    pub format: PixelFormat,
    pub w: i32,
    pub h: i32,
    pub refresh_rate: i32,
    pub driverdata: Option<ModeData>,
}

impl DisplayMode {
    #[must_use]
    pub const fn new(format: PixelFormat, w: i32, h: i32, refresh_rate: i32) -> Self {
        Self {
            format,
            w,
            h,
            refresh_rate,
            driverdata: None,
        }
    }

    /// Attach backend data to the mode.
    #[must_use]
    pub fn with_driverdata(mut self, data: ModeData) -> Self {
        self.driverdata = Some(data);
        self
    }

    /// Fill zero fields from `defaults`.
    #[must_use]
    pub fn or_defaults(&self, defaults: &DisplayMode) -> DisplayMode {
        let mut mode = self.clone();
        if mode.format.is_unknown() {
            mode.format = defaults.format;
        }
        if mode.w == 0 {
            mode.w = defaults.w;
        }
        if mode.h == 0 {
            mode.h = defaults.h;
        }
        if mode.refresh_rate == 0 {
            mode.refresh_rate = defaults.refresh_rate;
        }
        mode
    }
}

impl PartialEq for DisplayMode {
    fn eq(&self, other: &Self) -> bool {
        self.format == other.format
            && self.w == other.w
            && self.h == other.h
            && self.refresh_rate == other.refresh_rate
    }
}

impl Eq for DisplayMode {}

impl fmt::Debug for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplayMode")
            .field("format", &self.format)
            .field("w", &self.w)
            .field("h", &self.h)
            .field("refresh_rate", &self.refresh_rate)
            .field("driverdata", &self.driverdata.is_some())
            .finish()
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.w, self.h)?;
        if self.refresh_rate != 0 {
            write!(f, "@{}", self.refresh_rate)?;
        }
        write!(f, " {}", self.format)
    }
}

/// Canonical mode order: width, height, bits per pixel and refresh rate,
/// all descending.
#[must_use]
pub fn cmp_modes(a: &DisplayMode, b: &DisplayMode) -> Ordering {
    b.w.cmp(&a.w)
        .then_with(|| b.h.cmp(&a.h))
        .then_with(|| b.format.bits_per_pixel().cmp(&a.format.bits_per_pixel()))
        .then_with(|| b.refresh_rate.cmp(&a.refresh_rate))
}

/// Find the mode in `modes` closest to `request`.
///
/// `modes` must already be in [`cmp_modes`] order. An unspecified format or
/// refresh rate in the request targets the desktop's. The scan stops at the
/// first fully specified mode that is narrower or shorter than the request,
/// so a list whose heights do not shrink together with widths may end the
/// scan before a better candidate further down.
///
/// Fields the winner leaves unspecified are taken from the request, and
/// then from the fallback defaults.
#[must_use]
pub fn closest_mode(
    modes: &[DisplayMode],
    desktop: &DisplayMode,
    request: &DisplayMode,
) -> Option<DisplayMode> {
    let target_format = if request.format.is_unknown() {
        desktop.format
    } else {
        request.format
    };
    let target_refresh = if request.refresh_rate == 0 {
        desktop.refresh_rate
    } else {
        request.refresh_rate
    };

    let mut matched: Option<&DisplayMode> = None;
    for current in modes {
        if current.w != 0 && current.h != 0 && (current.w < request.w || current.h < request.h) {
            break;
        }
        let Some(best) = matched else {
            matched = Some(current);
            continue;
        };
        if current.w < best.w || current.h < best.h {
            matched = Some(current);
            continue;
        }
        if current.format != best.format {
            // Sorted from highest depth to lowest.
            if current.format == target_format
                || (current.format.bits_per_pixel() >= target_format.bits_per_pixel()
                    && current.format.pixel_type() == target_format.pixel_type())
            {
                matched = Some(current);
            }
            continue;
        }
        if current.refresh_rate != best.refresh_rate && current.refresh_rate >= target_refresh {
            matched = Some(current);
        }
    }

    matched.map(|found| {
        let mut closest = DisplayMode {
            format: if found.format.is_unknown() {
                request.format
            } else {
                found.format
            },
            w: request.w,
            h: request.h,
            refresh_rate: if found.refresh_rate == 0 {
                request.refresh_rate
            } else {
                found.refresh_rate
            },
            driverdata: found.driverdata.clone(),
        };
        if found.w != 0 && found.h != 0 {
            closest.w = found.w;
            closest.h = found.h;
        }
        if closest.format.is_unknown() {
            closest.format = FALLBACK_FORMAT;
        }
        if closest.w == 0 {
            closest.w = FALLBACK_WIDTH;
        }
        if closest.h == 0 {
            closest.h = FALLBACK_HEIGHT;
        }
        closest
    })
}
