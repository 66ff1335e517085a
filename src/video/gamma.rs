//!
//! Display gamma ramps.
//!
//! A display's ramp is allocated lazily on first use, starting from the
//! hardware's current ramp (or identity), and a copy is kept so the
//! starting ramp can be put back when the application loses focus.
//!

use log::warn;

use crate::error::{VideoError, VideoResult};
use crate::video::device::VideoDevice;

/// Entries per channel.
pub const GAMMA_RAMP_SIZE: usize = 256;

/// One ramp per color channel, 16 bits per entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GammaRamp {
    pub red: [u16; GAMMA_RAMP_SIZE],
    pub green: [u16; GAMMA_RAMP_SIZE],
    pub blue: [u16; GAMMA_RAMP_SIZE],
}

impl GammaRamp {
    /// The ramp that leaves colors unchanged.
    #[must_use]
    pub fn identity() -> Self {
        let channel = identity_channel();
        Self {
            red: channel,
            green: channel,
            blue: channel,
        }
    }

    /// Power-curve ramps for the three channels.
    #[must_use]
    pub fn from_gamma(red: f32, green: f32, blue: f32) -> Self {
        Self {
            red: calculate_gamma_ramp(red),
            green: calculate_gamma_ramp(green),
            blue: calculate_gamma_ramp(blue),
        }
    }
}

impl Default for GammaRamp {
    fn default() -> Self {
        Self::identity()
    }
}

fn identity_channel() -> [u16; GAMMA_RAMP_SIZE] {
    let mut channel = [0u16; GAMMA_RAMP_SIZE];
    for (i, entry) in channel.iter_mut().enumerate() {
        *entry = ((i << 8) | i) as u16;
    }
    channel
}

/// Ramp for a single gamma value.
///
/// Zero or negative gamma is all black and 1.0 is identity.
#[must_use]
pub fn calculate_gamma_ramp(gamma: f32) -> [u16; GAMMA_RAMP_SIZE] {
    if gamma <= 0.0 {
        return [0; GAMMA_RAMP_SIZE];
    }
    if gamma == 1.0 {
        return identity_channel();
    }
    let exponent = 1.0 / f64::from(gamma);
    let mut ramp = [0u16; GAMMA_RAMP_SIZE];
    for (i, entry) in ramp.iter_mut().enumerate() {
        let value = ((i as f64 / 256.0).powf(exponent) * 65535.0 + 0.5) as i64;
        *entry = value.min(65535) as u16;
    }
    ramp
}

/// Estimate the gamma value a ramp was built from.
#[must_use]
pub fn calculate_gamma_from_ramp(ramp: &[u16; GAMMA_RAMP_SIZE]) -> f32 {
    let mut sum = 0.0f64;
    let mut count = 0u32;
    for (i, &entry) in ramp.iter().enumerate().skip(1) {
        if entry != 0 && entry != 65535 {
            let b = i as f64 / 256.0;
            let a = f64::from(entry) / 65535.0;
            sum += a.ln() / b.ln();
            count += 1;
        }
    }
    if count > 0 && sum != 0.0 {
        (1.0 / (sum / f64::from(count))) as f32
    } else {
        1.0
    }
}

impl VideoDevice {
    /// Replace the given channels of the current display's gamma ramp.
    ///
    /// `None` leaves a channel as it is.
    pub fn set_gamma_ramp(
        &mut self,
        red: Option<&[u16; GAMMA_RAMP_SIZE]>,
        green: Option<&[u16; GAMMA_RAMP_SIZE]>,
        blue: Option<&[u16; GAMMA_RAMP_SIZE]>,
    ) -> VideoResult<()> {
        if self.backend.gamma().is_none() {
            return Err(VideoError::Unsupported("SetGammaRamp"));
        }
        let index = self.current_display;
        self.ensure_gamma(index)?;

        let display = self.displays.display_mut(index)?;
        let ramp = display.gamma.get_or_insert_with(Box::default);
        if let Some(red) = red {
            ramp.red = *red;
        }
        if let Some(green) = green {
            ramp.green = *green;
        }
        if let Some(blue) = blue {
            ramp.blue = *blue;
        }

        let ramp = ramp.clone();
        self.backend
            .gamma()
            .ok_or(VideoError::Unsupported("SetGammaRamp"))?
            .set_gamma_ramp(index, &ramp)
    }

    /// The current display's gamma ramp.
    pub fn gamma_ramp(&mut self) -> VideoResult<GammaRamp> {
        let index = self.current_display;
        self.ensure_gamma(index)?;
        Ok(self
            .displays
            .display(index)?
            .gamma
            .as_deref()
            .cloned()
            .unwrap_or_default())
    }

    /// Build and apply power-curve ramps for the current display.
    pub fn set_gamma(&mut self, red: f32, green: f32, blue: f32) -> VideoResult<()> {
        let ramp = GammaRamp::from_gamma(red, green, blue);
        self.set_gamma_ramp(Some(&ramp.red), Some(&ramp.green), Some(&ramp.blue))
    }

    /// Estimated per-channel gamma of the current display.
    pub fn gamma(&mut self) -> VideoResult<(f32, f32, f32)> {
        let ramp = self.gamma_ramp()?;
        Ok((
            calculate_gamma_from_ramp(&ramp.red),
            calculate_gamma_from_ramp(&ramp.green),
            calculate_gamma_from_ramp(&ramp.blue),
        ))
    }

    fn ensure_gamma(&mut self, index: usize) -> VideoResult<()> {
        if self.displays.display(index)?.gamma.is_some() {
            return Ok(());
        }
        let initial = self
            .backend
            .gamma()
            .and_then(|gamma| gamma.gamma_ramp(index))
            .unwrap_or_default();
        let display = self.displays.display_mut(index)?;
        display.saved_gamma = Some(Box::new(initial.clone()));
        display.gamma = Some(Box::new(initial));
        Ok(())
    }

    /// Put the display's own ramp back in hardware.
    pub(crate) fn reapply_gamma(&mut self, index: usize) {
        let Some(ramp) = self
            .displays
            .get(index)
            .and_then(|display| display.gamma.as_deref().cloned())
        else {
            return;
        };
        if let Some(gamma) = self.backend.gamma() {
            if let Err(err) = gamma.set_gamma_ramp(index, &ramp) {
                warn!("Couldn't reapply gamma ramp: {}", err);
            }
        }
    }

    /// Put the ramp found at allocation time back in hardware.
    pub(crate) fn restore_saved_gamma(&mut self, index: usize) {
        let Some(ramp) = self.displays.get(index).and_then(|display| {
            display
                .gamma
                .as_ref()
                .and(display.saved_gamma.as_deref().cloned())
        }) else {
            return;
        };
        if let Some(gamma) = self.backend.gamma() {
            if let Err(err) = gamma.set_gamma_ramp(index, &ramp) {
                warn!("Couldn't restore gamma ramp: {}", err);
            }
        }
    }
}
