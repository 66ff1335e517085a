use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::VideoError;
use crate::pixels::PixelFormat;
use crate::video::device::VideoDevice;
use crate::video::gl::GlConfig;
use crate::video::mode::DisplayMode;

/// Video settings read from a TOML file and merged with the command line.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Requested driver name; the first available driver when unset.
    pub driver: Option<String>,
    pub event_thread: bool,
    /// Display to make current after initialization.
    pub display: Option<usize>,
    /// `WIDTHxHEIGHT` or `WIDTHxHEIGHT@HZ`.
    pub fullscreen_mode: Option<String>,
    /// Uniform gamma applied to the current display.
    pub gamma: Option<f32>,
    pub gl: GlConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

/// Load settings from `path`, or the defaults when there is none.
pub fn load_config(path: Option<&Path>) -> Result<VideoConfig> {
    let Some(path) = path else {
        return Ok(VideoConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: VideoConfig = toml::from_str(&text)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    debug!("Loaded video config from {}", path.display());
    Ok(config)
}

/// Parse a resolution string in the format "WIDTHxHEIGHT"
pub fn parse_resolution(s: &str) -> Result<Resolution> {
    let parts: Vec<&str> = s.split('x').collect();
    if parts.len() != 2 {
        anyhow::bail!("Resolution must be in WIDTHxHEIGHT format");
    }

    let width: u32 = parts[0].parse().context("Invalid width value")?;
    let height: u32 = parts[1].parse().context("Invalid height value")?;

    if width == 0 || height == 0 {
        anyhow::bail!("Resolution values must be positive");
    }

    Ok(Resolution { width, height })
}

/// Parse "WIDTHxHEIGHT[@HZ]" into a mode request with an unspecified
/// format. A missing refresh rate is left as zero.
pub fn parse_mode(s: &str) -> Result<DisplayMode> {
    let (resolution, refresh) = match s.split_once('@') {
        Some((resolution, refresh)) => (
            resolution,
            refresh.parse::<u32>().context("Invalid refresh rate")?,
        ),
        None => (s, 0),
    };
    let Resolution { width, height } = parse_resolution(resolution)?;
    Ok(DisplayMode::new(
        PixelFormat::UNKNOWN,
        i32::try_from(width).context("Width too large")?,
        i32::try_from(height).context("Height too large")?,
        i32::try_from(refresh).context("Refresh rate too large")?,
    ))
}

/// Parse a gamma correction value
pub fn parse_gamma(s: &str) -> Result<f32> {
    let gamma: f32 = s.parse().context("Invalid gamma value")?;
    check_gamma(gamma)
}

fn check_gamma(gamma: f32) -> Result<f32> {
    const MIN_GAMMA: f32 = 0.03;
    const MAX_GAMMA: f32 = 9.9;

    if !(MIN_GAMMA..=MAX_GAMMA).contains(&gamma) {
        anyhow::bail!("Gamma correction value out of range (0.03 to 9.9)");
    }
    Ok(gamma)
}

impl VideoConfig {
    /// Stage GL attributes, pick the display, choose the fullscreen mode
    /// and set the gamma on an initialized device.
    ///
    /// A driver without gamma support only earns a warning.
    pub fn apply(&self, device: &mut VideoDevice) -> Result<()> {
        device.gl_stage_config(&self.gl);

        if let Some(display) = self.display {
            let index = i32::try_from(display).context("Display index too large")?;
            device
                .select_display(index)
                .with_context(|| format!("Couldn't select display {}", display))?;
        }

        if let Some(mode) = &self.fullscreen_mode {
            let mode = parse_mode(mode).context("Invalid fullscreen mode")?;
            device
                .set_fullscreen_display_mode(Some(&mode))
                .context("Couldn't set the fullscreen mode")?;
        }

        if let Some(gamma) = self.gamma {
            let gamma = check_gamma(gamma)?;
            match device.set_gamma(gamma, gamma, gamma) {
                Err(VideoError::Unsupported(what)) => {
                    warn!("Ignoring gamma {}: {} not supported by this driver", gamma, what);
                }
                other => other.context("Couldn't set gamma")?,
            }
        }
        Ok(())
    }
}
