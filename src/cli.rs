use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::config::{parse_gamma, parse_mode, VideoConfig};
use crate::logging::LogLevel;

/// Bring up a video driver, list what it offers and draw one frame
#[derive(Parser, Debug)]
#[command(name = "sdlvideo")]
#[command(version)]
#[command(about = "Video driver selection and demonstration", long_about = None)]
pub struct Cli {
    /// Video driver to use (prefix match, e.g. "dum")
    #[arg(short, long, value_name = "NAME")]
    pub driver: Option<String>,

    /// List the registered drivers and exit
    #[arg(long)]
    pub list_drivers: bool,

    /// Display to use
    #[arg(long, value_name = "INDEX")]
    pub display: Option<usize>,

    /// Window size and fullscreen mode (e.g., 640x480 or 640x480@60)
    #[arg(short, long, value_name = "WIDTHxHEIGHT[@HZ]")]
    pub mode: Option<String>,

    /// Open the window fullscreen
    #[arg(short, long)]
    pub fullscreen: bool,

    /// Gamma correction value (default 1.0)
    #[arg(short, long, value_name = "CORRECTIONVALUE")]
    pub gamma: Option<String>,

    /// Pump events on a dedicated thread
    #[arg(long)]
    pub event_thread: bool,

    /// Configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// More log output; repeat for more
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Merge CLI arguments into the loaded configuration
    pub fn merge_into_config(&self, mut config: VideoConfig) -> Result<VideoConfig> {
        if let Some(ref driver) = self.driver {
            config.driver = Some(driver.clone());
        }
        if let Some(display) = self.display {
            config.display = Some(display);
        }
        if let Some(ref mode) = self.mode {
            parse_mode(mode).context("Invalid mode format")?;
            config.fullscreen_mode = Some(mode.clone());
        }
        if let Some(ref gamma) = self.gamma {
            config.gamma = Some(parse_gamma(gamma)?);
        }
        if self.event_thread {
            config.event_thread = true;
        }
        Ok(config)
    }

    pub fn log_level(&self) -> LogLevel {
        match self.verbose {
            0 => LogLevel::Warning,
            1 => LogLevel::Info,
            2 => LogLevel::Debug,
            _ => LogLevel::All,
        }
    }
}
