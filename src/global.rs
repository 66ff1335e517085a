//!
//! Process-wide video device handle.
//!
//! Callers that want one ambient device instead of passing a
//! [`VideoDevice`] around use [`VIDEO`]. The handle holds at most one
//! device at a time.
//!

use std::sync::LazyLock;

use log::info;
use parking_lot::Mutex;

use crate::error::{VideoError, VideoResult};
use crate::events::EventSink;
use crate::video::bootstrap::DriverRegistry;
use crate::video::device::{InitFlags, VideoDevice};

pub static VIDEO: LazyLock<Mutex<Option<VideoDevice>>> = LazyLock::new(|| Mutex::new(None));

/// Bring up a device in the global handle.
///
/// A device already held there is shut down first.
pub fn video_init(
    registry: &DriverRegistry,
    driver_name: Option<&str>,
    flags: InitFlags,
    events: Box<dyn EventSink>,
) -> VideoResult<()> {
    let mut video = VIDEO.lock();
    if let Some(old) = video.take() {
        info!("Replacing active video device '{}'", old.current_driver());
        old.quit();
    }
    *video = Some(VideoDevice::init(registry, driver_name, flags, events)?);
    Ok(())
}

/// Shut the global device down. Does nothing when none is active.
pub fn video_quit() {
    if let Some(device) = VIDEO.lock().take() {
        device.quit();
    }
}

#[must_use]
pub fn is_initialized() -> bool {
    VIDEO.lock().is_some()
}

/// Run `f` against the global device.
pub fn with_video<T>(f: impl FnOnce(&mut VideoDevice) -> VideoResult<T>) -> VideoResult<T> {
    let mut video = VIDEO.lock();
    let device = video.as_mut().ok_or(VideoError::NotInitialized)?;
    f(device)
}
