//!
//! Error types for the video core.
//!
//! Every public entry point reports failure through [`VideoError`]. Backends
//! report their own failures as [`VideoError::Backend`] and the core passes
//! them through untouched.
//!

use crate::video::window::WindowId;

/// Errors reported by the video core and its backends.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VideoError {
    /// No video device is active.
    #[error("Video subsystem has not been initialized")]
    NotInitialized,

    /// An index argument fell outside the valid range.
    #[error("{what} index {index} out of range (count: {count})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        count: usize,
    },

    /// The named driver is unknown or unavailable.
    #[error("{0} not available")]
    DriverNotAvailable(String),

    /// No registered driver could be started.
    #[error("No available video device")]
    NoAvailableDevice,

    /// The backend finished initialization without adding a display.
    #[error("The video driver did not add any displays")]
    NoDisplays,

    /// The OS forbids a dedicated event thread.
    #[error("OS doesn't support threaded events")]
    ThreadedEventsUnsupported,

    /// The event loop could not be started.
    #[error("Event loop failed: {0}")]
    EventLoop(String),

    /// No window with this id exists.
    #[error("Invalid window id {0}")]
    InvalidWindow(WindowId),

    /// No texture with this id exists on the current display.
    #[error("Invalid texture id {0}")]
    InvalidTexture(u32),

    /// The window has no renderer, or no renderer is selected.
    #[error("No renderer available")]
    InvalidRenderer,

    /// No render driver satisfies the requested flags.
    #[error("Couldn't find matching render driver")]
    NoMatchingRenderDriver,

    /// No display mode is large enough for the request.
    #[error("No video mode large enough for {w}x{h}")]
    NoModeLargeEnough { w: i32, h: i32 },

    /// The current display mode has no palette.
    #[error("Display mode does not have a palette")]
    NoPalette,

    /// Palette indices are out of range.
    #[error("Palette indices are out of range")]
    PaletteRange,

    /// The pixel format has no mask description.
    #[error("Unknown pixel format")]
    UnknownPixelFormat,

    /// The GL attribute value is not recognized.
    #[error("Unknown OpenGL attribute")]
    UnknownGlAttribute,

    /// The backend supports GL but no library has been loaded yet.
    #[error("No GL driver has been loaded")]
    GlNotLoaded,

    /// The backend has no dynamic GL support at all.
    #[error("No dynamic GL support in video driver")]
    NoDynamicGl,

    /// The backend or renderer does not implement this capability.
    #[error("{0} not supported")]
    Unsupported(&'static str),

    /// An argument is malformed or does not fit its target.
    #[error("Parameter '{0}' is invalid")]
    InvalidParam(&'static str),

    /// The id counter has run out.
    #[error("Out of object ids")]
    IdsExhausted,

    /// Allocation failed.
    #[error("Out of memory")]
    OutOfMemory,

    /// A backend reported a failure of its own.
    #[error("{0}")]
    Backend(String),
}

/// Result type for video operations.
pub type VideoResult<T> = Result<T, VideoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            VideoError::NotInitialized.to_string(),
            "Video subsystem has not been initialized"
        );
        assert_eq!(
            VideoError::DriverNotAvailable("x11".into()).to_string(),
            "x11 not available"
        );
        assert_eq!(
            VideoError::NoModeLargeEnough { w: 4000, h: 3000 }.to_string(),
            "No video mode large enough for 4000x3000"
        );
        assert_eq!(
            VideoError::Unsupported("SetWindowGrab").to_string(),
            "SetWindowGrab not supported"
        );
        assert_eq!(
            VideoError::InvalidParam("rect").to_string(),
            "Parameter 'rect' is invalid"
        );
    }

    #[test]
    fn test_backend_error_passthrough() {
        let err = VideoError::Backend("XOpenDisplay failed".into());
        assert_eq!(err.to_string(), "XOpenDisplay failed");
    }
}
