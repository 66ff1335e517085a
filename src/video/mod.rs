//!
//! Video core: drivers, displays, modes and windows.
//!
//! A platform backend implements [`VideoBackend`] and is registered in a
//! [`DriverRegistry`]. [`VideoDevice::init`] selects one and everything else
//! hangs off the resulting device.
//!

pub mod backend;
pub mod bootstrap;
pub mod device;
pub mod display;
pub mod gamma;
pub mod gl;
pub mod mode;
pub mod window;

pub use backend::{GammaBackend, GlBackend, ModeBackend, PaletteBackend, VideoBackend, WindowBackend};
pub use bootstrap::{DriverRegistry, VideoBootstrap};
pub use device::{EventThreadPolicy, InitFlags, VideoDevice};
pub use display::{DisplayList, VideoDisplay};
pub use gamma::GammaRamp;
pub use gl::{GlAttr, GlConfig, GlContext};
pub use mode::DisplayMode;
pub use window::{Window, WindowFlags, WindowId, WINDOWPOS_CENTERED, WINDOWPOS_UNDEFINED};
