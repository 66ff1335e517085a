// SDL-style video core: drivers, displays, windows, renderers and textures

pub mod backends;
pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod global;
pub mod logging;
pub mod pixels;
pub mod rect;
pub mod render;
pub mod video;

pub use cli::Cli;
pub use config::VideoConfig;
pub use error::{VideoError, VideoResult};
pub use events::{Event, EventQueue, EventSink, WindowEventKind};
pub use logging::LogLevel;
pub use pixels::{Color, Palette, PixelFormat};
pub use rect::Rect;
pub use video::{DisplayMode, DriverRegistry, InitFlags, VideoDevice, WindowFlags, WindowId};
