//!
//! Renderers, textures and the software renderer.
//!

pub mod renderer;
pub mod software;
pub mod surface;
pub mod texture;

pub use renderer::{
    BlendMode, RenderDriver, RenderTarget, Renderer, RendererBackend, RendererFlags, RendererId,
    RendererInfo, ScaleMode, TexturePixels,
};
pub use surface::{Surface, SurfaceFlags};
pub use texture::{Texture, TextureAccess, TextureId, TextureTable, TEXTURE_BUCKETS};
