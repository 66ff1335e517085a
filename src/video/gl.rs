//!
//! OpenGL attribute staging and GL dispatch.
//!
//! Attributes are collected in a [`GlConfig`] before any GL window or
//! context exists; the backend reads the whole table when it builds a
//! context.
//!

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{VideoError, VideoResult};
use crate::video::backend::GlProc;
use crate::video::device::VideoDevice;
use crate::video::window::{WindowFlags, WindowId};

/// Recognized GL attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum GlAttr {
    RedSize = 0,
    GreenSize = 1,
    BlueSize = 2,
    AlphaSize = 3,
    BufferSize = 4,
    DoubleBuffer = 5,
    DepthSize = 6,
    StencilSize = 7,
    AccumRedSize = 8,
    AccumGreenSize = 9,
    AccumBlueSize = 10,
    AccumAlphaSize = 11,
    Stereo = 12,
    MultisampleBuffers = 13,
    MultisampleSamples = 14,
    AcceleratedVisual = 15,
}

impl TryFrom<i32> for GlAttr {
    type Error = VideoError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::RedSize,
            1 => Self::GreenSize,
            2 => Self::BlueSize,
            3 => Self::AlphaSize,
            4 => Self::BufferSize,
            5 => Self::DoubleBuffer,
            6 => Self::DepthSize,
            7 => Self::StencilSize,
            8 => Self::AccumRedSize,
            9 => Self::AccumGreenSize,
            10 => Self::AccumBlueSize,
            11 => Self::AccumAlphaSize,
            12 => Self::Stereo,
            13 => Self::MultisampleBuffers,
            14 => Self::MultisampleSamples,
            15 => Self::AcceleratedVisual,
            _ => return Err(VideoError::UnknownGlAttribute),
        })
    }
}

/// Staged GL context attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlConfig {
    pub red_size: i32,
    pub green_size: i32,
    pub blue_size: i32,
    pub alpha_size: i32,
    pub buffer_size: i32,
    pub depth_size: i32,
    pub stencil_size: i32,
    pub double_buffer: i32,
    pub accum_red_size: i32,
    pub accum_green_size: i32,
    pub accum_blue_size: i32,
    pub accum_alpha_size: i32,
    pub stereo: i32,
    pub multisample_buffers: i32,
    pub multisample_samples: i32,
    /// -1 means "don't care".
    pub accelerated: i32,
    #[serde(skip)]
    pub driver_loaded: bool,
    #[serde(skip)]
    pub driver_path: Option<String>,
}

impl Default for GlConfig {
    fn default() -> Self {
        Self {
            red_size: 3,
            green_size: 3,
            blue_size: 2,
            alpha_size: 0,
            buffer_size: 0,
            depth_size: 16,
            stencil_size: 0,
            double_buffer: 1,
            accum_red_size: 0,
            accum_green_size: 0,
            accum_blue_size: 0,
            accum_alpha_size: 0,
            stereo: 0,
            multisample_buffers: 0,
            multisample_samples: 0,
            accelerated: -1,
            driver_loaded: false,
            driver_path: None,
        }
    }
}

impl GlConfig {
    /// Store one attribute.
    pub fn set(&mut self, attr: GlAttr, value: i32) {
        *self.slot(attr) = value;
    }

    #[must_use]
    pub fn get(&self, attr: GlAttr) -> i32 {
        match attr {
            GlAttr::RedSize => self.red_size,
            GlAttr::GreenSize => self.green_size,
            GlAttr::BlueSize => self.blue_size,
            GlAttr::AlphaSize => self.alpha_size,
            GlAttr::BufferSize => self.buffer_size,
            GlAttr::DoubleBuffer => self.double_buffer,
            GlAttr::DepthSize => self.depth_size,
            GlAttr::StencilSize => self.stencil_size,
            GlAttr::AccumRedSize => self.accum_red_size,
            GlAttr::AccumGreenSize => self.accum_green_size,
            GlAttr::AccumBlueSize => self.accum_blue_size,
            GlAttr::AccumAlphaSize => self.accum_alpha_size,
            GlAttr::Stereo => self.stereo,
            GlAttr::MultisampleBuffers => self.multisample_buffers,
            GlAttr::MultisampleSamples => self.multisample_samples,
            GlAttr::AcceleratedVisual => self.accelerated,
        }
    }

    fn slot(&mut self, attr: GlAttr) -> &mut i32 {
        match attr {
            GlAttr::RedSize => &mut self.red_size,
            GlAttr::GreenSize => &mut self.green_size,
            GlAttr::BlueSize => &mut self.blue_size,
            GlAttr::AlphaSize => &mut self.alpha_size,
            GlAttr::BufferSize => &mut self.buffer_size,
            GlAttr::DoubleBuffer => &mut self.double_buffer,
            GlAttr::DepthSize => &mut self.depth_size,
            GlAttr::StencilSize => &mut self.stencil_size,
            GlAttr::AccumRedSize => &mut self.accum_red_size,
            GlAttr::AccumGreenSize => &mut self.accum_green_size,
            GlAttr::AccumBlueSize => &mut self.accum_blue_size,
            GlAttr::AccumAlphaSize => &mut self.accum_alpha_size,
            GlAttr::Stereo => &mut self.stereo,
            GlAttr::MultisampleBuffers => &mut self.multisample_buffers,
            GlAttr::MultisampleSamples => &mut self.multisample_samples,
            GlAttr::AcceleratedVisual => &mut self.accelerated,
        }
    }
}

/// Opaque handle to a backend GL context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlContext(pub u64);

impl VideoDevice {
    /// The staged attribute table.
    #[must_use]
    pub fn gl_config(&self) -> &GlConfig {
        &self.gl_config
    }

    /// Stage an attribute given by its raw value.
    pub fn gl_set_attribute(&mut self, attr: i32, value: i32) -> VideoResult<()> {
        let attr = GlAttr::try_from(attr)?;
        self.gl_config.set(attr, value);
        Ok(())
    }

    /// Stage every attribute of `attrs`, keeping the loaded driver state.
    pub fn gl_stage_config(&mut self, attrs: &GlConfig) {
        self.gl_config = GlConfig {
            driver_loaded: self.gl_config.driver_loaded,
            driver_path: self.gl_config.driver_path.take(),
            ..attrs.clone()
        };
    }

    /// Ask the backend what it granted for an attribute.
    pub fn gl_attribute(&mut self, attr: GlAttr) -> VideoResult<i32> {
        self.backend
            .gl()
            .ok_or(VideoError::Unsupported("GL_GetAttribute"))?
            .attribute(attr)
    }

    pub fn gl_load_library(&mut self, path: Option<&str>) -> VideoResult<()> {
        let gl = self.backend.gl().ok_or(VideoError::NoDynamicGl)?;
        gl.load_library(path)?;
        self.gl_config.driver_loaded = true;
        self.gl_config.driver_path = path.map(str::to_owned);
        debug!("Loaded GL library {}", path.unwrap_or("<default>"));
        Ok(())
    }

    /// Look up a GL entry point. `Ok(None)` means the library lacks it.
    pub fn gl_get_proc_address(&mut self, name: &str) -> VideoResult<Option<GlProc>> {
        let loaded = self.gl_config.driver_loaded;
        let gl = self.backend.gl().ok_or(VideoError::NoDynamicGl)?;
        if !loaded {
            return Err(VideoError::GlNotLoaded);
        }
        Ok(gl.get_proc_address(name))
    }

    pub fn gl_create_context(&mut self, window: WindowId) -> VideoResult<GlContext> {
        let Self {
            backend,
            displays,
            gl_config,
            ..
        } = self;
        let window = displays
            .window_mut(window)
            .ok_or(VideoError::InvalidWindow(window))?;
        backend
            .gl()
            .ok_or(VideoError::NoDynamicGl)?
            .create_context(window, gl_config)
    }

    /// Bind `context` to `window`. `None` for both releases the current context.
    pub fn gl_make_current(
        &mut self,
        window: Option<WindowId>,
        context: Option<GlContext>,
    ) -> VideoResult<()> {
        let window = match window {
            Some(id) => Some(
                self.displays
                    .window_mut(id)
                    .ok_or(VideoError::InvalidWindow(id))?,
            ),
            None => None,
        };
        self.backend
            .gl()
            .ok_or(VideoError::NoDynamicGl)?
            .make_current(window, context)
    }

    pub fn gl_set_swap_interval(&mut self, interval: i32) -> VideoResult<()> {
        self.backend
            .gl()
            .ok_or(VideoError::NoDynamicGl)?
            .set_swap_interval(interval)
    }

    pub fn gl_swap_interval(&mut self) -> VideoResult<i32> {
        self.backend
            .gl()
            .ok_or(VideoError::NoDynamicGl)?
            .swap_interval()
    }

    pub fn gl_swap_window(&mut self, window: WindowId) -> VideoResult<()> {
        let target = self
            .displays
            .window_mut(window)
            .ok_or(VideoError::InvalidWindow(window))?;
        if !target.flags.contains(WindowFlags::OPENGL) {
            return Err(VideoError::Unsupported("GL_SwapWindow on a non-OpenGL window"));
        }
        self.backend
            .gl()
            .ok_or(VideoError::NoDynamicGl)?
            .swap_window(target);
        Ok(())
    }

    pub fn gl_delete_context(&mut self, context: GlContext) -> VideoResult<()> {
        self.backend
            .gl()
            .ok_or(VideoError::NoDynamicGl)?
            .delete_context(context);
        Ok(())
    }
}
