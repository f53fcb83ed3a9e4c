//! Textures, render targets and the graphics context that owns them.
//!
//! [`Graphics`] wraps a [`GraphicsBackend`](crate::backend::GraphicsBackend)
//! and hands out shared [`Image`] and [`Canvas`] resources. Resources keep
//! their CPU-side state (pixel data, sampler settings) so they can be rebuilt
//! after the GPU context is lost.

mod canvas;
mod config;
mod context;
mod error;
mod feature;
mod filter;
mod format;
mod image;
mod image_data;
mod names;
mod quad;
mod release;
mod render_target;
mod texture;
mod volatile;

pub use canvas::Canvas;
pub use config::GraphicsConfig;
pub use context::{CanvasRef, Graphics, ImageRef, SharedGraphics};
pub use error::{GraphicsError, Result};
pub use feature::Feature;
pub use filter::{Filter, FilterMode, TextureSettings, Wrap, WrapMode};
pub use format::PixelFormat;
pub use image::Image;
pub use image_data::{BYTES_PER_PIXEL, ImageData};
pub use quad::Quad;
pub use render_target::RenderTargetGuard;
pub use texture::Texture;
pub use volatile::Volatile;
