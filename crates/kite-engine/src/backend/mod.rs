//! GPU abstraction consumed by graphics resources.
//!
//! Resources never talk to a graphics API directly; they hold opaque
//! [`TextureId`] handles and go through [`GraphicsBackend`]. Two backends ship
//! with the engine:
//! - [`WgpuBackend`]: real GPU rendering via wgpu
//! - [`HeadlessBackend`]: CPU bookkeeping, for tests and tooling

mod headless;
mod wgpu_backend;

use std::num::NonZeroU32;

use crate::graphics::{Filter, PixelFormat, Result, Wrap};
use crate::math::{Transform, Vertex};

pub use headless::{DrawRecord, HeadlessBackend};
pub use wgpu_backend::WgpuBackend;

/// Opaque handle to a backend texture. Never zero.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(NonZeroU32);

impl TextureId {
    #[inline]
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

/// Monotonic handle allocator shared by backends.
#[derive(Debug)]
pub(crate) struct TextureIds {
    next: u32,
}

impl Default for TextureIds {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl TextureIds {
    pub(crate) fn allocate(&mut self) -> Result<TextureId> {
        let id = NonZeroU32::new(self.next).ok_or(crate::graphics::GraphicsError::OutOfMemory)?;
        self.next = self.next.wrapping_add(1);
        Ok(TextureId(id))
    }
}

/// How a texture will be used.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TextureKind {
    /// Sampled only; contents come from uploads.
    Sampled,
    /// Sampled and renderable; `msaa` is the sample count (1 = none).
    RenderTarget { msaa: u32 },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TextureDesc {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub kind: TextureKind,
}

/// Integer pixel rectangle, top-left origin.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PixelRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRegion {
    #[inline]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    #[inline]
    pub const fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Whether the region is non-empty and lies within a `width × height` texture.
    pub fn fits(&self, width: u32, height: u32) -> bool {
        self.width > 0
            && self.height > 0
            && self.x.checked_add(self.width).is_some_and(|r| r <= width)
            && self.y.checked_add(self.height).is_some_and(|b| b <= height)
    }
}

/// Graphics API operations needed by textures and render targets.
///
/// All calls happen on the thread owning the graphics context.
pub trait GraphicsBackend {
    /// Whether textures may have non-power-of-two dimensions.
    fn supports_npot(&self) -> bool;

    fn max_texture_size(&self) -> u32;

    /// Size of the default (screen) render target in pixels.
    fn screen_size(&self) -> (u32, u32);

    /// Largest supported sample count `<= requested` for `format` (at least 1).
    fn supported_msaa(&self, format: PixelFormat, requested: u32) -> u32;

    fn supports_canvas_format(&self, format: PixelFormat) -> bool;

    /// Allocates an uninitialized (zeroed) texture.
    fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureId>;

    /// Frees a texture. Unknown handles are ignored.
    fn delete_texture(&mut self, id: TextureId);

    /// Uploads RGBA8 `pixels` into `region` of texture `id`.
    fn write_texture(&mut self, id: TextureId, region: PixelRegion, pixels: &[u8]) -> Result<()>;

    fn set_filter(&mut self, id: TextureId, filter: Filter);

    /// Live filter of `id`; `None` for unknown handles.
    fn filter(&self, id: TextureId) -> Option<Filter>;

    fn set_wrap(&mut self, id: TextureId, wrap: Wrap);

    /// Live wrap of `id`; `None` for unknown handles.
    fn wrap(&self, id: TextureId) -> Option<Wrap>;

    /// Redirects drawing into `targets`; an empty slice selects the screen.
    fn set_render_targets(&mut self, targets: &[TextureId]) -> Result<()>;

    /// Clears the active render targets to a linear RGBA color.
    fn clear(&mut self, color: [f32; 4]);

    /// Draws a textured quad into the active render targets.
    fn draw_quad(&mut self, texture: TextureId, transform: &Transform, vertices: &[Vertex; 4]);

    /// Reads RGBA8 texels back from `region` of texture `id`.
    fn read_pixels(&mut self, id: TextureId, region: PixelRegion) -> Result<Vec<u8>>;

    /// Reads the whole screen as RGBA8, top row first.
    fn read_screen(&mut self) -> Result<Vec<u8>>;

    /// Submits pending work.
    fn flush(&mut self);
}
