use std::sync::Arc;

use crate::backend::{GraphicsBackend, PixelRegion, TextureDesc, TextureId, TextureKind};
use crate::math::{DrawParams, Transform, Vertex, is_power_of_two};

use super::release::ReleaseQueue;
use super::texture::TextureSlot;
use super::volatile::Volatile;
use super::{
    Filter, GraphicsConfig, GraphicsError, ImageData, PixelFormat, Quad, Result, Texture,
    TextureSettings, Wrap,
};

/// Off-screen render target.
///
/// Contents are not retained across unload; a reloaded canvas starts cleared.
pub struct Canvas {
    width: u32,
    height: u32,
    format: PixelFormat,
    requested_msaa: u32,
    msaa: u32,
    vertices: [Vertex; 4],
    slot: TextureSlot,
}

impl std::fmt::Debug for Canvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canvas")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("msaa", &self.msaa)
            .field("handle", &self.slot.handle())
            .finish()
    }
}

impl Canvas {
    pub(crate) fn new(
        width: u32,
        height: u32,
        format: PixelFormat,
        msaa: u32,
        config: &GraphicsConfig,
        releases: ReleaseQueue,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(GraphicsError::invalid(format!(
                "canvas dimensions must be positive (got {width}x{height})"
            )));
        }
        let settings = TextureSettings { filter: config.default_filter, wrap: Wrap::default() };

        Ok(Self {
            width,
            height,
            format,
            requested_msaa: msaa.max(1),
            msaa: 1,
            vertices: Vertex::rect(width as f32, height as f32, 0.0, 0.0, 1.0, 1.0),
            slot: TextureSlot::new(settings, releases),
        })
    }

    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Sample count actually in use (1 = no multisampling).
    #[inline]
    pub fn msaa(&self) -> u32 {
        self.msaa
    }

    /// Allocates the render target. Canvases are never padded, so backends
    /// without NPOT support reject non-power-of-two sizes.
    pub fn load(&mut self, backend: &mut dyn GraphicsBackend) -> Result<()> {
        if self.slot.handle().is_some() {
            self.unload(backend);
        }

        if !backend.supports_canvas_format(self.format) {
            return Err(GraphicsError::UnsupportedFormat(format!("{} canvas", self.format)));
        }
        if !backend.supports_npot() && !(is_power_of_two(self.width) && is_power_of_two(self.height)) {
            return Err(GraphicsError::UnsupportedFormat(format!(
                "non-power-of-two canvas ({}x{})",
                self.width, self.height
            )));
        }

        let msaa = backend.supported_msaa(self.format, self.requested_msaa);
        if msaa != self.requested_msaa {
            log::debug!("canvas msaa {} not available, using {msaa}", self.requested_msaa);
        }

        let id = backend.create_texture(&TextureDesc {
            width: self.width,
            height: self.height,
            format: self.format,
            kind: TextureKind::RenderTarget { msaa },
        })?;

        self.msaa = msaa;
        self.slot.attach(backend, id);
        log::trace!(
            "canvas {}x{} {} loaded (texture {})",
            self.width,
            self.height,
            self.format,
            id.get()
        );
        Ok(())
    }

    /// Frees the render target. Idempotent.
    pub fn unload(&mut self, backend: &mut dyn GraphicsBackend) {
        self.slot.release(backend);
    }

    /// Reads back the `w × h` region at `(x, y)` into new pixel data.
    pub fn new_image_data(
        &self,
        backend: &mut dyn GraphicsBackend,
        x: i64,
        y: i64,
        w: i64,
        h: i64,
    ) -> Result<Arc<ImageData>> {
        let region = self.checked_region(x, y, w, h)?;
        if !self.format.is_rgba8() {
            return Err(GraphicsError::UnsupportedFormat(format!(
                "reading back a {} canvas",
                self.format
            )));
        }
        let id = self
            .slot
            .handle()
            .ok_or_else(|| GraphicsError::InvalidOperation("canvas is not loaded".into()))?;

        backend.flush();
        let pixels = backend.read_pixels(id, region)?;
        Ok(Arc::new(ImageData::from_pixels(region.width, region.height, pixels)?))
    }

    fn checked_region(&self, x: i64, y: i64, w: i64, h: i64) -> Result<PixelRegion> {
        let in_bounds = x >= 0
            && y >= 0
            && w > 0
            && h > 0
            && x.checked_add(w).is_some_and(|r| r <= i64::from(self.width))
            && y.checked_add(h).is_some_and(|b| b <= i64::from(self.height));

        if !in_bounds {
            return Err(GraphicsError::invalid(format!(
                "invalid image data rectangle {x},{y} {w}x{h} for a {}x{} canvas",
                self.width, self.height
            )));
        }
        Ok(PixelRegion::new(x as u32, y as u32, w as u32, h as u32))
    }
}

impl Texture for Canvas {
    fn width(&self) -> f32 {
        self.width as f32
    }

    fn height(&self) -> f32 {
        self.height as f32
    }

    fn handle(&self) -> Option<TextureId> {
        self.slot.handle()
    }

    fn set_filter(&mut self, backend: &mut dyn GraphicsBackend, filter: Filter) {
        self.slot.set_filter(backend, filter);
    }

    fn filter(&self, backend: &dyn GraphicsBackend) -> Filter {
        self.slot.filter(backend)
    }

    fn set_wrap(&mut self, backend: &mut dyn GraphicsBackend, wrap: Wrap) {
        self.slot.set_wrap(backend, wrap);
    }

    fn wrap(&self, backend: &dyn GraphicsBackend) -> Wrap {
        self.slot.wrap(backend)
    }

    fn draw(&self, backend: &mut dyn GraphicsBackend, params: &DrawParams) {
        let Some(id) = self.slot.handle() else { return };
        backend.draw_quad(id, &Transform::from_params(params), &self.vertices);
    }

    fn draw_quad(&self, backend: &mut dyn GraphicsBackend, quad: &Quad, params: &DrawParams) {
        let Some(id) = self.slot.handle() else { return };
        backend.draw_quad(id, &Transform::from_params(params), quad.vertices());
    }
}

impl Volatile for Canvas {
    fn load(&mut self, backend: &mut dyn GraphicsBackend) -> Result<()> {
        Canvas::load(self, backend)
    }

    fn unload(&mut self, backend: &mut dyn GraphicsBackend) {
        Canvas::unload(self, backend);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessBackend;

    fn canvas(w: u32, h: u32, format: PixelFormat, msaa: u32) -> Canvas {
        Canvas::new(w, h, format, msaa, &GraphicsConfig::default(), ReleaseQueue::default()).unwrap()
    }

    #[test]
    fn full_readback_covers_whole_canvas() {
        let mut backend = HeadlessBackend::new();
        let mut c = canvas(12, 5, PixelFormat::Normal, 1);
        c.load(&mut backend).unwrap();

        let data = c.new_image_data(&mut backend, 0, 0, 12, 5).unwrap();
        assert_eq!((data.width(), data.height()), (12, 5));
        assert_eq!(data.pixels().len(), 12 * 5 * 4);
    }

    #[test]
    fn readback_sees_cleared_color() {
        let mut backend = HeadlessBackend::new();
        let mut c = canvas(4, 4, PixelFormat::Normal, 1);
        c.load(&mut backend).unwrap();
        backend.set_render_targets(&[c.handle().unwrap()]).unwrap();
        backend.clear([0.0, 1.0, 0.0, 1.0]);

        let data = c.new_image_data(&mut backend, 1, 1, 2, 2).unwrap();
        assert_eq!(data.pixel(1, 1), Some([0, 255, 0, 255]));
    }

    #[test]
    fn readback_rejects_out_of_bounds_rectangles() {
        let mut backend = HeadlessBackend::new();
        let mut c = canvas(8, 8, PixelFormat::Normal, 1);
        c.load(&mut backend).unwrap();

        let cases = [
            (-1, 0, 4, 4),
            (0, 0, 9, 1),
            (4, 4, 5, 4),
            (0, 0, 0, 4),
            (i64::MAX, 0, 1, 1),
            (0, i64::MAX, 1, 1),
            (1, 1, i64::MAX, 1),
        ];
        for (x, y, w, h) in cases {
            let err = c.new_image_data(&mut backend, x, y, w, h).unwrap_err();
            assert!(matches!(err, GraphicsError::InvalidArgument(_)), "{x},{y} {w}x{h}");
        }
    }

    #[test]
    fn readback_requires_rgba8() {
        let mut backend = HeadlessBackend::new();
        let mut c = canvas(8, 8, PixelFormat::Hdr, 1);
        c.load(&mut backend).unwrap();
        let err = c.new_image_data(&mut backend, 0, 0, 8, 8).unwrap_err();
        assert!(matches!(err, GraphicsError::UnsupportedFormat(_)));
    }

    #[test]
    fn msaa_is_clamped_to_backend_support() {
        let mut backend = HeadlessBackend::new().with_max_msaa(4);
        let mut c = canvas(8, 8, PixelFormat::Normal, 16);
        c.load(&mut backend).unwrap();
        assert_eq!(c.msaa(), 4);
        assert_eq!(
            backend.texture_desc(c.handle().unwrap()).unwrap().kind,
            TextureKind::RenderTarget { msaa: 4 }
        );
    }

    #[test]
    fn unsupported_format_fails_to_load() {
        let mut backend = HeadlessBackend::new();
        let mut c = canvas(8, 8, PixelFormat::Rgb565, 1);
        assert!(matches!(c.load(&mut backend), Err(GraphicsError::UnsupportedFormat(_))));
        assert!(!c.is_loaded());
    }

    #[test]
    fn npot_canvas_needs_npot_support() {
        let mut backend = HeadlessBackend::new().power_of_two_only();
        assert!(canvas(100, 64, PixelFormat::Normal, 1).load(&mut backend).is_err());
        assert!(canvas(128, 64, PixelFormat::Normal, 1).load(&mut backend).is_ok());
    }

    #[test]
    fn zero_sized_canvas_is_rejected() {
        let r = Canvas::new(0, 8, PixelFormat::Normal, 1, &GraphicsConfig::default(), ReleaseQueue::default());
        assert!(r.is_err());
    }
}
