use std::sync::Arc;

use crate::backend::{GraphicsBackend, PixelRegion, TextureDesc, TextureId, TextureKind};
use crate::math::{DrawParams, Transform, Vertex, next_power_of_two};

use super::release::ReleaseQueue;
use super::texture::TextureSlot;
use super::volatile::Volatile;
use super::{
    Filter, GraphicsConfig, ImageData, PixelFormat, Quad, Result, Texture, TextureSettings, Wrap,
};

/// GPU texture backed by shared [`ImageData`].
///
/// The pixel data is retained for the lifetime of the image so the texture
/// can be rebuilt after context loss. Dropping the image releases the pixel
/// data and queues the texture for deletion.
pub struct Image {
    data: Arc<ImageData>,
    width: f32,
    height: f32,

    /// Top-left, bottom-left, bottom-right, top-right.
    vertices: [Vertex; 4],

    /// Texture-coordinate extent of the pixel data inside the allocated
    /// texture. Below 1.0 when padded to a power of two.
    uv_extent: [f32; 2],

    slot: TextureSlot,
}

impl std::fmt::Debug for Image {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Image")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("handle", &self.slot.handle())
            .finish()
    }
}

impl Image {
    pub(crate) fn new(data: Arc<ImageData>, config: &GraphicsConfig, releases: ReleaseQueue) -> Self {
        let width = data.width() as f32;
        let height = data.height() as f32;
        let settings = TextureSettings { filter: config.default_filter, wrap: Wrap::default() };

        Self {
            data,
            width,
            height,
            vertices: Vertex::rect(width, height, 0.0, 0.0, 1.0, 1.0),
            uv_extent: [1.0, 1.0],
            slot: TextureSlot::new(settings, releases),
        }
    }

    #[inline]
    pub fn data(&self) -> &Arc<ImageData> {
        &self.data
    }

    #[inline]
    pub fn dimensions(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    #[inline]
    pub fn vertices(&self) -> &[Vertex; 4] {
        &self.vertices
    }

    /// Allocates the texture and uploads the pixel data.
    ///
    /// Without NPOT support the texture is padded to the next power of two in
    /// each dimension, the pixels land in its top-left corner and the cached
    /// texture coordinates shrink to cover only that corner. Persisted filter
    /// and wrap settings are re-applied.
    pub fn load(&mut self, backend: &mut dyn GraphicsBackend) -> Result<()> {
        if self.slot.handle().is_some() {
            self.unload(backend);
        }

        let (w, h) = (self.data.width(), self.data.height());
        let (tex_w, tex_h) = if backend.supports_npot() {
            (w, h)
        } else {
            (next_power_of_two(w), next_power_of_two(h))
        };

        let id = backend.create_texture(&TextureDesc {
            width: tex_w,
            height: tex_h,
            format: PixelFormat::Rgba8,
            kind: TextureKind::Sampled,
        })?;

        if let Err(err) = backend.write_texture(id, PixelRegion::full(w, h), self.data.pixels()) {
            backend.delete_texture(id);
            return Err(err);
        }

        let s = w as f32 / tex_w as f32;
        let t = h as f32 / tex_h as f32;
        self.vertices[1].t = t;
        self.vertices[2].t = t;
        self.vertices[2].s = s;
        self.vertices[3].s = s;
        self.uv_extent = [s, t];

        self.slot.attach(backend, id);

        if tex_w != w || tex_h != h {
            log::debug!("image {w}x{h} padded to {tex_w}x{tex_h} (texture {})", id.get());
        } else {
            log::trace!("image {w}x{h} loaded (texture {})", id.get());
        }
        Ok(())
    }

    /// Frees the texture, remembering its current filter and wrap. Idempotent.
    pub fn unload(&mut self, backend: &mut dyn GraphicsBackend) {
        self.slot.release(backend);
    }

    /// Rebuilds the texture from the retained pixel data.
    pub fn reload(&mut self, backend: &mut dyn GraphicsBackend) -> Result<()> {
        self.unload(backend);
        self.load(backend)
    }

    /// Pulls a requested sub-rectangle inside the image bounds.
    ///
    /// The far edge is clamped first by shifting the origin back, then the
    /// origin is clamped at zero.
    pub fn clamp_rectangle(&self, x: i32, y: i32, w: i32, h: i32) -> (i32, i32) {
        let (iw, ih) = (self.width as i32, self.height as i32);

        let x = if x.saturating_add(w) > iw { iw - w } else { x };
        let y = if y.saturating_add(h) > ih { ih - h } else { y };

        (x.max(0), y.max(0))
    }

    /// Vertices for drawing the `w × h` region at `(x, y)` of this image.
    pub fn rectangle_vertices(&self, x: i32, y: i32, w: i32, h: i32) -> [Vertex; 4] {
        let (x, y) = self.clamp_rectangle(x, y, w, h);

        let tx = x as f32 / self.width;
        let ty = y as f32 / self.height;
        let tw = w as f32 / self.width;
        let th = h as f32 / self.height;

        self.scale_uv(Vertex::rect(w as f32, h as f32, tx, ty, tx + tw, ty + th))
    }

    /// Maps 0..1 image-relative texture coordinates into the allocated texture.
    fn scale_uv(&self, vertices: [Vertex; 4]) -> [Vertex; 4] {
        let [su, sv] = self.uv_extent;
        vertices.map(|v| Vertex::new(v.x, v.y, v.s * su, v.t * sv))
    }
}

impl Texture for Image {
    fn width(&self) -> f32 {
        self.width
    }

    fn height(&self) -> f32 {
        self.height
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
        let Some(id) = self.slot.handle() else {
            log::trace!("skipping draw of unloaded image");
            return;
        };
        backend.draw_quad(id, &Transform::from_params(params), &self.vertices);
    }

    fn draw_quad(&self, backend: &mut dyn GraphicsBackend, quad: &Quad, params: &DrawParams) {
        let Some(id) = self.slot.handle() else {
            log::trace!("skipping quad draw of unloaded image");
            return;
        };
        let vertices = self.scale_uv(*quad.vertices());
        backend.draw_quad(id, &Transform::from_params(params), &vertices);
    }
}

impl Volatile for Image {
    fn load(&mut self, backend: &mut dyn GraphicsBackend) -> Result<()> {
        Image::load(self, backend)
    }

    fn unload(&mut self, backend: &mut dyn GraphicsBackend) {
        Image::unload(self, backend);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessBackend;
    use crate::graphics::{FilterMode, WrapMode};

    fn image(w: u32, h: u32) -> Image {
        let data = Arc::new(ImageData::new(w, h).unwrap());
        Image::new(data, &GraphicsConfig::default(), ReleaseQueue::default())
    }

    // ── load / unload ─────────────────────────────────────────────────────

    #[test]
    fn load_then_unload_clears_handle() {
        let mut backend = HeadlessBackend::new();
        for (w, h) in [(1, 1), (3, 7), (64, 64), (100, 30)] {
            let mut img = image(w, h);
            img.load(&mut backend).unwrap();
            assert!(img.is_loaded());
            img.unload(&mut backend);
            assert_eq!(img.handle(), None);
        }
        assert_eq!(backend.live_textures(), 0);
    }

    #[test]
    fn unload_is_idempotent() {
        let mut backend = HeadlessBackend::new();
        let mut img = image(4, 4);
        img.unload(&mut backend);
        img.load(&mut backend).unwrap();
        img.unload(&mut backend);
        img.unload(&mut backend);
        assert_eq!(img.handle(), None);
    }

    #[test]
    fn loading_twice_does_not_leak() {
        let mut backend = HeadlessBackend::new();
        let mut img = image(4, 4);
        img.load(&mut backend).unwrap();
        img.load(&mut backend).unwrap();
        assert_eq!(backend.live_textures(), 1);
    }

    // ── power-of-two padding ──────────────────────────────────────────────

    #[test]
    fn npot_backend_keeps_native_size_and_full_uv() {
        let mut backend = HeadlessBackend::new();
        let mut img = image(100, 30);
        img.load(&mut backend).unwrap();

        let desc = backend.texture_desc(img.handle().unwrap()).unwrap();
        assert_eq!((desc.width, desc.height), (100, 30));

        let v = img.vertices();
        assert_eq!((v[0].s, v[0].t), (0.0, 0.0));
        assert_eq!((v[1].s, v[1].t), (0.0, 1.0));
        assert_eq!((v[2].s, v[2].t), (1.0, 1.0));
        assert_eq!((v[3].s, v[3].t), (1.0, 0.0));
    }

    #[test]
    fn pot_backend_pads_and_shrinks_far_coordinates() {
        let mut backend = HeadlessBackend::new().power_of_two_only();
        let mut img = image(100, 30);
        img.load(&mut backend).unwrap();

        let desc = backend.texture_desc(img.handle().unwrap()).unwrap();
        assert_eq!((desc.width, desc.height), (128, 32));

        let s = 100.0 / 128.0;
        let t = 30.0 / 32.0;
        let v = img.vertices();
        assert_eq!((v[0].s, v[0].t), (0.0, 0.0));
        assert_eq!((v[1].s, v[1].t), (0.0, t));
        assert_eq!((v[2].s, v[2].t), (s, t));
        assert_eq!((v[3].s, v[3].t), (s, 0.0));
        // positions stay at native size
        assert_eq!((v[2].x, v[2].y), (100.0, 30.0));
    }

    #[test]
    fn pot_upload_lands_in_top_left_corner() {
        let mut backend = HeadlessBackend::new().power_of_two_only();
        let px = vec![7u8; 3 * 3 * 4];
        let data = Arc::new(ImageData::from_pixels(3, 3, px).unwrap());
        let mut img = Image::new(data, &GraphicsConfig::default(), ReleaseQueue::default());
        img.load(&mut backend).unwrap();

        let tex = backend.texture_pixels(img.handle().unwrap()).unwrap();
        let stride = 4 * 4;
        assert_eq!(&tex[..12], &[7u8; 12]);
        assert_eq!(&tex[12..16], &[0u8; 4]);
        assert_eq!(&tex[3 * stride..3 * stride + 4], &[0u8; 4]);
    }

    // ── filter / wrap ─────────────────────────────────────────────────────

    #[test]
    fn default_filter_comes_from_config() {
        let mut backend = HeadlessBackend::new();
        let config = GraphicsConfig {
            default_filter: Filter::uniform(FilterMode::Nearest),
            ..GraphicsConfig::default()
        };
        let data = Arc::new(ImageData::new(2, 2).unwrap());
        let mut img = Image::new(data, &config, ReleaseQueue::default());
        img.load(&mut backend).unwrap();
        assert_eq!(img.filter(&backend), Filter::uniform(FilterMode::Nearest));
        assert_eq!(backend.filter(img.handle().unwrap()), Some(Filter::uniform(FilterMode::Nearest)));
    }

    #[test]
    fn filter_round_trips_without_drift() {
        let mut backend = HeadlessBackend::new();
        let mut img = image(8, 8);
        img.load(&mut backend).unwrap();

        let sequence = [
            Filter::new(FilterMode::Nearest, FilterMode::Linear),
            Filter::uniform(FilterMode::Nearest),
            Filter::new(FilterMode::Linear, FilterMode::Nearest),
            Filter::uniform(FilterMode::Linear),
        ];
        for _ in 0..3 {
            for f in sequence {
                img.set_filter(&mut backend, f);
                assert_eq!(img.filter(&backend), f);
            }
        }
    }

    #[test]
    fn settings_survive_reload() {
        let mut backend = HeadlessBackend::new();
        let mut img = image(8, 8);
        img.load(&mut backend).unwrap();
        img.set_filter(&mut backend, Filter::uniform(FilterMode::Nearest));
        img.set_wrap(&mut backend, Wrap::new(WrapMode::Repeat, WrapMode::MirroredRepeat));

        img.reload(&mut backend).unwrap();

        let id = img.handle().unwrap();
        assert_eq!(backend.filter(id), Some(Filter::uniform(FilterMode::Nearest)));
        assert_eq!(backend.wrap(id), Some(Wrap::new(WrapMode::Repeat, WrapMode::MirroredRepeat)));
    }

    #[test]
    fn settings_set_while_unloaded_apply_on_load() {
        let mut backend = HeadlessBackend::new();
        let mut img = image(8, 8);
        img.set_wrap(&mut backend, Wrap::uniform(WrapMode::Repeat));
        assert_eq!(img.wrap(&backend), Wrap::uniform(WrapMode::Repeat));
        img.load(&mut backend).unwrap();
        assert_eq!(backend.wrap(img.handle().unwrap()), Some(Wrap::uniform(WrapMode::Repeat)));
    }

    // ── rectangle vertices ────────────────────────────────────────────────

    #[test]
    fn rectangle_inside_bounds_is_unchanged() {
        let img = image(64, 32);
        assert_eq!(img.clamp_rectangle(16, 8, 16, 16), (16, 8));
        let v = img.rectangle_vertices(16, 8, 16, 16);
        assert_eq!(v[0], Vertex::new(0.0, 0.0, 0.25, 0.25));
        assert_eq!(v[2], Vertex::new(16.0, 16.0, 0.5, 0.75));
    }

    #[test]
    fn rectangle_is_pulled_back_inside_upper_bound() {
        let img = image(64, 32);
        assert_eq!(img.clamp_rectangle(60, 30, 16, 8), (48, 24));
    }

    #[test]
    fn rectangle_origin_is_never_negative() {
        let img = image(64, 32);
        assert_eq!(img.clamp_rectangle(-5, -1, 8, 8), (0, 0));
        // larger than the image: upper clamp goes negative, lower clamp wins
        assert_eq!(img.clamp_rectangle(10, 10, 100, 100), (0, 0));
    }

    #[test]
    fn clamped_rectangles_stay_in_bounds() {
        let img = image(37, 23);
        for x in -40..60 {
            for w in 1..=37 {
                let (cx, _) = img.clamp_rectangle(x, 0, w, 1);
                assert!(cx >= 0);
                assert!(cx + w <= 37, "x={x} w={w} -> {cx}");
            }
        }
    }

    #[test]
    fn rectangle_uv_accounts_for_padding() {
        let mut backend = HeadlessBackend::new().power_of_two_only();
        let mut img = image(48, 48);
        img.load(&mut backend).unwrap();
        let v = img.rectangle_vertices(0, 0, 48, 48);
        assert_eq!((v[2].s, v[2].t), (48.0 / 64.0, 48.0 / 64.0));
    }

    // ── drawing ───────────────────────────────────────────────────────────

    #[test]
    fn draw_applies_transform_to_cached_vertices() {
        let mut backend = HeadlessBackend::new();
        let mut img = image(10, 20);
        img.load(&mut backend).unwrap();
        img.draw(&mut backend, &DrawParams::at(5.0, 5.0));

        let draws = backend.draws();
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].texture, img.handle().unwrap());
        assert_eq!(draws[0].vertices[2], Vertex::new(15.0, 25.0, 1.0, 1.0));
    }

    #[test]
    fn drawing_unloaded_image_is_a_no_op() {
        let mut backend = HeadlessBackend::new();
        let img = image(10, 20);
        img.draw(&mut backend, &DrawParams::default());
        assert!(backend.draws().is_empty());
    }

    #[test]
    fn drop_queues_texture_for_release() {
        let mut backend = HeadlessBackend::new();
        let releases = ReleaseQueue::default();
        let data = Arc::new(ImageData::new(2, 2).unwrap());
        let mut img = Image::new(data.clone(), &GraphicsConfig::default(), releases.clone());
        img.load(&mut backend).unwrap();
        assert_eq!(Arc::strong_count(&data), 2);

        drop(img);
        assert_eq!(Arc::strong_count(&data), 1);
        assert_eq!(releases.drain_into(&mut backend), 1);
        assert_eq!(backend.live_textures(), 0);
    }
}
