use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::graphics::{Filter, GraphicsError, PixelFormat, Result, Wrap};
use crate::math::{Transform, Vertex};

use super::{GraphicsBackend, PixelRegion, TextureDesc, TextureId, TextureIds, TextureKind};

/// One recorded `draw_quad` call.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    pub texture: TextureId,
    /// Render targets active at the time of the draw (empty = screen).
    pub targets: Vec<TextureId>,
    /// Vertices after the draw transform was applied.
    pub vertices: [Vertex; 4],
}

struct HeadlessTexture {
    desc: TextureDesc,
    pixels: Vec<u8>,
    filter: Filter,
    wrap: Wrap,
}

struct HeadlessState {
    npot: bool,
    max_texture_size: u32,
    max_msaa: u32,
    ids: TextureIds,
    textures: HashMap<TextureId, HeadlessTexture>,
    screen_size: (u32, u32),
    screen: Vec<u8>,
    targets: Vec<TextureId>,
    draws: Vec<DrawRecord>,
    flushes: usize,
}

/// Backend that keeps textures in CPU memory and records draws.
///
/// Clones share state, so a clone kept aside can inspect a backend after it
/// has been handed to [`Graphics`](crate::graphics::Graphics).
#[derive(Clone)]
pub struct HeadlessBackend {
    state: Rc<RefCell<HeadlessState>>,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessBackend {
    /// NPOT-capable backend with a 256×256 screen.
    pub fn new() -> Self {
        Self::with_screen(256, 256)
    }

    pub fn with_screen(width: u32, height: u32) -> Self {
        let state = HeadlessState {
            npot: true,
            max_texture_size: 8192,
            max_msaa: 4,
            ids: TextureIds::default(),
            textures: HashMap::new(),
            screen_size: (width, height),
            screen: vec![0; width as usize * height as usize * 4],
            targets: Vec::new(),
            draws: Vec::new(),
            flushes: 0,
        };
        Self { state: Rc::new(RefCell::new(state)) }
    }

    /// Emulates hardware limited to power-of-two textures.
    pub fn power_of_two_only(self) -> Self {
        self.state.borrow_mut().npot = false;
        self
    }

    pub fn with_max_texture_size(self, size: u32) -> Self {
        self.state.borrow_mut().max_texture_size = size;
        self
    }

    pub fn with_max_msaa(self, samples: u32) -> Self {
        self.state.borrow_mut().max_msaa = samples.max(1);
        self
    }

    // ── inspection ────────────────────────────────────────────────────────

    pub fn live_textures(&self) -> usize {
        self.state.borrow().textures.len()
    }

    pub fn texture_desc(&self, id: TextureId) -> Option<TextureDesc> {
        self.state.borrow().textures.get(&id).map(|t| t.desc)
    }

    pub fn texture_pixels(&self, id: TextureId) -> Option<Vec<u8>> {
        self.state.borrow().textures.get(&id).map(|t| t.pixels.clone())
    }

    pub fn screen_pixels(&self) -> Vec<u8> {
        self.state.borrow().screen.clone()
    }

    pub fn render_targets(&self) -> Vec<TextureId> {
        self.state.borrow().targets.clone()
    }

    pub fn draws(&self) -> Vec<DrawRecord> {
        self.state.borrow().draws.clone()
    }

    pub fn flush_count(&self) -> usize {
        self.state.borrow().flushes
    }
}

fn color_to_rgba8(color: [f32; 4]) -> [u8; 4] {
    color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
}

fn fill(pixels: &mut [u8], rgba: [u8; 4]) {
    for px in pixels.chunks_exact_mut(4) {
        px.copy_from_slice(&rgba);
    }
}

impl GraphicsBackend for HeadlessBackend {
    fn supports_npot(&self) -> bool {
        self.state.borrow().npot
    }

    fn max_texture_size(&self) -> u32 {
        self.state.borrow().max_texture_size
    }

    fn screen_size(&self) -> (u32, u32) {
        self.state.borrow().screen_size
    }

    fn supported_msaa(&self, _format: PixelFormat, requested: u32) -> u32 {
        let max = self.state.borrow().max_msaa;
        let mut samples = 1;
        while samples * 2 <= requested.min(max) {
            samples *= 2;
        }
        samples
    }

    fn supports_canvas_format(&self, format: PixelFormat) -> bool {
        !matches!(format, PixelFormat::Rgba4 | PixelFormat::Rgb5a1 | PixelFormat::Rgb565)
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureId> {
        let mut state = self.state.borrow_mut();
        let max = state.max_texture_size;
        if desc.width == 0 || desc.height == 0 {
            return Err(GraphicsError::invalid("texture dimensions must be positive"));
        }
        if desc.width > max || desc.height > max {
            return Err(GraphicsError::TextureTooLarge { width: desc.width, height: desc.height, max });
        }

        let id = state.ids.allocate()?;
        let len = desc.width as usize * desc.height as usize * desc.format.bytes_per_pixel() as usize;
        state.textures.insert(
            id,
            HeadlessTexture {
                desc: *desc,
                pixels: vec![0; len],
                filter: Filter::default(),
                wrap: Wrap::default(),
            },
        );
        log::trace!("headless: created texture {} ({}x{})", id.get(), desc.width, desc.height);
        Ok(id)
    }

    fn delete_texture(&mut self, id: TextureId) {
        let mut state = self.state.borrow_mut();
        state.textures.remove(&id);
        state.targets.retain(|t| *t != id);
    }

    fn write_texture(&mut self, id: TextureId, region: PixelRegion, pixels: &[u8]) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let tex = state
            .textures
            .get_mut(&id)
            .ok_or_else(|| GraphicsError::invalid(format!("unknown texture {}", id.get())))?;

        if !tex.desc.format.is_rgba8() {
            return Err(GraphicsError::UnsupportedFormat(format!(
                "uploading RGBA8 pixels to a {} texture",
                tex.desc.format
            )));
        }
        if !region.fits(tex.desc.width, tex.desc.height) {
            return Err(GraphicsError::invalid("upload region exceeds texture bounds"));
        }
        let row_len = region.width as usize * 4;
        if pixels.len() != row_len * region.height as usize {
            return Err(GraphicsError::invalid("upload size does not match region"));
        }

        let stride = tex.desc.width as usize * 4;
        for (row, src) in pixels.chunks_exact(row_len).enumerate() {
            let start = (region.y as usize + row) * stride + region.x as usize * 4;
            tex.pixels[start..start + row_len].copy_from_slice(src);
        }
        Ok(())
    }

    fn set_filter(&mut self, id: TextureId, filter: Filter) {
        if let Some(tex) = self.state.borrow_mut().textures.get_mut(&id) {
            tex.filter = filter;
        }
    }

    fn filter(&self, id: TextureId) -> Option<Filter> {
        self.state.borrow().textures.get(&id).map(|t| t.filter)
    }

    fn set_wrap(&mut self, id: TextureId, wrap: Wrap) {
        if let Some(tex) = self.state.borrow_mut().textures.get_mut(&id) {
            tex.wrap = wrap;
        }
    }

    fn wrap(&self, id: TextureId) -> Option<Wrap> {
        self.state.borrow().textures.get(&id).map(|t| t.wrap)
    }

    fn set_render_targets(&mut self, targets: &[TextureId]) -> Result<()> {
        let mut state = self.state.borrow_mut();
        for id in targets {
            match state.textures.get(id) {
                Some(t) if matches!(t.desc.kind, TextureKind::RenderTarget { .. }) => {}
                Some(_) => {
                    return Err(GraphicsError::InvalidRenderTarget(format!(
                        "texture {} is not renderable",
                        id.get()
                    )));
                }
                None => {
                    return Err(GraphicsError::InvalidRenderTarget(format!(
                        "unknown texture {}",
                        id.get()
                    )));
                }
            }
        }
        state.targets = targets.to_vec();
        Ok(())
    }

    fn clear(&mut self, color: [f32; 4]) {
        let rgba = color_to_rgba8(color);
        let mut state = self.state.borrow_mut();
        if state.targets.is_empty() {
            fill(&mut state.screen, rgba);
            return;
        }

        let targets = state.targets.clone();
        for id in targets {
            if let Some(tex) = state.textures.get_mut(&id) {
                if tex.desc.format.is_rgba8() {
                    fill(&mut tex.pixels, rgba);
                }
            }
        }
    }

    fn draw_quad(&mut self, texture: TextureId, transform: &Transform, vertices: &[Vertex; 4]) {
        let mut state = self.state.borrow_mut();
        if !state.textures.contains_key(&texture) {
            log::warn!("headless: draw with unknown texture {}", texture.get());
            return;
        }
        let record = DrawRecord {
            texture,
            targets: state.targets.clone(),
            vertices: transform.apply_vertices(vertices),
        };
        state.draws.push(record);
    }

    fn read_pixels(&mut self, id: TextureId, region: PixelRegion) -> Result<Vec<u8>> {
        let state = self.state.borrow();
        let tex = state
            .textures
            .get(&id)
            .ok_or_else(|| GraphicsError::invalid(format!("unknown texture {}", id.get())))?;

        if !tex.desc.format.is_rgba8() {
            return Err(GraphicsError::UnsupportedFormat(format!(
                "reading back a {} texture",
                tex.desc.format
            )));
        }
        if !region.fits(tex.desc.width, tex.desc.height) {
            return Err(GraphicsError::invalid("readback region exceeds texture bounds"));
        }

        let stride = tex.desc.width as usize * 4;
        let row_len = region.width as usize * 4;
        let mut out = Vec::with_capacity(row_len * region.height as usize);
        for row in region.y..region.y + region.height {
            let start = row as usize * stride + region.x as usize * 4;
            out.extend_from_slice(&tex.pixels[start..start + row_len]);
        }
        Ok(out)
    }

    fn read_screen(&mut self) -> Result<Vec<u8>> {
        Ok(self.screen_pixels())
    }

    fn flush(&mut self) {
        self.state.borrow_mut().flushes += 1;
    }
}
