//! GPU backend on wgpu.
//!
//! Draws are queued per render-target set and recorded when the target set
//! changes, before any operation that reads or rewrites a texture, and on
//! [`flush`](GraphicsBackend::flush).

mod format;
mod sprite;

use std::collections::HashMap;
use std::sync::mpsc;

use crate::device::GpuContext;
use crate::graphics::{Filter, GraphicsError, PixelFormat, Result, Wrap};
use crate::math::{Transform, Vertex};

use self::sprite::{SpriteRenderer, SpriteRun, SpriteTarget};
use super::{GraphicsBackend, PixelRegion, TextureDesc, TextureId, TextureIds, TextureKind};

const SCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

struct GpuTexture {
    desc: TextureDesc,
    format: wgpu::TextureFormat,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    /// Multisampled color buffer resolved into `texture`.
    msaa_view: Option<wgpu::TextureView>,
    filter: Filter,
    wrap: Wrap,
    /// Rebuilt lazily after filter/wrap changes.
    bind_group: Option<wgpu::BindGroup>,
}

impl GpuTexture {
    fn new(device: &wgpu::Device, desc: TextureDesc, format: wgpu::TextureFormat) -> Self {
        let size = wgpu::Extent3d {
            width: desc.width,
            height: desc.height,
            depth_or_array_layers: 1,
        };

        let mut usage = wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_DST
            | wgpu::TextureUsages::COPY_SRC;
        let mut samples = 1;
        if let TextureKind::RenderTarget { msaa } = desc.kind {
            usage |= wgpu::TextureUsages::RENDER_ATTACHMENT;
            samples = msaa;
        }

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("kite texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });

        let msaa_view = (samples > 1).then(|| {
            device
                .create_texture(&wgpu::TextureDescriptor {
                    label: Some("kite msaa color buffer"),
                    size,
                    mip_level_count: 1,
                    sample_count: samples,
                    dimension: wgpu::TextureDimension::D2,
                    format,
                    usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
                    view_formats: &[],
                })
                .create_view(&wgpu::TextureViewDescriptor::default())
        });

        Self {
            desc,
            format,
            view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
            texture,
            msaa_view,
            filter: Filter::default(),
            wrap: Wrap::default(),
            bind_group: None,
        }
    }

    fn samples(&self) -> u32 {
        match self.desc.kind {
            TextureKind::RenderTarget { msaa } => msaa.max(1),
            TextureKind::Sampled => 1,
        }
    }

    fn as_target(&self) -> SpriteTarget<'_> {
        let (view, resolve) = match &self.msaa_view {
            Some(msaa) => (msaa, Some(&self.view)),
            None => (&self.view, None),
        };
        SpriteTarget {
            view,
            resolve,
            format: self.format,
            samples: self.samples(),
            size: (self.desc.width, self.desc.height),
        }
    }
}

struct PendingSprite {
    texture: TextureId,
    vertices: [Vertex; 4],
}

/// [`GraphicsBackend`] rendering through wgpu.
///
/// The screen is an off-screen RGBA8 texture of the context's screen size,
/// readable with `read_screen`.
pub struct WgpuBackend {
    gpu: GpuContext,
    ids: TextureIds,
    textures: HashMap<TextureId, GpuTexture>,
    screen: GpuTexture,
    targets: Vec<TextureId>,
    pending: Vec<PendingSprite>,
    sprites: SpriteRenderer,
}

impl WgpuBackend {
    pub fn new(gpu: GpuContext) -> Self {
        let (width, height) = gpu.screen_size();
        let screen_desc = TextureDesc {
            width,
            height,
            format: PixelFormat::Rgba8,
            kind: TextureKind::RenderTarget { msaa: 1 },
        };
        let screen = GpuTexture::new(gpu.device(), screen_desc, SCREEN_FORMAT);
        let sprites = SpriteRenderer::new(gpu.device());

        log::debug!(
            "wgpu backend ready: screen {width}x{height}, npot={}, max texture size {}",
            gpu.supports_npot(),
            gpu.max_texture_size()
        );

        Self {
            gpu,
            ids: TextureIds::default(),
            textures: HashMap::new(),
            screen,
            targets: Vec::new(),
            pending: Vec::new(),
            sprites,
        }
    }

    #[inline]
    pub fn gpu(&self) -> &GpuContext {
        &self.gpu
    }

    fn texture(&self, id: TextureId) -> Result<&GpuTexture> {
        self.textures
            .get(&id)
            .ok_or_else(|| GraphicsError::invalid(format!("unknown texture {}", id.get())))
    }

    fn ensure_bind_group(&mut self, id: TextureId) {
        let Some(tex) = self.textures.get_mut(&id) else { return };
        if tex.bind_group.is_some() {
            return;
        }
        let device = self.gpu.device();
        let sampler = device.create_sampler(&format::sampler_descriptor(tex.filter, tex.wrap));
        tex.bind_group = Some(self.sprites.texture_bind_group(device, &tex.view, &sampler));
    }

    /// Records and submits queued draws into the current targets.
    fn flush_draws(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let pending = std::mem::take(&mut self.pending);

        for sprite in &pending {
            self.ensure_bind_group(sprite.texture);
        }

        let vertices: Vec<Vertex> = pending.iter().flat_map(|p| p.vertices).collect();
        let mut runs = Vec::new();
        let mut start = 0;
        for end in 1..=pending.len() {
            if end < pending.len() && pending[end].texture == pending[start].texture {
                continue;
            }
            let bind_group = self
                .textures
                .get(&pending[start].texture)
                .and_then(|t| t.bind_group.as_ref());
            match bind_group {
                Some(bind_group) => runs.push(SpriteRun {
                    bind_group,
                    sprites: start as u32..end as u32,
                }),
                None => log::warn!("dropping draws of deleted texture {}", pending[start].texture.get()),
            }
            start = end;
        }

        let targets: Vec<&GpuTexture> = if self.targets.is_empty() {
            vec![&self.screen]
        } else {
            self.targets.iter().filter_map(|id| self.textures.get(id)).collect()
        };

        let device = self.gpu.device();
        let queue = self.gpu.queue();
        for target in targets {
            let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("kite sprite encoder"),
            });
            self.sprites
                .render(device, queue, &mut encoder, &target.as_target(), &vertices, &runs);
            queue.submit(std::iter::once(encoder.finish()));
        }
        log::trace!("flushed {} sprites in {} runs", pending.len(), runs.len());
    }

    /// Flushes queued draws if any of them sample `id`.
    fn flush_if_pending(&mut self, id: TextureId) {
        if self.pending.iter().any(|p| p.texture == id) {
            self.flush_draws();
        }
    }
}

/// Copies `region` of `tex` into CPU memory, undoing the row padding wgpu
/// requires for buffer copies.
fn read_texture(gpu: &GpuContext, tex: &GpuTexture, region: PixelRegion) -> Result<Vec<u8>> {
    if !region.fits(tex.desc.width, tex.desc.height) {
        return Err(GraphicsError::invalid("readback region exceeds texture bounds"));
    }

    let row_len = region.width * 4;
    let padded = row_len.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT) * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

    let device = gpu.device();
    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("kite readback buffer"),
        size: u64::from(padded) * u64::from(region.height),
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("kite readback encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture: &tex.texture,
            mip_level: 0,
            origin: wgpu::Origin3d { x: region.x, y: region.y, z: 0 },
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded),
                rows_per_image: Some(region.height),
            },
        },
        wgpu::Extent3d {
            width: region.width,
            height: region.height,
            depth_or_array_layers: 1,
        },
    );
    gpu.queue().submit(std::iter::once(encoder.finish()));

    let slice = buffer.slice(..);
    let (tx, rx) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    device
        .poll(wgpu::PollType::wait_indefinitely())
        .map_err(|err| GraphicsError::Backend(format!("device poll failed: {err}")))?;

    rx.recv()
        .map_err(|_| GraphicsError::DeviceLost)?
        .map_err(|err| GraphicsError::Backend(format!("readback mapping failed: {err}")))?;

    let mut out = Vec::with_capacity(row_len as usize * region.height as usize);
    {
        let mapped = slice.get_mapped_range();
        for row in mapped.chunks(padded as usize).take(region.height as usize) {
            out.extend_from_slice(&row[..row_len as usize]);
        }
    }
    buffer.unmap();
    Ok(out)
}

impl GraphicsBackend for WgpuBackend {
    fn supports_npot(&self) -> bool {
        self.gpu.supports_npot()
    }

    fn max_texture_size(&self) -> u32 {
        self.gpu.max_texture_size()
    }

    fn screen_size(&self) -> (u32, u32) {
        self.gpu.screen_size()
    }

    fn supported_msaa(&self, format: PixelFormat, requested: u32) -> u32 {
        let Some(tf) = format::texture_format(format) else { return 1 };
        let features = self.gpu.format_features(tf);
        if !features.flags.contains(wgpu::TextureFormatFeatureFlags::MULTISAMPLE_RESOLVE) {
            return 1;
        }
        [16, 8, 4, 2]
            .into_iter()
            .find(|&n| n <= requested && features.flags.sample_count_supported(n))
            .unwrap_or(1)
    }

    fn supports_canvas_format(&self, format: PixelFormat) -> bool {
        format::texture_format(format)
            .is_some_and(|tf| format::is_canvas_capable(&self.gpu.format_features(tf)))
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureId> {
        if desc.width == 0 || desc.height == 0 {
            return Err(GraphicsError::invalid("texture dimensions must be positive"));
        }
        let max = self.max_texture_size();
        if desc.width > max || desc.height > max {
            return Err(GraphicsError::TextureTooLarge { width: desc.width, height: desc.height, max });
        }

        let format = format::texture_format(desc.format)
            .ok_or_else(|| GraphicsError::UnsupportedFormat(format!("{} textures", desc.format)))?;
        if matches!(desc.kind, TextureKind::RenderTarget { .. }) && !self.supports_canvas_format(desc.format) {
            return Err(GraphicsError::UnsupportedFormat(format!("{} canvas", desc.format)));
        }

        let id = self.ids.allocate()?;
        self.textures.insert(id, GpuTexture::new(self.gpu.device(), *desc, format));
        log::trace!("wgpu: created texture {} ({}x{} {:?})", id.get(), desc.width, desc.height, format);
        Ok(id)
    }

    fn delete_texture(&mut self, id: TextureId) {
        self.flush_if_pending(id);
        if self.targets.contains(&id) {
            self.flush_draws();
            self.targets.retain(|t| *t != id);
        }
        if let Some(tex) = self.textures.remove(&id) {
            tex.texture.destroy();
        }
    }

    fn write_texture(&mut self, id: TextureId, region: PixelRegion, pixels: &[u8]) -> Result<()> {
        self.flush_if_pending(id);
        let tex = self.texture(id)?;

        if !tex.desc.format.is_rgba8() {
            return Err(GraphicsError::UnsupportedFormat(format!(
                "uploading RGBA8 pixels to a {} texture",
                tex.desc.format
            )));
        }
        if !region.fits(tex.desc.width, tex.desc.height) {
            return Err(GraphicsError::invalid("upload region exceeds texture bounds"));
        }
        if pixels.len() != region.width as usize * region.height as usize * 4 {
            return Err(GraphicsError::invalid("upload size does not match region"));
        }

        self.gpu.queue().write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &tex.texture,
                mip_level: 0,
                origin: wgpu::Origin3d { x: region.x, y: region.y, z: 0 },
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(region.width * 4),
                rows_per_image: Some(region.height),
            },
            wgpu::Extent3d {
                width: region.width,
                height: region.height,
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }

    fn set_filter(&mut self, id: TextureId, filter: Filter) {
        self.flush_if_pending(id);
        if let Some(tex) = self.textures.get_mut(&id) {
            if tex.filter != filter {
                tex.filter = filter;
                tex.bind_group = None;
            }
        }
    }

    fn filter(&self, id: TextureId) -> Option<Filter> {
        self.textures.get(&id).map(|t| t.filter)
    }

    fn set_wrap(&mut self, id: TextureId, wrap: Wrap) {
        self.flush_if_pending(id);
        if let Some(tex) = self.textures.get_mut(&id) {
            if tex.wrap != wrap {
                tex.wrap = wrap;
                tex.bind_group = None;
            }
        }
    }

    fn wrap(&self, id: TextureId) -> Option<Wrap> {
        self.textures.get(&id).map(|t| t.wrap)
    }

    fn set_render_targets(&mut self, targets: &[TextureId]) -> Result<()> {
        for id in targets {
            let tex = self.textures.get(id).ok_or_else(|| {
                GraphicsError::InvalidRenderTarget(format!("unknown texture {}", id.get()))
            })?;
            if !matches!(tex.desc.kind, TextureKind::RenderTarget { .. }) {
                return Err(GraphicsError::InvalidRenderTarget(format!(
                    "texture {} is not renderable",
                    id.get()
                )));
            }
        }

        if self.targets != targets {
            self.flush_draws();
            self.targets = targets.to_vec();
        }
        Ok(())
    }

    fn clear(&mut self, color: [f32; 4]) {
        self.flush_draws();

        let [r, g, b, a] = color.map(f64::from);
        let color = wgpu::Color { r, g, b, a };

        let targets: Vec<&GpuTexture> = if self.targets.is_empty() {
            vec![&self.screen]
        } else {
            self.targets.iter().filter_map(|id| self.textures.get(id)).collect()
        };

        let mut encoder = self.gpu.device().create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("kite clear encoder"),
        });
        for target in targets {
            SpriteRenderer::clear(&mut encoder, &target.as_target(), color);
        }
        self.gpu.queue().submit(std::iter::once(encoder.finish()));
    }

    fn draw_quad(&mut self, texture: TextureId, transform: &Transform, vertices: &[Vertex; 4]) {
        if !self.textures.contains_key(&texture) {
            log::warn!("wgpu: draw with unknown texture {}", texture.get());
            return;
        }
        self.pending.push(PendingSprite {
            texture,
            vertices: transform.apply_vertices(vertices),
        });
    }

    fn read_pixels(&mut self, id: TextureId, region: PixelRegion) -> Result<Vec<u8>> {
        self.flush_draws();
        let tex = self.texture(id)?;
        if !tex.desc.format.is_rgba8() {
            return Err(GraphicsError::UnsupportedFormat(format!(
                "reading back a {} texture",
                tex.desc.format
            )));
        }
        read_texture(&self.gpu, tex, region)
    }

    fn read_screen(&mut self) -> Result<Vec<u8>> {
        self.flush_draws();
        let region = PixelRegion::full(self.screen.desc.width, self.screen.desc.height);
        read_texture(&self.gpu, &self.screen, region)
    }

    fn flush(&mut self) {
        self.flush_draws();
    }
}

impl Drop for WgpuBackend {
    fn drop(&mut self) {
        if !self.textures.is_empty() {
            log::debug!("wgpu backend dropped with {} live textures", self.textures.len());
        }
    }
}
