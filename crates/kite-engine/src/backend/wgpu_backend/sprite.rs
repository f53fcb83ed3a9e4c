use std::collections::HashMap;
use std::ops::Range;

use bytemuck::{Pod, Zeroable};

use crate::math::Vertex;

/// Where a sprite pass renders to.
pub(super) struct SpriteTarget<'a> {
    /// Attachment drawn into (the multisampled buffer for MSAA targets).
    pub view: &'a wgpu::TextureView,
    /// Single-sampled texture the MSAA buffer resolves into.
    pub resolve: Option<&'a wgpu::TextureView>,
    pub format: wgpu::TextureFormat,
    pub samples: u32,
    pub size: (u32, u32),
}

impl SpriteTarget<'_> {
    fn color_attachment(&self, load: wgpu::LoadOp<wgpu::Color>) -> wgpu::RenderPassColorAttachment<'_> {
        wgpu::RenderPassColorAttachment {
            view: self.view,
            resolve_target: self.resolve,
            ops: wgpu::Operations { load, store: wgpu::StoreOp::Store },
            depth_slice: None,
        }
    }
}

/// Consecutive sprites sharing one texture bind group.
pub(super) struct SpriteRun<'a> {
    pub bind_group: &'a wgpu::BindGroup,
    pub sprites: Range<u32>,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct ViewportUniform {
    size: [f32; 2],
    _pad: [f32; 2], // 16-byte alignment
}

const VERTEX_ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
    0 => Float32x2, // x, y
    1 => Float32x2  // s, t
];

fn vertex_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &VERTEX_ATTRS,
    }
}

/// Index list for `sprites` quads laid out top-left, bottom-left,
/// bottom-right, top-right.
fn quad_indices(sprites: usize) -> Vec<u32> {
    (0..sprites as u32)
        .flat_map(|i| {
            let b = i * 4;
            [b, b + 1, b + 2, b, b + 2, b + 3]
        })
        .collect()
}

/// Textured-quad renderer.
///
/// Geometry arrives in target pixels (already transformed on the CPU) and is
/// converted to NDC in the vertex shader using the viewport uniform.
/// Pipelines are built lazily per target format and sample count.
pub(super) struct SpriteRenderer {
    shader: wgpu::ShaderModule,
    texture_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    pipelines: HashMap<(wgpu::TextureFormat, u32), wgpu::RenderPipeline>,

    viewport_ubo: wgpu::Buffer,
    viewport_bind_group: wgpu::BindGroup,

    vbo: Option<wgpu::Buffer>,
    ibo: Option<wgpu::Buffer>,
    capacity: usize,
}

impl SpriteRenderer {
    pub(super) fn new(device: &wgpu::Device) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("kite sprite shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/sprite.wgsl").into()),
        });

        let viewport_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("kite sprite viewport bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<ViewportUniform>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("kite sprite texture bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("kite sprite pipeline layout"),
            bind_group_layouts: &[&viewport_layout, &texture_layout],
            immediate_size: 0,
        });

        let viewport_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("kite sprite viewport ubo"),
            size: std::mem::size_of::<ViewportUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let viewport_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("kite sprite viewport bind group"),
            layout: &viewport_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: viewport_ubo.as_entire_binding(),
            }],
        });

        Self {
            shader,
            texture_layout,
            pipeline_layout,
            pipelines: HashMap::new(),
            viewport_ubo,
            viewport_bind_group,
            vbo: None,
            ibo: None,
            capacity: 0,
        }
    }

    /// Bind group sampling `view` through `sampler`.
    pub(super) fn texture_bind_group(
        &self,
        device: &wgpu::Device,
        view: &wgpu::TextureView,
        sampler: &wgpu::Sampler,
    ) -> wgpu::BindGroup {
        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("kite sprite texture bind group"),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }

    /// Records one pass drawing `runs` of `vertices` into `target`.
    ///
    /// The viewport uniform is rewritten on every call, so the encoder must be
    /// submitted before rendering to a target of a different size.
    pub(super) fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        target: &SpriteTarget<'_>,
        vertices: &[Vertex],
        runs: &[SpriteRun<'_>],
    ) {
        if runs.is_empty() {
            return;
        }

        self.ensure_pipeline(device, target.format, target.samples);
        self.ensure_capacity(device, vertices.len() / 4);

        let u = ViewportUniform {
            size: [target.size.0.max(1) as f32, target.size.1.max(1) as f32],
            _pad: [0.0; 2],
        };
        queue.write_buffer(&self.viewport_ubo, 0, bytemuck::bytes_of(&u));

        let Some(vbo) = self.vbo.as_ref() else { return };
        let Some(ibo) = self.ibo.as_ref() else { return };
        let Some(pipeline) = self.pipelines.get(&(target.format, target.samples)) else { return };
        queue.write_buffer(vbo, 0, bytemuck::cast_slice(vertices));

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("kite sprite pass"),
            color_attachments: &[Some(target.color_attachment(wgpu::LoadOp::Load))],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(pipeline);
        rpass.set_bind_group(0, &self.viewport_bind_group, &[]);
        rpass.set_vertex_buffer(0, vbo.slice(..));
        rpass.set_index_buffer(ibo.slice(..), wgpu::IndexFormat::Uint32);

        for run in runs {
            rpass.set_bind_group(1, run.bind_group, &[]);
            rpass.draw_indexed(run.sprites.start * 6..run.sprites.end * 6, 0, 0..1);
        }
    }

    /// Records a pass that clears `target` to `color`.
    pub(super) fn clear(encoder: &mut wgpu::CommandEncoder, target: &SpriteTarget<'_>, color: wgpu::Color) {
        let _ = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("kite clear pass"),
            color_attachments: &[Some(target.color_attachment(wgpu::LoadOp::Clear(color)))],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
    }

    fn ensure_pipeline(&mut self, device: &wgpu::Device, format: wgpu::TextureFormat, samples: u32) {
        if self.pipelines.contains_key(&(format, samples)) {
            return;
        }

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("kite sprite pipeline"),
            layout: Some(&self.pipeline_layout),

            vertex: wgpu::VertexState {
                module: &self.shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[vertex_layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: &self.shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState { count: samples, ..Default::default() },
            multiview_mask: None,
            cache: None,
        });

        log::debug!("built sprite pipeline for {format:?} x{samples}");
        self.pipelines.insert((format, samples), pipeline);
    }

    fn ensure_capacity(&mut self, device: &wgpu::Device, sprites: usize) {
        if sprites <= self.capacity && self.vbo.is_some() && self.ibo.is_some() {
            return;
        }

        let cap = sprites.next_power_of_two().max(64);
        self.vbo = Some(device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("kite sprite vbo"),
            size: (cap * 4 * std::mem::size_of::<Vertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));

        use wgpu::util::DeviceExt;
        self.ibo = Some(device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("kite sprite ibo"),
            contents: bytemuck::cast_slice(&quad_indices(cap)),
            usage: wgpu::BufferUsages::INDEX,
        }));
        self.capacity = cap;
    }
}

impl std::fmt::Debug for SpriteRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpriteRenderer")
            .field("pipelines", &self.pipelines.len())
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_form_two_triangles_per_quad() {
        assert_eq!(quad_indices(2), vec![0, 1, 2, 0, 2, 3, 4, 5, 6, 4, 6, 7]);
    }

    #[test]
    fn vertex_layout_matches_vertex_struct() {
        let layout = vertex_layout();
        assert_eq!(layout.array_stride, 16);
        assert_eq!(layout.attributes[1].offset, 8);
    }
}
