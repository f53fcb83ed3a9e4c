use bytemuck::{Pod, Zeroable};

/// Textured 2D vertex: position in pixels + normalized texture coordinate.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub x: f32,
    pub y: f32,
    pub s: f32,
    pub t: f32,
}

impl Vertex {
    #[inline]
    pub const fn new(x: f32, y: f32, s: f32, t: f32) -> Self {
        Self { x, y, s, t }
    }

    /// Builds the four corners of a `w × h` rectangle at the origin.
    ///
    /// Corner order: top-left, bottom-left, bottom-right, top-right.
    /// Texture coordinates span `s0..s1` and `t0..t1`.
    pub fn rect(w: f32, h: f32, s0: f32, t0: f32, s1: f32, t1: f32) -> [Vertex; 4] {
        [
            Vertex::new(0.0, 0.0, s0, t0),
            Vertex::new(0.0, h, s0, t1),
            Vertex::new(w, h, s1, t1),
            Vertex::new(w, 0.0, s1, t0),
        ]
    }
}
