use super::Vertex;

/// Placement parameters for a single draw call.
///
/// Order of application: origin offset, skew, scale, rotation, translation.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DrawParams {
    pub x: f32,
    pub y: f32,
    /// Rotation in radians, clockwise in +Y-down space.
    pub angle: f32,
    pub sx: f32,
    pub sy: f32,
    pub ox: f32,
    pub oy: f32,
    pub kx: f32,
    pub ky: f32,
}

impl Default for DrawParams {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            angle: 0.0,
            sx: 1.0,
            sy: 1.0,
            ox: 0.0,
            oy: 0.0,
            kx: 0.0,
            ky: 0.0,
        }
    }
}

impl DrawParams {
    #[inline]
    pub fn at(x: f32, y: f32) -> Self {
        Self { x, y, ..Self::default() }
    }
}

/// 2D affine transform.
///
/// ```text
/// | a  c  tx |
/// | b  d  ty |
/// | 0  0  1  |
/// ```
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub tx: f32,
    pub ty: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    /// Composes `translate * rotate * scale * skew * translate(-origin)`.
    pub fn from_params(p: &DrawParams) -> Self {
        let (s, c) = p.angle.sin_cos();

        let a = c * p.sx - p.ky * s * p.sy;
        let b = s * p.sx + p.ky * c * p.sy;
        let cc = p.kx * c * p.sx - s * p.sy;
        let d = p.kx * s * p.sx + c * p.sy;

        Self {
            a,
            b,
            c: cc,
            d,
            tx: p.x - p.ox * a - p.oy * cc,
            ty: p.y - p.ox * b - p.oy * d,
        }
    }

    #[inline]
    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.tx,
            self.b * x + self.d * y + self.ty,
        )
    }

    /// Transforms vertex positions; texture coordinates pass through.
    pub fn apply_vertices(&self, vertices: &[Vertex; 4]) -> [Vertex; 4] {
        vertices.map(|v| {
            let (x, y) = self.apply(v.x, v.y);
            Vertex::new(x, y, v.s, v.t)
        })
    }
}
