use crate::math::Vertex;

use super::{GraphicsError, Result};

/// A rectangular region of a texture, for sprite-sheet style draws.
///
/// The viewport is given in pixels relative to a reference size (normally the
/// dimensions of the texture it will be drawn with).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Quad {
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    sw: f32,
    sh: f32,
    vertices: [Vertex; 4],
}

impl Quad {
    pub fn new(x: f32, y: f32, w: f32, h: f32, sw: f32, sh: f32) -> Result<Self> {
        if !(sw > 0.0 && sh > 0.0) || !sw.is_finite() || !sh.is_finite() {
            return Err(GraphicsError::invalid(format!(
                "quad reference size must be positive (got {sw}x{sh})"
            )));
        }
        let mut quad = Self { x: 0.0, y: 0.0, w: 0.0, h: 0.0, sw, sh, vertices: [Vertex::default(); 4] };
        quad.set_viewport(x, y, w, h);
        Ok(quad)
    }

    /// Moves/resizes the region; the reference size is unchanged.
    pub fn set_viewport(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.x = x;
        self.y = y;
        self.w = w;
        self.h = h;
        self.vertices = Vertex::rect(
            w,
            h,
            x / self.sw,
            y / self.sh,
            (x + w) / self.sw,
            (y + h) / self.sh,
        );
    }

    /// `(x, y, w, h)` in pixels.
    #[inline]
    pub fn viewport(&self) -> (f32, f32, f32, f32) {
        (self.x, self.y, self.w, self.h)
    }

    #[inline]
    pub fn reference_size(&self) -> (f32, f32) {
        (self.sw, self.sh)
    }

    #[inline]
    pub fn vertices(&self) -> &[Vertex; 4] {
        &self.vertices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_coordinates_are_relative_to_reference() {
        let q = Quad::new(16.0, 8.0, 16.0, 8.0, 64.0, 32.0).unwrap();
        let v = q.vertices();
        assert_eq!(v[0], Vertex::new(0.0, 0.0, 0.25, 0.25));
        assert_eq!(v[2], Vertex::new(16.0, 8.0, 0.5, 0.5));
    }

    #[test]
    fn set_viewport_rebuilds_vertices() {
        let mut q = Quad::new(0.0, 0.0, 8.0, 8.0, 32.0, 32.0).unwrap();
        q.set_viewport(8.0, 0.0, 8.0, 8.0);
        assert_eq!(q.viewport(), (8.0, 0.0, 8.0, 8.0));
        assert_eq!(q.vertices()[3], Vertex::new(8.0, 0.0, 0.5, 0.0));
    }

    #[test]
    fn zero_reference_size_is_rejected() {
        assert!(Quad::new(0.0, 0.0, 1.0, 1.0, 0.0, 1.0).is_err());
        assert!(Quad::new(0.0, 0.0, 1.0, 1.0, 1.0, f32::NAN).is_err());
    }
}
