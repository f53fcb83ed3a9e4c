use std::io::Cursor;

use super::{GraphicsError, Result};

/// CPU-side RGBA8 pixel buffer.
///
/// Shared between resources and scripts as `Arc<ImageData>`; the buffer is
/// immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

pub const BYTES_PER_PIXEL: usize = 4;

impl ImageData {
    /// Creates a transparent-black buffer.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Self::check_size(width, height)?;
        let len = width as usize * height as usize * BYTES_PER_PIXEL;
        Ok(Self { width, height, pixels: vec![0; len] })
    }

    /// Wraps an existing buffer laid out row-major, top row first.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        Self::check_size(width, height)?;
        let expected = width as usize * height as usize * BYTES_PER_PIXEL;
        if pixels.len() != expected {
            return Err(GraphicsError::invalid(format!(
                "pixel buffer holds {} bytes, {width}x{height} RGBA8 needs {expected}",
                pixels.len()
            )));
        }
        Ok(Self { width, height, pixels })
    }

    fn check_size(width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(GraphicsError::invalid(format!(
                "image dimensions must be positive (got {width}x{height})"
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Returns the RGBA value at `(x, y)`, or `None` outside the buffer.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        let px = &self.pixels[i..i + BYTES_PER_PIXEL];
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Copies a sub-rectangle into a new buffer.
    pub fn sub_image(&self, x: u32, y: u32, w: u32, h: u32) -> Result<Self> {
        if w == 0 || h == 0 || x.saturating_add(w) > self.width || y.saturating_add(h) > self.height
        {
            return Err(GraphicsError::invalid(format!(
                "rectangle {x},{y} {w}x{h} is outside the {}x{} image",
                self.width, self.height
            )));
        }

        let stride = self.width as usize * BYTES_PER_PIXEL;
        let row_len = w as usize * BYTES_PER_PIXEL;
        let mut out = Vec::with_capacity(row_len * h as usize);
        for row in y..y + h {
            let start = row as usize * stride + x as usize * BYTES_PER_PIXEL;
            out.extend_from_slice(&self.pixels[start..start + row_len]);
        }
        Self::from_pixels(w, h, out)
    }

    /// Encodes the buffer as PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let buffer = image::RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
            .ok_or_else(|| GraphicsError::Backend("pixel buffer size mismatch".into()))?;

        let mut out = Cursor::new(Vec::new());
        buffer
            .write_to(&mut out, image::ImageFormat::Png)
            .map_err(|e| GraphicsError::Backend(format!("png encoding failed: {e}")))?;
        Ok(out.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(w: u32, h: u32) -> ImageData {
        let mut px = Vec::new();
        for y in 0..h {
            for x in 0..w {
                px.extend_from_slice(&[x as u8, y as u8, 0, 255]);
            }
        }
        ImageData::from_pixels(w, h, px).unwrap()
    }

    #[test]
    fn new_is_zeroed() {
        let d = ImageData::new(3, 2).unwrap();
        assert_eq!(d.pixels().len(), 24);
        assert_eq!(d.pixel(2, 1), Some([0, 0, 0, 0]));
    }

    #[test]
    fn rejects_wrong_buffer_length() {
        assert!(ImageData::from_pixels(2, 2, vec![0; 15]).is_err());
        assert!(ImageData::new(0, 4).is_err());
    }

    #[test]
    fn pixel_lookup_and_bounds() {
        let d = gradient(4, 3);
        assert_eq!(d.pixel(3, 2), Some([3, 2, 0, 255]));
        assert_eq!(d.pixel(4, 0), None);
        assert_eq!(d.pixel(0, 3), None);
    }

    #[test]
    fn sub_image_copies_rows() {
        let d = gradient(4, 4);
        let s = d.sub_image(1, 2, 2, 2).unwrap();
        assert_eq!((s.width(), s.height()), (2, 2));
        assert_eq!(s.pixel(0, 0), Some([1, 2, 0, 255]));
        assert_eq!(s.pixel(1, 1), Some([2, 3, 0, 255]));
        assert!(d.sub_image(3, 0, 2, 1).is_err());
    }

    #[test]
    fn encodes_png_signature() {
        let png = gradient(2, 2).encode_png().unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }
}
