use super::names::named_enum;

named_enum! {
    /// Pixel storage format of a texture or canvas.
    ///
    /// `Normal` and `Hdr` are the portable defaults; the rest name an exact
    /// layout whose support depends on the backend.
    pub enum PixelFormat ("pixel format") {
        Normal => "normal",
        Hdr => "hdr",
        Rgba8 => "rgba8",
        Rgba4 => "rgba4",
        Rgb5a1 => "rgb5a1",
        Rgb565 => "rgb565",
        Rgb10a2 => "rgb10a2",
        Rg11b10f => "rg11b10f",
        R8 => "r8",
        Rg8 => "rg8",
        Rgba16f => "rgba16f",
        Rgba32f => "rgba32f",
        R16f => "r16f",
        Rg16f => "rg16f",
        R32f => "r32f",
        Rg32f => "rg32f",
        Srgb => "srgb",
    }
}

impl PixelFormat {
    pub const fn bytes_per_pixel(self) -> u32 {
        match self {
            PixelFormat::R8 => 1,
            PixelFormat::Rgba4 | PixelFormat::Rgb5a1 | PixelFormat::Rgb565 => 2,
            PixelFormat::Rg8 | PixelFormat::R16f => 2,
            PixelFormat::Normal
            | PixelFormat::Rgba8
            | PixelFormat::Srgb
            | PixelFormat::Rgb10a2
            | PixelFormat::Rg11b10f
            | PixelFormat::Rg16f
            | PixelFormat::R32f => 4,
            PixelFormat::Hdr | PixelFormat::Rgba16f | PixelFormat::Rg32f => 8,
            PixelFormat::Rgba32f => 16,
        }
    }

    /// Whether texels are stored as 8-bit RGBA, the layout of [`ImageData`](super::ImageData).
    pub const fn is_rgba8(self) -> bool {
        matches!(self, PixelFormat::Normal | PixelFormat::Rgba8 | PixelFormat::Srgb)
    }
}
