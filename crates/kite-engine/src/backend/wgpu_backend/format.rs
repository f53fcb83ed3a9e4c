use crate::graphics::{Filter, FilterMode, PixelFormat, Wrap, WrapMode};

/// wgpu storage format for `format`, if wgpu has one.
///
/// 16-bit packed layouts have no wgpu equivalent.
pub(super) fn texture_format(format: PixelFormat) -> Option<wgpu::TextureFormat> {
    use wgpu::TextureFormat as F;

    Some(match format {
        PixelFormat::Normal | PixelFormat::Rgba8 => F::Rgba8Unorm,
        PixelFormat::Srgb => F::Rgba8UnormSrgb,
        PixelFormat::Hdr | PixelFormat::Rgba16f => F::Rgba16Float,
        PixelFormat::Rgb10a2 => F::Rgb10a2Unorm,
        PixelFormat::Rg11b10f => F::Rg11b10Ufloat,
        PixelFormat::R8 => F::R8Unorm,
        PixelFormat::Rg8 => F::Rg8Unorm,
        PixelFormat::Rgba32f => F::Rgba32Float,
        PixelFormat::R16f => F::R16Float,
        PixelFormat::Rg16f => F::Rg16Float,
        PixelFormat::R32f => F::R32Float,
        PixelFormat::Rg32f => F::Rg32Float,
        PixelFormat::Rgba4 | PixelFormat::Rgb5a1 | PixelFormat::Rgb565 => return None,
    })
}

/// A canvas must be renderable and filterable so it can be drawn afterwards.
pub(super) fn is_canvas_capable(features: &wgpu::TextureFormatFeatures) -> bool {
    features.allowed_usages.contains(
        wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
    ) && features.flags.contains(wgpu::TextureFormatFeatureFlags::FILTERABLE)
}

fn filter_mode(mode: FilterMode) -> wgpu::FilterMode {
    match mode {
        FilterMode::Linear => wgpu::FilterMode::Linear,
        FilterMode::Nearest => wgpu::FilterMode::Nearest,
    }
}

fn address_mode(mode: WrapMode) -> wgpu::AddressMode {
    match mode {
        WrapMode::Clamp => wgpu::AddressMode::ClampToEdge,
        WrapMode::Repeat => wgpu::AddressMode::Repeat,
        WrapMode::MirroredRepeat => wgpu::AddressMode::MirrorRepeat,
    }
}

pub(super) fn sampler_descriptor(filter: Filter, wrap: Wrap) -> wgpu::SamplerDescriptor<'static> {
    wgpu::SamplerDescriptor {
        label: Some("kite texture sampler"),
        address_mode_u: address_mode(wrap.s),
        address_mode_v: address_mode(wrap.t),
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: filter_mode(filter.mag),
        min_filter: filter_mode(filter.min),
        mipmap_filter: wgpu::MipmapFilterMode::Nearest,
        ..Default::default()
    }
}
