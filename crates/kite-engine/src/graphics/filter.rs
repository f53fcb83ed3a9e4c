use super::names::named_enum;

named_enum! {
    /// Texel sampling mode for minification or magnification.
    pub enum FilterMode ("filter mode") {
        Linear => "linear",
        Nearest => "nearest",
    }
}

named_enum! {
    /// Addressing mode outside the 0..1 texture coordinate range.
    pub enum WrapMode ("wrap mode") {
        Clamp => "clamp",
        Repeat => "repeat",
        MirroredRepeat => "mirroredrepeat",
    }
}

/// Minification/magnification filter pair.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Filter {
    pub min: FilterMode,
    pub mag: FilterMode,
}

impl Filter {
    #[inline]
    pub const fn new(min: FilterMode, mag: FilterMode) -> Self {
        Self { min, mag }
    }

    #[inline]
    pub const fn uniform(mode: FilterMode) -> Self {
        Self { min: mode, mag: mode }
    }
}

impl Default for Filter {
    fn default() -> Self {
        Self::uniform(FilterMode::Linear)
    }
}

/// Horizontal/vertical wrap pair.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Wrap {
    pub s: WrapMode,
    pub t: WrapMode,
}

impl Wrap {
    #[inline]
    pub const fn new(s: WrapMode, t: WrapMode) -> Self {
        Self { s, t }
    }

    #[inline]
    pub const fn uniform(mode: WrapMode) -> Self {
        Self { s: mode, t: mode }
    }
}

impl Default for Wrap {
    fn default() -> Self {
        Self::uniform(WrapMode::Clamp)
    }
}

/// Sampler state persisted across unload/load.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct TextureSettings {
    pub filter: Filter,
    pub wrap: Wrap,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::GraphicsError;

    #[test]
    fn names_round_trip() {
        for mode in FilterMode::ALL {
            assert_eq!(mode.name().parse::<FilterMode>().unwrap(), *mode);
        }
        for mode in WrapMode::ALL {
            assert_eq!(mode.to_string().parse::<WrapMode>().unwrap(), *mode);
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = "bilinear".parse::<FilterMode>().unwrap_err();
        assert!(matches!(err, GraphicsError::UnknownEnum { kind: "filter mode", .. }));
        assert!(err.to_string().contains("linear, nearest"));
    }

    #[test]
    fn defaults_are_linear_and_clamp() {
        let s = TextureSettings::default();
        assert_eq!(s.filter, Filter::uniform(FilterMode::Linear));
        assert_eq!(s.wrap, Wrap::uniform(WrapMode::Clamp));
    }
}
