use thiserror::Error;

/// Errors surfaced by graphics resources and backends.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphicsError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A name did not match any value of the named enum.
    #[error("invalid {kind} '{value}', expected one of: {expected}")]
    UnknownEnum {
        kind: &'static str,
        value: String,
        expected: String,
    },

    #[error("{0} is not supported on this system")]
    UnsupportedFormat(String),

    #[error("cannot create a {width}x{height} texture: maximum size is {max}")]
    TextureTooLarge { width: u32, height: u32, max: u32 },

    #[error("invalid render target: {0}")]
    InvalidRenderTarget(String),

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("out of GPU memory")]
    OutOfMemory,

    #[error("GPU device lost")]
    DeviceLost,

    #[error("backend error: {0}")]
    Backend(String),
}

impl GraphicsError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

pub type Result<T, E = GraphicsError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_enum_lists_choices() {
        let err = GraphicsError::UnknownEnum {
            kind: "filter mode",
            value: "bilinear".into(),
            expected: "linear, nearest".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid filter mode 'bilinear', expected one of: linear, nearest"
        );
    }

    #[test]
    fn texture_too_large_reports_limit() {
        let err = GraphicsError::TextureTooLarge { width: 9000, height: 2, max: 8192 };
        assert_eq!(err.to_string(), "cannot create a 9000x2 texture: maximum size is 8192");
    }
}
