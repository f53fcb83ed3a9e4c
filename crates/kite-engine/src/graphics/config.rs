use super::{Filter, PixelFormat};

/// Graphics-layer configuration.
///
/// Passed explicitly to [`Graphics::new`](super::Graphics::new); resources
/// read it at construction time, so changing it affects only resources created
/// afterwards.
#[derive(Debug, Clone)]
pub struct GraphicsConfig {
    /// Filter assigned to newly created images and canvases.
    pub default_filter: Filter,

    /// Maximum number of canvases that may be active at once.
    pub max_render_targets: usize,

    /// Format used by `new_canvas` when none is given.
    pub default_canvas_format: PixelFormat,
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            default_filter: Filter::default(),
            max_render_targets: 4,
            default_canvas_format: PixelFormat::Normal,
        }
    }
}
