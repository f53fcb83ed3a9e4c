use crate::backend::{GraphicsBackend, TextureId};
use crate::math::DrawParams;

use super::release::ReleaseQueue;
use super::{Filter, Quad, TextureSettings, Wrap};

/// Drawable GPU texture (images and canvases).
pub trait Texture {
    /// Source width in pixels.
    fn width(&self) -> f32;

    /// Source height in pixels.
    fn height(&self) -> f32;

    /// Backend handle; `None` while unloaded.
    fn handle(&self) -> Option<TextureId>;

    fn set_filter(&mut self, backend: &mut dyn GraphicsBackend, filter: Filter);

    fn filter(&self, backend: &dyn GraphicsBackend) -> Filter;

    fn set_wrap(&mut self, backend: &mut dyn GraphicsBackend, wrap: Wrap);

    fn wrap(&self, backend: &dyn GraphicsBackend) -> Wrap;

    /// Draws the whole texture.
    fn draw(&self, backend: &mut dyn GraphicsBackend, params: &DrawParams);

    /// Draws the region of the texture described by `quad`.
    fn draw_quad(&self, backend: &mut dyn GraphicsBackend, quad: &Quad, params: &DrawParams);

    #[inline]
    fn is_loaded(&self) -> bool {
        self.handle().is_some()
    }
}

/// Backend handle plus the sampler settings that survive unload/load.
///
/// Setters write through to the live texture and to the persisted settings;
/// getters read the live texture when one exists.
#[derive(Debug)]
pub(crate) struct TextureSlot {
    handle: Option<TextureId>,
    settings: TextureSettings,
    releases: ReleaseQueue,
}

impl TextureSlot {
    pub(crate) fn new(settings: TextureSettings, releases: ReleaseQueue) -> Self {
        Self { handle: None, settings, releases }
    }

    #[inline]
    pub(crate) fn handle(&self) -> Option<TextureId> {
        self.handle
    }

    /// Takes ownership of a freshly created texture and applies persisted settings.
    pub(crate) fn attach(&mut self, backend: &mut dyn GraphicsBackend, id: TextureId) {
        debug_assert!(self.handle.is_none(), "attach over a live texture");
        self.handle = Some(id);
        backend.set_filter(id, self.settings.filter);
        backend.set_wrap(id, self.settings.wrap);
    }

    /// Snapshots live settings, then frees the texture. Idempotent.
    pub(crate) fn release(&mut self, backend: &mut dyn GraphicsBackend) {
        let Some(id) = self.handle else { return };
        self.settings.filter = backend.filter(id).unwrap_or(self.settings.filter);
        self.settings.wrap = backend.wrap(id).unwrap_or(self.settings.wrap);
        backend.delete_texture(id);
        self.handle = None;
    }

    pub(crate) fn set_filter(&mut self, backend: &mut dyn GraphicsBackend, filter: Filter) {
        self.settings.filter = filter;
        if let Some(id) = self.handle {
            backend.set_filter(id, filter);
        }
    }

    pub(crate) fn filter(&self, backend: &dyn GraphicsBackend) -> Filter {
        self.handle
            .and_then(|id| backend.filter(id))
            .unwrap_or(self.settings.filter)
    }

    pub(crate) fn set_wrap(&mut self, backend: &mut dyn GraphicsBackend, wrap: Wrap) {
        self.settings.wrap = wrap;
        if let Some(id) = self.handle {
            backend.set_wrap(id, wrap);
        }
    }

    pub(crate) fn wrap(&self, backend: &dyn GraphicsBackend) -> Wrap {
        self.handle
            .and_then(|id| backend.wrap(id))
            .unwrap_or(self.settings.wrap)
    }
}

impl Drop for TextureSlot {
    fn drop(&mut self) {
        if let Some(id) = self.handle.take() {
            self.releases.push(id);
        }
    }
}
