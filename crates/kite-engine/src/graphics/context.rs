use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use crate::backend::{GraphicsBackend, TextureId};
use crate::math::DrawParams;

use super::release::ReleaseQueue;
use super::render_target::RenderTargetGuard;
use super::volatile::VolatileRegistry;
use super::{
    Canvas, Feature, Filter, GraphicsConfig, GraphicsError, Image, ImageData, PixelFormat, Quad,
    Result, Texture,
};

pub type SharedGraphics = Rc<RefCell<Graphics>>;
pub type ImageRef = Rc<RefCell<Image>>;
pub type CanvasRef = Rc<RefCell<Canvas>>;

/// Owner of the backend and of the current render-target stack.
///
/// Resources created here are registered for context-loss handling and
/// release their textures through a queue that is drained before each call
/// into the backend.
pub struct Graphics {
    backend: Box<dyn GraphicsBackend>,
    config: GraphicsConfig,

    /// Active canvases; empty = screen.
    canvases: Vec<CanvasRef>,
    /// Handles of `canvases` as last applied to the backend.
    targets: Vec<TextureId>,
    /// Stack set aside by `unload_volatile`, re-applied by `load_volatile`.
    suspended: Option<Vec<CanvasRef>>,

    volatiles: VolatileRegistry,
    releases: ReleaseQueue,
}

impl Graphics {
    pub fn new(backend: impl GraphicsBackend + 'static, config: GraphicsConfig) -> Self {
        log::debug!(
            "graphics: npot={}, max texture size={}",
            backend.supports_npot(),
            backend.max_texture_size()
        );
        Self {
            backend: Box::new(backend),
            config,
            canvases: Vec::new(),
            targets: Vec::new(),
            suspended: None,
            volatiles: VolatileRegistry::default(),
            releases: ReleaseQueue::default(),
        }
    }

    pub fn into_shared(self) -> SharedGraphics {
        Rc::new(RefCell::new(self))
    }

    #[inline]
    pub fn config(&self) -> &GraphicsConfig {
        &self.config
    }

    /// Filter given to images and canvases created from now on.
    pub fn set_default_filter(&mut self, filter: Filter) {
        self.config.default_filter = filter;
    }

    #[inline]
    pub fn default_filter(&self) -> Filter {
        self.config.default_filter
    }

    #[inline]
    pub fn backend(&self) -> &dyn GraphicsBackend {
        self.backend.as_ref()
    }

    #[inline]
    pub fn backend_mut(&mut self) -> &mut dyn GraphicsBackend {
        self.backend.as_mut()
    }

    /// Size of the screen render target.
    pub fn dimensions(&self) -> (u32, u32) {
        self.backend.screen_size()
    }

    pub fn is_supported(&self, feature: Feature) -> bool {
        let backend = self.backend.as_ref();
        match feature {
            Feature::Canvas => backend.supports_canvas_format(PixelFormat::Normal),
            Feature::Npot => backend.supports_npot(),
            Feature::MultiCanvas => self.config.max_render_targets > 1,
            Feature::HdrCanvas => backend.supports_canvas_format(PixelFormat::Hdr),
            Feature::Msaa => backend.supported_msaa(PixelFormat::Normal, 2) > 1,
        }
    }

    // ── resources ─────────────────────────────────────────────────────────

    pub fn new_image(&mut self, data: Arc<ImageData>) -> Result<ImageRef> {
        self.collect_garbage();

        let mut image = Image::new(data, &self.config, self.releases.clone());
        image.load(self.backend.as_mut())?;

        let image = Rc::new(RefCell::new(image));
        self.volatiles.register(image.clone());
        Ok(image)
    }

    pub fn new_canvas(
        &mut self,
        width: u32,
        height: u32,
        format: Option<PixelFormat>,
        msaa: u32,
    ) -> Result<CanvasRef> {
        self.collect_garbage();

        let max = self.backend.max_texture_size();
        if width > max || height > max {
            return Err(GraphicsError::TextureTooLarge { width, height, max });
        }
        let format = format.unwrap_or(self.config.default_canvas_format);

        let mut canvas =
            Canvas::new(width, height, format, msaa, &self.config, self.releases.clone())?;
        canvas.load(self.backend.as_mut())?;

        let canvas = Rc::new(RefCell::new(canvas));
        self.volatiles.register(canvas.clone());
        Ok(canvas)
    }

    // ── render targets ────────────────────────────────────────────────────

    /// Sets a single canvas as the render target, or the screen for `None`.
    pub fn set_canvas(&mut self, canvas: Option<CanvasRef>) -> Result<()> {
        self.set_canvases(canvas.into_iter().collect())
    }

    /// Replaces the render-target stack. An empty list selects the screen.
    ///
    /// All canvases must be loaded, distinct and of equal size. On error the
    /// current stack is left untouched.
    pub fn set_canvases(&mut self, canvases: Vec<CanvasRef>) -> Result<()> {
        if canvases.len() > self.config.max_render_targets {
            return Err(GraphicsError::InvalidRenderTarget(format!(
                "{} canvases given, at most {} can be active",
                canvases.len(),
                self.config.max_render_targets
            )));
        }

        let mut targets = Vec::with_capacity(canvases.len());
        let mut size = None;
        for (i, canvas) in canvases.iter().enumerate() {
            if canvases[..i].iter().any(|other| Rc::ptr_eq(other, canvas)) {
                return Err(GraphicsError::InvalidRenderTarget(
                    "the same canvas was given more than once".into(),
                ));
            }

            let canvas = canvas
                .try_borrow()
                .map_err(|_| GraphicsError::InvalidOperation("canvas is in use".into()))?;
            let dims = canvas.dimensions();
            if *size.get_or_insert(dims) != dims {
                return Err(GraphicsError::InvalidRenderTarget(
                    "all active canvases must have the same dimensions".into(),
                ));
            }
            let id = canvas.handle().ok_or_else(|| {
                GraphicsError::InvalidRenderTarget("canvas is not loaded".into())
            })?;
            targets.push(id);
        }

        self.collect_garbage();
        self.backend.set_render_targets(&targets)?;
        self.canvases = canvases;
        self.targets = targets;
        Ok(())
    }

    /// Current render-target stack; empty when drawing to the screen.
    pub fn canvases(&self) -> Vec<CanvasRef> {
        self.canvases.clone()
    }

    /// Runs `f` with `canvas` as the only render target, then restores the
    /// previous stack.
    ///
    /// The previous stack is restored however `f` exits, including by
    /// panicking. No borrow of `graphics` is held while `f` runs.
    pub fn render_to<R>(
        graphics: &SharedGraphics,
        canvas: &CanvasRef,
        f: impl FnOnce() -> R,
    ) -> Result<R> {
        let guard = RenderTargetGuard::capture(graphics)?;
        graphics
            .try_borrow_mut()
            .map_err(|_| GraphicsError::InvalidOperation("graphics context is busy".into()))?
            .set_canvas(Some(canvas.clone()))?;

        let out = f();
        drop(guard);
        Ok(out)
    }

    // ── drawing ───────────────────────────────────────────────────────────

    pub fn draw(&mut self, texture: &dyn Texture, params: &DrawParams) -> Result<()> {
        self.check_drawable(texture)?;
        texture.draw(self.backend.as_mut(), params);
        Ok(())
    }

    pub fn draw_quad(&mut self, texture: &dyn Texture, quad: &Quad, params: &DrawParams) -> Result<()> {
        self.check_drawable(texture)?;
        texture.draw_quad(self.backend.as_mut(), quad, params);
        Ok(())
    }

    fn check_drawable(&mut self, texture: &dyn Texture) -> Result<()> {
        self.collect_garbage();
        match texture.handle() {
            Some(id) if self.targets.contains(&id) => Err(GraphicsError::InvalidOperation(
                "cannot draw a canvas to itself".into(),
            )),
            _ => Ok(()),
        }
    }

    /// Clears the active render targets (or the screen).
    pub fn clear(&mut self, color: [f32; 4]) {
        self.collect_garbage();
        self.backend.clear(color);
    }

    /// Reads back part of `canvas`.
    pub fn new_image_data(
        &mut self,
        canvas: &Canvas,
        x: i64,
        y: i64,
        w: i64,
        h: i64,
    ) -> Result<Arc<ImageData>> {
        self.collect_garbage();
        canvas.new_image_data(self.backend.as_mut(), x, y, w, h)
    }

    /// Copies the screen into a new [`ImageData`].
    pub fn new_screenshot(&mut self) -> Result<Arc<ImageData>> {
        self.collect_garbage();
        let (width, height) = self.backend.screen_size();
        let pixels = self.backend.read_screen()?;
        Ok(Arc::new(ImageData::from_pixels(width, height, pixels)?))
    }

    /// Ends the frame: frees released textures and submits pending work.
    pub fn present(&mut self) {
        self.collect_garbage();
        self.backend.flush();
    }

    // ── context loss ──────────────────────────────────────────────────────

    /// Frees the GPU side of every live image and canvas.
    ///
    /// The render-target stack is set aside and re-applied by
    /// [`load_volatile`](Self::load_volatile); until then drawing goes to
    /// the screen.
    pub fn unload_volatile(&mut self) {
        self.collect_garbage();

        let mut count = 0;
        for resource in self.volatiles.live() {
            match resource.try_borrow_mut() {
                Ok(mut resource) => {
                    resource.unload(self.backend.as_mut());
                    count += 1;
                }
                Err(_) => log::warn!("skipping unload of a resource that is in use"),
            }
        }

        let canvases = std::mem::take(&mut self.canvases);
        self.suspended.get_or_insert(canvases);
        self.targets.clear();
        if let Err(err) = self.backend.set_render_targets(&[]) {
            log::warn!("could not reset render targets: {err}");
        }
        log::debug!("unloaded {count} volatile resources");
    }

    /// Recreates every live image and canvas after [`unload_volatile`](Self::unload_volatile).
    ///
    /// Every resource is attempted; the first failure is returned.
    pub fn load_volatile(&mut self) -> Result<()> {
        self.collect_garbage();

        let mut first_err = None;
        let mut count = 0;
        for resource in self.volatiles.live() {
            let result = match resource.try_borrow_mut() {
                Ok(mut resource) => resource.load(self.backend.as_mut()),
                Err(_) => Err(GraphicsError::InvalidOperation("resource is in use".into())),
            };
            match result {
                Ok(()) => count += 1,
                Err(err) => {
                    log::warn!("failed to reload resource: {err}");
                    first_err.get_or_insert(err);
                }
            }
        }
        log::debug!("reloaded {count} volatile resources");

        let canvases = match self.suspended.take() {
            Some(canvases) => canvases,
            None => std::mem::take(&mut self.canvases),
        };
        if let Err(err) = self.set_canvases(canvases) {
            log::warn!("render targets lost with the context: {err}");
            first_err.get_or_insert(err);
        }

        first_err.map_or(Ok(()), Err)
    }

    /// Deletes textures of dropped resources. Returns how many were freed.
    pub fn collect_garbage(&mut self) -> usize {
        if self.releases.is_empty() {
            return 0;
        }
        let freed = self.releases.drain_into(self.backend.as_mut());
        self.volatiles.prune();
        log::trace!("released {freed} textures");
        freed
    }

    /// Number of live images and canvases.
    pub fn live_resources(&self) -> usize {
        self.volatiles.len()
    }
}

impl Drop for Graphics {
    fn drop(&mut self) {
        self.canvases.clear();
        self.releases.drain_into(self.backend.as_mut());
    }
}
