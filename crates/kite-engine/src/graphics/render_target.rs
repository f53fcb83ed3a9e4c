use super::{CanvasRef, GraphicsError, Result, SharedGraphics};

/// Restores the canvas stack captured at construction when dropped.
///
/// Restoration runs on every exit path, including early returns and panic
/// unwinding. If the previous stack can no longer be applied the guard falls
/// back to the screen.
pub struct RenderTargetGuard {
    graphics: SharedGraphics,
    previous: Vec<CanvasRef>,
}

impl RenderTargetGuard {
    pub fn capture(graphics: &SharedGraphics) -> Result<Self> {
        let previous = graphics
            .try_borrow()
            .map_err(|_| GraphicsError::InvalidOperation("graphics context is busy".into()))?
            .canvases();

        Ok(Self { graphics: graphics.clone(), previous })
    }

    #[inline]
    pub fn previous(&self) -> &[CanvasRef] {
        &self.previous
    }
}

impl Drop for RenderTargetGuard {
    fn drop(&mut self) {
        let Ok(mut graphics) = self.graphics.try_borrow_mut() else {
            log::error!("render target restore skipped: graphics context is borrowed");
            return;
        };

        let previous = std::mem::take(&mut self.previous);
        if let Err(err) = graphics.set_canvases(previous) {
            log::warn!("could not restore previous render targets ({err}), drawing to screen");
            if let Err(err) = graphics.set_canvases(Vec::new()) {
                log::error!("could not reset render targets: {err}");
            }
        }
    }
}
