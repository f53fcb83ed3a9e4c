use std::cell::RefCell;
use std::rc::Rc;

use crate::backend::{GraphicsBackend, TextureId};

/// Handles of dropped resources awaiting deletion.
///
/// Resources do not own the backend, so their `Drop` only records the handle;
/// [`Graphics`](super::Graphics) deletes queued handles before its next call
/// into the backend.
#[derive(Debug, Clone, Default)]
pub(crate) struct ReleaseQueue(Rc<RefCell<Vec<TextureId>>>);

impl ReleaseQueue {
    pub(crate) fn push(&self, id: TextureId) {
        self.0.borrow_mut().push(id);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Deletes every queued handle. Returns how many were freed.
    pub(crate) fn drain_into(&self, backend: &mut dyn GraphicsBackend) -> usize {
        let ids = std::mem::take(&mut *self.0.borrow_mut());
        for id in &ids {
            backend.delete_texture(*id);
        }
        ids.len()
    }
}
