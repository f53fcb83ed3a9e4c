use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::backend::GraphicsBackend;

use super::Result;

/// A resource whose GPU side is lost with the graphics context.
pub trait Volatile {
    /// Recreates GPU state from retained CPU-side data.
    fn load(&mut self, backend: &mut dyn GraphicsBackend) -> Result<()>;

    /// Frees GPU state, keeping whatever is needed to `load` again.
    fn unload(&mut self, backend: &mut dyn GraphicsBackend);
}

/// Weak list of live volatile resources.
#[derive(Default)]
pub(crate) struct VolatileRegistry {
    entries: Vec<Weak<RefCell<dyn Volatile>>>,
}

impl VolatileRegistry {
    pub(crate) fn register(&mut self, resource: Rc<RefCell<dyn Volatile>>) {
        self.prune();
        self.entries.push(Rc::downgrade(&resource));
    }

    /// Drops entries whose resource no longer exists.
    pub(crate) fn prune(&mut self) {
        self.entries.retain(|w| w.strong_count() > 0);
    }

    pub(crate) fn live(&self) -> impl Iterator<Item = Rc<RefCell<dyn Volatile>>> + '_ {
        self.entries.iter().filter_map(Weak::upgrade)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.iter().filter(|w| w.strong_count() > 0).count()
    }
}
