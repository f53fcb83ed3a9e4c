//! Lua bindings for the kite graphics layer.
//!
//! [`register`] installs a global `kite` table with two modules:
//! - `kite.graphics`: resource creation, render targets, drawing
//! - `kite.image`: CPU-side pixel data
//!
//! Engine errors surface in Lua as ordinary runtime errors carrying the
//! engine's message. Bad argument types are reported by mlua's conversions.

mod canvas;
mod graphics;
mod image;
mod image_data;
mod quad;
mod texture;

use std::cell::{Ref, RefCell, RefMut};

use kite_engine::graphics::SharedGraphics;
use mlua::{Lua, Table};

pub use canvas::LuaCanvas;
pub use image::LuaImage;
pub use image_data::LuaImageData;
pub use quad::LuaQuad;

/// Installs the `kite` global bound to `graphics`.
pub fn register(lua: &Lua, graphics: SharedGraphics) -> mlua::Result<()> {
    lua.set_app_data(graphics);

    let kite: Table = match lua.globals().get::<Option<Table>>("kite")? {
        Some(existing) => existing,
        None => lua.create_table()?,
    };
    kite.set("graphics", graphics::module(lua)?)?;
    kite.set("image", image_data::module(lua)?)?;
    lua.globals().set("kite", kite)?;

    log::debug!("kite lua modules registered");
    Ok(())
}

/// Graphics context registered with [`register`].
pub(crate) fn shared_graphics(lua: &Lua) -> mlua::Result<SharedGraphics> {
    lua.app_data_ref::<SharedGraphics>()
        .map(|g| g.clone())
        .ok_or_else(|| mlua::Error::runtime("kite.graphics is not initialized"))
}

pub(crate) fn borrow<T: ?Sized>(cell: &RefCell<T>) -> mlua::Result<Ref<'_, T>> {
    cell.try_borrow()
        .map_err(|_| mlua::Error::runtime("object is being modified"))
}

pub(crate) fn borrow_mut<T: ?Sized>(cell: &RefCell<T>) -> mlua::Result<RefMut<'_, T>> {
    cell.try_borrow_mut()
        .map_err(|_| mlua::Error::runtime("object is in use"))
}

#[cfg(test)]
pub(crate) mod test_support {
    use kite_engine::backend::HeadlessBackend;
    use kite_engine::graphics::{Graphics, GraphicsConfig};
    use mlua::Lua;

    /// Lua state with `kite` registered against a headless backend.
    pub fn lua() -> (Lua, HeadlessBackend) {
        let backend = HeadlessBackend::with_screen(64, 48);
        let graphics = Graphics::new(backend.clone(), GraphicsConfig::default()).into_shared();
        let lua = Lua::new();
        super::register(&lua, graphics).unwrap();
        (lua, backend)
    }

    /// Runs `chunk`, panicking with the Lua error on failure.
    pub fn run(lua: &Lua, chunk: &str) {
        if let Err(err) = lua.load(chunk).exec() {
            panic!("lua error: {err}");
        }
    }

    /// Runs `chunk` and returns the error message it raised.
    pub fn run_err(lua: &Lua, chunk: &str) -> String {
        match lua.load(chunk).exec() {
            Ok(()) => panic!("chunk succeeded unexpectedly"),
            Err(err) => err.to_string(),
        }
    }
}
