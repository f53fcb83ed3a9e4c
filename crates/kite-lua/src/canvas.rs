use std::cell::RefCell;
use std::rc::Rc;

use kite_engine::graphics::{Canvas, CanvasRef, Graphics};
use mlua::{ExternalResult, Function, UserData, UserDataMethods};

use crate::image_data::LuaImageData;
use crate::texture::{TextureUserData, add_texture_methods};
use crate::{borrow, borrow_mut, shared_graphics};

/// `Canvas` userdata.
#[derive(Clone)]
pub struct LuaCanvas(pub CanvasRef);

impl TextureUserData for LuaCanvas {
    type Resource = Canvas;

    fn resource(&self) -> &Rc<RefCell<Canvas>> {
        &self.0
    }
}

impl UserData for LuaCanvas {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        add_texture_methods(methods);

        // Results of `f` are discarded; its error propagates after the
        // previous targets are back in place.
        methods.add_method("renderTo", |lua, this, f: Function| {
            let graphics = shared_graphics(lua)?;
            Graphics::render_to(&graphics, &this.0, || f.call::<()>(())).into_lua_err()??;
            Ok(())
        });

        methods.add_method(
            "newImageData",
            |lua, this, (x, y, w, h): (Option<i64>, Option<i64>, Option<i64>, Option<i64>)| {
                let graphics = shared_graphics(lua)?;
                let mut graphics = borrow_mut(&graphics)?;
                let canvas = borrow(&this.0)?;
                let (width, height) = canvas.dimensions();

                let data = graphics
                    .new_image_data(
                        &canvas,
                        x.unwrap_or(0),
                        y.unwrap_or(0),
                        w.unwrap_or(i64::from(width)),
                        h.unwrap_or(i64::from(height)),
                    )
                    .into_lua_err()?;
                Ok(LuaImageData(data))
            },
        );

        methods.add_method("getFormat", |_, this, ()| Ok(borrow(&this.0)?.format().name()));

        methods.add_method("getMSAA", |_, this, ()| Ok(borrow(&this.0)?.msaa()));

        methods.add_meta_method("__tostring", |_, this, ()| {
            let canvas = borrow(&this.0)?;
            let (w, h) = canvas.dimensions();
            Ok(format!("Canvas({w}x{h} {})", canvas.format()))
        });
    }
}
