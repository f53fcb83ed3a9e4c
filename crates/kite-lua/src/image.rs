use std::cell::RefCell;
use std::rc::Rc;

use kite_engine::graphics::{Image, ImageRef};
use mlua::{UserData, UserDataMethods};

use crate::borrow;
use crate::image_data::LuaImageData;
use crate::texture::{TextureUserData, add_texture_methods};

/// `Image` userdata.
#[derive(Clone)]
pub struct LuaImage(pub ImageRef);

impl TextureUserData for LuaImage {
    type Resource = Image;

    fn resource(&self) -> &Rc<RefCell<Image>> {
        &self.0
    }
}

impl UserData for LuaImage {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        add_texture_methods(methods);

        methods.add_method("getData", |_, this, ()| {
            Ok(LuaImageData(borrow(&this.0)?.data().clone()))
        });
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::{lua, run, run_err};

    #[test]
    fn image_reports_source_size() {
        let (lua, _) = lua();
        run(
            &lua,
            r#"
            local data = kite.image.newImageData(5, 3)
            local img = kite.graphics.newImage(data)
            local w, h = img:getDimensions()
            assert(w == 5 and h == 3)
            assert(img:getData() == data)
            "#,
        );
    }

    #[test]
    fn image_filter_defaults_to_graphics_default() {
        let (lua, _) = lua();
        run(
            &lua,
            r#"
            local g = kite.graphics
            g.setDefaultFilter("nearest", "linear")
            local img = g.newImage(kite.image.newImageData(2, 2))
            local min, mag = img:getFilter()
            assert(min == "nearest" and mag == "linear")
            "#,
        );
    }

    #[test]
    fn image_wrap_defaults_to_clamp() {
        let (lua, _) = lua();
        run(
            &lua,
            r#"
            local img = kite.graphics.newImage(kite.image.newImageData(2, 2))
            local s, t = img:getWrap()
            assert(s == "clamp" and t == "clamp")
            img:setWrap("repeat")
            s, t = img:getWrap()
            assert(s == "repeat" and t == "repeat")
            "#,
        );
    }

    #[test]
    fn invalid_wrap_name() {
        let (lua, _) = lua();
        let err = run_err(
            &lua,
            r#"kite.graphics.newImage(kite.image.newImageData(2, 2)):setWrap("tile")"#,
        );
        assert!(err.contains("invalid wrap mode 'tile'"), "{err}");
    }

    #[test]
    fn images_compare_by_identity() {
        let (lua, _) = lua();
        run(
            &lua,
            r#"
            local data = kite.image.newImageData(2, 2)
            local a = kite.graphics.newImage(data)
            local b = kite.graphics.newImage(data)
            assert(a == a and a ~= b)
            "#,
        );
    }
}
