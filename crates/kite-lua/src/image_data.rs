use std::sync::Arc;

use kite_engine::graphics::{BYTES_PER_PIXEL, ImageData};
use mlua::{ExternalResult, Lua, MetaMethod, Table, UserData, UserDataMethods};

/// `ImageData` userdata. Pixel channels are exposed as integers in 0..=255.
#[derive(Clone)]
pub struct LuaImageData(pub Arc<ImageData>);

impl UserData for LuaImageData {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_method("getWidth", |_, this, ()| Ok(this.0.width()));
        methods.add_method("getHeight", |_, this, ()| Ok(this.0.height()));
        methods.add_method("getDimensions", |_, this, ()| Ok((this.0.width(), this.0.height())));

        methods.add_method("getPixel", |_, this, (x, y): (i64, i64)| {
            let pixel = u32::try_from(x)
                .ok()
                .zip(u32::try_from(y).ok())
                .and_then(|(x, y)| this.0.pixel(x, y));
            match pixel {
                Some([r, g, b, a]) => Ok((r, g, b, a)),
                None => Err(mlua::Error::runtime(format!(
                    "pixel {x},{y} is outside the {}x{} image",
                    this.0.width(),
                    this.0.height()
                ))),
            }
        });

        methods.add_method("getString", |lua, this, ()| lua.create_string(this.0.pixels()));

        methods.add_method("encode", |_, this, path: String| {
            let png = this.0.encode_png().into_lua_err()?;
            std::fs::write(&path, png).into_lua_err()?;
            log::debug!("wrote {}x{} png to {path}", this.0.width(), this.0.height());
            Ok(())
        });

        methods.add_meta_method(MetaMethod::Eq, |_, this, other: mlua::AnyUserData| {
            Ok(other
                .borrow::<LuaImageData>()
                .is_ok_and(|other| Arc::ptr_eq(&other.0, &this.0)))
        });
    }
}

/// Builds the `kite.image` table.
pub(crate) fn module(lua: &Lua) -> mlua::Result<Table> {
    let module = lua.create_table()?;

    module.set(
        "newImageData",
        lua.create_function(|_, (w, h, bytes): (u32, u32, Option<mlua::String>)| {
            let data = match bytes {
                Some(bytes) => ImageData::from_pixels(w, h, bytes.as_bytes().to_vec()),
                None => ImageData::new(w, h),
            }
            .into_lua_err()?;
            Ok(LuaImageData(Arc::new(data)))
        })?,
    )?;
    module.set("BYTES_PER_PIXEL", BYTES_PER_PIXEL)?;

    Ok(module)
}

#[cfg(test)]
mod tests {
    use crate::test_support::{lua, run, run_err};

    #[test]
    fn new_image_data_is_transparent() {
        let (lua, _) = lua();
        run(
            &lua,
            r#"
            local d = kite.image.newImageData(3, 2)
            assert(d:getWidth() == 3 and d:getHeight() == 2)
            local r, g, b, a = d:getPixel(2, 1)
            assert(r == 0 and g == 0 and b == 0 and a == 0)
            "#,
        );
    }

    #[test]
    fn new_image_data_from_bytes() {
        let (lua, _) = lua();
        run(
            &lua,
            r#"
            local d = kite.image.newImageData(2, 1, string.char(1, 2, 3, 4, 5, 6, 7, 8))
            local r, g, b, a = d:getPixel(1, 0)
            assert(r == 5 and g == 6 and b == 7 and a == 8)
            assert(#d:getString() == 8)
            "#,
        );
    }

    #[test]
    fn short_byte_string_is_rejected() {
        let (lua, _) = lua();
        let err = run_err(&lua, r#"kite.image.newImageData(2, 2, "abc")"#);
        assert!(err.contains("needs 16"), "{err}");
    }

    #[test]
    fn get_pixel_out_of_range() {
        let (lua, _) = lua();
        let err = run_err(&lua, "kite.image.newImageData(2, 2):getPixel(2, 0)");
        assert!(err.contains("outside the 2x2 image"), "{err}");
        let err = run_err(&lua, "kite.image.newImageData(2, 2):getPixel(-1, 0)");
        assert!(err.contains("outside"), "{err}");
    }

    #[test]
    fn encode_writes_png() {
        let (lua, _) = lua();
        let path = std::env::temp_dir().join(format!("kite-lua-encode-{}.png", std::process::id()));
        lua.globals().set("path", path.to_string_lossy().into_owned()).unwrap();
        run(&lua, "kite.image.newImageData(4, 4):encode(path)");

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
        std::fs::remove_file(&path).unwrap();
    }
}
