use kite_engine::graphics::Quad;
use mlua::{UserData, UserDataMethods};

/// `Quad` userdata.
#[derive(Clone, Copy)]
pub struct LuaQuad(pub Quad);

impl UserData for LuaQuad {
    fn add_methods<M: UserDataMethods<Self>>(methods: &mut M) {
        methods.add_method("getViewport", |_, this, ()| Ok(this.0.viewport()));

        methods.add_method_mut(
            "setViewport",
            |_, this, (x, y, w, h): (f32, f32, f32, f32)| {
                this.0.set_viewport(x, y, w, h);
                Ok(())
            },
        );

        methods.add_method("getTextureDimensions", |_, this, ()| Ok(this.0.reference_size()));
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::{lua, run, run_err};

    #[test]
    fn viewport_round_trip() {
        let (lua, _) = lua();
        run(
            &lua,
            r#"
            local q = kite.graphics.newQuad(1, 2, 3, 4, 16, 8)
            local x, y, w, h = q:getViewport()
            assert(x == 1 and y == 2 and w == 3 and h == 4)
            q:setViewport(5, 6, 7, 8)
            x, y, w, h = q:getViewport()
            assert(x == 5 and y == 6 and w == 7 and h == 8)
            local sw, sh = q:getTextureDimensions()
            assert(sw == 16 and sh == 8)
            "#,
        );
    }

    #[test]
    fn zero_reference_size_is_rejected() {
        let (lua, _) = lua();
        let err = run_err(&lua, "kite.graphics.newQuad(0, 0, 1, 1, 0, 8)");
        assert!(err.contains("reference size must be positive"), "{err}");
    }
}
