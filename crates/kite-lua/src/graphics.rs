//! The `kite.graphics` table.

use std::cell::RefCell;
use std::rc::Rc;

use kite_engine::graphics::{CanvasRef, Feature, PixelFormat, Quad, Texture};
use kite_engine::math::DrawParams;
use mlua::{AnyUserData, ExternalResult, Lua, MultiValue, Table, UserDataRef, Value, Variadic};

use crate::canvas::LuaCanvas;
use crate::image::LuaImage;
use crate::image_data::LuaImageData;
use crate::quad::LuaQuad;
use crate::texture::parse_filter;
use crate::{borrow, borrow_mut, shared_graphics};

pub(crate) fn module(lua: &Lua) -> mlua::Result<Table> {
    let module = lua.create_table()?;

    module.set(
        "newImage",
        lua.create_function(|lua, data: UserDataRef<LuaImageData>| {
            let graphics = shared_graphics(lua)?;
            let image = borrow_mut(&graphics)?.new_image(data.0.clone()).into_lua_err()?;
            Ok(LuaImage(image))
        })?,
    )?;

    module.set(
        "newCanvas",
        lua.create_function(
            |lua, (w, h, format, msaa): (Option<u32>, Option<u32>, Option<String>, Option<u32>)| {
                let graphics = shared_graphics(lua)?;
                let mut graphics = borrow_mut(&graphics)?;
                let (sw, sh) = graphics.dimensions();
                let format = format
                    .map(|name| name.parse::<PixelFormat>())
                    .transpose()
                    .into_lua_err()?;

                let canvas = graphics
                    .new_canvas(w.unwrap_or(sw), h.unwrap_or(sh), format, msaa.unwrap_or(0))
                    .into_lua_err()?;
                Ok(LuaCanvas(canvas))
            },
        )?,
    )?;

    module.set(
        "newQuad",
        lua.create_function(|_, (x, y, w, h, sw, sh): (f32, f32, f32, f32, f32, f32)| {
            Ok(LuaQuad(Quad::new(x, y, w, h, sw, sh).into_lua_err()?))
        })?,
    )?;

    module.set(
        "setCanvas",
        lua.create_function(|lua, args: MultiValue| {
            let canvases = canvas_list(args)?;
            let graphics = shared_graphics(lua)?;
            borrow_mut(&graphics)?.set_canvases(canvases).into_lua_err()
        })?,
    )?;

    module.set(
        "getCanvas",
        lua.create_function(|lua, ()| {
            let graphics = shared_graphics(lua)?;
            let canvases = borrow(&graphics)?.canvases();
            Ok(canvases.into_iter().map(LuaCanvas).collect::<Variadic<_>>())
        })?,
    )?;

    module.set(
        "draw",
        lua.create_function(|lua, (drawable, mut rest): (AnyUserData, MultiValue)| {
            let texture = drawable_texture(&drawable)?;

            let quad = match rest.front() {
                Some(Value::UserData(ud)) if ud.is::<LuaQuad>() => Some(ud.borrow::<LuaQuad>()?.0),
                _ => None,
            };
            if quad.is_some() {
                rest.pop_front();
            }
            let params = draw_params(lua, rest)?;

            let graphics = shared_graphics(lua)?;
            let mut graphics = borrow_mut(&graphics)?;
            let texture = borrow(&texture)?;
            match quad {
                Some(quad) => graphics.draw_quad(&*texture, &quad, &params),
                None => graphics.draw(&*texture, &params),
            }
            .into_lua_err()
        })?,
    )?;

    module.set(
        "clear",
        lua.create_function(
            |lua, (r, g, b, a): (Option<f32>, Option<f32>, Option<f32>, Option<f32>)| {
                let color = [
                    r.unwrap_or(0.0) / 255.0,
                    g.unwrap_or(0.0) / 255.0,
                    b.unwrap_or(0.0) / 255.0,
                    a.unwrap_or(255.0) / 255.0,
                ];
                let graphics = shared_graphics(lua)?;
                borrow_mut(&graphics)?.clear(color);
                Ok(())
            },
        )?,
    )?;

    module.set(
        "setDefaultFilter",
        lua.create_function(|lua, (min, mag): (String, Option<String>)| {
            let filter = parse_filter(&min, mag.as_deref())?;
            let graphics = shared_graphics(lua)?;
            borrow_mut(&graphics)?.set_default_filter(filter);
            Ok(())
        })?,
    )?;

    module.set(
        "getDefaultFilter",
        lua.create_function(|lua, ()| {
            let graphics = shared_graphics(lua)?;
            let filter = borrow(&graphics)?.default_filter();
            Ok((filter.min.name(), filter.mag.name()))
        })?,
    )?;

    module.set(
        "isSupported",
        lua.create_function(|lua, names: Variadic<String>| {
            let graphics = shared_graphics(lua)?;
            let graphics = borrow(&graphics)?;
            for name in names.iter() {
                let feature: Feature = name.parse().into_lua_err()?;
                if !graphics.is_supported(feature) {
                    return Ok(false);
                }
            }
            Ok(true)
        })?,
    )?;

    module.set(
        "newScreenshot",
        lua.create_function(|lua, ()| {
            let graphics = shared_graphics(lua)?;
            let data = borrow_mut(&graphics)?.new_screenshot().into_lua_err()?;
            Ok(LuaImageData(data))
        })?,
    )?;

    module.set(
        "present",
        lua.create_function(|lua, ()| {
            let graphics = shared_graphics(lua)?;
            borrow_mut(&graphics)?.present();
            Ok(())
        })?,
    )?;

    module.set(
        "getDimensions",
        lua.create_function(|lua, ()| {
            let graphics = shared_graphics(lua)?;
            let dims = borrow(&graphics)?.dimensions();
            Ok(dims)
        })?,
    )?;
    module.set(
        "getWidth",
        lua.create_function(|lua, ()| {
            let graphics = shared_graphics(lua)?;
            let (w, _) = borrow(&graphics)?.dimensions();
            Ok(w)
        })?,
    )?;
    module.set(
        "getHeight",
        lua.create_function(|lua, ()| {
            let graphics = shared_graphics(lua)?;
            let (_, h) = borrow(&graphics)?.dimensions();
            Ok(h)
        })?,
    )?;

    Ok(module)
}

/// Accepts nothing or a lone `nil` (the screen), a list of canvases, or a
/// single table holding them.
fn canvas_list(args: MultiValue) -> mlua::Result<Vec<CanvasRef>> {
    let mut values: Vec<Value> = args.into_iter().collect();
    if let Some(Value::Table(table)) = values.first().cloned() {
        values = table.sequence_values::<Value>().collect::<mlua::Result<_>>()?;
    }
    match values.as_slice() {
        [] | [Value::Nil] => return Ok(Vec::new()),
        [Value::Nil, ..] => {
            return Err(mlua::Error::runtime("expected Canvas, got nil"));
        }
        _ => {}
    }

    values
        .iter()
        .map(|value| match value {
            Value::UserData(ud) => Ok(ud.borrow::<LuaCanvas>()?.0.clone()),
            other => Err(mlua::Error::runtime(format!(
                "expected Canvas, got {}",
                script_type_name(other)
            ))),
        })
        .collect()
}

/// Type name as Lua's `type()` reports it.
fn script_type_name(value: &Value) -> &'static str {
    match value {
        Value::Integer(_) | Value::Number(_) => "number",
        other => other.type_name(),
    }
}

fn drawable_texture(drawable: &AnyUserData) -> mlua::Result<Rc<RefCell<dyn Texture>>> {
    if let Ok(image) = drawable.borrow::<LuaImage>() {
        return Ok(image.0.clone());
    }
    if let Ok(canvas) = drawable.borrow::<LuaCanvas>() {
        return Ok(canvas.0.clone());
    }
    Err(mlua::Error::runtime("expected a drawable (Image or Canvas)"))
}

fn draw_params(lua: &Lua, args: MultiValue) -> mlua::Result<DrawParams> {
    type Args = (
        Option<f32>,
        Option<f32>,
        Option<f32>,
        Option<f32>,
        Option<f32>,
        Option<f32>,
        Option<f32>,
        Option<f32>,
        Option<f32>,
    );
    let (x, y, angle, sx, sy, ox, oy, kx, ky): Args = lua.unpack_multi(args)?;

    let sx = sx.unwrap_or(1.0);
    Ok(DrawParams {
        x: x.unwrap_or(0.0),
        y: y.unwrap_or(0.0),
        angle: angle.unwrap_or(0.0),
        sx,
        sy: sy.unwrap_or(sx),
        ox: ox.unwrap_or(0.0),
        oy: oy.unwrap_or(0.0),
        kx: kx.unwrap_or(0.0),
        ky: ky.unwrap_or(0.0),
    })
}

#[cfg(test)]
mod tests {
    use crate::test_support::{lua, run, run_err};

    #[test]
    fn canvas_defaults_to_screen_size() {
        let (lua, _) = lua();
        run(
            &lua,
            r#"
            local g = kite.graphics
            local w, h = g.newCanvas():getDimensions()
            assert(w == 64 and h == 48)
            assert(g.getWidth() == 64 and g.getHeight() == 48)
            "#,
        );
    }

    #[test]
    fn set_canvas_accepts_lists_and_tables() {
        let (lua, _) = lua();
        run(
            &lua,
            r#"
            local g = kite.graphics
            local a = g.newCanvas(8, 8)
            local b = g.newCanvas(8, 8)
            g.setCanvas(a, b)
            local x, y = g.getCanvas()
            assert(x == a and y == b)
            g.setCanvas({b, a})
            x, y = g.getCanvas()
            assert(x == b and y == a)
            g.setCanvas()
            assert(select('#', g.getCanvas()) == 0)
            g.setCanvas(a)
            g.setCanvas(nil)
            assert(g.getCanvas() == nil)
            "#,
        );
    }

    #[test]
    fn mismatched_canvases_keep_previous_stack() {
        let (lua, _) = lua();
        run(
            &lua,
            r#"
            local g = kite.graphics
            local a = g.newCanvas(8, 8)
            local b = g.newCanvas(4, 4)
            g.setCanvas(a)
            local ok, err = pcall(g.setCanvas, a, b)
            assert(not ok)
            assert(tostring(err):find("same dimensions"), tostring(err))
            assert(g.getCanvas() == a)
            "#,
        );
    }

    #[test]
    fn set_canvas_rejects_non_canvas_values() {
        let (lua, _) = lua();
        let err = run_err(&lua, "kite.graphics.setCanvas(42)");
        assert!(err.contains("expected Canvas, got number"), "{err}");
        let err = run_err(&lua, "kite.graphics.setCanvas(1.5)");
        assert!(err.contains("expected Canvas, got number"), "{err}");
        let err = run_err(&lua, r#"kite.graphics.setCanvas("a")"#);
        assert!(err.contains("expected Canvas, got string"), "{err}");
    }

    #[test]
    fn set_canvas_rejects_nil_before_canvases() {
        let (lua, _) = lua();
        run(
            &lua,
            r#"
            local g = kite.graphics
            local a = g.newCanvas(8, 8)
            local b = g.newCanvas(8, 8)
            g.setCanvas(a)
            local ok, err = pcall(g.setCanvas, nil, b)
            assert(not ok)
            assert(tostring(err):find("expected Canvas, got nil"), tostring(err))
            assert(g.getCanvas() == a)
            "#,
        );
    }

    #[test]
    fn draw_records_transformed_quad() {
        let (lua, backend) = lua();
        run(
            &lua,
            r#"
            local g = kite.graphics
            local img = g.newImage(kite.image.newImageData(4, 2))
            g.draw(img, 10, 20, 0, 2)
            "#,
        );

        let draws = backend.draws();
        assert_eq!(draws.len(), 1);
        let v = draws[0].vertices;
        assert_eq!((v[0].x, v[0].y), (10.0, 20.0));
        assert_eq!((v[2].x, v[2].y), (18.0, 24.0));
        assert!(draws[0].targets.is_empty());
    }

    #[test]
    fn draw_with_quad() {
        let (lua, backend) = lua();
        run(
            &lua,
            r#"
            local g = kite.graphics
            local img = g.newImage(kite.image.newImageData(8, 8))
            local q = g.newQuad(0, 0, 2, 3, 8, 8)
            g.draw(img, q, 1, 1)
            "#,
        );

        let v = backend.draws()[0].vertices;
        assert_eq!((v[2].x, v[2].y), (3.0, 4.0));
    }

    #[test]
    fn drawing_active_canvas_is_an_error() {
        let (lua, _) = lua();
        let err = run_err(
            &lua,
            r#"
            local g = kite.graphics
            local c = g.newCanvas(8, 8)
            c:renderTo(function() g.draw(c, 0, 0) end)
            "#,
        );
        assert!(err.contains("cannot draw a canvas to itself"), "{err}");
    }

    #[test]
    fn draw_rejects_non_drawables() {
        let (lua, _) = lua();
        let err = run_err(
            &lua,
            "kite.graphics.draw(kite.graphics.newQuad(0, 0, 1, 1, 1, 1), 0, 0)",
        );
        assert!(err.contains("expected a drawable"), "{err}");
    }

    #[test]
    fn clear_uses_byte_colors() {
        let (lua, _) = lua();
        run(
            &lua,
            r#"
            local g = kite.graphics
            local c = g.newCanvas(2, 2)
            g.setCanvas(c)
            g.clear(10, 20, 30)
            g.setCanvas()
            local r, gr, b, a = c:newImageData():getPixel(0, 0)
            assert(r == 10 and gr == 20 and b == 30 and a == 255, table.concat({r, gr, b, a}, ","))
            "#,
        );
    }

    #[test]
    fn default_filter_round_trip() {
        let (lua, _) = lua();
        run(
            &lua,
            r#"
            local g = kite.graphics
            local min, mag = g.getDefaultFilter()
            assert(min == "linear" and mag == "linear")
            g.setDefaultFilter("nearest")
            min, mag = g.getDefaultFilter()
            assert(min == "nearest" and mag == "nearest")
            "#,
        );
    }

    #[test]
    fn is_supported_checks_every_feature() {
        let (lua, _) = lua();
        run(
            &lua,
            r#"
            local g = kite.graphics
            assert(g.isSupported("canvas"))
            assert(g.isSupported("canvas", "npot", "multicanvas", "msaa"))
            "#,
        );
        let err = run_err(&lua, r#"kite.graphics.isSupported("shaders")"#);
        assert!(err.contains("invalid graphics feature 'shaders'"), "{err}");
    }

    #[test]
    fn present_flushes_backend() {
        let (lua, backend) = lua();
        let before = backend.flush_count();
        run(&lua, "kite.graphics.present()");
        assert!(backend.flush_count() > before);
    }

    #[test]
    fn screenshot_matches_screen_size() {
        let (lua, _) = lua();
        run(
            &lua,
            r#"
            local g = kite.graphics
            g.clear(0, 0, 255)
            local shot = g.newScreenshot()
            assert(shot:getWidth() == 64 and shot:getHeight() == 48)
            local r, gr, b, a = shot:getPixel(63, 47)
            assert(r == 0 and gr == 0 and b == 255 and a == 255)
            "#,
        );
    }
}
