use std::cell::RefCell;
use std::rc::Rc;

use kite_engine::graphics::{Filter, FilterMode, Texture, Wrap, WrapMode};
use mlua::{AnyUserData, ExternalResult, MetaMethod, UserData, UserDataMethods};

use crate::{borrow, borrow_mut, shared_graphics};

/// Userdata wrapping a shared texture resource.
pub(crate) trait TextureUserData: UserData + 'static {
    type Resource: Texture + 'static;

    fn resource(&self) -> &Rc<RefCell<Self::Resource>>;
}

pub(crate) fn parse_filter(min: &str, mag: Option<&str>) -> mlua::Result<Filter> {
    let min: FilterMode = min.parse().into_lua_err()?;
    let mag = match mag {
        Some(mag) => mag.parse().into_lua_err()?,
        None => min,
    };
    Ok(Filter::new(min, mag))
}

fn parse_wrap(s: &str, t: Option<&str>) -> mlua::Result<Wrap> {
    let s: WrapMode = s.parse().into_lua_err()?;
    let t = match t {
        Some(t) => t.parse().into_lua_err()?,
        None => s,
    };
    Ok(Wrap::new(s, t))
}

/// Methods shared by every texture type: size queries, filter and wrap.
pub(crate) fn add_texture_methods<T, M>(methods: &mut M)
where
    T: TextureUserData,
    M: UserDataMethods<T>,
{
    methods.add_method("getWidth", |_, this, ()| {
        Ok(borrow(this.resource())?.width() as u32)
    });
    methods.add_method("getHeight", |_, this, ()| {
        Ok(borrow(this.resource())?.height() as u32)
    });
    methods.add_method("getDimensions", |_, this, ()| {
        let tex = borrow(this.resource())?;
        Ok((tex.width() as u32, tex.height() as u32))
    });

    methods.add_method("setFilter", |lua, this, (min, mag): (String, Option<String>)| {
        let filter = parse_filter(&min, mag.as_deref())?;
        let graphics = shared_graphics(lua)?;
        let mut graphics = borrow_mut(&graphics)?;
        borrow_mut(this.resource())?.set_filter(graphics.backend_mut(), filter);
        Ok(())
    });
    methods.add_method("getFilter", |lua, this, ()| {
        let graphics = shared_graphics(lua)?;
        let filter = borrow(this.resource())?.filter(borrow(&graphics)?.backend());
        Ok((filter.min.name(), filter.mag.name()))
    });

    methods.add_method("setWrap", |lua, this, (s, t): (String, Option<String>)| {
        let wrap = parse_wrap(&s, t.as_deref())?;
        let graphics = shared_graphics(lua)?;
        let mut graphics = borrow_mut(&graphics)?;
        borrow_mut(this.resource())?.set_wrap(graphics.backend_mut(), wrap);
        Ok(())
    });
    methods.add_method("getWrap", |lua, this, ()| {
        let graphics = shared_graphics(lua)?;
        let wrap = borrow(this.resource())?.wrap(borrow(&graphics)?.backend());
        Ok((wrap.s.name(), wrap.t.name()))
    });

    methods.add_meta_method(MetaMethod::Eq, |_, this, other: AnyUserData| {
        Ok(other
            .borrow::<T>()
            .is_ok_and(|other| Rc::ptr_eq(other.resource(), this.resource())))
    });
}
