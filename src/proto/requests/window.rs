//! Window requests (opcodes 1-15).

use super::Ctx;
use crate::proto::endianness::Cursor;
use crate::proto::fmt::{self, FieldList};
use crate::proto::{enums, values, ParseError};

pub(super) fn create_window(
    c: &mut Cursor<'_>,
    detail: u8,
    ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("depth", detail.to_string());
    f.push("wid", c.u32()?.to_string());
    f.push("parent", c.u32()?.to_string());
    f.push("x", c.i16()?.to_string());
    f.push("y", c.i16()?.to_string());
    f.push("width", c.u16()?.to_string());
    f.push("height", c.u16()?.to_string());
    f.push("border-width", c.u16()?.to_string());
    f.push(
        "class",
        fmt::fmt_enum(u32::from(c.u16()?), enums::WINDOW_CLASS),
    );
    f.push("visual", fmt::fmt_sentinel(c.u32()?, enums::COPY_FROM_PARENT));
    let mask = c.u32()?;
    f.push("value-mask", values::fmt_value_mask(mask, values::WINDOW_ATTRIBUTES));
    f.push(
        "value-list",
        values::render_value_list(c, mask, values::WINDOW_ATTRIBUTES, ctx.opts)?,
    );
    Ok(f)
}

pub(super) fn change_window_attributes(
    c: &mut Cursor<'_>,
    _detail: u8,
    ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("window", c.u32()?.to_string());
    let mask = c.u32()?;
    f.push("value-mask", values::fmt_value_mask(mask, values::WINDOW_ATTRIBUTES));
    f.push(
        "value-list",
        values::render_value_list(c, mask, values::WINDOW_ATTRIBUTES, ctx.opts)?,
    );
    Ok(f)
}

resource_request!(get_window_attributes, "window");
resource_request!(destroy_window, "window");
resource_request!(destroy_subwindows, "window");
resource_request!(map_window, "window");
resource_request!(map_subwindows, "window");
resource_request!(unmap_window, "window");
resource_request!(unmap_subwindows, "window");
resource_request!(query_tree, "window");
resource_request!(get_geometry, "drawable");

pub(super) fn change_save_set(
    c: &mut Cursor<'_>,
    detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("mode", fmt::fmt_enum(u32::from(detail), enums::SAVE_SET_MODE));
    f.push("window", c.u32()?.to_string());
    Ok(f)
}

pub(super) fn reparent_window(
    c: &mut Cursor<'_>,
    _detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("window", c.u32()?.to_string());
    f.push("parent", c.u32()?.to_string());
    f.push("x", c.i16()?.to_string());
    f.push("y", c.i16()?.to_string());
    Ok(f)
}

pub(super) fn configure_window(
    c: &mut Cursor<'_>,
    _detail: u8,
    ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("window", c.u32()?.to_string());
    let mask = u32::from(c.u16()?);
    c.skip(2)?;
    f.push("value-mask", values::fmt_value_mask(mask, values::CONFIGURE_WINDOW));
    f.push(
        "value-list",
        values::render_value_list(c, mask, values::CONFIGURE_WINDOW, ctx.opts)?,
    );
    Ok(f)
}

pub(super) fn circulate_window(
    c: &mut Cursor<'_>,
    detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push(
        "direction",
        fmt::fmt_enum(u32::from(detail), enums::CIRCULATE_DIRECTION),
    );
    f.push("window", c.u32()?.to_string());
    Ok(f)
}
