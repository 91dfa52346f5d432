//! Pixmap and graphics-context requests (opcodes 53-60).

use super::Ctx;
use crate::proto::endianness::Cursor;
use crate::proto::fmt::{self, FieldList};
use crate::proto::{enums, values, ParseError};

pub(super) fn create_pixmap(
    c: &mut Cursor<'_>,
    detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("depth", detail.to_string());
    f.push("pid", c.u32()?.to_string());
    f.push("drawable", c.u32()?.to_string());
    f.push("width", c.u16()?.to_string());
    f.push("height", c.u16()?.to_string());
    Ok(f)
}

resource_request!(free_pixmap, "pixmap");
resource_request!(free_gc, "gc");

pub(super) fn create_gc(
    c: &mut Cursor<'_>,
    _detail: u8,
    ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("cid", c.u32()?.to_string());
    f.push("drawable", c.u32()?.to_string());
    let mask = c.u32()?;
    f.push("value-mask", values::fmt_value_mask(mask, values::GCONTEXT));
    f.push(
        "value-list",
        values::render_value_list(c, mask, values::GCONTEXT, ctx.opts)?,
    );
    Ok(f)
}

pub(super) fn change_gc(
    c: &mut Cursor<'_>,
    _detail: u8,
    ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("gc", c.u32()?.to_string());
    let mask = c.u32()?;
    f.push("value-mask", values::fmt_value_mask(mask, values::GCONTEXT));
    f.push(
        "value-list",
        values::render_value_list(c, mask, values::GCONTEXT, ctx.opts)?,
    );
    Ok(f)
}

pub(super) fn copy_gc(
    c: &mut Cursor<'_>,
    _detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("src-gc", c.u32()?.to_string());
    f.push("dst-gc", c.u32()?.to_string());
    f.push(
        "value-mask",
        values::fmt_value_mask(c.u32()?, values::GCONTEXT),
    );
    Ok(f)
}

pub(super) fn set_dashes(
    c: &mut Cursor<'_>,
    _detail: u8,
    ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("gc", c.u32()?.to_string());
    f.push("dash-offset", c.u16()?.to_string());
    let n = c.u16()? as usize;
    f.push_verbose("dashes-length", n.to_string());
    let dashes: Vec<String> = c
        .padded_bytes(n)?
        .iter()
        .map(|d| d.to_string())
        .collect();
    f.push("dashes", fmt::fmt_list(&dashes, ctx.opts, 1, true));
    Ok(f)
}

pub(super) fn set_clip_rectangles(
    c: &mut Cursor<'_>,
    detail: u8,
    ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push(
        "ordering",
        fmt::fmt_enum(u32::from(detail), enums::CLIP_ORDERING),
    );
    f.push("gc", c.u32()?.to_string());
    f.push("clip-x-origin", c.i16()?.to_string());
    f.push("clip-y-origin", c.i16()?.to_string());
    f.push("rectangles", super::parse_rectangles(c, ctx)?);
    Ok(f)
}
