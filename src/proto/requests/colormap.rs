//! Colormap and cursor requests (opcodes 78-96).

use super::Ctx;
use crate::proto::endianness::Cursor;
use crate::proto::fmt::{self, FieldList};
use crate::proto::{enums, ParseError};

pub(super) fn create_colormap(
    c: &mut Cursor<'_>,
    detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("alloc", fmt::fmt_enum(u32::from(detail), enums::COLORMAP_ALLOC));
    f.push("mid", c.u32()?.to_string());
    f.push("window", c.u32()?.to_string());
    f.push("visual", c.u32()?.to_string());
    Ok(f)
}

resource_request!(free_colormap, "cmap");
resource_request!(install_colormap, "cmap");
resource_request!(uninstall_colormap, "cmap");
resource_request!(list_installed_colormaps, "window");
resource_request!(free_cursor, "cursor");

pub(super) fn copy_colormap_and_free(
    c: &mut Cursor<'_>,
    _detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("mid", c.u32()?.to_string());
    f.push("src-cmap", c.u32()?.to_string());
    Ok(f)
}

pub(super) fn alloc_color(
    c: &mut Cursor<'_>,
    _detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("cmap", c.u32()?.to_string());
    f.push("red", c.u16()?.to_string());
    f.push("green", c.u16()?.to_string());
    f.push("blue", c.u16()?.to_string());
    c.skip(2)?;
    Ok(f)
}

pub(super) fn alloc_named_color(
    c: &mut Cursor<'_>,
    _detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("cmap", c.u32()?.to_string());
    let n = c.u16()? as usize;
    c.skip(2)?;
    f.push_verbose("name-length", n.to_string());
    f.push("name", fmt::quote_string8(c.padded_bytes(n)?));
    Ok(f)
}

pub(super) fn alloc_color_cells(
    c: &mut Cursor<'_>,
    detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("contiguous", fmt::fmt_bool(detail));
    f.push("cmap", c.u32()?.to_string());
    f.push("colors", c.u16()?.to_string());
    f.push("planes", c.u16()?.to_string());
    Ok(f)
}

pub(super) fn alloc_color_planes(
    c: &mut Cursor<'_>,
    detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("contiguous", fmt::fmt_bool(detail));
    f.push("cmap", c.u32()?.to_string());
    f.push("colors", c.u16()?.to_string());
    f.push("reds", c.u16()?.to_string());
    f.push("greens", c.u16()?.to_string());
    f.push("blues", c.u16()?.to_string());
    Ok(f)
}

fn pixel_list(c: &mut Cursor<'_>, ctx: &Ctx<'_>) -> Result<String, ParseError> {
    let mut pixels = Vec::new();
    while c.remaining() >= 4 {
        pixels.push(c.u32()?.to_string());
    }
    Ok(fmt::fmt_list(&pixels, ctx.opts, 1, true))
}

pub(super) fn free_colors(
    c: &mut Cursor<'_>,
    _detail: u8,
    ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("cmap", c.u32()?.to_string());
    f.push("plane-mask", fmt::fmt_hex32(c.u32()?));
    f.push("pixels", pixel_list(c, ctx)?);
    Ok(f)
}

pub(super) fn store_colors(
    c: &mut Cursor<'_>,
    _detail: u8,
    ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("cmap", c.u32()?.to_string());
    let mut items = Vec::new();
    while c.remaining() >= 12 {
        let pixel = c.u32()?;
        let red = c.u16()?;
        let green = c.u16()?;
        let blue = c.u16()?;
        let do_rgb = c.u8()?;
        c.skip(1)?;
        items.push(format!(
            "{{ pixel={pixel}, red={red}, green={green}, blue={blue}, do-rgb={} }}",
            fmt::fmt_mask(u32::from(do_rgb), enums::DO_RGB_MASK)
        ));
    }
    f.push("items", fmt::fmt_list(&items, ctx.opts, 1, false));
    Ok(f)
}

pub(super) fn store_named_color(
    c: &mut Cursor<'_>,
    detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("do-rgb", fmt::fmt_mask(u32::from(detail), enums::DO_RGB_MASK));
    f.push("cmap", c.u32()?.to_string());
    f.push("pixel", c.u32()?.to_string());
    let n = c.u16()? as usize;
    c.skip(2)?;
    f.push("name", fmt::quote_string8(c.padded_bytes(n)?));
    Ok(f)
}

pub(super) fn query_colors(
    c: &mut Cursor<'_>,
    _detail: u8,
    ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("cmap", c.u32()?.to_string());
    f.push("pixels", pixel_list(c, ctx)?);
    Ok(f)
}

pub(super) fn lookup_color(
    c: &mut Cursor<'_>,
    _detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("cmap", c.u32()?.to_string());
    let n = c.u16()? as usize;
    c.skip(2)?;
    f.push("name", fmt::quote_string8(c.padded_bytes(n)?));
    Ok(f)
}

fn cursor_colors(c: &mut Cursor<'_>, f: &mut FieldList) -> Result<(), ParseError> {
    f.push("fore-red", c.u16()?.to_string());
    f.push("fore-green", c.u16()?.to_string());
    f.push("fore-blue", c.u16()?.to_string());
    f.push("back-red", c.u16()?.to_string());
    f.push("back-green", c.u16()?.to_string());
    f.push("back-blue", c.u16()?.to_string());
    Ok(())
}

pub(super) fn create_cursor(
    c: &mut Cursor<'_>,
    _detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("cid", c.u32()?.to_string());
    f.push("source", c.u32()?.to_string());
    f.push("mask", fmt::fmt_sentinel(c.u32()?, enums::NONE));
    cursor_colors(c, &mut f)?;
    f.push("x", c.u16()?.to_string());
    f.push("y", c.u16()?.to_string());
    Ok(f)
}

pub(super) fn create_glyph_cursor(
    c: &mut Cursor<'_>,
    _detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("cid", c.u32()?.to_string());
    f.push("source-font", c.u32()?.to_string());
    f.push("mask-font", fmt::fmt_sentinel(c.u32()?, enums::NONE));
    f.push("source-char", c.u16()?.to_string());
    f.push("mask-char", c.u16()?.to_string());
    cursor_colors(c, &mut f)?;
    Ok(f)
}

pub(super) fn recolor_cursor(
    c: &mut Cursor<'_>,
    _detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("cursor", c.u32()?.to_string());
    cursor_colors(c, &mut f)?;
    Ok(f)
}
