//! Keyboard/pointer control, screen saver, host access, extension and
//! no-op requests (opcodes 97-119 and 127).

use super::Ctx;
use crate::proto::endianness::Cursor;
use crate::proto::fmt::{self, FieldList};
use crate::proto::{enums, values, ParseError};

pub(super) fn query_best_size(
    c: &mut Cursor<'_>,
    detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("class", fmt::fmt_enum(u32::from(detail), enums::QUERY_BEST_CLASS));
    f.push("drawable", c.u32()?.to_string());
    f.push("width", c.u16()?.to_string());
    f.push("height", c.u16()?.to_string());
    Ok(f)
}

pub(super) fn query_extension(
    c: &mut Cursor<'_>,
    _detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    let n = c.u16()? as usize;
    c.skip(2)?;
    f.push_verbose("name-length", n.to_string());
    f.push("name", fmt::quote_string8(c.padded_bytes(n)?));
    Ok(f)
}

pub(super) fn change_keyboard_mapping(
    c: &mut Cursor<'_>,
    detail: u8,
    ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let keycode_count = detail as usize;
    let mut f = FieldList::new();
    f.push("keycode-count", keycode_count.to_string());
    f.push("first-keycode", c.u8()?.to_string());
    let per_keycode = c.u8()? as usize;
    f.push("keysyms-per-keycode", per_keycode.to_string());
    c.skip(2)?;
    let keysyms = super::parse_keysyms(c, keycode_count * per_keycode)?;
    f.push("keysyms", fmt::fmt_list(&keysyms, ctx.opts, 1, true));
    Ok(f)
}

pub(super) fn get_keyboard_mapping(
    c: &mut Cursor<'_>,
    _detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("first-keycode", c.u8()?.to_string());
    f.push("count", c.u8()?.to_string());
    c.skip(2)?;
    Ok(f)
}

pub(super) fn change_keyboard_control(
    c: &mut Cursor<'_>,
    _detail: u8,
    ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    let mask = c.u32()?;
    f.push("value-mask", values::fmt_value_mask(mask, values::KEYBOARD_CONTROL));
    f.push(
        "value-list",
        values::render_value_list(c, mask, values::KEYBOARD_CONTROL, ctx.opts)?,
    );
    Ok(f)
}

pub(super) fn bell(
    _c: &mut Cursor<'_>,
    detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("percent", (detail as i8).to_string());
    Ok(f)
}

pub(super) fn change_pointer_control(
    c: &mut Cursor<'_>,
    _detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("acceleration-numerator", c.i16()?.to_string());
    f.push("acceleration-denominator", c.i16()?.to_string());
    f.push("threshold", c.i16()?.to_string());
    f.push("do-acceleration", fmt::fmt_bool(c.u8()?));
    f.push("do-threshold", fmt::fmt_bool(c.u8()?));
    Ok(f)
}

pub(super) fn set_screen_saver(
    c: &mut Cursor<'_>,
    _detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("timeout", c.i16()?.to_string());
    f.push("interval", c.i16()?.to_string());
    f.push(
        "prefer-blanking",
        fmt::fmt_enum(u32::from(c.u8()?), enums::YES_NO_DEFAULT),
    );
    f.push(
        "allow-exposures",
        fmt::fmt_enum(u32::from(c.u8()?), enums::YES_NO_DEFAULT),
    );
    c.skip(2)?;
    Ok(f)
}

/// Internet family addresses print as dotted quads, everything else as a
/// byte list.
pub(crate) fn fmt_host_address(family: u8, bytes: &[u8]) -> String {
    if family == 0 && bytes.len() == 4 {
        return format!("{}.{}.{}.{}", bytes[0], bytes[1], bytes[2], bytes[3]);
    }
    let parts: Vec<String> = bytes.iter().map(|b| format!("{b:#04x}")).collect();
    format!("[ {} ]", parts.join(", "))
}

pub(super) fn change_hosts(
    c: &mut Cursor<'_>,
    detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("mode", fmt::fmt_enum(u32::from(detail), enums::HOST_CHANGE_MODE));
    let family = c.u8()?;
    f.push("family", fmt::fmt_enum(u32::from(family), enums::HOST_FAMILY));
    c.skip(1)?;
    let n = c.u16()? as usize;
    f.push_verbose("address-length", n.to_string());
    f.push("address", fmt_host_address(family, c.padded_bytes(n)?));
    Ok(f)
}

pub(super) fn set_access_control(
    _c: &mut Cursor<'_>,
    detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("mode", fmt::fmt_enum(u32::from(detail), enums::ACCESS_MODE));
    Ok(f)
}

pub(super) fn set_close_down_mode(
    _c: &mut Cursor<'_>,
    detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("mode", fmt::fmt_enum(u32::from(detail), enums::CLOSE_DOWN_MODE));
    Ok(f)
}

pub(super) fn kill_client(
    c: &mut Cursor<'_>,
    _detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("resource", fmt::fmt_sentinel(c.u32()?, enums::ALL_TEMPORARY));
    Ok(f)
}

pub(super) fn rotate_properties(
    c: &mut Cursor<'_>,
    _detail: u8,
    ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("window", c.u32()?.to_string());
    let n = c.u16()? as usize;
    f.push_verbose("properties-length", n.to_string());
    f.push("delta", c.i16()?.to_string());
    let mut properties = Vec::with_capacity(n.min(4096));
    for _ in 0..n {
        properties.push(ctx.atom(c.u32()?));
    }
    f.push("properties", fmt::fmt_list(&properties, ctx.opts, 1, true));
    Ok(f)
}

pub(super) fn force_screen_saver(
    _c: &mut Cursor<'_>,
    detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push(
        "mode",
        fmt::fmt_enum(u32::from(detail), enums::FORCE_SCREEN_SAVER_MODE),
    );
    Ok(f)
}

pub(super) fn set_pointer_mapping(
    c: &mut Cursor<'_>,
    detail: u8,
    ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let n = detail as usize;
    let mut f = FieldList::new();
    let map: Vec<String> = c.padded_bytes(n)?.iter().map(|b| b.to_string()).collect();
    f.push("map", fmt::fmt_list(&map, ctx.opts, 1, true));
    Ok(f)
}

pub(super) fn set_modifier_mapping(
    c: &mut Cursor<'_>,
    detail: u8,
    ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let per_modifier = detail as usize;
    let mut f = FieldList::new();
    f.push("keycodes-per-modifier", per_modifier.to_string());
    let keycodes: Vec<String> = c
        .bytes(8 * per_modifier)?
        .iter()
        .map(|b| b.to_string())
        .collect();
    f.push("keycodes", fmt::fmt_list(&keycodes, ctx.opts, 1, true));
    Ok(f)
}

pub(super) fn no_operation(
    c: &mut Cursor<'_>,
    _detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    // may carry arbitrary dummy payload
    let n = c.remaining();
    c.skip(n)?;
    let mut f = FieldList::new();
    f.push_verbose("dummy-bytes", n.to_string());
    Ok(f)
}
