//! Grab, pointer, keyboard and focus requests (opcodes 26-44).

use super::Ctx;
use crate::proto::endianness::Cursor;
use crate::proto::fmt::{self, FieldList};
use crate::proto::{enums, ParseError};

pub(super) fn grab_pointer(
    c: &mut Cursor<'_>,
    detail: u8,
    ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("owner-events", fmt::fmt_bool(detail));
    f.push("grab-window", c.u32()?.to_string());
    f.push(
        "event-mask",
        fmt::fmt_mask(u32::from(c.u16()?), enums::POINTER_EVENT_MASK),
    );
    f.push("pointer-mode", fmt::fmt_enum(u32::from(c.u8()?), enums::GRAB_MODE));
    f.push("keyboard-mode", fmt::fmt_enum(u32::from(c.u8()?), enums::GRAB_MODE));
    f.push("confine-to", fmt::fmt_sentinel(c.u32()?, enums::NONE));
    f.push("cursor", fmt::fmt_sentinel(c.u32()?, enums::NONE));
    f.push("time", ctx.time(c.u32()?));
    Ok(f)
}

pub(super) fn ungrab_pointer(
    c: &mut Cursor<'_>,
    _detail: u8,
    ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("time", ctx.time(c.u32()?));
    Ok(f)
}

pub(super) fn grab_button(
    c: &mut Cursor<'_>,
    detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("owner-events", fmt::fmt_bool(detail));
    f.push("grab-window", c.u32()?.to_string());
    f.push(
        "event-mask",
        fmt::fmt_mask(u32::from(c.u16()?), enums::POINTER_EVENT_MASK),
    );
    f.push("pointer-mode", fmt::fmt_enum(u32::from(c.u8()?), enums::GRAB_MODE));
    f.push("keyboard-mode", fmt::fmt_enum(u32::from(c.u8()?), enums::GRAB_MODE));
    f.push("confine-to", fmt::fmt_sentinel(c.u32()?, enums::NONE));
    f.push("cursor", fmt::fmt_sentinel(c.u32()?, enums::NONE));
    f.push("button", fmt::fmt_sentinel(u32::from(c.u8()?), enums::ANY_BUTTON));
    c.skip(1)?;
    f.push("modifiers", fmt::fmt_modifiers(c.u16()?));
    Ok(f)
}

pub(super) fn ungrab_button(
    c: &mut Cursor<'_>,
    detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("button", fmt::fmt_sentinel(u32::from(detail), enums::ANY_BUTTON));
    f.push("grab-window", c.u32()?.to_string());
    f.push("modifiers", fmt::fmt_modifiers(c.u16()?));
    c.skip(2)?;
    Ok(f)
}

pub(super) fn change_active_pointer_grab(
    c: &mut Cursor<'_>,
    _detail: u8,
    ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("cursor", fmt::fmt_sentinel(c.u32()?, enums::NONE));
    f.push("time", ctx.time(c.u32()?));
    f.push(
        "event-mask",
        fmt::fmt_mask(u32::from(c.u16()?), enums::POINTER_EVENT_MASK),
    );
    c.skip(2)?;
    Ok(f)
}

pub(super) fn grab_keyboard(
    c: &mut Cursor<'_>,
    detail: u8,
    ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("owner-events", fmt::fmt_bool(detail));
    f.push("grab-window", c.u32()?.to_string());
    f.push("time", ctx.time(c.u32()?));
    f.push("pointer-mode", fmt::fmt_enum(u32::from(c.u8()?), enums::GRAB_MODE));
    f.push("keyboard-mode", fmt::fmt_enum(u32::from(c.u8()?), enums::GRAB_MODE));
    c.skip(2)?;
    Ok(f)
}

pub(super) fn ungrab_keyboard(
    c: &mut Cursor<'_>,
    _detail: u8,
    ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("time", ctx.time(c.u32()?));
    Ok(f)
}

pub(super) fn grab_key(
    c: &mut Cursor<'_>,
    detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("owner-events", fmt::fmt_bool(detail));
    f.push("grab-window", c.u32()?.to_string());
    f.push("modifiers", fmt::fmt_modifiers(c.u16()?));
    f.push("key", fmt::fmt_sentinel(u32::from(c.u8()?), enums::ANY_KEY));
    f.push("pointer-mode", fmt::fmt_enum(u32::from(c.u8()?), enums::GRAB_MODE));
    f.push("keyboard-mode", fmt::fmt_enum(u32::from(c.u8()?), enums::GRAB_MODE));
    c.skip(3)?;
    Ok(f)
}

pub(super) fn ungrab_key(
    c: &mut Cursor<'_>,
    detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("key", fmt::fmt_sentinel(u32::from(detail), enums::ANY_KEY));
    f.push("grab-window", c.u32()?.to_string());
    f.push("modifiers", fmt::fmt_modifiers(c.u16()?));
    c.skip(2)?;
    Ok(f)
}

pub(super) fn allow_events(
    c: &mut Cursor<'_>,
    detail: u8,
    ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("mode", fmt::fmt_enum(u32::from(detail), enums::ALLOW_EVENTS_MODE));
    f.push("time", ctx.time(c.u32()?));
    Ok(f)
}

resource_request!(query_pointer, "window");

pub(super) fn get_motion_events(
    c: &mut Cursor<'_>,
    _detail: u8,
    ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("window", c.u32()?.to_string());
    f.push("start", ctx.time(c.u32()?));
    f.push("stop", ctx.time(c.u32()?));
    Ok(f)
}

pub(super) fn translate_coordinates(
    c: &mut Cursor<'_>,
    _detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("src-window", c.u32()?.to_string());
    f.push("dst-window", c.u32()?.to_string());
    f.push("src-x", c.i16()?.to_string());
    f.push("src-y", c.i16()?.to_string());
    Ok(f)
}

pub(super) fn warp_pointer(
    c: &mut Cursor<'_>,
    _detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("src-window", fmt::fmt_sentinel(c.u32()?, enums::NONE));
    f.push("dst-window", fmt::fmt_sentinel(c.u32()?, enums::NONE));
    f.push("src-x", c.i16()?.to_string());
    f.push("src-y", c.i16()?.to_string());
    f.push("src-width", c.u16()?.to_string());
    f.push("src-height", c.u16()?.to_string());
    f.push("dst-x", c.i16()?.to_string());
    f.push("dst-y", c.i16()?.to_string());
    Ok(f)
}

pub(super) fn set_input_focus(
    c: &mut Cursor<'_>,
    detail: u8,
    ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("revert-to", fmt::fmt_enum(u32::from(detail), enums::REVERT_TO));
    f.push("focus", fmt::fmt_sentinel(c.u32()?, enums::NONE_POINTER_ROOT));
    f.push("time", ctx.time(c.u32()?));
    Ok(f)
}
