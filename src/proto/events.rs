//! Core event decoders (codes 2-34).
//!
//! Every event is exactly 32 bytes. Bit 7 of the code byte marks events
//! generated by SendEvent and is masked off before dispatch. All events
//! except KeymapNotify carry a sequence number in bytes 2-3; parsers
//! receive a cursor positioned after it (after the code byte for
//! KeymapNotify).

use super::endianness::{ByteOrder, Cursor};
use super::fmt::{self, FieldList};
use super::requests::{self, Ctx};
use super::{enums, ParseError};

/// Wire size of every core event.
pub const EVENT_SIZE: usize = 32;
/// High bit of the code byte marking synthetic events.
pub const SEND_EVENT_BIT: u8 = 0x80;

pub type EventParseFn = fn(&mut Cursor<'_>, u8, &Ctx<'_>) -> Result<FieldList, ParseError>;

pub struct EventInfo {
    pub name: &'static str,
    pub has_sequence: bool,
    pub parse: EventParseFn,
}

/// Dispatch table: masked event code to name and parser.
pub fn lookup(code: u8) -> Option<EventInfo> {
    let (name, has_sequence, parse): (&'static str, bool, EventParseFn) = match code {
        2 => ("KeyPress", true, key_event),
        3 => ("KeyRelease", true, key_event),
        4 => ("ButtonPress", true, button_event),
        5 => ("ButtonRelease", true, button_event),
        6 => ("MotionNotify", true, motion_notify),
        7 => ("EnterNotify", true, enter_leave),
        8 => ("LeaveNotify", true, enter_leave),
        9 => ("FocusIn", true, focus_event),
        10 => ("FocusOut", true, focus_event),
        11 => ("KeymapNotify", false, keymap_notify),
        12 => ("Expose", true, expose),
        13 => ("GraphicsExposure", true, graphics_exposure),
        14 => ("NoExposure", true, no_exposure),
        15 => ("VisibilityNotify", true, visibility_notify),
        16 => ("CreateNotify", true, create_notify),
        17 => ("DestroyNotify", true, destroy_notify),
        18 => ("UnmapNotify", true, unmap_notify),
        19 => ("MapNotify", true, map_notify),
        20 => ("MapRequest", true, map_request),
        21 => ("ReparentNotify", true, reparent_notify),
        22 => ("ConfigureNotify", true, configure_notify),
        23 => ("ConfigureRequest", true, configure_request),
        24 => ("GravityNotify", true, gravity_notify),
        25 => ("ResizeRequest", true, resize_request),
        26 => ("CirculateNotify", true, circulate_notify),
        27 => ("CirculateRequest", true, circulate_request),
        28 => ("PropertyNotify", true, property_notify),
        29 => ("SelectionClear", true, selection_clear),
        30 => ("SelectionRequest", true, selection_request),
        31 => ("SelectionNotify", true, selection_notify),
        32 => ("ColormapNotify", true, colormap_notify),
        33 => ("ClientMessage", true, client_message),
        34 => ("MappingNotify", true, mapping_notify),
        _ => return None,
    };
    Some(EventInfo {
        name,
        has_sequence,
        parse,
    })
}

/// Renders the 32-byte event embedded in a SendEvent request, with the
/// same dispatcher used for server-to-client events.
pub fn format_embedded(
    data: &[u8],
    order: ByteOrder,
    ctx: &Ctx<'_>,
) -> Result<String, ParseError> {
    if data.len() != EVENT_SIZE {
        return Err(ParseError::Truncated {
            needed: EVENT_SIZE,
            available: data.len(),
        });
    }
    let code = data[0] & !SEND_EVENT_BIT;
    let Some(info) = lookup(code) else {
        return Ok(format!("unknown({code}) {}", fmt::fmt_opaque(EVENT_SIZE)));
    };
    let mut c = Cursor::new(data, order);
    let detail = if info.has_sequence {
        c.skip(1)?;
        let detail = c.u8()?;
        c.skip(2)?; // sequence of the embedded copy is not meaningful
        detail
    } else {
        c.skip(1)?;
        0
    };
    let fields = (info.parse)(&mut c, detail, ctx)?;
    Ok(format!(
        "{}({code}) {}",
        info.name,
        fields.render(ctx.opts, 1)
    ))
}

// --- shared layouts ---------------------------------------------------------

/// Common tail of the key/button/motion events.
fn pointer_common(c: &mut Cursor<'_>, ctx: &Ctx<'_>, f: &mut FieldList) -> Result<(), ParseError> {
    f.push("time", ctx.time(c.u32()?));
    f.push("root", c.u32()?.to_string());
    f.push("event", c.u32()?.to_string());
    f.push("child", fmt::fmt_sentinel(c.u32()?, enums::NONE));
    f.push("root-x", c.i16()?.to_string());
    f.push("root-y", c.i16()?.to_string());
    f.push("event-x", c.i16()?.to_string());
    f.push("event-y", c.i16()?.to_string());
    f.push("state", fmt::fmt_mask(u32::from(c.u16()?), enums::KEYBUTMASK));
    f.push("same-screen", fmt::fmt_bool(c.u8()?));
    c.skip(1)?;
    Ok(())
}

fn key_event(c: &mut Cursor<'_>, detail: u8, ctx: &Ctx<'_>) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("keycode", detail.to_string());
    pointer_common(c, ctx, &mut f)?;
    Ok(f)
}

fn button_event(c: &mut Cursor<'_>, detail: u8, ctx: &Ctx<'_>) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("button", detail.to_string());
    pointer_common(c, ctx, &mut f)?;
    Ok(f)
}

fn motion_notify(c: &mut Cursor<'_>, detail: u8, ctx: &Ctx<'_>) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("detail", fmt::fmt_enum(u32::from(detail), enums::MOTION_DETAIL));
    pointer_common(c, ctx, &mut f)?;
    Ok(f)
}

fn enter_leave(c: &mut Cursor<'_>, detail: u8, ctx: &Ctx<'_>) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("detail", fmt::fmt_enum(u32::from(detail), enums::CROSSING_DETAIL));
    f.push("time", ctx.time(c.u32()?));
    f.push("root", c.u32()?.to_string());
    f.push("event", c.u32()?.to_string());
    f.push("child", fmt::fmt_sentinel(c.u32()?, enums::NONE));
    f.push("root-x", c.i16()?.to_string());
    f.push("root-y", c.i16()?.to_string());
    f.push("event-x", c.i16()?.to_string());
    f.push("event-y", c.i16()?.to_string());
    f.push("state", fmt::fmt_mask(u32::from(c.u16()?), enums::KEYBUTMASK));
    f.push("mode", fmt::fmt_enum(u32::from(c.u8()?), enums::CROSSING_MODE));
    let flags = c.u8()?;
    f.push("focus", fmt::fmt_bool(flags & 0x01));
    f.push("same-screen", fmt::fmt_bool(flags & 0x02));
    Ok(f)
}

fn focus_event(c: &mut Cursor<'_>, detail: u8, _ctx: &Ctx<'_>) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("detail", fmt::fmt_enum(u32::from(detail), enums::FOCUS_DETAIL));
    f.push("event", c.u32()?.to_string());
    f.push("mode", fmt::fmt_enum(u32::from(c.u8()?), enums::FOCUS_MODE));
    c.skip(23)?;
    Ok(f)
}

fn keymap_notify(c: &mut Cursor<'_>, _detail: u8, ctx: &Ctx<'_>) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    let keys: Vec<String> = c.bytes(31)?.iter().map(|b| format!("{b:#04x}")).collect();
    f.push("keys", fmt::fmt_list(&keys, ctx.opts, 1, true));
    Ok(f)
}

fn expose(c: &mut Cursor<'_>, _detail: u8, _ctx: &Ctx<'_>) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("window", c.u32()?.to_string());
    f.push("x", c.u16()?.to_string());
    f.push("y", c.u16()?.to_string());
    f.push("width", c.u16()?.to_string());
    f.push("height", c.u16()?.to_string());
    f.push("count", c.u16()?.to_string());
    c.skip(14)?;
    Ok(f)
}

fn graphics_exposure(
    c: &mut Cursor<'_>,
    _detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("drawable", c.u32()?.to_string());
    f.push("x", c.u16()?.to_string());
    f.push("y", c.u16()?.to_string());
    f.push("width", c.u16()?.to_string());
    f.push("height", c.u16()?.to_string());
    f.push("minor-opcode", c.u16()?.to_string());
    f.push("count", c.u16()?.to_string());
    let major = c.u8()?;
    f.push("major-opcode", major.to_string());
    f.push("request", requests::name(major));
    c.skip(11)?;
    Ok(f)
}

fn no_exposure(c: &mut Cursor<'_>, _detail: u8, _ctx: &Ctx<'_>) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("drawable", c.u32()?.to_string());
    f.push("minor-opcode", c.u16()?.to_string());
    let major = c.u8()?;
    f.push("major-opcode", major.to_string());
    f.push("request", requests::name(major));
    c.skip(21)?;
    Ok(f)
}

fn visibility_notify(
    c: &mut Cursor<'_>,
    _detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("window", c.u32()?.to_string());
    f.push(
        "state",
        fmt::fmt_enum(u32::from(c.u8()?), enums::VISIBILITY_STATE),
    );
    c.skip(23)?;
    Ok(f)
}

fn create_notify(c: &mut Cursor<'_>, _detail: u8, _ctx: &Ctx<'_>) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("parent", c.u32()?.to_string());
    f.push("window", c.u32()?.to_string());
    f.push("x", c.i16()?.to_string());
    f.push("y", c.i16()?.to_string());
    f.push("width", c.u16()?.to_string());
    f.push("height", c.u16()?.to_string());
    f.push("border-width", c.u16()?.to_string());
    f.push("override-redirect", fmt::fmt_bool(c.u8()?));
    c.skip(9)?;
    Ok(f)
}

fn destroy_notify(
    c: &mut Cursor<'_>,
    _detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("event", c.u32()?.to_string());
    f.push("window", c.u32()?.to_string());
    c.skip(20)?;
    Ok(f)
}

fn unmap_notify(c: &mut Cursor<'_>, _detail: u8, _ctx: &Ctx<'_>) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("event", c.u32()?.to_string());
    f.push("window", c.u32()?.to_string());
    f.push("from-configure", fmt::fmt_bool(c.u8()?));
    c.skip(19)?;
    Ok(f)
}

fn map_notify(c: &mut Cursor<'_>, _detail: u8, _ctx: &Ctx<'_>) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("event", c.u32()?.to_string());
    f.push("window", c.u32()?.to_string());
    f.push("override-redirect", fmt::fmt_bool(c.u8()?));
    c.skip(19)?;
    Ok(f)
}

fn map_request(c: &mut Cursor<'_>, _detail: u8, _ctx: &Ctx<'_>) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("parent", c.u32()?.to_string());
    f.push("window", c.u32()?.to_string());
    c.skip(20)?;
    Ok(f)
}

fn reparent_notify(
    c: &mut Cursor<'_>,
    _detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("event", c.u32()?.to_string());
    f.push("window", c.u32()?.to_string());
    f.push("parent", c.u32()?.to_string());
    f.push("x", c.i16()?.to_string());
    f.push("y", c.i16()?.to_string());
    f.push("override-redirect", fmt::fmt_bool(c.u8()?));
    c.skip(11)?;
    Ok(f)
}

fn configure_notify(
    c: &mut Cursor<'_>,
    _detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("event", c.u32()?.to_string());
    f.push("window", c.u32()?.to_string());
    f.push("above-sibling", fmt::fmt_sentinel(c.u32()?, enums::NONE));
    f.push("x", c.i16()?.to_string());
    f.push("y", c.i16()?.to_string());
    f.push("width", c.u16()?.to_string());
    f.push("height", c.u16()?.to_string());
    f.push("border-width", c.u16()?.to_string());
    f.push("override-redirect", fmt::fmt_bool(c.u8()?));
    c.skip(5)?;
    Ok(f)
}

fn configure_request(
    c: &mut Cursor<'_>,
    detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("stack-mode", fmt::fmt_enum(u32::from(detail), enums::STACK_MODE));
    f.push("parent", c.u32()?.to_string());
    f.push("window", c.u32()?.to_string());
    f.push("sibling", fmt::fmt_sentinel(c.u32()?, enums::NONE));
    f.push("x", c.i16()?.to_string());
    f.push("y", c.i16()?.to_string());
    f.push("width", c.u16()?.to_string());
    f.push("height", c.u16()?.to_string());
    f.push("border-width", c.u16()?.to_string());
    f.push(
        "value-mask",
        fmt::fmt_mask(u32::from(c.u16()?), enums::CONFIGURE_WINDOW_MASK),
    );
    c.skip(4)?;
    Ok(f)
}

fn gravity_notify(
    c: &mut Cursor<'_>,
    _detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("event", c.u32()?.to_string());
    f.push("window", c.u32()?.to_string());
    f.push("x", c.i16()?.to_string());
    f.push("y", c.i16()?.to_string());
    c.skip(16)?;
    Ok(f)
}

fn resize_request(
    c: &mut Cursor<'_>,
    _detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("window", c.u32()?.to_string());
    f.push("width", c.u16()?.to_string());
    f.push("height", c.u16()?.to_string());
    c.skip(20)?;
    Ok(f)
}

fn circulate_notify(
    c: &mut Cursor<'_>,
    _detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("event", c.u32()?.to_string());
    f.push("window", c.u32()?.to_string());
    c.skip(4)?;
    f.push("place", fmt::fmt_enum(u32::from(c.u8()?), enums::CIRCULATE_PLACE));
    c.skip(15)?;
    Ok(f)
}

fn circulate_request(
    c: &mut Cursor<'_>,
    _detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("parent", c.u32()?.to_string());
    f.push("window", c.u32()?.to_string());
    c.skip(4)?;
    f.push("place", fmt::fmt_enum(u32::from(c.u8()?), enums::CIRCULATE_PLACE));
    c.skip(15)?;
    Ok(f)
}

fn property_notify(
    c: &mut Cursor<'_>,
    _detail: u8,
    ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("window", c.u32()?.to_string());
    f.push("atom", ctx.atom(c.u32()?));
    f.push("time", ctx.time(c.u32()?));
    f.push("state", fmt::fmt_enum(u32::from(c.u8()?), enums::PROPERTY_STATE));
    c.skip(15)?;
    Ok(f)
}

fn selection_clear(
    c: &mut Cursor<'_>,
    _detail: u8,
    ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("time", ctx.time(c.u32()?));
    f.push("owner", c.u32()?.to_string());
    f.push("selection", ctx.atom(c.u32()?));
    c.skip(16)?;
    Ok(f)
}

fn selection_request(
    c: &mut Cursor<'_>,
    _detail: u8,
    ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("time", ctx.time(c.u32()?));
    f.push("owner", c.u32()?.to_string());
    f.push("requestor", c.u32()?.to_string());
    f.push("selection", ctx.atom(c.u32()?));
    f.push("target", ctx.atom(c.u32()?));
    f.push("property", ctx.atom(c.u32()?));
    c.skip(4)?;
    Ok(f)
}

fn selection_notify(
    c: &mut Cursor<'_>,
    _detail: u8,
    ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("time", ctx.time(c.u32()?));
    f.push("requestor", c.u32()?.to_string());
    f.push("selection", ctx.atom(c.u32()?));
    f.push("target", ctx.atom(c.u32()?));
    f.push("property", ctx.atom(c.u32()?));
    c.skip(8)?;
    Ok(f)
}

fn colormap_notify(
    c: &mut Cursor<'_>,
    _detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("window", c.u32()?.to_string());
    f.push("colormap", fmt::fmt_sentinel(c.u32()?, enums::NONE));
    f.push("new", fmt::fmt_bool(c.u8()?));
    f.push("state", fmt::fmt_enum(u32::from(c.u8()?), enums::COLORMAP_STATE));
    c.skip(18)?;
    Ok(f)
}

fn client_message(c: &mut Cursor<'_>, detail: u8, ctx: &Ctx<'_>) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("format", detail.to_string());
    f.push("window", c.u32()?.to_string());
    let type_atom = c.u32()?;
    f.push("type", ctx.atom(type_atom));
    let order = c.byte_order();
    let data = c.bytes(20)?;
    f.push(
        "data",
        requests::render_typed_data(data, detail, type_atom, order, ctx),
    );
    Ok(f)
}

fn mapping_notify(
    c: &mut Cursor<'_>,
    _detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("request", fmt::fmt_enum(u32::from(c.u8()?), enums::MAPPING_REQUEST));
    f.push("first-keycode", c.u8()?.to_string());
    f.push("count", c.u8()?.to_string());
    c.skip(25)?;
    Ok(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::atoms::AtomTable;
    use crate::proto::fmt::FmtOptions;

    #[test]
    fn test_embedded_map_notify() {
        let mut event = vec![0u8; 32];
        event[0] = 19; // MapNotify
        event[4..8].copy_from_slice(&0x42u32.to_le_bytes()); // event window
        event[8..12].copy_from_slice(&0x43u32.to_le_bytes()); // window
        event[12] = 1; // override-redirect
        let opts = FmtOptions::default();
        let atoms = AtomTable::new();
        let ctx = Ctx {
            opts: &opts,
            atoms: &atoms,
            time_ref: None,
        };
        let rendered = format_embedded(&event, ByteOrder::LittleEndian, &ctx).unwrap();
        assert!(rendered.starts_with("MapNotify(19)"), "{rendered}");
        assert!(rendered.contains("override-redirect=True"));
    }

    #[test]
    fn test_property_notify_layout() {
        let mut event = vec![0u8; 32];
        event[0] = 28;
        event[2..4].copy_from_slice(&7u16.to_le_bytes());
        event[4..8].copy_from_slice(&0x25u32.to_le_bytes());
        event[8..12].copy_from_slice(&39u32.to_le_bytes()); // WM_NAME
        event[12..16].copy_from_slice(&123456u32.to_le_bytes());
        event[16] = 0; // NewValue
        let opts = FmtOptions::default();
        let atoms = AtomTable::new();
        let ctx = Ctx {
            opts: &opts,
            atoms: &atoms,
            time_ref: None,
        };
        let info = lookup(28).unwrap();
        let mut c = Cursor::new(&event, ByteOrder::LittleEndian);
        c.skip(4).unwrap();
        let fields = (info.parse)(&mut c, event[1], &ctx).unwrap();
        assert_eq!(c.remaining(), 0);
        let rendered = fields.render(&opts, 0);
        assert!(rendered.contains("atom=\"WM_NAME\"(39)"));
        assert!(rendered.contains("state=NewValue(0)"));
        assert!(rendered.contains("time=123456"));
    }

    #[test]
    fn test_all_core_codes_have_parsers() {
        for code in 2..=34u8 {
            assert!(lookup(code).is_some(), "missing event {code}");
        }
        assert!(lookup(1).is_none());
        assert!(lookup(35).is_none());
    }
}
