//! Reply decoders, keyed by the opcode of the originating request.
//!
//! A reply frame is 32 bytes plus `extra-units * 4`. Parsers receive a
//! cursor positioned at offset 8 (after type, detail byte, sequence and
//! length) plus the detail byte, and must consume the frame exactly.

use super::endianness::Cursor;
use super::fmt::{self, FieldList};
use super::requests::{self, Ctx};
use super::{enums, ParseError};

/// Fixed prefix of every reply.
pub const REPLY_HEADER_SIZE: usize = 32;

pub type ReplyParseFn = fn(&mut Cursor<'_>, u8, &Ctx<'_>) -> Result<FieldList, ParseError>;

/// Reply parser for a request opcode; `None` for requests without replies.
pub fn lookup(opcode: u8) -> Option<ReplyParseFn> {
    let parse: ReplyParseFn = match opcode {
        3 => get_window_attributes,
        14 => get_geometry,
        15 => query_tree,
        16 => intern_atom,
        17 => get_atom_name,
        20 => get_property,
        21 => list_properties,
        23 => get_selection_owner,
        26 | 31 => grab_status,
        38 => query_pointer,
        39 => get_motion_events,
        40 => translate_coordinates,
        43 => get_input_focus,
        44 => query_keymap,
        47 => query_font,
        48 => query_text_extents,
        49 => list_fonts,
        50 => list_fonts_with_info,
        52 => get_font_path,
        73 => get_image,
        83 => list_installed_colormaps,
        84 => alloc_color,
        85 => alloc_named_color,
        86 => alloc_color_cells,
        87 => alloc_color_planes,
        91 => query_colors,
        92 => lookup_color,
        97 => query_best_size,
        98 => query_extension,
        99 => list_extensions,
        101 => get_keyboard_mapping,
        103 => get_keyboard_control,
        106 => get_pointer_control,
        108 => get_screen_saver,
        110 => list_hosts,
        116 | 118 => mapping_status,
        117 => get_pointer_mapping,
        119 => get_modifier_mapping,
        _ => return None,
    };
    Some(parse)
}

fn get_window_attributes(
    c: &mut Cursor<'_>,
    detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push(
        "backing-store",
        fmt::fmt_enum(u32::from(detail), enums::BACKING_STORE),
    );
    f.push("visual", c.u32()?.to_string());
    f.push("class", fmt::fmt_enum(u32::from(c.u16()?), enums::WINDOW_CLASS));
    f.push("bit-gravity", fmt::fmt_enum(u32::from(c.u8()?), enums::BIT_GRAVITY));
    f.push("win-gravity", fmt::fmt_enum(u32::from(c.u8()?), enums::WIN_GRAVITY));
    f.push("backing-planes", c.u32()?.to_string());
    f.push("backing-pixel", c.u32()?.to_string());
    f.push("save-under", fmt::fmt_bool(c.u8()?));
    f.push("map-is-installed", fmt::fmt_bool(c.u8()?));
    f.push("map-state", fmt::fmt_enum(u32::from(c.u8()?), enums::MAP_STATE));
    f.push("override-redirect", fmt::fmt_bool(c.u8()?));
    f.push("colormap", fmt::fmt_sentinel(c.u32()?, enums::NONE));
    f.push("all-event-masks", fmt::fmt_mask(c.u32()?, enums::EVENT_MASK));
    f.push("your-event-mask", fmt::fmt_mask(c.u32()?, enums::EVENT_MASK));
    f.push(
        "do-not-propagate-mask",
        fmt::fmt_mask(u32::from(c.u16()?), enums::EVENT_MASK),
    );
    c.skip(2)?;
    Ok(f)
}

fn get_geometry(c: &mut Cursor<'_>, detail: u8, _ctx: &Ctx<'_>) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("depth", detail.to_string());
    f.push("root", c.u32()?.to_string());
    f.push("x", c.i16()?.to_string());
    f.push("y", c.i16()?.to_string());
    f.push("width", c.u16()?.to_string());
    f.push("height", c.u16()?.to_string());
    f.push("border-width", c.u16()?.to_string());
    c.skip(10)?;
    Ok(f)
}

fn query_tree(c: &mut Cursor<'_>, _detail: u8, ctx: &Ctx<'_>) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("root", c.u32()?.to_string());
    f.push("parent", fmt::fmt_sentinel(c.u32()?, enums::NONE));
    let n = c.u16()? as usize;
    f.push_verbose("children-length", n.to_string());
    c.skip(14)?;
    let mut children = Vec::with_capacity(n.min(4096));
    for _ in 0..n {
        children.push(c.u32()?.to_string());
    }
    f.push("children", fmt::fmt_list(&children, ctx.opts, 1, true));
    Ok(f)
}

fn intern_atom(c: &mut Cursor<'_>, _detail: u8, ctx: &Ctx<'_>) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("atom", ctx.atom(c.u32()?));
    c.skip(20)?;
    Ok(f)
}

fn get_atom_name(c: &mut Cursor<'_>, _detail: u8, _ctx: &Ctx<'_>) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    let n = c.u16()? as usize;
    f.push_verbose("name-length", n.to_string());
    c.skip(22)?;
    f.push("name", fmt::quote_string8(c.padded_bytes(n)?));
    Ok(f)
}

fn get_property(c: &mut Cursor<'_>, detail: u8, ctx: &Ctx<'_>) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("format", detail.to_string());
    let type_atom = c.u32()?;
    f.push("type", ctx.atom(type_atom));
    f.push("bytes-after", c.u32()?.to_string());
    let unit_count = c.u32()? as usize;
    f.push_verbose("length", unit_count.to_string());
    c.skip(12)?;
    let data_len = match detail {
        8 => unit_count,
        16 => unit_count * 2,
        32 => unit_count * 4,
        _ => 0,
    };
    let order = c.byte_order();
    let data = c.padded_bytes(data_len)?;
    f.push(
        "value",
        requests::render_typed_data(data, detail, type_atom, order, ctx),
    );
    Ok(f)
}

fn list_properties(c: &mut Cursor<'_>, _detail: u8, ctx: &Ctx<'_>) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    let n = c.u16()? as usize;
    f.push_verbose("atoms-length", n.to_string());
    c.skip(22)?;
    let mut atoms = Vec::with_capacity(n.min(4096));
    for _ in 0..n {
        atoms.push(ctx.atom(c.u32()?));
    }
    f.push("atoms", fmt::fmt_list(&atoms, ctx.opts, 1, true));
    Ok(f)
}

fn get_selection_owner(
    c: &mut Cursor<'_>,
    _detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("owner", fmt::fmt_sentinel(c.u32()?, enums::NONE));
    c.skip(20)?;
    Ok(f)
}

fn grab_status(c: &mut Cursor<'_>, detail: u8, _ctx: &Ctx<'_>) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("status", fmt::fmt_enum(u32::from(detail), enums::GRAB_STATUS));
    c.skip(24)?;
    Ok(f)
}

fn query_pointer(c: &mut Cursor<'_>, detail: u8, _ctx: &Ctx<'_>) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("same-screen", fmt::fmt_bool(detail));
    f.push("root", c.u32()?.to_string());
    f.push("child", fmt::fmt_sentinel(c.u32()?, enums::NONE));
    f.push("root-x", c.i16()?.to_string());
    f.push("root-y", c.i16()?.to_string());
    f.push("win-x", c.i16()?.to_string());
    f.push("win-y", c.i16()?.to_string());
    f.push("mask", fmt::fmt_mask(u32::from(c.u16()?), enums::KEYBUTMASK));
    c.skip(6)?;
    Ok(f)
}

fn get_motion_events(
    c: &mut Cursor<'_>,
    _detail: u8,
    ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    let n = c.u32()? as usize;
    f.push_verbose("events-length", n.to_string());
    c.skip(20)?;
    let mut events = Vec::with_capacity(n.min(4096));
    for _ in 0..n {
        let time = ctx.time(c.u32()?);
        let x = c.i16()?;
        let y = c.i16()?;
        events.push(format!("{{ time={time}, x={x}, y={y} }}"));
    }
    f.push("events", fmt::fmt_list(&events, ctx.opts, 1, false));
    Ok(f)
}

fn translate_coordinates(
    c: &mut Cursor<'_>,
    detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("same-screen", fmt::fmt_bool(detail));
    f.push("child", fmt::fmt_sentinel(c.u32()?, enums::NONE));
    f.push("dst-x", c.i16()?.to_string());
    f.push("dst-y", c.i16()?.to_string());
    c.skip(16)?;
    Ok(f)
}

fn get_input_focus(c: &mut Cursor<'_>, detail: u8, _ctx: &Ctx<'_>) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("revert-to", fmt::fmt_enum(u32::from(detail), enums::REVERT_TO));
    f.push("focus", fmt::fmt_sentinel(c.u32()?, enums::NONE_POINTER_ROOT));
    c.skip(20)?;
    Ok(f)
}

fn query_keymap(c: &mut Cursor<'_>, _detail: u8, ctx: &Ctx<'_>) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    let keys: Vec<String> = c.bytes(32)?.iter().map(|b| format!("{b:#04x}")).collect();
    f.push("keys", fmt::fmt_list(&keys, ctx.opts, 1, true));
    Ok(f)
}

fn charinfo(c: &mut Cursor<'_>) -> Result<String, ParseError> {
    let left = c.i16()?;
    let right = c.i16()?;
    let width = c.i16()?;
    let ascent = c.i16()?;
    let descent = c.i16()?;
    let attributes = c.u16()?;
    Ok(format!(
        "{{ left-side-bearing={left}, right-side-bearing={right}, character-width={width}, \
         ascent={ascent}, descent={descent}, attributes={attributes:#06x} }}"
    ))
}

fn fontprop(c: &mut Cursor<'_>, ctx: &Ctx<'_>) -> Result<String, ParseError> {
    let name = ctx.atom(c.u32()?);
    let value = c.u32()?;
    Ok(format!("{{ name={name}, value={value} }}"))
}

fn query_font(c: &mut Cursor<'_>, _detail: u8, ctx: &Ctx<'_>) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("min-bounds", charinfo(c)?);
    c.skip(4)?;
    f.push("max-bounds", charinfo(c)?);
    c.skip(4)?;
    f.push("min-char-or-byte2", c.u16()?.to_string());
    f.push("max-char-or-byte2", c.u16()?.to_string());
    f.push("default-char", c.u16()?.to_string());
    let props_count = c.u16()? as usize;
    f.push(
        "draw-direction",
        fmt::fmt_enum(u32::from(c.u8()?), enums::DRAW_DIRECTION),
    );
    f.push("min-byte1", c.u8()?.to_string());
    f.push("max-byte1", c.u8()?.to_string());
    f.push("all-chars-exist", fmt::fmt_bool(c.u8()?));
    f.push("font-ascent", c.i16()?.to_string());
    f.push("font-descent", c.i16()?.to_string());
    let charinfos_count = c.u32()? as usize;
    let mut properties = Vec::with_capacity(props_count.min(4096));
    for _ in 0..props_count {
        properties.push(fontprop(c, ctx)?);
    }
    f.push("properties", fmt::fmt_list(&properties, ctx.opts, 1, false));
    let mut char_infos = Vec::with_capacity(charinfos_count.min(4096));
    for _ in 0..charinfos_count {
        char_infos.push(charinfo(c)?);
    }
    f.push("char-infos", fmt::fmt_list(&char_infos, ctx.opts, 1, false));
    Ok(f)
}

fn query_text_extents(
    c: &mut Cursor<'_>,
    detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push(
        "draw-direction",
        fmt::fmt_enum(u32::from(detail), enums::DRAW_DIRECTION),
    );
    f.push("font-ascent", c.i16()?.to_string());
    f.push("font-descent", c.i16()?.to_string());
    f.push("overall-ascent", c.i16()?.to_string());
    f.push("overall-descent", c.i16()?.to_string());
    f.push("overall-width", c.i32()?.to_string());
    f.push("overall-left", c.i32()?.to_string());
    f.push("overall-right", c.i32()?.to_string());
    c.skip(4)?;
    Ok(f)
}

fn list_fonts(c: &mut Cursor<'_>, _detail: u8, ctx: &Ctx<'_>) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    let n = c.u16()? as usize;
    f.push_verbose("names-length", n.to_string());
    c.skip(22)?;
    let names = requests::parse_str_list(c, n)?;
    c.align4()?;
    f.push("names", fmt::fmt_list(&names, ctx.opts, 1, false));
    Ok(f)
}

fn list_fonts_with_info(
    c: &mut Cursor<'_>,
    detail: u8,
    ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    if detail == 0 {
        // zero name length marks the final reply of the series
        f.push("last-reply", "True");
        let n = c.remaining();
        c.skip(n)?;
        return Ok(f);
    }
    let name_len = detail as usize;
    f.push("min-bounds", charinfo(c)?);
    c.skip(4)?;
    f.push("max-bounds", charinfo(c)?);
    c.skip(4)?;
    f.push("min-char-or-byte2", c.u16()?.to_string());
    f.push("max-char-or-byte2", c.u16()?.to_string());
    f.push("default-char", c.u16()?.to_string());
    let props_count = c.u16()? as usize;
    f.push(
        "draw-direction",
        fmt::fmt_enum(u32::from(c.u8()?), enums::DRAW_DIRECTION),
    );
    f.push("min-byte1", c.u8()?.to_string());
    f.push("max-byte1", c.u8()?.to_string());
    f.push("all-chars-exist", fmt::fmt_bool(c.u8()?));
    f.push("font-ascent", c.i16()?.to_string());
    f.push("font-descent", c.i16()?.to_string());
    f.push("replies-hint", c.u32()?.to_string());
    let mut properties = Vec::with_capacity(props_count.min(4096));
    for _ in 0..props_count {
        properties.push(fontprop(c, ctx)?);
    }
    f.push("properties", fmt::fmt_list(&properties, ctx.opts, 1, false));
    f.push("name", fmt::quote_string8(c.padded_bytes(name_len)?));
    Ok(f)
}

fn get_font_path(c: &mut Cursor<'_>, _detail: u8, ctx: &Ctx<'_>) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    let n = c.u16()? as usize;
    f.push_verbose("str-count", n.to_string());
    c.skip(22)?;
    let paths = requests::parse_str_list(c, n)?;
    c.align4()?;
    f.push("path", fmt::fmt_list(&paths, ctx.opts, 1, false));
    Ok(f)
}

fn get_image(c: &mut Cursor<'_>, detail: u8, _ctx: &Ctx<'_>) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("depth", detail.to_string());
    f.push("visual", fmt::fmt_sentinel(c.u32()?, enums::NONE));
    c.skip(20)?;
    let n = c.remaining();
    c.skip(n)?;
    f.push("data", fmt::fmt_opaque(n));
    Ok(f)
}

fn list_installed_colormaps(
    c: &mut Cursor<'_>,
    _detail: u8,
    ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    let n = c.u16()? as usize;
    f.push_verbose("cmaps-length", n.to_string());
    c.skip(22)?;
    let mut cmaps = Vec::with_capacity(n.min(4096));
    for _ in 0..n {
        cmaps.push(c.u32()?.to_string());
    }
    f.push("cmaps", fmt::fmt_list(&cmaps, ctx.opts, 1, true));
    Ok(f)
}

fn alloc_color(c: &mut Cursor<'_>, _detail: u8, _ctx: &Ctx<'_>) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("red", c.u16()?.to_string());
    f.push("green", c.u16()?.to_string());
    f.push("blue", c.u16()?.to_string());
    c.skip(2)?;
    f.push("pixel", c.u32()?.to_string());
    c.skip(12)?;
    Ok(f)
}

fn alloc_named_color(
    c: &mut Cursor<'_>,
    _detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("pixel", c.u32()?.to_string());
    f.push("exact-red", c.u16()?.to_string());
    f.push("exact-green", c.u16()?.to_string());
    f.push("exact-blue", c.u16()?.to_string());
    f.push("visual-red", c.u16()?.to_string());
    f.push("visual-green", c.u16()?.to_string());
    f.push("visual-blue", c.u16()?.to_string());
    c.skip(8)?;
    Ok(f)
}

fn alloc_color_cells(
    c: &mut Cursor<'_>,
    _detail: u8,
    ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    let n = c.u16()? as usize;
    let m = c.u16()? as usize;
    c.skip(20)?;
    let mut pixels = Vec::with_capacity(n.min(4096));
    for _ in 0..n {
        pixels.push(c.u32()?.to_string());
    }
    let mut masks = Vec::with_capacity(m.min(4096));
    for _ in 0..m {
        masks.push(fmt::fmt_hex32(c.u32()?));
    }
    f.push("pixels", fmt::fmt_list(&pixels, ctx.opts, 1, true));
    f.push("masks", fmt::fmt_list(&masks, ctx.opts, 1, true));
    Ok(f)
}

fn alloc_color_planes(
    c: &mut Cursor<'_>,
    _detail: u8,
    ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    let n = c.u16()? as usize;
    c.skip(2)?;
    f.push("red-mask", fmt::fmt_hex32(c.u32()?));
    f.push("green-mask", fmt::fmt_hex32(c.u32()?));
    f.push("blue-mask", fmt::fmt_hex32(c.u32()?));
    c.skip(8)?;
    let mut pixels = Vec::with_capacity(n.min(4096));
    for _ in 0..n {
        pixels.push(c.u32()?.to_string());
    }
    f.push("pixels", fmt::fmt_list(&pixels, ctx.opts, 1, true));
    Ok(f)
}

fn query_colors(c: &mut Cursor<'_>, _detail: u8, ctx: &Ctx<'_>) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    let n = c.u16()? as usize;
    f.push_verbose("colors-length", n.to_string());
    c.skip(22)?;
    let mut colors = Vec::with_capacity(n.min(4096));
    for _ in 0..n {
        let red = c.u16()?;
        let green = c.u16()?;
        let blue = c.u16()?;
        c.skip(2)?;
        colors.push(format!("{{ red={red}, green={green}, blue={blue} }}"));
    }
    f.push("colors", fmt::fmt_list(&colors, ctx.opts, 1, false));
    Ok(f)
}

fn lookup_color(c: &mut Cursor<'_>, _detail: u8, _ctx: &Ctx<'_>) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("exact-red", c.u16()?.to_string());
    f.push("exact-green", c.u16()?.to_string());
    f.push("exact-blue", c.u16()?.to_string());
    f.push("visual-red", c.u16()?.to_string());
    f.push("visual-green", c.u16()?.to_string());
    f.push("visual-blue", c.u16()?.to_string());
    c.skip(12)?;
    Ok(f)
}

fn query_best_size(c: &mut Cursor<'_>, _detail: u8, _ctx: &Ctx<'_>) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("width", c.u16()?.to_string());
    f.push("height", c.u16()?.to_string());
    c.skip(20)?;
    Ok(f)
}

fn query_extension(c: &mut Cursor<'_>, _detail: u8, _ctx: &Ctx<'_>) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("present", fmt::fmt_bool(c.u8()?));
    f.push("major-opcode", c.u8()?.to_string());
    f.push("first-event", c.u8()?.to_string());
    f.push("first-error", c.u8()?.to_string());
    c.skip(20)?;
    Ok(f)
}

/// QueryExtension reply as rendered under `--denyallextensions`: the
/// extension is reported absent no matter what the server answered.
pub fn denied_query_extension() -> FieldList {
    let mut f = FieldList::new();
    f.push("present", fmt::fmt_bool(0));
    f.push("major-opcode", "0");
    f.push("first-event", "0");
    f.push("first-error", "0");
    f
}

fn list_extensions(c: &mut Cursor<'_>, detail: u8, ctx: &Ctx<'_>) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    c.skip(24)?;
    let names = requests::parse_str_list(c, detail as usize)?;
    c.align4()?;
    f.push("names", fmt::fmt_list(&names, ctx.opts, 1, false));
    Ok(f)
}

fn get_keyboard_mapping(
    c: &mut Cursor<'_>,
    detail: u8,
    ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("keysyms-per-keycode", detail.to_string());
    c.skip(24)?;
    let mut keysyms = Vec::new();
    while c.remaining() >= 4 {
        keysyms.push(fmt::fmt_hex32(c.u32()?));
    }
    f.push("keysyms", fmt::fmt_list(&keysyms, ctx.opts, 1, true));
    Ok(f)
}

fn get_keyboard_control(
    c: &mut Cursor<'_>,
    detail: u8,
    ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push(
        "global-auto-repeat",
        fmt::fmt_enum(u32::from(detail), enums::GLOBAL_AUTO_REPEAT),
    );
    f.push("led-mask", fmt::fmt_hex32(c.u32()?));
    f.push("key-click-percent", c.u8()?.to_string());
    f.push("bell-percent", c.u8()?.to_string());
    f.push("bell-pitch", c.u16()?.to_string());
    f.push("bell-duration", c.u16()?.to_string());
    c.skip(2)?;
    let repeats: Vec<String> = c.bytes(32)?.iter().map(|b| format!("{b:#04x}")).collect();
    f.push("auto-repeats", fmt::fmt_list(&repeats, ctx.opts, 1, true));
    Ok(f)
}

fn get_pointer_control(
    c: &mut Cursor<'_>,
    _detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("acceleration-numerator", c.u16()?.to_string());
    f.push("acceleration-denominator", c.u16()?.to_string());
    f.push("threshold", c.u16()?.to_string());
    c.skip(18)?;
    Ok(f)
}

fn get_screen_saver(
    c: &mut Cursor<'_>,
    _detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("timeout", c.u16()?.to_string());
    f.push("interval", c.u16()?.to_string());
    f.push(
        "prefer-blanking",
        fmt::fmt_enum(u32::from(c.u8()?), enums::YES_NO_DEFAULT),
    );
    f.push(
        "allow-exposures",
        fmt::fmt_enum(u32::from(c.u8()?), enums::YES_NO_DEFAULT),
    );
    c.skip(18)?;
    Ok(f)
}

fn list_hosts(c: &mut Cursor<'_>, detail: u8, ctx: &Ctx<'_>) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("mode", fmt::fmt_enum(u32::from(detail), enums::ACCESS_LIST_MODE));
    let n = c.u16()? as usize;
    f.push_verbose("hosts-length", n.to_string());
    c.skip(22)?;
    let mut hosts = Vec::with_capacity(n.min(4096));
    for _ in 0..n {
        let family = c.u8()?;
        c.skip(1)?;
        let len = c.u16()? as usize;
        let address = c.padded_bytes(len)?;
        hosts.push(format!(
            "{{ family={}, address={} }}",
            fmt::fmt_enum(u32::from(family), enums::HOST_FAMILY),
            super::requests::fmt_host_address(family, address)
        ));
    }
    f.push("hosts", fmt::fmt_list(&hosts, ctx.opts, 1, false));
    Ok(f)
}

fn mapping_status(c: &mut Cursor<'_>, detail: u8, _ctx: &Ctx<'_>) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("status", fmt::fmt_enum(u32::from(detail), enums::MAPPING_STATUS));
    c.skip(24)?;
    Ok(f)
}

fn get_pointer_mapping(
    c: &mut Cursor<'_>,
    detail: u8,
    ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    c.skip(24)?;
    let map: Vec<String> = c
        .padded_bytes(detail as usize)?
        .iter()
        .map(|b| b.to_string())
        .collect();
    f.push("map", fmt::fmt_list(&map, ctx.opts, 1, true));
    Ok(f)
}

fn get_modifier_mapping(
    c: &mut Cursor<'_>,
    detail: u8,
    ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("keycodes-per-modifier", detail.to_string());
    c.skip(24)?;
    let keycodes: Vec<String> = c
        .bytes(8 * detail as usize)?
        .iter()
        .map(|b| b.to_string())
        .collect();
    f.push("keycodes", fmt::fmt_list(&keycodes, ctx.opts, 1, true));
    Ok(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::atoms::AtomTable;
    use crate::proto::endianness::ByteOrder;
    use crate::proto::fmt::FmtOptions;

    fn parse(opcode: u8, frame: &[u8], atoms: &AtomTable) -> String {
        let opts = FmtOptions::default();
        let ctx = Ctx {
            opts: &opts,
            atoms,
            time_ref: None,
        };
        let parse = lookup(opcode).unwrap();
        let mut c = Cursor::new(frame, ByteOrder::LittleEndian);
        c.skip(8).unwrap();
        let fields = parse(&mut c, frame[1], &ctx).unwrap();
        assert_eq!(c.remaining(), 0, "reply not fully consumed");
        fields.render(&opts, 0)
    }

    #[test]
    fn test_intern_atom_reply() {
        let mut frame = vec![0u8; 32];
        frame[0] = 1;
        frame[2..4].copy_from_slice(&1u16.to_le_bytes());
        frame[8..12].copy_from_slice(&137u32.to_le_bytes());
        let atoms = AtomTable::new();
        atoms.insert(137, "TEST_ATOM");
        let rendered = parse(16, &frame, &atoms);
        assert!(rendered.contains("atom=\"TEST_ATOM\"(137)"), "{rendered}");
    }

    #[test]
    fn test_get_window_attributes_reply() {
        let mut frame = vec![0u8; 44];
        frame[0] = 1;
        frame[1] = 2; // Always
        frame[4..8].copy_from_slice(&3u32.to_le_bytes()); // extra units
        frame[8..12].copy_from_slice(&0x21u32.to_le_bytes()); // visual
        frame[12..14].copy_from_slice(&1u16.to_le_bytes()); // InputOutput
        let rendered = parse(3, &frame, &AtomTable::new());
        assert!(rendered.contains("backing-store=Always(2)"));
        assert!(rendered.contains("class=InputOutput(1)"));
        assert!(rendered.contains("colormap=None(0)"));
    }

    #[test]
    fn test_query_extension_reply() {
        let mut frame = vec![0u8; 32];
        frame[0] = 1;
        frame[8] = 1; // present
        frame[9] = 129;
        let rendered = parse(98, &frame, &AtomTable::new());
        assert!(rendered.contains("present=True"));
        assert!(rendered.contains("major-opcode=129"));
    }

    #[test]
    fn test_list_fonts_with_info_last_reply() {
        let mut frame = vec![0u8; 60];
        frame[0] = 1;
        frame[1] = 0; // last in series
        frame[4..8].copy_from_slice(&7u32.to_le_bytes());
        let rendered = parse(50, &frame, &AtomTable::new());
        assert!(rendered.contains("last-reply=True"));
    }
}
