//! Core request decoders, opcodes 1-119 and 127.
//!
//! Every parser receives a cursor positioned after the 4-byte request
//! preamble (opcode, detail byte, length), the detail byte, and the shared
//! [`Ctx`]. It must consume the body exactly; the dispatch layer treats
//! leftover bytes as a framing mismatch.
//!
//! Dozens of requests share a shape (no body, or one resource id), which
//! the `resource_request!` macro collapses the way the reference collapses
//! them into generic helpers.

use super::atoms::AtomTable;
use super::endianness::Cursor;
use super::fmt::{self, FieldList, FmtOptions, TimeRef};
use super::ParseError;

/// Shared context available to every request/reply parser.
pub struct Ctx<'a> {
    pub opts: &'a FmtOptions,
    pub atoms: &'a AtomTable,
    pub time_ref: Option<TimeRef>,
}

impl Ctx<'_> {
    pub fn atom(&self, value: u32) -> String {
        fmt::fmt_atom(value, self.atoms)
    }

    pub fn time(&self, value: u32) -> String {
        fmt::fmt_timestamp(value, self.time_ref.as_ref())
    }
}

pub type ParseFn = fn(&mut Cursor<'_>, u8, &Ctx<'_>) -> Result<FieldList, ParseError>;

pub struct RequestInfo {
    pub name: &'static str,
    pub parse: ParseFn,
}

/// Requests whose body is empty.
pub(crate) fn empty_body(
    _c: &mut Cursor<'_>,
    _detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    Ok(FieldList::new())
}

/// Requests whose body is a single 4-byte resource id.
macro_rules! resource_request {
    ($name:ident, $field:literal) => {
        pub(super) fn $name(
            c: &mut crate::proto::endianness::Cursor<'_>,
            _detail: u8,
            _ctx: &crate::proto::requests::Ctx<'_>,
        ) -> Result<crate::proto::fmt::FieldList, crate::proto::ParseError> {
            let mut f = crate::proto::fmt::FieldList::new();
            f.push($field, c.u32()?.to_string());
            Ok(f)
        }
    };
}

mod colormap;
mod drawing;
mod font;
mod gcontext;
mod input;
mod misc;
mod property;
mod window;

pub(crate) use misc::fmt_host_address;
pub(crate) use property::{intern_atom_name, render_typed_data};

/// Dispatch table: opcode to name and parser.
pub fn lookup(opcode: u8) -> Option<RequestInfo> {
    let (name, parse): (&'static str, ParseFn) = match opcode {
        1 => ("CreateWindow", window::create_window),
        2 => ("ChangeWindowAttributes", window::change_window_attributes),
        3 => ("GetWindowAttributes", window::get_window_attributes),
        4 => ("DestroyWindow", window::destroy_window),
        5 => ("DestroySubwindows", window::destroy_subwindows),
        6 => ("ChangeSaveSet", window::change_save_set),
        7 => ("ReparentWindow", window::reparent_window),
        8 => ("MapWindow", window::map_window),
        9 => ("MapSubwindows", window::map_subwindows),
        10 => ("UnmapWindow", window::unmap_window),
        11 => ("UnmapSubwindows", window::unmap_subwindows),
        12 => ("ConfigureWindow", window::configure_window),
        13 => ("CirculateWindow", window::circulate_window),
        14 => ("GetGeometry", window::get_geometry),
        15 => ("QueryTree", window::query_tree),
        16 => ("InternAtom", property::intern_atom),
        17 => ("GetAtomName", property::get_atom_name),
        18 => ("ChangeProperty", property::change_property),
        19 => ("DeleteProperty", property::delete_property),
        20 => ("GetProperty", property::get_property),
        21 => ("ListProperties", property::list_properties),
        22 => ("SetSelectionOwner", property::set_selection_owner),
        23 => ("GetSelectionOwner", property::get_selection_owner),
        24 => ("ConvertSelection", property::convert_selection),
        25 => ("SendEvent", property::send_event),
        26 => ("GrabPointer", input::grab_pointer),
        27 => ("UngrabPointer", input::ungrab_pointer),
        28 => ("GrabButton", input::grab_button),
        29 => ("UngrabButton", input::ungrab_button),
        30 => ("ChangeActivePointerGrab", input::change_active_pointer_grab),
        31 => ("GrabKeyboard", input::grab_keyboard),
        32 => ("UngrabKeyboard", input::ungrab_keyboard),
        33 => ("GrabKey", input::grab_key),
        34 => ("UngrabKey", input::ungrab_key),
        35 => ("AllowEvents", input::allow_events),
        36 => ("GrabServer", empty_body),
        37 => ("UngrabServer", empty_body),
        38 => ("QueryPointer", input::query_pointer),
        39 => ("GetMotionEvents", input::get_motion_events),
        40 => ("TranslateCoordinates", input::translate_coordinates),
        41 => ("WarpPointer", input::warp_pointer),
        42 => ("SetInputFocus", input::set_input_focus),
        43 => ("GetInputFocus", empty_body),
        44 => ("QueryKeymap", empty_body),
        45 => ("OpenFont", font::open_font),
        46 => ("CloseFont", font::close_font),
        47 => ("QueryFont", font::query_font),
        48 => ("QueryTextExtents", font::query_text_extents),
        49 => ("ListFonts", font::list_fonts),
        50 => ("ListFontsWithInfo", font::list_fonts_with_info),
        51 => ("SetFontPath", font::set_font_path),
        52 => ("GetFontPath", empty_body),
        53 => ("CreatePixmap", gcontext::create_pixmap),
        54 => ("FreePixmap", gcontext::free_pixmap),
        55 => ("CreateGC", gcontext::create_gc),
        56 => ("ChangeGC", gcontext::change_gc),
        57 => ("CopyGC", gcontext::copy_gc),
        58 => ("SetDashes", gcontext::set_dashes),
        59 => ("SetClipRectangles", gcontext::set_clip_rectangles),
        60 => ("FreeGC", gcontext::free_gc),
        61 => ("ClearArea", drawing::clear_area),
        62 => ("CopyArea", drawing::copy_area),
        63 => ("CopyPlane", drawing::copy_plane),
        64 => ("PolyPoint", drawing::poly_point),
        65 => ("PolyLine", drawing::poly_line),
        66 => ("PolySegment", drawing::poly_segment),
        67 => ("PolyRectangle", drawing::poly_rectangle),
        68 => ("PolyArc", drawing::poly_arc),
        69 => ("FillPoly", drawing::fill_poly),
        70 => ("PolyFillRectangle", drawing::poly_fill_rectangle),
        71 => ("PolyFillArc", drawing::poly_fill_arc),
        72 => ("PutImage", drawing::put_image),
        73 => ("GetImage", drawing::get_image),
        74 => ("PolyText8", drawing::poly_text8),
        75 => ("PolyText16", drawing::poly_text16),
        76 => ("ImageText8", drawing::image_text8),
        77 => ("ImageText16", drawing::image_text16),
        78 => ("CreateColormap", colormap::create_colormap),
        79 => ("FreeColormap", colormap::free_colormap),
        80 => ("CopyColormapAndFree", colormap::copy_colormap_and_free),
        81 => ("InstallColormap", colormap::install_colormap),
        82 => ("UninstallColormap", colormap::uninstall_colormap),
        83 => ("ListInstalledColormaps", colormap::list_installed_colormaps),
        84 => ("AllocColor", colormap::alloc_color),
        85 => ("AllocNamedColor", colormap::alloc_named_color),
        86 => ("AllocColorCells", colormap::alloc_color_cells),
        87 => ("AllocColorPlanes", colormap::alloc_color_planes),
        88 => ("FreeColors", colormap::free_colors),
        89 => ("StoreColors", colormap::store_colors),
        90 => ("StoreNamedColor", colormap::store_named_color),
        91 => ("QueryColors", colormap::query_colors),
        92 => ("LookupColor", colormap::lookup_color),
        93 => ("CreateCursor", colormap::create_cursor),
        94 => ("CreateGlyphCursor", colormap::create_glyph_cursor),
        95 => ("FreeCursor", colormap::free_cursor),
        96 => ("RecolorCursor", colormap::recolor_cursor),
        97 => ("QueryBestSize", misc::query_best_size),
        98 => ("QueryExtension", misc::query_extension),
        99 => ("ListExtensions", empty_body),
        100 => ("ChangeKeyboardMapping", misc::change_keyboard_mapping),
        101 => ("GetKeyboardMapping", misc::get_keyboard_mapping),
        102 => ("ChangeKeyboardControl", misc::change_keyboard_control),
        103 => ("GetKeyboardControl", empty_body),
        104 => ("Bell", misc::bell),
        105 => ("ChangePointerControl", misc::change_pointer_control),
        106 => ("GetPointerControl", empty_body),
        107 => ("SetScreenSaver", misc::set_screen_saver),
        108 => ("GetScreenSaver", empty_body),
        109 => ("ChangeHosts", misc::change_hosts),
        110 => ("ListHosts", empty_body),
        111 => ("SetAccessControl", misc::set_access_control),
        112 => ("SetCloseDownMode", misc::set_close_down_mode),
        113 => ("KillClient", misc::kill_client),
        114 => ("RotateProperties", misc::rotate_properties),
        115 => ("ForceScreenSaver", misc::force_screen_saver),
        116 => ("SetPointerMapping", misc::set_pointer_mapping),
        117 => ("GetPointerMapping", empty_body),
        118 => ("SetModifierMapping", misc::set_modifier_mapping),
        119 => ("GetModifierMapping", empty_body),
        127 => ("NoOperation", misc::no_operation),
        _ => return None,
    };
    Some(RequestInfo { name, parse })
}

/// Request name for log records; extension opcodes are not decoded.
pub fn name(opcode: u8) -> &'static str {
    lookup(opcode).map(|info| info.name).unwrap_or("unknown")
}

// --- shared geometry list parsers -------------------------------------------

pub(crate) fn parse_points(c: &mut Cursor<'_>, ctx: &Ctx<'_>) -> Result<String, ParseError> {
    let mut items = Vec::new();
    while c.remaining() >= 4 {
        let x = c.i16()?;
        let y = c.i16()?;
        items.push(format!("{{ x={x}, y={y} }}"));
    }
    Ok(fmt::fmt_list(&items, ctx.opts, 1, true))
}

pub(crate) fn parse_segments(c: &mut Cursor<'_>, ctx: &Ctx<'_>) -> Result<String, ParseError> {
    let mut items = Vec::new();
    while c.remaining() >= 8 {
        let x1 = c.i16()?;
        let y1 = c.i16()?;
        let x2 = c.i16()?;
        let y2 = c.i16()?;
        items.push(format!("{{ x1={x1}, y1={y1}, x2={x2}, y2={y2} }}"));
    }
    Ok(fmt::fmt_list(&items, ctx.opts, 1, false))
}

pub(crate) fn parse_rectangles(c: &mut Cursor<'_>, ctx: &Ctx<'_>) -> Result<String, ParseError> {
    let mut items = Vec::new();
    while c.remaining() >= 8 {
        items.push(parse_rectangle(c)?);
    }
    Ok(fmt::fmt_list(&items, ctx.opts, 1, false))
}

pub(crate) fn parse_rectangle(c: &mut Cursor<'_>) -> Result<String, ParseError> {
    let x = c.i16()?;
    let y = c.i16()?;
    let width = c.u16()?;
    let height = c.u16()?;
    Ok(format!("{{ x={x}, y={y}, width={width}, height={height} }}"))
}

pub(crate) fn parse_arcs(c: &mut Cursor<'_>, ctx: &Ctx<'_>) -> Result<String, ParseError> {
    let mut items = Vec::new();
    while c.remaining() >= 12 {
        let x = c.i16()?;
        let y = c.i16()?;
        let width = c.u16()?;
        let height = c.u16()?;
        let angle1 = c.i16()?;
        let angle2 = c.i16()?;
        items.push(format!(
            "{{ x={x}, y={y}, width={width}, height={height}, angle1={angle1}, angle2={angle2} }}"
        ));
    }
    Ok(fmt::fmt_list(&items, ctx.opts, 1, false))
}

/// LISTofSTR: length-prefixed strings, no padding between elements.
pub(crate) fn parse_str_list(c: &mut Cursor<'_>, count: usize) -> Result<Vec<String>, ParseError> {
    let mut items = Vec::with_capacity(count.min(4096));
    for _ in 0..count {
        let len = c.u8()? as usize;
        items.push(fmt::quote_string8(c.bytes(len)?));
    }
    Ok(items)
}

/// LISTofKEYSYM rendered as hex.
pub(crate) fn parse_keysyms(c: &mut Cursor<'_>, count: usize) -> Result<Vec<String>, ParseError> {
    let mut items = Vec::with_capacity(count.min(4096));
    for _ in 0..count {
        items.push(fmt::fmt_hex32(c.u32()?));
    }
    Ok(items)
}

/// STRING16 as big-endian CHAR2B units.
pub(crate) fn parse_string16(c: &mut Cursor<'_>, count: usize) -> Result<String, ParseError> {
    let mut units = Vec::with_capacity(count.min(4096));
    for _ in 0..count {
        units.push(c.u16_be()?);
    }
    Ok(fmt::fmt_char2b(&units))
}
