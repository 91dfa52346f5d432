//! LISTofVALUE decoding.
//!
//! Six requests carry a sparse value-list: a bitmask names which slots are
//! present, and present slots follow as 4-byte units in ascending bit
//! order. Each slot descriptor names the field and how to render its low
//! bits.

use super::endianness::Cursor;
use super::fmt::{self, FieldList, FmtOptions};
use super::{enums, ParseError};

#[derive(Clone, Copy)]
pub enum ValueKind {
    Card,
    Card16,
    Card8,
    Int16,
    Int8,
    Bool,
    Enum(&'static [&'static str]),
    /// Mask-valued slot, rendered as 8-digit hex.
    Mask,
    Sentinel(&'static [(u32, &'static str)]),
}

pub struct ValueSlot {
    pub bit: u8,
    pub name: &'static str,
    pub kind: ValueKind,
}

const fn slot(bit: u8, name: &'static str, kind: ValueKind) -> ValueSlot {
    ValueSlot { bit, name, kind }
}

/// CreateWindow / ChangeWindowAttributes.
pub const WINDOW_ATTRIBUTES: &[ValueSlot] = &[
    slot(0, "background-pixmap", ValueKind::Sentinel(enums::NONE_PARENT_RELATIVE)),
    slot(1, "background-pixel", ValueKind::Card),
    slot(2, "border-pixmap", ValueKind::Sentinel(enums::COPY_FROM_PARENT)),
    slot(3, "border-pixel", ValueKind::Card),
    slot(4, "bit-gravity", ValueKind::Enum(enums::BIT_GRAVITY)),
    slot(5, "win-gravity", ValueKind::Enum(enums::WIN_GRAVITY)),
    slot(6, "backing-store", ValueKind::Enum(enums::BACKING_STORE)),
    slot(7, "backing-planes", ValueKind::Card),
    slot(8, "backing-pixel", ValueKind::Card),
    slot(9, "override-redirect", ValueKind::Bool),
    slot(10, "save-under", ValueKind::Bool),
    slot(11, "event-mask", ValueKind::Mask),
    slot(12, "do-not-propagate-mask", ValueKind::Mask),
    slot(13, "colormap", ValueKind::Sentinel(enums::COPY_FROM_PARENT)),
    slot(14, "cursor", ValueKind::Sentinel(enums::NONE)),
];

/// ConfigureWindow.
pub const CONFIGURE_WINDOW: &[ValueSlot] = &[
    slot(0, "x", ValueKind::Int16),
    slot(1, "y", ValueKind::Int16),
    slot(2, "width", ValueKind::Card16),
    slot(3, "height", ValueKind::Card16),
    slot(4, "border-width", ValueKind::Card16),
    slot(5, "sibling", ValueKind::Sentinel(enums::NONE)),
    slot(6, "stack-mode", ValueKind::Enum(enums::STACK_MODE)),
];

/// CreateGC / ChangeGC (CopyGC only uses the mask names).
pub const GCONTEXT: &[ValueSlot] = &[
    slot(0, "function", ValueKind::Enum(enums::GC_FUNCTION)),
    slot(1, "plane-mask", ValueKind::Mask),
    slot(2, "foreground", ValueKind::Card),
    slot(3, "background", ValueKind::Card),
    slot(4, "line-width", ValueKind::Card16),
    slot(5, "line-style", ValueKind::Enum(enums::LINE_STYLE)),
    slot(6, "cap-style", ValueKind::Enum(enums::CAP_STYLE)),
    slot(7, "join-style", ValueKind::Enum(enums::JOIN_STYLE)),
    slot(8, "fill-style", ValueKind::Enum(enums::FILL_STYLE)),
    slot(9, "fill-rule", ValueKind::Enum(enums::FILL_RULE)),
    slot(10, "tile", ValueKind::Card),
    slot(11, "stipple", ValueKind::Card),
    slot(12, "tile-stipple-x-origin", ValueKind::Int16),
    slot(13, "tile-stipple-y-origin", ValueKind::Int16),
    slot(14, "font", ValueKind::Card),
    slot(15, "subwindow-mode", ValueKind::Enum(enums::SUBWINDOW_MODE)),
    slot(16, "graphics-exposures", ValueKind::Bool),
    slot(17, "clip-x-origin", ValueKind::Int16),
    slot(18, "clip-y-origin", ValueKind::Int16),
    slot(19, "clip-mask", ValueKind::Sentinel(enums::NONE)),
    slot(20, "dash-offset", ValueKind::Card16),
    slot(21, "dashes", ValueKind::Card8),
    slot(22, "arc-mode", ValueKind::Enum(enums::ARC_MODE)),
];

/// ChangeKeyboardControl.
pub const KEYBOARD_CONTROL: &[ValueSlot] = &[
    slot(0, "key-click-percent", ValueKind::Int8),
    slot(1, "bell-percent", ValueKind::Int8),
    slot(2, "bell-pitch", ValueKind::Int16),
    slot(3, "bell-duration", ValueKind::Int16),
    slot(4, "led", ValueKind::Card8),
    slot(5, "led-mode", ValueKind::Enum(enums::LED_MODE)),
    slot(6, "key", ValueKind::Card8),
    slot(7, "auto-repeat-mode", ValueKind::Enum(enums::AUTO_REPEAT_MODE)),
];

fn render_value(kind: ValueKind, raw: u32) -> String {
    match kind {
        ValueKind::Card => raw.to_string(),
        ValueKind::Card16 => (raw as u16).to_string(),
        ValueKind::Card8 => (raw as u8).to_string(),
        ValueKind::Int16 => (raw as u16 as i16).to_string(),
        ValueKind::Int8 => (raw as u8 as i8).to_string(),
        ValueKind::Bool => fmt::fmt_bool((raw != 0) as u8),
        ValueKind::Enum(names) => fmt::fmt_enum(raw, names),
        ValueKind::Mask => fmt::fmt_hex32(raw),
        ValueKind::Sentinel(table) => fmt::fmt_sentinel(raw, table),
    }
}

/// Renders a value-mask as the `|`-joined slot names of its set bits.
pub fn fmt_value_mask(mask: u32, slots: &[ValueSlot]) -> String {
    if mask == 0 {
        return "0".to_string();
    }
    let mut parts: Vec<&str> = Vec::new();
    let mut unnamed = 0u32;
    for bit in 0..32u8 {
        if mask & (1 << bit) == 0 {
            continue;
        }
        match slots.iter().find(|s| s.bit == bit) {
            Some(s) => parts.push(s.name),
            None => unnamed |= 1 << bit,
        }
    }
    let mut out = parts.join("|");
    if unnamed != 0 {
        if !out.is_empty() {
            out.push('|');
        }
        out.push_str(&format!("{unnamed:#x}"));
    }
    out
}

/// Walks the mask from low bit to high, consuming one 4-byte unit per set
/// bit and rendering it according to its slot descriptor.
pub fn parse_value_list(
    c: &mut Cursor<'_>,
    mask: u32,
    slots: &[ValueSlot],
) -> Result<FieldList, ParseError> {
    let mut fields = FieldList::new();
    for bit in 0..32u8 {
        if mask & (1 << bit) == 0 {
            continue;
        }
        let raw = c.u32()?;
        match slots.iter().find(|s| s.bit == bit) {
            Some(s) => fields.push(s.name, render_value(s.kind, raw)),
            None => fields.push(format!("unknown-bit-{bit}"), fmt::fmt_hex32(raw)),
        }
    }
    Ok(fields)
}

/// Renders a value-list in one go; the common request-body shape.
pub fn render_value_list(
    c: &mut Cursor<'_>,
    mask: u32,
    slots: &[ValueSlot],
    opts: &FmtOptions,
) -> Result<String, ParseError> {
    Ok(parse_value_list(c, mask, slots)?.render(opts, 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::endianness::ByteOrder;

    #[test]
    fn test_value_list_in_bit_order() {
        // bits 6 (backing-store), 11 (event-mask), 14 (cursor)
        let mask = (1 << 6) | (1 << 11) | (1 << 14);
        let mut data = Vec::new();
        data.extend_from_slice(&0u32.to_le_bytes()); // NotUseful
        data.extend_from_slice(&0xffu32.to_le_bytes()); // event mask
        data.extend_from_slice(&0u32.to_le_bytes()); // None cursor
        let mut c = Cursor::new(&data, ByteOrder::LittleEndian);
        let rendered =
            render_value_list(&mut c, mask, WINDOW_ATTRIBUTES, &FmtOptions::default()).unwrap();
        assert_eq!(
            rendered,
            "{ backing-store=NotUseful(0), event-mask=0x000000ff, cursor=None(0) }"
        );
        assert!(c.is_empty());
    }

    #[test]
    fn test_value_mask_names() {
        let mask = (1 << 6) | (1 << 11) | (1 << 14);
        assert_eq!(
            fmt_value_mask(mask, WINDOW_ATTRIBUTES),
            "backing-store|event-mask|cursor"
        );
        assert_eq!(fmt_value_mask(0, WINDOW_ATTRIBUTES), "0");
        // bit 31 has no slot anywhere
        assert_eq!(fmt_value_mask(1 << 31, WINDOW_ATTRIBUTES), "0x80000000");
    }

    #[test]
    fn test_small_types_take_low_bits() {
        let mask = (1 << 0) | (1 << 2); // x (INT16), width (CARD16)
        let mut data = Vec::new();
        data.extend_from_slice(&(-7i32 as u32).to_le_bytes());
        data.extend_from_slice(&640u32.to_le_bytes());
        let mut c = Cursor::new(&data, ByteOrder::LittleEndian);
        let rendered =
            render_value_list(&mut c, mask, CONFIGURE_WINDOW, &FmtOptions::default()).unwrap();
        assert_eq!(rendered, "{ x=-7, width=640 }");
    }

    #[test]
    fn test_truncated_value_list() {
        let mask = (1 << 0) | (1 << 1);
        let data = 0u32.to_le_bytes();
        let mut c = Cursor::new(&data, ByteOrder::LittleEndian);
        assert!(parse_value_list(&mut c, mask, CONFIGURE_WINDOW).is_err());
    }
}
