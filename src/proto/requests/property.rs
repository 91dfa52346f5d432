//! Atom, property, selection and SendEvent requests (opcodes 16-25).

use super::Ctx;
use crate::proto::endianness::{ByteOrder, Cursor};
use crate::proto::fmt::{self, FieldList};
use crate::proto::{enums, events, ParseError};

pub(super) fn intern_atom(
    c: &mut Cursor<'_>,
    detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("only-if-exists", fmt::fmt_bool(detail));
    let n = c.u16()? as usize;
    c.skip(2)?;
    f.push("n", n.to_string());
    f.push("name", fmt::quote_string8(c.padded_bytes(n)?));
    Ok(f)
}

/// The name argument of an InternAtom body, for the request stash.
pub(crate) fn intern_atom_name(body: &[u8], order: ByteOrder) -> Option<String> {
    let mut c = Cursor::new(body, order);
    let n = c.u16().ok()? as usize;
    c.skip(2).ok()?;
    let name = c.bytes(n).ok()?;
    Some(String::from_utf8_lossy(name).into_owned())
}

pub(super) fn get_atom_name(
    c: &mut Cursor<'_>,
    _detail: u8,
    ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("atom", ctx.atom(c.u32()?));
    Ok(f)
}

/// Property payloads render by format: quoted text, 16-bit hex units, or
/// 32-bit values (atom-resolved when the type is ATOM).
pub(crate) fn render_typed_data(
    bytes: &[u8],
    format: u8,
    type_atom: u32,
    order: ByteOrder,
    ctx: &Ctx<'_>,
) -> String {
    match format {
        8 => fmt::quote_string8(bytes),
        16 => {
            let mut c = Cursor::new(bytes, order);
            let mut units = Vec::new();
            while let Ok(u) = c.u16() {
                units.push(u);
            }
            fmt::fmt_char2b(&units)
        }
        32 => {
            let mut c = Cursor::new(bytes, order);
            let mut items = Vec::new();
            while let Ok(v) = c.u32() {
                // ATOM is predefined atom 4
                if type_atom == 4 {
                    items.push(ctx.atom(v));
                } else {
                    items.push(v.to_string());
                }
            }
            fmt::fmt_list(&items, ctx.opts, 1, true)
        }
        _ => fmt::fmt_opaque(bytes.len()),
    }
}

pub(super) fn change_property(
    c: &mut Cursor<'_>,
    detail: u8,
    ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("mode", fmt::fmt_enum(u32::from(detail), enums::PROPERTY_MODE));
    f.push("window", c.u32()?.to_string());
    f.push("property", ctx.atom(c.u32()?));
    let type_atom = c.u32()?;
    f.push("type", ctx.atom(type_atom));
    let format = c.u8()?;
    f.push("format", format.to_string());
    c.skip(3)?;
    let unit_count = c.u32()? as usize;
    f.push_verbose("length", unit_count.to_string());
    let data_len = match format {
        8 => unit_count,
        16 => unit_count * 2,
        32 => unit_count * 4,
        _ => c.remaining(),
    };
    let order = c.byte_order();
    let data = c.padded_bytes(data_len)?;
    f.push("data", render_typed_data(data, format, type_atom, order, ctx));
    Ok(f)
}

pub(super) fn delete_property(
    c: &mut Cursor<'_>,
    _detail: u8,
    ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("window", c.u32()?.to_string());
    f.push("property", ctx.atom(c.u32()?));
    Ok(f)
}

pub(super) fn get_property(
    c: &mut Cursor<'_>,
    detail: u8,
    ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("delete", fmt::fmt_bool(detail));
    f.push("window", c.u32()?.to_string());
    f.push("property", ctx.atom(c.u32()?));
    f.push("type", fmt::fmt_property_type(c.u32()?, ctx.atoms));
    f.push("long-offset", c.u32()?.to_string());
    f.push("long-length", c.u32()?.to_string());
    Ok(f)
}

resource_request!(list_properties, "window");

pub(super) fn set_selection_owner(
    c: &mut Cursor<'_>,
    _detail: u8,
    ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("owner", fmt::fmt_sentinel(c.u32()?, enums::NONE));
    f.push("selection", ctx.atom(c.u32()?));
    f.push("time", ctx.time(c.u32()?));
    Ok(f)
}

pub(super) fn get_selection_owner(
    c: &mut Cursor<'_>,
    _detail: u8,
    ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("selection", ctx.atom(c.u32()?));
    Ok(f)
}

pub(super) fn convert_selection(
    c: &mut Cursor<'_>,
    _detail: u8,
    ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("requestor", c.u32()?.to_string());
    f.push("selection", ctx.atom(c.u32()?));
    f.push("target", ctx.atom(c.u32()?));
    f.push("property", ctx.atom(c.u32()?));
    f.push("time", ctx.time(c.u32()?));
    Ok(f)
}

pub(super) fn send_event(
    c: &mut Cursor<'_>,
    detail: u8,
    ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("propagate", fmt::fmt_bool(detail));
    f.push(
        "destination",
        fmt::fmt_sentinel(c.u32()?, enums::POINTER_WINDOW_INPUT_FOCUS),
    );
    f.push("event-mask", fmt::fmt_mask(c.u32()?, enums::EVENT_MASK));
    // all events are 32 bytes, so the embedded body reuses the event decoder
    let order = c.byte_order();
    let event_bytes = c.bytes(32)?;
    f.push("event", events::format_embedded(event_bytes, order, ctx)?);
    Ok(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::atoms::AtomTable;
    use crate::proto::fmt::FmtOptions;

    fn ctx<'a>(opts: &'a FmtOptions, atoms: &'a AtomTable) -> Ctx<'a> {
        Ctx {
            opts,
            atoms,
            time_ref: None,
        }
    }

    #[test]
    fn test_intern_atom_body() {
        // n=9, "TEST_ATOM" padded to 12
        let mut body = Vec::new();
        body.extend_from_slice(&9u16.to_le_bytes());
        body.extend_from_slice(&[0, 0]);
        body.extend_from_slice(b"TEST_ATOM");
        body.extend_from_slice(&[0; 3]);
        let opts = FmtOptions::default();
        let atoms = AtomTable::new();
        let mut c = Cursor::new(&body, ByteOrder::LittleEndian);
        let f = intern_atom(&mut c, 1, &ctx(&opts, &atoms)).unwrap();
        assert!(c.is_empty());
        assert_eq!(
            f.render(&opts, 0),
            r#"{ only-if-exists=True, n=9, name="TEST_ATOM" }"#
        );
        assert_eq!(
            intern_atom_name(&body, ByteOrder::LittleEndian).as_deref(),
            Some("TEST_ATOM")
        );
    }

    #[test]
    fn test_change_property_atom_typed_data() {
        let mut body = Vec::new();
        body.extend_from_slice(&0x5eu32.to_le_bytes()); // window
        body.extend_from_slice(&39u32.to_le_bytes()); // WM_NAME
        body.extend_from_slice(&4u32.to_le_bytes()); // type ATOM
        body.push(32);
        body.extend_from_slice(&[0; 3]);
        body.extend_from_slice(&1u32.to_le_bytes()); // one unit
        body.extend_from_slice(&31u32.to_le_bytes()); // STRING
        let opts = FmtOptions::default();
        let atoms = AtomTable::new();
        let mut c = Cursor::new(&body, ByteOrder::LittleEndian);
        let f = change_property(&mut c, 0, &ctx(&opts, &atoms)).unwrap();
        assert!(c.is_empty());
        let rendered = f.render(&opts, 0);
        assert!(rendered.contains("property=\"WM_NAME\"(39)"));
        assert!(rendered.contains("data=[ \"STRING\"(31) ]"));
    }
}
