//! Font requests (opcodes 45-52).

use super::Ctx;
use crate::proto::endianness::Cursor;
use crate::proto::fmt::{self, FieldList};
use crate::proto::ParseError;

pub(super) fn open_font(
    c: &mut Cursor<'_>,
    _detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("fid", c.u32()?.to_string());
    let n = c.u16()? as usize;
    c.skip(2)?;
    f.push("n", n.to_string());
    f.push("name", fmt::quote_string8(c.padded_bytes(n)?));
    Ok(f)
}

resource_request!(close_font, "font");
resource_request!(query_font, "font");

pub(super) fn query_text_extents(
    c: &mut Cursor<'_>,
    detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let odd_length = detail != 0;
    let mut f = FieldList::new();
    f.push("odd-length", fmt::fmt_bool(detail));
    f.push("font", c.u32()?.to_string());
    // the string fills the frame; odd-length marks 2 trailing pad bytes
    let units = (c.remaining() / 2).saturating_sub(usize::from(odd_length));
    f.push("string", super::parse_string16(c, units)?);
    if odd_length {
        c.skip(2)?;
    }
    Ok(f)
}

pub(super) fn list_fonts(
    c: &mut Cursor<'_>,
    _detail: u8,
    _ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    f.push("max-names", c.u16()?.to_string());
    let n = c.u16()? as usize;
    f.push_verbose("pattern-length", n.to_string());
    f.push("pattern", fmt::quote_string8(c.padded_bytes(n)?));
    Ok(f)
}

pub(super) fn list_fonts_with_info(
    c: &mut Cursor<'_>,
    detail: u8,
    ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    list_fonts(c, detail, ctx)
}

pub(super) fn set_font_path(
    c: &mut Cursor<'_>,
    _detail: u8,
    ctx: &Ctx<'_>,
) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    let count = c.u16()? as usize;
    c.skip(2)?;
    f.push_verbose("str-count", count.to_string());
    let paths = super::parse_str_list(c, count)?;
    c.align4()?;
    f.push("path", fmt::fmt_list(&paths, ctx.opts, 1, false));
    Ok(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::atoms::AtomTable;
    use crate::proto::endianness::ByteOrder;
    use crate::proto::fmt::FmtOptions;

    #[test]
    fn test_query_text_extents_odd_length() {
        // font + 3 CHAR2B units + 2 pad bytes, odd-length set
        let mut body = Vec::new();
        body.extend_from_slice(&7u32.to_le_bytes());
        body.extend_from_slice(&[0x00, 0x41, 0x00, 0x42, 0x00, 0x43]);
        body.extend_from_slice(&[0, 0]);
        let opts = FmtOptions::default();
        let atoms = AtomTable::new();
        let ctx = Ctx {
            opts: &opts,
            atoms: &atoms,
            time_ref: None,
        };
        let mut c = Cursor::new(&body, ByteOrder::LittleEndian);
        let f = query_text_extents(&mut c, 1, &ctx).unwrap();
        assert!(c.is_empty());
        let rendered = f.render(&opts, 0);
        assert!(rendered.contains("string=0x0041 0x0042 0x0043"));
    }

    #[test]
    fn test_set_font_path() {
        let mut body = Vec::new();
        body.extend_from_slice(&2u16.to_le_bytes());
        body.extend_from_slice(&[0, 0]);
        body.push(4);
        body.extend_from_slice(b"/foo");
        body.push(2);
        body.extend_from_slice(b"/b");
        body.push(0); // pad to 4
        let opts = FmtOptions::default();
        let atoms = AtomTable::new();
        let ctx = Ctx {
            opts: &opts,
            atoms: &atoms,
            time_ref: None,
        };
        let mut c = Cursor::new(&body, ByteOrder::LittleEndian);
        let f = set_font_path(&mut c, 0, &ctx).unwrap();
        assert!(c.is_empty());
        assert!(f.render(&opts, 0).contains("path=[ \"/foo\", \"/b\" ]"));
    }
}
