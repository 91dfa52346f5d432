//! Core error decoders (codes 1-17).
//!
//! Errors are 32 bytes: zero, the error code, the sequence number of the
//! failed request, a 32-bit value (meaningful only for the value/resource
//! error kinds), then minor and major opcode.

use super::endianness::Cursor;
use super::fmt::FieldList;
use super::requests::{self, Ctx};
use super::ParseError;

/// Wire size of every error.
pub const ERROR_SIZE: usize = 32;

const ERROR_NAMES: &[&str] = &[
    "",
    "Request",
    "Value",
    "Window",
    "Pixmap",
    "Atom",
    "Cursor",
    "Font",
    "Match",
    "Drawable",
    "Access",
    "Alloc",
    "Colormap",
    "GContext",
    "IDChoice",
    "Name",
    "Length",
    "Implementation",
];

pub fn name(code: u8) -> &'static str {
    match ERROR_NAMES.get(code as usize) {
        Some(name) if !name.is_empty() => name,
        _ => "unknown",
    }
}

/// Whether this error kind carries a meaningful 32-bit bad value.
fn has_bad_value(code: u8) -> bool {
    matches!(code, 2..=7 | 9 | 12..=14)
}

/// Parses the error body; the cursor is positioned after code and
/// sequence (offset 4 of the 32-byte frame).
pub fn parse(c: &mut Cursor<'_>, code: u8, _ctx: &Ctx<'_>) -> Result<FieldList, ParseError> {
    let mut f = FieldList::new();
    let value = c.u32()?;
    if has_bad_value(code) {
        f.push("bad-value", value.to_string());
    } else {
        f.push_verbose("value", value.to_string());
    }
    f.push("minor-opcode", c.u16()?.to_string());
    let major = c.u8()?;
    f.push("major-opcode", major.to_string());
    f.push("request", requests::name(major));
    c.skip(21)?;
    Ok(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::atoms::AtomTable;
    use crate::proto::endianness::ByteOrder;
    use crate::proto::fmt::FmtOptions;

    #[test]
    fn test_error_names() {
        assert_eq!(name(1), "Request");
        assert_eq!(name(5), "Atom");
        assert_eq!(name(17), "Implementation");
        assert_eq!(name(0), "unknown");
        assert_eq!(name(18), "unknown");
    }

    #[test]
    fn test_atom_error_body() {
        let mut frame = vec![0u8; 32];
        frame[0] = 0;
        frame[1] = 5; // Atom
        frame[2..4].copy_from_slice(&3u16.to_le_bytes());
        frame[4..8].copy_from_slice(&999u32.to_le_bytes());
        frame[8..10].copy_from_slice(&0u16.to_le_bytes());
        frame[10] = 17; // GetAtomName
        let opts = FmtOptions::default();
        let atoms = AtomTable::new();
        let ctx = Ctx {
            opts: &opts,
            atoms: &atoms,
            time_ref: None,
        };
        let mut c = Cursor::new(&frame, ByteOrder::LittleEndian);
        c.skip(4).unwrap();
        let fields = parse(&mut c, 5, &ctx).unwrap();
        assert_eq!(c.remaining(), 0);
        let rendered = fields.render(&opts, 0);
        assert!(rendered.contains("bad-value=999"));
        assert!(rendered.contains("major-opcode=17"));
        assert!(rendered.contains("request=GetAtomName"));
    }

    #[test]
    fn test_access_error_hides_value() {
        let mut frame = vec![0u8; 32];
        frame[1] = 10; // Access
        let opts = FmtOptions::default();
        let atoms = AtomTable::new();
        let ctx = Ctx {
            opts: &opts,
            atoms: &atoms,
            time_ref: None,
        };
        let mut c = Cursor::new(&frame, ByteOrder::LittleEndian);
        c.skip(4).unwrap();
        let fields = parse(&mut c, 10, &ctx).unwrap();
        let rendered = fields.render(&opts, 0);
        assert!(!rendered.contains("bad-value"));
    }
}
