//! Trace record construction and value rendering.
//!
//! Decoders build a [`FieldList`] per message; rendering obeys the
//! formatting knobs (`--verbose`, `--multiline`, `--maxlistlength`). The
//! free functions here implement the per-type value rendering rules:
//! decimal integers by default, `Name(raw)` enums, `|`-joined mask names,
//! interned atom names, optional wall-clock timestamps, escaped strings.

use std::borrow::Cow;

use super::atoms::AtomTable;
use super::{Atom, Timestamp};

/// Formatting knobs, resolved from the CLI.
#[derive(Debug, Clone, Default)]
pub struct FmtOptions {
    pub verbose: bool,
    pub multiline: bool,
    pub max_list_length: Option<usize>,
}

/// Reference pair mapping server TIMESTAMPs onto wall-clock time, captured
/// by the bootstrap client behind `--systemtimeformat`.
#[derive(Debug, Clone, Copy)]
pub struct TimeRef {
    pub server_time: Timestamp,
    pub unix_time: i64,
}

/// Direction of a proxied message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ClientToServer,
    ServerToClient,
}

impl Direction {
    pub fn symbol(self) -> char {
        match self {
            Self::ClientToServer => '<',
            Self::ServerToClient => '>',
        }
    }
}

struct Field {
    name: Cow<'static, str>,
    value: String,
    verbose_only: bool,
}

/// Ordered list of `name=value` pairs of one record or nested structure.
#[derive(Default)]
pub struct FieldList {
    fields: Vec<Field>,
}

impl FieldList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<Cow<'static, str>>, value: impl Into<String>) {
        self.fields.push(Field {
            name: name.into(),
            value: value.into(),
            verbose_only: false,
        });
    }

    /// Wire bookkeeping shown only with `--verbose`.
    pub fn push_verbose(&mut self, name: impl Into<Cow<'static, str>>, value: impl Into<String>) {
        self.fields.push(Field {
            name: name.into(),
            value: value.into(),
            verbose_only: true,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Appends all fields of `other`.
    pub fn extend(&mut self, other: FieldList) {
        self.fields.extend(other.fields);
    }

    /// Renders the brace-enclosed list. `depth` is the tab depth of the
    /// enclosing record; members indent one deeper in multi-line mode, and
    /// the `=` column aligns on the longest member name.
    pub fn render(&self, opts: &FmtOptions, depth: usize) -> String {
        let shown: Vec<&Field> = self
            .fields
            .iter()
            .filter(|f| opts.verbose || !f.verbose_only)
            .collect();
        if shown.is_empty() {
            return "{ }".to_string();
        }
        if !opts.multiline {
            let body = shown
                .iter()
                .map(|f| format!("{}={}", f.name, f.value))
                .collect::<Vec<_>>()
                .join(", ");
            return format!("{{ {body} }}");
        }

        let name_width = shown.iter().map(|f| f.name.len()).max().unwrap_or(0);
        let mut out = String::from("{\n");
        for field in &shown {
            out.push_str(&tabs(depth + 1));
            out.push_str(&format!(
                "{:<width$} = {},\n",
                field.name,
                field.value,
                width = name_width
            ));
        }
        out.push_str(&tabs(depth));
        out.push('}');
        out
    }
}

fn tabs(n: usize) -> String {
    "\t".repeat(n)
}

// --- value renderers --------------------------------------------------------

/// `Name(raw)` when the table names the value, bare decimal otherwise.
pub fn fmt_enum(value: u32, names: &[&str]) -> String {
    match names.get(value as usize) {
        Some(name) if !name.is_empty() => format!("{name}({value})"),
        _ => value.to_string(),
    }
}

/// Sentinel-aware integer: exact matches render `Name(raw)`.
pub fn fmt_sentinel(value: u32, sentinels: &[(u32, &str)]) -> String {
    for &(v, name) in sentinels {
        if value == v {
            return format!("{name}({value})");
        }
    }
    value.to_string()
}

pub fn fmt_bool(value: u8) -> String {
    if value == 0 { "False" } else { "True" }.to_string()
}

/// `|`-joined names of set bits; unnamed set bits are appended as hex.
pub fn fmt_mask(value: u32, names: &[&str]) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut parts: Vec<&str> = Vec::new();
    let mut unnamed = 0u32;
    for bit in 0..32 {
        if value & (1 << bit) == 0 {
            continue;
        }
        match names.get(bit) {
            Some(name) if !name.is_empty() => parts.push(name),
            _ => unnamed |= 1 << bit,
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

/// SETofKEYMASK with the AnyModifier sentinel.
pub fn fmt_modifiers(value: u16) -> String {
    if u32::from(value) == super::enums::ANY_MODIFIER {
        return format!("AnyModifier({:#06x})", value);
    }
    fmt_mask(u32::from(value), super::enums::KEYMASK)
}

/// Zero-padded 8-digit hex, the rendering of mask-valued 32-bit slots.
pub fn fmt_hex32(value: u32) -> String {
    format!("{value:#010x}")
}

/// `"<name>"(id)` for interned atoms, `UnknownAtom(id)` otherwise.
pub fn fmt_atom(value: Atom, atoms: &AtomTable) -> String {
    if value == 0 {
        return "None(0)".to_string();
    }
    match atoms.name(value) {
        Some(name) => format!("{}({value})", quote_string8(name.as_bytes())),
        None => format!("UnknownAtom({value})"),
    }
}

/// ATOM field that also admits the AnyPropertyType sentinel.
pub fn fmt_property_type(value: Atom, atoms: &AtomTable) -> String {
    if value == 0 {
        return "AnyPropertyType(0)".to_string();
    }
    fmt_atom(value, atoms)
}

/// Raw 32-bit timestamp, or wall-clock time when a reference pair is set.
/// Zero is the CurrentTime sentinel in requests.
pub fn fmt_timestamp(value: Timestamp, time_ref: Option<&TimeRef>) -> String {
    if value == 0 {
        return "CurrentTime(0)".to_string();
    }
    let Some(r) = time_ref else {
        return value.to_string();
    };
    // the millisecond counter wraps every ~49.7 days; sign-extend the
    // wrapped difference so timestamps before the reference stay in the past
    let delta_ms = i64::from(value.wrapping_sub(r.server_time) as i32);
    let secs = r.unix_time + delta_ms.div_euclid(1000);
    let nanos = delta_ms.rem_euclid(1000) as u32 * 1_000_000;
    match chrono::DateTime::from_timestamp(secs, nanos) {
        Some(dt) => format!("{}({value})", dt.format("%Y-%m-%d %H:%M:%S%.3f")),
        None => value.to_string(),
    }
}

/// Quoted STRING8 with `\xNN` escapes for non-printables.
pub fn quote_string8(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() + 2);
    out.push('"');
    for &b in bytes {
        match b {
            b'"' => out.push_str("\\\""),
            b'\\' => out.push_str("\\\\"),
            b'\n' => out.push_str("\\n"),
            b'\t' => out.push_str("\\t"),
            0x20..=0x7e => out.push(b as char),
            _ => out.push_str(&format!("\\x{b:02x}")),
        }
    }
    out.push('"');
    out
}

/// STRING16/CHAR2B as space-separated 16-bit hex.
pub fn fmt_char2b(units: &[u16]) -> String {
    units
        .iter()
        .map(|u| format!("{u:#06x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Placeholder for bulk payloads that are not worth dumping.
pub fn fmt_opaque(n: usize) -> String {
    format!("({n} bytes)")
}

/// Bracketed list rendering with `--maxlistlength` truncation. Lists of
/// small fixed-size elements pass `single_line = true`.
pub fn fmt_list(items: &[String], opts: &FmtOptions, depth: usize, single_line: bool) -> String {
    if items.is_empty() {
        return "[]".to_string();
    }
    let total = items.len();
    let (shown, truncated) = match opts.max_list_length {
        Some(max) if total > max => (&items[..max], true),
        _ => (&items[..], false),
    };

    if single_line || !opts.multiline {
        let mut body = shown.join(", ");
        if truncated {
            body.push_str(&format!(", ...({total} total)"));
        }
        format!("[ {body} ]")
    } else {
        let mut out = String::from("[\n");
        for item in shown {
            out.push_str(&tabs(depth + 1));
            out.push_str(item);
            out.push_str(",\n");
        }
        if truncated {
            out.push_str(&tabs(depth + 1));
            out.push_str(&format!("...({total} total),\n"));
        }
        out.push_str(&tabs(depth));
        out.push(']');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::enums;

    #[test]
    fn test_single_line_rendering() {
        let mut f = FieldList::new();
        f.push("only-if-exists", fmt_bool(1));
        f.push("n", "9");
        f.push("name", quote_string8(b"TEST_ATOM"));
        assert_eq!(
            f.render(&FmtOptions::default(), 0),
            r#"{ only-if-exists=True, n=9, name="TEST_ATOM" }"#
        );
    }

    #[test]
    fn test_verbose_fields_are_filtered() {
        let mut f = FieldList::new();
        f.push_verbose("opcode", "16");
        f.push("atom", "4");
        assert_eq!(f.render(&FmtOptions::default(), 0), "{ atom=4 }");
        let verbose = FmtOptions {
            verbose: true,
            ..Default::default()
        };
        assert_eq!(f.render(&verbose, 0), "{ opcode=16, atom=4 }");
    }

    #[test]
    fn test_multiline_aligns_equals() {
        let mut f = FieldList::new();
        f.push("x", "1");
        f.push("border-width", "2");
        let opts = FmtOptions {
            multiline: true,
            ..Default::default()
        };
        let rendered = f.render(&opts, 0);
        assert_eq!(
            rendered,
            "{\n\tx            = 1,\n\tborder-width = 2,\n}"
        );
    }

    #[test]
    fn test_enum_and_sentinel() {
        assert_eq!(fmt_enum(0, enums::BACKING_STORE), "NotUseful(0)");
        assert_eq!(fmt_enum(7, enums::BACKING_STORE), "7");
        assert_eq!(fmt_sentinel(0, enums::NONE), "None(0)");
        assert_eq!(fmt_sentinel(42, enums::NONE), "42");
    }

    #[test]
    fn test_mask_rendering() {
        assert_eq!(fmt_mask(0, enums::EVENT_MASK), "0");
        assert_eq!(fmt_mask(0b101, enums::EVENT_MASK), "KeyPress|ButtonPress");
        // bit 31 is unnamed
        assert_eq!(
            fmt_mask(0x8000_0001, enums::EVENT_MASK),
            "KeyPress|0x80000000"
        );
        assert_eq!(fmt_modifiers(0x8000), "AnyModifier(0x8000)");
        assert_eq!(fmt_modifiers(0b11), "Shift|Lock");
    }

    #[test]
    fn test_atom_rendering() {
        let atoms = AtomTable::new();
        assert_eq!(fmt_atom(39, &atoms), "\"WM_NAME\"(39)");
        assert_eq!(fmt_atom(999, &atoms), "UnknownAtom(999)");
        assert_eq!(fmt_atom(0, &atoms), "None(0)");
    }

    #[test]
    fn test_timestamp_rendering() {
        assert_eq!(fmt_timestamp(0, None), "CurrentTime(0)");
        assert_eq!(fmt_timestamp(1234, None), "1234");
        let r = TimeRef {
            server_time: 1000,
            unix_time: 1_600_000_000,
        };
        let rendered = fmt_timestamp(3500, Some(&r));
        // 2.5 s past the reference instant
        assert!(rendered.contains("(3500)"), "{rendered}");
        assert!(rendered.contains(".500"), "{rendered}");
    }

    #[test]
    fn test_timestamp_before_reference_stays_in_the_past() {
        let r = TimeRef {
            server_time: 1000,
            unix_time: 1_600_000_000,
        };
        // 0.5 s before the reference instant; the wrapped u32 difference
        // must sign-extend, not land ~49.7 days in the future
        let rendered = fmt_timestamp(500, Some(&r));
        let expected = chrono::DateTime::from_timestamp(1_599_999_999, 500_000_000)
            .unwrap()
            .format("%Y-%m-%d %H:%M:%S%.3f")
            .to_string();
        assert_eq!(rendered, format!("{expected}(500)"));
    }

    #[test]
    fn test_string_escaping() {
        assert_eq!(quote_string8(b"abc"), "\"abc\"");
        assert_eq!(quote_string8(b"a\"b"), "\"a\\\"b\"");
        assert_eq!(quote_string8(&[0x01, 0xff]), "\"\\x01\\xff\"");
    }

    #[test]
    fn test_char2b_rendering() {
        assert_eq!(fmt_char2b(&[0x41, 0x1234]), "0x0041 0x1234");
    }

    #[test]
    fn test_list_truncation() {
        let items: Vec<String> = (0..5).map(|i| i.to_string()).collect();
        let opts = FmtOptions {
            max_list_length: Some(3),
            ..Default::default()
        };
        assert_eq!(fmt_list(&items, &opts, 0, true), "[ 0, 1, 2, ...(5 total) ]");
        assert_eq!(fmt_list(&[], &opts, 0, true), "[]");
    }
}
