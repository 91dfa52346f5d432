//! Shared atom interning table.
//!
//! The proxy mirrors the server's atom table as far as it can observe it:
//! seeded with the predefined atoms, optionally pre-filled by the
//! `--prefetchatoms` bootstrap, and extended whenever an `InternAtom` reply
//! crosses the wire. Lookups happen on every ATOM rendered, from any
//! connection, so the table is a concurrent map.

use dashmap::DashMap;

use super::Atom;

#[derive(Debug)]
pub struct AtomTable {
    names: DashMap<Atom, String>,
}

impl AtomTable {
    pub fn new() -> Self {
        let names = DashMap::new();
        for (i, &name) in PREDEFINED_ATOMS.iter().enumerate() {
            names.insert(i as Atom + 1, name.to_string());
        }
        Self { names }
    }

    pub fn name(&self, atom: Atom) -> Option<String> {
        self.names.get(&atom).map(|entry| entry.value().clone())
    }

    pub fn insert(&self, atom: Atom, name: impl Into<String>) {
        self.names.insert(atom, name.into());
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for AtomTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Atoms predefined by the core protocol; index 0 is atom 1.
const PREDEFINED_ATOMS: &[&str] = &[
    "PRIMARY",
    "SECONDARY",
    "ARC",
    "ATOM",
    "BITMAP",
    "CARDINAL",
    "COLORMAP",
    "CURSOR",
    "CUT_BUFFER0",
    "CUT_BUFFER1",
    "CUT_BUFFER2",
    "CUT_BUFFER3",
    "CUT_BUFFER4",
    "CUT_BUFFER5",
    "CUT_BUFFER6",
    "CUT_BUFFER7",
    "DRAWABLE",
    "FONT",
    "INTEGER",
    "PIXMAP",
    "POINT",
    "RECTANGLE",
    "RESOURCE_MANAGER",
    "RGB_COLOR_MAP",
    "RGB_BEST_MAP",
    "RGB_BLUE_MAP",
    "RGB_DEFAULT_MAP",
    "RGB_GRAY_MAP",
    "RGB_GREEN_MAP",
    "RGB_RED_MAP",
    "STRING",
    "VISUALID",
    "WINDOW",
    "WM_COMMAND",
    "WM_HINTS",
    "WM_CLIENT_MACHINE",
    "WM_ICON_NAME",
    "WM_ICON_SIZE",
    "WM_NAME",
    "WM_NORMAL_HINTS",
    "WM_SIZE_HINTS",
    "WM_ZOOM_HINTS",
    "MIN_SPACE",
    "NORM_SPACE",
    "MAX_SPACE",
    "END_SPACE",
    "SUPERSCRIPT_X",
    "SUPERSCRIPT_Y",
    "SUBSCRIPT_X",
    "SUBSCRIPT_Y",
    "UNDERLINE_POSITION",
    "UNDERLINE_THICKNESS",
    "STRIKEOUT_ASCENT",
    "STRIKEOUT_DESCENT",
    "ITALIC_ANGLE",
    "X_HEIGHT",
    "QUAD_WIDTH",
    "WEIGHT",
    "POINT_SIZE",
    "RESOLUTION",
    "COPYRIGHT",
    "NOTICE",
    "FONT_NAME",
    "FAMILY_NAME",
    "FULL_NAME",
    "CAP_HEIGHT",
    "WM_CLASS",
    "WM_TRANSIENT_FOR",
];

/// Atom value of the last predefined atom.
pub const LAST_PREDEFINED_ATOM: Atom = PREDEFINED_ATOMS.len() as Atom;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predefined_atoms() {
        let table = AtomTable::new();
        assert_eq!(table.name(1).as_deref(), Some("PRIMARY"));
        assert_eq!(table.name(4).as_deref(), Some("ATOM"));
        assert_eq!(table.name(39).as_deref(), Some("WM_NAME"));
        assert_eq!(table.name(68).as_deref(), Some("WM_TRANSIENT_FOR"));
        assert_eq!(table.name(69), None);
        assert_eq!(table.len(), 68);
        assert_eq!(LAST_PREDEFINED_ATOM, 68);
    }

    #[test]
    fn test_interning_observed_atoms() {
        let table = AtomTable::new();
        table.insert(137, "TEST_ATOM");
        assert_eq!(table.name(137).as_deref(), Some("TEST_ATOM"));
        // re-interning the same id replaces the name
        table.insert(137, "TEST_ATOM2");
        assert_eq!(table.name(137).as_deref(), Some("TEST_ATOM2"));
    }
}
