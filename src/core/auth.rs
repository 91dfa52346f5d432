//! X authority (`xauth`) file handling.
//!
//! The authority file is a sequence of entries, every field big-endian
//! length-prefixed:
//!
//! ```text
//! u16 family, u16 len + address, u16 len + display-number,
//! u16 len + auth-name, u16 len + auth-data
//! ```
//!
//! The proxy needs two things from it: the MIT-MAGIC-COOKIE-1 for the out
//! display (so the bootstrap clients can authenticate), and `--copyauth`,
//! which duplicates that cookie under the proxy's display number so real
//! clients can connect through us.

use std::path::{Path, PathBuf};

use crate::core::display::DisplayInfo;
use crate::{Error, Result};

/// Name of the only supported X authentication protocol.
pub const AUTH_PROTOCOL_NAME: &str = "MIT-MAGIC-COOKIE-1";

pub const FAMILY_LOCAL: u16 = 256;
pub const FAMILY_WILD: u16 = 65535;

/// One entry of an authority file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthEntry {
    pub family: u16,
    pub address: Vec<u8>,
    pub number: Vec<u8>,
    pub name: Vec<u8>,
    pub data: Vec<u8>,
}

impl AuthEntry {
    fn matches_display(&self, display: &DisplayInfo) -> bool {
        self.name == AUTH_PROTOCOL_NAME.as_bytes()
            && self.number == display.display.to_string().as_bytes()
    }
}

/// Full filepath of the authority file: `$XAUTHORITY` or `~/.Xauthority`.
pub fn authority_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("XAUTHORITY") {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    dirs::home_dir().map(|home| home.join(".Xauthority"))
}

/// Reads and parses the authority file at `path`.
pub fn read_entries(path: &Path) -> Result<Vec<AuthEntry>> {
    let bytes = std::fs::read(path)
        .map_err(|e| Error::Authority(format!("cannot read {}: {e}", path.display())))?;
    parse_entries(&bytes)
}

fn parse_entries(bytes: &[u8]) -> Result<Vec<AuthEntry>> {
    let mut entries = Vec::new();
    let mut pos = 0usize;
    while pos < bytes.len() {
        let family = read_u16(bytes, &mut pos)?;
        let address = read_counted(bytes, &mut pos)?;
        let number = read_counted(bytes, &mut pos)?;
        let name = read_counted(bytes, &mut pos)?;
        let data = read_counted(bytes, &mut pos)?;
        entries.push(AuthEntry {
            family,
            address,
            number,
            name,
            data,
        });
    }
    Ok(entries)
}

fn read_u16(bytes: &[u8], pos: &mut usize) -> Result<u16> {
    if *pos + 2 > bytes.len() {
        return Err(Error::Authority("truncated authority file".into()));
    }
    let value = u16::from_be_bytes([bytes[*pos], bytes[*pos + 1]]);
    *pos += 2;
    Ok(value)
}

fn read_counted(bytes: &[u8], pos: &mut usize) -> Result<Vec<u8>> {
    let len = read_u16(bytes, pos)? as usize;
    if *pos + len > bytes.len() {
        return Err(Error::Authority("truncated authority file".into()));
    }
    let field = bytes[*pos..*pos + len].to_vec();
    *pos += len;
    Ok(field)
}

fn encode_entries(entries: &[AuthEntry]) -> Vec<u8> {
    let mut out = Vec::new();
    for entry in entries {
        out.extend_from_slice(&entry.family.to_be_bytes());
        for field in [&entry.address, &entry.number, &entry.name, &entry.data] {
            out.extend_from_slice(&(field.len() as u16).to_be_bytes());
            out.extend_from_slice(field);
        }
    }
    out
}

/// Finds the MIT-MAGIC-COOKIE-1 entry for a display.
pub fn cookie_for_display<'a>(
    entries: &'a [AuthEntry],
    display: &DisplayInfo,
) -> Option<&'a AuthEntry> {
    entries.iter().find(|e| e.matches_display(display))
}

/// Looks up the out display's cookie without modifying anything. Absence is
/// not an error: local servers frequently accept unauthenticated peers.
pub fn lookup_cookie(out_display: &DisplayInfo) -> Option<AuthEntry> {
    let path = authority_path()?;
    let entries = read_entries(&path).ok()?;
    cookie_for_display(&entries, out_display).cloned()
}

/// Ensures the authority file carries an entry for the in display carrying
/// the same cookie as the out display, rewriting the file if needed.
///
/// The original file is renamed to a backup while the merged replacement is
/// written, then the backup is removed. Returns the copied cookie.
pub fn copy_authentication(
    in_display: &DisplayInfo,
    out_display: &DisplayInfo,
) -> Result<AuthEntry> {
    let path = authority_path()
        .ok_or_else(|| Error::Authority("no XAUTHORITY and no home directory".into()))?;
    let mut entries = read_entries(&path)?;

    let source = cookie_for_display(&entries, out_display)
        .cloned()
        .ok_or_else(|| {
            Error::Authority(format!(
                "no {AUTH_PROTOCOL_NAME} entry for display {} in {}",
                out_display.name,
                path.display()
            ))
        })?;

    let copied = AuthEntry {
        number: in_display.display.to_string().into_bytes(),
        ..source.clone()
    };

    match entries.iter_mut().find(|e| e.matches_display(in_display)) {
        Some(existing) => *existing = copied.clone(),
        None => entries.push(copied.clone()),
    }

    write_entries(&path, &entries)?;
    Ok(copied)
}

fn write_entries(path: &Path, entries: &[AuthEntry]) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| Error::Authority(format!("cannot stage authority file: {e}")))?;
    std::io::Write::write_all(&mut tmp, &encode_entries(entries))
        .map_err(|e| Error::Authority(format!("cannot write authority file: {e}")))?;

    let backup = path.with_extension("rxtrace-bak");
    std::fs::rename(path, &backup)
        .map_err(|e| Error::Authority(format!("cannot back up authority file: {e}")))?;
    match tmp.persist(path) {
        Ok(_) => {
            let _ = std::fs::remove_file(&backup);
            Ok(())
        }
        Err(e) => {
            // put the original back before reporting
            let _ = std::fs::rename(&backup, path);
            Err(Error::Authority(format!(
                "cannot replace authority file: {e}"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entry(number: &str, data: &[u8]) -> AuthEntry {
        AuthEntry {
            family: FAMILY_LOCAL,
            address: b"myhost".to_vec(),
            number: number.as_bytes().to_vec(),
            name: AUTH_PROTOCOL_NAME.as_bytes().to_vec(),
            data: data.to_vec(),
        }
    }

    #[test]
    fn test_parse_encode_round_trip() {
        let entries = vec![sample_entry("0", &[0xde; 16]), sample_entry("1", &[0xad; 16])];
        let parsed = parse_entries(&encode_entries(&entries)).unwrap();
        assert_eq!(parsed, entries);
    }

    #[test]
    fn test_truncated_file_is_an_error() {
        let mut bytes = encode_entries(&[sample_entry("0", &[1, 2, 3])]);
        bytes.truncate(bytes.len() - 2);
        assert!(parse_entries(&bytes).is_err());
    }

    #[test]
    fn test_cookie_lookup_by_display_number() {
        let entries = vec![sample_entry("0", &[1; 16]), sample_entry("9", &[2; 16])];
        let display = DisplayInfo::parse(":9").unwrap();
        let cookie = cookie_for_display(&entries, &display).unwrap();
        assert_eq!(cookie.data, vec![2; 16]);

        let missing = DisplayInfo::parse(":5").unwrap();
        assert!(cookie_for_display(&entries, &missing).is_none());
    }

    #[test]
    fn test_copy_creates_proxy_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Xauthority");
        std::fs::write(&path, encode_entries(&[sample_entry("0", &[7; 16])])).unwrap();

        // resolve through $XAUTHORITY
        // SAFETY: tests in this module do not run concurrently with others
        // that read this variable.
        unsafe { std::env::set_var("XAUTHORITY", &path) };

        let in_display = DisplayInfo::parse(":9").unwrap();
        let out_display = DisplayInfo::parse(":0").unwrap();
        let copied = copy_authentication(&in_display, &out_display).unwrap();
        assert_eq!(copied.number, b"9".to_vec());
        assert_eq!(copied.data, vec![7; 16]);

        let merged = read_entries(&path).unwrap();
        assert_eq!(merged.len(), 2);
        assert!(cookie_for_display(&merged, &in_display).is_some());
        unsafe { std::env::remove_var("XAUTHORITY") };
    }
}
