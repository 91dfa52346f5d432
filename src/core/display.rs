//! X display name resolution.
//!
//! Accepts the two display name shapes understood by libX11/libxcb:
//!
//! ```text
//! default: [ [<proto>/] <host> ] : <display> [ . <screen> ]
//! unix:    [unix:] <socket-path> [ . <screen> ]
//! ```
//!
//! The protocol token selects the address family; with no token the family
//! is unix when the host part is empty and IPv6 (with a v4-mapped fallback
//! at connect time) otherwise.

use std::path::PathBuf;

use crate::{Error, Result};

/// Base value for X server TCP port numbers.
pub const X_TCP_PORT_BASE: u16 = 6000;
/// Base filepath for unix display sockets.
const UNIX_SOCKET_PATH_PREFIX: &str = "/tmp/.X11-unix/X";

/// Address family selected by a display name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Unix,
    Inet,
    Inet6,
}

/// All logging and socket data derived from one X display name.
#[derive(Debug, Clone)]
pub struct DisplayInfo {
    /// Unmodified display name string.
    pub name: String,
    /// Protocol token, when one was given (`tcp/host:0`).
    pub protocol: Option<String>,
    /// Hostname token, when the default form named one.
    pub hostname: Option<String>,
    /// Unix socket path; populated when [`Family::Unix`].
    pub socket_path: Option<PathBuf>,
    /// X display index (0 for explicit socket paths).
    pub display: u16,
    /// X screen index.
    pub screen: u16,
    pub family: Family,
}

impl DisplayInfo {
    /// Parses an X display name into the tokens used for logging and the
    /// data needed for socket creation.
    pub fn parse(name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(Error::DisplayName("empty display name".into()));
        }

        if let Some(rest) = name.strip_prefix("unix:") {
            return Self::parse_unix(name, rest);
        }

        // The default form requires ":<display>[.<screen>]" at the end.
        // rfind keeps IPv6-ish hostnames ("tcp/::1:2") intact.
        if let Some(colon) = name.rfind(':') {
            let (head, tail) = (&name[..colon], &name[colon + 1..]);
            if let Some((display, screen)) = parse_display_screen(tail) {
                return Self::parse_default(name, head, display, screen);
            }
        }

        Self::parse_unix(name, name)
    }

    fn parse_default(name: &str, head: &str, display: u16, screen: u16) -> Result<Self> {
        let (protocol, hostname) = match head.split_once('/') {
            Some((proto, host)) => (Some(proto), host),
            None => (None, head),
        };

        let family = match protocol {
            Some("inet6") | Some("tcp") => Family::Inet6,
            Some("inet") => Family::Inet,
            Some("unix") | Some("local") => Family::Unix,
            Some(other) => {
                return Err(Error::DisplayName(format!(
                    "unknown protocol '{other}' in '{name}'"
                )));
            }
            None if hostname.is_empty() => Family::Unix,
            None => Family::Inet6,
        };

        let socket_path = (family == Family::Unix)
            .then(|| PathBuf::from(format!("{UNIX_SOCKET_PATH_PREFIX}{display}")));

        Ok(Self {
            name: name.to_string(),
            protocol: protocol.map(str::to_string),
            hostname: (!hostname.is_empty()).then(|| hostname.to_string()),
            socket_path,
            display,
            screen,
            family,
        })
    }

    fn parse_unix(name: &str, path_and_screen: &str) -> Result<Self> {
        if path_and_screen.is_empty() {
            return Err(Error::DisplayName(format!("no socket path in '{name}'")));
        }
        let (path, screen) = split_trailing_screen(path_and_screen);
        Ok(Self {
            name: name.to_string(),
            protocol: name.starts_with("unix:").then(|| "unix".to_string()),
            hostname: None,
            socket_path: Some(PathBuf::from(path)),
            display: 0,
            screen,
            family: Family::Unix,
        })
    }

    /// TCP port for the default form: 6000 + display.
    pub fn port(&self) -> u16 {
        X_TCP_PORT_BASE + self.display
    }

    /// Host to connect to for TCP families.
    pub fn connect_host(&self) -> &str {
        self.hostname.as_deref().unwrap_or("localhost")
    }
}

/// Splits `<display>[.<screen>]`, both decimal.
fn parse_display_screen(tail: &str) -> Option<(u16, u16)> {
    let (display, screen) = match tail.split_once('.') {
        Some((d, s)) => (d, Some(s)),
        None => (tail, None),
    };
    let display = display.parse().ok()?;
    let screen = match screen {
        Some(s) => s.parse().ok()?,
        None => 0,
    };
    Some((display, screen))
}

/// Strips a trailing ".<digits>" screen suffix from a socket path.
fn split_trailing_screen(path: &str) -> (&str, u16) {
    if let Some(dot) = path.rfind('.') {
        let suffix = &path[dot + 1..];
        if !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(screen) = suffix.parse() {
                return (&path[..dot], screen);
            }
        }
    }
    (path, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_display_is_unix() {
        let info = DisplayInfo::parse(":0").unwrap();
        assert_eq!(info.family, Family::Unix);
        assert_eq!(info.display, 0);
        assert_eq!(info.screen, 0);
        assert_eq!(
            info.socket_path.as_deref(),
            Some(std::path::Path::new("/tmp/.X11-unix/X0"))
        );
    }

    #[test]
    fn test_hostname_defaults_to_inet6() {
        let info = DisplayInfo::parse("localhost:10.2").unwrap();
        assert_eq!(info.family, Family::Inet6);
        assert_eq!(info.hostname.as_deref(), Some("localhost"));
        assert_eq!(info.display, 10);
        assert_eq!(info.screen, 2);
        assert_eq!(info.port(), 6010);
    }

    #[test]
    fn test_protocol_token_selects_family() {
        let info = DisplayInfo::parse("inet/127.0.0.1:1").unwrap();
        assert_eq!(info.family, Family::Inet);
        assert_eq!(info.hostname.as_deref(), Some("127.0.0.1"));

        let info = DisplayInfo::parse("tcp/somehost:3").unwrap();
        assert_eq!(info.family, Family::Inet6);
        assert_eq!(info.port(), 6003);
    }

    #[test]
    fn test_ipv6_hostname_with_colons() {
        let info = DisplayInfo::parse("tcp/::1:2").unwrap();
        assert_eq!(info.family, Family::Inet6);
        assert_eq!(info.hostname.as_deref(), Some("::1"));
        assert_eq!(info.display, 2);
    }

    #[test]
    fn test_explicit_unix_prefix() {
        let info = DisplayInfo::parse("unix:/tmp/launch-xyz/x.0").unwrap();
        assert_eq!(info.family, Family::Unix);
        assert_eq!(
            info.socket_path.as_deref(),
            Some(std::path::Path::new("/tmp/launch-xyz/x"))
        );
        assert_eq!(info.screen, 0);
    }

    #[test]
    fn test_plain_socket_path() {
        let info = DisplayInfo::parse("/tmp/my.sock").unwrap();
        assert_eq!(info.family, Family::Unix);
        // ".sock" is not a screen number
        assert_eq!(
            info.socket_path.as_deref(),
            Some(std::path::Path::new("/tmp/my.sock"))
        );
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(DisplayInfo::parse("").is_err());
        assert!(DisplayInfo::parse("bogus/host:1").is_err());
    }
}
