// SPDX-License-Identifier: Apache-2.0

// RX Trace - Command Line Arguments

use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;
use tracing::warn;

use crate::{Error, Result};

/// Environment variable holding the "in" (proxy) display name.
pub const IN_DISPLAY_ENV_VAR: &str = "PROXYDISPLAY";
/// Environment variable holding the "out" (real X server) display name.
pub const OUT_DISPLAY_ENV_VAR: &str = "DISPLAY";
/// Default "in" display name when neither the CLI nor the environment
/// provides one.
pub const DEFAULT_IN_DISPLAYNAME: &str = ":9";

#[derive(Parser, Debug)]
#[command(
    name = "rxtrace",
    about = "RX Trace - intercepting, decoding X11 protocol proxy",
    long_about = "Listens on one X display, forwards clients to a real X server \
                  on another display, and logs every protocol message in between."
)]
pub struct CommandlineArgs {
    /// Display the proxy listens on (default: $PROXYDISPLAY, then ":9")
    #[arg(long)]
    pub proxydisplay: Option<String>,

    /// Real X server display (default: $DISPLAY)
    #[arg(short, long)]
    pub display: Option<String>,

    /// Log one extra line per socket read/write with the byte count
    #[arg(long)]
    pub readwritedebug: bool,

    /// Exit once the last connection closes
    #[arg(
        long,
        action = clap::ArgAction::Set,
        default_value_t = true,
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub stopifnoactiveconnx: bool,

    /// Keep running after the child subcommand exits
    #[arg(long)]
    pub waitforclient: bool,

    /// Report all extensions as absent in QueryExtension replies (reserved)
    #[arg(long)]
    pub denyallextensions: bool,

    /// Copy the xauth cookie of the out display to the proxy display
    #[arg(long)]
    pub copyauth: bool,

    /// Pre-fetch the server's interned atoms before serving clients
    #[arg(long)]
    pub prefetchatoms: bool,

    /// Render TIMESTAMP values as wall-clock time
    #[arg(long)]
    pub systemtimeformat: bool,

    /// Also log wire bookkeeping fields (opcodes, lengths)
    #[arg(short, long)]
    pub verbose: bool,

    /// Render one field per line with aligned columns
    #[arg(long)]
    pub multiline: bool,

    /// Truncate lists longer than N elements
    #[arg(long, value_name = "N")]
    pub maxlistlength: Option<usize>,

    /// Write the protocol trace to a file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub logfile: Option<PathBuf>,

    /// Subcommand to launch as an X client of the proxy (after `--`)
    #[arg(last = true, value_name = "PROG [ARGS]...")]
    pub subcmd: Vec<String>,
}

/// Options selected by the user through the CLI and the relevant
/// environment variables, resolved into their final values.
#[derive(Debug, Clone)]
pub struct Settings {
    pub in_displayname: String,
    pub out_displayname: String,
    pub readwritedebug: bool,
    pub stopifnoactiveconnx: bool,
    pub waitforclient: bool,
    pub denyallextensions: bool,
    pub copyauth: bool,
    pub prefetchatoms: bool,
    pub systemtimeformat: bool,
    pub verbose: bool,
    pub multiline: bool,
    pub maxlistlength: Option<usize>,
    pub logfile: Option<PathBuf>,
    pub subcmd: Vec<String>,
}

impl Settings {
    /// Resolves parsed CLI arguments against the environment.
    ///
    /// The out display is required (`--display` or `$DISPLAY`); the in
    /// display falls back to `$PROXYDISPLAY` and finally to ":9".
    pub fn resolve(args: CommandlineArgs) -> Result<Self> {
        let out_displayname = args
            .display
            .or_else(|| std::env::var(OUT_DISPLAY_ENV_VAR).ok())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                Error::Setup(format!(
                    "no X server display given; pass --display or set {OUT_DISPLAY_ENV_VAR}"
                ))
            })?;

        let in_displayname = args
            .proxydisplay
            .or_else(|| std::env::var(IN_DISPLAY_ENV_VAR).ok())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| {
                warn!(
                    "no display specified via --proxydisplay or {IN_DISPLAY_ENV_VAR}, \
                     defaulting to {DEFAULT_IN_DISPLAYNAME}"
                );
                DEFAULT_IN_DISPLAYNAME.to_string()
            });

        Ok(Self {
            in_displayname,
            out_displayname,
            readwritedebug: args.readwritedebug,
            stopifnoactiveconnx: args.stopifnoactiveconnx,
            waitforclient: args.waitforclient,
            denyallextensions: args.denyallextensions,
            copyauth: args.copyauth,
            prefetchatoms: args.prefetchatoms,
            systemtimeformat: args.systemtimeformat,
            verbose: args.verbose,
            multiline: args.multiline,
            maxlistlength: args.maxlistlength,
            logfile: args.logfile,
            subcmd: args.subcmd,
        })
    }

    /// Convenience for tests and doc examples: parse and resolve in one step.
    pub fn resolve_from<I, T>(argv: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let args = CommandlineArgs::try_parse_from(argv)
            .map_err(|e| Error::Setup(e.to_string()))?;
        Self::resolve(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_arguments() {
        let settings =
            Settings::resolve_from(["rxtrace", "--display", ":0", "--proxydisplay", ":9"]).unwrap();
        assert_eq!(settings.out_displayname, ":0");
        assert_eq!(settings.in_displayname, ":9");
        assert!(settings.stopifnoactiveconnx);
        assert!(!settings.waitforclient);
        assert!(settings.subcmd.is_empty());
    }

    #[test]
    fn test_stop_flag_accepts_value() {
        let settings = Settings::resolve_from([
            "rxtrace",
            "--display",
            ":0",
            "--proxydisplay",
            ":9",
            "--stopifnoactiveconnx",
            "false",
        ])
        .unwrap();
        assert!(!settings.stopifnoactiveconnx);
    }

    #[test]
    fn test_trailing_subcommand() {
        let settings = Settings::resolve_from([
            "rxtrace",
            "--display",
            ":0",
            "--proxydisplay",
            ":9",
            "--",
            "xterm",
            "-e",
            "top",
        ])
        .unwrap();
        assert_eq!(settings.subcmd, vec!["xterm", "-e", "top"]);
    }

    #[test]
    fn test_missing_out_display_is_an_error() {
        // resolve_from consults $DISPLAY, so force the CLI path only
        let args =
            CommandlineArgs::try_parse_from(["rxtrace", "--proxydisplay", ":9"]).unwrap();
        if std::env::var(OUT_DISPLAY_ENV_VAR).is_err() {
            assert!(Settings::resolve(args).is_err());
        }
    }

    #[test]
    fn test_formatting_knobs() {
        let settings = Settings::resolve_from([
            "rxtrace",
            "--display",
            ":0",
            "--proxydisplay",
            ":9",
            "-v",
            "--multiline",
            "--maxlistlength",
            "16",
        ])
        .unwrap();
        assert!(settings.verbose);
        assert!(settings.multiline);
        assert_eq!(settings.maxlistlength, Some(16));
    }
}
