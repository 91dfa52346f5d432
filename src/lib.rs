//! # RX Trace - X11 protocol proxy
//!
//! RX Trace is an intercepting, decoding proxy for the X11 wire protocol.
//! It listens on one display, forwards every client that connects to a real
//! X server on another display, and emits a structured, human-readable trace
//! of every protocol message crossing in either direction.
//!
//! ## Architecture
//!
//! The library is organized into three module families:
//!
//! - [`core`] - settings, diagnostics logging, the trace sink, display name
//!   resolution and X authority file handling
//! - [`proto`] - the X11 message decoder: primitives, name tables, and the
//!   request/reply/event/error decoders
//! - [`server`] - the connection multiplexer: socket buffers, per-connection
//!   relay loops, the accept loop and child subcommand handling
//!
//! ## Example
//!
//! ```rust,no_run
//! use rxtrace::{core::args::Settings, server::ProxyServer};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::resolve_from(["rxtrace", "--display", ":0"])?;
//!     let server = ProxyServer::new(settings)?;
//!     let exit_code = server.run().await?;
//!     std::process::exit(exit_code.into())
//! }
//! ```

pub mod core;
pub mod proto;
pub mod server;

// Re-export commonly used types
pub use crate::core::args::Settings;
pub use crate::server::ProxyServer;

/// Common result type used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the RX Trace library
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid display name: {0}")]
    DisplayName(String),

    #[error("authority file error: {0}")]
    Authority(String),

    #[error("protocol error: {0}")]
    Protocol(#[from] proto::ParseError),

    #[error("setup error: {0}")]
    Setup(String),
}
