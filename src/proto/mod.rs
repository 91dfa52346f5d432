//! X11 core protocol decoding.
//!
//! Everything needed to turn the raw byte stream of a proxied connection
//! into trace records: alignment and byte-order primitives, the static name
//! tables of the core protocol, the shared atom table, and the decoders for
//! the connection handshake, requests, replies, events and errors.

pub mod align;
pub mod atoms;
pub mod decoder;
pub mod endianness;
pub mod enums;
pub mod errors;
pub mod events;
pub mod fmt;
pub mod replies;
pub mod requests;
pub mod setup;
pub mod values;

/// Protocol version the decoder understands.
pub const MAJOR_VERSION: u16 = 11;
pub const MINOR_VERSION: u16 = 0;

/// 32-bit server-assigned id naming a string.
pub type Atom = u32;
/// 32-bit window resource id.
pub type Window = u32;
/// 32-bit server timestamp in milliseconds.
pub type Timestamp = u32;

/// Decoding failure. `Truncated` inside a complete frame and
/// `LengthMismatch` both mean the wire contents disagree with the framed
/// length; the connection is closed with a malformed-message record.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("truncated: needed {needed} bytes, {available} available")]
    Truncated { needed: usize, available: usize },

    #[error("{name}: framed length is {framed} bytes but decoder consumed {decoded}")]
    LengthMismatch {
        name: &'static str,
        framed: usize,
        decoded: usize,
    },

    #[error("invalid {kind} length field {length}")]
    InvalidFrameLength { kind: &'static str, length: usize },

    #[error("invalid byte-order octet {0:#04x}")]
    InvalidByteOrder(u8),

    #[error("invalid connection setup status {0}")]
    InvalidSetupStatus(u8),

    #[error("first byte {0} is not an error, reply or core event")]
    UnknownServerMessage(u8),
}
