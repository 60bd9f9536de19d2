//! Unified error types for the XAP router.
//!
//! A single `Error` enum that every layer converts into, so the engine and
//! the host simulator handle failures uniformly. All variants are `Copy`
//! and carry no heap data.
//!
//! Protocol-level failures (unroutable paths, secure denials, handler
//! failures) are not errors here: they are answered (or deliberately not
//! answered) on the wire. These types cover what goes wrong *around* the
//! protocol: malformed reports, transport faults, bad configuration.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A report could not be decoded or a response could not be encoded.
    Codec(CodecError),
    /// The transport failed to deliver or accept a report.
    Transport(TransportError),
    /// Configuration is invalid.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Codec(e) => write!(f, "codec: {e}"),
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Codec errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    /// Report is too short to hold the fixed header.
    Truncated { len: usize },
    /// Report is longer than the transport endpoint size.
    Oversized { len: usize },
    /// Response payload does not fit in one report.
    PayloadTooLarge { len: usize, capacity: usize },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated { len } => write!(f, "report truncated ({len} bytes)"),
            Self::Oversized { len } => write!(f, "report oversized ({len} bytes)"),
            Self::PayloadTooLarge { len, capacity } => {
                write!(f, "payload of {len} bytes exceeds capacity {capacity}")
            }
        }
    }
}

impl std::error::Error for CodecError {}

impl From<CodecError> for Error {
    fn from(e: CodecError) -> Self {
        Self::Codec(e)
    }
}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// Reading the next inbound report failed.
    ReceiveFailed,
    /// Writing the response report failed.
    SendFailed,
    /// Outbound queue has no room for another report.
    QueueFull,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReceiveFailed => write!(f, "receive failed"),
            Self::SendFailed => write!(f, "send failed"),
            Self::QueueFull => write!(f, "outbound queue full"),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// The board description could not be serialised.
    BlobEncoding,
    /// The compressed board description exceeds the 16-bit length field.
    BlobTooLarge { len: usize },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
            Self::BlobEncoding => write!(f, "config blob encoding failed"),
            Self::BlobTooLarge { len } => write!(f, "config blob too large ({len} bytes)"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
