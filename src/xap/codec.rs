//! Fixed-size report envelope codec.
//!
//! Request report:
//! ```text
//! ┌──────────────┬────────────────────────────────────────────┐
//! │ Token (2B)   │ Identifier path + payload (EPSIZE - 2 B)   │
//! │ LE u16       │                                            │
//! └──────────────┴────────────────────────────────────────────┘
//! ```
//!
//! Response report:
//! ```text
//! ┌──────────────┬───────────┬─────────────────────────────────┐
//! │ Token (2B)   │ Flags (1B)│ Payload, zero-padded            │
//! │ LE u16       │           │ (EPSIZE - 3 B)                  │
//! └──────────────┴───────────┴─────────────────────────────────┘
//! ```
//!
//! Every response is encoded into a fresh zeroed buffer on the stack, so
//! no bytes from an earlier transaction can leak into a later one.

use core::ops::BitOr;

use crate::error::CodecError;

use super::route::Token;

/// Transport endpoint size (one HID report).
pub const XAP_EPSIZE: usize = 64;

/// Request header: token only.
pub const REQUEST_HEADER_SIZE: usize = 2;

/// Response header: token + flags.
pub const RESPONSE_HEADER_SIZE: usize = 3;

/// Largest payload that fits in one response.
pub const MAX_RESPONSE_PAYLOAD: usize = XAP_EPSIZE - RESPONSE_HEADER_SIZE;

/// One transport report.
pub type Report = [u8; XAP_EPSIZE];

// ── Response flags ───────────────────────────────────────────

/// Status byte of a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResponseFlags(u8);

impl ResponseFlags {
    /// No bits set: the request failed.
    pub const FAILURE: Self = Self(0);
    pub const SUCCESS: Self = Self(1 << 0);
    /// A secure route was refused because the gate is locked.
    pub const SECURE_FAILURE: Self = Self(1 << 1);
    pub const UNLOCK_IN_PROGRESS: Self = Self(1 << 6);
    pub const UNLOCKED: Self = Self(1 << 7);

    /// No bits set. Used for flag sets that only get OR-ed into a
    /// response, where "nothing to add" is not a failure.
    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_success(self) -> bool {
        self.contains(Self::SUCCESS)
    }
}

impl BitOr for ResponseFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

// ── Request ──────────────────────────────────────────────────

/// A decoded request, borrowing the inbound report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request<'a> {
    pub token: Token,
    /// Identifier path followed by the operation payload.
    pub path: &'a [u8],
}

/// Split an inbound report into token and identifier stream.
pub fn decode_request(report: &[u8]) -> Result<Request<'_>, CodecError> {
    if report.len() > XAP_EPSIZE {
        return Err(CodecError::Oversized { len: report.len() });
    }
    let Some((header, path)) = report.split_first_chunk::<REQUEST_HEADER_SIZE>() else {
        return Err(CodecError::Truncated { len: report.len() });
    };
    Ok(Request {
        token: Token::from_le_bytes(*header),
        path,
    })
}

/// Build a request report (client side).
pub fn encode_request(token: Token, path: &[u8]) -> Result<Report, CodecError> {
    let capacity = XAP_EPSIZE - REQUEST_HEADER_SIZE;
    if path.len() > capacity {
        return Err(CodecError::PayloadTooLarge {
            len: path.len(),
            capacity,
        });
    }
    let mut report = [0u8; XAP_EPSIZE];
    report[..REQUEST_HEADER_SIZE].copy_from_slice(&token.to_le_bytes());
    report[REQUEST_HEADER_SIZE..REQUEST_HEADER_SIZE + path.len()].copy_from_slice(path);
    Ok(report)
}

// ── Response ─────────────────────────────────────────────────

/// A response waiting to be encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub token: Token,
    pub flags: ResponseFlags,
    pub payload: heapless::Vec<u8, MAX_RESPONSE_PAYLOAD>,
}

impl Response {
    pub fn new(token: Token, flags: ResponseFlags, payload: &[u8]) -> Result<Self, CodecError> {
        let payload =
            heapless::Vec::from_slice(payload).map_err(|()| CodecError::PayloadTooLarge {
                len: payload.len(),
                capacity: MAX_RESPONSE_PAYLOAD,
            })?;
        Ok(Self {
            token,
            flags,
            payload,
        })
    }

    /// Failure response: token echoed, no flags, empty payload.
    pub fn failure(token: Token) -> Self {
        Self {
            token,
            flags: ResponseFlags::FAILURE,
            payload: heapless::Vec::new(),
        }
    }

    /// Serialise into a zero-padded report.
    pub fn encode(&self) -> Report {
        let mut report = [0u8; XAP_EPSIZE];
        report[..2].copy_from_slice(&self.token.to_le_bytes());
        report[2] = self.flags.bits();
        report[RESPONSE_HEADER_SIZE..RESPONSE_HEADER_SIZE + self.payload.len()]
            .copy_from_slice(&self.payload);
        report
    }
}

/// Encode a response directly from its parts.
pub fn encode_response(
    token: Token,
    flags: ResponseFlags,
    payload: &[u8],
) -> Result<Report, CodecError> {
    Ok(Response::new(token, flags, payload)?.encode())
}

/// A decoded response, borrowing the report (client side).
///
/// The payload always spans the rest of the report, padding included;
/// the protocol carries no payload length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseView<'a> {
    pub token: Token,
    pub flags: ResponseFlags,
    pub payload: &'a [u8],
}

pub fn decode_response(report: &[u8]) -> Result<ResponseView<'_>, CodecError> {
    if report.len() > XAP_EPSIZE {
        return Err(CodecError::Oversized { len: report.len() });
    }
    let Some((header, payload)) = report.split_first_chunk::<RESPONSE_HEADER_SIZE>() else {
        return Err(CodecError::Truncated { len: report.len() });
    };
    Ok(ResponseView {
        token: Token::from_le_bytes([header[0], header[1]]),
        flags: ResponseFlags::from_bits(header[2]),
        payload,
    })
}

// ── Tests ────────────────────────────────────────────────────
