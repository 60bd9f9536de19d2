//! Compressed board description served by the QMK config-blob routes.
//!
//! The board section of the configuration is serialised to JSON together
//! with the protocol version, then DEFLATE-compressed via `miniz_oxide`.
//! Clients read the length, pull fixed-size chunks, and inflate.

extern crate alloc;
use alloc::vec::Vec;

use log::{info, warn};
use miniz_oxide::deflate::compress_to_vec;
use miniz_oxide::inflate::decompress_to_vec;
use serde::Serialize;

use crate::config::BoardConfig;
use crate::error::ConfigError;

use super::routes::XAP_BCD_VERSION;

/// Bytes returned per config-blob chunk request.
pub const CONFIG_BLOB_CHUNK_SIZE: usize = 32;

/// DEFLATE compression level (1-10, higher = better ratio, slower).
const COMPRESSION_LEVEL: u8 = 9;

/// JSON document embedded in the blob.
#[derive(Serialize)]
struct BoardDescription<'a> {
    xap_version: u32,
    board: &'a BoardConfig,
}

/// The compressed board description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigBlob {
    data: Vec<u8>,
}

impl ConfigBlob {
    /// A zero-length blob.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Serialise and compress `board`.
    pub fn from_board(board: &BoardConfig) -> Result<Self, ConfigError> {
        let description = BoardDescription {
            xap_version: XAP_BCD_VERSION,
            board,
        };
        let json = serde_json::to_vec(&description).map_err(|e| {
            warn!("blob: JSON encoding failed: {}", e);
            ConfigError::BlobEncoding
        })?;
        let data = compress_to_vec(&json, COMPRESSION_LEVEL);
        if data.len() > usize::from(u16::MAX) {
            return Err(ConfigError::BlobTooLarge { len: data.len() });
        }
        info!("blob: {} bytes JSON -> {} bytes compressed", json.len(), data.len());
        Ok(Self { data })
    }

    /// Length as reported on the wire.
    pub fn len(&self) -> u16 {
        self.data.len() as u16
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Up to [`CONFIG_BLOB_CHUNK_SIZE`] bytes starting at `offset`.
    ///
    /// Returns `None` when `offset` is past the end; an offset equal to the
    /// length yields an empty chunk.
    pub fn chunk(&self, offset: u16) -> Option<&[u8]> {
        let start = usize::from(offset);
        let tail = self.data.get(start..)?;
        Some(&tail[..tail.len().min(CONFIG_BLOB_CHUNK_SIZE)])
    }

    /// Inflate a reassembled blob (client side).
    ///
    /// Returns `None` on decompression error.
    pub fn decompress(data: &[u8]) -> Option<Vec<u8>> {
        match decompress_to_vec(data) {
            Ok(json) => Some(json),
            Err(e) => {
                warn!("blob: DEFLATE error: {:?}", e);
                None
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────
