//! Router configuration
//!
//! Board identity, secure-gate policy and routing policy. Values are
//! normally baked into the firmware image; the host simulator loads them
//! from a JSON file instead.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Maximum length of the manufacturer and product strings.
pub const MAX_BOARD_STRING: usize = 32;

/// Maximum number of keys in the secure unlock sequence.
pub const MAX_UNLOCK_KEYS: usize = 4;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct XapConfig {
    pub board: BoardConfig,
    pub secure: SecureConfig,
    pub routing: RoutingConfig,
}

/// Identity reported by the QMK subsystem and embedded in the config blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// USB vendor id
    pub vendor_id: u16,
    /// USB product id
    pub product_id: u16,
    /// USB device release (bcdDevice)
    pub device_version: u16,
    /// QMK unique board identifier
    pub unique_id: u32,
    pub manufacturer: heapless::String<MAX_BOARD_STRING>,
    pub product: heapless::String<MAX_BOARD_STRING>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            vendor_id: 0xFEED,
            product_id: 0x0000,
            device_version: 0x0001,
            unique_id: 0,
            manufacturer: bounded("QMK"),
            product: bounded("XAP Device"),
        }
    }
}

/// Matrix position of a key in the unlock sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPosition {
    pub row: u8,
    pub col: u8,
}

impl KeyPosition {
    pub const fn new(row: u8, col: u8) -> Self {
        Self { row, col }
    }
}

/// Secure gate policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecureConfig {
    /// When false, secure routes are always permitted and responses carry
    /// no lock-state flags.
    pub enabled: bool,
    /// Keys that must be pressed, in order, to complete an unlock.
    pub unlock_sequence: heapless::Vec<KeyPosition, MAX_UNLOCK_KEYS>,
    /// How long an unlock request stays open (milliseconds)
    pub unlock_timeout_ms: u32,
    /// Idle time after which an unlocked gate relocks (0 = never)
    pub idle_timeout_ms: u32,
}

impl Default for SecureConfig {
    fn default() -> Self {
        let mut unlock_sequence = heapless::Vec::new();
        let _ = unlock_sequence.push(KeyPosition::new(0, 0));
        Self {
            enabled: true,
            unlock_sequence,
            unlock_timeout_ms: 5_000,  // 5 s to press the sequence
            idle_timeout_ms: 60_000,   // relock after 1 min idle
        }
    }
}

/// Routing policy. Both switches default to off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Answer unroutable paths (out-of-range id, dead-end router) with a
    /// failure response instead of staying silent.
    pub answer_unroutable: bool,
    /// Drop inbound reports that exceed the token-bucket budget. Off by
    /// default: every well-formed report is dispatched and backpressure is
    /// left to the transport.
    pub rate_limit: bool,
}

impl XapConfig {
    /// Range-check the configuration.
    ///
    /// Invalid values are rejected, not clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secure.enabled {
            if self.secure.unlock_sequence.is_empty() {
                return Err(ConfigError::ValidationFailed(
                    "secure.unlock_sequence must not be empty when secure is enabled",
                ));
            }
            if self.secure.unlock_timeout_ms == 0 {
                return Err(ConfigError::ValidationFailed(
                    "secure.unlock_timeout_ms must be > 0",
                ));
            }
        }
        Ok(())
    }
}

/// Copy `s` into a fixed-capacity string, truncating at a char boundary.
pub fn bounded<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}
