//! Mock device for integration tests.
//!
//! Records every firmware hook the router invokes so tests can assert on
//! side effects, and exposes a settable clock.

use xap_router::config::XapConfig;
use xap_router::ports::DevicePort;
use xap_router::xap::codec::{decode_response, encode_request};
use xap_router::xap::{ResponseFlags, Token, XapEngine};

// ── Device call record ────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCall {
    BootloaderJump,
    ReinitEeprom,
}

// ── MockDevice ────────────────────────────────────────────────

pub const MOCK_QMK_VERSION: u32 = 0x0019_0006;
pub const MOCK_HARDWARE_ID: [u32; 4] = [0xDEAD_BEEF, 0x0102_0304, 0, 0xFFFF_FFFF];

pub struct MockDevice {
    pub now_ms: u32,
    pub calls: Vec<DeviceCall>,
}

#[allow(dead_code)]
impl MockDevice {
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            calls: Vec::new(),
        }
    }

    pub fn advance(&mut self, ms: u32) {
        self.now_ms = self.now_ms.wrapping_add(ms);
    }

    pub fn count(&self, call: DeviceCall) -> usize {
        self.calls.iter().filter(|c| **c == call).count()
    }
}

impl DevicePort for MockDevice {
    fn now_ms(&self) -> u32 {
        self.now_ms
    }

    fn qmk_version(&self) -> u32 {
        MOCK_QMK_VERSION
    }

    fn hardware_id(&self) -> [u32; 4] {
        MOCK_HARDWARE_ID
    }

    fn request_bootloader_jump(&mut self) {
        self.calls.push(DeviceCall::BootloaderJump);
    }

    fn reinit_eeprom(&mut self) {
        self.calls.push(DeviceCall::ReinitEeprom);
    }
}

// ── Wire helpers ──────────────────────────────────────────────

/// A decoded response with the payload copied out (padding included).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub token: Token,
    pub flags: ResponseFlags,
    pub payload: Vec<u8>,
}

/// Engine over the default routes. Rate limiting is pinned off so tests
/// can fire requests back to back.
#[allow(dead_code)]
pub fn test_engine(mut config: XapConfig) -> XapEngine {
    config.routing.rate_limit = false;
    XapEngine::with_default_routes(config).expect("valid test config")
}

/// Encode `path` under `token`, run it through the engine and decode the
/// response, if any.
pub fn request(
    engine: &mut XapEngine,
    device: &mut MockDevice,
    token: Token,
    path: &[u8],
) -> Option<Reply> {
    let report = encode_request(token, path).expect("path fits in one report");
    let out = engine.handle_report(&report, device)?;
    let view = decode_response(&out).expect("engine emits full reports");
    Some(Reply {
        token: view.token,
        flags: view.flags,
        payload: view.payload.to_vec(),
    })
}
