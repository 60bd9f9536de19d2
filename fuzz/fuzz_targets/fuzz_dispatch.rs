//! Fuzz target: `XapEngine::handle_report`
//!
//! Pushes arbitrary reports through the full pipeline over the default
//! route tree and asserts that any reply is one full report carrying the
//! request token.
//!
//! cargo fuzz run fuzz_dispatch

#![no_main]

use libfuzzer_sys::fuzz_target;
use xap_router::config::XapConfig;
use xap_router::ports::DevicePort;
use xap_router::xap::{XAP_EPSIZE, XapEngine};

struct FuzzDevice;

impl DevicePort for FuzzDevice {
    fn now_ms(&self) -> u32 {
        0
    }
    fn qmk_version(&self) -> u32 {
        0
    }
    fn hardware_id(&self) -> [u32; 4] {
        [0; 4]
    }
    fn request_bootloader_jump(&mut self) {}
    fn reinit_eeprom(&mut self) {}
}

fuzz_target!(|data: &[u8]| {
    let mut config = XapConfig::default();
    config.routing.rate_limit = false;
    config.secure.enabled = data.first().is_some_and(|b| b & 1 == 0);
    let Ok(mut engine) = XapEngine::with_default_routes(config) else {
        return;
    };

    if let Some(out) = engine.handle_report(data, &mut FuzzDevice) {
        assert!(data.len() >= 2 && data.len() <= XAP_EPSIZE);
        assert_eq!(out.len(), XAP_EPSIZE);
        assert_eq!(&out[..2], &data[..2], "reply must echo the token");
    }
});
