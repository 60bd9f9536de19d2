//! End-to-end routing through the default tree and a host-extended tree.

use xap_router::config::{XapConfig, bounded};
use xap_router::xap::codec::{XAP_EPSIZE, decode_response};
use xap_router::xap::route::presence_mask;
use xap_router::xap::routes::{self, QMK_ROUTES, XAP_BCD_VERSION, root_routes};
use xap_router::xap::{ResponseFlags, Route, Token, XapContext, XapEngine};

use crate::mock_device::{MOCK_HARDWARE_ID, MOCK_QMK_VERSION, MockDevice, request, test_engine};

fn le_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes(bytes[..4].try_into().unwrap())
}

// ── Built-in subsystems ───────────────────────────────────────

#[test]
fn qmk_version_query_answers_with_token() {
    let mut engine = test_engine(XapConfig::default());
    let mut dev = MockDevice::new();
    let reply = request(&mut engine, &mut dev, 0x1234, &[0x01, 0x01]).unwrap();
    assert_eq!(reply.token, 0x1234);
    assert!(reply.flags.is_success());
    assert_eq!(le_u32(&reply.payload), MOCK_QMK_VERSION);
}

#[test]
fn token_is_little_endian_on_the_wire() {
    let mut engine = test_engine(XapConfig::default());
    let mut dev = MockDevice::new();
    let mut report = [0u8; XAP_EPSIZE];
    report[..4].copy_from_slice(&[0x34, 0x12, 0x00, 0x00]);
    let out = engine.handle_report(&report, &mut dev).unwrap();
    assert_eq!(&out[..3], &[0x34, 0x12, ResponseFlags::SUCCESS.bits()]);
}

#[test]
fn xap_version_query() {
    let mut engine = test_engine(XapConfig::default());
    let mut dev = MockDevice::new();
    let reply = request(&mut engine, &mut dev, 0x0001, &[0x00, 0x00]).unwrap();
    assert_eq!(reply.token, 0x0001);
    assert_eq!(le_u32(&reply.payload), XAP_BCD_VERSION);
}

#[test]
fn out_of_range_subsystem_is_silent() {
    let mut engine = test_engine(XapConfig::default());
    let mut dev = MockDevice::new();
    assert!(request(&mut engine, &mut dev, 0xAAAA, &[0xFF]).is_none());
    assert!(request(&mut engine, &mut dev, 0xAAAA, &[0x00, 0x40]).is_none());
    // Keyboard and user subsystems are absent in the default tree.
    assert!(request(&mut engine, &mut dev, 0xAAAA, &[0x02, 0x00]).is_none());
    assert!(request(&mut engine, &mut dev, 0xAAAA, &[0x03, 0x00]).is_none());
}

#[test]
fn unroutable_requests_answer_when_configured() {
    let mut config = XapConfig::default();
    config.routing.answer_unroutable = true;
    let mut engine = test_engine(config);
    let mut dev = MockDevice::new();
    let paths: [&[u8]; 4] = [
        &[0xFF],       // subsystem out of range
        &[0x00, 0x40], // operation out of range
        &[0x02, 0x00], // absent keyboard subsystem: dead-end router
        &[0x03],       // absent user subsystem, path stops there
    ];
    for path in paths {
        let reply = request(&mut engine, &mut dev, 0xAAAA, path).unwrap();
        assert_eq!(reply.token, 0xAAAA, "path {path:02X?}");
        assert_eq!(reply.flags, ResponseFlags::FAILURE, "path {path:02X?}");
        assert!(reply.payload.iter().all(|&b| b == 0), "path {path:02X?}");
    }
}

#[test]
fn exhausted_path_answers_when_configured() {
    // A short report whose path ends on the QMK router.
    let report = [0xCD, 0xAB, 0x01];

    let mut engine = test_engine(XapConfig::default());
    let mut dev = MockDevice::new();
    assert!(engine.handle_report(&report, &mut dev).is_none());
    assert!(engine.handle_report(&report[..2], &mut dev).is_none(), "empty path");

    let mut config = XapConfig::default();
    config.routing.answer_unroutable = true;
    let mut engine = test_engine(config);
    for raw in [&report[..], &report[..2]] {
        let out = engine.handle_report(raw, &mut dev).unwrap();
        let view = decode_response(&out).unwrap();
        assert_eq!(view.token, 0xABCD);
        assert_eq!(view.flags, ResponseFlags::FAILURE);
    }
    assert_eq!(engine.stats().answered, 2);
}

#[test]
fn capability_masks_match_tables() {
    let mut engine = test_engine(XapConfig::default());
    let mut dev = MockDevice::new();

    let xap = request(&mut engine, &mut dev, 1, &[0x00, routes::XAP_CAPABILITIES_QUERY]).unwrap();
    assert_eq!(le_u32(&xap.payload), 0b11_1111);

    let qmk = request(&mut engine, &mut dev, 2, &[0x01, routes::QMK_CAPABILITIES_QUERY]).unwrap();
    let mask = le_u32(&qmk.payload);
    assert_eq!(mask, presence_mask(&QMK_ROUTES));
    let jump_bit = 1u32 << routes::QMK_BOOTLOADER_JUMP;
    assert_eq!(mask & jump_bit != 0, cfg!(feature = "bootloader-jump"));
    let eeprom_bit = 1u32 << routes::QMK_REINIT_EEPROM;
    assert_eq!(mask & eeprom_bit != 0, cfg!(feature = "eeprom"));

    let subsystems = request(&mut engine, &mut dev, 3, &[0x00, routes::XAP_SUBSYSTEM_QUERY]).unwrap();
    assert_eq!(le_u32(&subsystems.payload), 0b0011);
}

#[test]
fn board_identity_routes() {
    let mut config = XapConfig::default();
    config.board.vendor_id = 0x4B42;
    config.board.product_id = 0x0001;
    config.board.manufacturer = bounded("Ferris Keyboards");
    config.board.product = bounded("Sweep");
    let mut engine = test_engine(config);
    let mut dev = MockDevice::new();

    let ids = request(&mut engine, &mut dev, 1, &[0x01, routes::QMK_BOARD_IDENTIFIERS]).unwrap();
    assert_eq!(&ids.payload[..4], &[0x42, 0x4B, 0x01, 0x00]);

    let mfr = request(&mut engine, &mut dev, 2, &[0x01, routes::QMK_BOARD_MANUFACTURER]).unwrap();
    assert_eq!(&mfr.payload[..16], b"Ferris Keyboards");
    assert_eq!(mfr.payload[16], 0, "zero padded after the string");

    let product = request(&mut engine, &mut dev, 3, &[0x01, routes::QMK_PRODUCT_NAME]).unwrap();
    assert_eq!(&product.payload[..5], b"Sweep");

    let hw = request(&mut engine, &mut dev, 4, &[0x01, routes::QMK_HARDWARE_ID]).unwrap();
    assert_eq!(le_u32(&hw.payload[0..4]), MOCK_HARDWARE_ID[0]);
    assert_eq!(le_u32(&hw.payload[12..16]), MOCK_HARDWARE_ID[3]);
}

#[test]
fn replies_do_not_leak_previous_payloads() {
    let mut engine = test_engine(XapConfig::default());
    let mut dev = MockDevice::new();
    let long = request(&mut engine, &mut dev, 1, &[0x01, routes::QMK_PRODUCT_NAME]).unwrap();
    assert!(long.payload[..10].iter().all(|&b| b != 0));
    let short = request(&mut engine, &mut dev, 2, &[0x00, routes::XAP_SECURE_STATUS]).unwrap();
    assert!(short.payload[1..].iter().all(|&b| b == 0));
}

#[test]
fn identical_requests_get_identical_replies() {
    let mut engine = test_engine(XapConfig::default());
    let mut dev = MockDevice::new();
    let a = request(&mut engine, &mut dev, 9, &[0x01, routes::QMK_BOARD_IDENTIFIERS]);
    let b = request(&mut engine, &mut dev, 9, &[0x01, routes::QMK_BOARD_IDENTIFIERS]);
    assert_eq!(a, b);
}

// ── Host-extended tree ────────────────────────────────────────

fn keyboard_echo(ctx: &mut XapContext<'_>, token: Token, data: &[u8]) {
    // Fixed-size reports carry trailing padding; echo the first 4 bytes.
    ctx.respond_success(token, &data[..data.len().min(4)]);
}

const KEYBOARD_ROUTES: [Route; 3] = [
    Route::execute(xap_router::xap::handlers::capabilities_query),
    Route::execute(keyboard_echo),
    Route::unknown(7),
];

static CUSTOM_ROOT: [Route; 4] = root_routes(&KEYBOARD_ROUTES, &[]);

fn custom_engine(config: XapConfig) -> XapEngine {
    XapEngine::new(config, &CUSTOM_ROOT).unwrap()
}

#[test]
fn keyboard_subsystem_receives_payload() {
    let mut engine = custom_engine(XapConfig::default());
    let mut dev = MockDevice::new();
    let reply = request(&mut engine, &mut dev, 5, &[0x02, 0x01, 0xDE, 0xAD, 0xBE, 0xEF]).unwrap();
    assert!(reply.flags.is_success());
    assert_eq!(&reply.payload[..4], &[0xDE, 0xAD, 0xBE, 0xEF]);
}

#[test]
fn keyboard_subsystem_shows_up_in_masks() {
    let mut engine = custom_engine(XapConfig::default());
    let mut dev = MockDevice::new();
    let subsystems = request(&mut engine, &mut dev, 1, &[0x00, routes::XAP_SUBSYSTEM_QUERY]).unwrap();
    assert_eq!(le_u32(&subsystems.payload), 0b0111);
    let caps = request(&mut engine, &mut dev, 2, &[0x02, 0x00]).unwrap();
    assert_eq!(le_u32(&caps.payload), 0b011, "unknown entries are not advertised");
}

#[test]
fn unknown_route_tag_answers_failure() {
    let mut engine = custom_engine(XapConfig::default());
    let mut dev = MockDevice::new();
    let reply = request(&mut engine, &mut dev, 0x0BAD, &[0x02, 0x02]).unwrap();
    assert_eq!(reply.token, 0x0BAD);
    assert_eq!(reply.flags, ResponseFlags::FAILURE);
    assert!(reply.payload.iter().all(|&b| b == 0));
}

#[test]
fn raw_report_shorter_than_endpoint_is_accepted() {
    let mut engine = test_engine(XapConfig::default());
    let mut dev = MockDevice::new();
    let out = engine.handle_report(&[0x02, 0x00, 0x00, 0x00], &mut dev).unwrap();
    let view = decode_response(&out).unwrap();
    assert_eq!(view.token, 2);
    assert!(view.flags.is_success());
}
