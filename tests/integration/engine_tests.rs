//! Engine pipeline: config blob transfer, rate limiting and the report
//! queue transport.

use xap_router::config::{XapConfig, bounded};
use xap_router::xap::blob::{CONFIG_BLOB_CHUNK_SIZE, ConfigBlob};
use xap_router::xap::channels::{ChannelTransport, ReportChannel};
use xap_router::xap::codec::{decode_response, encode_request};
use xap_router::xap::routes::{QMK_CONFIG_BLOB_CHUNK, QMK_CONFIG_BLOB_LENGTH, SUBSYSTEM_QMK};
use xap_router::xap::{ResponseFlags, XAP_EPSIZE, XapEngine};

use crate::mock_device::{MockDevice, request, test_engine};

#[test]
fn config_blob_reassembles_over_the_wire() {
    let mut config = XapConfig::default();
    config.board.product = bounded("Corne");
    config.board.vendor_id = 0x4653;
    let mut engine = test_engine(config);
    let mut dev = MockDevice::new();

    let len = request(&mut engine, &mut dev, 1, &[SUBSYSTEM_QMK, QMK_CONFIG_BLOB_LENGTH]).unwrap();
    let total = u16::from_le_bytes([len.payload[0], len.payload[1]]);
    assert!(total > 0);

    let mut blob = Vec::new();
    let mut offset = 0u16;
    let mut token = 2u16;
    while usize::from(offset) < usize::from(total) {
        let [lo, hi] = offset.to_le_bytes();
        let chunk = request(
            &mut engine,
            &mut dev,
            token,
            &[SUBSYSTEM_QMK, QMK_CONFIG_BLOB_CHUNK, lo, hi],
        )
        .unwrap();
        assert!(chunk.flags.is_success());
        let take = CONFIG_BLOB_CHUNK_SIZE.min(usize::from(total - offset));
        blob.extend_from_slice(&chunk.payload[..take]);
        offset += take as u16;
        token += 1;
    }

    let json = ConfigBlob::decompress(&blob).expect("valid DEFLATE stream");
    let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
    assert_eq!(value["board"]["product"], "Corne");
    assert_eq!(value["board"]["vendor_id"], 0x4653);
}

#[test]
fn blob_chunk_past_end_fails() {
    let mut engine = test_engine(XapConfig::default());
    let mut dev = MockDevice::new();
    let past = engine.blob().len() + 1;
    let [lo, hi] = past.to_le_bytes();
    let r = request(&mut engine, &mut dev, 1, &[SUBSYSTEM_QMK, QMK_CONFIG_BLOB_CHUNK, lo, hi]).unwrap();
    assert_eq!(r.flags, ResponseFlags::FAILURE);
}

#[test]
fn rate_limit_drops_bursts() {
    let mut config = XapConfig::default();
    config.routing.rate_limit = true;
    let mut engine = XapEngine::with_default_routes(config).unwrap();
    let mut dev = MockDevice::new();
    let report = encode_request(1, &[0x00, 0x00]).unwrap();

    let mut dropped = 0;
    for _ in 0..500 {
        if engine.handle_report(&report, &mut dev).is_none() {
            dropped += 1;
        }
    }
    assert_eq!(dropped, 400, "burst of 100 while the device clock stands still");
    let stats = engine.stats();
    assert_eq!(stats.received, 500);
    assert_eq!(stats.rejected, dropped);
    assert_eq!(stats.answered + stats.rejected, 500);

    dev.advance(1_000);
    assert!(engine.handle_report(&report, &mut dev).is_some(), "refilled after one second");
}

#[test]
fn default_config_never_drops_well_formed_requests() {
    let mut engine = XapEngine::with_default_routes(XapConfig::default()).unwrap();
    let mut dev = MockDevice::new();
    for _ in 0..150 {
        let reply = request(&mut engine, &mut dev, 0x1234, &[0x01, 0x01]).unwrap();
        assert_eq!(reply.token, 0x1234);
        assert!(reply.flags.is_success());
    }
    let stats = engine.stats();
    assert_eq!(stats.answered, 150);
    assert_eq!(stats.rejected, 0);
}

#[test]
fn poll_moves_reports_through_channels() {
    let inbound = ReportChannel::new();
    let outbound = ReportChannel::new();
    let mut transport = ChannelTransport::new(&inbound, &outbound);
    let mut engine = test_engine(XapConfig::default());
    let mut dev = MockDevice::new();

    inbound.try_send(encode_request(0x0A0B, &[0x00, 0x00]).unwrap()).unwrap();
    inbound.try_send(encode_request(0x0C0D, &[0xFF]).unwrap()).unwrap();

    assert!(engine.poll(&mut transport, &mut dev).unwrap());
    assert!(engine.poll(&mut transport, &mut dev).unwrap());
    assert!(!engine.poll(&mut transport, &mut dev).unwrap(), "queue drained");

    let out = outbound.try_receive().unwrap();
    assert_eq!(out.len(), XAP_EPSIZE);
    assert_eq!(decode_response(&out).unwrap().token, 0x0A0B);
    assert!(outbound.try_receive().is_err(), "unroutable request produced no report");
}

#[test]
fn global_queues_round_trip() {
    use xap_router::xap::channels::{pop_outbound, push_inbound};

    let mut transport = ChannelTransport::global();
    let mut engine = test_engine(XapConfig::default());
    let mut dev = MockDevice::new();

    push_inbound(encode_request(0x7777, &[0x00, 0x03]).unwrap()).unwrap();
    while engine.poll(&mut transport, &mut dev).unwrap() {}
    let out = pop_outbound().expect("status reply queued");
    assert_eq!(decode_response(&out).unwrap().token, 0x7777);
    assert!(pop_outbound().is_none());
}
