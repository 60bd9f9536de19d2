//! Fuzz target: report envelope codec
//!
//! Decodes arbitrary bytes as request and response reports and checks
//! that slices stay within the endpoint and re-encoding a decoded
//! request reproduces its prefix.
//!
//! cargo fuzz run fuzz_envelope

#![no_main]

use libfuzzer_sys::fuzz_target;
use xap_router::xap::codec::{
    REQUEST_HEADER_SIZE, RESPONSE_HEADER_SIZE, decode_request, decode_response, encode_request,
};
use xap_router::xap::XAP_EPSIZE;

fuzz_target!(|data: &[u8]| {
    if let Ok(req) = decode_request(data) {
        assert_eq!(req.path.len(), data.len() - REQUEST_HEADER_SIZE);
        let report = encode_request(req.token, req.path).expect("decoded path fits");
        assert_eq!(&report[..data.len()], data);
        assert!(report[data.len()..].iter().all(|&b| b == 0));
    }

    if let Ok(resp) = decode_response(data) {
        assert!(resp.payload.len() <= XAP_EPSIZE - RESPONSE_HEADER_SIZE);
    }
});
