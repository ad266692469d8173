//! Fuzz target for SFTP frame decoding.
//!
//! Feeds arbitrary bytes to the request and response decoders. Any decoded
//! packet must re-encode to a frame that decodes to the same packet.
//!
//! Run with:
//! ```bash
//! cd crates/proto
//! cargo +nightly fuzz run frame_decode -- -max_total_time=300
//! ```

#![no_main]
use filexfer_proto::sftp::{RequestPacket, ResponsePacket};
use libfuzzer_sys::fuzz_target;

fn join(header: bytes::Bytes, payload: Option<bytes::Bytes>) -> Vec<u8> {
    let mut out = header.to_vec();
    if let Some(payload) = payload {
        out.extend_from_slice(&payload);
    }
    out
}

fuzz_target!(|data: &[u8]| {
    if let Ok(request) = RequestPacket::decode(data) {
        let (header, payload) = request.marshal();
        let reparsed = RequestPacket::decode(&join(header, payload)[..])
            .expect("re-encoded request should decode");
        assert_eq!(request, reparsed);
    }

    if let Ok(response) = ResponsePacket::decode(data) {
        let (header, payload) = response.marshal();
        let reparsed = ResponsePacket::decode(&join(header, payload)[..])
            .expect("re-encoded response should decode");
        assert_eq!(response, reparsed);
    }
});
