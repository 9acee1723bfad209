//! Fuzz target for Envelope::decode
//!
//! Arbitrary bytes are fed to the decoder to find:
//! - Parser panics
//! - Integer overflows in length arithmetic
//! - Buffer over-reads on truncated fields
//!
//! Any input that decodes must re-encode to exactly the same bytes.

#![no_main]

use ecbox_proto::Envelope;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(envelope) = Envelope::decode(data) else {
        return;
    };

    let encoded = envelope.to_bytes().expect("decoded envelope must re-encode");
    assert_eq!(encoded.as_ref(), data, "decode/encode is not canonical");
});
