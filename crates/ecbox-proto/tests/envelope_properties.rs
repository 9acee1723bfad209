//! Property-based tests for Envelope encoding/decoding
//!
//! These tests verify that the envelope codec is correct for ALL valid
//! inputs, and that arbitrary bytes never panic the decoder.

use bytes::Bytes;
use ecbox_proto::{Envelope, ProtocolError};
use proptest::prelude::*;

/// Strategy for generating envelopes within the wire limits
fn arbitrary_envelope() -> impl Strategy<Value = Envelope> {
    (
        prop::collection::vec(any::<u8>(), 0..=Envelope::MAX_POINT_SIZE),
        prop::collection::vec(any::<u8>(), 0..2048),
        prop::collection::vec(any::<u8>(), 0..=Envelope::MAX_TAG_SIZE),
    )
        .prop_map(|(point, ciphertext, tag)| Envelope::new(point, ciphertext, tag))
}

proptest! {
    #[test]
    fn prop_envelope_roundtrip(envelope in arbitrary_envelope()) {
        let encoded = envelope.to_bytes().unwrap();
        prop_assert_eq!(encoded.len(), envelope.encoded_len());

        let decoded = Envelope::decode(&encoded).unwrap();
        prop_assert_eq!(decoded, envelope);
    }

    #[test]
    fn prop_decode_never_panics(data in prop::collection::vec(any::<u8>(), 0..512)) {
        let _ = Envelope::decode(&data);
    }

    #[test]
    fn prop_any_truncation_rejected(envelope in arbitrary_envelope(), cut in any::<prop::sample::Index>()) {
        let encoded = envelope.to_bytes().unwrap();
        let len = cut.index(encoded.len());

        let result = Envelope::decode(&encoded[..len]);
        prop_assert!(
            matches!(
                result,
                Err(ProtocolError::FrameTooShort { .. } | ProtocolError::Truncated { .. })
            ),
            "prefix of length {} must not decode: {:?}",
            len,
            result
        );
    }

    #[test]
    fn prop_field_boundaries_preserved(
        point in prop::collection::vec(any::<u8>(), 0..64),
        ciphertext in prop::collection::vec(any::<u8>(), 0..256),
        tag in prop::collection::vec(any::<u8>(), 0..64),
    ) {
        // Each field must come back with exactly its own bytes
        let envelope = Envelope::new(point.clone(), ciphertext.clone(), tag.clone());
        let decoded = Envelope::decode(&envelope.to_bytes().unwrap()).unwrap();

        prop_assert_eq!(decoded.ephemeral_point, Bytes::from(point));
        prop_assert_eq!(decoded.ciphertext, Bytes::from(ciphertext));
        prop_assert_eq!(decoded.mac_tag, Bytes::from(tag));
    }
}
