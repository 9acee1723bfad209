//! Envelope opening
//!
//! Steps run in a fixed order and the first failure aborts:
//!
//! 1. size the output (probe, or reject an undersized buffer)
//! 2. check the ephemeral point is a compressed encoding, parse it, run ECDH
//! 3. derive the key material
//! 4. verify the MAC over the ciphertext
//! 5. decrypt into the caller buffer
//!
//! Nothing is decrypted until step 4 succeeds.

use ecbox_proto::Envelope;

use super::{
    keys::{DerivedKeyMaterial, xor_into},
    params::SchemeParameters,
};
use crate::{
    EciesError,
    primitives::{agreement::KeyAgreement, mac, try_alloc},
};

/// Decrypt `envelope` with `secret` into a caller-owned buffer.
///
/// With `out = None` this is a probe: it returns the ciphertext length, an
/// upper bound on the plaintext length, and touches nothing else. With a
/// buffer it returns the exact plaintext length written to its prefix.
///
/// If decryption fails after the buffer was written, the written region is
/// zeroed before returning.
///
/// # Errors
///
/// - `BufferTooSmall`: `out` is shorter than the ciphertext (recoverable)
/// - `MalformedEnvelope`: the ephemeral point or MAC tag is missing
/// - `MalformedPoint`: the ephemeral point is not a compressed point on this
///   curve
/// - `KeyAgreementFailed`: ECDH or the KDF failed
/// - `MacVerificationFailed`: wrong key or tampered envelope
/// - `DecryptionFailed`: the block cipher rejected the ciphertext
pub fn open_into<K: KeyAgreement>(
    envelope: &Envelope,
    params: &SchemeParameters,
    secret: &K::SecretKey,
    out: Option<&mut [u8]>,
) -> Result<usize, EciesError> {
    let required = envelope.ciphertext.len();

    let Some(out) = out else {
        return Ok(required);
    };

    if out.len() < required {
        return Err(EciesError::BufferTooSmall { required, provided: out.len() });
    }

    if envelope.ephemeral_point.is_empty() {
        return Err(EciesError::MalformedEnvelope { reason: "missing ephemeral point".into() });
    }
    // Senders always compress; any other encoding of the same point is rejected
    if !K::CURVE.is_compressed_encoding(&envelope.ephemeral_point) {
        return Err(EciesError::MalformedPoint);
    }
    let ephemeral = K::deserialize_public(&envelope.ephemeral_point)?;

    let shared_secret = K::shared_secret(secret, &ephemeral)?;
    let keys = DerivedKeyMaterial::derive(params, &shared_secret, required)?;
    drop(shared_secret);

    if envelope.mac_tag.is_empty() {
        return Err(EciesError::MalformedEnvelope { reason: "missing MAC tag".into() });
    }
    mac::verify(params.mac_hash(), keys.mac_key(), &envelope.ciphertext, &envelope.mac_tag)?;

    let written = &mut out[..required];
    match params.symmetric_cipher() {
        Some(cipher) => {
            let result = cipher.decrypt_into(keys.encryption_key(), &envelope.ciphertext, written);
            if result.is_err() {
                written.fill(0);
            }
            result
        },
        None => {
            xor_into(&envelope.ciphertext, keys.encryption_key(), written);
            Ok(required)
        },
    }
}

/// Decrypt `envelope` into a freshly allocated buffer.
///
/// Probes, allocates the ciphertext length, fills, then truncates to the
/// plaintext length.
///
/// # Errors
///
/// Everything [`open_into`] reports except `BufferTooSmall`, plus
/// `AllocationFailed`.
pub fn open<K: KeyAgreement>(
    envelope: &Envelope,
    params: &SchemeParameters,
    secret: &K::SecretKey,
) -> Result<Vec<u8>, EciesError> {
    let capacity = open_into::<K>(envelope, params, secret, None)?;
    let mut plaintext = try_alloc(capacity)?;

    let len = open_into::<K>(envelope, params, secret, Some(plaintext.as_mut_slice()))?;
    plaintext.truncate(len);

    tracing::debug!(
        curve = %K::CURVE,
        ciphertext_len = capacity,
        plaintext_len = len,
        "opened envelope"
    );

    Ok(plaintext)
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    use super::*;
    use crate::{
        ecies::encrypt::seal,
        primitives::{agreement::P256, kdf::HashAlgorithm},
    };

    fn sealed(params: &SchemeParameters, plaintext: &[u8]) -> (p256::SecretKey, Envelope) {
        let mut rng = ChaCha20Rng::seed_from_u64(21);
        let (secret, public) = P256::generate_keypair(&mut rng).unwrap();
        let envelope = seal::<P256, _>(params, plaintext, &public, &mut rng).unwrap();
        (secret, envelope)
    }

    #[test]
    fn probe_reports_ciphertext_length() {
        let params = SchemeParameters::default();
        let (secret, envelope) = sealed(&params, b"twenty bytes of text");

        let required = open_into::<P256>(&envelope, &params, &secret, None).unwrap();
        assert_eq!(required, 32);
    }

    #[test]
    fn probe_succeeds_on_garbage() {
        let params = SchemeParameters::default();
        let (secret, _) = sealed(&params, b"");
        let garbage = Envelope::new(Bytes::new(), vec![0u8; 48], Bytes::new());

        let required = open_into::<P256>(&garbage, &params, &secret, None).unwrap();
        assert_eq!(required, 48);
    }

    #[test]
    fn undersized_buffer_untouched() {
        let params = SchemeParameters::default();
        let (secret, envelope) = sealed(&params, b"some plaintext");

        let mut out = [0xAB; 15];
        let result = open_into::<P256>(&envelope, &params, &secret, Some(&mut out[..]));

        assert_eq!(result, Err(EciesError::BufferTooSmall { required: 16, provided: 15 }));
        assert!(out.iter().all(|&b| b == 0xAB));
    }

    #[test]
    fn buffer_check_precedes_point_validation() {
        let params = SchemeParameters::default();
        let (secret, _) = sealed(&params, b"");
        let broken = Envelope::new(Bytes::new(), vec![0u8; 32], Bytes::new());

        let result = open_into::<P256>(&broken, &params, &secret, Some(&mut [0u8; 8][..]));
        assert!(matches!(result, Err(EciesError::BufferTooSmall { required: 32, .. })));
    }

    #[test]
    fn larger_buffer_reports_exact_length() {
        let params = SchemeParameters::default();
        let (secret, envelope) = sealed(&params, b"abc");

        let mut out = [0u8; 64];
        let len = open_into::<P256>(&envelope, &params, &secret, Some(&mut out[..])).unwrap();

        assert_eq!(&out[..len], b"abc");
        assert!(out[len..].iter().all(|&b| b == 0));
    }

    #[test]
    fn missing_point_is_malformed_envelope() {
        let params = SchemeParameters::default();
        let (secret, envelope) = sealed(&params, b"abc");
        let stripped = Envelope { ephemeral_point: Bytes::new(), ..envelope };

        let result = open::<P256>(&stripped, &params, &secret);
        assert!(matches!(
            result,
            Err(EciesError::MalformedEnvelope { reason }) if reason.contains("ephemeral point")
        ));
    }

    #[test]
    fn reencoded_ephemeral_point_is_malformed() {
        use elliptic_curve::sec1::ToEncodedPoint;

        let params = SchemeParameters::default();
        let (secret, envelope) = sealed(&params, b"abc");
        let ephemeral = P256::deserialize_public(&envelope.ephemeral_point).unwrap();

        let uncompressed = Envelope {
            ephemeral_point: Bytes::copy_from_slice(ephemeral.to_encoded_point(false).as_bytes()),
            ..envelope.clone()
        };
        let mut compact = envelope.ephemeral_point.to_vec();
        compact[0] = 0x05;
        let compact = Envelope { ephemeral_point: compact.into(), ..envelope };

        for tampered in [uncompressed, compact] {
            let mut out = [0x22; 16];
            let result = open_into::<P256>(&tampered, &params, &secret, Some(&mut out[..]));
            assert_eq!(result, Err(EciesError::MalformedPoint));
            assert!(out.iter().all(|&b| b == 0x22));
        }
    }

    #[test]
    fn missing_tag_is_malformed_envelope() {
        let params = SchemeParameters::default();
        let (secret, envelope) = sealed(&params, b"abc");
        let stripped = Envelope { mac_tag: Bytes::new(), ..envelope };

        let result = open::<P256>(&stripped, &params, &secret);
        assert!(matches!(
            result,
            Err(EciesError::MalformedEnvelope { reason }) if reason.contains("MAC tag")
        ));
    }

    #[test]
    fn truncated_tag_fails_verification() {
        let params = SchemeParameters::default();
        let (secret, envelope) = sealed(&params, b"abc");
        let short = Envelope { mac_tag: envelope.mac_tag.slice(..31), ..envelope };

        let result = open::<P256>(&short, &params, &secret);
        assert_eq!(result, Err(EciesError::MacVerificationFailed));
    }

    #[test]
    fn tampered_ciphertext_never_reaches_buffer() {
        let params = SchemeParameters::keystream(HashAlgorithm::Sha256, HashAlgorithm::Sha256);
        let (secret, envelope) = sealed(&params, b"keystream");

        let mut ciphertext = envelope.ciphertext.to_vec();
        ciphertext[0] ^= 0x80;
        let tampered = Envelope { ciphertext: ciphertext.into(), ..envelope };

        let mut out = [0x11; 9];
        let result = open_into::<P256>(&tampered, &params, &secret, Some(&mut out[..]));

        assert_eq!(result, Err(EciesError::MacVerificationFailed));
        assert!(out.iter().all(|&b| b == 0x11));
    }

    #[test]
    fn params_mismatch_is_detected() {
        let params = SchemeParameters::default();
        let (secret, envelope) = sealed(&params, b"abc");
        let other = SchemeParameters::new(
            HashAlgorithm::Sha512,
            HashAlgorithm::Sha256,
            crate::primitives::cipher::SymmetricCipher::Aes128Cbc,
        );

        let result = open::<P256>(&envelope, &other, &secret);
        assert_eq!(result, Err(EciesError::MacVerificationFailed));
    }
}
