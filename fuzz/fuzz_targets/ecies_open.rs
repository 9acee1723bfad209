//! Fuzz target for ECIES decryption
//!
//! Builds a genuine envelope, applies adversarial mutations, and decrypts.
//!
//! # Invariants
//!
//! - Decryption never panics
//! - An unmodified envelope always decrypts to the input plaintext
//! - Any mutation of the ciphertext or tag is a MAC failure
//! - A replaced ephemeral point never yields a different plaintext
//! - The probe length is always the ciphertext length
//! - An undersized buffer is always `BufferTooSmall` and leaves it untouched

#![no_main]

use arbitrary::Arbitrary;
use bytes::Bytes;
use ecbox_crypto::{
    Curve, EcSecretKey, EciesError, Envelope, HashAlgorithm, SchemeParameters, SymmetricCipher,
    decrypt, decrypt_into, encrypt,
};
use libfuzzer_sys::fuzz_target;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

#[derive(Debug, Arbitrary)]
struct Scenario {
    seed: u64,
    curve: CurveChoice,
    keystream: bool,
    plaintext: Vec<u8>,
    mutation: Mutation,
}

#[derive(Debug, Arbitrary)]
enum CurveChoice {
    P256,
    P384,
    K256,
}

#[derive(Debug, Arbitrary)]
enum Mutation {
    None,
    FlipCiphertext { index: usize, mask: u8 },
    FlipTag { index: usize, mask: u8 },
    ReplacePoint(Vec<u8>),
    TruncateCiphertext(usize),
    ShrinkBuffer(usize),
}

fuzz_target!(|scenario: Scenario| {
    let curve = match scenario.curve {
        CurveChoice::P256 => Curve::P256,
        CurveChoice::P384 => Curve::P384,
        CurveChoice::K256 => Curve::K256,
    };
    let params = if scenario.keystream {
        SchemeParameters::keystream(HashAlgorithm::Sha256, HashAlgorithm::Sha256)
    } else {
        SchemeParameters::new(HashAlgorithm::Sha256, HashAlgorithm::Sha256, SymmetricCipher::Aes128Cbc)
    };

    let mut rng = ChaCha20Rng::seed_from_u64(scenario.seed);
    let secret = EcSecretKey::generate(curve, &mut rng).expect("seeded keygen");
    let envelope = encrypt(&params, &scenario.plaintext, &secret.public_key(), &mut rng)
        .expect("encrypt within limits");

    match scenario.mutation {
        Mutation::None => {
            let decrypted = decrypt(&envelope, &params, &secret).expect("genuine envelope");
            assert_eq!(decrypted, scenario.plaintext);
        },
        Mutation::FlipCiphertext { index, mask } => {
            if envelope.ciphertext.is_empty() || mask == 0 {
                return;
            }
            let mut ciphertext = envelope.ciphertext.to_vec();
            let at = index % ciphertext.len();
            ciphertext[at] ^= mask;
            let tampered = Envelope { ciphertext: ciphertext.into(), ..envelope };

            assert_eq!(
                decrypt(&tampered, &params, &secret),
                Err(EciesError::MacVerificationFailed)
            );
        },
        Mutation::FlipTag { index, mask } => {
            if mask == 0 {
                return;
            }
            let mut tag = envelope.mac_tag.to_vec();
            let at = index % tag.len();
            tag[at] ^= mask;
            let tampered = Envelope { mac_tag: tag.into(), ..envelope };

            assert_eq!(
                decrypt(&tampered, &params, &secret),
                Err(EciesError::MacVerificationFailed)
            );
        },
        Mutation::ReplacePoint(point) => {
            let replaced = Envelope { ephemeral_point: Bytes::from(point), ..envelope };

            // Only another encoding of the same point may succeed
            if let Ok(decrypted) = decrypt(&replaced, &params, &secret) {
                assert_eq!(decrypted, scenario.plaintext, "foreign point produced plaintext");
            }
        },
        Mutation::TruncateCiphertext(cut) => {
            if envelope.ciphertext.is_empty() {
                return;
            }
            let keep = cut % envelope.ciphertext.len();
            let truncated =
                Envelope { ciphertext: envelope.ciphertext.slice(..keep), ..envelope };

            assert_eq!(decrypt_into(&truncated, &params, &secret, None), Ok(keep));
            assert_eq!(
                decrypt(&truncated, &params, &secret),
                Err(EciesError::MacVerificationFailed)
            );
        },
        Mutation::ShrinkBuffer(by) => {
            let required = envelope.ciphertext.len();
            if required == 0 {
                return;
            }
            let size = required - 1 - by % required;
            let mut out = vec![0xA5; size];

            let result = decrypt_into(&envelope, &params, &secret, Some(&mut out[..]));
            assert_eq!(result, Err(EciesError::BufferTooSmall { required, provided: size }));
            assert!(out.iter().all(|&b| b == 0xA5));
        },
    }
});
