//! HMAC over ciphertext
//!
//! The MAC key length equals the digest length of the chosen hash, and so
//! does the tag length.
//!
//! A recomputed tag is a valid tag for attacker-chosen input, so every tag
//! buffer produced here is wiped on drop. `hmac` keeps no zeroize support for
//! its inner hash state.

use hmac::{Hmac, Mac, digest::KeyInit};
use sha2::{Sha224, Sha256, Sha384, Sha512};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, Zeroizing};

use super::kdf::HashAlgorithm;
use crate::EciesError;

/// Compute the HMAC tag of `message` under `key`.
pub fn compute(hash: HashAlgorithm, key: &[u8], message: &[u8]) -> Result<Vec<u8>, EciesError> {
    expected_tag(hash, key, message).map(|tag| tag.to_vec())
}

fn expected_tag(
    hash: HashAlgorithm,
    key: &[u8],
    message: &[u8],
) -> Result<Zeroizing<Vec<u8>>, EciesError> {
    match hash {
        HashAlgorithm::Sha224 => hmac_compute::<Hmac<Sha224>>(key, message),
        HashAlgorithm::Sha256 => hmac_compute::<Hmac<Sha256>>(key, message),
        HashAlgorithm::Sha384 => hmac_compute::<Hmac<Sha384>>(key, message),
        HashAlgorithm::Sha512 => hmac_compute::<Hmac<Sha512>>(key, message),
    }
}

/// Recompute the tag of `message` and compare it with `tag`.
///
/// Length is checked first, then bytes in constant time. Both mismatches
/// produce the same `MacVerificationFailed`.
///
/// # Errors
///
/// - `MacComputationFailed`: the MAC could not be keyed
/// - `MacVerificationFailed`: `tag` does not match
pub fn verify(
    hash: HashAlgorithm,
    key: &[u8],
    message: &[u8],
    tag: &[u8],
) -> Result<(), EciesError> {
    let expected = expected_tag(hash, key, message)?;

    if expected.len() != tag.len() {
        return Err(EciesError::MacVerificationFailed);
    }
    if !bool::from(expected.as_slice().ct_eq(tag)) {
        return Err(EciesError::MacVerificationFailed);
    }

    Ok(())
}

fn hmac_compute<M: Mac + KeyInit>(
    key: &[u8],
    message: &[u8],
) -> Result<Zeroizing<Vec<u8>>, EciesError> {
    let mut mac =
        <M as KeyInit>::new_from_slice(key).map_err(|_| EciesError::MacComputationFailed)?;
    mac.update(message);

    let mut output = mac.finalize().into_bytes();
    let tag = Zeroizing::new(output.to_vec());
    output.as_mut_slice().zeroize();
    Ok(tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; 32] = [0x0B; 32];

    #[test]
    fn tag_length_matches_digest() {
        for hash in [
            HashAlgorithm::Sha224,
            HashAlgorithm::Sha256,
            HashAlgorithm::Sha384,
            HashAlgorithm::Sha512,
        ] {
            let tag = compute(hash, &KEY, b"ciphertext").unwrap();
            assert_eq!(tag.len(), hash.digest_len(), "{hash}");
        }
    }

    #[test]
    fn rfc4231_case_2() {
        // Key = "Jefe", data = "what do ya want for nothing?"
        let tag =
            compute(HashAlgorithm::Sha256, b"Jefe", b"what do ya want for nothing?").unwrap();
        assert_eq!(
            hex::encode(tag),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn expected_tag_is_wiped_on_drop() {
        // Type-level: the verify-side tag is held in a zeroizing buffer
        let expected: Zeroizing<Vec<u8>> =
            expected_tag(HashAlgorithm::Sha512, &KEY, b"ciphertext").unwrap();
        let published = compute(HashAlgorithm::Sha512, &KEY, b"ciphertext").unwrap();
        assert_eq!(expected.as_slice(), published.as_slice());
    }

    #[test]
    fn verify_accepts_own_tag() {
        let tag = compute(HashAlgorithm::Sha384, &KEY, b"ciphertext").unwrap();
        verify(HashAlgorithm::Sha384, &KEY, b"ciphertext", &tag).unwrap();
    }

    #[test]
    fn verify_rejects_flipped_bit() {
        let mut tag = compute(HashAlgorithm::Sha256, &KEY, b"ciphertext").unwrap();
        tag[7] ^= 0x01;

        let result = verify(HashAlgorithm::Sha256, &KEY, b"ciphertext", &tag);
        assert_eq!(result, Err(EciesError::MacVerificationFailed));
    }

    #[test]
    fn verify_rejects_wrong_length_with_same_error() {
        let tag = compute(HashAlgorithm::Sha256, &KEY, b"ciphertext").unwrap();

        let truncated = verify(HashAlgorithm::Sha256, &KEY, b"ciphertext", &tag[..16]);
        let mut longer = tag.clone();
        longer.push(0);
        let extended = verify(HashAlgorithm::Sha256, &KEY, b"ciphertext", &longer);

        assert_eq!(truncated, Err(EciesError::MacVerificationFailed));
        assert_eq!(extended, Err(EciesError::MacVerificationFailed));
    }

    #[test]
    fn verify_rejects_wrong_key() {
        let tag = compute(HashAlgorithm::Sha256, &KEY, b"ciphertext").unwrap();
        let result = verify(HashAlgorithm::Sha256, &[0x0C; 32], b"ciphertext", &tag);
        assert_eq!(result, Err(EciesError::MacVerificationFailed));
    }
}
