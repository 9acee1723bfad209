//! Derived key material for one envelope

use zeroize::Zeroizing;

use super::params::SchemeParameters;
use crate::{EciesError, primitives::kdf};

/// Encryption key and MAC key derived from one shared secret.
///
/// Both keys live in a single zeroizing allocation: the first
/// `encryption_key_len` bytes are the encryption key, the rest the MAC key.
/// The buffer is wiped when this value drops, on every exit path.
pub(crate) struct DerivedKeyMaterial {
    bytes: Zeroizing<Vec<u8>>,
    enc_len: usize,
}

impl DerivedKeyMaterial {
    /// Run the configured KDF over `shared_secret`.
    ///
    /// `message_len` sizes the encryption key in keystream mode; the sender
    /// passes the plaintext length, the receiver the ciphertext length.
    ///
    /// # Errors
    ///
    /// - `KeyAgreementFailed`: the KDF cannot produce that much output
    /// - `AllocationFailed`: the key buffer could not be allocated
    pub(crate) fn derive(
        params: &SchemeParameters,
        shared_secret: &[u8],
        message_len: usize,
    ) -> Result<Self, EciesError> {
        let enc_len = params.encryption_key_len(message_len);
        let total =
            enc_len.checked_add(params.mac_key_len()).ok_or(EciesError::KeyAgreementFailed)?;

        let mut bytes = Zeroizing::new(crate::primitives::try_alloc(total)?);
        kdf::derive(params.kdf(), params.kdf_hash(), shared_secret, &mut bytes)?;

        Ok(Self { bytes, enc_len })
    }

    pub(crate) fn encryption_key(&self) -> &[u8] {
        &self.bytes[..self.enc_len]
    }

    pub(crate) fn mac_key(&self) -> &[u8] {
        &self.bytes[self.enc_len..]
    }
}

/// XOR `input` with `keystream` into `out`.
///
/// All three slices must be the same length.
pub(crate) fn xor_into(input: &[u8], keystream: &[u8], out: &mut [u8]) {
    debug_assert_eq!(input.len(), keystream.len());
    debug_assert_eq!(input.len(), out.len());

    for ((dst, byte), key) in out.iter_mut().zip(input).zip(keystream) {
        *dst = byte ^ key;
    }
}
