//! ECIES: ephemeral ECDH, KDF, then encrypt-then-MAC
//!
//! # Construction
//!
//! ```text
//! sender                                   recipient (sk, pk)
//! ------                                   ------------------
//! (e, E) <- keygen
//! Z      <- ECDH(e, pk)                    Z      <- ECDH(sk, E)
//! k_enc || k_mac <- KDF(Z)                 k_enc || k_mac <- KDF(Z)
//! c      <- Enc(k_enc, m)
//! t      <- HMAC(k_mac, c)                 verify HMAC(k_mac, c) == t
//!                                          m      <- Dec(k_enc, c)
//!            envelope = (E, c, t)  ------>
//! ```
//!
//! `Enc` is AES-CBC under a zero IV, or XOR with `k_enc` in keystream mode
//! (where `k_enc` is as long as the message).
//!
//! The functions here take runtime-selected keys ([`EcPublicKey`],
//! [`EcSecretKey`]). [`seal`] and [`open_into`] are the same operations over
//! a compile-time [`KeyAgreement`](crate::primitives::agreement::KeyAgreement)
//! implementation.

mod decrypt;
mod encrypt;
mod keys;
mod params;

pub use decrypt::{open, open_into};
pub use encrypt::seal;
pub use params::SchemeParameters;

use ecbox_proto::Envelope;
use rand::{CryptoRng, RngCore};

use crate::{
    EciesError,
    primitives::agreement::{EcPublicKey, EcSecretKey, K256, P256, P384},
};

/// Encrypt `plaintext` to `recipient`.
///
/// See [`seal`] for the errors.
pub fn encrypt<R: RngCore + CryptoRng>(
    params: &SchemeParameters,
    plaintext: &[u8],
    recipient: &EcPublicKey,
    rng: &mut R,
) -> Result<Envelope, EciesError> {
    match recipient {
        EcPublicKey::P256(key) => seal::<P256, R>(params, plaintext, key, rng),
        EcPublicKey::P384(key) => seal::<P384, R>(params, plaintext, key, rng),
        EcPublicKey::K256(key) => seal::<K256, R>(params, plaintext, key, rng),
    }
}

/// Decrypt `envelope` into a caller-owned buffer, or probe its size.
///
/// See [`open_into`] for the buffer protocol and the errors.
pub fn decrypt_into(
    envelope: &Envelope,
    params: &SchemeParameters,
    secret: &EcSecretKey,
    out: Option<&mut [u8]>,
) -> Result<usize, EciesError> {
    let result = match secret {
        EcSecretKey::P256(key) => open_into::<P256>(envelope, params, key, out),
        EcSecretKey::P384(key) => open_into::<P384>(envelope, params, key, out),
        EcSecretKey::K256(key) => open_into::<K256>(envelope, params, key, out),
    };

    if let Err(err) = &result
        && !err.is_recoverable()
    {
        tracing::debug!(curve = %secret.curve(), error = %err, "rejected envelope");
    }

    result
}

/// Decrypt `envelope` into a newly allocated buffer.
///
/// # Errors
///
/// As [`decrypt_into`], plus `AllocationFailed`.
pub fn decrypt(
    envelope: &Envelope,
    params: &SchemeParameters,
    secret: &EcSecretKey,
) -> Result<Vec<u8>, EciesError> {
    let capacity = decrypt_into(envelope, params, secret, None)?;
    let mut plaintext = crate::primitives::try_alloc(capacity)?;

    let len = decrypt_into(envelope, params, secret, Some(plaintext.as_mut_slice()))?;
    plaintext.truncate(len);
    Ok(plaintext)
}

/// Decode a wire-format envelope and decrypt it.
///
/// # Errors
///
/// - `MalformedEnvelope`: `bytes` is not a valid encoded envelope
/// - everything [`decrypt`] reports
pub fn decrypt_bytes(
    bytes: &[u8],
    params: &SchemeParameters,
    secret: &EcSecretKey,
) -> Result<Vec<u8>, EciesError> {
    let envelope = Envelope::decode(bytes).map_err(|err| {
        tracing::debug!(error = %err, len = bytes.len(), "undecodable envelope");
        EciesError::from(err)
    })?;

    decrypt(&envelope, params, secret)
}
