//! Envelope construction

use ecbox_proto::Envelope;
use rand::{CryptoRng, RngCore};

use super::{
    keys::{DerivedKeyMaterial, xor_into},
    params::SchemeParameters,
};
use crate::{
    EciesError,
    primitives::{agreement::KeyAgreement, mac, try_alloc},
};

/// Encrypt `plaintext` to `recipient` on the curve `K`.
///
/// A fresh ephemeral keypair is generated for every call. The ephemeral
/// secret, the raw shared secret and the derived keys are all wiped before
/// this returns. The MAC covers the ciphertext.
///
/// # Errors
///
/// - `MessageTooLarge`: the ciphertext would exceed the envelope limit, or the
///   keystream would exceed what the KDF can derive
/// - `KeyGenerationFailed`: the RNG failed
/// - `KeyAgreementFailed`: ECDH or the KDF failed
/// - `EncryptionFailed`: the block cipher rejected its input
/// - `MacComputationFailed`: the tag could not be computed
/// - `AllocationFailed`: an output buffer could not be allocated
pub fn seal<K, R>(
    params: &SchemeParameters,
    plaintext: &[u8],
    recipient: &K::PublicKey,
    rng: &mut R,
) -> Result<Envelope, EciesError>
where
    K: KeyAgreement,
    R: RngCore + CryptoRng,
{
    let ciphertext_len = params.max_ciphertext_len(plaintext.len());
    if ciphertext_len > Envelope::MAX_CIPHERTEXT_SIZE {
        return Err(EciesError::MessageTooLarge {
            size: plaintext.len(),
            max: Envelope::MAX_CIPHERTEXT_SIZE,
        });
    }

    // Keystream mode derives one key byte per message byte
    let kdf_limit = params.kdf().max_output_len(params.kdf_hash());
    let key_len = params.encryption_key_len(plaintext.len()).checked_add(params.mac_key_len());
    if key_len.is_none_or(|len| len > kdf_limit) {
        return Err(EciesError::MessageTooLarge {
            size: plaintext.len(),
            max: kdf_limit.saturating_sub(params.mac_key_len()),
        });
    }

    let (ephemeral_secret, ephemeral_public) = K::generate_keypair(rng)?;
    let ephemeral_point = K::serialize_public(&ephemeral_public);

    let shared_secret = K::shared_secret(&ephemeral_secret, recipient)?;
    drop(ephemeral_secret);

    let keys = DerivedKeyMaterial::derive(params, &shared_secret, plaintext.len())?;
    drop(shared_secret);

    let ciphertext = match params.symmetric_cipher() {
        Some(cipher) => cipher.encrypt(keys.encryption_key(), plaintext)?,
        None => {
            let mut out = try_alloc(plaintext.len())?;
            xor_into(plaintext, keys.encryption_key(), &mut out);
            out
        },
    };

    let mac_tag = mac::compute(params.mac_hash(), keys.mac_key(), &ciphertext)?;

    tracing::debug!(
        curve = %K::CURVE,
        plaintext_len = plaintext.len(),
        ciphertext_len = ciphertext.len(),
        keystream = params.is_keystream(),
        "sealed envelope"
    );

    Ok(Envelope::new(ephemeral_point, ciphertext, mac_tag))
}
