//! Key derivation from raw ECDH secrets
//!
//! Two KDFs, each parameterized by a SHA-2 hash:
//! - ANSI X9.63 (SEC1 §3.6.1): `H(Z || counter_be32)` blocks, counter from 1
//! - HKDF (RFC 5869): extract without salt, expand with empty info

use hkdf::Hkdf;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use zeroize::Zeroize;

use crate::EciesError;

/// Hash function used inside the KDF or the MAC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HashAlgorithm {
    /// SHA-224
    Sha224,
    /// SHA-256
    Sha256,
    /// SHA-384
    Sha384,
    /// SHA-512
    Sha512,
}

impl HashAlgorithm {
    /// Digest size in bytes.
    pub const fn digest_len(self) -> usize {
        match self {
            Self::Sha224 => 28,
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }

    /// Canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Sha224 => "sha224",
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
        }
    }
}

impl core::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Key derivation function applied to the raw shared secret.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyDerivation {
    /// ANSI X9.63 / SEC1 KDF
    #[default]
    AnsiX963,
    /// HKDF extract-then-expand
    Hkdf,
}

impl KeyDerivation {
    /// Most output bytes this KDF can produce with `hash`.
    ///
    /// HKDF stops at 255 blocks. X9.63 is bounded by its 32-bit counter.
    pub const fn max_output_len(self, hash: HashAlgorithm) -> usize {
        match self {
            Self::AnsiX963 => (u32::MAX as usize).saturating_mul(hash.digest_len()),
            Self::Hkdf => 255 * hash.digest_len(),
        }
    }
}

/// Fill `out` with key material derived from `secret`.
///
/// # Errors
///
/// - `KeyAgreementFailed`: `out` is longer than the KDF can produce
pub fn derive(
    kdf: KeyDerivation,
    hash: HashAlgorithm,
    secret: &[u8],
    out: &mut [u8],
) -> Result<(), EciesError> {
    match kdf {
        KeyDerivation::AnsiX963 => match hash {
            HashAlgorithm::Sha224 => x963::<Sha224>(secret, out),
            HashAlgorithm::Sha256 => x963::<Sha256>(secret, out),
            HashAlgorithm::Sha384 => x963::<Sha384>(secret, out),
            HashAlgorithm::Sha512 => x963::<Sha512>(secret, out),
        },
        KeyDerivation::Hkdf => match hash {
            HashAlgorithm::Sha224 => Hkdf::<Sha224>::new(None, secret).expand(&[], out),
            HashAlgorithm::Sha256 => Hkdf::<Sha256>::new(None, secret).expand(&[], out),
            HashAlgorithm::Sha384 => Hkdf::<Sha384>::new(None, secret).expand(&[], out),
            HashAlgorithm::Sha512 => Hkdf::<Sha512>::new(None, secret).expand(&[], out),
        }
        .map_err(|_| EciesError::KeyAgreementFailed),
    }
}

// Output blocks are wiped. The hasher's internal state, which absorbed the
// secret, has no zeroize support in sha2 and is dropped as is.
fn x963<D: Digest>(secret: &[u8], out: &mut [u8]) -> Result<(), EciesError> {
    let block_len = <D as Digest>::output_size();

    // 32-bit big-endian counter, starting at 1
    if out.len().div_ceil(block_len) > u32::MAX as usize {
        return Err(EciesError::KeyAgreementFailed);
    }

    for (index, chunk) in out.chunks_mut(block_len).enumerate() {
        let counter = index as u32 + 1;

        let mut hasher = D::new();
        hasher.update(secret);
        hasher.update(counter.to_be_bytes());
        let mut block = hasher.finalize();

        chunk.copy_from_slice(&block[..chunk.len()]);
        block.as_mut_slice().zeroize();
    }

    Ok(())
}
