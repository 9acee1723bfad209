//! AES-CBC with PKCS#7 padding
//!
//! The IV is always sixteen zero bytes. That is only sound because every
//! envelope is encrypted under a key derived from a fresh ephemeral ECDH
//! exchange, so no (key, IV) pair is ever used twice.

use aes::{Aes128, Aes192, Aes256};
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::Pkcs7};
use serde::{Deserialize, Serialize};

use super::try_alloc;
use crate::EciesError;

const ZERO_IV: [u8; SymmetricCipher::BLOCK_SIZE] = [0; SymmetricCipher::BLOCK_SIZE];

/// Block cipher used to encrypt the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SymmetricCipher {
    /// AES-128 in CBC mode
    Aes128Cbc,
    /// AES-192 in CBC mode
    Aes192Cbc,
    /// AES-256 in CBC mode
    Aes256Cbc,
}

impl SymmetricCipher {
    /// AES block size in bytes
    pub const BLOCK_SIZE: usize = 16;

    /// Required key length in bytes.
    pub const fn key_len(self) -> usize {
        match self {
            Self::Aes128Cbc => 16,
            Self::Aes192Cbc => 24,
            Self::Aes256Cbc => 32,
        }
    }

    /// Canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Aes128Cbc => "aes128-cbc",
            Self::Aes192Cbc => "aes192-cbc",
            Self::Aes256Cbc => "aes256-cbc",
        }
    }

    /// Ciphertext length for a plaintext of `plaintext_len` bytes.
    ///
    /// PKCS#7 always adds between 1 and 16 bytes, so an exact multiple of the
    /// block size gains a whole block.
    pub const fn padded_len(plaintext_len: usize) -> Option<usize> {
        let blocks = plaintext_len / Self::BLOCK_SIZE + 1;
        blocks.checked_mul(Self::BLOCK_SIZE)
    }

    /// Encrypt `plaintext` under `key` into a freshly allocated buffer.
    ///
    /// # Errors
    ///
    /// - `EncryptionFailed`: `key` has the wrong length
    /// - `AllocationFailed`: the output buffer could not be allocated
    pub fn encrypt(self, key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, EciesError> {
        let padded = Self::padded_len(plaintext.len()).ok_or(EciesError::EncryptionFailed)?;
        let mut out = try_alloc(padded)?;

        let written = match self {
            Self::Aes128Cbc => encrypt_with::<cbc::Encryptor<Aes128>>(key, plaintext, &mut out),
            Self::Aes192Cbc => encrypt_with::<cbc::Encryptor<Aes192>>(key, plaintext, &mut out),
            Self::Aes256Cbc => encrypt_with::<cbc::Encryptor<Aes256>>(key, plaintext, &mut out),
        }?;

        out.truncate(written);
        Ok(out)
    }

    /// Decrypt `ciphertext` into `out` and strip the padding.
    ///
    /// Returns the plaintext length. `out` must hold at least
    /// `ciphertext.len()` bytes; padding bytes past the returned length are
    /// zeroed.
    ///
    /// # Errors
    ///
    /// - `DecryptionFailed`: wrong key length, ciphertext not a whole number
    ///   of blocks, `out` too short, or invalid padding
    pub fn decrypt_into(
        self,
        key: &[u8],
        ciphertext: &[u8],
        out: &mut [u8],
    ) -> Result<usize, EciesError> {
        let result = match self {
            Self::Aes128Cbc => decrypt_with::<cbc::Decryptor<Aes128>>(key, ciphertext, out),
            Self::Aes192Cbc => decrypt_with::<cbc::Decryptor<Aes192>>(key, ciphertext, out),
            Self::Aes256Cbc => decrypt_with::<cbc::Decryptor<Aes256>>(key, ciphertext, out),
        };

        if let Ok(len) = result {
            let touched = ciphertext.len().min(out.len());
            out[len..touched].fill(0);
        }
        result
    }
}

impl core::fmt::Display for SymmetricCipher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

fn encrypt_with<E: KeyIvInit + BlockEncryptMut>(
    key: &[u8],
    plaintext: &[u8],
    out: &mut [u8],
) -> Result<usize, EciesError> {
    let encryptor =
        E::new_from_slices(key, &ZERO_IV).map_err(|_| EciesError::EncryptionFailed)?;
    encryptor
        .encrypt_padded_b2b_mut::<Pkcs7>(plaintext, out)
        .map(<[u8]>::len)
        .map_err(|_| EciesError::EncryptionFailed)
}

fn decrypt_with<D: KeyIvInit + BlockDecryptMut>(
    key: &[u8],
    ciphertext: &[u8],
    out: &mut [u8],
) -> Result<usize, EciesError> {
    let decryptor =
        D::new_from_slices(key, &ZERO_IV).map_err(|_| EciesError::DecryptionFailed)?;
    decryptor
        .decrypt_padded_b2b_mut::<Pkcs7>(ciphertext, out)
        .map(<[u8]>::len)
        .map_err(|_| EciesError::DecryptionFailed)
}
