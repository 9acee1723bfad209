//! Scheme configuration
//!
//! A [`SchemeParameters`] value fixes every algorithm choice except the
//! curve, which comes from the recipient key. It is `Copy` and is meant to be
//! built once and shared by all calls.

use serde::{Deserialize, Serialize};

use crate::primitives::{
    cipher::SymmetricCipher,
    kdf::{HashAlgorithm, KeyDerivation},
};

/// Algorithm selection for one ECIES configuration.
///
/// Without a symmetric cipher the payload is XORed with a keystream as long
/// as the message. That mode is only reachable through
/// [`SchemeParameters::keystream`], or by deserializing a config that sets
/// `symmetric-cipher` to null explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SchemeParameters {
    #[serde(default)]
    kdf: KeyDerivation,
    kdf_hash: HashAlgorithm,
    mac_hash: HashAlgorithm,
    // Required even though it is an Option: keystream mode must be spelled out
    #[serde(deserialize_with = "Option::deserialize")]
    symmetric_cipher: Option<SymmetricCipher>,
}

impl SchemeParameters {
    /// Block cipher configuration with the default (X9.63) KDF.
    pub const fn new(
        kdf_hash: HashAlgorithm,
        mac_hash: HashAlgorithm,
        cipher: SymmetricCipher,
    ) -> Self {
        Self { kdf: KeyDerivation::AnsiX963, kdf_hash, mac_hash, symmetric_cipher: Some(cipher) }
    }

    /// Keystream (XOR) configuration.
    ///
    /// The encryption key is derived to exactly the message length and used
    /// as a one-time pad. Every envelope gets its own ephemeral key, so no
    /// pad is reused.
    pub const fn keystream(kdf_hash: HashAlgorithm, mac_hash: HashAlgorithm) -> Self {
        Self { kdf: KeyDerivation::AnsiX963, kdf_hash, mac_hash, symmetric_cipher: None }
    }

    /// Replace the key derivation function.
    #[must_use]
    pub const fn with_kdf(mut self, kdf: KeyDerivation) -> Self {
        self.kdf = kdf;
        self
    }

    /// Key derivation function.
    pub const fn kdf(&self) -> KeyDerivation {
        self.kdf
    }

    /// Hash used inside the KDF.
    pub const fn kdf_hash(&self) -> HashAlgorithm {
        self.kdf_hash
    }

    /// Hash used by the HMAC.
    pub const fn mac_hash(&self) -> HashAlgorithm {
        self.mac_hash
    }

    /// Block cipher, or `None` in keystream mode.
    pub const fn symmetric_cipher(&self) -> Option<SymmetricCipher> {
        self.symmetric_cipher
    }

    /// True when the payload is XORed with a derived keystream.
    pub const fn is_keystream(&self) -> bool {
        self.symmetric_cipher.is_none()
    }

    /// Encryption key length for a message of `message_len` bytes.
    ///
    /// The cipher's key length, or `message_len` itself in keystream mode.
    pub const fn encryption_key_len(&self, message_len: usize) -> usize {
        match self.symmetric_cipher {
            Some(cipher) => cipher.key_len(),
            None => message_len,
        }
    }

    /// MAC key length (the MAC digest length).
    pub const fn mac_key_len(&self) -> usize {
        self.mac_hash.digest_len()
    }

    /// MAC tag length.
    pub const fn tag_len(&self) -> usize {
        self.mac_hash.digest_len()
    }

    /// Ciphertext length produced for `plaintext_len` bytes of input.
    ///
    /// Saturates at `usize::MAX` for lengths no cipher could process.
    pub const fn max_ciphertext_len(&self, plaintext_len: usize) -> usize {
        match self.symmetric_cipher {
            Some(_) => match SymmetricCipher::padded_len(plaintext_len) {
                Some(len) => len,
                None => usize::MAX,
            },
            None => plaintext_len,
        }
    }
}

impl Default for SchemeParameters {
    /// X9.63-SHA256 KDF, HMAC-SHA256, AES-128-CBC.
    fn default() -> Self {
        Self::new(HashAlgorithm::Sha256, HashAlgorithm::Sha256, SymmetricCipher::Aes128Cbc)
    }
}
