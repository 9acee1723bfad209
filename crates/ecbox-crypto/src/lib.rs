//! Ecbox Cryptography
//!
//! Public-key encryption of byte strings to an elliptic curve key using
//! ECIES. Pure functions: callers pass the RNG, keys and parameters, and no
//! state survives a call.
//!
//! # Message Flow
//!
//! ```text
//! Recipient Public Key ──┐
//!                        ▼
//! Ephemeral Keypair → ECDH → Raw Shared Secret
//!                              │
//!                              ▼
//!                    KDF (X9.63 or HKDF) → Encryption Key ║ MAC Key
//!                                              │             │
//!                                              ▼             ▼
//! Plaintext ───────────────────→ AES-CBC / XOR → Ciphertext → HMAC → Tag
//! ```
//!
//! The [`Envelope`](ecbox_proto::Envelope) carries the ephemeral point, the
//! ciphertext and the tag.
//!
//! # Security
//!
//! Freshness:
//! - Every envelope uses a new ephemeral keypair, so encrypting the same
//!   plaintext twice yields unrelated envelopes
//! - The zero IV (and the keystream pad) are safe only because of that
//!
//! Authenticity:
//! - The HMAC covers the ciphertext (encrypt-then-MAC)
//! - Decryption verifies the tag before touching the ciphertext
//! - A tag mismatch is one error regardless of which check failed
//!
//! Key Hygiene:
//! - Ephemeral secrets, shared secrets and derived keys are zeroized on every
//!   exit path
//! - Secret keys never print their scalar

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod ecies;
mod error;
pub mod primitives;

pub use ecbox_proto::Envelope;
pub use ecies::{
    SchemeParameters, decrypt, decrypt_bytes, decrypt_into, encrypt, open, open_into, seal,
};
pub use error::EciesError;
pub use primitives::{
    agreement::{Curve, EcPublicKey, EcSecretKey, K256, KeyAgreement, P256, P384},
    cipher::SymmetricCipher,
    kdf::{HashAlgorithm, KeyDerivation},
};
