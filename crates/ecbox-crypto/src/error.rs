//! Error types for ECIES operations.
//!
//! One variant per failure category. MAC verification deliberately has a
//! single unit variant: callers (and attackers) never learn whether the tag
//! length or the tag bytes were wrong.

use ecbox_proto::ProtocolError;
use thiserror::Error;

/// Errors that can occur while encrypting or decrypting an envelope.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EciesError {
    /// Could not generate an ephemeral keypair (RNG failure)
    #[error("ephemeral key generation failed")]
    KeyGenerationFailed,

    /// ECDH or the KDF run on its output failed
    #[error("key agreement failed")]
    KeyAgreementFailed,

    /// Public point bytes do not decode to a valid point on the curve
    #[error("malformed elliptic curve point")]
    MalformedPoint,

    /// Secret key bytes are not a valid scalar for the curve
    #[error("invalid secret key")]
    InvalidSecretKey,

    /// Envelope is structurally unusable (missing field, bad encoding)
    #[error("malformed envelope: {reason}")]
    MalformedEnvelope {
        /// What is wrong with the envelope
        reason: String,
    },

    /// Caller buffer cannot hold the output. Retry with `required` bytes.
    #[error("output buffer too small: need {required} bytes, got {provided}")]
    BufferTooSmall {
        /// Bytes needed (ciphertext length, an upper bound on plaintext)
        required: usize,
        /// Bytes the caller supplied
        provided: usize,
    },

    /// Symmetric encryption failed
    #[error("encryption failed")]
    EncryptionFailed,

    /// Symmetric decryption failed (including bad padding)
    #[error("decryption failed")]
    DecryptionFailed,

    /// MAC tag does not match the ciphertext (tampering or wrong key)
    #[error("MAC verification failed")]
    MacVerificationFailed,

    /// MAC could not be computed
    #[error("MAC computation failed")]
    MacComputationFailed,

    /// Buffer allocation failed
    #[error("failed to allocate {requested} bytes")]
    AllocationFailed {
        /// Size of the failed allocation
        requested: usize,
    },

    /// Message exceeds what an envelope can carry
    #[error("message too large: {size} bytes (max {max})")]
    MessageTooLarge {
        /// Plaintext size
        size: usize,
        /// Maximum permitted ciphertext size
        max: usize,
    },
}

impl EciesError {
    /// Returns true if the caller can retry the same call and succeed.
    ///
    /// Only an undersized output buffer is recoverable. Every other error is
    /// terminal for the envelope it was raised on.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::BufferTooSmall { .. })
    }

    /// Output size the caller must provide, if this is a sizing error.
    pub fn required_len(&self) -> Option<usize> {
        match self {
            Self::BufferTooSmall { required, .. } => Some(*required),
            _ => None,
        }
    }
}

/// Convert envelope decoding errors to `EciesError`
impl From<ProtocolError> for EciesError {
    fn from(err: ProtocolError) -> Self {
        Self::MalformedEnvelope { reason: err.to_string() }
    }
}
