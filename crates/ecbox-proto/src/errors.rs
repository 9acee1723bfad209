//! Error types for envelope encoding and decoding.

use thiserror::Error;

/// Result alias for envelope codec operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Structural errors in the envelope wire format.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Input shorter than the fixed header
    #[error("envelope too short: need {expected} header bytes, got {actual}")]
    FrameTooShort {
        /// Required header size
        expected: usize,
        /// Bytes available
        actual: usize,
    },

    /// Header does not start with the envelope magic
    #[error("invalid magic: {0:02x?}")]
    InvalidMagic([u8; 4]),

    /// Version byte not understood by this implementation
    #[error("unsupported envelope version: {0}")]
    UnsupportedVersion(u8),

    /// Reserved header byte is not zero
    #[error("reserved header byte must be zero, got {0:#04x}")]
    ReservedNonZero(u8),

    /// A field exceeds its size limit
    #[error("{field} too large: {size} bytes (max {max})")]
    FieldTooLarge {
        /// Name of the offending field
        field: &'static str,
        /// Claimed or actual size
        size: usize,
        /// Maximum permitted size
        max: usize,
    },

    /// Body shorter than the header claims
    #[error("envelope truncated: header claims {expected} body bytes, got {actual}")]
    Truncated {
        /// Body size claimed by the header
        expected: usize,
        /// Body bytes available
        actual: usize,
    },

    /// Extra bytes after the last field
    #[error("{count} trailing bytes after envelope")]
    TrailingBytes {
        /// Number of unexpected bytes
        count: usize,
    },
}
