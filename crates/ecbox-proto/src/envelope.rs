//! Ciphertext envelope and its wire encoding.
//!
//! An `Envelope` is the only artifact that travels from sender to recipient:
//! - Ephemeral public point (SEC1 compressed encoding)
//! - Ciphertext (block cipher output, or keystream XOR output)
//! - MAC tag computed over the ciphertext
//!
//! This is a pure data holder. Producing and consuming envelopes is the job
//! of the crypto layer.

use bytes::{BufMut, Bytes};

use crate::errors::{ProtocolError, Result};

/// ECIES ciphertext envelope (transport layer)
///
/// Layout on the wire:
/// `[header: 14 bytes, big-endian] + [ephemeral_point] + [ciphertext] + [mac_tag]`
///
/// # Invariants
///
/// - Size Limits: `ephemeral_point.len() <= MAX_POINT_SIZE`,
///   `mac_tag.len() <= MAX_TAG_SIZE` and
///   `ciphertext.len() <= MAX_CIPHERTEXT_SIZE`. Enforced by
///   [`Envelope::encode`] and [`Envelope::decode`].
///
/// - Exact Framing: the header lengths describe the body exactly. Decoding
///   rejects both truncated and over-long input.
///
/// # Security
///
/// Structural validity only. A decoded envelope has NOT been authenticated;
/// the MAC tag must be verified before the ciphertext is trusted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Envelope {
    /// Sender's one-time public key, SEC1 compressed point
    pub ephemeral_point: Bytes,

    /// Encrypted payload
    pub ciphertext: Bytes,

    /// MAC over `ciphertext`
    pub mac_tag: Bytes,
}

impl Envelope {
    /// Magic bytes at the start of every encoded envelope
    pub const MAGIC: [u8; 4] = *b"ECBX";

    /// Current wire format version
    pub const VERSION: u8 = 1;

    /// Size of the fixed header
    pub const HEADER_SIZE: usize = 14;

    /// Largest ephemeral point accepted (uncompressed P-521)
    pub const MAX_POINT_SIZE: usize = 133;

    /// Largest MAC tag accepted (SHA-512 digest)
    pub const MAX_TAG_SIZE: usize = 64;

    /// Largest ciphertext accepted (16 MB)
    pub const MAX_CIPHERTEXT_SIZE: usize = 16 * 1024 * 1024;

    /// Create an envelope from its three fields.
    ///
    /// No size validation happens here. Oversized envelopes are rejected by
    /// [`Envelope::encode`].
    #[must_use]
    pub fn new(
        ephemeral_point: impl Into<Bytes>,
        ciphertext: impl Into<Bytes>,
        mac_tag: impl Into<Bytes>,
    ) -> Self {
        Self {
            ephemeral_point: ephemeral_point.into(),
            ciphertext: ciphertext.into(),
            mac_tag: mac_tag.into(),
        }
    }

    /// Total number of bytes [`Envelope::encode`] writes.
    pub fn encoded_len(&self) -> usize {
        Self::HEADER_SIZE + self.ephemeral_point.len() + self.ciphertext.len() + self.mac_tag.len()
    }

    /// Check every field against its size limit.
    pub fn validate(&self) -> Result<()> {
        check_size("ephemeral_point", self.ephemeral_point.len(), Self::MAX_POINT_SIZE)?;
        check_size("mac_tag", self.mac_tag.len(), Self::MAX_TAG_SIZE)?;
        check_size("ciphertext", self.ciphertext.len(), Self::MAX_CIPHERTEXT_SIZE)?;
        Ok(())
    }

    /// Encode envelope into buffer.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::FieldTooLarge` if any field exceeds its limit
    pub fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        self.validate()?;

        dst.put_slice(&Self::MAGIC);
        dst.put_u8(Self::VERSION);
        dst.put_u8(0);
        dst.put_u16(self.ephemeral_point.len() as u16);
        dst.put_u16(self.mac_tag.len() as u16);
        dst.put_u32(self.ciphertext.len() as u32);

        dst.put_slice(&self.ephemeral_point);
        dst.put_slice(&self.ciphertext);
        dst.put_slice(&self.mac_tag);

        Ok(())
    }

    /// Encode envelope into a freshly allocated buffer.
    pub fn to_bytes(&self) -> Result<Bytes> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.encode(&mut buf)?;
        Ok(Bytes::from(buf))
    }

    /// Decode envelope from wire format.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::FrameTooShort` if the header is incomplete
    /// - `ProtocolError::InvalidMagic`, `UnsupportedVersion`,
    ///   `ReservedNonZero` for a malformed header
    /// - `ProtocolError::FieldTooLarge` if a length exceeds its limit
    /// - `ProtocolError::Truncated` / `TrailingBytes` if the body does not
    ///   match the header
    ///
    /// # Security
    ///
    /// - Fail Fast: all header validation happens before any field is copied.
    /// - Never panics: every slice is bounds-checked.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let Some(header) = bytes.get(..Self::HEADER_SIZE) else {
            return Err(ProtocolError::FrameTooShort {
                expected: Self::HEADER_SIZE,
                actual: bytes.len(),
            });
        };

        let magic = [header[0], header[1], header[2], header[3]];
        if magic != Self::MAGIC {
            return Err(ProtocolError::InvalidMagic(magic));
        }
        if header[4] != Self::VERSION {
            return Err(ProtocolError::UnsupportedVersion(header[4]));
        }
        if header[5] != 0 {
            return Err(ProtocolError::ReservedNonZero(header[5]));
        }

        let point_len = u16::from_be_bytes([header[6], header[7]]) as usize;
        let tag_len = u16::from_be_bytes([header[8], header[9]]) as usize;
        let ciphertext_len =
            u32::from_be_bytes([header[10], header[11], header[12], header[13]]) as usize;

        check_size("ephemeral_point", point_len, Self::MAX_POINT_SIZE)?;
        check_size("mac_tag", tag_len, Self::MAX_TAG_SIZE)?;
        check_size("ciphertext", ciphertext_len, Self::MAX_CIPHERTEXT_SIZE)?;

        // Bounded by the limits above, cannot overflow
        let body_len = point_len + ciphertext_len + tag_len;
        let body = &bytes[Self::HEADER_SIZE..];

        if body.len() < body_len {
            return Err(ProtocolError::Truncated { expected: body_len, actual: body.len() });
        }
        if body.len() > body_len {
            return Err(ProtocolError::TrailingBytes { count: body.len() - body_len });
        }

        let (point, rest) = body.split_at(point_len);
        let (ciphertext, tag) = rest.split_at(ciphertext_len);

        debug_assert_eq!(tag.len(), tag_len);

        Ok(Self {
            ephemeral_point: Bytes::copy_from_slice(point),
            ciphertext: Bytes::copy_from_slice(ciphertext),
            mac_tag: Bytes::copy_from_slice(tag),
        })
    }
}

fn check_size(field: &'static str, size: usize, max: usize) -> Result<()> {
    if size > max {
        return Err(ProtocolError::FieldTooLarge { field, size, max });
    }
    Ok(())
}
