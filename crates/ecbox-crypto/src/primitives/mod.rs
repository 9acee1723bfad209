//! Leaf capabilities the ECIES construction is built from.
//!
//! - [`agreement`]: EC keypairs, SEC1 point encoding, raw ECDH secrets
//! - [`kdf`]: stretching a raw secret into key material
//! - [`cipher`]: AES-CBC with PKCS#7 padding under a zero IV
//! - [`mac`]: HMAC tags over ciphertext
//!
//! None of these know about envelopes. Ordering and key handling live in
//! [`crate::ecies`].

pub mod agreement;
pub mod cipher;
pub mod kdf;
pub mod mac;

use crate::EciesError;

/// Allocate a zero-filled buffer without aborting on allocation failure.
pub(crate) fn try_alloc(len: usize) -> Result<Vec<u8>, EciesError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| EciesError::AllocationFailed { requested: len })?;
    buf.resize(len, 0);
    Ok(buf)
}
