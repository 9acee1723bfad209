//! Ecbox wire protocol
//!
//! Binary framing for ECIES ciphertext envelopes. An envelope carries the
//! three values a recipient needs to decrypt: the sender's ephemeral public
//! point, the ciphertext and the MAC tag over that ciphertext.
//!
//! ```text
//! ┌──────────────────────────── 14-byte header ────────────────────────────┐
//! │ magic "ECBX" │ version │ reserved │ point len │ tag len │ ciphertext len │
//! └────────────────────────────────────────────────────────────────────────┘
//! │ ephemeral point │ ciphertext │ mac tag │
//! ```
//!
//! This crate only checks structure. It knows nothing about curves, ciphers
//! or MACs; a structurally valid envelope may still fail authentication.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod envelope;
pub mod errors;

pub use envelope::Envelope;
pub use errors::{ProtocolError, Result};
