//! Elliptic curve key agreement
//!
//! [`KeyAgreement`] is the capability the ECIES core consumes: keypair
//! generation, SEC1 point encoding, and raw ECDH. [`Sec1Curve`] implements it
//! once for every RustCrypto short-Weierstrass curve; [`P256`], [`P384`] and
//! [`K256`] are the instantiations this crate ships.
//!
//! [`EcSecretKey`] and [`EcPublicKey`] wrap the concrete keys so callers can
//! pick a curve at runtime.

use core::{fmt, marker::PhantomData};

use elliptic_curve::{
    AffinePoint, CurveArithmetic, FieldBytes, FieldBytesSize, PublicKey, SecretKey,
    ecdh::diffie_hellman,
    sec1::{FromEncodedPoint, ModulusSize, ToEncodedPoint},
};
use k256::Secp256k1;
use p256::NistP256;
use p384::NistP384;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, Zeroizing};

use crate::EciesError;

/// Scalar sampling attempts before giving up.
///
/// A uniformly random field element is out of range with probability below
/// 2^-32 for every supported curve.
const MAX_KEYGEN_ATTEMPTS: usize = 64;

/// Curves this crate can agree keys on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Curve {
    /// NIST P-256 (secp256r1)
    P256,
    /// NIST P-384 (secp384r1)
    P384,
    /// secp256k1
    K256,
}

impl Curve {
    /// Canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Self::P256 => "p256",
            Self::P384 => "p384",
            Self::K256 => "k256",
        }
    }

    /// Length of a SEC1 compressed point on this curve.
    pub const fn compressed_point_len(self) -> usize {
        match self {
            Self::P256 | Self::K256 => 33,
            Self::P384 => 49,
        }
    }

    /// True when `bytes` has the shape of a SEC1 compressed point on this
    /// curve: the exact length and a `0x02`/`0x03` tag.
    ///
    /// Curve membership is not checked here.
    pub fn is_compressed_encoding(self, bytes: &[u8]) -> bool {
        bytes.len() == self.compressed_point_len() && matches!(bytes.first(), Some(0x02 | 0x03))
    }

    /// Length of a serialized secret scalar on this curve.
    pub const fn secret_len(self) -> usize {
        match self {
            Self::P256 | Self::K256 => 32,
            Self::P384 => 48,
        }
    }
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Key agreement capability consumed by ECIES.
pub trait KeyAgreement {
    /// Static or ephemeral secret key
    type SecretKey;
    /// Public key (curve point)
    type PublicKey;

    /// Curve identifier, used for logging and dispatch
    const CURVE: Curve;

    /// Generate a fresh keypair from `rng`.
    ///
    /// # Errors
    ///
    /// - `KeyGenerationFailed`: the RNG failed or never produced a valid scalar
    fn generate_keypair<R: RngCore + CryptoRng>(
        rng: &mut R,
    ) -> Result<(Self::SecretKey, Self::PublicKey), EciesError>;

    /// SEC1 compressed encoding of `public`.
    fn serialize_public(public: &Self::PublicKey) -> Vec<u8>;

    /// Parse a SEC1 point (compressed or uncompressed).
    ///
    /// # Errors
    ///
    /// - `MalformedPoint`: bad length or tag, not on the curve, or identity
    fn deserialize_public(bytes: &[u8]) -> Result<Self::PublicKey, EciesError>;

    /// Raw ECDH shared secret (the x-coordinate of `secret * public`).
    ///
    /// # Errors
    ///
    /// - `KeyAgreementFailed`: the shared secret is all zero bytes
    fn shared_secret(
        secret: &Self::SecretKey,
        public: &Self::PublicKey,
    ) -> Result<Zeroizing<Vec<u8>>, EciesError>;
}

/// Ties a RustCrypto curve type to its [`Curve`] identifier.
pub trait NamedCurve {
    /// Identifier of this curve
    const ID: Curve;
}

impl NamedCurve for NistP256 {
    const ID: Curve = Curve::P256;
}

impl NamedCurve for NistP384 {
    const ID: Curve = Curve::P384;
}

impl NamedCurve for Secp256k1 {
    const ID: Curve = Curve::K256;
}

/// [`KeyAgreement`] over any RustCrypto curve with SEC1 point encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sec1Curve<C>(PhantomData<C>);

/// NIST P-256 key agreement
pub type P256 = Sec1Curve<NistP256>;
/// NIST P-384 key agreement
pub type P384 = Sec1Curve<NistP384>;
/// secp256k1 key agreement
pub type K256 = Sec1Curve<Secp256k1>;

impl<C> KeyAgreement for Sec1Curve<C>
where
    C: NamedCurve + CurveArithmetic,
    FieldBytesSize<C>: ModulusSize,
    AffinePoint<C>: FromEncodedPoint<C> + ToEncodedPoint<C>,
{
    type SecretKey = SecretKey<C>;
    type PublicKey = PublicKey<C>;

    const CURVE: Curve = C::ID;

    fn generate_keypair<R: RngCore + CryptoRng>(
        rng: &mut R,
    ) -> Result<(Self::SecretKey, Self::PublicKey), EciesError> {
        let mut bytes = FieldBytes::<C>::default();

        for _ in 0..MAX_KEYGEN_ATTEMPTS {
            if rng.try_fill_bytes(bytes.as_mut_slice()).is_err() {
                bytes.as_mut_slice().zeroize();
                return Err(EciesError::KeyGenerationFailed);
            }

            // Rejects zero and values >= the group order
            if let Ok(secret) = SecretKey::<C>::from_bytes(&bytes) {
                bytes.as_mut_slice().zeroize();
                let public = secret.public_key();
                return Ok((secret, public));
            }
        }

        bytes.as_mut_slice().zeroize();
        Err(EciesError::KeyGenerationFailed)
    }

    fn serialize_public(public: &Self::PublicKey) -> Vec<u8> {
        public.to_encoded_point(true).as_bytes().to_vec()
    }

    fn deserialize_public(bytes: &[u8]) -> Result<Self::PublicKey, EciesError> {
        // Compressed or uncompressed only; the compact form drops the y parity
        if !matches!(bytes.first(), Some(0x02..=0x04)) {
            return Err(EciesError::MalformedPoint);
        }
        PublicKey::<C>::from_sec1_bytes(bytes).map_err(|_| EciesError::MalformedPoint)
    }

    fn shared_secret(
        secret: &Self::SecretKey,
        public: &Self::PublicKey,
    ) -> Result<Zeroizing<Vec<u8>>, EciesError> {
        let shared = diffie_hellman(secret.to_nonzero_scalar(), public.as_affine());
        let raw = Zeroizing::new(shared.raw_secret_bytes().to_vec());

        let zero = Zeroizing::new(vec![0u8; raw.len()]);
        if bool::from(raw.as_slice().ct_eq(zero.as_slice())) {
            return Err(EciesError::KeyAgreementFailed);
        }

        Ok(raw)
    }
}

/// Public key on one of the supported curves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EcPublicKey {
    /// NIST P-256 point
    P256(p256::PublicKey),
    /// NIST P-384 point
    P384(p384::PublicKey),
    /// secp256k1 point
    K256(k256::PublicKey),
}

impl EcPublicKey {
    /// Curve this key lives on.
    pub fn curve(&self) -> Curve {
        match self {
            Self::P256(_) => Curve::P256,
            Self::P384(_) => Curve::P384,
            Self::K256(_) => Curve::K256,
        }
    }

    /// Parse a SEC1-encoded point on `curve`.
    ///
    /// # Errors
    ///
    /// - `MalformedPoint`: `bytes` is not a valid point on `curve`
    pub fn from_sec1_bytes(curve: Curve, bytes: &[u8]) -> Result<Self, EciesError> {
        match curve {
            Curve::P256 => P256::deserialize_public(bytes).map(Self::P256),
            Curve::P384 => P384::deserialize_public(bytes).map(Self::P384),
            Curve::K256 => K256::deserialize_public(bytes).map(Self::K256),
        }
    }

    /// SEC1 compressed encoding.
    pub fn to_sec1_bytes(&self) -> Vec<u8> {
        match self {
            Self::P256(key) => P256::serialize_public(key),
            Self::P384(key) => P384::serialize_public(key),
            Self::K256(key) => K256::serialize_public(key),
        }
    }
}

/// Secret key on one of the supported curves.
///
/// The underlying scalars zeroize on drop.
#[derive(Clone)]
pub enum EcSecretKey {
    /// NIST P-256 scalar
    P256(p256::SecretKey),
    /// NIST P-384 scalar
    P384(p384::SecretKey),
    /// secp256k1 scalar
    K256(k256::SecretKey),
}

impl EcSecretKey {
    /// Generate a random secret key on `curve`.
    ///
    /// # Errors
    ///
    /// - `KeyGenerationFailed`: the RNG failed
    pub fn generate<R: RngCore + CryptoRng>(curve: Curve, rng: &mut R) -> Result<Self, EciesError> {
        match curve {
            Curve::P256 => P256::generate_keypair(rng).map(|(secret, _)| Self::P256(secret)),
            Curve::P384 => P384::generate_keypair(rng).map(|(secret, _)| Self::P384(secret)),
            Curve::K256 => K256::generate_keypair(rng).map(|(secret, _)| Self::K256(secret)),
        }
    }

    /// Parse a big-endian scalar on `curve`.
    ///
    /// # Errors
    ///
    /// - `InvalidSecretKey`: wrong length, zero, or not below the group order
    pub fn from_bytes(curve: Curve, bytes: &[u8]) -> Result<Self, EciesError> {
        if bytes.len() != curve.secret_len() {
            return Err(EciesError::InvalidSecretKey);
        }

        match curve {
            Curve::P256 => p256::SecretKey::from_slice(bytes).map(Self::P256),
            Curve::P384 => p384::SecretKey::from_slice(bytes).map(Self::P384),
            Curve::K256 => k256::SecretKey::from_slice(bytes).map(Self::K256),
        }
        .map_err(|_| EciesError::InvalidSecretKey)
    }

    /// Big-endian scalar bytes.
    pub fn to_bytes(&self) -> Zeroizing<Vec<u8>> {
        match self {
            Self::P256(key) => scalar_bytes(key),
            Self::P384(key) => scalar_bytes(key),
            Self::K256(key) => scalar_bytes(key),
        }
    }

    /// Matching public key.
    pub fn public_key(&self) -> EcPublicKey {
        match self {
            Self::P256(key) => EcPublicKey::P256(key.public_key()),
            Self::P384(key) => EcPublicKey::P384(key.public_key()),
            Self::K256(key) => EcPublicKey::K256(key.public_key()),
        }
    }

    /// Curve this key lives on.
    pub fn curve(&self) -> Curve {
        match self {
            Self::P256(_) => Curve::P256,
            Self::P384(_) => Curve::P384,
            Self::K256(_) => Curve::K256,
        }
    }
}

impl fmt::Debug for EcSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EcSecretKey")
            .field("curve", &self.curve())
            .field("scalar", &"[REDACTED]")
            .finish()
    }
}

fn scalar_bytes<C: elliptic_curve::Curve>(key: &SecretKey<C>) -> Zeroizing<Vec<u8>> {
    let mut bytes = key.to_bytes();
    let out = Zeroizing::new(bytes.to_vec());
    bytes.as_mut_slice().zeroize();
    out
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::OsRng};
    use rand_chacha::ChaCha20Rng;

    use super::*;

    /// RNG that always reports failure
    struct FailingRng;

    impl RngCore for FailingRng {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }

        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand::Error> {
            Err(rand::Error::new("entropy source unavailable"))
        }
    }

    impl CryptoRng for FailingRng {}

    /// RNG that only ever yields the all-ones pattern, which exceeds every
    /// supported group order
    struct SaturatedRng;

    impl RngCore for SaturatedRng {
        fn next_u32(&mut self) -> u32 {
            u32::MAX
        }

        fn next_u64(&mut self) -> u64 {
            u64::MAX
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0xFF);
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    impl CryptoRng for SaturatedRng {}

    fn agree<K: KeyAgreement>() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let (alice_sk, alice_pk) = K::generate_keypair(&mut rng).unwrap();
        let (bob_sk, bob_pk) = K::generate_keypair(&mut rng).unwrap();

        let ab = K::shared_secret(&alice_sk, &bob_pk).unwrap();
        let ba = K::shared_secret(&bob_sk, &alice_pk).unwrap();
        assert_eq!(ab.as_slice(), ba.as_slice(), "{}", K::CURVE);
    }

    #[test]
    fn ecdh_is_symmetric_on_every_curve() {
        agree::<P256>();
        agree::<P384>();
        agree::<K256>();
    }

    #[test]
    fn serialized_points_are_compressed() {
        let mut rng = OsRng;
        for curve in [Curve::P256, Curve::P384, Curve::K256] {
            let public = EcSecretKey::generate(curve, &mut rng).unwrap().public_key();
            let encoded = public.to_sec1_bytes();

            assert_eq!(encoded.len(), curve.compressed_point_len(), "{curve}");
            assert!(matches!(encoded[0], 0x02 | 0x03), "{curve}");
            assert_eq!(EcPublicKey::from_sec1_bytes(curve, &encoded).unwrap(), public);
        }
    }

    #[test]
    fn uncompressed_points_are_accepted() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let (_, public) = P256::generate_keypair(&mut rng).unwrap();
        let uncompressed = public.to_encoded_point(false);

        let parsed = P256::deserialize_public(uncompressed.as_bytes()).unwrap();
        assert_eq!(parsed, public);
    }

    #[test]
    fn malformed_points_are_rejected() {
        // Identity, bad tag, truncated, and x not on the curve
        let identity = [0x00];
        let mut bad_tag = [0u8; 33];
        bad_tag[0] = 0x05;
        let mut valid = P256::serialize_public(
            &P256::generate_keypair(&mut ChaCha20Rng::seed_from_u64(2)).unwrap().1,
        );
        valid.truncate(20);

        for bytes in [&identity[..], &bad_tag[..], &valid[..], &[][..]] {
            assert_eq!(P256::deserialize_public(bytes), Err(EciesError::MalformedPoint));
        }
    }

    #[test]
    fn compact_tag_is_rejected() {
        let mut rng = ChaCha20Rng::seed_from_u64(4);
        let (_, public) = P256::generate_keypair(&mut rng).unwrap();
        let mut encoded = P256::serialize_public(&public);
        encoded[0] = 0x05;

        assert_eq!(P256::deserialize_public(&encoded), Err(EciesError::MalformedPoint));
    }

    #[test]
    fn compressed_encoding_shape() {
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let (_, public) = P256::generate_keypair(&mut rng).unwrap();
        let compressed = P256::serialize_public(&public);
        let uncompressed = public.to_encoded_point(false);

        assert!(Curve::P256.is_compressed_encoding(&compressed));
        assert!(!Curve::P384.is_compressed_encoding(&compressed));
        assert!(!Curve::P256.is_compressed_encoding(uncompressed.as_bytes()));
        assert!(!Curve::P256.is_compressed_encoding(&[]));

        let mut retagged = compressed.clone();
        retagged[0] = 0x05;
        assert!(!Curve::P256.is_compressed_encoding(&retagged));
    }

    #[test]
    fn points_do_not_cross_curves() {
        let p384 = EcSecretKey::generate(Curve::P384, &mut OsRng).unwrap().public_key();
        let result = EcPublicKey::from_sec1_bytes(Curve::P256, &p384.to_sec1_bytes());
        assert_eq!(result, Err(EciesError::MalformedPoint));
    }

    #[test]
    fn failing_rng_is_key_generation_failure() {
        let result = P256::generate_keypair(&mut FailingRng);
        assert!(matches!(result, Err(EciesError::KeyGenerationFailed)));
    }

    #[test]
    fn out_of_range_scalars_exhaust_attempts() {
        let result = P384::generate_keypair(&mut SaturatedRng);
        assert!(matches!(result, Err(EciesError::KeyGenerationFailed)));
    }

    #[test]
    fn secret_key_bytes_roundtrip() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        for curve in [Curve::P256, Curve::P384, Curve::K256] {
            let secret = EcSecretKey::generate(curve, &mut rng).unwrap();
            let bytes = secret.to_bytes();
            assert_eq!(bytes.len(), curve.secret_len());

            let parsed = EcSecretKey::from_bytes(curve, &bytes).unwrap();
            assert_eq!(parsed.public_key(), secret.public_key());
        }
    }

    #[test]
    fn invalid_secret_keys_are_rejected() {
        assert!(matches!(
            EcSecretKey::from_bytes(Curve::P256, &[0u8; 32]),
            Err(EciesError::InvalidSecretKey)
        ));
        assert!(matches!(
            EcSecretKey::from_bytes(Curve::P256, &[0xFF; 32]),
            Err(EciesError::InvalidSecretKey)
        ));
        assert!(matches!(
            EcSecretKey::from_bytes(Curve::P384, &[1u8; 32]),
            Err(EciesError::InvalidSecretKey)
        ));
    }

    #[test]
    fn debug_redacts_scalar() {
        let secret = EcSecretKey::from_bytes(Curve::K256, &[0x42; 32]).unwrap();
        let rendered = format!("{secret:?}");

        assert!(rendered.contains("REDACTED"));
        assert!(!rendered.contains("42"));
    }
}
