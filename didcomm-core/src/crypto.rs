//! Typed key material and the elliptic-curve primitives built on it.
//!
//! Verification methods and secrets arrive as loosely typed JWK, multibase
//! or base58 values. This module turns them into [`PublicKey`] and
//! [`PrivateKey`] so the envelope code can match on the curve instead of
//! juggling byte vectors.
//!
//! Supported curves:
//! - key agreement: `X25519`, `P-256`, `P-384`, `P-521`
//! - signing: `Ed25519` (EdDSA), `P-256` (ES256), `secp256k1` (ES256K)

use ed25519_dalek::{Signer as _, Verifier as _};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use rand_core::OsRng;
use serde_json::{json, Value};
use zeroize::Zeroizing;

use crate::did::{VerificationMaterial, VerificationMethod, VerificationMethodType};
use crate::error::{Error, Result};
use crate::secrets::{Secret, SecretMaterial, SecretType};
use crate::types::SignAlg;
use crate::utils::{b64_decode, b64_encode};

const ED25519_PUB_CODEC: [u8; 2] = [0xed, 0x01];
const X25519_PUB_CODEC: [u8; 2] = [0xec, 0x01];
const ED25519_PRIV_CODEC: [u8; 2] = [0x80, 0x26];
const X25519_PRIV_CODEC: [u8; 2] = [0x82, 0x26];

/// Curves a key can live on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Curve {
    /// Curve25519 in Montgomery form
    X25519,
    /// Curve25519 in Edwards form
    Ed25519,
    /// NIST P-256
    P256,
    /// NIST P-384
    P384,
    /// NIST P-521
    P521,
    /// secp256k1
    Secp256k1,
}

impl Curve {
    /// JWK `crv` name.
    #[must_use]
    pub fn jwk_name(&self) -> &'static str {
        match self {
            Self::X25519 => "X25519",
            Self::Ed25519 => "Ed25519",
            Self::P256 => "P-256",
            Self::P384 => "P-384",
            Self::P521 => "P-521",
            Self::Secp256k1 => "secp256k1",
        }
    }

    fn from_jwk_name(crv: &str) -> Result<Self> {
        match crv {
            "X25519" => Ok(Self::X25519),
            "Ed25519" => Ok(Self::Ed25519),
            "P-256" => Ok(Self::P256),
            "P-384" => Ok(Self::P384),
            "P-521" => Ok(Self::P521),
            "secp256k1" => Ok(Self::Secp256k1),
            other => Err(Error::Unsupported(format!("Unsupported curve `{other}`"))),
        }
    }

    /// Whether keys on this curve can be used for ECDH.
    #[must_use]
    pub fn is_key_agreement(&self) -> bool {
        matches!(self, Self::X25519 | Self::P256 | Self::P384 | Self::P521)
    }
}

impl std::fmt::Display for Curve {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.jwk_name())
    }
}

/// A public key on one of the supported curves.
#[derive(Clone, Debug)]
pub enum PublicKey {
    /// X25519
    X25519(x25519_dalek::PublicKey),
    /// Ed25519
    Ed25519(ed25519_dalek::VerifyingKey),
    /// P-256
    P256(p256::PublicKey),
    /// P-384
    P384(p384::PublicKey),
    /// P-521
    P521(p521::PublicKey),
    /// secp256k1
    Secp256k1(k256::PublicKey),
}

/// A private key on one of the supported curves.
///
/// Debug output never includes the key bytes.
#[derive(Clone)]
pub enum PrivateKey {
    /// X25519
    X25519(x25519_dalek::StaticSecret),
    /// Ed25519
    Ed25519(ed25519_dalek::SigningKey),
    /// P-256
    P256(p256::SecretKey),
    /// P-384
    P384(p384::SecretKey),
    /// P-521
    P521(p521::SecretKey),
    /// secp256k1
    Secp256k1(k256::SecretKey),
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PrivateKey({})", self.curve())
    }
}

fn fixed<const N: usize>(bytes: &[u8], what: &str) -> Result<[u8; N]> {
    bytes.try_into().map_err(|_| {
        Error::Malformed(format!(
            "Invalid {what} length: expected {N} bytes, got {}",
            bytes.len()
        ))
    })
}

fn jwk_field<'a>(jwk: &'a Value, field: &str) -> Result<&'a str> {
    jwk.get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::Malformed(format!("JWK is missing `{field}`")))
}

fn sec1_point(jwk: &Value) -> Result<Vec<u8>> {
    let x = b64_decode(jwk_field(jwk, "x")?, "JWK x")?;
    let y = b64_decode(jwk_field(jwk, "y")?, "JWK y")?;
    let mut point = Vec::with_capacity(1 + x.len() + y.len());
    point.push(0x04);
    point.extend_from_slice(&x);
    point.extend_from_slice(&y);
    Ok(point)
}

fn invalid_key(curve: Curve) -> impl FnOnce(p256::elliptic_curve::Error) -> Error {
    move |_| Error::Malformed(format!("Invalid {curve} key"))
}

fn strip_codec<'a>(bytes: &'a [u8], codec: &[u8; 2]) -> Option<&'a [u8]> {
    bytes.strip_prefix(codec.as_slice())
}

impl PublicKey {
    /// Decodes a public JWK.
    ///
    /// # Errors
    /// * `Error::Malformed` - Missing or invalid coordinates
    /// * `Error::Unsupported` - Unknown `crv`
    pub fn from_jwk(jwk: &Value) -> Result<Self> {
        let curve = Curve::from_jwk_name(jwk_field(jwk, "crv")?)?;
        match curve {
            Curve::X25519 => {
                let x = b64_decode(jwk_field(jwk, "x")?, "JWK x")?;
                Ok(Self::X25519(x25519_dalek::PublicKey::from(fixed::<32>(
                    &x, "X25519 key",
                )?)))
            }
            Curve::Ed25519 => {
                let x = b64_decode(jwk_field(jwk, "x")?, "JWK x")?;
                Self::ed25519(&x)
            }
            Curve::P256 => p256::PublicKey::from_sec1_bytes(&sec1_point(jwk)?)
                .map(Self::P256)
                .map_err(invalid_key(curve)),
            Curve::P384 => p384::PublicKey::from_sec1_bytes(&sec1_point(jwk)?)
                .map(Self::P384)
                .map_err(invalid_key(curve)),
            Curve::P521 => p521::PublicKey::from_sec1_bytes(&sec1_point(jwk)?)
                .map(Self::P521)
                .map_err(invalid_key(curve)),
            Curve::Secp256k1 => k256::PublicKey::from_sec1_bytes(&sec1_point(jwk)?)
                .map(Self::Secp256k1)
                .map_err(invalid_key(curve)),
        }
    }

    fn ed25519(bytes: &[u8]) -> Result<Self> {
        ed25519_dalek::VerifyingKey::from_bytes(&fixed::<32>(bytes, "Ed25519 key")?)
            .map(Self::Ed25519)
            .map_err(|_| Error::Malformed("Invalid Ed25519 key".into()))
    }

    fn x25519(bytes: &[u8]) -> Result<Self> {
        Ok(Self::X25519(x25519_dalek::PublicKey::from(fixed::<32>(
            bytes,
            "X25519 key",
        )?)))
    }

    /// Decodes the key material of a verification method.
    ///
    /// # Errors
    /// * `Error::Malformed` - The material does not decode to a key
    /// * `Error::Unsupported` - The material or method type is not supported
    pub fn from_verification_method(vm: &VerificationMethod) -> Result<Self> {
        match &vm.verification_material {
            VerificationMaterial::Jwk(jwk) => Self::from_jwk(jwk),
            VerificationMaterial::Multibase(value) => {
                let (_, bytes) = multibase::decode(value).map_err(|e| {
                    Error::Malformed(format!("Invalid multibase key for {}: {e}", vm.id))
                })?;
                if let Some(raw) = strip_codec(&bytes, &ED25519_PUB_CODEC) {
                    Self::ed25519(raw)
                } else if let Some(raw) = strip_codec(&bytes, &X25519_PUB_CODEC) {
                    Self::x25519(raw)
                } else {
                    Err(Error::Unsupported(format!(
                        "Unsupported multicodec key for {}",
                        vm.id
                    )))
                }
            }
            VerificationMaterial::Base58(value) => {
                let bytes = bs58::decode(value).into_vec().map_err(|e| {
                    Error::Malformed(format!("Invalid base58 key for {}: {e}", vm.id))
                })?;
                match vm.type_ {
                    VerificationMethodType::Ed25519VerificationKey2018
                    | VerificationMethodType::Ed25519VerificationKey2020 => Self::ed25519(&bytes),
                    VerificationMethodType::X25519KeyAgreementKey2019
                    | VerificationMethodType::X25519KeyAgreementKey2020 => Self::x25519(&bytes),
                    other => Err(Error::Unsupported(format!(
                        "Base58 keys are not supported for {other:?}"
                    ))),
                }
            }
        }
    }

    /// The curve of this key.
    #[must_use]
    pub fn curve(&self) -> Curve {
        match self {
            Self::X25519(_) => Curve::X25519,
            Self::Ed25519(_) => Curve::Ed25519,
            Self::P256(_) => Curve::P256,
            Self::P384(_) => Curve::P384,
            Self::P521(_) => Curve::P521,
            Self::Secp256k1(_) => Curve::Secp256k1,
        }
    }

    /// Encodes this key as a public JWK.
    #[must_use]
    pub fn to_jwk(&self) -> Value {
        fn ec(crv: Curve, point: &[u8]) -> Value {
            // Uncompressed SEC1: 0x04 || x || y
            let coords = &point[1..];
            let (x, y) = coords.split_at(coords.len() / 2);
            json!({"kty": "EC", "crv": crv.jwk_name(), "x": b64_encode(x), "y": b64_encode(y)})
        }
        match self {
            Self::X25519(key) => {
                json!({"kty": "OKP", "crv": "X25519", "x": b64_encode(key.as_bytes())})
            }
            Self::Ed25519(key) => {
                json!({"kty": "OKP", "crv": "Ed25519", "x": b64_encode(key.as_bytes())})
            }
            Self::P256(key) => ec(Curve::P256, key.to_encoded_point(false).as_bytes()),
            Self::P384(key) => ec(Curve::P384, key.to_encoded_point(false).as_bytes()),
            Self::P521(key) => ec(Curve::P521, key.to_encoded_point(false).as_bytes()),
            Self::Secp256k1(key) => ec(Curve::Secp256k1, key.to_encoded_point(false).as_bytes()),
        }
    }

    /// Verifies a raw signature over `message`.
    ///
    /// # Errors
    /// * `Error::Malformed` - The signature does not verify
    /// * `Error::NoCompatibleCrypto` - `alg` does not fit this key
    pub fn verify(&self, alg: SignAlg, message: &[u8], signature: &[u8]) -> Result<()> {
        let bad_signature = || Error::Malformed("Signature verification failed".into());
        match (self, alg) {
            (Self::Ed25519(key), SignAlg::EdDSA) => {
                let sig =
                    ed25519_dalek::Signature::from_slice(signature).map_err(|_| bad_signature())?;
                key.verify(message, &sig).map_err(|_| bad_signature())
            }
            (Self::P256(key), SignAlg::ES256) => {
                use p256::ecdsa::signature::Verifier;
                let sig = p256::ecdsa::Signature::from_slice(signature).map_err(|_| bad_signature())?;
                p256::ecdsa::VerifyingKey::from(key)
                    .verify(message, &sig)
                    .map_err(|_| bad_signature())
            }
            (Self::Secp256k1(key), SignAlg::ES256K) => {
                use k256::ecdsa::signature::Verifier;
                let sig = k256::ecdsa::Signature::from_slice(signature).map_err(|_| bad_signature())?;
                k256::ecdsa::VerifyingKey::from(key)
                    .verify(message, &sig)
                    .map_err(|_| bad_signature())
            }
            (key, alg) => Err(Error::NoCompatibleCrypto(format!(
                "{alg} cannot be used with a {} key",
                key.curve()
            ))),
        }
    }
}

impl PrivateKey {
    /// Decodes a private JWK (must carry `d`).
    ///
    /// # Errors
    /// * `Error::Malformed` - Missing or invalid `d`
    /// * `Error::Unsupported` - Unknown `crv`
    pub fn from_jwk(jwk: &Value) -> Result<Self> {
        let curve = Curve::from_jwk_name(jwk_field(jwk, "crv")?)?;
        let d = Zeroizing::new(b64_decode(jwk_field(jwk, "d")?, "JWK d")?);
        match curve {
            Curve::X25519 => Self::x25519(&d),
            Curve::Ed25519 => Self::ed25519(&d),
            Curve::P256 => p256::SecretKey::from_slice(&d)
                .map(Self::P256)
                .map_err(invalid_key(curve)),
            Curve::P384 => p384::SecretKey::from_slice(&d)
                .map(Self::P384)
                .map_err(invalid_key(curve)),
            Curve::P521 => p521::SecretKey::from_slice(&d)
                .map(Self::P521)
                .map_err(invalid_key(curve)),
            Curve::Secp256k1 => k256::SecretKey::from_slice(&d)
                .map(Self::Secp256k1)
                .map_err(invalid_key(curve)),
        }
    }

    fn x25519(bytes: &[u8]) -> Result<Self> {
        let raw = Zeroizing::new(fixed::<32>(bytes, "X25519 private key")?);
        Ok(Self::X25519(x25519_dalek::StaticSecret::from(*raw)))
    }

    fn ed25519(bytes: &[u8]) -> Result<Self> {
        // Some encodings append the public key to the 32-byte seed.
        let seed = bytes.get(..32).unwrap_or(bytes);
        let raw = Zeroizing::new(fixed::<32>(seed, "Ed25519 private key")?);
        Ok(Self::Ed25519(ed25519_dalek::SigningKey::from_bytes(&raw)))
    }

    /// Decodes the material of a secret.
    ///
    /// # Errors
    /// * `Error::Malformed` - The material does not decode to a key
    /// * `Error::Unsupported` - The material or secret type is not supported
    pub fn from_secret(secret: &Secret) -> Result<Self> {
        match &secret.secret_material {
            SecretMaterial::Jwk(jwk) => Self::from_jwk(jwk),
            SecretMaterial::Multibase(value) => {
                let (_, bytes) = multibase::decode(value).map_err(|e| {
                    Error::Malformed(format!("Invalid multibase secret {}: {e}", secret.id))
                })?;
                let bytes = Zeroizing::new(bytes);
                if let Some(raw) = strip_codec(&bytes, &ED25519_PRIV_CODEC) {
                    Self::ed25519(raw)
                } else if let Some(raw) = strip_codec(&bytes, &X25519_PRIV_CODEC) {
                    Self::x25519(raw)
                } else {
                    Err(Error::Unsupported(format!(
                        "Unsupported multicodec secret {}",
                        secret.id
                    )))
                }
            }
            SecretMaterial::Base58(value) => {
                let bytes = Zeroizing::new(bs58::decode(value).into_vec().map_err(|e| {
                    Error::Malformed(format!("Invalid base58 secret {}: {e}", secret.id))
                })?);
                match secret.type_ {
                    SecretType::Ed25519VerificationKey2018
                    | SecretType::Ed25519VerificationKey2020 => Self::ed25519(&bytes),
                    SecretType::X25519KeyAgreementKey2019
                    | SecretType::X25519KeyAgreementKey2020 => Self::x25519(&bytes),
                    other => Err(Error::Unsupported(format!(
                        "Base58 secrets are not supported for {other:?}"
                    ))),
                }
            }
        }
    }

    /// Generates a fresh key, used for ephemeral ECDH keys and test fixtures.
    #[must_use]
    pub fn generate(curve: Curve) -> Self {
        match curve {
            Curve::X25519 => Self::X25519(x25519_dalek::StaticSecret::random_from_rng(OsRng)),
            Curve::Ed25519 => Self::Ed25519(ed25519_dalek::SigningKey::generate(&mut OsRng)),
            Curve::P256 => Self::P256(p256::SecretKey::random(&mut OsRng)),
            Curve::P384 => Self::P384(p384::SecretKey::random(&mut OsRng)),
            Curve::P521 => Self::P521(p521::SecretKey::random(&mut OsRng)),
            Curve::Secp256k1 => Self::Secp256k1(k256::SecretKey::random(&mut OsRng)),
        }
    }

    /// The curve of this key.
    #[must_use]
    pub fn curve(&self) -> Curve {
        match self {
            Self::X25519(_) => Curve::X25519,
            Self::Ed25519(_) => Curve::Ed25519,
            Self::P256(_) => Curve::P256,
            Self::P384(_) => Curve::P384,
            Self::P521(_) => Curve::P521,
            Self::Secp256k1(_) => Curve::Secp256k1,
        }
    }

    /// The matching public key.
    #[must_use]
    pub fn public_key(&self) -> PublicKey {
        match self {
            Self::X25519(key) => PublicKey::X25519(x25519_dalek::PublicKey::from(key)),
            Self::Ed25519(key) => PublicKey::Ed25519(key.verifying_key()),
            Self::P256(key) => PublicKey::P256(key.public_key()),
            Self::P384(key) => PublicKey::P384(key.public_key()),
            Self::P521(key) => PublicKey::P521(key.public_key()),
            Self::Secp256k1(key) => PublicKey::Secp256k1(key.public_key()),
        }
    }

    /// Encodes this key as a private JWK.
    #[must_use]
    pub fn to_jwk(&self) -> Value {
        let d = match self {
            Self::X25519(key) => b64_encode(key.to_bytes()),
            Self::Ed25519(key) => b64_encode(key.to_bytes()),
            Self::P256(key) => b64_encode(key.to_bytes()),
            Self::P384(key) => b64_encode(key.to_bytes()),
            Self::P521(key) => b64_encode(key.to_bytes()),
            Self::Secp256k1(key) => b64_encode(key.to_bytes()),
        };
        let mut jwk = self.public_key().to_jwk();
        jwk["d"] = Value::String(d);
        jwk
    }

    /// Raw ECDH shared secret with `public`.
    ///
    /// # Errors
    /// * `Error::NoCompatibleCrypto` - The keys are on different curves or
    ///   the curve does not support key agreement
    /// * `Error::Malformed` - An X25519 peer key of low order
    pub fn diffie_hellman(&self, public: &PublicKey) -> Result<Zeroizing<Vec<u8>>> {
        let shared = match (self, public) {
            (Self::X25519(sk), PublicKey::X25519(pk)) => {
                let shared = sk.diffie_hellman(pk);
                if !shared.was_contributory() {
                    return Err(Error::Malformed(
                        "X25519 public key is of low order".into(),
                    ));
                }
                shared.as_bytes().to_vec()
            }
            (Self::P256(sk), PublicKey::P256(pk)) => {
                p256::ecdh::diffie_hellman(sk.to_nonzero_scalar(), pk.as_affine())
                    .raw_secret_bytes()
                    .to_vec()
            }
            (Self::P384(sk), PublicKey::P384(pk)) => {
                p384::ecdh::diffie_hellman(sk.to_nonzero_scalar(), pk.as_affine())
                    .raw_secret_bytes()
                    .to_vec()
            }
            (Self::P521(sk), PublicKey::P521(pk)) => {
                p521::ecdh::diffie_hellman(sk.to_nonzero_scalar(), pk.as_affine())
                    .raw_secret_bytes()
                    .to_vec()
            }
            (sk, pk) => {
                return Err(Error::NoCompatibleCrypto(format!(
                    "Key agreement between {} and {} keys is not supported",
                    sk.curve(),
                    pk.curve()
                )))
            }
        };
        Ok(Zeroizing::new(shared))
    }

    /// The signature algorithm this key signs with.
    ///
    /// # Errors
    /// * `Error::Unsupported` - The curve cannot sign
    pub fn sign_alg(&self) -> Result<SignAlg> {
        match self {
            Self::Ed25519(_) => Ok(SignAlg::EdDSA),
            Self::P256(_) => Ok(SignAlg::ES256),
            Self::Secp256k1(_) => Ok(SignAlg::ES256K),
            other => Err(Error::Unsupported(format!(
                "No signature algorithm for {} keys",
                other.curve()
            ))),
        }
    }

    /// Signs `message`, returning the algorithm and the raw signature.
    ///
    /// ECDSA signatures are the fixed-size `r || s` form JOSE expects.
    ///
    /// # Errors
    /// * `Error::Unsupported` - The curve cannot sign
    pub fn sign(&self, message: &[u8]) -> Result<(SignAlg, Vec<u8>)> {
        match self {
            Self::Ed25519(key) => Ok((SignAlg::EdDSA, key.sign(message).to_bytes().to_vec())),
            Self::P256(key) => {
                use p256::ecdsa::signature::Signer;
                let sig: p256::ecdsa::Signature =
                    p256::ecdsa::SigningKey::from(key).sign(message);
                Ok((SignAlg::ES256, sig.to_bytes().to_vec()))
            }
            Self::Secp256k1(key) => {
                use k256::ecdsa::signature::Signer;
                let sig: k256::ecdsa::Signature =
                    k256::ecdsa::SigningKey::from(key).sign(message);
                Ok((SignAlg::ES256K, sig.to_bytes().to_vec()))
            }
            other => Err(Error::Unsupported(format!(
                "No signature algorithm for {} keys",
                other.curve()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwk_roundtrip_all_curves() {
        for curve in [
            Curve::X25519,
            Curve::Ed25519,
            Curve::P256,
            Curve::P384,
            Curve::P521,
            Curve::Secp256k1,
        ] {
            let key = PrivateKey::generate(curve);
            let restored = PrivateKey::from_jwk(&key.to_jwk()).unwrap();
            assert_eq!(restored.curve(), curve);

            let public = PublicKey::from_jwk(&key.public_key().to_jwk()).unwrap();
            assert_eq!(public.to_jwk(), key.public_key().to_jwk());
        }
    }

    #[test]
    fn test_key_agreement() {
        for curve in [Curve::X25519, Curve::P256, Curve::P384, Curve::P521] {
            let alice = PrivateKey::generate(curve);
            let bob = PrivateKey::generate(curve);

            let shared_a = alice.diffie_hellman(&bob.public_key()).unwrap();
            let shared_b = bob.diffie_hellman(&alice.public_key()).unwrap();
            assert_eq!(*shared_a, *shared_b);
        }
    }

    #[test]
    fn test_key_agreement_curve_mismatch() {
        let alice = PrivateKey::generate(Curve::X25519);
        let bob = PrivateKey::generate(Curve::P256);
        let err = alice.diffie_hellman(&bob.public_key()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::NoCompatibleCrypto);

        let signer = PrivateKey::generate(Curve::Ed25519);
        assert!(signer.diffie_hellman(&signer.public_key()).is_err());
    }

    #[test]
    fn test_x25519_low_order_point_rejected() {
        let alice = PrivateKey::generate(Curve::X25519);
        let identity = PublicKey::X25519(x25519_dalek::PublicKey::from([0u8; 32]));
        let err = alice.diffie_hellman(&identity).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Malformed);
    }

    #[test]
    fn test_sign_verify() {
        for (curve, expected) in [
            (Curve::Ed25519, SignAlg::EdDSA),
            (Curve::P256, SignAlg::ES256),
            (Curve::Secp256k1, SignAlg::ES256K),
        ] {
            let key = PrivateKey::generate(curve);
            let (alg, sig) = key.sign(b"hello").unwrap();
            assert_eq!(alg, expected);
            assert_eq!(sig.len(), 64);
            key.public_key().verify(alg, b"hello", &sig).unwrap();

            let err = key.public_key().verify(alg, b"tampered", &sig).unwrap_err();
            assert_eq!(err.kind(), crate::error::ErrorKind::Malformed);
        }
    }

    #[test]
    fn test_sign_unsupported_curve() {
        let key = PrivateKey::generate(Curve::X25519);
        assert_eq!(
            key.sign(b"hello").unwrap_err().kind(),
            crate::error::ErrorKind::Unsupported
        );
    }

    #[test]
    fn test_multibase_and_base58_keys() {
        let signing = PrivateKey::generate(Curve::Ed25519);
        let PublicKey::Ed25519(verifying) = signing.public_key() else {
            panic!("expected an Ed25519 key");
        };
        let mut prefixed = ED25519_PUB_CODEC.to_vec();
        prefixed.extend_from_slice(verifying.as_bytes());

        let vm = VerificationMethod {
            id: "did:example:alice#key-1".into(),
            type_: VerificationMethodType::Ed25519VerificationKey2020,
            controller: "did:example:alice".into(),
            verification_material: VerificationMaterial::Multibase(multibase::encode(
                multibase::Base::Base58Btc,
                &prefixed,
            )),
        };
        let decoded = PublicKey::from_verification_method(&vm).unwrap();
        assert_eq!(decoded.to_jwk(), signing.public_key().to_jwk());

        let vm = VerificationMethod {
            verification_material: VerificationMaterial::Base58(
                bs58::encode(verifying.as_bytes()).into_string(),
            ),
            type_: VerificationMethodType::Ed25519VerificationKey2018,
            ..vm
        };
        let decoded = PublicKey::from_verification_method(&vm).unwrap();
        assert_eq!(decoded.curve(), Curve::Ed25519);
    }

    #[test]
    fn test_private_key_debug_is_redacted() {
        let key = PrivateKey::generate(Curve::X25519);
        assert_eq!(format!("{key:?}"), "PrivateKey(X25519)");
    }
}
