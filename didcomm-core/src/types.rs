//! Algorithm enums, per-call options and result metadata.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::jwe::types::{ContentEncryptionAlgorithm, KeyAgreementAlgorithm};
use crate::message::FromPrior;

/// Anonymous encryption suites (ECDH-ES key agreement).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AnonCryptAlg {
    /// AES-256-CBC with HMAC-SHA-512, ECDH-ES with AES-256 key wrap
    A256cbcHs512EcdhEsA256kw,
    /// XChaCha20-Poly1305, ECDH-ES with AES-256 key wrap
    #[default]
    Xc20pEcdhEsA256kw,
    /// AES-256-GCM, ECDH-ES with AES-256 key wrap
    A256gcmEcdhEsA256kw,
}

impl AnonCryptAlg {
    pub(crate) fn content_encryption(self) -> ContentEncryptionAlgorithm {
        match self {
            Self::A256cbcHs512EcdhEsA256kw => ContentEncryptionAlgorithm::A256CbcHs512,
            Self::Xc20pEcdhEsA256kw => ContentEncryptionAlgorithm::Xc20P,
            Self::A256gcmEcdhEsA256kw => ContentEncryptionAlgorithm::A256Gcm,
        }
    }

    pub(crate) fn from_content_encryption(enc: ContentEncryptionAlgorithm) -> Self {
        match enc {
            ContentEncryptionAlgorithm::A256CbcHs512 => Self::A256cbcHs512EcdhEsA256kw,
            ContentEncryptionAlgorithm::Xc20P => Self::Xc20pEcdhEsA256kw,
            ContentEncryptionAlgorithm::A256Gcm => Self::A256gcmEcdhEsA256kw,
        }
    }
}

/// Authenticated encryption suites (ECDH-1PU key agreement).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AuthCryptAlg {
    /// AES-256-CBC with HMAC-SHA-512, ECDH-1PU with AES-256 key wrap
    #[default]
    A256cbcHs512Ecdh1puA256kw,
}

impl AuthCryptAlg {
    pub(crate) fn content_encryption(self) -> ContentEncryptionAlgorithm {
        match self {
            Self::A256cbcHs512Ecdh1puA256kw => ContentEncryptionAlgorithm::A256CbcHs512,
        }
    }

    pub(crate) fn key_agreement(self) -> KeyAgreementAlgorithm {
        match self {
            Self::A256cbcHs512Ecdh1puA256kw => KeyAgreementAlgorithm::Ecdh1puA256kw,
        }
    }
}

/// Signature algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignAlg {
    /// Ed25519
    EdDSA,
    /// ECDSA over P-256 with SHA-256
    ES256,
    /// ECDSA over secp256k1 with SHA-256
    ES256K,
}

impl SignAlg {
    /// JOSE `alg` value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EdDSA => "EdDSA",
            Self::ES256 => "ES256",
            Self::ES256K => "ES256K",
        }
    }

    /// Parses a JOSE `alg` value.
    #[must_use]
    pub fn from_jose(alg: &str) -> Option<Self> {
        match alg {
            "EdDSA" => Some(Self::EdDSA),
            "ES256" => Some(Self::ES256),
            "ES256K" => Some(Self::ES256K),
            _ => None,
        }
    }
}

impl std::fmt::Display for SignAlg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for [`crate::DIDComm::pack_encrypted`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackEncryptedOptions {
    /// Hide the sender key ID by wrapping the authcrypt envelope in anoncrypt.
    pub protect_sender: bool,
    /// Wrap the result in Forward envelopes for the recipient's routing keys.
    pub forward: bool,
    /// Extra headers merged into every Forward message produced.
    pub forward_headers: Option<BTreeMap<String, Value>>,
    /// ID of the recipient service to use instead of the first DIDComm one.
    pub messaging_service: Option<String>,
    /// Suite for authenticated encryption.
    pub enc_alg_auth: AuthCryptAlg,
    /// Suite for anonymous encryption.
    pub enc_alg_anon: AnonCryptAlg,
}

impl Default for PackEncryptedOptions {
    fn default() -> Self {
        Self {
            protect_sender: false,
            forward: true,
            forward_headers: None,
            messaging_service: None,
            enc_alg_auth: AuthCryptAlg::default(),
            enc_alg_anon: AnonCryptAlg::default(),
        }
    }
}

impl PackEncryptedOptions {
    /// Sets `protect_sender`.
    #[must_use]
    pub fn protect_sender(mut self, protect_sender: bool) -> Self {
        self.protect_sender = protect_sender;
        self
    }

    /// Sets `forward`.
    #[must_use]
    pub fn forward(mut self, forward: bool) -> Self {
        self.forward = forward;
        self
    }

    /// Sets the headers merged into Forward messages.
    #[must_use]
    pub fn forward_headers(mut self, headers: BTreeMap<String, Value>) -> Self {
        self.forward_headers = Some(headers);
        self
    }

    /// Selects a recipient service by ID.
    #[must_use]
    pub fn messaging_service(mut self, service_id: impl Into<String>) -> Self {
        self.messaging_service = Some(service_id.into());
        self
    }

    /// Sets the authcrypt suite.
    #[must_use]
    pub fn enc_alg_auth(mut self, alg: AuthCryptAlg) -> Self {
        self.enc_alg_auth = alg;
        self
    }

    /// Sets the anoncrypt suite.
    #[must_use]
    pub fn enc_alg_anon(mut self, alg: AnonCryptAlg) -> Self {
        self.enc_alg_anon = alg;
        self
    }
}

/// Options for [`crate::DIDComm::unpack`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnpackOptions {
    /// Every locally held recipient key must decrypt the envelope.
    pub expect_decrypt_by_all_keys: bool,
    /// Peel Forward envelopes addressed to keys we hold.
    pub unwrap_re_wrapping_forward: bool,
}

impl Default for UnpackOptions {
    fn default() -> Self {
        Self {
            expect_decrypt_by_all_keys: false,
            unwrap_re_wrapping_forward: true,
        }
    }
}

impl UnpackOptions {
    /// Sets `expect_decrypt_by_all_keys`.
    #[must_use]
    pub fn expect_decrypt_by_all_keys(mut self, value: bool) -> Self {
        self.expect_decrypt_by_all_keys = value;
        self
    }

    /// Sets `unwrap_re_wrapping_forward`.
    #[must_use]
    pub fn unwrap_re_wrapping_forward(mut self, value: bool) -> Self {
        self.unwrap_re_wrapping_forward = value;
        self
    }
}

/// Result metadata of a signed pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackSignedMetadata {
    /// Key ID used to sign.
    pub sign_by_kid: String,
}

/// The recipient service an encrypted message was prepared for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagingServiceMetadata {
    /// Service ID.
    pub id: String,
    /// Endpoint URI the packed message should be sent to.
    pub service_endpoint: String,
}

/// Result metadata of an encrypted pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackEncryptedMetadata {
    /// Service used, if the recipient declares one.
    pub messaging_service: Option<MessagingServiceMetadata>,
    /// Sender key ID for authcrypt.
    pub from_kid: Option<String>,
    /// Signer key ID, if signed before encryption.
    pub sign_by_kid: Option<String>,
    /// Recipient key IDs of the innermost envelope.
    pub to_kids: Vec<String>,
}

/// What unpacking found out about a message.
///
/// Flags only ever flip from `false` to `true` while layers are peeled.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UnpackMetadata {
    /// Some layer was encrypted.
    pub encrypted: bool,
    /// Sender was authenticated (authcrypt).
    pub authenticated: bool,
    /// A signature layer was verified.
    pub non_repudiation: bool,
    /// An anoncrypt layer was present.
    pub anonymous_sender: bool,
    /// A Forward envelope addressed to us was peeled.
    pub re_wrapped_in_forward: bool,
    /// Sender key ID of the authcrypt layer.
    pub encrypted_from_kid: Option<String>,
    /// Recipient key IDs of the innermost encrypted layer.
    pub encrypted_to_kids: Option<Vec<String>>,
    /// Key ID that signed the message.
    pub sign_from: Option<String>,
    /// Key ID that signed the embedded from_prior JWT.
    pub from_prior_issuer_kid: Option<String>,
    /// Authcrypt suite used.
    pub enc_alg_auth: Option<AuthCryptAlg>,
    /// Anoncrypt suite used.
    pub enc_alg_anon: Option<AnonCryptAlg>,
    /// Signature algorithm used.
    pub sign_alg: Option<SignAlg>,
    /// The verified JWS, kept for non-repudiation.
    pub signed_message: Option<String>,
    /// The verified from_prior claims.
    pub from_prior: Option<FromPrior>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_defaults() {
        let pack = PackEncryptedOptions::default();
        assert!(!pack.protect_sender);
        assert!(pack.forward);
        assert_eq!(pack.enc_alg_auth, AuthCryptAlg::A256cbcHs512Ecdh1puA256kw);
        assert_eq!(pack.enc_alg_anon, AnonCryptAlg::Xc20pEcdhEsA256kw);

        let unpack = UnpackOptions::default();
        assert!(!unpack.expect_decrypt_by_all_keys);
        assert!(unpack.unwrap_re_wrapping_forward);
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let opts: PackEncryptedOptions =
            serde_json::from_str(r#"{"protect_sender": true}"#).unwrap();
        assert!(opts.protect_sender);
        assert!(opts.forward);
    }

    #[test]
    fn test_sign_alg_names() {
        for alg in [SignAlg::EdDSA, SignAlg::ES256, SignAlg::ES256K] {
            assert_eq!(SignAlg::from_jose(alg.as_str()), Some(alg));
        }
        assert_eq!(SignAlg::from_jose("RS256"), None);
    }

    #[test]
    fn test_anon_alg_maps_to_content_cipher() {
        for alg in [
            AnonCryptAlg::A256cbcHs512EcdhEsA256kw,
            AnonCryptAlg::Xc20pEcdhEsA256kw,
            AnonCryptAlg::A256gcmEcdhEsA256kw,
        ] {
            assert_eq!(AnonCryptAlg::from_content_encryption(alg.content_encryption()), alg);
        }
    }
}
