//! JWE protected header.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use super::error::{JweError, Result};
use super::types::{ContentEncryptionAlgorithm, KeyAgreementAlgorithm};
use crate::crypto::PublicKey;
use crate::utils::b64_encode;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

/// Media type of an encrypted DIDComm message.
pub const ENCRYPTED_TYP: &str = "application/didcomm-encrypted+json";

/// The protected header shared by all recipients of a JWE.
///
/// `alg` and `enc` are kept as strings so an unknown value is reported as an
/// unsupported algorithm rather than as a parse error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtectedHeader {
    /// Media type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,

    /// The key agreement algorithm
    pub alg: String,

    /// The content encryption algorithm
    pub enc: String,

    /// The sender key ID (authcrypt only, absent when the sender is protected)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skid: Option<String>,

    /// Agreement PartyUInfo: base64url of the sender key ID (authcrypt only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apu: Option<String>,

    /// Agreement PartyVInfo: base64url digest of the recipient key IDs
    pub apv: String,

    /// The ephemeral public key as a JWK
    pub epk: Value,
}

impl ProtectedHeader {
    /// Creates a header for anoncrypt (ECDH-ES+A256KW).
    #[must_use]
    pub fn new_anoncrypt(enc: ContentEncryptionAlgorithm, epk: &PublicKey, apv: String) -> Self {
        Self {
            typ: Some(ENCRYPTED_TYP.to_string()),
            alg: KeyAgreementAlgorithm::EcdhEsA256kw.as_str().to_string(),
            enc: enc.as_str().to_string(),
            skid: None,
            apu: None,
            apv,
            epk: epk.to_jwk(),
        }
    }

    /// Creates a header for authcrypt (ECDH-1PU+A256KW).
    ///
    /// `apu` always carries the sender key ID; `skid` only when the sender
    /// is not protected.
    #[must_use]
    pub fn new_authcrypt(
        enc: ContentEncryptionAlgorithm,
        epk: &PublicKey,
        apv: String,
        sender_kid: &str,
        protect_sender: bool,
    ) -> Self {
        Self {
            typ: Some(ENCRYPTED_TYP.to_string()),
            alg: KeyAgreementAlgorithm::Ecdh1puA256kw.as_str().to_string(),
            enc: enc.as_str().to_string(),
            skid: (!protect_sender).then(|| sender_kid.to_string()),
            apu: Some(b64_encode(sender_kid)),
            apv,
            epk: epk.to_jwk(),
        }
    }

    /// Serializes the header to its base64url form.
    ///
    /// # Errors
    /// * `JweError::Serialization` - If the header cannot be serialized
    pub fn encode(&self) -> Result<String> {
        Ok(b64_encode(serde_json::to_vec(self)?))
    }

    /// Parses a header from its base64url form.
    ///
    /// # Errors
    /// * `JweError::Base64` - If the value is not base64url
    /// * `JweError::Serialization` - If the decoded bytes are not a header
    pub fn decode(encoded: &str) -> Result<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|e| JweError::Base64("protected header", e))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Parsed `alg`.
    ///
    /// # Errors
    /// * `JweError::UnsupportedAlgorithm` - Unknown `alg`
    pub fn key_agreement(&self) -> Result<KeyAgreementAlgorithm> {
        self.alg.parse()
    }

    /// Parsed `enc`.
    ///
    /// # Errors
    /// * `JweError::UnsupportedAlgorithm` - Unknown `enc`
    pub fn content_encryption(&self) -> Result<ContentEncryptionAlgorithm> {
        self.enc.parse()
    }

    /// Sender key ID carried in `apu`, if any.
    ///
    /// # Errors
    /// * `JweError::Base64` / `JweError::Header` - `apu` does not decode
    pub fn apu_kid(&self) -> Result<Option<String>> {
        let Some(apu) = self.apu.as_deref() else {
            return Ok(None);
        };
        let bytes = URL_SAFE_NO_PAD
            .decode(apu)
            .map_err(|e| JweError::Base64("apu", e))?;
        String::from_utf8(bytes)
            .map(Some)
            .map_err(|_| JweError::Header("`apu` is not UTF-8".into()))
    }

    /// Sender key ID: `skid`, or `apu` decoded when `skid` is absent.
    ///
    /// When both are present they must agree.
    ///
    /// # Errors
    /// * `JweError::Header` - Neither carries a usable key ID, or they differ
    pub fn sender_kid(&self) -> Result<String> {
        match (&self.skid, self.apu_kid()?) {
            (Some(skid), Some(apu)) if *skid != apu => {
                Err(JweError::Header("`skid` and `apu` disagree".into()))
            }
            (Some(skid), _) => Ok(skid.clone()),
            (None, Some(apu)) => Ok(apu),
            (None, None) => Err(JweError::Header("Missing both `skid` and `apu`".into())),
        }
    }

    /// The decoded ephemeral public key.
    ///
    /// # Errors
    /// * `JweError::InvalidKey` - `epk` is not a usable key
    pub fn ephemeral_key(&self) -> Result<PublicKey> {
        PublicKey::from_jwk(&self.epk).map_err(|e| JweError::InvalidKey(format!("epk: {e}")))
    }
}

/// Computes `apv` from the recipient key IDs.
///
/// The kids are sorted and joined with `.` before hashing, so the value does
/// not depend on recipient order.
#[must_use]
pub fn compute_apv<S: AsRef<str>>(kids: &[S]) -> String {
    let mut sorted: Vec<&str> = kids.iter().map(AsRef::as_ref).collect();
    sorted.sort_unstable();
    b64_encode(Sha256::digest(sorted.join(".").as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{Curve, PrivateKey};

    #[test]
    fn test_header_roundtrip() {
        let epk = PrivateKey::generate(Curve::X25519).public_key();
        let header = ProtectedHeader::new_authcrypt(
            ContentEncryptionAlgorithm::A256CbcHs512,
            &epk,
            compute_apv(&["did:example:bob#key-1"]),
            "did:example:alice#key-x25519-1",
            false,
        );

        let decoded = ProtectedHeader::decode(&header.encode().unwrap()).unwrap();
        assert_eq!(decoded, header);
        assert_eq!(decoded.key_agreement().unwrap(), KeyAgreementAlgorithm::Ecdh1puA256kw);
        assert_eq!(decoded.sender_kid().unwrap(), "did:example:alice#key-x25519-1");
        assert_eq!(decoded.ephemeral_key().unwrap().curve(), Curve::X25519);
    }

    #[test]
    fn test_protected_sender_falls_back_to_apu() {
        let epk = PrivateKey::generate(Curve::P256).public_key();
        let header = ProtectedHeader::new_authcrypt(
            ContentEncryptionAlgorithm::A256CbcHs512,
            &epk,
            compute_apv(&["did:example:bob#key-p256-1"]),
            "did:example:alice#key-p256-1",
            true,
        );
        assert!(header.skid.is_none());
        assert_eq!(header.sender_kid().unwrap(), "did:example:alice#key-p256-1");
    }

    #[test]
    fn test_skid_apu_mismatch_rejected() {
        let epk = PrivateKey::generate(Curve::X25519).public_key();
        let mut header = ProtectedHeader::new_authcrypt(
            ContentEncryptionAlgorithm::A256CbcHs512,
            &epk,
            compute_apv(&["did:example:bob#key-x25519-1"]),
            "did:example:alice#key-x25519-1",
            false,
        );
        header.skid = Some("did:example:mallory#key-x25519-1".into());
        assert!(matches!(header.sender_kid(), Err(JweError::Header(_))));
    }

    #[test]
    fn test_apv_ignores_recipient_order() {
        assert_eq!(
            compute_apv(&["did:example:bob#key-2", "did:example:bob#key-1"]),
            compute_apv(&["did:example:bob#key-1", "did:example:bob#key-2"])
        );
    }
}
