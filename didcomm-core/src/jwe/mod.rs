//! JWE (JSON Web Encryption) for `DIDComm` v2.
//!
//! Implements the general JSON serialization of RFC 7516 with a shared
//! protected header and one wrapped content key per recipient.
//!
//! # Features
//!
//! - `ECDH-ES+A256KW` (anoncrypt) and `ECDH-1PU+A256KW` (authcrypt)
//! - Content encryption with `A256CBC-HS512`, `A256GCM` or `XC20P`
//! - `X25519`, `P-256`, `P-384` and `P-521` key agreement
//! - Multiple recipients sharing one content encryption key
//!
//! # Examples
//!
//! ```rust
//! use didcomm_core::crypto::{Curve, PrivateKey};
//! use didcomm_core::jwe::{self, Jwe};
//! use didcomm_core::jwe::types::ContentEncryptionAlgorithm;
//!
//! let bob = PrivateKey::generate(Curve::X25519);
//! let kid = "did:example:bob#key-x25519-1".to_string();
//!
//! let packed = jwe::anoncrypt(
//!     b"Hello, DIDComm!",
//!     ContentEncryptionAlgorithm::Xc20P,
//!     &[(kid.clone(), bob.public_key())],
//! )
//! .unwrap();
//!
//! let parsed = Jwe::parse(&packed).unwrap();
//! let header = parsed.protected_header().unwrap();
//! let plaintext = parsed.decrypt(&header, &kid, &bob, None).unwrap();
//! assert_eq!(plaintext, b"Hello, DIDComm!");
//! ```
//!
//! # Security Considerations
//!
//! - Content and key encryption keys are zeroized when dropped
//! - The protected header is authenticated as additional data
//! - ECDH-1PU binds the content tag into key derivation, so authcrypt
//!   content is encrypted before keys are wrapped

pub mod algorithms;
pub mod error;
pub mod header;
pub mod key_agreement;
pub mod key_wrapping;
pub mod types;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use self::algorithms::{decrypt_content, encrypt_content, EncryptedContent};
use self::header::{compute_apv, ProtectedHeader};
use self::key_agreement::{derive_key_encryption_key_1pu, derive_key_encryption_key_es};
use self::key_wrapping::{unwrap_key, wrap_key, ContentEncryptionKey};
use self::types::{ContentEncryptionAlgorithm, KeyAgreementAlgorithm};
use crate::crypto::{PrivateKey, PublicKey};
use crate::error::{Error, Result};
use crate::utils::{b64_decode, b64_encode};

pub use self::header::ENCRYPTED_TYP;

/// A JWE in general JSON serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwe {
    /// Base64url-encoded protected header
    pub protected: String,
    /// One entry per recipient key
    pub recipients: Vec<Recipient>,
    /// Base64url-encoded IV
    pub iv: String,
    /// Base64url-encoded ciphertext
    pub ciphertext: String,
    /// Base64url-encoded authentication tag
    pub tag: String,
}

/// Per-recipient part of a JWE.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    /// Unprotected per-recipient header
    pub header: RecipientHeader,
    /// Base64url-encoded wrapped content key
    pub encrypted_key: String,
}

/// Unprotected per-recipient header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipientHeader {
    /// Recipient key ID
    pub kid: String,
}

/// Whether a JSON value has the shape of a general JSON JWE.
#[must_use]
pub fn looks_like_jwe(value: &Value) -> bool {
    value.get("ciphertext").is_some() && value.get("recipients").is_some()
}

impl Jwe {
    /// Parses a JWE from its JSON form.
    ///
    /// # Errors
    /// * `Error::Malformed` - Not a JWE, or no recipients
    pub fn parse(msg: &str) -> Result<Self> {
        let jwe: Self = serde_json::from_str(msg)
            .map_err(|e| Error::Malformed(format!("Unable to parse JWE: {e}")))?;
        if jwe.recipients.is_empty() {
            return Err(Error::Malformed("JWE has no recipients".into()));
        }
        Ok(jwe)
    }

    /// Decodes the protected header.
    ///
    /// # Errors
    /// * `Error::Malformed` - The header does not decode
    pub fn protected_header(&self) -> Result<ProtectedHeader> {
        Ok(ProtectedHeader::decode(&self.protected)?)
    }

    /// Recipient key IDs, in envelope order.
    #[must_use]
    pub fn recipient_kids(&self) -> Vec<String> {
        self.recipients.iter().map(|r| r.header.kid.clone()).collect()
    }

    /// Serializes to compact JSON.
    ///
    /// # Errors
    /// * `Error::Malformed` - Serialization failed
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    fn content(&self) -> Result<EncryptedContent> {
        Ok(EncryptedContent {
            iv: b64_decode(&self.iv, "JWE iv")?,
            ciphertext: b64_decode(&self.ciphertext, "JWE ciphertext")?,
            tag: b64_decode(&self.tag, "JWE tag")?,
        })
    }

    /// Decrypts the content for one recipient key.
    ///
    /// `sender_key` is the sender's static key and is required for
    /// ECDH-1PU.
    ///
    /// # Errors
    /// * `Error::NoCompatibleCrypto` - Unsupported `alg`/`enc`, or key
    ///   curves that cannot be combined
    /// * `Error::Malformed` - Unwrap or tag verification failed
    pub fn decrypt(
        &self,
        header: &ProtectedHeader,
        recipient_kid: &str,
        recipient_key: &PrivateKey,
        sender_key: Option<&PublicKey>,
    ) -> Result<Vec<u8>> {
        let alg = header.key_agreement()?;
        let enc = header.content_encryption()?;
        let recipient = self
            .recipients
            .iter()
            .find(|r| r.header.kid == recipient_kid)
            .ok_or_else(|| Error::Malformed(format!("No JWE recipient `{recipient_kid}`")))?;

        let epk = header.ephemeral_key()?;
        let apu = header
            .apu
            .as_deref()
            .map(|apu| b64_decode(apu, "apu"))
            .transpose()?
            .unwrap_or_default();
        let apv = b64_decode(&header.apv, "apv")?;
        let content = self.content()?;

        let kek = match alg {
            KeyAgreementAlgorithm::EcdhEsA256kw => {
                let z = recipient_key.diffie_hellman(&epk)?;
                derive_key_encryption_key_es(&z, &apu, &apv)
            }
            KeyAgreementAlgorithm::Ecdh1puA256kw => {
                let sender_key = sender_key.ok_or_else(|| {
                    Error::InvalidState("ECDH-1PU decryption needs the sender key".into())
                })?;
                let ze = recipient_key.diffie_hellman(&epk)?;
                let zs = recipient_key.diffie_hellman(sender_key)?;
                derive_key_encryption_key_1pu(&ze, &zs, &apu, &apv, &content.tag)
            }
        };

        let wrapped = b64_decode(&recipient.encrypted_key, "JWE encrypted_key")?;
        let cek = unwrap_key(&kek, &wrapped)?;
        debug!(kid = recipient_kid, alg = %alg, enc = %enc, "Decrypting JWE content");
        Ok(decrypt_content(enc, &cek, self.protected.as_bytes(), &content)?)
    }
}

fn check_recipients(recipients: &[(String, PublicKey)]) -> Result<crate::crypto::Curve> {
    let (_, first) = recipients
        .first()
        .ok_or_else(|| Error::IllegalArgument("No recipient keys to encrypt for".into()))?;
    let curve = first.curve();
    if !curve.is_key_agreement() {
        return Err(Error::NoCompatibleCrypto(format!(
            "{curve} keys cannot be used for key agreement"
        )));
    }
    if let Some((kid, _)) = recipients.iter().find(|(_, key)| key.curve() != curve) {
        return Err(Error::NoCompatibleCrypto(format!(
            "Recipient key `{kid}` is not on curve {curve}"
        )));
    }
    Ok(curve)
}

fn assemble(
    protected: String,
    content: &EncryptedContent,
    recipients: Vec<Recipient>,
) -> Result<String> {
    Jwe {
        protected,
        recipients,
        iv: b64_encode(&content.iv),
        ciphertext: b64_encode(&content.ciphertext),
        tag: b64_encode(&content.tag),
    }
    .to_json()
}

/// Encrypts `plaintext` anonymously (ECDH-ES+A256KW) for all `recipients`.
///
/// All recipient keys must be on the same key agreement curve.
///
/// # Errors
/// * `Error::IllegalArgument` - No recipients
/// * `Error::NoCompatibleCrypto` - Mixed or unsupported curves
pub fn anoncrypt(
    plaintext: &[u8],
    enc: ContentEncryptionAlgorithm,
    recipients: &[(String, PublicKey)],
) -> Result<String> {
    let curve = check_recipients(recipients)?;
    let ephemeral = PrivateKey::generate(curve);
    let kids: Vec<&str> = recipients.iter().map(|(kid, _)| kid.as_str()).collect();
    let header = ProtectedHeader::new_anoncrypt(enc, &ephemeral.public_key(), compute_apv(&kids));
    let protected = header.encode()?;
    let apv = b64_decode(&header.apv, "apv")?;

    let cek = ContentEncryptionKey::generate(enc.key_size());
    let content = encrypt_content(enc, &cek, protected.as_bytes(), plaintext)?;

    let mut wrapped = Vec::with_capacity(recipients.len());
    for (kid, key) in recipients {
        let z = ephemeral.diffie_hellman(key)?;
        let kek = derive_key_encryption_key_es(&z, &[], &apv);
        wrapped.push(Recipient {
            header: RecipientHeader { kid: kid.clone() },
            encrypted_key: b64_encode(wrap_key(&kek, &cek)?),
        });
    }

    debug!(curve = %curve, enc = %enc, recipients = recipients.len(), "Anoncrypt JWE built");
    assemble(protected, &content, wrapped)
}

/// Encrypts `plaintext` authenticated (ECDH-1PU+A256KW) from `sender_kid`.
///
/// With `protect_sender` the header omits `skid`; the sender key ID then
/// only travels in `apu`.
///
/// # Errors
/// * `Error::IllegalArgument` - No recipients
/// * `Error::NoCompatibleCrypto` - Sender and recipients on different curves
pub fn authcrypt(
    plaintext: &[u8],
    enc: ContentEncryptionAlgorithm,
    sender_kid: &str,
    sender_key: &PrivateKey,
    recipients: &[(String, PublicKey)],
    protect_sender: bool,
) -> Result<String> {
    let curve = check_recipients(recipients)?;
    if sender_key.curve() != curve {
        return Err(Error::NoCompatibleCrypto(format!(
            "Sender key `{sender_kid}` is on {}, recipients on {curve}",
            sender_key.curve()
        )));
    }
    let ephemeral = PrivateKey::generate(curve);
    let kids: Vec<&str> = recipients.iter().map(|(kid, _)| kid.as_str()).collect();
    let header = ProtectedHeader::new_authcrypt(
        enc,
        &ephemeral.public_key(),
        compute_apv(&kids),
        sender_kid,
        protect_sender,
    );
    let protected = header.encode()?;
    let apu = sender_kid.as_bytes();
    let apv = b64_decode(&header.apv, "apv")?;

    let cek = ContentEncryptionKey::generate(enc.key_size());
    let content = encrypt_content(enc, &cek, protected.as_bytes(), plaintext)?;

    let mut wrapped = Vec::with_capacity(recipients.len());
    for (kid, key) in recipients {
        let ze = ephemeral.diffie_hellman(key)?;
        let zs = sender_key.diffie_hellman(key)?;
        let kek = derive_key_encryption_key_1pu(&ze, &zs, apu, &apv, &content.tag);
        wrapped.push(Recipient {
            header: RecipientHeader { kid: kid.clone() },
            encrypted_key: b64_encode(wrap_key(&kek, &cek)?),
        });
    }

    debug!(
        curve = %curve,
        enc = %enc,
        skid = sender_kid,
        recipients = recipients.len(),
        "Authcrypt JWE built"
    );
    assemble(protected, &content, wrapped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Curve;
    use crate::error::ErrorKind;

    fn recipient(curve: Curve, kid: &str) -> (PrivateKey, (String, PublicKey)) {
        let key = PrivateKey::generate(curve);
        let public = key.public_key();
        (key, (kid.to_string(), public))
    }

    #[test]
    fn test_anoncrypt_roundtrip_all_suites() {
        for curve in [Curve::X25519, Curve::P256, Curve::P384, Curve::P521] {
            for enc in [
                ContentEncryptionAlgorithm::A256CbcHs512,
                ContentEncryptionAlgorithm::A256Gcm,
                ContentEncryptionAlgorithm::Xc20P,
            ] {
                let (bob, bob_pub) = recipient(curve, "did:example:bob#key-1");
                let packed = anoncrypt(b"secret", enc, &[bob_pub]).unwrap();

                let jwe = Jwe::parse(&packed).unwrap();
                let header = jwe.protected_header().unwrap();
                assert_eq!(header.typ.as_deref(), Some(ENCRYPTED_TYP));
                assert!(header.skid.is_none());
                let plaintext = jwe
                    .decrypt(&header, "did:example:bob#key-1", &bob, None)
                    .unwrap();
                assert_eq!(plaintext, b"secret");
            }
        }
    }

    #[test]
    fn test_authcrypt_multi_recipient() {
        let alice = PrivateKey::generate(Curve::X25519);
        let (bob1, bob1_pub) = recipient(Curve::X25519, "did:example:bob#key-1");
        let (bob2, bob2_pub) = recipient(Curve::X25519, "did:example:bob#key-2");

        let packed = authcrypt(
            b"hello bob",
            ContentEncryptionAlgorithm::A256CbcHs512,
            "did:example:alice#key-1",
            &alice,
            &[bob1_pub, bob2_pub],
            false,
        )
        .unwrap();

        let jwe = Jwe::parse(&packed).unwrap();
        let header = jwe.protected_header().unwrap();
        assert_eq!(header.skid.as_deref(), Some("did:example:alice#key-1"));
        assert_eq!(jwe.recipient_kids().len(), 2);

        let alice_pub = alice.public_key();
        for (kid, key) in [("did:example:bob#key-1", &bob1), ("did:example:bob#key-2", &bob2)] {
            let plaintext = jwe.decrypt(&header, kid, key, Some(&alice_pub)).unwrap();
            assert_eq!(plaintext, b"hello bob");
        }

        // Wrong sender key breaks ECDH-1PU
        let mallory = PrivateKey::generate(Curve::X25519).public_key();
        let err = jwe
            .decrypt(&header, "did:example:bob#key-1", &bob1, Some(&mallory))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);
    }

    #[test]
    fn test_tamper_detection() {
        let (bob, bob_pub) = recipient(Curve::X25519, "did:example:bob#key-1");
        let packed = anoncrypt(b"secret", ContentEncryptionAlgorithm::A256Gcm, &[bob_pub]).unwrap();
        let mut jwe = Jwe::parse(&packed).unwrap();
        let header = jwe.protected_header().unwrap();

        let mut ciphertext = b64_decode(&jwe.ciphertext, "ct").unwrap();
        ciphertext[0] ^= 1;
        jwe.ciphertext = b64_encode(ciphertext);

        let err = jwe
            .decrypt(&header, "did:example:bob#key-1", &bob, None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);
    }

    #[test]
    fn test_unsupported_enc() {
        let (bob, bob_pub) = recipient(Curve::X25519, "did:example:bob#key-1");
        let packed = anoncrypt(b"secret", ContentEncryptionAlgorithm::Xc20P, &[bob_pub]).unwrap();
        let jwe = Jwe::parse(&packed).unwrap();
        let mut header = jwe.protected_header().unwrap();
        header.enc = "A128GCM".into();

        let err = jwe
            .decrypt(&header, "did:example:bob#key-1", &bob, None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoCompatibleCrypto);
    }

    #[test]
    fn test_mixed_curves_rejected() {
        let (_, a) = recipient(Curve::X25519, "did:example:bob#key-1");
        let (_, b) = recipient(Curve::P256, "did:example:bob#key-2");
        let err = anoncrypt(b"x", ContentEncryptionAlgorithm::Xc20P, &[a, b]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoCompatibleCrypto);

        let alice = PrivateKey::generate(Curve::P256);
        let (_, bob) = recipient(Curve::X25519, "did:example:bob#key-1");
        let err = authcrypt(
            b"x",
            ContentEncryptionAlgorithm::A256CbcHs512,
            "did:example:alice#key-p256-1",
            &alice,
            &[bob],
            false,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoCompatibleCrypto);
    }

    #[test]
    fn test_looks_like_jwe() {
        assert!(looks_like_jwe(&serde_json::json!({"ciphertext": "", "recipients": []})));
        assert!(!looks_like_jwe(&serde_json::json!({"payload": "", "signatures": []})));
    }
}
