//! JWS (JSON Web Signature) envelopes.
//!
//! Signed DIDComm messages use the general JSON serialization of RFC 7515
//! with one signature; the flattened form is accepted on input. The
//! compact form is used for `from_prior` JWTs.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::crypto::{PrivateKey, PublicKey};
use crate::error::{Error, Result};
use crate::types::SignAlg;
use crate::utils::{b64_decode, b64_encode};

/// Media type of a signed DIDComm message.
pub const SIGNED_TYP: &str = "application/didcomm-signed+json";

/// A JWS in general JSON serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jws {
    /// Base64url-encoded payload
    pub payload: String,
    /// Signatures over the payload
    pub signatures: Vec<JwsSignature>,
}

/// One signature of a JWS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwsSignature {
    /// Base64url-encoded protected header
    pub protected: String,
    /// Base64url-encoded signature
    pub signature: String,
    /// Unprotected header carrying the signer key ID
    pub header: SignatureHeader,
}

/// Unprotected signature header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureHeader {
    /// Signer key ID
    pub kid: String,
}

#[derive(Debug, Deserialize)]
struct FlattenedJws {
    payload: String,
    protected: String,
    signature: String,
    header: SignatureHeader,
}

/// Protected header of a JWS or JWT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwsProtectedHeader {
    /// Media type
    pub typ: String,
    /// Signature algorithm
    pub alg: String,
    /// Signer key ID; only set in compact JWTs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
}

impl JwsProtectedHeader {
    /// Parsed `alg`.
    ///
    /// # Errors
    /// * `Error::Unsupported` - Unknown `alg`
    pub fn sign_alg(&self) -> Result<SignAlg> {
        SignAlg::from_jose(&self.alg)
            .ok_or_else(|| Error::Unsupported(format!("Unsupported JWS alg `{}`", self.alg)))
    }
}

/// Whether a JSON value has the shape of a general or flattened JWS.
#[must_use]
pub fn looks_like_jws(value: &Value) -> bool {
    value.get("payload").is_some()
        && (value.get("signatures").is_some() || value.get("signature").is_some())
}

fn signing_input(protected: &str, payload: &str) -> Vec<u8> {
    format!("{protected}.{payload}").into_bytes()
}

fn decode_header(protected: &str) -> Result<JwsProtectedHeader> {
    let bytes = b64_decode(protected, "JWS protected header")?;
    serde_json::from_slice(&bytes)
        .map_err(|e| Error::Malformed(format!("Invalid JWS protected header: {e}")))
}

/// Signs `payload` as a general JSON JWS.
///
/// # Errors
/// * `Error::Unsupported` - The key cannot sign
pub fn sign(payload: &[u8], kid: &str, key: &PrivateKey) -> Result<String> {
    let header = JwsProtectedHeader {
        typ: SIGNED_TYP.to_string(),
        alg: key.sign_alg()?.as_str().to_string(),
        kid: None,
    };
    let protected = b64_encode(serde_json::to_vec(&header)?);
    let payload = b64_encode(payload);
    let (_, signature) = key.sign(&signing_input(&protected, &payload))?;

    let jws = Jws {
        payload,
        signatures: vec![JwsSignature {
            protected,
            signature: b64_encode(signature),
            header: SignatureHeader {
                kid: kid.to_string(),
            },
        }],
    };
    Ok(serde_json::to_string(&jws)?)
}

/// A parsed JWS reduced to its single signature.
#[derive(Debug, Clone)]
pub struct ParsedJws {
    /// Base64url-encoded payload
    pub payload: String,
    /// Base64url-encoded protected header
    pub protected: String,
    /// Decoded protected header
    pub header: JwsProtectedHeader,
    /// Signer key ID
    pub kid: String,
    /// Raw signature
    pub signature: Vec<u8>,
}

impl ParsedJws {
    /// Parses a general or flattened JSON JWS.
    ///
    /// Exactly one signature is supported.
    ///
    /// # Errors
    /// * `Error::Malformed` - Not a JWS, or not exactly one signature
    pub fn parse(msg: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(msg)?;
        let (payload, signature) = if value.get("signatures").is_some() {
            let jws: Jws = serde_json::from_value(value)
                .map_err(|e| Error::Malformed(format!("Unable to parse JWS: {e}")))?;
            let mut signatures = jws.signatures.into_iter();
            match (signatures.next(), signatures.next()) {
                (Some(signature), None) => (jws.payload, signature),
                _ => {
                    return Err(Error::Malformed(
                        "JWS must carry exactly one signature".into(),
                    ))
                }
            }
        } else {
            let flat: FlattenedJws = serde_json::from_value(value)
                .map_err(|e| Error::Malformed(format!("Unable to parse JWS: {e}")))?;
            (
                flat.payload,
                JwsSignature {
                    protected: flat.protected,
                    signature: flat.signature,
                    header: flat.header,
                },
            )
        };

        Ok(Self {
            header: decode_header(&signature.protected)?,
            signature: b64_decode(&signature.signature, "JWS signature")?,
            kid: signature.header.kid,
            protected: signature.protected,
            payload,
        })
    }

    /// Verifies the signature with the signer's public key.
    ///
    /// # Errors
    /// * `Error::Malformed` - Bad signature
    /// * `Error::Unsupported` - Unknown `alg`
    /// * `Error::NoCompatibleCrypto` - `alg` does not fit the key
    pub fn verify(&self, key: &PublicKey) -> Result<SignAlg> {
        let alg = self.header.sign_alg()?;
        key.verify(alg, &signing_input(&self.protected, &self.payload), &self.signature)?;
        Ok(alg)
    }

    /// The decoded payload.
    ///
    /// # Errors
    /// * `Error::Malformed` - Payload is not base64url
    pub fn payload_bytes(&self) -> Result<Vec<u8>> {
        b64_decode(&self.payload, "JWS payload")
    }
}

/// Signs `payload` as a compact JWS with header `{typ, alg, kid}`.
///
/// # Errors
/// * `Error::Unsupported` - The key cannot sign
pub fn sign_compact(payload: &[u8], typ: &str, kid: &str, key: &PrivateKey) -> Result<String> {
    let header = JwsProtectedHeader {
        typ: typ.to_string(),
        alg: key.sign_alg()?.as_str().to_string(),
        kid: Some(kid.to_string()),
    };
    let protected = b64_encode(serde_json::to_vec(&header)?);
    let payload = b64_encode(payload);
    let (_, signature) = key.sign(&signing_input(&protected, &payload))?;
    Ok(format!("{protected}.{payload}.{}", b64_encode(signature)))
}

/// A parsed compact JWS.
#[derive(Debug, Clone)]
pub struct CompactJws<'a> {
    protected: &'a str,
    payload: &'a str,
    /// Decoded protected header
    pub header: JwsProtectedHeader,
    signature: Vec<u8>,
}

impl<'a> CompactJws<'a> {
    /// Splits and decodes a compact JWS.
    ///
    /// # Errors
    /// * `Error::Malformed` - Not three base64url segments
    pub fn parse(jws: &'a str) -> Result<Self> {
        let mut parts = jws.split('.');
        let (Some(protected), Some(payload), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(Error::Malformed(
                "Compact JWS must have exactly three parts".into(),
            ));
        };
        Ok(Self {
            protected,
            payload,
            header: decode_header(protected)?,
            signature: b64_decode(signature, "JWS signature")?,
        })
    }

    /// Verifies the signature with the signer's public key.
    ///
    /// # Errors
    /// * `Error::Malformed` - Bad signature
    /// * `Error::Unsupported` - Unknown `alg`
    pub fn verify(&self, key: &PublicKey) -> Result<SignAlg> {
        let alg = self.header.sign_alg()?;
        key.verify(alg, &signing_input(self.protected, self.payload), &self.signature)?;
        Ok(alg)
    }

    /// The decoded payload.
    ///
    /// # Errors
    /// * `Error::Malformed` - Payload is not base64url
    pub fn payload_bytes(&self) -> Result<Vec<u8>> {
        b64_decode(self.payload, "JWS payload")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Curve;
    use crate::error::ErrorKind;

    #[test]
    fn test_sign_verify_general() {
        for curve in [Curve::Ed25519, Curve::P256, Curve::Secp256k1] {
            let key = PrivateKey::generate(curve);
            let signed = sign(b"{\"id\":\"1\"}", "did:example:alice#key-1", &key).unwrap();

            let parsed = ParsedJws::parse(&signed).unwrap();
            assert_eq!(parsed.kid, "did:example:alice#key-1");
            assert_eq!(parsed.header.typ, SIGNED_TYP);
            let alg = parsed.verify(&key.public_key()).unwrap();
            assert_eq!(alg, key.sign_alg().unwrap());
            assert_eq!(parsed.payload_bytes().unwrap(), b"{\"id\":\"1\"}");
        }
    }

    #[test]
    fn test_flattened_form_accepted() {
        let key = PrivateKey::generate(Curve::Ed25519);
        let signed = sign(b"payload", "did:example:alice#key-1", &key).unwrap();
        let general: Jws = serde_json::from_str(&signed).unwrap();
        let sig = &general.signatures[0];
        let flattened = serde_json::json!({
            "payload": general.payload,
            "protected": sig.protected,
            "signature": sig.signature,
            "header": {"kid": sig.header.kid},
        });

        assert!(looks_like_jws(&flattened));
        let parsed = ParsedJws::parse(&flattened.to_string()).unwrap();
        parsed.verify(&key.public_key()).unwrap();
    }

    #[test]
    fn test_tampered_payload_fails() {
        let key = PrivateKey::generate(Curve::Ed25519);
        let signed = sign(b"payload", "did:example:alice#key-1", &key).unwrap();
        let mut jws: Jws = serde_json::from_str(&signed).unwrap();
        jws.payload = b64_encode(b"other");

        let parsed = ParsedJws::parse(&serde_json::to_string(&jws).unwrap()).unwrap();
        let err = parsed.verify(&key.public_key()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);
    }

    #[test]
    fn test_compact_roundtrip() {
        let key = PrivateKey::generate(Curve::P256);
        let jwt = sign_compact(b"{\"iss\":\"did:example:a\"}", "JWT", "did:example:a#key-1", &key)
            .unwrap();
        assert_eq!(jwt.split('.').count(), 3);

        let parsed = CompactJws::parse(&jwt).unwrap();
        assert_eq!(parsed.header.kid.as_deref(), Some("did:example:a#key-1"));
        assert_eq!(parsed.verify(&key.public_key()).unwrap(), SignAlg::ES256);

        let err = CompactJws::parse("a.b").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);
    }
}
