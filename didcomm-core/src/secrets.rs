//! Private key material handed out by a [`crate::plugin::SecretsResolver`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A private key identified by its key ID.
///
/// `Debug` redacts the key material.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Secret {
    /// The key ID (DID URL) this secret belongs to.
    pub id: String,
    /// The secret type.
    #[serde(rename = "type")]
    pub type_: SecretType,
    /// Private key material.
    #[serde(flatten)]
    pub secret_material: SecretMaterial,
}

impl Secret {
    /// Creates a secret.
    pub fn new(id: impl Into<String>, type_: SecretType, secret_material: SecretMaterial) -> Self {
        Self {
            id: id.into(),
            type_,
            secret_material,
        }
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secret")
            .field("id", &self.id)
            .field("type_", &self.type_)
            .field("secret_material", &"<redacted>")
            .finish()
    }
}

/// Secret types. Ordinals are stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecretType {
    /// `JsonWebKey2020`
    JsonWebKey2020,
    /// `X25519KeyAgreementKey2019`
    X25519KeyAgreementKey2019,
    /// `Ed25519VerificationKey2018`
    Ed25519VerificationKey2018,
    /// `EcdsaSecp256k1VerificationKey2019`
    EcdsaSecp256k1VerificationKey2019,
    /// `X25519KeyAgreementKey2020`
    X25519KeyAgreementKey2020,
    /// `Ed25519VerificationKey2020`
    Ed25519VerificationKey2020,
    /// Anything else
    #[serde(other)]
    Other,
}

/// Private key material.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub enum SecretMaterial {
    /// A private JWK (with `d`)
    #[serde(rename = "privateKeyJwk")]
    Jwk(Value),
    /// A multibase, multicodec-prefixed private key
    #[serde(rename = "privateKeyMultibase")]
    Multibase(String),
    /// A raw base58 private key
    #[serde(rename = "privateKeyBase58")]
    Base58(String),
}

impl std::fmt::Debug for SecretMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let variant = match self {
            Self::Jwk(_) => "Jwk",
            Self::Multibase(_) => "Multibase",
            Self::Base58(_) => "Base58",
        };
        write!(f, "{variant}(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_debug_redacts_material() {
        let secret = Secret::new(
            "did:example:alice#key-1",
            SecretType::JsonWebKey2020,
            SecretMaterial::Jwk(json!({"kty": "OKP", "crv": "Ed25519", "d": "very-secret"})),
        );
        let printed = format!("{secret:?}");
        assert!(printed.contains("did:example:alice#key-1"));
        assert!(!printed.contains("very-secret"));
        assert!(!format!("{:?}", secret.secret_material).contains("very-secret"));
    }
}
