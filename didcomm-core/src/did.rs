//! DID Document model used for key lookup and service discovery.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A resolved DID Document, reduced to the parts DIDComm needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidDoc {
    /// The DID this document describes.
    pub id: String,
    /// Key agreement key IDs, in preference order.
    #[serde(default)]
    pub key_agreement: Vec<String>,
    /// Authentication key IDs, in preference order.
    #[serde(default)]
    pub authentication: Vec<String>,
    /// All verification methods referenced above.
    #[serde(default)]
    pub verification_method: Vec<VerificationMethod>,
    /// Service endpoints.
    #[serde(default)]
    pub service: Vec<Service>,
}

impl DidDoc {
    /// Creates an empty document for `id`.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            key_agreement: Vec::new(),
            authentication: Vec::new(),
            verification_method: Vec::new(),
            service: Vec::new(),
        }
    }

    /// Looks up a verification method by its full key ID.
    #[must_use]
    pub fn verification_method(&self, kid: &str) -> Option<&VerificationMethod> {
        self.verification_method.iter().find(|vm| vm.id == kid)
    }

    /// Looks up a service by ID.
    #[must_use]
    pub fn service(&self, id: &str) -> Option<&Service> {
        self.service.iter().find(|s| s.id == id)
    }

    /// First `DIDCommMessaging` service, in document order.
    #[must_use]
    pub fn first_didcomm_service(&self) -> Option<(&Service, &DidCommMessagingService)> {
        self.service.iter().find_map(|s| match &s.service_endpoint {
            ServiceKind::DidCommMessaging(endpoint) => Some((s, endpoint)),
            ServiceKind::Other(_) => None,
        })
    }
}

/// A verification method binding a key ID to public key material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationMethod {
    /// The key ID (DID URL).
    pub id: String,
    /// The method type.
    #[serde(rename = "type")]
    pub type_: VerificationMethodType,
    /// DID of the controller.
    pub controller: String,
    /// Public key material.
    #[serde(flatten)]
    pub verification_material: VerificationMaterial,
}

/// Verification method types. Ordinals are stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerificationMethodType {
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

/// Public key material of a verification method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VerificationMaterial {
    /// A public JWK
    #[serde(rename = "publicKeyJwk")]
    Jwk(Value),
    /// A multibase, multicodec-prefixed key
    #[serde(rename = "publicKeyMultibase")]
    Multibase(String),
    /// A raw base58 key
    #[serde(rename = "publicKeyBase58")]
    Base58(String),
}

/// A DID Document service entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    /// Service ID.
    pub id: String,
    /// Service endpoint descriptor.
    pub service_endpoint: ServiceKind,
}

/// Service endpoint kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServiceKind {
    /// A DIDComm messaging endpoint
    DidCommMessaging(DidCommMessagingService),
    /// Any other endpoint, kept opaque
    Other(Value),
}

/// A `DIDCommMessaging` endpoint descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidCommMessagingService {
    /// Endpoint URI, or a mediator DID.
    pub uri: String,
    /// Accepted envelope profiles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept: Option<Vec<String>>,
    /// Mediator key IDs the sender must forward through, in order.
    #[serde(default)]
    pub routing_keys: Vec<String>,
}
