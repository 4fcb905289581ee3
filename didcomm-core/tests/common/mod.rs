//! Fixtures for the facade tests: in-memory resolvers and identities with
//! freshly generated keys.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use didcomm_core::crypto::{Curve, PrivateKey};
use didcomm_core::prelude::*;
use didcomm_core::{DidCommMessagingService, VerificationMethodType};
use serde_json::json;

pub const ALICE_DID: &str = "did:example:alice";
pub const BOB_DID: &str = "did:example:bob";
pub const CHARLIE_DID: &str = "did:example:charlie";
pub const MEDIATOR1_DID: &str = "did:example:mediator1";
pub const MEDIATOR2_DID: &str = "did:example:mediator2";

#[derive(Clone, Default)]
pub struct DidDocs(pub HashMap<String, DidDoc>);

#[async_trait]
impl DidResolver for DidDocs {
    async fn resolve(&self, did: &str) -> Result<Option<DidDoc>> {
        Ok(self.0.get(did).cloned())
    }
}

#[derive(Clone, Default)]
pub struct Secrets(pub HashMap<String, Secret>);

#[async_trait]
impl SecretsResolver for Secrets {
    async fn get_secret(&self, secret_id: &str) -> Result<Option<Secret>> {
        Ok(self.0.get(secret_id).cloned())
    }

    async fn find_secrets(&self, secret_ids: &[String]) -> Result<Vec<String>> {
        Ok(secret_ids
            .iter()
            .filter(|id| self.0.contains_key(id.as_str()))
            .cloned()
            .collect())
    }
}

/// Resolves like the wrapped resolver, but only after `delay`.
pub struct SlowDidDocs {
    pub inner: DidDocs,
    pub delay: Duration,
}

#[async_trait]
impl DidResolver for SlowDidDocs {
    async fn resolve(&self, did: &str) -> Result<Option<DidDoc>> {
        tokio::time::sleep(self.delay).await;
        self.inner.resolve(did).await
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub struct Party {
    doc: DidDoc,
    secrets: Vec<Secret>,
}

impl Party {
    fn new(did: &str) -> Self {
        Self {
            doc: DidDoc::new(did),
            secrets: Vec::new(),
        }
    }

    fn key(mut self, fragment: &str, curve: Curve, agreement: bool) -> Self {
        let kid = format!("{}#{fragment}", self.doc.id);
        let key = PrivateKey::generate(curve);
        self.doc.verification_method.push(VerificationMethod {
            id: kid.clone(),
            type_: VerificationMethodType::JsonWebKey2020,
            controller: self.doc.id.clone(),
            verification_material: VerificationMaterial::Jwk(key.public_key().to_jwk()),
        });
        if agreement {
            self.doc.key_agreement.push(kid.clone());
        } else {
            self.doc.authentication.push(kid.clone());
        }
        self.secrets.push(Secret::new(
            kid,
            SecretType::JsonWebKey2020,
            SecretMaterial::Jwk(key.to_jwk()),
        ));
        self
    }

    fn auth(self, fragment: &str, curve: Curve) -> Self {
        self.key(fragment, curve, false)
    }

    fn agreement(self, fragment: &str, curve: Curve) -> Self {
        self.key(fragment, curve, true)
    }

    fn routed_through(mut self, routing_keys: &[&str]) -> Self {
        self.doc.service.push(Service {
            id: format!("{}#didcomm-1", self.doc.id),
            service_endpoint: ServiceKind::DidCommMessaging(DidCommMessagingService {
                uri: "http://example.com/path".into(),
                accept: Some(vec!["didcomm/v2".into()]),
                routing_keys: routing_keys.iter().map(ToString::to_string).collect(),
            }),
        });
        self
    }
}

/// Alice, Bob, Charlie and two mediators, every secret held.
///
/// Charlie routes through mediator1 then mediator2.
pub struct World {
    pub docs: DidDocs,
    pub secrets: Secrets,
}

impl World {
    pub fn new() -> Self {
        init_tracing();
        let parties = [
            Party::new(ALICE_DID)
                .auth("key-1", Curve::Ed25519)
                .auth("key-2", Curve::P256)
                .auth("key-3", Curve::Secp256k1)
                .agreement("key-x25519-1", Curve::X25519)
                .agreement("key-p256-1", Curve::P256)
                .agreement("key-p521-1", Curve::P521),
            Party::new(BOB_DID)
                .auth("key-1", Curve::Ed25519)
                .agreement("key-x25519-1", Curve::X25519)
                .agreement("key-x25519-2", Curve::X25519)
                .agreement("key-x25519-3", Curve::X25519)
                .agreement("key-p256-1", Curve::P256),
            Party::new(CHARLIE_DID)
                .auth("key-1", Curve::Ed25519)
                .agreement("key-x25519-1", Curve::X25519)
                .routed_through(&[
                    "did:example:mediator1#key-x25519-1",
                    "did:example:mediator2#key-x25519-1",
                ]),
            Party::new(MEDIATOR1_DID).agreement("key-x25519-1", Curve::X25519),
            Party::new(MEDIATOR2_DID).agreement("key-x25519-1", Curve::X25519),
        ];

        let mut docs = DidDocs::default();
        let mut secrets = Secrets::default();
        for party in parties {
            for secret in party.secrets {
                secrets.0.insert(secret.id.clone(), secret);
            }
            docs.0.insert(party.doc.id.clone(), party.doc);
        }
        Self { docs, secrets }
    }

    pub fn didcomm(&self) -> DIDComm {
        DIDComm::new(Arc::new(self.docs.clone()), Arc::new(self.secrets.clone()))
    }

    /// An engine that only holds the secrets of `did`.
    pub fn didcomm_of(&self, did: &str) -> DIDComm {
        let prefix = format!("{did}#");
        let own = self
            .secrets
            .0
            .iter()
            .filter(|(kid, _)| kid.starts_with(&prefix))
            .map(|(kid, secret)| (kid.clone(), secret.clone()))
            .collect();
        DIDComm::new(Arc::new(self.docs.clone()), Arc::new(Secrets(own)))
    }

    pub fn remove_secret(&mut self, kid: &str) {
        self.secrets.0.remove(kid);
    }
}

pub fn lunch_proposal() -> Message {
    Message::new(
        "1234567890",
        "http://example.com/protocols/lets_do_lunch/1.0/proposal",
        json!({"messagespecificattribute": "and its value"}),
    )
    .from(ALICE_DID)
    .to([BOB_DID])
    .created_time(1_516_269_022)
    .expires_time(1_516_385_931)
}
