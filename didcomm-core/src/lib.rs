//! Core `DIDComm` v2 implementation.
//!
//! This crate packs application messages into `DIDComm` v2 envelopes and
//! unpacks incoming envelopes back into messages, reporting exactly which
//! protections were applied.
//!
//! # Features
//!
//! - Message packing and unpacking with different security levels:
//!   - Plaintext: no protection
//!   - Signed: a JWS over the message for non-repudiation
//!   - AuthCrypt: ECDH-1PU encryption that authenticates the sender
//!   - AnonCrypt: ECDH-ES encryption hiding the sender
//! - Routing through mediators with Forward envelopes
//! - DID rotation through signed `from_prior` JWTs
//! - Pluggable DID and secrets resolution
//! - X25519, P-256, P-384 and P-521 key agreement; Ed25519, P-256 and
//!   secp256k1 signatures
//!
//! # Architecture
//!
//! The crate is organized into these main modules:
//! - `didcomm`: The [`DIDComm`] facade binding the resolvers
//! - `pack` / `unpack`: The pack and unpack pipelines
//! - `plugin`: Resolver traits supplied by the caller
//! - `jwe` / `jws`: Envelope formats
//! - `crypto`: Key material and primitive operations
//! - `message`, `did`, `secrets`, `types`: Data model
//! - `error`: Error types and handling
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use didcomm_core::prelude::*;
//!
//! async fn roundtrip(
//!     did_resolver: Arc<dyn DidResolver>,
//!     secrets_resolver: Arc<dyn SecretsResolver>,
//! ) -> Result<()> {
//!     let didcomm = DIDComm::new(did_resolver, secrets_resolver);
//!     let msg = Message::new(
//!         "1234567890",
//!         "https://example.com/protocols/lets_do_lunch/1.0/proposal",
//!         serde_json::json!({"messagespecificattribute": "and its value"}),
//!     )
//!     .from("did:example:alice")
//!     .to(["did:example:bob"]);
//!
//!     // Authcrypt from Alice to Bob
//!     let (packed, _) = didcomm
//!         .pack_encrypted(
//!             &msg,
//!             "did:example:bob",
//!             Some("did:example:alice"),
//!             None,
//!             &PackEncryptedOptions::default(),
//!         )
//!         .await?;
//!
//!     // Bob's side
//!     let (unpacked, metadata) = didcomm.unpack(&packed, &UnpackOptions::default()).await?;
//!     assert_eq!(unpacked, msg);
//!     assert!(metadata.authenticated);
//!     Ok(())
//! }
//! ```
//!
//! # WASM Support
//!
//! With the `wasm` feature, randomness comes from the browser through
//! `getrandom`. Resolver deadlines need the default `tokio` feature.
//!
//! # Security Considerations
//!
//! - Use authcrypt when the recipient must know who sent a message, and
//!   `protect_sender` to hide that identity from intermediaries
//! - Use signing when a third party must be able to verify the sender
//! - Secrets never appear in `Debug` output and derived keys are zeroized
//! - Errors carry no key material

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod crypto;
pub mod did;
pub mod didcomm;
pub mod error;
pub mod forward;
mod from_prior;
pub mod jwe;
pub mod jws;
pub mod message;
mod pack;
pub mod plugin;
pub mod prelude;
pub mod secrets;
pub mod types;
mod unpack;
pub mod utils;


pub use did::{
    DidCommMessagingService, DidDoc, Service, ServiceKind, VerificationMaterial,
    VerificationMethod, VerificationMethodType,
};
pub use didcomm::{DIDComm, DIDCommConfig};
pub use error::{Error, ErrorKind, Result};
pub use forward::{ParsedForward, FORWARD_MSG_TYPE};
pub use message::{
    Attachment, AttachmentData, Base64AttachmentData, FromPrior, JsonAttachmentData,
    LinksAttachmentData, Message,
};
pub use plugin::{DidResolver, SecretsResolver};
pub use secrets::{Secret, SecretMaterial, SecretType};
pub use types::{
    AnonCryptAlg, AuthCryptAlg, MessagingServiceMetadata, PackEncryptedMetadata,
    PackEncryptedOptions, PackSignedMetadata, SignAlg, UnpackMetadata, UnpackOptions,
};
