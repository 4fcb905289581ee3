//! Prelude module for commonly used types and traits.
//!
//! Import everything from this module with `use didcomm_core::prelude::*`.
//!
//! # Example
//!
//! ```rust,no_run
//! use didcomm_core::prelude::*;
//!
//! async fn example(didcomm: &DIDComm) -> Result<()> {
//!     let message = Message::new("1", "https://example.com/ping/1.0/ping", serde_json::json!({}))
//!         .from("did:example:alice")
//!         .to(["did:example:bob"]);
//!
//!     let (packed, _) = didcomm.pack_signed(&message, "did:example:alice").await?;
//!     let (_, metadata) = didcomm.unpack(&packed, &UnpackOptions::default()).await?;
//!     assert!(metadata.non_repudiation);
//!     Ok(())
//! }
//! ```

// Re-export error types
pub use crate::error::{Error, ErrorKind, Result};

// Re-export the facade and resolver traits
pub use crate::didcomm::{DIDComm, DIDCommConfig};
pub use crate::plugin::{DidResolver, SecretsResolver};

// Re-export the data model
pub use crate::did::{DidDoc, Service, ServiceKind, VerificationMaterial, VerificationMethod};
pub use crate::message::{Attachment, AttachmentData, FromPrior, Message};
pub use crate::secrets::{Secret, SecretMaterial, SecretType};

// Re-export options and metadata
pub use crate::types::{
    AnonCryptAlg, AuthCryptAlg, PackEncryptedMetadata, PackEncryptedOptions, PackSignedMetadata,
    SignAlg, UnpackMetadata, UnpackOptions,
};
