//! The `DIDComm` facade.
//!
//! [`DIDComm`] binds one DID resolver and one secrets resolver and exposes
//! every pack and unpack operation against that fixed pair. It holds no
//! mutable state, so a single instance can be shared across tasks.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::error::Result;
use crate::message::{FromPrior, Message};
use crate::plugin::{DidResolver, Resolvers, SecretsResolver};
use crate::types::{
    AnonCryptAlg, PackEncryptedMetadata, PackEncryptedOptions, PackSignedMetadata,
    UnpackMetadata, UnpackOptions,
};
use crate::{forward, from_prior, pack, unpack};

/// Engine-wide settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DIDCommConfig {
    /// Deadline for each resolver call. `None` waits indefinitely.
    ///
    /// Only enforced with the `tokio` feature; an expired call fails with
    /// `Error::IoError`.
    pub resolver_timeout: Option<Duration>,
}

impl DIDCommConfig {
    /// Sets the resolver deadline.
    #[must_use]
    pub fn resolver_timeout(mut self, timeout: Duration) -> Self {
        self.resolver_timeout = Some(timeout);
        self
    }
}

/// Entry point for packing and unpacking `DIDComm` messages.
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use didcomm_core::prelude::*;
///
/// async fn send(
///     did_resolver: Arc<dyn DidResolver>,
///     secrets_resolver: Arc<dyn SecretsResolver>,
/// ) -> Result<String> {
///     let didcomm = DIDComm::new(did_resolver, secrets_resolver);
///     let msg = Message::new(
///         "1234567890",
///         "https://example.com/protocols/lets_do_lunch/1.0/proposal",
///         serde_json::json!({"messagespecificattribute": "and its value"}),
///     )
///     .from("did:example:alice")
///     .to(["did:example:bob"]);
///
///     let (packed, _) = didcomm
///         .pack_encrypted(
///             &msg,
///             "did:example:bob",
///             Some("did:example:alice"),
///             None,
///             &PackEncryptedOptions::default(),
///         )
///         .await?;
///     Ok(packed)
/// }
/// ```
#[derive(Clone)]
pub struct DIDComm {
    did_resolver: Arc<dyn DidResolver>,
    secrets_resolver: Arc<dyn SecretsResolver>,
    config: DIDCommConfig,
}

impl std::fmt::Debug for DIDComm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DIDComm")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl DIDComm {
    /// Creates an engine over the given resolvers with the default config.
    pub fn new(
        did_resolver: Arc<dyn DidResolver>,
        secrets_resolver: Arc<dyn SecretsResolver>,
    ) -> Self {
        Self {
            did_resolver,
            secrets_resolver,
            config: DIDCommConfig::default(),
        }
    }

    /// Replaces the engine config.
    #[must_use]
    pub fn with_config(mut self, config: DIDCommConfig) -> Self {
        self.config = config;
        self
    }

    /// The active config.
    #[must_use]
    pub fn config(&self) -> &DIDCommConfig {
        &self.config
    }

    fn resolvers(&self) -> Resolvers<'_> {
        Resolvers::new(
            &*self.did_resolver,
            &*self.secrets_resolver,
            self.config.resolver_timeout,
        )
    }

    /// Serializes a message without signing or encryption.
    ///
    /// # Errors
    /// * `Error::Malformed` - The message lacks a required field or carries
    ///   an invalid `from_prior`
    /// * `Error::IllegalArgument` - `from_prior` names another sender
    pub async fn pack_plaintext(&self, msg: &Message) -> Result<String> {
        pack::pack_plaintext(msg, self.resolvers()).await
    }

    /// Signs a message for non-repudiation.
    ///
    /// `sign_by` is a DID, or a DID URL naming one of its authentication
    /// keys.
    ///
    /// # Errors
    /// * `Error::IllegalArgument` - `sign_by` is not a DID, is not an
    ///   authentication key, or does not match `from`
    /// * `Error::SecretNotFound` - No usable signing secret is held
    /// * any resolver error
    pub async fn pack_signed(
        &self,
        msg: &Message,
        sign_by: &str,
    ) -> Result<(String, PackSignedMetadata)> {
        pack::pack_signed(msg, sign_by, self.resolvers()).await
    }

    /// Encrypts a message for `to`.
    ///
    /// With `from` the message is authcrypted, otherwise anoncrypted. With
    /// `sign_by` it is signed before encryption. When the recipient declares
    /// routing keys and `options.forward` is set, the result is wrapped in
    /// Forward envelopes for each mediator.
    ///
    /// # Errors
    /// * `Error::IllegalArgument` - Inconsistent `to`/`from`/`sign_by`
    /// * `Error::DidUrlNotFound` - A named key is not in its DID Document
    /// * `Error::SecretNotFound` - No sender or signing secret is held
    /// * `Error::NoCompatibleCrypto` - Sender and recipient share no curve
    /// * any resolver error
    pub async fn pack_encrypted(
        &self,
        msg: &Message,
        to: &str,
        from: Option<&str>,
        sign_by: Option<&str>,
        options: &PackEncryptedOptions,
    ) -> Result<(String, PackEncryptedMetadata)> {
        pack::pack_encrypted(msg, to, from, sign_by, options, self.resolvers()).await
    }

    /// Unpacks a plaintext, signed or encrypted message.
    ///
    /// # Errors
    /// * `Error::Malformed` - Invalid envelope, failed decryption or
    ///   verification
    /// * `Error::SecretNotFound` - Not addressed to any held key
    /// * `Error::NoCompatibleCrypto` - Unsupported algorithms
    /// * any resolver error
    pub async fn unpack(
        &self,
        msg: &str,
        options: &UnpackOptions,
    ) -> Result<(Message, UnpackMetadata)> {
        unpack::unpack(msg, options, self.resolvers()).await
    }

    /// Signs a `from_prior` rotation JWT.
    ///
    /// Returns the JWT and the issuer key ID used.
    ///
    /// # Errors
    /// * `Error::IllegalArgument` - Bad claims or a foreign `issuer_kid`
    /// * `Error::SecretNotFound` - No issuer authentication secret is held
    pub async fn pack_from_prior(
        &self,
        from_prior: &FromPrior,
        issuer_kid: Option<&str>,
    ) -> Result<(String, String)> {
        from_prior::pack_from_prior(from_prior, issuer_kid, self.resolvers()).await
    }

    /// Verifies a `from_prior` rotation JWT.
    ///
    /// Returns the claims and the issuer key ID that signed them.
    ///
    /// # Errors
    /// * `Error::Malformed` - Not a valid, correctly signed JWT
    /// * `Error::DidUrlNotFound` - Signing key not an authentication key
    pub async fn unpack_from_prior(&self, jwt: &str) -> Result<(FromPrior, String)> {
        from_prior::unpack_from_prior(jwt, self.resolvers()).await
    }

    /// Wraps an already packed message for delivery through mediators.
    ///
    /// # Errors
    /// * `Error::IllegalArgument` - `to` is not a DID or `routing_keys` is
    ///   empty
    /// * `Error::Malformed` - `msg` is not JSON
    /// * any error resolving the routing keys
    pub async fn wrap_in_forward(
        &self,
        msg: &str,
        headers: Option<&BTreeMap<String, Value>>,
        to: &str,
        routing_keys: &[String],
        enc_alg_anon: AnonCryptAlg,
    ) -> Result<String> {
        forward::wrap_in_forward(msg, headers, to, routing_keys, enc_alg_anon, self.resolvers())
            .await
    }
}
