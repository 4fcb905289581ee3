//! Resolver traits the engine is parameterised with.
//!
//! The engine never fetches DID Documents or private keys itself. Callers
//! provide two collaborators:
//! - [`DidResolver`]: resolves a DID to its [`DidDoc`]
//! - [`SecretsResolver`]: hands out private keys the caller controls
//!
//! Both are async and must be `Send + Sync`, so one engine instance can serve
//! concurrent pack/unpack calls.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::collections::HashMap;
//! use didcomm_core::did::DidDoc;
//! use didcomm_core::plugin::DidResolver;
//! use didcomm_core::Result;
//!
//! struct StaticResolver {
//!     docs: HashMap<String, DidDoc>,
//! }
//!
//! #[async_trait::async_trait]
//! impl DidResolver for StaticResolver {
//!     async fn resolve(&self, did: &str) -> Result<Option<DidDoc>> {
//!         Ok(self.docs.get(did).cloned())
//!     }
//! }
//! ```

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::did::DidDoc;
use crate::error::{Error, Result};
use crate::secrets::Secret;

/// Resolves DIDs to DID Documents.
#[async_trait]
pub trait DidResolver: Send + Sync {
    /// Resolves a DID to its DID Document.
    ///
    /// # Arguments
    /// * `did` - The DID to resolve (e.g., "did:example:alice")
    ///
    /// # Returns
    /// The DID Document, or `None` if the DID is unknown
    ///
    /// # Errors
    /// Implementations report transport failures as `Error::IoError`; the
    /// engine propagates any error unchanged.
    async fn resolve(&self, did: &str) -> Result<Option<DidDoc>>;
}

/// Gives the engine access to the caller's private keys.
#[async_trait]
pub trait SecretsResolver: Send + Sync {
    /// Fetches a secret by key ID.
    ///
    /// # Arguments
    /// * `secret_id` - The key ID (DID URL) of the wanted secret
    ///
    /// # Returns
    /// The secret, or `None` if it is not held
    ///
    /// # Errors
    /// Any error is propagated unchanged by the engine.
    async fn get_secret(&self, secret_id: &str) -> Result<Option<Secret>>;

    /// Filters `secret_ids` down to the ones held.
    ///
    /// # Arguments
    /// * `secret_ids` - Candidate key IDs
    ///
    /// # Returns
    /// The held subset. Input order should be preserved since key selection
    /// follows the returned order.
    ///
    /// # Errors
    /// Any error is propagated unchanged by the engine.
    async fn find_secrets(&self, secret_ids: &[String]) -> Result<Vec<String>>;
}

/// The resolver pair of one engine call, with the configured deadline.
///
/// Every call goes through [`Resolvers::with_deadline`], so a hanging
/// resolver surfaces as `Error::IoError` instead of blocking forever.
#[derive(Clone, Copy)]
pub(crate) struct Resolvers<'a> {
    pub(crate) did: &'a dyn DidResolver,
    pub(crate) secrets: &'a dyn SecretsResolver,
    pub(crate) timeout: Option<Duration>,
}

impl<'a> Resolvers<'a> {
    pub(crate) fn new(
        did: &'a dyn DidResolver,
        secrets: &'a dyn SecretsResolver,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            did,
            secrets,
            timeout,
        }
    }

    async fn with_deadline<T>(
        &self,
        what: &str,
        call: impl Future<Output = Result<T>> + Send,
    ) -> Result<T> {
        match self.timeout {
            #[cfg(feature = "tokio")]
            Some(timeout) => tokio::time::timeout(timeout, call).await.map_err(|_| {
                warn!(call = what, ?timeout, "Resolver call timed out");
                Error::IoError(format!("{what} timed out after {timeout:?}"))
            })?,
            _ => call.await,
        }
    }

    /// Resolves `did`, treating an unknown DID as an error.
    pub(crate) async fn resolve(&self, did: &str) -> Result<DidDoc> {
        self.with_deadline("DID resolution", self.did.resolve(did))
            .await?
            .ok_or_else(|| Error::DidNotResolved(format!("Unable to resolve `{did}`")))
    }

    pub(crate) async fn get_secret(&self, kid: &str) -> Result<Option<Secret>> {
        self.with_deadline("Secret lookup", self.secrets.get_secret(kid))
            .await
    }

    pub(crate) async fn find_secrets(&self, kids: &[String]) -> Result<Vec<String>> {
        self.with_deadline("Secret search", self.secrets.find_secrets(kids))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use mockall::mock;

    mock! {
        Resolver {}

        #[async_trait]
        impl DidResolver for Resolver {
            async fn resolve(&self, did: &str) -> Result<Option<DidDoc>>;
        }
    }

    struct NoSecrets;

    #[async_trait]
    impl SecretsResolver for NoSecrets {
        async fn get_secret(&self, _secret_id: &str) -> Result<Option<Secret>> {
            Ok(None)
        }

        async fn find_secrets(&self, _secret_ids: &[String]) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_unknown_did_is_not_resolved() {
        let mut did = MockResolver::new();
        did.expect_resolve().returning(|_| Ok(None));

        let resolvers = Resolvers::new(&did, &NoSecrets, None);
        let err = resolvers.resolve("did:example:nobody").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DidNotResolved);
    }

    #[tokio::test]
    async fn test_resolver_errors_propagate_unchanged() {
        let mut did = MockResolver::new();
        did.expect_resolve()
            .returning(|_| Err(Error::IoError("connection refused".into())));

        let resolvers = Resolvers::new(&did, &NoSecrets, None);
        let err = resolvers.resolve("did:example:alice").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IoError);
        assert_eq!(err.message(), "connection refused");
    }
}
