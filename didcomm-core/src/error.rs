//! Error types for the didcomm-core crate.
//!
//! Every public operation reports failures through [`Error`], whose variants
//! form a closed taxonomy mirrored by [`ErrorKind`]. Callers that only need
//! to branch on the category can match on [`Error::kind`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for the DIDComm core library
#[derive(Debug, Error)]
pub enum Error {
    /// A DID could not be resolved to a DID Document
    #[error("DID not resolved: {0}")]
    DidNotResolved(String),
    /// A DID URL does not point at any verification method of its document
    #[error("DID URL not found: {0}")]
    DidUrlNotFound(String),
    /// None of the needed secrets is held by the secrets resolver
    #[error("Secret not found: {0}")]
    SecretNotFound(String),
    /// Structurally invalid input (JSON, envelope, signature, MAC, ...)
    #[error("Malformed: {0}")]
    Malformed(String),
    /// A resolver call failed with an I/O error or ran past its deadline
    #[error("IO error: {0}")]
    IoError(String),
    /// An unexpected condition, including untyped collaborator failures
    #[error("Invalid state: {0}")]
    InvalidState(String),
    /// Sender and recipient keys share no usable algorithm
    #[error("No compatible crypto: {0}")]
    NoCompatibleCrypto(String),
    /// The requested feature or algorithm is not supported
    #[error("Unsupported: {0}")]
    Unsupported(String),
    /// The caller passed an invalid combination of arguments
    #[error("Illegal argument: {0}")]
    IllegalArgument(String),
}

/// The closed set of error categories.
///
/// The ordinal of each variant is stable and part of the public contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// See [`Error::DidNotResolved`]
    DidNotResolved = 0,
    /// See [`Error::DidUrlNotFound`]
    DidUrlNotFound = 1,
    /// See [`Error::SecretNotFound`]
    SecretNotFound = 2,
    /// See [`Error::Malformed`]
    Malformed = 3,
    /// See [`Error::IoError`]
    IoError = 4,
    /// See [`Error::InvalidState`]
    InvalidState = 5,
    /// See [`Error::NoCompatibleCrypto`]
    NoCompatibleCrypto = 6,
    /// See [`Error::Unsupported`]
    Unsupported = 7,
    /// See [`Error::IllegalArgument`]
    IllegalArgument = 8,
}

impl Error {
    /// Builds an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        match kind {
            ErrorKind::DidNotResolved => Self::DidNotResolved(message),
            ErrorKind::DidUrlNotFound => Self::DidUrlNotFound(message),
            ErrorKind::SecretNotFound => Self::SecretNotFound(message),
            ErrorKind::Malformed => Self::Malformed(message),
            ErrorKind::IoError => Self::IoError(message),
            ErrorKind::InvalidState => Self::InvalidState(message),
            ErrorKind::NoCompatibleCrypto => Self::NoCompatibleCrypto(message),
            ErrorKind::Unsupported => Self::Unsupported(message),
            ErrorKind::IllegalArgument => Self::IllegalArgument(message),
        }
    }

    /// Returns the category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DidNotResolved(_) => ErrorKind::DidNotResolved,
            Self::DidUrlNotFound(_) => ErrorKind::DidUrlNotFound,
            Self::SecretNotFound(_) => ErrorKind::SecretNotFound,
            Self::Malformed(_) => ErrorKind::Malformed,
            Self::IoError(_) => ErrorKind::IoError,
            Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::NoCompatibleCrypto(_) => ErrorKind::NoCompatibleCrypto,
            Self::Unsupported(_) => ErrorKind::Unsupported,
            Self::IllegalArgument(_) => ErrorKind::IllegalArgument,
        }
    }

    /// Returns the human-readable message without the kind prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::DidNotResolved(m)
            | Self::DidUrlNotFound(m)
            | Self::SecretNotFound(m)
            | Self::Malformed(m)
            | Self::IoError(m)
            | Self::InvalidState(m)
            | Self::NoCompatibleCrypto(m)
            | Self::Unsupported(m)
            | Self::IllegalArgument(m) => m,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::DidNotResolved => "DidNotResolved",
            Self::DidUrlNotFound => "DidUrlNotFound",
            Self::SecretNotFound => "SecretNotFound",
            Self::Malformed => "Malformed",
            Self::IoError => "IoError",
            Self::InvalidState => "InvalidState",
            Self::NoCompatibleCrypto => "NoCompatibleCrypto",
            Self::Unsupported => "Unsupported",
            Self::IllegalArgument => "IllegalArgument",
        };
        f.write_str(name)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(format!("Invalid JSON: {err}"))
    }
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Self {
        Self::Malformed(format!("Invalid base64: {err}"))
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::InvalidState(format!("{err:#}"))
    }
}

/// Result type for the DIDComm core library
pub type Result<T> = std::result::Result<T, Error>;
