//! Error types for JWE operations.
//!
//! [`JweError`] stays local to the envelope code; it converts into the
//! crate-wide [`crate::error::Error`] with the most specific kind.

use std::error::Error as StdError;
use std::fmt;

use crate::error::Error;

/// Result type for JWE operations.
pub type Result<T> = std::result::Result<T, JweError>;

/// Errors that can occur during JWE operations.
#[derive(Debug)]
pub enum JweError {
    /// The envelope is not a well-formed JWE
    InvalidFormat(String),

    /// The protected header is missing a field or carries a bad value
    Header(String),

    /// Invalid key material (wrong length, bad point, ...)
    InvalidKey(String),

    /// `alg` or `enc` is not one we implement
    UnsupportedAlgorithm(String),

    /// Failure while encrypting content or wrapping a key
    Encryption(String),

    /// Content encryption key could not be unwrapped
    KeyUnwrap,

    /// Authentication tag did not verify
    AuthenticationFailed,

    /// Base64 decoding error, with the field it happened in
    Base64(&'static str, base64::DecodeError),

    /// JSON serialization/deserialization error
    Serialization(serde_json::Error),
}

impl fmt::Display for JweError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFormat(msg) => write!(f, "Invalid format: {msg}"),
            Self::Header(msg) => write!(f, "Header error: {msg}"),
            Self::InvalidKey(msg) => write!(f, "Invalid key: {msg}"),
            Self::UnsupportedAlgorithm(alg) => write!(f, "Unsupported algorithm: {alg}"),
            Self::Encryption(msg) => write!(f, "Encryption error: {msg}"),
            Self::KeyUnwrap => write!(f, "Unable to unwrap content encryption key"),
            Self::AuthenticationFailed => write!(f, "Authentication failed"),
            Self::Base64(ctx, err) => write!(f, "Base64 error in {ctx}: {err}"),
            Self::Serialization(err) => write!(f, "Serialization error: {err}"),
        }
    }
}

impl StdError for JweError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Base64(_, err) => Some(err),
            Self::Serialization(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for JweError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err)
    }
}

impl From<JweError> for Error {
    fn from(err: JweError) -> Self {
        match err {
            JweError::UnsupportedAlgorithm(_) => Self::NoCompatibleCrypto(err.to_string()),
            JweError::Encryption(_) => Self::InvalidState(err.to_string()),
            _ => Self::Malformed(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_error_display() {
        let errors = [
            (JweError::InvalidFormat("test".into()), "Invalid format: test"),
            (JweError::Header("test".into()), "Header error: test"),
            (JweError::InvalidKey("test".into()), "Invalid key: test"),
            (JweError::UnsupportedAlgorithm("A128GCM".into()), "Unsupported algorithm: A128GCM"),
            (JweError::Encryption("test".into()), "Encryption error: test"),
            (JweError::AuthenticationFailed, "Authentication failed"),
        ];

        for (error, expected) in &errors {
            assert_eq!(error.to_string(), *expected);
        }
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            Error::from(JweError::UnsupportedAlgorithm("A128GCM".into())).kind(),
            ErrorKind::NoCompatibleCrypto
        );
        assert_eq!(Error::from(JweError::AuthenticationFailed).kind(), ErrorKind::Malformed);
        assert_eq!(Error::from(JweError::KeyUnwrap).kind(), ErrorKind::Malformed);

        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        assert!(matches!(JweError::from(json_err), JweError::Serialization(_)));
    }
}
