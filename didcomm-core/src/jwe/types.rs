//! Algorithm identifiers used in JWE headers.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::JweError;

/// Key agreement algorithms supported for JWE.
///
/// - `ECDH-ES+A256KW` provides anonymous encryption (anoncrypt)
/// - `ECDH-1PU+A256KW` provides authenticated encryption (authcrypt)
///
/// Both wrap the content encryption key with AES key wrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyAgreementAlgorithm {
    /// ECDH-ES with AES key wrap
    #[serde(rename = "ECDH-ES+A256KW")]
    EcdhEsA256kw,
    /// ECDH-1PU with AES key wrap
    #[serde(rename = "ECDH-1PU+A256KW")]
    Ecdh1puA256kw,
}

impl KeyAgreementAlgorithm {
    /// JOSE `alg` value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EcdhEsA256kw => "ECDH-ES+A256KW",
            Self::Ecdh1puA256kw => "ECDH-1PU+A256KW",
        }
    }
}

impl FromStr for KeyAgreementAlgorithm {
    type Err = JweError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ECDH-ES+A256KW" => Ok(Self::EcdhEsA256kw),
            "ECDH-1PU+A256KW" => Ok(Self::Ecdh1puA256kw),
            other => Err(JweError::UnsupportedAlgorithm(format!("alg `{other}`"))),
        }
    }
}

/// Content encryption algorithms supported for JWE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentEncryptionAlgorithm {
    /// AES-256-CBC with HMAC-SHA-512 for authentication
    #[serde(rename = "A256CBC-HS512")]
    A256CbcHs512,
    /// AES-256-GCM
    #[serde(rename = "A256GCM")]
    A256Gcm,
    /// XChaCha20-Poly1305
    #[serde(rename = "XC20P")]
    Xc20P,
}

impl ContentEncryptionAlgorithm {
    /// JOSE `enc` value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A256CbcHs512 => "A256CBC-HS512",
            Self::A256Gcm => "A256GCM",
            Self::Xc20P => "XC20P",
        }
    }

    /// Size of the content encryption key in bytes.
    #[must_use]
    pub fn key_size(&self) -> usize {
        match self {
            Self::A256CbcHs512 => 64,
            Self::A256Gcm | Self::Xc20P => 32,
        }
    }

    /// Size of the IV / nonce in bytes.
    #[must_use]
    pub fn iv_size(&self) -> usize {
        match self {
            Self::A256CbcHs512 => 16,
            Self::A256Gcm => 12,
            Self::Xc20P => 24,
        }
    }
}

impl FromStr for ContentEncryptionAlgorithm {
    type Err = JweError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A256CBC-HS512" => Ok(Self::A256CbcHs512),
            "A256GCM" => Ok(Self::A256Gcm),
            "XC20P" => Ok(Self::Xc20P),
            other => Err(JweError::UnsupportedAlgorithm(format!("enc `{other}`"))),
        }
    }
}

impl std::fmt::Display for ContentEncryptionAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for KeyAgreementAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
