//! Content encryption keys and their AES key wrap.

use aes_kw::KekAes256;
use rand_core::{OsRng, RngCore};
use zeroize::Zeroize;

use super::error::{JweError, Result};
use super::key_agreement::KeyEncryptionKey;

/// A content encryption key.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct ContentEncryptionKey {
    key: Vec<u8>,
}

impl ContentEncryptionKey {
    /// Wraps existing key bytes.
    #[must_use]
    pub fn new(key: Vec<u8>) -> Self {
        Self { key }
    }

    /// Generates a random key of `size` bytes.
    #[must_use]
    pub fn generate(size: usize) -> Self {
        let mut key = vec![0u8; size];
        OsRng.fill_bytes(&mut key);
        Self { key }
    }

    /// Gets the raw key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.key
    }
}

impl std::fmt::Debug for ContentEncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ContentEncryptionKey({} bytes)", self.key.len())
    }
}

fn kek(kek: &KeyEncryptionKey) -> Result<KekAes256> {
    let bytes: [u8; 32] = kek
        .as_bytes()
        .try_into()
        .map_err(|_| JweError::InvalidKey("Key encryption key must be 32 bytes".into()))?;
    Ok(KekAes256::from(bytes))
}

/// Wraps a content encryption key using AES-KW (RFC 3394).
///
/// # Errors
/// * `JweError::Encryption` - If the key cannot be wrapped
pub fn wrap_key(kek_bytes: &KeyEncryptionKey, cek: &ContentEncryptionKey) -> Result<Vec<u8>> {
    kek(kek_bytes)?
        .wrap_vec(cek.as_bytes())
        .map_err(|e| JweError::Encryption(format!("Failed to wrap key: {e}")))
}

/// Unwraps a content encryption key using AES-KW.
///
/// # Errors
/// * `JweError::KeyUnwrap` - If the integrity check fails
pub fn unwrap_key(kek_bytes: &KeyEncryptionKey, wrapped: &[u8]) -> Result<ContentEncryptionKey> {
    let key = kek(kek_bytes)?
        .unwrap_vec(wrapped)
        .map_err(|_| JweError::KeyUnwrap)?;
    Ok(ContentEncryptionKey::new(key))
}
