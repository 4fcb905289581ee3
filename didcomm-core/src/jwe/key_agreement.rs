//! Key encryption key derivation for ECDH-ES and ECDH-1PU.
//!
//! Both modes run the shared secret through the Concat KDF of NIST SP
//! 800-56A with SHA-256, as profiled by RFC 7518 section 4.6. ECDH-1PU
//! (draft-madden-jose-ecdh-1pu-04) concatenates the ephemeral and static
//! secrets and binds the content authentication tag into `SuppPubInfo`.

use sha2::{Digest, Sha256};
use zeroize::{Zeroize, Zeroizing};

use super::types::KeyAgreementAlgorithm;

/// Length of the derived key in bits (A256KW).
const KEY_DATA_LEN_BITS: u32 = 256;

/// A key encryption key derived from ECDH.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct KeyEncryptionKey {
    key: Vec<u8>,
}

impl KeyEncryptionKey {
    /// Creates a new key encryption key.
    #[must_use]
    pub fn new(key: Vec<u8>) -> Self {
        Self { key }
    }

    /// Gets the raw key bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.key
    }
}

fn length_prefixed(out: &mut Vec<u8>, data: &[u8]) {
    // Fields are bounded by header sizes, far below u32::MAX.
    #[allow(clippy::cast_possible_truncation)]
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(data);
}

/// Concat KDF with SHA-256 producing a 256-bit key.
///
/// A single hash round suffices since the output length equals the digest
/// length.
fn concat_kdf(
    z: &[u8],
    alg: KeyAgreementAlgorithm,
    apu: &[u8],
    apv: &[u8],
    tag: Option<&[u8]>,
) -> KeyEncryptionKey {
    let mut other_info = Vec::with_capacity(64 + apu.len() + apv.len());
    length_prefixed(&mut other_info, alg.as_str().as_bytes());
    length_prefixed(&mut other_info, apu);
    length_prefixed(&mut other_info, apv);
    other_info.extend_from_slice(&KEY_DATA_LEN_BITS.to_be_bytes());
    if let Some(tag) = tag {
        length_prefixed(&mut other_info, tag);
    }

    let mut hasher = Sha256::new();
    hasher.update(1u32.to_be_bytes());
    hasher.update(z);
    hasher.update(&other_info);
    KeyEncryptionKey::new(hasher.finalize().to_vec())
}

/// Derives a key encryption key using ECDH-ES.
///
/// `apu` and `apv` are the decoded header values.
#[must_use]
pub fn derive_key_encryption_key_es(shared_secret: &[u8], apu: &[u8], apv: &[u8]) -> KeyEncryptionKey {
    concat_kdf(shared_secret, KeyAgreementAlgorithm::EcdhEsA256kw, apu, apv, None)
}

/// Derives a key encryption key using ECDH-1PU.
///
/// `ephemeral_secret` is `Ze` (ephemeral with recipient), `static_secret` is
/// `Zs` (sender static with recipient), and `tag` is the content
/// authentication tag of the JWE being wrapped for.
#[must_use]
pub fn derive_key_encryption_key_1pu(
    ephemeral_secret: &[u8],
    static_secret: &[u8],
    apu: &[u8],
    apv: &[u8],
    tag: &[u8],
) -> KeyEncryptionKey {
    let mut z = Zeroizing::new(Vec::with_capacity(ephemeral_secret.len() + static_secret.len()));
    z.extend_from_slice(ephemeral_secret);
    z.extend_from_slice(static_secret);
    concat_kdf(&z, KeyAgreementAlgorithm::Ecdh1puA256kw, apu, apv, Some(tag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{Curve, PrivateKey};

    #[test]
    fn test_key_derivation_es() {
        for curve in [Curve::X25519, Curve::P256, Curve::P384, Curve::P521] {
            let ephemeral = PrivateKey::generate(curve);
            let bob = PrivateKey::generate(curve);

            let sender_z = ephemeral.diffie_hellman(&bob.public_key()).unwrap();
            let sender_kek = derive_key_encryption_key_es(&sender_z, b"", b"bob");

            let recipient_z = bob.diffie_hellman(&ephemeral.public_key()).unwrap();
            let recipient_kek = derive_key_encryption_key_es(&recipient_z, b"", b"bob");

            assert_eq!(sender_kek.as_bytes(), recipient_kek.as_bytes());
            assert_eq!(sender_kek.as_bytes().len(), 32);
        }
    }

    #[test]
    fn test_key_derivation_1pu() {
        for curve in [Curve::X25519, Curve::P256, Curve::P384, Curve::P521] {
            let alice = PrivateKey::generate(curve);
            let ephemeral = PrivateKey::generate(curve);
            let bob = PrivateKey::generate(curve);
            let tag = [9u8; 32];

            let ze = ephemeral.diffie_hellman(&bob.public_key()).unwrap();
            let zs = alice.diffie_hellman(&bob.public_key()).unwrap();
            let sender_kek = derive_key_encryption_key_1pu(&ze, &zs, b"alice", b"bob", &tag);

            let ze = bob.diffie_hellman(&ephemeral.public_key()).unwrap();
            let zs = bob.diffie_hellman(&alice.public_key()).unwrap();
            let recipient_kek = derive_key_encryption_key_1pu(&ze, &zs, b"alice", b"bob", &tag);

            assert_eq!(sender_kek.as_bytes(), recipient_kek.as_bytes());

            let other_tag = derive_key_encryption_key_1pu(&ze, &zs, b"alice", b"bob", &[0u8; 32]);
            assert_ne!(sender_kek.as_bytes(), other_tag.as_bytes());
        }
    }

    #[test]
    fn test_party_info_changes_key() {
        let z = [1u8; 32];
        let kek = derive_key_encryption_key_es(&z, b"Alice", b"Bob");
        let kek2 = derive_key_encryption_key_es(&z, b"", b"");
        assert_ne!(kek.as_bytes(), kek2.as_bytes());
    }
}
