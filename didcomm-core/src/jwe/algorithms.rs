//! Content encryption algorithms for JWE.
//!
//! - `A256CBC-HS512`: AES-256-CBC with HMAC-SHA-512 truncated to 256 bits,
//!   composed as in RFC 7518 section 5.2
//! - `A256GCM`: AES-256-GCM with a 96-bit nonce
//! - `XC20P`: XChaCha20-Poly1305 with a 192-bit nonce
//!
//! Every function takes the protected header bytes as additional
//! authenticated data. Nonces are always random.

use aes::cipher::{generic_array::GenericArray, BlockDecrypt, BlockEncrypt, KeyInit};
use aes::Aes256;
use aes_gcm::aead::{Aead, Payload};
use aes_gcm::Aes256Gcm;
use chacha20poly1305::XChaCha20Poly1305;
use hmac::{Hmac, Mac};
use rand_core::{OsRng, RngCore};
use sha2::Sha512;

use super::error::{JweError, Result};
use super::key_wrapping::ContentEncryptionKey;
use super::types::ContentEncryptionAlgorithm;

type HmacSha512 = Hmac<Sha512>;

/// The size of an AES block in bytes.
const AES_BLOCK_SIZE: usize = 16;

/// The size of the truncated HMAC-SHA-512 tag in bytes.
const CBC_HMAC_TAG_SIZE: usize = 32;

/// The size of an AEAD authentication tag in bytes.
const AEAD_TAG_SIZE: usize = 16;

/// Output of content encryption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedContent {
    /// Initialization vector / nonce
    pub iv: Vec<u8>,
    /// Ciphertext without tag
    pub ciphertext: Vec<u8>,
    /// Authentication tag
    pub tag: Vec<u8>,
}

fn random_bytes(size: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; size];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

fn check_key(enc: ContentEncryptionAlgorithm, key: &[u8]) -> Result<()> {
    if key.len() == enc.key_size() {
        Ok(())
    } else {
        Err(JweError::InvalidKey(format!(
            "{enc} needs a {} byte key, got {}",
            enc.key_size(),
            key.len()
        )))
    }
}

/// Encrypts `plaintext` with a fresh random IV.
///
/// # Errors
/// * `JweError::InvalidKey` - The key size does not match `enc`
/// * `JweError::Encryption` - The cipher failed
pub fn encrypt_content(
    enc: ContentEncryptionAlgorithm,
    cek: &ContentEncryptionKey,
    aad: &[u8],
    plaintext: &[u8],
) -> Result<EncryptedContent> {
    let key = cek.as_bytes();
    check_key(enc, key)?;
    let iv = random_bytes(enc.iv_size());
    let (ciphertext, tag) = match enc {
        ContentEncryptionAlgorithm::A256CbcHs512 => encrypt_aes_cbc_hmac(key, &iv, aad, plaintext)?,
        ContentEncryptionAlgorithm::A256Gcm => {
            let cipher = Aes256Gcm::new_from_slice(key)
                .map_err(|e| JweError::InvalidKey(e.to_string()))?;
            seal(&cipher, GenericArray::from_slice(&iv), aad, plaintext)?
        }
        ContentEncryptionAlgorithm::Xc20P => {
            let cipher = XChaCha20Poly1305::new_from_slice(key)
                .map_err(|e| JweError::InvalidKey(e.to_string()))?;
            seal(&cipher, GenericArray::from_slice(&iv), aad, plaintext)?
        }
    };
    Ok(EncryptedContent {
        iv,
        ciphertext,
        tag,
    })
}

/// Verifies the tag and decrypts.
///
/// # Errors
/// * `JweError::InvalidKey` - The key size does not match `enc`
/// * `JweError::InvalidFormat` - IV or tag has the wrong size
/// * `JweError::AuthenticationFailed` - Tag mismatch or bad padding
pub fn decrypt_content(
    enc: ContentEncryptionAlgorithm,
    cek: &ContentEncryptionKey,
    aad: &[u8],
    content: &EncryptedContent,
) -> Result<Vec<u8>> {
    let key = cek.as_bytes();
    check_key(enc, key)?;
    if content.iv.len() != enc.iv_size() {
        return Err(JweError::InvalidFormat(format!(
            "{enc} needs a {} byte IV, got {}",
            enc.iv_size(),
            content.iv.len()
        )));
    }
    match enc {
        ContentEncryptionAlgorithm::A256CbcHs512 => decrypt_aes_cbc_hmac(key, aad, content),
        ContentEncryptionAlgorithm::A256Gcm => {
            let cipher = Aes256Gcm::new_from_slice(key)
                .map_err(|e| JweError::InvalidKey(e.to_string()))?;
            open(&cipher, GenericArray::from_slice(&content.iv), aad, content)
        }
        ContentEncryptionAlgorithm::Xc20P => {
            let cipher = XChaCha20Poly1305::new_from_slice(key)
                .map_err(|e| JweError::InvalidKey(e.to_string()))?;
            open(&cipher, GenericArray::from_slice(&content.iv), aad, content)
        }
    }
}

fn seal<A: Aead>(
    cipher: &A,
    nonce: &aes_gcm::aead::Nonce<A>,
    aad: &[u8],
    plaintext: &[u8],
) -> Result<(Vec<u8>, Vec<u8>)> {
    let mut sealed = cipher
        .encrypt(nonce, Payload { msg: plaintext, aad })
        .map_err(|e| JweError::Encryption(e.to_string()))?;
    let tag = sealed.split_off(sealed.len() - AEAD_TAG_SIZE);
    Ok((sealed, tag))
}

fn open<A: Aead>(
    cipher: &A,
    nonce: &aes_gcm::aead::Nonce<A>,
    aad: &[u8],
    content: &EncryptedContent,
) -> Result<Vec<u8>> {
    if content.tag.len() != AEAD_TAG_SIZE {
        return Err(JweError::InvalidFormat("Invalid authentication tag length".into()));
    }
    let mut sealed = Vec::with_capacity(content.ciphertext.len() + AEAD_TAG_SIZE);
    sealed.extend_from_slice(&content.ciphertext);
    sealed.extend_from_slice(&content.tag);
    cipher
        .decrypt(nonce, Payload { msg: &sealed, aad })
        .map_err(|_| JweError::AuthenticationFailed)
}

fn cbc_hmac_tag(mac_key: &[u8], aad: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<HmacSha512> {
    let mut mac = <HmacSha512 as Mac>::new_from_slice(mac_key)
        .map_err(|e| JweError::InvalidKey(e.to_string()))?;
    let aad_bits = (aad.len() as u64) * 8;
    mac.update(aad);
    mac.update(iv);
    mac.update(ciphertext);
    mac.update(&aad_bits.to_be_bytes());
    Ok(mac)
}

/// Encrypts with AES-256-CBC + HMAC-SHA-512.
///
/// The 64-byte key splits into the MAC key (first half) and the AES key
/// (second half).
fn encrypt_aes_cbc_hmac(
    key: &[u8],
    iv: &[u8],
    aad: &[u8],
    plaintext: &[u8],
) -> Result<(Vec<u8>, Vec<u8>)> {
    let (mac_key, enc_key) = key.split_at(key.len() / 2);
    let cipher = Aes256::new(GenericArray::from_slice(enc_key));

    // PKCS#7: always pad, a full block when already aligned
    let pad = AES_BLOCK_SIZE - plaintext.len() % AES_BLOCK_SIZE;
    let mut data = Vec::with_capacity(plaintext.len() + pad);
    data.extend_from_slice(plaintext);
    #[allow(clippy::cast_possible_truncation)]
    data.resize(plaintext.len() + pad, pad as u8);

    let mut prev = [0u8; AES_BLOCK_SIZE];
    prev.copy_from_slice(iv);
    for block in data.chunks_exact_mut(AES_BLOCK_SIZE) {
        block.iter_mut().zip(prev.iter()).for_each(|(b, p)| *b ^= p);
        cipher.encrypt_block(GenericArray::from_mut_slice(block));
        prev.copy_from_slice(block);
    }

    let tag = cbc_hmac_tag(mac_key, aad, iv, &data)?.finalize().into_bytes();
    Ok((data, tag[..CBC_HMAC_TAG_SIZE].to_vec()))
}

fn decrypt_aes_cbc_hmac(key: &[u8], aad: &[u8], content: &EncryptedContent) -> Result<Vec<u8>> {
    let (mac_key, enc_key) = key.split_at(key.len() / 2);
    if content.tag.len() != CBC_HMAC_TAG_SIZE {
        return Err(JweError::InvalidFormat("Invalid authentication tag length".into()));
    }
    cbc_hmac_tag(mac_key, aad, &content.iv, &content.ciphertext)?
        .verify_truncated_left(&content.tag)
        .map_err(|_| JweError::AuthenticationFailed)?;

    let ciphertext = &content.ciphertext;
    if ciphertext.is_empty() || ciphertext.len() % AES_BLOCK_SIZE != 0 {
        return Err(JweError::AuthenticationFailed);
    }

    let cipher = Aes256::new(GenericArray::from_slice(enc_key));
    let mut data = ciphertext.clone();
    let mut prev = [0u8; AES_BLOCK_SIZE];
    prev.copy_from_slice(&content.iv);
    for block in data.chunks_exact_mut(AES_BLOCK_SIZE) {
        let mut saved = [0u8; AES_BLOCK_SIZE];
        saved.copy_from_slice(block);
        cipher.decrypt_block(GenericArray::from_mut_slice(block));
        block.iter_mut().zip(prev.iter()).for_each(|(b, p)| *b ^= p);
        prev = saved;
    }

    let pad = usize::from(*data.last().ok_or(JweError::AuthenticationFailed)?);
    if pad == 0 || pad > AES_BLOCK_SIZE || data[data.len() - pad..].iter().any(|&b| usize::from(b) != pad) {
        return Err(JweError::AuthenticationFailed);
    }
    data.truncate(data.len() - pad);
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [ContentEncryptionAlgorithm; 3] = [
        ContentEncryptionAlgorithm::A256CbcHs512,
        ContentEncryptionAlgorithm::A256Gcm,
        ContentEncryptionAlgorithm::Xc20P,
    ];

    #[test]
    fn test_content_encryption() {
        for enc in ALL {
            let cek = ContentEncryptionKey::generate(enc.key_size());
            let aad = b"protected header";
            let plaintext = b"test message";

            let content = encrypt_content(enc, &cek, aad, plaintext).unwrap();
            assert_eq!(content.iv.len(), enc.iv_size());
            let decrypted = decrypt_content(enc, &cek, aad, &content).unwrap();
            assert_eq!(decrypted, plaintext);
        }
    }

    #[test]
    fn test_tamper_detection() {
        for enc in ALL {
            let cek = ContentEncryptionKey::generate(enc.key_size());
            let content = encrypt_content(enc, &cek, b"aad", b"test message").unwrap();

            let mut tampered = content.clone();
            tampered.ciphertext[0] ^= 1;
            assert!(matches!(
                decrypt_content(enc, &cek, b"aad", &tampered),
                Err(JweError::AuthenticationFailed)
            ));

            let mut tampered = content.clone();
            tampered.tag[0] ^= 1;
            assert!(decrypt_content(enc, &cek, b"aad", &tampered).is_err());

            assert!(decrypt_content(enc, &cek, b"other aad", &content).is_err());
        }
    }

    #[test]
    fn test_invalid_key_material() {
        let cek = ContentEncryptionKey::generate(16);
        for enc in ALL {
            assert!(matches!(
                encrypt_content(enc, &cek, b"", b"test"),
                Err(JweError::InvalidKey(_))
            ));
        }
    }

    #[test]
    fn test_aes_cbc_hmac_padding() {
        let enc = ContentEncryptionAlgorithm::A256CbcHs512;
        let cek = ContentEncryptionKey::generate(64);
        for len in [0, 1, 15, 16, 17, 32] {
            let plaintext = vec![0xab; len];
            let content = encrypt_content(enc, &cek, b"", &plaintext).unwrap();
            assert_eq!(content.ciphertext.len(), (len / 16 + 1) * 16);
            assert_eq!(decrypt_content(enc, &cek, b"", &content).unwrap(), plaintext);
        }
    }

    #[test]
    fn test_wrong_iv_length_is_rejected() {
        let enc = ContentEncryptionAlgorithm::Xc20P;
        let cek = ContentEncryptionKey::generate(32);
        let mut content = encrypt_content(enc, &cek, b"", b"test").unwrap();
        content.iv.truncate(12);
        assert!(matches!(
            decrypt_content(enc, &cek, b"", &content),
            Err(JweError::InvalidFormat(_))
        ));
    }
}
