//! Layered unpacking of incoming wire messages.
//!
//! An incoming message is peeled layer by layer until a plaintext message
//! remains. The allowed nesting, outermost first, is
//! `anoncrypt? -> authcrypt? -> signed? -> plaintext`; any other order is
//! rejected as malformed. A Forward message addressed to keys we hold
//! starts the sequence over on the forwarded envelope.

use serde_json::Value;
use tracing::{debug, info};

use crate::crypto::PublicKey;
use crate::error::{Error, Result};
use crate::forward::try_parse_forward;
use crate::from_prior::unpack_from_prior;
use crate::jwe::header::{compute_apv, ProtectedHeader};
use crate::jwe::types::{ContentEncryptionAlgorithm, KeyAgreementAlgorithm};
use crate::jwe::{looks_like_jwe, Jwe};
use crate::jws::{looks_like_jws, ParsedJws};
use crate::message::Message;
use crate::pack::{private_key, public_key};
use crate::plugin::Resolvers;
use crate::types::{AnonCryptAlg, AuthCryptAlg, UnpackMetadata, UnpackOptions};
use crate::utils::did_or_url;

/// The last layer peeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Layer {
    Start,
    Anoncrypt,
    Authcrypt,
    Signed,
}

fn out_of_order(found: &str, after: Layer) -> Error {
    Error::Malformed(format!("Unexpected {found} layer after {after:?}"))
}

/// Unpacks `msg` into its plaintext message and what was learned about it.
///
/// # Errors
/// * `Error::Malformed` - Not JSON, an invalid envelope, layers out of
///   order, failed decryption or verification, or inconsistent senders
/// * `Error::SecretNotFound` - None of the recipient keys is held
/// * `Error::NoCompatibleCrypto` - Unsupported `alg`/`enc`
/// * `Error::DidUrlNotFound` - Sender or signer key not in its DID Document
/// * any resolver error
pub(crate) async fn unpack(
    msg: &str,
    options: &UnpackOptions,
    resolvers: Resolvers<'_>,
) -> Result<(Message, UnpackMetadata)> {
    let mut metadata = UnpackMetadata::default();
    let mut current = msg.to_string();
    let mut layer = Layer::Start;

    loop {
        let value: Value = serde_json::from_str(&current)?;

        if looks_like_jwe(&value) {
            let jwe = Jwe::parse(&current)?;
            let header = jwe.protected_header()?;
            match header.key_agreement()? {
                KeyAgreementAlgorithm::EcdhEsA256kw => {
                    if layer != Layer::Start {
                        return Err(out_of_order("anoncrypt", layer));
                    }
                    current = unpack_anoncrypt(&jwe, &header, options, &mut metadata, resolvers)
                        .await?;
                    layer = Layer::Anoncrypt;
                }
                KeyAgreementAlgorithm::Ecdh1puA256kw => {
                    if layer > Layer::Anoncrypt {
                        return Err(out_of_order("authcrypt", layer));
                    }
                    current = unpack_authcrypt(&jwe, &header, options, &mut metadata, resolvers)
                        .await?;
                    layer = Layer::Authcrypt;
                }
            }
            continue;
        }

        if looks_like_jws(&value) {
            if layer == Layer::Signed {
                return Err(out_of_order("signed", layer));
            }
            current = unpack_signed(&current, &mut metadata, resolvers).await?;
            layer = Layer::Signed;
            continue;
        }

        let message = Message::from_json(&current)?;
        check_senders(&message, &metadata)?;

        if options.unwrap_re_wrapping_forward {
            if let Some(forwarded) = rewrapped_forward(&message, resolvers).await? {
                debug!(id = %message.id, "Unwrapping forward addressed to us");
                metadata.re_wrapped_in_forward = true;
                current = forwarded;
                layer = Layer::Start;
                continue;
            }
        }

        if let Some(jwt) = message.from_prior.as_deref() {
            let (claims, kid) = unpack_from_prior(jwt, resolvers).await?;
            if message.from.as_deref() != Some(claims.sub.as_str()) {
                return Err(Error::Malformed(format!(
                    "from_prior `sub` does not match the sender of message {}",
                    message.id
                )));
            }
            metadata.from_prior_issuer_kid = Some(kid);
            metadata.from_prior = Some(claims);
        }

        info!(
            id = %message.id,
            encrypted = metadata.encrypted,
            authenticated = metadata.authenticated,
            non_repudiation = metadata.non_repudiation,
            "Unpacked message"
        );
        return Ok((message, metadata));
    }
}

fn check_apv(jwe: &Jwe, header: &ProtectedHeader) -> Result<()> {
    if compute_apv(&jwe.recipient_kids()) != header.apv {
        return Err(Error::Malformed(
            "JWE `apv` does not match the recipient key IDs".into(),
        ));
    }
    Ok(())
}

fn decoded_utf8(bytes: Vec<u8>, what: &str) -> Result<String> {
    String::from_utf8(bytes).map_err(|_| Error::Malformed(format!("{what} is not UTF-8")))
}

/// Decrypts with every held recipient key, or the first that works.
///
/// Returns the plaintext and the held key IDs.
async fn decrypt_with_held_keys(
    jwe: &Jwe,
    header: &ProtectedHeader,
    sender_key: Option<&PublicKey>,
    options: &UnpackOptions,
    resolvers: Resolvers<'_>,
) -> Result<(Vec<u8>, Vec<String>)> {
    let held = resolvers.find_secrets(&jwe.recipient_kids()).await?;
    if held.is_empty() {
        return Err(Error::SecretNotFound(
            "No secret held for any JWE recipient".into(),
        ));
    }

    let mut plaintext: Option<Vec<u8>> = None;
    let mut last_error = None;
    for kid in &held {
        let key = match private_key(kid, resolvers).await {
            Ok(key) => key,
            Err(e) if !options.expect_decrypt_by_all_keys => {
                debug!(kid = %kid, error = %e, "Recipient secret unusable");
                last_error = Some(e);
                continue;
            }
            Err(e) => return Err(e),
        };
        match jwe.decrypt(header, kid, &key, sender_key) {
            Ok(bytes) if !options.expect_decrypt_by_all_keys => return Ok((bytes, held)),
            Ok(bytes) => match &plaintext {
                Some(previous) if *previous != bytes => {
                    return Err(Error::Malformed(format!(
                        "Recipient `{kid}` decrypted to different content"
                    )));
                }
                Some(_) => {}
                None => plaintext = Some(bytes),
            },
            Err(e) if options.expect_decrypt_by_all_keys => {
                return Err(Error::Malformed(format!(
                    "Unable to decrypt for recipient `{kid}`: {}",
                    e.message()
                )));
            }
            Err(e) => {
                debug!(kid = %kid, error = %e, "Recipient key failed to decrypt");
                last_error = Some(e);
            }
        }
    }

    match (plaintext, last_error) {
        (Some(plaintext), _) => Ok((plaintext, held)),
        (None, Some(e)) => Err(e),
        (None, None) => Err(Error::Malformed("Unable to decrypt JWE".into())),
    }
}

async fn unpack_anoncrypt(
    jwe: &Jwe,
    header: &ProtectedHeader,
    options: &UnpackOptions,
    metadata: &mut UnpackMetadata,
    resolvers: Resolvers<'_>,
) -> Result<String> {
    let enc = header.content_encryption()?;
    check_apv(jwe, header)?;

    let (plaintext, to_kids) = decrypt_with_held_keys(jwe, header, None, options, resolvers).await?;
    debug!(enc = %enc, kids = ?to_kids, "Anoncrypt layer decrypted");

    metadata.encrypted = true;
    metadata.anonymous_sender = true;
    metadata.enc_alg_anon = Some(AnonCryptAlg::from_content_encryption(enc));
    metadata.encrypted_to_kids = Some(to_kids);
    decoded_utf8(plaintext, "Anoncrypt payload")
}

async fn unpack_authcrypt(
    jwe: &Jwe,
    header: &ProtectedHeader,
    options: &UnpackOptions,
    metadata: &mut UnpackMetadata,
    resolvers: Resolvers<'_>,
) -> Result<String> {
    let enc = header.content_encryption()?;
    let alg = match enc {
        ContentEncryptionAlgorithm::A256CbcHs512 => AuthCryptAlg::A256cbcHs512Ecdh1puA256kw,
        other => {
            return Err(Error::NoCompatibleCrypto(format!(
                "{other} is not supported with ECDH-1PU"
            )))
        }
    };
    check_apv(jwe, header)?;

    let skid = header.sender_kid()?;
    let (sender_did, fragment) = did_or_url(&skid);
    if fragment.is_none() {
        return Err(Error::Malformed(format!(
            "Sender key ID `{skid}` is not a DID URL"
        )));
    }
    let sender_doc = resolvers.resolve(sender_did).await?;
    if !sender_doc.key_agreement.iter().any(|kid| *kid == skid) {
        return Err(Error::DidUrlNotFound(format!(
            "`{skid}` is not a key agreement key of `{sender_did}`"
        )));
    }
    let sender_key = public_key(&sender_doc, &skid)?;

    let (plaintext, to_kids) =
        decrypt_with_held_keys(jwe, header, Some(&sender_key), options, resolvers).await?;
    debug!(skid = %skid, kids = ?to_kids, "Authcrypt layer decrypted");

    metadata.encrypted = true;
    metadata.authenticated = true;
    metadata.encrypted_from_kid = Some(skid);
    metadata.enc_alg_auth = Some(alg);
    metadata.encrypted_to_kids = Some(to_kids);
    decoded_utf8(plaintext, "Authcrypt payload")
}

async fn unpack_signed(
    msg: &str,
    metadata: &mut UnpackMetadata,
    resolvers: Resolvers<'_>,
) -> Result<String> {
    let jws = ParsedJws::parse(msg)?;
    let (signer_did, fragment) = did_or_url(&jws.kid);
    if fragment.is_none() {
        return Err(Error::Malformed(format!(
            "Signer key ID `{}` is not a DID URL",
            jws.kid
        )));
    }
    let signer_doc = resolvers.resolve(signer_did).await?;
    if !signer_doc.authentication.iter().any(|kid| *kid == jws.kid) {
        return Err(Error::DidUrlNotFound(format!(
            "`{}` is not an authentication key of `{signer_did}`",
            jws.kid
        )));
    }
    let key = public_key(&signer_doc, &jws.kid)?;
    let alg = jws.verify(&key)?;
    debug!(kid = %jws.kid, alg = %alg, "Signature verified");

    metadata.non_repudiation = true;
    metadata.sign_from = Some(jws.kid.clone());
    metadata.sign_alg = Some(alg);
    metadata.signed_message = Some(msg.to_string());
    decoded_utf8(jws.payload_bytes()?, "JWS payload")
}

/// The sender identities of the peeled layers must agree with `from`.
fn check_senders(message: &Message, metadata: &UnpackMetadata) -> Result<()> {
    let layers = [
        ("authcrypt sender", metadata.encrypted_from_kid.as_deref()),
        ("signer", metadata.sign_from.as_deref()),
    ];
    for (what, kid) in layers {
        let Some(kid) = kid else { continue };
        if message.from.as_deref() != Some(did_or_url(kid).0) {
            return Err(Error::Malformed(format!(
                "The {what} `{kid}` does not match the sender of message {}",
                message.id
            )));
        }
    }
    Ok(())
}

/// The forwarded envelope of a Forward message we can decrypt ourselves.
async fn rewrapped_forward(message: &Message, resolvers: Resolvers<'_>) -> Result<Option<String>> {
    let Some(forward) = try_parse_forward(message) else {
        return Ok(None);
    };
    if !looks_like_jwe(&forward.forwarded_msg) {
        return Ok(None);
    }
    let forwarded = serde_json::to_string(&forward.forwarded_msg)?;
    let Ok(jwe) = Jwe::parse(&forwarded) else {
        return Ok(None);
    };
    let held = resolvers.find_secrets(&jwe.recipient_kids()).await?;
    if held.is_empty() {
        debug!(next = %forward.next, "Forward is not addressed to us");
        return Ok(None);
    }
    Ok(Some(forwarded))
}
