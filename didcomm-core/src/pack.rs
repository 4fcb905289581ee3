//! Message packing: plaintext, signed and encrypted envelopes.
//!
//! Key selection rules shared with the other pipelines live here too:
//! - signing keys come from the DID Document's `authentication` list
//! - encryption keys come from its `keyAgreement` list
//! - among several candidates, the first one the secrets resolver holds
//!   wins, in DID Document order

use tracing::{debug, info};

use crate::crypto::{PrivateKey, PublicKey};
use crate::did::DidDoc;
use crate::error::{Error, Result};
use crate::forward::wrap_in_forward;
use crate::from_prior::unpack_from_prior;
use crate::jwe;
use crate::jws;
use crate::message::Message;
use crate::plugin::Resolvers;
use crate::types::{
    MessagingServiceMetadata, PackEncryptedMetadata, PackEncryptedOptions, PackSignedMetadata,
};
use crate::utils::{did_or_url, validate_did};

/// Public key of `kid` as declared in `doc`.
pub(crate) fn public_key(doc: &DidDoc, kid: &str) -> Result<PublicKey> {
    let vm = doc.verification_method(kid).ok_or_else(|| {
        Error::DidUrlNotFound(format!("No verification method `{kid}` in `{}`", doc.id))
    })?;
    PublicKey::from_verification_method(vm)
}

/// Fetches and decodes the secret for `kid`.
pub(crate) async fn private_key(kid: &str, resolvers: Resolvers<'_>) -> Result<PrivateKey> {
    let secret = resolvers
        .get_secret(kid)
        .await?
        .ok_or_else(|| Error::SecretNotFound(format!("No secret for `{kid}`")))?;
    PrivateKey::from_secret(&secret)
}

/// Picks the signing key for `sign_by` (a DID or a DID URL).
///
/// A DID URL must be listed in `authentication`; a bare DID selects the
/// first authentication key whose secret is held.
pub(crate) async fn signing_key(
    sign_by: &str,
    resolvers: Resolvers<'_>,
) -> Result<(String, PrivateKey)> {
    validate_did(sign_by)?;
    let (did, fragment) = did_or_url(sign_by);
    let doc = resolvers.resolve(did).await?;

    let candidates = match fragment {
        Some(_) => {
            if !doc.authentication.iter().any(|kid| kid == sign_by) {
                return Err(Error::IllegalArgument(format!(
                    "`{sign_by}` is not an authentication key of `{did}`"
                )));
            }
            vec![sign_by.to_string()]
        }
        None => doc.authentication.clone(),
    };
    if candidates.is_empty() {
        return Err(Error::DidUrlNotFound(format!(
            "`{did}` has no authentication keys"
        )));
    }

    let held = resolvers.find_secrets(&candidates).await?;
    let kid = held.into_iter().next().ok_or_else(|| {
        Error::SecretNotFound(format!("No secret held for the authentication keys of `{did}`"))
    })?;
    debug!(did, kid = %kid, "Selected signing key");
    let key = private_key(&kid, resolvers).await?;
    Ok((kid, key))
}

/// Key agreement keys addressed by `to` (a DID or a DID URL), in DID
/// Document order.
pub(crate) async fn key_agreement_keys(
    to: &str,
    resolvers: Resolvers<'_>,
) -> Result<(DidDoc, Vec<(String, PublicKey)>)> {
    validate_did(to)?;
    let (did, fragment) = did_or_url(to);
    let doc = resolvers.resolve(did).await?;

    let kids: Vec<&String> = match fragment {
        Some(_) => doc.key_agreement.iter().filter(|kid| *kid == to).collect(),
        None => doc.key_agreement.iter().collect(),
    };
    if kids.is_empty() {
        return Err(Error::DidUrlNotFound(format!(
            "No key agreement keys found for `{to}`"
        )));
    }

    let keys = kids
        .into_iter()
        .map(|kid| Ok((kid.clone(), public_key(&doc, kid)?)))
        .collect::<Result<Vec<_>>>()?;
    Ok((doc, keys))
}

/// Keeps the keys sharing the curve of the first one.
pub(crate) fn first_curve_keys(keys: Vec<(String, PublicKey)>) -> Vec<(String, PublicKey)> {
    let Some(curve) = keys.first().map(|(_, key)| key.curve()) else {
        return keys;
    };
    keys.into_iter()
        .filter(|(_, key)| key.curve() == curve)
        .collect()
}

/// Picks the sender key for authcrypt and the recipient keys it can reach.
///
/// Sender candidates are tried in the order the secrets resolver returns
/// them; the first one sharing a curve with some recipient key wins.
async fn authcrypt_keys(
    from: &str,
    recipient_keys: &[(String, PublicKey)],
    resolvers: Resolvers<'_>,
) -> Result<(String, PrivateKey, Vec<(String, PublicKey)>)> {
    let (doc, sender_keys) = key_agreement_keys(from, resolvers).await?;
    let candidates: Vec<String> = sender_keys.iter().map(|(kid, _)| kid.clone()).collect();
    let held = resolvers.find_secrets(&candidates).await?;
    if held.is_empty() {
        return Err(Error::SecretNotFound(format!(
            "No secret held for the key agreement keys of `{from}`"
        )));
    }

    for kid in held {
        let curve = public_key(&doc, &kid)?.curve();
        let matching: Vec<_> = recipient_keys
            .iter()
            .filter(|(_, key)| key.curve() == curve)
            .cloned()
            .collect();
        if !matching.is_empty() {
            debug!(kid = %kid, %curve, recipients = matching.len(), "Selected authcrypt keys");
            let key = private_key(&kid, resolvers).await?;
            return Ok((kid, key, matching));
        }
    }

    Err(Error::NoCompatibleCrypto(format!(
        "No common key agreement curve between `{from}` and the recipient"
    )))
}

/// Validates the message and its `from_prior`, then serializes it.
///
/// A `from_prior` JWT must verify against its issuer and name the message
/// sender as `sub`.
async fn embed_from_prior(msg: &Message, resolvers: Resolvers<'_>) -> Result<String> {
    msg.validate()?;
    if let Some(jwt) = msg.from_prior.as_deref() {
        let (claims, _) = unpack_from_prior(jwt, resolvers).await?;
        if msg.from.as_deref() != Some(claims.sub.as_str()) {
            return Err(Error::IllegalArgument(
                "from_prior `sub` does not match the message sender".into(),
            ));
        }
    }
    msg.to_json()
}

/// Serializes a message without any protection.
///
/// # Errors
/// * `Error::Malformed` - The message lacks `id`, `type` or `typ`, or
///   carries an invalid `from_prior`
/// * `Error::IllegalArgument` - `from_prior` was issued for another sender
pub(crate) async fn pack_plaintext(msg: &Message, resolvers: Resolvers<'_>) -> Result<String> {
    embed_from_prior(msg, resolvers).await
}

/// Signs a message with a key of `sign_by`.
pub(crate) async fn pack_signed(
    msg: &Message,
    sign_by: &str,
    resolvers: Resolvers<'_>,
) -> Result<(String, PackSignedMetadata)> {
    let payload = embed_from_prior(msg, resolvers).await?;
    sign_payload(&payload, msg, sign_by, resolvers).await
}

async fn sign_payload(
    payload: &str,
    msg: &Message,
    sign_by: &str,
    resolvers: Resolvers<'_>,
) -> Result<(String, PackSignedMetadata)> {
    if let Some(from) = msg.from.as_deref() {
        if did_or_url(sign_by).0 != from {
            return Err(Error::IllegalArgument(format!(
                "`sign_by` DID does not match `from` of message {}",
                msg.id
            )));
        }
    }
    let (kid, key) = signing_key(sign_by, resolvers).await?;
    let signed = jws::sign(payload.as_bytes(), &kid, &key)?;
    info!(id = %msg.id, kid = %kid, "Packed signed message");
    Ok((signed, PackSignedMetadata { sign_by_kid: kid }))
}

fn validate_encrypted_args(
    msg: &Message,
    to: &str,
    from: Option<&str>,
    sign_by: Option<&str>,
) -> Result<()> {
    validate_did(to)?;
    let (to_did, _) = did_or_url(to);
    if let Some(recipients) = &msg.to {
        if !recipients.iter().any(|r| r == to_did) {
            return Err(Error::IllegalArgument(format!(
                "`{to_did}` is not among the recipients of message {}",
                msg.id
            )));
        }
    }

    if let Some(from) = from {
        validate_did(from)?;
        let (from_did, _) = did_or_url(from);
        if msg.from.as_deref() != Some(from_did) {
            return Err(Error::IllegalArgument(format!(
                "`from` does not match the sender of message {}",
                msg.id
            )));
        }
    }

    if let Some(sign_by) = sign_by {
        validate_did(sign_by)?;
        if let Some(from) = from {
            if did_or_url(sign_by).0 != did_or_url(from).0 {
                return Err(Error::IllegalArgument(
                    "`sign_by` DID does not match `from` DID".into(),
                ));
            }
        }
    }
    Ok(())
}

fn messaging_service(
    doc: &DidDoc,
    options: &PackEncryptedOptions,
) -> Result<Option<(MessagingServiceMetadata, Vec<String>)>> {
    let service = match options.messaging_service.as_deref() {
        Some(id) => {
            let service = doc.service(id).ok_or_else(|| {
                Error::IllegalArgument(format!("`{}` has no service `{id}`", doc.id))
            })?;
            match &service.service_endpoint {
                crate::did::ServiceKind::DidCommMessaging(endpoint) => Some((service, endpoint)),
                crate::did::ServiceKind::Other(_) => {
                    return Err(Error::IllegalArgument(format!(
                        "Service `{id}` is not a DIDCommMessaging service"
                    )))
                }
            }
        }
        None => doc.first_didcomm_service(),
    };

    Ok(service.map(|(service, endpoint)| {
        (
            MessagingServiceMetadata {
                id: service.id.clone(),
                service_endpoint: endpoint.uri.clone(),
            },
            endpoint.routing_keys.clone(),
        )
    }))
}

/// Encrypts a message for `to`, authenticated when `from` is given and
/// optionally signed by `sign_by` first.
pub(crate) async fn pack_encrypted(
    msg: &Message,
    to: &str,
    from: Option<&str>,
    sign_by: Option<&str>,
    options: &PackEncryptedOptions,
    resolvers: Resolvers<'_>,
) -> Result<(String, PackEncryptedMetadata)> {
    validate_encrypted_args(msg, to, from, sign_by)?;

    let plaintext = embed_from_prior(msg, resolvers).await?;
    let (payload, sign_by_kid) = match sign_by {
        Some(sign_by) => {
            let (signed, meta) = sign_payload(&plaintext, msg, sign_by, resolvers).await?;
            (signed, Some(meta.sign_by_kid))
        }
        None => (plaintext, None),
    };

    let (to_doc, recipient_keys) = key_agreement_keys(to, resolvers).await?;

    let (packed, from_kid, to_kids) = match from {
        Some(from) => {
            let (from_kid, sender_key, recipients) =
                authcrypt_keys(from, &recipient_keys, resolvers).await?;
            let alg = options.enc_alg_auth;
            let authcrypted = jwe::authcrypt(
                payload.as_bytes(),
                alg.content_encryption(),
                &from_kid,
                &sender_key,
                &recipients,
                options.protect_sender,
            )?;
            let packed = if options.protect_sender {
                jwe::anoncrypt(
                    authcrypted.as_bytes(),
                    options.enc_alg_anon.content_encryption(),
                    &recipients,
                )?
            } else {
                authcrypted
            };
            let to_kids = recipients.into_iter().map(|(kid, _)| kid).collect();
            (packed, Some(from_kid), to_kids)
        }
        None => {
            let recipients = first_curve_keys(recipient_keys);
            let packed = jwe::anoncrypt(
                payload.as_bytes(),
                options.enc_alg_anon.content_encryption(),
                &recipients,
            )?;
            let to_kids = recipients.into_iter().map(|(kid, _)| kid).collect();
            (packed, None, to_kids)
        }
    };

    // With forwarding disabled the caller delivers directly, no service is used.
    let service = if options.forward {
        messaging_service(&to_doc, options)?
    } else {
        None
    };
    let (service, routing_keys) = match service {
        Some((service, routing_keys)) => (Some(service), routing_keys),
        None => (None, Vec::new()),
    };

    let packed = if !routing_keys.is_empty() {
        debug!(to, hops = routing_keys.len(), "Wrapping in forward envelopes");
        wrap_in_forward(
            &packed,
            options.forward_headers.as_ref(),
            to,
            &routing_keys,
            options.enc_alg_anon,
            resolvers,
        )
        .await?
    } else {
        packed
    };

    info!(
        id = %msg.id,
        to,
        authenticated = from_kid.is_some(),
        signed = sign_by_kid.is_some(),
        "Packed encrypted message"
    );
    Ok((
        packed,
        PackEncryptedMetadata {
            messaging_service: service,
            from_kid,
            sign_by_kid,
            to_kids,
        },
    ))
}
