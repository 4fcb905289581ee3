//! Routing 2.0 Forward envelopes.
//!
//! A Forward message tells a mediator to pass its single attachment on to
//! `next`. Wrapping goes through the routing keys in the order given: the
//! first key wraps the original envelope, the last key produces the
//! outermost envelope.

use std::collections::BTreeMap;

use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::jwe;
use crate::message::{Attachment, AttachmentData, Message};
use crate::pack::{first_curve_keys, key_agreement_keys};
use crate::plugin::Resolvers;
use crate::types::AnonCryptAlg;
use crate::utils::{b64_decode, validate_did};

/// Message type of a Forward message.
pub const FORWARD_MSG_TYPE: &str = "https://didcomm.org/routing/2.0/forward";

/// A Forward message split into its parts.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedForward {
    /// The Forward message itself
    pub msg: Message,
    /// DID or key ID of the next hop
    pub next: String,
    /// The forwarded envelope
    pub forwarded_msg: Value,
}

/// Builds an unencrypted Forward message carrying `forwarded` for `next`.
///
/// `headers` are merged into the message as extra headers.
#[must_use]
pub fn build_forward(next: &str, forwarded: Value, headers: Option<&BTreeMap<String, Value>>) -> Message {
    let mut msg = Message::new(
        Uuid::new_v4().to_string(),
        FORWARD_MSG_TYPE,
        json!({ "next": next }),
    )
    .attachment(Attachment::json(forwarded).id(Uuid::new_v4().to_string()));

    if let Some(headers) = headers {
        for (name, value) in headers {
            msg = msg.header(name.clone(), value.clone());
        }
    }
    msg
}

/// Recognizes a Forward message.
///
/// Returns `None` for any other message, or when the Forward has no usable
/// `next` or attachment.
#[must_use]
pub fn try_parse_forward(msg: &Message) -> Option<ParsedForward> {
    if msg.type_ != FORWARD_MSG_TYPE {
        return None;
    }
    let next = msg.body.get("next")?.as_str()?.to_string();
    let attachment = msg.attachments.as_ref()?.first()?;
    let forwarded_msg = match &attachment.data {
        AttachmentData::Json(data) => data.json.clone(),
        AttachmentData::Base64(data) => {
            let bytes = b64_decode(&data.base64, "forwarded attachment").ok()?;
            serde_json::from_slice(&bytes).ok()?
        }
        AttachmentData::Links(_) => return None,
    };
    Some(ParsedForward {
        msg: msg.clone(),
        next,
        forwarded_msg,
    })
}

/// Wraps a packed message in one anoncrypted Forward per routing key.
///
/// `to` becomes `next` of the innermost Forward; each further Forward
/// points at the routing key that wrapped the previous one.
///
/// # Errors
/// * `Error::IllegalArgument` - `to` is not a DID or no routing keys are given
/// * `Error::Malformed` - `msg` is not JSON
/// * any error of resolving the routing keys
pub(crate) async fn wrap_in_forward(
    msg: &str,
    headers: Option<&BTreeMap<String, Value>>,
    to: &str,
    routing_keys: &[String],
    enc_alg_anon: AnonCryptAlg,
    resolvers: Resolvers<'_>,
) -> Result<String> {
    validate_did(to)?;
    if routing_keys.is_empty() {
        return Err(Error::IllegalArgument("No routing keys to forward through".into()));
    }

    let mut packed = msg.to_string();
    let mut next = to;
    for routing_key in routing_keys {
        let forwarded: Value = serde_json::from_str(&packed)?;
        let forward = build_forward(next, forwarded, headers);
        let (_, keys) = key_agreement_keys(routing_key, resolvers).await?;
        packed = jwe::anoncrypt(
            forward.to_json()?.as_bytes(),
            enc_alg_anon.content_encryption(),
            &first_curve_keys(keys),
        )?;
        debug!(next, routing_key = %routing_key, "Wrapped in forward");
        next = routing_key;
    }
    Ok(packed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_build_and_parse_forward() {
        let inner = json!({"protected": "x", "recipients": [], "iv": "", "ciphertext": "", "tag": ""});
        let mut headers = BTreeMap::new();
        headers.insert("x-route".to_string(), json!("fast"));

        let msg = build_forward("did:example:bob", inner.clone(), Some(&headers));
        assert_eq!(msg.extra_headers.get("x-route"), Some(&json!("fast")));

        let parsed = try_parse_forward(&msg).unwrap();
        assert_eq!(parsed.next, "did:example:bob");
        assert_eq!(parsed.forwarded_msg, inner);
    }

    #[test]
    fn test_other_messages_are_not_forwards() {
        let msg = Message::new("1", "https://example.com/protocols/lets_do_lunch/1.0/proposal", json!({}));
        assert!(try_parse_forward(&msg).is_none());

        let no_attachment = Message::new("2", FORWARD_MSG_TYPE, json!({"next": "did:example:bob"}));
        assert!(try_parse_forward(&no_attachment).is_none());
    }
}
