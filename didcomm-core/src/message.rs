//! DIDComm plaintext message type and related functionality.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// Media type of a DIDComm plaintext message.
pub const PLAINTEXT_TYP: &str = "application/didcomm-plain+json";

/// A DIDComm v2 plaintext message.
///
/// Serializes to the DIDComm plaintext JSON object. Headers not modelled by
/// a dedicated field live in [`Message::extra_headers`] and are flattened
/// into the top-level object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message identifier.
    pub id: String,
    /// Envelope media type, always [`PLAINTEXT_TYP`].
    pub typ: String,
    /// Application protocol message type URI.
    #[serde(rename = "type")]
    pub type_: String,
    /// Opaque message body.
    pub body: Value,
    /// Sender DID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// Recipient DIDs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Vec<String>>,
    /// Thread identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thid: Option<String>,
    /// Parent thread identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pthid: Option<String>,
    /// Creation time, unix seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_time: Option<u64>,
    /// Expiry time, unix seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_time: Option<u64>,
    /// Compact JWT proving a DID rotation, see [`crate::from_prior`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_prior: Option<String>,
    /// Ordered message attachments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<Attachment>>,
    /// Any other top-level header.
    #[serde(flatten)]
    pub extra_headers: BTreeMap<String, Value>,
}

impl Message {
    /// Creates a new plaintext message.
    ///
    /// # Arguments
    ///
    /// * `id` - Unique message identifier
    /// * `type_` - Protocol message type URI
    /// * `body` - Message body
    pub fn new(id: impl Into<String>, type_: impl Into<String>, body: Value) -> Self {
        Self {
            id: id.into(),
            typ: PLAINTEXT_TYP.to_string(),
            type_: type_.into(),
            body,
            from: None,
            to: None,
            thid: None,
            pthid: None,
            created_time: None,
            expires_time: None,
            from_prior: None,
            attachments: None,
            extra_headers: BTreeMap::new(),
        }
    }

    /// Sets the sender of the message.
    #[must_use]
    pub fn from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    /// Sets the recipients of the message.
    #[must_use]
    pub fn to(mut self, to: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.to = Some(to.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the thread identifier.
    #[must_use]
    pub fn thid(mut self, thid: impl Into<String>) -> Self {
        self.thid = Some(thid.into());
        self
    }

    /// Sets the parent thread identifier.
    #[must_use]
    pub fn pthid(mut self, pthid: impl Into<String>) -> Self {
        self.pthid = Some(pthid.into());
        self
    }

    /// Sets the creation time.
    #[must_use]
    pub fn created_time(mut self, created_time: u64) -> Self {
        self.created_time = Some(created_time);
        self
    }

    /// Sets the expiry time.
    #[must_use]
    pub fn expires_time(mut self, expires_time: u64) -> Self {
        self.expires_time = Some(expires_time);
        self
    }

    /// Embeds a packed from_prior JWT.
    #[must_use]
    pub fn from_prior(mut self, from_prior: impl Into<String>) -> Self {
        self.from_prior = Some(from_prior.into());
        self
    }

    /// Adds a custom top-level header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: Value) -> Self {
        self.extra_headers.insert(name.into(), value);
        self
    }

    /// Appends an attachment.
    #[must_use]
    pub fn attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.get_or_insert_with(Vec::new).push(attachment);
        self
    }

    /// Serializes the message to JSON.
    ///
    /// # Errors
    /// * `Error::Malformed` - If the body cannot be serialized
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses a plaintext message and checks its envelope media type.
    ///
    /// # Errors
    /// * `Error::Malformed` - If the JSON does not match the message schema or
    ///   `typ` is not the plaintext media type
    pub fn from_json(json: &str) -> Result<Self> {
        let msg: Self = serde_json::from_str(json)
            .map_err(|e| Error::Malformed(format!("Unable to parse plaintext message: {e}")))?;
        msg.validate()?;
        Ok(msg)
    }

    /// Checks the structural invariants of a plaintext message.
    ///
    /// # Errors
    /// * `Error::Malformed` - If `typ` is wrong or `id`/`type` are empty
    pub fn validate(&self) -> Result<()> {
        if self.typ != PLAINTEXT_TYP {
            return Err(Error::Malformed(format!(
                "`typ` must be `{PLAINTEXT_TYP}`, got `{}`",
                self.typ
            )));
        }
        if self.id.is_empty() {
            return Err(Error::Malformed("`id` must not be empty".into()));
        }
        if self.type_.is_empty() {
            return Err(Error::Malformed("`type` must not be empty".into()));
        }
        Ok(())
    }
}

/// A message attachment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    /// The attachment payload.
    pub data: AttachmentData,
    /// The attachment ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Human readable description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Suggested file name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Media type of the payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    /// Format identifier of the payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Last modification time, unix seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastmod_time: Option<u64>,
    /// Payload size in bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub byte_count: Option<u64>,
}

impl Attachment {
    /// Creates an attachment around the given data.
    pub fn new(data: AttachmentData) -> Self {
        Self {
            data,
            id: None,
            description: None,
            filename: None,
            media_type: None,
            format: None,
            lastmod_time: None,
            byte_count: None,
        }
    }

    /// Creates an inline JSON attachment.
    pub fn json(json: Value) -> Self {
        Self::new(AttachmentData::Json(JsonAttachmentData { json, jws: None }))
    }

    /// Creates an inline base64 attachment.
    pub fn base64(base64: impl Into<String>) -> Self {
        Self::new(AttachmentData::Base64(Base64AttachmentData {
            base64: base64.into(),
            jws: None,
        }))
    }

    /// Creates a hash-addressed links attachment.
    pub fn links(links: Vec<String>, hash: impl Into<String>) -> Self {
        Self::new(AttachmentData::Links(LinksAttachmentData {
            links,
            hash: hash.into(),
            jws: None,
        }))
    }

    /// Sets the attachment ID.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the media type.
    #[must_use]
    pub fn media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }
}

/// Attachment payload; exactly one representation is active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttachmentData {
    /// Inline base64url data
    Base64(Base64AttachmentData),
    /// Inline JSON data
    Json(JsonAttachmentData),
    /// Hash-addressed external data
    Links(LinksAttachmentData),
}

impl AttachmentData {
    /// Detached JWS over the payload, if any.
    #[must_use]
    pub fn jws(&self) -> Option<&str> {
        match self {
            Self::Base64(data) => data.jws.as_deref(),
            Self::Json(data) => data.jws.as_deref(),
            Self::Links(data) => data.jws.as_deref(),
        }
    }
}

/// Inline base64url attachment data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Base64AttachmentData {
    /// The base64url encoded payload.
    pub base64: String,
    /// Optional detached JWS.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jws: Option<String>,
}

/// Inline JSON attachment data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonAttachmentData {
    /// The JSON payload.
    pub json: Value,
    /// Optional detached JWS.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jws: Option<String>,
}

/// Hash-addressed attachment data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinksAttachmentData {
    /// Locations of the payload.
    pub links: Vec<String>,
    /// Multihash of the payload.
    pub hash: String,
    /// Optional detached JWS.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jws: Option<String>,
}

/// Claims of a from_prior JWT proving the sender's previous DID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FromPrior {
    /// The prior DID.
    pub iss: String,
    /// The new DID.
    pub sub: String,
    /// Intended audience.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    /// Expiry, unix seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
    /// Not valid before, unix seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbf: Option<u64>,
    /// Issued at, unix seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
    /// JWT ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

impl FromPrior {
    /// Creates a rotation claim from `iss` (prior DID) to `sub` (new DID).
    pub fn new(iss: impl Into<String>, sub: impl Into<String>) -> Self {
        Self {
            iss: iss.into(),
            sub: sub.into(),
            aud: None,
            exp: None,
            nbf: None,
            iat: None,
            jti: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_message_builder() {
        let message = Message::new("1234567890", "https://example.com/protocols/1.0/test", json!({}))
            .from("did:example:sender")
            .to(vec!["did:example:recipient1", "did:example:recipient2"])
            .thid("thread-1")
            .header("return_route", json!("all"));

        assert_eq!(message.typ, PLAINTEXT_TYP);
        assert_eq!(message.from, Some("did:example:sender".to_string()));
        assert_eq!(
            message.to,
            Some(vec![
                "did:example:recipient1".to_string(),
                "did:example:recipient2".to_string()
            ])
        );
        assert_eq!(message.extra_headers["return_route"], json!("all"));
    }

    #[test]
    fn test_message_wire_shape() {
        let message = Message::new("1", "https://example.com/t", json!({"a": 1}))
            .created_time(1_516_269_022)
            .header("custom", json!(true))
            .attachment(Attachment::json(json!({"k": "v"})).id("att-1"));

        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "1",
                "typ": PLAINTEXT_TYP,
                "type": "https://example.com/t",
                "body": {"a": 1},
                "created_time": 1_516_269_022,
                "custom": true,
                "attachments": [{"id": "att-1", "data": {"json": {"k": "v"}}}]
            })
        );
    }

    #[test]
    fn test_message_parse_keeps_extra_headers() {
        let json = r#"{"id":"1","typ":"application/didcomm-plain+json","type":"t","body":{},"x-custom":"hello"}"#;
        let message = Message::from_json(json).unwrap();
        assert_eq!(message.extra_headers["x-custom"], json!("hello"));
        assert!(message.from.is_none());
    }

    #[test]
    fn test_message_rejects_wrong_typ() {
        let json = r#"{"id":"1","typ":"application/json","type":"t","body":{}}"#;
        let err = Message::from_json(json).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Malformed);
    }

    #[test]
    fn test_attachment_data_variants() {
        let base64: AttachmentData = serde_json::from_value(json!({"base64": "aGVsbG8"})).unwrap();
        assert!(matches!(base64, AttachmentData::Base64(_)));

        let links: AttachmentData = serde_json::from_value(
            json!({"links": ["https://example.com/a"], "hash": "abc", "jws": "sig"}),
        )
        .unwrap();
        assert!(matches!(links, AttachmentData::Links(_)));
        assert_eq!(links.jws(), Some("sig"));

        let inline: AttachmentData = serde_json::from_value(json!({"json": {"x": 1}})).unwrap();
        assert!(matches!(inline, AttachmentData::Json(_)));
    }
}
