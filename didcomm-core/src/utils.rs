//! Small helpers shared by the pack and unpack pipelines.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::error::{Error, Result};

/// Validates a DID or DID URL string according to the DID syntax.
///
/// # Errors
/// * `Error::IllegalArgument` - If the string does not match `did:<method>:<id>`
pub fn validate_did(did: &str) -> Result<()> {
    let mut parts = did.splitn(3, ':');
    let valid = matches!(
        (parts.next(), parts.next(), parts.next()),
        (Some("did"), Some(method), Some(id)) if !method.is_empty() && !id.is_empty()
    );
    if !valid {
        return Err(Error::IllegalArgument(format!(
            "`{did}` is not a valid DID or DID URL"
        )));
    }
    Ok(())
}

/// Splits a DID URL into its DID and an optional fragment-bearing remainder.
///
/// `did:example:alice#key-1` yields `("did:example:alice", Some("key-1"))`,
/// a plain DID yields `(did, None)`.
#[must_use]
pub fn did_or_url(did_or_url: &str) -> (&str, Option<&str>) {
    match did_or_url.split_once('#') {
        Some((did, fragment)) => (did, Some(fragment)),
        None => (did_or_url, None),
    }
}

/// Returns `true` if the string is a DID URL carrying a fragment.
#[must_use]
pub fn is_did_url(value: &str) -> bool {
    did_or_url(value).1.is_some()
}

/// Current unix time in seconds.
#[must_use]
pub fn now_unix() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

pub(crate) fn b64_encode(data: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

pub(crate) fn b64_decode(data: &str, what: &str) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(data)
        .map_err(|e| Error::Malformed(format!("Invalid base64url in {what}: {e}")))
}
