//! `from_prior` JWTs for DID rotation.
//!
//! A party rotating from DID `iss` to DID `sub` signs a JWT with a key from
//! the `authentication` list of `iss`. Messages sent from `sub` carry the
//! JWT in their `from_prior` header.

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::jws::{sign_compact, CompactJws};
use crate::message::FromPrior;
use crate::pack::{public_key, signing_key};
use crate::plugin::Resolvers;
use crate::utils::{did_or_url, is_did_url, now_unix, validate_did};

const JWT_TYP: &str = "JWT";

fn validate_claims(from_prior: &FromPrior) -> Result<()> {
    for (name, value) in [("iss", &from_prior.iss), ("sub", &from_prior.sub)] {
        validate_did(value)?;
        if is_did_url(value) {
            return Err(Error::IllegalArgument(format!(
                "from_prior `{name}` must be a DID, not a DID URL"
            )));
        }
    }
    if from_prior.iss == from_prior.sub {
        return Err(Error::IllegalArgument(
            "from_prior `iss` and `sub` must differ".into(),
        ));
    }
    Ok(())
}

/// Signs `from_prior` as a compact JWT.
///
/// Returns the JWT and the key ID that signed it.
///
/// # Errors
/// * `Error::IllegalArgument` - Bad claims, or `issuer_kid` not owned by `iss`
/// * `Error::SecretNotFound` - No authentication secret of `iss` is held
pub(crate) async fn pack_from_prior(
    from_prior: &FromPrior,
    issuer_kid: Option<&str>,
    resolvers: Resolvers<'_>,
) -> Result<(String, String)> {
    validate_claims(from_prior)?;

    if let Some(kid) = issuer_kid {
        validate_did(kid)?;
        if did_or_url(kid).0 != from_prior.iss {
            return Err(Error::IllegalArgument(format!(
                "`{kid}` does not belong to from_prior issuer `{}`",
                from_prior.iss
            )));
        }
    }

    let (kid, key) = signing_key(issuer_kid.unwrap_or(&from_prior.iss), resolvers).await?;
    let claims = serde_json::to_vec(from_prior)?;
    let jwt = sign_compact(&claims, JWT_TYP, &kid, &key)?;
    info!(iss = %from_prior.iss, sub = %from_prior.sub, kid = %kid, "Packed from_prior");
    Ok((jwt, kid))
}

/// Verifies a `from_prior` JWT against the issuer's DID Document.
///
/// Returns the claims and the key ID that signed them.
///
/// # Errors
/// * `Error::Malformed` - Not a compact JWS, missing or foreign `kid`, bad
///   signature, or outside its `nbf`/`exp` window
/// * `Error::DidUrlNotFound` - `kid` is not an authentication key of `iss`
pub(crate) async fn unpack_from_prior(
    jwt: &str,
    resolvers: Resolvers<'_>,
) -> Result<(FromPrior, String)> {
    let jws = CompactJws::parse(jwt)?;
    let kid = jws
        .header
        .kid
        .clone()
        .ok_or_else(|| Error::Malformed("from_prior JWT has no `kid`".into()))?;

    let claims: FromPrior = serde_json::from_slice(&jws.payload_bytes()?)
        .map_err(|e| Error::Malformed(format!("Invalid from_prior claims: {e}")))?;

    let (did, fragment) = did_or_url(&kid);
    if fragment.is_none() || did != claims.iss {
        return Err(Error::Malformed(format!(
            "from_prior `kid` `{kid}` is not a key of issuer `{}`",
            claims.iss
        )));
    }

    let doc = resolvers.resolve(did).await?;
    if !doc.authentication.iter().any(|auth| *auth == kid) {
        return Err(Error::DidUrlNotFound(format!(
            "`{kid}` is not an authentication key of `{did}`"
        )));
    }
    let key = public_key(&doc, &kid)?;
    jws.verify(&key)
        .map_err(|e| Error::Malformed(format!("from_prior signature: {}", e.message())))?;

    let now = now_unix();
    if claims.exp.is_some_and(|exp| exp < now) || claims.nbf.is_some_and(|nbf| nbf > now) {
        return Err(Error::Malformed(format!(
            "from_prior of `{}` is not valid at {now}",
            claims.iss
        )));
    }

    debug!(iss = %claims.iss, sub = %claims.sub, kid = %kid, "Verified from_prior");
    Ok((claims, kid))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::tests::{Fixture, ALICE_DID, BOB_DID, CHARLIE_DID};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_pack_unpack_from_prior() {
        let fixture = Fixture::new();
        let claims = FromPrior::new(CHARLIE_DID, ALICE_DID);

        let (jwt, kid) = pack_from_prior(&claims, None, fixture.resolvers())
            .await
            .unwrap();
        assert_eq!(kid, format!("{CHARLIE_DID}#key-1"));

        let (unpacked, issuer_kid) = unpack_from_prior(&jwt, fixture.resolvers()).await.unwrap();
        assert_eq!(unpacked, claims);
        assert_eq!(issuer_kid, kid);
    }

    #[tokio::test]
    async fn test_pack_rejects_bad_claims() {
        let fixture = Fixture::new();

        let same = FromPrior::new(ALICE_DID, ALICE_DID);
        let err = pack_from_prior(&same, None, fixture.resolvers()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IllegalArgument);

        let url = FromPrior::new(format!("{CHARLIE_DID}#key-1"), ALICE_DID);
        let err = pack_from_prior(&url, None, fixture.resolvers()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IllegalArgument);

        let claims = FromPrior::new(CHARLIE_DID, ALICE_DID);
        let foreign = format!("{BOB_DID}#key-1");
        let err = pack_from_prior(&claims, Some(&foreign), fixture.resolvers())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IllegalArgument);
    }

    #[tokio::test]
    async fn test_unpack_rejects_expired() {
        let fixture = Fixture::new();
        let mut claims = FromPrior::new(CHARLIE_DID, ALICE_DID);
        claims.iat = Some(1_516_239_022);
        claims.exp = Some(1_516_239_023);

        let (jwt, _) = pack_from_prior(&claims, None, fixture.resolvers())
            .await
            .unwrap();
        let err = unpack_from_prior(&jwt, fixture.resolvers()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);
    }

    #[tokio::test]
    async fn test_unpack_rejects_garbage() {
        let fixture = Fixture::new();
        let err = unpack_from_prior("not-a-jwt", fixture.resolvers())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);
    }

    #[tokio::test]
    async fn test_unpack_rejects_kid_of_other_did() {
        let fixture = Fixture::new();
        // Signed by Alice's key but claiming Charlie as issuer.
        let claims = FromPrior::new(CHARLIE_DID, BOB_DID);
        let (kid, key) = signing_key(ALICE_DID, fixture.resolvers()).await.unwrap();
        let jwt = sign_compact(&serde_json::to_vec(&claims).unwrap(), JWT_TYP, &kid, &key).unwrap();

        let err = unpack_from_prior(&jwt, fixture.resolvers()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);
    }
}
