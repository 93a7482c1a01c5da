//! Signing identity taken from the caller's bearer token.
//!
//! The token is validated upstream; only its payload segment is read here.

use crate::state::AppState;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use ct_seal::{IdentityError, IdentityMetadata};
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Missing bearer token.")]
    Missing,

    #[error("Malformed bearer token.")]
    Malformed,
}

/// Claims of a bearer token.
pub type Claims = Map<String, Value>;

fn bearer_token(headers: &HeaderMap) -> Result<&str, TokenError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(TokenError::Missing)?
        .to_str()
        .map_err(|_| TokenError::Malformed)?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or(TokenError::Missing)?
        .trim();
    if token.is_empty() {
        return Err(TokenError::Missing);
    }
    Ok(token)
}

/// Decode the payload segment of a compact JWT.
pub fn decode_claims(token: &str) -> Result<Claims, TokenError> {
    let payload = token.split('.').nth(1).ok_or(TokenError::Malformed)?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|_| TokenError::Malformed)?;
    serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed)
}

/// Copy the configured claims into signing metadata, in order.
///
/// Absent and null claims are passed on as null values.
pub fn identity_from_claims(
    claims: &Claims,
    names: &[String],
) -> Result<IdentityMetadata, IdentityError> {
    let mut identity = IdentityMetadata::new();
    for name in names {
        let value = match claims.get(name) {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) => Some(text.clone()),
            Some(other) => Some(other.to_string()),
        };
        identity.insert(name.as_str(), value)?;
    }
    Ok(identity)
}

/// Extractor yielding the identity of an authenticated signer.
pub struct SignerIdentity(pub IdentityMetadata);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for SignerIdentity {
    type Rejection = (StatusCode, String);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let unauthorized = |err: TokenError| (StatusCode::UNAUTHORIZED, err.to_string());
        let token = bearer_token(&parts.headers).map_err(unauthorized)?;
        let claims = decode_claims(token).map_err(unauthorized)?;
        let identity = identity_from_claims(&claims, &state.identity_claims)
            .map_err(|err| (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;
        Ok(Self(identity))
    }
}
