use super::{bad_request, parse_body, run_blocking, Rejection};
use crate::identity::SignerIdentity;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Query, State},
    routing::post,
    Json, Router,
};
use ct_seal::{SigningError, Status};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignParams {
    #[serde(default)]
    pub sign_provenance: bool,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sign/resource", post(sign_resource))
        .route("/sign/hash", post(sign_hash))
}

async fn sign_resource(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SignParams>,
    SignerIdentity(identity): SignerIdentity,
    body: Bytes,
) -> Result<Json<Value>, Rejection> {
    let resource = parse_body(&body)?;
    let signed = run_blocking(move || {
        state
            .signing
            .sign_resource(resource, &identity, params.sign_provenance)
    })
    .await?
    .map_err(rejection)?;
    Ok(Json(signed))
}

async fn sign_hash(
    State(state): State<Arc<AppState>>,
    SignerIdentity(identity): SignerIdentity,
    body: Bytes,
) -> Result<Json<Value>, Rejection> {
    let input = parse_body(&body)?;
    let signed = run_blocking(move || state.signing.sign_hash(input, &identity))
        .await?
        .map_err(rejection)?;
    Ok(Json(signed))
}

/// Every signing failure is reported as 400 with its message verbatim.
fn rejection(err: SigningError) -> Rejection {
    match err.status() {
        Status::Error => warn!(error = %err, "signing backend fault"),
        _ => debug!(error = %err, "signing failed"),
    }
    bad_request(err)
}
