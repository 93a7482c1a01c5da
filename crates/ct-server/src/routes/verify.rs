use super::{bad_request, parse_body, run_blocking, Rejection};
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Query, State},
    routing::post,
    Json, Router,
};
use ct_seal::ValidationReport;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyParams {
    #[serde(default)]
    pub verify_provenance: bool,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/verify/resource", post(verify_resource))
        .route("/verify/hash", post(verify_hash))
}

async fn verify_resource(
    State(state): State<Arc<AppState>>,
    Query(params): Query<VerifyParams>,
    body: Bytes,
) -> Result<Json<ValidationReport>, Rejection> {
    let resource = parse_body(&body)?;
    let report = run_blocking(move || {
        state
            .verifying
            .verify_resource(resource, params.verify_provenance)
    })
    .await?
    .map_err(bad_request)?;
    Ok(Json(report))
}

async fn verify_hash(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ValidationReport>, Rejection> {
    let input = parse_body(&body)?;
    let report = run_blocking(move || state.verifying.verify_hash(&input))
        .await?
        .map_err(bad_request)?;
    Ok(Json(report))
}
