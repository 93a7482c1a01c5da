pub mod sign;
pub mod verify;

use axum::http::StatusCode;
use ct_seal::DocumentError;
use serde_json::Value;
use tracing::error;

pub(crate) type Rejection = (StatusCode, String);

pub(crate) fn bad_request(message: impl ToString) -> Rejection {
    (StatusCode::BAD_REQUEST, message.to_string())
}

/// Parse a request body; an empty body is missing input.
pub(crate) fn parse_body(body: &[u8]) -> Result<Value, Rejection> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(bad_request(DocumentError::Missing));
    }
    serde_json::from_slice(body).map_err(|e| bad_request(format!("Input is not valid JSON: {e}")))
}

/// Run a pipeline call off the async runtime; backend calls may block.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, Rejection>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!(error = %e, "pipeline task failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal error.".to_string(),
        )
    })
}
