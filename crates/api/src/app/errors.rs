use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use realty_core::LedgerError;

pub fn ledger_error_to_response(err: LedgerError) -> axum::response::Response {
    let status = match &err {
        LedgerError::InvalidSecret(_) | LedgerError::Validation(_) => StatusCode::BAD_REQUEST,
        LedgerError::NotFound { .. } => StatusCode::NOT_FOUND,
        // The ledger understood the request and refused it.
        LedgerError::Submit(_) => StatusCode::UNPROCESSABLE_ENTITY,
        LedgerError::Read(_) => StatusCode::BAD_GATEWAY,
        LedgerError::Connection(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    if status.is_server_error() {
        tracing::warn!(code = err.code(), error = %err, "ledger unavailable");
    }
    json_error(status, err.code(), err.to_string())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn signed_out() -> axum::response::Response {
    json_error(StatusCode::UNAUTHORIZED, "signed_out", "no identity in this session")
}
