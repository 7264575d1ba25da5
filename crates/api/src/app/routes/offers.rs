use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};

use realty_core::CancelKind;

use crate::app::dto::TxResponse;
use crate::app::errors;
use crate::app::routes::path_index;
use crate::app::services::AppServices;
use crate::context::SessionContext;

pub fn router() -> Router {
    Router::new().route("/:kind/:id/cancel", post(cancel_offer))
}

/// Cancel a present, sale or rent offer by id.
pub async fn cancel_offer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SessionContext>,
    Path((kind, id)): Path<(String, String)>,
) -> axum::response::Response {
    let Some(identity) = ctx.identity() else {
        return errors::signed_out();
    };
    let kind: CancelKind = match kind.parse() {
        Ok(k) => k,
        Err(e) => return errors::ledger_error_to_response(e),
    };
    let id = match path_index(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.registry.cancel(identity, kind, id).await {
        Ok(tx) => (StatusCode::ACCEPTED, Json(TxResponse { tx })).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}
