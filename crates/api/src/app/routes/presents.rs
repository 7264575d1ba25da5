use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use crate::app::dto::{ListQuery, TxResponse};
use crate::app::errors;
use crate::app::routes::path_index;
use crate::app::services::AppServices;
use crate::context::SessionContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_presents))
        .route("/:id", get(get_present))
        .route("/:id/confirm", post(confirm_present))
}

/// Active presents only; finished ones are never listed.
pub async fn list_presents(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SessionContext>,
    Query(query): Query<ListQuery>,
) -> axum::response::Response {
    let Some(identity) = ctx.identity() else {
        return errors::signed_out();
    };
    let filter = match query.filter() {
        Ok(f) => f,
        Err(e) => return errors::ledger_error_to_response(e),
    };

    match services.registry.list_presents(&identity, filter).try_collect().await {
        Ok(presents) => Json(presents).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn get_present(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SessionContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let Some(identity) = ctx.identity() else {
        return errors::signed_out();
    };
    let id = match path_index(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.registry.present(&identity, id).await {
        Ok(present) => Json(present).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn confirm_present(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SessionContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let Some(identity) = ctx.identity() else {
        return errors::signed_out();
    };
    let id = match path_index(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.registry.confirm_present(identity, id).await {
        Ok(tx) => (StatusCode::ACCEPTED, Json(TxResponse { tx })).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}
