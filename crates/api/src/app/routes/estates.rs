use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use realty_core::{EstateDraft, LedgerResult};

use crate::app::dto::{self, CreateEstateRequest, CreatePresentRequest, ListQuery, TxResponse};
use crate::app::errors;
use crate::app::routes::path_index;
use crate::app::services::AppServices;
use crate::context::SessionContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_estates).post(create_estate))
        .route("/:id", get(get_estate))
        .route("/:id/present", post(create_present))
}

pub async fn list_estates(
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

    match services.registry.list_estates(&identity, filter).try_collect().await {
        Ok(estates) => Json(estates).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn get_estate(
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

    match services.registry.estate(&identity, id).await {
        Ok(estate) => Json(estate).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

fn draft_from(body: CreateEstateRequest, caller: realty_core::Address) -> LedgerResult<EstateDraft> {
    let owner = match body.owner.as_deref() {
        Some(raw) => dto::parse_address("owner", raw)?,
        None => caller,
    };
    EstateDraft::parse(
        owner,
        body.info,
        &dto::quantity_text("area", &body.area)?,
        &dto::quantity_text("usableArea", &body.usable_area)?,
    )
}

pub async fn create_estate(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SessionContext>,
    Json(body): Json<CreateEstateRequest>,
) -> axum::response::Response {
    let Some(identity) = ctx.identity() else {
        return errors::signed_out();
    };
    let draft = match draft_from(body, identity.address()) {
        Ok(d) => d,
        Err(e) => return errors::ledger_error_to_response(e),
    };

    match services.registry.create_estate(identity, &draft).await {
        Ok(tx) => (StatusCode::ACCEPTED, Json(TxResponse { tx })).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn create_present(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SessionContext>,
    Path(id): Path<String>,
    Json(body): Json<CreatePresentRequest>,
) -> axum::response::Response {
    let Some(identity) = ctx.identity() else {
        return errors::signed_out();
    };
    let estate_id = match path_index(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let recipient = match dto::parse_address("recipient", &body.recipient) {
        Ok(a) => a,
        Err(e) => return errors::ledger_error_to_response(e),
    };

    match services.registry.create_present(identity, estate_id, recipient).await {
        Ok(tx) => (StatusCode::ACCEPTED, Json(TxResponse { tx })).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}
