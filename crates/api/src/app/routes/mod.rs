use axum::{
    Router,
    routing::{get, post},
};

pub mod estates;
pub mod offers;
pub mod presents;
pub mod session;
pub mod system;

use realty_core::parse_index;

use crate::app::errors;

/// Router for all session-bound endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/logout", post(session::logout))
        .route("/account", get(session::account))
        .nest("/estates", estates::router())
        .nest("/presents", presents::router())
        .nest("/offers", offers::router())
}

/// Record index from a path segment.
pub(crate) fn path_index(raw: &str) -> Result<u64, axum::response::Response> {
    parse_index("id", raw).map_err(errors::ledger_error_to_response)
}
