//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: the estate registry and the session store
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{
    Extension, Router,
    routing::{get, post},
};
use tower::ServiceBuilder;

use realty_core::LedgerResult;
use realty_ledger::{EstateRegistry, LedgerConfig};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Connect to the configured ledger and build the router (used by `main.rs`).
pub async fn build_app(config: &LedgerConfig) -> LedgerResult<Router> {
    let registry = EstateRegistry::connect(config).await?;
    Ok(router(Arc::new(services::AppServices::new(registry))))
}

/// Router over already-built services.
pub fn router(services: Arc<services::AppServices>) -> Router {
    // Protected routes: require a live session.
    let protected = routes::router().layer(axum::middleware::from_fn_with_state(
        services.clone(),
        middleware::session_middleware,
    ));

    Router::new()
        .route("/health", get(routes::system::health))
        .route("/login", post(routes::session::login))
        .merge(protected)
        .layer(ServiceBuilder::new().layer(Extension(services)))
}
