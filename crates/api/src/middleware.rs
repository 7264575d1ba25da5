use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::app::services::AppServices;
use crate::context::SessionContext;

pub async fn session_middleware(
    State(services): State<Arc<AppServices>>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = extract_bearer(req.headers())?.ok_or(StatusCode::UNAUTHORIZED)?;
    let session = services.sessions.get(&token).ok_or(StatusCode::UNAUTHORIZED)?;

    req.extensions_mut().insert(SessionContext::new(token, session));

    Ok(next.run(req).await)
}

/// Bearer token from the `Authorization` header, if any.
///
/// A present but malformed header is rejected rather than ignored.
pub fn extract_bearer(headers: &HeaderMap) -> Result<Option<Uuid>, StatusCode> {
    let Some(header) = headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };

    let header = header.to_str().map_err(|_| StatusCode::UNAUTHORIZED)?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?
        .trim();

    Uuid::parse_str(token)
        .map(Some)
        .map_err(|_| StatusCode::UNAUTHORIZED)
}
