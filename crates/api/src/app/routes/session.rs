use std::sync::Arc;

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};

use realty_identity::load_identity;

use crate::app::dto::{AccountView, LoginRequest, LoginResponse};
use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::SessionContext;
use crate::middleware;

/// Sign in with a secret.
///
/// With a live bearer token the session's identity is replaced in place and
/// the token is kept; otherwise a new session is opened. A bad secret leaves
/// any existing session untouched.
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
    Json(body): Json<LoginRequest>,
) -> axum::response::Response {
    let token = match middleware::extract_bearer(&headers) {
        Ok(token) => token,
        Err(status) => return errors::json_error(status, "unauthorized", "malformed bearer token"),
    };

    if let Some((token, session)) = token.and_then(|t| services.sessions.get(&t).map(|s| (t, s))) {
        return match session.sign_in(&body.secret) {
            Ok(identity) => Json(LoginResponse {
                token: token.to_string(),
                address: identity.address(),
            })
            .into_response(),
            Err(e) => errors::ledger_error_to_response(e),
        };
    }

    match load_identity(&body.secret) {
        Ok(identity) => {
            let address = identity.address();
            let (token, _) = services.sessions.open(identity);
            tracing::info!(%address, "session opened");
            Json(LoginResponse {
                token: token.to_string(),
                address,
            })
            .into_response()
        }
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn logout(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SessionContext>,
) -> StatusCode {
    ctx.session().clear();
    services.sessions.close(&ctx.token());
    StatusCode::NO_CONTENT
}

pub async fn account(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SessionContext>,
) -> axum::response::Response {
    let Some(identity) = ctx.identity() else {
        return errors::signed_out();
    };

    let (balance, is_admin) = tokio::join!(
        services.registry.current_balance(&identity),
        services.registry.is_admin(&identity),
    );

    match (balance, is_admin) {
        (Ok(balance), Ok(is_admin)) => Json(AccountView {
            address: identity.address(),
            balance: balance.to_string(),
            is_admin,
        })
        .into_response(),
        (Err(e), _) | (_, Err(e)) => errors::ledger_error_to_response(e),
    }
}
