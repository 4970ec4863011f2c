//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use coaching_core::guard;
use std::sync::Arc;

use crate::error::ApiError;
use crate::web::state::AppState;

/// Name of the auth session cookie.
pub const SESSION_COOKIE: &str = "session";

/// Extracts the auth session id from the `Cookie` header, if any.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|c| {
            let (name, value) = c.trim().split_once('=')?;
            (name == SESSION_COOKIE && !value.is_empty()).then_some(value)
        })
}

/// Middleware that validates the auth session cookie and resolves the caller.
///
/// If valid, inserts the `Caller` into request extensions for handlers to use.
/// If invalid or missing, returns 401 before any handler runs.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = session_token(req.headers()).map(str::to_string);
    let caller = guard::authenticate(&*state.store, token.as_deref()).await?;

    req.extensions_mut().insert(caller);
    Ok(next.run(req).await)
}
