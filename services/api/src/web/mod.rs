pub mod assessments;
pub mod auth;
pub mod chats;
pub mod extract;
pub mod middleware;
pub mod rest;
pub mod state;

#[cfg(test)]
mod test_support;

use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;

pub use middleware::require_auth;
pub use rest::ApiDoc;
use state::AppState;

/// Builds every `/api` route. Everything except register, login and logout
/// sits behind the session cookie check.
pub fn app_router(state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/api/auth/register", post(auth::register_handler))
        .route("/api/auth/login", post(auth::login_handler))
        .route("/api/auth/logout", post(auth::logout_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/api/auth/me", get(auth::me_handler))
        .route("/api/users/me", patch(auth::update_me_handler))
        .route("/api/modules", get(rest::list_modules_handler))
        .route("/api/modules/{id}", get(rest::get_module_handler))
        .route(
            "/api/progress",
            get(rest::list_progress_handler).post(rest::record_progress_handler),
        )
        .route(
            "/api/chats",
            get(chats::list_chats_handler).post(chats::create_chat_handler),
        )
        .route(
            "/api/chats/{id}",
            get(chats::get_chat_handler).patch(chats::rename_chat_handler),
        )
        .route("/api/chats/{id}/messages", post(chats::send_message_handler))
        .route("/api/assessments", get(assessments::list_assessments_handler))
        .route("/api/assessments/{id}", get(assessments::get_assessment_handler))
        .route(
            "/api/assessments/{id}/submit",
            post(assessments::submit_assessment_handler),
        )
        .route(
            "/api/assessment-results",
            get(assessments::list_results_handler),
        )
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
