//! services/api/src/web/chats.rs
//!
//! Handlers for coaching chat sessions. Every lookup is owner-only; a
//! session that belongs to someone else is reported exactly like a missing one.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use coaching_core::{domain::ChatSession, guard, Caller};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::extract::ApiJson;
use crate::web::state::AppState;

#[derive(Deserialize, ToSchema)]
pub struct CreateChatRequest {
    #[serde(default)]
    pub title: String,
}

#[derive(Deserialize, ToSchema)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub message: String,
}

/// The session after the turn, plus the coach's quick replies.
#[derive(Serialize, ToSchema)]
pub struct SendMessageResponse {
    #[schema(value_type = Object)]
    pub session: ChatSession,
    pub suggestions: Vec<String>,
    pub feedback: Option<String>,
}

/// Ids that do not parse can never exist, so they read as "not found".
fn parse_session_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| {
        ApiError::Port(coaching_core::PortError::NotFound(
            guard::CHAT_SESSION_NOT_FOUND.to_string(),
        ))
    })
}

/// List the caller's chat sessions, most recently active first.
#[utoipa::path(
    get,
    path = "/api/chats",
    responses(
        (status = 200, description = "The caller's chat sessions"),
        (status = 401, description = "Authentication required")
    )
)]
pub async fn list_chats_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<ChatSession>>, ApiError> {
    Ok(Json(guard::owned_chat_sessions(&*state.store, &caller).await?))
}

/// Start a new, empty chat session.
#[utoipa::path(
    post,
    path = "/api/chats",
    request_body = CreateChatRequest,
    responses(
        (status = 201, description = "The new chat session"),
        (status = 400, description = "Missing title"),
        (status = 401, description = "Authentication required")
    )
)]
pub async fn create_chat_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    ApiJson(req): ApiJson<CreateChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let session = guard::open_chat_session(&*state.store, &caller, &req.title).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// Fetch one of the caller's chat sessions.
#[utoipa::path(
    get,
    path = "/api/chats/{id}",
    params(("id" = String, Path, description = "Chat session id")),
    responses(
        (status = 200, description = "The chat session"),
        (status = 404, description = "Unknown or unowned session")
    )
)]
pub async fn get_chat_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(raw_id): Path<String>,
) -> Result<Json<ChatSession>, ApiError> {
    let session_id = parse_session_id(&raw_id)?;
    Ok(Json(
        guard::owned_chat_session(&*state.store, &caller, session_id).await?,
    ))
}

/// Rename one of the caller's chat sessions.
#[utoipa::path(
    patch,
    path = "/api/chats/{id}",
    params(("id" = String, Path, description = "Chat session id")),
    request_body = CreateChatRequest,
    responses(
        (status = 200, description = "The renamed chat session"),
        (status = 400, description = "Missing title"),
        (status = 404, description = "Unknown or unowned session")
    )
)]
pub async fn rename_chat_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(raw_id): Path<String>,
    ApiJson(req): ApiJson<CreateChatRequest>,
) -> Result<Json<ChatSession>, ApiError> {
    let session_id = parse_session_id(&raw_id)?;
    Ok(Json(
        guard::rename_chat_session(&*state.store, &caller, session_id, &req.title).await?,
    ))
}

/// Send a message to the coach and get the reply appended to the session.
#[utoipa::path(
    post,
    path = "/api/chats/{id}/messages",
    params(("id" = String, Path, description = "Chat session id")),
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "Updated session with suggestions", body = SendMessageResponse),
        (status = 400, description = "Empty message"),
        (status = 404, description = "Unknown or unowned session"),
        (status = 500, description = "The coach could not answer; retry")
    )
)]
pub async fn send_message_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(raw_id): Path<String>,
    ApiJson(req): ApiJson<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, ApiError> {
    if req.message.trim().is_empty() {
        return Err(ApiError::bad_request("Message is required"));
    }
    let session_id = parse_session_id(&raw_id)?;

    let turn = state
        .coaching
        .send_message(&caller, session_id, &req.message)
        .await?;
    Ok(Json(SendMessageResponse {
        session: turn.session,
        suggestions: turn.suggestions,
        feedback: turn.feedback,
    }))
}
