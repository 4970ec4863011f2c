//! crates/coaching_core/src/guard.rs
//!
//! Session and ownership checks. Every read or write of a user-owned entity
//! goes through here so that "does not exist" and "belongs to someone else"
//! produce the exact same error.

use uuid::Uuid;

use crate::domain::{
    AssessmentResult, ChatSession, ChatSessionUpdate, NewChatSession, UserProgress,
};
use crate::ports::{EntityStore, PortError, PortResult};

pub const CHAT_SESSION_NOT_FOUND: &str = "Chat session not found";

/// An authenticated caller. Only [`authenticate`] produces one outside tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
}

impl Caller {
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }

    pub fn owns(&self, owner_id: Uuid) -> bool {
        self.user_id == owner_id
    }
}

/// Resolves an auth session token to a caller.
///
/// Missing, unknown and expired tokens all yield `Unauthenticated`.
pub async fn authenticate(store: &dyn EntityStore, token: Option<&str>) -> PortResult<Caller> {
    let token = token
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(PortError::Unauthenticated)?;

    match store.validate_auth_session(token).await {
        Ok(user_id) => Ok(Caller::new(user_id)),
        Err(PortError::NotFound(_)) => Err(PortError::Unauthenticated),
        Err(e) => Err(e),
    }
}

/// Fetches a chat session the caller owns.
pub async fn owned_chat_session(
    store: &dyn EntityStore,
    caller: &Caller,
    session_id: Uuid,
) -> PortResult<ChatSession> {
    match store.get_chat_session(session_id).await {
        Ok(session) if caller.owns(session.user_id) => Ok(session),
        Ok(_) | Err(PortError::NotFound(_)) => {
            Err(PortError::NotFound(CHAT_SESSION_NOT_FOUND.to_string()))
        }
        Err(e) => Err(e),
    }
}

pub async fn owned_chat_sessions(
    store: &dyn EntityStore,
    caller: &Caller,
) -> PortResult<Vec<ChatSession>> {
    store.list_chat_sessions(caller.user_id).await
}

/// Opens a new, empty chat session for the caller.
pub async fn open_chat_session(
    store: &dyn EntityStore,
    caller: &Caller,
    title: &str,
) -> PortResult<ChatSession> {
    let title = title.trim();
    if title.is_empty() {
        return Err(PortError::BadRequest("Title is required".to_string()));
    }
    store
        .create_chat_session(NewChatSession {
            user_id: caller.user_id,
            title: title.to_string(),
        })
        .await
}

/// Renames one of the caller's chat sessions. Messages are left alone.
pub async fn rename_chat_session(
    store: &dyn EntityStore,
    caller: &Caller,
    session_id: Uuid,
    title: &str,
) -> PortResult<ChatSession> {
    let title = title.trim();
    if title.is_empty() {
        return Err(PortError::BadRequest("Title is required".to_string()));
    }
    owned_chat_session(store, caller, session_id).await?;
    store
        .update_chat_session(
            session_id,
            ChatSessionUpdate {
                title: Some(title.to_string()),
            },
        )
        .await
}

pub async fn owned_progress(
    store: &dyn EntityStore,
    caller: &Caller,
) -> PortResult<Vec<UserProgress>> {
    store.list_progress(caller.user_id).await
}

pub async fn owned_assessment_results(
    store: &dyn EntityStore,
    caller: &Caller,
) -> PortResult<Vec<AssessmentResult>> {
    store.list_assessment_results(caller.user_id).await
}
