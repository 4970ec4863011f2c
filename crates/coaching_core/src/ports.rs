//! crates/coaching_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture: the entity
//! store and the two AI transforms can be swapped without touching the
//! orchestrators that drive them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::domain::{
    AnsweredQuestion, Assessment, AssessmentResult, ChatSession, ChatSessionUpdate,
    LearningModule, NewAssessmentResult, NewChatMessage, NewChatSession, NewUser,
    ProgressUpdate, PromptMessage, User, UserContext, UserCredentials, UserProgress,
    UserUpdate,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// The error taxonomy shared by every port and orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    /// Unknown id, or an id that exists but belongs to someone else.
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Authentication required")]
    Unauthenticated,
    /// An AI transform failed, timed out, or returned something unusable.
    #[error("External service failure: {0}")]
    ExternalService(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// CRUD over the six entity kinds plus auth sessions.
///
/// Every read returns an owned copy; mutating it has no effect on stored
/// state. Lookups of unknown ids fail with [`PortError::NotFound`].
#[async_trait]
pub trait EntityStore: Send + Sync {
    // --- Users ---
    async fn get_user(&self, user_id: Uuid) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<User>;

    async fn get_credentials_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    /// Fails with [`PortError::Conflict`] when the email is already taken.
    async fn create_user(&self, new_user: NewUser) -> PortResult<User>;

    async fn update_user(&self, user_id: Uuid, update: UserUpdate) -> PortResult<User>;

    // --- Auth Sessions ---
    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- Chat Sessions ---
    async fn create_chat_session(&self, new_session: NewChatSession) -> PortResult<ChatSession>;

    async fn get_chat_session(&self, session_id: Uuid) -> PortResult<ChatSession>;

    /// Sessions of one user, most recently updated first.
    async fn list_chat_sessions(&self, user_id: Uuid) -> PortResult<Vec<ChatSession>>;

    async fn update_chat_session(
        &self,
        session_id: Uuid,
        update: ChatSessionUpdate,
    ) -> PortResult<ChatSession>;

    /// Appends messages in order, assigning each the next sequence number,
    /// and bumps `updated_at`. Existing messages are never rewritten.
    async fn append_chat_messages(
        &self,
        session_id: Uuid,
        messages: Vec<NewChatMessage>,
    ) -> PortResult<ChatSession>;

    // --- Learning Catalog ---
    async fn list_learning_modules(&self) -> PortResult<Vec<LearningModule>>;

    async fn get_learning_module(&self, module_id: &str) -> PortResult<LearningModule>;

    async fn list_assessments(&self) -> PortResult<Vec<Assessment>>;

    async fn get_assessment(&self, assessment_id: &str) -> PortResult<Assessment>;

    // --- Progress ---
    async fn list_progress(&self, user_id: Uuid) -> PortResult<Vec<UserProgress>>;

    async fn get_progress_by_skill(
        &self,
        user_id: Uuid,
        skill_type: &str,
    ) -> PortResult<UserProgress>;

    /// Creates or merges the single row for `(user_id, skill_type)`.
    async fn upsert_progress(
        &self,
        user_id: Uuid,
        skill_type: &str,
        update: ProgressUpdate,
    ) -> PortResult<UserProgress>;

    // --- Assessment Results ---
    async fn create_assessment_result(
        &self,
        new_result: NewAssessmentResult,
    ) -> PortResult<AssessmentResult>;

    /// Results of one user, newest first.
    async fn list_assessment_results(&self, user_id: Uuid) -> PortResult<Vec<AssessmentResult>>;
}

#[async_trait]
pub trait CoachingService: Send + Sync {
    /// Produces the next coaching turn for a transcript.
    ///
    /// Returns the model's JSON object untouched; the caller coerces it.
    async fn coach(
        &self,
        transcript: &[PromptMessage],
        context: Option<&UserContext>,
    ) -> PortResult<Value>;
}

#[async_trait]
pub trait AssessmentAnalysisService: Send + Sync {
    /// Scores a full question set, missing answers included.
    ///
    /// Returns the model's JSON object untouched; the caller coerces it.
    async fn analyze(&self, answered: &[AnsweredQuestion]) -> PortResult<Value>;
}
