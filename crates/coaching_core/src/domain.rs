//! crates/coaching_core/src/domain.rs
//!
//! Defines the core data structures for the coaching application.
//! They derive `serde` so the service layer can put them on the wire as-is,
//! using the camelCase field names the web client expects.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use uuid::Uuid;

/// Free-form user preferences (communication style, learning goals, ...).
pub type UserPreferences = Map<String, Value>;

//=========================================================================================
// Users and Authentication
//=========================================================================================

/// A registered user. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub age: u32,
    pub preferences: UserPreferences,
    pub created_at: DateTime<Utc>,
}

// Only used internally for login - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

/// Fields required to register a user. The password must already be hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub hashed_password: String,
    pub name: String,
    pub age: u32,
    pub preferences: UserPreferences,
}

/// A partial update of a user's profile. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub preferences: Option<UserPreferences>,
}

// Represents a browser login session (auth cookie)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

//=========================================================================================
// Chat Sessions
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A stored chat message. `seq` is assigned by the store and is strictly
/// increasing within one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub seq: u64,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// A message waiting to be appended to a session.
#[derive(Debug, Clone, PartialEq)]
pub struct NewChatMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl NewChatMessage {
    pub fn now(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// A coaching conversation owned by a single user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewChatSession {
    pub user_id: Uuid,
    pub title: String,
}

#[derive(Debug, Clone, Default)]
pub struct ChatSessionUpdate {
    pub title: Option<String>,
}

//=========================================================================================
// Learning Catalog
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub question: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub title: String,
    pub content: String,
    pub exercises: Vec<Exercise>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleContent {
    pub lessons: Vec<Lesson>,
}

/// A read-only learning module from the seed catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningModule {
    pub id: String,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    /// Estimated duration in minutes.
    pub duration: u32,
    pub exercises: u32,
    pub content: ModuleContent,
    pub image_url: Option<String>,
}

//=========================================================================================
// Progress
//=========================================================================================

/// Progress of one user on one skill. At most one row exists per
/// `(user_id, skill_type)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    pub id: Uuid,
    pub user_id: Uuid,
    pub module_id: Option<String>,
    pub skill_type: String,
    /// Percentage in `0..=100`.
    pub progress: u8,
    pub completed_exercises: BTreeSet<String>,
    pub last_activity: DateTime<Utc>,
}

/// The reported fields of a progress upsert. Absent fields keep their
/// previous value on an existing row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressUpdate {
    pub module_id: Option<String>,
    pub progress: Option<u8>,
    pub completed_exercises: Option<BTreeSet<String>>,
}

//=========================================================================================
// Assessments
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice,
    Scale,
    Text,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub question: String,
    #[serde(rename = "type")]
    pub kind: QuestionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    pub category: String,
}

/// A read-only assessment from the seed catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub id: String,
    pub title: String,
    pub description: String,
    pub duration: u32,
    pub questions: Vec<Question>,
}

/// One scored submission of an assessment. Results are never overwritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResult {
    pub id: Uuid,
    pub user_id: Uuid,
    pub assessment_id: String,
    pub answers: BTreeMap<String, Value>,
    pub scores: BTreeMap<String, u8>,
    pub recommendations: Vec<String>,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAssessmentResult {
    pub user_id: Uuid,
    pub assessment_id: String,
    pub answers: BTreeMap<String, Value>,
    pub scores: BTreeMap<String, u8>,
    pub recommendations: Vec<String>,
}

//=========================================================================================
// AI Transform Inputs and Outputs
//=========================================================================================

/// A transcript entry as sent to the coaching model.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptMessage {
    pub role: Role,
    pub content: String,
}

impl From<&ChatMessage> for PromptMessage {
    fn from(message: &ChatMessage) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

impl From<&NewChatMessage> for PromptMessage {
    fn from(message: &NewChatMessage) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

/// Profile details that shape the tone of a coaching reply.
#[derive(Debug, Clone, PartialEq)]
pub struct UserContext {
    pub age: u32,
    pub preferences: UserPreferences,
}

impl From<&User> for UserContext {
    fn from(user: &User) -> Self {
        Self {
            age: user.age,
            preferences: user.preferences.clone(),
        }
    }
}

/// A coaching reply after it has been coerced into shape.
#[derive(Debug, Clone, PartialEq)]
pub struct CoachingReply {
    pub response: String,
    pub suggestions: Vec<String>,
    pub feedback: Option<String>,
}

/// The caller's answer to one question; missing answers stay visible to the
/// scoring model instead of being dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum Answer {
    Given(Value),
    Missing,
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Answer::Given(Value::String(text)) => f.write_str(text),
            Answer::Given(other) => write!(f, "{}", other),
            Answer::Missing => f.write_str("No answer"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnsweredQuestion {
    pub question: Question,
    pub answer: Answer,
}

/// A scoring analysis after it has been coerced into shape.
#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentAnalysis {
    pub scores: BTreeMap<String, u8>,
    pub recommendations: Vec<String>,
}
