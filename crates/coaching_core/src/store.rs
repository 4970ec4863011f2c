//! crates/coaching_core/src/store.rs
//!
//! The in-memory implementation of the `EntityStore` port. All tables sit
//! behind one async `RwLock`, so every write (including the progress upsert
//! and message appends) is atomic with respect to other store calls.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::catalog;
use crate::domain::{
    Assessment, AssessmentResult, AuthSession, ChatMessage, ChatSession, ChatSessionUpdate,
    LearningModule, NewAssessmentResult, NewChatMessage, NewChatSession, NewUser,
    ProgressUpdate, User, UserCredentials, UserProgress, UserUpdate,
};
use crate::ports::{EntityStore, PortError, PortResult};
use crate::progress;

/// Returns the current time, nudged forward if the clock has not moved past
/// `previous`. Keeps per-row timestamps strictly increasing.
fn tick_after(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

//=========================================================================================
// Table Records
//=========================================================================================

struct UserRecord {
    user: User,
    hashed_password: String,
}

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, UserRecord>,
    user_ids_by_email: HashMap<String, Uuid>,
    auth_sessions: HashMap<String, AuthSession>,
    chat_sessions: HashMap<Uuid, ChatSession>,
    learning_modules: Vec<LearningModule>,
    assessments: Vec<Assessment>,
    progress: HashMap<Uuid, UserProgress>,
    progress_ids_by_skill: HashMap<(Uuid, String), Uuid>,
    assessment_results: HashMap<Uuid, AssessmentResult>,
}

//=========================================================================================
// The Main Store Struct
//=========================================================================================

/// An entity store that keeps everything in process memory.
#[derive(Default)]
pub struct MemStore {
    tables: RwLock<Tables>,
}

impl MemStore {
    /// Creates an empty store with no catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the given read-only catalog.
    pub fn with_catalog(modules: Vec<LearningModule>, assessments: Vec<Assessment>) -> Self {
        Self {
            tables: RwLock::new(Tables {
                learning_modules: modules,
                assessments,
                ..Tables::default()
            }),
        }
    }

    /// Creates a store seeded with the built-in catalog.
    pub fn seeded() -> Self {
        Self::with_catalog(catalog::learning_modules(), catalog::assessments())
    }
}

fn chat_session_missing(session_id: Uuid) -> PortError {
    PortError::NotFound(format!("Chat session {} not found", session_id))
}

fn user_missing(user_id: Uuid) -> PortError {
    PortError::NotFound(format!("User {} not found", user_id))
}

//=========================================================================================
// `EntityStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl EntityStore for MemStore {
    async fn get_user(&self, user_id: Uuid) -> PortResult<User> {
        let tables = self.tables.read().await;
        tables
            .users
            .get(&user_id)
            .map(|record| record.user.clone())
            .ok_or_else(|| user_missing(user_id))
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<User> {
        let tables = self.tables.read().await;
        tables
            .user_ids_by_email
            .get(email)
            .and_then(|id| tables.users.get(id))
            .map(|record| record.user.clone())
            .ok_or_else(|| PortError::NotFound(format!("No user with email {}", email)))
    }

    async fn get_credentials_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let tables = self.tables.read().await;
        tables
            .user_ids_by_email
            .get(email)
            .and_then(|id| tables.users.get(id))
            .map(|record| UserCredentials {
                user_id: record.user.id,
                email: record.user.email.clone(),
                hashed_password: record.hashed_password.clone(),
            })
            .ok_or_else(|| PortError::NotFound(format!("No user with email {}", email)))
    }

    async fn create_user(&self, new_user: NewUser) -> PortResult<User> {
        let mut tables = self.tables.write().await;
        if tables.user_ids_by_email.contains_key(&new_user.email) {
            return Err(PortError::Conflict("User already exists".to_string()));
        }

        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email,
            name: new_user.name,
            age: new_user.age,
            preferences: new_user.preferences,
            created_at: Utc::now(),
        };
        tables
            .user_ids_by_email
            .insert(user.email.clone(), user.id);
        tables.users.insert(
            user.id,
            UserRecord {
                user: user.clone(),
                hashed_password: new_user.hashed_password,
            },
        );
        debug!("Created user {}", user.id);
        Ok(user)
    }

    async fn update_user(&self, user_id: Uuid, update: UserUpdate) -> PortResult<User> {
        let mut tables = self.tables.write().await;
        let record = tables
            .users
            .get_mut(&user_id)
            .ok_or_else(|| user_missing(user_id))?;

        if let Some(name) = update.name {
            record.user.name = name;
        }
        if let Some(age) = update.age {
            record.user.age = age;
        }
        if let Some(preferences) = update.preferences {
            record.user.preferences = preferences;
        }
        Ok(record.user.clone())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        let now = Utc::now();
        let mut tables = self.tables.write().await;
        // Sweep sessions that expired without a logout.
        tables.auth_sessions.retain(|_, s| s.expires_at > now);
        tables.auth_sessions.insert(
            session_id.to_string(),
            AuthSession {
                id: session_id.to_string(),
                user_id,
                expires_at,
            },
        );
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let session = self
            .tables
            .read()
            .await
            .auth_sessions
            .get(session_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound("Auth session not found".to_string()))?;

        if session.expires_at > Utc::now() {
            return Ok(session.user_id);
        }

        let mut tables = self.tables.write().await;
        // Another request may have replaced the row since the read lock was released.
        if tables
            .auth_sessions
            .get(session_id)
            .is_some_and(|s| s.expires_at <= Utc::now())
        {
            tables.auth_sessions.remove(session_id);
            debug!("Dropped expired auth session for user {}", session.user_id);
        }
        Err(PortError::NotFound("Auth session expired".to_string()))
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        let mut tables = self.tables.write().await;
        tables.auth_sessions.remove(session_id);
        Ok(())
    }

    async fn create_chat_session(&self, new_session: NewChatSession) -> PortResult<ChatSession> {
        let now = Utc::now();
        let session = ChatSession {
            id: Uuid::new_v4(),
            user_id: new_session.user_id,
            title: new_session.title,
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        let mut tables = self.tables.write().await;
        tables.chat_sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn get_chat_session(&self, session_id: Uuid) -> PortResult<ChatSession> {
        let tables = self.tables.read().await;
        tables
            .chat_sessions
            .get(&session_id)
            .cloned()
            .ok_or_else(|| chat_session_missing(session_id))
    }

    async fn list_chat_sessions(&self, user_id: Uuid) -> PortResult<Vec<ChatSession>> {
        let tables = self.tables.read().await;
        let mut sessions: Vec<ChatSession> = tables
            .chat_sessions
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(sessions)
    }

    async fn update_chat_session(
        &self,
        session_id: Uuid,
        update: ChatSessionUpdate,
    ) -> PortResult<ChatSession> {
        let mut tables = self.tables.write().await;
        let session = tables
            .chat_sessions
            .get_mut(&session_id)
            .ok_or_else(|| chat_session_missing(session_id))?;

        if let Some(title) = update.title {
            session.title = title;
        }
        session.updated_at = tick_after(session.updated_at);
        Ok(session.clone())
    }

    async fn append_chat_messages(
        &self,
        session_id: Uuid,
        messages: Vec<NewChatMessage>,
    ) -> PortResult<ChatSession> {
        let mut tables = self.tables.write().await;
        let session = tables
            .chat_sessions
            .get_mut(&session_id)
            .ok_or_else(|| chat_session_missing(session_id))?;

        let mut next_seq = session.messages.last().map_or(0, |m| m.seq + 1);
        for message in messages {
            session.messages.push(ChatMessage {
                seq: next_seq,
                role: message.role,
                content: message.content,
                timestamp: message.timestamp,
            });
            next_seq += 1;
        }
        session.updated_at = tick_after(session.updated_at);
        Ok(session.clone())
    }

    async fn list_learning_modules(&self) -> PortResult<Vec<LearningModule>> {
        Ok(self.tables.read().await.learning_modules.clone())
    }

    async fn get_learning_module(&self, module_id: &str) -> PortResult<LearningModule> {
        let tables = self.tables.read().await;
        tables
            .learning_modules
            .iter()
            .find(|m| m.id == module_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound("Module not found".to_string()))
    }

    async fn list_assessments(&self) -> PortResult<Vec<Assessment>> {
        Ok(self.tables.read().await.assessments.clone())
    }

    async fn get_assessment(&self, assessment_id: &str) -> PortResult<Assessment> {
        let tables = self.tables.read().await;
        tables
            .assessments
            .iter()
            .find(|a| a.id == assessment_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound("Assessment not found".to_string()))
    }

    async fn list_progress(&self, user_id: Uuid) -> PortResult<Vec<UserProgress>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<UserProgress> = tables
            .progress
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.skill_type.cmp(&b.skill_type));
        Ok(rows)
    }

    async fn get_progress_by_skill(
        &self,
        user_id: Uuid,
        skill_type: &str,
    ) -> PortResult<UserProgress> {
        let tables = self.tables.read().await;
        tables
            .progress_ids_by_skill
            .get(&(user_id, skill_type.to_string()))
            .and_then(|id| tables.progress.get(id))
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("No progress for skill {}", skill_type)))
    }

    async fn upsert_progress(
        &self,
        user_id: Uuid,
        skill_type: &str,
        update: ProgressUpdate,
    ) -> PortResult<UserProgress> {
        let mut tables = self.tables.write().await;
        let key = (user_id, skill_type.to_string());

        if let Some(id) = tables.progress_ids_by_skill.get(&key).copied() {
            let row = tables.progress.get_mut(&id).ok_or_else(|| {
                PortError::Unexpected(format!("Progress index points at missing row {}", id))
            })?;
            let now = tick_after(row.last_activity);
            progress::merge_into(row, update, now);
            return Ok(row.clone());
        }

        let row = progress::new_row(user_id, skill_type, update, Utc::now());
        tables.progress_ids_by_skill.insert(key, row.id);
        tables.progress.insert(row.id, row.clone());
        Ok(row)
    }

    async fn create_assessment_result(
        &self,
        new_result: NewAssessmentResult,
    ) -> PortResult<AssessmentResult> {
        let mut tables = self.tables.write().await;
        // A user's completion times are strictly increasing, so history sorts stably.
        let latest = tables
            .assessment_results
            .values()
            .filter(|r| r.user_id == new_result.user_id)
            .map(|r| r.completed_at)
            .max();
        let result = AssessmentResult {
            id: Uuid::new_v4(),
            user_id: new_result.user_id,
            assessment_id: new_result.assessment_id,
            answers: new_result.answers,
            scores: new_result.scores,
            recommendations: new_result.recommendations,
            completed_at: latest.map_or_else(Utc::now, tick_after),
        };
        tables.assessment_results.insert(result.id, result.clone());
        Ok(result)
    }

    async fn list_assessment_results(&self, user_id: Uuid) -> PortResult<Vec<AssessmentResult>> {
        let tables = self.tables.read().await;
        let mut results: Vec<AssessmentResult> = tables
            .assessment_results
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        results.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use serde_json::Map;
    use std::collections::BTreeMap;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            hashed_password: "hash".to_string(),
            name: "Sam".to_string(),
            age: 29,
            preferences: Map::new(),
        }
    }

    #[tokio::test]
    async fn user_round_trips_by_email_and_rejects_duplicates() {
        let store = MemStore::new();
        let created = store.create_user(new_user("sam@example.com")).await.unwrap();

        let found = store.get_user_by_email("sam@example.com").await.unwrap();
        assert_eq!(found, created);

        let duplicate = store.create_user(new_user("sam@example.com")).await;
        assert!(matches!(duplicate, Err(PortError::Conflict(_))));
    }

    #[tokio::test]
    async fn credentials_expose_the_stored_hash() {
        let store = MemStore::new();
        let created = store.create_user(new_user("kim@example.com")).await.unwrap();
        let creds = store.get_credentials_by_email("kim@example.com").await.unwrap();
        assert_eq!(creds.user_id, created.id);
        assert_eq!(creds.hashed_password, "hash");
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let store = MemStore::seeded();
        assert!(matches!(
            store.get_user(Uuid::new_v4()).await,
            Err(PortError::NotFound(_))
        ));
        assert!(matches!(
            store.get_chat_session(Uuid::new_v4()).await,
            Err(PortError::NotFound(_))
        ));
        assert!(matches!(
            store
                .update_chat_session(Uuid::new_v4(), ChatSessionUpdate::default())
                .await,
            Err(PortError::NotFound(_))
        ));
        assert!(matches!(
            store.get_learning_module("99").await,
            Err(PortError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn returned_values_are_copies() {
        let store = MemStore::new();
        let session = store
            .create_chat_session(NewChatSession {
                user_id: Uuid::new_v4(),
                title: "Original".to_string(),
            })
            .await
            .unwrap();

        let mut copy = store.get_chat_session(session.id).await.unwrap();
        copy.title = "Mutated".to_string();
        copy.messages.push(ChatMessage {
            seq: 0,
            role: Role::User,
            content: "sneaky".to_string(),
            timestamp: Utc::now(),
        });

        let stored = store.get_chat_session(session.id).await.unwrap();
        assert_eq!(stored.title, "Original");
        assert!(stored.messages.is_empty());
    }

    #[tokio::test]
    async fn appends_assign_increasing_sequence_numbers() {
        let store = MemStore::new();
        let session = store
            .create_chat_session(NewChatSession {
                user_id: Uuid::new_v4(),
                title: "Chat".to_string(),
            })
            .await
            .unwrap();

        store
            .append_chat_messages(
                session.id,
                vec![
                    NewChatMessage::now(Role::User, "one"),
                    NewChatMessage::now(Role::Assistant, "two"),
                ],
            )
            .await
            .unwrap();
        let updated = store
            .append_chat_messages(session.id, vec![NewChatMessage::now(Role::User, "three")])
            .await
            .unwrap();

        let seqs: Vec<u64> = updated.messages.iter().map(|m| m.seq).collect();
        assert_eq!(seqs, vec![0, 1, 2]);
        assert!(updated.updated_at > session.updated_at);
    }

    #[tokio::test]
    async fn concurrent_appends_never_lose_messages() {
        let store = std::sync::Arc::new(MemStore::new());
        let session = store
            .create_chat_session(NewChatSession {
                user_id: Uuid::new_v4(),
                title: "Busy".to_string(),
            })
            .await
            .unwrap();
        let session_id = session.id;

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .append_chat_messages(
                        session_id,
                        vec![NewChatMessage::now(Role::User, format!("message {}", i))],
                    )
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let stored = store.get_chat_session(session_id).await.unwrap();
        assert_eq!(stored.messages.len(), 16);
        assert!(stored.messages.windows(2).all(|w| w[0].seq < w[1].seq));
    }

    #[tokio::test]
    async fn sessions_list_most_recently_updated_first() {
        let store = MemStore::new();
        let user_id = Uuid::new_v4();
        let older = store
            .create_chat_session(NewChatSession {
                user_id,
                title: "Older".to_string(),
            })
            .await
            .unwrap();
        store
            .create_chat_session(NewChatSession {
                user_id,
                title: "Newer".to_string(),
            })
            .await
            .unwrap();
        store
            .append_chat_messages(older.id, vec![NewChatMessage::now(Role::User, "bump")])
            .await
            .unwrap();

        let titles: Vec<String> = store
            .list_chat_sessions(user_id)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.title)
            .collect();
        assert_eq!(titles, vec!["Older", "Newer"]);
    }

    #[tokio::test]
    async fn results_are_appended_not_overwritten() {
        let store = MemStore::seeded();
        let user_id = Uuid::new_v4();
        let submit = || NewAssessmentResult {
            user_id,
            assessment_id: "1".to_string(),
            answers: BTreeMap::new(),
            scores: BTreeMap::new(),
            recommendations: Vec::new(),
        };

        let first = store.create_assessment_result(submit()).await.unwrap();
        let second = store.create_assessment_result(submit()).await.unwrap();

        assert_ne!(first.id, second.id);
        assert!(second.completed_at > first.completed_at);
        let history: Vec<Uuid> = store
            .list_assessment_results(user_id)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(history, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn new_logins_sweep_expired_auth_sessions() {
        let store = MemStore::new();
        let user_id = Uuid::new_v4();
        for i in 0..50 {
            store
                .create_auth_session(
                    &format!("stale-{}", i),
                    user_id,
                    Utc::now() - Duration::seconds(1),
                )
                .await
                .unwrap();
        }
        store
            .create_auth_session("live", user_id, Utc::now() + Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(store.tables.read().await.auth_sessions.len(), 1);
        assert_eq!(store.validate_auth_session("live").await, Ok(user_id));
        assert!(matches!(
            store.validate_auth_session("stale-0").await,
            Err(PortError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn expired_session_is_removed_when_presented() {
        let store = MemStore::new();
        let user_id = Uuid::new_v4();
        store
            .create_auth_session("old", user_id, Utc::now() - Duration::seconds(1))
            .await
            .unwrap();

        assert!(matches!(
            store.validate_auth_session("old").await,
            Err(PortError::NotFound(_))
        ));
        assert!(store.tables.read().await.auth_sessions.is_empty());
    }

    #[tokio::test]
    async fn update_user_only_touches_given_fields() {
        let store = MemStore::new();
        let created = store.create_user(new_user("lee@example.com")).await.unwrap();
        let updated = store
            .update_user(
                created.id,
                UserUpdate {
                    age: Some(30),
                    ..UserUpdate::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.age, 30);
        assert_eq!(updated.name, created.name);
        assert_eq!(updated.email, created.email);
    }
}
