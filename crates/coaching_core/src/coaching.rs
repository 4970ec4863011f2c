//! crates/coaching_core/src/coaching.rs
//!
//! Drives one coaching turn: the user message and the assistant reply are
//! persisted together, or not at all.

use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::{ChatSession, CoachingReply, NewChatMessage, PromptMessage, Role, UserContext};
use crate::guard::{self, Caller};
use crate::ports::{CoachingService, EntityStore, PortError, PortResult};

pub const RETRY_MESSAGE: &str = "Failed to process message. Please try again.";

const FALLBACK_RESPONSE: &str =
    "I'm here to help with your relationship skills. What would you like to work on?";
const FALLBACK_SUGGESTIONS: [&str; 3] = ["Give me an example", "Different scenario", "I need help"];

/// What the caller gets back from a successful turn.
#[derive(Debug, Clone)]
pub struct CoachingTurn {
    pub session: ChatSession,
    pub suggestions: Vec<String>,
    pub feedback: Option<String>,
}

impl CoachingReply {
    /// Coerces an untrusted model reply into shape, filling in defaults for
    /// anything missing or mistyped.
    pub fn from_untrusted(raw: &Value) -> Self {
        let response = raw
            .get("response")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);
        if response.is_none() {
            warn!("Coaching reply had no usable response text; using fallback.");
        }

        let suggestions = match raw.get("suggestions").and_then(Value::as_array) {
            Some(items) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            None => FALLBACK_SUGGESTIONS.iter().map(|s| s.to_string()).collect(),
        };

        let feedback = raw
            .get("feedback")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_string);

        Self {
            response: response.unwrap_or_else(|| FALLBACK_RESPONSE.to_string()),
            suggestions,
            feedback,
        }
    }
}

/// Hands out one async mutex per chat session so turns on the same session
/// run one after another.
#[derive(Default)]
struct TurnLocks {
    locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl TurnLocks {
    async fn acquire(&self, session_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            // Drop locks nobody is holding or waiting on.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks.entry(session_id).or_default().clone()
        };
        lock.lock_owned().await
    }
}

pub struct CoachingOrchestrator {
    store: Arc<dyn EntityStore>,
    coach: Arc<dyn CoachingService>,
    ai_timeout: Duration,
    turn_locks: TurnLocks,
}

impl CoachingOrchestrator {
    pub fn new(
        store: Arc<dyn EntityStore>,
        coach: Arc<dyn CoachingService>,
        ai_timeout: Duration,
    ) -> Self {
        Self {
            store,
            coach,
            ai_timeout,
            turn_locks: TurnLocks::default(),
        }
    }

    /// Sends a user message to an owned session and records the reply.
    ///
    /// If the AI call fails or times out the session is left exactly as it
    /// was, and the caller receives a generic retry error.
    pub async fn send_message(
        &self,
        caller: &Caller,
        session_id: Uuid,
        message: &str,
    ) -> PortResult<CoachingTurn> {
        if message.trim().is_empty() {
            return Err(PortError::BadRequest("Message is required".to_string()));
        }

        // Resolve ownership before queueing behind other turns.
        guard::owned_chat_session(&*self.store, caller, session_id).await?;
        let _turn = self.turn_locks.acquire(session_id).await;
        let session = guard::owned_chat_session(&*self.store, caller, session_id).await?;

        let context = match self.store.get_user(caller.user_id).await {
            Ok(user) => Some(UserContext::from(&user)),
            Err(PortError::NotFound(_)) => None,
            Err(e) => return Err(e),
        };

        let user_message = NewChatMessage::now(Role::User, message);
        let transcript: Vec<PromptMessage> = session
            .messages
            .iter()
            .map(PromptMessage::from)
            .chain(std::iter::once(PromptMessage::from(&user_message)))
            .collect();

        let raw = match tokio::time::timeout(
            self.ai_timeout,
            self.coach.coach(&transcript, context.as_ref()),
        )
        .await
        {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                error!("Coaching transform failed for session {}: {:?}", session_id, e);
                return Err(PortError::ExternalService(RETRY_MESSAGE.to_string()));
            }
            Err(_) => {
                error!(
                    "Coaching transform timed out after {:?} for session {}",
                    self.ai_timeout, session_id
                );
                return Err(PortError::ExternalService(RETRY_MESSAGE.to_string()));
            }
        };
        let reply = CoachingReply::from_untrusted(&raw);

        let assistant_message = NewChatMessage {
            role: Role::Assistant,
            content: reply.response,
            timestamp: Utc::now().max(user_message.timestamp),
        };
        let session = self
            .store
            .append_chat_messages(session_id, vec![user_message, assistant_message])
            .await?;
        info!(
            "Coaching turn stored for session {} ({} messages)",
            session_id,
            session.messages.len()
        );

        Ok(CoachingTurn {
            session,
            suggestions: reply.suggestions,
            feedback: reply.feedback,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NewUser;
    use crate::store::MemStore;
    use crate::test_support::{ScriptedCoach, SlowCoach};
    use serde_json::{json, Map};

    async fn setup(coach: Arc<dyn CoachingService>) -> (Arc<MemStore>, CoachingOrchestrator, Caller, Uuid) {
        let store = Arc::new(MemStore::seeded());
        let user = store
            .create_user(NewUser {
                email: "ada@example.com".to_string(),
                hashed_password: "hash".to_string(),
                name: "Ada".to_string(),
                age: 34,
                preferences: Map::new(),
            })
            .await
            .unwrap();
        let caller = Caller::new(user.id);
        let session = guard::open_chat_session(&*store, &caller, "Practice").await.unwrap();
        let orchestrator =
            CoachingOrchestrator::new(store.clone(), coach, Duration::from_millis(200));
        (store, orchestrator, caller, session.id)
    }

    #[tokio::test]
    async fn hello_appends_user_then_assistant() {
        let coach = Arc::new(ScriptedCoach::replying(json!({
            "response": "Hi! What would you like to practice?",
            "suggestions": ["Listening", "Conflict"],
            "feedback": "Nice opener."
        })));
        let (_store, orchestrator, caller, session_id) = setup(coach.clone()).await;

        let turn = orchestrator.send_message(&caller, session_id, "Hello").await.unwrap();

        let messages = &turn.session.messages;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "Hello");
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].content, "Hi! What would you like to practice?");
        assert!(messages[0].timestamp <= messages[1].timestamp);
        assert_eq!(turn.suggestions, vec!["Listening", "Conflict"]);
        assert_eq!(turn.feedback.as_deref(), Some("Nice opener."));
    }

    #[tokio::test]
    async fn transcript_and_context_reach_the_transform() {
        let coach = Arc::new(ScriptedCoach::replying(json!({"response": "ok"})));
        let (_store, orchestrator, caller, session_id) = setup(coach.clone()).await;

        orchestrator.send_message(&caller, session_id, "First").await.unwrap();
        orchestrator.send_message(&caller, session_id, "Second").await.unwrap();

        let calls = coach.calls();
        assert_eq!(calls.len(), 2);
        let (transcript, context) = &calls[1];
        let contents: Vec<&str> = transcript.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["First", "ok", "Second"]);
        assert_eq!(context.as_ref().map(|c| c.age), Some(34));
    }

    #[tokio::test]
    async fn empty_message_is_a_bad_request() {
        let coach = Arc::new(ScriptedCoach::replying(json!({"response": "ok"})));
        let (_store, orchestrator, caller, session_id) = setup(coach.clone()).await;

        for message in ["", "   "] {
            let result = orchestrator.send_message(&caller, session_id, message).await;
            assert!(matches!(result, Err(PortError::BadRequest(_))));
        }
        assert!(coach.calls().is_empty());
    }

    #[tokio::test]
    async fn failed_transform_leaves_session_untouched() {
        let coach = Arc::new(ScriptedCoach::failing());
        let (store, orchestrator, caller, session_id) = setup(coach).await;
        let before = store.get_chat_session(session_id).await.unwrap();

        let result = orchestrator.send_message(&caller, session_id, "Hello").await;

        assert_eq!(
            result.map(|t| t.session),
            Err(PortError::ExternalService(RETRY_MESSAGE.to_string()))
        );
        let after = store.get_chat_session(session_id).await.unwrap();
        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn timed_out_transform_leaves_session_untouched() {
        let coach = Arc::new(SlowCoach::new(Duration::from_secs(5)));
        let (store, orchestrator, caller, session_id) = setup(coach).await;

        let result = orchestrator.send_message(&caller, session_id, "Hello").await;

        assert!(matches!(result, Err(PortError::ExternalService(_))));
        assert!(store.get_chat_session(session_id).await.unwrap().messages.is_empty());
    }

    #[tokio::test]
    async fn foreign_session_reads_as_not_found() {
        let coach = Arc::new(ScriptedCoach::replying(json!({"response": "ok"})));
        let (_store, orchestrator, _caller, session_id) = setup(coach).await;
        let intruder = Caller::new(Uuid::new_v4());

        let foreign = orchestrator.send_message(&intruder, session_id, "Hi").await;
        let missing = orchestrator.send_message(&intruder, Uuid::new_v4(), "Hi").await;

        let foreign = foreign.map(|t| t.session);
        let missing = missing.map(|t| t.session);
        assert!(matches!(foreign, Err(PortError::NotFound(_))));
        assert_eq!(foreign, missing);
    }

    #[tokio::test]
    async fn concurrent_turns_keep_every_message() {
        let coach = Arc::new(ScriptedCoach::replying(json!({"response": "ok"})));
        let (store, orchestrator, caller, session_id) = setup(coach).await;
        let orchestrator = Arc::new(orchestrator);

        let mut handles = Vec::new();
        for i in 0..8 {
            let orchestrator = orchestrator.clone();
            handles.push(tokio::spawn(async move {
                orchestrator
                    .send_message(&caller, session_id, &format!("turn {}", i))
                    .await
                    .map(|_| ())
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let session = store.get_chat_session(session_id).await.unwrap();
        assert_eq!(session.messages.len(), 16);
        for pair in session.messages.chunks(2) {
            assert_eq!(pair[0].role, Role::User);
            assert_eq!(pair[1].role, Role::Assistant);
        }
    }

    #[test]
    fn malformed_reply_is_coerced_to_defaults() {
        let reply = CoachingReply::from_untrusted(&json!({
            "response": 42,
            "suggestions": "not a list"
        }));
        assert_eq!(reply.response, FALLBACK_RESPONSE);
        assert_eq!(reply.suggestions.len(), FALLBACK_SUGGESTIONS.len());
        assert_eq!(reply.feedback, None);

        let reply = CoachingReply::from_untrusted(&json!({"response": "Sure.", "suggestions": []}));
        assert_eq!(reply.response, "Sure.");
        assert!(reply.suggestions.is_empty());
    }

    #[test]
    fn non_string_suggestions_are_dropped() {
        let reply = CoachingReply::from_untrusted(&json!({
            "response": "Try this.",
            "suggestions": ["Role-play", 7, null, "  "],
            "feedback": ""
        }));
        assert_eq!(reply.suggestions, vec!["Role-play"]);
        assert_eq!(reply.feedback, None);
    }
}
