//! In-process app wiring for the router tests.

use async_trait::async_trait;
use axum::http::HeaderValue;
use axum_test::TestServer;
use chrono::{Duration, Utc};
use coaching_core::{
    domain::{AnsweredQuestion, NewUser, PromptMessage, User, UserContext},
    ports::{AssessmentAnalysisService, CoachingService, EntityStore, PortError, PortResult},
    MemStore,
};
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::Config;
use crate::web::{app_router, middleware::SESSION_COOKIE, state::AppState};

/// Answers every coaching and scoring request with the same canned JSON.
pub struct CannedAi;

#[async_trait]
impl CoachingService for CannedAi {
    async fn coach(&self, _: &[PromptMessage], _: Option<&UserContext>) -> PortResult<Value> {
        Ok(json!({
            "response": "Tell me more about that.",
            "suggestions": ["I felt unheard", "It happens often"],
            "feedback": "Nice open question."
        }))
    }
}

#[async_trait]
impl AssessmentAnalysisService for CannedAi {
    async fn analyze(&self, _: &[AnsweredQuestion]) -> PortResult<Value> {
        Ok(json!({
            "scores": { "communication": 72 },
            "recommendations": ["Practice reflective listening"]
        }))
    }
}

/// Fails every request the way an unreachable provider would.
pub struct FailingAi;

#[async_trait]
impl CoachingService for FailingAi {
    async fn coach(&self, _: &[PromptMessage], _: Option<&UserContext>) -> PortResult<Value> {
        Err(PortError::ExternalService("connection refused".to_string()))
    }
}

#[async_trait]
impl AssessmentAnalysisService for FailingAi {
    async fn analyze(&self, _: &[AnsweredQuestion]) -> PortResult<Value> {
        Err(PortError::ExternalService("connection refused".to_string()))
    }
}

pub fn test_app() -> (TestServer, Arc<AppState>) {
    test_app_with(Arc::new(CannedAi), Arc::new(CannedAi))
}

pub fn test_app_with(
    coach: Arc<dyn CoachingService>,
    analyst: Arc<dyn AssessmentAnalysisService>,
) -> (TestServer, Arc<AppState>) {
    let config = Arc::new(Config::from_lookup(|_| None).unwrap());
    let store: Arc<dyn EntityStore> = Arc::new(MemStore::seeded());
    let state = Arc::new(AppState::new(config, store, coach, analyst));
    let server = TestServer::new(app_router(state.clone())).unwrap();
    (server, state)
}

/// Creates a user directly in the store and returns it with a valid session cookie.
pub async fn signed_in(state: &AppState, email: &str) -> (User, HeaderValue) {
    let user = state
        .store
        .create_user(NewUser {
            email: email.to_string(),
            hashed_password: "not-a-real-hash".to_string(),
            name: "Test User".to_string(),
            age: 30,
            preferences: Default::default(),
        })
        .await
        .unwrap();

    let token = Uuid::new_v4().to_string();
    state
        .store
        .create_auth_session(&token, user.id, Utc::now() + Duration::hours(1))
        .await
        .unwrap();

    let cookie = HeaderValue::from_str(&format!("{}={}", SESSION_COOKIE, token)).unwrap();
    (user, cookie)
}
