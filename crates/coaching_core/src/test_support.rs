//! Scripted doubles for the AI ports, shared by the unit tests.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;
use std::time::Duration;

use crate::domain::{AnsweredQuestion, PromptMessage, UserContext};
use crate::ports::{AssessmentAnalysisService, CoachingService, PortError, PortResult};

type CoachCall = (Vec<PromptMessage>, Option<UserContext>);

/// A coach that returns a fixed reply (or a fixed failure) and records calls.
pub struct ScriptedCoach {
    reply: PortResult<Value>,
    calls: Mutex<Vec<CoachCall>>,
}

impl ScriptedCoach {
    pub fn replying(reply: Value) -> Self {
        Self {
            reply: Ok(reply),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: Err(PortError::ExternalService("quota exceeded".to_string())),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<CoachCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CoachingService for ScriptedCoach {
    async fn coach(
        &self,
        transcript: &[PromptMessage],
        context: Option<&UserContext>,
    ) -> PortResult<Value> {
        self.calls
            .lock()
            .unwrap()
            .push((transcript.to_vec(), context.cloned()));
        self.reply.clone()
    }
}

/// A coach that never answers within any reasonable timeout.
pub struct SlowCoach {
    delay: Duration,
}

impl SlowCoach {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl CoachingService for SlowCoach {
    async fn coach(&self, _: &[PromptMessage], _: Option<&UserContext>) -> PortResult<Value> {
        tokio::time::sleep(self.delay).await;
        Ok(serde_json::json!({"response": "too late"}))
    }
}

/// An analyst that returns a fixed reply (or a fixed failure) and records calls.
pub struct ScriptedAnalyst {
    reply: PortResult<Value>,
    calls: Mutex<Vec<Vec<AnsweredQuestion>>>,
}

impl ScriptedAnalyst {
    pub fn replying(reply: Value) -> Self {
        Self {
            reply: Ok(reply),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: Err(PortError::ExternalService("malformed JSON".to_string())),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Vec<AnsweredQuestion>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AssessmentAnalysisService for ScriptedAnalyst {
    async fn analyze(&self, answered: &[AnsweredQuestion]) -> PortResult<Value> {
        self.calls.lock().unwrap().push(answered.to_vec());
        self.reply.clone()
    }
}
