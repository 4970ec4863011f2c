//! services/api/src/adapters/coach_llm.rs
//!
//! This module contains the adapter for the coaching LLM.
//! It implements the `CoachingService` port from the `core` crate.

const SYSTEM_INSTRUCTIONS: &str = r#"You are RelationshipWise AI, an expert relationship coach focused on teaching healthy communication skills and emotional intelligence. Your role is to:

1. Provide educational, supportive guidance on relationship skills
2. Help users practice communication scenarios
3. Offer constructive feedback on their responses
4. Suggest practical exercises and improvements
5. Maintain a professional, encouraging tone

Guidelines:
- Keep all content appropriate and educational
- Focus on healthy relationship dynamics
- Provide specific, actionable advice
- Encourage self-reflection and growth
- Use age-appropriate language based on user context

User context: {user_context}

Respond with a JSON object containing:
- response: Your main coaching response
- suggestions: Array of 2-3 quick suggestion buttons
- feedback: Brief constructive feedback if applicable"#;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, ResponseFormat,
    },
    Client,
};
use async_trait::async_trait;
use coaching_core::{
    domain::{PromptMessage, Role, UserContext},
    ports::{CoachingService, PortError, PortResult},
};
use serde_json::Value;
use tracing::debug;

use super::json_object_from_completion;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `CoachingService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiCoachAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiCoachAdapter {
    /// Creates a new `OpenAiCoachAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

/// Renders the caller's profile for the system prompt.
fn describe_context(context: Option<&UserContext>) -> String {
    let Some(context) = context else {
        return "Not provided".to_string();
    };

    let mut parts = vec![format!("Age: {}", context.age)];
    if let Some(style) = context
        .preferences
        .get("communicationStyle")
        .and_then(Value::as_str)
    {
        parts.push(format!("Communication style: {}", style));
    }
    if let Some(goals) = context
        .preferences
        .get("learningGoals")
        .and_then(Value::as_array)
    {
        let goals: Vec<&str> = goals.iter().filter_map(Value::as_str).collect();
        if !goals.is_empty() {
            parts.push(format!("Learning goals: {}", goals.join(", ")));
        }
    }
    parts.join("; ")
}

fn to_request_message(message: &PromptMessage) -> PortResult<ChatCompletionRequestMessage> {
    let built: Result<ChatCompletionRequestMessage, OpenAIError> = match message.role {
        Role::User => ChatCompletionRequestUserMessageArgs::default()
            .content(message.content.clone())
            .build()
            .map(Into::into),
        Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
            .content(message.content.clone())
            .build()
            .map(Into::into),
    };
    built.map_err(|e| PortError::Unexpected(e.to_string()))
}

//=========================================================================================
// `CoachingService` Trait Implementation
//=========================================================================================

#[async_trait]
impl CoachingService for OpenAiCoachAdapter {
    /// Asks the model for the next coaching turn as a JSON object.
    async fn coach(
        &self,
        transcript: &[PromptMessage],
        context: Option<&UserContext>,
    ) -> PortResult<Value> {
        let system_prompt = SYSTEM_INSTRUCTIONS.replace("{user_context}", &describe_context(context));

        let mut messages: Vec<ChatCompletionRequestMessage> = Vec::with_capacity(transcript.len() + 1);
        messages.push(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system_prompt)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        );
        for message in transcript {
            messages.push(to_request_message(message)?);
        }

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .response_format(ResponseFormat::JsonObject)
            .max_completion_tokens(800u32)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        debug!("Requesting coaching turn for {} transcript messages", transcript.len());
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::ExternalService(e.to_string()))?;

        json_object_from_completion(response)
    }
}
