pub mod assessment_llm;
pub mod coach_llm;

pub use assessment_llm::OpenAiAssessmentAdapter;
pub use coach_llm::OpenAiCoachAdapter;

use async_openai::types::chat::CreateChatCompletionResponse;
use coaching_core::ports::{PortError, PortResult};
use serde_json::Value;

/// Pulls the first choice's text out of a completion and parses it as a JSON
/// object. Anything else is treated as a failed transform.
pub(crate) fn json_object_from_completion(
    response: CreateChatCompletionResponse,
) -> PortResult<Value> {
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| {
            PortError::ExternalService("LLM response contained no text content.".to_string())
        })?;
    parse_json_object(&content)
}

pub(crate) fn parse_json_object(content: &str) -> PortResult<Value> {
    let value: Value = serde_json::from_str(content.trim())
        .map_err(|e| PortError::ExternalService(format!("LLM returned invalid JSON: {}", e)))?;
    if !value.is_object() {
        return Err(PortError::ExternalService(
            "LLM returned JSON that is not an object.".to_string(),
        ));
    }
    Ok(value)
}
