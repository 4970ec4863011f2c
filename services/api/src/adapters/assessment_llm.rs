//! services/api/src/adapters/assessment_llm.rs
//!
//! This module contains the adapter for the assessment-scoring LLM.
//! It implements the `AssessmentAnalysisService` port from the `core` crate.

const PROMPT_TEMPLATE: &str = r#"Analyze these assessment answers for relationship skills evaluation:

Questions and Answers:
{answers}

Provide analysis as JSON with:
- scores: Object with category scores (0-100 scale) for each category found
- recommendations: Array of specific improvement recommendations

Focus on these skill categories:
- communication: How well they communicate
- social_awareness: Ability to read social cues
- conflict_resolution: Handling disagreements
- empathy: Understanding others' feelings
- trust_building: Creating trusted relationships"#;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs, ResponseFormat},
    Client,
};
use async_trait::async_trait;
use coaching_core::{
    domain::AnsweredQuestion,
    ports::{AssessmentAnalysisService, PortError, PortResult},
};
use serde_json::Value;

use super::json_object_from_completion;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `AssessmentAnalysisService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiAssessmentAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiAssessmentAdapter {
    /// Creates a new `OpenAiAssessmentAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

/// One line per question: `category - question: answer`.
fn render_answers(answered: &[AnsweredQuestion]) -> String {
    answered
        .iter()
        .map(|a| format!("{} - {}: {}", a.question.category, a.question.question, a.answer))
        .collect::<Vec<_>>()
        .join("\n")
}

//=========================================================================================
// `AssessmentAnalysisService` Trait Implementation
//=========================================================================================

#[async_trait]
impl AssessmentAnalysisService for OpenAiAssessmentAdapter {
    async fn analyze(&self, answered: &[AnsweredQuestion]) -> PortResult<Value> {
        let prompt = PROMPT_TEMPLATE.replace("{answers}", &render_answers(answered));

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into()])
            .response_format(ResponseFormat::JsonObject)
            .max_completion_tokens(600u32)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Call the API and manually map the error if it occurs, which respects the orphan rule.
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::ExternalService(e.to_string()))?;

        json_object_from_completion(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coaching_core::domain::{Answer, Question, QuestionKind};
    use serde_json::json;

    fn question(id: &str, text: &str, category: &str) -> Question {
        Question {
            id: id.to_string(),
            question: text.to_string(),
            kind: QuestionKind::Text,
            options: None,
            category: category.to_string(),
        }
    }

    #[test]
    fn every_question_is_rendered_including_unanswered_ones() {
        let answered = vec![
            AnsweredQuestion {
                question: question("1", "How do you react?", "communication"),
                answer: Answer::Given(json!("I listen first")),
            },
            AnsweredQuestion {
                question: question("2", "Rate your empathy", "empathy"),
                answer: Answer::Missing,
            },
        ];

        assert_eq!(
            render_answers(&answered),
            "communication - How do you react?: I listen first\nempathy - Rate your empathy: No answer"
        );
    }
}
