//! crates/coaching_core/src/scoring.rs
//!
//! Scores an assessment submission through the analysis transform and keeps
//! every submission as its own historical result.

use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::domain::{
    Answer, AnsweredQuestion, AssessmentAnalysis, AssessmentResult, NewAssessmentResult, Question,
};
use crate::guard::Caller;
use crate::ports::{AssessmentAnalysisService, EntityStore, PortError, PortResult};

pub const RETRY_MESSAGE: &str = "Failed to submit assessment. Please try again.";

const FALLBACK_RECOMMENDATIONS: [&str; 3] = [
    "Continue learning with our modules",
    "Practice active listening",
    "Work on emotional awareness",
];

/// Pairs every question with the caller's answer. Questions without an
/// answer (or with a `null` one) get [`Answer::Missing`].
pub fn pair_answers(
    questions: &[Question],
    answers: &BTreeMap<String, Value>,
) -> Vec<AnsweredQuestion> {
    questions
        .iter()
        .map(|question| AnsweredQuestion {
            question: question.clone(),
            answer: match answers.get(&question.id) {
                Some(Value::Null) | None => Answer::Missing,
                Some(value) => Answer::Given(value.clone()),
            },
        })
        .collect()
}

fn coerce_score(value: &Value) -> Option<u8> {
    let score = value.as_f64()?;
    if !score.is_finite() {
        return None;
    }
    Some(score.round().clamp(0.0, 100.0) as u8)
}

impl AssessmentAnalysis {
    /// Coerces an untrusted model reply into shape. Non-numeric scores are
    /// dropped and the rest clamped to `0..=100`.
    pub fn from_untrusted(raw: &Value) -> Self {
        let scores: BTreeMap<String, u8> = raw
            .get("scores")
            .and_then(Value::as_object)
            .map(|scores| {
                scores
                    .iter()
                    .filter_map(|(category, value)| {
                        coerce_score(value).map(|score| (category.clone(), score))
                    })
                    .collect()
            })
            .unwrap_or_default();
        if scores.is_empty() {
            warn!("Assessment analysis contained no usable scores.");
        }

        let recommendations: Vec<String> = raw
            .get("recommendations")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            scores,
            recommendations: if recommendations.is_empty() {
                FALLBACK_RECOMMENDATIONS.iter().map(|r| r.to_string()).collect()
            } else {
                recommendations
            },
        }
    }
}

pub struct ScoringOrchestrator {
    store: Arc<dyn EntityStore>,
    analyst: Arc<dyn AssessmentAnalysisService>,
    ai_timeout: Duration,
}

impl ScoringOrchestrator {
    pub fn new(
        store: Arc<dyn EntityStore>,
        analyst: Arc<dyn AssessmentAnalysisService>,
        ai_timeout: Duration,
    ) -> Self {
        Self {
            store,
            analyst,
            ai_timeout,
        }
    }

    /// Scores a submission and stores it as a new result row.
    pub async fn submit(
        &self,
        caller: &Caller,
        assessment_id: &str,
        answers: BTreeMap<String, Value>,
    ) -> PortResult<AssessmentResult> {
        if answers.is_empty() {
            return Err(PortError::BadRequest("Answers are required".to_string()));
        }

        let assessment = self.store.get_assessment(assessment_id).await?;
        let answered = pair_answers(&assessment.questions, &answers);

        let raw = match tokio::time::timeout(self.ai_timeout, self.analyst.analyze(&answered)).await
        {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                error!("Assessment analysis failed for {}: {:?}", assessment_id, e);
                return Err(PortError::ExternalService(RETRY_MESSAGE.to_string()));
            }
            Err(_) => {
                error!(
                    "Assessment analysis timed out after {:?} for {}",
                    self.ai_timeout, assessment_id
                );
                return Err(PortError::ExternalService(RETRY_MESSAGE.to_string()));
            }
        };
        let analysis = AssessmentAnalysis::from_untrusted(&raw);

        let result = self
            .store
            .create_assessment_result(NewAssessmentResult {
                user_id: caller.user_id,
                assessment_id: assessment.id,
                answers,
                scores: analysis.scores,
                recommendations: analysis.recommendations,
            })
            .await?;
        info!("Stored assessment result {} for user {}", result.id, caller.user_id);
        Ok(result)
    }
}
