//! services/api/src/web/assessments.rs
//!
//! Handlers for the assessment catalog, submissions and result history.

use axum::{
    extract::{Path, State},
    response::Json,
    Extension,
};
use coaching_core::{
    domain::{Assessment, AssessmentResult},
    guard, Caller,
};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::ApiError;
use crate::web::extract::ApiJson;
use crate::web::state::AppState;

#[derive(Deserialize, ToSchema)]
pub struct SubmitAnswersRequest {
    /// Answers keyed by question id.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub answers: BTreeMap<String, Value>,
}

/// List every assessment in the catalog.
#[utoipa::path(
    get,
    path = "/api/assessments",
    responses(
        (status = 200, description = "All assessments"),
        (status = 401, description = "Authentication required")
    )
)]
pub async fn list_assessments_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Assessment>>, ApiError> {
    Ok(Json(state.store.list_assessments().await?))
}

/// Fetch one assessment with its questions.
#[utoipa::path(
    get,
    path = "/api/assessments/{id}",
    params(("id" = String, Path, description = "Assessment id")),
    responses(
        (status = 200, description = "The assessment"),
        (status = 404, description = "Assessment not found")
    )
)]
pub async fn get_assessment_handler(
    State(state): State<Arc<AppState>>,
    Path(assessment_id): Path<String>,
) -> Result<Json<Assessment>, ApiError> {
    Ok(Json(state.store.get_assessment(&assessment_id).await?))
}

/// Submit answers for scoring. Every submission is kept as a new result.
#[utoipa::path(
    post,
    path = "/api/assessments/{id}/submit",
    params(("id" = String, Path, description = "Assessment id")),
    request_body = SubmitAnswersRequest,
    responses(
        (status = 200, description = "The scored result"),
        (status = 400, description = "Missing answers"),
        (status = 404, description = "Assessment not found"),
        (status = 500, description = "Scoring failed; retry")
    )
)]
pub async fn submit_assessment_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(assessment_id): Path<String>,
    ApiJson(req): ApiJson<SubmitAnswersRequest>,
) -> Result<Json<AssessmentResult>, ApiError> {
    let result = state
        .scoring
        .submit(&caller, &assessment_id, req.answers)
        .await?;
    Ok(Json(result))
}

/// List the caller's past results, newest first.
#[utoipa::path(
    get,
    path = "/api/assessment-results",
    responses(
        (status = 200, description = "The caller's assessment history"),
        (status = 401, description = "Authentication required")
    )
)]
pub async fn list_results_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<AssessmentResult>>, ApiError> {
    Ok(Json(
        guard::owned_assessment_results(&*state.store, &caller).await?,
    ))
}
