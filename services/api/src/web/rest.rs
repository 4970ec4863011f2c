//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the learning catalog and progress endpoints,
//! and the master definition for the OpenAPI specification.

use crate::error::ApiError;
use crate::web::extract::ApiJson;
use crate::web::{assessments, auth, chats, state::AppState};
use axum::{
    extract::{Path, State},
    response::Json,
    Extension,
};
use coaching_core::{
    domain::{LearningModule, ProgressUpdate, UserProgress},
    guard, progress, Caller,
};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::register_handler,
        auth::login_handler,
        auth::logout_handler,
        auth::me_handler,
        auth::update_me_handler,
        list_modules_handler,
        get_module_handler,
        list_progress_handler,
        record_progress_handler,
        chats::list_chats_handler,
        chats::create_chat_handler,
        chats::get_chat_handler,
        chats::rename_chat_handler,
        chats::send_message_handler,
        assessments::list_assessments_handler,
        assessments::get_assessment_handler,
        assessments::submit_assessment_handler,
        assessments::list_results_handler,
    ),
    components(
        schemas(
            auth::RegisterRequest,
            auth::LoginRequest,
            auth::UpdateProfileRequest,
            auth::AuthResponse,
            RecordProgressRequest,
            chats::CreateChatRequest,
            chats::SendMessageRequest,
            chats::SendMessageResponse,
            assessments::SubmitAnswersRequest,
        )
    ),
    tags(
        (name = "Relationship Coach API", description = "Skill assessments, AI coaching chats and learning progress.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Payload Structs
//=========================================================================================

/// A progress report for one skill. Absent fields keep their stored value.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordProgressRequest {
    #[serde(default)]
    pub skill_type: String,
    pub module_id: Option<String>,
    pub progress: Option<u8>,
    pub completed_exercises: Option<BTreeSet<String>>,
}

//=========================================================================================
// Learning Module Handlers
//=========================================================================================

/// List every learning module in the catalog.
#[utoipa::path(
    get,
    path = "/api/modules",
    responses(
        (status = 200, description = "All learning modules"),
        (status = 401, description = "Authentication required")
    )
)]
pub async fn list_modules_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<LearningModule>>, ApiError> {
    Ok(Json(state.store.list_learning_modules().await?))
}

/// Fetch one learning module.
#[utoipa::path(
    get,
    path = "/api/modules/{id}",
    params(("id" = String, Path, description = "Module id")),
    responses(
        (status = 200, description = "The learning module"),
        (status = 404, description = "Module not found")
    )
)]
pub async fn get_module_handler(
    State(state): State<Arc<AppState>>,
    Path(module_id): Path<String>,
) -> Result<Json<LearningModule>, ApiError> {
    Ok(Json(state.store.get_learning_module(&module_id).await?))
}

//=========================================================================================
// Progress Handlers
//=========================================================================================

/// List the caller's progress rows.
#[utoipa::path(
    get,
    path = "/api/progress",
    responses(
        (status = 200, description = "The caller's progress, one row per skill"),
        (status = 401, description = "Authentication required")
    )
)]
pub async fn list_progress_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<UserProgress>>, ApiError> {
    Ok(Json(guard::owned_progress(&*state.store, &caller).await?))
}

/// Create or update the caller's progress on one skill.
#[utoipa::path(
    post,
    path = "/api/progress",
    request_body = RecordProgressRequest,
    responses(
        (status = 200, description = "The stored progress row"),
        (status = 400, description = "Missing skill type or progress out of range"),
        (status = 401, description = "Authentication required")
    )
)]
pub async fn record_progress_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    ApiJson(req): ApiJson<RecordProgressRequest>,
) -> Result<Json<UserProgress>, ApiError> {
    let update = ProgressUpdate {
        module_id: req.module_id,
        progress: req.progress,
        completed_exercises: req.completed_exercises,
    };
    let row = progress::record_progress(&*state.store, &caller, &req.skill_type, update).await?;
    Ok(Json(row))
}
