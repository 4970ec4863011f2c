//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for registration, login, logout and the caller's
//! own profile.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use coaching_core::{
    domain::{NewUser, User, UserPreferences, UserUpdate},
    ports::PortError,
    Caller,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::web::extract::ApiJson;
use crate::web::{
    middleware::{session_token, SESSION_COOKIE},
    state::AppState,
};

const MIN_PASSWORD_LEN: usize = 6;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub age: u32,
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub preferences: Option<UserPreferences>,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub age: Option<u32>,
    #[schema(value_type = Option<Object>)]
    pub preferences: Option<UserPreferences>,
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    #[schema(value_type = Object)]
    pub user: User,
}

//=========================================================================================
// Helpers
//=========================================================================================

fn validate_registration(req: &RegisterRequest) -> Result<(), ApiError> {
    let email = req.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::bad_request("A valid email is required"));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    if req.name.trim().is_empty() {
        return Err(ApiError::bad_request("Name is required"));
    }
    Ok(())
}

fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            ApiError::Internal("Failed to hash password".to_string())
        })
}

fn verify_password(password: &str, hashed_password: &str) -> Result<bool, ApiError> {
    let parsed_hash = PasswordHash::new(hashed_password).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        ApiError::Internal("Authentication error".to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Renders the session cookie. `Secure` is only set when configured, so
/// plain-HTTP development still works.
fn session_cookie(value: &str, max_age_secs: i64, secure: bool) -> String {
    format!(
        "{}={}; HttpOnly;{} SameSite=Lax; Path=/; Max-Age={}",
        SESSION_COOKIE,
        value,
        if secure { " Secure;" } else { "" },
        max_age_secs
    )
}

/// Opens an auth session for the user and returns the `Set-Cookie` value.
async fn start_session(state: &AppState, user_id: Uuid) -> Result<String, ApiError> {
    let auth_session_id = Uuid::new_v4().to_string();
    let ttl = state.config.session_ttl;
    let expires_at = Utc::now()
        .checked_add_signed(ttl)
        .ok_or_else(|| ApiError::Internal("Session expiry is out of range".to_string()))?;
    state
        .store
        .create_auth_session(&auth_session_id, user_id, expires_at)
        .await?;

    Ok(session_cookie(
        &auth_session_id,
        ttl.num_seconds(),
        state.config.secure_cookies,
    ))
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /api/auth/register - Create a new user account
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created successfully", body = AuthResponse),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_registration(&req)?;
    let hashed_password = hash_password(&req.password)?;

    let user = state
        .store
        .create_user(NewUser {
            email: req.email.trim().to_string(),
            hashed_password,
            name: req.name.trim().to_string(),
            age: req.age,
            preferences: req.preferences.unwrap_or_default(),
        })
        .await?;
    info!("Registered user {}", user.id);

    let cookie = start_session(&state, user.id).await?;
    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse { user }),
    ))
}

/// POST /api/auth/login - Login with existing account
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = req.email.trim();
    let creds = match state.store.get_credentials_by_email(email).await {
        Ok(creds) => creds,
        Err(PortError::NotFound(_)) => return Err(ApiError::InvalidCredentials),
        Err(e) => return Err(e.into()),
    };

    if !verify_password(&req.password, &creds.hashed_password)? {
        return Err(ApiError::InvalidCredentials);
    }

    let user = state.store.get_user(creds.user_id).await?;
    let cookie = start_session(&state, user.id).await?;
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse { user }),
    ))
}

/// POST /api/auth/logout - Logout and invalidate session
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logout successful")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(auth_session_id) = session_token(&headers) {
        state.store.delete_auth_session(auth_session_id).await?;
    }

    let cookie = session_cookie("", 0, state.config.secure_cookies);
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(serde_json::json!({ "message": "Logged out successfully" })),
    ))
}

/// GET /api/auth/me - The authenticated caller's profile
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = AuthResponse),
        (status = 401, description = "Authentication required")
    )
)]
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<AuthResponse>, ApiError> {
    let user = state.store.get_user(caller.user_id).await?;
    Ok(Json(AuthResponse { user }))
}

/// PATCH /api/users/me - Update the caller's name, age or preferences
#[utoipa::path(
    patch,
    path = "/api/users/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated user", body = AuthResponse),
        (status = 400, description = "Invalid request"),
        (status = 401, description = "Authentication required")
    )
)]
pub async fn update_me_handler(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let name = req.name.map(|n| n.trim().to_string());
    if name.as_deref() == Some("") {
        return Err(ApiError::bad_request("Name must not be empty"));
    }

    let user = state
        .store
        .update_user(
            caller.user_id,
            UserUpdate {
                name,
                age: req.age,
                preferences: req.preferences,
            },
        )
        .await?;
    Ok(Json(AuthResponse { user }))
}
