//! services/api/src/web/auth.rs
//!
//! Authentication endpoints (register, login, logout), the caller's profile and
//! the admin user directory.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use text_review_core::{domain::require_non_empty, PortError, ServiceError};
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, ErrorBody};
use crate::web::dto::{MessageResponse, ProfileResponse, UserListResponse, UserQuery};
use crate::web::extract::{ApiJson, ApiQuery};
use crate::web::middleware::{session_token, CurrentUser};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub confirm_password: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub message: String,
    pub user_id: Uuid,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub message: String,
    /// The session token, also set as the `session` cookie.
    pub token: String,
    pub user: AuthUser,
}

fn session_cookie(token: &str, ttl: Duration) -> String {
    format!(
        "session={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        token,
        ttl.num_seconds()
    )
}

fn invalid_credentials() -> ApiError {
    ApiError::Unauthorized("Invalid email or password".to_string())
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
        (status = 201, description = "User created successfully", body = RegisterResponse),
        (status = 400, description = "Invalid registration form", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // 1. Validate the form
    let username = require_non_empty("username", req.username.as_deref().unwrap_or_default())?;
    let email = require_non_empty("email", req.email.as_deref().unwrap_or_default())?;
    let password = req.password.as_deref().unwrap_or_default();
    if password.is_empty() {
        return Err(ServiceError::Validation("password is required".to_string()).into());
    }
    if req.confirm_password.as_deref() != Some(password) {
        return Err(ServiceError::Validation("Passwords do not match".to_string()).into());
    }

    // 2. Hash the password
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {}", e)))?
        .to_string();

    // 3. Create user in database
    let user = state
        .db
        .create_user(username, email, &password_hash)
        .await
        .map_err(|e| match e {
            PortError::Conflict(_) => ServiceError::Validation("Email already in use".to_string()),
            other => ServiceError::from(other),
        })?;
    info!("Registered user {}", user.id);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Registration successful".to_string(),
            user_id: user.id,
        }),
    ))
}

/// POST /api/auth/login - Login with existing account
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = req.email.as_deref().map(str::trim).unwrap_or_default();
    let password = req.password.as_deref().unwrap_or_default();

    // 1. Get user by email
    let user_creds = state.db.get_user_by_email(email).await.map_err(|e| match e {
        PortError::NotFound(_) => invalid_credentials(),
        other => ApiError::Port(other),
    })?;

    // 2. Verify password
    let parsed_hash = PasswordHash::new(&user_creds.hashed_password).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        ApiError::Internal("Authentication error".to_string())
    })?;
    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(invalid_credentials());
    }

    // 3. Create the auth session
    let user = state.db.get_user_by_id(user_creds.user_id).await?;
    let auth_session_id = Uuid::new_v4().to_string();
    let ttl = Duration::days(state.config.session_ttl_days);
    state
        .db
        .create_auth_session(&auth_session_id, user.id, Utc::now() + ttl)
        .await?;

    // 4. Return response with cookie
    let response = LoginResponse {
        message: "Login successful".to_string(),
        token: auth_session_id.clone(),
        user: AuthUser {
            id: user.id,
            username: user.username,
            email: user.email,
            is_admin: user.is_admin,
        },
    };

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, session_cookie(&auth_session_id, ttl))],
        Json(response),
    ))
}

/// POST /api/auth/logout - Logout and invalidate session
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logout successful", body = MessageResponse),
        (status = 401, description = "No active session", body = ErrorBody)
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let auth_session_id = session_token(&headers)
        .ok_or_else(|| ApiError::Unauthorized("No session found".to_string()))?;

    state.db.delete_auth_session(auth_session_id).await?;

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, session_cookie("", Duration::zero()))],
        Json(MessageResponse::new("Logged out")),
    ))
}

/// GET /api/auth/me - The caller's profile
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = ProfileResponse),
        (status = 401, description = "Unauthenticated", body = ErrorBody)
    )
)]
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    let profile = state.users.profile(&identity).await?;
    Ok(Json(profile.into()))
}

/// GET /api/auth/users - Paginated user directory (admins only)
#[utoipa::path(
    get,
    path = "/api/auth/users",
    params(UserQuery),
    responses(
        (status = 200, description = "One page of users", body = UserListResponse),
        (status = 401, description = "Unauthenticated", body = ErrorBody),
        (status = 403, description = "Caller is not an admin", body = ErrorBody)
    )
)]
pub async fn list_users_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(identity): CurrentUser,
    ApiQuery(query): ApiQuery<UserQuery>,
) -> Result<Json<UserListResponse>, ApiError> {
    let page = state
        .users
        .list_users(&identity, query.keyword.as_deref(), query.cursor())
        .await?;
    Ok(Json(page.into()))
}
