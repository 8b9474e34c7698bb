/// Authentication endpoints
///
/// This module provides user authentication endpoints:
/// - Registration
/// - Login
/// - Current user
///
/// # Endpoints
///
/// - `POST /api/auth/register` - Register a user in a tenant and get a token
/// - `POST /api/auth/login` - Login and get a token
/// - `GET /api/auth/me` - The authenticated user

use crate::{
    app::AppState,
    error::ApiResult,
    extract::ApiJson,
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use kbhub_shared::{
    auth::{context::ActorContext, jwt},
    models::{User, UserRole},
    usecase::user::{AuthenticateUserInput, RegisterUserInput},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Accepts only the known role names
pub(crate) fn validate_role(role: &str) -> Result<(), ValidationError> {
    if UserRole::from_str(role).is_some() {
        return Ok(());
    }

    let mut error = ValidationError::new("role");
    error.message = Some("Role must be one of admin, editor, viewer".into());
    Err(error)
}

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Tenant to join
    pub tenant_id: Uuid,

    /// Display name
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// One of admin, editor, viewer
    #[validate(custom(function = "validate_role"))]
    pub role: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Tenant to log into
    pub tenant_id: Uuid,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Token response for register and login
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Access token
    pub token: String,

    /// Expiration as a Unix timestamp
    pub expires_at: i64,

    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

fn issue_token(state: &AppState, user: &User) -> ApiResult<TokenResponse> {
    let claims = jwt::Claims::for_user(user, state.token_lifetime());
    let token = jwt::create_token(&claims, state.jwt_secret())?;

    Ok(TokenResponse {
        token,
        expires_at: claims.exp,
        user_id: user.id,
        tenant_id: user.tenant_id,
        name: user.name.clone(),
        email: user.email.clone(),
        role: user.role,
    })
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/register
/// Content-Type: application/json
///
/// {
///   "tenant_id": "uuid",
///   "name": "Ada",
///   "email": "ada@acme.test",
///   "password": "SecureP@ss123",
///   "role": "editor"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `404 Not Found`: Unknown tenant
/// - `409 Conflict`: Email already registered in this tenant
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<TokenResponse>)> {
    req.validate()?;

    let user = state
        .use_cases
        .register_user()
        .execute(RegisterUserInput {
            tenant_id: req.tenant_id,
            name: req.name,
            email: req.email,
            password: req.password,
            role: req.role,
            avatar_url: None,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(issue_token(&state, &user)?)))
}

/// Login endpoint
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `401 Unauthorized`: Invalid credentials
/// - `404 Not Found`: Unknown tenant
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    req.validate()?;

    let user = state
        .use_cases
        .authenticate_user()
        .execute(AuthenticateUserInput {
            tenant_id: req.tenant_id,
            email: req.email,
            password: req.password,
        })
        .await?;

    Ok(Json(issue_token(&state, &user)?))
}

/// The authenticated user's profile
pub async fn me(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
) -> ApiResult<Json<User>> {
    let user = state
        .use_cases
        .get_user()
        .execute(&actor, actor.tenant_id, actor.user_id)
        .await?;

    Ok(Json(user))
}
