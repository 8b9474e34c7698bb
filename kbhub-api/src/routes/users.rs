/// User endpoints, scoped to the caller's tenant
///
/// # Endpoints
///
/// - `GET /api/users` - List users (admin)
/// - `GET /api/users/:id` - Get a user
/// - `PUT /api/users/:id` - Partial update (self or admin)
/// - `DELETE /api/users/:id` - Delete a user (admin)

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{ApiJson, ApiPath},
    routes::auth::validate_role,
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use kbhub_shared::{
    auth::context::ActorContext,
    models::User,
    usecase::user::UpdateUserInput,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Partial update; absent fields are left unchanged
///
/// `"avatar_url": null` clears the avatar. Changing `role` requires an admin.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1 to 100 characters"))]
    pub name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,

    #[serde(default, deserialize_with = "crate::extract::double_option")]
    pub avatar_url: Option<Option<String>>,

    #[validate(custom(function = "validate_role"))]
    pub role: Option<String>,
}

pub async fn list_users(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
) -> ApiResult<Json<Vec<User>>> {
    let users = state.use_cases.list_users().execute(&actor, actor.tenant_id).await?;
    Ok(Json(users))
}

pub async fn get_user(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    ApiPath(user_id): ApiPath<Uuid>,
) -> ApiResult<Json<User>> {
    let user = state
        .use_cases
        .get_user()
        .execute(&actor, actor.tenant_id, user_id)
        .await?;

    Ok(Json(user))
}

/// Update a user
///
/// # Errors
///
/// - `400 Bad Request`: Validation failed
/// - `403 Forbidden`: Editing someone else, or a role, without admin
/// - `404 Not Found`: Unknown user
/// - `409 Conflict`: Email already used in this tenant
pub async fn update_user(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    ApiPath(user_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> ApiResult<Json<User>> {
    req.validate()?;

    let user = state
        .use_cases
        .update_user()
        .execute(
            &actor,
            UpdateUserInput {
                tenant_id: actor.tenant_id,
                user_id,
                name: req.name,
                email: req.email,
                password: req.password,
                avatar_url: req.avatar_url,
                role: req.role,
            },
        )
        .await?;

    Ok(Json(user))
}

/// Delete a user; knowledge and comments they wrote lose their author
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    ApiPath(user_id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .use_cases
        .delete_user()
        .execute(&actor, actor.tenant_id, user_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_request_only_validates_present_fields() {
        let req: UpdateUserRequest = serde_json::from_str(r#"{"name": "Grace"}"#).unwrap();
        assert!(req.validate().is_ok());
        assert!(req.avatar_url.is_none());

        let req: UpdateUserRequest =
            serde_json::from_str(r#"{"role": "owner", "avatar_url": null}"#).unwrap();
        assert!(req.validate().is_err());
        assert_eq!(req.avatar_url, Some(None));
    }
}
