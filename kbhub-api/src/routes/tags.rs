/// Tag endpoints
///
/// # Endpoints
///
/// - `POST /api/tags` - Create a tag
/// - `GET /api/tags` - Tags ordered by name
/// - `PUT /api/tags/:id` - Rename or recolor
/// - `DELETE /api/tags/:id` - Delete; articles keep existing without it

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{ApiJson, ApiPath},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use kbhub_shared::{
    auth::context::ActorContext,
    models::Tag,
    usecase::tag::{CreateTagInput, UpdateTagInput},
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTagRequest {
    #[validate(length(min = 1, max = 50, message = "Name must be 1 to 50 characters"))]
    pub name: String,

    #[serde(default)]
    pub color: Option<String>,
}

/// Partial update; `"color": null` clears the color
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTagRequest {
    #[validate(length(min = 1, max = 50, message = "Name must be 1 to 50 characters"))]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "crate::extract::double_option")]
    pub color: Option<Option<String>>,
}

pub async fn create_tag(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    ApiJson(req): ApiJson<CreateTagRequest>,
) -> ApiResult<(StatusCode, Json<Tag>)> {
    req.validate()?;

    let tag = state
        .use_cases
        .create_tag()
        .execute(
            &actor,
            CreateTagInput {
                tenant_id: actor.tenant_id,
                name: req.name,
                color: req.color,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(tag)))
}

pub async fn list_tags(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
) -> ApiResult<Json<Vec<Tag>>> {
    let tags = state.use_cases.list_tags().execute(&actor, actor.tenant_id).await?;
    Ok(Json(tags))
}

pub async fn update_tag(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    ApiPath(tag_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateTagRequest>,
) -> ApiResult<Json<Tag>> {
    req.validate()?;

    let tag = state
        .use_cases
        .update_tag()
        .execute(
            &actor,
            UpdateTagInput {
                tenant_id: actor.tenant_id,
                tag_id,
                name: req.name,
                color: req.color,
            },
        )
        .await?;

    Ok(Json(tag))
}

/// Removes the tag from every article, then deletes it
pub async fn delete_tag(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    ApiPath(tag_id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .use_cases
        .delete_tag()
        .execute(&actor, actor.tenant_id, tag_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
