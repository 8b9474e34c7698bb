/// Comment endpoints, nested under a knowledge article
///
/// # Endpoints
///
/// - `POST /api/knowledge/:id/comments` - Comment as the caller
/// - `GET /api/knowledge/:id/comments` - Comments, newest first
/// - `PUT /api/knowledge/:id/comments/:comment_id` - Edit (author or admin)
/// - `DELETE /api/knowledge/:id/comments/:comment_id` - Delete (author or admin)

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{ApiJson, ApiPath},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use kbhub_shared::{
    auth::context::ActorContext,
    models::Comment,
    usecase::comment::{CreateCommentInput, UpdateCommentInput},
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CommentRequest {
    #[validate(length(min = 1, max = 10000, message = "Content must be 1 to 10000 characters"))]
    pub content: String,
}

/// # Errors
///
/// - `404 Not Found`: Unknown article
pub async fn create_comment(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    ApiPath(knowledge_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<CommentRequest>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    req.validate()?;

    let comment = state
        .use_cases
        .create_comment()
        .execute(
            &actor,
            CreateCommentInput {
                tenant_id: actor.tenant_id,
                knowledge_id,
                content: req.content,
                author_id: None,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn list_comments(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    ApiPath(knowledge_id): ApiPath<Uuid>,
) -> ApiResult<Json<Vec<Comment>>> {
    let comments = state
        .use_cases
        .list_comments()
        .execute(&actor, actor.tenant_id, knowledge_id)
        .await?;

    Ok(Json(comments))
}

/// # Errors
///
/// - `403 Forbidden`: Caller is neither the author nor an admin
/// - `404 Not Found`: Unknown article, or the comment belongs to another one
pub async fn update_comment(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    ApiPath((knowledge_id, comment_id)): ApiPath<(Uuid, Uuid)>,
    ApiJson(req): ApiJson<CommentRequest>,
) -> ApiResult<Json<Comment>> {
    req.validate()?;

    let comment = state
        .use_cases
        .update_comment()
        .execute(
            &actor,
            UpdateCommentInput {
                tenant_id: actor.tenant_id,
                knowledge_id,
                comment_id,
                content: req.content,
            },
        )
        .await?;

    Ok(Json(comment))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    ApiPath((knowledge_id, comment_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    state
        .use_cases
        .delete_comment()
        .execute(&actor, actor.tenant_id, knowledge_id, comment_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
