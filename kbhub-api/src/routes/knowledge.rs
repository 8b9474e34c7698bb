/// Knowledge endpoints
///
/// # Endpoints
///
/// - `POST /api/knowledge` - Create an article
/// - `GET /api/knowledge` - Search articles
/// - `GET /api/knowledge/:id` - Get an article with its tags and comments
/// - `PUT /api/knowledge/:id` - Partial update
/// - `DELETE /api/knowledge/:id` - Delete an article and its comments
///
/// # Search
///
/// ```text
/// GET /api/knowledge?query=vpn&tag_ids=<uuid>,<uuid>&author_id=<uuid>&status=published
/// ```
///
/// Every parameter is optional. `tag_ids` matches articles carrying any of
/// the listed tags; the remaining criteria must all hold.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiJson, ApiPath, ApiQuery},
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use kbhub_shared::{
    auth::context::ActorContext,
    models::{Knowledge, KnowledgeStatus},
    usecase::knowledge::{CreateKnowledgeInput, SearchKnowledgeInput, UpdateKnowledgeInput},
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateKnowledgeRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1 to 255 characters"))]
    pub title: String,

    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,

    /// Defaults to draft
    #[serde(default)]
    pub status: Option<KnowledgeStatus>,

    #[serde(default)]
    pub tag_ids: Vec<Uuid>,
}

/// Partial update; absent fields are left unchanged
///
/// A present `tag_ids` replaces the article's tags, `[]` removes them all.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateKnowledgeRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1 to 255 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 1, message = "Content is required"))]
    pub content: Option<String>,

    pub status: Option<KnowledgeStatus>,

    pub tag_ids: Option<Vec<Uuid>>,
}

/// Raw search parameters, parsed by [`SearchParams::into_input`]
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,

    /// Comma-separated tag IDs
    pub tag_ids: Option<String>,

    pub author_id: Option<String>,

    pub status: Option<String>,
}

impl SearchParams {
    fn into_input(self, tenant_id: Uuid) -> ApiResult<SearchKnowledgeInput> {
        let tag_ids = match self.tag_ids.as_deref() {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(|id| parse_uuid("tag_ids", id))
                .collect::<ApiResult<Vec<_>>>()?,
            None => Vec::new(),
        };

        let author_id = match non_blank(self.author_id) {
            Some(raw) => Some(parse_uuid("author_id", &raw)?),
            None => None,
        };

        let status = match non_blank(self.status) {
            Some(raw) => Some(KnowledgeStatus::from_str(&raw).ok_or_else(|| {
                ApiError::BadRequest(format!(
                    "status must be one of draft, published, archived; got {raw:?}"
                ))
            })?),
            None => None,
        };

        Ok(SearchKnowledgeInput {
            tenant_id,
            query: non_blank(self.query),
            tag_ids,
            author_id,
            status,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_uuid(param: &str, raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("{param}: invalid UUID {raw:?}")))
}

/// Create an article authored by the caller
///
/// Unknown tag IDs are ignored.
pub async fn create_knowledge(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    ApiJson(req): ApiJson<CreateKnowledgeRequest>,
) -> ApiResult<(StatusCode, Json<Knowledge>)> {
    req.validate()?;

    let knowledge = state
        .use_cases
        .create_knowledge()
        .execute(
            &actor,
            CreateKnowledgeInput {
                tenant_id: actor.tenant_id,
                title: req.title,
                content: req.content,
                author_id: None,
                status: req.status,
                tag_ids: req.tag_ids,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(knowledge)))
}

/// Search the caller's tenant, newest first
///
/// # Errors
///
/// - `400 Bad Request`: Malformed UUID or unknown status
pub async fn search_knowledge(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> ApiResult<Json<Vec<Knowledge>>> {
    let input = params.into_input(actor.tenant_id)?;
    let results = state.use_cases.search_knowledge().execute(&actor, input).await?;
    Ok(Json(results))
}

pub async fn get_knowledge(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    ApiPath(knowledge_id): ApiPath<Uuid>,
) -> ApiResult<Json<Knowledge>> {
    let knowledge = state
        .use_cases
        .get_knowledge()
        .execute(&actor, actor.tenant_id, knowledge_id)
        .await?;

    Ok(Json(knowledge))
}

pub async fn update_knowledge(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    ApiPath(knowledge_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateKnowledgeRequest>,
) -> ApiResult<Json<Knowledge>> {
    req.validate()?;

    let knowledge = state
        .use_cases
        .update_knowledge()
        .execute(
            &actor,
            UpdateKnowledgeInput {
                tenant_id: actor.tenant_id,
                knowledge_id,
                title: req.title,
                content: req.content,
                status: req.status,
                tag_ids: req.tag_ids,
            },
        )
        .await?;

    Ok(Json(knowledge))
}

pub async fn delete_knowledge(
    State(state): State<AppState>,
    Extension(actor): Extension<ActorContext>,
    ApiPath(knowledge_id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .use_cases
        .delete_knowledge()
        .execute(&actor, actor.tenant_id, knowledge_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
