/// Comment use cases
///
/// Comments are addressed through their article: a comment ID paired with the
/// wrong article ID is reported as `CommentNotFound`. Editing and deleting a
/// comment is reserved for its author and tenant admins.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use super::{load_tenant, now, or_not_found, require_id, require_text, IdGenerator};
use crate::auth::authorization::{require_author_or_admin, require_membership, require_self_or_admin};
use crate::auth::context::ActorContext;
use crate::error::AppError;
use crate::models::Comment;
use crate::repository::Repositories;

async fn require_knowledge(
    repos: &Repositories,
    knowledge_id: Uuid,
    tenant_id: Uuid,
) -> Result<(), AppError> {
    if repos.knowledge.find_by_id(knowledge_id, tenant_id).await?.is_none() {
        debug!(tenant_id = %tenant_id, knowledge_id = %knowledge_id, "Knowledge not found");
        return Err(AppError::KnowledgeNotFound);
    }
    Ok(())
}

/// Loads a comment that belongs to `knowledge_id`
async fn load_comment(
    repos: &Repositories,
    tenant_id: Uuid,
    knowledge_id: Uuid,
    comment_id: Uuid,
) -> Result<Comment, AppError> {
    repos
        .comments
        .find_by_id(comment_id, tenant_id)
        .await?
        .filter(|c| c.knowledge_id == knowledge_id)
        .ok_or(AppError::CommentNotFound)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateCommentInput {
    pub tenant_id: Uuid,
    pub knowledge_id: Uuid,
    pub content: String,
    /// Defaults to the acting user
    #[serde(default)]
    pub author_id: Option<Uuid>,
}

pub struct CreateComment {
    repos: Repositories,
    ids: Arc<dyn IdGenerator>,
}

impl CreateComment {
    pub fn new(repos: Repositories, ids: Arc<dyn IdGenerator>) -> Self {
        Self { repos, ids }
    }

    /// # Errors
    ///
    /// - `InvalidInput` for blank content or a missing ID
    /// - `TenantNotFound`, `Forbidden`
    /// - `KnowledgeNotFound`, `UserNotFound` for references outside the tenant
    pub async fn execute(
        &self,
        actor: &ActorContext,
        input: CreateCommentInput,
    ) -> Result<Comment, AppError> {
        require_id("tenant_id", input.tenant_id)?;
        require_id("knowledge_id", input.knowledge_id)?;
        require_text("content", &input.content)?;

        load_tenant(&self.repos, input.tenant_id).await?;
        require_membership(actor, input.tenant_id)?;

        let author_id = input.author_id.unwrap_or(actor.user_id);
        require_self_or_admin(actor, author_id)?;

        if self.repos.users.find_by_id(author_id, input.tenant_id).await?.is_none() {
            debug!(tenant_id = %input.tenant_id, author_id = %author_id, "Author not found");
            return Err(AppError::UserNotFound);
        }
        require_knowledge(&self.repos, input.knowledge_id, input.tenant_id).await?;

        let timestamp = now();
        let comment = Comment {
            id: self.ids.generate(),
            tenant_id: input.tenant_id,
            knowledge_id: input.knowledge_id,
            author_id: Some(author_id),
            content: input.content,
            created_at: timestamp,
            updated_at: timestamp,
        };

        self.repos.comments.create(&comment).await?;

        info!(
            tenant_id = %comment.tenant_id,
            knowledge_id = %comment.knowledge_id,
            comment_id = %comment.id,
            "Created comment"
        );

        Ok(comment)
    }
}

pub struct ListComments {
    repos: Repositories,
}

impl ListComments {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// Comments on one article, newest first
    pub async fn execute(
        &self,
        actor: &ActorContext,
        tenant_id: Uuid,
        knowledge_id: Uuid,
    ) -> Result<Vec<Comment>, AppError> {
        require_id("tenant_id", tenant_id)?;
        require_id("knowledge_id", knowledge_id)?;
        load_tenant(&self.repos, tenant_id).await?;
        require_membership(actor, tenant_id)?;
        require_knowledge(&self.repos, knowledge_id, tenant_id).await?;

        Ok(self
            .repos
            .comments
            .find_by_knowledge_id(knowledge_id, tenant_id)
            .await?)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCommentInput {
    pub tenant_id: Uuid,
    pub knowledge_id: Uuid,
    pub comment_id: Uuid,
    pub content: String,
}

pub struct UpdateComment {
    repos: Repositories,
}

impl UpdateComment {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub async fn execute(
        &self,
        actor: &ActorContext,
        input: UpdateCommentInput,
    ) -> Result<Comment, AppError> {
        require_id("tenant_id", input.tenant_id)?;
        require_id("knowledge_id", input.knowledge_id)?;
        require_id("comment_id", input.comment_id)?;
        require_text("content", &input.content)?;

        load_tenant(&self.repos, input.tenant_id).await?;
        require_membership(actor, input.tenant_id)?;

        let mut comment =
            load_comment(&self.repos, input.tenant_id, input.knowledge_id, input.comment_id).await?;
        require_author_or_admin(actor, comment.author_id)?;

        comment.content = input.content;
        comment.updated_at = now();

        self.repos
            .comments
            .update(&comment)
            .await
            .map_err(or_not_found(AppError::CommentNotFound))?;

        info!(tenant_id = %comment.tenant_id, comment_id = %comment.id, "Updated comment");

        Ok(comment)
    }
}

pub struct DeleteComment {
    repos: Repositories,
}

impl DeleteComment {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub async fn execute(
        &self,
        actor: &ActorContext,
        tenant_id: Uuid,
        knowledge_id: Uuid,
        comment_id: Uuid,
    ) -> Result<(), AppError> {
        require_id("tenant_id", tenant_id)?;
        require_id("knowledge_id", knowledge_id)?;
        require_id("comment_id", comment_id)?;

        load_tenant(&self.repos, tenant_id).await?;
        require_membership(actor, tenant_id)?;

        let comment = load_comment(&self.repos, tenant_id, knowledge_id, comment_id).await?;
        require_author_or_admin(actor, comment.author_id)?;

        self.repos
            .comments
            .delete(comment_id, tenant_id)
            .await
            .map_err(or_not_found(AppError::CommentNotFound))?;

        info!(tenant_id = %tenant_id, comment_id = %comment_id, actor_id = %actor.user_id, "Deleted comment");

        Ok(())
    }
}
