/// Knowledge use cases
///
/// Tag IDs supplied on create or update are resolved leniently: an ID that does
/// not name a tag of the tenant is skipped, never rejected. On update, a
/// supplied list replaces the article's tag set wholesale in the same
/// transaction as the row save.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use super::{
    load_tenant, now, or_not_found, require_id, require_present_text, require_text, resolve_tags,
    IdGenerator,
};
use crate::auth::authorization::{require_membership, require_self_or_admin};
use crate::auth::context::ActorContext;
use crate::error::AppError;
use crate::models::{Knowledge, KnowledgeStatus};
use crate::repository::Repositories;
use crate::search::KnowledgeFilter;

/// Reloads an article after a write so tags and comments are attached
async fn reload(repos: &Repositories, id: Uuid, tenant_id: Uuid) -> Result<Knowledge, AppError> {
    repos
        .knowledge
        .find_by_id(id, tenant_id)
        .await?
        .ok_or(AppError::KnowledgeNotFound)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateKnowledgeInput {
    pub tenant_id: Uuid,
    pub title: String,
    pub content: String,
    /// Defaults to the acting user
    #[serde(default)]
    pub author_id: Option<Uuid>,
    #[serde(default)]
    pub status: Option<KnowledgeStatus>,
    #[serde(default)]
    pub tag_ids: Vec<Uuid>,
}

pub struct CreateKnowledge {
    repos: Repositories,
    ids: Arc<dyn IdGenerator>,
}

impl CreateKnowledge {
    pub fn new(repos: Repositories, ids: Arc<dyn IdGenerator>) -> Self {
        Self { repos, ids }
    }

    /// Creates an article with its initial tags
    ///
    /// Only admins may attribute an article to someone other than themselves.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for a blank title, content, or tenant ID
    /// - `TenantNotFound`, `Forbidden`
    /// - `UserNotFound` when the author is not a user of the tenant
    pub async fn execute(
        &self,
        actor: &ActorContext,
        input: CreateKnowledgeInput,
    ) -> Result<Knowledge, AppError> {
        require_id("tenant_id", input.tenant_id)?;
        require_text("title", &input.title)?;
        require_text("content", &input.content)?;

        load_tenant(&self.repos, input.tenant_id).await?;
        require_membership(actor, input.tenant_id)?;

        let author_id = input.author_id.unwrap_or(actor.user_id);
        require_self_or_admin(actor, author_id)?;

        if self.repos.users.find_by_id(author_id, input.tenant_id).await?.is_none() {
            debug!(tenant_id = %input.tenant_id, author_id = %author_id, "Author not found");
            return Err(AppError::UserNotFound);
        }

        let tag_ids = resolve_tags(&self.repos, input.tenant_id, &input.tag_ids).await?;

        let timestamp = now();
        let knowledge = Knowledge {
            id: self.ids.generate(),
            tenant_id: input.tenant_id,
            author_id: Some(author_id),
            title: input.title,
            content: input.content,
            status: input.status.unwrap_or_default(),
            tags: Vec::new(),
            comments: Vec::new(),
            created_at: timestamp,
            updated_at: timestamp,
        };

        self.repos.knowledge.create(&knowledge, &tag_ids).await?;

        info!(
            tenant_id = %knowledge.tenant_id,
            knowledge_id = %knowledge.id,
            tags = tag_ids.len(),
            "Created knowledge"
        );

        reload(&self.repos, knowledge.id, knowledge.tenant_id).await
    }
}

pub struct GetKnowledge {
    repos: Repositories,
}

impl GetKnowledge {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub async fn execute(
        &self,
        actor: &ActorContext,
        tenant_id: Uuid,
        knowledge_id: Uuid,
    ) -> Result<Knowledge, AppError> {
        require_id("tenant_id", tenant_id)?;
        require_id("knowledge_id", knowledge_id)?;
        load_tenant(&self.repos, tenant_id).await?;
        require_membership(actor, tenant_id)?;

        reload(&self.repos, knowledge_id, tenant_id).await
    }
}

/// Partial article update
///
/// `tag_ids: None` leaves the tag set alone; `Some(vec![])` detaches every tag.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateKnowledgeInput {
    pub tenant_id: Uuid,
    pub knowledge_id: Uuid,
    pub title: Option<String>,
    pub content: Option<String>,
    pub status: Option<KnowledgeStatus>,
    pub tag_ids: Option<Vec<Uuid>>,
}

pub struct UpdateKnowledge {
    repos: Repositories,
}

impl UpdateKnowledge {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub async fn execute(
        &self,
        actor: &ActorContext,
        input: UpdateKnowledgeInput,
    ) -> Result<Knowledge, AppError> {
        require_id("tenant_id", input.tenant_id)?;
        require_id("knowledge_id", input.knowledge_id)?;
        require_present_text("title", input.title.as_ref())?;
        require_present_text("content", input.content.as_ref())?;

        load_tenant(&self.repos, input.tenant_id).await?;
        require_membership(actor, input.tenant_id)?;

        let mut knowledge = reload(&self.repos, input.knowledge_id, input.tenant_id).await?;

        if let Some(title) = input.title {
            knowledge.title = title;
        }
        if let Some(content) = input.content {
            knowledge.content = content;
        }
        if let Some(status) = input.status {
            knowledge.status = status;
        }
        knowledge.updated_at = now();

        let tag_ids = match &input.tag_ids {
            Some(ids) => Some(resolve_tags(&self.repos, input.tenant_id, ids).await?),
            None => None,
        };

        self.repos
            .knowledge
            .update(&knowledge, tag_ids.as_deref())
            .await
            .map_err(or_not_found(AppError::KnowledgeNotFound))?;

        info!(
            tenant_id = %knowledge.tenant_id,
            knowledge_id = %knowledge.id,
            replaced_tags = tag_ids.is_some(),
            "Updated knowledge"
        );

        reload(&self.repos, knowledge.id, knowledge.tenant_id).await
    }
}

/// Deletes an article together with its comments and tag associations
pub struct DeleteKnowledge {
    repos: Repositories,
}

impl DeleteKnowledge {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub async fn execute(
        &self,
        actor: &ActorContext,
        tenant_id: Uuid,
        knowledge_id: Uuid,
    ) -> Result<(), AppError> {
        require_id("tenant_id", tenant_id)?;
        require_id("knowledge_id", knowledge_id)?;
        load_tenant(&self.repos, tenant_id).await?;
        require_membership(actor, tenant_id)?;

        if self.repos.knowledge.find_by_id(knowledge_id, tenant_id).await?.is_none() {
            return Err(AppError::KnowledgeNotFound);
        }

        self.repos
            .knowledge
            .delete(knowledge_id, tenant_id)
            .await
            .map_err(or_not_found(AppError::KnowledgeNotFound))?;

        info!(tenant_id = %tenant_id, knowledge_id = %knowledge_id, "Deleted knowledge");

        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchKnowledgeInput {
    pub tenant_id: Uuid,
    /// Case-insensitive substring of title or content
    #[serde(default)]
    pub query: Option<String>,
    /// Matches articles carrying any of these tags
    #[serde(default)]
    pub tag_ids: Vec<Uuid>,
    #[serde(default)]
    pub author_id: Option<Uuid>,
    #[serde(default)]
    pub status: Option<KnowledgeStatus>,
}

pub struct SearchKnowledge {
    repos: Repositories,
}

impl SearchKnowledge {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// Articles matching every supplied criterion, newest first
    pub async fn execute(
        &self,
        actor: &ActorContext,
        input: SearchKnowledgeInput,
    ) -> Result<Vec<Knowledge>, AppError> {
        require_id("tenant_id", input.tenant_id)?;
        load_tenant(&self.repos, input.tenant_id).await?;
        require_membership(actor, input.tenant_id)?;

        let mut filter = KnowledgeFilter::for_tenant(input.tenant_id).with_tags(input.tag_ids);
        if let Some(query) = input.query {
            filter = filter.with_text(query);
        }
        if let Some(author_id) = input.author_id {
            filter = filter.with_author(author_id);
        }
        if let Some(status) = input.status {
            filter = filter.with_status(status);
        }

        let results = self.repos.knowledge.search(&filter).await?;

        debug!(tenant_id = %input.tenant_id, results = results.len(), "Searched knowledge");

        Ok(results)
    }
}
