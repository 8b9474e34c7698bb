/// Tag use cases

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::{load_tenant, now, or_not_found, require_id, require_present_text, require_text, IdGenerator};
use crate::auth::authorization::require_membership;
use crate::auth::context::ActorContext;
use crate::error::AppError;
use crate::models::Tag;
use crate::repository::Repositories;

/// Blank colors are stored as no color
fn normalize_color(color: Option<String>) -> Option<String> {
    color.filter(|c| !c.trim().is_empty())
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateTagInput {
    pub tenant_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

pub struct CreateTag {
    repos: Repositories,
    ids: Arc<dyn IdGenerator>,
}

impl CreateTag {
    pub fn new(repos: Repositories, ids: Arc<dyn IdGenerator>) -> Self {
        Self { repos, ids }
    }

    pub async fn execute(&self, actor: &ActorContext, input: CreateTagInput) -> Result<Tag, AppError> {
        require_id("tenant_id", input.tenant_id)?;
        require_text("name", &input.name)?;
        load_tenant(&self.repos, input.tenant_id).await?;
        require_membership(actor, input.tenant_id)?;

        let timestamp = now();
        let tag = Tag {
            id: self.ids.generate(),
            tenant_id: input.tenant_id,
            name: input.name,
            color: normalize_color(input.color),
            created_at: timestamp,
            updated_at: timestamp,
        };

        self.repos.tags.create(&tag).await?;

        info!(tenant_id = %tag.tenant_id, tag_id = %tag.id, name = %tag.name, "Created tag");

        Ok(tag)
    }
}

pub struct ListTags {
    repos: Repositories,
}

impl ListTags {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    /// Tags of the tenant ordered by name
    pub async fn execute(&self, actor: &ActorContext, tenant_id: Uuid) -> Result<Vec<Tag>, AppError> {
        require_id("tenant_id", tenant_id)?;
        load_tenant(&self.repos, tenant_id).await?;
        require_membership(actor, tenant_id)?;

        Ok(self.repos.tags.find_all(tenant_id).await?)
    }
}

/// Partial tag update; `color: Some(None)` clears the color
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTagInput {
    pub tenant_id: Uuid,
    pub tag_id: Uuid,
    pub name: Option<String>,
    pub color: Option<Option<String>>,
}

pub struct UpdateTag {
    repos: Repositories,
}

impl UpdateTag {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub async fn execute(&self, actor: &ActorContext, input: UpdateTagInput) -> Result<Tag, AppError> {
        require_id("tenant_id", input.tenant_id)?;
        require_id("tag_id", input.tag_id)?;
        require_present_text("name", input.name.as_ref())?;
        load_tenant(&self.repos, input.tenant_id).await?;
        require_membership(actor, input.tenant_id)?;

        let mut tag = self
            .repos
            .tags
            .find_by_id(input.tag_id, input.tenant_id)
            .await?
            .ok_or(AppError::TagNotFound)?;

        if let Some(name) = input.name {
            tag.name = name;
        }
        if let Some(color) = input.color {
            tag.color = normalize_color(color);
        }
        tag.updated_at = now();

        self.repos
            .tags
            .update(&tag)
            .await
            .map_err(or_not_found(AppError::TagNotFound))?;

        info!(tenant_id = %tag.tenant_id, tag_id = %tag.id, "Updated tag");

        Ok(tag)
    }
}

/// Detaches the tag from every article, then deletes it
pub struct DeleteTag {
    repos: Repositories,
}

impl DeleteTag {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub async fn execute(
        &self,
        actor: &ActorContext,
        tenant_id: Uuid,
        tag_id: Uuid,
    ) -> Result<(), AppError> {
        require_id("tenant_id", tenant_id)?;
        require_id("tag_id", tag_id)?;
        load_tenant(&self.repos, tenant_id).await?;
        require_membership(actor, tenant_id)?;

        if self.repos.tags.find_by_id(tag_id, tenant_id).await?.is_none() {
            return Err(AppError::TagNotFound);
        }

        self.repos
            .tags
            .delete(tag_id, tenant_id)
            .await
            .map_err(or_not_found(AppError::TagNotFound))?;

        info!(tenant_id = %tenant_id, tag_id = %tag_id, "Deleted tag");

        Ok(())
    }
}
