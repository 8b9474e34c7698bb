use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use super::MemoryStore;
use crate::models::Tag;
use crate::repository::{RepositoryError, TagRepository};

#[async_trait]
impl TagRepository for MemoryStore {
    async fn create(&self, tag: &Tag) -> Result<(), RepositoryError> {
        self.transaction(|tables| {
            tables.require_tenant(tag.tenant_id)?;
            if tables.tags.contains_key(&tag.id) {
                return Err(RepositoryError::UniqueViolation("tags_pkey".to_string()));
            }
            tables.tags.insert(tag.id, tag.clone());
            Ok(())
        })
    }

    async fn find_by_id(&self, id: Uuid, tenant_id: Uuid) -> Result<Option<Tag>, RepositoryError> {
        Ok(self.read(|tables| {
            tables
                .tags
                .get(&id)
                .filter(|t| t.tenant_id == tenant_id)
                .cloned()
        }))
    }

    async fn find_all(&self, tenant_id: Uuid) -> Result<Vec<Tag>, RepositoryError> {
        let mut tags: Vec<Tag> = self.read(|tables| {
            tables
                .tags
                .values()
                .filter(|t| t.tenant_id == tenant_id)
                .cloned()
                .collect()
        });
        tags.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(tags)
    }

    async fn update(&self, tag: &Tag) -> Result<(), RepositoryError> {
        self.transaction(|tables| {
            let stored = tables
                .tags
                .get_mut(&tag.id)
                .filter(|t| t.tenant_id == tag.tenant_id)
                .ok_or(RepositoryError::NotFound)?;
            *stored = tag.clone();
            Ok(())
        })
    }

    async fn delete(&self, id: Uuid, tenant_id: Uuid) -> Result<(), RepositoryError> {
        self.transaction(|tables| {
            let owned = tables
                .tags
                .get(&id)
                .is_some_and(|t| t.tenant_id == tenant_id);
            if !owned {
                return Err(RepositoryError::NotFound);
            }

            tables.knowledge_tags.retain(|(_, tag_id)| *tag_id != id);
            tables.tags.remove(&id);
            Ok(())
        })?;

        debug!(tag_id = %id, tenant_id = %tenant_id, "Tag removed with its associations");
        Ok(())
    }
}
