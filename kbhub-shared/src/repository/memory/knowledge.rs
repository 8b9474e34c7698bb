use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use super::{MemoryStore, Tables};
use crate::models::{Comment, Knowledge, Tag};
use crate::repository::{KnowledgeRepository, RepositoryError};
use crate::search::{compare_newest_first, KnowledgeFilter};

/// Copies an article row and attaches its tags (by name) and comments (newest first)
fn assemble(tables: &Tables, row: &Knowledge) -> Knowledge {
    let mut tags: Vec<Tag> = tables
        .tag_ids_of(row.id)
        .into_iter()
        .filter_map(|tag_id| tables.tags.get(&tag_id))
        .filter(|t| t.tenant_id == row.tenant_id)
        .cloned()
        .collect();
    tags.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

    let mut comments: Vec<Comment> = tables
        .comments
        .values()
        .filter(|c| c.knowledge_id == row.id && c.tenant_id == row.tenant_id)
        .cloned()
        .collect();
    comments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));

    Knowledge {
        tags,
        comments,
        ..row.clone()
    }
}

/// Strips attached collections before storing the row
fn row_of(knowledge: &Knowledge) -> Knowledge {
    Knowledge {
        tags: Vec::new(),
        comments: Vec::new(),
        ..knowledge.clone()
    }
}

/// Inserts associations for tags owned by `tenant_id`; others are ignored
fn attach_tags(tables: &mut Tables, knowledge_id: Uuid, tenant_id: Uuid, tag_ids: &[Uuid]) {
    for tag_id in tag_ids {
        let owned = tables
            .tags
            .get(tag_id)
            .is_some_and(|t| t.tenant_id == tenant_id);
        if owned {
            tables.knowledge_tags.insert((knowledge_id, *tag_id));
        }
    }
}

#[async_trait]
impl KnowledgeRepository for MemoryStore {
    async fn create(&self, knowledge: &Knowledge, tag_ids: &[Uuid]) -> Result<(), RepositoryError> {
        self.transaction(|tables| {
            tables.require_tenant(knowledge.tenant_id)?;
            tables.require_user(knowledge.author_id)?;

            if tables.knowledge.contains_key(&knowledge.id) {
                return Err(RepositoryError::UniqueViolation("knowledge_pkey".to_string()));
            }

            tables.knowledge.insert(knowledge.id, row_of(knowledge));
            attach_tags(tables, knowledge.id, knowledge.tenant_id, tag_ids);
            Ok(())
        })
    }

    async fn find_by_id(
        &self,
        id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Option<Knowledge>, RepositoryError> {
        Ok(self.read(|tables| {
            tables
                .knowledge
                .get(&id)
                .filter(|k| k.tenant_id == tenant_id)
                .map(|k| assemble(tables, k))
        }))
    }

    async fn find_all(&self, tenant_id: Uuid) -> Result<Vec<Knowledge>, RepositoryError> {
        self.search(&KnowledgeFilter::for_tenant(tenant_id)).await
    }

    async fn search(&self, filter: &KnowledgeFilter) -> Result<Vec<Knowledge>, RepositoryError> {
        let mut results: Vec<Knowledge> = self.read(|tables| {
            tables
                .knowledge
                .values()
                .filter(|k| filter.matches(k, &tables.tag_ids_of(k.id)))
                .map(|k| assemble(tables, k))
                .collect()
        });
        results.sort_by(compare_newest_first);
        Ok(results)
    }

    async fn update(
        &self,
        knowledge: &Knowledge,
        tag_ids: Option<&[Uuid]>,
    ) -> Result<(), RepositoryError> {
        self.transaction(|tables| {
            tables.require_user(knowledge.author_id)?;

            let stored = tables
                .knowledge
                .get_mut(&knowledge.id)
                .filter(|k| k.tenant_id == knowledge.tenant_id)
                .ok_or(RepositoryError::NotFound)?;
            *stored = row_of(knowledge);

            if let Some(tag_ids) = tag_ids {
                tables.knowledge_tags.retain(|(k, _)| *k != knowledge.id);
                attach_tags(tables, knowledge.id, knowledge.tenant_id, tag_ids);
            }
            Ok(())
        })
    }

    async fn delete(&self, id: Uuid, tenant_id: Uuid) -> Result<(), RepositoryError> {
        self.transaction(|tables| {
            let owned = tables
                .knowledge
                .get(&id)
                .is_some_and(|k| k.tenant_id == tenant_id);
            if !owned {
                return Err(RepositoryError::NotFound);
            }

            tables
                .comments
                .retain(|_, c| !(c.knowledge_id == id && c.tenant_id == tenant_id));
            tables.knowledge_tags.retain(|(k, _)| *k != id);
            tables.knowledge.remove(&id);
            Ok(())
        })?;

        debug!(knowledge_id = %id, tenant_id = %tenant_id, "Knowledge cascade committed");
        Ok(())
    }
}
