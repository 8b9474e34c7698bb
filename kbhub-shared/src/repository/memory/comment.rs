use async_trait::async_trait;
use uuid::Uuid;

use super::MemoryStore;
use crate::models::Comment;
use crate::repository::{CommentRepository, RepositoryError};

fn newest_first(comments: &mut [Comment]) {
    comments.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn create(&self, comment: &Comment) -> Result<(), RepositoryError> {
        self.transaction(|tables| {
            tables.require_tenant(comment.tenant_id)?;
            tables.require_user(comment.author_id)?;
            if !tables.knowledge.contains_key(&comment.knowledge_id) {
                return Err(RepositoryError::ForeignKeyViolation(
                    "comments_knowledge_id_fkey".to_string(),
                ));
            }

            if tables.comments.contains_key(&comment.id) {
                return Err(RepositoryError::UniqueViolation("comments_pkey".to_string()));
            }

            tables.comments.insert(comment.id, comment.clone());
            Ok(())
        })
    }

    async fn find_by_id(
        &self,
        id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Option<Comment>, RepositoryError> {
        Ok(self.read(|tables| {
            tables
                .comments
                .get(&id)
                .filter(|c| c.tenant_id == tenant_id)
                .cloned()
        }))
    }

    async fn find_by_knowledge_id(
        &self,
        knowledge_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Vec<Comment>, RepositoryError> {
        let mut comments: Vec<Comment> = self.read(|tables| {
            tables
                .comments
                .values()
                .filter(|c| c.knowledge_id == knowledge_id && c.tenant_id == tenant_id)
                .cloned()
                .collect()
        });
        newest_first(&mut comments);
        Ok(comments)
    }

    async fn find_all(&self, tenant_id: Uuid) -> Result<Vec<Comment>, RepositoryError> {
        let mut comments: Vec<Comment> = self.read(|tables| {
            tables
                .comments
                .values()
                .filter(|c| c.tenant_id == tenant_id)
                .cloned()
                .collect()
        });
        newest_first(&mut comments);
        Ok(comments)
    }

    async fn update(&self, comment: &Comment) -> Result<(), RepositoryError> {
        self.transaction(|tables| {
            let stored = tables
                .comments
                .get_mut(&comment.id)
                .filter(|c| c.tenant_id == comment.tenant_id)
                .ok_or(RepositoryError::NotFound)?;
            *stored = comment.clone();
            Ok(())
        })
    }

    async fn delete(&self, id: Uuid, tenant_id: Uuid) -> Result<(), RepositoryError> {
        self.transaction(|tables| {
            let owned = tables
                .comments
                .get(&id)
                .is_some_and(|c| c.tenant_id == tenant_id);
            if !owned {
                return Err(RepositoryError::NotFound);
            }

            tables.comments.remove(&id);
            Ok(())
        })
    }
}
