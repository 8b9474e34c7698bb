use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::PgStore;
use crate::models::Comment;
use crate::repository::{CommentRepository, RepositoryError};

#[derive(sqlx::FromRow)]
pub(super) struct CommentRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub knowledge_id: Uuid,
    pub author_id: Option<Uuid>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Comment {
            id: row.id,
            tenant_id: row.tenant_id,
            knowledge_id: row.knowledge_id,
            author_id: row.author_id,
            content: row.content,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub(super) const SELECT_COMMENT: &str =
    "SELECT id, tenant_id, knowledge_id, author_id, content, created_at, updated_at FROM comments";

#[async_trait]
impl CommentRepository for PgStore {
    async fn create(&self, comment: &Comment) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO comments (id, tenant_id, knowledge_id, author_id, content, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(comment.id)
        .bind(comment.tenant_id)
        .bind(comment.knowledge_id)
        .bind(comment.author_id)
        .bind(&comment.content)
        .bind(comment.created_at)
        .bind(comment.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(
        &self,
        id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Option<Comment>, RepositoryError> {
        let row = sqlx::query_as::<_, CommentRow>(&format!(
            "{SELECT_COMMENT} WHERE id = $1 AND tenant_id = $2"
        ))
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Comment::from))
    }

    async fn find_by_knowledge_id(
        &self,
        knowledge_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Vec<Comment>, RepositoryError> {
        let rows = sqlx::query_as::<_, CommentRow>(&format!(
            "{SELECT_COMMENT} WHERE knowledge_id = $1 AND tenant_id = $2 \
             ORDER BY created_at DESC, id ASC"
        ))
        .bind(knowledge_id)
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Comment::from).collect())
    }

    async fn find_all(&self, tenant_id: Uuid) -> Result<Vec<Comment>, RepositoryError> {
        let rows = sqlx::query_as::<_, CommentRow>(&format!(
            "{SELECT_COMMENT} WHERE tenant_id = $1 ORDER BY created_at DESC, id ASC"
        ))
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Comment::from).collect())
    }

    async fn update(&self, comment: &Comment) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE comments SET content = $3, updated_at = $4 WHERE id = $1 AND tenant_id = $2",
        )
        .bind(comment.id)
        .bind(comment.tenant_id)
        .bind(&comment.content)
        .bind(comment.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn delete(&self, id: Uuid, tenant_id: Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
