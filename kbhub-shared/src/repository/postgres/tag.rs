use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use super::PgStore;
use crate::db::atomic::{execute_atomically, Statement};
use crate::models::Tag;
use crate::repository::{RepositoryError, TagRepository};

#[derive(sqlx::FromRow)]
pub(super) struct TagRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TagRow> for Tag {
    fn from(row: TagRow) -> Self {
        Tag {
            id: row.id,
            tenant_id: row.tenant_id,
            name: row.name,
            color: row.color,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_TAG: &str = "SELECT id, tenant_id, name, color, created_at, updated_at FROM tags";

/// Detaches the tag from every article, then removes the tag row
fn tag_cascade(id: Uuid, tenant_id: Uuid) -> Vec<Statement> {
    vec![
        Statement::new(
            "DELETE FROM knowledge_tags kt USING tags t \
             WHERE kt.tag_id = t.id AND t.id = $1 AND t.tenant_id = $2",
        )
        .bind(id)
        .bind(tenant_id),
        Statement::new("DELETE FROM tags WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .must_affect_rows(),
    ]
}

#[async_trait]
impl TagRepository for PgStore {
    async fn create(&self, tag: &Tag) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO tags (id, tenant_id, name, color, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(tag.id)
        .bind(tag.tenant_id)
        .bind(&tag.name)
        .bind(&tag.color)
        .bind(tag.created_at)
        .bind(tag.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid, tenant_id: Uuid) -> Result<Option<Tag>, RepositoryError> {
        let row = sqlx::query_as::<_, TagRow>(&format!(
            "{SELECT_TAG} WHERE id = $1 AND tenant_id = $2"
        ))
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Tag::from))
    }

    async fn find_all(&self, tenant_id: Uuid) -> Result<Vec<Tag>, RepositoryError> {
        let rows = sqlx::query_as::<_, TagRow>(&format!(
            "{SELECT_TAG} WHERE tenant_id = $1 ORDER BY name COLLATE \"C\" ASC, id ASC"
        ))
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Tag::from).collect())
    }

    async fn update(&self, tag: &Tag) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE tags
            SET name = $3, color = $4, updated_at = $5
            WHERE id = $1 AND tenant_id = $2
            "#,
        )
        .bind(tag.id)
        .bind(tag.tenant_id)
        .bind(&tag.name)
        .bind(&tag.color)
        .bind(tag.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn delete(&self, id: Uuid, tenant_id: Uuid) -> Result<(), RepositoryError> {
        let affected = execute_atomically(&self.pool, tag_cascade(id, tenant_id)).await?;
        debug!(tag_id = %id, tenant_id = %tenant_id, rows = ?affected, "Tag removed with its associations");
        Ok(())
    }
}
