use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder};
use tracing::debug;
use uuid::Uuid;

use super::comment::{CommentRow, SELECT_COMMENT};
use super::tag::TagRow;
use super::PgStore;
use crate::db::atomic::{execute_atomically, Statement};
use crate::models::{Comment, Knowledge, KnowledgeStatus, Tag};
use crate::repository::{KnowledgeRepository, RepositoryError};
use crate::search::{KnowledgeFilter, ORDER_BY};

#[derive(sqlx::FromRow)]
struct KnowledgeRow {
    id: Uuid,
    tenant_id: Uuid,
    author_id: Option<Uuid>,
    title: String,
    content: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct AttachedTagRow {
    knowledge_id: Uuid,
    id: Uuid,
    tenant_id: Uuid,
    name: String,
    color: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

const SELECT_KNOWLEDGE: &str = "SELECT k.id, k.tenant_id, k.author_id, k.title, k.content, \
                                k.status, k.created_at, k.updated_at FROM knowledge k";

fn attach_tags_statement(knowledge_id: Uuid, tenant_id: Uuid, tag_ids: &[Uuid]) -> Statement {
    // Only tags owned by the same tenant are attached.
    Statement::new(
        "INSERT INTO knowledge_tags (knowledge_id, tag_id) \
         SELECT $1, t.id FROM tags t WHERE t.id = ANY($2) AND t.tenant_id = $3 \
         ON CONFLICT DO NOTHING",
    )
    .bind(knowledge_id)
    .bind(tag_ids.to_vec())
    .bind(tenant_id)
}

fn insert_statements(knowledge: &Knowledge, tag_ids: &[Uuid]) -> Vec<Statement> {
    let mut statements = vec![Statement::new(
        "INSERT INTO knowledge (id, tenant_id, author_id, title, content, status, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(knowledge.id)
    .bind(knowledge.tenant_id)
    .bind(knowledge.author_id)
    .bind(knowledge.title.as_str())
    .bind(knowledge.content.as_str())
    .bind(knowledge.status.as_str())
    .bind(knowledge.created_at)
    .bind(knowledge.updated_at)];

    if !tag_ids.is_empty() {
        statements.push(attach_tags_statement(
            knowledge.id,
            knowledge.tenant_id,
            tag_ids,
        ));
    }

    statements
}

/// Saves the row first so a missing article aborts before associations change
fn update_statements(knowledge: &Knowledge, tag_ids: Option<&[Uuid]>) -> Vec<Statement> {
    let mut statements = vec![Statement::new(
        "UPDATE knowledge SET author_id = $3, title = $4, content = $5, status = $6, updated_at = $7 \
         WHERE id = $1 AND tenant_id = $2",
    )
    .bind(knowledge.id)
    .bind(knowledge.tenant_id)
    .bind(knowledge.author_id)
    .bind(knowledge.title.as_str())
    .bind(knowledge.content.as_str())
    .bind(knowledge.status.as_str())
    .bind(knowledge.updated_at)
    .must_affect_rows()];

    if let Some(tag_ids) = tag_ids {
        statements.push(
            Statement::new(
                "DELETE FROM knowledge_tags kt USING knowledge k \
                 WHERE kt.knowledge_id = k.id AND k.id = $1 AND k.tenant_id = $2",
            )
            .bind(knowledge.id)
            .bind(knowledge.tenant_id),
        );
        if !tag_ids.is_empty() {
            statements.push(attach_tags_statement(
                knowledge.id,
                knowledge.tenant_id,
                tag_ids,
            ));
        }
    }

    statements
}

/// Removes comments and tag associations, then the article row
fn delete_statements(id: Uuid, tenant_id: Uuid) -> Vec<Statement> {
    vec![
        Statement::new("DELETE FROM comments WHERE knowledge_id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id),
        Statement::new(
            "DELETE FROM knowledge_tags kt USING knowledge k \
             WHERE kt.knowledge_id = k.id AND k.id = $1 AND k.tenant_id = $2",
        )
        .bind(id)
        .bind(tenant_id),
        Statement::new("DELETE FROM knowledge WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .must_affect_rows(),
    ]
}

impl PgStore {
    /// Loads tags and comments for `rows` with one query each and builds the models
    async fn assemble(
        &self,
        rows: Vec<KnowledgeRow>,
        tenant_id: Uuid,
    ) -> Result<Vec<Knowledge>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();

        let tag_rows = sqlx::query_as::<_, AttachedTagRow>(
            r#"
            SELECT kt.knowledge_id, t.id, t.tenant_id, t.name, t.color, t.created_at, t.updated_at
            FROM knowledge_tags kt
            JOIN tags t ON t.id = kt.tag_id
            WHERE kt.knowledge_id = ANY($1) AND t.tenant_id = $2
            ORDER BY t.name COLLATE "C" ASC, t.id ASC
            "#,
        )
        .bind(&ids)
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        let comment_rows = sqlx::query_as::<_, CommentRow>(&format!(
            "{SELECT_COMMENT} WHERE knowledge_id = ANY($1) AND tenant_id = $2 \
             ORDER BY created_at DESC, id ASC"
        ))
        .bind(&ids)
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        let mut tags: HashMap<Uuid, Vec<Tag>> = HashMap::new();
        for row in tag_rows {
            tags.entry(row.knowledge_id).or_default().push(Tag::from(TagRow {
                id: row.id,
                tenant_id: row.tenant_id,
                name: row.name,
                color: row.color,
                created_at: row.created_at,
                updated_at: row.updated_at,
            }));
        }

        let mut comments: HashMap<Uuid, Vec<Comment>> = HashMap::new();
        for row in comment_rows {
            comments
                .entry(row.knowledge_id)
                .or_default()
                .push(Comment::from(row));
        }

        rows.into_iter()
            .map(|row| {
                let status = KnowledgeStatus::from_str(&row.status).ok_or_else(|| {
                    RepositoryError::Corrupt(format!("knowledge status '{}'", row.status))
                })?;

                Ok(Knowledge {
                    id: row.id,
                    tenant_id: row.tenant_id,
                    author_id: row.author_id,
                    title: row.title,
                    content: row.content,
                    status,
                    tags: tags.remove(&row.id).unwrap_or_default(),
                    comments: comments.remove(&row.id).unwrap_or_default(),
                    created_at: row.created_at,
                    updated_at: row.updated_at,
                })
            })
            .collect()
    }
}

#[async_trait]
impl KnowledgeRepository for PgStore {
    async fn create(&self, knowledge: &Knowledge, tag_ids: &[Uuid]) -> Result<(), RepositoryError> {
        execute_atomically(&self.pool, insert_statements(knowledge, tag_ids)).await?;
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Option<Knowledge>, RepositoryError> {
        let found = self.search(&KnowledgeFilter::by_id(tenant_id, id)).await?;
        Ok(found.into_iter().next())
    }

    async fn find_all(&self, tenant_id: Uuid) -> Result<Vec<Knowledge>, RepositoryError> {
        self.search(&KnowledgeFilter::for_tenant(tenant_id)).await
    }

    async fn search(&self, filter: &KnowledgeFilter) -> Result<Vec<Knowledge>, RepositoryError> {
        let mut builder = QueryBuilder::<Postgres>::new(SELECT_KNOWLEDGE);
        filter.push_predicates(&mut builder);
        builder.push(ORDER_BY);

        let rows = builder
            .build_query_as::<KnowledgeRow>()
            .fetch_all(&self.pool)
            .await?;

        debug!(tenant_id = %filter.tenant_id, matches = rows.len(), "Knowledge search executed");
        self.assemble(rows, filter.tenant_id).await
    }

    async fn update(
        &self,
        knowledge: &Knowledge,
        tag_ids: Option<&[Uuid]>,
    ) -> Result<(), RepositoryError> {
        execute_atomically(&self.pool, update_statements(knowledge, tag_ids)).await?;
        Ok(())
    }

    async fn delete(&self, id: Uuid, tenant_id: Uuid) -> Result<(), RepositoryError> {
        let affected = execute_atomically(&self.pool, delete_statements(id, tenant_id)).await?;
        debug!(knowledge_id = %id, tenant_id = %tenant_id, rows = ?affected, "Knowledge cascade committed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article() -> Knowledge {
        let now = Utc::now();
        Knowledge {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            author_id: None,
            title: "Title".to_string(),
            content: "Body".to_string(),
            status: KnowledgeStatus::Draft,
            tags: Vec::new(),
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_update_without_tags_leaves_associations_alone() {
        let statements = update_statements(&article(), None);
        assert_eq!(statements.len(), 1);
        assert!(statements[0].requires_rows());
    }

    #[test]
    fn test_update_with_empty_tags_only_detaches() {
        let statements = update_statements(&article(), Some(&[]));
        assert_eq!(statements.len(), 2);
        assert!(statements[1].sql().starts_with("DELETE FROM knowledge_tags"));
        assert!(statements[1].sql().contains("k.tenant_id = $2"));
    }

    #[test]
    fn test_update_with_tags_saves_row_before_replacing() {
        let tags = [Uuid::new_v4(), Uuid::new_v4()];
        let statements = update_statements(&article(), Some(&tags));

        assert_eq!(statements.len(), 3);
        assert!(statements[0].sql().starts_with("UPDATE knowledge"));
        assert!(statements[1].sql().starts_with("DELETE FROM knowledge_tags"));
        assert!(statements[2].sql().contains("t.tenant_id = $3"));
    }

    #[test]
    fn test_delete_cascade_order() {
        let statements = delete_statements(Uuid::new_v4(), Uuid::new_v4());
        assert!(statements[0].sql().starts_with("DELETE FROM comments"));
        assert!(statements[1].sql().starts_with("DELETE FROM knowledge_tags"));
        assert!(statements[2].sql().starts_with("DELETE FROM knowledge WHERE"));
        assert!(statements[2].requires_rows());
    }

    #[test]
    fn test_create_without_tags_is_single_insert() {
        assert_eq!(insert_statements(&article(), &[]).len(), 1);
        assert_eq!(insert_statements(&article(), &[Uuid::new_v4()]).len(), 2);
    }
}
