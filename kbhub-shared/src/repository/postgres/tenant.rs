use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use tracing::debug;
use uuid::Uuid;

use super::PgStore;
use crate::db::atomic::{execute_atomically, Statement};
use crate::models::{Tenant, TenantSettings};
use crate::repository::{RepositoryError, TenantRepository};

#[derive(sqlx::FromRow)]
struct TenantRow {
    id: Uuid,
    name: String,
    domain: String,
    settings: Json<TenantSettings>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TenantRow> for Tenant {
    fn from(row: TenantRow) -> Self {
        Tenant {
            id: row.id,
            name: row.name,
            domain: row.domain,
            settings: row.settings.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_TENANT: &str =
    "SELECT id, name, domain, settings, created_at, updated_at FROM tenants";

/// Removes everything a tenant owns, dependents first, then the tenant row
fn tenant_cascade(id: Uuid) -> Vec<Statement> {
    vec![
        Statement::new("DELETE FROM comments WHERE tenant_id = $1").bind(id),
        Statement::new(
            "DELETE FROM knowledge_tags kt USING knowledge k \
             WHERE kt.knowledge_id = k.id AND k.tenant_id = $1",
        )
        .bind(id),
        Statement::new(
            "DELETE FROM knowledge_tags kt USING tags t \
             WHERE kt.tag_id = t.id AND t.tenant_id = $1",
        )
        .bind(id),
        Statement::new("DELETE FROM knowledge WHERE tenant_id = $1").bind(id),
        Statement::new("DELETE FROM tags WHERE tenant_id = $1").bind(id),
        Statement::new("DELETE FROM users WHERE tenant_id = $1").bind(id),
        Statement::new("DELETE FROM tenants WHERE id = $1")
            .bind(id)
            .must_affect_rows(),
    ]
}

#[async_trait]
impl TenantRepository for PgStore {
    async fn create(&self, tenant: &Tenant) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO tenants (id, name, domain, settings, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(tenant.id)
        .bind(&tenant.name)
        .bind(&tenant.domain)
        .bind(Json(&tenant.settings))
        .bind(tenant.created_at)
        .bind(tenant.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Tenant>, RepositoryError> {
        let row = sqlx::query_as::<_, TenantRow>(&format!("{SELECT_TENANT} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Tenant::from))
    }

    async fn find_by_domain(&self, domain: &str) -> Result<Option<Tenant>, RepositoryError> {
        let row = sqlx::query_as::<_, TenantRow>(&format!("{SELECT_TENANT} WHERE domain = $1"))
            .bind(domain)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Tenant::from))
    }

    async fn update(&self, tenant: &Tenant) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE tenants
            SET name = $2, domain = $3, settings = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(tenant.id)
        .bind(&tenant.name)
        .bind(&tenant.domain)
        .bind(Json(&tenant.settings))
        .bind(tenant.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let affected = execute_atomically(&self.pool, tenant_cascade(id)).await?;
        debug!(tenant_id = %id, rows = ?affected, "Tenant cascade committed");
        Ok(())
    }
}
