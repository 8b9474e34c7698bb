use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use super::PgStore;
use crate::db::atomic::{execute_atomically, Statement};
use crate::models::{User, UserRole};
use crate::repository::{RepositoryError, UserRepository};

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    tenant_id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    avatar_url: Option<String>,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = UserRole::from_str(&row.role)
            .ok_or_else(|| RepositoryError::Corrupt(format!("user role '{}'", row.role)))?;

        Ok(User {
            id: row.id,
            tenant_id: row.tenant_id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            avatar_url: row.avatar_url,
            role,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SELECT_USER: &str = "SELECT id, tenant_id, name, email, password_hash, avatar_url, role, \
                           created_at, updated_at FROM users";

/// Clears the user's authorship, then removes the user row
fn user_cascade(id: Uuid, tenant_id: Uuid) -> Vec<Statement> {
    vec![
        Statement::new("UPDATE knowledge SET author_id = NULL WHERE author_id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id),
        Statement::new("UPDATE comments SET author_id = NULL WHERE author_id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id),
        Statement::new("DELETE FROM users WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .must_affect_rows(),
    ]
}

#[async_trait]
impl UserRepository for PgStore {
    async fn create(&self, user: &User) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, tenant_id, name, email, password_hash, avatar_url, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(user.id)
        .bind(user.tenant_id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.avatar_url)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid, tenant_id: Uuid) -> Result<Option<User>, RepositoryError> {
        sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE id = $1 AND tenant_id = $2"))
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await?
            .map(User::try_from)
            .transpose()
    }

    async fn find_by_email(
        &self,
        email: &str,
        tenant_id: Uuid,
    ) -> Result<Option<User>, RepositoryError> {
        sqlx::query_as::<_, UserRow>(&format!(
            "{SELECT_USER} WHERE email = $1 AND tenant_id = $2"
        ))
        .bind(email)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await?
        .map(User::try_from)
        .transpose()
    }

    async fn find_all(&self, tenant_id: Uuid) -> Result<Vec<User>, RepositoryError> {
        sqlx::query_as::<_, UserRow>(&format!(
            "{SELECT_USER} WHERE tenant_id = $1 ORDER BY created_at ASC, id ASC"
        ))
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(User::try_from)
        .collect()
    }

    async fn update(&self, user: &User) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = $3, email = $4, password_hash = $5, avatar_url = $6, role = $7, updated_at = $8
            WHERE id = $1 AND tenant_id = $2
            "#,
        )
        .bind(user.id)
        .bind(user.tenant_id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.avatar_url)
        .bind(user.role.as_str())
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn delete(&self, id: Uuid, tenant_id: Uuid) -> Result<(), RepositoryError> {
        let affected = execute_atomically(&self.pool, user_cascade(id, tenant_id)).await?;
        debug!(
            user_id = %id,
            tenant_id = %tenant_id,
            rows = ?affected,
            "User removed, authorship cleared"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_cascade_scopes_every_statement_to_tenant() {
        let statements = user_cascade(Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(statements.len(), 3);
        assert!(statements.iter().all(|s| s.sql().contains("tenant_id = $2")));
        assert!(statements[2].requires_rows());
    }
}
