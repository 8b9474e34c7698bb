use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use super::MemoryStore;
use crate::models::User;
use crate::repository::{RepositoryError, UserRepository, USER_EMAIL_KEY};

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: &User) -> Result<(), RepositoryError> {
        self.transaction(|tables| {
            tables.require_tenant(user.tenant_id)?;
            if tables.users.contains_key(&user.id) {
                return Err(RepositoryError::UniqueViolation("users_pkey".to_string()));
            }

            if tables
                .users
                .values()
                .any(|u| u.tenant_id == user.tenant_id && u.email == user.email)
            {
                return Err(RepositoryError::UniqueViolation(USER_EMAIL_KEY.to_string()));
            }

            tables.users.insert(user.id, user.clone());
            Ok(())
        })
    }

    async fn find_by_id(&self, id: Uuid, tenant_id: Uuid) -> Result<Option<User>, RepositoryError> {
        Ok(self.read(|tables| {
            tables
                .users
                .get(&id)
                .filter(|u| u.tenant_id == tenant_id)
                .cloned()
        }))
    }

    async fn find_by_email(
        &self,
        email: &str,
        tenant_id: Uuid,
    ) -> Result<Option<User>, RepositoryError> {
        Ok(self.read(|tables| {
            tables
                .users
                .values()
                .find(|u| u.tenant_id == tenant_id && u.email == email)
                .cloned()
        }))
    }

    async fn find_all(&self, tenant_id: Uuid) -> Result<Vec<User>, RepositoryError> {
        let mut users: Vec<User> = self.read(|tables| {
            tables
                .users
                .values()
                .filter(|u| u.tenant_id == tenant_id)
                .cloned()
                .collect()
        });
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(users)
    }

    async fn update(&self, user: &User) -> Result<(), RepositoryError> {
        self.transaction(|tables| {
            if tables.users.values().any(|u| {
                u.id != user.id && u.tenant_id == user.tenant_id && u.email == user.email
            }) {
                return Err(RepositoryError::UniqueViolation(USER_EMAIL_KEY.to_string()));
            }

            let stored = tables
                .users
                .get_mut(&user.id)
                .filter(|u| u.tenant_id == user.tenant_id)
                .ok_or(RepositoryError::NotFound)?;
            *stored = user.clone();
            Ok(())
        })
    }

    async fn delete(&self, id: Uuid, tenant_id: Uuid) -> Result<(), RepositoryError> {
        self.transaction(|tables| {
            for knowledge in tables.knowledge.values_mut() {
                if knowledge.tenant_id == tenant_id && knowledge.author_id == Some(id) {
                    knowledge.author_id = None;
                }
            }
            for comment in tables.comments.values_mut() {
                if comment.tenant_id == tenant_id && comment.author_id == Some(id) {
                    comment.author_id = None;
                }
            }

            let owned = tables
                .users
                .get(&id)
                .is_some_and(|u| u.tenant_id == tenant_id);
            if !owned {
                return Err(RepositoryError::NotFound);
            }

            tables.users.remove(&id);
            Ok(())
        })?;

        debug!(user_id = %id, tenant_id = %tenant_id, "User removed, authorship cleared");
        Ok(())
    }
}
