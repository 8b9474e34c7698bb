use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use super::MemoryStore;
use crate::models::Tenant;
use crate::repository::{RepositoryError, TenantRepository, TENANT_DOMAIN_KEY};

#[async_trait]
impl TenantRepository for MemoryStore {
    async fn create(&self, tenant: &Tenant) -> Result<(), RepositoryError> {
        self.transaction(|tables| {
            if tables.tenants.contains_key(&tenant.id) {
                return Err(RepositoryError::UniqueViolation("tenants_pkey".to_string()));
            }
            if tables.tenants.values().any(|t| t.domain == tenant.domain) {
                return Err(RepositoryError::UniqueViolation(
                    TENANT_DOMAIN_KEY.to_string(),
                ));
            }
            tables.tenants.insert(tenant.id, tenant.clone());
            Ok(())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Tenant>, RepositoryError> {
        Ok(self.read(|tables| tables.tenants.get(&id).cloned()))
    }

    async fn find_by_domain(&self, domain: &str) -> Result<Option<Tenant>, RepositoryError> {
        Ok(self.read(|tables| {
            tables
                .tenants
                .values()
                .find(|t| t.domain == domain)
                .cloned()
        }))
    }

    async fn update(&self, tenant: &Tenant) -> Result<(), RepositoryError> {
        self.transaction(|tables| {
            if tables
                .tenants
                .values()
                .any(|t| t.id != tenant.id && t.domain == tenant.domain)
            {
                return Err(RepositoryError::UniqueViolation(
                    TENANT_DOMAIN_KEY.to_string(),
                ));
            }

            let stored = tables
                .tenants
                .get_mut(&tenant.id)
                .ok_or(RepositoryError::NotFound)?;
            *stored = tenant.clone();
            Ok(())
        })
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        self.transaction(|tables| {
            let knowledge_ids: Vec<Uuid> = tables
                .knowledge
                .values()
                .filter(|k| k.tenant_id == id)
                .map(|k| k.id)
                .collect();
            let tag_ids: Vec<Uuid> = tables
                .tags
                .values()
                .filter(|t| t.tenant_id == id)
                .map(|t| t.id)
                .collect();

            tables.comments.retain(|_, c| c.tenant_id != id);
            tables.knowledge_tags.retain(|(knowledge_id, tag_id)| {
                !knowledge_ids.contains(knowledge_id) && !tag_ids.contains(tag_id)
            });
            tables.knowledge.retain(|_, k| k.tenant_id != id);
            tables.tags.retain(|_, t| t.tenant_id != id);
            tables.users.retain(|_, u| u.tenant_id != id);

            tables
                .tenants
                .remove(&id)
                .map(|_| ())
                .ok_or(RepositoryError::NotFound)
        })?;

        debug!(tenant_id = %id, "Tenant cascade committed");
        Ok(())
    }
}
