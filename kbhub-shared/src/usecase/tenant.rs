/// Tenant use cases

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use super::{load_tenant, now, or_not_found, require_id, require_text, IdGenerator};
use crate::auth::authorization::{require_admin, require_membership};
use crate::auth::context::ActorContext;
use crate::error::AppError;
use crate::models::{Tenant, TenantSettings, Theme};
use crate::repository::Repositories;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTenantInput {
    pub name: String,
    pub domain: String,
    #[serde(default)]
    pub theme: Theme,
}

/// Creates a tenant with the given theme and every feature enabled
pub struct CreateTenant {
    repos: Repositories,
    ids: Arc<dyn IdGenerator>,
}

impl CreateTenant {
    pub fn new(repos: Repositories, ids: Arc<dyn IdGenerator>) -> Self {
        Self { repos, ids }
    }

    /// # Errors
    ///
    /// - `InvalidInput` when the name or domain is blank
    /// - `DomainAlreadyExists` when another tenant owns the domain
    pub async fn execute(&self, input: CreateTenantInput) -> Result<Tenant, AppError> {
        require_text("name", &input.name)?;
        require_text("domain", &input.domain)?;

        if self.repos.tenants.find_by_domain(&input.domain).await?.is_some() {
            debug!(domain = %input.domain, "Tenant domain already taken");
            return Err(AppError::DomainAlreadyExists);
        }

        let timestamp = now();
        let tenant = Tenant {
            id: self.ids.generate(),
            name: input.name,
            domain: input.domain,
            settings: TenantSettings::with_theme(input.theme),
            created_at: timestamp,
            updated_at: timestamp,
        };

        self.repos.tenants.create(&tenant).await?;

        info!(tenant_id = %tenant.id, domain = %tenant.domain, "Created tenant");

        Ok(tenant)
    }
}

/// Loads the actor's own tenant
pub struct GetTenant {
    repos: Repositories,
}

impl GetTenant {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub async fn execute(&self, actor: &ActorContext, tenant_id: Uuid) -> Result<Tenant, AppError> {
        require_id("tenant_id", tenant_id)?;
        let tenant = load_tenant(&self.repos, tenant_id).await?;
        require_membership(actor, tenant_id)?;

        Ok(tenant)
    }
}

/// Resolves a tenant from its domain; public, used before login
pub struct GetTenantByDomain {
    repos: Repositories,
}

impl GetTenantByDomain {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub async fn execute(&self, domain: &str) -> Result<Tenant, AppError> {
        require_text("domain", domain)?;

        self.repos
            .tenants
            .find_by_domain(domain)
            .await?
            .ok_or(AppError::TenantNotFound)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateTenantSettingsInput {
    pub tenant_id: Uuid,
    pub settings: TenantSettings,
}

/// Replaces the tenant's settings; admins only
pub struct UpdateTenantSettings {
    repos: Repositories,
}

impl UpdateTenantSettings {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub async fn execute(
        &self,
        actor: &ActorContext,
        input: UpdateTenantSettingsInput,
    ) -> Result<Tenant, AppError> {
        require_id("tenant_id", input.tenant_id)?;
        let mut tenant = load_tenant(&self.repos, input.tenant_id).await?;
        require_membership(actor, input.tenant_id)?;
        require_admin(actor)?;

        tenant.settings = input.settings;
        tenant.updated_at = now();

        self.repos
            .tenants
            .update(&tenant)
            .await
            .map_err(or_not_found(AppError::TenantNotFound))?;

        info!(tenant_id = %tenant.id, actor_id = %actor.user_id, "Updated tenant settings");

        Ok(tenant)
    }
}

/// Deletes the tenant and everything it owns; admins only
pub struct DeleteTenant {
    repos: Repositories,
}

impl DeleteTenant {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub async fn execute(&self, actor: &ActorContext, tenant_id: Uuid) -> Result<(), AppError> {
        require_id("tenant_id", tenant_id)?;
        load_tenant(&self.repos, tenant_id).await?;
        require_membership(actor, tenant_id)?;
        require_admin(actor)?;

        self.repos
            .tenants
            .delete(tenant_id)
            .await
            .map_err(or_not_found(AppError::TenantNotFound))?;

        info!(tenant_id = %tenant_id, actor_id = %actor.user_id, "Deleted tenant");

        Ok(())
    }
}
