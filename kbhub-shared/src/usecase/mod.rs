/// Use cases
///
/// One struct per business action, each with an `execute` method. Every
/// operation follows the same phases:
///
/// 1. structural validation of the input
/// 2. tenant verification (`TenantNotFound`)
/// 3. authorization of the actor against that tenant (`Forbidden`)
/// 4. verification of every referenced entity within the tenant (`*NotFound`)
/// 5. the mutation, delegated to the repositories; multi-row changes are atomic
///
/// [`UseCases`] holds the shared dependencies and hands out operation objects.
///
/// # Example
///
/// ```
/// use kbhub_shared::models::Theme;
/// use kbhub_shared::repository::Repositories;
/// use kbhub_shared::usecase::{tenant::CreateTenantInput, UseCases};
///
/// # async fn example() -> Result<(), kbhub_shared::error::AppError> {
/// let use_cases = UseCases::new(Repositories::in_memory());
/// let tenant = use_cases
///     .create_tenant()
///     .execute(CreateTenantInput {
///         name: "Acme".to_string(),
///         domain: "acme.test".to_string(),
///         theme: Theme::default(),
///     })
///     .await?;
/// assert_eq!(tenant.domain, "acme.test");
/// # Ok(())
/// # }
/// ```

pub mod comment;
pub mod knowledge;
pub mod tag;
pub mod tenant;
pub mod user;

use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::auth::password::{Argon2Hasher, PasswordHasher};
use crate::error::AppError;
use crate::models::Tenant;
use crate::repository::{Repositories, RepositoryError};

/// Source of new entity IDs
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> Uuid;
}

/// Random (v4) UUIDs
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Shared dependencies of every use case
#[derive(Clone)]
pub struct UseCases {
    repos: Repositories,
    hasher: Arc<dyn PasswordHasher>,
    ids: Arc<dyn IdGenerator>,
}

impl UseCases {
    /// Default Argon2id hasher and random UUIDs
    pub fn new(repos: Repositories) -> Self {
        Self::with_dependencies(repos, Arc::new(Argon2Hasher::default()), Arc::new(UuidGenerator))
    }

    pub fn with_dependencies(
        repos: Repositories,
        hasher: Arc<dyn PasswordHasher>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self { repos, hasher, ids }
    }

    pub fn repositories(&self) -> &Repositories {
        &self.repos
    }

    pub fn create_tenant(&self) -> tenant::CreateTenant {
        tenant::CreateTenant::new(self.repos.clone(), self.ids.clone())
    }

    pub fn get_tenant(&self) -> tenant::GetTenant {
        tenant::GetTenant::new(self.repos.clone())
    }

    pub fn get_tenant_by_domain(&self) -> tenant::GetTenantByDomain {
        tenant::GetTenantByDomain::new(self.repos.clone())
    }

    pub fn update_tenant_settings(&self) -> tenant::UpdateTenantSettings {
        tenant::UpdateTenantSettings::new(self.repos.clone())
    }

    pub fn delete_tenant(&self) -> tenant::DeleteTenant {
        tenant::DeleteTenant::new(self.repos.clone())
    }

    pub fn register_user(&self) -> user::RegisterUser {
        user::RegisterUser::new(self.repos.clone(), self.hasher.clone(), self.ids.clone())
    }

    pub fn authenticate_user(&self) -> user::AuthenticateUser {
        user::AuthenticateUser::new(self.repos.clone(), self.hasher.clone())
    }

    pub fn get_user(&self) -> user::GetUser {
        user::GetUser::new(self.repos.clone())
    }

    pub fn list_users(&self) -> user::ListUsers {
        user::ListUsers::new(self.repos.clone())
    }

    pub fn update_user(&self) -> user::UpdateUser {
        user::UpdateUser::new(self.repos.clone(), self.hasher.clone())
    }

    pub fn delete_user(&self) -> user::DeleteUser {
        user::DeleteUser::new(self.repos.clone())
    }

    pub fn create_knowledge(&self) -> knowledge::CreateKnowledge {
        knowledge::CreateKnowledge::new(self.repos.clone(), self.ids.clone())
    }

    pub fn get_knowledge(&self) -> knowledge::GetKnowledge {
        knowledge::GetKnowledge::new(self.repos.clone())
    }

    pub fn update_knowledge(&self) -> knowledge::UpdateKnowledge {
        knowledge::UpdateKnowledge::new(self.repos.clone())
    }

    pub fn delete_knowledge(&self) -> knowledge::DeleteKnowledge {
        knowledge::DeleteKnowledge::new(self.repos.clone())
    }

    pub fn search_knowledge(&self) -> knowledge::SearchKnowledge {
        knowledge::SearchKnowledge::new(self.repos.clone())
    }

    pub fn create_tag(&self) -> tag::CreateTag {
        tag::CreateTag::new(self.repos.clone(), self.ids.clone())
    }

    pub fn list_tags(&self) -> tag::ListTags {
        tag::ListTags::new(self.repos.clone())
    }

    pub fn update_tag(&self) -> tag::UpdateTag {
        tag::UpdateTag::new(self.repos.clone())
    }

    pub fn delete_tag(&self) -> tag::DeleteTag {
        tag::DeleteTag::new(self.repos.clone())
    }

    pub fn create_comment(&self) -> comment::CreateComment {
        comment::CreateComment::new(self.repos.clone(), self.ids.clone())
    }

    pub fn list_comments(&self) -> comment::ListComments {
        comment::ListComments::new(self.repos.clone())
    }

    pub fn update_comment(&self) -> comment::UpdateComment {
        comment::UpdateComment::new(self.repos.clone())
    }

    pub fn delete_comment(&self) -> comment::DeleteComment {
        comment::DeleteComment::new(self.repos.clone())
    }
}

impl std::fmt::Debug for UseCases {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UseCases").finish_non_exhaustive()
    }
}

/// Current time at the precision PostgreSQL stores (microseconds)
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Rejects absent or blank required text
pub(crate) fn require_text(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        debug!(field, "Rejected blank required field");
        return Err(AppError::missing_field(field));
    }
    Ok(())
}

/// Rejects a supplied-but-blank replacement for required text
pub(crate) fn require_present_text(field: &str, value: Option<&String>) -> Result<(), AppError> {
    match value {
        Some(v) => require_text(field, v),
        None => Ok(()),
    }
}

/// Rejects the nil UUID, which stands for a missing identifier
pub(crate) fn require_id(field: &str, id: Uuid) -> Result<(), AppError> {
    if id.is_nil() {
        debug!(field, "Rejected missing identifier");
        return Err(AppError::missing_field(field));
    }
    Ok(())
}

/// Loads the tenant or fails with `TenantNotFound`
pub(crate) async fn load_tenant(repos: &Repositories, tenant_id: Uuid) -> Result<Tenant, AppError> {
    repos.tenants.find_by_id(tenant_id).await?.ok_or_else(|| {
        debug!(tenant_id = %tenant_id, "Tenant not found");
        AppError::TenantNotFound
    })
}

/// Maps a repository `NotFound` (row vanished between load and write) to the
/// entity's own not-found error
pub(crate) fn or_not_found(not_found: AppError) -> impl FnOnce(RepositoryError) -> AppError {
    move |err| match err {
        RepositoryError::NotFound => not_found,
        other => AppError::from(other),
    }
}

/// Resolves tag IDs within the tenant
///
/// Duplicates collapse to their first occurrence. IDs that do not name a tag of
/// this tenant are skipped rather than rejected.
pub(crate) async fn resolve_tags(
    repos: &Repositories,
    tenant_id: Uuid,
    tag_ids: &[Uuid],
) -> Result<Vec<Uuid>, AppError> {
    let mut resolved: Vec<Uuid> = Vec::with_capacity(tag_ids.len());

    for &tag_id in tag_ids {
        if resolved.contains(&tag_id) {
            continue;
        }
        match repos.tags.find_by_id(tag_id, tenant_id).await? {
            Some(tag) => resolved.push(tag.id),
            None => debug!(tenant_id = %tenant_id, tag_id = %tag_id, "Skipping unknown tag"),
        }
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_text() {
        assert!(require_text("title", "Rust").is_ok());
        assert!(matches!(
            require_text("title", "   "),
            Err(AppError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_require_present_text() {
        assert!(require_present_text("title", None).is_ok());
        assert!(require_present_text("title", Some(&"x".to_string())).is_ok());
        assert!(require_present_text("title", Some(&String::new())).is_err());
    }

    #[test]
    fn test_require_id() {
        assert!(require_id("tenant_id", Uuid::new_v4()).is_ok());
        let err = require_id("tenant_id", Uuid::nil()).unwrap_err();
        assert_eq!(err.details()[0].field, "tenant_id");
    }

    #[test]
    fn test_now_has_microsecond_precision() {
        assert_eq!(now().timestamp_subsec_nanos() % 1_000, 0);
    }

    #[test]
    fn test_or_not_found_keeps_other_errors() {
        let mapped = or_not_found(AppError::TagNotFound)(RepositoryError::NotFound);
        assert!(matches!(mapped, AppError::TagNotFound));

        let mapped = or_not_found(AppError::TagNotFound)(RepositoryError::Corrupt("x".into()));
        assert!(matches!(mapped, AppError::Infrastructure(_)));
    }

    #[tokio::test]
    async fn test_resolve_tags_skips_unknown_and_duplicates() {
        let repos = Repositories::in_memory();
        let tenant_id = Uuid::new_v4();
        let unknown = Uuid::new_v4();

        let resolved = resolve_tags(&repos, tenant_id, &[unknown, unknown]).await.unwrap();
        assert!(resolved.is_empty());
    }
}
