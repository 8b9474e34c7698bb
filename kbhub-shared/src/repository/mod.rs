/// Tenant-scoped repositories
///
/// One async trait per entity kind. Every lookup, update, and delete takes the
/// owning tenant's ID and ANDs it into the predicate, so a row belonging to a
/// different tenant is indistinguishable from a missing row.
///
/// Two stores implement every trait:
///
/// - [`postgres::PgStore`]: sqlx/PostgreSQL, used in production
/// - [`memory::MemoryStore`]: in-process tables, used by tests and local runs
///
/// [`Repositories`] bundles the trait objects handed to the use cases.
///
/// # Example
///
/// ```
/// use kbhub_shared::repository::Repositories;
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), kbhub_shared::repository::RepositoryError> {
/// let repos = Repositories::in_memory();
/// let missing = repos.tenants.find_by_id(Uuid::new_v4()).await?;
/// assert!(missing.is_none());
/// # Ok(())
/// # }
/// ```

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::db::atomic::AtomicError;
use crate::models::{Comment, Knowledge, Tag, Tenant, User};
use crate::search::KnowledgeFilter;

/// Unique constraint on `tenants.domain`
pub const TENANT_DOMAIN_KEY: &str = "tenants_domain_key";

/// Unique constraint on `users (tenant_id, email)`
pub const USER_EMAIL_KEY: &str = "users_tenant_email_key";

/// Storage failure, classified once at the repository boundary
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// The tenant-scoped predicate matched no row
    #[error("record not found")]
    NotFound,

    /// A unique constraint rejected the write
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// A referenced row does not exist
    #[error("foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    /// A stored value could not be mapped back to the domain model
    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::RowNotFound = err {
            return RepositoryError::NotFound;
        }

        if let sqlx::Error::Database(db) = &err {
            let constraint = db.constraint().unwrap_or_default().to_string();
            if db.is_unique_violation() {
                return RepositoryError::UniqueViolation(constraint);
            }
            if db.is_foreign_key_violation() {
                return RepositoryError::ForeignKeyViolation(constraint);
            }
        }

        RepositoryError::Database(err)
    }
}

impl From<AtomicError> for RepositoryError {
    fn from(err: AtomicError) -> Self {
        match err {
            AtomicError::NoRowsAffected { .. } => RepositoryError::NotFound,
            AtomicError::Database(e) => RepositoryError::from(e),
        }
    }
}

#[async_trait]
pub trait TenantRepository: Send + Sync {
    async fn create(&self, tenant: &Tenant) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Tenant>, RepositoryError>;

    async fn find_by_domain(&self, domain: &str) -> Result<Option<Tenant>, RepositoryError>;

    async fn update(&self, tenant: &Tenant) -> Result<(), RepositoryError>;

    /// Removes the tenant and every row it owns in one transaction
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &User) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: Uuid, tenant_id: Uuid) -> Result<Option<User>, RepositoryError>;

    async fn find_by_email(
        &self,
        email: &str,
        tenant_id: Uuid,
    ) -> Result<Option<User>, RepositoryError>;

    /// Users of a tenant, oldest first
    async fn find_all(&self, tenant_id: Uuid) -> Result<Vec<User>, RepositoryError>;

    async fn update(&self, user: &User) -> Result<(), RepositoryError>;

    /// Clears the user's authorship on knowledge and comments, then removes the
    /// user, in one transaction
    async fn delete(&self, id: Uuid, tenant_id: Uuid) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait KnowledgeRepository: Send + Sync {
    /// Inserts the article and its tag associations in one transaction
    ///
    /// Tag IDs not owned by the article's tenant are ignored.
    async fn create(&self, knowledge: &Knowledge, tag_ids: &[Uuid]) -> Result<(), RepositoryError>;

    /// The article with tags and comments attached
    async fn find_by_id(
        &self,
        id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Option<Knowledge>, RepositoryError>;

    async fn find_all(&self, tenant_id: Uuid) -> Result<Vec<Knowledge>, RepositoryError>;

    /// Articles matching `filter`, newest first, with tags and comments attached
    async fn search(&self, filter: &KnowledgeFilter) -> Result<Vec<Knowledge>, RepositoryError>;

    /// Saves the article row and, when `tag_ids` is `Some`, replaces its tag
    /// set wholesale, all in one transaction
    async fn update(
        &self,
        knowledge: &Knowledge,
        tag_ids: Option<&[Uuid]>,
    ) -> Result<(), RepositoryError>;

    /// Removes the article's comments and tag associations, then the article,
    /// in one transaction
    async fn delete(&self, id: Uuid, tenant_id: Uuid) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait TagRepository: Send + Sync {
    async fn create(&self, tag: &Tag) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: Uuid, tenant_id: Uuid) -> Result<Option<Tag>, RepositoryError>;

    /// Tags of a tenant, ordered by name
    async fn find_all(&self, tenant_id: Uuid) -> Result<Vec<Tag>, RepositoryError>;

    async fn update(&self, tag: &Tag) -> Result<(), RepositoryError>;

    /// Detaches the tag from every article, then removes it, in one transaction
    async fn delete(&self, id: Uuid, tenant_id: Uuid) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create(&self, comment: &Comment) -> Result<(), RepositoryError>;

    async fn find_by_id(
        &self,
        id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Option<Comment>, RepositoryError>;

    /// Comments on one article, newest first
    async fn find_by_knowledge_id(
        &self,
        knowledge_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<Vec<Comment>, RepositoryError>;

    /// Comments of a tenant, newest first
    async fn find_all(&self, tenant_id: Uuid) -> Result<Vec<Comment>, RepositoryError>;

    async fn update(&self, comment: &Comment) -> Result<(), RepositoryError>;

    async fn delete(&self, id: Uuid, tenant_id: Uuid) -> Result<(), RepositoryError>;
}

/// Liveness check of the underlying store
#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Repository handles shared by every use case
#[derive(Clone)]
pub struct Repositories {
    pub tenants: Arc<dyn TenantRepository>,
    pub users: Arc<dyn UserRepository>,
    pub knowledge: Arc<dyn KnowledgeRepository>,
    pub tags: Arc<dyn TagRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub health: Arc<dyn StoreHealth>,
}

impl Repositories {
    /// Repositories backed by PostgreSQL
    pub fn postgres(pool: PgPool) -> Self {
        Self::from_store(Arc::new(postgres::PgStore::new(pool)))
    }

    /// Repositories backed by a fresh, empty in-memory store
    pub fn in_memory() -> Self {
        Self::from_store(Arc::new(memory::MemoryStore::new()))
    }

    /// Repositories sharing one store that implements every trait
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: TenantRepository
            + UserRepository
            + KnowledgeRepository
            + TagRepository
            + CommentRepository
            + StoreHealth
            + 'static,
    {
        Self {
            tenants: store.clone(),
            users: store.clone(),
            knowledge: store.clone(),
            tags: store.clone(),
            comments: store.clone(),
            health: store,
        }
    }
}

impl std::fmt::Debug for Repositories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repositories").finish_non_exhaustive()
    }
}
