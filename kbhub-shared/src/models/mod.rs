/// Domain models for the knowledge hub
///
/// Plain data types shared by the repositories, use cases, and the HTTP layer.
/// Storage-specific row mapping lives in [`crate::repository::postgres`].
///
/// # Models
///
/// - `tenant`: isolation root with theme and feature settings
/// - `user`: tenant-scoped accounts with roles
/// - `knowledge`: articles with tags and comments attached
/// - `tag`: tenant-scoped labels
/// - `comment`: comments on knowledge articles

pub mod comment;
pub mod knowledge;
pub mod tag;
pub mod tenant;
pub mod user;

pub use comment::Comment;
pub use knowledge::{Knowledge, KnowledgeStatus};
pub use tag::Tag;
pub use tenant::{Features, Tenant, TenantSettings, Theme};
pub use user::{User, UserRole};
