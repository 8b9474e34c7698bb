//! # Knowledge Hub Shared Library
//!
//! Domain core of the multi-tenant knowledge base: models, tenant-scoped
//! repositories, the search composer, and the use cases the API server calls.
//!
//! ## Module Organization
//!
//! - `models`: Tenants, users, knowledge articles, tags, and comments
//! - `db`: Connection pool, embedded migrations, and atomic statement execution
//! - `repository`: Tenant-scoped storage traits with PostgreSQL and in-memory stores
//! - `search`: Knowledge filter rendered to SQL or evaluated in memory
//! - `auth`: Password hashing, JWT, actor context, and authorization checks
//! - `usecase`: One operation object per business action
//! - `error`: Classified use-case errors

pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod repository;
pub mod search;
pub mod usecase;

/// Current version of the Knowledge Hub shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
