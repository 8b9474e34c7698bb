/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration, login, and the current user
/// - `tenants`: Tenant lookup, creation, settings, and deletion
/// - `users`: User management within the caller's tenant
/// - `knowledge`: Knowledge articles and search
/// - `comments`: Comments on a knowledge article
/// - `tags`: Tenant tags
///
/// Every authenticated route acts within the tenant carried by the caller's
/// token.

pub mod auth;
pub mod comments;
pub mod health;
pub mod knowledge;
pub mod tags;
pub mod tenants;
pub mod users;
