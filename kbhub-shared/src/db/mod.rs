/// Postgres storage plumbing
///
/// - `pool`: connection pool creation and health checks
/// - `migrations`: embedded schema migrations
/// - `atomic`: all-or-nothing execution of statement batches
///
/// The tenant-scoped repositories built on top of these live in
/// [`crate::repository::postgres`].

pub mod atomic;
pub mod migrations;
pub mod pool;
