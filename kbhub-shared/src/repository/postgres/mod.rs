/// PostgreSQL store
///
/// Implements every repository trait on top of a sqlx [`PgPool`]. Single-row
/// reads and writes use runtime-checked `sqlx::query_as` calls; every
/// multi-statement mutation goes through [`crate::db::atomic::execute_atomically`].
///
/// Rows are decoded into private `*Row` structs and converted to the domain
/// models, so enum columns are validated on the way out.

mod comment;
mod knowledge;
mod tag;
mod tenant;
mod user;

use async_trait::async_trait;
use sqlx::PgPool;

use super::{RepositoryError, StoreHealth};
use crate::db::pool::health_check;

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl StoreHealth for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        health_check(&self.pool).await.map_err(RepositoryError::from)
    }
}
