/// Atomic multi-statement execution
///
/// Every multi-row mutation in the Postgres store (cascading deletes, author
/// clearing, knowledge save plus tag replacement) is expressed as an ordered list
/// of [`Statement`]s and handed to [`execute_atomically`], which runs them inside a
/// single transaction. Either every statement commits or none does.
///
/// # Example
///
/// ```no_run
/// use kbhub_shared::db::atomic::{execute_atomically, Statement};
/// use uuid::Uuid;
///
/// # async fn example(pool: sqlx::PgPool, tag_id: Uuid, tenant_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// execute_atomically(
///     &pool,
///     vec![
///         Statement::new("DELETE FROM knowledge_tags WHERE tag_id = $1").bind(tag_id),
///         Statement::new("DELETE FROM tags WHERE id = $1 AND tenant_id = $2")
///             .bind(tag_id)
///             .bind(tenant_id)
///             .must_affect_rows(),
///     ],
/// )
/// .await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use sqlx::{postgres::PgArguments, query::Query, types::Json, PgPool, Postgres};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// A value bound to a statement placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum Bind {
    Uuid(Uuid),
    NullableUuid(Option<Uuid>),
    Text(String),
    NullableText(Option<String>),
    Timestamp(DateTime<Utc>),
    UuidArray(Vec<Uuid>),
    Json(serde_json::Value),
}

impl From<Uuid> for Bind {
    fn from(value: Uuid) -> Self {
        Bind::Uuid(value)
    }
}

impl From<Option<Uuid>> for Bind {
    fn from(value: Option<Uuid>) -> Self {
        Bind::NullableUuid(value)
    }
}

impl From<String> for Bind {
    fn from(value: String) -> Self {
        Bind::Text(value)
    }
}

impl From<&str> for Bind {
    fn from(value: &str) -> Self {
        Bind::Text(value.to_string())
    }
}

impl From<Option<String>> for Bind {
    fn from(value: Option<String>) -> Self {
        Bind::NullableText(value)
    }
}

impl From<DateTime<Utc>> for Bind {
    fn from(value: DateTime<Utc>) -> Self {
        Bind::Timestamp(value)
    }
}

impl From<Vec<Uuid>> for Bind {
    fn from(value: Vec<Uuid>) -> Self {
        Bind::UuidArray(value)
    }
}

impl From<serde_json::Value> for Bind {
    fn from(value: serde_json::Value) -> Self {
        Bind::Json(value)
    }
}

/// One SQL statement with its bound parameters
#[derive(Debug, Clone)]
pub struct Statement {
    sql: String,
    binds: Vec<Bind>,
    must_affect_rows: bool,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            binds: Vec::new(),
            must_affect_rows: false,
        }
    }

    /// Appends a value for the next `$n` placeholder
    pub fn bind(mut self, value: impl Into<Bind>) -> Self {
        self.binds.push(value.into());
        self
    }

    /// Marks the statement as required to touch at least one row
    ///
    /// If it affects none, the whole transaction is rolled back and
    /// [`AtomicError::NoRowsAffected`] is returned.
    pub fn must_affect_rows(mut self) -> Self {
        self.must_affect_rows = true;
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn binds(&self) -> &[Bind] {
        &self.binds
    }

    pub fn requires_rows(&self) -> bool {
        self.must_affect_rows
    }
}

/// Failure of an atomic batch
#[derive(Error, Debug)]
pub enum AtomicError {
    /// A statement marked with [`Statement::must_affect_rows`] matched nothing
    #[error("statement {index} affected no rows")]
    NoRowsAffected { index: usize },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: Bind,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        Bind::Uuid(v) => query.bind(v),
        Bind::NullableUuid(v) => query.bind(v),
        Bind::Text(v) => query.bind(v),
        Bind::NullableText(v) => query.bind(v),
        Bind::Timestamp(v) => query.bind(v),
        Bind::UuidArray(v) => query.bind(v),
        Bind::Json(v) => query.bind(Json(v)),
    }
}

/// Executes `statements` in order inside one transaction
///
/// Returns the number of rows affected by each statement.
///
/// # Errors
///
/// - [`AtomicError::Database`] if any statement or the commit fails
/// - [`AtomicError::NoRowsAffected`] if a statement marked with
///   [`Statement::must_affect_rows`] matched no row
///
/// In both cases nothing is committed.
pub async fn execute_atomically(
    pool: &PgPool,
    statements: Vec<Statement>,
) -> Result<Vec<u64>, AtomicError> {
    let total = statements.len();
    let mut tx = pool.begin().await?;
    let mut affected = Vec::with_capacity(total);

    for (index, statement) in statements.into_iter().enumerate() {
        let Statement {
            sql,
            binds,
            must_affect_rows,
        } = statement;

        let mut query = sqlx::query(&sql);
        for value in binds {
            query = bind_value(query, value);
        }

        let rows = query.execute(&mut *tx).await?.rows_affected();

        if must_affect_rows && rows == 0 {
            debug!(index, total, "Atomic batch aborted: statement matched no rows");
            tx.rollback().await?;
            return Err(AtomicError::NoRowsAffected { index });
        }

        affected.push(rows);
    }

    tx.commit().await?;
    debug!(statements = total, rows = ?affected, "Atomic batch committed");

    Ok(affected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_collects_binds_in_order() {
        let id = Uuid::new_v4();
        let statement = Statement::new("UPDATE knowledge SET author_id = $1 WHERE id = $2")
            .bind(None::<Uuid>)
            .bind(id);

        assert_eq!(
            statement.binds(),
            &[Bind::NullableUuid(None), Bind::Uuid(id)]
        );
        assert!(!statement.requires_rows());
    }

    #[test]
    fn test_must_affect_rows_flag() {
        let statement = Statement::new("DELETE FROM tags WHERE id = $1").must_affect_rows();
        assert!(statement.requires_rows());
        assert_eq!(statement.sql(), "DELETE FROM tags WHERE id = $1");
    }

    #[test]
    fn test_bind_conversions() {
        assert_eq!(Bind::from("x"), Bind::Text("x".to_string()));
        assert_eq!(Bind::from(Some("y".to_string())), Bind::NullableText(Some("y".to_string())));
        assert_eq!(Bind::from(Vec::<Uuid>::new()), Bind::UuidArray(vec![]));
    }
}
