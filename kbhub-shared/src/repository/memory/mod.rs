/// In-memory store
///
/// Holds every table behind one `RwLock`. Multi-step writes run through
/// [`MemoryStore::transaction`], which applies them to a copy of the tables and
/// swaps the copy in only when every step succeeded, so readers never observe a
/// half-applied cascade. Constraint checks mirror the Postgres schema: unique
/// keys, foreign keys, and the `(knowledge_id, tag_id)` association key.

mod comment;
mod knowledge;
mod tag;
mod tenant;
mod user;

use std::collections::{BTreeSet, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

use super::{RepositoryError, StoreHealth};
use crate::models::{Comment, Knowledge, Tag, Tenant, User};

/// Table contents
#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub tenants: HashMap<Uuid, Tenant>,
    pub users: HashMap<Uuid, User>,

    /// Article rows; `tags` and `comments` stay empty here and are attached on read
    pub knowledge: HashMap<Uuid, Knowledge>,

    pub tags: HashMap<Uuid, Tag>,

    /// `(knowledge_id, tag_id)` pairs
    pub knowledge_tags: BTreeSet<(Uuid, Uuid)>,

    pub comments: HashMap<Uuid, Comment>,
}

impl Tables {
    /// Tag IDs attached to an article
    pub fn tag_ids_of(&self, knowledge_id: Uuid) -> Vec<Uuid> {
        self.knowledge_tags
            .range((knowledge_id, Uuid::nil())..=(knowledge_id, Uuid::from_u128(u128::MAX)))
            .map(|(_, tag_id)| *tag_id)
            .collect()
    }

    /// Total number of rows across every table
    pub fn row_count(&self) -> usize {
        self.tenants.len()
            + self.users.len()
            + self.knowledge.len()
            + self.tags.len()
            + self.knowledge_tags.len()
            + self.comments.len()
    }

    fn require_tenant(&self, tenant_id: Uuid) -> Result<(), RepositoryError> {
        if self.tenants.contains_key(&tenant_id) {
            Ok(())
        } else {
            Err(RepositoryError::ForeignKeyViolation(
                "tenant_id_fkey".to_string(),
            ))
        }
    }

    fn require_user(&self, user_id: Option<Uuid>) -> Result<(), RepositoryError> {
        match user_id {
            Some(id) if !self.users.contains_key(&id) => Err(
                RepositoryError::ForeignKeyViolation("author_id_fkey".to_string()),
            ),
            _ => Ok(()),
        }
    }
}

/// In-memory implementation of every repository trait
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_guard(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Runs `f` against the current tables
    pub fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> R {
        f(&self.read_guard())
    }

    /// Runs `f` against a copy of the tables and commits the copy only if `f`
    /// returns `Ok`
    pub fn transaction<R>(
        &self,
        f: impl FnOnce(&mut Tables) -> Result<R, RepositoryError>,
    ) -> Result<R, RepositoryError> {
        let mut guard = self.write_guard();
        let mut working = guard.clone();

        match f(&mut working) {
            Ok(result) => {
                *guard = working;
                Ok(result)
            }
            Err(e) => {
                debug!(error = %e, "In-memory transaction rolled back");
                Err(e)
            }
        }
    }
}

#[async_trait]
impl StoreHealth for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        self.read(|_| Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TenantSettings;
    use chrono::Utc;

    fn tenant(domain: &str) -> Tenant {
        let now = Utc::now();
        Tenant {
            id: Uuid::new_v4(),
            name: "Acme".to_string(),
            domain: domain.to_string(),
            settings: TenantSettings::default(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_failed_transaction_leaves_tables_unchanged() {
        let store = MemoryStore::new();
        let t = tenant("acme.test");

        let result: Result<(), RepositoryError> = store.transaction(|tables| {
            tables.tenants.insert(t.id, t.clone());
            Err(RepositoryError::NotFound)
        });

        assert!(matches!(result, Err(RepositoryError::NotFound)));
        assert_eq!(store.read(|tables| tables.row_count()), 0);
    }

    #[test]
    fn test_successful_transaction_commits() {
        let store = MemoryStore::new();
        let t = tenant("acme.test");

        store
            .transaction(|tables| {
                tables.tenants.insert(t.id, t.clone());
                Ok(())
            })
            .unwrap();

        assert!(store.read(|tables| tables.tenants.contains_key(&t.id)));
    }

    #[tokio::test]
    async fn test_create_with_taken_id_keeps_existing_row() {
        use crate::repository::{TagRepository, TenantRepository};

        let store = MemoryStore::new();
        let acme = tenant("acme.test");
        let mut globex = tenant("globex.test");
        TenantRepository::create(&store, &acme).await.unwrap();

        let reused = Tenant { id: acme.id, ..globex.clone() };
        let err = TenantRepository::create(&store, &reused).await.unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueViolation(c) if c == "tenants_pkey"));

        globex.id = Uuid::new_v4();
        TenantRepository::create(&store, &globex).await.unwrap();

        let now = Utc::now();
        let tag = Tag {
            id: Uuid::new_v4(),
            tenant_id: acme.id,
            name: "internal".to_string(),
            color: None,
            created_at: now,
            updated_at: now,
        };
        TagRepository::create(&store, &tag).await.unwrap();

        let hijack = Tag {
            tenant_id: globex.id,
            name: "public".to_string(),
            ..tag.clone()
        };
        let err = TagRepository::create(&store, &hijack).await.unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueViolation(c) if c == "tags_pkey"));

        assert!(TagRepository::find_by_id(&store, tag.id, globex.id).await.unwrap().is_none());
        let kept = TagRepository::find_by_id(&store, tag.id, acme.id).await.unwrap().unwrap();
        assert_eq!(kept.name, "internal");
        assert_eq!(store.read(|tables| tables.tenants[&acme.id].domain.clone()), "acme.test");
    }

    #[test]
    fn test_tag_ids_of_only_returns_own_pairs() {
        let mut tables = Tables::default();
        let (k1, k2) = (Uuid::new_v4(), Uuid::new_v4());
        let (t1, t2) = (Uuid::new_v4(), Uuid::new_v4());
        tables.knowledge_tags.insert((k1, t1));
        tables.knowledge_tags.insert((k1, t2));
        tables.knowledge_tags.insert((k2, t1));

        let mut ids = tables.tag_ids_of(k1);
        ids.sort();
        let mut expected = vec![t1, t2];
        expected.sort();
        assert_eq!(ids, expected);
        assert_eq!(tables.tag_ids_of(k2), vec![t1]);
    }
}
