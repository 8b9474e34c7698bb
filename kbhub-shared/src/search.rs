/// Knowledge search composer
///
/// [`KnowledgeFilter`] is the single description of a knowledge query. The
/// Postgres store renders it into SQL with [`KnowledgeFilter::push_predicates`];
/// the in-memory store evaluates it with [`KnowledgeFilter::matches`]. Both
/// produce the same rows in the same order.
///
/// Semantics:
///
/// - the tenant predicate is always applied
/// - `text` matches title or content, case-insensitively, as a substring
/// - `tag_ids` matches knowledge carrying at least one of the tags; each article
///   is returned once no matter how many of the tags it carries
/// - `author_id`, `status`, `id` are exact matches
/// - results are ordered newest first, ties broken by ID
///
/// # Example
///
/// ```
/// use kbhub_shared::search::KnowledgeFilter;
/// use uuid::Uuid;
///
/// let filter = KnowledgeFilter::for_tenant(Uuid::new_v4())
///     .with_text("rust")
///     .with_tags(vec![Uuid::new_v4(), Uuid::new_v4()]);
/// assert_eq!(filter.text(), Some("rust"));
/// ```

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::{Knowledge, KnowledgeStatus};

/// SQL ordering clause matching [`compare_newest_first`]
pub const ORDER_BY: &str = " ORDER BY k.created_at DESC, k.id ASC";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeFilter {
    /// Mandatory tenant scope
    pub tenant_id: Uuid,

    /// Restrict to a single article
    pub id: Option<Uuid>,

    /// Free-text query; blank text is ignored
    pub text: Option<String>,

    /// Inclusive-OR tag set; empty means no tag restriction
    pub tag_ids: Vec<Uuid>,

    pub author_id: Option<Uuid>,
    pub status: Option<KnowledgeStatus>,
}

impl KnowledgeFilter {
    /// Every article of `tenant_id`
    pub fn for_tenant(tenant_id: Uuid) -> Self {
        Self {
            tenant_id,
            id: None,
            text: None,
            tag_ids: Vec::new(),
            author_id: None,
            status: None,
        }
    }

    /// A single article, still scoped to `tenant_id`
    pub fn by_id(tenant_id: Uuid, id: Uuid) -> Self {
        Self {
            id: Some(id),
            ..Self::for_tenant(tenant_id)
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_tags(mut self, tag_ids: Vec<Uuid>) -> Self {
        self.tag_ids = tag_ids;
        self
    }

    pub fn with_author(mut self, author_id: Uuid) -> Self {
        self.author_id = Some(author_id);
        self
    }

    pub fn with_status(mut self, status: KnowledgeStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// The trimmed query text, or `None` when absent or blank
    pub fn text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Appends the `WHERE` clause for this filter
    ///
    /// The caller's query must alias the knowledge table as `k`.
    pub fn push_predicates(&self, builder: &mut QueryBuilder<'_, Postgres>) {
        builder.push(" WHERE k.tenant_id = ");
        builder.push_bind(self.tenant_id);

        if let Some(id) = self.id {
            builder.push(" AND k.id = ");
            builder.push_bind(id);
        }

        if let Some(text) = self.text() {
            let pattern = like_pattern(text);
            builder.push(" AND (k.title ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" ESCAPE '\\' OR k.content ILIKE ");
            builder.push_bind(pattern);
            builder.push(" ESCAPE '\\')");
        }

        if let Some(author_id) = self.author_id {
            builder.push(" AND k.author_id = ");
            builder.push_bind(author_id);
        }

        if let Some(status) = self.status {
            builder.push(" AND k.status = ");
            builder.push_bind(status.as_str());
        }

        if !self.tag_ids.is_empty() {
            builder.push(
                " AND EXISTS (SELECT 1 FROM knowledge_tags kt WHERE kt.knowledge_id = k.id AND kt.tag_id = ANY(",
            );
            builder.push_bind(self.tag_ids.clone());
            builder.push("))");
        }
    }

    /// Evaluates the filter against an article and the IDs of its attached tags
    pub fn matches(&self, knowledge: &Knowledge, attached_tag_ids: &[Uuid]) -> bool {
        if knowledge.tenant_id != self.tenant_id {
            return false;
        }

        if self.id.is_some_and(|id| id != knowledge.id) {
            return false;
        }

        if let Some(text) = self.text() {
            let needle = text.to_lowercase();
            let hit = knowledge.title.to_lowercase().contains(&needle)
                || knowledge.content.to_lowercase().contains(&needle);
            if !hit {
                return false;
            }
        }

        if self.author_id.is_some() && self.author_id != knowledge.author_id {
            return false;
        }

        if self.status.is_some_and(|status| status != knowledge.status) {
            return false;
        }

        if !self.tag_ids.is_empty()
            && !attached_tag_ids.iter().any(|id| self.tag_ids.contains(id))
        {
            return false;
        }

        true
    }
}

/// Builds an `ILIKE` substring pattern with `%`, `_`, and `\` escaped
pub fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Result ordering shared by both stores: newest first, then by ID
pub fn compare_newest_first(a: &Knowledge, b: &Knowledge) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| a.id.cmp(&b.id))
}
