/// Knowledge article model
///
/// A knowledge article belongs to one tenant, optionally records its author,
/// carries a set of tags (many-to-many through `knowledge_tags`) and owns its
/// comments.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE knowledge (
///     id UUID PRIMARY KEY,
///     tenant_id UUID NOT NULL REFERENCES tenants (id),
///     author_id UUID REFERENCES users (id),
///     title TEXT NOT NULL,
///     content TEXT NOT NULL,
///     status TEXT NOT NULL DEFAULT 'draft',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE knowledge_tags (
///     knowledge_id UUID NOT NULL REFERENCES knowledge (id),
///     tag_id UUID NOT NULL REFERENCES tags (id),
///     PRIMARY KEY (knowledge_id, tag_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{comment::Comment, tag::Tag};

/// Publication status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KnowledgeStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

impl KnowledgeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            KnowledgeStatus::Draft => "draft",
            KnowledgeStatus::Published => "published",
            KnowledgeStatus::Archived => "archived",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(KnowledgeStatus::Draft),
            "published" => Some(KnowledgeStatus::Published),
            "archived" => Some(KnowledgeStatus::Archived),
            _ => None,
        }
    }
}

/// Knowledge article with its tags and comments attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Knowledge {
    pub id: Uuid,
    pub tenant_id: Uuid,

    /// `None` once the author account has been deleted
    pub author_id: Option<Uuid>,

    pub title: String,
    pub content: String,
    pub status: KnowledgeStatus,

    /// Attached tags, ordered by name
    #[serde(default)]
    pub tags: Vec<Tag>,

    /// Comments, newest first
    #[serde(default)]
    pub comments: Vec<Comment>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Knowledge {
    /// IDs of the attached tags
    pub fn tag_ids(&self) -> Vec<Uuid> {
        self.tags.iter().map(|t| t.id).collect()
    }

    /// Whether `tag_id` is attached
    pub fn has_tag(&self, tag_id: Uuid) -> bool {
        self.tags.iter().any(|t| t.id == tag_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_defaults_to_draft() {
        assert_eq!(KnowledgeStatus::default(), KnowledgeStatus::Draft);
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!(
            KnowledgeStatus::from_str("published"),
            Some(KnowledgeStatus::Published)
        );
        assert_eq!(KnowledgeStatus::from_str("deleted"), None);
        assert_eq!(KnowledgeStatus::Archived.as_str(), "archived");
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&KnowledgeStatus::Published).unwrap();
        assert_eq!(json, "\"published\"");
    }
}
