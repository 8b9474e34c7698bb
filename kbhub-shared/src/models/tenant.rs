/// Tenant model
///
/// A tenant is the isolation root of the knowledge hub: every user, knowledge
/// article, tag, and comment carries the `tenant_id` of exactly one tenant.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tenants (
///     id UUID PRIMARY KEY,
///     name TEXT NOT NULL,
///     domain TEXT NOT NULL,
///     settings JSONB NOT NULL DEFAULT '{}',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT tenants_domain_key UNIQUE (domain)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tenant (organization) owning a knowledge base
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Globally unique domain, e.g. `acme.test`
    pub domain: String,

    /// Presentation and feature switches
    pub settings: TenantSettings,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-tenant settings, stored as one JSONB document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantSettings {
    #[serde(default)]
    pub theme: Theme,

    #[serde(default)]
    pub features: Features,
}

/// Tenant color scheme
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    #[serde(default)]
    pub primary_color: String,

    #[serde(default)]
    pub secondary_color: String,
}

/// Feature switches
///
/// New tenants start with every feature enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Features {
    #[serde(default)]
    pub comments: bool,

    #[serde(default)]
    pub tags: bool,

    #[serde(default)]
    pub ratings: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            comments: true,
            tags: true,
            ratings: true,
        }
    }
}

impl TenantSettings {
    /// Settings for a freshly created tenant: the given theme, all features on
    pub fn with_theme(theme: Theme) -> Self {
        Self {
            theme,
            features: Features::default(),
        }
    }
}
