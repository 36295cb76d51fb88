//! Organization model and database operations
//!
//! Organizations own teams, projects, environments and releases. The
//! `allow_joinleave` flag decides whether any organization member can access
//! every project, or only members of a team associated with the project.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE organizations (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     slug VARCHAR(50) NOT NULL UNIQUE,
//!     name VARCHAR(64) NOT NULL,
//!     allow_joinleave BOOLEAN NOT NULL DEFAULT TRUE,
//!     date_created TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```
//!
//! # Example
//!
//! ```no_run
//! use lookout_shared::models::organization::{CreateOrganization, Organization};
//! use lookout_shared::db::pool::{create_pool, DatabaseConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool(DatabaseConfig::default()).await?;
//!
//! let org = Organization::create(&pool, CreateOrganization::new("acme", "Acme Corp")).await?;
//!
//! // Require explicit team membership for project access
//! Organization::set_allow_joinleave(&pool, org.id, false).await?;
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Organization owning projects and teams
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Organization {
    /// Unique organization ID (UUID v4)
    pub id: Uuid,

    /// URL-safe identifier, unique across organizations
    pub slug: String,

    /// Display name
    pub name: String,

    /// Open membership: any member may access any project
    ///
    /// When false, project access requires membership of one of the
    /// project's teams (global roles excepted).
    pub allow_joinleave: bool,

    /// When the organization was created
    pub date_created: DateTime<Utc>,
}

/// Input for creating a new organization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrganization {
    /// URL-safe identifier
    pub slug: String,

    /// Display name
    pub name: String,

    /// Open membership flag (defaults to true)
    #[serde(default = "default_allow_joinleave")]
    pub allow_joinleave: bool,
}

fn default_allow_joinleave() -> bool {
    true
}

impl CreateOrganization {
    /// Builds input with open membership enabled
    pub fn new(slug: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            name: name.into(),
            allow_joinleave: default_allow_joinleave(),
        }
    }
}

impl Organization {
    /// Creates a new organization
    ///
    /// # Errors
    ///
    /// Returns an error if the slug is taken or the database connection fails
    pub async fn create(pool: &PgPool, data: CreateOrganization) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Organization>(
            r#"
            INSERT INTO organizations (slug, name, allow_joinleave)
            VALUES ($1, $2, $3)
            RETURNING id, slug, name, allow_joinleave, date_created
            "#,
        )
        .bind(data.slug)
        .bind(data.name)
        .bind(data.allow_joinleave)
        .fetch_one(pool)
        .await
    }

    /// Finds an organization by slug
    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Organization>(
            r#"
            SELECT id, slug, name, allow_joinleave, date_created
            FROM organizations
            WHERE slug = $1
            "#,
        )
        .bind(slug)
        .fetch_optional(pool)
        .await
    }

    /// Loads several organizations at once
    pub async fn find_many(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Organization>(
            r#"
            SELECT id, slug, name, allow_joinleave, date_created
            FROM organizations
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(pool)
        .await
    }

    /// Updates the open membership flag
    ///
    /// # Returns
    ///
    /// The updated organization, or None if it doesn't exist
    pub async fn set_allow_joinleave(
        pool: &PgPool,
        id: Uuid,
        allow_joinleave: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Organization>(
            r#"
            UPDATE organizations
            SET allow_joinleave = $2
            WHERE id = $1
            RETURNING id, slug, name, allow_joinleave, date_created
            "#,
        )
        .bind(id)
        .bind(allow_joinleave)
        .fetch_optional(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_organization_defaults_to_open_membership() {
        let data = CreateOrganization::new("acme", "Acme");
        assert!(data.allow_joinleave);

        let parsed: CreateOrganization =
            serde_json::from_str(r#"{"slug": "acme", "name": "Acme"}"#).unwrap();
        assert!(parsed.allow_joinleave);
    }
}
