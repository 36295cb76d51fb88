//! Release model and database operations
//!
//! Releases are versions of a project's code. The latest release of a project
//! is the one with the greatest `date_added`; equal timestamps are broken by
//! the greater release id.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE releases (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
//!     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
//!     version VARCHAR(250) NOT NULL,
//!     date_added TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     UNIQUE (project_id, version)
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::cmp::Ordering;
use uuid::Uuid;

/// A version of a project
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::FromRow)]
pub struct Release {
    /// Unique release ID (UUID v4)
    pub id: Uuid,

    /// Owning organization
    pub organization_id: Uuid,

    /// Project the release belongs to
    pub project_id: Uuid,

    /// Version string, unique within the project
    pub version: String,

    /// When the release was recorded
    pub date_added: DateTime<Utc>,
}

impl Release {
    /// Recency ordering: later `date_added` first is `Greater`, ties by id
    pub fn cmp_recency(&self, other: &Release) -> Ordering {
        self.date_added
            .cmp(&other.date_added)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Input for creating a new release
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRelease {
    /// Owning organization
    pub organization_id: Uuid,

    /// Project the release belongs to
    pub project_id: Uuid,

    /// Version string
    pub version: String,

    /// Explicit timestamp (defaults to now)
    #[serde(default)]
    pub date_added: Option<DateTime<Utc>>,
}

impl Release {
    /// Creates a new release
    ///
    /// # Errors
    ///
    /// Returns an error if the version already exists for the project, the
    /// project doesn't exist, or the database connection fails
    pub async fn create(pool: &PgPool, data: CreateRelease) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Release>(
            r#"
            INSERT INTO releases (organization_id, project_id, version, date_added)
            VALUES ($1, $2, $3, COALESCE($4, NOW()))
            RETURNING id, organization_id, project_id, version, date_added
            "#,
        )
        .bind(data.organization_id)
        .bind(data.project_id)
        .bind(data.version)
        .bind(data.date_added)
        .fetch_one(pool)
        .await
    }

    /// Deletes a release together with its deploys
    ///
    /// # Returns
    ///
    /// True if the release was deleted, false if it didn't exist
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM releases WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Returns the latest release of each given project
    ///
    /// Projects without releases contribute nothing. Uses `DISTINCT ON` so
    /// the whole batch is a single query.
    pub async fn latest_for_projects(
        pool: &PgPool,
        project_ids: &[Uuid],
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Release>(
            r#"
            SELECT DISTINCT ON (project_id) id, organization_id, project_id, version, date_added
            FROM releases
            WHERE project_id = ANY($1)
            ORDER BY project_id, date_added DESC, id DESC
            "#,
        )
        .bind(project_ids)
        .fetch_all(pool)
        .await
    }
}
