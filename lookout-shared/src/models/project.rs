//! Project model and database operations
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE projects (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
//!     slug VARCHAR(50) NOT NULL,
//!     name VARCHAR(200) NOT NULL,
//!     platform VARCHAR(64),
//!     first_event TIMESTAMPTZ,
//!     has_releases BOOLEAN NOT NULL DEFAULT FALSE,
//!     date_created TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     UNIQUE (organization_id, slug)
//! );
//! ```
//!
//! # Example
//!
//! ```no_run
//! use lookout_shared::models::project::{CreateProject, Project};
//! use sqlx::PgPool;
//! use uuid::Uuid;
//!
//! # async fn example(pool: PgPool, organization_id: Uuid, team_id: Uuid) -> Result<(), sqlx::Error> {
//! let mut data = CreateProject::new(organization_id, "backend", "Backend");
//! data.team_ids.push(team_id);
//!
//! let project = Project::create(&pool, data).await?;
//! Project::set_has_releases(&pool, project.id, true).await?;
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Project belonging to an organization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    /// Unique project ID (UUID v4)
    pub id: Uuid,

    /// Owning organization
    pub organization_id: Uuid,

    /// URL-safe identifier, unique within the organization
    pub slug: String,

    /// Display name
    pub name: String,

    /// Platform identifier (e.g. "rust", "python")
    pub platform: Option<String>,

    /// When the first event was received (None until then)
    pub first_event: Option<DateTime<Utc>>,

    /// Whether releases have been reported for this project
    pub has_releases: bool,

    /// When the project was created
    pub date_created: DateTime<Utc>,
}

impl Project {
    /// Feature names enabled for this project
    pub fn features(&self) -> Vec<String> {
        let mut features = Vec::new();
        if self.has_releases {
            features.push("releases".to_string());
        }
        features
    }
}

/// Input for creating a new project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProject {
    /// Owning organization
    pub organization_id: Uuid,

    /// URL-safe identifier
    pub slug: String,

    /// Display name
    pub name: String,

    /// Platform identifier
    #[serde(default)]
    pub platform: Option<String>,

    /// First event timestamp
    #[serde(default)]
    pub first_event: Option<DateTime<Utc>>,

    /// Releases flag
    #[serde(default)]
    pub has_releases: bool,

    /// Teams to associate the project with
    #[serde(default)]
    pub team_ids: Vec<Uuid>,
}

impl CreateProject {
    /// Builds input with no teams, platform or flags
    pub fn new(organization_id: Uuid, slug: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            organization_id,
            slug: slug.into(),
            name: name.into(),
            platform: None,
            first_event: None,
            has_releases: false,
            team_ids: Vec::new(),
        }
    }
}

impl Project {
    /// Creates a project and associates it with its teams in one transaction
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The slug is already used in the organization
    /// - The organization or a team doesn't exist
    /// - Database connection fails
    pub async fn create(pool: &PgPool, data: CreateProject) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (organization_id, slug, name, platform, first_event, has_releases)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, organization_id, slug, name, platform, first_event, has_releases, date_created
            "#,
        )
        .bind(data.organization_id)
        .bind(&data.slug)
        .bind(&data.name)
        .bind(&data.platform)
        .bind(data.first_event)
        .bind(data.has_releases)
        .fetch_one(&mut *tx)
        .await?;

        for team_id in &data.team_ids {
            sqlx::query("INSERT INTO project_teams (project_id, team_id) VALUES ($1, $2)")
                .bind(project.id)
                .bind(team_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(project)
    }

    /// Finds a project by organization and slug
    pub async fn find_by_slug(
        pool: &PgPool,
        organization_id: Uuid,
        slug: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            SELECT id, organization_id, slug, name, platform, first_event, has_releases, date_created
            FROM projects
            WHERE organization_id = $1 AND slug = $2
            "#,
        )
        .bind(organization_id)
        .bind(slug)
        .fetch_optional(pool)
        .await
    }

    /// Lists the projects of an organization ordered by slug (byte order)
    pub async fn list_by_organization(
        pool: &PgPool,
        organization_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            SELECT id, organization_id, slug, name, platform, first_event, has_releases, date_created
            FROM projects
            WHERE organization_id = $1
            ORDER BY slug COLLATE "C" ASC
            "#,
        )
        .bind(organization_id)
        .fetch_all(pool)
        .await
    }

    /// Sets the releases flag
    ///
    /// # Returns
    ///
    /// The updated project, or None if it doesn't exist
    pub async fn set_has_releases(
        pool: &PgPool,
        id: Uuid,
        has_releases: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET has_releases = $2
            WHERE id = $1
            RETURNING id, organization_id, slug, name, platform, first_event, has_releases, date_created
            "#,
        )
        .bind(id)
        .bind(has_releases)
        .fetch_optional(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(has_releases: bool) -> Project {
        Project {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            slug: "foo".to_string(),
            name: "foo".to_string(),
            platform: None,
            first_event: None,
            has_releases,
            date_created: Utc::now(),
        }
    }

    #[test]
    fn test_features_include_releases_when_flagged() {
        assert_eq!(project(true).features(), vec!["releases".to_string()]);
        assert!(project(false).features().is_empty());
    }

    #[test]
    fn test_create_project_new() {
        let org = Uuid::new_v4();
        let data = CreateProject::new(org, "foo", "Foo");
        assert_eq!(data.organization_id, org);
        assert!(data.team_ids.is_empty());
        assert!(!data.has_releases);
    }
}
