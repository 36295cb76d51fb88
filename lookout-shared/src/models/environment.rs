//! Environment model and database operations
//!
//! Environments belong to an organization and are linked to projects through
//! `environment_projects`. A link may be hidden; hidden links and environments
//! with an empty name never show up in project responses.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE environments (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
//!     name VARCHAR(64) NOT NULL,
//!     date_created TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     UNIQUE (organization_id, name)
//! );
//!
//! CREATE TABLE environment_projects (
//!     environment_id UUID NOT NULL REFERENCES environments(id) ON DELETE CASCADE,
//!     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
//!     is_hidden BOOLEAN,
//!     PRIMARY KEY (environment_id, project_id)
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Deployment target (production, staging, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Environment {
    /// Unique environment ID (UUID v4)
    pub id: Uuid,

    /// Owning organization
    pub organization_id: Uuid,

    /// Environment name, unique within the organization (may be empty)
    pub name: String,

    /// When the environment was created
    pub date_created: DateTime<Utc>,
}

/// Input for creating a new environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEnvironment {
    /// Owning organization
    pub organization_id: Uuid,

    /// Environment name
    pub name: String,
}

/// Link between an environment and a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct EnvironmentProject {
    /// Environment ID
    pub environment_id: Uuid,

    /// Project ID
    pub project_id: Uuid,

    /// Hidden links are excluded from responses; None means visible
    pub is_hidden: Option<bool>,
}

impl EnvironmentProject {
    /// Whether the link should be shown
    pub fn is_visible(&self) -> bool {
        !self.is_hidden.unwrap_or(false)
    }
}

/// Visible environment name of a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectEnvironment {
    /// Project ID
    pub project_id: Uuid,

    /// Environment name
    pub name: String,
}

impl Environment {
    /// Creates a new environment
    pub async fn create(pool: &PgPool, data: CreateEnvironment) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Environment>(
            r#"
            INSERT INTO environments (organization_id, name)
            VALUES ($1, $2)
            RETURNING id, organization_id, name, date_created
            "#,
        )
        .bind(data.organization_id)
        .bind(data.name)
        .fetch_one(pool)
        .await
    }

    /// Links the environment to a project
    ///
    /// Linking an already linked project updates the hidden flag.
    pub async fn add_project(
        pool: &PgPool,
        environment_id: Uuid,
        project_id: Uuid,
        is_hidden: Option<bool>,
    ) -> Result<EnvironmentProject, sqlx::Error> {
        sqlx::query_as::<_, EnvironmentProject>(
            r#"
            INSERT INTO environment_projects (environment_id, project_id, is_hidden)
            VALUES ($1, $2, $3)
            ON CONFLICT (environment_id, project_id) DO UPDATE SET is_hidden = EXCLUDED.is_hidden
            RETURNING environment_id, project_id, is_hidden
            "#,
        )
        .bind(environment_id)
        .bind(project_id)
        .bind(is_hidden)
        .fetch_one(pool)
        .await
    }

    /// Deletes an environment with its project links and deploys
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM environments WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Visible, non-empty environment names of each given project, ordered by name
    pub async fn visible_for_projects(
        pool: &PgPool,
        project_ids: &[Uuid],
    ) -> Result<Vec<ProjectEnvironment>, sqlx::Error> {
        sqlx::query_as::<_, ProjectEnvironment>(
            r#"
            SELECT ep.project_id, e.name
            FROM environment_projects ep
            JOIN environments e ON e.id = ep.environment_id
            WHERE ep.project_id = ANY($1)
              AND e.name <> ''
              AND COALESCE(ep.is_hidden, FALSE) = FALSE
            ORDER BY e.name COLLATE "C" ASC
            "#,
        )
        .bind(project_ids)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_project_visibility() {
        let link = |is_hidden| EnvironmentProject {
            environment_id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            is_hidden,
        };

        assert!(link(None).is_visible());
        assert!(link(Some(false)).is_visible());
        assert!(!link(Some(true)).is_visible());
    }
}
