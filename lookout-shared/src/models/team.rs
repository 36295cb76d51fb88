//! Team model and database operations
//!
//! Teams group organization members. Projects are associated with zero or
//! more teams through the `project_teams` join table.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE teams (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
//!     slug VARCHAR(50) NOT NULL,
//!     name VARCHAR(64) NOT NULL,
//!     date_created TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     UNIQUE (organization_id, slug)
//! );
//!
//! CREATE TABLE project_teams (
//!     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
//!     team_id UUID NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
//!     PRIMARY KEY (project_id, team_id)
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Team within an organization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Team {
    /// Unique team ID (UUID v4)
    pub id: Uuid,

    /// Owning organization
    pub organization_id: Uuid,

    /// URL-safe identifier, unique within the organization
    pub slug: String,

    /// Display name
    pub name: String,

    /// When the team was created
    pub date_created: DateTime<Utc>,
}

/// Input for creating a new team
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTeam {
    /// Owning organization
    pub organization_id: Uuid,

    /// URL-safe identifier
    pub slug: String,

    /// Display name
    pub name: String,
}

/// A team together with the project it is associated with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectTeam {
    /// Project the team is attached to
    pub project_id: Uuid,

    #[sqlx(flatten)]
    #[serde(flatten)]
    pub team: Team,
}

impl Team {
    /// Creates a new team
    pub async fn create(pool: &PgPool, data: CreateTeam) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Team>(
            r#"
            INSERT INTO teams (organization_id, slug, name)
            VALUES ($1, $2, $3)
            RETURNING id, organization_id, slug, name, date_created
            "#,
        )
        .bind(data.organization_id)
        .bind(data.slug)
        .bind(data.name)
        .fetch_one(pool)
        .await
    }

    /// Lists the teams of each given project, ordered by project then team slug
    pub async fn list_for_projects(
        pool: &PgPool,
        project_ids: &[Uuid],
    ) -> Result<Vec<ProjectTeam>, sqlx::Error> {
        sqlx::query_as::<_, ProjectTeam>(
            r#"
            SELECT pt.project_id, t.id, t.organization_id, t.slug, t.name, t.date_created
            FROM project_teams pt
            JOIN teams t ON t.id = pt.team_id
            WHERE pt.project_id = ANY($1)
            ORDER BY pt.project_id, t.slug COLLATE "C"
            "#,
        )
        .bind(project_ids)
        .fetch_all(pool)
        .await
    }
}
