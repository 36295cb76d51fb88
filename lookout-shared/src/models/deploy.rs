//! Deploy and release-project-environment models
//!
//! A [`Deploy`] records a release rolled out to an environment. The
//! [`ReleaseProjectEnvironment`] row tracks, per release, project and
//! environment, the last deploy into that environment; project summaries read
//! their `latestDeploys` through it.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE deploys (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
//!     environment_id UUID NOT NULL REFERENCES environments(id) ON DELETE CASCADE,
//!     release_id UUID NOT NULL REFERENCES releases(id) ON DELETE CASCADE,
//!     name VARCHAR(64),
//!     url TEXT,
//!     date_started TIMESTAMPTZ,
//!     date_finished TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//!
//! CREATE TABLE release_project_environments (
//!     release_id UUID NOT NULL REFERENCES releases(id) ON DELETE CASCADE,
//!     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
//!     environment_id UUID NOT NULL REFERENCES environments(id) ON DELETE CASCADE,
//!     last_deploy_id UUID REFERENCES deploys(id) ON DELETE SET NULL,
//!     first_seen TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     PRIMARY KEY (release_id, project_id, environment_id)
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// A release rolled out to an environment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Deploy {
    /// Unique deploy ID (UUID v4)
    pub id: Uuid,

    /// Owning organization
    pub organization_id: Uuid,

    /// Target environment
    pub environment_id: Uuid,

    /// Deployed release
    pub release_id: Uuid,

    /// Optional deploy name
    pub name: Option<String>,

    /// Optional link to the deploy (CI job, dashboard)
    pub url: Option<String>,

    /// When the rollout started
    pub date_started: Option<DateTime<Utc>>,

    /// When the rollout finished
    pub date_finished: DateTime<Utc>,
}

/// Input for recording a deploy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDeploy {
    pub organization_id: Uuid,
    pub environment_id: Uuid,
    pub release_id: Uuid,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub date_started: Option<DateTime<Utc>>,
    /// Defaults to now
    #[serde(default)]
    pub date_finished: Option<DateTime<Utc>>,
}

/// Release seen in an environment for a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReleaseProjectEnvironment {
    pub release_id: Uuid,
    pub project_id: Uuid,
    pub environment_id: Uuid,

    /// Most recent deploy of the release into the environment
    pub last_deploy_id: Option<Uuid>,

    /// When the release was first seen in the environment
    pub first_seen: DateTime<Utc>,
}

/// Input for recording a release in a project environment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReleaseProjectEnvironment {
    pub release_id: Uuid,
    pub project_id: Uuid,
    pub environment_id: Uuid,
    #[serde(default)]
    pub last_deploy_id: Option<Uuid>,
}

/// Most recent deploy of a project into one environment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct LatestDeploy {
    /// Project ID
    pub project_id: Uuid,

    /// Environment name
    pub environment: String,

    /// When the deploy finished
    pub date_finished: DateTime<Utc>,

    /// Version of the deployed release
    pub version: String,
}

impl Deploy {
    /// Records a deploy
    pub async fn create(pool: &PgPool, data: CreateDeploy) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Deploy>(
            r#"
            INSERT INTO deploys (organization_id, environment_id, release_id, name, url, date_started, date_finished)
            VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, NOW()))
            RETURNING id, organization_id, environment_id, release_id, name, url, date_started, date_finished
            "#,
        )
        .bind(data.organization_id)
        .bind(data.environment_id)
        .bind(data.release_id)
        .bind(data.name)
        .bind(data.url)
        .bind(data.date_started)
        .bind(data.date_finished)
        .fetch_one(pool)
        .await
    }

    /// Latest deploy per (project, environment) for the given projects
    ///
    /// Only environments visible on the project with a non-empty name are
    /// considered. Equal finish times go to the greater deploy id.
    pub async fn latest_for_projects(
        pool: &PgPool,
        project_ids: &[Uuid],
    ) -> Result<Vec<LatestDeploy>, sqlx::Error> {
        sqlx::query_as::<_, LatestDeploy>(
            r#"
            SELECT DISTINCT ON (rpe.project_id, e.name)
                rpe.project_id, e.name AS environment, d.date_finished, r.version
            FROM release_project_environments rpe
            JOIN deploys d ON d.id = rpe.last_deploy_id
            JOIN releases r ON r.id = rpe.release_id
            JOIN environments e ON e.id = rpe.environment_id
            JOIN environment_projects ep
              ON ep.environment_id = rpe.environment_id AND ep.project_id = rpe.project_id
            WHERE rpe.project_id = ANY($1)
              AND e.name <> ''
              AND COALESCE(ep.is_hidden, FALSE) = FALSE
            ORDER BY rpe.project_id, e.name, d.date_finished DESC, d.id DESC
            "#,
        )
        .bind(project_ids)
        .fetch_all(pool)
        .await
    }
}

impl ReleaseProjectEnvironment {
    /// Records a release in a project environment
    ///
    /// An existing row keeps its `first_seen` and takes the new `last_deploy_id`.
    pub async fn create(
        pool: &PgPool,
        data: CreateReleaseProjectEnvironment,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ReleaseProjectEnvironment>(
            r#"
            INSERT INTO release_project_environments (release_id, project_id, environment_id, last_deploy_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (release_id, project_id, environment_id)
            DO UPDATE SET last_deploy_id = EXCLUDED.last_deploy_id
            RETURNING release_id, project_id, environment_id, last_deploy_id, first_seen
            "#,
        )
        .bind(data.release_id)
        .bind(data.project_id)
        .bind(data.environment_id)
        .bind(data.last_deploy_id)
        .fetch_one(pool)
        .await
    }
}
