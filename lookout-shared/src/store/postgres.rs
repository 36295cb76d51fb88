//! PostgreSQL store backed by the model SQL
//!
//! # Example
//!
//! ```no_run
//! use lookout_shared::db::pool::{create_pool, DatabaseConfig};
//! use lookout_shared::store::{PgStore, Store};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = create_pool(DatabaseConfig {
//!     url: std::env::var("DATABASE_URL")?,
//!     ..Default::default()
//! })
//! .await?;
//!
//! let store = PgStore::new(pool);
//! store.ping().await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::Store;
use crate::db::pool::health_check;
use crate::error::{StoreError, StoreResult};
use crate::models::{
    deploy::{CreateDeploy, CreateReleaseProjectEnvironment, Deploy, LatestDeploy, ReleaseProjectEnvironment},
    environment::{CreateEnvironment, Environment, EnvironmentProject, ProjectEnvironment},
    membership::{CreateMember, OrganizationMember, TeamMember},
    organization::{CreateOrganization, Organization},
    project::{CreateProject, Project},
    release::{CreateRelease, Release},
    team::{CreateTeam, ProjectTeam, Team},
    user::{CreateUser, User},
};

/// Store over a PostgreSQL connection pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wraps an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(health_check(&self.pool).await?)
    }

    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        Ok(User::create(&self.pool, data).await?)
    }

    async fn create_organization(&self, data: CreateOrganization) -> StoreResult<Organization> {
        Ok(Organization::create(&self.pool, data).await?)
    }

    async fn get_organization_by_slug(&self, slug: &str) -> StoreResult<Option<Organization>> {
        Ok(Organization::find_by_slug(&self.pool, slug).await?)
    }

    async fn get_organizations(&self, ids: &[Uuid]) -> StoreResult<Vec<Organization>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(Organization::find_many(&self.pool, ids).await?)
    }

    async fn set_allow_joinleave(
        &self,
        organization_id: Uuid,
        allow_joinleave: bool,
    ) -> StoreResult<Organization> {
        Organization::set_allow_joinleave(&self.pool, organization_id, allow_joinleave)
            .await?
            .ok_or_else(|| StoreError::not_found("organization", organization_id))
    }

    async fn create_team(&self, data: CreateTeam) -> StoreResult<Team> {
        Ok(Team::create(&self.pool, data).await?)
    }

    async fn create_member(&self, data: CreateMember) -> StoreResult<OrganizationMember> {
        Ok(OrganizationMember::create(&self.pool, data).await?)
    }

    async fn get_member(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<OrganizationMember>> {
        Ok(OrganizationMember::find(&self.pool, organization_id, user_id).await?)
    }

    async fn add_team_member(&self, team_id: Uuid, user_id: Uuid) -> StoreResult<TeamMember> {
        Ok(TeamMember::create(&self.pool, team_id, user_id).await?)
    }

    async fn team_ids_for_user(&self, organization_id: Uuid, user_id: Uuid) -> StoreResult<Vec<Uuid>> {
        Ok(TeamMember::team_ids_for_user(&self.pool, organization_id, user_id).await?)
    }

    async fn create_project(&self, data: CreateProject) -> StoreResult<Project> {
        Ok(Project::create(&self.pool, data).await?)
    }

    async fn get_project_by_slug(&self, organization_id: Uuid, slug: &str) -> StoreResult<Option<Project>> {
        Ok(Project::find_by_slug(&self.pool, organization_id, slug).await?)
    }

    async fn list_projects(&self, organization_id: Uuid) -> StoreResult<Vec<Project>> {
        Ok(Project::list_by_organization(&self.pool, organization_id).await?)
    }

    async fn set_has_releases(&self, project_id: Uuid, has_releases: bool) -> StoreResult<Project> {
        Project::set_has_releases(&self.pool, project_id, has_releases)
            .await?
            .ok_or_else(|| StoreError::not_found("project", project_id))
    }

    async fn project_teams(&self, project_ids: &[Uuid]) -> StoreResult<Vec<ProjectTeam>> {
        if project_ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(Team::list_for_projects(&self.pool, project_ids).await?)
    }

    async fn create_release(&self, data: CreateRelease) -> StoreResult<Release> {
        Ok(Release::create(&self.pool, data).await?)
    }

    async fn delete_release(&self, id: Uuid) -> StoreResult<bool> {
        Ok(Release::delete(&self.pool, id).await?)
    }

    async fn latest_releases(&self, project_ids: &[Uuid]) -> StoreResult<Vec<Release>> {
        if project_ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(Release::latest_for_projects(&self.pool, project_ids).await?)
    }

    async fn create_environment(&self, data: CreateEnvironment) -> StoreResult<Environment> {
        Ok(Environment::create(&self.pool, data).await?)
    }

    async fn add_environment_project(
        &self,
        environment_id: Uuid,
        project_id: Uuid,
        is_hidden: Option<bool>,
    ) -> StoreResult<EnvironmentProject> {
        Ok(Environment::add_project(&self.pool, environment_id, project_id, is_hidden).await?)
    }

    async fn delete_environment(&self, id: Uuid) -> StoreResult<bool> {
        Ok(Environment::delete(&self.pool, id).await?)
    }

    async fn visible_environments(&self, project_ids: &[Uuid]) -> StoreResult<Vec<ProjectEnvironment>> {
        if project_ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(Environment::visible_for_projects(&self.pool, project_ids).await?)
    }

    async fn create_deploy(&self, data: CreateDeploy) -> StoreResult<Deploy> {
        Ok(Deploy::create(&self.pool, data).await?)
    }

    async fn create_release_project_environment(
        &self,
        data: CreateReleaseProjectEnvironment,
    ) -> StoreResult<ReleaseProjectEnvironment> {
        Ok(ReleaseProjectEnvironment::create(&self.pool, data).await?)
    }

    async fn latest_deploys(&self, project_ids: &[Uuid]) -> StoreResult<Vec<LatestDeploy>> {
        if project_ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(Deploy::latest_for_projects(&self.pool, project_ids).await?)
    }
}
