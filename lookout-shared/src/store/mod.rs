//! Persistence layer
//!
//! Serializers never talk to the database directly: they go through the
//! [`Store`] trait, which has two implementations.
//!
//! - [`PgStore`]: PostgreSQL through `sqlx`, delegating to the model SQL
//! - [`MemoryStore`]: in-process maps behind a lock, for tests and demos
//!
//! # Contract
//!
//! Batch reads (`project_teams`, `latest_releases`, `visible_environments`,
//! `latest_deploys`) take a slice of project ids and return rows for those
//! projects only, in no particular order unless stated. An empty slice
//! returns an empty vector.
//!
//! # Example
//!
//! ```
//! use lookout_shared::store::{MemoryStore, Store};
//! use lookout_shared::models::organization::CreateOrganization;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryStore::new();
//! let org = store.create_organization(CreateOrganization::new("acme", "Acme")).await?;
//! assert!(store.get_organization_by_slug("acme").await?.is_some());
//! # Ok(())
//! # }
//! ```

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreResult;
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

/// Persistence backend used by serializers and API handlers
#[async_trait]
pub trait Store: Send + Sync {
    /// Backend name for logs and health output
    fn backend(&self) -> &'static str;

    /// Verifies the backend is reachable
    async fn ping(&self) -> StoreResult<()>;

    // Users

    async fn create_user(&self, data: CreateUser) -> StoreResult<User>;

    // Organizations

    async fn create_organization(&self, data: CreateOrganization) -> StoreResult<Organization>;

    async fn get_organization_by_slug(&self, slug: &str) -> StoreResult<Option<Organization>>;

    /// Loads several organizations; missing ids are skipped
    async fn get_organizations(&self, ids: &[Uuid]) -> StoreResult<Vec<Organization>>;

    /// Updates the join-leave flag, failing with `NotFound` for unknown ids
    async fn set_allow_joinleave(
        &self,
        organization_id: Uuid,
        allow_joinleave: bool,
    ) -> StoreResult<Organization>;

    // Teams and memberships

    async fn create_team(&self, data: CreateTeam) -> StoreResult<Team>;

    async fn create_member(&self, data: CreateMember) -> StoreResult<OrganizationMember>;

    async fn get_member(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<OrganizationMember>>;

    async fn add_team_member(&self, team_id: Uuid, user_id: Uuid) -> StoreResult<TeamMember>;

    /// Teams of the organization the user belongs to
    async fn team_ids_for_user(&self, organization_id: Uuid, user_id: Uuid) -> StoreResult<Vec<Uuid>>;

    // Projects

    async fn create_project(&self, data: CreateProject) -> StoreResult<Project>;

    async fn get_project_by_slug(&self, organization_id: Uuid, slug: &str) -> StoreResult<Option<Project>>;

    /// Projects of an organization ordered by slug
    async fn list_projects(&self, organization_id: Uuid) -> StoreResult<Vec<Project>>;

    async fn set_has_releases(&self, project_id: Uuid, has_releases: bool) -> StoreResult<Project>;

    /// Teams of each project, ordered by project then team slug
    async fn project_teams(&self, project_ids: &[Uuid]) -> StoreResult<Vec<ProjectTeam>>;

    // Releases

    async fn create_release(&self, data: CreateRelease) -> StoreResult<Release>;

    /// Deletes a release and everything recorded against it
    async fn delete_release(&self, id: Uuid) -> StoreResult<bool>;

    /// Latest release of each project that has at least one
    async fn latest_releases(&self, project_ids: &[Uuid]) -> StoreResult<Vec<Release>>;

    // Environments and deploys

    async fn create_environment(&self, data: CreateEnvironment) -> StoreResult<Environment>;

    async fn add_environment_project(
        &self,
        environment_id: Uuid,
        project_id: Uuid,
        is_hidden: Option<bool>,
    ) -> StoreResult<EnvironmentProject>;

    /// Deletes an environment with its project links and deploys
    async fn delete_environment(&self, id: Uuid) -> StoreResult<bool>;

    /// Visible, non-empty environment names per project, ordered by name
    async fn visible_environments(&self, project_ids: &[Uuid]) -> StoreResult<Vec<ProjectEnvironment>>;

    async fn create_deploy(&self, data: CreateDeploy) -> StoreResult<Deploy>;

    async fn create_release_project_environment(
        &self,
        data: CreateReleaseProjectEnvironment,
    ) -> StoreResult<ReleaseProjectEnvironment>;

    /// Latest deploy per (project, visible environment)
    async fn latest_deploys(&self, project_ids: &[Uuid]) -> StoreResult<Vec<LatestDeploy>>;
}
