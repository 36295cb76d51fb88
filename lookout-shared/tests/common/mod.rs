//! Fixture factory shared by the integration suites
//!
//! Works against any [`Store`], so the same scenarios run on the in-memory
//! backend and, when `DATABASE_URL` is set, on PostgreSQL.

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use lookout_shared::db::migrations::{ensure_database_exists, run_migrations};
use lookout_shared::db::pool::{create_pool, DatabaseConfig};
use lookout_shared::models::{
    deploy::{CreateDeploy, CreateReleaseProjectEnvironment, Deploy},
    environment::{CreateEnvironment, Environment},
    membership::{CreateMember, MemberRole, OrganizationMember},
    organization::{CreateOrganization, Organization},
    project::{CreateProject, Project},
    release::{CreateRelease, Release},
    team::{CreateTeam, Team},
    user::{CreateUser, User},
};
use lookout_shared::store::{PgStore, Store};
use uuid::Uuid;

/// Short random suffix keeping slugs unique across runs on a shared database
pub fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, &Uuid::new_v4().simple().to_string()[..8])
}

/// Connects to `DATABASE_URL` and migrates, or returns `None` when unset
pub async fn pg_store() -> Option<PgStore> {
    let url = std::env::var("DATABASE_URL").ok()?;
    ensure_database_exists(&url)
        .await
        .expect("Failed to create test database");
    let pool = create_pool(DatabaseConfig {
        url,
        max_connections: 2,
        ..Default::default()
    })
    .await
    .expect("Failed to connect to DATABASE_URL");
    run_migrations(&pool).await.expect("Failed to run migrations");
    Some(PgStore::new(pool))
}

pub struct Fixtures<'a> {
    pub store: &'a dyn Store,
}

impl<'a> Fixtures<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    pub async fn create_user(&self, username: &str) -> User {
        self.store
            .create_user(CreateUser::named(unique(username)))
            .await
            .expect("Failed to create user")
    }

    /// Creates an organization owned by `owner`
    pub async fn create_organization(&self, owner: &User) -> Organization {
        let slug = unique("org");
        let organization = self
            .store
            .create_organization(CreateOrganization::new(slug.clone(), slug))
            .await
            .expect("Failed to create organization");
        self.create_member(&organization, owner, MemberRole::Owner).await;
        organization
    }

    pub async fn create_member(
        &self,
        organization: &Organization,
        user: &User,
        role: MemberRole,
    ) -> OrganizationMember {
        self.store
            .create_member(CreateMember {
                organization_id: organization.id,
                user_id: user.id,
                role,
            })
            .await
            .expect("Failed to create member")
    }

    pub async fn create_team(&self, organization: &Organization, slug: &str) -> Team {
        self.store
            .create_team(CreateTeam {
                organization_id: organization.id,
                slug: slug.to_string(),
                name: slug.to_string(),
            })
            .await
            .expect("Failed to create team")
    }

    pub async fn add_team_member(&self, team: &Team, user: &User) {
        self.store
            .add_team_member(team.id, user.id)
            .await
            .expect("Failed to add team member");
    }

    pub async fn create_project(&self, organization: &Organization, teams: &[&Team], name: &str) -> Project {
        let mut data = CreateProject::new(organization.id, unique(name), name);
        data.platform = Some("rust".to_string());
        data.team_ids = teams.iter().map(|team| team.id).collect();

        self.store
            .create_project(data)
            .await
            .expect("Failed to create project")
    }

    pub async fn create_release(&self, project: &Project, date_added: Option<DateTime<Utc>>) -> Release {
        self.store
            .create_release(CreateRelease {
                organization_id: project.organization_id,
                project_id: project.id,
                version: unique("1.0"),
                date_added,
            })
            .await
            .expect("Failed to create release")
    }

    pub async fn create_environment(&self, organization: &Organization, name: &str) -> Environment {
        self.store
            .create_environment(CreateEnvironment {
                organization_id: organization.id,
                name: name.to_string(),
            })
            .await
            .expect("Failed to create environment")
    }

    pub async fn add_environment_project(
        &self,
        environment: &Environment,
        project: &Project,
        is_hidden: Option<bool>,
    ) {
        self.store
            .add_environment_project(environment.id, project.id, is_hidden)
            .await
            .expect("Failed to link environment");
    }

    /// Records a finished deploy and points the release/project/environment
    /// record at it
    pub async fn create_deploy(
        &self,
        release: &Release,
        environment: &Environment,
        date_finished: DateTime<Utc>,
    ) -> Deploy {
        let deploy = self
            .store
            .create_deploy(CreateDeploy {
                organization_id: release.organization_id,
                environment_id: environment.id,
                release_id: release.id,
                name: None,
                url: None,
                date_started: None,
                date_finished: Some(date_finished),
            })
            .await
            .expect("Failed to create deploy");

        self.store
            .create_release_project_environment(CreateReleaseProjectEnvironment {
                release_id: release.id,
                project_id: release.project_id,
                environment_id: environment.id,
                last_deploy_id: Some(deploy.id),
            })
            .await
            .expect("Failed to record deploy");

        deploy
    }
}
