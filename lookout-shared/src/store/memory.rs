//! In-memory store
//!
//! Mirrors the PostgreSQL schema closely enough for serializers to behave the
//! same on both backends: unique constraints raise `Conflict`, dangling
//! references raise `NotFound`, deletes cascade like the foreign keys do.
//!
//! Useful for:
//! - Testing serializers and handlers without a database
//! - Demos and local exploration

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::Store;
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

#[derive(Debug, Default)]
struct State {
    users: HashMap<Uuid, User>,
    organizations: HashMap<Uuid, Organization>,
    teams: HashMap<Uuid, Team>,
    members: HashMap<(Uuid, Uuid), OrganizationMember>,
    team_members: HashSet<(Uuid, Uuid)>,
    projects: HashMap<Uuid, Project>,
    project_teams: HashSet<(Uuid, Uuid)>,
    releases: HashMap<Uuid, Release>,
    environments: HashMap<Uuid, Environment>,
    environment_projects: HashMap<(Uuid, Uuid), EnvironmentProject>,
    deploys: HashMap<Uuid, Deploy>,
    release_project_environments: HashMap<(Uuid, Uuid, Uuid), ReleaseProjectEnvironment>,
}

impl State {
    fn require_user(&self, id: Uuid) -> StoreResult<&User> {
        self.users.get(&id).ok_or_else(|| StoreError::not_found("user", id))
    }

    fn require_organization(&self, id: Uuid) -> StoreResult<&Organization> {
        self.organizations
            .get(&id)
            .ok_or_else(|| StoreError::not_found("organization", id))
    }

    fn require_team(&self, id: Uuid) -> StoreResult<&Team> {
        self.teams.get(&id).ok_or_else(|| StoreError::not_found("team", id))
    }

    fn require_project(&self, id: Uuid) -> StoreResult<&Project> {
        self.projects.get(&id).ok_or_else(|| StoreError::not_found("project", id))
    }

    fn require_release(&self, id: Uuid) -> StoreResult<&Release> {
        self.releases.get(&id).ok_or_else(|| StoreError::not_found("release", id))
    }

    fn require_environment(&self, id: Uuid) -> StoreResult<&Environment> {
        self.environments
            .get(&id)
            .ok_or_else(|| StoreError::not_found("environment", id))
    }

    fn is_visible_environment(&self, environment_id: Uuid, project_id: Uuid) -> Option<&str> {
        let link = self.environment_projects.get(&(environment_id, project_id))?;
        let environment = self.environments.get(&environment_id)?;
        if link.is_visible() && !environment.name.is_empty() {
            Some(environment.name.as_str())
        } else {
            None
        }
    }

    fn remove_deploys(&mut self, deploy_ids: &HashSet<Uuid>) {
        self.deploys.retain(|id, _| !deploy_ids.contains(id));
        for rpe in self.release_project_environments.values_mut() {
            if rpe.last_deploy_id.is_some_and(|id| deploy_ids.contains(&id)) {
                rpe.last_deploy_id = None;
            }
        }
    }
}

/// Store keeping every row in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        let mut state = self.state.write().await;
        if state.users.values().any(|u| u.username == data.username) {
            return Err(StoreError::Conflict(format!("username {} already exists", data.username)));
        }

        let user = User {
            id: Uuid::new_v4(),
            username: data.username,
            email: data.email,
            date_joined: Utc::now(),
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn create_organization(&self, data: CreateOrganization) -> StoreResult<Organization> {
        let mut state = self.state.write().await;
        if state.organizations.values().any(|o| o.slug == data.slug) {
            return Err(StoreError::Conflict(format!("organization slug {} already exists", data.slug)));
        }

        let organization = Organization {
            id: Uuid::new_v4(),
            slug: data.slug,
            name: data.name,
            allow_joinleave: data.allow_joinleave,
            date_created: Utc::now(),
        };
        state.organizations.insert(organization.id, organization.clone());
        Ok(organization)
    }

    async fn get_organization_by_slug(&self, slug: &str) -> StoreResult<Option<Organization>> {
        let state = self.state.read().await;
        Ok(state.organizations.values().find(|o| o.slug == slug).cloned())
    }

    async fn get_organizations(&self, ids: &[Uuid]) -> StoreResult<Vec<Organization>> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .collect::<HashSet<_>>()
            .into_iter()
            .filter_map(|id| state.organizations.get(id).cloned())
            .collect())
    }

    async fn set_allow_joinleave(
        &self,
        organization_id: Uuid,
        allow_joinleave: bool,
    ) -> StoreResult<Organization> {
        let mut state = self.state.write().await;
        let organization = state
            .organizations
            .get_mut(&organization_id)
            .ok_or_else(|| StoreError::not_found("organization", organization_id))?;
        organization.allow_joinleave = allow_joinleave;
        Ok(organization.clone())
    }

    async fn create_team(&self, data: CreateTeam) -> StoreResult<Team> {
        let mut state = self.state.write().await;
        state.require_organization(data.organization_id)?;
        if state
            .teams
            .values()
            .any(|t| t.organization_id == data.organization_id && t.slug == data.slug)
        {
            return Err(StoreError::Conflict(format!("team slug {} already exists", data.slug)));
        }

        let team = Team {
            id: Uuid::new_v4(),
            organization_id: data.organization_id,
            slug: data.slug,
            name: data.name,
            date_created: Utc::now(),
        };
        state.teams.insert(team.id, team.clone());
        Ok(team)
    }

    async fn create_member(&self, data: CreateMember) -> StoreResult<OrganizationMember> {
        let mut state = self.state.write().await;
        state.require_organization(data.organization_id)?;
        state.require_user(data.user_id)?;

        let key = (data.organization_id, data.user_id);
        if state.members.contains_key(&key) {
            return Err(StoreError::Conflict(format!(
                "user {} is already a member of organization {}",
                data.user_id, data.organization_id
            )));
        }

        let member = OrganizationMember {
            organization_id: data.organization_id,
            user_id: data.user_id,
            role: data.role,
            date_added: Utc::now(),
        };
        state.members.insert(key, member.clone());
        Ok(member)
    }

    async fn get_member(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<OrganizationMember>> {
        let state = self.state.read().await;
        Ok(state.members.get(&(organization_id, user_id)).cloned())
    }

    async fn add_team_member(&self, team_id: Uuid, user_id: Uuid) -> StoreResult<TeamMember> {
        let mut state = self.state.write().await;
        state.require_team(team_id)?;
        state.require_user(user_id)?;

        if !state.team_members.insert((team_id, user_id)) {
            return Err(StoreError::Conflict(format!(
                "user {} is already a member of team {}",
                user_id, team_id
            )));
        }
        Ok(TeamMember { team_id, user_id })
    }

    async fn team_ids_for_user(&self, organization_id: Uuid, user_id: Uuid) -> StoreResult<Vec<Uuid>> {
        let state = self.state.read().await;
        Ok(state
            .team_members
            .iter()
            .filter(|(team_id, member_id)| {
                *member_id == user_id
                    && state
                        .teams
                        .get(team_id)
                        .is_some_and(|t| t.organization_id == organization_id)
            })
            .map(|(team_id, _)| *team_id)
            .collect())
    }

    async fn create_project(&self, data: CreateProject) -> StoreResult<Project> {
        let mut state = self.state.write().await;
        state.require_organization(data.organization_id)?;
        for team_id in &data.team_ids {
            state.require_team(*team_id)?;
        }
        if state
            .projects
            .values()
            .any(|p| p.organization_id == data.organization_id && p.slug == data.slug)
        {
            return Err(StoreError::Conflict(format!("project slug {} already exists", data.slug)));
        }

        let project = Project {
            id: Uuid::new_v4(),
            organization_id: data.organization_id,
            slug: data.slug,
            name: data.name,
            platform: data.platform,
            first_event: data.first_event,
            has_releases: data.has_releases,
            date_created: Utc::now(),
        };
        for team_id in data.team_ids {
            state.project_teams.insert((project.id, team_id));
        }
        state.projects.insert(project.id, project.clone());
        Ok(project)
    }

    async fn get_project_by_slug(&self, organization_id: Uuid, slug: &str) -> StoreResult<Option<Project>> {
        let state = self.state.read().await;
        Ok(state
            .projects
            .values()
            .find(|p| p.organization_id == organization_id && p.slug == slug)
            .cloned())
    }

    async fn list_projects(&self, organization_id: Uuid) -> StoreResult<Vec<Project>> {
        let state = self.state.read().await;
        let mut projects: Vec<Project> = state
            .projects
            .values()
            .filter(|p| p.organization_id == organization_id)
            .cloned()
            .collect();
        projects.sort_by(|a, b| a.slug.cmp(&b.slug));
        Ok(projects)
    }

    async fn set_has_releases(&self, project_id: Uuid, has_releases: bool) -> StoreResult<Project> {
        let mut state = self.state.write().await;
        let project = state
            .projects
            .get_mut(&project_id)
            .ok_or_else(|| StoreError::not_found("project", project_id))?;
        project.has_releases = has_releases;
        Ok(project.clone())
    }

    async fn project_teams(&self, project_ids: &[Uuid]) -> StoreResult<Vec<ProjectTeam>> {
        let state = self.state.read().await;
        let wanted: HashSet<&Uuid> = project_ids.iter().collect();

        let mut rows: Vec<ProjectTeam> = state
            .project_teams
            .iter()
            .filter(|(project_id, _)| wanted.contains(project_id))
            .filter_map(|(project_id, team_id)| {
                state.teams.get(team_id).map(|team| ProjectTeam {
                    project_id: *project_id,
                    team: team.clone(),
                })
            })
            .collect();
        rows.sort_by(|a, b| {
            a.project_id
                .cmp(&b.project_id)
                .then_with(|| a.team.slug.cmp(&b.team.slug))
        });
        Ok(rows)
    }

    async fn create_release(&self, data: CreateRelease) -> StoreResult<Release> {
        let mut state = self.state.write().await;
        state.require_organization(data.organization_id)?;
        state.require_project(data.project_id)?;
        if state
            .releases
            .values()
            .any(|r| r.project_id == data.project_id && r.version == data.version)
        {
            return Err(StoreError::Conflict(format!("release {} already exists", data.version)));
        }

        let release = Release {
            id: Uuid::new_v4(),
            organization_id: data.organization_id,
            project_id: data.project_id,
            version: data.version,
            date_added: data.date_added.unwrap_or_else(Utc::now),
        };
        state.releases.insert(release.id, release.clone());
        Ok(release)
    }

    async fn delete_release(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        if state.releases.remove(&id).is_none() {
            return Ok(false);
        }

        let deploy_ids: HashSet<Uuid> = state
            .deploys
            .values()
            .filter(|d| d.release_id == id)
            .map(|d| d.id)
            .collect();
        state.remove_deploys(&deploy_ids);
        state
            .release_project_environments
            .retain(|(release_id, _, _), _| *release_id != id);

        debug!(release_id = %id, deploys = deploy_ids.len(), "Deleted release");
        Ok(true)
    }

    async fn latest_releases(&self, project_ids: &[Uuid]) -> StoreResult<Vec<Release>> {
        let state = self.state.read().await;
        let wanted: HashSet<&Uuid> = project_ids.iter().collect();

        let mut latest: HashMap<Uuid, &Release> = HashMap::new();
        for release in state.releases.values().filter(|r| wanted.contains(&r.project_id)) {
            latest
                .entry(release.project_id)
                .and_modify(|current| {
                    if release.cmp_recency(*current).is_gt() {
                        *current = release;
                    }
                })
                .or_insert(release);
        }

        Ok(latest.into_values().cloned().collect())
    }

    async fn create_environment(&self, data: CreateEnvironment) -> StoreResult<Environment> {
        let mut state = self.state.write().await;
        state.require_organization(data.organization_id)?;
        if state
            .environments
            .values()
            .any(|e| e.organization_id == data.organization_id && e.name == data.name)
        {
            return Err(StoreError::Conflict(format!("environment {:?} already exists", data.name)));
        }

        let environment = Environment {
            id: Uuid::new_v4(),
            organization_id: data.organization_id,
            name: data.name,
            date_created: Utc::now(),
        };
        state.environments.insert(environment.id, environment.clone());
        Ok(environment)
    }

    async fn add_environment_project(
        &self,
        environment_id: Uuid,
        project_id: Uuid,
        is_hidden: Option<bool>,
    ) -> StoreResult<EnvironmentProject> {
        let mut state = self.state.write().await;
        state.require_environment(environment_id)?;
        state.require_project(project_id)?;

        let link = EnvironmentProject {
            environment_id,
            project_id,
            is_hidden,
        };
        state
            .environment_projects
            .insert((environment_id, project_id), link.clone());
        Ok(link)
    }

    async fn delete_environment(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        if state.environments.remove(&id).is_none() {
            return Ok(false);
        }

        state
            .environment_projects
            .retain(|(environment_id, _), _| *environment_id != id);
        let deploy_ids: HashSet<Uuid> = state
            .deploys
            .values()
            .filter(|d| d.environment_id == id)
            .map(|d| d.id)
            .collect();
        state.remove_deploys(&deploy_ids);
        state
            .release_project_environments
            .retain(|(_, _, environment_id), _| *environment_id != id);

        debug!(environment_id = %id, deploys = deploy_ids.len(), "Deleted environment");
        Ok(true)
    }

    async fn visible_environments(&self, project_ids: &[Uuid]) -> StoreResult<Vec<ProjectEnvironment>> {
        let state = self.state.read().await;
        let wanted: HashSet<&Uuid> = project_ids.iter().collect();

        let mut rows: Vec<ProjectEnvironment> = state
            .environment_projects
            .keys()
            .filter(|(_, project_id)| wanted.contains(project_id))
            .filter_map(|(environment_id, project_id)| {
                state
                    .is_visible_environment(*environment_id, *project_id)
                    .map(|name| ProjectEnvironment {
                        project_id: *project_id,
                        name: name.to_string(),
                    })
            })
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }

    async fn create_deploy(&self, data: CreateDeploy) -> StoreResult<Deploy> {
        let mut state = self.state.write().await;
        state.require_organization(data.organization_id)?;
        state.require_environment(data.environment_id)?;
        state.require_release(data.release_id)?;

        let deploy = Deploy {
            id: Uuid::new_v4(),
            organization_id: data.organization_id,
            environment_id: data.environment_id,
            release_id: data.release_id,
            name: data.name,
            url: data.url,
            date_started: data.date_started,
            date_finished: data.date_finished.unwrap_or_else(Utc::now),
        };
        state.deploys.insert(deploy.id, deploy.clone());
        Ok(deploy)
    }

    async fn create_release_project_environment(
        &self,
        data: CreateReleaseProjectEnvironment,
    ) -> StoreResult<ReleaseProjectEnvironment> {
        let mut state = self.state.write().await;
        state.require_release(data.release_id)?;
        state.require_project(data.project_id)?;
        state.require_environment(data.environment_id)?;
        if let Some(deploy_id) = data.last_deploy_id {
            if !state.deploys.contains_key(&deploy_id) {
                return Err(StoreError::not_found("deploy", deploy_id));
            }
        }

        let key = (data.release_id, data.project_id, data.environment_id);
        let first_seen = state
            .release_project_environments
            .get(&key)
            .map(|existing| existing.first_seen)
            .unwrap_or_else(Utc::now);

        let row = ReleaseProjectEnvironment {
            release_id: data.release_id,
            project_id: data.project_id,
            environment_id: data.environment_id,
            last_deploy_id: data.last_deploy_id,
            first_seen,
        };
        state.release_project_environments.insert(key, row.clone());
        Ok(row)
    }

    async fn latest_deploys(&self, project_ids: &[Uuid]) -> StoreResult<Vec<LatestDeploy>> {
        let state = self.state.read().await;
        let wanted: HashSet<&Uuid> = project_ids.iter().collect();

        // Equal finish times go to the greater deploy id
        let mut latest: HashMap<(Uuid, String), (Uuid, LatestDeploy)> = HashMap::new();
        for rpe in state
            .release_project_environments
            .values()
            .filter(|rpe| wanted.contains(&rpe.project_id))
        {
            let Some(deploy) = rpe.last_deploy_id.and_then(|id| state.deploys.get(&id)) else {
                continue;
            };
            let Some(release) = state.releases.get(&rpe.release_id) else {
                continue;
            };
            let Some(name) = state.is_visible_environment(rpe.environment_id, rpe.project_id) else {
                continue;
            };

            let candidate = LatestDeploy {
                project_id: rpe.project_id,
                environment: name.to_string(),
                date_finished: deploy.date_finished,
                version: release.version.clone(),
            };
            latest
                .entry((rpe.project_id, name.to_string()))
                .and_modify(|(current_id, current)| {
                    if (candidate.date_finished, deploy.id) > (current.date_finished, *current_id) {
                        *current_id = deploy.id;
                        *current = candidate.clone();
                    }
                })
                .or_insert((deploy.id, candidate));
        }

        Ok(latest.into_values().map(|(_, deploy)| deploy).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_duplicate_organization_slug_conflicts() {
        let store = MemoryStore::new();
        store
            .create_organization(CreateOrganization::new("acme", "Acme"))
            .await
            .unwrap();

        let err = store
            .create_organization(CreateOrganization::new("acme", "Other"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_project_requires_existing_team() {
        let store = MemoryStore::new();
        let org = store
            .create_organization(CreateOrganization::new("acme", "Acme"))
            .await
            .unwrap();

        let mut data = CreateProject::new(org.id, "foo", "foo");
        data.team_ids.push(Uuid::new_v4());

        let err = store.create_project(data).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "team", .. }));
    }

    #[tokio::test]
    async fn test_projects_listed_in_byte_order() {
        let store = MemoryStore::new();
        let org = store
            .create_organization(CreateOrganization::new("acme", "Acme"))
            .await
            .unwrap();
        for slug in ["alpha", "_gamma", "Beta"] {
            store
                .create_project(CreateProject::new(org.id, slug, slug))
                .await
                .unwrap();
        }

        let slugs: Vec<String> = store
            .list_projects(org.id)
            .await
            .unwrap()
            .into_iter()
            .map(|project| project.slug)
            .collect();
        assert_eq!(slugs, vec!["Beta", "_gamma", "alpha"]);
    }

    #[tokio::test]
    async fn test_set_allow_joinleave_unknown_organization() {
        let store = MemoryStore::new();
        let err = store.set_allow_joinleave(Uuid::new_v4(), false).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "organization", .. }));
    }

    #[tokio::test]
    async fn test_team_ids_scoped_to_organization() {
        let store = MemoryStore::new();
        let user = store.create_user(CreateUser::named("foo")).await.unwrap();
        let acme = store
            .create_organization(CreateOrganization::new("acme", "Acme"))
            .await
            .unwrap();
        let other = store
            .create_organization(CreateOrganization::new("other", "Other"))
            .await
            .unwrap();
        let acme_team = store
            .create_team(CreateTeam {
                organization_id: acme.id,
                slug: "core".to_string(),
                name: "Core".to_string(),
            })
            .await
            .unwrap();
        let other_team = store
            .create_team(CreateTeam {
                organization_id: other.id,
                slug: "core".to_string(),
                name: "Core".to_string(),
            })
            .await
            .unwrap();

        store.add_team_member(acme_team.id, user.id).await.unwrap();
        store.add_team_member(other_team.id, user.id).await.unwrap();

        assert_eq!(store.team_ids_for_user(acme.id, user.id).await.unwrap(), vec![acme_team.id]);
        assert_eq!(store.team_ids_for_user(other.id, user.id).await.unwrap(), vec![other_team.id]);
    }
}
