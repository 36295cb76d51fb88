//! Project serializers
//!
//! All project variants share [`load_project_attrs`], which resolves the
//! organization, the teams and the viewer's access flags for a batch of
//! projects with one store call per concern.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::instrument;
use uuid::Uuid;

use super::organization::OrganizationResponse;
use super::{Serializer, Viewer};
use crate::auth::authorization::{project_access, ProjectAccess};
use crate::error::{StoreError, StoreResult};
use crate::models::membership::OrganizationMember;
use crate::models::organization::Organization;
use crate::models::project::Project;
use crate::models::team::Team;
use crate::store::Store;

/// Attributes of one project resolved for a viewer
#[derive(Debug, Clone)]
pub struct ProjectAttrs {
    /// The project's organization
    pub organization: Organization,

    /// Teams of the project ordered by slug
    pub teams: Vec<Team>,

    /// Access flags of the viewer
    pub access: ProjectAccess,
}

/// Viewer context inside one organization
#[derive(Default)]
struct ViewerContext {
    member: Option<OrganizationMember>,
    team_ids: HashSet<Uuid>,
}

/// Loads organization, teams and access flags for a batch of projects
///
/// # Errors
///
/// Returns `StoreError::NotFound` if a project references a missing
/// organization, and propagates other store errors.
#[instrument(skip_all, fields(projects = projects.len()))]
pub async fn load_project_attrs(
    store: &dyn Store,
    projects: &[Project],
    viewer: &Viewer,
) -> StoreResult<HashMap<Uuid, ProjectAttrs>> {
    let mut organization_ids: Vec<Uuid> = projects.iter().map(|p| p.organization_id).collect();
    organization_ids.sort_unstable();
    organization_ids.dedup();

    let organizations: HashMap<Uuid, Organization> = store
        .get_organizations(&organization_ids)
        .await?
        .into_iter()
        .map(|org| (org.id, org))
        .collect();

    let project_ids: Vec<Uuid> = projects.iter().map(|p| p.id).collect();
    let mut teams_by_project: HashMap<Uuid, Vec<Team>> = HashMap::new();
    for project_team in store.project_teams(&project_ids).await? {
        teams_by_project
            .entry(project_team.project_id)
            .or_default()
            .push(project_team.team);
    }

    let mut viewer_contexts: HashMap<Uuid, ViewerContext> = HashMap::new();
    if let Some(user_id) = viewer.user_id() {
        for organization_id in &organization_ids {
            let member = store.get_member(*organization_id, user_id).await?;
            let team_ids = match member {
                Some(_) => store
                    .team_ids_for_user(*organization_id, user_id)
                    .await?
                    .into_iter()
                    .collect(),
                None => HashSet::new(),
            };
            viewer_contexts.insert(*organization_id, ViewerContext { member, team_ids });
        }
    }

    let anonymous = ViewerContext::default();
    let mut attrs = HashMap::with_capacity(projects.len());

    for project in projects {
        let organization = organizations
            .get(&project.organization_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("organization", project.organization_id))?;

        let mut teams = teams_by_project.remove(&project.id).unwrap_or_default();
        teams.sort_by(|a, b| a.slug.cmp(&b.slug));

        let context = viewer_contexts
            .get(&project.organization_id)
            .unwrap_or(&anonymous);
        let team_ids: Vec<Uuid> = teams.iter().map(|team| team.id).collect();
        let access = project_access(
            &organization,
            context.member.as_ref(),
            &context.team_ids,
            &team_ids,
        );

        attrs.insert(
            project.id,
            ProjectAttrs {
                organization,
                teams,
                access,
            },
        );
    }

    Ok(attrs)
}

pub(crate) fn attrs_for<'a>(
    attrs: &'a HashMap<Uuid, ProjectAttrs>,
    project: &Project,
) -> StoreResult<&'a ProjectAttrs> {
    attrs
        .get(&project.id)
        .ok_or_else(|| StoreError::Internal(format!("attributes missing for project {}", project.id)))
}

/// Serialized team reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamSummary {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
}

impl From<&Team> for TeamSummary {
    fn from(team: &Team) -> Self {
        Self {
            id: team.id,
            slug: team.slug.clone(),
            name: team.name.clone(),
        }
    }
}

/// Default serialized project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub platform: Option<String>,
    pub date_created: DateTime<Utc>,
    pub first_event: Option<DateTime<Utc>>,
    pub features: Vec<String>,
    pub is_member: bool,
    pub has_access: bool,
}

impl ProjectResponse {
    pub fn new(project: &Project, access: ProjectAccess) -> Self {
        Self {
            id: project.id,
            slug: project.slug.clone(),
            name: project.name.clone(),
            platform: project.platform.clone(),
            date_created: project.date_created,
            first_event: project.first_event,
            features: project.features(),
            is_member: access.is_member,
            has_access: access.has_access,
        }
    }
}

/// Project with its teams
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectWithTeamResponse {
    #[serde(flatten)]
    pub project: ProjectResponse,

    /// First team by slug, if the project has any
    pub team: Option<TeamSummary>,

    pub teams: Vec<TeamSummary>,
}

/// Project with its organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectWithOrganizationResponse {
    #[serde(flatten)]
    pub project: ProjectResponse,

    pub organization: OrganizationResponse,
}

/// Serializes projects with the default field set
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectSerializer;

#[async_trait]
impl Serializer<Project> for ProjectSerializer {
    type Output = ProjectResponse;

    async fn serialize_many(
        &self,
        store: &dyn Store,
        items: &[Project],
        viewer: &Viewer,
    ) -> StoreResult<Vec<ProjectResponse>> {
        let attrs = load_project_attrs(store, items, viewer).await?;

        items
            .iter()
            .map(|project| Ok(ProjectResponse::new(project, attrs_for(&attrs, project)?.access)))
            .collect()
    }
}

/// Serializes projects with their teams
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectWithTeamSerializer;

#[async_trait]
impl Serializer<Project> for ProjectWithTeamSerializer {
    type Output = ProjectWithTeamResponse;

    async fn serialize_many(
        &self,
        store: &dyn Store,
        items: &[Project],
        viewer: &Viewer,
    ) -> StoreResult<Vec<ProjectWithTeamResponse>> {
        let attrs = load_project_attrs(store, items, viewer).await?;

        items
            .iter()
            .map(|project| {
                let project_attrs = attrs_for(&attrs, project)?;
                let teams: Vec<TeamSummary> =
                    project_attrs.teams.iter().map(TeamSummary::from).collect();

                Ok(ProjectWithTeamResponse {
                    project: ProjectResponse::new(project, project_attrs.access),
                    team: teams.first().cloned(),
                    teams,
                })
            })
            .collect()
    }
}

/// Serializes projects with their organization
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectWithOrganizationSerializer;

#[async_trait]
impl Serializer<Project> for ProjectWithOrganizationSerializer {
    type Output = ProjectWithOrganizationResponse;

    async fn serialize_many(
        &self,
        store: &dyn Store,
        items: &[Project],
        viewer: &Viewer,
    ) -> StoreResult<Vec<ProjectWithOrganizationResponse>> {
        let attrs = load_project_attrs(store, items, viewer).await?;

        items
            .iter()
            .map(|project| {
                let project_attrs = attrs_for(&attrs, project)?;

                Ok(ProjectWithOrganizationResponse {
                    project: ProjectResponse::new(project, project_attrs.access),
                    organization: OrganizationResponse::from(&project_attrs.organization),
                })
            })
            .collect()
    }
}
