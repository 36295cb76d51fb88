//! Project summary serializer
//!
//! The summary adds release and deploy state to the project fields:
//!
//! - `latestRelease`: `{version}` of the latest release, or `null`
//! - `environments`: visible, non-empty environment names ordered by name
//! - `latestDeploys`: environment name to `{dateFinished, version}` of the
//!   most recent deploy, or `null` when nothing was deployed
//!
//! Each of the three comes from a single store call for the whole batch.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::instrument;
use uuid::Uuid;

use super::project::{attrs_for, load_project_attrs, ProjectResponse, TeamSummary};
use super::releases::bulk_fetch_project_latest_releases;
use super::{Serializer, Viewer};
use crate::error::StoreResult;
use crate::models::project::Project;
use crate::store::Store;

/// Latest deploy of one environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploySummary {
    pub date_finished: DateTime<Utc>,
    pub version: String,
}

/// Latest release of a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseSummary {
    pub version: String,
}

/// Serialized project summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummaryResponse {
    #[serde(flatten)]
    pub project: ProjectResponse,

    pub teams: Vec<TeamSummary>,

    pub latest_deploys: Option<BTreeMap<String, DeploySummary>>,

    pub latest_release: Option<ReleaseSummary>,

    pub environments: Vec<String>,
}

/// Serializes projects with release, deploy and environment state
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectSummarySerializer;

#[async_trait]
impl Serializer<Project> for ProjectSummarySerializer {
    type Output = ProjectSummaryResponse;

    #[instrument(skip_all, fields(projects = items.len()))]
    async fn serialize_many(
        &self,
        store: &dyn Store,
        items: &[Project],
        viewer: &Viewer,
    ) -> StoreResult<Vec<ProjectSummaryResponse>> {
        let attrs = load_project_attrs(store, items, viewer).await?;
        let project_ids: Vec<Uuid> = items.iter().map(|project| project.id).collect();

        let latest_releases: HashMap<Uuid, ReleaseSummary> =
            bulk_fetch_project_latest_releases(store, items)
                .await?
                .into_iter()
                .map(|release| (release.project_id, ReleaseSummary { version: release.version }))
                .collect();

        let mut environments: HashMap<Uuid, Vec<String>> = HashMap::new();
        for environment in store.visible_environments(&project_ids).await? {
            environments
                .entry(environment.project_id)
                .or_default()
                .push(environment.name);
        }

        let mut deploys: HashMap<Uuid, BTreeMap<String, DeploySummary>> = HashMap::new();
        for deploy in store.latest_deploys(&project_ids).await? {
            deploys.entry(deploy.project_id).or_default().insert(
                deploy.environment,
                DeploySummary {
                    date_finished: deploy.date_finished,
                    version: deploy.version,
                },
            );
        }

        items
            .iter()
            .map(|project| {
                let project_attrs = attrs_for(&attrs, project)?;
                let mut project_environments =
                    environments.get(&project.id).cloned().unwrap_or_default();
                project_environments.sort();

                Ok(ProjectSummaryResponse {
                    project: ProjectResponse::new(project, project_attrs.access),
                    teams: project_attrs.teams.iter().map(TeamSummary::from).collect(),
                    latest_deploys: deploys.get(&project.id).filter(|d| !d.is_empty()).cloned(),
                    latest_release: latest_releases.get(&project.id).cloned(),
                    environments: project_environments,
                })
            })
            .collect()
    }
}
