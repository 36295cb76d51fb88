/// Organization project endpoints
///
/// # Endpoints
///
/// ```text
/// GET /v1/organizations/:org_slug/projects?serializer=summary&page=1&per_page=50
/// GET /v1/organizations/:org_slug/projects/:project_slug?serializer=with_team
/// GET /v1/organizations/:org_slug/latest-releases
/// ```
///
/// `serializer` is one of `default`, `with_team`, `with_organization` or
/// `summary`. The caller must be a member of the organization.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use lookout_shared::auth::{authorization::require_membership, context::AuthContext};
use lookout_shared::models::organization::Organization;
use lookout_shared::serializers::{
    bulk_fetch_project_latest_releases, serialize_projects, SerializerKind,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, instrument};
use uuid::Uuid;
use validator::Validate;

/// Default and maximum page size
pub const MAX_PER_PAGE: u32 = 100;

/// Query parameters of the project list
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ListProjectsQuery {
    /// Serializer variant
    #[serde(default)]
    pub serializer: SerializerKind,

    /// 1-based page number
    #[validate(range(min = 1))]
    pub page: Option<u32>,

    /// Page size
    #[validate(range(min = 1, max = 100))]
    pub per_page: Option<u32>,
}

/// Query parameters of the project detail
#[derive(Debug, Default, Deserialize)]
pub struct ProjectQuery {
    /// Serializer variant
    #[serde(default)]
    pub serializer: SerializerKind,
}

/// Latest release of one project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestReleaseResponse {
    pub project_id: Uuid,
    pub project_slug: String,
    pub version: String,
    pub date_added: DateTime<Utc>,
}

fn parse_query<T>(query: Result<Query<T>, QueryRejection>) -> ApiResult<T> {
    query
        .map(|Query(query)| query)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

/// Resolves the organization and checks the caller belongs to it
async fn member_organization(
    state: &AppState,
    org_slug: &str,
    auth: &AuthContext,
) -> ApiResult<Organization> {
    let organization = state
        .store
        .get_organization_by_slug(org_slug)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Organization not found: {}", org_slug)))?;

    require_membership(state.store.as_ref(), organization.id, auth.user_id).await?;

    Ok(organization)
}

/// Lists the organization's projects ordered by slug
///
/// # Errors
///
/// - 400 for an unknown serializer
/// - 403 if the caller is not a member
/// - 404 for an unknown organization
/// - 422 for an out-of-range page or page size
#[instrument(skip_all, fields(org = %org_slug, user_id = %auth.user_id))]
pub async fn list_projects(
    State(state): State<AppState>,
    Path(org_slug): Path<String>,
    Extension(auth): Extension<AuthContext>,
    query: Result<Query<ListProjectsQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<serde_json::Value>>> {
    let query = parse_query(query)?;
    query.validate()?;

    let organization = member_organization(&state, &org_slug, &auth).await?;

    let per_page = query.per_page.unwrap_or(MAX_PER_PAGE) as usize;
    let page = query.page.unwrap_or(1) as usize;
    let projects: Vec<_> = state
        .store
        .list_projects(organization.id)
        .await?
        .into_iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .collect();

    debug!(
        projects = projects.len(),
        serializer = query.serializer.as_str(),
        "Serializing project page"
    );

    let body = serialize_projects(
        state.store.as_ref(),
        &projects,
        &auth.viewer(),
        query.serializer,
    )
    .await?;

    Ok(Json(body))
}

/// Returns one project
///
/// # Errors
///
/// - 400 for an unknown serializer
/// - 403 if the caller is not a member
/// - 404 for an unknown organization or project
#[instrument(skip_all, fields(org = %org_slug, project = %project_slug, user_id = %auth.user_id))]
pub async fn get_project(
    State(state): State<AppState>,
    Path((org_slug, project_slug)): Path<(String, String)>,
    Extension(auth): Extension<AuthContext>,
    query: Result<Query<ProjectQuery>, QueryRejection>,
) -> ApiResult<Json<serde_json::Value>> {
    let query = parse_query(query)?;
    let organization = member_organization(&state, &org_slug, &auth).await?;

    let project = state
        .store
        .get_project_by_slug(organization.id, &project_slug)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Project not found: {}", project_slug)))?;

    let body = serialize_projects(
        state.store.as_ref(),
        std::slice::from_ref(&project),
        &auth.viewer(),
        query.serializer,
    )
    .await?
    .pop()
    .ok_or_else(|| ApiError::InternalError("Serializer returned no output".to_string()))?;

    Ok(Json(body))
}

/// Returns the latest release of every project that has one, ordered by
/// project slug
///
/// # Errors
///
/// - 403 if the caller is not a member
/// - 404 for an unknown organization
#[instrument(skip_all, fields(org = %org_slug, user_id = %auth.user_id))]
pub async fn latest_releases(
    State(state): State<AppState>,
    Path(org_slug): Path<String>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<LatestReleaseResponse>>> {
    let organization = member_organization(&state, &org_slug, &auth).await?;
    let projects = state.store.list_projects(organization.id).await?;

    let slugs: HashMap<Uuid, &str> = projects
        .iter()
        .map(|project| (project.id, project.slug.as_str()))
        .collect();

    let mut body: Vec<LatestReleaseResponse> =
        bulk_fetch_project_latest_releases(state.store.as_ref(), &projects)
            .await?
            .into_iter()
            .filter_map(|release| {
                let project_slug = slugs.get(&release.project_id)?.to_string();
                Some(LatestReleaseResponse {
                    project_id: release.project_id,
                    project_slug,
                    version: release.version,
                    date_added: release.date_added,
                })
            })
            .collect();
    body.sort_by(|a, b| a.project_slug.cmp(&b.project_slug));

    Ok(Json(body))
}
