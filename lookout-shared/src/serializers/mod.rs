//! Response serializers
//!
//! Serializers turn models into API response objects. Every serializer works
//! on a batch: attributes that need the store (teams, organizations, access
//! flags, releases, deploys) are fetched once for the whole slice and then
//! joined per object, so serializing a page of projects costs a fixed number
//! of queries regardless of the page size.
//!
//! # Variants
//!
//! | Serializer | Extra fields |
//! |------------|--------------|
//! | [`ProjectSerializer`] | none |
//! | [`ProjectWithTeamSerializer`] | `team`, `teams` |
//! | [`ProjectWithOrganizationSerializer`] | `organization` |
//! | [`ProjectSummarySerializer`] | `teams`, `latestDeploys`, `latestRelease`, `environments` |
//!
//! # Example
//!
//! ```
//! use lookout_shared::models::organization::CreateOrganization;
//! use lookout_shared::models::project::CreateProject;
//! use lookout_shared::serializers::{serialize, ProjectSerializer, Viewer};
//! use lookout_shared::store::{MemoryStore, Store};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryStore::new();
//! let org = store.create_organization(CreateOrganization::new("acme", "Acme")).await?;
//! let project = store.create_project(CreateProject::new(org.id, "web", "Web")).await?;
//!
//! let result = serialize(&store, &project, &Viewer::Anonymous, &ProjectSerializer).await?;
//! assert_eq!(result.slug, "web");
//! assert!(!result.has_access);
//! # Ok(())
//! # }
//! ```

pub mod organization;
pub mod project;
pub mod releases;
pub mod summary;

pub use organization::{OrganizationResponse, OrganizationSerializer};
pub use project::{
    ProjectResponse, ProjectSerializer, ProjectWithOrganizationResponse,
    ProjectWithOrganizationSerializer, ProjectWithTeamResponse, ProjectWithTeamSerializer,
    TeamSummary,
};
pub use releases::bulk_fetch_project_latest_releases;
pub use summary::{DeploySummary, ProjectSummaryResponse, ProjectSummarySerializer, ReleaseSummary};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::models::project::Project;
use crate::store::Store;

/// Who is looking at the serialized objects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    /// No authenticated user; every access flag is false
    Anonymous,

    /// An authenticated user
    User(Uuid),
}

impl Viewer {
    /// The user id, if any
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Viewer::Anonymous => None,
            Viewer::User(id) => Some(*id),
        }
    }
}

/// Batch serializer for a model type
///
/// Implementations must return exactly one output per input item, in input
/// order.
#[async_trait]
pub trait Serializer<T: Sync>: Send + Sync {
    /// Response object produced for each item
    type Output: Serialize + Send;

    /// Serializes a batch of items for a viewer
    async fn serialize_many(
        &self,
        store: &dyn Store,
        items: &[T],
        viewer: &Viewer,
    ) -> StoreResult<Vec<Self::Output>>;
}

/// Serializes a single item
///
/// # Errors
///
/// Propagates store errors raised while loading attributes.
pub async fn serialize<T, S>(
    store: &dyn Store,
    item: &T,
    viewer: &Viewer,
    serializer: &S,
) -> StoreResult<S::Output>
where
    T: Sync,
    S: Serializer<T>,
{
    serializer
        .serialize_many(store, std::slice::from_ref(item), viewer)
        .await?
        .pop()
        .ok_or_else(|| StoreError::Internal("serializer returned no output".to_string()))
}

/// Serializes a batch of items
///
/// An empty batch returns immediately without touching the store.
pub async fn serialize_many<T, S>(
    store: &dyn Store,
    items: &[T],
    viewer: &Viewer,
    serializer: &S,
) -> StoreResult<Vec<S::Output>>
where
    T: Sync,
    S: Serializer<T>,
{
    if items.is_empty() {
        return Ok(Vec::new());
    }

    serializer.serialize_many(store, items, viewer).await
}

/// Project serializer variant selected by name, e.g. from a query string
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SerializerKind {
    #[default]
    Default,
    WithTeam,
    WithOrganization,
    Summary,
}

impl SerializerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SerializerKind::Default => "default",
            SerializerKind::WithTeam => "with_team",
            SerializerKind::WithOrganization => "with_organization",
            SerializerKind::Summary => "summary",
        }
    }
}

/// Serializes projects with the chosen variant into JSON values
///
/// # Errors
///
/// Propagates store errors, and `StoreError::Serialization` if a response
/// cannot be converted to JSON.
pub async fn serialize_projects(
    store: &dyn Store,
    projects: &[Project],
    viewer: &Viewer,
    kind: SerializerKind,
) -> StoreResult<Vec<serde_json::Value>> {
    match kind {
        SerializerKind::Default => {
            to_values(serialize_many(store, projects, viewer, &ProjectSerializer).await?)
        }
        SerializerKind::WithTeam => {
            to_values(serialize_many(store, projects, viewer, &ProjectWithTeamSerializer).await?)
        }
        SerializerKind::WithOrganization => to_values(
            serialize_many(store, projects, viewer, &ProjectWithOrganizationSerializer).await?,
        ),
        SerializerKind::Summary => {
            to_values(serialize_many(store, projects, viewer, &ProjectSummarySerializer).await?)
        }
    }
}

fn to_values<O: Serialize>(outputs: Vec<O>) -> StoreResult<Vec<serde_json::Value>> {
    outputs
        .into_iter()
        .map(|output| serde_json::to_value(output).map_err(StoreError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewer_user_id() {
        let id = Uuid::new_v4();
        assert_eq!(Viewer::User(id).user_id(), Some(id));
        assert_eq!(Viewer::Anonymous.user_id(), None);
    }

    #[test]
    fn test_serializer_kind_parsing() {
        let kind: SerializerKind = serde_json::from_str("\"with_team\"").unwrap();
        assert_eq!(kind, SerializerKind::WithTeam);
        assert_eq!(SerializerKind::default().as_str(), "default");
        assert!(serde_json::from_str::<SerializerKind>("\"detailed\"").is_err());
    }
}
