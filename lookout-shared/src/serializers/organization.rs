//! Organization serializer

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Serializer, Viewer};
use crate::error::StoreResult;
use crate::models::organization::Organization;
use crate::store::Store;

/// Serialized organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationResponse {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub date_created: DateTime<Utc>,
}

impl From<&Organization> for OrganizationResponse {
    fn from(organization: &Organization) -> Self {
        Self {
            id: organization.id,
            slug: organization.slug.clone(),
            name: organization.name.clone(),
            date_created: organization.date_created,
        }
    }
}

/// Serializes organizations; needs no extra attributes
#[derive(Debug, Clone, Copy, Default)]
pub struct OrganizationSerializer;

#[async_trait]
impl Serializer<Organization> for OrganizationSerializer {
    type Output = OrganizationResponse;

    async fn serialize_many(
        &self,
        _store: &dyn Store,
        items: &[Organization],
        _viewer: &Viewer,
    ) -> StoreResult<Vec<OrganizationResponse>> {
        Ok(items.iter().map(OrganizationResponse::from).collect())
    }
}
