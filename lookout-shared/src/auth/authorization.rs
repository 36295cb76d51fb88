//! Authorization helpers and project access flags
//!
//! # Permission Model
//!
//! 1. **Organization Membership**: API callers must be members of the
//!    organization they query (see [`require_membership`])
//! 2. **Global Roles**: managers and owners can access every project
//! 3. **Open Membership**: when the organization allows join/leave, every
//!    member can access every project
//! 4. **Team Membership**: otherwise members and admins only access
//!    projects of the teams they belong to
//!
//! `isMember` only reflects team membership, whatever the role or flag.
//!
//! # Example
//!
//! ```
//! use lookout_shared::auth::authorization::project_access;
//! use lookout_shared::models::membership::{MemberRole, OrganizationMember};
//! use lookout_shared::models::organization::Organization;
//! use std::collections::HashSet;
//! use uuid::Uuid;
//!
//! let organization = Organization {
//!     id: Uuid::new_v4(),
//!     slug: "acme".to_string(),
//!     name: "Acme".to_string(),
//!     allow_joinleave: false,
//!     date_created: chrono::Utc::now(),
//! };
//! let member = OrganizationMember {
//!     organization_id: organization.id,
//!     user_id: Uuid::new_v4(),
//!     role: MemberRole::Manager,
//!     date_added: chrono::Utc::now(),
//! };
//!
//! let access = project_access(&organization, Some(&member), &HashSet::new(), &[Uuid::new_v4()]);
//! assert!(access.has_access);
//! assert!(!access.is_member);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::membership::OrganizationMember;
use crate::models::organization::Organization;
use crate::store::Store;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// User is not a member of the organization
    #[error("Not a member of organization {0}")]
    NotMember(Uuid),

    /// Store error
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Access flags of a viewer on one project
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectAccess {
    /// Whether the viewer may access the project
    pub has_access: bool,

    /// Whether the viewer belongs to one of the project's teams
    pub is_member: bool,
}

/// Computes access flags for a project
///
/// # Arguments
///
/// * `organization` - The project's organization
/// * `member` - The viewer's membership in that organization, if any
/// * `viewer_team_ids` - Teams of that organization the viewer belongs to
/// * `project_team_ids` - Teams associated with the project
pub fn project_access(
    organization: &Organization,
    member: Option<&OrganizationMember>,
    viewer_team_ids: &HashSet<Uuid>,
    project_team_ids: &[Uuid],
) -> ProjectAccess {
    let is_member = project_team_ids
        .iter()
        .any(|team_id| viewer_team_ids.contains(team_id));

    let has_access = match member {
        Some(member) if member.organization_id == organization.id => {
            member.role.is_global() || organization.allow_joinleave || is_member
        }
        _ => false,
    };

    ProjectAccess {
        has_access,
        is_member,
    }
}

/// Checks if a user is a member of an organization
///
/// # Returns
///
/// The membership if the user is a member
///
/// # Errors
///
/// Returns `AuthzError::NotMember` if user is not a member
pub async fn require_membership(
    store: &dyn Store,
    organization_id: Uuid,
    user_id: Uuid,
) -> Result<OrganizationMember, AuthzError> {
    let member = store.get_member(organization_id, user_id).await?;

    match member {
        Some(member) => Ok(member),
        None => {
            debug!(%organization_id, %user_id, "Rejected non-member");
            Err(AuthzError::NotMember(organization_id))
        }
    }
}
