//! Organization and team membership models
//!
//! An [`OrganizationMember`] relates a user to an organization with a role.
//! Team memberships additionally relate the user to individual teams of that
//! organization; they decide `isMember` for projects and, when the
//! organization disables open membership, `hasAccess` too.
//!
//! # Schema
//!
//! ```sql
//! CREATE TYPE member_role AS ENUM ('member', 'admin', 'manager', 'owner');
//!
//! CREATE TABLE organization_members (
//!     organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
//!     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
//!     role member_role NOT NULL DEFAULT 'member',
//!     date_added TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     PRIMARY KEY (organization_id, user_id)
//! );
//!
//! CREATE TABLE team_members (
//!     team_id UUID NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
//!     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
//!     PRIMARY KEY (team_id, user_id)
//! );
//! ```
//!
//! # Roles
//!
//! - **member**: Access to team projects (all projects under open membership)
//! - **admin**: Same project access rules as member
//! - **manager**: Global access to every project
//! - **owner**: Global access to every project
//!
//! # Example
//!
//! ```no_run
//! use lookout_shared::models::membership::{CreateMember, MemberRole, OrganizationMember};
//! use sqlx::PgPool;
//! use uuid::Uuid;
//!
//! # async fn example(pool: PgPool, organization_id: Uuid, user_id: Uuid) -> Result<(), sqlx::Error> {
//! let member = OrganizationMember::create(&pool, CreateMember {
//!     organization_id,
//!     user_id,
//!     role: MemberRole::Admin,
//! }).await?;
//! assert!(!member.role.is_global());
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;
use uuid::Uuid;

/// Organization roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "member_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    /// Regular member
    Member,

    /// Manages members and teams, no global project access
    Admin,

    /// Global project access
    Manager,

    /// Full control of the organization
    Owner,
}

impl MemberRole {
    /// Converts role to string for display
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Member => "member",
            MemberRole::Admin => "admin",
            MemberRole::Manager => "manager",
            MemberRole::Owner => "owner",
        }
    }

    /// Whether the role grants access to every project of the organization
    /// regardless of team membership or the join-leave flag
    pub fn is_global(&self) -> bool {
        matches!(self, MemberRole::Manager | MemberRole::Owner)
    }
}

impl fmt::Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Membership of a user in an organization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrganizationMember {
    /// Organization ID
    pub organization_id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Role within the organization
    pub role: MemberRole,

    /// When the user joined the organization
    pub date_added: DateTime<Utc>,
}

/// Input for adding a user to an organization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMember {
    /// Organization ID
    pub organization_id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Role to assign (defaults to Member)
    #[serde(default = "default_role")]
    pub role: MemberRole,
}

fn default_role() -> MemberRole {
    MemberRole::Member
}

/// Membership of a user in a team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TeamMember {
    /// Team ID
    pub team_id: Uuid,

    /// User ID
    pub user_id: Uuid,
}

impl OrganizationMember {
    /// Adds a user to an organization
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Membership already exists (unique constraint violation)
    /// - Organization or user doesn't exist (foreign key violation)
    /// - Database connection fails
    pub async fn create(pool: &PgPool, data: CreateMember) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, OrganizationMember>(
            r#"
            INSERT INTO organization_members (organization_id, user_id, role)
            VALUES ($1, $2, $3)
            RETURNING organization_id, user_id, role, date_added
            "#,
        )
        .bind(data.organization_id)
        .bind(data.user_id)
        .bind(data.role)
        .fetch_one(pool)
        .await
    }

    /// Finds a membership by organization and user
    pub async fn find(
        pool: &PgPool,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, OrganizationMember>(
            r#"
            SELECT organization_id, user_id, role, date_added
            FROM organization_members
            WHERE organization_id = $1 AND user_id = $2
            "#,
        )
        .bind(organization_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }
}

impl TeamMember {
    /// Adds a user to a team
    pub async fn create(pool: &PgPool, team_id: Uuid, user_id: Uuid) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, TeamMember>(
            r#"
            INSERT INTO team_members (team_id, user_id)
            VALUES ($1, $2)
            RETURNING team_id, user_id
            "#,
        )
        .bind(team_id)
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    /// IDs of the teams in an organization the user belongs to
    pub async fn team_ids_for_user(
        pool: &PgPool,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<Vec<Uuid>, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT tm.team_id
            FROM team_members tm
            JOIN teams t ON t.id = tm.team_id
            WHERE t.organization_id = $1 AND tm.user_id = $2
            "#,
        )
        .bind(organization_id)
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_role_as_str() {
        assert_eq!(MemberRole::Member.as_str(), "member");
        assert_eq!(MemberRole::Admin.as_str(), "admin");
        assert_eq!(MemberRole::Manager.as_str(), "manager");
        assert_eq!(MemberRole::Owner.as_str(), "owner");
        assert_eq!(MemberRole::Owner.to_string(), "owner");
    }

    #[test]
    fn test_global_roles() {
        assert!(!MemberRole::Member.is_global());
        assert!(!MemberRole::Admin.is_global());
        assert!(MemberRole::Manager.is_global());
        assert!(MemberRole::Owner.is_global());
    }

    #[test]
    fn test_create_member_default_role() {
        assert_eq!(default_role(), MemberRole::Member);

        let parsed: CreateMember = serde_json::from_value(serde_json::json!({
            "organization_id": Uuid::new_v4(),
            "user_id": Uuid::new_v4(),
        }))
        .unwrap();
        assert_eq!(parsed.role, MemberRole::Member);
    }
}
