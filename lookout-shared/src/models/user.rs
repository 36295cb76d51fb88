//! User model and database operations
//!
//! Users belong to organizations through [`OrganizationMember`] rows and to
//! teams through team memberships.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE users (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     username VARCHAR(128) NOT NULL UNIQUE,
//!     email VARCHAR(255) NOT NULL,
//!     date_joined TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```
//!
//! [`OrganizationMember`]: crate::models::membership::OrganizationMember

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// User account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Login name, unique across all users
    pub username: String,

    /// Contact email address
    pub email: String,

    /// When the account was created
    pub date_joined: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    /// Login name
    pub username: String,

    /// Contact email address
    pub email: String,
}

impl CreateUser {
    /// Builds input with an `<username>@example.com` address
    pub fn named(username: impl Into<String>) -> Self {
        let username = username.into();
        let email = format!("{}@example.com", username);
        Self { username, email }
    }
}

impl User {
    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Returns an error if the username is taken or the database connection fails
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email)
            VALUES ($1, $2)
            RETURNING id, username, email, date_joined
            "#,
        )
        .bind(data.username)
        .bind(data.email)
        .fetch_one(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_user_named() {
        let data = CreateUser::named("foo");
        assert_eq!(data.username, "foo");
        assert_eq!(data.email, "foo@example.com");
    }
}
