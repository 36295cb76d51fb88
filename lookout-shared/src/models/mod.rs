//! Database models for Lookout
//!
//! Each model carries its own SQL operations against a `PgPool`; the
//! [`PgStore`](crate::store::PgStore) backend delegates to them.
//!
//! # Models
//!
//! - `user`: User accounts
//! - `organization`: Organizations and the join-leave flag
//! - `team`: Teams and project-team associations
//! - `membership`: Organization roles and team memberships
//! - `project`: Projects
//! - `release`: Releases and the latest-release query
//! - `environment`: Environments and their project links
//! - `deploy`: Deploys and release-project-environment records

pub mod deploy;
pub mod environment;
pub mod membership;
pub mod organization;
pub mod project;
pub mod release;
pub mod team;
pub mod user;
