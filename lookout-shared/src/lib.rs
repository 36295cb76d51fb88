//! # Lookout Shared Library
//!
//! Models, persistence and response serializers used by the Lookout API.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their SQL
//! - `store`: The `Store` trait with PostgreSQL and in-memory backends
//! - `serializers`: Batch serializers for organizations and projects
//! - `auth`: JWT handling and project access rules
//! - `db`: Connection pool and migrations
//! - `error`: Store error types

pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod serializers;
pub mod store;

/// Current version of the Lookout shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
