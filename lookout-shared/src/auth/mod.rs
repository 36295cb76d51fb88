//! Authentication and authorization utilities
//!
//! # Modules
//!
//! - [`jwt`]: JWT token generation and validation
//! - [`context`]: Authenticated request context and Bearer parsing
//! - [`authorization`]: Organization membership checks and project access flags

pub mod authorization;
pub mod context;
pub mod jwt;
