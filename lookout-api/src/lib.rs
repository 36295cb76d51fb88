//! # Lookout API Server Library
//!
//! HTTP surface over the shared project serializers.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `logging`: Tracing subscriber setup
//! - `middleware`: Response middleware
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod routes;
