//! Common test utilities for API integration tests
//!
//! Builds the router over a `MemoryStore` with an organization, an owner and
//! a signed token for that owner.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use lookout_api::app::{build_router, AppState};
use lookout_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig, LoggingConfig};
use lookout_api::logging::LogFormat;
use lookout_shared::auth::jwt::{create_token, Claims};
use lookout_shared::models::membership::{CreateMember, MemberRole};
use lookout_shared::models::organization::{CreateOrganization, Organization};
use lookout_shared::models::project::{CreateProject, Project};
use lookout_shared::models::team::{CreateTeam, Team};
use lookout_shared::models::user::{CreateUser, User};
use lookout_shared::store::{MemoryStore, Store};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

pub const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            production: false,
        },
        database: DatabaseConfig {
            url: String::new(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: SECRET.to_string(),
        },
        logging: LoggingConfig {
            format: LogFormat::Human,
        },
    }
}

/// Test context containing all necessary resources
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub app: Router,
    pub organization: Organization,
    pub owner: User,
    pub token: String,
}

impl TestContext {
    pub async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());

        let owner = store
            .create_user(CreateUser::named("owner"))
            .await
            .unwrap();
        let organization = store
            .create_organization(CreateOrganization::new("acme", "Acme"))
            .await
            .unwrap();
        store
            .create_member(CreateMember {
                organization_id: organization.id,
                user_id: owner.id,
                role: MemberRole::Owner,
            })
            .await
            .unwrap();

        let state = AppState::new(store.clone(), test_config());
        let app = build_router(state);
        let token = token_for(owner.id);

        Self {
            store,
            app,
            organization,
            owner,
            token,
        }
    }

    /// Creates a user with the given role in the organization
    pub async fn create_member(&self, username: &str, role: MemberRole) -> User {
        let user = self.store.create_user(CreateUser::named(username)).await.unwrap();
        self.store
            .create_member(CreateMember {
                organization_id: self.organization.id,
                user_id: user.id,
                role,
            })
            .await
            .unwrap();
        user
    }

    pub async fn create_team(&self, slug: &str) -> Team {
        self.store
            .create_team(CreateTeam {
                organization_id: self.organization.id,
                slug: slug.to_string(),
                name: slug.to_string(),
            })
            .await
            .unwrap()
    }

    pub async fn create_project(&self, slug: &str, teams: &[&Team]) -> Project {
        let mut data = CreateProject::new(self.organization.id, slug, slug);
        data.team_ids = teams.iter().map(|team| team.id).collect();
        self.store.create_project(data).await.unwrap()
    }

    /// Sends a GET with the owner's token
    pub async fn get(&self, uri: &str) -> (StatusCode, serde_json::Value) {
        self.get_as(uri, Some(&self.token)).await
    }

    /// Sends a GET with an optional bearer token
    pub async fn get_as(&self, uri: &str, token: Option<&str>) -> (StatusCode, serde_json::Value) {
        let mut request = Request::builder().method("GET").uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let response = self
            .app
            .clone()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if body.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&body).unwrap_or_else(|_| {
                serde_json::Value::String(String::from_utf8_lossy(&body).to_string())
            })
        };

        (status, json)
    }
}

pub fn token_for(user_id: Uuid) -> String {
    create_token(&Claims::new(user_id), SECRET).unwrap()
}
