/// Integration tests for the Lookout API
///
/// Drive the full router (auth layer, handlers, serializers) over the
/// in-memory store.

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{token_for, TestContext};
use lookout_shared::models::membership::MemberRole;
use lookout_shared::models::release::CreateRelease;
use lookout_shared::models::user::CreateUser;
use lookout_shared::store::Store;
use serde_json::json;

#[tokio::test]
async fn test_health_check() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx.get_as("/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn test_requires_token() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx.get_as("/v1/organizations/acme/projects", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = ctx
        .get_as("/v1/organizations/acme/projects", Some("not.a.token"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_projects_ordered_by_slug() {
    let ctx = TestContext::new().await;
    let team = ctx.create_team("backend").await;
    ctx.create_project("zeta", &[&team]).await;
    ctx.create_project("alpha", &[&team]).await;

    let (status, body) = ctx.get("/v1/organizations/acme/projects").await;

    assert_eq!(status, StatusCode::OK);
    let slugs: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["slug"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(slugs, vec!["alpha", "zeta"]);
    assert_eq!(body[0]["hasAccess"], true);
    assert_eq!(body[0]["isMember"], false);
    assert!(body[0].get("team").is_none());
}

#[tokio::test]
async fn test_list_projects_pagination() {
    let ctx = TestContext::new().await;
    for slug in ["a", "b", "c"] {
        ctx.create_project(slug, &[]).await;
    }

    let (status, body) = ctx
        .get("/v1/organizations/acme/projects?page=2&per_page=2")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["slug"], "c");

    let (status, body) = ctx.get("/v1/organizations/acme/projects?per_page=0").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "per_page");
}

#[tokio::test]
async fn test_unknown_serializer_rejected() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx
        .get("/v1/organizations/acme/projects?serializer=everything")
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_get_project_variants() {
    let ctx = TestContext::new().await;
    let team = ctx.create_team("backend").await;
    ctx.create_project("web", &[&team]).await;

    let (status, body) = ctx
        .get("/v1/organizations/acme/projects/web?serializer=with_team")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["team"]["slug"], "backend");
    assert_eq!(body["teams"].as_array().unwrap().len(), 1);

    let (_, body) = ctx
        .get("/v1/organizations/acme/projects/web?serializer=with_organization")
        .await;
    assert_eq!(body["organization"]["slug"], "acme");
    assert_eq!(body["organization"]["name"], "Acme");

    let (_, body) = ctx
        .get("/v1/organizations/acme/projects/web?serializer=summary")
        .await;
    assert!(body["latestDeploys"].is_null());
    assert!(body["latestRelease"].is_null());
    assert_eq!(body["environments"], json!([]));
}

#[tokio::test]
async fn test_unknown_organization_and_project() {
    let ctx = TestContext::new().await;

    let (status, _) = ctx.get("/v1/organizations/nope/projects").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = ctx.get("/v1/organizations/acme/projects/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_non_member_forbidden() {
    let ctx = TestContext::new().await;
    let outsider = ctx
        .store
        .create_user(CreateUser::named("outsider"))
        .await
        .unwrap();

    let (status, body) = ctx
        .get_as("/v1/organizations/acme/projects", Some(&token_for(outsider.id)))
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
}

#[tokio::test]
async fn test_member_access_flags() {
    let ctx = TestContext::new().await;
    let team = ctx.create_team("backend").await;
    ctx.create_project("web", &[&team]).await;
    let member = ctx.create_member("member", MemberRole::Member).await;
    let token = token_for(member.id);
    let uri = "/v1/organizations/acme/projects/web";

    let (_, body) = ctx.get_as(uri, Some(&token)).await;
    assert_eq!(body["hasAccess"], true);
    assert_eq!(body["isMember"], false);

    ctx.store
        .set_allow_joinleave(ctx.organization.id, false)
        .await
        .unwrap();
    let (status, body) = ctx.get_as(uri, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["hasAccess"], false);

    ctx.store.add_team_member(team.id, member.id).await.unwrap();
    let (_, body) = ctx.get_as(uri, Some(&token)).await;
    assert_eq!(body["hasAccess"], true);
    assert_eq!(body["isMember"], true);
}

#[tokio::test]
async fn test_latest_releases() {
    let ctx = TestContext::new().await;
    let web = ctx.create_project("web", &[]).await;
    let api = ctx.create_project("api", &[]).await;
    ctx.create_project("docs", &[]).await;

    for (project, version, age) in [(&web, "1.0", 10), (&web, "1.1", 5), (&api, "2.0", 1)] {
        ctx.store
            .create_release(CreateRelease {
                organization_id: ctx.organization.id,
                project_id: project.id,
                version: version.to_string(),
                date_added: Some(Utc::now() - Duration::minutes(age)),
            })
            .await
            .unwrap();
    }

    let (status, body) = ctx.get("/v1/organizations/acme/latest-releases").await;

    assert_eq!(status, StatusCode::OK);
    let pairs: Vec<(String, String)> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| {
            (
                r["projectSlug"].as_str().unwrap().to_string(),
                r["version"].as_str().unwrap().to_string(),
            )
        })
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("api".to_string(), "2.0".to_string()),
            ("web".to_string(), "1.1".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_security_headers_present() {
    let ctx = TestContext::new().await;
    let response = tower::ServiceExt::oneshot(
        ctx.app.clone(),
        axum::http::Request::builder()
            .uri("/health")
            .body(axum::body::Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();

    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
}
