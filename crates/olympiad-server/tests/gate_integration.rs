//! Gate integration tests.
//!
//! These run the full server over TCP against a fake auth API.

mod common;

use anyhow::Result;
use olympiad_server::{IdentityResolver, ResolveError, Role};
use reqwest::StatusCode;

use common::{
    ADMIN_TOKEN, BROKEN_TOKEN, EXPIRED_TOKEN, PARTICIPANT_TOKEN, SELF_PROMOTED_TOKEN, TestServer,
};

fn location(resp: &reqwest::Response) -> Option<&str> {
    resp.headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

#[tokio::test]
async fn test_server_starts_and_responds_to_health() -> Result<()> {
    let server = TestServer::start().await?;

    assert!(server.health().await?, "Server should be healthy");

    let body: serde_json::Value = server.get("/api/health").send().await?.json().await?;
    assert_eq!(body["status"], "ok");
    assert!(body.get("version").is_some());

    // Health lives outside the gate boundary.
    assert_eq!(server.auth.calls(), 0);

    Ok(())
}

#[tokio::test]
async fn test_anonymous_dashboard_redirects_to_login() -> Result<()> {
    let server = TestServer::start().await?;

    let resp = server.get("/dashboard").send().await?;

    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&resp), Some("/login"));
    // No cookie means no lookup on the wire.
    assert_eq!(server.auth.calls(), 0);

    Ok(())
}

#[tokio::test]
async fn test_signed_in_dashboard_passes_with_principal() -> Result<()> {
    let server = TestServer::start().await?;

    let resp = server
        .get_with_token("/dashboard/registrations", PARTICIPANT_TOKEN)
        .send()
        .await?;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["path"], "/dashboard/registrations");
    assert_eq!(body["class"], "protected");
    assert_eq!(body["principal"]["id"], "user-1");
    assert_eq!(body["principal"]["email"], "ada@example.org");

    Ok(())
}

#[tokio::test]
async fn test_signed_in_login_redirects_to_dashboard() -> Result<()> {
    let server = TestServer::start().await?;

    for path in ["/login", "/register", "/auth/callback"] {
        let resp = server.get_with_token(path, PARTICIPANT_TOKEN).send().await?;
        assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT, "{}", path);
        assert_eq!(location(&resp), Some("/dashboard"), "{}", path);
    }

    Ok(())
}

#[tokio::test]
async fn test_expired_token_is_anonymous() -> Result<()> {
    let server = TestServer::start().await?;

    let resp = server
        .get_with_token("/dashboard", EXPIRED_TOKEN)
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&resp), Some("/login"));

    let resp = server.get_with_token("/login", EXPIRED_TOKEN).send().await?;
    assert_eq!(resp.status(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn test_public_paths_skip_lookup() -> Result<()> {
    let server = TestServer::start().await?;

    for path in ["/", "/competitions/physics", "/about"] {
        let resp = server.get_with_token(path, PARTICIPANT_TOKEN).send().await?;
        assert_eq!(resp.status(), StatusCode::OK, "{}", path);
    }

    assert_eq!(server.auth.calls(), 0);

    Ok(())
}

#[tokio::test]
async fn test_repeated_requests_hit_cache() -> Result<()> {
    let server = TestServer::start().await?;

    for _ in 0..3 {
        let resp = server
            .get_with_token("/dashboard", PARTICIPANT_TOKEN)
            .send()
            .await?;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    assert_eq!(server.auth.calls(), 1);

    Ok(())
}

#[tokio::test]
async fn test_admin_back_office_requires_admin_role() -> Result<()> {
    let server = TestServer::start().await?;

    let resp = server
        .get_with_token("/admin/results", PARTICIPANT_TOKEN)
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&resp), Some("/dashboard"));

    let resp = server
        .get_with_token("/admin/results", ADMIN_TOKEN)
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["principal"]["role"], "admin");

    // The admin prefix is a plain string prefix.
    let resp = server
        .get_with_token("/administration", PARTICIPANT_TOKEN)
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&resp), Some("/dashboard"));

    Ok(())
}

#[tokio::test]
async fn test_user_metadata_role_does_not_grant_admin() -> Result<()> {
    let server = TestServer::start().await?;

    let resp = server
        .get_with_token("/admin", SELF_PROMOTED_TOKEN)
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&resp), Some("/dashboard"));

    let resp = server
        .get_with_token("/dashboard", SELF_PROMOTED_TOKEN)
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["principal"]["role"], "participant");

    Ok(())
}

#[tokio::test]
async fn test_auth_api_failure_treated_as_anonymous_by_default() -> Result<()> {
    let server = TestServer::start().await?;

    let resp = server
        .get_with_token("/dashboard", BROKEN_TOKEN)
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&resp), Some("/login"));

    // Failures are not cached, so the next request asks again.
    server
        .get_with_token("/dashboard", BROKEN_TOKEN)
        .send()
        .await?;
    assert_eq!(server.auth.calls(), 2);

    Ok(())
}

#[tokio::test]
async fn test_auth_api_failure_rejected_when_configured() -> Result<()> {
    let server = TestServer::start_rejecting().await?;

    let resp = server
        .get_with_token("/dashboard", BROKEN_TOKEN)
        .send()
        .await?;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body: serde_json::Value = resp.json().await?;
    assert_eq!(body["code"], "identity_unavailable");

    Ok(())
}

#[tokio::test]
async fn test_static_assets_bypass_gate() -> Result<()> {
    let server = TestServer::start().await?;

    let resp = server.get("/dashboard/logo.png").send().await?;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = server.get("/_next/static/chunk.js").send().await?;
    assert_eq!(resp.status(), StatusCode::OK);

    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Resolver against the fake API
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_resolver_maps_user_to_principal() -> Result<()> {
    let api = common::FakeAuthApi::start().await?;
    let resolver = api.resolver()?;

    let principal = resolver.resolve(Some(PARTICIPANT_TOKEN)).await?.unwrap();
    assert_eq!(principal.id, "user-1");
    assert_eq!(principal.role, Role::Participant);

    let admin = resolver.resolve(Some(ADMIN_TOKEN)).await?.unwrap();
    assert!(admin.is_admin());

    Ok(())
}

#[tokio::test]
async fn test_resolver_rejected_token_is_nobody() -> Result<()> {
    let api = common::FakeAuthApi::start().await?;
    let resolver = api.resolver()?;

    assert!(resolver.resolve(Some(EXPIRED_TOKEN)).await?.is_none());
    assert!(resolver.resolve(None).await?.is_none());
    // Only the token-bearing call reached the API.
    assert_eq!(api.calls(), 1);

    Ok(())
}

#[tokio::test]
async fn test_resolver_server_error_is_backend_error() -> Result<()> {
    let api = common::FakeAuthApi::start().await?;
    let resolver = api.resolver()?;

    let err = resolver.resolve(Some(BROKEN_TOKEN)).await.unwrap_err();
    assert!(matches!(err, ResolveError::Backend(_)));

    Ok(())
}

#[tokio::test]
async fn test_resolver_unreachable_api_is_network_error() -> Result<()> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let resolver = olympiad_server::AuthApiResolver::new(&olympiad_server::AuthApiConfig::new(
        format!("http://{}", addr),
        common::ANON_KEY,
    ))?;

    let err = resolver.resolve(Some(PARTICIPANT_TOKEN)).await.unwrap_err();
    assert!(matches!(err, ResolveError::Network(_)));

    Ok(())
}
