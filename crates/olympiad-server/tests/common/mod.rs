//! Common test utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::Result;
use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::get,
};
use reqwest::{Client, redirect::Policy};
use serde_json::json;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use olympiad_server::{
    AuthApiConfig, AuthApiResolver, GateConfig, ResolverFailureMode, Server, ServerConfig,
};

/// API key the fake auth API accepts.
pub const ANON_KEY: &str = "test-anon-key";

/// Token the fake auth API maps to a participant.
pub const PARTICIPANT_TOKEN: &str = "participant-token";

/// Token the fake auth API maps to an admin.
pub const ADMIN_TOKEN: &str = "admin-token";

/// Token the fake auth API maps to a participant claiming admin in
/// `user_metadata`.
pub const SELF_PROMOTED_TOKEN: &str = "self-promoted-token";

/// Token the fake auth API rejects with 401.
pub const EXPIRED_TOKEN: &str = "expired-token";

/// Token that makes the fake auth API fail with 500.
pub const BROKEN_TOKEN: &str = "broken-token";

/// A stand-in for the hosted auth API's user endpoint.
pub struct FakeAuthApi {
    /// The fake API's address.
    pub addr: SocketAddr,
    calls: Arc<AtomicUsize>,
    _handle: JoinHandle<()>,
}

impl FakeAuthApi {
    /// Start the fake API on a random port.
    pub async fn start() -> Result<Self> {
        let calls = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route("/auth/v1/user", get(fake_user))
            .with_state(calls.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            addr,
            calls,
            _handle: handle,
        })
    }

    /// Base URL of the fake API.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Number of user lookups served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// A resolver pointed at this fake API.
    pub fn resolver(&self) -> Result<AuthApiResolver> {
        Ok(AuthApiResolver::new(&AuthApiConfig::new(
            self.url(),
            ANON_KEY,
        ))?)
    }
}

async fn fake_user(State(calls): State<Arc<AtomicUsize>>, headers: HeaderMap) -> Response {
    calls.fetch_add(1, Ordering::SeqCst);

    if headers.get("apikey").and_then(|v| v.to_str().ok()) != Some(ANON_KEY) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "No API key found in request" })),
        )
            .into_response();
    }

    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match token {
        Some(PARTICIPANT_TOKEN) => Json(json!({
            "id": "user-1",
            "email": "ada@example.org",
            "app_metadata": {},
            "user_metadata": { "full_name": "Ada" },
        }))
        .into_response(),
        Some(ADMIN_TOKEN) => Json(json!({
            "id": "staff-1",
            "email": "staff@example.org",
            "app_metadata": { "role": "admin" },
            "user_metadata": {},
        }))
        .into_response(),
        Some(SELF_PROMOTED_TOKEN) => Json(json!({
            "id": "user-2",
            "email": "eve@example.org",
            "app_metadata": { "provider": "email" },
            "user_metadata": { "role": "admin" },
        }))
        .into_response(),
        Some(BROKEN_TOKEN) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response()
        }
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "invalid JWT" })),
        )
            .into_response(),
    }
}

/// A gate server that runs in the background against a [`FakeAuthApi`].
pub struct TestServer {
    /// The server's address.
    pub addr: SocketAddr,
    /// HTTP client that does not follow redirects.
    pub client: Client,
    /// The fake auth API backing the server.
    pub auth: FakeAuthApi,
    /// Handle to the server task.
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a new test server with default configuration.
    pub async fn start() -> Result<Self> {
        Self::start_with_gate(GateConfig::default()).await
    }

    /// Start a test server that answers 503 when the auth API fails.
    pub async fn start_rejecting() -> Result<Self> {
        Self::start_with_gate(
            GateConfig::default().with_resolver_failure_mode(ResolverFailureMode::Reject),
        )
        .await
    }

    /// Start a new test server with a custom gate configuration.
    pub async fn start_with_gate(gate: GateConfig) -> Result<Self> {
        let auth = FakeAuthApi::start().await?;
        let addr = find_available_port().await?;

        let config = ServerConfig::new()
            .with_bind_address(addr)
            .with_request_logging(false)
            .with_gate(gate);

        let server = Server::new(Arc::new(auth.resolver()?), config);
        let handle = tokio::spawn(async move {
            let _ = server.run_on(addr).await;
        });

        let client = Client::builder().redirect(Policy::none()).build()?;
        wait_for_server(&client, addr).await?;

        Ok(Self {
            addr,
            client,
            auth,
            _handle: handle,
        })
    }

    /// Get the base URL for the server.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Anonymous GET.
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.get(format!("{}{}", self.base_url(), path))
    }

    /// GET carrying a session cookie.
    pub fn get_with_token(&self, path: &str, token: &str) -> reqwest::RequestBuilder {
        self.get(path)
            .header(reqwest::header::COOKIE, format!("sb-access-token={}", token))
    }

    /// Check if server is healthy.
    pub async fn health(&self) -> Result<bool> {
        let resp = self.get("/api/health").send().await?;
        Ok(resp.status().is_success())
    }
}

/// Find an available port for the test server.
async fn find_available_port() -> Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(addr)
}

/// Wait for the server to become ready.
async fn wait_for_server(client: &Client, addr: SocketAddr) -> Result<()> {
    let url = format!("http://{}/api/health", addr);

    let result = timeout(Duration::from_secs(5), async {
        loop {
            match client.get(&url).send().await {
                Ok(resp) if resp.status().is_success() => return Ok(()),
                _ => tokio::time::sleep(Duration::from_millis(50)).await,
            }
        }
    })
    .await;

    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e),
        Err(_) => anyhow::bail!("Timeout waiting for server to start"),
    }
}
