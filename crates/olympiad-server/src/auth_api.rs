//! Identity resolver backed by the hosted auth API.
//!
//! Calls `GET {url}/auth/v1/user` with the project's public API key and the
//! caller's access token. A rejected token means "nobody"; anything else
//! unexpected is a [`ResolveError`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use crate::identity::{IdentityResolver, Principal, ResolveError, Role};

/// Default timeout for a single user lookup.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Path of the user endpoint relative to the project URL.
const USER_ENDPOINT: &str = "/auth/v1/user";

/// Connection settings for the auth API.
#[derive(Debug, Clone)]
pub struct AuthApiConfig {
    /// Project base URL, e.g. `https://project.supabase.co`.
    pub url: String,
    /// Public (anon) API key sent as the `apikey` header.
    pub api_key: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl AuthApiConfig {
    /// Create a config with the default timeout.
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// User record returned by the auth API (only the fields we read).
#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    app_metadata: Metadata,
}

#[derive(Debug, Default, Deserialize)]
struct Metadata {
    #[serde(default)]
    role: Option<String>,
}

impl AuthUser {
    fn into_principal(self) -> Principal {
        // Only app_metadata is server-controlled. user_metadata is writable by
        // the signed-in user and must never grant a role.
        let role = self
            .app_metadata
            .role
            .map(|r| Role::from_name(&r))
            .unwrap_or_default();

        Principal {
            id: self.id,
            email: self.email.filter(|e| !e.is_empty()),
            role,
        }
    }
}

/// [`IdentityResolver`] for the hosted auth API.
#[derive(Debug, Clone)]
pub struct AuthApiResolver {
    client: reqwest::Client,
    user_url: String,
    api_key: String,
}

impl AuthApiResolver {
    /// Build a resolver and its HTTP client.
    pub fn new(config: &AuthApiConfig) -> Result<Self, ResolveError> {
        let base = config.url.trim_end_matches('/');
        if base.is_empty() {
            return Err(ResolveError::Backend(
                "auth API URL is not configured".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ResolveError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            user_url: format!("{}{}", base, USER_ENDPOINT),
            api_key: config.api_key.clone(),
        })
    }

    /// Full URL of the user endpoint.
    pub fn user_url(&self) -> &str {
        &self.user_url
    }
}

#[async_trait]
impl IdentityResolver for AuthApiResolver {
    async fn resolve(&self, token: Option<&str>) -> Result<Option<Principal>, ResolveError> {
        let Some(token) = token else {
            return Ok(None);
        };

        let response = self
            .client
            .get(&self.user_url)
            .header("apikey", &self.api_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ResolveError::Network(format!("User lookup failed: {}", e)))?;

        match response.status() {
            status if status.is_success() => {
                let user: AuthUser = response.json().await.map_err(|e| {
                    ResolveError::InvalidResponse(format!("Failed to parse user: {}", e))
                })?;
                debug!(user_id = %user.id, "Auth API resolved user");
                Ok(Some(user.into_principal()))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                debug!("Auth API rejected token");
                Ok(None)
            }
            status => {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                Err(ResolveError::Backend(format!(
                    "User lookup returned {}: {}",
                    status, error_text
                )))
            }
        }
    }

    fn name(&self) -> &str {
        "auth_api"
    }
}
