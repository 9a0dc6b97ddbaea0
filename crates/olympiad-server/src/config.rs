//! Server configuration.

use std::net::SocketAddr;
use std::time::Duration;

use olympiad_session::CacheConfig;
use serde::{Deserialize, Serialize};

use crate::policy::RolePolicy;
use crate::route::RouteMatcher;

/// Default name of the credential cookie.
pub const DEFAULT_COOKIE_NAME: &str = "sb-access-token";

/// Default redirect target for anonymous callers on protected paths.
pub const DEFAULT_LOGIN_PATH: &str = "/login";

/// Default redirect target for signed-in callers on auth-only paths.
pub const DEFAULT_DASHBOARD_PATH: &str = "/dashboard";

/// What the HTTP layer does when the identity backend fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolverFailureMode {
    /// Treat the caller as anonymous for this request (nothing is cached).
    #[default]
    Anonymous,
    /// Answer 503 and let the client retry.
    Reject,
}

/// Session gate configuration.
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Cookie carrying the credential token.
    pub cookie_name: String,

    /// Cache TTL and sweep threshold.
    pub cache: CacheConfig,

    /// Where anonymous callers on protected paths are sent.
    pub login_path: String,

    /// Where signed-in callers on auth-only paths are sent.
    pub dashboard_path: String,

    /// Role handling on admin paths.
    pub role_policy: RolePolicy,

    /// Behavior when the identity backend fails.
    pub on_resolver_error: ResolverFailureMode,

    /// Paths that bypass the gate.
    pub matcher: RouteMatcher,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            cache: CacheConfig::default(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            dashboard_path: DEFAULT_DASHBOARD_PATH.to_string(),
            role_policy: RolePolicy::Ignore,
            on_resolver_error: ResolverFailureMode::Anonymous,
            matcher: RouteMatcher::default(),
        }
    }
}

impl GateConfig {
    /// Create a gate config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the credential cookie name.
    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    /// Set the cache TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.cache.ttl = ttl;
        self
    }

    /// Set the sweep high-water mark.
    pub fn with_sweep_threshold(mut self, threshold: usize) -> Self {
        self.cache.sweep_threshold = threshold;
        self
    }

    /// Set both redirect targets.
    pub fn with_redirects(
        mut self,
        login_path: impl Into<String>,
        dashboard_path: impl Into<String>,
    ) -> Self {
        self.login_path = login_path.into();
        self.dashboard_path = dashboard_path.into();
        self
    }

    /// Set the role policy used by the gate itself.
    pub fn with_role_policy(mut self, policy: RolePolicy) -> Self {
        self.role_policy = policy;
        self
    }

    /// Set the resolver failure mode.
    pub fn with_resolver_failure_mode(mut self, mode: ResolverFailureMode) -> Self {
        self.on_resolver_error = mode;
        self
    }

    /// Set the matcher boundary.
    pub fn with_matcher(mut self, matcher: RouteMatcher) -> Self {
        self.matcher = matcher;
        self
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to.
    pub bind_address: SocketAddr,

    /// Enable request logging.
    pub request_logging: bool,

    /// Session gate settings.
    pub gate: GateConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 3000)),
            request_logging: true,
            gate: GateConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Create a server config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bind address.
    pub fn with_bind_address(mut self, addr: SocketAddr) -> Self {
        self.bind_address = addr;
        self
    }

    /// Enable or disable request logging.
    pub fn with_request_logging(mut self, enabled: bool) -> Self {
        self.request_logging = enabled;
        self
    }

    /// Set the gate configuration.
    pub fn with_gate(mut self, gate: GateConfig) -> Self {
        self.gate = gate;
        self
    }
}
