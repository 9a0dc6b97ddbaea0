//! The session gate.
//!
//! Runs once per navigational request and decides whether it passes
//! through or is redirected:
//! - Public paths are allowed without any identity work
//! - Protected and auth-only paths resolve the caller, consulting the
//!   session cache first
//! - Resolutions are cached per credential for a fixed TTL; requests
//!   without a credential are never cached
//!
//! The gate knows nothing about HTTP. Hosts implement [`GateRequest`] and
//! turn the [`GateOutcome`] into a response (see [`crate::auth`]).

use std::sync::Arc;

use olympiad_session::{
    CacheEntry, Clock, SessionCache, SharedClock, SharedSessionCache, SystemClock, cache_key,
};
use tracing::{debug, trace, warn};

use crate::config::GateConfig;
use crate::error::GateError;
use crate::identity::{Principal, SharedResolver};
use crate::policy::{self, Decision};
use crate::route::RouteClass;

/// Cache of resolutions. `None` values record "resolved to nobody".
pub type PrincipalCache = SharedSessionCache<Option<Principal>>;

/// What the gate needs from an inbound request.
pub trait GateRequest {
    /// Request path, without query string.
    fn path(&self) -> &str;

    /// Value of the named cookie, if present.
    fn cookie(&self, name: &str) -> Option<String>;
}

/// Plain request, for callers without an HTTP stack.
#[derive(Debug, Clone, Default)]
pub struct SimpleRequest {
    /// Request path.
    pub path: String,
    /// Cookies as name/value pairs.
    pub cookies: Vec<(String, String)>,
}

impl SimpleRequest {
    /// Request for `path` with no cookies.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            cookies: Vec::new(),
        }
    }

    /// Add a cookie.
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.push((name.into(), value.into()));
        self
    }
}

impl GateRequest for SimpleRequest {
    fn path(&self) -> &str {
        &self.path
    }

    fn cookie(&self, name: &str) -> Option<String> {
        self.cookies
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }
}

/// Result of running the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateOutcome {
    /// How the request was classified.
    pub class: RouteClass,
    /// What to do with it.
    pub decision: Decision,
    /// The resolved caller, when one was looked up and found.
    pub principal: Option<Principal>,
}

impl GateOutcome {
    /// Redirect location for this outcome, or `None` to pass through.
    pub fn redirect_target<'a>(&self, config: &'a GateConfig) -> Option<&'a str> {
        match self.decision {
            Decision::Allow => None,
            Decision::RedirectToLogin => Some(config.login_path.as_str()),
            Decision::RedirectToDashboard => Some(config.dashboard_path.as_str()),
        }
    }
}

/// Request-time session authorization.
#[derive(Clone)]
pub struct SessionGate {
    resolver: SharedResolver,
    cache: PrincipalCache,
    clock: SharedClock,
    config: Arc<GateConfig>,
}

impl SessionGate {
    /// Create a gate using the system clock.
    pub fn new(resolver: SharedResolver, cache: PrincipalCache, config: GateConfig) -> Self {
        Self {
            resolver,
            cache,
            clock: Arc::new(SystemClock),
            config: Arc::new(config),
        }
    }

    /// Replace the clock.
    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    /// Gate configuration.
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// The cache backing this gate.
    pub fn cache(&self) -> &PrincipalCache {
        &self.cache
    }

    /// Evaluate a request.
    ///
    /// Resolver failures are returned as [`GateError::Resolution`] and are
    /// not cached; the host decides how to answer them.
    pub async fn evaluate<R>(&self, request: &R) -> Result<GateOutcome, GateError>
    where
        R: GateRequest + ?Sized,
    {
        let path = request.path();
        let class = RouteClass::classify(path);

        if !class.needs_identity() {
            trace!(path = %path, "Public path, skipping identity lookup");
            return Ok(GateOutcome {
                class,
                decision: Decision::Allow,
                principal: None,
            });
        }

        let token = request
            .cookie(&self.config.cookie_name)
            .filter(|t| !t.is_empty());
        let principal = self.principal_for(token.as_deref()).await?;

        Ok(self.decide(path, class, principal))
    }

    /// Apply the gate's policy to an already-resolved caller.
    ///
    /// Used by hosts that fall back to "anonymous" after a resolver failure.
    pub fn decide(&self, path: &str, class: RouteClass, principal: Option<Principal>) -> GateOutcome {
        let decision = policy::evaluate(path, class, principal.as_ref(), self.config.role_policy);
        debug!(
            path = %path,
            class = %class,
            authenticated = principal.is_some(),
            ?decision,
            "Gate decision"
        );

        GateOutcome {
            class,
            decision,
            principal,
        }
    }

    /// Resolve the caller for `token`, consulting the cache first.
    async fn principal_for(&self, token: Option<&str>) -> Result<Option<Principal>, GateError> {
        let Some(token) = token else {
            // Anonymous callers would all share one key; never cache them.
            return Ok(self.resolver.resolve(None).await?);
        };

        let key = cache_key(token);
        let now = self.clock.now();

        match self.cache.get(&key).await {
            Ok(Some(entry)) if entry.is_live_at(now) => {
                trace!("Session cache hit");
                return Ok(entry.value);
            }
            Ok(Some(_)) => trace!("Session cache entry expired"),
            Ok(None) => trace!("Session cache miss"),
            Err(e) => warn!(error = %e, "Session cache read failed, resolving directly"),
        }

        let principal = self.resolver.resolve(Some(token)).await?;
        debug!(
            resolver = self.resolver.name(),
            authenticated = principal.is_some(),
            "Resolved session"
        );

        let now = self.clock.now();
        let entry = CacheEntry::new(principal.clone(), now, self.config.cache.ttl);
        if let Err(e) = self.cache.put(&key, entry).await {
            warn!(error = %e, "Session cache write failed");
        }

        self.maybe_sweep(now).await;

        Ok(principal)
    }

    /// Sweep expired entries once the cache grows past the high-water mark.
    async fn maybe_sweep(&self, now: chrono::DateTime<chrono::Utc>) {
        let size = match self.cache.len().await {
            Ok(size) => size,
            Err(e) => {
                warn!(error = %e, "Session cache size unavailable, skipping sweep");
                return;
            }
        };

        if size <= self.config.cache.sweep_threshold {
            return;
        }

        match self.cache.sweep(now).await {
            Ok(removed) => debug!(size, removed, "Session cache sweep"),
            Err(e) => warn!(error = %e, "Session cache sweep failed"),
        }
    }
}
