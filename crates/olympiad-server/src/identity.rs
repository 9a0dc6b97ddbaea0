//! Caller identity and the resolver contract.
//!
//! The portal delegates authentication to a hosted backend. The gate only
//! needs one capability from it: turn a credential token into a
//! [`Principal`], or report that the token belongs to nobody.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Principal
// ─────────────────────────────────────────────────────────────────────────────

/// Role of an authenticated caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Back-office staff reviewing registrations.
    Admin,
    /// Student or team participant.
    #[default]
    #[serde(other)]
    Participant,
}

impl Role {
    /// Parse a role name from backend metadata. Unknown names map to
    /// [`Role::Participant`].
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("admin") {
            Role::Admin
        } else {
            Role::Participant
        }
    }
}

/// A resolved, authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Stable user identifier from the auth backend.
    pub id: String,
    /// Email address, when the backend exposes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Role used by the admin guard.
    #[serde(default)]
    pub role: Role,
}

impl Principal {
    /// Create a participant principal.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
            role: Role::Participant,
        }
    }

    /// Create an admin principal.
    pub fn admin(id: impl Into<String>) -> Self {
        Self::new(id).with_role(Role::Admin)
    }

    /// Set the email.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Set the role.
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Check if this principal may use the admin back-office.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Resolver
// ─────────────────────────────────────────────────────────────────────────────

/// Failure to reach a verdict about a credential.
///
/// "Nobody" is not an error; resolvers return `Ok(None)` for it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ResolveError {
    /// Transport failure or timeout.
    #[error("Identity backend unreachable: {0}")]
    Network(String),

    /// The backend answered with an unexpected status.
    #[error("Identity backend error: {0}")]
    Backend(String),

    /// The backend's response could not be parsed.
    #[error("Invalid identity response: {0}")]
    InvalidResponse(String),
}

/// Resolves request credentials to a principal.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Resolve a credential token. `None` means the request carried no
    /// credential at all.
    async fn resolve(&self, token: Option<&str>) -> Result<Option<Principal>, ResolveError>;

    /// Short name for logs.
    fn name(&self) -> &str {
        "identity"
    }
}

/// Thread-safe shared resolver.
pub type SharedResolver = Arc<dyn IdentityResolver>;

// ─────────────────────────────────────────────────────────────────────────────
// Mock resolver
// ─────────────────────────────────────────────────────────────────────────────

/// Resolver with canned answers, for tests and offline checks.
///
/// Known tokens resolve to their principal, anything else resolves to
/// nobody. Queued failures are returned first, one per call.
#[derive(Debug, Default)]
pub struct MockResolver {
    principals: std::collections::HashMap<String, Principal>,
    failures: Mutex<VecDeque<ResolveError>>,
    calls: AtomicUsize,
    seen: Mutex<Vec<Option<String>>>,
}

impl MockResolver {
    /// Create a resolver that knows no tokens.
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `token` to `principal`.
    pub fn with_principal(mut self, token: impl Into<String>, principal: Principal) -> Self {
        self.principals.insert(token.into(), principal);
        self
    }

    /// Queue a failure for the next call.
    pub fn fail_next(&self, error: ResolveError) {
        self.failures.lock().push_back(error);
    }

    /// Number of resolve calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Tokens passed to each call, in order.
    pub fn seen_tokens(&self) -> Vec<Option<String>> {
        self.seen.lock().clone()
    }
}

#[async_trait]
impl IdentityResolver for MockResolver {
    async fn resolve(&self, token: Option<&str>) -> Result<Option<Principal>, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().push(token.map(str::to_string));

        if let Some(error) = self.failures.lock().pop_front() {
            return Err(error);
        }

        Ok(token.and_then(|t| self.principals.get(t).cloned()))
    }

    fn name(&self) -> &str {
        "mock"
    }
}
