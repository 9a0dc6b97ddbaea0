//! Route classification and the gate's matcher boundary.

use serde::{Deserialize, Serialize};

/// Prefixes that require a resolved principal.
pub const PROTECTED_PREFIXES: &[&str] = &["/admin", "/dashboard"];

/// Prefixes reserved for unauthenticated flows.
pub const AUTH_ONLY_PREFIXES: &[&str] = &["/login", "/register", "/auth"];

/// Prefix of admin-designated paths.
pub const ADMIN_PREFIX: &str = "/admin";

/// Path prefixes that never reach the gate.
pub const DEFAULT_EXCLUDED_PREFIXES: &[&str] =
    &["/api", "/_next/static", "/_next/image", "/favicon.ico"];

/// File extensions (image assets) that never reach the gate.
pub const DEFAULT_EXCLUDED_EXTENSIONS: &[&str] = &["svg", "png", "jpg", "jpeg", "gif", "webp"];

/// How the gate treats a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteClass {
    /// Requires a principal.
    Protected,
    /// Only for callers without a principal.
    AuthOnly,
    /// No gate work at all.
    Public,
}

impl RouteClass {
    /// Classify a request path. First match wins; prefixes are plain string
    /// prefixes, so `/administration` is protected too.
    pub fn classify(path: &str) -> Self {
        if PROTECTED_PREFIXES.iter().any(|p| path.starts_with(p)) {
            RouteClass::Protected
        } else if AUTH_ONLY_PREFIXES.iter().any(|p| path.starts_with(p)) {
            RouteClass::AuthOnly
        } else {
            RouteClass::Public
        }
    }

    /// Check if this class needs an identity lookup.
    pub fn needs_identity(&self) -> bool {
        !matches!(self, RouteClass::Public)
    }
}

impl std::fmt::Display for RouteClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteClass::Protected => write!(f, "protected"),
            RouteClass::AuthOnly => write!(f, "auth-only"),
            RouteClass::Public => write!(f, "public"),
        }
    }
}

/// Check if a path belongs to the admin back-office.
pub fn is_admin_path(path: &str) -> bool {
    path.starts_with(ADMIN_PREFIX)
}

/// Paths the gate middleware is not invoked for (API routes, static and
/// image assets).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatcher {
    excluded_prefixes: Vec<String>,
    excluded_extensions: Vec<String>,
}

impl Default for RouteMatcher {
    fn default() -> Self {
        Self::new(
            DEFAULT_EXCLUDED_PREFIXES.iter().map(|s| s.to_string()),
            DEFAULT_EXCLUDED_EXTENSIONS.iter().map(|s| s.to_string()),
        )
    }
}

impl RouteMatcher {
    /// Build a matcher from excluded prefixes and file extensions.
    ///
    /// Extensions may be given with or without a leading dot and are
    /// compared case-insensitively.
    pub fn new(
        prefixes: impl IntoIterator<Item = String>,
        extensions: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            excluded_prefixes: prefixes.into_iter().filter(|p| !p.is_empty()).collect(),
            excluded_extensions: extensions
                .into_iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    /// Whether the gate should run for `path`.
    pub fn matches(&self, path: &str) -> bool {
        !self.is_excluded(path)
    }

    /// Whether `path` bypasses the gate.
    pub fn is_excluded(&self, path: &str) -> bool {
        if self
            .excluded_prefixes
            .iter()
            .any(|p| path.starts_with(p.as_str()))
        {
            return true;
        }

        let last_segment = path.rsplit('/').next().unwrap_or(path);
        match last_segment.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => {
                let ext = ext.to_ascii_lowercase();
                self.excluded_extensions.iter().any(|e| *e == ext)
            }
            _ => false,
        }
    }
}
