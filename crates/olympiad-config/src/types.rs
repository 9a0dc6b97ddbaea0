//! Configuration types mapping to the TOML schema.
//!
//! Top-level config:
//! ```toml
//! [server]     # listener settings
//! [gate]       # session gate behavior
//! [identity]   # hosted auth API connection
//! ```

use serde::{Deserialize, Serialize};

use crate::{ConfigError, Result};

/// Built-in defaults shared with the CLI.
pub mod defaults {
    /// Default listen port.
    pub const PORT: u16 = 3000;
    /// Default bind address.
    pub const BIND: &str = "127.0.0.1";
    /// Default credential cookie.
    pub const COOKIE_NAME: &str = "sb-access-token";
    /// Default cache entry lifetime, in seconds.
    pub const TTL_SECS: u64 = 300;
    /// Default cache size above which a sweep runs.
    pub const SWEEP_THRESHOLD: usize = 100;
    /// Default login redirect target.
    pub const LOGIN_PATH: &str = "/login";
    /// Default dashboard redirect target.
    pub const DASHBOARD_PATH: &str = "/dashboard";
    /// Default auth API request timeout, in seconds.
    pub const IDENTITY_TIMEOUT_SECS: u64 = 10;
    /// Path prefixes excluded from the gate.
    pub const EXCLUDED_PREFIXES: &[&str] =
        &["/api", "/_next/static", "/_next/image", "/favicon.ico"];
    /// File extensions excluded from the gate.
    pub const EXCLUDED_EXTENSIONS: &[&str] = &["svg", "png", "jpg", "jpeg", "gif", "webp"];
}

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// All sections are optional so that partial configs (e.g. project-local
/// overrides) can be loaded and merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// Server configuration.
    pub server: Option<ServerSection>,

    /// Session gate configuration.
    pub gate: Option<GateSection>,

    /// Auth API configuration.
    pub identity: Option<IdentitySection>,
}

impl PortalConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    pub fn merge(&mut self, other: PortalConfig) {
        if other.server.is_some() {
            self.server = other.server;
        }

        if other.gate.is_some() {
            self.gate = other.gate;
        }

        if other.identity.is_some() {
            self.identity = other.identity;
        }
    }

    /// Server section, or defaults when absent.
    pub fn server_or_default(&self) -> ServerSection {
        self.server.clone().unwrap_or_default()
    }

    /// Gate section, or defaults when absent.
    pub fn gate_or_default(&self) -> GateSection {
        self.gate.clone().unwrap_or_default()
    }

    /// Check values the gate cannot run with.
    pub fn validate(&self) -> Result<()> {
        if let Some(ref gate) = self.gate {
            gate.validate()?;
        }
        if let Some(ref identity) = self.identity {
            identity.validate()?;
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Server Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Port to listen on.
    pub port: u16,
    /// Address to bind to.
    pub bind: String,
    /// Enable request logging.
    pub request_logging: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            port: defaults::PORT,
            bind: defaults::BIND.to_string(),
            request_logging: true,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Gate Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// What the server does when the auth API fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolverErrorMode {
    /// Treat the caller as signed out for this request.
    #[default]
    Anonymous,
    /// Answer 503.
    Reject,
}

/// Session gate configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateSection {
    /// Name of the credential cookie.
    pub cookie_name: String,
    /// Lifetime of a cached resolution, in seconds.
    pub ttl_secs: u64,
    /// Cache size above which expired entries are swept.
    pub sweep_threshold: usize,
    /// Where signed-out callers are sent.
    pub login_path: String,
    /// Where signed-in callers are sent.
    pub dashboard_path: String,
    /// Behavior when the auth API fails.
    pub on_resolver_error: ResolverErrorMode,
    /// Require the admin role for `/admin` paths at the gate itself.
    pub enforce_admin_role: bool,
    /// Path prefixes that bypass the gate.
    pub excluded_prefixes: Vec<String>,
    /// File extensions that bypass the gate.
    pub excluded_extensions: Vec<String>,
}

impl Default for GateSection {
    fn default() -> Self {
        Self {
            cookie_name: defaults::COOKIE_NAME.to_string(),
            ttl_secs: defaults::TTL_SECS,
            sweep_threshold: defaults::SWEEP_THRESHOLD,
            login_path: defaults::LOGIN_PATH.to_string(),
            dashboard_path: defaults::DASHBOARD_PATH.to_string(),
            on_resolver_error: ResolverErrorMode::default(),
            enforce_admin_role: false,
            excluded_prefixes: defaults::EXCLUDED_PREFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            excluded_extensions: defaults::EXCLUDED_EXTENSIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl GateSection {
    fn validate(&self) -> Result<()> {
        if self.cookie_name.trim().is_empty() {
            return Err(invalid("gate.cookie_name", "must not be empty"));
        }
        if self.ttl_secs == 0 {
            return Err(invalid("gate.ttl_secs", "must be greater than zero"));
        }
        if self.sweep_threshold == 0 {
            return Err(invalid("gate.sweep_threshold", "must be greater than zero"));
        }
        for (field, path) in [
            ("gate.login_path", &self.login_path),
            ("gate.dashboard_path", &self.dashboard_path),
        ] {
            if !path.starts_with('/') {
                return Err(invalid(field, "must be an absolute path starting with '/'"));
            }
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Identity Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Hosted auth API configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentitySection {
    /// Project base URL.
    pub url: Option<String>,
    /// Public API key. Prefer the `OLYMPIAD_IDENTITY_KEY` env var.
    pub anon_key: Option<String>,
    /// Per-request timeout, in seconds.
    pub timeout_secs: u64,
}

impl Default for IdentitySection {
    fn default() -> Self {
        Self {
            url: None,
            anon_key: None,
            timeout_secs: defaults::IDENTITY_TIMEOUT_SECS,
        }
    }
}

impl IdentitySection {
    /// Whether the API key is stored in the file.
    pub fn has_plaintext_key(&self) -> bool {
        self.anon_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    /// The configured URL, or an error naming the missing field.
    pub fn require_url(&self) -> Result<&str> {
        self.url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ConfigError::MissingField {
                field: "url".to_string(),
                context: "[identity]".to_string(),
            })
    }

    fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(invalid("identity.timeout_secs", "must be greater than zero"));
        }
        if let Some(ref url) = self.url
            && !(url.starts_with("http://") || url.starts_with("https://"))
        {
            return Err(invalid("identity.url", "must be an http(s) URL"));
        }
        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
