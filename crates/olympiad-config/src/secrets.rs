//! Identity API key resolution.
//!
//! Resolution order:
//! 1. Environment variable (`OLYMPIAD_IDENTITY_KEY`)
//! 2. Config file (with warning)

/// Environment variable holding the auth API key.
pub const IDENTITY_KEY_ENV: &str = "OLYMPIAD_IDENTITY_KEY";

/// Result of key resolution with provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSecret {
    /// The secret value.
    pub value: String,
    /// Where the secret was found.
    pub source: SecretSource,
}

/// Where a secret was resolved from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretSource {
    /// Environment variable.
    EnvVar(String),
    /// Config file (plaintext, not recommended).
    ConfigFile,
}

impl std::fmt::Display for SecretSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecretSource::EnvVar(var) => write!(f, "env var {}", var),
            SecretSource::ConfigFile => write!(f, "config file (plaintext)"),
        }
    }
}

/// Resolve the auth API key from the environment, then the config value.
pub fn resolve_identity_key(config_value: Option<&str>) -> Option<ResolvedSecret> {
    resolve_with(std::env::var(IDENTITY_KEY_ENV).ok(), config_value)
}

fn resolve_with(env_value: Option<String>, config_value: Option<&str>) -> Option<ResolvedSecret> {
    if let Some(value) = env_value.filter(|v| !v.is_empty()) {
        return Some(ResolvedSecret {
            value,
            source: SecretSource::EnvVar(IDENTITY_KEY_ENV.to_string()),
        });
    }

    config_value
        .filter(|v| !v.is_empty())
        .map(|v| ResolvedSecret {
            value: v.to_string(),
            source: SecretSource::ConfigFile,
        })
}
