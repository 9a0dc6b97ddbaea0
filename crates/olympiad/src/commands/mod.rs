//! CLI command handlers.

pub mod check;
pub mod config;
pub mod start;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context as _, Result, bail};

use olympiad_config::{
    ConfigSource, GateSection, IdentitySection, LoadedConfig, ResolverErrorMode,
    resolve_identity_key,
};
use olympiad_server::{
    AuthApiConfig, AuthApiResolver, GateConfig, ResolverFailureMode, RolePolicy, RouteMatcher,
};

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
    /// User config directory override.
    pub config_dir: Option<PathBuf>,
}

impl Context {
    /// Load configuration from an explicit file, or by layered discovery.
    pub fn load_config(
        &self,
        explicit: Option<&Path>,
        project_dir: Option<&Path>,
    ) -> Result<LoadedConfig> {
        let loaded = match explicit {
            Some(path) => {
                let config = olympiad_config::load_config_file(path)?;
                config.validate()?;
                let source = ConfigSource {
                    path: path.to_path_buf(),
                    loaded: true,
                };
                LoadedConfig {
                    config,
                    sources: vec![source.clone()],
                    source: Some(source),
                    warnings: Vec::new(),
                }
            }
            None => olympiad_config::load_config_with_options(
                project_dir,
                self.config_dir.as_deref(),
            )?,
        };

        for warning in &loaded.warnings {
            eprintln!("warning: {}", warning);
        }

        Ok(loaded)
    }
}

/// Translate the `[gate]` section into the server's gate settings.
pub fn gate_config(section: &GateSection) -> GateConfig {
    let role_policy = if section.enforce_admin_role {
        RolePolicy::Enforce
    } else {
        RolePolicy::Ignore
    };
    let failure_mode = match section.on_resolver_error {
        ResolverErrorMode::Anonymous => ResolverFailureMode::Anonymous,
        ResolverErrorMode::Reject => ResolverFailureMode::Reject,
    };

    GateConfig::new()
        .with_cookie_name(section.cookie_name.clone())
        .with_ttl(Duration::from_secs(section.ttl_secs))
        .with_sweep_threshold(section.sweep_threshold)
        .with_redirects(section.login_path.clone(), section.dashboard_path.clone())
        .with_role_policy(role_policy)
        .with_resolver_failure_mode(failure_mode)
        .with_matcher(RouteMatcher::new(
            section.excluded_prefixes.iter().cloned(),
            section.excluded_extensions.iter().cloned(),
        ))
}

/// Build the auth API resolver from the `[identity]` section.
///
/// `url_override` and `key_override` come from the command line and win
/// over everything else.
pub fn identity_resolver(
    section: Option<&IdentitySection>,
    url_override: Option<&str>,
    key_override: Option<&str>,
) -> Result<AuthApiResolver> {
    let defaults = IdentitySection::default();
    let section = section.unwrap_or(&defaults);

    let url = match url_override {
        Some(url) => url.to_string(),
        None => section.require_url()?.to_string(),
    };

    let api_key = match key_override {
        Some(key) => key.to_string(),
        None => match resolve_identity_key(section.anon_key.as_deref()) {
            Some(secret) => {
                tracing::debug!(source = %secret.source, "Resolved identity API key");
                secret.value
            }
            None => bail!(
                "identity API key not found. Set {} or [identity].anon_key",
                olympiad_config::IDENTITY_KEY_ENV
            ),
        },
    };

    let config = AuthApiConfig::new(url, api_key)
        .with_timeout(Duration::from_secs(section.timeout_secs));
    AuthApiResolver::new(&config).context("failed to build identity resolver")
}
