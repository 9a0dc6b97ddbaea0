//! Config command - configuration management.

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Args, Subcommand};

use olympiad_config::{
    GateSection, IDENTITY_KEY_ENV, IdentitySection, PortalConfig, ServerSection,
    resolve_identity_key, save_config,
};

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Project directory holding olympiad.toml (default: current directory)
    #[arg(long, global = true)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the resolved configuration
    Show,

    /// Show which config files are loaded and their precedence
    Which,

    /// Write a config file with every section at its defaults
    Init {
        /// Create project-local config (./olympiad.toml) instead of user config
        #[arg(long)]
        local: bool,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show configuration file path
    Path,
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => cmd_show(ctx, args.project_dir).await,
        ConfigCommand::Which => cmd_which(ctx, args.project_dir).await,
        ConfigCommand::Init { local, force } => {
            cmd_init(ctx, args.project_dir, local, force).await
        }
        ConfigCommand::Path => cmd_path(ctx).await,
    }
}

async fn cmd_show(ctx: &Context, project_dir: Option<PathBuf>) -> Result<()> {
    let loaded = ctx.load_config(None, project_dir.as_deref())?;
    let config = &loaded.config;
    let server = config.server_or_default();
    let gate = config.gate_or_default();
    let identity = config.identity.clone().unwrap_or_default();
    let key = resolve_identity_key(identity.anon_key.as_deref());

    if ctx.json_output {
        let value = serde_json::json!({
            "sources": loaded.loaded_from(),
            "server": server,
            "gate": gate,
            "identity": {
                "url": identity.url,
                "timeout_secs": identity.timeout_secs,
                "key_source": key.as_ref().map(|k| k.source.to_string()),
            },
            "warnings": loaded.warnings,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("# Olympiad Configuration\n");

    let sources = loaded.loaded_from();
    if sources.is_empty() {
        println!("No config files loaded (using defaults)\n");
    } else {
        println!("Config files:");
        for source in &sources {
            println!("  {}", source.display());
        }
        println!();
    }

    println!("Server:");
    println!("  bind: {}:{}", server.bind, server.port);
    println!("  request logging: {}", server.request_logging);
    println!();

    println!("Gate:");
    println!("  cookie: {}", gate.cookie_name);
    println!("  ttl: {}s", gate.ttl_secs);
    println!("  sweep threshold: {}", gate.sweep_threshold);
    println!("  login: {}", gate.login_path);
    println!("  dashboard: {}", gate.dashboard_path);
    println!("  on resolver error: {:?}", gate.on_resolver_error);
    println!("  enforce admin role: {}", gate.enforce_admin_role);
    println!("  excluded prefixes: {}", gate.excluded_prefixes.join(", "));
    println!("  excluded extensions: {}", gate.excluded_extensions.join(", "));
    println!();

    println!("Identity:");
    println!("  url: {}", identity.url.as_deref().unwrap_or("(not set)"));
    match key {
        Some(ref secret) => println!("  key: ✓ {}", secret.source),
        None => println!("  key: ✗ not set"),
    }
    println!("  timeout: {}s", identity.timeout_secs);
    println!();

    if !loaded.warnings.is_empty() {
        println!("Warnings:");
        for w in &loaded.warnings {
            println!("  ⚠ {}", w);
        }
        println!();
    }

    if ctx.verbose {
        println!("---\nRaw config:\n");
        if let Ok(toml_str) = config.to_toml() {
            println!("{}", toml_str);
        }
    }

    Ok(())
}

async fn cmd_which(ctx: &Context, project_dir: Option<PathBuf>) -> Result<()> {
    let loaded = ctx.load_config(None, project_dir.as_deref())?;

    if ctx.json_output {
        let sources: Vec<_> = loaded
            .sources
            .iter()
            .map(|s| serde_json::json!({ "path": s.path, "loaded": s.loaded }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&sources)?);
        return Ok(());
    }

    println!("Config file search order (later overrides earlier):\n");

    for source in &loaded.sources {
        let status = if source.loaded {
            "✓ loaded"
        } else {
            "· not found"
        };
        println!("  {} {}", status, source.path.display());
    }

    println!();
    println!("CLI arguments override all config files.");

    Ok(())
}

async fn cmd_init(
    ctx: &Context,
    project_dir: Option<PathBuf>,
    local: bool,
    force: bool,
) -> Result<()> {
    let path = if local {
        project_dir
            .unwrap_or_else(|| PathBuf::from("."))
            .join("olympiad.toml")
    } else {
        user_config_path(ctx)?
    };

    let exists = path.exists();
    if exists && !force {
        if ctx.json_output {
            let value = serde_json::json!({ "path": path, "created": false });
            println!("{}", serde_json::to_string_pretty(&value)?);
        } else {
            println!("Config file already exists: {}", path.display());
            println!("Use --force to overwrite it.");
        }
        return Ok(());
    }

    // The key stays out of the file; it belongs in the environment.
    let config = PortalConfig {
        server: Some(ServerSection::default()),
        gate: Some(GateSection::default()),
        identity: Some(IdentitySection::default()),
    };
    save_config(&config, &path)?;
    tracing::info!(path = %path.display(), overwritten = exists, "Wrote config file");

    if ctx.json_output {
        let value = serde_json::json!({ "path": path, "created": true });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("Created config file: {}", path.display());
    println!(
        "Set identity.url there and export {} before running `olympiad start`.",
        IDENTITY_KEY_ENV
    );
    Ok(())
}

async fn cmd_path(ctx: &Context) -> Result<()> {
    println!("{}", user_config_path(ctx)?.display());
    Ok(())
}

fn user_config_path(ctx: &Context) -> Result<PathBuf> {
    match ctx.config_dir {
        Some(ref dir) => Ok(dir.join("config.toml")),
        None => match olympiad_config::xdg_config_path() {
            Some(path) => Ok(path),
            None => bail!("could not determine config directory"),
        },
    }
}
