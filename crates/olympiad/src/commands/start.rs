//! Start command - launches the gate server.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Args;

use olympiad_config::PortalConfig;
use olympiad_server::{Server, ServerConfig};

use super::{Context, gate_config, identity_resolver};

/// Arguments for the start command.
///
/// CLI arguments override config file values.
#[derive(Args, Debug)]
pub struct StartArgs {
    /// Port to listen on (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Address to bind to (overrides config)
    #[arg(short, long)]
    pub bind: Option<String>,

    /// Auth API base URL (overrides config)
    #[arg(long)]
    pub identity_url: Option<String>,

    /// Auth API key (overrides env var and config)
    #[arg(long)]
    pub identity_key: Option<String>,

    /// Cache TTL in seconds (overrides config)
    #[arg(long)]
    pub ttl_secs: Option<u64>,

    /// Project directory holding olympiad.toml (default: current directory)
    #[arg(long)]
    pub project_dir: Option<PathBuf>,

    /// Path to config file (overrides default discovery)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Run the start command.
pub async fn run(args: StartArgs, ctx: &Context) -> Result<()> {
    let loaded = ctx.load_config(args.config.as_deref(), args.project_dir.as_deref())?;

    if ctx.verbose {
        let sources = loaded.loaded_from();
        if sources.is_empty() {
            println!("No config files found, using defaults + CLI args");
        } else {
            for source in sources {
                println!("Loaded config: {}", source.display());
            }
        }
    }

    let config = &loaded.config;
    let server_config = server_config(config, &args)?;

    let resolver = identity_resolver(
        config.identity.as_ref(),
        args.identity_url.as_deref(),
        args.identity_key.as_deref(),
    )?;

    tracing::info!(
        addr = %server_config.bind_address,
        identity = %resolver.user_url(),
        ttl_secs = server_config.gate.cache.ttl.as_secs(),
        "Starting olympiad gate"
    );

    let server = Server::new(Arc::new(resolver), server_config);
    server.run().await?;

    Ok(())
}

/// Merge the `[server]`/`[gate]` sections with CLI overrides.
fn server_config(config: &PortalConfig, args: &StartArgs) -> Result<ServerConfig> {
    let server = config.server_or_default();
    let mut gate = config.gate_or_default();

    if let Some(ttl) = args.ttl_secs {
        anyhow::ensure!(ttl > 0, "--ttl-secs must be greater than zero");
        gate.ttl_secs = ttl;
    }

    let bind = args.bind.as_deref().unwrap_or(server.bind.as_str());
    let ip: IpAddr = bind
        .parse()
        .with_context(|| format!("invalid bind address '{}'", bind))?;
    let port = args.port.unwrap_or(server.port);

    Ok(ServerConfig::new()
        .with_bind_address(SocketAddr::new(ip, port))
        .with_request_logging(server.request_logging)
        .with_gate(gate_config(&gate)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: StartArgs,
    }

    fn parse(argv: &[&str]) -> StartArgs {
        let mut full = vec!["start"];
        full.extend_from_slice(argv);
        TestCli::parse_from(full).args
    }

    #[test]
    fn test_server_config_from_file() {
        let config = PortalConfig::from_toml(
            r#"
[server]
port = 8080
bind = "0.0.0.0"
request_logging = false

[gate]
ttl_secs = 60
"#,
        )
        .unwrap();

        let server = server_config(&config, &parse(&[])).unwrap();
        assert_eq!(server.bind_address, "0.0.0.0:8080".parse().unwrap());
        assert!(!server.request_logging);
        assert_eq!(server.gate.cache.ttl.as_secs(), 60);
    }

    #[test]
    fn test_cli_overrides_config() {
        let config = PortalConfig::from_toml("[server]\nport = 8080\n").unwrap();

        let server = server_config(
            &config,
            &parse(&["--port", "9999", "--bind", "::1", "--ttl-secs", "5"]),
        )
        .unwrap();

        assert_eq!(server.bind_address, "[::1]:9999".parse().unwrap());
        assert_eq!(server.gate.cache.ttl.as_secs(), 5);
    }

    #[test]
    fn test_defaults_without_config() {
        let server = server_config(&PortalConfig::new(), &parse(&[])).unwrap();
        assert_eq!(server.bind_address, "127.0.0.1:3000".parse().unwrap());
        assert_eq!(server.gate.cookie_name, "sb-access-token");
    }

    #[test]
    fn test_invalid_bind_rejected() {
        let err = server_config(&PortalConfig::new(), &parse(&["--bind", "localhost"]))
            .unwrap_err();
        assert!(err.to_string().contains("invalid bind address"));
    }

    #[test]
    fn test_zero_ttl_rejected() {
        assert!(server_config(&PortalConfig::new(), &parse(&["--ttl-secs", "0"])).is_err());
    }
}
