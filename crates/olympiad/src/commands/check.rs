//! Check command - runs one path through the session gate.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Result, bail};
use clap::Args;
use serde::Serialize;

use olympiad_server::{
    Decision, GateOutcome, MockResolver, Principal, ResolverFailureMode, RouteClass,
    SessionGate, SharedResolver, SimpleRequest,
};
use olympiad_session::MemorySessionCache;

use super::{Context, gate_config, identity_resolver};

/// Token used when a principal is simulated without an explicit token.
const SIMULATED_TOKEN: &str = "cli-simulated-token";

/// Arguments for the check command.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Request path, e.g. /dashboard/results
    pub path: String,

    /// Credential token to present as the session cookie
    #[arg(long)]
    pub token: Option<String>,

    /// Simulate a signed-in caller with this ID (no auth API call)
    #[arg(long)]
    pub principal: Option<String>,

    /// Give the simulated caller the admin role
    #[arg(long, requires = "principal")]
    pub admin: bool,

    /// Project directory holding olympiad.toml (default: current directory)
    #[arg(long)]
    pub project_dir: Option<PathBuf>,

    /// Path to config file (overrides default discovery)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Machine-readable check result.
#[derive(Debug, Serialize)]
struct CheckReport {
    path: String,
    excluded: bool,
    class: RouteClass,
    decision: Decision,
    location: Option<String>,
    principal: Option<Principal>,
}

/// Run the check command.
pub async fn run(args: CheckArgs, ctx: &Context) -> Result<()> {
    if !args.path.starts_with('/') {
        bail!("path must start with '/': {}", args.path);
    }

    let loaded = ctx.load_config(args.config.as_deref(), args.project_dir.as_deref())?;
    let config = &loaded.config;
    let gate_cfg = gate_config(&config.gate_or_default());

    let token = args
        .token
        .clone()
        .or_else(|| args.principal.as_ref().map(|_| SIMULATED_TOKEN.to_string()));

    let resolver: SharedResolver = match (&args.principal, &token) {
        (Some(id), Some(token)) => {
            let mut principal = Principal::new(id.clone());
            if args.admin {
                principal = principal.with_role(olympiad_server::Role::Admin);
            }
            Arc::new(MockResolver::new().with_principal(token.clone(), principal))
        }
        (None, Some(_)) => Arc::new(identity_resolver(config.identity.as_ref(), None, None)?),
        // Without a token there is nothing to look up.
        _ => Arc::new(MockResolver::new()),
    };

    let report = evaluate(
        SessionGate::new(resolver, Arc::new(MemorySessionCache::new()), gate_cfg),
        &args.path,
        token.as_deref(),
    )
    .await?;

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("path:      {}", report.path);
    if report.excluded {
        println!("excluded:  yes (the gate does not run)");
        return Ok(());
    }
    println!("class:     {}", report.class);
    println!("decision:  {:?}", report.decision);
    if let Some(ref location) = report.location {
        println!("location:  {}", location);
    }
    match report.principal {
        Some(ref p) => println!(
            "principal: {} ({:?}{})",
            p.id,
            p.role,
            p.email
                .as_deref()
                .map(|e| format!(", {}", e))
                .unwrap_or_default()
        ),
        None => println!("principal: (none)"),
    }

    Ok(())
}

async fn evaluate(gate: SessionGate, path: &str, token: Option<&str>) -> Result<CheckReport> {
    let class = RouteClass::classify(path);

    if gate.config().matcher.is_excluded(path) {
        return Ok(CheckReport {
            path: path.to_string(),
            excluded: true,
            class,
            decision: Decision::Allow,
            location: None,
            principal: None,
        });
    }

    let mut request = SimpleRequest::new(path);
    if let Some(token) = token {
        request = request.with_cookie(gate.config().cookie_name.clone(), token);
    }

    let outcome: GateOutcome = match gate.evaluate(&request).await {
        Ok(outcome) => outcome,
        Err(e) => match gate.config().on_resolver_error {
            ResolverFailureMode::Anonymous => {
                tracing::warn!(error = %e, "Identity lookup failed, treating caller as anonymous");
                gate.decide(path, class, None)
            }
            ResolverFailureMode::Reject => return Err(e.into()),
        },
    };

    Ok(CheckReport {
        path: path.to_string(),
        excluded: false,
        class: outcome.class,
        decision: outcome.decision,
        location: outcome.redirect_target(gate.config()).map(str::to_string),
        principal: outcome.principal,
    })
}
