//! Session gate and HTTP server for the Olympiad portal.
//!
//! This crate decides, for every navigational request, whether the caller
//! may proceed or must be redirected:
//!
//! # Features
//!
//! - Route classification (protected, auth-only, public)
//! - Cached identity resolution against the hosted auth API
//! - Redirects to login/dashboard
//! - Role guard for the admin back-office
//! - Request logging
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use olympiad_server::{AuthApiConfig, AuthApiResolver, Server, ServerConfig};
//!
//! let resolver = AuthApiResolver::new(&AuthApiConfig::new(url, anon_key))?;
//! let config = ServerConfig::new().with_bind_address("127.0.0.1:3000".parse()?);
//!
//! let server = Server::new(Arc::new(resolver), config);
//! server.run().await?;
//! ```

pub mod auth;
pub mod auth_api;
pub mod config;
pub mod error;
pub mod gate;
pub mod identity;
pub mod logging;
pub mod policy;
pub mod route;
pub mod routes;
pub mod state;

pub use auth::{AuthPrincipal, cookie_value, role_guard_middleware, session_gate_middleware};
pub use auth_api::{AuthApiConfig, AuthApiResolver};
pub use config::{GateConfig, ResolverFailureMode, ServerConfig};
pub use error::{GateError, Result, ServerError};
pub use gate::{GateOutcome, GateRequest, PrincipalCache, SessionGate, SimpleRequest};
pub use identity::{
    IdentityResolver, MockResolver, Principal, ResolveError, Role, SharedResolver,
};
pub use logging::request_logging_middleware;
pub use policy::{Decision, RolePolicy};
pub use route::{RouteClass, RouteMatcher};
pub use state::AppState;

use std::net::SocketAddr;

use axum::{Router, middleware};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// The portal gate server.
pub struct Server {
    /// Application state.
    state: AppState,
}

impl Server {
    /// Create a new server with the given resolver and configuration.
    pub fn new(resolver: SharedResolver, config: ServerConfig) -> Self {
        Self {
            state: AppState::new(resolver, config),
        }
    }

    /// Create a server from a pre-built application state.
    pub fn from_state(state: AppState) -> Self {
        Self { state }
    }

    /// Build the router with all routes and middleware.
    pub fn router(&self) -> Router {
        Router::new()
            // Excluded from the gate by the matcher
            .merge(routes::health_routes())
            // Every page, admin back-office included
            .fallback(routes::page_handler)
            // Role guard for every admin path, after the session gate
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                auth::role_guard_middleware,
            ))
            // Session gate (runs after request logging)
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                auth::session_gate_middleware,
            ))
            .layer(middleware::from_fn_with_state(
                self.state.clone(),
                logging::request_logging_middleware,
            ))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Run the server.
    pub async fn run(self) -> Result<()> {
        let addr = self.state.config.bind_address;
        self.run_on(addr).await
    }

    /// Run the server on a specific address (useful for testing).
    pub async fn run_on(self, addr: SocketAddr) -> Result<()> {
        let router = self.router();

        info!("Starting server on {}", addr);

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Internal(format!("Failed to bind: {}", e)))?;

        axum::serve(listener, router)
            .await
            .map_err(|e| ServerError::Internal(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Get the configured bind address.
    pub fn bind_address(&self) -> SocketAddr {
        self.state.config.bind_address
    }

    /// Application state.
    pub fn state(&self) -> &AppState {
        &self.state
    }
}
