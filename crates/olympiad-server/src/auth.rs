//! Session gate and role guard middleware.
//!
//! - [`session_gate_middleware`] runs the [`SessionGate`] for every request
//!   inside the matcher boundary and injects the resolved [`Principal`] into
//!   request extensions.
//! - [`role_guard_middleware`] applies the role-aware policy to every admin
//!   path, using the principal the session gate already resolved. It never
//!   touches the cache.
//!
//! [`SessionGate`]: crate::gate::SessionGate

use axum::{
    body::Body,
    extract::{FromRequestParts, OriginalUri, Request, State},
    http::{Extensions, HeaderMap, Uri, header::COOKIE, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::warn;

use crate::config::{GateConfig, ResolverFailureMode};
use crate::error::ServerError;
use crate::gate::GateRequest;
use crate::identity::Principal;
use crate::policy::{self, Decision};
use crate::route::{self, RouteClass};
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Request adapter
// ─────────────────────────────────────────────────────────────────────────────

impl GateRequest for Parts {
    fn path(&self) -> &str {
        original_path(&self.extensions, &self.uri)
    }

    fn cookie(&self, name: &str) -> Option<String> {
        cookie_value(&self.headers, name)
    }
}

/// Path as the client sent it, even inside nested routers.
fn original_path<'a>(extensions: &'a Extensions, uri: &'a Uri) -> &'a str {
    extensions
        .get::<OriginalUri>()
        .map(|original| original.0.path())
        .unwrap_or_else(|| uri.path())
}

/// Find a cookie in the `Cookie` headers.
///
/// Later headers and later pairs do not override earlier ones; the first
/// match wins. Surrounding double quotes are stripped from the value.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| {
            let value = value.trim();
            value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value)
                .to_string()
        })
}

fn redirect_for(decision: Decision, config: &GateConfig) -> Option<Response> {
    match decision {
        Decision::Allow => None,
        Decision::RedirectToLogin => Some(Redirect::temporary(&config.login_path).into_response()),
        Decision::RedirectToDashboard => {
            Some(Redirect::temporary(&config.dashboard_path).into_response())
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Middleware
// ─────────────────────────────────────────────────────────────────────────────

/// Session gate middleware.
///
/// Paths outside the matcher boundary pass through untouched. Otherwise the
/// gate either redirects or forwards the request with the principal (if any)
/// in its extensions.
pub async fn session_gate_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let gate = state.gate();
    let config = gate.config();

    if config
        .matcher
        .is_excluded(original_path(request.extensions(), request.uri()))
    {
        return next.run(request).await;
    }

    // Evaluate against the parts so no reference to the body is held across
    // the resolver call.
    let (mut parts, body) = request.into_parts();

    let outcome = match gate.evaluate(&parts).await {
        Ok(outcome) => outcome,
        Err(e) => match config.on_resolver_error {
            ResolverFailureMode::Anonymous => {
                let path = parts.path();
                warn!(path = %path, error = %e, "Identity lookup failed, treating caller as anonymous");
                gate.decide(path, RouteClass::classify(path), None)
            }
            ResolverFailureMode::Reject => {
                return ServerError::from(e).into_response();
            }
        },
    };

    if let Some(redirect) = redirect_for(outcome.decision, config) {
        return redirect;
    }

    if let Some(principal) = outcome.principal {
        parts.extensions.insert(principal);
    }

    next.run(Request::from_parts(parts, body)).await
}

/// Role guard middleware.
///
/// Layer it inside [`session_gate_middleware`] over the whole router,
/// fallback included. It acts on every path under the admin prefix and
/// passes everything else through. Anonymous callers go to the login page
/// and non-admins go to the dashboard.
pub async fn role_guard_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let config = state.gate().config();
    let path = original_path(request.extensions(), request.uri());

    if !route::is_admin_path(path) || config.matcher.is_excluded(path) {
        return next.run(request).await;
    }

    let decision = policy::authorize(path, request.extensions().get::<Principal>());

    match redirect_for(decision, config) {
        Some(redirect) => redirect,
        None => next.run(request).await,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Extractor
// ─────────────────────────────────────────────────────────────────────────────

/// The caller resolved by the gate, if any.
///
/// ```ignore
/// async fn my_handler(AuthPrincipal(principal): AuthPrincipal) -> String {
///     match principal {
///         Some(p) => format!("Hello, {}", p.id),
///         None => "Hello, guest".to_string(),
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthPrincipal(pub Option<Principal>);

impl<S> FromRequestParts<S> for AuthPrincipal
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(AuthPrincipal(parts.extensions.get::<Principal>().cloned()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
