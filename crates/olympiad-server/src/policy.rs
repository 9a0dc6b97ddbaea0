//! Authorization policy shared by the session gate and the role guard.

use serde::{Deserialize, Serialize};

use crate::identity::Principal;
use crate::route::{RouteClass, is_admin_path};

/// Outcome of evaluating a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Pass the request through unchanged.
    Allow,
    /// Send the caller to the login page.
    RedirectToLogin,
    /// Send the caller to their dashboard.
    RedirectToDashboard,
}

impl Decision {
    /// Check if the request proceeds.
    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Whether admin-designated paths check the principal's role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RolePolicy {
    /// Any principal may enter protected paths.
    #[default]
    Ignore,
    /// Non-admin principals on admin paths go to the dashboard.
    Enforce,
}

/// Decide what happens to a request for `path`.
pub fn evaluate(
    path: &str,
    class: RouteClass,
    principal: Option<&Principal>,
    roles: RolePolicy,
) -> Decision {
    match (class, principal) {
        (RouteClass::Public, _) => Decision::Allow,
        (RouteClass::Protected, None) => Decision::RedirectToLogin,
        (RouteClass::Protected, Some(p))
            if roles == RolePolicy::Enforce && is_admin_path(path) && !p.is_admin() =>
        {
            Decision::RedirectToDashboard
        }
        (RouteClass::Protected, Some(_)) => Decision::Allow,
        (RouteClass::AuthOnly, Some(_)) => Decision::RedirectToDashboard,
        (RouteClass::AuthOnly, None) => Decision::Allow,
    }
}

/// Role-aware decision for an already-resolved principal.
///
/// This is the check applied by [`crate::auth::role_guard_middleware`];
/// it never consults the session cache.
pub fn authorize(path: &str, principal: Option<&Principal>) -> Decision {
    evaluate(
        path,
        RouteClass::classify(path),
        principal,
        RolePolicy::Enforce,
    )
}
