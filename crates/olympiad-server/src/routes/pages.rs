//! Page placeholder.
//!
//! The portal's pages are rendered elsewhere. This handler answers for any
//! navigational path that made it past the gate, reporting what the gate
//! saw so upstream renderers (and tests) can rely on it.

use axum::{Json, extract::OriginalUri};
use serde::{Deserialize, Serialize};

use crate::auth::AuthPrincipal;
use crate::identity::Principal;
use crate::route::RouteClass;

/// Body returned for a page request that passed the gate.
#[derive(Debug, Serialize, Deserialize)]
pub struct PageResponse {
    /// Requested path.
    pub path: String,
    /// Route class of the path.
    pub class: RouteClass,
    /// Caller resolved by the gate, if any.
    pub principal: Option<Principal>,
}

/// Fallback handler for page paths.
pub async fn page_handler(
    OriginalUri(uri): OriginalUri,
    AuthPrincipal(principal): AuthPrincipal,
) -> Json<PageResponse> {
    let path = uri.path().to_string();
    Json(PageResponse {
        class: RouteClass::classify(&path),
        path,
        principal,
    })
}
