//! HTTP routes.

pub mod health;
pub mod pages;

pub use health::{HealthResponse, health_routes};
pub use pages::{PageResponse, page_handler};
