//! Error types for session cache operations.

/// Error type for session cache operations.
///
/// The in-memory cache never fails; these exist for shared backends
/// plugged in behind [`crate::SessionCache`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The cache backend could not be reached or rejected the operation.
    #[error("Cache backend error: {0}")]
    Backend(String),
}

/// Result type for session cache operations.
pub type Result<T> = std::result::Result<T, Error>;
