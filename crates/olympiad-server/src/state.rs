//! Application state shared across handlers.

use std::sync::Arc;

use olympiad_session::{MemorySessionCache, SharedClock};

use crate::config::ServerConfig;
use crate::gate::{PrincipalCache, SessionGate};
use crate::identity::SharedResolver;

/// Application state shared across all handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,

    /// The session gate (resolver + cache).
    gate: SessionGate,
}

impl AppState {
    /// Create state with a process-local session cache.
    pub fn new(resolver: SharedResolver, config: ServerConfig) -> Self {
        Self::with_cache(resolver, Arc::new(MemorySessionCache::new()), config)
    }

    /// Create state with an explicit session cache (e.g. a shared backend).
    pub fn with_cache(resolver: SharedResolver, cache: PrincipalCache, config: ServerConfig) -> Self {
        let gate = SessionGate::new(resolver, cache, config.gate.clone());
        Self {
            config: Arc::new(config),
            gate,
        }
    }

    /// Replace the gate's clock.
    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.gate = self.gate.with_clock(clock);
        self
    }

    /// Server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The session gate.
    pub fn gate(&self) -> &SessionGate {
        &self.gate
    }
}
