//! Socket Proxy for Briefing
//!
//! Unix socket server through which local agents and the `briefing` CLI
//! reach the summarization service and heuristics.
//!
//! Protocol: JSON-RPC 2.0 over Unix socket at `~/.briefing/briefing.sock`

pub mod handlers;
pub mod server;

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;

pub use server::ProxyServer;

use crate::config::ConfigError;
use crate::inference::WorkerError;

/// Proxy server state shared across connections
#[derive(Default)]
pub struct ProxyState {
    connection_count: AtomicU64,
    active_connections: AtomicU32,
}

impl ProxyState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn connection_opened(&self) {
        self.connection_count.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        let _ = self
            .active_connections
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| Some(n.saturating_sub(1)));
    }

    /// Connections accepted since startup
    pub fn connection_count(&self) -> u64 {
        self.connection_count.load(Ordering::Relaxed)
    }

    pub fn active_connections(&self) -> u32 {
        self.active_connections.load(Ordering::Relaxed)
    }
}

/// Startup errors for the daemon
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Worker pool error: {0}")]
    Worker(#[from] WorkerError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_counters() {
        let state = ProxyState::new();
        state.connection_opened();
        state.connection_opened();
        state.connection_closed();
        assert_eq!(state.connection_count(), 2);
        assert_eq!(state.active_connections(), 1);

        state.connection_closed();
        state.connection_closed();
        assert_eq!(state.active_connections(), 0);
    }
}
