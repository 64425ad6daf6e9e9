//! Shutdown coordination for the gateway.

use tokio_util::sync::CancellationToken;

/// Coordinator for graceful shutdown.
///
/// Long-running tasks (server, core monitor, streams) hold a child token
/// and stop when the root is cancelled.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    token: CancellationToken,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Token for a task that must stop on shutdown.
    pub fn subscribe(&self) -> CancellationToken {
        self.token.child_token()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        self.token.cancel();
    }

    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolve once shutdown has been triggered.
    pub async fn wait(&self) {
        self.token.cancelled().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_reaches_subscribers() {
        let shutdown = Shutdown::new();
        let a = shutdown.subscribe();
        let b = shutdown.subscribe();
        assert!(!a.is_cancelled());

        shutdown.trigger();
        a.cancelled().await;
        b.cancelled().await;
        assert!(shutdown.is_triggered());
    }

    #[tokio::test]
    async fn test_subscriber_cancel_does_not_propagate_up() {
        let shutdown = Shutdown::new();
        let child = shutdown.subscribe();
        child.cancel();
        assert!(!shutdown.is_triggered());
    }
}
