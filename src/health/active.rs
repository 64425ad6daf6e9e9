//! Active core-state polling.
//!
//! # Responsibilities
//! - Periodically ask the network sink for its sync state
//! - Publish the result into the shared `CoreStateCell`
//! - Fail closed: an unreachable core counts as not synced

use std::sync::Arc;
use std::time::Duration;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::health::state::{CoreState, CoreStateCell, CoreStateGetter};
use crate::observability::metrics;
use crate::txsub::NetworkSink;

pub struct CoreMonitor {
    sink: Arc<dyn NetworkSink>,
    state: CoreStateCell,
    interval: Duration,
    timeout: Duration,
}

impl CoreMonitor {
    pub fn new(
        sink: Arc<dyn NetworkSink>,
        state: CoreStateCell,
        interval: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            sink,
            state,
            interval,
            timeout,
        }
    }

    /// Poll until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) {
        tracing::info!(interval = ?self.interval, "Core monitor starting");

        let mut ticker = time::interval(self.interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.check().await;
                }
                _ = shutdown.cancelled() => {
                    tracing::info!("Core monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Run a single status check and publish the result.
    pub async fn check(&self) -> CoreState {
        let state = match time::timeout(self.timeout, self.sink.status()).await {
            Ok(Ok(status)) => CoreState {
                synced: status.synced,
                latest_ledger: status.latest_ledger,
            },
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Core status check failed");
                CoreState {
                    synced: false,
                    ..self.state.core_state()
                }
            }
            Err(_) => {
                tracing::warn!("Core status check failed: timeout");
                CoreState {
                    synced: false,
                    ..self.state.core_state()
                }
            }
        };

        if self.state.set(state) {
            tracing::info!(
                synced = state.synced,
                latest_ledger = state.latest_ledger,
                "Core sync state changed"
            );
        }
        metrics::record_core_synced(state.synced);
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    use crate::txsub::{BroadcastOutcome, CoreStatus, SinkError, Submission};

    struct FlakyCore {
        up: AtomicBool,
    }

    #[async_trait]
    impl NetworkSink for FlakyCore {
        async fn broadcast(&self, _: &Submission) -> Result<BroadcastOutcome, SinkError> {
            Err(SinkError::Transport("unused".into()))
        }

        async fn status(&self) -> Result<CoreStatus, SinkError> {
            if self.up.load(Ordering::SeqCst) {
                Ok(CoreStatus {
                    synced: true,
                    latest_ledger: 42,
                })
            } else {
                Err(SinkError::Transport("down".into()))
            }
        }
    }

    #[tokio::test]
    async fn test_check_fails_closed() {
        let core = Arc::new(FlakyCore {
            up: AtomicBool::new(true),
        });
        let cell = CoreStateCell::new();
        let monitor = CoreMonitor::new(
            core.clone(),
            cell.clone(),
            Duration::from_secs(1),
            Duration::from_secs(1),
        );

        monitor.check().await;
        assert_eq!(
            cell.core_state(),
            CoreState {
                synced: true,
                latest_ledger: 42
            }
        );

        core.up.store(false, Ordering::SeqCst);
        monitor.check().await;
        let state = cell.core_state();
        assert!(!state.synced);
        assert_eq!(state.latest_ledger, 42);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let core = Arc::new(FlakyCore {
            up: AtomicBool::new(true),
        });
        let cell = CoreStateCell::new();
        let monitor = CoreMonitor::new(
            core,
            cell.clone(),
            Duration::from_millis(10),
            Duration::from_secs(1),
        );

        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(monitor.run(shutdown.clone()));
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown.cancel();
        handle.await.unwrap();

        assert!(cell.core_state().synced);
    }
}
