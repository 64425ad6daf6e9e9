//! Network-sync state shared by the submission path.

use arc_swap::ArcSwap;
use serde::Serialize;
use std::sync::Arc;

/// Latest known state of the consensus core.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CoreState {
    /// Whether the core is caught up with the network.
    pub synced: bool,
    /// Sequence of the latest ledger the core has closed.
    pub latest_ledger: u32,
}

/// Read side of the core state, as the submission handler sees it.
pub trait CoreStateGetter: Send + Sync {
    fn core_state(&self) -> CoreState;
}

/// Lock-free cell holding the current `CoreState`.
///
/// Starts unsynced; writers are the core monitor (and tests).
#[derive(Debug, Clone, Default)]
pub struct CoreStateCell {
    inner: Arc<ArcSwap<CoreState>>,
}

impl CoreStateCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current state, returning whether `synced` flipped.
    pub fn set(&self, state: CoreState) -> bool {
        let previous = self.inner.swap(Arc::new(state));
        previous.synced != state.synced
    }
}

impl CoreStateGetter for CoreStateCell {
    fn core_state(&self) -> CoreState {
        **self.inner.load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_unsynced() {
        let cell = CoreStateCell::new();
        assert!(!cell.core_state().synced);
    }

    #[test]
    fn test_set_reports_transitions() {
        let cell = CoreStateCell::new();
        let clone = cell.clone();

        assert!(cell.set(CoreState {
            synced: true,
            latest_ledger: 10
        }));
        assert!(!cell.set(CoreState {
            synced: true,
            latest_ledger: 11
        }));
        assert_eq!(clone.core_state().latest_ledger, 11);
    }
}
