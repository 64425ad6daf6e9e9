//! Submission coordinator.
//!
//! # Responsibilities
//! - Broadcast each distinct transaction hash at most once while it is pending
//! - Attach concurrent submissions of the same hash to the pending outcome
//! - Bound every broadcast by the wait budget
//! - Deliver exactly one `SubmissionResult` to every waiter
//!
//! # Data Flow
//! ```text
//! submit(ctx, raw, parsed, hash)
//!     → pending table (hash → watch::Sender<Option<SubmissionResult>>)
//!         vacant:   insert, spawn broadcast task
//!         occupied: subscribe to the in-flight outcome
//!     → per-waiter delivery task: outcome | ctx cancelled
//!     → oneshot::Receiver<SubmissionResult> returned to the caller
//! ```
//!
//! The pending table is locked only for the entry lookup/insert and the
//! final removal; never across the network call.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use crate::ledger::TransactionEnvelope;
use crate::observability::metrics;
use crate::txsub::sink::{BroadcastOutcome, NetworkSink};
use crate::txsub::types::{FailedTransactionError, Submission, SubmissionError, SubmissionResult};

type PendingTable = DashMap<String, watch::Sender<Option<SubmissionResult>>>;

/// Coordinates broadcasts and fans their outcome out to waiters.
#[derive(Clone)]
pub struct SubmissionSystem {
    sink: Arc<dyn NetworkSink>,
    pending: Arc<PendingTable>,
    wait_timeout: Duration,
}

impl SubmissionSystem {
    /// Create a new submission system.
    ///
    /// # Arguments
    /// * `sink` - Where broadcasts are sent
    /// * `wait_timeout` - Budget for a broadcast to reach a terminal outcome
    pub fn new(sink: Arc<dyn NetworkSink>, wait_timeout: Duration) -> Self {
        Self {
            sink,
            pending: Arc::new(DashMap::new()),
            wait_timeout,
        }
    }

    /// Submit a transaction and return the channel its outcome arrives on.
    ///
    /// Never blocks. The receiver yields exactly one value.
    pub fn submit(
        &self,
        ctx: CancellationToken,
        raw: String,
        parsed: TransactionEnvelope,
        hash: String,
    ) -> oneshot::Receiver<SubmissionResult> {
        let (result_tx, result_rx) = oneshot::channel();

        if ctx.is_cancelled() {
            let _ = result_tx.send(Err(SubmissionError::Canceled));
            return result_rx;
        }

        let (outcome_rx, to_broadcast) = match self.pending.entry(hash.clone()) {
            Entry::Occupied(entry) => {
                tracing::debug!(hash = %hash, "Attaching to pending submission");
                (entry.get().subscribe(), None)
            }
            Entry::Vacant(entry) => {
                let (outcome_tx, outcome_rx) = watch::channel(None);
                entry.insert(outcome_tx);
                let submission = Submission {
                    raw,
                    parsed,
                    hash: hash.clone(),
                };
                (outcome_rx, Some(submission))
            }
        };
        metrics::set_pending_submissions(self.pending.len());

        if let Some(submission) = to_broadcast {
            self.spawn_broadcast(submission);
        }
        tokio::spawn(deliver(ctx, outcome_rx, result_tx, hash));

        result_rx
    }

    /// Number of hashes currently in flight.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    fn spawn_broadcast(&self, submission: Submission) {
        let in_flight = InFlight {
            pending: self.pending.clone(),
            hash: submission.hash.clone(),
            settled: false,
        };
        let sink = self.sink.clone();
        let wait = self.wait_timeout;

        tokio::spawn(async move {
            tracing::info!(
                hash = %submission.hash,
                operations = submission.parsed.tx.operations.len(),
                "Broadcasting transaction"
            );

            let result = match timeout(wait, sink.broadcast(&submission)).await {
                Ok(Ok(BroadcastOutcome::Included(record))) => Ok(record),
                Ok(Ok(BroadcastOutcome::Rejected { result_xdr })) => {
                    Err(FailedTransactionError { result_xdr }.into())
                }
                Ok(Err(e)) => Err(SubmissionError::Sink(e.to_string())),
                Err(_) => Err(SubmissionError::Timeout),
            };

            match &result {
                Ok(record) => {
                    metrics::record_submission("success");
                    tracing::info!(hash = %submission.hash, ledger = record.ledger, "Transaction included");
                }
                Err(e) => {
                    metrics::record_submission(e.outcome());
                    tracing::info!(hash = %submission.hash, error = %e, "Transaction not included");
                }
            }

            in_flight.settle(result);
        });
    }
}

impl std::fmt::Debug for SubmissionSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionSystem")
            .field("pending", &self.pending.len())
            .field("wait_timeout", &self.wait_timeout)
            .finish()
    }
}

/// Wait for the shared outcome or the waiter's own cancellation.
async fn deliver(
    ctx: CancellationToken,
    mut outcome_rx: watch::Receiver<Option<SubmissionResult>>,
    result_tx: oneshot::Sender<SubmissionResult>,
    hash: String,
) {
    let result = tokio::select! {
        biased;
        outcome = outcome_rx.wait_for(Option::is_some) => match outcome {
            Ok(value) => (*value)
                .clone()
                .unwrap_or_else(|| Err(SubmissionError::Sink("empty outcome".to_string()))),
            Err(_) => Err(SubmissionError::Sink("submission abandoned".to_string())),
        },
        _ = ctx.cancelled() => {
            tracing::debug!(hash = %hash, "Waiter cancelled before outcome");
            Err(SubmissionError::Canceled)
        }
    };
    let _ = result_tx.send(result);
}

/// Pending-table entry owned by a broadcast task.
///
/// Dropping it unsettled (task panic or abort) removes the entry, which
/// closes the outcome channel so waiters are released.
struct InFlight {
    pending: Arc<PendingTable>,
    hash: String,
    settled: bool,
}

impl InFlight {
    fn settle(mut self, result: SubmissionResult) {
        self.settled = true;
        if let Some((_, outcome_tx)) = self.pending.remove(&self.hash) {
            outcome_tx.send_replace(Some(result));
        }
        metrics::set_pending_submissions(self.pending.len());
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        if !self.settled {
            self.pending.remove(&self.hash);
            metrics::set_pending_submissions(self.pending.len());
        }
    }
}
