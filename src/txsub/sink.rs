//! The network sink: where transactions go to reach consensus.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ledger::TransactionRecord;
use crate::txsub::types::Submission;

/// Errors reported by a sink that are not consensus decisions.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected response: {0}")]
    Protocol(String),

    #[error("core asked to try again later")]
    TryAgainLater,
}

/// Terminal outcome of a broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BroadcastOutcome {
    /// Accepted and included in a ledger.
    Included(TransactionRecord),
    /// Rejected by consensus; carries the raw result payload.
    Rejected { result_xdr: String },
}

/// Sync state reported by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreStatus {
    pub synced: bool,
    pub latest_ledger: u32,
}

/// Consensus network as seen by the gateway.
///
/// `broadcast` resolves only on a terminal outcome; the caller bounds the
/// wait and may drop the future at any point.
#[async_trait]
pub trait NetworkSink: Send + Sync {
    async fn broadcast(&self, submission: &Submission) -> Result<BroadcastOutcome, SinkError>;

    async fn status(&self) -> Result<CoreStatus, SinkError>;
}
