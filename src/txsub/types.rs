//! Submission types and error definitions.

use thiserror::Error;

use crate::ledger::{TransactionEnvelope, TransactionRecord};

/// A transaction handed to the submission system.
#[derive(Debug, Clone)]
pub struct Submission {
    /// Base64 envelope exactly as received.
    pub raw: String,
    /// Decoded form of `raw`.
    pub parsed: TransactionEnvelope,
    /// Hex-encoded network hash of `parsed`.
    pub hash: String,
}

/// Consensus rejected the transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("transaction failed: {result_xdr}")]
pub struct FailedTransactionError {
    /// Base64 result payload reported by the network.
    pub result_xdr: String,
}

/// Terminal failure of a submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    /// Structured rejection from consensus.
    #[error(transparent)]
    Failed(#[from] FailedTransactionError),

    /// No outcome within the wait budget.
    #[error("timeout waiting for transaction outcome")]
    Timeout,

    /// The waiter's context was cancelled before an outcome arrived.
    #[error("submission canceled")]
    Canceled,

    /// Any other sink-level fault.
    #[error("network sink error: {0}")]
    Sink(String),
}

impl SubmissionError {
    /// Label used for the `gateway_submissions_total` metric.
    pub fn outcome(&self) -> &'static str {
        match self {
            SubmissionError::Failed(_) => "failed",
            SubmissionError::Timeout => "timeout",
            SubmissionError::Canceled => "canceled",
            SubmissionError::Sink(_) => "error",
        }
    }
}

/// The single terminal value delivered to each waiter.
pub type SubmissionResult = Result<TransactionRecord, SubmissionError>;
