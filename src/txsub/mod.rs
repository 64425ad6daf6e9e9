//! Transaction submission subsystem.
//!
//! # Data Flow
//! ```text
//! SubmitTransactionHandler
//!     → system.rs (dedupe by hash, wait budget, fan-out)
//!     → sink.rs (NetworkSink trait)
//!     → core_client.rs (HTTP core implementation: broadcast, poll inclusion)
//!     → types.rs (SubmissionResult delivered once per waiter)
//! ```
//!
//! # Outcome Classification
//! 1. Included in a ledger → `Ok(TransactionRecord)`
//! 2. Rejected by consensus → `SubmissionError::Failed`
//! 3. Wait budget exhausted → `SubmissionError::Timeout`
//! 4. Waiter context cancelled first → `SubmissionError::Canceled`
//! 5. Anything else from the sink → `SubmissionError::Sink`

pub mod core_client;
pub mod sink;
pub mod system;
pub mod types;

pub use core_client::CoreSink;
pub use sink::{BroadcastOutcome, CoreStatus, NetworkSink, SinkError};
pub use system::SubmissionSystem;
pub use types::{FailedTransactionError, Submission, SubmissionError, SubmissionResult};
