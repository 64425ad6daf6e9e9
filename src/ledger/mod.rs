//! Ledger data model.
//!
//! # Data Flow
//! ```text
//! base64 envelope (request body)
//!     → envelope.rs (strict decode, network-domain hash → EnvelopeInfo)
//!     → [submitted through txsub]
//!     → types.rs (TransactionRecord on inclusion)
//!     → result.rs (result codes on rejection)
//! ```
//!
//! # Design Decisions
//! - Envelopes are opaque beyond what hashing and validity checks need
//! - Decoding is strict: non-canonical base64 or trailing bytes fail
//! - The hash is computed once per request and never recomputed downstream

pub mod envelope;
pub mod result;
pub mod types;

pub use envelope::{EnvelopeInfo, TimeBounds, TransactionEnvelope};
pub use result::{decode_result_codes, TransactionResult, TransactionResultCodes};
pub use types::{Ledger, LedgerError, LedgerResult, TransactionRecord};
