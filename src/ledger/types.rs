//! Ledger record types and error definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while decoding ledger payloads.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Input was not valid standard base64.
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Binary payload did not decode into the expected structure.
    #[error("invalid binary payload: {0}")]
    Binary(#[from] bincode::Error),

    /// Decoded payload failed a structural check.
    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// Result type for ledger decoding.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// A transaction as recorded by the network after inclusion in a ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Hex-encoded network hash.
    pub hash: String,
    /// Sequence of the ledger the transaction was included in.
    pub ledger: u32,
    /// Position inside the ledger's transaction set.
    #[serde(default)]
    pub application_order: u32,
    /// Close time of the including ledger.
    pub created_at: DateTime<Utc>,
    /// Whether the transaction's operations were applied.
    pub successful: bool,
    /// Fee actually charged, in base units.
    pub fee_charged: i64,
    /// Base64 envelope as included by the network.
    pub envelope_xdr: String,
    /// Base64 result payload.
    pub result_xdr: String,
    /// Base64 ledger-entry change payload.
    #[serde(default)]
    pub result_meta_xdr: String,
}

impl TransactionRecord {
    /// Ordering token for this transaction inside the global history.
    ///
    /// Ledger sequence in the high 32 bits, application order in the low.
    pub fn paging_token(&self) -> String {
        (((self.ledger as u64) << 32) | self.application_order as u64).to_string()
    }
}

/// A closed ledger, as delivered by the ledgers collection and its stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    pub id: String,
    pub paging_token: String,
    pub hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev_hash: Option<String>,
    pub sequence: u32,
    pub successful_transaction_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_transaction_count: Option<u32>,
    pub operation_count: u32,
    pub closed_at: DateTime<Utc>,
    pub total_coins: String,
    pub fee_pool: String,
    pub base_fee_in_stroops: u32,
    pub base_reserve_in_stroops: u32,
    pub max_tx_set_size: u32,
    pub protocol_version: u32,
}
