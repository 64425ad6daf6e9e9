//! Public transaction resource returned on successful submission.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ledger::{EnvelopeInfo, TransactionRecord};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionResource {
    pub id: String,
    pub paging_token: String,
    pub hash: String,
    pub ledger: u32,
    pub created_at: DateTime<Utc>,
    pub source_account: String,
    pub source_account_sequence: String,
    pub fee_charged: i64,
    pub operation_count: usize,
    pub memo_type: String,
    pub successful: bool,
    pub envelope_xdr: String,
    pub result_xdr: String,
    pub result_meta_xdr: String,
}

impl TransactionResource {
    /// Combine the network's inclusion record with the envelope the caller sent.
    pub fn new(info: &EnvelopeInfo, record: &TransactionRecord) -> Self {
        let tx = &info.parsed().tx;
        Self {
            id: info.hash().to_string(),
            paging_token: record.paging_token(),
            hash: info.hash().to_string(),
            ledger: record.ledger,
            created_at: record.created_at,
            source_account: hex::encode(tx.source_account),
            source_account_sequence: tx.sequence.to_string(),
            fee_charged: record.fee_charged,
            operation_count: tx.operations.len(),
            memo_type: tx.memo.type_name().to_string(),
            successful: record.successful,
            envelope_xdr: info.raw().to_string(),
            result_xdr: record.result_xdr.clone(),
            result_meta_xdr: record.result_meta_xdr.clone(),
        }
    }
}
