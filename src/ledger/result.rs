//! Transaction result payloads and their human-readable codes.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bincode::Options;
use serde::{Deserialize, Serialize};

use crate::ledger::envelope::codec;
use crate::ledger::types::LedgerResult;

/// Transaction-level outcome reported by consensus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionResultCode {
    Success,
    Failed,
    TooEarly,
    TooLate,
    MissingOperation,
    BadSeq,
    BadAuth,
    InsufficientBalance,
    NoAccount,
    InsufficientFee,
    BadAuthExtra,
    InternalError,
}

impl TransactionResultCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "tx_success",
            Self::Failed => "tx_failed",
            Self::TooEarly => "tx_too_early",
            Self::TooLate => "tx_too_late",
            Self::MissingOperation => "tx_missing_operation",
            Self::BadSeq => "tx_bad_seq",
            Self::BadAuth => "tx_bad_auth",
            Self::InsufficientBalance => "tx_insufficient_balance",
            Self::NoAccount => "tx_no_source_account",
            Self::InsufficientFee => "tx_insufficient_fee",
            Self::BadAuthExtra => "tx_bad_auth_extra",
            Self::InternalError => "tx_internal_error",
        }
    }
}

/// Per-operation outcome. Only meaningful when the transaction code is
/// `Success` or `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationResultCode {
    Success,
    Malformed,
    Underfunded,
    NoDestination,
    NoTrust,
    LineFull,
    BadAuth,
    NoAccount,
    NotSupported,
    TooManySubentries,
}

impl OperationResultCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "op_success",
            Self::Malformed => "op_malformed",
            Self::Underfunded => "op_underfunded",
            Self::NoDestination => "op_no_destination",
            Self::NoTrust => "op_no_trust",
            Self::LineFull => "op_line_full",
            Self::BadAuth => "op_bad_auth",
            Self::NoAccount => "op_no_source_account",
            Self::NotSupported => "op_not_supported",
            Self::TooManySubentries => "op_too_many_subentries",
        }
    }
}

/// Result payload carried by `result_xdr`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionResult {
    pub fee_charged: i64,
    pub code: TransactionResultCode,
    pub operations: Vec<OperationResultCode>,
}

impl TransactionResult {
    pub fn from_base64(raw: &str) -> LedgerResult<Self> {
        let bytes = STANDARD.decode(raw)?;
        Ok(codec().deserialize(&bytes)?)
    }

    pub fn to_base64(&self) -> LedgerResult<String> {
        Ok(STANDARD.encode(codec().serialize(self)?))
    }

    /// Codes in the form surfaced to API callers.
    pub fn codes(&self) -> TransactionResultCodes {
        let operations = match self.code {
            TransactionResultCode::Success | TransactionResultCode::Failed => Some(
                self.operations
                    .iter()
                    .map(|code| code.as_str().to_string())
                    .collect(),
            ),
            _ => None,
        };
        TransactionResultCodes {
            transaction: self.code.as_str().to_string(),
            operations,
        }
    }
}

/// Decoded result codes, rendered under `extras.result_codes`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionResultCodes {
    pub transaction: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operations: Option<Vec<String>>,
}

/// Decode the result codes out of a base64 result payload.
pub fn decode_result_codes(result_xdr: &str) -> LedgerResult<TransactionResultCodes> {
    Ok(TransactionResult::from_base64(result_xdr)?.codes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_seq_has_no_operation_codes() {
        let result = TransactionResult {
            fee_charged: 100,
            code: TransactionResultCode::BadSeq,
            operations: vec![],
        };
        let codes = decode_result_codes(&result.to_base64().unwrap()).unwrap();
        assert_eq!(codes.transaction, "tx_bad_seq");
        assert!(codes.operations.is_none());
    }

    #[test]
    fn test_failed_lists_operation_codes() {
        let result = TransactionResult {
            fee_charged: 200,
            code: TransactionResultCode::Failed,
            operations: vec![OperationResultCode::Success, OperationResultCode::Underfunded],
        };
        let codes = decode_result_codes(&result.to_base64().unwrap()).unwrap();
        assert_eq!(codes.transaction, "tx_failed");
        assert_eq!(
            codes.operations,
            Some(vec!["op_success".to_string(), "op_underfunded".to_string()])
        );

        let json = serde_json::to_value(&codes).unwrap();
        assert_eq!(json["operations"][1], "op_underfunded");
    }

    #[test]
    fn test_garbage_payload_fails() {
        assert!(decode_result_codes("////").is_err());
    }
}
