//! Problem-detail error payloads.
//!
//! Every protocol error leaves the gateway as `application/problem+json`
//! with a stable `type`/`title`/`status` triple. `extras` carries whatever
//! the caller needs to diagnose the failure without resubmitting.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ledger::TransactionResultCodes;

pub const PROBLEM_CONTENT_TYPE: &str = "application/problem+json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub status: u16,
    #[serde(default)]
    pub detail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<Map<String, Value>>,
}

impl Problem {
    pub fn new(kind: &str, title: &str, status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            kind: kind.to_string(),
            title: title.to_string(),
            status: status.as_u16(),
            detail: detail.into(),
            extras: None,
        }
    }

    pub fn with_extra(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extras
            .get_or_insert_with(Map::new)
            .insert(key.to_string(), value.into());
        self
    }

    pub fn extra(&self, key: &str) -> Option<&Value> {
        self.extras.as_ref().and_then(|extras| extras.get(key))
    }

    pub fn timeout() -> Self {
        Self::new(
            "timeout",
            "Timeout",
            StatusCode::GATEWAY_TIMEOUT,
            "Your request timed out before completing. Please try your request \
             again. If you are submitting a transaction, check its status by hash \
             before resubmitting.",
        )
    }

    pub fn stale_history() -> Self {
        Self::new(
            "stale_history",
            "Historical DB Is Too Stale",
            StatusCode::SERVICE_UNAVAILABLE,
            "The gateway's view of the network is not synced with the consensus \
             core. Transactions cannot be submitted until it catches up.",
        )
    }

    pub fn unsupported_media_type() -> Self {
        Self::new(
            "unsupported_media_type",
            "Unsupported Media Type",
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "The request has an unacceptable content type. Submit transactions \
             as application/x-www-form-urlencoded or multipart/form-data.",
        )
    }

    pub fn server_error() -> Self {
        Self::new(
            "server_error",
            "Internal Server Error",
            StatusCode::INTERNAL_SERVER_ERROR,
            "An error occurred while processing this request.",
        )
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new("bad_request", "Bad Request", StatusCode::BAD_REQUEST, detail)
    }

    /// The envelope in the request could not be decoded.
    pub fn transaction_malformed(envelope_xdr: &str) -> Self {
        Self::new(
            "transaction_malformed",
            "Transaction Malformed",
            StatusCode::BAD_REQUEST,
            "The gateway could not decode the transaction envelope in this \
             request. A transaction should be a TransactionEnvelope encoded using \
             base64. The envelope read from this request is echoed in the \
             `extras.envelope_xdr` field of this response for your convenience.",
        )
        .with_extra("envelope_xdr", envelope_xdr)
    }

    /// Consensus rejected the transaction.
    ///
    /// `result_codes` is omitted when the result payload does not decode.
    pub fn transaction_failed(
        envelope_xdr: &str,
        result_xdr: &str,
        result_codes: Option<&TransactionResultCodes>,
    ) -> Self {
        let problem = Self::new(
            "transaction_failed",
            "Transaction Failed",
            StatusCode::BAD_REQUEST,
            "The transaction failed when submitted to the network. The \
             `extras.result_codes` field on this response contains further \
             details.",
        )
        .with_extra("envelope_xdr", envelope_xdr)
        .with_extra("result_xdr", result_xdr);

        match result_codes.and_then(|codes| serde_json::to_value(codes).ok()) {
            Some(codes) => problem.with_extra("result_codes", codes),
            None => problem,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl std::fmt::Display for Problem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.title, self.status, self.kind)
    }
}

impl std::error::Error for Problem {}

impl IntoResponse for Problem {
    fn into_response(self) -> Response {
        (
            self.status_code(),
            [(header::CONTENT_TYPE, PROBLEM_CONTENT_TYPE)],
            Json(self),
        )
            .into_response()
    }
}
