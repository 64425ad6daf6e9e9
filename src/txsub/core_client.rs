//! HTTP client for the consensus core's command port.
//!
//! # Responsibilities
//! - Hand envelopes to the core (`POST /tx`)
//! - Poll for inclusion of accepted transactions (`GET /tx/{hash}`)
//! - Report the core's sync state (`GET /info`)
//!
//! # Core Protocol
//! ```text
//! POST /tx  blob=<base64>   → {"status": "PENDING" | "DUPLICATE" | "ERROR" | "TRY_AGAIN_LATER",
//!                              "error": "<base64 result>"}
//! GET  /tx/{hash}           → 200 TransactionRecord | 404 not yet included
//! GET  /info                → {"synced": bool, "latest_ledger": u32}
//! ```

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tokio::time::interval;

use crate::config::CoreConfig;
use crate::ledger::TransactionRecord;
use crate::txsub::sink::{BroadcastOutcome, CoreStatus, NetworkSink, SinkError};
use crate::txsub::types::Submission;

#[derive(Debug, Deserialize)]
struct TxResponse {
    status: String,
    #[serde(default)]
    error: Option<String>,
}

/// Network sink backed by a core node's HTTP interface.
#[derive(Clone)]
pub struct CoreSink {
    http: reqwest::Client,
    base_url: String,
    poll_interval: Duration,
}

impl CoreSink {
    /// Create a new core client.
    pub fn new(config: &CoreConfig) -> Result<Self, SinkError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| SinkError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        })
    }

    async fn send_blob(&self, raw: &str) -> Result<TxResponse, SinkError> {
        let response = self
            .http
            .post(format!("{}/tx", self.base_url))
            .form(&[("blob", raw)])
            .send()
            .await
            .map_err(|e| SinkError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SinkError::Protocol(format!(
                "POST /tx returned {}",
                response.status()
            )));
        }
        response
            .json::<TxResponse>()
            .await
            .map_err(|e| SinkError::Protocol(e.to_string()))
    }

    async fn lookup(&self, hash: &str) -> Result<Option<TransactionRecord>, SinkError> {
        let response = self
            .http
            .get(format!("{}/tx/{}", self.base_url, hash))
            .send()
            .await
            .map_err(|e| SinkError::Transport(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => response
                .json::<TransactionRecord>()
                .await
                .map(Some)
                .map_err(|e| SinkError::Protocol(e.to_string())),
            status => Err(SinkError::Protocol(format!(
                "GET /tx/{} returned {}",
                hash, status
            ))),
        }
    }

    /// Poll until the transaction shows up in a closed ledger.
    async fn wait_for_inclusion(&self, hash: &str) -> Result<BroadcastOutcome, SinkError> {
        let mut ticker = interval(self.poll_interval);
        loop {
            ticker.tick().await;

            match self.lookup(hash).await {
                Ok(Some(record)) if record.successful => {
                    return Ok(BroadcastOutcome::Included(record));
                }
                Ok(Some(record)) => {
                    return Ok(BroadcastOutcome::Rejected {
                        result_xdr: record.result_xdr,
                    });
                }
                Ok(None) => {
                    tracing::debug!(hash = %hash, "Transaction pending");
                }
                // A failed lookup is not a verdict; the caller's budget bounds the loop.
                Err(e) => {
                    tracing::warn!(hash = %hash, error = %e, "Inclusion lookup failed");
                }
            }
        }
    }
}

#[async_trait]
impl NetworkSink for CoreSink {
    async fn broadcast(&self, submission: &Submission) -> Result<BroadcastOutcome, SinkError> {
        let response = self.send_blob(&submission.raw).await?;

        match response.status.as_str() {
            "PENDING" | "DUPLICATE" => self.wait_for_inclusion(&submission.hash).await,
            "ERROR" => match response.error {
                Some(result_xdr) => Ok(BroadcastOutcome::Rejected { result_xdr }),
                None => Err(SinkError::Protocol(
                    "ERROR status without result payload".to_string(),
                )),
            },
            "TRY_AGAIN_LATER" => Err(SinkError::TryAgainLater),
            other => Err(SinkError::Protocol(format!("unknown status '{}'", other))),
        }
    }

    async fn status(&self) -> Result<CoreStatus, SinkError> {
        let response = self
            .http
            .get(format!("{}/info", self.base_url))
            .send()
            .await
            .map_err(|e| SinkError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SinkError::Protocol(format!(
                "GET /info returned {}",
                response.status()
            )));
        }
        response
            .json::<CoreStatus>()
            .await
            .map_err(|e| SinkError::Protocol(e.to_string()))
    }
}

impl std::fmt::Debug for CoreSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreSink")
            .field("base_url", &self.base_url)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}
