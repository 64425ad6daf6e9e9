//! HTTP client for a ledger gateway.
//!
//! # Responsibilities
//! - Build request URLs from typed descriptors
//! - Record each response's `Date` header for clock-skew correction
//! - Map non-success responses to `ClientError::Gateway`
//! - Refuse to submit envelopes whose validity window has already closed

use chrono::Utc;
use reqwest::header::DATE;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::client::clock::ClockSkewTracker;
use crate::client::error::{ClientError, HandlerError};
use crate::client::request::LedgerRequest;
use crate::config::StreamConfig;
use crate::http::{Problem, TransactionResource};
use crate::ledger::{Ledger, TransactionEnvelope};

#[derive(Debug, Deserialize)]
struct Page<T> {
    #[serde(rename = "_embedded")]
    embedded: Embedded<T>,
}

#[derive(Debug, Deserialize)]
struct Embedded<T> {
    records: Vec<T>,
}

#[derive(Debug, Clone)]
pub struct GatewayClient {
    pub(super) base_url: Url,
    pub(super) http: reqwest::Client,
    pub(super) clock: Arc<ClockSkewTracker>,
    pub(super) stream_config: StreamConfig,
}

impl GatewayClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            base_url,
            http: reqwest::Client::new(),
            clock: Arc::new(ClockSkewTracker::default()),
            stream_config: StreamConfig::default(),
        })
    }

    /// Share a clock tracker with other clients.
    pub fn with_clock(mut self, clock: Arc<ClockSkewTracker>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_stream_config(mut self, config: StreamConfig) -> Self {
        self.stream_config = config;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn clock(&self) -> &Arc<ClockSkewTracker> {
        &self.clock
    }

    /// Key under which this gateway's clock observations are stored.
    pub fn host(&self) -> String {
        let host = self.base_url.host_str().unwrap_or_default();
        match self.base_url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        }
    }

    /// `GET ledgers/{sequence}`
    pub async fn ledger(&self, sequence: u32) -> Result<Ledger, ClientError> {
        let url = self.base_url.join(&LedgerRequest::single(sequence).build_url())?;
        let response = self.http.get(url).send().await?;
        self.decode_response(response).await
    }

    /// One page of the ledgers collection.
    pub async fn ledgers(&self, request: &LedgerRequest) -> Result<Vec<Ledger>, ClientError> {
        let url = self.base_url.join(&request.build_url())?;
        let response = self.http.get(url).send().await?;
        let page: Page<Ledger> = self.decode_response(response).await?;
        Ok(page.embedded.records)
    }

    /// `POST transactions` with the envelope as the `tx` form field.
    pub async fn submit_transaction(&self, envelope: &str) -> Result<TransactionResource, ClientError> {
        let parsed = TransactionEnvelope::from_base64(envelope)?;
        if let Some(bounds) = parsed.tx.time_bounds {
            let server_time = self.clock.corrected_time(&self.host(), Utc::now().timestamp());
            let expired = u64::try_from(server_time)
                .is_ok_and(|now| now != 0 && bounds.expired_at(now));
            if expired {
                return Err(ClientError::TransactionExpired {
                    max_time: bounds.max_time,
                    server_time,
                });
            }
        }

        let url = self.base_url.join("transactions")?;
        let response = self.http.post(url).form(&[("tx", envelope)]).send().await?;
        self.decode_response(response).await
    }

    /// The gateway's current time as estimated from recent responses.
    ///
    /// Refreshes the estimate with a health request when none is usable.
    pub async fn server_time(&self) -> Result<i64, ClientError> {
        let host = self.host();
        let corrected = self.clock.corrected_time(&host, Utc::now().timestamp());
        if corrected != 0 {
            return Ok(corrected);
        }

        let response = self.http.get(self.base_url.join("health")?).send().await?;
        self.observe_date(&response);
        Ok(self.clock.corrected_time(&host, Utc::now().timestamp()))
    }

    /// Stream ledgers from `request`'s cursor until `ctx` is cancelled.
    pub async fn stream_ledgers<F>(
        &self,
        ctx: &CancellationToken,
        request: &LedgerRequest,
        handler: F,
    ) -> Result<(), ClientError>
    where
        F: FnMut(Ledger) -> Result<(), HandlerError>,
    {
        let url = self.base_url.join(&request.build_url())?;
        self.stream(ctx, url, handler).await
    }

    pub(super) fn observe_date(&self, response: &reqwest::Response) {
        if let Some(date) = response.headers().get(DATE).and_then(|v| v.to_str().ok()) {
            self.clock
                .record_observation(&self.host(), date, Utc::now().timestamp());
        }
    }

    pub(super) async fn decode_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        self.observe_date(&response);
        if !response.status().is_success() {
            return Err(gateway_error(response).await);
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

/// Turn a non-success response into a `Gateway` error, keeping its problem body.
pub(super) async fn gateway_error(response: reqwest::Response) -> ClientError {
    let status = response.status();
    let body = response.bytes().await.unwrap_or_default();
    let problem = serde_json::from_slice::<Problem>(&body).unwrap_or_else(|_| {
        Problem::new(
            "unknown",
            status.canonical_reason().unwrap_or("Unknown"),
            status,
            String::from_utf8_lossy(&body),
        )
    });
    ClientError::Gateway {
        status: status.as_u16(),
        problem,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let client = GatewayClient::new("http://gateway.example:8000/api").unwrap();
        assert_eq!(client.base_url().as_str(), "http://gateway.example:8000/api/");
        assert_eq!(
            client.base_url().join("ledgers/100").unwrap().as_str(),
            "http://gateway.example:8000/api/ledgers/100"
        );
        assert_eq!(client.host(), "gateway.example:8000");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            GatewayClient::new("not a url"),
            Err(ClientError::Url(_))
        ));
    }
}
