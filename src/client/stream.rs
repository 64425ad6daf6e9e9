//! Resumable event streaming.
//!
//! # State Machine
//! ```text
//! Connecting → Streaming → Reconnecting → Connecting → …
//!          ↘           ↘
//!           Closed (cancelled, fatal status, bad payload, handler error)
//! ```
//!
//! The cursor only advances after the handler accepted a unit, so a
//! reconnect resumes strictly after the last delivered event.

use futures_util::StreamExt;
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::client::client::{gateway_error, GatewayClient};
use crate::client::error::{ClientError, HandlerError};
use crate::client::sse::SseDecoder;
use crate::observability::metrics;
use crate::resilience::ReconnectBackoff;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Connecting,
    Streaming,
    Reconnecting,
    Closed,
}

impl GatewayClient {
    /// Stream `url` as server-sent events, decoding each unit as `T`.
    ///
    /// Returns `Ok(())` once `ctx` is cancelled. Transient faults reconnect
    /// from the last delivered cursor; anything else closes the stream.
    pub async fn stream<T, F>(
        &self,
        ctx: &CancellationToken,
        url: Url,
        mut on_event: F,
    ) -> Result<(), ClientError>
    where
        T: DeserializeOwned,
        F: FnMut(T) -> Result<(), HandlerError>,
    {
        let mut cursor = query_cursor(&url);
        let mut backoff = ReconnectBackoff::new(
            self.stream_config.reconnect_base_delay_ms,
            self.stream_config.reconnect_max_delay_ms,
        );
        let mut state = StreamState::Connecting;

        loop {
            let target = with_cursor(&url, cursor.as_deref());
            tracing::debug!(url = %target, ?state, "Stream connecting");

            let opened = tokio::select! {
                biased;
                _ = ctx.cancelled() => return closed(cursor.as_deref()),
                opened = self.open_stream(target) => opened,
            };

            let response = match opened {
                Ok(response) => response,
                Err(e) if e.is_transient() => {
                    state = StreamState::Reconnecting;
                    tracing::warn!(error = %e, ?state, "Stream connect failed");
                    if !wait_to_reconnect(ctx, &mut backoff).await {
                        return closed(cursor.as_deref());
                    }
                    state = StreamState::Connecting;
                    continue;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Stream closed on connect");
                    return Err(e);
                }
            };

            state = StreamState::Streaming;
            tracing::info!(cursor = cursor.as_deref().unwrap_or("none"), ?state, "Stream open");

            let mut body = response.bytes_stream();
            let mut decoder = SseDecoder::new();
            loop {
                let chunk = tokio::select! {
                    biased;
                    _ = ctx.cancelled() => return closed(cursor.as_deref()),
                    chunk = body.next() => chunk,
                };

                let bytes = match chunk {
                    Some(Ok(bytes)) => bytes,
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "Stream read failed");
                        break;
                    }
                    None => {
                        tracing::debug!("Stream ended by server");
                        break;
                    }
                };

                for event in decoder.feed(&bytes) {
                    if let Some(retry) = event.retry {
                        backoff.set_base(retry);
                    }
                    if event.is_control() {
                        continue;
                    }
                    if ctx.is_cancelled() {
                        return closed(cursor.as_deref());
                    }

                    let unit: T = serde_json::from_str(&event.data).map_err(|e| {
                        tracing::error!(error = %e, id = ?event.id, "Malformed stream unit");
                        ClientError::Decode(e.to_string())
                    })?;
                    on_event(unit).map_err(|e| {
                        tracing::info!(error = %e, "Stream handler stopped the stream");
                        ClientError::Handler(e)
                    })?;

                    if let Some(id) = event.id {
                        cursor = Some(id);
                    }
                    backoff.reset();
                    metrics::record_stream_event();
                }
            }

            state = StreamState::Reconnecting;
            metrics::record_stream_reconnect();
            tracing::info!(cursor = cursor.as_deref().unwrap_or("none"), ?state, "Stream reconnecting");
            if !wait_to_reconnect(ctx, &mut backoff).await {
                return closed(cursor.as_deref());
            }
            state = StreamState::Connecting;
        }
    }

    async fn open_stream(&self, url: Url) -> Result<reqwest::Response, ClientError> {
        let response = self
            .http
            .get(url)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?;
        self.observe_date(&response);

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(gateway_error(response).await)
        }
    }
}

fn closed(cursor: Option<&str>) -> Result<(), ClientError> {
    tracing::info!(cursor = cursor.unwrap_or("none"), state = ?StreamState::Closed, "Stream closed");
    Ok(())
}

/// Sleep out the next backoff delay. False when cancelled first.
async fn wait_to_reconnect(ctx: &CancellationToken, backoff: &mut ReconnectBackoff) -> bool {
    let delay = backoff.next_delay();
    tracing::debug!(attempt = backoff.attempt(), ?delay, "Waiting to reconnect");
    tokio::select! {
        biased;
        _ = ctx.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

fn query_cursor(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == "cursor")
        .map(|(_, value)| value.into_owned())
}

/// `url` with its `cursor` parameter replaced, other parameters kept in order.
fn with_cursor(url: &Url, cursor: Option<&str>) -> Url {
    let Some(cursor) = cursor else {
        return url.clone();
    };

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "cursor")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    let mut target = url.clone();
    {
        let mut query = target.query_pairs_mut();
        query.clear();
        query.append_pair("cursor", cursor);
        for (key, value) in &pairs {
            query.append_pair(key, value);
        }
    }
    target
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_cursor_replaces_existing() {
        let url = Url::parse("http://gateway.example/ledgers?cursor=1&limit=5&order=asc").unwrap();
        assert_eq!(query_cursor(&url).as_deref(), Some("1"));

        let resumed = with_cursor(&url, Some("7"));
        assert_eq!(
            resumed.as_str(),
            "http://gateway.example/ledgers?cursor=7&limit=5&order=asc"
        );
        assert_eq!(with_cursor(&url, None), url);
    }

    #[test]
    fn test_with_cursor_adds_missing() {
        let url = Url::parse("http://gateway.example/ledgers").unwrap();
        assert_eq!(query_cursor(&url), None);
        assert_eq!(
            with_cursor(&url, Some("now")).as_str(),
            "http://gateway.example/ledgers?cursor=now"
        );
    }
}
