//! Per-request plumbing.
//!
//! # Responsibilities
//! - Generate a UUID v4 request ID for every inbound request
//! - Give each request a cancellation context bounded by the request deadline
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The context is cancelled when the handler future is dropped, so a
//!   client disconnect releases the waiter the same way a deadline does

use axum::http::{HeaderMap, HeaderValue, Request};
use std::time::Duration;
use tokio_util::sync::{CancellationToken, DropGuard};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates `x-request-id` values for requests that arrive without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Request ID as set by the request-id layer, for log fields.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Cancellation context owned by one request.
///
/// Cancelled when the deadline passes or when the context is dropped,
/// whichever happens first.
pub struct RequestContext {
    token: CancellationToken,
    _guard: DropGuard,
}

impl RequestContext {
    pub fn with_deadline(deadline: Duration) -> Self {
        let token = CancellationToken::new();
        let timer = token.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(deadline) => timer.cancel(),
                _ = timer.cancelled() => {}
            }
        });

        Self {
            _guard: token.clone().drop_guard(),
            token,
        }
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generates_uuid() {
        let request = Request::new(());
        let id = MakeRequestUuid.make_request_id(&request).unwrap();
        let value = id.header_value().to_str().unwrap();
        assert!(Uuid::parse_str(value).is_ok());
    }

    #[test]
    fn test_request_id_fallback() {
        let mut headers = HeaderMap::new();
        assert_eq!(request_id(&headers), "unknown");
        headers.insert(X_REQUEST_ID, HeaderValue::from_static("abc"));
        assert_eq!(request_id(&headers), "abc");
    }

    #[tokio::test]
    async fn test_context_cancelled_on_deadline() {
        let ctx = RequestContext::with_deadline(Duration::from_millis(20));
        let token = ctx.token();
        tokio::time::timeout(Duration::from_secs(1), token.cancelled())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_context_cancelled_on_drop() {
        let ctx = RequestContext::with_deadline(Duration::from_secs(60));
        let token = ctx.token();
        assert!(!token.is_cancelled());
        drop(ctx);
        assert!(token.is_cancelled());
    }
}
