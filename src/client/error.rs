//! Client error definitions.

use thiserror::Error;

use crate::http::Problem;
use crate::ledger::LedgerError;

/// Error a stream handler may return to stop the stream.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport-level failure talking to the gateway.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    /// The gateway answered with a non-success status.
    #[error("gateway returned {status}: {problem}")]
    Gateway { status: u16, problem: Problem },

    /// A response or stream unit did not decode.
    #[error("decode error: {0}")]
    Decode(String),

    /// The stream handler asked to stop.
    #[error("handler error: {0}")]
    Handler(HandlerError),

    /// The envelope's validity window closed before submission.
    #[error("transaction expired: max_time {max_time} is before server time {server_time}")]
    TransactionExpired { max_time: u64, server_time: i64 },

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl ClientError {
    /// Whether a stream should reconnect after this error.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Http(e) => match e.status() {
                Some(status) => status.is_server_error() || status.as_u16() == 429,
                None => !e.is_decode() && !e.is_builder(),
            },
            ClientError::Gateway { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// The problem detail, for gateway errors.
    pub fn problem(&self) -> Option<&Problem> {
        match self {
            ClientError::Gateway { problem, .. } => Some(problem),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway(status: u16) -> ClientError {
        ClientError::Gateway {
            status,
            problem: Problem::server_error(),
        }
    }

    #[test]
    fn test_transient_classification() {
        assert!(gateway(503).is_transient());
        assert!(gateway(429).is_transient());
        assert!(!gateway(404).is_transient());
        assert!(!ClientError::Decode("bad json".into()).is_transient());
        assert!(!ClientError::Handler("stop".into()).is_transient());
    }

    #[test]
    fn test_problem_only_for_gateway_errors() {
        assert_eq!(gateway(500).problem().map(|p| p.kind.as_str()), Some("server_error"));
        assert!(ClientError::Decode("bad json".into()).problem().is_none());
    }
}
