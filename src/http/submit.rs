//! Transaction submission endpoint.
//!
//! # Responsibilities
//! - Accept only form-urlencoded or multipart bodies
//! - Decode and hash the `tx` envelope before anything touches the network
//! - Refuse submission while the core is not synced
//! - Race the submission outcome against the request context
//! - Classify the outcome into a transaction resource or a `Problem`

use axum::body::Body;
use axum::extract::{FromRequest, Multipart, State};
use axum::http::{header, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::health::CoreStateGetter;
use crate::http::problem::Problem;
use crate::http::request::{request_id, RequestContext};
use crate::http::resource::TransactionResource;
use crate::http::server::AppState;
use crate::ledger::{decode_result_codes, EnvelopeInfo};
use crate::observability::metrics;
use crate::txsub::{SubmissionError, SubmissionResult, SubmissionSystem};

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
const MULTIPART_FORM_DATA: &str = "multipart/form-data";

pub struct SubmitTransactionHandler {
    submitter: SubmissionSystem,
    network_passphrase: String,
    core_state: Arc<dyn CoreStateGetter>,
}

impl SubmitTransactionHandler {
    pub fn new(
        submitter: SubmissionSystem,
        network_passphrase: impl Into<String>,
        core_state: Arc<dyn CoreStateGetter>,
    ) -> Self {
        Self {
            submitter,
            network_passphrase: network_passphrase.into(),
            core_state,
        }
    }

    /// Reject declared content types outside the form whitelist.
    ///
    /// A missing content type is accepted; one that does not parse is not.
    pub fn validate_body_type(content_type: Option<&str>) -> Result<(), Problem> {
        let Some(content_type) = content_type else {
            return Ok(());
        };
        match media_type(content_type).as_str() {
            FORM_URLENCODED | MULTIPART_FORM_DATA => Ok(()),
            _ => Err(Problem::unsupported_media_type()),
        }
    }

    /// Run one submission to completion or until `ctx` is cancelled.
    pub async fn handle(
        &self,
        ctx: CancellationToken,
        raw: &str,
    ) -> Result<TransactionResource, Problem> {
        let info = EnvelopeInfo::extract(raw, &self.network_passphrase).map_err(|e| {
            tracing::debug!(error = %e, "Rejecting malformed envelope");
            Problem::transaction_malformed(raw)
        })?;

        if !self.core_state.core_state().synced {
            tracing::warn!(hash = %info.hash(), "Core not synced, refusing submission");
            return Err(Problem::stale_history());
        }

        let result_rx = self.submitter.submit(
            ctx.clone(),
            info.raw().to_string(),
            info.parsed().clone(),
            info.hash().to_string(),
        );

        let result = tokio::select! {
            received = result_rx => match received {
                Ok(result) => result,
                Err(_) => {
                    tracing::error!(hash = %info.hash(), "Submission result channel closed");
                    return Err(Problem::server_error());
                }
            },
            _ = ctx.cancelled() => {
                tracing::debug!(hash = %info.hash(), "Request context done before outcome");
                return Err(Problem::timeout());
            }
        };

        self.response(&info, result)
    }

    fn response(
        &self,
        info: &EnvelopeInfo,
        result: SubmissionResult,
    ) -> Result<TransactionResource, Problem> {
        match result {
            Ok(record) => Ok(TransactionResource::new(info, &record)),
            Err(SubmissionError::Timeout | SubmissionError::Canceled) => Err(Problem::timeout()),
            Err(SubmissionError::Failed(failed)) => {
                let codes = match decode_result_codes(&failed.result_xdr) {
                    Ok(codes) => Some(codes),
                    Err(e) => {
                        tracing::warn!(hash = %info.hash(), error = %e, "Undecodable result payload");
                        None
                    }
                };
                Err(Problem::transaction_failed(
                    info.raw(),
                    &failed.result_xdr,
                    codes.as_ref(),
                ))
            }
            Err(e @ SubmissionError::Sink(_)) => {
                tracing::error!(hash = %info.hash(), error = %e, "Submission failed");
                Err(Problem::server_error())
            }
        }
    }
}

/// `POST /transactions`
pub async fn submit_transaction(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let ctx = RequestContext::with_deadline(state.request_timeout);
    let request_id = request_id(request.headers()).to_string();
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap_or_default().to_string());

    let outcome = async {
        SubmitTransactionHandler::validate_body_type(content_type.as_deref())?;
        let raw = read_tx_field(request, content_type.as_deref(), state.max_body_bytes).await?;
        state.submit.handle(ctx.token(), &raw).await
    }
    .await;

    let response = match outcome {
        Ok(resource) => (StatusCode::OK, Json(resource)).into_response(),
        Err(problem) => {
            tracing::debug!(request_id = %request_id, problem = %problem.kind, "Submission rejected");
            problem.into_response()
        }
    };
    metrics::record_request("POST", "/transactions", response.status().as_u16(), start);
    response
}

/// Read `tx` from the body, falling back to the query string.
async fn read_tx_field(
    request: Request<Body>,
    content_type: Option<&str>,
    max_body_bytes: usize,
) -> Result<String, Problem> {
    let from_query = request
        .uri()
        .query()
        .and_then(|query| form_field(query.as_bytes(), "tx"));

    if content_type.map(media_type).as_deref() == Some(MULTIPART_FORM_DATA) {
        let mut multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| Problem::bad_request(e.body_text()))?;
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| Problem::bad_request(e.body_text()))?
        {
            if field.name() == Some("tx") {
                return field
                    .text()
                    .await
                    .map_err(|e| Problem::bad_request(e.body_text()));
            }
        }
        return Ok(from_query.unwrap_or_default());
    }

    let body = axum::body::to_bytes(request.into_body(), max_body_bytes)
        .await
        .map_err(|_| Problem::bad_request("request body too large"))?;
    Ok(form_field(&body, "tx").or(from_query).unwrap_or_default())
}

fn form_field(input: &[u8], name: &str) -> Option<String> {
    url::form_urlencoded::parse(input)
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
