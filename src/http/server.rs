//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, body limit, request ID)
//! - Own the shared submission system and core state
//! - Spawn the core monitor alongside the listener
//! - Serve until the shutdown token is cancelled

use axum::{
    extract::State,
    http::HeaderName,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::health::{CoreMonitor, CoreState, CoreStateCell, CoreStateGetter};
use crate::http::request::{MakeRequestUuid, X_REQUEST_ID};
use crate::http::submit::{submit_transaction, SubmitTransactionHandler};
use crate::observability::metrics;
use crate::txsub::{NetworkSink, SubmissionSystem};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub submit: Arc<SubmitTransactionHandler>,
    pub submitter: SubmissionSystem,
    pub core_state: CoreStateCell,
    pub request_timeout: Duration,
    pub max_body_bytes: usize,
}

/// HTTP server for the ledger gateway.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
    sink: Arc<dyn NetworkSink>,
    core_state: CoreStateCell,
}

impl GatewayServer {
    /// Create a new server that submits through `sink`.
    pub fn new(config: GatewayConfig, sink: Arc<dyn NetworkSink>) -> Self {
        Self::with_core_state(config, sink, CoreStateCell::new())
    }

    /// Create a server around an existing core-state cell.
    pub fn with_core_state(
        config: GatewayConfig,
        sink: Arc<dyn NetworkSink>,
        core_state: CoreStateCell,
    ) -> Self {
        let submitter = SubmissionSystem::new(sink.clone(), config.submission.wait_timeout());
        let submit = Arc::new(SubmitTransactionHandler::new(
            submitter.clone(),
            config.submission.network_passphrase.clone(),
            Arc::new(core_state.clone()),
        ));

        let state = AppState {
            submit,
            submitter,
            core_state: core_state.clone(),
            request_timeout: config.timeouts.request(),
            max_body_bytes: config.listener.max_body_bytes,
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            sink,
            core_state,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let x_request_id = HeaderName::from_static(X_REQUEST_ID);

        Router::new()
            .route("/transactions", post(submit_transaction))
            .route("/health", get(health))
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.listener.max_body_bytes))
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::new(x_request_id)),
            )
    }

    /// The router without a listener, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn core_state(&self) -> CoreStateCell {
        self.core_state.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: CancellationToken,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let monitor = CoreMonitor::new(
            self.sink.clone(),
            self.core_state.clone(),
            Duration::from_secs(self.config.core.status_interval_secs),
            Duration::from_secs(self.config.core.request_timeout_secs),
        );
        tokio::spawn(monitor.run(shutdown.child_token()));

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    core: CoreState,
    pending_submissions: usize,
}

/// `GET /health`
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let start = Instant::now();
    let core = state.core_state.core_state();
    let body = HealthResponse {
        status: if core.synced { "ok" } else { "degraded" },
        core,
        pending_submissions: state.submitter.pending_count(),
    };
    metrics::record_request("GET", "/health", 200, start);
    Json(body)
}
