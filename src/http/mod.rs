//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, body limit)
//!     → request.rs (request ID, per-request cancellation context)
//!     → submit.rs (media type, envelope decode, sync check, submit, race)
//!     → resource.rs | problem.rs (success body or problem detail)
//!     → Send to client
//! ```

pub mod problem;
pub mod request;
pub mod resource;
pub mod server;
pub mod submit;

pub use problem::Problem;
pub use request::{MakeRequestUuid, RequestContext, X_REQUEST_ID};
pub use resource::TransactionResource;
pub use server::{AppState, GatewayServer};
pub use submit::SubmitTransactionHandler;
