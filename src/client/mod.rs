//! Gateway client subsystem.
//!
//! # Data Flow
//! ```text
//! request.rs (LedgerRequest → relative URL)
//!     → client.rs (reqwest call, Date header → clock.rs, error mapping)
//!     → stream.rs (SSE reconnect loop, cursor resumption)
//!         → sse.rs (byte chunks → events)
//!         → caller's handler, one unit at a time
//! ```

#[allow(clippy::module_inception)]
pub mod client;
pub mod clock;
pub mod error;
pub mod request;
pub mod sse;
pub mod stream;

pub use client::GatewayClient;
pub use clock::{ClockSkewTracker, ServerTimeRecord};
pub use error::{ClientError, HandlerError};
pub use request::{LedgerRequest, Order};
pub use stream::StreamState;
