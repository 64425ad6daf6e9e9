//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Stream connection drops:
//!     → backoff.rs (jittered exponential delay, reset on progress)
//!     → reconnect with the last delivered cursor
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Jittered backoff prevents reconnect storms against one server
//! - Submissions are never retried by the gateway (broadcast is at-most-once per hash)

pub mod backoff;

pub use backoff::{calculate_backoff, ReconnectBackoff};
