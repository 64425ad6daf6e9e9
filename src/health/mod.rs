//! Core health subsystem.
//!
//! # Data Flow
//! ```text
//! active.rs (CoreMonitor, periodic NetworkSink::status)
//!     → state.rs (CoreStateCell, atomic swap)
//!     → SubmitTransactionHandler precondition (synced?)
//!     → GET /health
//! ```

pub mod active;
pub mod state;

pub use active::CoreMonitor;
pub use state::{CoreState, CoreStateCell, CoreStateGetter};
