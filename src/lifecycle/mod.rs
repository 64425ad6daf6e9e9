//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     root token cancelled → server stops accepting, drains
//!                          → core monitor exits
//!                          → client streams close
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
