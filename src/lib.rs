//! Ledger gateway library.
//!
//! Transaction submission with exactly-once outcome delivery, a
//! cursor-resumable ledger stream client and clock-skew tracking.

pub mod client;
pub mod config;
pub mod health;
pub mod http;
pub mod ledger;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod txsub;

pub use client::GatewayClient;
pub use config::GatewayConfig;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
