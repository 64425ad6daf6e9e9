//! Server clock tracking.
//!
//! Every gateway response carries a `Date` header. The tracker keeps the
//! last one seen per host together with the local time it arrived, which is
//! enough to estimate the server's current time without a round trip.

use chrono::DateTime;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// Default age after which an observation is no longer trusted.
pub const DEFAULT_STALENESS_SECS: i64 = 300;

/// A single `Date` header observation, in unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerTimeRecord {
    pub server_time: i64,
    pub local_time_recorded: i64,
}

/// Per-host record of server time observations.
///
/// Shared by every request a client makes. Last writer wins per host.
#[derive(Debug)]
pub struct ClockSkewTracker {
    records: Mutex<HashMap<String, ServerTimeRecord>>,
    staleness_secs: i64,
}

impl Default for ClockSkewTracker {
    fn default() -> Self {
        Self::new(DEFAULT_STALENESS_SECS)
    }
}

impl ClockSkewTracker {
    pub fn new(staleness_secs: i64) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            staleness_secs,
        }
    }

    /// Record a `Date` header (RFC 1123) seen from `host` at `local_now`.
    ///
    /// Headers that do not parse are ignored.
    pub fn record_observation(&self, host: &str, date_header: &str, local_now: i64) {
        let server_time = match DateTime::parse_from_rfc2822(date_header.trim()) {
            Ok(t) => t.timestamp(),
            Err(e) => {
                tracing::trace!(host = %host, error = %e, "Ignoring unparseable Date header");
                return;
            }
        };

        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                host.to_string(),
                ServerTimeRecord {
                    server_time,
                    local_time_recorded: local_now,
                },
            );
    }

    /// Estimated current server time for `host`, or 0 when unknown or stale.
    pub fn corrected_time(&self, host: &str, local_now: i64) -> i64 {
        let record = {
            let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
            match records.get(host) {
                Some(record) => *record,
                None => return 0,
            }
        };

        let elapsed = local_now - record.local_time_recorded;
        if elapsed > self.staleness_secs {
            return 0;
        }
        elapsed + record.server_time
    }

    pub fn record(&self, host: &str) -> Option<ServerTimeRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(host)
            .copied()
    }
}
