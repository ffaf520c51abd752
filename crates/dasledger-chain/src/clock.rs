//! Ledger time as seen by evaluators.

use chrono::{DateTime, Utc};

/// Read-only view of ledger time. The core never reads the wall clock.
pub trait Clock {
    /// Head time: the time of the state transition being applied.
    fn now(&self) -> DateTime<Utc>;

    /// Next boundary at which resting orders are swept for expiration.
    fn next_maintenance_time(&self) -> DateTime<Utc>;
}
