//! Ledger-time advancement and the maintenance sweep.

use chrono::{DateTime, Duration, Utc};
use dasledger_types::{LedgerError, LimitOrderId, Result};
use tracing::info;

use crate::market::cancel_order;
use crate::{Clock, Database};

/// What one call to [`advance_time_to`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    /// Maintenance boundaries crossed.
    pub boundaries: u64,
    /// Orders expired and refunded, earliest expiration first.
    pub expired: Vec<LimitOrderId>,
}

/// Move head time to `time`. If a maintenance boundary is reached, every
/// order expiring at or before `time` is refunded to its pool and the
/// next boundary is scheduled past `time`.
pub fn advance_time_to(db: &mut Database, time: DateTime<Utc>) -> Result<MaintenanceReport> {
    if time < db.now() {
        return Err(LedgerError::invalid_operation(format!(
            "cannot move ledger time back from {} to {time}",
            db.now()
        )));
    }
    db.set_head_time(time);

    let mut report = MaintenanceReport::default();
    if time < db.next_maintenance_time() {
        return Ok(report);
    }

    report.expired = expire_orders(db)?;
    let interval = db.params().maintenance_interval().num_seconds();
    let behind = (time - db.next_maintenance_time()).num_seconds();
    let boundaries = behind / interval + 1;
    let next = db.next_maintenance_time() + Duration::seconds(boundaries * interval);
    report.boundaries = u64::try_from(boundaries).unwrap_or_default();
    db.set_next_maintenance_time(next);

    info!(
        head = %time,
        boundaries = report.boundaries,
        expired = report.expired.len(),
        next_maintenance = %next,
        "maintenance"
    );
    Ok(report)
}

/// Cancel every resting order whose expiration has passed.
pub fn expire_orders(db: &mut Database) -> Result<Vec<LimitOrderId>> {
    let expired = db.book().expired(db.now());
    for id in &expired {
        cancel_order(db, *id)?;
    }
    Ok(expired)
}
