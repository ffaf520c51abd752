//! # dasledger-audit
//!
//! Read-only checks over a ledger [`Database`]:
//!
//! - [`SupplyConservation`]: every issued unit is held somewhere, either in
//!   a balance, locked in an order, parked in a wire-out holder or
//!   collected as a market fee
//! - [`invariants`]: non-negative pools, symmetric tethers, a well-formed
//!   order book
//! - [`state_root`]: a hash over the whole ledger state for comparing
//!   replicas

pub mod invariants;
pub mod state_root;
pub mod supply_conservation;

use dasledger_chain::Database;
use dasledger_types::Result;
use tracing::info;

pub use invariants::check_invariants;
pub use state_root::{compute_state_root, state_root_hex};
pub use supply_conservation::{SupplyBreakdown, SupplyConservation};

/// Summary of a passing [`audit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditReport {
    pub supplies: Vec<SupplyBreakdown>,
    pub state_root: String,
}

/// Run every check against `db`. Fails on the first violation.
pub fn audit(db: &Database) -> Result<AuditReport> {
    check_invariants(db)?;
    let supplies = SupplyConservation::snapshot(db);
    supplies.verify()?;
    let state_root = state_root_hex(db);
    info!(assets = supplies.breakdowns().len(), state_root = %state_root, "ledger audit passed");
    Ok(AuditReport {
        supplies: supplies.breakdowns().to_vec(),
        state_root,
    })
}
