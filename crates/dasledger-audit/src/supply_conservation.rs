//! Supply conservation check.
//!
//! For every asset:
//! ```text
//! current_supply == Σ(cash + reserved) + Σ(order for_sale) + Σ(wire-out holders) + accumulated_fees
//! ```
//!
//! Transfers, matches, cancels and expirations only move value between
//! these buckets. Issuance and completed wire-outs are the only operations
//! that change `current_supply`, and [`SupplyConservation`] can also track
//! those externally to cross-check the ledger's own bookkeeping.

use std::collections::BTreeMap;

use dasledger_chain::Database;
use dasledger_types::{AssetId, LedgerError, Result, ShareType};
use tracing::error;

/// Where the supply of one asset currently sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupplyBreakdown {
    pub asset: AssetId,
    pub balances: i128,
    pub orders: i128,
    pub wire_outs: i128,
    pub fees: i128,
    /// What the asset record says is outstanding.
    pub supply: i128,
}

impl SupplyBreakdown {
    #[must_use]
    pub fn accounted(&self) -> i128 {
        self.balances + self.orders + self.wire_outs + self.fees
    }

    #[must_use]
    pub fn is_conserved(&self) -> bool {
        self.accounted() == self.supply
    }
}

/// Per-asset supply snapshot, plus an optional externally kept record of
/// issued and burned amounts.
#[derive(Debug, Clone, Default)]
pub struct SupplyConservation {
    breakdowns: Vec<SupplyBreakdown>,
    issued: BTreeMap<AssetId, i128>,
    burned: BTreeMap<AssetId, i128>,
}

impl SupplyConservation {
    /// Sum up every bucket of every asset in `db`.
    #[must_use]
    pub fn snapshot(db: &Database) -> Self {
        let mut buckets: BTreeMap<AssetId, SupplyBreakdown> = db
            .assets()
            .map(|asset| {
                let b = SupplyBreakdown {
                    asset: asset.id,
                    balances: 0,
                    orders: 0,
                    wire_outs: 0,
                    fees: i128::from(asset.dynamic.accumulated_fees),
                    supply: i128::from(asset.dynamic.current_supply),
                };
                (asset.id, b)
            })
            .collect();

        for balance in db.balances() {
            if let Some(b) = buckets.get_mut(&balance.asset_id) {
                b.balances += i128::from(balance.cash) + i128::from(balance.reserved);
            }
        }
        for order in db.book().iter() {
            if let Some(b) = buckets.get_mut(&order.sell_asset()) {
                b.orders += i128::from(order.for_sale);
            }
        }
        for holder in db.wire_outs() {
            if let Some(b) = buckets.get_mut(&holder.asset.asset_id) {
                b.wire_outs += i128::from(holder.asset.amount);
            }
        }

        Self {
            breakdowns: buckets.into_values().collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn breakdowns(&self) -> &[SupplyBreakdown] {
        &self.breakdowns
    }

    #[must_use]
    pub fn breakdown(&self, asset: AssetId) -> Option<&SupplyBreakdown> {
        self.breakdowns.iter().find(|b| b.asset == asset)
    }

    /// Record units entering the ledger (issuance).
    pub fn record_issue(&mut self, asset: AssetId, amount: ShareType) {
        *self.issued.entry(asset).or_default() += i128::from(amount);
    }

    /// Record units leaving the ledger (completed wire-out).
    pub fn record_burn(&mut self, asset: AssetId, amount: ShareType) {
        *self.burned.entry(asset).or_default() += i128::from(amount);
    }

    /// Issued minus burned, as recorded through this tracker.
    #[must_use]
    pub fn expected_supply(&self, asset: AssetId) -> i128 {
        let issued = self.issued.get(&asset).copied().unwrap_or_default();
        let burned = self.burned.get(&asset).copied().unwrap_or_default();
        issued - burned
    }

    /// Replace the snapshot with a fresh one from `db`, keeping the
    /// issued/burned record.
    pub fn refresh(&mut self, db: &Database) {
        self.breakdowns = Self::snapshot(db).breakdowns;
    }

    /// Check that every asset's buckets add up to its recorded supply.
    pub fn verify(&self) -> Result<()> {
        for b in &self.breakdowns {
            if !b.is_conserved() {
                error!(asset = %b.asset, supply = b.supply, accounted = b.accounted(), "supply not conserved");
                return Err(LedgerError::InvariantViolation {
                    reason: format!(
                        "{}: supply {} != accounted {} (balances={}, orders={}, wire_outs={}, fees={})",
                        b.asset, b.supply, b.accounted(), b.balances, b.orders, b.wire_outs, b.fees
                    ),
                });
            }
        }
        Ok(())
    }

    /// [`verify`](Self::verify), and additionally compare each asset's
    /// supply against the issued/burned record.
    pub fn verify_against_record(&self) -> Result<()> {
        self.verify()?;
        for b in &self.breakdowns {
            let expected = self.expected_supply(b.asset);
            if b.supply != expected {
                error!(asset = %b.asset, supply = b.supply, expected, "supply differs from issuance record");
                return Err(LedgerError::InvariantViolation {
                    reason: format!("{}: supply {} != issued minus burned {expected}", b.asset, b.supply),
                });
            }
        }
        Ok(())
    }
}
