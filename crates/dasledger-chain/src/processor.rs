//! Operation dispatch and atomic state transitions.
//!
//! [`evaluate_and_apply`] routes an [`Operation`] to its evaluator. It
//! works directly on a [`Database`] and may leave it half-modified on
//! failure. [`Chain`] wraps a database and gives every operation,
//! transaction and time advance all-or-nothing semantics: it opens a
//! savepoint, applies in place and rolls back on error.

use chrono::{DateTime, Utc};
use dasledger_types::*;
use tracing::{debug, error};

use crate::evaluators::{
    IssueAssetEvaluator, LimitOrderCancelEvaluator, LimitOrderCreateEvaluator, TransferEvaluator,
    TransferVaultToWalletEvaluator, WireOutCompleteEvaluator, WireOutEvaluator, WireOutRejectEvaluator,
};
use crate::maintenance::{self, MaintenanceReport};
use crate::{Database, Evaluator};

/// What one applied operation produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub result: OperationResult,
    /// Fills executed by this operation, in sequence order.
    pub fills: Vec<Fill>,
}

impl Receipt {
    #[must_use]
    pub fn limit_order(&self) -> Option<LimitOrderId> {
        self.result.limit_order()
    }

    #[must_use]
    pub fn wire_out_holder(&self) -> Option<WireOutHolderId> {
        self.result.wire_out_holder()
    }
}

/// Dispatch one operation to its evaluator.
pub fn evaluate_and_apply(db: &mut Database, op: &Operation) -> Result<Receipt> {
    let result = match op {
        Operation::IssueAsset(op) => IssueAssetEvaluator::evaluate_and_apply(db, op),
        Operation::Transfer(op) => TransferEvaluator::evaluate_and_apply(db, op),
        Operation::TransferVaultToWallet(op) => {
            TransferVaultToWalletEvaluator::evaluate_and_apply(db, op)
        }
        Operation::WireOut(op) => WireOutEvaluator::evaluate_and_apply(db, op),
        Operation::WireOutComplete(op) => WireOutCompleteEvaluator::evaluate_and_apply(db, op),
        Operation::WireOutReject(op) => WireOutRejectEvaluator::evaluate_and_apply(db, op),
        Operation::LimitOrderCreate(op) => LimitOrderCreateEvaluator::evaluate_and_apply(db, op),
        Operation::LimitOrderCancel(op) => LimitOrderCancelEvaluator::evaluate_and_apply(db, op),
    };
    let fills = db.take_fills();
    match &result {
        Ok(res) => debug!(op = op.name(), payer = %op.fee_payer(), result = ?res, fills = fills.len(), "applied"),
        Err(err) => debug!(op = op.name(), payer = %op.fee_payer(), error = %err, "rejected"),
    }
    result.map(|result| Receipt { result, fills })
}

/// A ledger whose state only ever changes by whole operations.
#[derive(Debug, Clone)]
pub struct Chain {
    db: Database,
}

impl Chain {
    pub fn new(params: ChainParameters) -> Result<Self> {
        Ok(Self {
            db: Database::new(params)?,
        })
    }

    /// Load parameters from JSON and start an empty ledger.
    pub fn from_json(params: &str) -> Result<Self> {
        Self::new(ChainParameters::from_json(params)?)
    }

    #[must_use]
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Direct access for genesis setup (accounts, assets, tethers, limits).
    pub fn db_mut(&mut self) -> &mut Database {
        &mut self.db
    }

    /// Apply one operation; on error the ledger is unchanged.
    pub fn apply_operation(&mut self, op: impl Into<Operation>) -> Result<Receipt> {
        let op = op.into();
        self.atomically(|db| evaluate_and_apply(db, &op))
    }

    /// Apply operations in order as one unit: if any fails, none of them
    /// take effect.
    pub fn apply_transaction(&mut self, ops: &[Operation]) -> Result<Vec<Receipt>> {
        self.atomically(|db| {
            let mut receipts = Vec::with_capacity(ops.len());
            for (index, op) in ops.iter().enumerate() {
                match evaluate_and_apply(db, op) {
                    Ok(receipt) => receipts.push(receipt),
                    Err(err) => {
                        if err.is_fatal() {
                            error!(index, op = op.name(), error = %err, "transaction aborted");
                        }
                        return Err(err);
                    }
                }
            }
            Ok(receipts)
        })
    }

    /// Move ledger time forward, running maintenance at any boundary.
    pub fn advance_time_to(&mut self, time: DateTime<Utc>) -> Result<MaintenanceReport> {
        self.atomically(|db| maintenance::advance_time_to(db, time))
    }

    /// Run `f` under a savepoint, keeping its changes only if it succeeds.
    fn atomically<T>(&mut self, f: impl FnOnce(&mut Database) -> Result<T>) -> Result<T> {
        self.db.begin();
        match f(&mut self.db) {
            Ok(value) => {
                self.db.commit();
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback) = self.db.rollback() {
                    error!(error = %rollback, "rollback failed");
                    return Err(rollback);
                }
                Err(err)
            }
        }
    }
}
