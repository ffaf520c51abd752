//! The two-phase evaluator contract.
//!
//! `do_evaluate` reads the store and resolves everything `do_apply` needs
//! into a context; `do_apply` only mutates. A failure in evaluate leaves
//! the store untouched. A failure in apply means evaluate missed a
//! precondition, so it is reported as a fatal invariant violation and
//! the caller rolls the store back.

use dasledger_types::{BaseOperation, LedgerError, OperationResult, Result};
use tracing::error;

use crate::Database;

pub trait Evaluator {
    type Operation: BaseOperation;
    /// Handles resolved by `do_evaluate` for `do_apply`.
    type Context;

    fn do_evaluate(db: &Database, op: &Self::Operation) -> Result<Self::Context>;

    fn do_apply(db: &mut Database, op: &Self::Operation, ctx: Self::Context) -> Result<OperationResult>;

    /// Stateless validation, then evaluate, then apply.
    fn evaluate_and_apply(db: &mut Database, op: &Self::Operation) -> Result<OperationResult> {
        op.check_fee()?;
        op.validate()?;
        let ctx = Self::do_evaluate(db, op)?;
        Self::do_apply(db, op, ctx).map_err(|err| {
            error!(payer = %op.fee_payer(), error = %err, "apply failed after successful evaluation");
            match err {
                LedgerError::InvariantViolation { .. } => err,
                other => LedgerError::InvariantViolation {
                    reason: other.to_string(),
                },
            }
        })
    }
}
