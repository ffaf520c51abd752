//! Plain transfers between wallets and custodians.

use dasledger_types::*;
use tracing::debug;

use crate::{Database, Evaluator};

pub struct TransferEvaluator;

#[derive(Debug)]
pub struct TransferContext {
    from: AccountId,
    to: AccountId,
}

/// Fail with `InsufficientBalance` unless `account` holds `amount` in cash.
pub(crate) fn require_cash(db: &Database, account: AccountId, amount: Asset) -> Result<()> {
    let available = db.cash(account, amount.asset_id);
    if available < amount.amount {
        return Err(LedgerError::InsufficientBalance {
            account,
            asset: amount.asset_id,
            needed: amount.amount,
            available,
        });
    }
    Ok(())
}

impl Evaluator for TransferEvaluator {
    type Operation = TransferOperation;
    type Context = TransferContext;

    fn do_evaluate(db: &Database, op: &TransferOperation) -> Result<TransferContext> {
        let from = db.account(op.from)?;
        let to = db.account(op.to)?;
        if !from.is_transfer_capable() || !to.is_transfer_capable() {
            return Err(LedgerError::relationship(format!(
                "cannot transfer from {} {} to {} {}",
                from.kind, from.id, to.kind, to.id
            )));
        }
        let asset = db.asset(op.amount.asset_id)?;
        if asset.options.transfer_restricted {
            return Err(LedgerError::invalid_operation(format!(
                "{} cannot be transferred",
                asset.symbol
            )));
        }
        require_cash(db, from.id, op.amount)?;
        Ok(TransferContext {
            from: from.id,
            to: to.id,
        })
    }

    fn do_apply(db: &mut Database, op: &TransferOperation, ctx: TransferContext) -> Result<OperationResult> {
        db.adjust_cash(ctx.from, op.amount.asset_id, -op.amount.amount)?;
        db.adjust_cash(ctx.to, op.amount.asset_id, op.amount.amount)?;
        debug!(from = %ctx.from, to = %ctx.to, amount = %op.amount, "transfer");
        Ok(OperationResult::Void)
    }
}
