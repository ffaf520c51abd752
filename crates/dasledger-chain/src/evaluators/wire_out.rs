//! Wire-out requests and their settlement.

use dasledger_types::*;
use tracing::debug;

use crate::evaluators::transfer::require_cash;
use crate::{Database, Evaluator};

pub struct WireOutEvaluator;
pub struct WireOutCompleteEvaluator;
pub struct WireOutRejectEvaluator;

#[derive(Debug)]
pub struct WireOutContext {
    account: AccountId,
}

impl Evaluator for WireOutEvaluator {
    type Operation = WireOutOperation;
    type Context = WireOutContext;

    fn do_evaluate(db: &Database, op: &WireOutOperation) -> Result<WireOutContext> {
        let account = db.account(op.account)?;
        db.asset(op.asset_to_wire.asset_id)?;
        require_cash(db, account.id, op.asset_to_wire)?;
        Ok(WireOutContext { account: account.id })
    }

    fn do_apply(db: &mut Database, op: &WireOutOperation, ctx: WireOutContext) -> Result<OperationResult> {
        db.adjust_cash(ctx.account, op.asset_to_wire.asset_id, -op.asset_to_wire.amount)?;
        let holder = db.create_wire_out(ctx.account, op.asset_to_wire);
        debug!(holder = %holder, account = %ctx.account, amount = %op.asset_to_wire, "wire-out requested");
        Ok(OperationResult::Created(holder.into()))
    }
}

/// The holder being settled, after the authority check.
#[derive(Debug)]
pub struct SettleContext {
    holder: WireOutHolderId,
}

/// The requesting account or the configured handler may settle a holder.
fn resolve_holder(db: &Database, handler: AccountId, id: WireOutHolderId) -> Result<SettleContext> {
    let holder = db.wire_out(id)?;
    db.account(handler)?;
    let authorized = handler == holder.account || db.params().wire_out_handler == Some(handler);
    if !authorized {
        return Err(LedgerError::NotOwner {
            account: handler,
            object: id.into(),
        });
    }
    Ok(SettleContext { holder: holder.id })
}

impl Evaluator for WireOutCompleteEvaluator {
    type Operation = WireOutCompleteOperation;
    type Context = SettleContext;

    fn do_evaluate(db: &Database, op: &WireOutCompleteOperation) -> Result<SettleContext> {
        resolve_holder(db, op.wire_out_handler, op.holder)
    }

    fn do_apply(db: &mut Database, _op: &WireOutCompleteOperation, ctx: SettleContext) -> Result<OperationResult> {
        let holder = db.remove_wire_out(ctx.holder)?;
        db.adjust_supply(holder.asset.asset_id, -holder.asset.amount)?;
        debug!(holder = %holder.id, amount = %holder.asset, "wire-out completed");
        Ok(OperationResult::Void)
    }
}

impl Evaluator for WireOutRejectEvaluator {
    type Operation = WireOutRejectOperation;
    type Context = SettleContext;

    fn do_evaluate(db: &Database, op: &WireOutRejectOperation) -> Result<SettleContext> {
        resolve_holder(db, op.wire_out_handler, op.holder)
    }

    fn do_apply(db: &mut Database, _op: &WireOutRejectOperation, ctx: SettleContext) -> Result<OperationResult> {
        let holder = db.remove_wire_out(ctx.holder)?;
        db.adjust_cash(holder.account, holder.asset.asset_id, holder.asset.amount)?;
        debug!(holder = %holder.id, account = %holder.account, amount = %holder.asset, "wire-out rejected");
        Ok(OperationResult::Void)
    }
}
