//! Asset issuance with a cash/reserved split.

use dasledger_types::*;
use tracing::debug;

use crate::{Database, Evaluator};

pub struct IssueAssetEvaluator;

#[derive(Debug)]
pub struct IssueContext {
    receiver: AccountId,
    asset: AssetId,
    total: ShareType,
}

impl Evaluator for IssueAssetEvaluator {
    type Operation = IssueAssetOperation;
    type Context = IssueContext;

    fn do_evaluate(db: &Database, op: &IssueAssetOperation) -> Result<IssueContext> {
        db.account(op.issuer)?;
        let asset = db.asset(op.asset.asset_id)?;
        if asset.issuer != op.issuer {
            return Err(LedgerError::NotOwner {
                account: op.issuer,
                object: asset.id.into(),
            });
        }
        let receiver = db.account(op.issue_to)?;
        if op.reserved > 0 && db.web_asset() != Some(asset.id) {
            return Err(LedgerError::invalid_operation(format!(
                "{} has no reserved pool",
                asset.symbol
            )));
        }

        let total = op.asset.amount + op.reserved;
        if asset.dynamic.current_supply + total > constants::MAX_SHARE_SUPPLY {
            return Err(LedgerError::AmountOverflow {
                reason: format!(
                    "issuing {total} {} over supply {}",
                    asset.symbol, asset.dynamic.current_supply
                ),
            });
        }

        Ok(IssueContext {
            receiver: receiver.id,
            asset: asset.id,
            total,
        })
    }

    fn do_apply(db: &mut Database, op: &IssueAssetOperation, ctx: IssueContext) -> Result<OperationResult> {
        db.adjust_pool(ctx.receiver, ctx.asset, FundingPool::Cash, op.asset.amount)?;
        db.adjust_pool(ctx.receiver, ctx.asset, FundingPool::Reserved, op.reserved)?;
        db.adjust_supply(ctx.asset, ctx.total)?;
        debug!(
            to = %ctx.receiver,
            asset = %ctx.asset,
            cash = op.asset.amount,
            reserved = op.reserved,
            "issued"
        );
        Ok(OperationResult::Void)
    }
}
