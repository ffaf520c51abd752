//! Limit-order placement and cancellation.

use dasledger_matchcore::find_self_cross;
use dasledger_types::*;
use tracing::{debug, warn};

use crate::market::{cancel_order, settle_outcome};
use crate::{Clock, Database, Evaluator};

pub struct LimitOrderCreateEvaluator;
pub struct LimitOrderCancelEvaluator;

#[derive(Debug)]
pub struct CreateContext {
    seller: AccountId,
    pool: FundingPool,
    sell: Asset,
}

impl LimitOrderCreateEvaluator {
    fn build_order(db: &Database, id: LimitOrderId, op: &LimitOrderCreateOperation) -> LimitOrder {
        LimitOrder {
            id,
            seller: op.seller,
            sell_price: op.sell_price(),
            for_sale: op.sell_amount().amount,
            expiration: op.expiration,
            account_to_credit: op.account_to_credit,
            pool: op.funding_pool(),
            sequence: id.0,
            created_at: db.now(),
        }
    }
}

impl Evaluator for LimitOrderCreateEvaluator {
    type Operation = LimitOrderCreateOperation;
    type Context = CreateContext;

    fn do_evaluate(db: &Database, op: &LimitOrderCreateOperation) -> Result<CreateContext> {
        let seller = db.account(op.seller)?;
        if let Some(credit) = op.account_to_credit {
            let credit = db.account(credit)?;
            if !credit.is_vault() || !credit.is_tethered_to(seller.id) {
                return Err(LedgerError::relationship(format!(
                    "{} {} is not a vault tethered to {}",
                    credit.kind, credit.id, seller.id
                )));
            }
        }
        let sell = op.sell_amount();
        db.asset(sell.asset_id)?;
        db.asset(op.min_to_receive.asset_id)?;

        if op.expiration <= db.now() {
            return Err(LedgerError::invalid_order(format!(
                "expiration {} is not after {}",
                op.expiration,
                db.now()
            )));
        }
        let pool = op.funding_pool();
        if pool == FundingPool::Reserved && db.web_asset() != Some(sell.asset_id) {
            return Err(LedgerError::invalid_order(format!(
                "{} has no reserved pool",
                sell.asset_id
            )));
        }

        let available = db.balance(seller.id, sell.asset_id).pool(pool);
        if available < sell.amount {
            return Err(LedgerError::InsufficientBalance {
                account: seller.id,
                asset: sell.asset_id,
                needed: sell.amount,
                available,
            });
        }

        let incoming = Self::build_order(db, db.next_order_id(), op);
        if let Some(own) = find_self_cross(db.book(), &incoming) {
            warn!(seller = %seller.id, resting = %own, "order would cross the seller's own order");
            return Err(LedgerError::invalid_order(format!(
                "{} would cross its own {own}",
                seller.id
            )));
        }

        Ok(CreateContext {
            seller: seller.id,
            pool,
            sell,
        })
    }

    fn do_apply(
        db: &mut Database,
        op: &LimitOrderCreateOperation,
        ctx: CreateContext,
    ) -> Result<OperationResult> {
        db.adjust_pool(ctx.seller, ctx.sell.asset_id, ctx.pool, -ctx.sell.amount)?;
        let id = db.allocate_order_id();
        let order = Self::build_order(db, id, op);

        let outcome = db.match_incoming(order)?;
        debug!(
            order = %id,
            fills = outcome.fills.len(),
            remaining = outcome.taker.for_sale,
            rested = outcome.rested,
            "order placed"
        );
        settle_outcome(db, outcome)?;
        Ok(OperationResult::Created(id.into()))
    }
}

#[derive(Debug)]
pub struct CancelContext {
    order: LimitOrderId,
}

impl Evaluator for LimitOrderCancelEvaluator {
    type Operation = LimitOrderCancelOperation;
    type Context = CancelContext;

    fn do_evaluate(db: &Database, op: &LimitOrderCancelOperation) -> Result<CancelContext> {
        let order = db.limit_order(op.order)?;
        let caller = db.account(op.fee_paying_account)?;
        let seller = db.account(order.seller)?;
        if caller.id != seller.id && !seller.is_tethered_to(caller.id) {
            return Err(LedgerError::NotOwner {
                account: caller.id,
                object: order.id.into(),
            });
        }
        Ok(CancelContext { order: order.id })
    }

    fn do_apply(
        db: &mut Database,
        _op: &LimitOrderCancelOperation,
        ctx: CancelContext,
    ) -> Result<OperationResult> {
        let order = cancel_order(db, ctx.order)?;
        debug!(order = %order.id, refund = %order.amount_for_sale(), "order cancelled");
        Ok(OperationResult::Void)
    }
}
