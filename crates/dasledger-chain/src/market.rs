//! Balance side of the matching engine.
//!
//! The matcher moves orders; this module moves the money: fill proceeds,
//! market fees and refunds of orders leaving the book unfilled.

use dasledger_matchcore::MatchOutcome;
use dasledger_types::{LimitOrder, LimitOrderId, Result};
use tracing::debug;

use crate::Database;

/// Credit both sides of every fill, collect maker fees and refund any
/// culled makers.
pub(crate) fn settle_outcome(db: &mut Database, outcome: MatchOutcome) -> Result<()> {
    for fill in outcome.fills {
        let maker_proceeds = fill.maker_proceeds();
        let taker_proceeds = fill.taker_proceeds();
        db.adjust_cash(fill.maker_credit, maker_proceeds.asset_id, maker_proceeds.amount)?;
        db.collect_fee(fill.maker_fee)?;
        db.adjust_cash(fill.taker_credit, taker_proceeds.asset_id, taker_proceeds.amount)?;
        db.record_fill(fill);
    }
    for order in &outcome.culled_makers {
        refund_order(db, order)?;
    }
    Ok(())
}

/// Return an order's remainder to the pool it was drawn from.
pub(crate) fn refund_order(db: &mut Database, order: &LimitOrder) -> Result<()> {
    if order.for_sale > 0 {
        db.adjust_pool(order.seller, order.sell_asset(), order.pool, order.for_sale)?;
    }
    debug!(order = %order.id, refund = %order.amount_for_sale(), pool = %order.pool, "order refunded");
    Ok(())
}

/// Take an order off the book and refund it. Shared by cancel and
/// expiration.
pub(crate) fn cancel_order(db: &mut Database, id: LimitOrderId) -> Result<LimitOrder> {
    let order = db.remove_order(id)?;
    refund_order(db, &order)?;
    Ok(order)
}
