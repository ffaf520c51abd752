//! Continuous price-time priority matcher.
//!
//! ```text
//! match_order(&mut OrderBook, taker, fee options, &mut fill sequence) -> MatchOutcome
//! ```
//!
//! The incoming (taker) order is crossed against the opposite side of its
//! pair, best price first and oldest first within a price. Every fill
//! executes at the resting (maker) order's price. The market fee of the
//! asset the maker receives is withheld from the maker's proceeds; the
//! taker never pays one.
//!
//! The matcher only moves orders within the book. It does not touch
//! balances: the caller credits [`Fill`] proceeds, collects fees and
//! refunds culled orders.

use dasledger_types::{
    Asset, AssetOptions, Fill, LedgerError, LimitOrder, LimitOrderId, Price, Result,
};
use tracing::{debug, warn};

use crate::OrderBook;

/// Everything a single call to [`match_order`] did to the book.
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    /// Fills in execution order.
    pub fills: Vec<Fill>,
    /// The taker after matching, with its final remainder.
    pub taker: LimitOrder,
    /// The taker's remainder was inserted into the book.
    pub rested: bool,
    /// Makers whose remainder reached zero; already removed from the book.
    pub filled_makers: Vec<LimitOrder>,
    /// Makers whose remainder can no longer buy a single unit at their own
    /// price; removed from the book and owed a refund.
    pub culled_makers: Vec<LimitOrder>,
    /// Price of the last fill, which is always a maker's price.
    pub last_price: Option<Price>,
}

/// Whether a taker selling at `taker` accepts a maker selling at `maker`.
///
/// `maker.quote / maker.base <= taker.base / taker.quote`, compared exactly.
#[must_use]
pub fn prices_cross(taker: &Price, maker: &Price) -> bool {
    let maker_side = i128::from(maker.quote.amount) * i128::from(taker.quote.amount);
    let taker_side = i128::from(maker.base.amount) * i128::from(taker.base.amount);
    maker_side <= taker_side
}

/// First resting order of the same seller that `taker` would cross, in
/// matching order.
#[must_use]
pub fn find_self_cross(book: &OrderBook, taker: &LimitOrder) -> Option<LimitOrderId> {
    book.levels(taker.side().opposite())
        .take_while(|level| prices_cross(&taker.sell_price, &level.price.0))
        .flat_map(|level| level.orders.iter())
        .find(|maker| maker.seller == taker.seller)
        .map(|maker| maker.id)
}

/// Cross `taker` against the book and rest any remainder.
///
/// `maker_fee` holds the options of the asset the makers receive, which
/// is the taker's sell asset. `next_sequence` is advanced once per fill.
///
/// # Errors
/// `InvalidOrder` if the taker would trade with an order of its own
/// seller; `AmountOverflow` if a conversion leaves the amount range. The
/// book may be partially modified on error; callers that need to keep it
/// run the match inside [`OrderBook::begin`] and roll back.
pub fn match_order(
    book: &mut OrderBook,
    mut taker: LimitOrder,
    maker_fee: &AssetOptions,
    next_sequence: &mut u64,
) -> Result<MatchOutcome> {
    let maker_side = taker.side().opposite();
    let mut outcome = MatchOutcome {
        fills: Vec::new(),
        taker: taker.clone(),
        rested: false,
        filled_makers: Vec::new(),
        culled_makers: Vec::new(),
        last_price: None,
    };

    while taker.for_sale > 0 {
        let Some(maker) = book.best(maker_side).cloned() else {
            break;
        };
        if !prices_cross(&taker.sell_price, &maker.sell_price) {
            break;
        }
        if maker.seller == taker.seller {
            warn!(taker = %taker.id, maker = %maker.id, seller = %taker.seller, "self-cross reached matcher");
            return Err(LedgerError::invalid_order(format!(
                "{} would cross {} of the same seller",
                taker.id, maker.id
            )));
        }

        let maker_wants = maker.amount_to_receive()?.amount;
        if maker_wants == 0 {
            // Remainder too small to ask for anything at its own price.
            if let Some(culled) = book.pop_best(maker_side) {
                debug!(order = %culled.id, remaining = culled.for_sale, "culling unfillable order");
                outcome.culled_makers.push(culled);
            }
            continue;
        }

        let (taker_pays, maker_pays) = if taker.for_sale <= maker_wants {
            let pays = taker.amount_for_sale();
            (pays, pays.convert(&maker.sell_price)?)
        } else {
            (maker.amount_to_receive()?, maker.amount_for_sale())
        };
        if taker_pays.amount == 0 || maker_pays.amount == 0 {
            break;
        }

        let maker = book.reduce_best(maker_side, maker_pays.amount)?;
        taker.for_sale -= taker_pays.amount;
        let maker_filled = maker.is_filled();
        let fee = maker_fee.market_fee(taker_pays.amount);

        let fill = Fill {
            sequence: *next_sequence,
            pair: taker.pair(),
            maker_order: maker.id,
            maker_credit: maker.proceeds_account(),
            taker_order: taker.id,
            taker_credit: taker.proceeds_account(),
            maker_pays,
            taker_pays,
            maker_fee: Asset::new(fee, taker_pays.asset_id),
            price: maker.sell_price,
            maker_filled,
        };
        debug!(
            seq = fill.sequence,
            maker = %fill.maker_order,
            taker = %fill.taker_order,
            maker_pays = %fill.maker_pays,
            taker_pays = %fill.taker_pays,
            fee = fee,
            rate = ?fill.price.to_decimal(),
            "fill"
        );
        *next_sequence += 1;
        outcome.last_price = Some(fill.price);
        outcome.fills.push(fill);

        if maker_filled {
            if let Some(done) = book.pop_best(maker_side) {
                outcome.filled_makers.push(done);
            }
        }
    }

    if taker.for_sale > 0 {
        book.insert(taker.clone())?;
        outcome.rested = true;
    }
    outcome.taker = taker;
    Ok(outcome)
}
