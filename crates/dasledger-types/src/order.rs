//! Limit order types.
//!
//! An order offers `for_sale` units of its sell asset at `sell_price`
//! (base = amount offered, quote = amount asked in return). Funds are
//! locked out of the seller's cash or reserved pool when the order is
//! created and return to that same pool on cancel or expiration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, Asset, AssetId, FundingPool, LimitOrderId, MarketPair, Price, Result, ShareType};

/// One direction of a trading pair: orders selling `sell` for `receive`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct BookSide {
    pub sell: AssetId,
    pub receive: AssetId,
}

impl BookSide {
    #[must_use]
    pub fn new(sell: AssetId, receive: AssetId) -> Self {
        Self { sell, receive }
    }

    /// The side an incoming order on this side trades against.
    #[must_use]
    pub fn opposite(self) -> Self {
        Self {
            sell: self.receive,
            receive: self.sell,
        }
    }

    #[must_use]
    pub fn pair(self) -> MarketPair {
        MarketPair::new(self.sell, self.receive)
    }
}

impl std::fmt::Display for BookSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}->{}", self.sell, self.receive)
    }
}

/// A limit order in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitOrder {
    pub id: LimitOrderId,
    pub seller: AccountId,
    /// base = amount offered, quote = amount asked for it.
    pub sell_price: Price,
    /// Remaining amount of the sell asset still locked in this order.
    pub for_sale: ShareType,
    pub expiration: DateTime<Utc>,
    /// Vault tethered to the seller that receives the proceeds instead.
    pub account_to_credit: Option<AccountId>,
    /// Pool the locked funds came from and return to.
    pub pool: FundingPool,
    /// Time priority within one price level: lower fills first. Orders
    /// taken off the book and put back are reordered by it.
    pub sequence: u64,
    pub created_at: DateTime<Utc>,
}

impl LimitOrder {
    #[must_use]
    pub fn sell_asset(&self) -> AssetId {
        self.sell_price.base.asset_id
    }

    #[must_use]
    pub fn receive_asset(&self) -> AssetId {
        self.sell_price.quote.asset_id
    }

    #[must_use]
    pub fn side(&self) -> BookSide {
        BookSide::new(self.sell_asset(), self.receive_asset())
    }

    #[must_use]
    pub fn pair(&self) -> MarketPair {
        self.sell_price.pair()
    }

    #[must_use]
    pub fn amount_for_sale(&self) -> Asset {
        Asset::new(self.for_sale, self.sell_asset())
    }

    /// What the remainder asks for at the order's own price, rounded down.
    pub fn amount_to_receive(&self) -> Result<Asset> {
        self.amount_for_sale().convert(&self.sell_price)
    }

    /// Where fill proceeds are credited.
    #[must_use]
    pub fn proceeds_account(&self) -> AccountId {
        self.account_to_credit.unwrap_or(self.seller)
    }

    #[must_use]
    pub fn is_filled(&self) -> bool {
        self.for_sale == 0
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl LimitOrder {
    /// A cash-funded order selling `sell` for `receive`, never expiring
    /// in practice. Time priority follows `id`.
    pub fn dummy(id: u64, seller: AccountId, sell: Asset, receive: Asset) -> Self {
        let epoch = DateTime::<Utc>::default();
        Self {
            id: LimitOrderId(id),
            seller,
            sell_price: Price::new(sell, receive),
            for_sale: sell.amount,
            expiration: epoch + chrono::Duration::days(365 * 100),
            account_to_credit: None,
            pool: FundingPool::Cash,
            sequence: id,
            created_at: epoch,
        }
    }
}
