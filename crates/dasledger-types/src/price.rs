//! Exact amounts and prices.
//!
//! Amounts are integer counts of an asset's smallest unit. A [`Price`] is
//! the exact ratio between two amounts of different assets; it is never
//! reduced or rounded. Conversions through a price use `i128`
//! intermediates and round down.

use std::cmp::Ordering;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AssetId, LedgerError, MarketPair, Result, constants};

/// Integer amount in an asset's smallest unit.
pub type ShareType = i64;

// ---------------------------------------------------------------------------
// Asset
// ---------------------------------------------------------------------------

/// An amount of a specific asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Asset {
    pub amount: ShareType,
    pub asset_id: AssetId,
}

impl Asset {
    #[must_use]
    pub fn new(amount: ShareType, asset_id: AssetId) -> Self {
        Self { amount, asset_id }
    }

    #[must_use]
    pub fn zero(asset_id: AssetId) -> Self {
        Self::new(0, asset_id)
    }

    /// Whether the amount lies in `0..=MAX_SHARE_SUPPLY`.
    #[must_use]
    pub fn is_in_range(&self) -> bool {
        (0..=constants::MAX_SHARE_SUPPLY).contains(&self.amount)
    }

    /// Convert this amount through `price` into the price's other asset,
    /// rounding down.
    ///
    /// # Errors
    /// `InvalidOperation` if this asset is not part of the price, or
    /// `AmountOverflow` if the result does not fit an amount.
    pub fn convert(&self, price: &Price) -> Result<Asset> {
        let (from, to) = if self.asset_id == price.base.asset_id {
            (price.base, price.quote)
        } else if self.asset_id == price.quote.asset_id {
            (price.quote, price.base)
        } else {
            return Err(LedgerError::invalid_operation(format!(
                "{} is not priced by {price}",
                self.asset_id
            )));
        };
        if from.amount <= 0 {
            return Err(LedgerError::invalid_operation(format!(
                "cannot convert through degenerate price {price}"
            )));
        }
        let raw = mul_div_floor(self.amount, to.amount, from.amount);
        let amount = i64::try_from(raw).map_err(|_| LedgerError::AmountOverflow {
            reason: format!("{} x {price} = {raw}", self.amount),
        })?;
        Ok(Asset::new(amount, to.asset_id))
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.asset_id)
    }
}

/// `a * b / c` rounded toward zero in `i128`. `c` must be positive.
#[must_use]
pub fn mul_div_floor(a: i64, b: i64, c: i64) -> i128 {
    i128::from(a) * i128::from(b) / i128::from(c)
}

// ---------------------------------------------------------------------------
// Price
// ---------------------------------------------------------------------------

/// Exact exchange ratio `base : quote` between two different assets.
///
/// For a limit order, `base` is the amount offered and `quote` the amount
/// asked for in return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Price {
    pub base: Asset,
    pub quote: Asset,
}

impl Price {
    #[must_use]
    pub fn new(base: Asset, quote: Asset) -> Self {
        Self { base, quote }
    }

    /// Both legs positive and of different assets.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.base.amount > 0 && self.quote.amount > 0 && self.base.asset_id != self.quote.asset_id
    }

    /// The same ratio seen from the other side.
    #[must_use]
    pub fn invert(&self) -> Self {
        Self {
            base: self.quote,
            quote: self.base,
        }
    }

    #[must_use]
    pub fn pair(&self) -> MarketPair {
        MarketPair::new(self.base.asset_id, self.quote.asset_id)
    }

    /// Compare the ratios `quote / base` of two prices over the same
    /// directed pair, exactly.
    #[must_use]
    pub fn cmp_ratio(&self, other: &Price) -> Ordering {
        let lhs = i128::from(self.quote.amount) * i128::from(other.base.amount);
        let rhs = i128::from(other.quote.amount) * i128::from(self.base.amount);
        lhs.cmp(&rhs)
    }

    /// `quote / base` as a decimal, for display and logging only.
    #[must_use]
    pub fn to_decimal(&self) -> Option<Decimal> {
        Decimal::from(self.quote.amount).checked_div(Decimal::from(self.base.amount))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.quote, self.base)
    }
}
