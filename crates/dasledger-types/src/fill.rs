//! Fill records produced by the matching engine.
//!
//! A [`Fill`] is the immutable record of one cross between an incoming
//! (taker) order and a resting (maker) order, executed at the maker's
//! price.

use serde::{Deserialize, Serialize};

use crate::{AccountId, Asset, LimitOrderId, MarketPair, Price};

/// One executed cross between a taker and a maker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fill {
    /// Ledger-wide fill sequence number, deterministic across replicas.
    pub sequence: u64,
    pub pair: MarketPair,
    /// The resting order.
    pub maker_order: LimitOrderId,
    /// Account credited with the maker's proceeds.
    pub maker_credit: AccountId,
    /// The incoming order.
    pub taker_order: LimitOrderId,
    /// Account credited with the taker's proceeds.
    pub taker_credit: AccountId,
    /// Amount leaving the maker order (received in full by the taker).
    pub maker_pays: Asset,
    /// Amount leaving the taker order, before the maker's fee.
    pub taker_pays: Asset,
    /// Market fee withheld from the maker's proceeds.
    pub maker_fee: Asset,
    /// Execution price: always the maker's price.
    pub price: Price,
    /// The maker order's remainder reached zero.
    pub maker_filled: bool,
}

impl Fill {
    /// Net amount credited to the maker.
    #[must_use]
    pub fn maker_proceeds(&self) -> Asset {
        Asset::new(self.taker_pays.amount - self.maker_fee.amount, self.taker_pays.asset_id)
    }

    /// Amount credited to the taker. Takers never pay a market fee.
    #[must_use]
    pub fn taker_proceeds(&self) -> Asset {
        self.maker_pays
    }
}

impl std::fmt::Display for Fill {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Fill[{}] {} {} <- {} for {} @ {} (fee {})",
            self.sequence,
            self.pair,
            self.taker_order,
            self.maker_order,
            self.maker_pays,
            self.price,
            self.maker_fee,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AssetId;

    fn make_fill() -> Fill {
        let web = AssetId(1);
        let das = AssetId(0);
        Fill {
            sequence: 0,
            pair: MarketPair::new(web, das),
            maker_order: LimitOrderId(0),
            maker_credit: AccountId(1),
            taker_order: LimitOrderId(1),
            taker_credit: AccountId(2),
            maker_pays: Asset::new(100, das),
            taker_pays: Asset::new(100, web),
            maker_fee: Asset::new(1, web),
            price: Price::new(Asset::new(100, das), Asset::new(100, web)),
            maker_filled: true,
        }
    }

    #[test]
    fn proceeds_split_fee_from_maker_only() {
        let fill = make_fill();
        assert_eq!(fill.maker_proceeds().amount, 99);
        assert_eq!(fill.taker_proceeds().amount, 100);
    }

    #[test]
    fn fill_display() {
        let s = format!("{}", make_fill());
        assert!(s.contains("order:1"));
        assert!(s.contains("fee 1 asset:1"));
    }

    #[test]
    fn fill_serde_roundtrip() {
        let fill = make_fill();
        let json = serde_json::to_string(&fill).unwrap();
        let back: Fill = serde_json::from_str(&json).unwrap();
        assert_eq!(fill, back);
    }
}
