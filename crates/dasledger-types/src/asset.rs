//! Asset definitions: market-fee configuration and supply tracking.

use serde::{Deserialize, Serialize};

use crate::{AccountId, Asset, AssetId, Price, ShareType, constants};

/// Market and transfer options of an asset. Changed only through an
/// explicit options update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetOptions {
    /// Fee charged on amounts of this asset received by a maker, in units
    /// of [`constants::PERCENT_100`] (100 = 1%).
    pub market_fee_percent: u16,
    /// Upper bound on a single fill's market fee.
    pub max_market_fee: ShareType,
    /// Reference price of this asset against the core asset.
    pub core_exchange_rate: Price,
    /// Restricted assets cannot move through plain transfers.
    pub transfer_restricted: bool,
}

impl AssetOptions {
    /// Options with no market fee and a 1:1 reference rate.
    #[must_use]
    pub fn new(asset: AssetId, core_asset: AssetId) -> Self {
        Self {
            market_fee_percent: 0,
            max_market_fee: constants::MAX_SHARE_SUPPLY,
            core_exchange_rate: Price::new(Asset::new(1, asset), Asset::new(1, core_asset)),
            transfer_restricted: false,
        }
    }

    /// Fee owed on `received` units: `ceil(received * percent / 10000)`.
    ///
    /// Any nonzero percent on a nonzero amount costs at least one unit.
    /// The result is capped by `max_market_fee` and by `received` itself.
    #[must_use]
    pub fn market_fee(&self, received: ShareType) -> ShareType {
        if self.market_fee_percent == 0 || received <= 0 {
            return 0;
        }
        let nominal = i128::from(received) * i128::from(self.market_fee_percent);
        let hundred = i128::from(constants::PERCENT_100);
        let fee = (nominal + hundred - 1) / hundred;
        // fee <= received, which is an i64
        let fee = i64::try_from(fee).unwrap_or(received);
        fee.min(self.max_market_fee.max(0)).min(received)
    }
}

/// Supply bookkeeping of an asset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDynamicData {
    /// Everything issued and not yet wired out of the ledger.
    pub current_supply: ShareType,
    /// Market fees collected in this asset (the fee sink).
    pub accumulated_fees: ShareType,
}

/// An asset definition in the object store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetObject {
    pub id: AssetId,
    pub symbol: String,
    /// Number of decimal places of the smallest unit.
    pub precision: u8,
    /// The only account allowed to issue this asset.
    pub issuer: AccountId,
    pub options: AssetOptions,
    pub dynamic: AssetDynamicData,
}
