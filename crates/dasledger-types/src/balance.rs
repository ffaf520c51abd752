//! Balance records for the cash/reserved model.
//!
//! Every (account, asset) pair has a freely spendable `cash` amount. The
//! designated web asset additionally carries a `reserved` amount that can
//! only be spent into sell orders placed from the reserved pool.

use serde::{Deserialize, Serialize};

use crate::{AccountId, AssetId, ShareType};

/// Which sub-pool of a balance funds an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum FundingPool {
    Cash,
    Reserved,
}

impl std::fmt::Display for FundingPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cash => write!(f, "CASH"),
            Self::Reserved => write!(f, "RESERVED"),
        }
    }
}

/// A single balance record for an (account, asset) pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountBalance {
    pub owner: AccountId,
    pub asset_id: AssetId,
    /// Freely spendable amount.
    pub cash: ShareType,
    /// Amount usable only for reserved-pool sell orders.
    pub reserved: ShareType,
}

impl AccountBalance {
    /// Create a zero balance.
    #[must_use]
    pub fn new(owner: AccountId, asset_id: AssetId) -> Self {
        Self {
            owner,
            asset_id,
            cash: 0,
            reserved: 0,
        }
    }

    /// Amount held in the given pool.
    #[must_use]
    pub fn pool(&self, pool: FundingPool) -> ShareType {
        match pool {
            FundingPool::Cash => self.cash,
            FundingPool::Reserved => self.reserved,
        }
    }

    /// Total balance (cash + reserved).
    #[must_use]
    pub fn total(&self) -> ShareType {
        self.cash + self.reserved
    }

    /// Whether this entry has no balance at all.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.cash == 0 && self.reserved == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_new_is_zero() {
        let entry = AccountBalance::new(AccountId(1), AssetId(0));
        assert_eq!(entry.cash, 0);
        assert_eq!(entry.reserved, 0);
        assert!(entry.is_zero());
    }

    #[test]
    fn pools_and_total() {
        let entry = AccountBalance {
            owner: AccountId(1),
            asset_id: AssetId(1),
            cash: 100,
            reserved: 50,
        };
        assert_eq!(entry.pool(FundingPool::Cash), 100);
        assert_eq!(entry.pool(FundingPool::Reserved), 50);
        assert_eq!(entry.total(), 150);
        assert!(!entry.is_zero());
    }

    #[test]
    fn balance_serde_roundtrip() {
        let entry = AccountBalance {
            owner: AccountId(4),
            asset_id: AssetId(2),
            cash: 12_345,
            reserved: 678,
        };
        let json = serde_json::to_string(&entry).unwrap();
        let back: AccountBalance = serde_json::from_str(&json).unwrap();
        assert_eq!(entry, back);
    }
}
