//! Identifiers used throughout dasledger.
//!
//! Every object in the store is addressed by a typed instance number.
//! Instance numbers are handed out sequentially by the object store, so
//! the same operation sequence yields the same ids on every replica.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Conversion between a typed id and its raw instance number.
pub trait ObjectInstance: Copy + Ord + fmt::Debug {
    fn from_instance(instance: u64) -> Self;
    fn instance(self) -> u64;
}

macro_rules! object_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl ObjectInstance for $name {
            fn from_instance(instance: u64) -> Self {
                Self(instance)
            }

            fn instance(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }
    };
}

object_id!(
    /// Identifier of an account (wallet, vault or custodian).
    AccountId,
    "account"
);

object_id!(
    /// Identifier of an asset definition.
    AssetId,
    "asset"
);

object_id!(
    /// Identifier of a resting or just-created limit order.
    LimitOrderId,
    "order"
);

object_id!(
    /// Identifier of a pending wire-out request.
    WireOutHolderId,
    "wire-out"
);

// ---------------------------------------------------------------------------
// ObjectId
// ---------------------------------------------------------------------------

/// Any object the core can reference, used in results and error reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum ObjectId {
    Account(AccountId),
    Asset(AssetId),
    LimitOrder(LimitOrderId),
    WireOutHolder(WireOutHolderId),
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Account(id) => fmt::Display::fmt(id, f),
            Self::Asset(id) => fmt::Display::fmt(id, f),
            Self::LimitOrder(id) => fmt::Display::fmt(id, f),
            Self::WireOutHolder(id) => fmt::Display::fmt(id, f),
        }
    }
}

impl From<AccountId> for ObjectId {
    fn from(id: AccountId) -> Self {
        Self::Account(id)
    }
}

impl From<AssetId> for ObjectId {
    fn from(id: AssetId) -> Self {
        Self::Asset(id)
    }
}

impl From<LimitOrderId> for ObjectId {
    fn from(id: LimitOrderId) -> Self {
        Self::LimitOrder(id)
    }
}

impl From<WireOutHolderId> for ObjectId {
    fn from(id: WireOutHolderId) -> Self {
        Self::WireOutHolder(id)
    }
}

// ---------------------------------------------------------------------------
// MarketPair
// ---------------------------------------------------------------------------

/// An undirected trading pair. `base` is always the smaller asset id so
/// that both directions of trade map to the same pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct MarketPair {
    pub base: AssetId,
    pub quote: AssetId,
}

impl MarketPair {
    #[must_use]
    pub fn new(a: AssetId, b: AssetId) -> Self {
        if a <= b {
            Self { base: a, quote: b }
        } else {
            Self { base: b, quote: a }
        }
    }

    #[must_use]
    pub fn contains(&self, asset: AssetId) -> bool {
        self.base == asset || self.quote == asset
    }
}

impl fmt::Display for MarketPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
