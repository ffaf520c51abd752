//! # dasledger-types
//!
//! Shared types, errors, and configuration for the **dasledger** core.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`AccountId`], [`AssetId`], [`LimitOrderId`], [`WireOutHolderId`], [`ObjectId`], [`MarketPair`]
//! - **Amounts and prices**: [`Asset`], [`Price`]
//! - **Asset model**: [`AssetObject`], [`AssetOptions`], [`AssetDynamicData`]
//! - **Account graph**: [`AccountObject`], [`AccountKind`], [`BalanceLimit`]
//! - **Balance model**: [`AccountBalance`], [`FundingPool`]
//! - **Order model**: [`LimitOrder`], [`BookSide`]
//! - **Fill model**: [`Fill`]
//! - **Wire-out model**: [`WireOutHolder`]
//! - **Operations**: [`Operation`] and one payload struct per operation kind
//! - **Configuration**: [`ChainParameters`]
//! - **Errors**: [`LedgerError`] with `DL_ERR_` prefix codes
//! - **Constants**: system-wide limits and defaults

pub mod account;
pub mod asset;
pub mod balance;
pub mod config;
pub mod constants;
pub mod error;
pub mod fill;
pub mod ids;
pub mod operation;
pub mod order;
pub mod price;
pub mod wire_out;

// Re-export all primary types at crate root for ergonomic imports:
//   use dasledger_types::{Asset, Price, LimitOrder, Operation, ...};

pub use account::*;
pub use asset::*;
pub use balance::*;
pub use config::*;
pub use error::*;
pub use fill::*;
pub use ids::*;
pub use operation::*;
pub use order::*;
pub use price::*;
pub use wire_out::*;

// Constants are accessed via `dasledger_types::constants::FOO`
// (not re-exported to avoid name collisions).
