//! # dasledger-matchcore
//!
//! **Deterministic limit-order matching for dasledger.**
//!
//! MatchCore owns the resting order book and the crossing algorithm. It has:
//!
//! - **No balance access**: fills are returned for the caller to settle
//! - **Exact arithmetic**: integer amounts, `i128` price comparisons, no floats
//! - **Deterministic iteration**: price first, then insertion time
//! - **Maker-price execution**: every fill trades at the resting order's price

pub mod determinism;
pub mod matcher;
pub mod orderbook;
pub mod price_level;

pub use determinism::{GENESIS_FILL_ROOT, chain_fill_root, compute_fill_root, verify_fill_root};
pub use matcher::{MatchOutcome, find_self_cross, match_order, prices_cross};
pub use orderbook::OrderBook;
pub use price_level::{BookPrice, PriceLevel};
