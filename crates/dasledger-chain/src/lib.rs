//! # dasledger-chain
//!
//! The evaluator framework and state machine of the **dasledger** core.
//!
//! - [`Database`]: the object store (accounts, assets, balances, limits,
//!   wire-out holders, order book, last trade prices)
//! - [`Evaluator`]: the two-phase `do_evaluate` / `do_apply` contract, with
//!   one implementation per operation kind in [`evaluators`]
//! - [`evaluate_and_apply`]: dispatch of an [`Operation`](dasledger_types::Operation)
//! - [`Chain`]: all-or-nothing operations, transactions and time advances
//! - [`maintenance`]: ledger-time advancement and order expiration
//!
//! Everything runs on one thread in a strict sequence. The only time read
//! is the ledger's head time ([`Clock`]).

pub mod clock;
pub mod database;
pub mod evaluator;
pub mod evaluators;
pub mod maintenance;
mod market;
pub mod object_table;
pub mod processor;

#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;

pub use clock::Clock;
pub use database::Database;
pub use evaluator::Evaluator;
pub use maintenance::{MaintenanceReport, advance_time_to};
pub use object_table::ObjectTable;
pub use processor::{Chain, Receipt, evaluate_and_apply};
