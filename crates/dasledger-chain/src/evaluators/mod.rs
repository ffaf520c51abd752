//! One evaluator per operation kind.

pub mod issue;
pub mod limit_order;
pub mod transfer;
pub mod vault_transfer;
pub mod wire_out;

pub use issue::IssueAssetEvaluator;
pub use limit_order::{LimitOrderCancelEvaluator, LimitOrderCreateEvaluator};
pub use transfer::TransferEvaluator;
pub use vault_transfer::TransferVaultToWalletEvaluator;
pub use wire_out::{WireOutCompleteEvaluator, WireOutEvaluator, WireOutRejectEvaluator};
