//! Operation payloads and results.
//!
//! Operations arrive already authenticated. Each payload carries a fee
//! slot that must be zero: fees for these operations are fixed by
//! protocol, and market operations pay their fee inside the matcher.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    AccountId, Asset, FundingPool, LedgerError, LimitOrderId, ObjectId, Price, Result, ShareType,
    WireOutHolderId,
};

/// Stateless checks and fee metadata shared by every operation payload.
pub trait BaseOperation {
    /// The account that would pay the fee; the acting account.
    fn fee_payer(&self) -> AccountId;

    /// The fee slot as submitted.
    fn fee(&self) -> ShareType;

    /// Fee required by protocol. Zero for every operation in this core.
    fn calculate_fee(&self) -> ShareType {
        0
    }

    /// Checks that need no ledger state.
    fn validate(&self) -> Result<()>;

    /// Reject a fee slot that differs from the protocol fee.
    fn check_fee(&self) -> Result<()> {
        let required = self.calculate_fee();
        if self.fee() == required {
            Ok(())
        } else {
            Err(LedgerError::invalid_operation(format!(
                "fee must be {required}, got {}",
                self.fee()
            )))
        }
    }
}

fn check_amount(what: &str, asset: &Asset) -> Result<()> {
    if asset.is_in_range() {
        Ok(())
    } else {
        Err(LedgerError::invalid_operation(format!(
            "{what} out of range: {asset}"
        )))
    }
}

// ---------------------------------------------------------------------------
// Issuance
// ---------------------------------------------------------------------------

/// Issue new units of an asset to an account, split between cash and
/// (for the web asset only) reserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueAssetOperation {
    #[serde(default)]
    pub fee: ShareType,
    pub issuer: AccountId,
    pub issue_to: AccountId,
    /// Cash part of the issuance.
    pub asset: Asset,
    /// Reserved part of the issuance, same asset.
    #[serde(default)]
    pub reserved: ShareType,
}

impl BaseOperation for IssueAssetOperation {
    fn fee_payer(&self) -> AccountId {
        self.issuer
    }

    fn fee(&self) -> ShareType {
        self.fee
    }

    fn validate(&self) -> Result<()> {
        check_amount("cash amount", &self.asset)?;
        check_amount("reserved amount", &Asset::new(self.reserved, self.asset.asset_id))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Transfers
// ---------------------------------------------------------------------------

/// Move cash between two wallet or custodian accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOperation {
    #[serde(default)]
    pub fee: ShareType,
    pub from: AccountId,
    pub to: AccountId,
    pub amount: Asset,
    #[serde(default)]
    pub memo: Option<String>,
}

impl BaseOperation for TransferOperation {
    fn fee_payer(&self) -> AccountId {
        self.from
    }

    fn fee(&self) -> ShareType {
        self.fee
    }

    fn validate(&self) -> Result<()> {
        check_amount("transfer amount", &self.amount)?;
        if self.amount.amount == 0 {
            return Err(LedgerError::invalid_operation("transfer amount must be positive"));
        }
        if self.from == self.to {
            return Err(LedgerError::relationship(format!(
                "{} cannot transfer to itself",
                self.from
            )));
        }
        Ok(())
    }
}

/// Move funds from a vault to its tethered wallet, within the balance
/// limit. For the web asset, `reserved` units move from the vault's
/// reserved pool into the wallet's; the limit counts both parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferVaultToWalletOperation {
    #[serde(default)]
    pub fee: ShareType,
    pub from_vault: AccountId,
    pub to_wallet: AccountId,
    /// Cash part of the transfer.
    pub amount: Asset,
    /// Reserved part of the transfer, same asset.
    #[serde(default)]
    pub reserved: ShareType,
}

impl TransferVaultToWalletOperation {
    /// Cash and reserved together: what the transfer takes off the limit.
    #[must_use]
    pub fn total(&self) -> ShareType {
        self.amount.amount.saturating_add(self.reserved)
    }
}

impl BaseOperation for TransferVaultToWalletOperation {
    fn fee_payer(&self) -> AccountId {
        self.from_vault
    }

    fn fee(&self) -> ShareType {
        self.fee
    }

    fn validate(&self) -> Result<()> {
        check_amount("transfer amount", &self.amount)?;
        check_amount("reserved amount", &Asset::new(self.reserved, self.amount.asset_id))?;
        if self.total() == 0 {
            return Err(LedgerError::invalid_operation("transfer amount must be positive"));
        }
        if self.from_vault == self.to_wallet {
            return Err(LedgerError::relationship(format!(
                "{} cannot transfer to itself",
                self.from_vault
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Wire-out
// ---------------------------------------------------------------------------

/// Request an off-ledger withdrawal of cash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireOutOperation {
    #[serde(default)]
    pub fee: ShareType,
    pub account: AccountId,
    pub asset_to_wire: Asset,
}

impl BaseOperation for WireOutOperation {
    fn fee_payer(&self) -> AccountId {
        self.account
    }

    fn fee(&self) -> ShareType {
        self.fee
    }

    fn validate(&self) -> Result<()> {
        check_amount("wire-out amount", &self.asset_to_wire)
    }
}

/// Finalize a wire-out: the funds leave the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireOutCompleteOperation {
    #[serde(default)]
    pub fee: ShareType,
    pub wire_out_handler: AccountId,
    pub holder: WireOutHolderId,
}

impl BaseOperation for WireOutCompleteOperation {
    fn fee_payer(&self) -> AccountId {
        self.wire_out_handler
    }

    fn fee(&self) -> ShareType {
        self.fee
    }

    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// Reject a wire-out: the funds return to the requesting account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireOutRejectOperation {
    #[serde(default)]
    pub fee: ShareType,
    pub wire_out_handler: AccountId,
    pub holder: WireOutHolderId,
}

impl BaseOperation for WireOutRejectOperation {
    fn fee_payer(&self) -> AccountId {
        self.wire_out_handler
    }

    fn fee(&self) -> ShareType {
        self.fee
    }

    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Limit orders
// ---------------------------------------------------------------------------

/// Place a limit order. Funds come from cash unless `reserved_amount` is
/// nonzero, in which case the whole order is drawn from the reserved pool
/// and `amount_to_sell.amount` must be zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitOrderCreateOperation {
    #[serde(default)]
    pub fee: ShareType,
    pub seller: AccountId,
    pub amount_to_sell: Asset,
    pub min_to_receive: Asset,
    #[serde(default)]
    pub reserved_amount: ShareType,
    #[serde(default)]
    pub account_to_credit: Option<AccountId>,
    pub expiration: DateTime<Utc>,
}

impl LimitOrderCreateOperation {
    #[must_use]
    pub fn new(
        seller: AccountId,
        amount_to_sell: Asset,
        min_to_receive: Asset,
        expiration: DateTime<Utc>,
    ) -> Self {
        Self {
            fee: 0,
            seller,
            amount_to_sell,
            min_to_receive,
            reserved_amount: 0,
            account_to_credit: None,
            expiration,
        }
    }

    /// Draw the order from the reserved pool instead of cash.
    #[must_use]
    pub fn from_reserved(mut self, reserved_amount: ShareType) -> Self {
        self.amount_to_sell.amount = 0;
        self.reserved_amount = reserved_amount;
        self
    }

    /// Credit proceeds to `vault` instead of the seller.
    #[must_use]
    pub fn credit_to(mut self, vault: AccountId) -> Self {
        self.account_to_credit = Some(vault);
        self
    }

    #[must_use]
    pub fn funding_pool(&self) -> FundingPool {
        if self.reserved_amount > 0 {
            FundingPool::Reserved
        } else {
            FundingPool::Cash
        }
    }

    /// The amount actually offered, from whichever pool funds the order.
    #[must_use]
    pub fn sell_amount(&self) -> Asset {
        match self.funding_pool() {
            FundingPool::Cash => self.amount_to_sell,
            FundingPool::Reserved => Asset::new(self.reserved_amount, self.amount_to_sell.asset_id),
        }
    }

    #[must_use]
    pub fn sell_price(&self) -> Price {
        Price::new(self.sell_amount(), self.min_to_receive)
    }
}

impl BaseOperation for LimitOrderCreateOperation {
    fn fee_payer(&self) -> AccountId {
        self.seller
    }

    fn fee(&self) -> ShareType {
        self.fee
    }

    fn validate(&self) -> Result<()> {
        if self.amount_to_sell.asset_id == self.min_to_receive.asset_id {
            return Err(LedgerError::invalid_order("cannot trade an asset for itself"));
        }
        let reserved = Asset::new(self.reserved_amount, self.amount_to_sell.asset_id);
        for (what, asset) in [
            ("amount to sell", &self.amount_to_sell),
            ("reserved amount", &reserved),
            ("minimum to receive", &self.min_to_receive),
        ] {
            if !asset.is_in_range() {
                return Err(LedgerError::invalid_order(format!("{what} out of range: {asset}")));
            }
        }
        if self.amount_to_sell.amount > 0 && self.reserved_amount > 0 {
            return Err(LedgerError::invalid_order(
                "an order is funded from cash or from reserved, not both",
            ));
        }
        if self.sell_amount().amount == 0 {
            return Err(LedgerError::invalid_order("amount to sell must be positive"));
        }
        if self.min_to_receive.amount == 0 {
            return Err(LedgerError::invalid_order("minimum to receive must be positive"));
        }
        Ok(())
    }
}

/// Cancel a resting order and refund its remainder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitOrderCancelOperation {
    #[serde(default)]
    pub fee: ShareType,
    pub fee_paying_account: AccountId,
    pub order: LimitOrderId,
}

impl BaseOperation for LimitOrderCancelOperation {
    fn fee_payer(&self) -> AccountId {
        self.fee_paying_account
    }

    fn fee(&self) -> ShareType {
        self.fee
    }

    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Operation / OperationResult
// ---------------------------------------------------------------------------

/// Every operation kind the core evaluates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    IssueAsset(IssueAssetOperation),
    Transfer(TransferOperation),
    TransferVaultToWallet(TransferVaultToWalletOperation),
    WireOut(WireOutOperation),
    WireOutComplete(WireOutCompleteOperation),
    WireOutReject(WireOutRejectOperation),
    LimitOrderCreate(LimitOrderCreateOperation),
    LimitOrderCancel(LimitOrderCancelOperation),
}

impl Operation {
    /// Short kind name used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::IssueAsset(_) => "issue_asset",
            Self::Transfer(_) => "transfer",
            Self::TransferVaultToWallet(_) => "transfer_vault_to_wallet",
            Self::WireOut(_) => "wire_out",
            Self::WireOutComplete(_) => "wire_out_complete",
            Self::WireOutReject(_) => "wire_out_reject",
            Self::LimitOrderCreate(_) => "limit_order_create",
            Self::LimitOrderCancel(_) => "limit_order_cancel",
        }
    }

    fn payload(&self) -> &dyn BaseOperation {
        match self {
            Self::IssueAsset(op) => op,
            Self::Transfer(op) => op,
            Self::TransferVaultToWallet(op) => op,
            Self::WireOut(op) => op,
            Self::WireOutComplete(op) => op,
            Self::WireOutReject(op) => op,
            Self::LimitOrderCreate(op) => op,
            Self::LimitOrderCancel(op) => op,
        }
    }

    #[must_use]
    pub fn fee_payer(&self) -> AccountId {
        self.payload().fee_payer()
    }

    pub fn validate(&self) -> Result<()> {
        self.payload().check_fee()?;
        self.payload().validate()
    }
}

macro_rules! impl_from_payload {
    ($($variant:ident($payload:ty)),* $(,)?) => {
        $(
            impl From<$payload> for Operation {
                fn from(op: $payload) -> Self {
                    Self::$variant(op)
                }
            }
        )*
    };
}

impl_from_payload!(
    IssueAsset(IssueAssetOperation),
    Transfer(TransferOperation),
    TransferVaultToWallet(TransferVaultToWalletOperation),
    WireOut(WireOutOperation),
    WireOutComplete(WireOutCompleteOperation),
    WireOutReject(WireOutRejectOperation),
    LimitOrderCreate(LimitOrderCreateOperation),
    LimitOrderCancel(LimitOrderCancelOperation),
);

/// What a successfully applied operation hands back for receipts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationResult {
    Void,
    Created(ObjectId),
}

impl OperationResult {
    #[must_use]
    pub fn limit_order(&self) -> Option<LimitOrderId> {
        match self {
            Self::Created(ObjectId::LimitOrder(id)) => Some(*id),
            _ => None,
        }
    }

    #[must_use]
    pub fn wire_out_holder(&self) -> Option<WireOutHolderId> {
        match self {
            Self::Created(ObjectId::WireOutHolder(id)) => Some(*id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::AssetId;

    const WEB: AssetId = AssetId(1);
    const DAS: AssetId = AssetId(0);

    fn expiry() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()
    }

    fn order(sell: i64, receive: i64) -> LimitOrderCreateOperation {
        LimitOrderCreateOperation::new(
            AccountId(1),
            Asset::new(sell, WEB),
            Asset::new(receive, DAS),
            expiry(),
        )
    }

    #[test]
    fn cash_order_validates() {
        let op = order(100, 100);
        assert!(op.validate().is_ok());
        assert_eq!(op.funding_pool(), FundingPool::Cash);
        assert_eq!(op.sell_amount(), Asset::new(100, WEB));
    }

    #[test]
    fn reserved_order_draws_entirely_from_reserved() {
        let op = order(0, 100).from_reserved(100);
        assert!(op.validate().is_ok());
        assert_eq!(op.funding_pool(), FundingPool::Reserved);
        assert_eq!(op.sell_amount(), Asset::new(100, WEB));
        assert_eq!(op.sell_price().base, Asset::new(100, WEB));
    }

    #[test]
    fn mixed_funding_rejected() {
        let mut op = order(10, 100);
        op.reserved_amount = 5;
        assert!(matches!(op.validate(), Err(LedgerError::InvalidOrder { .. })));
    }

    #[test]
    fn zero_and_negative_amounts_rejected() {
        assert!(matches!(order(0, 100).validate(), Err(LedgerError::InvalidOrder { .. })));
        assert!(matches!(order(100, 0).validate(), Err(LedgerError::InvalidOrder { .. })));
        assert!(matches!(order(-1, 100).validate(), Err(LedgerError::InvalidOrder { .. })));
    }

    #[test]
    fn same_asset_order_rejected() {
        let mut op = order(10, 10);
        op.min_to_receive.asset_id = WEB;
        assert!(op.validate().is_err());
    }

    #[test]
    fn nonzero_fee_rejected() {
        let mut op = order(10, 10);
        op.fee = 1;
        let err = Operation::from(op).validate().unwrap_err();
        assert!(matches!(err, LedgerError::InvalidOperation { .. }));
    }

    #[test]
    fn self_transfer_is_a_relationship_error() {
        let op = TransferOperation {
            fee: 0,
            from: AccountId(3),
            to: AccountId(3),
            amount: Asset::new(1, DAS),
            memo: None,
        };
        assert!(matches!(
            op.validate(),
            Err(LedgerError::InvalidAccountRelationship { .. })
        ));
    }

    #[test]
    fn negative_wire_out_rejected_zero_allowed() {
        let mut op = WireOutOperation {
            fee: 0,
            account: AccountId(1),
            asset_to_wire: Asset::new(-5, WEB),
        };
        assert!(op.validate().is_err());
        op.asset_to_wire.amount = 0;
        assert!(op.validate().is_ok());
    }

    #[test]
    fn operation_serde_is_tagged() {
        let op = Operation::from(LimitOrderCancelOperation {
            fee: 0,
            fee_paying_account: AccountId(2),
            order: LimitOrderId(7),
        });
        let json = serde_json::to_string(&op).unwrap();
        assert!(json.contains("\"type\":\"limit_order_cancel\""), "{json}");
        let back: Operation = serde_json::from_str(&json).unwrap();
        assert_eq!(op, back);
        assert_eq!(back.fee_payer(), AccountId(2));
        assert_eq!(back.name(), "limit_order_cancel");
    }

    #[test]
    fn result_accessors() {
        let created = OperationResult::Created(LimitOrderId(3).into());
        assert_eq!(created.limit_order(), Some(LimitOrderId(3)));
        assert_eq!(created.wire_out_holder(), None);
        assert_eq!(OperationResult::Void.limit_order(), None);
    }
}
