//! Ledger fixture shared by unit and integration tests.

use chrono::{DateTime, Duration, TimeZone, Utc};
use dasledger_types::*;

use crate::{Chain, Clock, Receipt};

/// A ledger with a core asset (DAS), a web asset (WEB), an issuer and a
/// wire-out handler, plus shortcuts for the common operations.
#[derive(Debug, Clone)]
pub struct LedgerFixture {
    pub chain: Chain,
    pub issuer: AccountId,
    pub handler: AccountId,
    pub das: AssetId,
    pub web: AssetId,
}

impl Default for LedgerFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerFixture {
    /// Genesis at 2018-03-01 with daily maintenance.
    #[must_use]
    pub fn new() -> Self {
        let genesis = Utc
            .with_ymd_and_hms(2018, 3, 1, 0, 0, 0)
            .single()
            .expect("valid genesis date");
        let mut chain = Chain::new(ChainParameters {
            genesis_time: genesis,
            ..ChainParameters::default()
        })
        .expect("default parameters are valid");

        let db = chain.db_mut();
        let issuer = db.create_account("issuer", AccountKind::Custodian);
        let handler = db.create_account("wire-out-handler", AccountKind::Custodian);
        let das = db
            .create_asset("DAS", constants::DASCOIN_PRECISION_DIGITS, issuer)
            .expect("fresh asset");
        let web = db.create_web_asset("WEB", issuer).expect("fresh web asset");

        db.set_wire_out_handler(Some(handler))
            .expect("handler exists");

        Self {
            chain,
            issuer,
            handler,
            das,
            web,
        }
    }

    pub fn wallet(&mut self, name: &str) -> AccountId {
        self.chain.db_mut().create_account(name, AccountKind::Wallet)
    }

    pub fn vault(&mut self, name: &str) -> AccountId {
        self.chain.db_mut().create_account(name, AccountKind::Vault)
    }

    pub fn custodian(&mut self, name: &str) -> AccountId {
        self.chain.db_mut().create_account(name, AccountKind::Custodian)
    }

    /// A wallet and a vault tethered to each other.
    pub fn tethered_pair(&mut self, name: &str) -> (AccountId, AccountId) {
        let wallet = self.wallet(&format!("{name}-wallet"));
        let vault = self.vault(&format!("{name}-vault"));
        self.chain
            .db_mut()
            .tether_accounts(vault, wallet)
            .expect("fresh accounts tether");
        (wallet, vault)
    }

    #[must_use]
    pub fn web(&self, amount: ShareType) -> Asset {
        Asset::new(amount, self.web)
    }

    #[must_use]
    pub fn das(&self, amount: ShareType) -> Asset {
        Asset::new(amount, self.das)
    }

    pub fn issue(&mut self, to: AccountId, cash: Asset, reserved: ShareType) -> Result<Receipt> {
        self.chain.apply_operation(IssueAssetOperation {
            fee: 0,
            issuer: self.issuer,
            issue_to: to,
            asset: cash,
            reserved,
        })
    }

    /// Place a cash-funded order expiring a year from now.
    pub fn sell(&mut self, seller: AccountId, sell: Asset, receive: Asset) -> Result<LimitOrderId> {
        let op = LimitOrderCreateOperation::new(seller, sell, receive, self.in_days(365));
        self.place(op)
    }

    pub fn place(&mut self, op: LimitOrderCreateOperation) -> Result<LimitOrderId> {
        let receipt = self.chain.apply_operation(op)?;
        receipt.limit_order().ok_or_else(|| LedgerError::InvariantViolation {
            reason: format!("order creation returned {:?}", receipt.result),
        })
    }

    pub fn cancel(&mut self, caller: AccountId, order: LimitOrderId) -> Result<Receipt> {
        self.chain.apply_operation(LimitOrderCancelOperation {
            fee: 0,
            fee_paying_account: caller,
            order,
        })
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.chain.db().now()
    }

    #[must_use]
    pub fn in_days(&self, days: i64) -> DateTime<Utc> {
        self.now() + Duration::days(days)
    }

    #[must_use]
    pub fn cash(&self, account: AccountId, asset: AssetId) -> ShareType {
        self.chain.db().cash(account, asset)
    }

    #[must_use]
    pub fn reserved(&self, account: AccountId, asset: AssetId) -> ShareType {
        self.chain.db().reserved(account, asset)
    }
}
