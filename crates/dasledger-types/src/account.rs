//! Account classification, tether pairing and vault-to-wallet limits.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, AssetId, ShareType};

/// Class of an account, deciding which transfers it may take part in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum AccountKind {
    /// Unrestricted-transfer account.
    Wallet,
    /// Restricted account; outbound value goes only to its tethered wallet,
    /// capped by a balance limit.
    Vault,
    /// Counterparty for transfers and trades, never tethered.
    Custodian,
}

impl std::fmt::Display for AccountKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Wallet => write!(f, "WALLET"),
            Self::Vault => write!(f, "VAULT"),
            Self::Custodian => write!(f, "CUSTODIAN"),
        }
    }
}

/// An account in the object store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountObject {
    pub id: AccountId,
    pub name: String,
    pub kind: AccountKind,
    /// Tether partner: set only on Wallet<->Vault pairs, on both sides.
    pub tether: Option<AccountId>,
}

impl AccountObject {
    #[must_use]
    pub fn is_wallet(&self) -> bool {
        self.kind == AccountKind::Wallet
    }

    #[must_use]
    pub fn is_vault(&self) -> bool {
        self.kind == AccountKind::Vault
    }

    /// Wallets and custodians may take part in plain transfers.
    #[must_use]
    pub fn is_transfer_capable(&self) -> bool {
        matches!(self.kind, AccountKind::Wallet | AccountKind::Custodian)
    }

    #[must_use]
    pub fn is_tethered_to(&self, other: AccountId) -> bool {
        self.tether == Some(other)
    }
}

/// Per (vault, asset) cap on vault-to-wallet transfers within a window.
///
/// No record means no transfer is permitted. A `disabled` record lifts
/// the cap entirely until it is enabled again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceLimit {
    pub account: AccountId,
    pub asset_id: AssetId,
    /// Maximum transferable per window.
    pub limit: ShareType,
    /// Transferred in the window starting at `window_start`.
    pub spent: ShareType,
    pub window_start: DateTime<Utc>,
    pub disabled: bool,
}

impl BalanceLimit {
    #[must_use]
    pub fn new(account: AccountId, asset_id: AssetId, limit: ShareType, now: DateTime<Utc>) -> Self {
        Self {
            account,
            asset_id,
            limit,
            spent: 0,
            window_start: now,
            disabled: false,
        }
    }

    fn window_elapsed(&self, now: DateTime<Utc>, window: Duration) -> bool {
        now >= self.window_start + window
    }

    /// What may still be transferred at `now`. A window that has run out
    /// counts as fresh.
    #[must_use]
    pub fn remaining(&self, now: DateTime<Utc>, window: Duration) -> ShareType {
        if self.window_elapsed(now, window) {
            self.limit.max(0)
        } else {
            (self.limit - self.spent).max(0)
        }
    }

    /// Record a transfer of `amount` at `now`, rolling the window first.
    pub fn record_spend(&mut self, amount: ShareType, now: DateTime<Utc>, window: Duration) {
        if self.window_elapsed(now, window) {
            self.window_start = now;
            self.spent = 0;
        }
        self.spent += amount;
    }
}
