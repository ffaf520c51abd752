//! Pending off-ledger withdrawals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AccountId, Asset, WireOutHolderId};

/// Funds taken out of an account's cash, awaiting external settlement.
///
/// Completing the request removes the funds from the ledger; rejecting it
/// returns them to `account`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireOutHolder {
    pub id: WireOutHolderId,
    pub account: AccountId,
    pub asset: Asset,
    pub created_at: DateTime<Utc>,
}
