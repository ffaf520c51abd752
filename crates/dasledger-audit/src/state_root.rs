//! Hash over the full ledger state.
//!
//! Two replicas that applied the same operations from the same genesis
//! end with the same root. Object stores iterate in id order and the
//! book in price-time order, so no sorting is needed here.

use chrono::{DateTime, Utc};
use dasledger_chain::{Clock, Database};
use dasledger_types::{AccountKind, Asset, FundingPool};
use sha2::{Digest, Sha256};

fn hash_time(hasher: &mut Sha256, time: DateTime<Utc>) {
    hasher.update(time.timestamp().to_le_bytes());
    hasher.update(time.timestamp_subsec_nanos().to_le_bytes());
}

fn hash_asset(hasher: &mut Sha256, asset: &Asset) {
    hasher.update(asset.asset_id.0.to_le_bytes());
    hasher.update(asset.amount.to_le_bytes());
}

fn hash_optional(hasher: &mut Sha256, id: Option<u64>) {
    match id {
        Some(id) => {
            hasher.update([1u8]);
            hasher.update(id.to_le_bytes());
        }
        None => hasher.update([0u8]),
    }
}

fn kind_tag(kind: AccountKind) -> u8 {
    match kind {
        AccountKind::Wallet => 0,
        AccountKind::Vault => 1,
        AccountKind::Custodian => 2,
    }
}

/// Compute the state root of `db`.
#[must_use]
pub fn compute_state_root(db: &Database) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(b"dasledger:state_root:v1:");
    hash_time(&mut hasher, db.now());
    hash_time(&mut hasher, db.next_maintenance_time());

    hasher.update(b"accounts");
    for account in db.accounts() {
        hasher.update(account.id.0.to_le_bytes());
        hasher.update([kind_tag(account.kind)]);
        hash_optional(&mut hasher, account.tether.map(|t| t.0));
    }

    hasher.update(b"assets");
    for asset in db.assets() {
        hasher.update(asset.id.0.to_le_bytes());
        hasher.update(asset.dynamic.current_supply.to_le_bytes());
        hasher.update(asset.dynamic.accumulated_fees.to_le_bytes());
        hasher.update(asset.options.market_fee_percent.to_le_bytes());
        hasher.update(asset.options.max_market_fee.to_le_bytes());
        hasher.update([u8::from(asset.options.transfer_restricted)]);
    }

    hasher.update(b"balances");
    for balance in db.balances() {
        hasher.update(balance.owner.0.to_le_bytes());
        hasher.update(balance.asset_id.0.to_le_bytes());
        hasher.update(balance.cash.to_le_bytes());
        hasher.update(balance.reserved.to_le_bytes());
    }

    hasher.update(b"limits");
    for limit in db.balance_limits() {
        hasher.update(limit.account.0.to_le_bytes());
        hasher.update(limit.asset_id.0.to_le_bytes());
        hasher.update(limit.limit.to_le_bytes());
        hasher.update(limit.spent.to_le_bytes());
        hash_time(&mut hasher, limit.window_start);
        hasher.update([u8::from(limit.disabled)]);
    }

    hasher.update(b"orders");
    for order in db.book().iter() {
        hasher.update(order.id.0.to_le_bytes());
        hasher.update(order.sequence.to_le_bytes());
        hasher.update(order.seller.0.to_le_bytes());
        hasher.update(order.for_sale.to_le_bytes());
        hash_asset(&mut hasher, &order.sell_price.base);
        hash_asset(&mut hasher, &order.sell_price.quote);
        hash_time(&mut hasher, order.expiration);
        hash_optional(&mut hasher, order.account_to_credit.map(|a| a.0));
        hasher.update([u8::from(order.pool == FundingPool::Reserved)]);
    }

    hasher.update(b"wire_outs");
    for holder in db.wire_outs() {
        hasher.update(holder.id.0.to_le_bytes());
        hasher.update(holder.account.0.to_le_bytes());
        hash_asset(&mut hasher, &holder.asset);
    }

    hasher.update(b"fills");
    hasher.update(db.fill_count().to_le_bytes());
    hasher.update(db.fill_root());

    let result = hasher.finalize();
    let mut root = [0u8; 32];
    root.copy_from_slice(&result);
    root
}

/// [`compute_state_root`], hex encoded.
#[must_use]
pub fn state_root_hex(db: &Database) -> String {
    hex::encode(compute_state_root(db))
}
