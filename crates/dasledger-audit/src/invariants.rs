//! Structural invariants of a ledger state.
//!
//! Evaluators keep these true on every applied operation; these checks
//! confirm it from the outside after the fact.

use std::collections::BTreeMap;

use dasledger_chain::Database;
use dasledger_types::{
    AccountBalance, AccountId, AccountKind, AccountObject, AssetId, FundingPool, LedgerError, LimitOrder, Result,
};
use tracing::error;

fn violation(reason: String) -> LedgerError {
    error!(%reason, "ledger invariant violated");
    LedgerError::InvariantViolation { reason }
}

/// Cash and reserved amounts never go negative.
pub fn check_non_negative(db: &Database) -> Result<()> {
    non_negative(db.balances())
}

fn non_negative<'a>(balances: impl IntoIterator<Item = &'a AccountBalance>) -> Result<()> {
    for b in balances {
        if b.cash < 0 || b.reserved < 0 {
            return Err(violation(format!(
                "{} holds cash {} reserved {} of {}",
                b.owner, b.cash, b.reserved, b.asset_id
            )));
        }
    }
    Ok(())
}

/// Tethers pair exactly one wallet with one vault, recorded on both sides.
pub fn check_tethers(db: &Database) -> Result<()> {
    let accounts: BTreeMap<AccountId, &AccountObject> = db.accounts().map(|a| (a.id, a)).collect();
    tethers_symmetric(&accounts)
}

fn tethers_symmetric(accounts: &BTreeMap<AccountId, &AccountObject>) -> Result<()> {
    for account in accounts.values() {
        let Some(partner_id) = account.tether else {
            continue;
        };
        let Some(partner) = accounts.get(&partner_id) else {
            return Err(violation(format!("{} is tethered to missing {partner_id}", account.id)));
        };
        if !partner.is_tethered_to(account.id) {
            return Err(violation(format!(
                "{} is tethered to {partner_id}, but not the other way round",
                account.id
            )));
        }
        let kinds = (account.kind, partner.kind);
        if !matches!(
            kinds,
            (AccountKind::Wallet, AccountKind::Vault) | (AccountKind::Vault, AccountKind::Wallet)
        ) {
            return Err(violation(format!(
                "{} {} is tethered to {} {partner_id}",
                account.kind, account.id, partner.kind
            )));
        }
    }
    Ok(())
}

/// Every resting order is funded, priced, owned by a known account and
/// draws on a pool its asset has. Within a price level sequences strictly
/// increase.
pub fn check_order_book(db: &Database) -> Result<()> {
    let mut previous: Option<&LimitOrder> = None;
    for order in db.book().iter() {
        check_order(db, order)?;
        if let Some(prev) = previous {
            let same_level = prev.side() == order.side()
                && prev.sell_price.cmp_ratio(&order.sell_price) == std::cmp::Ordering::Equal;
            if same_level && prev.sequence >= order.sequence {
                return Err(violation(format!(
                    "{} (sequence {}) is queued behind {} (sequence {})",
                    order.id, order.sequence, prev.id, prev.sequence
                )));
            }
        }
        previous = Some(order);
    }
    Ok(())
}

fn check_order(db: &Database, order: &LimitOrder) -> Result<()> {
    if order.for_sale <= 0 {
        return Err(violation(format!("{} rests with for_sale {}", order.id, order.for_sale)));
    }
    if !order.sell_price.is_valid() {
        return Err(violation(format!("{} has an invalid price", order.id)));
    }
    let seller = db.account(order.seller)?;
    if order.pool == FundingPool::Reserved && db.web_asset() != Some(order.sell_asset()) {
        return Err(violation(format!(
            "{} sells {} from the reserved pool",
            order.id,
            order.sell_asset()
        )));
    }
    if let Some(credit) = order.account_to_credit {
        let credit = db.account(credit)?;
        if !credit.is_vault() || !credit.is_tethered_to(seller.id) {
            return Err(violation(format!(
                "{} credits {}, which is not a vault tethered to {}",
                order.id, credit.id, seller.id
            )));
        }
    }
    Ok(())
}

/// Balance limits exist only on vaults and never go negative.
pub fn check_balance_limits(db: &Database) -> Result<()> {
    for limit in db.balance_limits() {
        if !db.account(limit.account)?.is_vault() {
            return Err(violation(format!("balance limit on non-vault {}", limit.account)));
        }
        if limit.limit < 0 || limit.spent < 0 {
            return Err(violation(format!(
                "{} limit {} spent {} in {}",
                limit.account, limit.limit, limit.spent, limit.asset_id
            )));
        }
    }
    Ok(())
}

/// The single web asset, if any, is the only one with reserved balances.
pub fn check_reserved_pools(db: &Database) -> Result<()> {
    let web: Option<AssetId> = db.web_asset();
    for b in db.balances() {
        if b.reserved != 0 && web != Some(b.asset_id) {
            return Err(violation(format!("{} holds reserved {}", b.owner, b.asset_id)));
        }
    }
    Ok(())
}

/// Run every structural check.
pub fn check_invariants(db: &Database) -> Result<()> {
    check_non_negative(db)?;
    check_reserved_pools(db)?;
    check_tethers(db)?;
    check_balance_limits(db)?;
    check_order_book(db)
}

#[cfg(test)]
mod tests {
    use dasledger_chain::testing::LedgerFixture;

    use super::*;

    fn account(id: u64, kind: AccountKind, tether: Option<u64>) -> AccountObject {
        AccountObject {
            id: AccountId(id),
            name: format!("acct-{id}"),
            kind,
            tether: tether.map(AccountId),
        }
    }

    fn index(accounts: &[AccountObject]) -> BTreeMap<AccountId, &AccountObject> {
        accounts.iter().map(|a| (a.id, a)).collect()
    }

    #[test]
    fn live_ledger_passes() {
        let mut f = LedgerFixture::new();
        let (wallet, vault) = f.tethered_pair("alice");
        f.chain.db_mut().adjust_balance_limit(vault, f.web, 10).unwrap();
        f.issue(wallet, f.web(10), 10).unwrap();
        let op = dasledger_types::LimitOrderCreateOperation::new(wallet, f.web(0), f.das(5), f.in_days(1))
            .from_reserved(10)
            .credit_to(vault);
        f.place(op).unwrap();
        assert!(check_invariants(f.chain.db()).is_ok());
    }

    #[test]
    fn one_sided_tether_detected() {
        let accounts = [
            account(0, AccountKind::Wallet, Some(1)),
            account(1, AccountKind::Vault, None),
        ];
        let err = tethers_symmetric(&index(&accounts)).unwrap_err();
        assert!(matches!(err, LedgerError::InvariantViolation { .. }));
    }

    #[test]
    fn wallet_to_wallet_tether_detected() {
        let accounts = [
            account(0, AccountKind::Wallet, Some(1)),
            account(1, AccountKind::Wallet, Some(0)),
        ];
        assert!(tethers_symmetric(&index(&accounts)).is_err());

        let fine = [
            account(0, AccountKind::Wallet, Some(1)),
            account(1, AccountKind::Vault, Some(0)),
            account(2, AccountKind::Custodian, None),
        ];
        assert!(tethers_symmetric(&index(&fine)).is_ok());
    }

    #[test]
    fn negative_pool_detected() {
        let mut b = AccountBalance::new(AccountId(3), AssetId(1));
        b.reserved = -1;
        let err = non_negative([&b]).unwrap_err();
        assert!(err.to_string().contains("reserved -1"));
    }
}
