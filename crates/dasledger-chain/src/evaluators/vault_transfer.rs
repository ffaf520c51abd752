//! Vault to tethered-wallet transfers, capped by a balance limit. Web
//! asset transfers may carry reserved funds, which stay reserved.

use dasledger_types::*;
use tracing::debug;

use crate::evaluators::transfer::require_cash;
use crate::{Database, Evaluator};

pub struct TransferVaultToWalletEvaluator;

#[derive(Debug)]
pub struct VaultTransferContext {
    vault: AccountId,
    wallet: AccountId,
    /// The cap is in force and the spend must be recorded.
    limited: bool,
}

impl Evaluator for TransferVaultToWalletEvaluator {
    type Operation = TransferVaultToWalletOperation;
    type Context = VaultTransferContext;

    fn do_evaluate(db: &Database, op: &TransferVaultToWalletOperation) -> Result<VaultTransferContext> {
        let vault = db.account(op.from_vault)?;
        let wallet = db.account(op.to_wallet)?;
        if !vault.is_vault() || !wallet.is_wallet() {
            return Err(LedgerError::relationship(format!(
                "expected vault to wallet, got {} {} to {} {}",
                vault.kind, vault.id, wallet.kind, wallet.id
            )));
        }
        if !vault.is_tethered_to(wallet.id) {
            return Err(LedgerError::relationship(format!(
                "{} is not tethered to {}",
                vault.id, wallet.id
            )));
        }
        let asset = db.asset(op.amount.asset_id)?;
        if op.reserved > 0 && db.web_asset() != Some(asset.id) {
            return Err(LedgerError::invalid_operation(format!(
                "{} has no reserved pool",
                asset.symbol
            )));
        }

        let requested = op.total();
        let limited = match db.remaining_limit(vault.id, asset.id) {
            None => false,
            Some(remaining) if requested <= remaining => true,
            Some(remaining) => {
                return Err(LedgerError::LimitExceeded {
                    account: vault.id,
                    asset: asset.id,
                    requested,
                    remaining,
                });
            }
        };
        require_cash(db, vault.id, op.amount)?;
        let reserved = db.reserved(vault.id, asset.id);
        if reserved < op.reserved {
            return Err(LedgerError::InsufficientBalance {
                account: vault.id,
                asset: asset.id,
                needed: op.reserved,
                available: reserved,
            });
        }

        Ok(VaultTransferContext {
            vault: vault.id,
            wallet: wallet.id,
            limited,
        })
    }

    fn do_apply(
        db: &mut Database,
        op: &TransferVaultToWalletOperation,
        ctx: VaultTransferContext,
    ) -> Result<OperationResult> {
        let asset = op.amount.asset_id;
        db.adjust_cash(ctx.vault, asset, -op.amount.amount)?;
        db.adjust_cash(ctx.wallet, asset, op.amount.amount)?;
        if op.reserved > 0 {
            db.adjust_pool(ctx.vault, asset, FundingPool::Reserved, -op.reserved)?;
            db.adjust_pool(ctx.wallet, asset, FundingPool::Reserved, op.reserved)?;
        }
        if ctx.limited {
            db.record_limit_spend(ctx.vault, asset, op.total())?;
        }
        debug!(
            vault = %ctx.vault,
            wallet = %ctx.wallet,
            amount = %op.amount,
            reserved = op.reserved,
            "vault to wallet"
        );
        Ok(OperationResult::Void)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use crate::testing::LedgerFixture;

    use super::*;

    fn vault_to_wallet(vault: AccountId, wallet: AccountId, amount: Asset) -> TransferVaultToWalletOperation {
        TransferVaultToWalletOperation {
            fee: 0,
            from_vault: vault,
            to_wallet: wallet,
            amount,
            reserved: 0,
        }
    }

    fn funded() -> (LedgerFixture, AccountId, AccountId) {
        let mut f = LedgerFixture::new();
        let (wallet, vault) = f.tethered_pair("alice");
        f.issue(vault, f.web(1_000), 0).unwrap();
        (f, wallet, vault)
    }

    #[test]
    fn no_limit_record_means_no_transfer() {
        let (mut f, wallet, vault) = funded();
        let err = f
            .chain
            .apply_operation(vault_to_wallet(vault, wallet, f.web(1)))
            .unwrap_err();
        assert!(matches!(err, LedgerError::LimitExceeded { remaining: 0, .. }));
    }

    #[test]
    fn limit_is_spent_within_a_window_and_resets_after() {
        let (mut f, wallet, vault) = funded();
        f.chain.db_mut().adjust_balance_limit(vault, f.web, 300).unwrap();

        f.chain.apply_operation(vault_to_wallet(vault, wallet, f.web(200))).unwrap();
        let err = f
            .chain
            .apply_operation(vault_to_wallet(vault, wallet, f.web(101)))
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::LimitExceeded {
                account: vault,
                asset: f.web,
                requested: 101,
                remaining: 100
            }
        );
        f.chain.apply_operation(vault_to_wallet(vault, wallet, f.web(100))).unwrap();

        let later = f.now() + Duration::days(1);
        f.chain.advance_time_to(later).unwrap();
        f.chain.apply_operation(vault_to_wallet(vault, wallet, f.web(300))).unwrap();
        assert_eq!(f.cash(wallet, f.web), 600);
        assert_eq!(f.cash(vault, f.web), 400);
    }

    #[test]
    fn disabled_limit_lets_everything_through() {
        let (mut f, wallet, vault) = funded();
        f.chain
            .db_mut()
            .set_vault_to_wallet_limit_disabled(vault, f.web, true)
            .unwrap();
        f.chain.apply_operation(vault_to_wallet(vault, wallet, f.web(1_000))).unwrap();
        assert_eq!(f.cash(wallet, f.web), 1_000);
        assert_eq!(f.chain.db().balance_limit(vault, f.web).unwrap().spent, 0);
    }

    #[test]
    fn untethered_or_reversed_pairs_rejected() {
        let (mut f, wallet, vault) = funded();
        let stranger = f.wallet("bob");
        f.chain.db_mut().adjust_balance_limit(vault, f.web, 300).unwrap();

        for op in [
            vault_to_wallet(vault, stranger, f.web(1)),
            vault_to_wallet(wallet, vault, f.web(1)),
        ] {
            let err = f.chain.apply_operation(op).unwrap_err();
            assert!(matches!(err, LedgerError::InvalidAccountRelationship { .. }));
        }
    }

    #[test]
    fn reserved_moves_into_the_wallets_reserved_pool() {
        let mut f = LedgerFixture::new();
        let (wallet, vault) = f.tethered_pair("alice");
        f.issue(vault, f.web(0), 500).unwrap();
        f.chain.db_mut().adjust_balance_limit(vault, f.web, 1_000).unwrap();

        let err = f
            .chain
            .apply_operation(vault_to_wallet(vault, wallet, f.web(1)))
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBalance { available: 0, .. }));

        let op = TransferVaultToWalletOperation {
            reserved: 200,
            ..vault_to_wallet(vault, wallet, f.web(0))
        };
        f.chain.apply_operation(op).unwrap();
        assert_eq!(f.reserved(vault, f.web), 300);
        assert_eq!(f.reserved(wallet, f.web), 200);
        assert_eq!(f.cash(wallet, f.web), 0);
        assert_eq!(f.chain.db().balance_limit(vault, f.web).unwrap().spent, 200);

        // Still reserved on the wallet side: not sellable as cash.
        assert!(matches!(
            f.sell(wallet, f.web(1), f.das(1)),
            Err(LedgerError::InsufficientBalance { available: 0, .. })
        ));
    }

    #[test]
    fn cash_and_reserved_together_count_against_the_limit() {
        let mut f = LedgerFixture::new();
        let (wallet, vault) = f.tethered_pair("alice");
        f.issue(vault, f.web(1_000), 100).unwrap();
        f.chain.db_mut().adjust_balance_limit(vault, f.web, 1_050).unwrap();

        let op = TransferVaultToWalletOperation {
            reserved: 100,
            ..vault_to_wallet(vault, wallet, f.web(1_000))
        };
        let err = f.chain.apply_operation(op).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::LimitExceeded {
                requested: 1_100,
                remaining: 1_050,
                ..
            }
        ));
        assert_eq!(f.reserved(vault, f.web), 100);
    }

    #[test]
    fn transferred_reserved_stays_put_while_wallet_trades_cash() {
        let mut f = LedgerFixture::new();
        let (alice_wallet, alice_vault) = f.tethered_pair("alice");
        let (bob_wallet, bob_vault) = f.tethered_pair("bob");
        f.issue(alice_vault, f.web(1_000), 100).unwrap();
        f.issue(bob_vault, f.das(100), 0).unwrap();
        let (web, das) = (f.web, f.das);
        let db = f.chain.db_mut();
        db.adjust_balance_limit(bob_vault, das, 100).unwrap();
        db.set_vault_to_wallet_limit_disabled(alice_vault, web, true).unwrap();

        f.chain
            .apply_operation(vault_to_wallet(bob_vault, bob_wallet, f.das(100)))
            .unwrap();
        let op = TransferVaultToWalletOperation {
            reserved: 100,
            ..vault_to_wallet(alice_vault, alice_wallet, f.web(1_000))
        };
        f.chain.apply_operation(op).unwrap();
        assert_eq!(f.cash(alice_wallet, f.web), 1_000);
        assert_eq!(f.reserved(alice_wallet, f.web), 100);

        f.sell(alice_wallet, f.web(100), f.das(10)).unwrap();
        f.sell(bob_wallet, f.das(10), f.web(100)).unwrap();

        assert_eq!(f.cash(alice_wallet, f.web), 900);
        assert_eq!(f.reserved(alice_wallet, f.web), 100);
        assert_eq!(f.cash(alice_wallet, f.das), 10);
        assert_eq!(f.cash(bob_wallet, f.das), 90);
        assert_eq!(f.cash(bob_wallet, f.web), 100);
    }

    #[test]
    fn reserved_only_for_web_asset() {
        let (mut f, wallet, vault) = funded();
        f.issue(vault, f.das(10), 0).unwrap();
        f.chain.db_mut().adjust_balance_limit(vault, f.das, 100).unwrap();
        let op = TransferVaultToWalletOperation {
            reserved: 1,
            ..vault_to_wallet(vault, wallet, f.das(1))
        };
        assert!(matches!(
            f.chain.apply_operation(op),
            Err(LedgerError::InvalidOperation { .. })
        ));
    }
}
