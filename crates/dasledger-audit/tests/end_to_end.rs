//! End-to-end tests: operations flow through the chain, every resulting
//! state is audited.
//!
//! Covers the full lifecycle of a small market: issuance into wallets and
//! vaults, limit windows, trading with fees, wire-outs, cancellation and
//! expiration, and replica agreement under a randomized operation stream.

use chrono::Duration;
use dasledger_audit::{SupplyConservation, audit, state_root_hex};
use dasledger_chain::testing::LedgerFixture;
use dasledger_types::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn set_fee(f: &mut LedgerFixture, asset: AssetId, percent: u16) {
    let mut options = f.chain.db().asset(asset).unwrap().options.clone();
    options.market_fee_percent = percent;
    let issuer = f.issuer;
    f.chain.db_mut().update_asset_options(issuer, asset, options).unwrap();
}

#[test]
fn reserved_and_cash_trade_to_completion() {
    let mut f = LedgerFixture::new();
    let das = f.das;
    set_fee(&mut f, das, 100);
    let (alice, alice_vault) = f.tethered_pair("alice");
    let custodian = f.custodian("desk");
    f.issue(alice, f.web(100), 100).unwrap();
    f.issue(custodian, f.das(300), 0).unwrap();

    let cash_ask = f.sell(alice, f.web(100), f.das(100)).unwrap();
    let reserved_ask = f
        .place(
            LimitOrderCreateOperation::new(alice, f.web(0), f.das(100), f.in_days(30))
                .from_reserved(100)
                .credit_to(alice_vault),
        )
        .unwrap();
    audit(f.chain.db()).unwrap();

    // Same price level: the cash order was first and fills first.
    f.sell(custodian, f.das(100), f.web(100)).unwrap();
    assert!(f.chain.db().limit_order(cash_ask).is_err());
    assert_eq!(f.chain.db().limit_order(reserved_ask).unwrap().for_sale, 100);
    assert_eq!(f.cash(alice, f.web), 0);
    assert_eq!(f.cash(alice, f.das), 99);

    f.sell(custodian, f.das(100), f.web(100)).unwrap();
    assert_eq!(f.reserved(alice, f.web), 0);
    assert_eq!(f.cash(alice_vault, f.das), 99);
    assert_eq!(f.cash(custodian, f.web), 200);
    assert_eq!(f.chain.db().asset(f.das).unwrap().dynamic.accumulated_fees, 2);

    let report = audit(f.chain.db()).unwrap();
    assert!(report.supplies.iter().all(|b| b.is_conserved()));
}

#[test]
fn vault_savings_reach_the_wallet_through_the_limit() {
    let mut f = LedgerFixture::new();
    let (wallet, vault) = f.tethered_pair("alice");
    f.issue(vault, f.das(1_000), 0).unwrap();
    f.chain.db_mut().adjust_balance_limit(vault, f.das, 250).unwrap();

    let mut moved = 0;
    for day in 0..5 {
        let op = TransferVaultToWalletOperation {
            fee: 0,
            from_vault: vault,
            to_wallet: wallet,
            amount: f.das(250),
            reserved: 0,
        };
        f.chain.apply_operation(op.clone()).unwrap();
        moved += 250;
        if day < 3 {
            assert!(matches!(
                f.chain.apply_operation(op),
                Err(LedgerError::LimitExceeded { remaining: 0, .. })
            ));
        }
        if moved == 1_000 {
            break;
        }
        f.chain.advance_time_to(f.in_days(1)).unwrap();
    }
    assert_eq!(f.cash(wallet, f.das), 1_000);
    assert_eq!(f.cash(vault, f.das), 0);
    audit(f.chain.db()).unwrap();
}

#[test]
fn wire_out_lifecycle_conserves_supply() {
    let mut f = LedgerFixture::new();
    let alice = f.wallet("alice");
    let mut record = SupplyConservation::default();
    f.issue(alice, f.web(500), 0).unwrap();
    record.record_issue(f.web, 500);

    let mut holders = Vec::new();
    for amount in [100, 150, 0] {
        let holder = f
            .chain
            .apply_operation(WireOutOperation {
                fee: 0,
                account: alice,
                asset_to_wire: f.web(amount),
            })
            .unwrap()
            .wire_out_holder()
            .unwrap();
        holders.push((holder, amount));
    }
    audit(f.chain.db()).unwrap();

    let (done, burned) = holders[0];
    f.chain
        .apply_operation(WireOutCompleteOperation {
            fee: 0,
            wire_out_handler: f.handler,
            holder: done,
        })
        .unwrap();
    record.record_burn(f.web, burned);
    for &(holder, _) in &holders[1..] {
        f.chain
            .apply_operation(WireOutRejectOperation {
                fee: 0,
                wire_out_handler: f.handler,
                holder,
            })
            .unwrap();
    }

    assert_eq!(f.cash(alice, f.web), 400);
    record.refresh(f.chain.db());
    record.verify_against_record().unwrap();
}

#[test]
fn expiration_refunds_like_cancel() {
    let mut expired = LedgerFixture::new();
    let mut cancelled = LedgerFixture::new();
    let mut ids = Vec::new();

    for f in [&mut expired, &mut cancelled] {
        let alice = f.wallet("alice");
        let bob = f.wallet("bob");
        f.issue(alice, f.web(300), 40).unwrap();
        f.issue(bob, f.das(50), 0).unwrap();
        let expiry = f.now() + Duration::hours(1);
        let ask = f
            .place(LimitOrderCreateOperation::new(alice, f.web(300), f.das(300), expiry))
            .unwrap();
        let reserved = f
            .place(LimitOrderCreateOperation::new(alice, f.web(0), f.das(400), expiry).from_reserved(40))
            .unwrap();
        f.sell(bob, f.das(50), f.web(50)).unwrap();
        ids.push((alice, ask, reserved));
    }

    let report = expired.chain.advance_time_to(expired.in_days(1)).unwrap();
    let (alice, ask, reserved) = ids[0];
    assert_eq!(report.expired, vec![ask, reserved]);

    let (c_alice, c_ask, c_reserved) = ids[1];
    cancelled.cancel(c_alice, c_ask).unwrap();
    cancelled.cancel(c_alice, c_reserved).unwrap();

    for (f, who) in [(&expired, alice), (&cancelled, c_alice)] {
        assert_eq!(f.cash(who, f.web), 250);
        assert_eq!(f.reserved(who, f.web), 40);
        assert_eq!(f.cash(who, f.das), 50);
        assert!(f.chain.db().book().is_empty());
        audit(f.chain.db()).unwrap();
    }
}

#[test]
fn rejected_relationships_change_nothing() {
    let mut f = LedgerFixture::new();
    let (_, vault) = f.tethered_pair("alice");
    let custodian = f.custodian("desk");
    let (bob, _) = f.tethered_pair("bob");
    f.issue(vault, f.das(100), 0).unwrap();
    f.issue(bob, f.das(100), 0).unwrap();
    let root = state_root_hex(f.chain.db());

    let err = f
        .chain
        .apply_operation(TransferOperation {
            fee: 0,
            from: vault,
            to: custodian,
            amount: f.das(10),
            memo: Some("direct".into()),
        })
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidAccountRelationship { .. }));

    let err = f
        .place(LimitOrderCreateOperation::new(bob, f.das(10), f.web(10), f.in_days(1)).credit_to(vault))
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidAccountRelationship { .. }));

    assert_eq!(state_root_hex(f.chain.db()), root);
}

// ---------------------------------------------------------------------------
// Randomized operation stream
// ---------------------------------------------------------------------------

struct Market {
    f: LedgerFixture,
    traders: Vec<(AccountId, AccountId)>,
    orders: Vec<LimitOrderId>,
    holders: Vec<WireOutHolderId>,
}

impl Market {
    fn new() -> Self {
        let mut f = LedgerFixture::new();
        let (das, web) = (f.das, f.web);
        set_fee(&mut f, das, 20);
        set_fee(&mut f, web, 100);
        let mut traders = Vec::new();
        for i in 0..4 {
            let (wallet, vault) = f.tethered_pair(&format!("trader{i}"));
            f.chain.db_mut().adjust_balance_limit(vault, f.web, 500).unwrap();
            f.chain.db_mut().adjust_balance_limit(vault, f.das, 500).unwrap();
            f.issue(wallet, f.web(5_000), 2_000).unwrap();
            f.issue(wallet, f.das(5_000), 0).unwrap();
            f.issue(vault, f.das(1_000), 0).unwrap();
            f.issue(vault, f.web(400), 300).unwrap();
            traders.push((wallet, vault));
        }
        Self {
            f,
            traders,
            orders: Vec::new(),
            holders: Vec::new(),
        }
    }

    fn step(&mut self, rng: &mut StdRng) {
        let (wallet, vault) = self.traders[rng.gen_range(0..self.traders.len())];
        let f = &mut self.f;
        match rng.gen_range(0..10) {
            0..=4 => {
                let sell_web = rng.gen_bool(0.5);
                let amount = rng.gen_range(1..400);
                let want = rng.gen_range(1..400);
                let (sell, receive) = if sell_web {
                    (f.web(amount), f.das(want))
                } else {
                    (f.das(amount), f.web(want))
                };
                let mut op = LimitOrderCreateOperation::new(wallet, sell, receive, f.in_days(rng.gen_range(1..4)));
                if sell_web && rng.gen_bool(0.3) {
                    op = op.from_reserved(amount);
                }
                if rng.gen_bool(0.3) {
                    op = op.credit_to(vault);
                }
                if let Ok(id) = f.place(op) {
                    self.orders.push(id);
                }
            }
            5 => {
                if !self.orders.is_empty() {
                    let id = self.orders.swap_remove(rng.gen_range(0..self.orders.len()));
                    let _ = f.cancel(wallet, id);
                }
            }
            6 => {
                let (amount, reserved) = if rng.gen_bool(0.5) {
                    (f.das(rng.gen_range(1..300)), 0)
                } else {
                    (f.web(rng.gen_range(0..200)), rng.gen_range(0..100))
                };
                let _ = f.chain.apply_operation(TransferVaultToWalletOperation {
                    fee: 0,
                    from_vault: vault,
                    to_wallet: wallet,
                    amount,
                    reserved,
                });
            }
            7 => {
                let result = f.chain.apply_operation(WireOutOperation {
                    fee: 0,
                    account: wallet,
                    asset_to_wire: f.das(rng.gen_range(0..200)),
                });
                if let Some(holder) = result.ok().and_then(|r| r.wire_out_holder()) {
                    self.holders.push(holder);
                }
            }
            8 => {
                if let Some(holder) = self.holders.pop() {
                    let handler = f.handler;
                    let _ = if rng.gen_bool(0.5) {
                        f.chain.apply_operation(WireOutCompleteOperation {
                            fee: 0,
                            wire_out_handler: handler,
                            holder,
                        })
                    } else {
                        f.chain.apply_operation(WireOutRejectOperation {
                            fee: 0,
                            wire_out_handler: handler,
                            holder,
                        })
                    };
                }
            }
            _ => {
                let later = f.now() + Duration::hours(rng.gen_range(1..30));
                f.chain.advance_time_to(later).unwrap();
            }
        }
    }
}

#[test]
fn random_stream_keeps_every_invariant() {
    let mut rng = StdRng::seed_from_u64(0x00da_5c01);
    let mut market = Market::new();
    for _ in 0..400 {
        market.step(&mut rng);
        audit(market.f.chain.db()).unwrap();
    }
    assert!(market.f.chain.db().fill_count() > 0);
}

#[test]
fn replicas_agree_on_the_state_root() {
    let run = |seed: u64| {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut market = Market::new();
        for _ in 0..200 {
            market.step(&mut rng);
        }
        state_root_hex(market.f.chain.db())
    };
    assert_eq!(run(7), run(7));
    assert_ne!(run(7), run(8));
}
