//! The object store every operation reads and mutates.
//!
//! [`Database`] owns all ledger state: accounts, assets, balances, limits,
//! wire-out holders, the order book and the last trade prices. Evaluators
//! read it through the public accessors and mutate it only through the
//! crate-private checked adjusters, which never let a balance go negative
//! or past the supply cap.
//!
//! Setup helpers (`create_account`, `create_asset`, `tether_accounts`,
//! ...) stand in for the genesis and administrative operations that sit
//! outside this core.
//!
//! Fills are not kept. The store carries the next fill sequence and a
//! running fill root; the fills of the operation in progress are buffered
//! until the processor drains them into its receipt.
//!
//! Between [`Database::begin`] and [`Database::commit`] the checked
//! adjusters record the prior value of whatever they touch, so
//! [`Database::rollback`] restores the store in time proportional to the
//! work done, not to its size.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use dasledger_matchcore::{GENESIS_FILL_ROOT, MatchOutcome, OrderBook, chain_fill_root, match_order};
use dasledger_types::*;
use tracing::debug;

use crate::clock::Clock;
use crate::object_table::ObjectTable;

/// Prior value of one entry touched by a checked adjuster.
#[derive(Debug, Clone)]
enum Undo {
    Balance((AccountId, AssetId), Option<AccountBalance>),
    Limit((AccountId, AssetId), BalanceLimit),
    Asset(AssetObject),
    WireOutCreated(WireOutHolderId),
    WireOutRemoved(WireOutHolder),
    LastPrice(MarketPair, Option<Price>),
}

/// Counters as of `begin`, plus every entry changed since.
#[derive(Debug, Clone)]
struct Savepoint {
    head_time: DateTime<Utc>,
    next_maintenance_time: DateTime<Utc>,
    next_order_instance: u64,
    next_fill_sequence: u64,
    fill_root: [u8; 32],
    undo: Vec<Undo>,
}

#[derive(Debug, Clone)]
pub struct Database {
    params: ChainParameters,
    head_time: DateTime<Utc>,
    next_maintenance_time: DateTime<Utc>,

    accounts: ObjectTable<AccountId, AccountObject>,
    assets: ObjectTable<AssetId, AssetObject>,
    wire_outs: ObjectTable<WireOutHolderId, WireOutHolder>,
    balances: BTreeMap<(AccountId, AssetId), AccountBalance>,
    limits: BTreeMap<(AccountId, AssetId), BalanceLimit>,

    core_asset: Option<AssetId>,
    web_asset: Option<AssetId>,

    book: OrderBook,
    next_order_instance: u64,
    next_fill_sequence: u64,
    fill_root: [u8; 32],
    pending_fills: Vec<Fill>,
    last_prices: BTreeMap<MarketPair, Price>,

    savepoint: Option<Savepoint>,
}

impl Database {
    pub fn new(params: ChainParameters) -> Result<Self> {
        params.validate()?;
        let head_time = params.genesis_time;
        let next_maintenance_time = head_time + params.maintenance_interval();
        Ok(Self {
            params,
            head_time,
            next_maintenance_time,
            accounts: ObjectTable::new(),
            assets: ObjectTable::new(),
            wire_outs: ObjectTable::new(),
            balances: BTreeMap::new(),
            limits: BTreeMap::new(),
            core_asset: None,
            web_asset: None,
            book: OrderBook::new(),
            next_order_instance: 0,
            next_fill_sequence: 0,
            fill_root: GENESIS_FILL_ROOT,
            pending_fills: Vec::new(),
            last_prices: BTreeMap::new(),
            savepoint: None,
        })
    }

    #[must_use]
    pub fn params(&self) -> &ChainParameters {
        &self.params
    }

    // =================================================================
    // Setup
    // =================================================================

    pub fn create_account(&mut self, name: impl Into<String>, kind: AccountKind) -> AccountId {
        let name = name.into();
        let id = self.accounts.create(|id| AccountObject {
            id,
            name,
            kind,
            tether: None,
        });
        debug!(account = %id, kind = %kind, "account created");
        id
    }

    /// Pair a vault with a wallet. Both must be untethered.
    pub fn tether_accounts(&mut self, vault: AccountId, wallet: AccountId) -> Result<()> {
        let vault_obj = self.accounts.get(vault)?;
        let wallet_obj = self.accounts.get(wallet)?;
        if !vault_obj.is_vault() || !wallet_obj.is_wallet() {
            return Err(LedgerError::relationship(format!(
                "only a vault and a wallet can be tethered, got {} {vault} and {} {wallet}",
                vault_obj.kind, wallet_obj.kind
            )));
        }
        if vault_obj.tether.is_some() || wallet_obj.tether.is_some() {
            return Err(LedgerError::relationship(format!(
                "{vault} or {wallet} is already tethered"
            )));
        }
        self.accounts.modify(vault, |a| a.tether = Some(wallet))?;
        self.accounts.modify(wallet, |a| a.tether = Some(vault))?;
        debug!(vault = %vault, wallet = %wallet, "accounts tethered");
        Ok(())
    }

    /// Designate the account allowed to settle any wire-out.
    pub fn set_wire_out_handler(&mut self, handler: Option<AccountId>) -> Result<()> {
        if let Some(handler) = handler {
            self.accounts.get(handler)?;
        }
        self.params.wire_out_handler = handler;
        Ok(())
    }

    /// Define an asset issued by `issuer`. The first asset created becomes
    /// the core asset.
    pub fn create_asset(
        &mut self,
        symbol: impl Into<String>,
        precision: u8,
        issuer: AccountId,
    ) -> Result<AssetId> {
        self.accounts.get(issuer)?;
        let symbol = symbol.into();
        if self.assets.iter().any(|(_, a)| a.symbol == symbol) {
            return Err(LedgerError::invalid_operation(format!(
                "asset symbol {symbol} already exists"
            )));
        }
        let core = self.core_asset;
        let id = self.assets.create(|id| AssetObject {
            id,
            symbol,
            precision,
            issuer,
            options: AssetOptions::new(id, core.unwrap_or(id)),
            dynamic: AssetDynamicData::default(),
        });
        if self.core_asset.is_none() {
            self.core_asset = Some(id);
        }
        debug!(asset = %id, issuer = %issuer, "asset created");
        Ok(id)
    }

    /// Define the fiat-backed web asset: the only asset with a reserved
    /// pool. It cannot move through plain transfers.
    pub fn create_web_asset(&mut self, symbol: impl Into<String>, issuer: AccountId) -> Result<AssetId> {
        if let Some(existing) = self.web_asset {
            return Err(LedgerError::invalid_operation(format!(
                "web asset already designated as {existing}"
            )));
        }
        let id = self.create_asset(symbol, constants::WEB_ASSET_PRECISION_DIGITS, issuer)?;
        self.assets.modify(id, |a| a.options.transfer_restricted = true)?;
        self.web_asset = Some(id);
        Ok(id)
    }

    /// Replace an asset's options. Only the issuer may do so.
    pub fn update_asset_options(
        &mut self,
        issuer: AccountId,
        asset: AssetId,
        options: AssetOptions,
    ) -> Result<()> {
        let current = self.assets.get(asset)?;
        if current.issuer != issuer {
            return Err(LedgerError::NotOwner {
                account: issuer,
                object: asset.into(),
            });
        }
        if options.market_fee_percent > constants::PERCENT_100 || options.max_market_fee < 0 {
            return Err(LedgerError::invalid_operation(format!(
                "invalid market fee settings {}/{}",
                options.market_fee_percent, options.max_market_fee
            )));
        }
        self.assets.modify(asset, |a| a.options = options)?;
        debug!(asset = %asset, "asset options updated");
        Ok(())
    }

    /// Set the per-window vault-to-wallet cap for `vault` and `asset`,
    /// keeping what was already spent in the current window.
    pub fn adjust_balance_limit(&mut self, vault: AccountId, asset: AssetId, limit: ShareType) -> Result<()> {
        if !self.accounts.get(vault)?.is_vault() {
            return Err(LedgerError::relationship(format!("{vault} is not a vault")));
        }
        self.assets.get(asset)?;
        if !Asset::new(limit, asset).is_in_range() {
            return Err(LedgerError::invalid_operation(format!("limit {limit} out of range")));
        }
        let now = self.head_time;
        self.limits
            .entry((vault, asset))
            .and_modify(|l| l.limit = limit)
            .or_insert_with(|| BalanceLimit::new(vault, asset, limit, now));
        Ok(())
    }

    /// Lift (`true`) or restore (`false`) the vault-to-wallet cap.
    pub fn set_vault_to_wallet_limit_disabled(
        &mut self,
        vault: AccountId,
        asset: AssetId,
        disabled: bool,
    ) -> Result<()> {
        if !self.accounts.get(vault)?.is_vault() {
            return Err(LedgerError::relationship(format!("{vault} is not a vault")));
        }
        self.assets.get(asset)?;
        let now = self.head_time;
        self.limits
            .entry((vault, asset))
            .or_insert_with(|| BalanceLimit::new(vault, asset, 0, now))
            .disabled = disabled;
        Ok(())
    }

    // =================================================================
    // Queries
    // =================================================================

    pub fn account(&self, id: AccountId) -> Result<&AccountObject> {
        self.accounts.get(id)
    }

    pub fn asset(&self, id: AssetId) -> Result<&AssetObject> {
        self.assets.get(id)
    }

    pub fn wire_out(&self, id: WireOutHolderId) -> Result<&WireOutHolder> {
        self.wire_outs.get(id)
    }

    pub fn limit_order(&self, id: LimitOrderId) -> Result<&LimitOrder> {
        self.book
            .get(id)
            .ok_or(LedgerError::UnknownObject(id.into()))
    }

    #[must_use]
    pub fn core_asset(&self) -> Option<AssetId> {
        self.core_asset
    }

    #[must_use]
    pub fn web_asset(&self) -> Option<AssetId> {
        self.web_asset
    }

    /// Balance record of `account` in `asset`; zero when never touched.
    #[must_use]
    pub fn balance(&self, account: AccountId, asset: AssetId) -> AccountBalance {
        self.balances
            .get(&(account, asset))
            .cloned()
            .unwrap_or_else(|| AccountBalance::new(account, asset))
    }

    #[must_use]
    pub fn cash(&self, account: AccountId, asset: AssetId) -> ShareType {
        self.balance(account, asset).cash
    }

    #[must_use]
    pub fn reserved(&self, account: AccountId, asset: AssetId) -> ShareType {
        self.balance(account, asset).reserved
    }

    #[must_use]
    pub fn balance_limit(&self, vault: AccountId, asset: AssetId) -> Option<&BalanceLimit> {
        self.limits.get(&(vault, asset))
    }

    /// What `vault` may still move to its wallet in the current window,
    /// or `None` when the cap is lifted.
    #[must_use]
    pub fn remaining_limit(&self, vault: AccountId, asset: AssetId) -> Option<ShareType> {
        match self.balance_limit(vault, asset) {
            Some(limit) if limit.disabled => None,
            Some(limit) => Some(limit.remaining(self.head_time, self.params.limit_window())),
            None => Some(0),
        }
    }

    #[must_use]
    pub fn last_price(&self, pair: MarketPair) -> Option<Price> {
        self.last_prices.get(&pair).copied()
    }

    #[must_use]
    pub fn book(&self) -> &OrderBook {
        &self.book
    }

    /// Number of fills executed so far.
    #[must_use]
    pub fn fill_count(&self) -> u64 {
        self.next_fill_sequence
    }

    /// Hash chain over every fill executed so far.
    #[must_use]
    pub fn fill_root(&self) -> [u8; 32] {
        self.fill_root
    }

    pub fn accounts(&self) -> impl Iterator<Item = &AccountObject> {
        self.accounts.iter().map(|(_, a)| a)
    }

    pub fn assets(&self) -> impl Iterator<Item = &AssetObject> {
        self.assets.iter().map(|(_, a)| a)
    }

    pub fn wire_outs(&self) -> impl Iterator<Item = &WireOutHolder> {
        self.wire_outs.iter().map(|(_, w)| w)
    }

    /// Non-zero balance records in (account, asset) order.
    pub fn balances(&self) -> impl Iterator<Item = &AccountBalance> {
        self.balances.values()
    }

    pub fn balance_limits(&self) -> impl Iterator<Item = &BalanceLimit> {
        self.limits.values()
    }

    // =================================================================
    // Checked mutation (evaluators only)
    // =================================================================

    /// Add `delta` (possibly negative) to one pool of a balance.
    pub(crate) fn adjust_pool(
        &mut self,
        account: AccountId,
        asset: AssetId,
        pool: FundingPool,
        delta: ShareType,
    ) -> Result<()> {
        let before = self.balances.get(&(account, asset)).cloned();
        self.log(Undo::Balance((account, asset), before));
        let entry = self
            .balances
            .entry((account, asset))
            .or_insert_with(|| AccountBalance::new(account, asset));
        let slot = match pool {
            FundingPool::Cash => &mut entry.cash,
            FundingPool::Reserved => &mut entry.reserved,
        };
        let updated = slot.checked_add(delta).ok_or_else(|| LedgerError::AmountOverflow {
            reason: format!("{account} {pool} {asset}: {} + {delta}", *slot),
        })?;
        if updated < 0 {
            return Err(LedgerError::InsufficientBalance {
                account,
                asset,
                needed: -delta,
                available: *slot,
            });
        }
        if updated > constants::MAX_SHARE_SUPPLY {
            return Err(LedgerError::AmountOverflow {
                reason: format!("{account} {pool} {asset} would hold {updated}"),
            });
        }
        *slot = updated;
        if entry.is_zero() {
            self.balances.remove(&(account, asset));
        }
        Ok(())
    }

    pub(crate) fn adjust_cash(&mut self, account: AccountId, asset: AssetId, delta: ShareType) -> Result<()> {
        self.adjust_pool(account, asset, FundingPool::Cash, delta)
    }

    pub(crate) fn adjust_supply(&mut self, asset: AssetId, delta: ShareType) -> Result<()> {
        let before = self.assets.get(asset)?.clone();
        let current = before.dynamic.current_supply;
        self.log(Undo::Asset(before));
        let updated = current
            .checked_add(delta)
            .filter(|s| (0..=constants::MAX_SHARE_SUPPLY).contains(s))
            .ok_or_else(|| LedgerError::AmountOverflow {
                reason: format!("supply of {asset}: {current} + {delta}"),
            })?;
        self.assets
            .modify(asset, |a| a.dynamic.current_supply = updated)
    }

    pub(crate) fn collect_fee(&mut self, fee: Asset) -> Result<()> {
        if fee.amount == 0 {
            return Ok(());
        }
        let before = self.assets.get(fee.asset_id)?.clone();
        let current = before.dynamic.accumulated_fees;
        self.log(Undo::Asset(before));
        let updated = current
            .checked_add(fee.amount)
            .ok_or_else(|| LedgerError::AmountOverflow {
                reason: format!("accumulated fees of {}: {current} + {}", fee.asset_id, fee.amount),
            })?;
        self.assets
            .modify(fee.asset_id, |a| a.dynamic.accumulated_fees = updated)
    }

    pub(crate) fn record_limit_spend(&mut self, vault: AccountId, asset: AssetId, amount: ShareType) -> Result<()> {
        let now = self.head_time;
        let window = self.params.limit_window();
        let limit = self
            .limits
            .get_mut(&(vault, asset))
            .ok_or_else(|| LedgerError::InvariantViolation {
                reason: format!("no balance limit for {vault} in {asset}"),
            })?;
        let before = limit.clone();
        limit.record_spend(amount, now, window);
        self.log(Undo::Limit((vault, asset), before));
        Ok(())
    }

    pub(crate) fn create_wire_out(&mut self, account: AccountId, asset: Asset) -> WireOutHolderId {
        let now = self.head_time;
        let id = self.wire_outs.create(|id| WireOutHolder {
            id,
            account,
            asset,
            created_at: now,
        });
        self.log(Undo::WireOutCreated(id));
        id
    }

    pub(crate) fn remove_wire_out(&mut self, id: WireOutHolderId) -> Result<WireOutHolder> {
        let holder = self.wire_outs.remove(id)?;
        self.log(Undo::WireOutRemoved(holder.clone()));
        Ok(holder)
    }

    /// The id the next created order will get.
    #[must_use]
    pub fn next_order_id(&self) -> LimitOrderId {
        LimitOrderId(self.next_order_instance)
    }

    pub(crate) fn allocate_order_id(&mut self) -> LimitOrderId {
        let id = self.next_order_id();
        self.next_order_instance += 1;
        id
    }

    /// Run the matcher for a freshly funded order.
    pub(crate) fn match_incoming(&mut self, order: LimitOrder) -> Result<MatchOutcome> {
        let fee_options = self.assets.get(order.sell_asset())?.options.clone();
        match_order(&mut self.book, order, &fee_options, &mut self.next_fill_sequence)
    }

    pub(crate) fn remove_order(&mut self, id: LimitOrderId) -> Result<LimitOrder> {
        self.book.remove(id)
    }

    /// Fold a settled fill into the running root and the last price.
    pub(crate) fn record_fill(&mut self, fill: Fill) {
        let previous = self.last_prices.insert(fill.pair, fill.price);
        self.log(Undo::LastPrice(fill.pair, previous));
        self.fill_root = chain_fill_root(&self.fill_root, &fill);
        self.pending_fills.push(fill);
    }

    /// Fills recorded since the last call.
    pub(crate) fn take_fills(&mut self) -> Vec<Fill> {
        std::mem::take(&mut self.pending_fills)
    }

    pub(crate) fn set_head_time(&mut self, time: DateTime<Utc>) {
        self.head_time = time;
    }

    pub(crate) fn set_next_maintenance_time(&mut self, time: DateTime<Utc>) {
        self.next_maintenance_time = time;
    }

    // =================================================================
    // Savepoints
    // =================================================================

    /// Start recording changes so they can be rolled back.
    pub(crate) fn begin(&mut self) {
        self.savepoint = Some(Savepoint {
            head_time: self.head_time,
            next_maintenance_time: self.next_maintenance_time,
            next_order_instance: self.next_order_instance,
            next_fill_sequence: self.next_fill_sequence,
            fill_root: self.fill_root,
            undo: Vec::new(),
        });
        self.book.begin();
    }

    /// Keep every change since `begin`.
    pub(crate) fn commit(&mut self) {
        self.savepoint = None;
        self.book.commit();
    }

    /// Undo every change since `begin`, newest first.
    pub(crate) fn rollback(&mut self) -> Result<()> {
        self.pending_fills.clear();
        let Some(savepoint) = self.savepoint.take() else {
            return Ok(());
        };
        debug!(changes = savepoint.undo.len(), "rolling back");
        for undo in savepoint.undo.into_iter().rev() {
            match undo {
                Undo::Balance(key, Some(balance)) => {
                    self.balances.insert(key, balance);
                }
                Undo::Balance(key, None) => {
                    self.balances.remove(&key);
                }
                Undo::Limit(key, limit) => {
                    self.limits.insert(key, limit);
                }
                Undo::Asset(asset) => {
                    self.assets.modify(asset.id, |a| *a = asset)?;
                }
                Undo::WireOutCreated(id) => {
                    self.wire_outs.rewind(id)?;
                }
                Undo::WireOutRemoved(holder) => self.wire_outs.restore(holder.id, holder),
                Undo::LastPrice(pair, Some(price)) => {
                    self.last_prices.insert(pair, price);
                }
                Undo::LastPrice(pair, None) => {
                    self.last_prices.remove(&pair);
                }
            }
        }
        self.head_time = savepoint.head_time;
        self.next_maintenance_time = savepoint.next_maintenance_time;
        self.next_order_instance = savepoint.next_order_instance;
        self.next_fill_sequence = savepoint.next_fill_sequence;
        self.fill_root = savepoint.fill_root;
        self.book.rollback()
    }

    fn log(&mut self, undo: Undo) {
        if let Some(savepoint) = &mut self.savepoint {
            savepoint.undo.push(undo);
        }
    }
}

impl Clock for Database {
    fn now(&self) -> DateTime<Utc> {
        self.head_time
    }

    fn next_maintenance_time(&self) -> DateTime<Utc> {
        self.next_maintenance_time
    }
}
