//! The resting order book for every trading pair.
//!
//! Each [`BookSide`] (sell asset, receive asset) has its own
//! `BTreeMap<BookPrice, PriceLevel>`, iterated best price first. Two
//! auxiliary indexes keep lookups deterministic and logarithmic:
//! - `OrderId -> (side, price)` for cancellation
//! - `(expiration, OrderId)` for the maintenance sweep
//!
//! Between [`OrderBook::begin`] and [`OrderBook::commit`] every change is
//! journaled so [`OrderBook::rollback`] can undo it. The journal only
//! grows with the orders touched, never with the size of the book.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use dasledger_types::*;

use crate::price_level::{BookPrice, PriceLevel};

/// Inverse of one book change.
#[derive(Debug, Clone)]
enum BookUndo {
    Inserted(LimitOrderId),
    Removed(LimitOrder),
    Reduced(LimitOrderId, ShareType),
}

#[derive(Debug, Clone, Default)]
pub struct OrderBook {
    sides: BTreeMap<BookSide, BTreeMap<BookPrice, PriceLevel>>,
    index: BTreeMap<LimitOrderId, (BookSide, BookPrice)>,
    expirations: BTreeSet<(DateTime<Utc>, LimitOrderId)>,
    journal: Option<Vec<BookUndo>>,
}

impl OrderBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =================================================================
    // Insertion
    // =================================================================

    /// Insert an order into its price level at its sequence position.
    pub fn insert(&mut self, order: LimitOrder) -> Result<()> {
        if self.index.contains_key(&order.id) {
            return Err(LedgerError::InvariantViolation {
                reason: format!("{} is already resting", order.id),
            });
        }
        if !order.sell_price.is_valid() {
            return Err(LedgerError::invalid_order(format!(
                "{} has degenerate price {}",
                order.id, order.sell_price
            )));
        }

        let side = order.side();
        let price = BookPrice(order.sell_price);
        self.log(BookUndo::Inserted(order.id));
        self.index.insert(order.id, (side, price));
        self.expirations.insert((order.expiration, order.id));
        self.sides
            .entry(side)
            .or_default()
            .entry(price)
            .or_insert_with(|| PriceLevel::new(price))
            .insert(order);
        Ok(())
    }

    // =================================================================
    // Removal
    // =================================================================

    /// Remove an order by id, returning it with its current remainder.
    pub fn remove(&mut self, order_id: LimitOrderId) -> Result<LimitOrder> {
        let unknown = || LedgerError::UnknownObject(order_id.into());
        let (side, price) = self.index.remove(&order_id).ok_or_else(unknown)?;

        let levels = self.sides.get_mut(&side).ok_or_else(unknown)?;
        let level = levels.get_mut(&price).ok_or_else(unknown)?;
        let order = level.remove_order(order_id).ok_or_else(unknown)?;
        if level.is_empty() {
            levels.remove(&price);
        }
        if levels.is_empty() {
            self.sides.remove(&side);
        }
        self.expirations.remove(&(order.expiration, order_id));
        self.log(BookUndo::Removed(order.clone()));
        Ok(order)
    }

    /// Pop the highest-priority order on `side`.
    pub(crate) fn pop_best(&mut self, side: BookSide) -> Option<LimitOrder> {
        let levels = self.sides.get_mut(&side)?;
        let mut entry = levels.first_entry()?;
        let order = entry.get_mut().pop_front()?;
        if entry.get().is_empty() {
            entry.remove();
        }
        if levels.is_empty() {
            self.sides.remove(&side);
        }
        self.index.remove(&order.id);
        self.expirations.remove(&(order.expiration, order.id));
        self.log(BookUndo::Removed(order.clone()));
        Some(order)
    }

    /// Take `amount` off the remainder of the highest-priority order on
    /// `side`, returning the order as it now stands.
    pub(crate) fn reduce_best(&mut self, side: BookSide, amount: ShareType) -> Result<LimitOrder> {
        let best = self
            .sides
            .get_mut(&side)
            .and_then(|levels| levels.values_mut().next())
            .and_then(PriceLevel::front_mut)
            .ok_or_else(|| LedgerError::InvariantViolation {
                reason: format!("no resting order on {side}"),
            })?;
        if amount > best.for_sale {
            return Err(LedgerError::InvariantViolation {
                reason: format!("{} has {} left, cannot fill {amount}", best.id, best.for_sale),
            });
        }
        best.for_sale -= amount;
        let reduced = best.clone();
        self.log(BookUndo::Reduced(reduced.id, amount));
        Ok(reduced)
    }

    // =================================================================
    // Journal
    // =================================================================

    /// Start journaling changes, dropping any earlier journal.
    pub fn begin(&mut self) {
        self.journal = Some(Vec::new());
    }

    /// Keep every change since `begin`.
    pub fn commit(&mut self) {
        self.journal = None;
    }

    /// Undo every change since `begin`, newest first. Without an open
    /// journal this does nothing.
    pub fn rollback(&mut self) -> Result<()> {
        let Some(journal) = self.journal.take() else {
            return Ok(());
        };
        for undo in journal.into_iter().rev() {
            match undo {
                BookUndo::Inserted(id) => {
                    self.remove(id)?;
                }
                BookUndo::Removed(order) => self.insert(order)?,
                BookUndo::Reduced(id, amount) => {
                    let (side, price) = self
                        .index
                        .get(&id)
                        .copied()
                        .ok_or(LedgerError::UnknownObject(id.into()))?;
                    let order = self
                        .sides
                        .get_mut(&side)
                        .and_then(|levels| levels.get_mut(&price))
                        .and_then(|level| level.get_mut(id))
                        .ok_or(LedgerError::UnknownObject(id.into()))?;
                    order.for_sale += amount;
                }
            }
        }
        Ok(())
    }

    fn log(&mut self, undo: BookUndo) {
        if let Some(journal) = &mut self.journal {
            journal.push(undo);
        }
    }

    // =================================================================
    // Queries
    // =================================================================

    /// Highest-priority order on `side`.
    #[must_use]
    pub fn best(&self, side: BookSide) -> Option<&LimitOrder> {
        self.sides.get(&side)?.values().next()?.front()
    }

    #[must_use]
    pub fn get(&self, order_id: LimitOrderId) -> Option<&LimitOrder> {
        let (side, price) = self.index.get(&order_id)?;
        self.sides.get(side)?.get(price)?.get(order_id)
    }

    #[must_use]
    pub fn contains(&self, order_id: LimitOrderId) -> bool {
        self.index.contains_key(&order_id)
    }

    /// Number of resting orders across all pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Best (lowest asking) price on `side`, or `None` if the side is empty.
    #[must_use]
    pub fn best_price(&self, side: BookSide) -> Option<Price> {
        self.sides
            .get(&side)?
            .values()
            .next()
            .map(|level| level.price.0)
    }

    /// Number of distinct price levels on `side`.
    #[must_use]
    pub fn depth(&self, side: BookSide) -> usize {
        self.sides.get(&side).map_or(0, BTreeMap::len)
    }

    /// Levels on `side`, best first.
    pub fn levels(&self, side: BookSide) -> impl Iterator<Item = &PriceLevel> {
        self.sides.get(&side).into_iter().flat_map(BTreeMap::values)
    }

    /// Every resting order: by side, then price, then time.
    pub fn iter(&self) -> impl Iterator<Item = &LimitOrder> {
        self.sides
            .values()
            .flat_map(BTreeMap::values)
            .flat_map(|level| level.orders.iter())
    }

    /// Ids of orders whose expiration is at or before `now`, oldest first.
    #[must_use]
    pub fn expired(&self, now: DateTime<Utc>) -> Vec<LimitOrderId> {
        self.expirations
            .range(..=(now, LimitOrderId(u64::MAX)))
            .map(|(_, id)| *id)
            .collect()
    }
}
