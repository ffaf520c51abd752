//! A single price level in the order book.
//!
//! Orders at the same price are kept sorted by [`LimitOrder::sequence`]
//! in a [`VecDeque`], so the front is always the oldest.

use std::cmp::Ordering;
use std::collections::VecDeque;

use dasledger_types::{LimitOrder, LimitOrderId, Price, ShareType};

/// Sort key for one side of the book.
///
/// Orders on a side all sell the same asset for the same other asset, so
/// they are ranked by what they ask per unit sold (`quote / base`),
/// lowest first. Two prices with the same ratio are the same level even
/// when their legs differ.
#[derive(Debug, Clone, Copy)]
pub struct BookPrice(pub Price);

impl PartialEq for BookPrice {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for BookPrice {}

impl PartialOrd for BookPrice {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BookPrice {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp_ratio(&other.0)
    }
}

/// A single price level containing all orders at that price.
///
/// The front of the deque has the highest time priority and is filled
/// first.
#[derive(Debug, Clone)]
pub struct PriceLevel {
    pub price: BookPrice,
    pub orders: VecDeque<LimitOrder>,
}

impl PriceLevel {
    #[must_use]
    pub fn new(price: BookPrice) -> Self {
        Self {
            price,
            orders: VecDeque::new(),
        }
    }

    /// Add an order at its sequence position. A new order lands at the
    /// back; an order put back after removal regains its old place.
    pub fn insert(&mut self, order: LimitOrder) {
        let pos = self.orders.partition_point(|o| o.sequence < order.sequence);
        self.orders.insert(pos, order);
    }

    pub fn pop_front(&mut self) -> Option<LimitOrder> {
        self.orders.pop_front()
    }

    #[must_use]
    pub fn front(&self) -> Option<&LimitOrder> {
        self.orders.front()
    }

    pub fn front_mut(&mut self) -> Option<&mut LimitOrder> {
        self.orders.front_mut()
    }

    /// Total amount still for sale across all orders at this level.
    #[must_use]
    pub fn total_for_sale(&self) -> ShareType {
        self.orders.iter().map(|o| o.for_sale).sum()
    }

    pub fn remove_order(&mut self, order_id: LimitOrderId) -> Option<LimitOrder> {
        let pos = self.orders.iter().position(|o| o.id == order_id)?;
        self.orders.remove(pos)
    }

    #[must_use]
    pub fn get(&self, order_id: LimitOrderId) -> Option<&LimitOrder> {
        self.orders.iter().find(|o| o.id == order_id)
    }

    pub(crate) fn get_mut(&mut self, order_id: LimitOrderId) -> Option<&mut LimitOrder> {
        self.orders.iter_mut().find(|o| o.id == order_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.len()
    }
}

#[cfg(test)]
mod tests {
    use dasledger_types::{AccountId, Asset, AssetId};

    use super::*;

    const WEB: AssetId = AssetId(1);
    const DAS: AssetId = AssetId(0);

    fn make_order(id: u64, sell: i64, receive: i64) -> LimitOrder {
        LimitOrder::dummy(id, AccountId(1), Asset::new(sell, WEB), Asset::new(receive, DAS))
    }

    #[test]
    fn insert_pop_fifo() {
        let o1 = make_order(0, 10, 1);
        let mut level = PriceLevel::new(BookPrice(o1.sell_price));
        level.insert(o1);
        level.insert(make_order(1, 10, 1));

        assert_eq!(level.len(), 2);
        let popped = level.pop_front().unwrap();
        assert_eq!(popped.id, LimitOrderId(0), "FIFO: first in should be first out");
        assert_eq!(level.len(), 1);
    }

    #[test]
    fn reinserted_order_regains_its_place() {
        let o1 = make_order(0, 10, 1);
        let mut level = PriceLevel::new(BookPrice(o1.sell_price));
        level.insert(o1);
        level.insert(make_order(1, 10, 1));
        level.insert(make_order(2, 10, 1));

        let first = level.pop_front().unwrap();
        let middle = level.remove_order(LimitOrderId(1)).unwrap();
        level.insert(middle);
        level.insert(first);
        let ids: Vec<u64> = level.orders.iter().map(|o| o.id.0).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn total_for_sale() {
        let o1 = make_order(0, 10, 1);
        let mut level = PriceLevel::new(BookPrice(o1.sell_price));
        level.insert(o1);
        level.insert(make_order(1, 30, 3));
        assert_eq!(level.total_for_sale(), 40);
    }

    #[test]
    fn remove_order_by_id() {
        let o1 = make_order(0, 10, 1);
        let mut level = PriceLevel::new(BookPrice(o1.sell_price));
        level.insert(o1);
        level.insert(make_order(1, 10, 1));

        let removed = level.remove_order(LimitOrderId(1)).unwrap();
        assert_eq!(removed.id, LimitOrderId(1));
        assert_eq!(level.len(), 1);
        assert!(level.remove_order(LimitOrderId(9)).is_none());
    }

    #[test]
    fn equal_ratios_share_a_key() {
        let a = BookPrice(make_order(0, 10, 1).sell_price);
        let b = BookPrice(make_order(1, 30, 3).sell_price);
        let cheaper = BookPrice(make_order(2, 20, 1).sell_price);
        assert_eq!(a, b);
        assert!(cheaper < a, "asking less per unit sold ranks first");
    }

    #[test]
    fn empty_level() {
        let level = PriceLevel::new(BookPrice(make_order(0, 1, 1).sell_price));
        assert!(level.is_empty());
        assert_eq!(level.total_for_sale(), 0);
        assert!(level.front().is_none());
    }
}
