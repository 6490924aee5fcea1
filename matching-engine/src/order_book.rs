//! Order book store: one independently locked order sequence per currency pair

use std::sync::Arc;

use common::model::currency::CurrencyPair;
use common::model::order::OrderInfo;
use dashmap::DashMap;
use parking_lot::{Mutex, MutexGuard};
use uuid::Uuid;

/// Resting orders of a single currency pair, in insertion order
#[derive(Debug, Default)]
pub struct PairOrders {
    orders: Vec<OrderInfo>,
}

impl PairOrders {
    /// Create an empty sequence
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a resting order
    pub fn push(&mut self, info: OrderInfo) {
        self.orders.push(info);
    }

    /// Put an order back at `index`, keeping the order of the others
    pub fn insert(&mut self, index: usize, info: OrderInfo) {
        let index = index.min(self.orders.len());
        self.orders.insert(index, info);
    }

    /// Index of the resting order able to cover `incoming`, if any.
    ///
    /// The candidate is the order with the highest `source_to_target_rate`;
    /// among equal rates the earliest inserted wins. It is returned only when
    /// it actually covers `incoming`.
    pub fn best_cover_index(&self, incoming: &OrderInfo) -> Option<usize> {
        let (index, best) = self
            .orders
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, &OrderInfo)>, (index, info)| match best {
                Some((_, current)) if current.source_to_target_rate() >= info.source_to_target_rate() => best,
                _ => Some((index, info)),
            })?;

        best.covers(incoming).then_some(index)
    }

    /// Remove and return the order at `index`
    pub fn remove(&mut self, index: usize) -> OrderInfo {
        self.orders.remove(index)
    }

    /// Remove an order by ID
    pub fn remove_by_id(&mut self, order_id: Uuid) -> Option<OrderInfo> {
        let index = self.orders.iter().position(|o| o.id() == order_id)?;
        Some(self.orders.remove(index))
    }

    /// Find an order by ID
    pub fn find(&self, order_id: Uuid) -> Option<&OrderInfo> {
        self.orders.iter().find(|o| o.id() == order_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &OrderInfo> {
        self.orders.iter()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

/// Shared handle to one pair's order sequence
pub type SharedPairOrders = Arc<Mutex<PairOrders>>;

/// Registry of per-pair order sequences.
///
/// Sequences are created on first access and kept for the lifetime of the
/// book, so a handle obtained once stays valid.
#[derive(Default)]
pub struct OrderBook {
    pairs: DashMap<CurrencyPair, SharedPairOrders>,
}

impl OrderBook {
    /// Create a new empty order book
    pub fn new() -> Self {
        Self::default()
    }

    /// The live order sequence for `pair`
    pub fn orders_for_pair(&self, pair: CurrencyPair) -> SharedPairOrders {
        if let Some(orders) = self.pairs.get(&pair) {
            return Arc::clone(orders.value());
        }
        Arc::clone(self.pairs.entry(pair).or_default().value())
    }

    /// Handles to every known pair's sequence. Callers lock each one while
    /// reading it.
    pub fn all_orders(&self) -> Vec<(CurrencyPair, SharedPairOrders)> {
        self.pairs
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect()
    }
}

/// Lock the sequences of `pair` and of its inverse.
///
/// Locks are always taken in `CurrencyPair` order so that two submissions on
/// opposite pairs cannot deadlock. Returns `(own, inverse)` guards.
pub fn lock_with_inverse<'a>(
    pair: CurrencyPair,
    own: &'a Mutex<PairOrders>,
    inverse: &'a Mutex<PairOrders>,
) -> (MutexGuard<'a, PairOrders>, MutexGuard<'a, PairOrders>) {
    if pair < pair.inverse() {
        let own_guard = own.lock();
        let inverse_guard = inverse.lock();
        (own_guard, inverse_guard)
    } else {
        let inverse_guard = inverse.lock();
        let own_guard = own.lock();
        (own_guard, inverse_guard)
    }
}
