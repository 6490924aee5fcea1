use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use account_service::{ClientBalanceRepository, ConcurrentClientBalanceRepository};
use common::decimal::Amount;
use common::error::{Error, ErrorExt, Result};
use common::model::balance::Balance;
use common::model::client::Client;
use common::model::currency::Currency;
use common::model::order::Order;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::order_book::{self, OrderBook};
use crate::settlement::Settlement;

/// Result of submitting an order
#[derive(Debug, Clone)]
pub enum SubmitResult {
    /// No resting order covered the submission; it now waits in the book
    Resting(Order),
    /// A resting order covered the submission and both were settled
    Covered(Settlement),
}

impl SubmitResult {
    /// Whether the submission was covered immediately
    pub fn is_covered(&self) -> bool {
        matches!(self, SubmitResult::Covered(_))
    }
}

/// Public API of an exchange
pub trait Exchange: Send + Sync {
    /// Register a new client with zero balances
    fn create_client(&self) -> Client;

    /// Add funds to a client's balance
    fn deposit(&self, client: Client, currency: Currency, amount: Amount) -> Result<()>;

    /// Take funds out of a client's balance
    fn withdraw(&self, client: Client, currency: Currency, amount: Amount) -> Result<()>;

    /// Fund an order and either cover it immediately or leave it resting
    fn submit_order(&self, order: Order) -> Result<SubmitResult>;

    /// Remove a resting order and refund its source amount to its owner
    fn cancel_order(&self, client: Client, order_id: Uuid) -> Result<Order>;

    /// Look up a resting order
    fn get_order(&self, order_id: Uuid) -> Option<Order>;

    /// Every order currently resting in the book
    fn get_open_orders(&self) -> Vec<Order>;

    /// Balance snapshot of one client
    fn get_client_balance(&self, client: Client) -> Result<Balance>;

    /// Funds held by all clients plus the amounts committed to open orders
    fn get_aggregate_balance(&self) -> Balance;

    /// Number of completed covers
    fn get_cover_count(&self) -> u64;
}

/// The matching engine responsible for funding, covering and settling orders
pub struct MatchingEngine {
    /// Client balances
    balances: Arc<dyn ClientBalanceRepository>,
    /// Resting orders per currency pair
    order_book: OrderBook,
    /// Completed covers
    cover_count: AtomicU64,
}

impl MatchingEngine {
    /// Create a new matching engine with an in-memory balance store
    pub fn new() -> Self {
        Self::with_repository(Arc::new(ConcurrentClientBalanceRepository::new()))
    }

    /// Create a new matching engine on top of a specific balance store
    pub fn with_repository(balances: Arc<dyn ClientBalanceRepository>) -> Self {
        Self {
            balances,
            order_book: OrderBook::new(),
            cover_count: AtomicU64::new(0),
        }
    }

    fn validate_amount(amount: Amount, operation: &str) -> Result<()> {
        if amount < Amount::ZERO {
            return Err(Error::ValidationError(format!(
                "Cannot {} a negative amount: {}",
                operation, amount
            )));
        }
        Ok(())
    }

    /// Credit every party of a settlement
    fn apply_settlement(&self, settlement: &Settlement) -> Result<()> {
        let incoming = &settlement.incoming;
        let resting = &settlement.resting;
        let source = incoming.source_currency();
        let target = incoming.target_currency();

        self.balances.deposit(incoming.client(), source, settlement.incoming_cashback)?;
        self.balances.deposit(incoming.client(), target, settlement.filled_target)?;
        self.balances.deposit(resting.client(), target, settlement.resting_cashback)?;
        self.balances.deposit(resting.client(), source, settlement.filled_source)?;
        Ok(())
    }

    /// Notional value of the open orders, valued at their committed source amounts
    fn open_orders_cost(&self) -> Balance {
        self.get_open_orders()
            .iter()
            .map(|order| (order.source_currency(), order.source_value()))
            .collect()
    }
}

impl Default for MatchingEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Exchange for MatchingEngine {
    fn create_client(&self) -> Client {
        self.balances.create_client()
    }

    fn deposit(&self, client: Client, currency: Currency, amount: Amount) -> Result<()> {
        Self::validate_amount(amount, "deposit")?;
        self.balances.deposit(client, currency, amount)
    }

    fn withdraw(&self, client: Client, currency: Currency, amount: Amount) -> Result<()> {
        Self::validate_amount(amount, "withdraw")?;
        if !self.balances.try_debit(client, currency, amount)? {
            return Err(Error::InsufficientFunds(format!(
                "{} cannot withdraw {} {}",
                client, amount, currency
            )));
        }
        Ok(())
    }

    fn submit_order(&self, order: Order) -> Result<SubmitResult> {
        let client = order.client();
        let funded = self
            .balances
            .try_debit(client, order.source_currency(), order.source_value())
            .with_context(|| format!("Failed to fund order {}", order.id()))?;
        if !funded {
            warn!("Rejected order {}: {} lacks {} {}", order.id(), client, order.source_value(), order.source_currency());
            return Err(Error::InsufficientFunds(format!(
                "{} cannot fund {} {} for order {}",
                client,
                order.source_value(),
                order.source_currency(),
                order.id()
            )));
        }

        let pair = order.pair();
        let own = self.order_book.orders_for_pair(pair);
        let inverse = self.order_book.orders_for_pair(pair.inverse());

        // Both sequences stay locked until the order is either settled or resting
        let (mut own_orders, mut inverse_orders) = order_book::lock_with_inverse(pair, &own, &inverse);

        let Some(index) = inverse_orders.best_cover_index(order.info()) else {
            debug!("Adding order {} to the {} book", order.id(), pair);
            own_orders.push(order.info().clone());
            return Ok(SubmitResult::Resting(order));
        };
        drop(own_orders);

        let resting = Order::from_parts(pair.inverse(), inverse_orders.remove(index));
        let settlement = match Settlement::new(&order, &resting) {
            Ok(settlement) => settlement,
            Err(e) => {
                // Leave the book and the client exactly as before the submission
                inverse_orders.insert(index, resting.into_info());
                drop(inverse_orders);
                self.balances.deposit(client, order.source_currency(), order.source_value())?;
                return Err(e).with_context(|| format!("Failed to settle order {}", order.id()));
            }
        };

        self.apply_settlement(&settlement)
            .with_context(|| format!("Failed to credit settlement of order {}", order.id()))?;
        drop(inverse_orders);

        let covers = self.cover_count.fetch_add(1, Ordering::SeqCst) + 1;
        info!(
            "Order {} covered by order {}: {} {} for {} {} (cover #{})",
            order.id(),
            resting.id(),
            settlement.filled_source,
            order.source_currency(),
            settlement.filled_target,
            order.target_currency(),
            covers
        );

        Ok(SubmitResult::Covered(settlement))
    }

    fn cancel_order(&self, client: Client, order_id: Uuid) -> Result<Order> {
        for (pair, orders) in self.order_book.all_orders() {
            let mut orders = orders.lock();
            let owned = orders
                .find(order_id)
                .map_or(false, |info| info.client() == client);
            if !owned {
                continue;
            }

            if let Some(info) = orders.remove_by_id(order_id) {
                drop(orders);
                let order = Order::from_parts(pair, info);
                self.balances
                    .deposit(client, order.source_currency(), order.source_value())
                    .with_context(|| format!("Failed to refund cancelled order {}", order_id))?;
                info!("Cancelled order {} of {}", order_id, client);
                return Ok(order);
            }
        }

        Err(Error::OrderNotFound(format!("No resting order {} for {}", order_id, client)))
    }

    fn get_order(&self, order_id: Uuid) -> Option<Order> {
        self.order_book.all_orders().into_iter().find_map(|(pair, orders)| {
            orders
                .lock()
                .find(order_id)
                .map(|info| Order::from_parts(pair, info.clone()))
        })
    }

    fn get_open_orders(&self) -> Vec<Order> {
        let mut open_orders = Vec::new();
        for (pair, orders) in self.order_book.all_orders() {
            let orders = orders.lock();
            open_orders.extend(orders.iter().map(|info| Order::from_parts(pair, info.clone())));
        }
        open_orders
    }

    fn get_client_balance(&self, client: Client) -> Result<Balance> {
        self.balances.get_balance(client)
    }

    fn get_aggregate_balance(&self) -> Balance {
        self.balances.get_aggregate_balance().add(&self.open_orders_cost())
    }

    fn get_cover_count(&self) -> u64 {
        self.cover_count.load(Ordering::SeqCst)
    }
}
