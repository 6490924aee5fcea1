//! Repository for client balances

use std::sync::Arc;

use common::decimal::Amount;
use common::error::{Error, Result};
use common::model::balance::Balance;
use common::model::client::Client;
use common::model::currency::Currency;
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, info};

/// Balance repository trait defining the interface for client ledgers.
///
/// Every (client, currency) cell is mutated atomically on its own; operations
/// on different cells never wait for each other.
pub trait ClientBalanceRepository: Send + Sync {
    /// Register a new client with zero balances in every currency
    fn create_client(&self) -> Client;

    /// Increase the client's balance in `currency` by `amount`
    fn deposit(&self, client: Client, currency: Currency, amount: Amount) -> Result<()>;

    /// Decrease the client's balance in `currency` by `amount` if it holds at
    /// least that much. Returns `Ok(false)` and leaves the balance untouched
    /// otherwise.
    fn try_debit(&self, client: Client, currency: Currency, amount: Amount) -> Result<bool>;

    /// Snapshot of all currency amounts held by the client
    fn get_balance(&self, client: Client) -> Result<Balance>;

    /// Sum of every client's balance per currency
    fn get_aggregate_balance(&self) -> Balance;

    /// Number of registered clients
    fn client_count(&self) -> usize;
}

/// One client's balance cells, one lock per currency
struct ClientLedger {
    cells: [Mutex<Amount>; Currency::COUNT],
}

impl ClientLedger {
    fn new() -> Self {
        Self {
            cells: Currency::ALL.map(|_| Mutex::new(Amount::ZERO)),
        }
    }

    fn cell(&self, currency: Currency) -> &Mutex<Amount> {
        &self.cells[currency.index()]
    }

    fn credit(&self, currency: Currency, amount: Amount) {
        *self.cell(currency).lock() += amount;
    }

    fn try_debit(&self, currency: Currency, amount: Amount) -> bool {
        let mut cell = self.cell(currency).lock();
        if *cell < amount {
            return false;
        }
        *cell -= amount;
        true
    }

    fn snapshot(&self) -> Balance {
        Currency::ALL
            .into_iter()
            .map(|currency| (currency, *self.cell(currency).lock()))
            .collect()
    }
}

/// In-memory repository backed by a concurrent map of per-client ledgers
pub struct ConcurrentClientBalanceRepository {
    /// Ledgers by client
    clients: DashMap<Client, Arc<ClientLedger>>,
}

impl ConcurrentClientBalanceRepository {
    /// Create a new empty repository
    pub fn new() -> Self {
        Self {
            clients: DashMap::new(),
        }
    }

    // The map guard is released before any cell is locked.
    fn ledger(&self, client: Client) -> Result<Arc<ClientLedger>> {
        self.clients
            .get(&client)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| Error::ClientNotFound(format!("Client not registered: {}", client)))
    }
}

impl Default for ConcurrentClientBalanceRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientBalanceRepository for ConcurrentClientBalanceRepository {
    fn create_client(&self) -> Client {
        let client = Client::new();
        self.clients.insert(client, Arc::new(ClientLedger::new()));
        info!("Registered {}", client);
        client
    }

    fn deposit(&self, client: Client, currency: Currency, amount: Amount) -> Result<()> {
        self.ledger(client)?.credit(currency, amount);
        debug!("Credited {} {} to {}", amount, currency, client);
        Ok(())
    }

    fn try_debit(&self, client: Client, currency: Currency, amount: Amount) -> Result<bool> {
        let debited = self.ledger(client)?.try_debit(currency, amount);
        if debited {
            debug!("Debited {} {} from {}", amount, currency, client);
        } else {
            debug!("Rejected debit of {} {} from {}", amount, currency, client);
        }
        Ok(debited)
    }

    fn get_balance(&self, client: Client) -> Result<Balance> {
        Ok(self.ledger(client)?.snapshot())
    }

    fn get_aggregate_balance(&self) -> Balance {
        let ledgers: Vec<Arc<ClientLedger>> = self
            .clients
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        ledgers
            .iter()
            .fold(Balance::new(), |total, ledger| total.add(&ledger.snapshot()))
    }

    fn client_count(&self) -> usize {
        self.clients.len()
    }
}
