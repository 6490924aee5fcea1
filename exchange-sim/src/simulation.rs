//! Concurrent random order flow against a shared matching engine

use std::sync::Arc;
use std::time::Instant;

use account_service::{ClientBalanceRepository, ConcurrentClientBalanceRepository};
use common::decimal::{dec, precision, Amount};
use common::error::{Error, Result};
use common::model::balance::Balance;
use common::model::client::Client;
use common::model::currency::Currency;
use common::model::order::Order;
use matching_engine::{Exchange, MatchingEngine, SubmitResult};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::SimulationConfig;

/// Approximate USD value of one unit of each currency; orders are priced
/// around these with a few percent of noise so that covers actually happen.
fn reference_value(currency: Currency) -> Amount {
    match currency {
        Currency::USD => dec!(1),
        Currency::EUR => dec!(1.1),
        Currency::GBP => dec!(1.25),
        Currency::CNY => dec!(0.14),
        Currency::RUB => dec!(0.011),
    }
}

/// Outcome counters of one worker
#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct WorkerStats {
    pub submitted: usize,
    pub resting: usize,
    pub covered: usize,
    pub rejected: usize,
}

impl WorkerStats {
    fn merge(self, other: WorkerStats) -> WorkerStats {
        WorkerStats {
            submitted: self.submitted + other.submitted,
            resting: self.resting + other.resting,
            covered: self.covered + other.covered,
            rejected: self.rejected + other.rejected,
        }
    }
}

/// Summary printed at the end of a run
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub clients: usize,
    pub workers: usize,
    pub seed: u64,
    pub orders: WorkerStats,
    pub cover_count: u64,
    pub open_orders: usize,
    pub deposited: Balance,
    pub aggregate: Balance,
    pub conserved: bool,
    pub elapsed_ms: u64,
}

impl SimulationReport {
    /// Pretty-printed JSON form of the report
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Generates random orders for one worker
struct OrderFlow {
    rng: StdRng,
    max_cents: i64,
}

impl OrderFlow {
    fn new(seed: u64, max_order_value: Amount) -> Result<Self> {
        let max_cents = (max_order_value * dec!(100))
            .trunc()
            .to_i64()
            .filter(|cents| *cents >= 1)
            .ok_or_else(|| Error::ConfigurationError(format!("Unusable maximum order value: {}", max_order_value)))?;
        Ok(Self {
            rng: StdRng::seed_from_u64(seed),
            max_cents,
        })
    }

    fn next_order(&mut self, clients: &[Client]) -> Result<Order> {
        let client = *clients
            .choose(&mut self.rng)
            .ok_or_else(|| Error::Internal("No clients to trade with".to_string()))?;
        let pair: Vec<Currency> = Currency::ALL.choose_multiple(&mut self.rng, 2).copied().collect();
        let (source, target) = (pair[0], pair[1]);

        let source_value = Amount::new(self.rng.gen_range(1..=self.max_cents), 2);
        let noise = Amount::new(self.rng.gen_range(95..=105), 2);
        let fair = source_value * reference_value(source) / reference_value(target);
        let target_value = precision::round_amount(fair * noise).max(dec!(0.00000001));

        Order::new(client, source, target, source_value, target_value)
    }
}

fn run_worker(
    engine: &MatchingEngine,
    clients: &[Client],
    mut flow: OrderFlow,
    orders: usize,
) -> Result<WorkerStats> {
    let mut stats = WorkerStats::default();
    for _ in 0..orders {
        let order = flow.next_order(clients)?;
        stats.submitted += 1;
        match engine.submit_order(order) {
            Ok(SubmitResult::Resting(_)) => stats.resting += 1,
            Ok(SubmitResult::Covered(_)) => stats.covered += 1,
            Err(e) if e.is_insufficient_funds() => stats.rejected += 1,
            Err(e) => return Err(e),
        }
    }
    Ok(stats)
}

/// Register and fund the clients, run every worker to completion and check
/// that no money was created or destroyed.
pub async fn run(config: SimulationConfig) -> Result<SimulationReport> {
    config.validate()?;
    let started = Instant::now();

    let repository = Arc::new(ConcurrentClientBalanceRepository::new());
    let engine = Arc::new(MatchingEngine::with_repository(repository.clone()));

    let mut deposited = Balance::new();
    let mut clients = Vec::with_capacity(config.clients);
    for _ in 0..config.clients {
        let client = engine.create_client();
        for currency in Currency::ALL {
            engine.deposit(client, currency, config.initial_deposit)?;
            deposited = deposited.with_amount(currency, config.initial_deposit);
        }
        clients.push(client);
    }
    let clients = Arc::new(clients);
    info!(
        "Funded {} clients with {} of every currency",
        repository.client_count(),
        config.initial_deposit
    );

    let mut handles = Vec::with_capacity(config.workers);
    for worker in 0..config.workers {
        let flow = OrderFlow::new(config.seed.wrapping_add(worker as u64), config.max_order_value)?;
        let engine = engine.clone();
        let clients = clients.clone();
        let orders = config.orders_per_worker;
        handles.push(tokio::task::spawn_blocking(move || {
            let stats = run_worker(&engine, &clients, flow, orders);
            debug!("Worker {} finished: {:?}", worker, stats);
            stats
        }));
    }

    let mut totals = WorkerStats::default();
    for handle in handles {
        let stats = handle
            .await
            .map_err(|e| Error::Internal(format!("Worker task failed: {}", e)))??;
        totals = totals.merge(stats);
    }

    let aggregate = engine.get_aggregate_balance();
    let conserved = aggregate == deposited;
    let report = SimulationReport {
        clients: repository.client_count(),
        workers: config.workers,
        seed: config.seed,
        orders: totals,
        cover_count: engine.get_cover_count(),
        open_orders: engine.get_open_orders().len(),
        deposited,
        aggregate,
        conserved,
        elapsed_ms: started.elapsed().as_millis() as u64,
    };
    info!(
        "Simulation finished: {} orders, {} covers, {} open",
        report.orders.submitted, report.cover_count, report.open_orders
    );
    Ok(report)
}
