//! Exchange simulation binary

mod config;
mod simulation;

use clap::Parser;
use dotenv::dotenv;
use rust_decimal::Decimal;
use tracing::{debug, error, info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::SimulationConfig;

/// Command line arguments
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Number of clients
    #[clap(long)]
    clients: Option<usize>,

    /// Number of concurrent workers
    #[clap(short, long)]
    workers: Option<usize>,

    /// Orders submitted by each worker
    #[clap(short, long)]
    orders: Option<usize>,

    /// Initial deposit in every currency
    #[clap(long)]
    initial_deposit: Option<Decimal>,

    /// Largest source amount of a single order
    #[clap(long)]
    max_order_value: Option<Decimal>,

    /// Order flow seed
    #[clap(long)]
    seed: Option<u64>,
}

impl Args {
    /// Override the environment configuration with the flags that were given
    fn apply(self, mut config: SimulationConfig) -> SimulationConfig {
        if let Some(clients) = self.clients {
            config.clients = clients;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(orders) = self.orders {
            config.orders_per_worker = orders;
        }
        if let Some(initial_deposit) = self.initial_deposit {
            config.initial_deposit = initial_deposit;
        }
        if let Some(max_order_value) = self.max_order_value {
            config.max_order_value = max_order_value;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        config
    }
}

fn init_tracing() {
    // Debug level if DEBUG=1, RUST_LOG still takes precedence
    let env_debug = std::env::var("DEBUG").unwrap_or_else(|_| "0".to_string());
    let log_level = if env_debug == "1" { Level::DEBUG } else { Level::INFO };

    let env_filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    // stdout carries the JSON report
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_ok() {
        debug!("Tracing initialized");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();
    init_tracing();

    let config = args.apply(SimulationConfig::from_env()?);
    config.validate()?;
    info!(
        "Starting simulation: {} clients, {} workers x {} orders, seed {}",
        config.clients, config.workers, config.orders_per_worker, config.seed
    );

    let report = simulation::run(config).await?;
    println!("{}", report.to_json()?);

    if !report.conserved {
        error!("Aggregate balance {} differs from deposits {}", report.aggregate, report.deposited);
        anyhow::bail!("Funds were not conserved");
    }
    Ok(())
}
