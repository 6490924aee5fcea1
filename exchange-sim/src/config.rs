//! Configuration for the exchange simulation

use std::env;
use std::str::FromStr;

use common::decimal::{dec, Amount};
use common::error::{Error, ErrorExt, Result};

/// Configuration for a simulation run
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    /// Number of registered clients
    pub clients: usize,
    /// Number of concurrent workers submitting orders
    pub workers: usize,
    /// Orders submitted by each worker
    pub orders_per_worker: usize,
    /// Amount deposited into every currency of every client before trading
    pub initial_deposit: Amount,
    /// Upper bound of a single order's source amount
    pub max_order_value: Amount,
    /// Seed of the order flow; worker `n` uses `seed + n`
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            clients: 16,
            workers: 4,
            orders_per_worker: 1000,
            initial_deposit: dec!(10000),
            max_order_value: dec!(500),
            seed: 42,
        }
    }
}

impl SimulationConfig {
    /// Create a new configuration using environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Create a configuration from an arbitrary variable source, falling back
    /// to the defaults for unset variables
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            clients: parse_var(&lookup, "SIM_CLIENTS", defaults.clients)?,
            workers: parse_var(&lookup, "SIM_WORKERS", defaults.workers)?,
            orders_per_worker: parse_var(&lookup, "SIM_ORDERS_PER_WORKER", defaults.orders_per_worker)?,
            initial_deposit: parse_amount(&lookup, "SIM_INITIAL_DEPOSIT", defaults.initial_deposit)?,
            max_order_value: parse_amount(&lookup, "SIM_MAX_ORDER_VALUE", defaults.max_order_value)?,
            seed: parse_var(&lookup, "SIM_SEED", defaults.seed)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration describes a runnable simulation
    pub fn validate(&self) -> Result<()> {
        if self.clients == 0 {
            return Err(Error::ConfigurationError("At least one client is required".to_string()));
        }
        if self.workers == 0 {
            return Err(Error::ConfigurationError("At least one worker is required".to_string()));
        }
        if self.initial_deposit < Amount::ZERO {
            return Err(Error::ConfigurationError(format!(
                "Initial deposit cannot be negative: {}",
                self.initial_deposit
            )));
        }
        // Orders are drawn in cents
        if self.max_order_value < dec!(0.01) {
            return Err(Error::ConfigurationError(format!(
                "Maximum order value must be at least 0.01: {}",
                self.max_order_value
            )));
        }
        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, name: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| Error::ConfigurationError(format!("Invalid value for {}: {:?}", name, raw))),
        None => Ok(default),
    }
}

fn parse_amount<F>(lookup: &F, name: &str, default: Amount) -> Result<Amount>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => Amount::from_str(raw.trim())
            .map_err(Error::from)
            .with_context(|| format!("Invalid amount for {}", name)),
        None => Ok(default),
    }
}
