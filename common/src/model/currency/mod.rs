//! Currency and currency pair models

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Currency traded on the exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Currency {
    USD,
    EUR,
    RUB,
    GBP,
    CNY,
}

impl Currency {
    /// Number of currencies known to the exchange
    pub const COUNT: usize = 5;

    /// Every currency known to the exchange
    pub const ALL: [Currency; Currency::COUNT] = [
        Currency::USD,
        Currency::EUR,
        Currency::RUB,
        Currency::GBP,
        Currency::CNY,
    ];

    /// Position of this currency in [`Currency::ALL`]
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// ISO-style currency code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::RUB => "RUB",
            Currency::GBP => "GBP",
            Currency::CNY => "CNY",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Currency::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::ValidationError(format!("Unknown currency: {}", s)))
    }
}

/// Ordered (source, target) pair of distinct currencies
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CurrencyPair {
    source: Currency,
    target: Currency,
}

impl CurrencyPair {
    /// Create a pair, rejecting a currency exchanged for itself
    pub fn new(source: Currency, target: Currency) -> Result<Self> {
        if source == target {
            return Err(Error::InvalidOrder(format!(
                "Source and target currency must differ: {}",
                source
            )));
        }
        Ok(Self { source, target })
    }

    /// Currency the order gives away
    pub fn source(&self) -> Currency {
        self.source
    }

    /// Currency the order wants to receive
    pub fn target(&self) -> Currency {
        self.target
    }

    /// The pair an order must have to cover an order with this pair
    pub fn inverse(&self) -> Self {
        Self {
            source: self.target,
            target: self.source,
        }
    }
}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.source, self.target)
    }
}
