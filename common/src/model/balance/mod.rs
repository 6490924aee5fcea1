//! Balance model used for client and aggregate reporting

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::decimal::Amount;
use crate::model::currency::Currency;

/// Amounts held per currency.
///
/// A `Balance` is a snapshot: it is produced by the balance store or the
/// engine and never mutated by them afterwards. Currencies without an entry
/// read as zero, and two balances are equal when every currency reads the
/// same amount.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Balance {
    amounts: BTreeMap<Currency, Amount>,
}

impl Balance {
    /// Create an empty balance
    pub fn new() -> Self {
        Self::default()
    }

    /// Amount held in `currency`
    pub fn get(&self, currency: Currency) -> Amount {
        self.amounts.get(&currency).copied().unwrap_or(Amount::ZERO)
    }

    /// Merge two balances by summing per-currency amounts
    pub fn add(&self, other: &Balance) -> Balance {
        let mut amounts = self.amounts.clone();
        for (currency, amount) in &other.amounts {
            *amounts.entry(*currency).or_insert(Amount::ZERO) += *amount;
        }
        Balance { amounts }
    }

    /// Return a copy with `amount` added to `currency`
    pub fn with_amount(mut self, currency: Currency, amount: Amount) -> Self {
        *self.amounts.entry(currency).or_insert(Amount::ZERO) += amount;
        self
    }

    /// Iterate over the recorded currencies in currency order
    pub fn iter(&self) -> impl Iterator<Item = (Currency, Amount)> + '_ {
        self.amounts.iter().map(|(c, a)| (*c, *a))
    }

    /// Whether every currency reads zero
    pub fn is_zero(&self) -> bool {
        self.amounts.values().all(|a| a.is_zero())
    }
}

impl FromIterator<(Currency, Amount)> for Balance {
    fn from_iter<I: IntoIterator<Item = (Currency, Amount)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Balance::new(), |balance, (currency, amount)| balance.with_amount(currency, amount))
    }
}

impl PartialEq for Balance {
    fn eq(&self, other: &Self) -> bool {
        self.amounts
            .keys()
            .chain(other.amounts.keys())
            .all(|currency| self.get(*currency) == other.get(*currency))
    }
}

impl Eq for Balance {}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (currency, amount) in self.iter() {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", currency, amount)?;
            first = false;
        }
        Ok(())
    }
}
