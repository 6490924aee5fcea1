//! Order models and related types

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::decimal::{self, Amount, Rate};
use crate::error::{Error, Result};
use crate::model::client::Client;
use crate::model::currency::{Currency, CurrencyPair};

/// Immutable record of a pending exchange request.
///
/// `source_to_target_rate` is the ratio `source_value : target_value`, the
/// amount of source currency given per unit of target currency received.
/// `target_to_source_rate` is its reciprocal. Both are derived once at
/// construction and never change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderInfo {
    id: Uuid,
    client: Client,
    source_value: Amount,
    target_value: Amount,
    source_to_target_rate: Rate,
    target_to_source_rate: Rate,
    created_at: DateTime<Utc>,
}

impl OrderInfo {
    /// Create order info, rejecting non-positive amounts
    pub fn new(client: Client, source_value: Amount, target_value: Amount) -> Result<Self> {
        if source_value <= Amount::ZERO || target_value <= Amount::ZERO {
            return Err(Error::InvalidOrder(format!(
                "Order amounts must be positive: source {}, target {}",
                source_value, target_value
            )));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            client,
            source_value,
            target_value,
            source_to_target_rate: decimal::rate(source_value, target_value)?,
            target_to_source_rate: decimal::rate(target_value, source_value)?,
            created_at: Utc::now(),
        })
    }

    /// Unique order ID
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Owner of the order
    pub fn client(&self) -> Client {
        self.client
    }

    /// Committed amount of the source currency
    pub fn source_value(&self) -> Amount {
        self.source_value
    }

    /// Requested amount of the target currency
    pub fn target_value(&self) -> Amount {
        self.target_value
    }

    pub fn source_to_target_rate(&self) -> Rate {
        self.source_to_target_rate
    }

    pub fn target_to_source_rate(&self) -> Rate {
        self.target_to_source_rate
    }

    /// Creation timestamp
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Whether this resting order may cover `incoming`, an order of the
    /// inverse pair.
    pub fn covers(&self, incoming: &OrderInfo) -> bool {
        self.source_to_target_rate >= incoming.target_to_source_rate
    }
}

/// A pending exchange request: currency pair plus order info
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pair: CurrencyPair,
    info: OrderInfo,
}

impl Order {
    /// Create an order exchanging `source_value` of `source` for
    /// `target_value` of `target`
    pub fn new(
        client: Client,
        source: Currency,
        target: Currency,
        source_value: Amount,
        target_value: Amount,
    ) -> Result<Self> {
        let pair = CurrencyPair::new(source, target)?;
        let info = OrderInfo::new(client, source_value, target_value)?;
        Ok(Self { pair, info })
    }

    /// Assemble an order from a pair and existing info
    pub fn from_parts(pair: CurrencyPair, info: OrderInfo) -> Self {
        Self { pair, info }
    }

    pub fn pair(&self) -> CurrencyPair {
        self.pair
    }

    pub fn info(&self) -> &OrderInfo {
        &self.info
    }

    pub fn into_info(self) -> OrderInfo {
        self.info
    }

    pub fn id(&self) -> Uuid {
        self.info.id()
    }

    pub fn client(&self) -> Client {
        self.info.client()
    }

    pub fn source_currency(&self) -> Currency {
        self.pair.source()
    }

    pub fn target_currency(&self) -> Currency {
        self.pair.target()
    }

    pub fn source_value(&self) -> Amount {
        self.info.source_value()
    }

    pub fn target_value(&self) -> Amount {
        self.info.target_value()
    }
}
