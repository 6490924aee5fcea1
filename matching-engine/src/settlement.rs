//! Settlement of a covered order against the resting order that covers it

use common::decimal::{self, precision, Amount};
use common::error::{Error, Result};
use common::model::order::Order;
use serde::Serialize;

/// Amounts exchanged when an incoming order is covered by a resting order
/// of the inverse pair.
///
/// The resting order is always consumed entirely: whatever part of it is not
/// filled goes back to its owner as cashback, as does the unused part of the
/// incoming order's source amount.
#[derive(Debug, Clone, Serialize)]
pub struct Settlement {
    /// The order that was just submitted
    pub incoming: Order,
    /// The resting order that covered it
    pub resting: Order,
    /// Amount of the incoming order's target currency exchanged
    pub filled_target: Amount,
    /// Amount of the incoming order's source currency exchanged
    pub filled_source: Amount,
    /// Refund to the incoming client, in the incoming source currency
    pub incoming_cashback: Amount,
    /// Refund to the resting client, in the incoming target currency
    pub resting_cashback: Amount,
}

impl Settlement {
    /// Compute the settlement of `incoming` against `resting`.
    ///
    /// `filled_target` is bounded by whichever side has less of the incoming
    /// target currency. `filled_source` converts it at the resting order's
    /// own `target_value : source_value` ratio. Any digits beyond the standard
    /// amount precision round up in the resting client's favor, and the
    /// result never exceeds what the incoming client committed.
    pub fn new(incoming: &Order, resting: &Order) -> Result<Self> {
        if resting.pair() != incoming.pair().inverse() {
            return Err(Error::Internal(format!(
                "Order {} ({}) cannot be covered by order {} ({})",
                incoming.id(),
                incoming.pair(),
                resting.id(),
                resting.pair()
            )));
        }

        let filled_target = resting.source_value().min(incoming.target_value());
        let converted = decimal::convert(filled_target, resting.target_value(), resting.source_value())?;
        let filled_source = precision::round_amount_up(converted).min(incoming.source_value());

        Ok(Self {
            incoming: incoming.clone(),
            resting: resting.clone(),
            filled_target,
            filled_source,
            incoming_cashback: incoming.source_value() - filled_source,
            resting_cashback: resting.source_value() - filled_target,
        })
    }
}
