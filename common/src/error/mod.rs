//! Error types for the currency exchange
//!
//! This module provides a unified error handling system shared by the balance
//! store, the matching engine and the simulation driver. Only
//! `InsufficientFunds` is an expected runtime outcome of the exchange itself;
//! the remaining variants reject caller mistakes or report ambient failures.

use std::fmt::Display;
use thiserror::Error;

/// Currency exchange error type
#[derive(Debug, Error)]
pub enum Error {
    /// A withdrawal or an order's funding debit cannot be satisfied
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    /// Error related to order validation (non-positive amounts, degenerate pairs)
    #[error("Invalid order: {0}")]
    InvalidOrder(String),

    /// Error when an order cannot be found
    #[error("Order not found: {0}")]
    OrderNotFound(String),

    /// Error when a client was never registered with the exchange
    #[error("Client not found: {0}")]
    ClientNotFound(String),

    /// Generic validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Decimal conversion error
    #[error("Decimal conversion error: {0}")]
    DecimalError(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether this error is the recoverable insufficient-funds outcome
    pub fn is_insufficient_funds(&self) -> bool {
        matches!(self, Error::InsufficientFunds(_))
    }

    /// Prefix the message with `context`, keeping the variant
    pub fn context(self, context: impl Display) -> Error {
        let prefix = |msg: String| format!("{}: {}", context, msg);
        match self {
            Error::InsufficientFunds(msg) => Error::InsufficientFunds(prefix(msg)),
            Error::InvalidOrder(msg) => Error::InvalidOrder(prefix(msg)),
            Error::OrderNotFound(msg) => Error::OrderNotFound(prefix(msg)),
            Error::ClientNotFound(msg) => Error::ClientNotFound(prefix(msg)),
            Error::ValidationError(msg) => Error::ValidationError(prefix(msg)),
            Error::ConfigurationError(msg) => Error::ConfigurationError(prefix(msg)),
            Error::Internal(msg) => Error::Internal(prefix(msg)),
            Error::DecimalError(msg) => Error::DecimalError(prefix(msg)),
            // serde_json errors carry their own position information
            Error::Serialization(e) => Error::Serialization(e),
        }
    }
}

/// Extension trait to add context to error results
pub trait ErrorExt<T> {
    /// Add context information to an error
    fn with_context<C, F>(self, context_fn: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display;
}

impl<T> ErrorExt<T> for Result<T> {
    fn with_context<C, F>(self, context_fn: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display,
    {
        self.map_err(|e| e.context(context_fn()))
    }
}

impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::DecimalError(err.to_string())
    }
}
