//! Common types and utilities for the currency exchange
//!
//! This library contains shared types, utilities, and abstractions used by the
//! balance store, the matching engine, and the simulation driver. It provides
//! a unified approach to error handling, exact decimal rates, and domain
//! models.

pub mod error;
pub mod model;
pub mod decimal;

/// Re-export important types
pub use error::{Error, ErrorExt, Result};
pub use decimal::*;
