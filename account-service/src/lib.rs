//! Client balance store: per-client, per-currency ledgers with atomic debits

pub mod repository;

pub use repository::{ClientBalanceRepository, ConcurrentClientBalanceRepository};
