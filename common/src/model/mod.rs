//! Domain models for the currency exchange

pub mod currency;
pub mod client;
pub mod balance;
pub mod order;
