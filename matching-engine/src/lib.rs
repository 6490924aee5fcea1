//! Covering engine: per-pair order book, order submission and settlement

pub mod order_book;
pub mod settlement;
pub mod engine;

pub use engine::{Exchange, MatchingEngine, SubmitResult};
pub use order_book::{OrderBook, PairOrders};
pub use settlement::Settlement;
