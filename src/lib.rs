//! Metapackage re-exporting the exchange crates

pub use account_service;
pub use common;
pub use matching_engine;

pub use matching_engine::{Exchange, MatchingEngine, SubmitResult};
