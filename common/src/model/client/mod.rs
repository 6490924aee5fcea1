//! Client identity

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque, globally unique client identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Client {
    id: Uuid,
}

impl Client {
    /// Allocate a fresh identity
    pub fn new() -> Self {
        Self { id: Uuid::new_v4() }
    }

    /// Underlying identifier
    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client-{}", self.id)
    }
}
