use std::collections::HashMap;

use alloy::primitives::{Address, U256};
use async_trait::async_trait;

use crate::SafeError;

/// On-chain state of a Safe as needed by the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeSnapshot {
    /// Owners in the order `getOwners()` returns them.
    pub owners: Vec<Address>,
    pub threshold: u64,
    pub nonce: U256,
    pub version: String,
    pub name: String,
}

#[async_trait]
pub trait SafeStateReader: Send + Sync {
    async fn snapshot(&self, safe: Address) -> Result<SafeSnapshot, SafeError>;
}

pub struct MissingSafeReader;

#[async_trait]
impl SafeStateReader for MissingSafeReader {
    async fn snapshot(&self, safe: Address) -> Result<SafeSnapshot, SafeError> {
        Err(SafeError::Chain {
            safe,
            message: "no chain reader configured".to_string(),
        })
    }
}

/// Serves fixed snapshots, e.g. from the console settings file.
#[derive(Debug, Clone, Default)]
pub struct StaticSafeReader {
    snapshots: HashMap<Address, SafeSnapshot>,
}

impl StaticSafeReader {
    pub fn new(snapshots: impl IntoIterator<Item = (Address, SafeSnapshot)>) -> Self {
        Self {
            snapshots: snapshots.into_iter().collect(),
        }
    }
}

#[async_trait]
impl SafeStateReader for StaticSafeReader {
    async fn snapshot(&self, safe: Address) -> Result<SafeSnapshot, SafeError> {
        self.snapshots
            .get(&safe)
            .cloned()
            .ok_or_else(|| SafeError::Chain {
                safe,
                message: "safe not found".to_string(),
            })
    }
}
