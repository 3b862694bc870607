//! Safe owner management and multi-signature transaction handling.

use alloy::primitives::{address, hex, Address};

pub mod abi;
pub mod delegate;
pub mod error;
pub mod owners;
pub mod reader;
pub mod signer;
pub mod transaction;

pub use error::SafeError;
pub use owners::{OwnerChange, OwnerRegistry, PredecessorPolicy};
pub use reader::{MissingSafeReader, SafeSnapshot, SafeStateReader, StaticSafeReader};
pub use signer::LocalSigners;
pub use transaction::{FinalizedTransaction, SafeDomain, SafeTransaction, TransactionIntent};

/// Head of the on-chain owner linked list.
pub const SENTINEL_OWNERS: Address = address!("0x0000000000000000000000000000000000000001");

/// Canonical lowercase `0x`-prefixed form of an address.
pub fn lower_hex(address: &Address) -> String {
    format!("0x{}", hex::encode(address))
}
