//! Cached view of a Safe's owner linked list, headed by [`SENTINEL_OWNERS`].

use alloy::{
    primitives::{Address, Bytes, U256},
    sol_types::SolCall,
};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{abi::IOwnerManager, lower_hex, SafeError, SENTINEL_OWNERS};

/// How `removeOwner`/`swapOwner` pick the previous owner. `Strict` refuses
/// when the sorted and on-chain orders disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredecessorPolicy {
    #[default]
    Sorted,
    OnChain,
    Strict,
}

impl std::str::FromStr for PredecessorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sorted" => Ok(PredecessorPolicy::Sorted),
            "on_chain" | "onchain" | "on-chain" => Ok(PredecessorPolicy::OnChain),
            "strict" => Ok(PredecessorPolicy::Strict),
            other => Err(format!("unknown predecessor policy '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnerChange {
    AddOwner {
        owner: Address,
        threshold: u64,
    },
    RemoveOwner {
        prev_owner: Address,
        owner: Address,
        threshold: u64,
    },
    SwapOwner {
        prev_owner: Address,
        old_owner: Address,
        new_owner: Address,
    },
    ChangeThreshold {
        threshold: u64,
    },
}

impl OwnerChange {
    pub fn calldata(&self) -> Bytes {
        let encoded = match *self {
            OwnerChange::AddOwner { owner, threshold } => {
                IOwnerManager::addOwnerWithThresholdCall {
                    owner,
                    threshold: U256::from(threshold),
                }
                .abi_encode()
            }
            OwnerChange::RemoveOwner {
                prev_owner,
                owner,
                threshold,
            } => IOwnerManager::removeOwnerCall {
                prevOwner: prev_owner,
                owner,
                threshold: U256::from(threshold),
            }
            .abi_encode(),
            OwnerChange::SwapOwner {
                prev_owner,
                old_owner,
                new_owner,
            } => IOwnerManager::swapOwnerCall {
                prevOwner: prev_owner,
                oldOwner: old_owner,
                newOwner: new_owner,
            }
            .abi_encode(),
            OwnerChange::ChangeThreshold { threshold } => IOwnerManager::changeThresholdCall {
                threshold: U256::from(threshold),
            }
            .abi_encode(),
        };
        encoded.into()
    }

    pub fn method(&self) -> &'static str {
        match self {
            OwnerChange::AddOwner { .. } => "addOwnerWithThreshold",
            OwnerChange::RemoveOwner { .. } => "removeOwner",
            OwnerChange::SwapOwner { .. } => "swapOwner",
            OwnerChange::ChangeThreshold { .. } => "changeThreshold",
        }
    }
}

#[derive(Debug, Clone)]
pub struct OwnerRegistry {
    safe: Address,
    /// Owners in on-chain (linked list) order.
    owners: Vec<Address>,
    threshold: u64,
    policy: PredecessorPolicy,
}

impl OwnerRegistry {
    pub fn new(
        safe: Address,
        owners: Vec<Address>,
        threshold: u64,
        policy: PredecessorPolicy,
    ) -> Result<Self, SafeError> {
        for (index, owner) in owners.iter().enumerate() {
            if owners[..index].contains(owner) {
                return Err(SafeError::OwnerExists(*owner));
            }
        }
        if threshold < 1 || threshold as usize > owners.len() {
            return Err(SafeError::ThresholdViolation {
                threshold,
                owners: owners.len(),
            });
        }
        Ok(Self {
            safe,
            owners,
            threshold,
            policy,
        })
    }

    pub fn safe(&self) -> Address {
        self.safe
    }

    pub fn owners(&self) -> &[Address] {
        &self.owners
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    pub fn sorted_owners(&self) -> Vec<Address> {
        let mut sorted = self.owners.clone();
        sorted.sort_by_key(lower_hex);
        sorted
    }

    pub fn is_owner(&self, address: &Address) -> bool {
        self.owners.contains(address)
    }

    /// True only when every address is an owner.
    pub fn are_owners(&self, addresses: &[Address]) -> bool {
        addresses.iter().all(|address| self.is_owner(address))
    }

    pub fn predecessor(&self, owner: &Address) -> Result<Address, SafeError> {
        let sorted = predecessor_in(&self.sorted_owners(), owner)
            .ok_or(SafeError::OwnerNotFound(*owner))?;
        let on_chain =
            predecessor_in(&self.owners, owner).ok_or(SafeError::OwnerNotFound(*owner))?;

        if sorted != on_chain {
            warn!(
                "safe: predecessor mismatch safe={} owner={} sorted={} on_chain={} policy={:?}",
                self.safe, owner, sorted, on_chain, self.policy
            );
        }

        match self.policy {
            PredecessorPolicy::Sorted => Ok(sorted),
            PredecessorPolicy::OnChain => Ok(on_chain),
            PredecessorPolicy::Strict if sorted == on_chain => Ok(sorted),
            PredecessorPolicy::Strict => Err(SafeError::PredecessorMismatch {
                owner: *owner,
                sorted,
                on_chain,
            }),
        }
    }

    pub fn add_owner(
        &self,
        owner: Address,
        new_threshold: Option<u64>,
    ) -> Result<OwnerChange, SafeError> {
        if owner == Address::ZERO || owner == SENTINEL_OWNERS || owner == self.safe {
            return Err(SafeError::InvalidOwner(owner));
        }
        if self.is_owner(&owner) {
            return Err(SafeError::OwnerExists(owner));
        }
        let threshold = new_threshold.unwrap_or(self.threshold);
        self.check_threshold(threshold, self.owners.len() + 1)?;
        debug!("safe: staged add_owner safe={} owner={owner} threshold={threshold}", self.safe);
        Ok(OwnerChange::AddOwner { owner, threshold })
    }

    pub fn remove_owner(
        &self,
        owner: Address,
        new_threshold: Option<u64>,
    ) -> Result<OwnerChange, SafeError> {
        let prev_owner = self.predecessor(&owner)?;
        let threshold = new_threshold.unwrap_or(self.threshold);
        self.check_threshold(threshold, self.owners.len() - 1)?;
        debug!(
            "safe: staged remove_owner safe={} prev={prev_owner} owner={owner} threshold={threshold}",
            self.safe
        );
        Ok(OwnerChange::RemoveOwner {
            prev_owner,
            owner,
            threshold,
        })
    }

    pub fn swap_owner(
        &self,
        old_owner: Address,
        new_owner: Address,
    ) -> Result<OwnerChange, SafeError> {
        if !self.is_owner(&old_owner) {
            return Err(SafeError::OwnerNotFound(old_owner));
        }
        if self.is_owner(&new_owner) {
            return Err(SafeError::OwnerExists(new_owner));
        }
        if new_owner == Address::ZERO || new_owner == SENTINEL_OWNERS || new_owner == self.safe {
            return Err(SafeError::InvalidOwner(new_owner));
        }
        let prev_owner = self.predecessor(&old_owner)?;
        debug!(
            "safe: staged swap_owner safe={} prev={prev_owner} old={old_owner} new={new_owner}",
            self.safe
        );
        Ok(OwnerChange::SwapOwner {
            prev_owner,
            old_owner,
            new_owner,
        })
    }

    pub fn change_threshold(&self, threshold: u64) -> Result<OwnerChange, SafeError> {
        self.check_threshold(threshold, self.owners.len())?;
        Ok(OwnerChange::ChangeThreshold { threshold })
    }

    fn check_threshold(&self, threshold: u64, owners: usize) -> Result<(), SafeError> {
        if threshold < 1 || threshold as usize > owners {
            return Err(SafeError::ThresholdViolation { threshold, owners });
        }
        Ok(())
    }
}

fn predecessor_in(list: &[Address], owner: &Address) -> Option<Address> {
    let index = list.iter().position(|candidate| candidate == owner)?;
    Some(if index == 0 {
        SENTINEL_OWNERS
    } else {
        list[index - 1]
    })
}

#[cfg(test)]
#[path = "tests/owners_tests.rs"]
mod tests;
