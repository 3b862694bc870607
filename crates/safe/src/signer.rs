use std::{collections::BTreeMap, str::FromStr};

use alloy::{primitives::Address, signers::local::PrivateKeySigner};
use tracing::info;

use crate::SafeError;

/// Local signer identities available to the console, keyed by address.
#[derive(Debug, Clone, Default)]
pub struct LocalSigners {
    signers: BTreeMap<Address, PrivateKeySigner>,
}

impl LocalSigners {
    pub fn from_keys<I, S>(keys: I) -> Result<Self, SafeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut signers = Self::default();
        for key in keys {
            signers.load(key.as_ref())?;
        }
        Ok(signers)
    }

    /// Parses a hex private key and registers its signer. Returns the signer address.
    pub fn load(&mut self, private_key: &str) -> Result<Address, SafeError> {
        let signer = PrivateKeySigner::from_str(private_key.trim())
            .map_err(|err| SafeError::InvalidKey(err.to_string()))?;
        let address = signer.address();
        self.signers.insert(address, signer);
        info!("signer: loaded address={address}");
        Ok(address)
    }

    pub fn unload(&mut self, address: &Address) -> bool {
        self.signers.remove(address).is_some()
    }

    pub fn get(&self, address: &Address) -> Option<&PrivateKeySigner> {
        self.signers.get(address)
    }

    /// Signer addresses in ascending order.
    pub fn addresses(&self) -> Vec<Address> {
        self.signers.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Address, &PrivateKeySigner)> {
        self.signers.iter()
    }

    pub fn len(&self) -> usize {
        self.signers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signers.is_empty()
    }
}
