//! Safe transaction assembly, EIP-712 hashing and signature aggregation.

use std::collections::BTreeMap;

use alloy::{
    primitives::{hex, keccak256, Address, Bytes, Signature, B256, U256},
    signers::{local::PrivateKeySigner, SignerSync},
};
use shared::{domain::Operation, protocol::MultisigTransactionRequest};
use tracing::{debug, info};

use crate::{abi, OwnerChange, SafeError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafeDomain {
    pub safe: Address,
    pub chain_id: u64,
    /// Safe releases from 1.3.0 onwards bind the chain id into the domain.
    pub chain_bound: bool,
}

impl SafeDomain {
    pub fn new(safe: Address, chain_id: u64) -> Self {
        Self {
            safe,
            chain_id,
            chain_bound: true,
        }
    }

    pub fn for_version(safe: Address, chain_id: u64, version: &str) -> Self {
        let mut parts = version
            .trim()
            .trim_start_matches('v')
            .split('.')
            .map(|part| part.parse::<u64>().unwrap_or(0));
        let major = parts.next().unwrap_or(0);
        let minor = parts.next().unwrap_or(0);
        Self {
            safe,
            chain_id,
            chain_bound: (major, minor) >= (1, 3),
        }
    }

    pub fn separator(&self) -> B256 {
        let mut encoded = Vec::with_capacity(96);
        if self.chain_bound {
            encoded.extend_from_slice(abi::domain_typehash().as_slice());
            encoded.extend_from_slice(&U256::from(self.chain_id).to_be_bytes::<32>());
        } else {
            encoded.extend_from_slice(abi::legacy_domain_typehash().as_slice());
        }
        encoded.extend_from_slice(&address_word(self.safe));
        keccak256(encoded)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionIntent {
    OwnerChange(OwnerChange),
    EtherTransfer {
        to: Address,
        value: U256,
    },
    Call {
        to: Address,
        value: U256,
        data: Bytes,
        operation: Operation,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeTxFields {
    pub to: Address,
    pub value: U256,
    pub data: Bytes,
    pub operation: Operation,
    pub safe_tx_gas: U256,
    pub base_gas: U256,
    pub gas_price: U256,
    pub gas_token: Address,
    pub refund_receiver: Address,
    pub nonce: U256,
}

impl SafeTxFields {
    fn struct_hash(&self) -> B256 {
        let mut encoded = Vec::with_capacity(11 * 32);
        encoded.extend_from_slice(abi::safe_tx_typehash().as_slice());
        encoded.extend_from_slice(&address_word(self.to));
        encoded.extend_from_slice(&self.value.to_be_bytes::<32>());
        encoded.extend_from_slice(keccak256(&self.data).as_slice());
        encoded.extend_from_slice(&U256::from(self.operation.as_u8()).to_be_bytes::<32>());
        encoded.extend_from_slice(&self.safe_tx_gas.to_be_bytes::<32>());
        encoded.extend_from_slice(&self.base_gas.to_be_bytes::<32>());
        encoded.extend_from_slice(&self.gas_price.to_be_bytes::<32>());
        encoded.extend_from_slice(&address_word(self.gas_token));
        encoded.extend_from_slice(&address_word(self.refund_receiver));
        encoded.extend_from_slice(&self.nonce.to_be_bytes::<32>());
        keccak256(encoded)
    }
}

/// Signatures are keyed by signer address so they finalize in ascending order.
#[derive(Debug, Clone)]
pub struct SafeTransaction {
    domain: SafeDomain,
    fields: SafeTxFields,
    hash: B256,
    signatures: BTreeMap<Address, Signature>,
}

impl SafeTransaction {
    pub fn build(domain: SafeDomain, nonce: U256, intent: TransactionIntent) -> Self {
        let (to, value, data, operation) = match intent {
            TransactionIntent::OwnerChange(change) => {
                (domain.safe, U256::ZERO, change.calldata(), Operation::Call)
            }
            TransactionIntent::EtherTransfer { to, value } => {
                (to, value, Bytes::new(), Operation::Call)
            }
            TransactionIntent::Call {
                to,
                value,
                data,
                operation,
            } => (to, value, data, operation),
        };
        Self::from_fields(
            domain,
            SafeTxFields {
                to,
                value,
                data,
                operation,
                safe_tx_gas: U256::ZERO,
                base_gas: U256::ZERO,
                gas_price: U256::ZERO,
                gas_token: Address::ZERO,
                refund_receiver: Address::ZERO,
                nonce,
            },
        )
    }

    pub fn from_fields(domain: SafeDomain, fields: SafeTxFields) -> Self {
        let hash = signing_hash(&domain, &fields);
        debug!(
            "tx: built safe={} to={} nonce={} hash={hash}",
            domain.safe, fields.to, fields.nonce
        );
        Self {
            domain,
            fields,
            hash,
            signatures: BTreeMap::new(),
        }
    }

    pub fn domain(&self) -> &SafeDomain {
        &self.domain
    }

    pub fn fields(&self) -> &SafeTxFields {
        &self.fields
    }

    /// The `contractTransactionHash` every owner signs.
    pub fn hash(&self) -> B256 {
        self.hash
    }

    pub fn signers(&self) -> Vec<Address> {
        self.signatures.keys().copied().collect()
    }

    pub fn signature_count(&self) -> usize {
        self.signatures.len()
    }

    pub fn sign_with(&mut self, signer: &PrivateKeySigner) -> Result<Address, SafeError> {
        let signature = signer.sign_hash_sync(&self.hash)?;
        let address = signer.address();
        self.add_signature(address, signature)?;
        Ok(address)
    }

    pub fn add_signature(
        &mut self,
        signer: Address,
        signature: Signature,
    ) -> Result<(), SafeError> {
        let recovered = signature
            .recover_address_from_prehash(&self.hash)
            .map_err(|err| SafeError::Signing(err.to_string()))?;
        if recovered != signer {
            return Err(SafeError::Signing(format!(
                "signature recovers to {recovered}, expected {signer}"
            )));
        }
        self.signatures.insert(signer, signature);
        info!(
            "tx: signature collected hash={} signer={signer} total={}",
            self.hash,
            self.signatures.len()
        );
        Ok(())
    }

    /// Concatenates the collected signatures once `threshold` distinct signers are present.
    pub fn finalize(&self, threshold: u64) -> Result<FinalizedTransaction, SafeError> {
        let collected = self.signatures.len();
        if (collected as u64) < threshold {
            return Err(SafeError::ThresholdNotMet {
                required: threshold,
                collected,
            });
        }
        let mut packed = Vec::with_capacity(collected * 65);
        for signature in self.signatures.values() {
            packed.extend_from_slice(&signature.as_bytes());
        }
        let sender = self
            .signatures
            .keys()
            .next()
            .copied()
            .ok_or(SafeError::ThresholdNotMet {
                required: threshold.max(1),
                collected,
            })?;
        Ok(FinalizedTransaction {
            transaction: self.clone(),
            signatures: packed.into(),
            sender,
        })
    }
}

#[derive(Debug, Clone)]
pub struct FinalizedTransaction {
    pub transaction: SafeTransaction,
    pub signatures: Bytes,
    pub sender: Address,
}

impl FinalizedTransaction {
    pub fn safe(&self) -> Address {
        self.transaction.domain.safe
    }

    pub fn hash(&self) -> B256 {
        self.transaction.hash
    }

    pub fn to_request(&self, origin: &str) -> MultisigTransactionRequest {
        let fields = &self.transaction.fields;
        MultisigTransactionRequest {
            to: fields.to.to_checksum(None),
            value: fields.value.to_string(),
            data: (!fields.data.is_empty()).then(|| hex::encode_prefixed(&fields.data)),
            operation: fields.operation.as_u8(),
            gas_token: fields.gas_token.to_checksum(None),
            safe_tx_gas: fields.safe_tx_gas.to_string(),
            base_gas: fields.base_gas.to_string(),
            gas_price: fields.gas_price.to_string(),
            refund_receiver: fields.refund_receiver.to_checksum(None),
            nonce: fields.nonce.to_string(),
            contract_transaction_hash: hex::encode_prefixed(self.transaction.hash),
            sender: self.sender.to_checksum(None),
            signature: Some(hex::encode_prefixed(&self.signatures)),
            origin: origin.to_string(),
        }
    }
}

fn signing_hash(domain: &SafeDomain, fields: &SafeTxFields) -> B256 {
    let mut encoded = Vec::with_capacity(66);
    encoded.extend_from_slice(&[0x19, 0x01]);
    encoded.extend_from_slice(domain.separator().as_slice());
    encoded.extend_from_slice(fields.struct_hash().as_slice());
    keccak256(encoded)
}

fn address_word(address: Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_slice());
    word
}

#[cfg(test)]
#[path = "tests/transaction_tests.rs"]
mod tests;
