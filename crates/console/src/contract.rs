//! Contract artifacts and the typed method registry behind the contract console.

use std::{collections::BTreeMap, fmt, str::FromStr};

use alloy::{
    primitives::{hex, Address, Bytes, B256, U256},
    sol_types::SolCall,
};
use safe::abi::{IOwnerManager, IERC20, ISafe};
use serde::Deserialize;

use crate::error::{invalid, ConsoleError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractInterface {
    #[default]
    Safe,
    Erc20,
}

impl ContractInterface {
    pub fn as_str(self) -> &'static str {
        match self {
            ContractInterface::Safe => "safe",
            ContractInterface::Erc20 => "erc20",
        }
    }
}

impl fmt::Display for ContractInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A contract loaded into the contract console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractArtifact {
    pub alias: String,
    pub address: Address,
    pub interface: ContractInterface,
}

type Encoder = Box<dyn Fn(&[String]) -> Result<Bytes, ConsoleError> + Send + Sync>;

pub struct ContractMethod {
    signature: &'static str,
    arity: usize,
    read_only: bool,
    encode: Encoder,
}

impl ContractMethod {
    pub fn name(&self) -> &'static str {
        self.signature
            .split_once('(')
            .map_or(self.signature, |(name, _)| name)
    }

    pub fn signature(&self) -> &'static str {
        self.signature
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn encode(&self, args: &[String]) -> Result<Bytes, ConsoleError> {
        if args.len() != self.arity {
            return Err(invalid(format!(
                "{} expects {} argument(s), got {}",
                self.signature,
                self.arity,
                args.len()
            )));
        }
        (self.encode)(args)
    }
}

impl fmt::Debug for ContractMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContractMethod")
            .field("signature", &self.signature)
            .field("read_only", &self.read_only)
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct MethodRegistry {
    methods: BTreeMap<&'static str, ContractMethod>,
}

impl MethodRegistry {
    pub fn for_interface(interface: ContractInterface) -> Self {
        let mut registry = Self::default();
        match interface {
            ContractInterface::Safe => registry.register_safe(),
            ContractInterface::Erc20 => registry.register_erc20(),
        }
        registry
    }

    pub fn get(&self, name: &str) -> Option<&ContractMethod> {
        self.methods.get(name)
    }

    pub fn methods(&self) -> impl Iterator<Item = &ContractMethod> {
        self.methods.values()
    }

    fn register<C, F>(&mut self, arity: usize, read_only: bool, bind: F)
    where
        C: SolCall,
        F: Fn(&[String]) -> Result<C, ConsoleError> + Send + Sync + 'static,
    {
        let method = ContractMethod {
            signature: C::SIGNATURE,
            arity,
            read_only,
            encode: Box::new(move |args: &[String]| {
                bind(args).map(|call| Bytes::from(call.abi_encode()))
            }),
        };
        self.methods.insert(method.name(), method);
    }

    fn register_safe(&mut self) {
        self.register(0, true, |_| Ok(IOwnerManager::getOwnersCall {}));
        self.register(0, true, |_| Ok(IOwnerManager::getThresholdCall {}));
        self.register(1, true, |args| {
            Ok(IOwnerManager::isOwnerCall {
                owner: arg_address(&args[0])?,
            })
        });
        self.register(2, false, |args| {
            Ok(IOwnerManager::addOwnerWithThresholdCall {
                owner: arg_address(&args[0])?,
                threshold: arg_uint(&args[1])?,
            })
        });
        self.register(3, false, |args| {
            Ok(IOwnerManager::removeOwnerCall {
                prevOwner: arg_address(&args[0])?,
                owner: arg_address(&args[1])?,
                threshold: arg_uint(&args[2])?,
            })
        });
        self.register(3, false, |args| {
            Ok(IOwnerManager::swapOwnerCall {
                prevOwner: arg_address(&args[0])?,
                oldOwner: arg_address(&args[1])?,
                newOwner: arg_address(&args[2])?,
            })
        });
        self.register(1, false, |args| {
            Ok(IOwnerManager::changeThresholdCall {
                threshold: arg_uint(&args[0])?,
            })
        });
        self.register(0, true, |_| Ok(ISafe::nonceCall {}));
        self.register(0, true, |_| Ok(ISafe::VERSIONCall {}));
        self.register(0, true, |_| Ok(ISafe::NAMECall {}));
        self.register(0, true, |_| Ok(ISafe::domainSeparatorCall {}));
        self.register(1, false, |args| {
            Ok(ISafe::approveHashCall {
                hashToApprove: arg_b256(&args[0])?,
            })
        });
    }

    fn register_erc20(&mut self) {
        self.register(2, false, |args| {
            Ok(IERC20::transferCall {
                to: arg_address(&args[0])?,
                amount: arg_uint(&args[1])?,
            })
        });
        self.register(2, false, |args| {
            Ok(IERC20::approveCall {
                spender: arg_address(&args[0])?,
                amount: arg_uint(&args[1])?,
            })
        });
        self.register(3, false, |args| {
            Ok(IERC20::transferFromCall {
                from: arg_address(&args[0])?,
                to: arg_address(&args[1])?,
                amount: arg_uint(&args[2])?,
            })
        });
        self.register(1, true, |args| {
            Ok(IERC20::balanceOfCall {
                account: arg_address(&args[0])?,
            })
        });
        self.register(2, true, |args| {
            Ok(IERC20::allowanceCall {
                owner: arg_address(&args[0])?,
                spender: arg_address(&args[1])?,
            })
        });
        self.register(0, true, |_| Ok(IERC20::decimalsCall {}));
        self.register(0, true, |_| Ok(IERC20::symbolCall {}));
    }
}

/// How an encoded contract call should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallMode {
    Query,
    Execute,
    Queue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedCall {
    pub signature: &'static str,
    pub to: Address,
    pub from: Option<Address>,
    pub data: Bytes,
}

pub(crate) fn arg_address(raw: &str) -> Result<Address, ConsoleError> {
    Address::from_str(raw).map_err(|err| invalid(format!("'{raw}' is not an address: {err}")))
}

/// Decimal or `0x` hex.
pub(crate) fn arg_uint(raw: &str) -> Result<U256, ConsoleError> {
    let parsed = match raw.strip_prefix("0x") {
        Some(digits) => U256::from_str_radix(digits, 16),
        None => U256::from_str_radix(raw, 10),
    };
    parsed.map_err(|err| invalid(format!("'{raw}' is not an unsigned integer: {err}")))
}

pub(crate) fn arg_b256(raw: &str) -> Result<B256, ConsoleError> {
    B256::from_str(raw).map_err(|err| invalid(format!("'{raw}' is not a 32-byte hash: {err}")))
}

pub(crate) fn arg_bytes(raw: &str) -> Result<Bytes, ConsoleError> {
    hex::decode(raw)
        .map(Bytes::from)
        .map_err(|err| invalid(format!("'{raw}' is not hex data: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_names_follow_abi_signatures() {
        let registry = MethodRegistry::for_interface(ContractInterface::Safe);
        let method = registry.get("changeThreshold").expect("method");
        assert_eq!(method.signature(), "changeThreshold(uint256)");
        assert!(!method.is_read_only());
        assert!(registry.get("getOwners").expect("getter").is_read_only());
        assert!(registry.get("transfer").is_none());
    }

    #[test]
    fn change_threshold_binds_and_encodes() {
        let registry = MethodRegistry::for_interface(ContractInterface::Safe);
        let data = registry
            .get("changeThreshold")
            .expect("method")
            .encode(&["2".into()])
            .expect("encode");
        assert_eq!(&data[..4], &[0x69, 0x4e, 0x80, 0xc3]);
        assert_eq!(data.len(), 4 + 32);
        assert_eq!(data[35], 2);
    }

    #[test]
    fn erc20_transfer_binds_positionally() {
        let registry = MethodRegistry::for_interface(ContractInterface::Erc20);
        let to = Address::repeat_byte(0x77);
        let data = registry
            .get("transfer")
            .expect("method")
            .encode(&[to.to_string(), "0x10".into()])
            .expect("encode");
        assert_eq!(&data[16..36], to.as_slice());
        assert_eq!(data[67], 0x10);
    }

    #[test]
    fn arity_and_type_mismatches_are_rejected() {
        let registry = MethodRegistry::for_interface(ContractInterface::Safe);
        let is_owner = registry.get("isOwner").expect("method");
        assert!(matches!(
            is_owner.encode(&[]),
            Err(ConsoleError::InvalidArgument(_))
        ));
        assert!(matches!(
            is_owner.encode(&["treasury".into()]),
            Err(ConsoleError::InvalidArgument(_))
        ));
    }

    #[test]
    fn uint_accepts_decimal_and_hex() {
        assert_eq!(arg_uint("255").expect("dec"), U256::from(255));
        assert_eq!(arg_uint("0xff").expect("hex"), U256::from(255));
        assert!(arg_uint("-1").is_err());
        assert_eq!(arg_bytes("0x").expect("empty"), Bytes::new());
    }
}
