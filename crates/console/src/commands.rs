//! Command tables for the general and Safe consoles.
//!
//! Each table maps a command identifier to a kind; [`GeneralCommand::resolve`]
//! and [`SafeCommand::resolve`] then bind the parsed arguments into a typed
//! command. Owner-management commands require priority group 1 and read their
//! arguments positionally: address first, then the optional threshold.

use alloy::primitives::{Address, Bytes, U256};
use shared::domain::Network;

use crate::{
    contract::{arg_address, arg_bytes, arg_uint},
    error::{invalid, ConsoleError},
    parser::Command,
};

pub const EXIT_COMMANDS: [&str; 3] = ["close", "quit", "exit"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneralKind {
    About,
    Help,
    ViewNetwork,
    SetNetwork,
    ViewContracts,
    ViewAccounts,
    LoadContract,
    LoadSafe,
}

pub const GENERAL_TABLE: &[(&str, GeneralKind)] = &[
    ("about", GeneralKind::About),
    ("info", GeneralKind::Help),
    ("help", GeneralKind::Help),
    ("viewNetwork", GeneralKind::ViewNetwork),
    ("setNetwork", GeneralKind::SetNetwork),
    ("viewContracts", GeneralKind::ViewContracts),
    ("viewAccounts", GeneralKind::ViewAccounts),
    ("loadContract", GeneralKind::LoadContract),
    ("loadSafe", GeneralKind::LoadSafe),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneralCommand {
    About,
    Help,
    ViewNetwork,
    SetNetwork(Network),
    ViewContracts,
    ViewAccounts,
    LoadContract { alias: String },
    LoadSafe { address: Address },
}

impl GeneralCommand {
    pub fn resolve(kind: GeneralKind, command: &Command) -> Result<Self, ConsoleError> {
        Ok(match kind {
            GeneralKind::About => GeneralCommand::About,
            GeneralKind::Help => GeneralCommand::Help,
            GeneralKind::ViewNetwork => GeneralCommand::ViewNetwork,
            GeneralKind::SetNetwork => {
                let raw = required(command, 0, "--network=<name>")?;
                let network = raw
                    .parse::<Network>()
                    .map_err(|err| invalid(err.to_string()))?;
                GeneralCommand::SetNetwork(network)
            }
            GeneralKind::ViewContracts => GeneralCommand::ViewContracts,
            GeneralKind::ViewAccounts => GeneralCommand::ViewAccounts,
            GeneralKind::LoadContract => {
                if command.is_typed() {
                    return Err(invalid("loadContract expects an alias, not a literal"));
                }
                GeneralCommand::LoadContract {
                    alias: required(command, 0, "--alias=<name>")?.to_string(),
                }
            }
            GeneralKind::LoadSafe => GeneralCommand::LoadSafe {
                address: typed_address(command, 0, "--address=0x...")?,
            },
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafeKind {
    Info,
    GetOwners,
    GetThreshold,
    IsOwner,
    AreOwners,
    Nonce,
    Version,
    Name,
    Refresh,
    AddOwner,
    AddOwnerWithThreshold,
    RemoveOwner,
    SwapOwner,
    ChangeThreshold,
    LoadOwner,
    UnloadOwner,
    ViewOwners,
    SendEther,
    SendTransaction,
    ViewPending,
    Sign,
    Submit,
    Discard,
    GetBalances,
    GetTransactions,
    GetDelegates,
    AddDelegate,
    RemoveDelegate,
    ViewNetwork,
    ViewAccounts,
}

pub const SAFE_TABLE: &[(&str, SafeKind)] = &[
    ("info", SafeKind::Info),
    ("getOwners", SafeKind::GetOwners),
    ("getThreshold", SafeKind::GetThreshold),
    ("isOwner", SafeKind::IsOwner),
    ("areOwners", SafeKind::AreOwners),
    ("nonce", SafeKind::Nonce),
    ("VERSION", SafeKind::Version),
    ("NAME", SafeKind::Name),
    ("refresh", SafeKind::Refresh),
    ("addOwner", SafeKind::AddOwner),
    ("addOwnerWithThreshold", SafeKind::AddOwnerWithThreshold),
    ("removeOwner", SafeKind::RemoveOwner),
    ("swapOwner", SafeKind::SwapOwner),
    ("changeOwner", SafeKind::SwapOwner),
    ("changeThreshold", SafeKind::ChangeThreshold),
    ("loadOwner", SafeKind::LoadOwner),
    ("unloadOwner", SafeKind::UnloadOwner),
    ("viewOwners", SafeKind::ViewOwners),
    ("sendEther", SafeKind::SendEther),
    ("sendTransaction", SafeKind::SendTransaction),
    ("viewPending", SafeKind::ViewPending),
    ("sign", SafeKind::Sign),
    ("submit", SafeKind::Submit),
    ("discard", SafeKind::Discard),
    ("getBalances", SafeKind::GetBalances),
    ("getTransactions", SafeKind::GetTransactions),
    ("getDelegates", SafeKind::GetDelegates),
    ("addDelegate", SafeKind::AddDelegate),
    ("removeDelegate", SafeKind::RemoveDelegate),
    ("viewNetwork", SafeKind::ViewNetwork),
    ("viewAccounts", SafeKind::ViewAccounts),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SafeCommand {
    Info,
    GetOwners,
    GetThreshold,
    IsOwner(Address),
    /// Empty means "the loaded local signers".
    AreOwners(Vec<Address>),
    Nonce,
    Version,
    Name,
    Refresh,
    AddOwner {
        owner: Address,
        threshold: Option<u64>,
    },
    RemoveOwner {
        owner: Address,
        threshold: Option<u64>,
    },
    SwapOwner {
        old_owner: Address,
        new_owner: Address,
    },
    ChangeThreshold(u64),
    LoadOwner {
        private_key: String,
    },
    UnloadOwner(Address),
    ViewOwners,
    SendEther {
        to: Address,
        value: U256,
    },
    SendTransaction {
        to: Address,
        value: U256,
        data: Bytes,
    },
    ViewPending,
    Sign,
    Submit,
    Discard,
    GetBalances,
    GetTransactions,
    GetDelegates,
    AddDelegate {
        delegate: Address,
        label: String,
        signer: Option<Address>,
    },
    RemoveDelegate {
        delegate: Address,
        signer: Option<Address>,
    },
    ViewNetwork,
    ViewAccounts,
}

impl SafeCommand {
    pub fn resolve(kind: SafeKind, command: &Command) -> Result<Self, ConsoleError> {
        Ok(match kind {
            SafeKind::Info => SafeCommand::Info,
            SafeKind::GetOwners => SafeCommand::GetOwners,
            SafeKind::GetThreshold => SafeCommand::GetThreshold,
            SafeKind::IsOwner => SafeCommand::IsOwner(typed_address(command, 0, "--address=0x...")?),
            SafeKind::AreOwners => SafeCommand::AreOwners(
                command
                    .values()
                    .map(arg_address)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            SafeKind::Nonce => SafeCommand::Nonce,
            SafeKind::Version => SafeCommand::Version,
            SafeKind::Name => SafeCommand::Name,
            SafeKind::Refresh => SafeCommand::Refresh,
            SafeKind::AddOwner => SafeCommand::AddOwner {
                owner: typed_address(command, 0, "--address=0x...")?,
                threshold: optional_u64(command, 1)?,
            },
            SafeKind::AddOwnerWithThreshold => SafeCommand::AddOwner {
                owner: typed_address(command, 0, "--address=0x... --threshold=<n>")?,
                threshold: Some(required_u64(command, 1, "--threshold=<n>")?),
            },
            SafeKind::RemoveOwner => SafeCommand::RemoveOwner {
                owner: typed_address(command, 0, "--address=0x...")?,
                threshold: optional_u64(command, 1)?,
            },
            SafeKind::SwapOwner => SafeCommand::SwapOwner {
                old_owner: typed_address(command, 0, "--old_owner=0x... --new_owner=0x...")?,
                new_owner: arg_address(required(command, 1, "--new_owner=0x...")?)?,
            },
            SafeKind::ChangeThreshold => {
                SafeCommand::ChangeThreshold(required_u64(command, 0, "--threshold=<n>")?)
            }
            SafeKind::LoadOwner => SafeCommand::LoadOwner {
                private_key: required(command, 0, "--private_key=0x...")?.to_string(),
            },
            SafeKind::UnloadOwner => {
                SafeCommand::UnloadOwner(typed_address(command, 0, "--address=0x...")?)
            }
            SafeKind::ViewOwners => SafeCommand::ViewOwners,
            SafeKind::SendEther => SafeCommand::SendEther {
                to: typed_address(command, 0, "--to=0x... --ether=<n>")?,
                value: ether_value(command)?,
            },
            SafeKind::SendTransaction => SafeCommand::SendTransaction {
                to: arg_address(named(command, "to", "--to=0x...")?)?,
                value: command
                    .flag_value("value")
                    .map(arg_uint)
                    .transpose()?
                    .unwrap_or(U256::ZERO),
                data: command
                    .flag_value("data")
                    .map(arg_bytes)
                    .transpose()?
                    .unwrap_or_default(),
            },
            SafeKind::ViewPending => SafeCommand::ViewPending,
            SafeKind::Sign => SafeCommand::Sign,
            SafeKind::Submit => SafeCommand::Submit,
            SafeKind::Discard => SafeCommand::Discard,
            SafeKind::GetBalances => SafeCommand::GetBalances,
            SafeKind::GetTransactions => SafeCommand::GetTransactions,
            SafeKind::GetDelegates => SafeCommand::GetDelegates,
            SafeKind::AddDelegate => SafeCommand::AddDelegate {
                delegate: typed_address(command, 0, "--address=0x... --label=<name>")?,
                label: named(command, "label", "--label=<name>")?.to_string(),
                signer: optional_signer(command)?,
            },
            SafeKind::RemoveDelegate => SafeCommand::RemoveDelegate {
                delegate: typed_address(command, 0, "--address=0x...")?,
                signer: optional_signer(command)?,
            },
            SafeKind::ViewNetwork => SafeCommand::ViewNetwork,
            SafeKind::ViewAccounts => SafeCommand::ViewAccounts,
        })
    }
}

pub fn lookup<K: Copy>(table: &[(&str, K)], name: &str) -> Option<K> {
    table
        .iter()
        .find(|(identifier, _)| *identifier == name)
        .map(|(_, kind)| *kind)
}

pub fn is_exit(name: &str) -> bool {
    EXIT_COMMANDS.contains(&name)
}

fn required<'a>(command: &'a Command, index: usize, usage: &str) -> Result<&'a str, ConsoleError> {
    command
        .positional(index)
        .ok_or_else(|| invalid(format!("{} needs {usage}", command.name)))
}

fn named<'a>(command: &'a Command, flag: &str, usage: &str) -> Result<&'a str, ConsoleError> {
    command
        .flag_value(flag)
        .ok_or_else(|| invalid(format!("{} needs {usage}", command.name)))
}

fn typed_address(command: &Command, index: usize, usage: &str) -> Result<Address, ConsoleError> {
    if !command.is_typed() {
        return Err(invalid(format!(
            "{} takes typed arguments: {usage}",
            command.name
        )));
    }
    arg_address(required(command, index, usage)?)
}

fn required_u64(command: &Command, index: usize, usage: &str) -> Result<u64, ConsoleError> {
    parse_u64(required(command, index, usage)?)
}

fn optional_u64(command: &Command, index: usize) -> Result<Option<u64>, ConsoleError> {
    command.positional(index).map(parse_u64).transpose()
}

fn parse_u64(raw: &str) -> Result<u64, ConsoleError> {
    let parsed = match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(digits) => u64::from_str_radix(digits, 16),
        None => raw.parse::<u64>(),
    };
    parsed.map_err(|_| invalid(format!("'{raw}' is not a threshold")))
}

fn optional_signer(command: &Command) -> Result<Option<Address>, ConsoleError> {
    command.flag_value("signer").map(arg_address).transpose()
}

/// Sums every unit flag after the recipient, e.g. `--ether=1 --gwei=500`.
fn ether_value(command: &Command) -> Result<U256, ConsoleError> {
    let mut total = U256::ZERO;
    let mut seen = false;
    for argument in command.arguments.iter().skip(1) {
        let multiplier = match argument.flag.as_str() {
            "wei" | "value" => U256::from(1u64),
            "gwei" => U256::from(1_000_000_000u64),
            "milliether" | "finney" => U256::from(1_000_000_000_000_000u64),
            "ether" => U256::from(1_000_000_000_000_000_000u64),
            other => return Err(invalid(format!("unknown unit --{other}"))),
        };
        for value in &argument.values {
            let amount = arg_uint(value)?
                .checked_mul(multiplier)
                .and_then(|amount| total.checked_add(amount))
                .ok_or_else(|| invalid("value overflows uint256"))?;
            total = amount;
            seen = true;
        }
    }
    if !seen {
        return Err(invalid(format!("{} needs a value such as --ether=1", command.name)));
    }
    Ok(total)
}

#[cfg(test)]
#[path = "tests/commands_tests.rs"]
mod tests;
