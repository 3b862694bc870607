use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Network {
    Mainnet,
    Rinkeby,
    Goerli,
    Xdai,
    Volta,
    EnergyWebChain,
    Matic,
    Arbitrum,
    Binance,
    #[default]
    Ganache,
}

impl Network {
    pub const ALL: [Network; 10] = [
        Network::Mainnet,
        Network::Rinkeby,
        Network::Goerli,
        Network::Xdai,
        Network::Volta,
        Network::EnergyWebChain,
        Network::Matic,
        Network::Arbitrum,
        Network::Binance,
        Network::Ganache,
    ];

    pub fn chain_id(self) -> u64 {
        match self {
            Network::Mainnet => 1,
            Network::Rinkeby => 4,
            Network::Goerli => 5,
            Network::Xdai => 100,
            Network::Volta => 73799,
            Network::EnergyWebChain => 246,
            Network::Matic => 137,
            Network::Arbitrum => 42161,
            Network::Binance => 56,
            Network::Ganache => 1337,
        }
    }

    /// Base URL of the hosted transaction relay, if one exists for this network.
    pub fn default_service_url(self) -> Option<&'static str> {
        match self {
            Network::Mainnet => Some("https://safe-transaction.mainnet.gnosis.io"),
            Network::Rinkeby => Some("https://safe-transaction.rinkeby.gnosis.io"),
            Network::Goerli => Some("https://safe-transaction.goerli.gnosis.io"),
            Network::Xdai => Some("https://safe-transaction.xdai.gnosis.io"),
            Network::Volta => Some("https://safe-transaction.volta.gnosis.io"),
            Network::EnergyWebChain => Some("https://safe-transaction.ewc.gnosis.io"),
            Network::Matic => Some("https://safe-transaction.polygon.gnosis.io"),
            Network::Arbitrum => Some("https://safe-transaction.arbitrum.gnosis.io"),
            Network::Binance => Some("https://safe-transaction.bsc.gnosis.io"),
            Network::Ganache => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Rinkeby => "rinkeby",
            Network::Goerli => "goerli",
            Network::Xdai => "xdai",
            Network::Volta => "volta",
            Network::EnergyWebChain => "energy_web_chain",
            Network::Matic => "matic",
            Network::Arbitrum => "arbitrum",
            Network::Binance => "binance",
            Network::Ganache => "ganache",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown network '{0}'")]
pub struct UnknownNetwork(pub String);

impl FromStr for Network {
    type Err = UnknownNetwork;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        let network = match normalized.as_str() {
            "mainnet" => Network::Mainnet,
            "rinkeby" => Network::Rinkeby,
            "goerli" => Network::Goerli,
            "xdai" => Network::Xdai,
            "volta" => Network::Volta,
            "energy_web_chain" | "ewc" => Network::EnergyWebChain,
            "matic" | "polygon" => Network::Matic,
            "arbitrum" => Network::Arbitrum,
            "binance" | "bsc" => Network::Binance,
            "ganache" => Network::Ganache,
            _ => return Err(UnknownNetwork(s.to_string())),
        };
        Ok(network)
    }
}

/// How a Safe transaction reaches its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    #[default]
    Call,
    DelegateCall,
}

impl Operation {
    pub fn as_u8(self) -> u8 {
        match self {
            Operation::Call => 0,
            Operation::DelegateCall => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_names_round_trip_through_from_str() {
        for network in Network::ALL {
            assert_eq!(network.as_str().parse::<Network>().expect("parse"), network);
        }
    }

    #[test]
    fn network_aliases_are_accepted() {
        assert_eq!("Polygon".parse::<Network>().expect("parse"), Network::Matic);
        assert_eq!("energy-web-chain".parse::<Network>().expect("parse"), Network::EnergyWebChain);
        assert!("moonbase".parse::<Network>().is_err());
    }

    #[test]
    fn only_ganache_lacks_a_hosted_relay() {
        let missing: Vec<_> = Network::ALL
            .into_iter()
            .filter(|n| n.default_service_url().is_none())
            .collect();
        assert_eq!(missing, vec![Network::Ganache]);
    }
}
