use std::{fs, path::Path, str::FromStr};

use alloy::primitives::{Address, U256};
use safe::{PredecessorPolicy, SafeSnapshot, StaticSafeReader};
use serde::Deserialize;
use shared::domain::Network;

use crate::{contract::ContractInterface, error::ConsoleError};

pub const DEFAULT_SETTINGS_FILE: &str = "safe-console.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub network: Network,
    /// Overrides the network's hosted relay.
    pub service_url: Option<String>,
    pub origin: String,
    pub signer_keys: Vec<String>,
    pub predecessor: PredecessorPolicy,
    pub contracts: Vec<ContractSettings>,
    pub safes: Vec<SafeSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            network: Network::default(),
            service_url: None,
            origin: "Safe-CLI".into(),
            signer_keys: Vec::new(),
            predecessor: PredecessorPolicy::default(),
            contracts: Vec::new(),
            safes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContractSettings {
    pub alias: String,
    pub address: String,
    #[serde(default)]
    pub interface: ContractInterface,
}

/// Known Safe state served to the console when no chain reader is wired in.
#[derive(Debug, Clone, Deserialize)]
pub struct SafeSettings {
    pub address: String,
    pub owners: Vec<String>,
    pub threshold: u64,
    #[serde(default)]
    pub nonce: u64,
    #[serde(default = "default_safe_version")]
    pub version: String,
    #[serde(default = "default_safe_name")]
    pub name: String,
}

fn default_safe_version() -> String {
    "1.3.0".into()
}

fn default_safe_name() -> String {
    "Gnosis Safe".into()
}

impl Settings {
    /// Relay base URL for `network`: the configured override, else the hosted relay.
    pub fn service_url(&self, network: Network) -> Option<String> {
        self.service_url
            .clone()
            .or_else(|| network.default_service_url().map(str::to_string))
    }

    pub fn contract(&self, alias: &str) -> Option<&ContractSettings> {
        self.contracts.iter().find(|contract| contract.alias == alias)
    }

    pub fn static_reader(&self) -> Result<StaticSafeReader, ConsoleError> {
        let mut snapshots = Vec::with_capacity(self.safes.len());
        for entry in &self.safes {
            let owners = entry
                .owners
                .iter()
                .map(|owner| parse_config_address(owner))
                .collect::<Result<Vec<_>, _>>()?;
            snapshots.push((
                parse_config_address(&entry.address)?,
                SafeSnapshot {
                    owners,
                    threshold: entry.threshold,
                    nonce: U256::from(entry.nonce),
                    version: entry.version.clone(),
                    name: entry.name.clone(),
                },
            ));
        }
        Ok(StaticSafeReader::new(snapshots))
    }
}

pub(crate) fn parse_config_address(raw: &str) -> Result<Address, ConsoleError> {
    Address::from_str(raw.trim())
        .map_err(|err| ConsoleError::Config(format!("invalid address '{raw}': {err}")))
}

/// Defaults, then the settings file, then `SAFE_CONSOLE_*` environment overrides.
///
/// A missing default file is fine; a missing explicit `path` is an error.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConsoleError> {
    let mut settings = match path {
        Some(path) => read_settings_file(path)?,
        None => {
            let default_path = Path::new(DEFAULT_SETTINGS_FILE);
            if default_path.exists() {
                read_settings_file(default_path)?
            } else {
                Settings::default()
            }
        }
    };
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok())?;
    Ok(settings)
}

fn read_settings_file(path: &Path) -> Result<Settings, ConsoleError> {
    let raw = fs::read_to_string(path)
        .map_err(|err| ConsoleError::Config(format!("{}: {err}", path.display())))?;
    parse_settings(&raw).map_err(|err| match err {
        ConsoleError::Config(message) => {
            ConsoleError::Config(format!("{}: {message}", path.display()))
        }
        other => other,
    })
}

pub fn parse_settings(raw: &str) -> Result<Settings, ConsoleError> {
    toml::from_str(raw).map_err(|err| ConsoleError::Config(err.to_string()))
}

pub fn apply_env_overrides<F>(settings: &mut Settings, lookup: F) -> Result<(), ConsoleError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("SAFE_CONSOLE_NETWORK") {
        settings.network =
            Network::from_str(&v).map_err(|err| ConsoleError::Config(err.to_string()))?;
    }
    if let Some(v) = lookup("SAFE_CONSOLE_SERVICE_URL") {
        settings.service_url = Some(v);
    }
    if let Some(v) = lookup("SAFE_CONSOLE_ORIGIN") {
        settings.origin = v;
    }
    if let Some(v) = lookup("SAFE_CONSOLE_SIGNER_KEYS") {
        settings.signer_keys = v
            .split(',')
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .collect();
    }
    if let Some(v) = lookup("SAFE_CONSOLE_PREDECESSOR") {
        settings.predecessor = PredecessorPolicy::from_str(&v).map_err(ConsoleError::Config)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use safe::SafeStateReader;

    use super::*;

    const SAMPLE: &str = r#"
network = "goerli"
origin = "ops-console"
predecessor = "on_chain"

[[contracts]]
alias = "treasury"
address = "0x5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a"
interface = "safe"

[[safes]]
address = "0x5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a"
owners = ["0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb"]
threshold = 2
nonce = 7
"#;

    #[test]
    fn defaults_target_ganache() {
        let settings = Settings::default();
        assert_eq!(settings.network, Network::Ganache);
        assert_eq!(settings.origin, "Safe-CLI");
        assert_eq!(settings.predecessor, PredecessorPolicy::Sorted);
        assert_eq!(settings.service_url(settings.network), None);
    }

    #[test]
    fn parses_settings_file() {
        let settings = parse_settings(SAMPLE).expect("settings");
        assert_eq!(settings.network, Network::Goerli);
        assert_eq!(settings.origin, "ops-console");
        assert_eq!(settings.predecessor, PredecessorPolicy::OnChain);
        assert_eq!(
            settings.contract("treasury").map(|c| c.interface),
            Some(ContractInterface::Safe)
        );
        assert_eq!(
            settings.service_url(settings.network).as_deref(),
            Network::Goerli.default_service_url()
        );
    }

    #[tokio::test]
    async fn configured_safes_feed_the_static_reader() {
        let settings = parse_settings(SAMPLE).expect("settings");
        let reader = settings.static_reader().expect("reader");
        let snapshot = reader
            .snapshot(Address::repeat_byte(0x5a))
            .await
            .expect("snapshot");
        assert_eq!(snapshot.owners.len(), 2);
        assert_eq!(snapshot.nonce, U256::from(7));
        assert_eq!(snapshot.version, "1.3.0");
    }

    #[test]
    fn env_overrides_win_over_file() {
        let mut settings = parse_settings(SAMPLE).expect("settings");
        let env: HashMap<&str, &str> = [
            ("SAFE_CONSOLE_NETWORK", "mainnet"),
            ("SAFE_CONSOLE_SERVICE_URL", "http://127.0.0.1:8000"),
            ("SAFE_CONSOLE_SIGNER_KEYS", "0x01, ,0x02"),
            ("SAFE_CONSOLE_PREDECESSOR", "strict"),
        ]
        .into_iter()
        .collect();
        apply_env_overrides(&mut settings, |key| env.get(key).map(|v| v.to_string()))
            .expect("overrides");
        assert_eq!(settings.network, Network::Mainnet);
        assert_eq!(
            settings.service_url(Network::Ganache).as_deref(),
            Some("http://127.0.0.1:8000")
        );
        assert_eq!(settings.signer_keys, vec!["0x01", "0x02"]);
        assert_eq!(settings.predecessor, PredecessorPolicy::Strict);
    }

    #[test]
    fn bad_values_are_config_errors() {
        let mut settings = Settings::default();
        let err = apply_env_overrides(&mut settings, |key| {
            (key == "SAFE_CONSOLE_NETWORK").then(|| "atlantis".to_string())
        })
        .expect_err("must fail");
        assert!(matches!(err, ConsoleError::Config(_)));

        let mut bad = parse_settings(SAMPLE).expect("settings");
        bad.safes[0].owners.push("0xnothex".into());
        assert!(matches!(bad.static_reader(), Err(ConsoleError::Config(_))));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let err = load_settings(Some(Path::new("/nonexistent/safe-console.toml")))
            .expect_err("must fail");
        assert!(matches!(err, ConsoleError::Config(_)));
    }
}
