//! Console state machine. Errors that are not recoverable drop back to the general console.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use safe::{lower_hex, LocalSigners, SafeStateReader};
use service_client::{MissingTransactionService, TransactionService, TransactionServiceClient};
use shared::{domain::Network, error::ErrorReport};
use tracing::{debug, info, warn};

use crate::{
    commands::{self, GeneralCommand, GeneralKind, SafeKind, GENERAL_TABLE, SAFE_TABLE},
    config::{parse_config_address, Settings},
    contract::ContractArtifact,
    contract_session::{ContractSession, CONTRACT_TABLE},
    error::{invalid, ConsoleError},
    parser::Command,
    safe_session::SafeSession,
};

/// Builds the relay client for a network.
pub type ServiceFactory = Box<dyn Fn(Network) -> Arc<dyn TransactionService> + Send + Sync>;

pub type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeKind {
    General,
    Contract,
    Safe,
}

enum Mode {
    General,
    Contract(ContractSession),
    Safe(SafeSession),
}

#[derive(Debug, Default, Clone)]
pub struct LineOutcome {
    pub lines: Vec<String>,
    pub error: Option<ErrorReport>,
    pub exit: bool,
}

impl LineOutcome {
    fn lines(lines: Vec<String>) -> Self {
        Self {
            lines,
            ..Self::default()
        }
    }
}

pub struct ConsoleContext {
    pub settings: Settings,
    pub network: Network,
    pub signers: LocalSigners,
    pub service: Arc<dyn TransactionService>,
    pub reader: Arc<dyn SafeStateReader>,
    services: ServiceFactory,
    clock: Clock,
}

impl ConsoleContext {
    pub(crate) fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    fn set_network(&mut self, network: Network) {
        self.network = network;
        self.service = (self.services)(network);
        info!("console: network changed network={network} chain_id={}", network.chain_id());
    }

    pub(crate) fn network_lines(&self) -> Vec<String> {
        vec![format!(
            "network={} chain_id={} relay={}",
            self.network,
            self.network.chain_id(),
            self.settings
                .service_url(self.network)
                .unwrap_or_else(|| "none".into())
        )]
    }

    pub(crate) fn account_lines(&self) -> Vec<String> {
        if self.signers.is_empty() {
            return vec!["no local accounts loaded".into()];
        }
        self.signers
            .addresses()
            .iter()
            .map(|address| format!("account {}", address.to_checksum(None)))
            .collect()
    }
}

pub struct Console {
    ctx: ConsoleContext,
    mode: Mode,
}

impl Console {
    pub fn new(
        settings: Settings,
        reader: Arc<dyn SafeStateReader>,
        services: ServiceFactory,
    ) -> Result<Self, ConsoleError> {
        let signers = LocalSigners::from_keys(&settings.signer_keys)?;
        let network = settings.network;
        let service = services(network);
        info!(
            "console: started network={network} signers={} contracts={}",
            signers.len(),
            settings.contracts.len()
        );
        Ok(Self {
            ctx: ConsoleContext {
                settings,
                network,
                signers,
                service,
                reader,
                services,
                clock: Box::new(Utc::now),
            },
            mode: Mode::General,
        })
    }

    pub fn from_settings(settings: Settings) -> Result<Self, ConsoleError> {
        let reader = Arc::new(settings.static_reader()?);
        let relay_settings = settings.clone();
        let services: ServiceFactory =
            Box::new(move |network| relay_service(&relay_settings, network));
        Self::new(settings, reader, services)
    }

    #[cfg(test)]
    pub(crate) fn with_clock(mut self, clock: Clock) -> Self {
        self.ctx.clock = clock;
        self
    }

    pub fn mode(&self) -> ModeKind {
        match self.mode {
            Mode::General => ModeKind::General,
            Mode::Contract(_) => ModeKind::Contract,
            Mode::Safe(_) => ModeKind::Safe,
        }
    }

    pub fn network(&self) -> Network {
        self.ctx.network
    }

    pub fn signers(&self) -> &LocalSigners {
        &self.ctx.signers
    }

    pub fn prompt(&self) -> String {
        match &self.mode {
            Mode::General => format!("[ {} ]: ", self.ctx.network),
            Mode::Contract(session) => format!(
                "[ {} ][ {} ]: ",
                self.ctx.network,
                session.artifact().alias
            ),
            Mode::Safe(session) => format!(
                "[ {} ][ Safe {} ]: ",
                self.ctx.network,
                session.address().to_checksum(None)
            ),
        }
    }

    pub async fn handle_line(&mut self, line: &str) -> LineOutcome {
        let command = match Command::parse(line) {
            Ok(command) => command,
            Err(err) => {
                let err = ConsoleError::from(err);
                debug!("console: parse error: {err}");
                return self.failure(err);
            }
        };
        if command.name == "loadOwner" {
            debug!("console: dispatch mode={:?} command=loadOwner", self.mode());
        } else {
            debug!("console: dispatch mode={:?} command={command}", self.mode());
        }

        if commands::is_exit(&command.name) {
            return self.close();
        }

        match self.dispatch(&command).await {
            Ok(Some(lines)) => LineOutcome::lines(lines),
            Ok(None) => {
                debug!("console: ignored unknown command {}", command.name);
                LineOutcome::default()
            }
            Err(err) => self.failure(err),
        }
    }

    async fn dispatch(&mut self, command: &Command) -> Result<Option<Vec<String>>, ConsoleError> {
        if let Mode::General = self.mode {
            let Some(kind) = commands::lookup(GENERAL_TABLE, &command.name) else {
                return unknown_or_misplaced(command, "general");
            };
            let resolved = GeneralCommand::resolve(kind, command)?;
            return self.run_general(resolved).map(Some);
        }
        match &mut self.mode {
            Mode::General => Ok(None),
            Mode::Contract(session) => session.handle(&self.ctx, command),
            Mode::Safe(session) => {
                let Some(kind) = commands::lookup(SAFE_TABLE, &command.name) else {
                    return unknown_or_misplaced(command, "Safe");
                };
                session.handle(&mut self.ctx, kind, command).await.map(Some)
            }
        }
    }

    fn run_general(&mut self, command: GeneralCommand) -> Result<Vec<String>, ConsoleError> {
        match command {
            GeneralCommand::About => Ok(vec![format!(
                "safe-console {} : operate Safe multisig wallets from the command line",
                env!("CARGO_PKG_VERSION")
            )]),
            GeneralCommand::Help => Ok(help_lines()),
            GeneralCommand::ViewNetwork => Ok(self.ctx.network_lines()),
            GeneralCommand::SetNetwork(network) => {
                self.ctx.set_network(network);
                Ok(self.ctx.network_lines())
            }
            GeneralCommand::ViewContracts => {
                if self.ctx.settings.contracts.is_empty() {
                    return Ok(vec!["no contracts configured".into()]);
                }
                Ok(self
                    .ctx
                    .settings
                    .contracts
                    .iter()
                    .map(|c| format!("{} {} ({})", c.alias, c.address, c.interface))
                    .collect())
            }
            GeneralCommand::ViewAccounts => Ok(self.ctx.account_lines()),
            GeneralCommand::LoadContract { alias } => {
                let entry = self
                    .ctx
                    .settings
                    .contract(&alias)
                    .ok_or_else(|| invalid(format!("unknown contract alias '{alias}'")))?;
                let artifact = ContractArtifact {
                    alias: entry.alias.clone(),
                    address: parse_config_address(&entry.address)?,
                    interface: entry.interface,
                };
                info!(
                    "console: contract loaded alias={} address={}",
                    artifact.alias, artifact.address
                );
                let lines = vec![format!(
                    "loaded contract {} at {} ({})",
                    artifact.alias,
                    artifact.address.to_checksum(None),
                    artifact.interface
                )];
                self.mode = Mode::Contract(ContractSession::new(artifact));
                Ok(lines)
            }
            GeneralCommand::LoadSafe { address } => {
                info!("console: safe loaded address={}", lower_hex(&address));
                self.mode = Mode::Safe(SafeSession::new(address));
                Ok(vec![format!("loaded Safe {}", address.to_checksum(None))])
            }
        }
    }

    fn close(&mut self) -> LineOutcome {
        match std::mem::replace(&mut self.mode, Mode::General) {
            Mode::General => LineOutcome {
                exit: true,
                ..LineOutcome::default()
            },
            Mode::Contract(session) => {
                LineOutcome::lines(vec![format!("closed contract {}", session.artifact().alias)])
            }
            Mode::Safe(session) => LineOutcome::lines(vec![format!(
                "closed Safe {}",
                session.address().to_checksum(None)
            )]),
        }
    }

    fn failure(&mut self, err: ConsoleError) -> LineOutcome {
        let report = err.report();
        if !err.is_recoverable() && !matches!(self.mode, Mode::General) {
            warn!(
                "console: leaving {:?} mode after {:?} error: {err}",
                self.mode(),
                report.code
            );
            self.mode = Mode::General;
        } else {
            debug!("console: reported {:?} error: {err}", report.code);
        }
        LineOutcome {
            error: Some(report),
            ..LineOutcome::default()
        }
    }
}

/// Silently ignores names no console knows; names owned by another mode are a state error.
pub(crate) fn unknown_or_misplaced(
    command: &Command,
    mode: &str,
) -> Result<Option<Vec<String>>, ConsoleError> {
    let general = commands::lookup::<GeneralKind>(GENERAL_TABLE, &command.name).is_some();
    let safe = commands::lookup::<SafeKind>(SAFE_TABLE, &command.name).is_some();
    let contract = CONTRACT_TABLE.contains(&command.name.as_str());
    if general || safe || contract {
        return Err(ConsoleError::State(format!(
            "{} is not available in the {mode} console",
            command.name
        )));
    }
    Ok(None)
}

fn relay_service(settings: &Settings, network: Network) -> Arc<dyn TransactionService> {
    match settings.service_url(network) {
        Some(url) => match TransactionServiceClient::new(&url) {
            Ok(client) => Arc::new(client),
            Err(err) => {
                warn!("console: relay disabled: {err}");
                Arc::new(MissingTransactionService::new(err.to_string()))
            }
        },
        None => Arc::new(MissingTransactionService::new(format!(
            "no transaction relay for {network}"
        ))),
    }
}

fn help_lines() -> Vec<String> {
    let names = |table: &[&str]| table.join(", ");
    let general: Vec<&str> = GENERAL_TABLE.iter().map(|(name, _)| *name).collect();
    let safe: Vec<&str> = SAFE_TABLE.iter().map(|(name, _)| *name).collect();
    vec![
        format!("general: {}", names(&general)),
        format!("safe: {}", names(&safe)),
        format!(
            "contract: {}, <method> --arg=... (--query|--execute|--queue) [--from=0x...]",
            names(CONTRACT_TABLE)
        ),
        format!("leave any console with {}", names(&commands::EXIT_COMMANDS)),
    ]
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
