use alloy::primitives::{hex, Address};
use tracing::{info, warn};

use crate::{
    contract::{arg_address, CallMode, ContractArtifact, MethodRegistry, QueuedCall},
    error::{invalid, ConsoleError},
    parser::Command,
    session::{unknown_or_misplaced, ConsoleContext},
};

/// Contract console commands besides the loaded interface's methods.
pub const CONTRACT_TABLE: &[&str] = &["info", "viewQueue"];

const CONTROL_FLAGS: [&str; 4] = ["query", "execute", "queue", "from"];

pub struct ContractSession {
    artifact: ContractArtifact,
    methods: MethodRegistry,
    queue: Vec<QueuedCall>,
}

impl ContractSession {
    pub fn new(artifact: ContractArtifact) -> Self {
        let methods = MethodRegistry::for_interface(artifact.interface);
        Self {
            artifact,
            methods,
            queue: Vec::new(),
        }
    }

    pub fn artifact(&self) -> &ContractArtifact {
        &self.artifact
    }

    pub(crate) fn handle(
        &mut self,
        ctx: &ConsoleContext,
        command: &Command,
    ) -> Result<Option<Vec<String>>, ConsoleError> {
        match command.name.as_str() {
            "info" => return Ok(Some(self.info_lines())),
            "viewQueue" => return Ok(Some(self.queue_lines())),
            _ => {}
        }
        let Some(method) = self.methods.get(&command.name) else {
            return unknown_or_misplaced(command, "contract");
        };

        let args: Vec<String> = command
            .arguments
            .iter()
            .filter(|argument| !CONTROL_FLAGS.contains(&argument.flag.as_str()))
            .flat_map(|argument| argument.values.iter().cloned())
            .collect();
        let from = command.flag_value("from").map(arg_address).transpose()?;
        let mode = call_mode(command)?;
        let data = method.encode(&args)?;
        let to = self.artifact.address;

        let Some(mode) = mode else {
            warn!("contract: {} called without a call mode", method.name());
            return Ok(Some(vec![format!(
                "warning: {} needs one of --query, --execute or --queue",
                method.name()
            )]));
        };

        let mut lines = Vec::new();
        match mode {
            CallMode::Query => {
                lines.push(format!(
                    "call {} to={} data={}",
                    method.signature(),
                    to.to_checksum(None),
                    hex::encode_prefixed(&data)
                ));
            }
            CallMode::Execute => {
                if method.name().starts_with("get") || method.is_read_only() {
                    warn!("contract: executing read-only method {}", method.name());
                    lines.push(format!(
                        "warning: {} does not change state; --query is enough",
                        method.name()
                    ));
                }
                let sender = sender(ctx, from)?;
                info!(
                    "contract: prepared calldata alias={} method={} from={sender}",
                    self.artifact.alias,
                    method.name()
                );
                lines.push(format!(
                    "calldata {} from={} to={} data={} (not broadcast)",
                    method.signature(),
                    sender.to_checksum(None),
                    to.to_checksum(None),
                    hex::encode_prefixed(&data)
                ));
            }
            CallMode::Queue => {
                self.queue.push(QueuedCall {
                    signature: method.signature(),
                    to,
                    from,
                    data,
                });
                lines.push(format!(
                    "queued {} ({} in queue)",
                    method.signature(),
                    self.queue.len()
                ));
            }
        }
        Ok(Some(lines))
    }

    fn info_lines(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "{} at {} ({})",
            self.artifact.alias,
            self.artifact.address.to_checksum(None),
            self.artifact.interface
        )];
        lines.extend(self.methods.methods().map(|method| {
            let access = if method.is_read_only() { "view" } else { "write" };
            format!("  {} [{access}]", method.signature())
        }));
        lines
    }

    fn queue_lines(&self) -> Vec<String> {
        if self.queue.is_empty() {
            return vec!["queue is empty".into()];
        }
        self.queue
            .iter()
            .enumerate()
            .map(|(index, call)| {
                format!(
                    "{index}: {} to={} data={}",
                    call.signature,
                    call.to.to_checksum(None),
                    hex::encode_prefixed(&call.data)
                )
            })
            .collect()
    }
}

fn call_mode(command: &Command) -> Result<Option<CallMode>, ConsoleError> {
    let modes: Vec<CallMode> = [
        ("query", CallMode::Query),
        ("execute", CallMode::Execute),
        ("queue", CallMode::Queue),
    ]
    .into_iter()
    .filter(|(flag, _)| command.has_flag(flag))
    .map(|(_, mode)| mode)
    .collect();
    match modes.as_slice() {
        [] => Ok(None),
        [mode] => Ok(Some(*mode)),
        _ => Err(invalid("use only one of --query, --execute or --queue")),
    }
}

/// `--from` when given, else the lowest loaded local account.
fn sender(ctx: &ConsoleContext, from: Option<Address>) -> Result<Address, ConsoleError> {
    match from {
        Some(address) if ctx.signers.get(&address).is_some() => Ok(address),
        Some(address) => Err(invalid(format!("{address} is not a loaded local account"))),
        None => ctx
            .signers
            .addresses()
            .first()
            .copied()
            .ok_or_else(|| invalid("--execute needs a loaded local account")),
    }
}
