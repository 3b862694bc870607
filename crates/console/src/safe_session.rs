//! Safe console. At most one transaction is pending per Safe.

use std::collections::HashSet;

use alloy::{
    primitives::{hex, Address, B256, U256},
    signers::local::PrivateKeySigner,
};
use safe::{
    delegate::sign_delegate, lower_hex, OwnerChange, OwnerRegistry, SafeDomain, SafeSnapshot,
    SafeTransaction, TransactionIntent,
};
use shared::{
    domain::Operation,
    protocol::{AddDelegateRequest, RemoveDelegateRequest},
};
use tracing::{debug, info};

use crate::{
    commands::{SafeCommand, SafeKind},
    error::{invalid, ConsoleError},
    parser::Command,
    session::ConsoleContext,
};

pub struct SafeSession {
    address: Address,
    snapshot: Option<SafeSnapshot>,
    registry: Option<OwnerRegistry>,
    pending: Option<SafeTransaction>,
    next_nonce: Option<U256>,
    submitted: HashSet<B256>,
}

impl SafeSession {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            snapshot: None,
            registry: None,
            pending: None,
            next_nonce: None,
            submitted: HashSet::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub(crate) async fn handle(
        &mut self,
        ctx: &mut ConsoleContext,
        kind: SafeKind,
        command: &Command,
    ) -> Result<Vec<String>, ConsoleError> {
        let command = SafeCommand::resolve(kind, command)?;
        match command {
            SafeCommand::ViewNetwork => return Ok(ctx.network_lines()),
            SafeCommand::ViewAccounts => return Ok(ctx.account_lines()),
            SafeCommand::LoadOwner { private_key } => return self.load_owner(ctx, &private_key).await,
            SafeCommand::UnloadOwner(address) => {
                return Ok(if ctx.signers.unload(&address) {
                    vec![format!("unloaded local owner {}", address.to_checksum(None))]
                } else {
                    vec![format!("{} was not loaded", address.to_checksum(None))]
                });
            }
            SafeCommand::Refresh => {
                self.snapshot = None;
                self.registry = None;
                self.ensure_loaded(ctx).await?;
                return Ok(vec![format!("refreshed Safe {}", self.address.to_checksum(None))]);
            }
            SafeCommand::ViewPending => return Ok(self.pending_lines()),
            SafeCommand::Discard => {
                return Ok(match self.pending.take() {
                    Some(transaction) => {
                        info!("safe: discarded hash={}", transaction.hash());
                        vec![format!("discarded {}", transaction.hash())]
                    }
                    None => vec!["nothing to discard".into()],
                });
            }
            SafeCommand::GetBalances => {
                let balances = ctx.service.get_balances(self.address).await?;
                return Ok(balances
                    .iter()
                    .map(|entry| format!("{} {}", entry.symbol(), entry.balance))
                    .collect());
            }
            SafeCommand::GetTransactions => {
                let transactions = ctx.service.get_transactions(self.address).await?;
                return Ok(transactions
                    .iter()
                    .map(|tx| {
                        format!(
                            "nonce={} to={} value={} executed={} hash={}",
                            tx.nonce, tx.to, tx.value, tx.is_executed, tx.safe_tx_hash
                        )
                    })
                    .collect());
            }
            SafeCommand::GetDelegates => {
                let delegates = ctx.service.get_delegates(self.address).await?;
                if delegates.is_empty() {
                    return Ok(vec!["no delegates".into()]);
                }
                return Ok(delegates
                    .iter()
                    .map(|d| format!("{} label={} delegator={}", d.delegate, d.label, d.delegator))
                    .collect());
            }
            _ => {}
        }

        self.ensure_loaded(ctx).await?;
        let (Some(snapshot), Some(registry)) = (&self.snapshot, &self.registry) else {
            return Err(ConsoleError::State("Safe state is not loaded".into()));
        };

        match command {
            SafeCommand::Info => Ok(vec![
                format!("safe={}", self.address.to_checksum(None)),
                format!("name={} version={}", snapshot.name, snapshot.version),
                format!(
                    "threshold={} owners={} nonce={}",
                    registry.threshold(),
                    registry.owners().len(),
                    snapshot.nonce
                ),
                format!("network={} chain_id={}", ctx.network, ctx.network.chain_id()),
            ]),
            SafeCommand::GetOwners => Ok(registry
                .owners()
                .iter()
                .map(|owner| format!("owner {}", owner.to_checksum(None)))
                .collect()),
            SafeCommand::GetThreshold => Ok(vec![format!("threshold={}", registry.threshold())]),
            SafeCommand::IsOwner(address) => Ok(vec![format!(
                "{} is owner: {}",
                address.to_checksum(None),
                registry.is_owner(&address)
            )]),
            SafeCommand::AreOwners(addresses) => {
                let addresses = if addresses.is_empty() {
                    ctx.signers.addresses()
                } else {
                    addresses
                };
                if addresses.is_empty() {
                    return Err(invalid("areOwners needs addresses or loaded local owners"));
                }
                let mut lines: Vec<String> = addresses
                    .iter()
                    .map(|a| format!("{} is owner: {}", a.to_checksum(None), registry.is_owner(a)))
                    .collect();
                lines.push(format!("all owners: {}", registry.are_owners(&addresses)));
                Ok(lines)
            }
            SafeCommand::Nonce => Ok(vec![format!(
                "nonce={} next={}",
                snapshot.nonce,
                self.next_nonce.unwrap_or(snapshot.nonce)
            )]),
            SafeCommand::Version => Ok(vec![snapshot.version.clone()]),
            SafeCommand::Name => Ok(vec![snapshot.name.clone()]),
            SafeCommand::ViewOwners => Ok(local_owner_lines(ctx, registry)),
            SafeCommand::AddOwner { owner, threshold } => {
                let change = registry.add_owner(owner, threshold)?;
                self.stage_owner_change(ctx, change)
            }
            SafeCommand::RemoveOwner { owner, threshold } => {
                let change = registry.remove_owner(owner, threshold)?;
                self.stage_owner_change(ctx, change)
            }
            SafeCommand::SwapOwner {
                old_owner,
                new_owner,
            } => {
                let change = registry.swap_owner(old_owner, new_owner)?;
                self.stage_owner_change(ctx, change)
            }
            SafeCommand::ChangeThreshold(threshold) => {
                let change = registry.change_threshold(threshold)?;
                self.stage_owner_change(ctx, change)
            }
            SafeCommand::SendEther { to, value } => {
                self.stage(ctx, TransactionIntent::EtherTransfer { to, value })
            }
            SafeCommand::SendTransaction { to, value, data } => self.stage(
                ctx,
                TransactionIntent::Call {
                    to,
                    value,
                    data,
                    operation: Operation::Call,
                },
            ),
            SafeCommand::Sign => self.sign(ctx),
            SafeCommand::Submit => self.submit(ctx).await,
            SafeCommand::AddDelegate {
                delegate,
                label,
                signer,
            } => {
                let signer = delegate_signer(ctx, registry, signer)?;
                let signed = sign_delegate(delegate, signer, ctx.now())?;
                let request = AddDelegateRequest {
                    safe: self.address.to_checksum(None),
                    delegate: delegate.to_checksum(None),
                    signature: signed.signature_hex(),
                    label: label.clone(),
                };
                ctx.service.add_delegate(self.address, &request).await?;
                Ok(vec![format!(
                    "added delegate {} label={label} signed by {}",
                    delegate.to_checksum(None),
                    signed.signer.to_checksum(None)
                )])
            }
            SafeCommand::RemoveDelegate { delegate, signer } => {
                let signer = delegate_signer(ctx, registry, signer)?;
                // Removal is signed over a freshly computed hash.
                let signed = sign_delegate(delegate, signer, ctx.now())?;
                let request = RemoveDelegateRequest {
                    signature: signed.signature_hex(),
                };
                ctx.service
                    .remove_delegate(self.address, delegate, &request)
                    .await?;
                Ok(vec![format!("removed delegate {}", delegate.to_checksum(None))])
            }
            // Answered before the Safe state was loaded.
            SafeCommand::ViewNetwork
            | SafeCommand::ViewAccounts
            | SafeCommand::LoadOwner { .. }
            | SafeCommand::UnloadOwner(_)
            | SafeCommand::Refresh
            | SafeCommand::ViewPending
            | SafeCommand::Discard
            | SafeCommand::GetBalances
            | SafeCommand::GetTransactions
            | SafeCommand::GetDelegates => Ok(Vec::new()),
        }
    }

    async fn ensure_loaded(&mut self, ctx: &ConsoleContext) -> Result<(), ConsoleError> {
        if self.registry.is_some() {
            return Ok(());
        }
        let snapshot = ctx.reader.snapshot(self.address).await?;
        let registry = OwnerRegistry::new(
            self.address,
            snapshot.owners.clone(),
            snapshot.threshold,
            ctx.settings.predecessor,
        )?;
        debug!(
            "safe: loaded state safe={} owners={} threshold={} nonce={}",
            lower_hex(&self.address),
            registry.owners().len(),
            registry.threshold(),
            snapshot.nonce
        );
        if self.next_nonce.map_or(true, |next| next < snapshot.nonce) {
            self.next_nonce = Some(snapshot.nonce);
        }
        self.registry = Some(registry);
        self.snapshot = Some(snapshot);
        Ok(())
    }

    async fn load_owner(
        &mut self,
        ctx: &mut ConsoleContext,
        private_key: &str,
    ) -> Result<Vec<String>, ConsoleError> {
        let address = ctx.signers.load(private_key)?;
        self.ensure_loaded(ctx).await?;
        let is_owner = self
            .registry
            .as_ref()
            .is_some_and(|registry| registry.is_owner(&address));
        Ok(vec![format!(
            "loaded local owner {} (owner: {is_owner})",
            address.to_checksum(None)
        )])
    }

    fn stage_owner_change(
        &mut self,
        ctx: &ConsoleContext,
        change: OwnerChange,
    ) -> Result<Vec<String>, ConsoleError> {
        self.stage(ctx, TransactionIntent::OwnerChange(change))
    }

    fn stage(
        &mut self,
        ctx: &ConsoleContext,
        intent: TransactionIntent,
    ) -> Result<Vec<String>, ConsoleError> {
        if let Some(pending) = &self.pending {
            return Err(ConsoleError::State(format!(
                "transaction {} is pending; submit or discard it first",
                pending.hash()
            )));
        }
        let snapshot = self
            .snapshot
            .as_ref()
            .ok_or_else(|| ConsoleError::State("Safe state is not loaded".into()))?;
        let nonce = self.next_nonce.unwrap_or(snapshot.nonce);
        let domain = SafeDomain::for_version(self.address, ctx.network.chain_id(), &snapshot.version);
        let description = describe(&intent);
        let transaction = SafeTransaction::build(domain, nonce, intent);
        info!(
            "safe: staged {description} safe={} nonce={nonce} hash={}",
            lower_hex(&self.address),
            transaction.hash()
        );
        let lines = vec![
            format!("staged {description} nonce={nonce}"),
            format!("safe_tx_hash={}", transaction.hash()),
            format!(
                "data={}",
                hex::encode_prefixed(&transaction.fields().data)
            ),
            "sign with loaded owners, then submit".to_string(),
        ];
        self.pending = Some(transaction);
        Ok(lines)
    }

    fn sign(&mut self, ctx: &ConsoleContext) -> Result<Vec<String>, ConsoleError> {
        let registry = self
            .registry
            .as_ref()
            .ok_or_else(|| ConsoleError::State("Safe state is not loaded".into()))?;
        let pending = self
            .pending
            .as_mut()
            .ok_or_else(|| ConsoleError::State("no pending transaction to sign".into()))?;
        let mut lines = Vec::new();
        for (address, signer) in ctx.signers.iter() {
            if !registry.is_owner(address) {
                continue;
            }
            pending.sign_with(signer)?;
            lines.push(format!("signed by {}", address.to_checksum(None)));
        }
        if lines.is_empty() {
            return Err(ConsoleError::State(
                "no loaded local account is an owner of this Safe".into(),
            ));
        }
        lines.push(format!(
            "{} of {} signatures collected",
            pending.signature_count(),
            registry.threshold()
        ));
        Ok(lines)
    }

    async fn submit(&mut self, ctx: &ConsoleContext) -> Result<Vec<String>, ConsoleError> {
        let registry = self
            .registry
            .as_ref()
            .ok_or_else(|| ConsoleError::State("Safe state is not loaded".into()))?;
        let pending = self
            .pending
            .as_ref()
            .ok_or_else(|| ConsoleError::State("no pending transaction to submit".into()))?;
        if self.submitted.contains(&pending.hash()) {
            return Err(ConsoleError::AlreadySubmitted(pending.hash()));
        }
        let finalized = pending.finalize(registry.threshold())?;
        let request = finalized.to_request(&ctx.settings.origin);
        ctx.service.post_transaction(self.address, &request).await?;

        let hash = finalized.hash();
        let nonce = finalized.transaction.fields().nonce;
        self.submitted.insert(hash);
        self.pending = None;
        self.next_nonce = Some(nonce + U256::from(1));
        info!(
            "safe: submitted safe={} hash={hash} nonce={nonce} sender={}",
            lower_hex(&self.address),
            finalized.sender
        );
        Ok(vec![
            format!("submitted {hash}"),
            format!("sender={}", finalized.sender.to_checksum(None)),
        ])
    }

    fn pending_lines(&self) -> Vec<String> {
        let Some(pending) = &self.pending else {
            return vec!["no pending transaction".into()];
        };
        let fields = pending.fields();
        let mut lines = vec![
            format!("safe_tx_hash={}", pending.hash()),
            format!(
                "to={} value={} nonce={} operation={}",
                fields.to.to_checksum(None),
                fields.value,
                fields.nonce,
                fields.operation.as_u8()
            ),
            format!("data={}", hex::encode_prefixed(&fields.data)),
        ];
        lines.extend(
            pending
                .signers()
                .iter()
                .map(|signer| format!("signature from {}", signer.to_checksum(None))),
        );
        lines
    }
}

fn describe(intent: &TransactionIntent) -> String {
    match intent {
        TransactionIntent::OwnerChange(change) => change.method().to_string(),
        TransactionIntent::EtherTransfer { to, value } => {
            format!("transfer of {value} wei to {}", to.to_checksum(None))
        }
        TransactionIntent::Call { to, .. } => format!("call to {}", to.to_checksum(None)),
    }
}

fn local_owner_lines(ctx: &ConsoleContext, registry: &OwnerRegistry) -> Vec<String> {
    if ctx.signers.is_empty() {
        return vec!["no local owners loaded".into()];
    }
    ctx.signers
        .addresses()
        .iter()
        .map(|address| {
            format!(
                "{} owner: {}",
                address.to_checksum(None),
                registry.is_owner(address)
            )
        })
        .collect()
}

/// `--signer` when given, else the lowest loaded account that owns the Safe.
fn delegate_signer<'a>(
    ctx: &'a ConsoleContext,
    registry: &OwnerRegistry,
    requested: Option<Address>,
) -> Result<&'a PrivateKeySigner, ConsoleError> {
    if let Some(address) = requested {
        return ctx
            .signers
            .get(&address)
            .ok_or_else(|| invalid(format!("{address} is not a loaded local account")));
    }
    ctx.signers
        .iter()
        .find(|(address, _)| registry.is_owner(address))
        .map(|(_, signer)| signer)
        .ok_or_else(|| invalid("delegate changes need a loaded local owner"))
}
