//! Request and response bodies exchanged with the Safe transaction relay.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultisigTransactionRequest {
    pub to: String,
    pub value: String,
    pub data: Option<String>,
    pub operation: u8,
    pub gas_token: String,
    pub safe_tx_gas: String,
    pub base_gas: String,
    pub gas_price: String,
    pub refund_receiver: String,
    pub nonce: String,
    pub contract_transaction_hash: String,
    pub sender: String,
    pub signature: Option<String>,
    pub origin: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddDelegateRequest {
    pub safe: String,
    pub delegate: String,
    pub signature: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveDelegateRequest {
    pub signature: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    pub results: Vec<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceEntry {
    #[serde(default)]
    pub token_address: Option<String>,
    #[serde(default)]
    pub token: Option<TokenInfo>,
    pub balance: String,
}

impl BalanceEntry {
    pub fn symbol(&self) -> &str {
        self.token
            .as_ref()
            .map(|token| token.symbol.as_str())
            .unwrap_or("ETH")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultisigTransactionSummary {
    pub safe: String,
    pub to: String,
    pub value: String,
    #[serde(default)]
    pub data: Option<String>,
    pub operation: u8,
    pub nonce: u64,
    pub safe_tx_hash: String,
    #[serde(default)]
    pub is_executed: bool,
    #[serde(default)]
    pub confirmations_required: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelegateEntry {
    #[serde(default)]
    pub safe: Option<String>,
    pub delegate: String,
    pub delegator: String,
    #[serde(default)]
    pub label: String,
}
