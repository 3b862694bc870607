//! Client for the Safe transaction relay.
//!
//! Every call is sent exactly once. Non-success responses become
//! [`ServiceError::Status`] carrying the response body as received; retrying is
//! left to the caller.

use alloy::primitives::Address;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::protocol::{
    AddDelegateRequest, BalanceEntry, DelegateEntry, MultisigTransactionRequest,
    MultisigTransactionSummary, Paginated, RemoveDelegateRequest,
};
use tracing::{debug, info, warn};
use url::Url;

pub mod error;

pub use error::ServiceError;

#[async_trait]
pub trait TransactionService: Send + Sync {
    async fn get_balances(&self, safe: Address) -> Result<Vec<BalanceEntry>, ServiceError>;
    async fn get_transactions(
        &self,
        safe: Address,
    ) -> Result<Vec<MultisigTransactionSummary>, ServiceError>;
    async fn get_delegates(&self, safe: Address) -> Result<Vec<DelegateEntry>, ServiceError>;
    async fn add_delegate(
        &self,
        safe: Address,
        request: &AddDelegateRequest,
    ) -> Result<(), ServiceError>;
    async fn remove_delegate(
        &self,
        safe: Address,
        delegate: Address,
        request: &RemoveDelegateRequest,
    ) -> Result<(), ServiceError>;
    async fn post_transaction(
        &self,
        safe: Address,
        request: &MultisigTransactionRequest,
    ) -> Result<(), ServiceError>;
}

/// Stand-in for networks without a relay; every call fails.
pub struct MissingTransactionService {
    reason: String,
}

impl MissingTransactionService {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn unavailable<T>(&self) -> Result<T, ServiceError> {
        Err(ServiceError::Unavailable(self.reason.clone()))
    }
}

#[async_trait]
impl TransactionService for MissingTransactionService {
    async fn get_balances(&self, _safe: Address) -> Result<Vec<BalanceEntry>, ServiceError> {
        self.unavailable()
    }

    async fn get_transactions(
        &self,
        _safe: Address,
    ) -> Result<Vec<MultisigTransactionSummary>, ServiceError> {
        self.unavailable()
    }

    async fn get_delegates(&self, _safe: Address) -> Result<Vec<DelegateEntry>, ServiceError> {
        self.unavailable()
    }

    async fn add_delegate(
        &self,
        _safe: Address,
        _request: &AddDelegateRequest,
    ) -> Result<(), ServiceError> {
        self.unavailable()
    }

    async fn remove_delegate(
        &self,
        _safe: Address,
        _delegate: Address,
        _request: &RemoveDelegateRequest,
    ) -> Result<(), ServiceError> {
        self.unavailable()
    }

    async fn post_transaction(
        &self,
        _safe: Address,
        _request: &MultisigTransactionRequest,
    ) -> Result<(), ServiceError> {
        self.unavailable()
    }
}

pub struct TransactionServiceClient {
    http: Client,
    base_url: Url,
}

impl TransactionServiceClient {
    pub fn new(base_url: &str) -> Result<Self, ServiceError> {
        let base_url =
            Url::parse(base_url).map_err(|err| ServiceError::InvalidUrl(format!("{base_url}: {err}")))?;
        Ok(Self {
            http: Client::new(),
            base_url,
        })
    }

    fn safe_url(&self, safe: Address, suffix: &str) -> Result<Url, ServiceError> {
        let path = format!("/api/v1/safes/{}/{suffix}", safe.to_checksum(None));
        self.base_url
            .join(&path)
            .map_err(|err| ServiceError::InvalidUrl(format!("{path}: {err}")))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        url: Url,
    ) -> Result<T, ServiceError> {
        debug!("relay: GET {url}");
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| ServiceError::Transport { operation, source })?;
        let response = ensure_success(operation, response).await?;
        let body = response
            .text()
            .await
            .map_err(|source| ServiceError::Transport { operation, source })?;
        serde_json::from_str(&body).map_err(|err| ServiceError::Decode {
            operation,
            message: err.to_string(),
        })
    }
}

async fn ensure_success(
    operation: &'static str,
    response: Response,
) -> Result<Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .map_err(|source| ServiceError::Transport { operation, source })?;
    warn!("relay: {operation} rejected status={} body={body}", status.as_u16());
    Err(ServiceError::Status {
        operation,
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl TransactionService for TransactionServiceClient {
    async fn get_balances(&self, safe: Address) -> Result<Vec<BalanceEntry>, ServiceError> {
        let url = self.safe_url(safe, "balances/")?;
        self.get_json("get balances", url).await
    }

    async fn get_transactions(
        &self,
        safe: Address,
    ) -> Result<Vec<MultisigTransactionSummary>, ServiceError> {
        let url = self.safe_url(safe, "multisig-transactions/")?;
        let page: Paginated<MultisigTransactionSummary> =
            self.get_json("get transactions", url).await?;
        Ok(page.results)
    }

    async fn get_delegates(&self, safe: Address) -> Result<Vec<DelegateEntry>, ServiceError> {
        let url = self.safe_url(safe, "delegates/")?;
        let page: Paginated<DelegateEntry> = self.get_json("get delegates", url).await?;
        Ok(page.results)
    }

    async fn add_delegate(
        &self,
        safe: Address,
        request: &AddDelegateRequest,
    ) -> Result<(), ServiceError> {
        let operation = "add delegate";
        let url = self.safe_url(safe, "delegates/")?;
        let response = self
            .http
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|source| ServiceError::Transport { operation, source })?;
        ensure_success(operation, response).await?;
        info!("relay: delegate added safe={safe} delegate={}", request.delegate);
        Ok(())
    }

    async fn remove_delegate(
        &self,
        safe: Address,
        delegate: Address,
        request: &RemoveDelegateRequest,
    ) -> Result<(), ServiceError> {
        let operation = "remove delegate";
        let url = self.safe_url(safe, &format!("delegates/{}/", delegate.to_checksum(None)))?;
        let response = self
            .http
            .delete(url)
            .json(request)
            .send()
            .await
            .map_err(|source| ServiceError::Transport { operation, source })?;
        ensure_success(operation, response).await?;
        info!("relay: delegate removed safe={safe} delegate={delegate}");
        Ok(())
    }

    async fn post_transaction(
        &self,
        safe: Address,
        request: &MultisigTransactionRequest,
    ) -> Result<(), ServiceError> {
        let operation = "post transaction";
        let url = self.safe_url(safe, "multisig-transactions/")?;
        let response = self
            .http
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|source| ServiceError::Transport { operation, source })?;
        ensure_success(operation, response).await?;
        info!(
            "relay: transaction posted safe={safe} hash={} nonce={}",
            request.contract_transaction_hash, request.nonce
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
