// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::abi_codec;
use crate::error::{ClientError, ClientResult};
use crate::types::{Account, ConnectionStatus, ContractDescriptor, RejectReason, SendOutcome};
use async_trait::async_trait;
use cbdc_config::RpcSettings;
use ethers::providers::{Http, JsonRpcClient, Middleware, Provider};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address as EthAddress, Bytes, TransactionReceipt, TransactionRequest, U64};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// The node operations the client wrapper is built on. Implemented by the
/// `ethers` provider for real nodes and by the mock client in tests.
#[async_trait]
pub trait EthClientInner: Send + Sync + 'static {
    async fn is_listening(&self) -> ClientResult<bool>;

    async fn unlock_account(
        &self,
        address: EthAddress,
        password: &str,
        duration: Duration,
    ) -> ClientResult<bool>;

    async fn lock_account(&self, address: EthAddress) -> ClientResult<bool>;

    async fn call(&self, tx: &TypedTransaction) -> ClientResult<Bytes>;

    // Submit and wait for the receipt. `None` if the node never produced one.
    async fn send_transaction(&self, tx: TypedTransaction)
        -> ClientResult<Option<TransactionReceipt>>;
}

#[async_trait]
impl<P> EthClientInner for Provider<P>
where
    P: JsonRpcClient + 'static,
{
    async fn is_listening(&self) -> ClientResult<bool> {
        Ok(self.request("net_listening", ()).await?)
    }

    async fn unlock_account(
        &self,
        address: EthAddress,
        password: &str,
        duration: Duration,
    ) -> ClientResult<bool> {
        Ok(self
            .request(
                "personal_unlockAccount",
                (address, password, duration.as_secs()),
            )
            .await?)
    }

    async fn lock_account(&self, address: EthAddress) -> ClientResult<bool> {
        Ok(self.request("personal_lockAccount", [address]).await?)
    }

    async fn call(&self, tx: &TypedTransaction) -> ClientResult<Bytes> {
        Ok(Middleware::call(self, tx, None).await?)
    }

    async fn send_transaction(
        &self,
        tx: TypedTransaction,
    ) -> ClientResult<Option<TransactionReceipt>> {
        let pending = Middleware::send_transaction(self, tx, None).await?;
        debug!(tx_hash = ?*pending, "Transaction submitted");
        Ok(pending.await?)
    }
}

/// A connection to one node. Every `call` and `send` unlocks the acting
/// account first and locks it again afterwards, whatever the outcome.
pub struct EthClient<P> {
    inner: P,
    rpc_url: String,
    settings: RpcSettings,
    status: ConnectionStatus,
}

impl EthClient<Provider<Http>> {
    pub async fn connect(rpc_url: &str, settings: &RpcSettings) -> ClientResult<Self> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| ClientError::InvalidUrl {
                url: rpc_url.to_string(),
                reason: e.to_string(),
            })?
            .interval(settings.poll_interval());
        Ok(Self::connect_with(provider, rpc_url, settings).await)
    }
}

impl<P> EthClient<P>
where
    P: EthClientInner,
{
    // Probe liveness and wrap `inner`. An unreachable node is reported through
    // `status()`, never as an error.
    pub async fn connect_with(inner: P, rpc_url: &str, settings: &RpcSettings) -> Self {
        let mut client = Self {
            inner,
            rpc_url: rpc_url.to_string(),
            settings: settings.clone(),
            status: ConnectionStatus::Connected,
        };
        client.probe().await;
        client
    }

    pub async fn probe(&mut self) -> &ConnectionStatus {
        self.status = match self.inner.is_listening().await {
            Ok(true) => ConnectionStatus::Connected,
            Ok(false) => ConnectionStatus::Unreachable("node is not listening".to_string()),
            Err(e) => ConnectionStatus::Unreachable(e.to_string()),
        };
        match &self.status {
            ConnectionStatus::Connected => debug!(rpc_url = %self.rpc_url, "Connected to node"),
            ConnectionStatus::Unreachable(reason) => warn!(
                rpc_url = %self.rpc_url,
                reason = %reason,
                "Could not connect to node RPC. Are the nodes up and running?"
            ),
        }
        &self.status
    }

    pub fn status(&self) -> &ConnectionStatus {
        &self.status
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    pub fn settings(&self) -> &RpcSettings {
        &self.settings
    }

    /// Read-only invocation of `method` as `account`. Any failure propagates.
    pub async fn call(
        &self,
        contract: &ContractDescriptor,
        account: &Account,
        method: &str,
        args: Value,
    ) -> ClientResult<Value> {
        let function = contract.function(method)?;
        let data = abi_codec::encode_call(function, &args)?;
        let tx: TypedTransaction = TransactionRequest::new()
            .from(account.address)
            .to(contract.address)
            .data(data)
            .into();
        debug!(contract = %contract.name, method, %account, "Calling contract");
        let output = self.with_unlocked(account, self.inner.call(&tx)).await?;
        abi_codec::decode_output(function, &output)
    }

    /// State-changing invocation of `method` as `account`.
    ///
    /// Anything the node or contract rejects comes back as
    /// [`SendOutcome::Rejected`]; only local mistakes (unknown method or event,
    /// arguments not matching the ABI) are errors. When `event` is given the
    /// matching log of the receipt is decoded into the outcome.
    pub async fn send(
        &self,
        contract: &ContractDescriptor,
        account: &Account,
        method: &str,
        args: Value,
        event: Option<&str>,
    ) -> ClientResult<SendOutcome> {
        let function = contract.function(method)?;
        let event = event.map(|name| contract.event(name)).transpose()?;
        let data = abi_codec::encode_call(function, &args)?;
        let tx: TypedTransaction = TransactionRequest::new()
            .from(account.address)
            .to(contract.address)
            .data(data)
            .gas(self.settings.gas_limit)
            .into();
        debug!(contract = %contract.name, method, %account, "Sending transaction");

        let receipt = match self
            .with_unlocked(account, self.inner.send_transaction(tx))
            .await
        {
            Ok(Some(receipt)) => receipt,
            Ok(None) => return Ok(Self::rejected(method, RejectReason::Dropped)),
            Err(e) => return Ok(Self::rejected(method, RejectReason::from(e))),
        };
        if receipt.status == Some(U64::zero()) {
            return Ok(Self::rejected(
                method,
                RejectReason::Reverted {
                    tx_hash: receipt.transaction_hash,
                },
            ));
        }

        let fields = match event {
            // The transaction has executed at this point, so an event that is
            // missing or cannot be decoded leaves the outcome without one.
            Some(event) => match abi_codec::decode_event(contract, event, &receipt.logs) {
                Ok(Some(fields)) => Some(fields),
                Ok(None) => {
                    warn!(
                        contract = %contract.name,
                        method,
                        event = %event.name,
                        tx_hash = ?receipt.transaction_hash,
                        "Transaction executed without emitting the expected event"
                    );
                    None
                }
                Err(e) => {
                    warn!(
                        contract = %contract.name,
                        method,
                        event = %event.name,
                        tx_hash = ?receipt.transaction_hash,
                        error = %e,
                        "Transaction executed but its event could not be decoded"
                    );
                    None
                }
            },
            None => None,
        };
        Ok(SendOutcome::Executed {
            tx_hash: receipt.transaction_hash,
            event: fields,
        })
    }

    fn rejected(method: &str, reason: RejectReason) -> SendOutcome {
        debug!(method, %reason, "Transaction rejected");
        SendOutcome::Rejected(reason)
    }

    // Unlock `account`, run `operation`, then lock the account again on
    // every path, including a failed unlock.
    async fn with_unlocked<T, F>(&self, account: &Account, operation: F) -> ClientResult<T>
    where
        F: Future<Output = ClientResult<T>>,
    {
        let unlocked = self
            .inner
            .unlock_account(
                account.address,
                &account.password,
                self.settings.unlock_duration(),
            )
            .await;
        let result = match unlocked {
            Ok(true) => operation.await,
            Ok(false) => Err(ClientError::Unlock(format!(
                "node refused to unlock {}",
                account
            ))),
            Err(e) => Err(ClientError::Unlock(e.to_string())),
        };
        if let Err(e) = self.inner.lock_account(account.address).await {
            warn!(%account, error = %e, "Failed to lock account");
        }
        result
    }
}

/// Opens connections to node endpoints. Scenarios connect through this so
/// they can run against the mock client in tests.
#[async_trait]
pub trait Connector: Send + Sync {
    type Inner: EthClientInner;

    async fn connect(
        &self,
        rpc_url: &str,
        settings: &RpcSettings,
    ) -> ClientResult<EthClient<Self::Inner>>;
}

// Connects over HTTP JSON-RPC.
#[derive(Clone, Copy, Debug, Default)]
pub struct HttpConnector;

#[async_trait]
impl Connector for HttpConnector {
    type Inner = Provider<Http>;

    async fn connect(
        &self,
        rpc_url: &str,
        settings: &RpcSettings,
    ) -> ClientResult<EthClient<Self::Inner>> {
        EthClient::connect(rpc_url, settings).await
    }
}
