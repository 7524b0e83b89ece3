// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use cbdc_client::{
    ClientResult, ConnectionStatus, Connector, EthClient, Participant, Registry, SendOutcome,
};
use serde_json::Value;
use tracing::debug;

/// What a scenario runs against: the loaded registry and a way to reach the
/// participants' nodes.
pub struct ScenarioContext<'a, C> {
    registry: &'a Registry,
    connector: C,
}

impl<'a, C: Connector> ScenarioContext<'a, C> {
    pub fn new(registry: &'a Registry, connector: C) -> Self {
        Self {
            registry,
            connector,
        }
    }

    pub fn registry(&self) -> &Registry {
        self.registry
    }

    /// Open a fresh connection to `participant`'s node.
    pub async fn connect(&self, participant: &str) -> ClientResult<(EthClient<C::Inner>, &Participant)> {
        let participant = self.registry.participant(participant)?;
        let client = self
            .connector
            .connect(&participant.rpc_url, self.registry.settings())
            .await?;
        Ok((client, participant))
    }

    pub async fn status(&self, participant: &str) -> ClientResult<ConnectionStatus> {
        let (client, _) = self.connect(participant).await?;
        Ok(client.status().clone())
    }

    // Lowercase hex address of `participant`, ready to be passed as an argument.
    pub fn address(&self, participant: &str) -> ClientResult<String> {
        Ok(self.registry.participant(participant)?.account.address_hex())
    }

    /// Read `method` of `contract` through `participant`'s node, acting as
    /// that participant.
    pub async fn call(
        &self,
        participant: &str,
        contract: &str,
        method: &str,
        args: Value,
    ) -> ClientResult<Value> {
        let contract = self.registry.contract(contract)?;
        let (client, participant) = self.connect(participant).await?;
        let result = client
            .call(contract, &participant.account, method, args)
            .await?;
        debug!(contract = %contract.name, method, %result, "Call returned");
        Ok(result)
    }

    pub async fn send(
        &self,
        participant: &str,
        contract: &str,
        method: &str,
        args: Value,
        event: Option<&str>,
    ) -> ClientResult<SendOutcome> {
        let contract = self.registry.contract(contract)?;
        let (client, participant) = self.connect(participant).await?;
        client
            .send(contract, &participant.account, method, args, event)
            .await
    }
}
