// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! The scenario families exercised against a live network.
//!
//! Each family is an enum whose variants are its scenarios in run order.
//! Scenarios build on the chain state left by earlier ones, so each declares
//! the scenarios it depends on and is skipped when one of them did not pass.

use crate::context::ScenarioContext;
use crate::harness::{Harness, ScenarioOutcome};
use anyhow::Context;
use async_trait::async_trait;
use cbdc_client::{Connector, SendOutcome};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use strum::IntoEnumIterator;
use tracing::info;

pub mod cbdc;
pub mod ccbdc;
pub mod governing;

pub use cbdc::CbdcScenario;
pub use ccbdc::CcbdcScenario;
pub use governing::GoverningScenario;

pub const CBDC_CONTRACT: &str = "cbdc";
pub const CCBDC_CONTRACT: &str = "ccbdc";
pub const GOVERNING_CONTRACT: &str = "governing";

#[async_trait]
pub trait Scenario: IntoEnumIterator + Display + Copy + Eq + Hash + Send + Sync + 'static {
    /// Name of the family, used in logs.
    const SUITE: &'static str;

    fn description(&self) -> &'static str;

    fn prerequisites(&self) -> &'static [Self] {
        &[]
    }

    /// Run the scenario's steps and checks. An `Err` aborts the whole run.
    async fn run<C: Connector>(
        &self,
        ctx: &ScenarioContext<'_, C>,
        harness: &mut Harness,
    ) -> anyhow::Result<()>;
}

/// Run every scenario of `S` in order. Returns the first error a scenario
/// raised, after recording it; the scenarios after it are not run.
pub async fn run_suite<S: Scenario, C: Connector>(
    ctx: &ScenarioContext<'_, C>,
    harness: &mut Harness,
) -> anyhow::Result<()> {
    info!(suite = S::SUITE, "Running scenarios");
    let mut outcomes: HashMap<S, ScenarioOutcome> = HashMap::new();
    for scenario in S::iter() {
        let blocker = scenario
            .prerequisites()
            .iter()
            .find(|p| outcomes.get(*p) != Some(&ScenarioOutcome::Passed));
        if let Some(blocker) = blocker {
            let reason = format!("prerequisite `{}` did not pass", blocker);
            harness.skip(scenario.description(), &reason);
            outcomes.insert(scenario, ScenarioOutcome::Skipped(reason));
            continue;
        }

        harness.report_start(scenario.description());
        if let Err(e) = scenario.run(ctx, harness).await {
            harness.error(&e);
            return Err(e).with_context(|| format!("{} scenario `{}` aborted", S::SUITE, scenario));
        }
        outcomes.insert(scenario, harness.finish_scenario());
    }
    Ok(())
}

// Checks that `outcome` was rejected by the network.
pub(crate) fn expect_rejected(harness: &mut Harness, outcome: &SendOutcome) {
    harness.evaluate(&Value::Bool(outcome.is_rejected()), &Value::Bool(true));
}

// Field `name` of the event in `outcome`, reporting a failed check if the
// transaction was rejected or did not emit it.
pub(crate) fn required_event_field(
    harness: &mut Harness,
    outcome: &SendOutcome,
    event: &str,
    name: &str,
) -> Option<Value> {
    if let Some(reason) = outcome.rejection() {
        harness.fail(&format!("transaction was rejected: {}", reason));
        return None;
    }
    match outcome.event_field(name) {
        Some(value) => Some(value.clone()),
        None => {
            harness.fail(&format!("no `{}` field from a {} event", name, event));
            None
        }
    }
}

#[cfg(test)]
pub(crate) mod test_utils {
    use super::*;
    use crate::harness::SharedBuffer;
    use cbdc_client::eth_mock_client::{EthMockClient, MockConnector, MockFailure};
    use cbdc_client::{Account, ContractDescriptor, Participant, Registry};
    use cbdc_config::{ParticipantRole, RpcSettings};
    use ethers::abi::{parse_abi, Token};
    use ethers::types::{Address as EthAddress, TransactionReceipt};

    pub const PARTICIPANTS: [(&str, ParticipantRole, u16); 6] = [
        ("smp0", ParticipantRole::Validator, 22000),
        ("mnt0", ParticipantRole::Maintainer, 22004),
        ("gov0", ParticipantRole::Governor, 22005),
        ("gov1", ParticipantRole::Governor, 22006),
        ("bnk0", ParticipantRole::Banker, 22007),
        ("bnk1", ParticipantRole::Banker, 22008),
    ];

    pub fn rpc_url(port: u16) -> String {
        format!("http://127.0.0.1:{}", port)
    }

    pub fn address_of(index: usize) -> EthAddress {
        EthAddress::from_low_u64_be(0xa0 + index as u64)
    }

    pub fn registry() -> Registry {
        let participants = PARTICIPANTS
            .iter()
            .enumerate()
            .map(|(i, (name, role, port))| Participant {
                name: name.to_string(),
                role: *role,
                account: Account {
                    address: address_of(i),
                    password: "root".to_string(),
                },
                rpc_url: rpc_url(*port),
            });
        let contracts = vec![
            ContractDescriptor::new(
                CBDC_CONTRACT,
                EthAddress::from_low_u64_be(0xc1),
                parse_abi(&[
                    "function supplyOf(address addr) view returns (uint256)",
                    "function balanceOf(address addr) view returns (uint256)",
                    "function isMerchant(address addr) view returns (uint256)",
                    "function mint(address to, uint256 amount)",
                    "function allocate(address to, uint256 amount, uint256 shade)",
                    "function convert(address from, address to, uint256 amount)",
                    "function transfer(address to, uint256 amount)",
                    "event Minting(address indexed to, uint256 amount)",
                    "event Allocation(address indexed to, uint256 amount, uint256 shade)",
                    "event Conversion(address indexed from, address indexed to, uint256 amount)",
                    "event Transfer(address indexed from, address indexed to, uint256 amount)",
                ])
                .unwrap(),
            ),
            ContractDescriptor::new(
                CCBDC_CONTRACT,
                EthAddress::from_low_u64_be(0xc2),
                parse_abi(&[
                    "function createNewCoin(uint256 coinID, uint256[] shades, uint256 price, uint256 limit)",
                    "function showCoinInfo(uint256 coinID) view returns (address, uint256[], uint256, uint256)",
                    "function requestCoin(uint256 coinID, uint256 amount)",
                    "function hasMintingRequest(address addr, uint256 coinID) view returns (bool)",
                    "function approveMintingRequest(uint256 requestID)",
                    "function balanceOf(uint256 coinID, address addr) view returns (uint256)",
                    "function transfer(uint256 coinID, address to, uint256 amount)",
                    "event CoinCreation(uint256 coinID, address creator)",
                    "event Approval(uint256 requestID)",
                    "event Transfer(uint256 coinID, address indexed from, address indexed to, uint256 amount)",
                    "event Conversion(uint256 coinID, address indexed from, address indexed to, uint256 amount)",
                ])
                .unwrap(),
            ),
            ContractDescriptor::new(
                GOVERNING_CONTRACT,
                EthAddress::from_low_u64_be(0xc3),
                parse_abi(&[
                    "function makeProposal(address addr, uint8 memberType, uint8 action)",
                    "function vote(uint256 proposalID)",
                    "function governors(address addr) view returns (bool)",
                    "event NewProposal(uint256 proposalID, address addr)",
                    "event NewVote(uint256 proposalID, uint256 voteCount)",
                ])
                .unwrap(),
            ),
        ];
        Registry::new(participants, contracts, RpcSettings::default())
    }

    /// One mock per participant node, reachable through the connector.
    pub struct MockNetwork {
        pub registry: Registry,
        pub connector: MockConnector,
        pub nodes: HashMap<&'static str, EthMockClient>,
    }

    impl MockNetwork {
        pub fn new() -> Self {
            let connector = MockConnector::default();
            let mut nodes = HashMap::new();
            for (name, _, port) in PARTICIPANTS {
                let node = EthMockClient::new();
                connector.add_client(&rpc_url(port), node.clone());
                nodes.insert(name, node);
            }
            Self {
                registry: registry(),
                connector,
                nodes,
            }
        }

        pub fn node(&self, name: &str) -> &EthMockClient {
            &self.nodes[name]
        }

        pub fn contract(&self, name: &str) -> &ContractDescriptor {
            self.registry.contract(name).unwrap()
        }

        pub fn address(&self, participant: &str) -> EthAddress {
            self.registry.participant(participant).unwrap().account.address
        }

        pub fn answer(&self, node: &str, contract: &str, method: &str, tokens: Vec<Token>) {
            self.node(node)
                .add_call_response(self.contract(contract), method, tokens);
        }

        pub fn fail_call(&self, node: &str, contract: &str, method: &str) {
            self.node(node).add_call_failure(
                self.contract(contract),
                method,
                MockFailure::Transport("connection refused".to_string()),
            );
        }

        // `method` sent through `node` executes, emitting `event` when given.
        pub fn execute(
            &self,
            node: &str,
            contract: &str,
            method: &str,
            event: Option<(&str, Vec<Token>)>,
        ) {
            let descriptor = self.contract(contract);
            let mock = self.node(node);
            let logs = match event {
                Some((name, tokens)) => vec![mock.event_log(descriptor, name, tokens)],
                None => vec![],
            };
            mock.add_send_receipt(descriptor, method, EthMockClient::executed_receipt(logs));
        }

        pub fn revert(&self, node: &str, contract: &str, method: &str) {
            let receipt: TransactionReceipt = EthMockClient::reverted_receipt();
            self.node(node)
                .add_send_receipt(self.contract(contract), method, receipt);
        }

        pub fn refuse(&self, node: &str, contract: &str, method: &str) {
            self.node(node).add_send_failure(
                self.contract(contract),
                method,
                MockFailure::Rpc {
                    code: -32000,
                    message: "execution reverted".to_string(),
                },
            );
        }

        pub fn context(&self) -> ScenarioContext<'_, MockConnector> {
            ScenarioContext::new(&self.registry, self.connector.clone())
        }

        pub fn assert_accounts_relocked(&self) {
            for (name, node) in &self.nodes {
                assert_eq!(node.unlock_count(), node.lock_count(), "{}", name);
            }
        }
    }

    pub fn harness() -> (Harness, SharedBuffer) {
        let buffer = SharedBuffer::default();
        (Harness::new(Box::new(buffer.clone())), buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::test_utils::*;
    use super::*;
    use crate::harness::ScenarioReport;
    use ethers::abi::Token;

    fn outcomes(reports: &[ScenarioReport]) -> Vec<ScenarioOutcome> {
        reports.iter().map(|r| r.outcome.clone()).collect()
    }

    #[tokio::test]
    async fn test_dependents_of_failed_scenario_are_skipped() {
        let network = MockNetwork::new();
        // Nothing changes on chain: the initial supply check passes, the mint
        // check sees the same supply and fails.
        network.answer("gov0", CBDC_CONTRACT, "supplyOf", vec![Token::Uint(1000.into())]);
        network.answer("gov0", CBDC_CONTRACT, "balanceOf", vec![Token::Uint(0.into())]);
        network.answer("gov0", CBDC_CONTRACT, "isMerchant", vec![Token::Uint(0.into())]);
        network.execute("gov0", CBDC_CONTRACT, "mint", None);
        for (node, method) in [
            ("bnk0", "mint"),
            ("bnk0", "allocate"),
            ("gov0", "allocate"),
            ("gov0", "convert"),
            ("smp0", "transfer"),
        ] {
            network.refuse(node, CBDC_CONTRACT, method);
        }

        let ctx = network.context();
        let (mut harness, buffer) = harness();
        run_suite::<CbdcScenario, _>(&ctx, &mut harness).await.unwrap();

        let outcomes = outcomes(harness.reports());
        assert_eq!(outcomes.len(), 10);
        assert_eq!(outcomes[0], ScenarioOutcome::Passed);
        assert_eq!(outcomes[1], ScenarioOutcome::Failed);
        // Allocation is refused, so the transfer and merchant checks that
        // need it are skipped, and so is the follow-up transfer.
        assert_eq!(outcomes[4], ScenarioOutcome::Failed);
        assert!(matches!(outcomes[7], ScenarioOutcome::Skipped(_)));
        assert!(matches!(outcomes[8], ScenarioOutcome::Skipped(_)));
        assert!(matches!(outcomes[9], ScenarioOutcome::Skipped(_)));
        assert!(buffer.contents().contains("prerequisite `allocate` did not pass"));
        network.assert_accounts_relocked();
    }

    #[tokio::test]
    async fn test_call_error_aborts_the_run() {
        let network = MockNetwork::new();
        network.fail_call("gov0", CBDC_CONTRACT, "supplyOf");

        let ctx = network.context();
        let (mut harness, _) = harness();
        let err = run_suite::<CbdcScenario, _>(&ctx, &mut harness)
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("initial-supply"));

        let summary = harness.summary();
        assert_eq!(summary.errored, 1);
        assert_eq!(harness.reports().len(), 1);
        network.assert_accounts_relocked();
    }
}
