// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! A mock implementation of the node client, plus a connector handing it out.

use crate::error::{ClientError, ClientResult};
use crate::eth_client::{Connector, EthClient, EthClientInner};
use crate::types::ContractDescriptor;
use async_trait::async_trait;
use cbdc_config::RpcSettings;
use ethers::abi::Token;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{
    Address as EthAddress, Bytes, Log, NameOrAddress, TransactionReceipt, H256, U256, U64,
};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Selector = [u8; 4];

/// Every request the mock received, in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MockRequest {
    IsListening,
    Unlock {
        address: EthAddress,
        duration_secs: u64,
    },
    Lock {
        address: EthAddress,
    },
    Call {
        from: Option<EthAddress>,
        to: Option<EthAddress>,
        selector: Option<Selector>,
    },
    Send {
        from: Option<EthAddress>,
        to: Option<EthAddress>,
        selector: Option<Selector>,
        gas: Option<U256>,
    },
}

#[derive(Clone, Debug)]
pub enum MockFailure {
    Rpc { code: i64, message: String },
    Transport(String),
}

impl From<MockFailure> for ClientError {
    fn from(failure: MockFailure) -> Self {
        match failure {
            MockFailure::Rpc { code, message } => ClientError::Rpc { code, message },
            MockFailure::Transport(reason) => ClientError::Provider(reason),
        }
    }
}

type SendResponse = Result<Option<TransactionReceipt>, MockFailure>;

// Mock client used in test environments. Responses are keyed by contract
// address and method selector, so one mock can serve several contracts.
#[allow(clippy::type_complexity)]
#[derive(Clone, Debug)]
pub struct EthMockClient {
    listening: Arc<Mutex<bool>>,
    unlock_failure: Arc<Mutex<Option<MockFailure>>>,
    // Queued per method; the last response keeps answering once the others
    // are consumed.
    call_responses:
        Arc<Mutex<HashMap<(EthAddress, Selector), VecDeque<Result<Bytes, MockFailure>>>>>,
    send_responses: Arc<Mutex<HashMap<(EthAddress, Selector), VecDeque<SendResponse>>>>,
    requests: Arc<Mutex<Vec<MockRequest>>>,
    tx_counter: Arc<AtomicU64>,
}

impl Default for EthMockClient {
    fn default() -> Self {
        Self::new()
    }
}

impl EthMockClient {
    pub fn new() -> Self {
        Self {
            listening: Arc::new(Mutex::new(true)),
            unlock_failure: Default::default(),
            call_responses: Default::default(),
            send_responses: Default::default(),
            requests: Default::default(),
            tx_counter: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn set_listening(&self, listening: bool) {
        *self.listening.lock().unwrap() = listening;
    }

    pub fn fail_unlocks(&self, failure: MockFailure) {
        *self.unlock_failure.lock().unwrap() = Some(failure);
    }

    /// Queue the ABI encoding of `tokens` as the next answer to `method`.
    pub fn add_call_response(&self, contract: &ContractDescriptor, method: &str, tokens: Vec<Token>) {
        self.queue_call_response(contract, method, Ok(ethers::abi::encode(&tokens).into()));
    }

    pub fn add_call_failure(&self, contract: &ContractDescriptor, method: &str, failure: MockFailure) {
        self.queue_call_response(contract, method, Err(failure));
    }

    fn queue_call_response(
        &self,
        contract: &ContractDescriptor,
        method: &str,
        response: Result<Bytes, MockFailure>,
    ) {
        let key = Self::key(contract, method);
        self.call_responses
            .lock()
            .unwrap()
            .entry(key)
            .or_default()
            .push_back(response);
    }

    pub fn add_send_receipt(
        &self,
        contract: &ContractDescriptor,
        method: &str,
        receipt: TransactionReceipt,
    ) {
        self.add_send_response(contract, method, Ok(Some(receipt)));
    }

    pub fn add_send_failure(&self, contract: &ContractDescriptor, method: &str, failure: MockFailure) {
        self.add_send_response(contract, method, Err(failure));
    }

    /// Queue `response` as the next answer to a transaction calling `method`.
    pub fn add_send_response(
        &self,
        contract: &ContractDescriptor,
        method: &str,
        response: SendResponse,
    ) {
        let key = Self::key(contract, method);
        self.send_responses
            .lock()
            .unwrap()
            .entry(key)
            .or_default()
            .push_back(response);
    }

    pub fn executed_receipt(logs: Vec<Log>) -> TransactionReceipt {
        TransactionReceipt {
            status: Some(U64::one()),
            logs,
            ..Default::default()
        }
    }

    pub fn reverted_receipt() -> TransactionReceipt {
        TransactionReceipt {
            status: Some(U64::zero()),
            ..Default::default()
        }
    }

    /// A log as `contract` would emit it for `event`. Indexed parameters go
    /// to the topics, the rest is ABI encoded into the data.
    pub fn event_log(&self, contract: &ContractDescriptor, event: &str, tokens: Vec<Token>) -> Log {
        let event = contract.event(event).unwrap();
        let mut topics = vec![event.signature()];
        let mut data = vec![];
        for (param, token) in event.inputs.iter().zip(tokens) {
            if param.indexed {
                topics.push(H256::from_slice(&ethers::abi::encode(&[token])));
            } else {
                data.push(token);
            }
        }
        Log {
            address: contract.address,
            topics,
            data: ethers::abi::encode(&data).into(),
            ..Default::default()
        }
    }

    pub fn requests(&self) -> Vec<MockRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn unlock_count(&self) -> usize {
        self.count(|r| matches!(r, MockRequest::Unlock { .. }))
    }

    pub fn lock_count(&self) -> usize {
        self.count(|r| matches!(r, MockRequest::Lock { .. }))
    }

    pub fn call_count(&self) -> usize {
        self.count(|r| matches!(r, MockRequest::Call { .. }))
    }

    pub fn send_count(&self) -> usize {
        self.count(|r| matches!(r, MockRequest::Send { .. }))
    }

    fn count(&self, filter: impl Fn(&MockRequest) -> bool) -> usize {
        self.requests.lock().unwrap().iter().filter(|r| filter(r)).count()
    }

    fn record(&self, request: MockRequest) {
        self.requests.lock().unwrap().push(request);
    }

    fn key(contract: &ContractDescriptor, method: &str) -> (EthAddress, Selector) {
        let function = contract.function(method).unwrap();
        (contract.address, function.short_signature())
    }

    fn tx_parts(tx: &TypedTransaction) -> (Option<EthAddress>, Option<EthAddress>, Option<Selector>) {
        let to = match tx.to() {
            Some(NameOrAddress::Address(address)) => Some(*address),
            _ => None,
        };
        let selector = tx
            .data()
            .filter(|data| data.len() >= 4)
            .map(|data| [data[0], data[1], data[2], data[3]]);
        (tx.from().copied(), to, selector)
    }

    fn not_configured(what: &str) -> ClientError {
        ClientError::Provider(format!("no mock response configured for {}", what))
    }
}

// Pop the front of the queue for `key`, leaving the last response in place.
fn next_response<T: Clone>(
    responses: &mut HashMap<(EthAddress, Selector), VecDeque<T>>,
    key: &(EthAddress, Selector),
) -> Option<T> {
    match responses.get_mut(key) {
        Some(queue) if queue.len() > 1 => queue.pop_front(),
        Some(queue) => queue.front().cloned(),
        None => None,
    }
}

#[async_trait]
impl EthClientInner for EthMockClient {
    async fn is_listening(&self) -> ClientResult<bool> {
        self.record(MockRequest::IsListening);
        Ok(*self.listening.lock().unwrap())
    }

    async fn unlock_account(
        &self,
        address: EthAddress,
        _password: &str,
        duration: Duration,
    ) -> ClientResult<bool> {
        self.record(MockRequest::Unlock {
            address,
            duration_secs: duration.as_secs(),
        });
        match self.unlock_failure.lock().unwrap().clone() {
            Some(failure) => Err(failure.into()),
            None => Ok(true),
        }
    }

    async fn lock_account(&self, address: EthAddress) -> ClientResult<bool> {
        self.record(MockRequest::Lock { address });
        Ok(true)
    }

    async fn call(&self, tx: &TypedTransaction) -> ClientResult<Bytes> {
        let (from, to, selector) = Self::tx_parts(tx);
        self.record(MockRequest::Call { from, to, selector });
        let (Some(to), Some(selector)) = (to, selector) else {
            return Err(Self::not_configured("call without target"));
        };
        let response = next_response(&mut self.call_responses.lock().unwrap(), &(to, selector));
        match response {
            Some(response) => response.map_err(Into::into),
            None => Err(Self::not_configured("call")),
        }
    }

    async fn send_transaction(
        &self,
        tx: TypedTransaction,
    ) -> ClientResult<Option<TransactionReceipt>> {
        let (from, to, selector) = Self::tx_parts(&tx);
        self.record(MockRequest::Send {
            from,
            to,
            selector,
            gas: tx.gas().copied(),
        });
        let (Some(to), Some(selector)) = (to, selector) else {
            return Err(Self::not_configured("transaction without target"));
        };
        let response = next_response(&mut self.send_responses.lock().unwrap(), &(to, selector));
        match response {
            Some(Ok(Some(mut receipt))) => {
                receipt.transaction_hash =
                    H256::from_low_u64_be(self.tx_counter.fetch_add(1, Ordering::SeqCst));
                receipt.from = from.unwrap_or_default();
                receipt.to = Some(to);
                Ok(Some(receipt))
            }
            Some(Ok(None)) => Ok(None),
            Some(Err(failure)) => Err(failure.into()),
            None => Err(Self::not_configured("transaction")),
        }
    }
}

/// Hands out clients sharing the mock registered for each URL, or a default
/// mock when none was registered.
#[derive(Clone, Debug, Default)]
pub struct MockConnector {
    default: EthMockClient,
    clients: Arc<Mutex<HashMap<String, EthMockClient>>>,
    connected: Arc<Mutex<Vec<String>>>,
}

impl MockConnector {
    pub fn new(default: EthMockClient) -> Self {
        Self {
            default,
            ..Default::default()
        }
    }

    pub fn add_client(&self, rpc_url: &str, client: EthMockClient) {
        self.clients
            .lock()
            .unwrap()
            .insert(rpc_url.to_string(), client);
    }

    pub fn connected_urls(&self) -> Vec<String> {
        self.connected.lock().unwrap().clone()
    }
}

#[async_trait]
impl Connector for MockConnector {
    type Inner = EthMockClient;

    async fn connect(
        &self,
        rpc_url: &str,
        settings: &RpcSettings,
    ) -> ClientResult<EthClient<Self::Inner>> {
        self.connected.lock().unwrap().push(rpc_url.to_string());
        let client = self
            .clients
            .lock()
            .unwrap()
            .get(rpc_url)
            .cloned()
            .unwrap_or_else(|| self.default.clone());
        Ok(EthClient::connect_with(client, rpc_url, settings).await)
    }
}
