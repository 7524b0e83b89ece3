// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::error::{ClientError, ClientResult};
use cbdc_config::ContractInfo;
use ethers::abi::{Abi, Event, Function};
use ethers::types::{Address as EthAddress, TxHash};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Decoded event parameters, keyed by parameter name.
pub type EventFields = serde_json::Map<String, Value>;

pub fn parse_address(address: &str) -> ClientResult<EthAddress> {
    EthAddress::from_str(address.trim())
        .map_err(|_| ClientError::InvalidAddress(address.to_string()))
}

// Lowercase, 0x-prefixed form used everywhere addresses are printed or passed
// as call arguments.
pub fn address_hex(address: &EthAddress) -> String {
    format!("{:#x}", address)
}

/// A node account the suite acts as. The address is typed, so two accounts
/// whose hex forms differ only in case are the same account.
#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    pub address: EthAddress,
    pub password: String,
}

impl Account {
    pub fn new(address: &str, password: impl Into<String>) -> ClientResult<Self> {
        Ok(Self {
            address: parse_address(address)?,
            password: password.into(),
        })
    }

    pub fn address_hex(&self) -> String {
        address_hex(&self.address)
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("address", &self.address_hex())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address_hex())
    }
}

/// A deployed contract: where it lives and how to talk to it.
#[derive(Clone, Debug)]
pub struct ContractDescriptor {
    pub name: String,
    pub address: EthAddress,
    pub abi: Abi,
}

impl ContractDescriptor {
    pub fn new(name: impl Into<String>, address: EthAddress, abi: Abi) -> Self {
        Self {
            name: name.into(),
            address,
            abi,
        }
    }

    pub fn from_info(name: &str, info: ContractInfo) -> ClientResult<Self> {
        let address = parse_address(&info.addr)?;
        let abi: Abi =
            serde_json::from_value(info.get_abi).map_err(|source| ClientError::MalformedAbi {
                contract: name.to_string(),
                source,
            })?;
        Ok(Self::new(name, address, abi))
    }

    pub fn function(&self, method: &str) -> ClientResult<&Function> {
        self.abi
            .function(method)
            .map_err(|_| ClientError::UnknownMethod {
                contract: self.name.clone(),
                method: method.to_string(),
            })
    }

    pub fn event(&self, event: &str) -> ClientResult<&Event> {
        self.abi.event(event).map_err(|_| ClientError::UnknownEvent {
            contract: self.name.clone(),
            event: event.to_string(),
        })
    }
}

/// Result of the liveness probe performed when connecting.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    Unreachable(String),
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected)
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Connected => write!(f, "connected"),
            ConnectionStatus::Unreachable(reason) => write!(f, "unreachable ({})", reason),
        }
    }
}

/// Why a state-changing transaction did not take effect.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RejectReason {
    #[error("transaction {tx_hash:#x} reverted")]
    Reverted { tx_hash: TxHash },
    #[error("node refused the transaction ({code}): {message}")]
    Refused { code: i64, message: String },
    #[error("no receipt was produced for the transaction")]
    Dropped,
    #[error("account unlock failed: {0}")]
    Unlock(String),
    #[error("transport failure: {0}")]
    Transport(String),
}

impl From<ClientError> for RejectReason {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Rpc { code, message } => RejectReason::Refused { code, message },
            ClientError::Unlock(reason) => RejectReason::Unlock(reason),
            other => RejectReason::Transport(other.to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SendOutcome {
    Executed {
        tx_hash: TxHash,
        // Present only when an event was requested and the receipt carries it.
        event: Option<EventFields>,
    },
    Rejected(RejectReason),
}

impl SendOutcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, SendOutcome::Rejected(_))
    }

    pub fn rejection(&self) -> Option<&RejectReason> {
        match self {
            SendOutcome::Rejected(reason) => Some(reason),
            SendOutcome::Executed { .. } => None,
        }
    }

    /// The requested event's fields, or `None` when the transaction was
    /// rejected or no event was asked for.
    pub fn event(&self) -> Option<&EventFields> {
        match self {
            SendOutcome::Executed { event, .. } => event.as_ref(),
            SendOutcome::Rejected(_) => None,
        }
    }

    // JSON view of `event()`, `null` standing for "no value".
    pub fn event_value(&self) -> Value {
        self.event()
            .cloned()
            .map(Value::Object)
            .unwrap_or(Value::Null)
    }

    pub fn event_field(&self, name: &str) -> Option<&Value> {
        self.event().and_then(|fields| fields.get(name))
    }
}
