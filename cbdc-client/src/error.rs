// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use ethers::providers::{ProviderError, RpcError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Invalid address {0:?}")]
    InvalidAddress(String),
    #[error("Unknown participant `{0}`")]
    UnknownParticipant(String),
    #[error("Unknown contract `{0}`")]
    UnknownContract(String),
    #[error("Contract `{contract}` has no method `{method}`")]
    UnknownMethod { contract: String, method: String },
    #[error("Contract `{contract}` has no event `{event}`")]
    UnknownEvent { contract: String, event: String },
    #[error("Malformed ABI for contract `{contract}`: {source}")]
    MalformedAbi {
        contract: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Arguments do not match `{method}`: {reason}")]
    ArgumentMismatch { method: String, reason: String },
    #[error("ABI error: {0}")]
    Abi(#[from] ethers::abi::Error),
    #[error("Invalid RPC url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("Account unlock failed: {0}")]
    Unlock(String),
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("Provider error: {0}")]
    Provider(String),
    #[error("{0}")]
    Generic(String),
}

pub type ClientResult<T> = Result<T, ClientError>;

impl From<ProviderError> for ClientError {
    fn from(err: ProviderError) -> Self {
        // JSON-RPC error responses carry the node's reason, keep it apart
        // from transport failures.
        match err.as_error_response() {
            Some(response) => ClientError::Rpc {
                code: response.code,
                message: response.message.clone(),
            },
            None => ClientError::Provider(err.to_string()),
        }
    }
}

impl From<anyhow::Error> for ClientError {
    fn from(err: anyhow::Error) -> Self {
        ClientError::Config(format!("{:#}", err))
    }
}
