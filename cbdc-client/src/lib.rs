// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

pub mod abi_codec;
pub mod error;
pub mod eth_client;
#[cfg(any(test, feature = "test-utils"))]
pub mod eth_mock_client;
pub mod registry;
pub mod types;
pub mod utils;

pub use error::{ClientError, ClientResult};
pub use eth_client::{Connector, EthClient, EthClientInner, HttpConnector};
pub use registry::{Participant, Registry};
pub use types::{
    Account, ConnectionStatus, ContractDescriptor, EventFields, RejectReason, SendOutcome,
};
