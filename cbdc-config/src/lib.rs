// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration for the CBDC network contract test suite.
//!
//! The suite is driven by a [`NetworkConfig`] that names every participant
//! node (its account, RPC endpoint and role) and every deployed contract.
//! Accounts and contracts themselves are read from the `info.json` files the
//! network tooling writes next to each node and contract, see [`info`].

use anyhow::Result;
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;

pub mod info;
pub mod network;

pub use info::{ContractInfo, NodeInfo};
pub use network::{AccountSlot, NetworkConfig, ParticipantConfig, ParticipantRole, RpcSettings};

// Load/save for any serde config. YAML for `.yaml`/`.yml`, JSON otherwise.
pub trait Config: Serialize + DeserializeOwned {
    fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: Self = if is_yaml(path) {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };
        Ok(config)
    }

    fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = if is_yaml(path) {
            serde_yaml::to_string(self)?
        } else {
            serde_json::to_string_pretty(self)?
        };
        std::fs::write(path, content)?;
        Ok(())
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml") | Some("yml")
    )
}
