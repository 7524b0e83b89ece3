// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! The `info.json` files written by the network tooling.

use crate::network::AccountSlot;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

// Per-node info file. Only the account table is of interest here.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct NodeInfo {
    pub acc_addrs: BTreeMap<String, String>,
}

impl NodeInfo {
    pub fn read(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read node info file {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("Malformed node info file {}", path.display()))
    }

    pub fn account_address(&self, slot: AccountSlot) -> Result<&str> {
        self.acc_addrs
            .get(slot.key())
            .map(String::as_str)
            .ok_or_else(|| anyhow!("Node info has no `acc_addrs.{}` entry", slot.key()))
    }
}

// Per-contract info file: deployed address and the compiler's ABI.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ContractInfo {
    pub addr: String,
    pub get_abi: serde_json::Value,
}

impl ContractInfo {
    pub fn read(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read contract info file {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("Malformed contract info file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_node_info() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("info.json");
        std::fs::write(
            &path,
            r#"{"node_addr": "0x1", "acc_addrs": {"main": "0xAbC", "account0": "0xdef"}, "is_running": true}"#,
        )
        .unwrap();
        let info = NodeInfo::read(&path).unwrap();
        assert_eq!(info.account_address(AccountSlot::Main).unwrap(), "0xAbC");
        assert_eq!(info.account_address(AccountSlot::Account0).unwrap(), "0xdef");
    }

    #[test]
    fn test_missing_account_slot() {
        let info = NodeInfo {
            acc_addrs: BTreeMap::from([("main".to_string(), "0x1".to_string())]),
        };
        let err = info.account_address(AccountSlot::Account0).unwrap_err();
        assert!(err.to_string().contains("acc_addrs.account0"));
    }

    #[test]
    fn test_read_contract_info() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("info.json");
        std::fs::write(&path, r#"{"addr": "0x00000000000000000000000000000000000000aa", "get_abi": []}"#)
            .unwrap();
        let info = ContractInfo::read(&path).unwrap();
        assert!(info.get_abi.as_array().unwrap().is_empty());

        let missing = ContractInfo::read(&dir.path().join("nope.json")).unwrap_err();
        assert!(missing.to_string().contains("Failed to read contract info file"));
    }
}
