// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::Config;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_NETWORK_DIR: &str = "../network/cbdc-net";
pub const DEFAULT_ACCOUNT_PASSWORD: &str = "root";
pub const DEFAULT_UNLOCK_DURATION_SECS: u64 = 100;
pub const DEFAULT_GAS_LIMIT: u64 = 1_000_000_000;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

// Which account of a node's `acc_addrs` table a participant acts as.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AccountSlot {
    Main,
    Account0,
}

impl AccountSlot {
    // Key of this slot inside the node info file.
    pub fn key(&self) -> &'static str {
        match self {
            AccountSlot::Main => "main",
            AccountSlot::Account0 => "account0",
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ParticipantRole {
    Validator,
    Governor,
    Maintainer,
    Banker,
    Observer,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct ParticipantConfig {
    // Path of the node's `info.json`, relative to `network-dir` unless absolute.
    pub info_path: PathBuf,
    pub account_slot: AccountSlot,
    // HTTP JSON-RPC endpoint of the node this participant talks to.
    pub rpc_url: String,
    pub role: ParticipantRole,
}

// Knobs applied to every RPC operation of the suite.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct RpcSettings {
    // How long an account stays unlocked for one call or send.
    #[serde(default = "default_unlock_duration_secs")]
    pub unlock_duration_secs: u64,
    // Gas allowance attached to every transaction.
    #[serde(default = "default_gas_limit")]
    pub gas_limit: u64,
    // Interval between receipt polls while a transaction is pending.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for RpcSettings {
    fn default() -> Self {
        Self {
            unlock_duration_secs: DEFAULT_UNLOCK_DURATION_SECS,
            gas_limit: DEFAULT_GAS_LIMIT,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl RpcSettings {
    pub fn unlock_duration(&self) -> Duration {
        Duration::from_secs(self.unlock_duration_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn default_unlock_duration_secs() -> u64 {
    DEFAULT_UNLOCK_DURATION_SECS
}

fn default_gas_limit() -> u64 {
    DEFAULT_GAS_LIMIT
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_account_password() -> String {
    DEFAULT_ACCOUNT_PASSWORD.to_string()
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct NetworkConfig {
    // Root of the generated network, info paths are resolved against it.
    pub network_dir: PathBuf,
    // Password every participant account is unlocked with.
    #[serde(default = "default_account_password")]
    pub account_password: String,
    #[serde(default)]
    pub rpc: RpcSettings,
    pub participants: BTreeMap<String, ParticipantConfig>,
    // Contract name to the path of its `info.json`.
    pub contracts: BTreeMap<String, PathBuf>,
}

impl Config for NetworkConfig {}

impl NetworkConfig {
    /// The topology the local docker network is generated with: one central
    /// bank validator, two governors, a maintainer and two bankers, each
    /// exposing RPC on a fixed localhost port.
    pub fn local_default(network_dir: impl Into<PathBuf>) -> Self {
        let participant = |info_path: &str,
                           account_slot: AccountSlot,
                           port: u16,
                           role: ParticipantRole| ParticipantConfig {
            info_path: PathBuf::from(info_path),
            account_slot,
            rpc_url: format!("http://127.0.0.1:{}", port),
            role,
        };
        let participants = BTreeMap::from([
            (
                "smp0".to_string(),
                participant(
                    "central-bank/validators/central-bank.val0/info.json",
                    AccountSlot::Account0,
                    22000,
                    ParticipantRole::Validator,
                ),
            ),
            (
                "gov0".to_string(),
                participant(
                    "central-bank/governors/central-bank.gov0/info.json",
                    AccountSlot::Main,
                    22005,
                    ParticipantRole::Governor,
                ),
            ),
            (
                "gov1".to_string(),
                participant(
                    "government/governors/government.gov0/info.json",
                    AccountSlot::Main,
                    22006,
                    ParticipantRole::Governor,
                ),
            ),
            (
                "mnt0".to_string(),
                participant(
                    "government/maintainers/government.mnt0/info.json",
                    AccountSlot::Main,
                    22004,
                    ParticipantRole::Maintainer,
                ),
            ),
            (
                "bnk0".to_string(),
                participant(
                    "aclydia/bankers/aclydia.bnk0/info.json",
                    AccountSlot::Main,
                    22007,
                    ParticipantRole::Banker,
                ),
            ),
            (
                "bnk1".to_string(),
                participant(
                    "bb-bank/bankers/bb-bank.bnk0/info.json",
                    AccountSlot::Main,
                    22008,
                    ParticipantRole::Banker,
                ),
            ),
        ]);
        let contracts = BTreeMap::from([
            (
                "governing".to_string(),
                PathBuf::from("contracts/Governing/info.json"),
            ),
            ("cbdc".to_string(), PathBuf::from("contracts/CBDC/info.json")),
            ("ccbdc".to_string(), PathBuf::from("contracts/CCBDC/info.json")),
        ]);
        Self {
            network_dir: network_dir.into(),
            account_password: default_account_password(),
            rpc: RpcSettings::default(),
            participants,
            contracts,
        }
    }

    // Resolve an info path from this config against `network_dir`.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.network_dir.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_default_topology() {
        let config = NetworkConfig::local_default(DEFAULT_NETWORK_DIR);
        assert_eq!(config.participants.len(), 6);
        assert_eq!(config.contracts.len(), 3);

        let smp0 = &config.participants["smp0"];
        assert_eq!(smp0.account_slot, AccountSlot::Account0);
        assert_eq!(smp0.rpc_url, "http://127.0.0.1:22000");
        assert_eq!(config.participants["bnk1"].rpc_url, "http://127.0.0.1:22008");
        assert_eq!(config.rpc.unlock_duration().as_secs(), 100);
        assert_eq!(config.rpc.gas_limit, 1_000_000_000);
        assert_eq!(
            config.resolve(&config.contracts["cbdc"]),
            PathBuf::from("../network/cbdc-net/contracts/CBDC/info.json")
        );
        assert_eq!(
            config.resolve(Path::new("/abs/info.json")),
            PathBuf::from("/abs/info.json")
        );
    }

    #[test]
    fn test_save_and_load_yaml_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let config = NetworkConfig::local_default("/tmp/net");
        for name in ["config.yaml", "config.json"] {
            let path = dir.path().join(name);
            config.save(&path).unwrap();
            assert_eq!(NetworkConfig::load(&path).unwrap(), config);
        }
        let yaml = std::fs::read_to_string(dir.path().join("config.yaml")).unwrap();
        assert!(yaml.contains("unlock-duration-secs: 100"));
        assert!(yaml.contains("account-slot: account0"));
    }

    #[test]
    fn test_rpc_defaults_when_omitted() {
        let yaml = r#"
network-dir: /net
participants:
  gov0:
    info-path: gov0/info.json
    account-slot: main
    rpc-url: http://127.0.0.1:22005
    role: governor
contracts:
  cbdc: contracts/CBDC/info.json
"#;
        let config: NetworkConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.account_password, "root");
        assert_eq!(config.rpc, RpcSettings::default());
        assert_eq!(config.participants["gov0"].role, ParticipantRole::Governor);
    }
}
