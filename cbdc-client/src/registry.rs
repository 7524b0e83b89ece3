// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::error::{ClientError, ClientResult};
use crate::types::{Account, ContractDescriptor};
use cbdc_config::{ContractInfo, NetworkConfig, NodeInfo, ParticipantRole, RpcSettings};
use std::collections::BTreeMap;
use tracing::info;

/// A named actor of the suite: the account it signs with and the node it
/// talks to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Participant {
    pub name: String,
    pub role: ParticipantRole,
    pub account: Account,
    pub rpc_url: String,
}

/// Participants and contracts, assembled once at startup from the network's
/// info files and passed by reference afterwards.
#[derive(Clone, Debug)]
pub struct Registry {
    participants: BTreeMap<String, Participant>,
    contracts: BTreeMap<String, ContractDescriptor>,
    settings: RpcSettings,
}

impl Registry {
    pub fn load(config: &NetworkConfig) -> ClientResult<Self> {
        let mut participants = BTreeMap::new();
        for (name, participant) in &config.participants {
            let info = NodeInfo::read(&config.resolve(&participant.info_path))?;
            let address = info.account_address(participant.account_slot)?;
            let account = Account::new(address, config.account_password.clone())?;
            participants.insert(
                name.clone(),
                Participant {
                    name: name.clone(),
                    role: participant.role,
                    account,
                    rpc_url: participant.rpc_url.clone(),
                },
            );
        }

        let mut contracts = BTreeMap::new();
        for (name, path) in &config.contracts {
            let info = ContractInfo::read(&config.resolve(path))?;
            contracts.insert(name.clone(), ContractDescriptor::from_info(name, info)?);
        }

        info!(
            participants = participants.len(),
            contracts = contracts.len(),
            network_dir = %config.network_dir.display(),
            "Loaded network registry"
        );
        Ok(Self::new(participants.into_values(), contracts.into_values(), config.rpc.clone()))
    }

    pub fn new(
        participants: impl IntoIterator<Item = Participant>,
        contracts: impl IntoIterator<Item = ContractDescriptor>,
        settings: RpcSettings,
    ) -> Self {
        Self {
            participants: participants
                .into_iter()
                .map(|p| (p.name.clone(), p))
                .collect(),
            contracts: contracts
                .into_iter()
                .map(|c| (c.name.clone(), c))
                .collect(),
            settings,
        }
    }

    pub fn participant(&self, name: &str) -> ClientResult<&Participant> {
        self.participants
            .get(name)
            .ok_or_else(|| ClientError::UnknownParticipant(name.to_string()))
    }

    pub fn contract(&self, name: &str) -> ClientResult<&ContractDescriptor> {
        self.contracts
            .get(name)
            .ok_or_else(|| ClientError::UnknownContract(name.to_string()))
    }

    pub fn participants(&self) -> impl Iterator<Item = &Participant> {
        self.participants.values()
    }

    pub fn contracts(&self) -> impl Iterator<Item = &ContractDescriptor> {
        self.contracts.values()
    }

    pub fn settings(&self) -> &RpcSettings {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cbdc_config::{AccountSlot, ParticipantConfig};
    use std::path::{Path, PathBuf};

    fn write(dir: &Path, relative: &str, content: &str) {
        let path = dir.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn config(dir: &Path) -> NetworkConfig {
        write(
            dir,
            "gov0/info.json",
            r#"{"acc_addrs": {"main": "0x00000000000000000000000000000000000000A0", "account0": "0x00000000000000000000000000000000000000a1"}}"#,
        );
        write(
            dir,
            "contracts/CBDC/info.json",
            r#"{"addr": "0x00000000000000000000000000000000000000c0", "get_abi": [
                {"type": "function", "name": "mint", "stateMutability": "nonpayable",
                 "inputs": [{"name": "to", "type": "address"}, {"name": "amount", "type": "uint256"}],
                 "outputs": []}
            ]}"#,
        );
        NetworkConfig {
            network_dir: dir.to_path_buf(),
            account_password: "secret".to_string(),
            rpc: RpcSettings::default(),
            participants: BTreeMap::from([(
                "gov0".to_string(),
                ParticipantConfig {
                    info_path: PathBuf::from("gov0/info.json"),
                    account_slot: AccountSlot::Account0,
                    rpc_url: "http://127.0.0.1:22005".to_string(),
                    role: ParticipantRole::Governor,
                },
            )]),
            contracts: BTreeMap::from([(
                "cbdc".to_string(),
                PathBuf::from("contracts/CBDC/info.json"),
            )]),
        }
    }

    #[test]
    fn test_load_registry() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Registry::load(&config(dir.path())).unwrap();

        let gov0 = registry.participant("gov0").unwrap();
        assert_eq!(
            gov0.account.address_hex(),
            "0x00000000000000000000000000000000000000a1"
        );
        assert_eq!(gov0.account.password, "secret");
        assert_eq!(gov0.role, ParticipantRole::Governor);
        assert_eq!(gov0.rpc_url, "http://127.0.0.1:22005");

        let cbdc = registry.contract("cbdc").unwrap();
        assert!(cbdc.function("mint").is_ok());
        assert_eq!(registry.participants().count(), 1);
        assert_eq!(
            registry.contracts().map(|c| c.name.as_str()).collect::<Vec<_>>(),
            vec!["cbdc"]
        );
    }

    #[test]
    fn test_unknown_names() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Registry::load(&config(dir.path())).unwrap();
        assert!(matches!(
            registry.participant("gov9"),
            Err(ClientError::UnknownParticipant(_))
        ));
        assert!(matches!(
            registry.contract("ccbdc"),
            Err(ClientError::UnknownContract(_))
        ));
    }

    #[test]
    fn test_missing_info_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config(dir.path());
        config.contracts.insert(
            "ccbdc".to_string(),
            PathBuf::from("contracts/CCBDC/info.json"),
        );
        let err = Registry::load(&config).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
        assert!(err.to_string().contains("CCBDC"));
    }
}
