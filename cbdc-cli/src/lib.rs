// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use anyhow::Context;
use cbdc_client::utils::wait_for_node_to_be_up;
use cbdc_client::{ConnectionStatus, Connector, Registry};
use cbdc_config::network::DEFAULT_NETWORK_DIR;
use cbdc_config::{Config, NetworkConfig};
use clap::*;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

pub mod context;
pub mod harness;
pub mod scenarios;

use context::ScenarioContext;
use harness::{Harness, SuiteSummary};
use scenarios::{run_suite, CbdcScenario, CcbdcScenario, GoverningScenario};

#[derive(Parser)]
#[clap(rename_all = "kebab-case")]
pub struct Args {
    // Suite config file. Without one the local docker topology is used.
    #[clap(long = "config-path", global = true)]
    pub config_path: Option<PathBuf>,
    // Root of the generated network, used when no config file is given.
    #[clap(long = "network-dir", global = true, default_value = DEFAULT_NETWORK_DIR)]
    pub network_dir: PathBuf,
    #[clap(subcommand)]
    pub command: CbdcCommand,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Suite {
    Cbdc,
    Ccbdc,
    Governing,
    All,
}

#[derive(Parser)]
#[clap(rename_all = "kebab-case")]
pub enum CbdcCommand {
    // Run scenario suites against the network
    #[clap(name = "run")]
    Run {
        #[clap(long, value_enum, default_value = "all")]
        suite: Suite,
        // Exit with an error unless every scenario passed
        #[clap(long)]
        strict: bool,
        // Wait up to this many seconds for every node to answer first
        #[clap(long = "wait-secs")]
        wait_secs: Option<u64>,
    },
    // Probe every participant's node
    #[clap(name = "check-nodes")]
    CheckNodes,
    // Read a contract method as a participant
    #[clap(name = "call")]
    Call {
        #[clap(long)]
        contract: String,
        #[clap(long = "as")]
        participant: String,
        #[clap(long)]
        method: String,
        // Arguments as a JSON array
        #[clap(long, default_value = "[]")]
        args: String,
    },
    // Send a transaction to a contract method as a participant
    #[clap(name = "send")]
    Send {
        #[clap(long)]
        contract: String,
        #[clap(long = "as")]
        participant: String,
        #[clap(long)]
        method: String,
        #[clap(long, default_value = "[]")]
        args: String,
        // Event to decode from the receipt
        #[clap(long)]
        event: Option<String>,
    },
    #[clap(name = "create-config-template")]
    CreateConfigTemplate { path: PathBuf },
}

pub fn load_network_config(
    config_path: Option<&Path>,
    network_dir: &Path,
) -> anyhow::Result<NetworkConfig> {
    match config_path {
        Some(path) => NetworkConfig::load(path)
            .with_context(|| format!("Couldn't load config {}", path.display())),
        None => Ok(NetworkConfig::local_default(network_dir)),
    }
}

pub fn generate_config_template_and_write_to_file(
    path: &Path,
    network_dir: &Path,
) -> anyhow::Result<()> {
    NetworkConfig::local_default(network_dir)
        .save(path)
        .with_context(|| format!("Couldn't write config template to {}", path.display()))
}

pub fn parse_args_json(args: &str) -> anyhow::Result<serde_json::Value> {
    let value: serde_json::Value =
        serde_json::from_str(args).with_context(|| format!("Invalid JSON arguments {}", args))?;
    if !value.is_array() {
        anyhow::bail!("Arguments must be a JSON array, got {}", value);
    }
    Ok(value)
}

/// Run the chosen suites in order and print the summary. A scenario error
/// stops the run; the summary is printed before it is returned.
pub async fn run_suites<C: Connector>(
    ctx: &ScenarioContext<'_, C>,
    harness: &mut Harness,
    suite: Suite,
) -> anyhow::Result<SuiteSummary> {
    let result = match suite {
        Suite::Cbdc => run_suite::<CbdcScenario, _>(ctx, harness).await,
        Suite::Ccbdc => run_suite::<CcbdcScenario, _>(ctx, harness).await,
        Suite::Governing => run_suite::<GoverningScenario, _>(ctx, harness).await,
        Suite::All => run_all(ctx, harness).await,
    };
    let summary = harness.print_summary();
    result.map(|_| summary)
}

async fn run_all<C: Connector>(
    ctx: &ScenarioContext<'_, C>,
    harness: &mut Harness,
) -> anyhow::Result<()> {
    run_suite::<CbdcScenario, _>(ctx, harness).await?;
    run_suite::<CcbdcScenario, _>(ctx, harness).await?;
    run_suite::<GoverningScenario, _>(ctx, harness).await
}

/// Liveness of every participant's node, in registry order.
pub async fn check_nodes<C: Connector>(
    ctx: &ScenarioContext<'_, C>,
) -> anyhow::Result<Vec<(String, ConnectionStatus)>> {
    let mut statuses = vec![];
    for participant in ctx.registry().participants() {
        let status = ctx.status(&participant.name).await?;
        statuses.push((participant.name.clone(), status));
    }
    Ok(statuses)
}

pub async fn wait_for_nodes<C: Connector>(
    registry: &Registry,
    connector: &C,
    timeout: Duration,
) -> anyhow::Result<()> {
    for participant in registry.participants() {
        let mut client = connector
            .connect(&participant.rpc_url, registry.settings())
            .await?;
        wait_for_node_to_be_up(&mut client, timeout).await?;
        info!(participant = %participant.name, rpc_url = %participant.rpc_url, "Node is up");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenarios::test_utils::*;
    use cbdc_client::eth_mock_client::{EthMockClient, MockConnector};

    #[test]
    fn test_parse_cli_args() {
        let args = Args::parse_from([
            "cbdc-cli",
            "run",
            "--suite",
            "governing",
            "--strict",
            "--network-dir",
            "/net",
        ]);
        assert_eq!(args.network_dir, PathBuf::from("/net"));
        assert!(args.config_path.is_none());
        match args.command {
            CbdcCommand::Run {
                suite,
                strict,
                wait_secs,
            } => {
                assert_eq!(suite, Suite::Governing);
                assert!(strict);
                assert_eq!(wait_secs, None);
            }
            _ => panic!("expected the run command"),
        }

        let args = Args::parse_from([
            "cbdc-cli",
            "send",
            "--contract",
            "cbdc",
            "--as",
            "gov0",
            "--method",
            "mint",
            "--args",
            r#"["0x00000000000000000000000000000000000000a4", 100]"#,
            "--event",
            "Minting",
        ]);
        assert_eq!(args.network_dir, PathBuf::from(DEFAULT_NETWORK_DIR));
        assert!(matches!(
            args.command,
            CbdcCommand::Send { ref participant, ref event, .. }
                if participant == "gov0" && event.as_deref() == Some("Minting")
        ));
    }

    #[test]
    fn test_parse_args_json() {
        assert_eq!(
            parse_args_json(r#"["0xab", 1]"#).unwrap(),
            serde_json::json!(["0xab", 1])
        );
        assert!(parse_args_json(r#"{"to": "0xab"}"#).is_err());
        assert!(parse_args_json("not json").is_err());
    }

    #[test]
    fn test_config_template_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cbdc.yaml");
        generate_config_template_and_write_to_file(&path, Path::new("/net")).unwrap();
        let loaded = load_network_config(Some(&path), Path::new("/ignored")).unwrap();
        assert_eq!(loaded, NetworkConfig::local_default("/net"));

        let err = load_network_config(Some(&dir.path().join("missing.yaml")), Path::new("/net"))
            .unwrap_err();
        assert!(err.to_string().contains("missing.yaml"));
    }

    #[tokio::test]
    async fn test_check_nodes_reports_unreachable_nodes() {
        let network = MockNetwork::new();
        network.node("bnk1").set_listening(false);
        let ctx = network.context();
        let statuses = check_nodes(&ctx).await.unwrap();
        assert_eq!(statuses.len(), 6);
        for (name, status) in statuses {
            assert_eq!(status.is_connected(), name != "bnk1", "{}", name);
        }
    }

    #[tokio::test]
    async fn test_wait_for_nodes_times_out() {
        let registry = registry();
        let down = EthMockClient::new();
        down.set_listening(false);
        let connector = MockConnector::new(down);
        let err = wait_for_nodes(&registry, &connector, Duration::from_millis(200))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not up and running"));
    }

    #[tokio::test]
    async fn test_run_all_stops_at_first_error() {
        let network = MockNetwork::new();
        // No responses are configured, so the first read fails.
        let ctx = network.context();
        let (mut harness, buffer) = harness();
        let err = run_suites(&ctx, &mut harness, Suite::All).await.unwrap_err();
        assert!(format!("{:#}", err).contains("no mock response configured"));
        assert!(buffer.contents().contains("[SUMMARY]"));
        assert_eq!(harness.summary().errored, 1);
        assert_eq!(harness.reports().len(), 1);
    }
}
