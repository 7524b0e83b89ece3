// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use cbdc_cli::context::ScenarioContext;
use cbdc_cli::harness::Harness;
use cbdc_cli::{
    check_nodes, generate_config_template_and_write_to_file, load_network_config,
    parse_args_json, run_suites, wait_for_nodes, Args, CbdcCommand,
};
use cbdc_client::{HttpConnector, Registry, SendOutcome};
use clap::*;
use crossterm::style::Stylize;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    let (_guard, _filter_handle) = telemetry_subscribers::TelemetryConfig::new()
        .with_env()
        .init();
    let args = Args::parse();

    if let CbdcCommand::CreateConfigTemplate { path } = &args.command {
        generate_config_template_and_write_to_file(path, &args.network_dir)?;
        println!("Config template generated at {}", path.display());
        return Ok(());
    }

    let config = load_network_config(args.config_path.as_deref(), &args.network_dir)?;
    let registry = Registry::load(&config)?;
    let ctx = ScenarioContext::new(&registry, HttpConnector);

    match args.command {
        CbdcCommand::Run {
            suite,
            strict,
            wait_secs,
        } => {
            if let Some(wait_secs) = wait_secs {
                wait_for_nodes(&registry, &HttpConnector, Duration::from_secs(wait_secs)).await?;
            }
            let mut harness = Harness::stdout();
            let summary = run_suites(&ctx, &mut harness, suite).await?;
            info!(%summary, "Run finished");
            if strict && !summary.is_clean() {
                anyhow::bail!("Not every scenario passed: {}", summary);
            }
        }
        CbdcCommand::CheckNodes => {
            for (name, status) in check_nodes(&ctx).await? {
                let participant = registry.participant(&name)?;
                let status = if status.is_connected() {
                    status.to_string().green()
                } else {
                    status.to_string().red()
                };
                println!("{:<6} {:<26} {}", name, participant.rpc_url, status);
            }
        }
        CbdcCommand::Call {
            contract,
            participant,
            method,
            args,
        } => {
            let result = ctx
                .call(&participant, &contract, &method, parse_args_json(&args)?)
                .await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        CbdcCommand::Send {
            contract,
            participant,
            method,
            args,
            event,
        } => {
            let outcome = ctx
                .send(
                    &participant,
                    &contract,
                    &method,
                    parse_args_json(&args)?,
                    event.as_deref(),
                )
                .await?;
            match &outcome {
                SendOutcome::Executed { tx_hash, .. } => {
                    println!("{} {:#x}", "Executed".green(), tx_hash);
                    if event.is_some() {
                        println!("{}", serde_json::to_string_pretty(&outcome.event_value())?);
                    }
                }
                SendOutcome::Rejected(reason) => {
                    println!("{} {}", "Rejected".red(), reason);
                }
            }
        }
        CbdcCommand::CreateConfigTemplate { .. } => unreachable!("handled before loading config"),
    }
    Ok(())
}
