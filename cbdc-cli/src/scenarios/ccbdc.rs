// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use super::{expect_rejected, required_event_field, Scenario, CBDC_CONTRACT, CCBDC_CONTRACT};
use crate::context::ScenarioContext;
use crate::harness::Harness;
use async_trait::async_trait;
use cbdc_client::{ClientResult, Connector};
use serde_json::{json, Value};
use strum_macros::{Display, EnumIter};
use tracing::info;

pub const COIN_ID: u64 = 1;
pub const COIN_SHADES: [u64; 3] = [10, 20, 30];
pub const COIN_PRICE: u64 = 1000;
pub const COIN_LIMIT: u64 = 1_000_000;
pub const REQUESTED_AMOUNT: u64 = 100;
pub const REQUEST_ID: u64 = 1;

/// Colored coin scenarios on the CCBDC contract, including conversion back
/// into plain CBDC for merchants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum CcbdcScenario {
    CreateCoin,
    CreateCoinAsNonGovernor,
    RequestCoin,
    RequestCoinTwice,
    ApproveRequest,
    ApproveRequestAsNonGovernor,
    Transfer,
    SetShade,
    Convert,
    ConvertInsufficientFunds,
}

async fn coin_balance<C: Connector>(
    ctx: &ScenarioContext<'_, C>,
    participant: &str,
) -> ClientResult<Value> {
    ctx.call(
        "gov0",
        CCBDC_CONTRACT,
        "balanceOf",
        json!([COIN_ID, ctx.address(participant)?]),
    )
    .await
}

#[async_trait]
impl Scenario for CcbdcScenario {
    const SUITE: &'static str = "ccbdc";

    fn description(&self) -> &'static str {
        match self {
            Self::CreateCoin => "Create a new colored coin...",
            Self::CreateCoinAsNonGovernor => {
                "Create a new colored coin as non-governor...(should not work)"
            }
            Self::RequestCoin => "Create request for colored coin...",
            Self::RequestCoinTwice => {
                "Create request for the same colored coin twice...(should not work)"
            }
            Self::ApproveRequest => "Approve minting request...",
            Self::ApproveRequestAsNonGovernor => {
                "Approve minting request as non-governor...(should not work)"
            }
            Self::Transfer => "Transferring CCBDC (within the contract)...",
            Self::SetShade => "Setting and getting an address shade...",
            Self::Convert => "Converting from CCBDC to CBDC...",
            Self::ConvertInsufficientFunds => {
                "Transferring CCBDC without sufficient balance...(should not work)"
            }
        }
    }

    fn prerequisites(&self) -> &'static [Self] {
        match self {
            Self::RequestCoin => &[Self::CreateCoin],
            Self::RequestCoinTwice | Self::ApproveRequest | Self::ApproveRequestAsNonGovernor => {
                &[Self::RequestCoin]
            }
            Self::Transfer => &[Self::ApproveRequest],
            Self::Convert => &[Self::Transfer, Self::SetShade],
            Self::ConvertInsufficientFunds => &[Self::Convert],
            _ => &[],
        }
    }

    async fn run<C: Connector>(
        &self,
        ctx: &ScenarioContext<'_, C>,
        harness: &mut Harness,
    ) -> anyhow::Result<()> {
        let smp0 = ctx.address("smp0")?;
        let bnk0 = ctx.address("bnk0")?;
        let new_coin = json!([COIN_ID, COIN_SHADES, COIN_PRICE, COIN_LIMIT]);
        match self {
            Self::CreateCoin => {
                let outcome = ctx
                    .send(
                        "gov0",
                        CCBDC_CONTRACT,
                        "createNewCoin",
                        new_coin,
                        Some("CoinCreation"),
                    )
                    .await?;
                let Some(coin_id) =
                    required_event_field(harness, &outcome, "CoinCreation", "coinID")
                else {
                    return Ok(());
                };
                let info = ctx
                    .call("gov0", CCBDC_CONTRACT, "showCoinInfo", json!([coin_id]))
                    .await?;
                harness.evaluate(&info[0], &json!(ctx.address("gov0")?));
                harness.evaluate(&info[2], &json!(COIN_PRICE.to_string()));
            }
            Self::CreateCoinAsNonGovernor => {
                let outcome = ctx
                    .send(
                        "bnk0",
                        CCBDC_CONTRACT,
                        "createNewCoin",
                        new_coin,
                        Some("CoinCreation"),
                    )
                    .await?;
                expect_rejected(harness, &outcome);
            }
            Self::RequestCoin => {
                ctx.send(
                    "smp0",
                    CCBDC_CONTRACT,
                    "requestCoin",
                    json!([COIN_ID, REQUESTED_AMOUNT]),
                    None,
                )
                .await?;
                let has_request = ctx
                    .call(
                        "gov0",
                        CCBDC_CONTRACT,
                        "hasMintingRequest",
                        json!([smp0, COIN_ID]),
                    )
                    .await?;
                harness.evaluate(&has_request, &json!(true));
            }
            Self::RequestCoinTwice => {
                let outcome = ctx
                    .send(
                        "smp0",
                        CCBDC_CONTRACT,
                        "requestCoin",
                        json!([COIN_ID, REQUESTED_AMOUNT]),
                        None,
                    )
                    .await?;
                expect_rejected(harness, &outcome);
            }
            Self::ApproveRequest => {
                ctx.send(
                    "gov0",
                    CCBDC_CONTRACT,
                    "approveMintingRequest",
                    json!([REQUEST_ID]),
                    Some("Approval"),
                )
                .await?;
                let balance = coin_balance(ctx, "smp0").await?;
                harness.evaluate(&balance, &json!(REQUESTED_AMOUNT.to_string()));
            }
            Self::ApproveRequestAsNonGovernor => {
                let outcome = ctx
                    .send(
                        "bnk0",
                        CCBDC_CONTRACT,
                        "approveMintingRequest",
                        json!([REQUEST_ID]),
                        Some("Approval"),
                    )
                    .await?;
                expect_rejected(harness, &outcome);
            }
            Self::Transfer => {
                ctx.send(
                    "smp0",
                    CCBDC_CONTRACT,
                    "transfer",
                    json!([COIN_ID, bnk0, 50]),
                    Some("Transfer"),
                )
                .await?;
                let remaining = coin_balance(ctx, "smp0").await?;
                info!(%remaining, "smp0 coin balance after transfer");
                let balance = coin_balance(ctx, "bnk0").await?;
                harness.evaluate(&balance, &json!("50"));
            }
            Self::SetShade => {
                ctx.send(
                    "bnk0",
                    CBDC_CONTRACT,
                    "allocate",
                    json!([smp0, 0, COIN_SHADES[0]]),
                    Some("Allocation"),
                )
                .await?;
                let shade = ctx
                    .call("gov0", CBDC_CONTRACT, "isMerchant", json!([smp0]))
                    .await?;
                harness.evaluate(&shade, &json!(COIN_SHADES[0].to_string()));
            }
            Self::Convert => {
                // Paying a merchant whose shade matches the coin converts it
                // into CBDC.
                ctx.send(
                    "bnk0",
                    CCBDC_CONTRACT,
                    "transfer",
                    json!([COIN_ID, smp0, 50]),
                    Some("Conversion"),
                )
                .await?;
                let balance = ctx
                    .call("gov0", CBDC_CONTRACT, "balanceOf", json!([smp0]))
                    .await?;
                harness.evaluate(&balance, &json!("50"));
            }
            Self::ConvertInsufficientFunds => {
                let outcome = ctx
                    .send(
                        "bnk0",
                        CCBDC_CONTRACT,
                        "transfer",
                        json!([COIN_ID, smp0, 50]),
                        Some("Conversion"),
                    )
                    .await?;
                expect_rejected(harness, &outcome);
            }
        }
        Ok(())
    }
}
