// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use super::{expect_rejected, Scenario, CBDC_CONTRACT};
use crate::context::ScenarioContext;
use crate::harness::Harness;
use async_trait::async_trait;
use cbdc_client::{ClientResult, Connector};
use serde_json::{json, Value};
use strum_macros::{Display, EnumIter};

pub const MERCHANT_CODE: u64 = 10;

/// Token scenarios on the CBDC contract. Balances and supplies are read
/// through the first governor's node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum CbdcScenario {
    InitialSupply,
    Mint,
    MintAsNonGovernor,
    MintToNonBanker,
    Allocate,
    AllocateAsNonBanker,
    ManualConvert,
    Transfer,
    TransferInsufficientFunds,
    MerchantCode,
}

async fn supply_of<C: Connector>(ctx: &ScenarioContext<'_, C>, participant: &str) -> ClientResult<Value> {
    ctx.call("gov0", CBDC_CONTRACT, "supplyOf", json!([ctx.address(participant)?]))
        .await
}

async fn balance_of<C: Connector>(ctx: &ScenarioContext<'_, C>, participant: &str) -> ClientResult<Value> {
    ctx.call("gov0", CBDC_CONTRACT, "balanceOf", json!([ctx.address(participant)?]))
        .await
}

#[async_trait]
impl Scenario for CbdcScenario {
    const SUITE: &'static str = "cbdc";

    fn description(&self) -> &'static str {
        match self {
            Self::InitialSupply => "Get initial supply of banker node...(should be 1000 tokens)",
            Self::Mint => "Mint new coins as governor...",
            Self::MintAsNonGovernor => "Mint new coins as non-governor...(should not work)",
            Self::MintToNonBanker => "Mint new coins to non-banker...(should not work)",
            Self::Allocate => "Allocate coins as banker to customer...",
            Self::AllocateAsNonBanker => "Allocate coins as non-banker...(should not work)",
            Self::ManualConvert => "Try to convert CCBDC into CBDC manually...(should not work)",
            Self::Transfer => "Transfer coins...",
            Self::TransferInsufficientFunds => {
                "Transfer coins, but has insufficient balance...(should not work)"
            }
            Self::MerchantCode => "Checking merchant code that has been set...",
        }
    }

    fn prerequisites(&self) -> &'static [Self] {
        match self {
            Self::Mint | Self::Allocate => &[Self::InitialSupply],
            Self::Transfer | Self::MerchantCode => &[Self::Allocate],
            Self::TransferInsufficientFunds => &[Self::Transfer],
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
        let bnk1 = ctx.address("bnk1")?;
        match self {
            Self::InitialSupply => {
                let supply = supply_of(ctx, "bnk0").await?;
                harness.evaluate(&supply, &json!("1000"));
            }
            Self::Mint => {
                ctx.send("gov0", CBDC_CONTRACT, "mint", json!([bnk0, 100]), Some("Minting"))
                    .await?;
                let supply = supply_of(ctx, "bnk0").await?;
                harness.evaluate(&supply, &json!("1100"));
            }
            Self::MintAsNonGovernor => {
                let outcome = ctx
                    .send("bnk0", CBDC_CONTRACT, "mint", json!([bnk0, 100]), Some("Minting"))
                    .await?;
                expect_rejected(harness, &outcome);
            }
            Self::MintToNonBanker => {
                let outcome = ctx
                    .send("gov0", CBDC_CONTRACT, "mint", json!([smp0, 100]), Some("Minting"))
                    .await?;
                expect_rejected(harness, &outcome);
            }
            Self::Allocate => {
                ctx.send(
                    "bnk0",
                    CBDC_CONTRACT,
                    "allocate",
                    json!([smp0, 100, MERCHANT_CODE]),
                    Some("Allocation"),
                )
                .await?;
                let balance = balance_of(ctx, "smp0").await?;
                harness.evaluate(&balance, &json!("100"));
            }
            Self::AllocateAsNonBanker => {
                let outcome = ctx
                    .send(
                        "gov0",
                        CBDC_CONTRACT,
                        "allocate",
                        json!([smp0, 100, MERCHANT_CODE]),
                        Some("Allocation"),
                    )
                    .await?;
                expect_rejected(harness, &outcome);
            }
            Self::ManualConvert => {
                let outcome = ctx
                    .send(
                        "gov0",
                        CBDC_CONTRACT,
                        "convert",
                        json!([smp0, bnk0, 100]),
                        Some("Conversion"),
                    )
                    .await?;
                expect_rejected(harness, &outcome);
            }
            Self::Transfer => {
                ctx.send("smp0", CBDC_CONTRACT, "transfer", json!([bnk1, 100]), Some("Transfer"))
                    .await?;
                let supply = supply_of(ctx, "bnk1").await?;
                harness.evaluate(&supply, &json!("1100"));
            }
            Self::TransferInsufficientFunds => {
                let outcome = ctx
                    .send("smp0", CBDC_CONTRACT, "transfer", json!([bnk1, 100]), Some("Transfer"))
                    .await?;
                expect_rejected(harness, &outcome);
            }
            Self::MerchantCode => {
                let code = ctx
                    .call("gov0", CBDC_CONTRACT, "isMerchant", json!([smp0]))
                    .await?;
                harness.evaluate(&code, &json!(MERCHANT_CODE.to_string()));
            }
        }
        Ok(())
    }
}
