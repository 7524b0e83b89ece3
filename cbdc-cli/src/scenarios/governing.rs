// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use super::{expect_rejected, required_event_field, Scenario, GOVERNING_CONTRACT};
use crate::context::ScenarioContext;
use crate::harness::Harness;
use async_trait::async_trait;
use cbdc_client::Connector;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde_json::{json, Value};
use strum_macros::{Display, EnumIter};
use tracing::info;

/// Member groups known to the Governing contract, by on-chain code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum MemberType {
    Governor = 0,
    Maintainer = 1,
    Observer = 2,
    Banker = 3,
    Blacklist = 4,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum ProposalAction {
    Add = 0,
    Remove = 1,
}

/// Membership votes on the Governing contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum GoverningScenario {
    AddGovernor,
    RemoveGovernor,
    ProposalAsNonGovernor,
    AddExistingMemberToOtherGroup,
}

// Voters in the order they vote. Two votes carry a proposal on the local
// network.
const VOTERS: [&str; 2] = ["gov0", "gov1"];

/// Propose `action` on `member` as a governor and have every governor vote
/// for it. Returns `false` if the proposal never got an id.
async fn pass_proposal<C: Connector>(
    ctx: &ScenarioContext<'_, C>,
    harness: &mut Harness,
    member: &str,
    member_type: MemberType,
    action: ProposalAction,
) -> anyhow::Result<bool> {
    let outcome = ctx
        .send(
            "gov0",
            GOVERNING_CONTRACT,
            "makeProposal",
            proposal_args(ctx.address(member)?, member_type, action),
            Some("NewProposal"),
        )
        .await?;
    let Some(proposal_id) = required_event_field(harness, &outcome, "NewProposal", "proposalID")
    else {
        return Ok(false);
    };

    for voter in VOTERS {
        let vote = ctx
            .send(
                voter,
                GOVERNING_CONTRACT,
                "vote",
                json!([proposal_id]),
                Some("NewVote"),
            )
            .await?;
        match vote.event_field("voteCount") {
            Some(count) => info!(voter, %proposal_id, %count, "Vote counted"),
            None => info!(voter, %proposal_id, rejection = ?vote.rejection(), "Vote not counted"),
        }
    }
    Ok(true)
}

fn proposal_args(address: String, member_type: MemberType, action: ProposalAction) -> Value {
    json!([address, u8::from(member_type), u8::from(action)])
}

async fn is_governor<C: Connector>(
    ctx: &ScenarioContext<'_, C>,
    member: &str,
) -> anyhow::Result<Value> {
    Ok(ctx
        .call(
            "gov0",
            GOVERNING_CONTRACT,
            "governors",
            json!([ctx.address(member)?]),
        )
        .await?)
}

#[async_trait]
impl Scenario for GoverningScenario {
    const SUITE: &'static str = "governing";

    fn description(&self) -> &'static str {
        match self {
            Self::AddGovernor => "Adding new governor...",
            Self::RemoveGovernor => "Removing governor...",
            Self::ProposalAsNonGovernor => "Make proposal as non-governor...(should not be possible)",
            Self::AddExistingMemberToOtherGroup => {
                "Trying to add existing node of type banker to governors...(should not be possible)"
            }
        }
    }

    fn prerequisites(&self) -> &'static [Self] {
        match self {
            Self::RemoveGovernor => &[Self::AddGovernor],
            _ => &[],
        }
    }

    async fn run<C: Connector>(
        &self,
        ctx: &ScenarioContext<'_, C>,
        harness: &mut Harness,
    ) -> anyhow::Result<()> {
        match self {
            Self::AddGovernor | Self::RemoveGovernor => {
                let (action, expected) = match self {
                    Self::AddGovernor => (ProposalAction::Add, true),
                    _ => (ProposalAction::Remove, false),
                };
                if pass_proposal(ctx, harness, "smp0", MemberType::Governor, action).await? {
                    let governor = is_governor(ctx, "smp0").await?;
                    harness.evaluate(&governor, &json!(expected));
                }
            }
            Self::ProposalAsNonGovernor => {
                let outcome = ctx
                    .send(
                        "bnk0",
                        GOVERNING_CONTRACT,
                        "makeProposal",
                        proposal_args(
                            ctx.address("smp0")?,
                            MemberType::Governor,
                            ProposalAction::Add,
                        ),
                        Some("NewProposal"),
                    )
                    .await?;
                expect_rejected(harness, &outcome);
            }
            Self::AddExistingMemberToOtherGroup => {
                let outcome = ctx
                    .send(
                        "gov0",
                        GOVERNING_CONTRACT,
                        "makeProposal",
                        proposal_args(
                            ctx.address("bnk0")?,
                            MemberType::Governor,
                            ProposalAction::Add,
                        ),
                        Some("NewProposal"),
                    )
                    .await?;
                expect_rejected(harness, &outcome);
            }
        }
        Ok(())
    }
}
