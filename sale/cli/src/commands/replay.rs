// Copyright (c) 2024 The Botho Foundation

//! Offline replay of a call script.
//!
//! A script is a TOML file with a start time and a list of `[[call]]`
//! tables, each naming the caller, the operation and, optionally, the time
//! of the call and the error it is expected to fail with:
//!
//! ```toml
//! start = "2023-06-29T12:00:00Z"
//!
//! [[call]]
//! caller = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"
//! op = "set_public_sale"
//!
//! [[call]]
//! caller = "0xfb6916095ca1df60bb79ce92ce3ea74c37c5d359"
//! op = "mint"
//! ids = [1, 2]
//! ```
//!
//! Each call prints one JSON line; the final ledger state follows.

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use gen30_sale_core::{
    Address, Amount, CallContext, ClaimSnapshot, ItemId, MembershipProof, MembershipTree,
    MintReceipt, Payout, Sale, SaleConfig, SaleError, SalePhase, SupplyCounters,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::load_tree;

#[derive(Debug, Deserialize)]
pub struct Script {
    /// Time of the first call
    pub start: DateTime<Utc>,

    #[serde(default, rename = "call")]
    pub calls: Vec<Call>,
}

#[derive(Debug, Deserialize)]
pub struct Call {
    pub caller: Address,

    /// Time of the call; defaults to the time of the previous call
    #[serde(default)]
    pub at: Option<DateTime<Utc>>,

    /// Error message the call must fail with
    #[serde(default)]
    pub expect_error: Option<String>,

    #[serde(flatten)]
    pub action: Action,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Action {
    SetMintable,
    SetPublicSale,
    SetClaimable,
    Mint {
        ids: Vec<ItemId>,

        /// Attached value in base units; defaults to the exact cost
        #[serde(default)]
        value: Option<String>,

        /// Explicit proof; looked up in the allow-lists when absent
        #[serde(default)]
        proof: Option<MembershipProof>,
    },
    Share,
    Claim,
    Transfer {
        to: Address,
        id: ItemId,
    },
    WithdrawAll,
}

impl Action {
    fn name(&self) -> &'static str {
        match self {
            Action::SetMintable => "set_mintable",
            Action::SetPublicSale => "set_public_sale",
            Action::SetClaimable => "set_claimable",
            Action::Mint { .. } => "mint",
            Action::Share => "share",
            Action::Claim => "claim",
            Action::Transfer { .. } => "transfer",
            Action::WithdrawAll => "withdraw_all",
        }
    }
}

/// Allow-lists used to fill in presale proofs.
#[derive(Debug, Default)]
pub struct ProofSource {
    pub members: Option<MembershipTree>,
    pub followers: Option<MembershipTree>,
}

impl ProofSource {
    /// Member proof first, then follower; empty when on neither list.
    pub fn lookup(&self, address: &Address) -> MembershipProof {
        [&self.members, &self.followers]
            .into_iter()
            .flatten()
            .find_map(|tree| tree.proof(address))
            .unwrap_or_default()
    }
}

/// What a successful call returned.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum CallResult {
    Minted(MintReceipt),
    Paid(Payout),
    Activated { treasury: Option<Payout> },
    Share { share: Amount },
    Done,
}

/// One line of replay output.
#[derive(Debug, Serialize)]
pub struct Outcome {
    pub step: usize,
    pub op: &'static str,
    pub caller: Address,
    pub at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<CallResult>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Ledger state after the last call.
#[derive(Debug, Serialize)]
pub struct Summary {
    pub phase: SalePhase,
    pub counters: SupplyCounters,
    pub pool_balance: Amount,
    pub claim_snapshot: Option<ClaimSnapshot>,
}

/// Run the replay command
pub fn run(
    config_path: &Path,
    script_path: &Path,
    members: Option<&Path>,
    followers: Option<&Path>,
) -> Result<()> {
    let config = SaleConfig::from_file(config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    let content = std::fs::read_to_string(script_path)
        .with_context(|| format!("Failed to read script {}", script_path.display()))?;
    let script: Script = toml::from_str(&content)
        .with_context(|| format!("Failed to parse script {}", script_path.display()))?;

    let proofs = ProofSource {
        members: members.map(load_tree).transpose()?,
        followers: followers.map(load_tree).transpose()?,
    };

    let (outcomes, summary) = replay(config, &script, &proofs)?;
    for outcome in &outcomes {
        println!("{}", serde_json::to_string(outcome)?);
    }
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Replay `script` against a fresh sale.
///
/// Rejected calls are reported, not fatal, unless they contradict the
/// call's `expect_error`.
pub fn replay(
    config: SaleConfig,
    script: &Script,
    proofs: &ProofSource,
) -> Result<(Vec<Outcome>, Summary)> {
    let mut sale = Sale::new(config)?;
    let mut now = script.start;
    let mut outcomes = Vec::with_capacity(script.calls.len());

    info!("Replaying {} call(s)", script.calls.len());

    for (step, call) in script.calls.iter().enumerate() {
        let at = call.at.unwrap_or(now);
        if at < now {
            bail!("call {} at {} is earlier than the previous call", step, at);
        }
        now = at;

        let ctx = CallContext::new(call.caller, at);
        let result = execute(&mut sale, ctx, &call.action, proofs)
            .with_context(|| format!("call {} ({})", step, call.action.name()))?;

        let outcome = match result {
            Ok(value) => {
                if let Some(expected) = &call.expect_error {
                    bail!("call {} succeeded, expected \"{}\"", step, expected);
                }
                debug!("Call {} ({}) succeeded", step, call.action.name());
                Outcome {
                    step,
                    op: call.action.name(),
                    caller: call.caller,
                    at,
                    result: Some(value),
                    error: None,
                }
            }
            Err(err) => {
                let message = err.to_string();
                match &call.expect_error {
                    Some(expected) if *expected != message => {
                        bail!(
                            "call {} failed with \"{}\", expected \"{}\"",
                            step,
                            message,
                            expected
                        )
                    }
                    Some(_) => {}
                    None => warn!("Call {} ({}) rejected: {}", step, call.action.name(), message),
                }
                Outcome {
                    step,
                    op: call.action.name(),
                    caller: call.caller,
                    at,
                    result: None,
                    error: Some(message),
                }
            }
        };
        outcomes.push(outcome);
    }

    let summary = Summary {
        phase: sale.phase(),
        counters: sale.counters(),
        pool_balance: sale.pool_balance(),
        claim_snapshot: sale.claim_snapshot().copied(),
    };
    Ok((outcomes, summary))
}

/// Apply one action. The outer error is a broken script, the inner one a
/// rejection by the ledger.
fn execute(
    sale: &mut Sale,
    ctx: CallContext,
    action: &Action,
    proofs: &ProofSource,
) -> Result<Result<CallResult, SaleError>> {
    let result = match action {
        Action::SetMintable => sale.set_mintable(&ctx).map(|()| CallResult::Done),
        Action::SetPublicSale => sale.set_public_sale(&ctx).map(|()| CallResult::Done),
        Action::SetClaimable => sale
            .set_claimable(&ctx)
            .map(|treasury| CallResult::Activated { treasury }),
        Action::Mint { ids, value, proof } => {
            let value = match value {
                Some(value) => value
                    .parse::<Amount>()
                    .with_context(|| format!("bad value {:?}", value))?,
                None => sale
                    .config()
                    .mint_cost(ids.len())
                    .context("mint cost overflows")?,
            };
            let proof = match proof {
                Some(proof) => proof.clone(),
                None => proofs.lookup(&ctx.caller),
            };
            sale.mint(&ctx.with_value(value), ids, &proof)
                .map(CallResult::Minted)
        }
        Action::Share => Ok(CallResult::Share {
            share: sale.calculate_claimable_share(&ctx),
        }),
        Action::Claim => sale.claim_share(&ctx).map(CallResult::Paid),
        Action::Transfer { to, id } => sale.transfer(&ctx, *to, *id).map(|()| CallResult::Done),
        Action::WithdrawAll => sale.withdraw_all(&ctx).map(CallResult::Paid),
    };
    Ok(result)
}
