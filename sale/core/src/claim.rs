// Copyright (c) 2024 The Botho Foundation

//! Pro-rata claims against the pool.
//!
//! When claims open, the pool balance and total supply are frozen into a
//! [`ClaimSnapshot`]. Every unclaimed item is then worth the same fixed
//! share, whoever happens to hold it and whenever it is claimed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    address::Address,
    config::{SaleConfig, BPS},
    context::Payout,
    error::{SaleError, SaleResult},
    state::SaleState,
    Amount,
};

/// Pool and supply as they stood when claims were enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimSnapshot {
    /// Pool balance left for holders after the treasury cut
    pub pool_balance: Amount,

    /// Items issued at activation
    pub total_issued: u32,

    /// `pool_balance / total_issued`, rounded down
    pub share_per_item: Amount,

    pub activated_at: DateTime<Utc>,
}

/// Result of enabling claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Activation {
    pub snapshot: ClaimSnapshot,

    /// Treasury cut paid to the recipient, if any
    pub treasury: Option<Payout>,
}

pub struct ClaimLedger<'a> {
    config: &'a SaleConfig,
}

impl<'a> ClaimLedger<'a> {
    pub fn new(config: &'a SaleConfig) -> Self {
        Self { config }
    }

    /// Open claims and take the snapshot. Only ever succeeds once.
    pub fn activate(&self, state: &mut SaleState, now: DateTime<Utc>) -> SaleResult<Activation> {
        if state.claims.is_some() {
            return Err(SaleError::ClaimsAlreadyEnabled);
        }

        let pool = state.supply.pool_balance();
        let retained = holder_portion(pool, self.config.claims.holder_share_bps);
        let cut = pool - retained;
        if cut > 0 {
            state.supply.debit_pool(cut)?;
        }

        let total_issued = state.supply.total_issued();
        let share_per_item = match total_issued {
            0 => 0,
            n => retained / Amount::from(n),
        };
        let snapshot = ClaimSnapshot {
            pool_balance: retained,
            total_issued,
            share_per_item,
            activated_at: now,
        };
        state.claims = Some(snapshot);

        info!(
            "Claims enabled: {} items share {} ({} per item), {} to treasury",
            total_issued, retained, share_per_item, cut
        );

        Ok(Activation {
            snapshot,
            treasury: (cut > 0).then_some(Payout {
                to: self.config.sale.recipient,
                amount: cut,
            }),
        })
    }

    /// What `holder` would receive by claiming now; zero before activation.
    pub fn compute_share(&self, state: &SaleState, holder: &Address) -> Amount {
        let Some(snapshot) = state.claims.as_ref() else {
            return 0;
        };
        let unclaimed = state.supply.registry().unclaimed_of(holder).len();
        snapshot
            .share_per_item
            .saturating_mul(Amount::try_from(unclaimed).unwrap_or(Amount::MAX))
    }

    /// Pay `holder` for every unclaimed item it holds and mark them claimed.
    pub fn claim(&self, state: &mut SaleState, holder: &Address) -> SaleResult<Payout> {
        let snapshot = state.claims.ok_or(SaleError::ClaimsNotEnabled)?;
        let unclaimed = state.supply.registry().unclaimed_of(holder);
        if unclaimed.is_empty() {
            return Err(SaleError::ZeroClaimableBalance);
        }

        let count = Amount::try_from(unclaimed.len()).map_err(|_| SaleError::Overflow)?;
        let amount = snapshot
            .share_per_item
            .checked_mul(count)
            .ok_or(SaleError::Overflow)?;

        // Debit first: if the pool cannot cover it, no flag has moved.
        state.supply.debit_pool(amount)?;
        let registry = state.supply.registry_mut();
        for id in &unclaimed {
            registry.mark_claimed(*id);
        }

        info!(
            "{} claimed {} for {} item(s)",
            holder,
            amount,
            unclaimed.len()
        );
        Ok(Payout {
            to: *holder,
            amount,
        })
    }
}

/// `pool * bps / BPS` without intermediate overflow.
fn holder_portion(pool: Amount, bps: u32) -> Amount {
    let bps = Amount::from(bps.min(BPS));
    let denom = Amount::from(BPS);
    pool / denom * bps + pool % denom * bps / denom
}
