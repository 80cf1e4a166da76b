// Copyright (c) 2024 The Botho Foundation

//! Time-locked sweep of whatever the pool still holds.

use chrono::{DateTime, TimeDelta, Utc};
use tracing::info;

use crate::{
    config::SaleConfig,
    context::Payout,
    error::{SaleError, SaleResult},
    state::SaleState,
};

pub struct AdminSettlement<'a> {
    config: &'a SaleConfig,
}

impl<'a> AdminSettlement<'a> {
    pub fn new(config: &'a SaleConfig) -> Self {
        Self { config }
    }

    /// Earliest time the sweep is allowed, or `None` while claims are closed.
    pub fn unlocks_at(&self, state: &SaleState) -> Option<DateTime<Utc>> {
        let activated_at = state.claims.as_ref()?.activated_at;
        let cooldown = i64::try_from(self.config.claims.withdraw_cooldown_secs)
            .ok()
            .and_then(TimeDelta::try_seconds);
        let after_cooldown = cooldown
            .and_then(|delta| activated_at.checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Some(match self.config.claims.withdraw_not_before {
            Some(floor) => after_cooldown.max(floor),
            None => after_cooldown,
        })
    }

    /// Pay the entire current pool to the recipient.
    ///
    /// Once unlocked, a repeated call pays zero rather than failing.
    pub fn withdraw_all(&self, state: &mut SaleState, now: DateTime<Utc>) -> SaleResult<Payout> {
        match self.unlocks_at(state) {
            Some(unlocks_at) if now >= unlocks_at => {}
            _ => return Err(SaleError::NotYetClaimable),
        }

        let amount = state.supply.pool_balance();
        state.supply.debit_pool(amount)?;

        info!("Swept {} to {}", amount, self.config.sale.recipient);
        Ok(Payout {
            to: self.config.sale.recipient,
            amount,
        })
    }
}
