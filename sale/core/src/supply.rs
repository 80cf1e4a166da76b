// Copyright (c) 2024 The Botho Foundation

//! Supply counters, caps and the value pool.
//!
//! [`SupplyLedger::reserve`] is the only way items come into existence. A
//! batch is checked as a whole against the post-operation totals and is
//! either applied in full or not at all.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    address::Address,
    config::SupplyCaps,
    error::{SaleError, SaleResult},
    registry::{ItemId, ItemRegistry},
    tier::Tier,
    Amount,
};

/// Who is issuing: a user going through the sale rules, or the administrator
/// drawing on the reserved region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Issuance {
    User,
    Administrative,
}

/// A request to issue a batch of items.
#[derive(Debug, Clone, Copy)]
pub struct Reservation<'a> {
    pub owner: Address,
    pub tier: Tier,
    pub ids: &'a [ItemId],
    pub unit_price: Amount,
    pub issuance: Issuance,
}

/// Snapshot of the supply counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyCounters {
    /// Every item issued, all tiers and administrative mints included
    pub total_issued: u32,
    pub follower_issued: u32,
    pub member_issued: u32,
}

#[derive(Debug, Clone, Default)]
pub struct SupplyLedger {
    registry: ItemRegistry,
    counters: SupplyCounters,
    pool_balance: Amount,
}

impl SupplyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counters(&self) -> SupplyCounters {
        self.counters
    }

    pub fn total_issued(&self) -> u32 {
        self.counters.total_issued
    }

    pub fn pool_balance(&self) -> Amount {
        self.pool_balance
    }

    pub fn registry(&self) -> &ItemRegistry {
        &self.registry
    }

    pub(crate) fn registry_mut(&mut self) -> &mut ItemRegistry {
        &mut self.registry
    }

    /// Issue every id in the batch to `request.owner` and credit the pool.
    ///
    /// Returns the amount credited.
    pub fn reserve(&mut self, caps: &SupplyCaps, request: Reservation<'_>) -> SaleResult<Amount> {
        if request.ids.is_empty() {
            return Err(SaleError::EmptyMint);
        }

        let mut seen = BTreeSet::new();
        for &id in request.ids {
            if id >= caps.total_capacity {
                return Err(SaleError::ItemOutOfRange(id));
            }
            if !seen.insert(id) || self.registry.contains(id) {
                return Err(SaleError::ItemAlreadyIssued(id));
            }
        }

        let count = u32::try_from(request.ids.len()).map_err(|_| SaleError::Overflow)?;
        let next = self.counters_after(caps, &request, count)?;

        let credit = request
            .unit_price
            .checked_mul(Amount::from(count))
            .ok_or(SaleError::Overflow)?;
        let pool_balance = self
            .pool_balance
            .checked_add(credit)
            .ok_or(SaleError::Overflow)?;

        // Nothing below can fail.
        for &id in request.ids {
            self.registry.issue(id, request.owner);
        }
        self.counters = next;
        self.pool_balance = pool_balance;

        debug!(
            "Issued {} {} item(s) to {}, pool now {}",
            count, request.tier, request.owner, self.pool_balance
        );
        Ok(credit)
    }

    /// Counters after issuing `count` items, or the cap that would break.
    fn counters_after(
        &self,
        caps: &SupplyCaps,
        request: &Reservation<'_>,
        count: u32,
    ) -> SaleResult<SupplyCounters> {
        let mut next = self.counters;
        next.total_issued = next
            .total_issued
            .checked_add(count)
            .ok_or(SaleError::Overflow)?;

        match request.tier {
            Tier::Follower => {
                next.follower_issued = next
                    .follower_issued
                    .checked_add(count)
                    .ok_or(SaleError::Overflow)?;
                if next.follower_issued > caps.follower_cap {
                    return Err(SaleError::TierPoolExhausted(Tier::Follower));
                }
            }
            Tier::Member => {
                next.member_issued = next
                    .member_issued
                    .checked_add(count)
                    .ok_or(SaleError::Overflow)?;
                if next.member_issued > caps.member_cap {
                    return Err(SaleError::TierPoolExhausted(Tier::Member));
                }
            }
            Tier::Open => {
                // The user-mintable region ends just before `user_cap`;
                // what lies beyond is reserved for administrative issuance.
                if request.issuance == Issuance::User && next.total_issued >= caps.user_cap {
                    return Err(SaleError::GlobalCapExhausted);
                }
            }
        }

        Ok(next)
    }

    /// Take `amount` out of the pool.
    pub(crate) fn debit_pool(&mut self, amount: Amount) -> SaleResult<()> {
        self.pool_balance = self
            .pool_balance
            .checked_sub(amount)
            .ok_or(SaleError::InsufficientPool {
                available: self.pool_balance,
                requested: amount,
            })?;
        Ok(())
    }
}
