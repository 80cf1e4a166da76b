// Copyright (c) 2024 The Botho Foundation

//! Mutable ledger state.
//!
//! All of it lives in one owned [`SaleState`] that the components receive by
//! reference; there is no ambient state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{address::Address, claim::ClaimSnapshot, phase::SalePhase, supply::SupplyLedger};

/// Per-wallet mint bookkeeping, created on first mint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletAccount {
    /// Items minted by this wallet across every tier
    pub mint_count: u32,

    /// Set once the wallet has used its member entitlement
    pub member_minted: bool,

    /// Set once the wallet has used its follower entitlement
    pub follower_minted: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SaleState {
    pub(crate) phase: SalePhase,
    pub(crate) supply: SupplyLedger,
    pub(crate) wallets: HashMap<Address, WalletAccount>,
    pub(crate) claims: Option<ClaimSnapshot>,
}

impl SaleState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> SalePhase {
        self.phase
    }

    pub fn supply(&self) -> &SupplyLedger {
        &self.supply
    }

    /// Wallet bookkeeping; a wallet that never minted reads as all zero.
    pub fn wallet(&self, address: &Address) -> WalletAccount {
        self.wallets.get(address).copied().unwrap_or_default()
    }

    pub fn claim_snapshot(&self) -> Option<&ClaimSnapshot> {
        self.claims.as_ref()
    }

    pub fn claims_enabled(&self) -> bool {
        self.claims.is_some()
    }
}
