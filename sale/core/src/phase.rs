// Copyright (c) 2024 The Botho Foundation

//! Sale phase state machine.
//!
//! `Inactive -> PreSale -> PublicSale`. The administrator may open the
//! public sale directly from `Inactive`; nothing ever leaves `PublicSale`.

use serde::{Deserialize, Serialize};

use crate::error::{SaleError, SaleResult};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SalePhase {
    /// Nothing can be minted yet
    #[default]
    Inactive,

    /// Only allow-listed wallets, one item per tier
    PreSale,

    /// Anyone may mint, in batches
    PublicSale,
}

impl SalePhase {
    /// Whether any mint can go through in this phase.
    pub fn is_mintable(&self) -> bool {
        !matches!(self, SalePhase::Inactive)
    }

    /// Validate a move to `to`, returning the resulting phase.
    ///
    /// Re-entering the current phase is accepted; moving backwards is not.
    pub fn transition(self, to: SalePhase) -> SaleResult<SalePhase> {
        if to < self {
            return Err(SaleError::InvalidPhaseTransition { from: self, to });
        }
        Ok(to)
    }
}

impl std::fmt::Display for SalePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SalePhase::Inactive => write!(f, "inactive"),
            SalePhase::PreSale => write!(f, "pre_sale"),
            SalePhase::PublicSale => write!(f, "public_sale"),
        }
    }
}
