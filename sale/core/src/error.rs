// Copyright (c) 2024 The Botho Foundation

//! Rejections reported by the sale ledger.
//!
//! Every error leaves the ledger exactly as it was before the call.

use thiserror::Error;

use crate::{phase::SalePhase, registry::ItemId, tier::Tier, Amount};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SaleError {
    // === Phase ===
    #[error("mint hasn't started")]
    MintNotStarted,

    #[error("not yet claimable")]
    NotYetClaimable,

    #[error("claims not enabled")]
    ClaimsNotEnabled,

    #[error("claims already enabled")]
    ClaimsAlreadyEnabled,

    #[error("cannot move sale from {from} to {to}")]
    InvalidPhaseTransition { from: SalePhase, to: SalePhase },

    // === Eligibility ===
    #[error("no allow-list membership")]
    NoAllowListMembership,

    #[error("already minted in this tier ({0})")]
    AlreadyMintedInTier(Tier),

    #[error("only one item can be minted per call during presale")]
    PresaleBatchLimit,

    // === Capacity ===
    #[error("tier pool exhausted ({0})")]
    TierPoolExhausted(Tier),

    #[error("global user cap exhausted")]
    GlobalCapExhausted,

    #[error("per-wallet cap exceeded")]
    WalletCapExceeded,

    #[error("item already issued: {0}")]
    ItemAlreadyIssued(ItemId),

    #[error("item id {0} is outside the issuable range")]
    ItemOutOfRange(ItemId),

    #[error("mint request names no items")]
    EmptyMint,

    // === Payment ===
    #[error("incorrect payment amount: expected {expected}, got {got}")]
    IncorrectPayment { expected: Amount, got: Amount },

    // === Claims ===
    #[error("zero claimable balance")]
    ZeroClaimableBalance,

    #[error("pool balance {available} cannot cover {requested}")]
    InsufficientPool {
        available: Amount,
        requested: Amount,
    },

    // === Registry ===
    #[error("item {0} does not exist")]
    UnknownItem(ItemId),

    #[error("caller does not own item {0}")]
    NotItemOwner(ItemId),

    // === Authorization ===
    #[error("caller is not the administrator")]
    Unauthorized,

    #[error("arithmetic overflow")]
    Overflow,
}

pub type SaleResult<T> = Result<T, SaleError>;
