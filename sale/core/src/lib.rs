// Copyright (c) 2024 The Botho Foundation

//! Ledger for a fixed-supply, tiered item sale.
//!
//! This crate provides:
//!
//! - Allow-list membership proofs over sorted-pair Keccak trees
//! - Supply accounting with per-tier and global caps
//! - The mint phase state machine
//! - Pro-rata claims against the pool and the final settlement sweep
//!
//! State is owned by [`Sale`] and every operation takes an explicit
//! [`CallContext`]; value leaving the pool is returned as a [`Payout`].

pub mod address;
pub mod claim;
pub mod config;
pub mod context;
pub mod error;
pub mod membership;
pub mod mint;
pub mod phase;
pub mod registry;
pub mod sale;
pub mod settlement;
pub mod state;
pub mod supply;
pub mod tier;

/// Native value in base units.
pub type Amount = u128;

pub use address::{Address, AddressError};
pub use claim::{Activation, ClaimLedger, ClaimSnapshot};
pub use config::{
    AllowListRoots, ClaimSettings, ConfigError, SaleConfig, SaleSettings, SupplyCaps, BPS, UNIT,
};
pub use context::{CallContext, Payout};
pub use error::{SaleError, SaleResult};
pub use membership::{Hash32, MembershipError, MembershipProof, MembershipTree};
pub use mint::{MintController, MintReceipt};
pub use phase::SalePhase;
pub use registry::{Item, ItemId, ItemRegistry};
pub use sale::Sale;
pub use settlement::AdminSettlement;
pub use state::{SaleState, WalletAccount};
pub use supply::{Issuance, Reservation, SupplyCounters, SupplyLedger};
pub use tier::Tier;
