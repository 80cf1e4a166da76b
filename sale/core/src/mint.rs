// Copyright (c) 2024 The Botho Foundation

//! Mint gating.
//!
//! Decides whether a mint call may go through in the current phase, for
//! which tier, and within which limits, then hands the batch to the
//! [`SupplyLedger`](crate::supply::SupplyLedger).

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    address::Address,
    config::SaleConfig,
    context::CallContext,
    error::{SaleError, SaleResult},
    membership::MembershipProof,
    phase::SalePhase,
    registry::ItemId,
    state::{SaleState, WalletAccount},
    supply::{Issuance, Reservation},
    tier::Tier,
    Amount,
};

/// Outcome of a successful mint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintReceipt {
    pub owner: Address,
    pub tier: Tier,
    pub issuance: Issuance,
    pub ids: Vec<ItemId>,
    pub paid: Amount,
}

pub struct MintController<'a> {
    config: &'a SaleConfig,
}

impl<'a> MintController<'a> {
    pub fn new(config: &'a SaleConfig) -> Self {
        Self { config }
    }

    pub fn mint(
        &self,
        state: &mut SaleState,
        ctx: &CallContext,
        ids: &[ItemId],
        proof: &MembershipProof,
    ) -> SaleResult<MintReceipt> {
        if !state.phase.is_mintable() {
            return Err(SaleError::MintNotStarted);
        }
        if ids.is_empty() {
            return Err(SaleError::EmptyMint);
        }

        if ctx.caller == self.config.sale.admin {
            return self.mint_reserved(state, ctx, ids);
        }

        if state.phase == SalePhase::PreSale && ids.len() != 1 {
            return Err(SaleError::PresaleBatchLimit);
        }

        let account = state.wallet(&ctx.caller);
        let count = u32::try_from(ids.len()).map_err(|_| SaleError::Overflow)?;
        let minted = account
            .mint_count
            .checked_add(count)
            .ok_or(SaleError::Overflow)?;
        if minted > self.config.caps.wallet_cap {
            return Err(SaleError::WalletCapExceeded);
        }

        let paid = self.check_payment(ctx, ids.len())?;

        let tier = match state.phase {
            SalePhase::PreSale => self.presale_tier(&account, &ctx.caller, proof)?,
            _ => Tier::Open,
        };

        state.supply.reserve(
            &self.config.caps,
            Reservation {
                owner: ctx.caller,
                tier,
                ids,
                unit_price: self.config.sale.price,
                issuance: Issuance::User,
            },
        )?;

        let entry = state.wallets.entry(ctx.caller).or_default();
        entry.mint_count = minted;
        match tier {
            Tier::Member => entry.member_minted = true,
            Tier::Follower => entry.follower_minted = true,
            Tier::Open => {}
        }

        info!(
            "{} minted {} item(s) via {} tier ({} total for wallet)",
            ctx.caller,
            ids.len(),
            tier,
            minted
        );

        Ok(MintReceipt {
            owner: ctx.caller,
            tier,
            issuance: Issuance::User,
            ids: ids.to_vec(),
            paid,
        })
    }

    /// Administrative issuance: no proof, no wallet or user cap.
    fn mint_reserved(
        &self,
        state: &mut SaleState,
        ctx: &CallContext,
        ids: &[ItemId],
    ) -> SaleResult<MintReceipt> {
        let paid = self.check_payment(ctx, ids.len())?;
        state.supply.reserve(
            &self.config.caps,
            Reservation {
                owner: ctx.caller,
                tier: Tier::Open,
                ids,
                unit_price: self.config.sale.price,
                issuance: Issuance::Administrative,
            },
        )?;

        info!("Administrator minted {} reserved item(s)", ids.len());

        Ok(MintReceipt {
            owner: ctx.caller,
            tier: Tier::Open,
            issuance: Issuance::Administrative,
            ids: ids.to_vec(),
            paid,
        })
    }

    /// The attached value must be exactly `price * count`.
    fn check_payment(&self, ctx: &CallContext, count: usize) -> SaleResult<Amount> {
        let expected = self.config.mint_cost(count).ok_or(SaleError::Overflow)?;
        if ctx.value != expected {
            return Err(SaleError::IncorrectPayment {
                expected,
                got: ctx.value,
            });
        }
        Ok(expected)
    }

    /// Resolve which allow-list the proof places the caller in.
    ///
    /// The member list is tried first. A wallet on both lists picks its tier
    /// by the proof it presents.
    fn presale_tier(
        &self,
        account: &WalletAccount,
        caller: &Address,
        proof: &MembershipProof,
    ) -> SaleResult<Tier> {
        let roots = &self.config.allowlist;
        if proof.verify(&roots.member_root, caller) {
            if account.member_minted {
                return Err(SaleError::AlreadyMintedInTier(Tier::Member));
            }
            return Ok(Tier::Member);
        }
        if proof.verify(&roots.follower_root, caller) {
            if account.follower_minted {
                return Err(SaleError::AlreadyMintedInTier(Tier::Follower));
            }
            return Ok(Tier::Follower);
        }
        Err(SaleError::NoAllowListMembership)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::UNIT, membership::MembershipTree};
    use chrono::{TimeZone, Utc};

    fn addr(n: u8) -> Address {
        Address::new([n; 20])
    }

    struct Fixture {
        config: SaleConfig,
        members: MembershipTree,
        followers: MembershipTree,
        state: SaleState,
    }

    // Members are addr(10..=14), followers addr(20..=29); addr(12) is on both.
    fn fixture(phase: SalePhase) -> Fixture {
        let members = MembershipTree::new((10..=14).map(addr)).unwrap();
        let followers =
            MembershipTree::new((20..=29).map(addr).chain(std::iter::once(addr(12)))).unwrap();
        let config = SaleConfig::new(addr(1), addr(2), members.root(), followers.root());
        let mut state = SaleState::new();
        state.phase = phase;
        Fixture {
            config,
            members,
            followers,
            state,
        }
    }

    fn call(caller: Address, value: Amount) -> CallContext {
        CallContext::new(caller, Utc.timestamp_opt(1_700_000_000, 0).unwrap()).with_value(value)
    }

    #[test]
    fn test_inactive_rejects_everyone() {
        let mut f = fixture(SalePhase::Inactive);
        let controller = MintController::new(&f.config);
        for caller in [addr(1), addr(10), addr(50)] {
            assert_eq!(
                controller.mint(
                    &mut f.state,
                    &call(caller, UNIT),
                    &[0],
                    &MembershipProof::default()
                ),
                Err(SaleError::MintNotStarted)
            );
        }
    }

    #[test]
    fn test_presale_member_and_follower() {
        let mut f = fixture(SalePhase::PreSale);
        let controller = MintController::new(&f.config);

        let proof = f.members.proof(&addr(10)).unwrap();
        let receipt = controller
            .mint(&mut f.state, &call(addr(10), UNIT), &[1], &proof)
            .unwrap();
        assert_eq!(receipt.tier, Tier::Member);
        assert_eq!(receipt.paid, UNIT);

        let proof = f.followers.proof(&addr(20)).unwrap();
        let receipt = controller
            .mint(&mut f.state, &call(addr(20), UNIT), &[2], &proof)
            .unwrap();
        assert_eq!(receipt.tier, Tier::Follower);

        let counters = f.state.supply.counters();
        assert_eq!(counters.member_issued, 1);
        assert_eq!(counters.follower_issued, 1);
        assert!(f.state.wallet(&addr(10)).member_minted);
        assert!(f.state.wallet(&addr(20)).follower_minted);
    }

    #[test]
    fn test_presale_one_per_tier() {
        let mut f = fixture(SalePhase::PreSale);
        let controller = MintController::new(&f.config);
        let proof = f.followers.proof(&addr(21)).unwrap();

        controller
            .mint(&mut f.state, &call(addr(21), UNIT), &[1], &proof)
            .unwrap();
        assert_eq!(
            controller.mint(&mut f.state, &call(addr(21), UNIT), &[2], &proof),
            Err(SaleError::AlreadyMintedInTier(Tier::Follower))
        );
        assert_eq!(f.state.wallet(&addr(21)).mint_count, 1);
    }

    #[test]
    fn test_wallet_on_both_lists_mints_once_per_tier() {
        let mut f = fixture(SalePhase::PreSale);
        let controller = MintController::new(&f.config);
        let member_proof = f.members.proof(&addr(12)).unwrap();
        let follower_proof = f.followers.proof(&addr(12)).unwrap();

        let first = controller
            .mint(&mut f.state, &call(addr(12), UNIT), &[1], &member_proof)
            .unwrap();
        let second = controller
            .mint(&mut f.state, &call(addr(12), UNIT), &[2], &follower_proof)
            .unwrap();
        assert_eq!((first.tier, second.tier), (Tier::Member, Tier::Follower));
        assert_eq!(
            controller.mint(&mut f.state, &call(addr(12), UNIT), &[3], &member_proof),
            Err(SaleError::AlreadyMintedInTier(Tier::Member))
        );
        assert_eq!(f.state.wallet(&addr(12)).mint_count, 2);
    }

    #[test]
    fn test_presale_rejections() {
        let mut f = fixture(SalePhase::PreSale);
        let controller = MintController::new(&f.config);

        // Not on either list, with someone else's proof.
        let proof = f.members.proof(&addr(10)).unwrap();
        assert_eq!(
            controller.mint(&mut f.state, &call(addr(50), UNIT), &[1], &proof),
            Err(SaleError::NoAllowListMembership)
        );

        // Multi-item requests are refused outright.
        let proof = f.members.proof(&addr(11)).unwrap();
        assert_eq!(
            controller.mint(&mut f.state, &call(addr(11), 2 * UNIT), &[1, 2], &proof),
            Err(SaleError::PresaleBatchLimit)
        );

        // Wrong payment.
        assert_eq!(
            controller.mint(&mut f.state, &call(addr(11), UNIT - 1), &[1], &proof),
            Err(SaleError::IncorrectPayment {
                expected: UNIT,
                got: UNIT - 1
            })
        );

        assert_eq!(f.state.supply.total_issued(), 0);
        assert_eq!(f.state.supply.pool_balance(), 0);
        assert_eq!(f.state.wallet(&addr(11)), WalletAccount::default());
    }

    #[test]
    fn test_public_sale_batches_and_payment() {
        let mut f = fixture(SalePhase::PublicSale);
        let controller = MintController::new(&f.config);
        let none = MembershipProof::default();

        let receipt = controller
            .mint(&mut f.state, &call(addr(50), 3 * UNIT), &[0, 1, 2], &none)
            .unwrap();
        assert_eq!(receipt.tier, Tier::Open);

        for value in [2 * UNIT, 4 * UNIT, 0] {
            assert_eq!(
                controller.mint(&mut f.state, &call(addr(51), value), &[3, 4, 5], &none),
                Err(SaleError::IncorrectPayment {
                    expected: 3 * UNIT,
                    got: value
                })
            );
        }
        assert_eq!(f.state.supply.pool_balance(), 3 * UNIT);
    }

    #[test]
    fn test_public_sale_leaves_tier_flags_alone() {
        let mut f = fixture(SalePhase::PublicSale);
        let controller = MintController::new(&f.config);
        let proof = f.members.proof(&addr(13)).unwrap();

        let receipt = controller
            .mint(&mut f.state, &call(addr(13), UNIT), &[7], &proof)
            .unwrap();
        assert_eq!(receipt.tier, Tier::Open);
        assert!(!f.state.wallet(&addr(13)).member_minted);
        assert_eq!(f.state.supply.counters().member_issued, 0);
    }

    #[test]
    fn test_wallet_cap_is_cumulative() {
        let mut f = fixture(SalePhase::PreSale);
        let controller = MintController::new(&f.config);
        let none = MembershipProof::default();

        let proof = f.followers.proof(&addr(22)).unwrap();
        controller
            .mint(&mut f.state, &call(addr(22), UNIT), &[100], &proof)
            .unwrap();
        f.state.phase = SalePhase::PublicSale;

        let ids: Vec<ItemId> = (101..=110).collect();
        assert_eq!(
            controller.mint(&mut f.state, &call(addr(22), 10 * UNIT), &ids, &none),
            Err(SaleError::WalletCapExceeded)
        );
        controller
            .mint(&mut f.state, &call(addr(22), 9 * UNIT), &ids[..9], &none)
            .unwrap();
        assert_eq!(f.state.wallet(&addr(22)).mint_count, 10);
        assert_eq!(
            controller.mint(&mut f.state, &call(addr(22), UNIT), &[200], &none),
            Err(SaleError::WalletCapExceeded)
        );
    }

    #[test]
    fn test_wallet_cap_checked_before_payment() {
        let mut f = fixture(SalePhase::PublicSale);
        let controller = MintController::new(&f.config);
        let ids: Vec<ItemId> = (0..=10).collect();
        assert_eq!(
            controller.mint(
                &mut f.state,
                &call(addr(50), 10 * UNIT),
                &ids,
                &MembershipProof::default()
            ),
            Err(SaleError::WalletCapExceeded)
        );
    }

    #[test]
    fn test_admin_mints_reserved_region() {
        let mut f = fixture(SalePhase::PreSale);
        let controller = MintController::new(&f.config);
        let ids: Vec<ItemId> = (400..444).collect();

        let receipt = controller
            .mint(
                &mut f.state,
                &call(addr(1), 44 * UNIT),
                &ids,
                &MembershipProof::default(),
            )
            .unwrap();
        assert_eq!(receipt.issuance, Issuance::Administrative);
        assert_eq!(f.state.supply.total_issued(), 44);
        assert_eq!(f.state.wallet(&addr(1)), WalletAccount::default());

        assert_eq!(
            controller.mint(
                &mut f.state,
                &call(addr(1), UNIT),
                &[444],
                &MembershipProof::default()
            ),
            Err(SaleError::ItemOutOfRange(444))
        );
    }
}
