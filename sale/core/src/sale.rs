// Copyright (c) 2024 The Botho Foundation

//! The sale ledger as callers see it.
//!
//! [`Sale`] owns the configuration and the state and exposes every boundary
//! operation. Each operation either commits in full or returns an error and
//! leaves the ledger untouched.

use tracing::{debug, info};

use crate::{
    address::Address,
    claim::{ClaimLedger, ClaimSnapshot},
    config::{ConfigError, SaleConfig},
    context::{CallContext, Payout},
    error::{SaleError, SaleResult},
    membership::MembershipProof,
    mint::{MintController, MintReceipt},
    phase::SalePhase,
    registry::ItemId,
    settlement::AdminSettlement,
    state::{SaleState, WalletAccount},
    supply::SupplyCounters,
    Amount,
};

#[derive(Debug, Clone)]
pub struct Sale {
    config: SaleConfig,
    state: SaleState,
}

impl Sale {
    /// Create a sale in the `Inactive` phase with an empty pool.
    pub fn new(config: SaleConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(
            "Sale created: admin {}, price {}, {} items",
            config.sale.admin, config.sale.price, config.caps.total_capacity
        );
        Ok(Self {
            config,
            state: SaleState::new(),
        })
    }

    pub fn config(&self) -> &SaleConfig {
        &self.config
    }

    pub fn state(&self) -> &SaleState {
        &self.state
    }

    fn ensure_admin(&self, ctx: &CallContext) -> SaleResult<()> {
        if ctx.caller != self.config.sale.admin {
            debug!("Rejected administrative call from {}", ctx.caller);
            return Err(SaleError::Unauthorized);
        }
        Ok(())
    }

    fn set_phase(&mut self, to: SalePhase) -> SaleResult<()> {
        let from = self.state.phase;
        self.state.phase = from.transition(to)?;
        if from != to {
            info!("Sale phase changed from {} to {}", from, to);
        }
        Ok(())
    }

    // === Administration ===

    /// Open the presale.
    pub fn set_mintable(&mut self, ctx: &CallContext) -> SaleResult<()> {
        self.ensure_admin(ctx)?;
        self.set_phase(SalePhase::PreSale)
    }

    /// Open the public sale.
    pub fn set_public_sale(&mut self, ctx: &CallContext) -> SaleResult<()> {
        self.ensure_admin(ctx)?;
        self.set_phase(SalePhase::PublicSale)
    }

    /// Enable claims and snapshot the pool.
    ///
    /// Returns the treasury cut owed to the recipient, if the configuration
    /// keeps less than the whole pool for holders.
    pub fn set_claimable(&mut self, ctx: &CallContext) -> SaleResult<Option<Payout>> {
        self.ensure_admin(ctx)?;
        let activation = ClaimLedger::new(&self.config).activate(&mut self.state, ctx.timestamp)?;
        Ok(activation.treasury)
    }

    pub fn withdraw_all(&mut self, ctx: &CallContext) -> SaleResult<Payout> {
        self.ensure_admin(ctx)?;
        AdminSettlement::new(&self.config)
            .withdraw_all(&mut self.state, ctx.timestamp)
            .inspect_err(|e| debug!("Withdrawal at {} rejected: {}", ctx.timestamp, e))
    }

    // === Minting and claims ===

    pub fn mint(
        &mut self,
        ctx: &CallContext,
        ids: &[ItemId],
        proof: &MembershipProof,
    ) -> SaleResult<MintReceipt> {
        MintController::new(&self.config)
            .mint(&mut self.state, ctx, ids, proof)
            .inspect_err(|e| debug!("Mint of {:?} by {} rejected: {}", ids, ctx.caller, e))
    }

    /// Share the caller would receive by claiming now.
    pub fn calculate_claimable_share(&self, ctx: &CallContext) -> Amount {
        ClaimLedger::new(&self.config).compute_share(&self.state, &ctx.caller)
    }

    pub fn claim_share(&mut self, ctx: &CallContext) -> SaleResult<Payout> {
        ClaimLedger::new(&self.config)
            .claim(&mut self.state, &ctx.caller)
            .inspect_err(|e| debug!("Claim by {} rejected: {}", ctx.caller, e))
    }

    /// Move an item the caller owns to `to`.
    pub fn transfer(&mut self, ctx: &CallContext, to: Address, id: ItemId) -> SaleResult<()> {
        self.state
            .supply
            .registry_mut()
            .transfer(&ctx.caller, to, id)
            .inspect_err(|e| debug!("Transfer of {} by {} rejected: {}", id, ctx.caller, e))
    }

    // === Views ===

    pub fn phase(&self) -> SalePhase {
        self.state.phase
    }

    pub fn counters(&self) -> SupplyCounters {
        self.state.supply.counters()
    }

    pub fn pool_balance(&self) -> Amount {
        self.state.supply.pool_balance()
    }

    pub fn wallet(&self, address: &Address) -> WalletAccount {
        self.state.wallet(address)
    }

    pub fn claim_snapshot(&self) -> Option<&ClaimSnapshot> {
        self.state.claim_snapshot()
    }

    pub fn owner_of(&self, id: ItemId) -> Option<Address> {
        self.state.supply.registry().owner_of(id)
    }

    pub fn balance_of(&self, owner: &Address) -> usize {
        self.state.supply.registry().balance_of(owner)
    }

    pub fn items_of(&self, owner: &Address) -> Vec<ItemId> {
        self.state.supply.registry().items_of(owner)
    }

    /// `None` for an item that was never issued.
    pub fn is_claimed(&self, id: ItemId) -> Option<bool> {
        self.state.supply.registry().get(id).map(|item| item.claimed)
    }

    pub fn royalty_info(&self, sale_price: Amount) -> (Address, Amount) {
        self.config.royalty_info(sale_price)
    }

    /// Metadata URI of an issued item.
    pub fn token_uri(&self, id: ItemId) -> SaleResult<String> {
        if !self.state.supply.registry().contains(id) {
            return Err(SaleError::UnknownItem(id));
        }
        Ok(format!("{}{}", self.config.sale.base_uri, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UNIT;
    use chrono::{TimeZone, Utc};

    fn addr(n: u8) -> Address {
        Address::new([n; 20])
    }

    fn ctx(caller: Address) -> CallContext {
        CallContext::new(caller, Utc.timestamp_opt(1_700_000_000, 0).unwrap())
    }

    fn sale() -> Sale {
        let mut config = SaleConfig::new(addr(1), addr(2), [0; 32], [0; 32]);
        config.sale.base_uri = "ipfs://cid/".into();
        Sale::new(config).unwrap()
    }

    #[test]
    fn test_admin_operations_reject_others() {
        let mut sale = sale();
        let outsider = ctx(addr(9));
        assert_eq!(sale.set_mintable(&outsider), Err(SaleError::Unauthorized));
        assert_eq!(sale.set_public_sale(&outsider), Err(SaleError::Unauthorized));
        assert_eq!(sale.set_claimable(&outsider), Err(SaleError::Unauthorized));
        assert_eq!(sale.withdraw_all(&outsider), Err(SaleError::Unauthorized));
        assert_eq!(sale.phase(), SalePhase::Inactive);
        assert!(sale.claim_snapshot().is_none());
    }

    #[test]
    fn test_phase_transitions() {
        let mut sale = sale();
        let admin = ctx(addr(1));
        sale.set_mintable(&admin).unwrap();
        sale.set_mintable(&admin).unwrap();
        assert_eq!(sale.phase(), SalePhase::PreSale);
        sale.set_public_sale(&admin).unwrap();
        sale.set_public_sale(&admin).unwrap();
        assert_eq!(
            sale.set_mintable(&admin),
            Err(SaleError::InvalidPhaseTransition {
                from: SalePhase::PublicSale,
                to: SalePhase::PreSale
            })
        );
        assert_eq!(sale.phase(), SalePhase::PublicSale);
    }

    #[test]
    fn test_public_sale_straight_from_inactive() {
        let mut sale = sale();
        sale.set_public_sale(&ctx(addr(1))).unwrap();
        assert_eq!(sale.phase(), SalePhase::PublicSale);
    }

    #[test]
    fn test_views_and_metadata() {
        let mut sale = sale();
        sale.set_public_sale(&ctx(addr(1))).unwrap();
        sale.mint(&ctx(addr(5)).with_value(2 * UNIT), &[8, 3], &MembershipProof::default())
            .unwrap();

        assert_eq!(sale.owner_of(3), Some(addr(5)));
        assert_eq!(sale.balance_of(&addr(5)), 2);
        assert_eq!(sale.items_of(&addr(5)), vec![3, 8]);
        assert_eq!(sale.is_claimed(3), Some(false));
        assert_eq!(sale.is_claimed(4), None);
        assert_eq!(sale.token_uri(8).unwrap(), "ipfs://cid/8");
        assert_eq!(sale.token_uri(9), Err(SaleError::UnknownItem(9)));
        assert_eq!(sale.royalty_info(10 * UNIT), (addr(2), UNIT));
        assert_eq!(sale.wallet(&addr(5)).mint_count, 2);
        assert_eq!(sale.pool_balance(), 2 * UNIT);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = SaleConfig::new(Address::ZERO, addr(2), [0; 32], [0; 32]);
        assert!(matches!(Sale::new(config), Err(ConfigError::Invalid(_))));
    }
}
