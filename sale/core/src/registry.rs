// Copyright (c) 2024 The Botho Foundation

//! Item ownership registry.
//!
//! Standard registry semantics: a transfer moves the owner and nothing else.
//! The claimed flag travels with the item.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    address::Address,
    error::{SaleError, SaleResult},
};

/// Caller-chosen item identifier.
pub type ItemId = u32;

/// An issued item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Current owner
    pub owner: Address,

    /// Set once, when the item's share has been paid out
    pub claimed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ItemRegistry {
    items: BTreeMap<ItemId, Item>,
    by_owner: HashMap<Address, BTreeSet<ItemId>>,
}

impl ItemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of issued items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.items.contains_key(&id)
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    pub fn owner_of(&self, id: ItemId) -> Option<Address> {
        self.items.get(&id).map(|item| item.owner)
    }

    pub fn balance_of(&self, owner: &Address) -> usize {
        self.by_owner.get(owner).map_or(0, BTreeSet::len)
    }

    /// Items currently held by `owner`, in id order.
    pub fn items_of(&self, owner: &Address) -> Vec<ItemId> {
        self.by_owner
            .get(owner)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Items held by `owner` whose share has not been paid out yet.
    pub fn unclaimed_of(&self, owner: &Address) -> Vec<ItemId> {
        self.by_owner
            .get(owner)
            .map(|ids| {
                ids.iter()
                    .copied()
                    .filter(|id| self.items.get(id).is_some_and(|item| !item.claimed))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Record a new item. The caller has already checked that `id` is free.
    pub(crate) fn issue(&mut self, id: ItemId, owner: Address) {
        debug_assert!(!self.items.contains_key(&id), "item {} issued twice", id);
        self.items.insert(
            id,
            Item {
                owner,
                claimed: false,
            },
        );
        self.by_owner.entry(owner).or_default().insert(id);
    }

    /// Flip the claimed flag. It never goes back.
    pub(crate) fn mark_claimed(&mut self, id: ItemId) {
        if let Some(item) = self.items.get_mut(&id) {
            item.claimed = true;
        }
    }

    /// Move `id` from `from` to `to`.
    pub fn transfer(&mut self, from: &Address, to: Address, id: ItemId) -> SaleResult<()> {
        let item = self.items.get_mut(&id).ok_or(SaleError::UnknownItem(id))?;
        if item.owner != *from {
            return Err(SaleError::NotItemOwner(id));
        }
        item.owner = to;

        if let Some(ids) = self.by_owner.get_mut(from) {
            ids.remove(&id);
            if ids.is_empty() {
                self.by_owner.remove(from);
            }
        }
        self.by_owner.entry(to).or_default().insert(id);

        info!("Transferred item {} from {} to {}", id, from, to);
        Ok(())
    }
}
