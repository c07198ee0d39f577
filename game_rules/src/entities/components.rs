//! Item holdings for players.
//!
//! Inventories belong to the host game; [`InventoryLedger`] is the in-memory
//! [`Inventories`] implementation used when the host has nothing better to offer.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::PlayerId;
use crate::mechanics::Inventories;

/// Inventory component for one player.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryComponent {
    pub items: Vec<ItemStack>,
}

/// A stack of items in inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemStack {
    pub item_id: String,
    pub quantity: u32,
}

impl InventoryComponent {
    /// Total quantity of an item across all stacks.
    pub fn count(&self, item_id: &str) -> u32 {
        self.items
            .iter()
            .filter(|stack| stack.item_id == item_id)
            .fold(0u32, |total, stack| total.saturating_add(stack.quantity))
    }

    /// Add items, merging into an existing stack when there is one.
    pub fn add(&mut self, item_id: &str, quantity: u32) {
        if quantity == 0 {
            return;
        }
        match self.items.iter_mut().find(|stack| stack.item_id == item_id) {
            Some(stack) => stack.quantity = stack.quantity.saturating_add(quantity),
            None => self.items.push(ItemStack {
                item_id: item_id.to_string(),
                quantity,
            }),
        }
    }

    /// Remove up to `quantity` items. Returns how many were actually removed.
    pub fn remove(&mut self, item_id: &str, quantity: u32) -> u32 {
        let mut remaining = quantity;
        for stack in self.items.iter_mut().filter(|s| s.item_id == item_id) {
            if remaining == 0 {
                break;
            }
            let taken = remaining.min(stack.quantity);
            stack.quantity -= taken;
            remaining -= taken;
        }
        self.items.retain(|stack| stack.quantity > 0);
        quantity - remaining
    }
}

/// In-memory inventories keyed by player.
#[derive(Debug, Clone, Default)]
pub struct InventoryLedger {
    holdings: HashMap<PlayerId, InventoryComponent>,
}

impl InventoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a player's inventory, if they hold anything.
    pub fn get(&self, player: PlayerId) -> Option<&InventoryComponent> {
        self.holdings.get(&player)
    }
}

impl Inventories for InventoryLedger {
    fn item_count(&self, player: PlayerId, item_id: &str) -> u32 {
        self.holdings
            .get(&player)
            .map(|inv| inv.count(item_id))
            .unwrap_or(0)
    }

    fn give_items(&mut self, player: PlayerId, item_id: &str, count: u32) {
        self.holdings.entry(player).or_default().add(item_id, count);
    }

    fn take_items(&mut self, player: PlayerId, item_id: &str, count: u32) -> u32 {
        self.holdings
            .get_mut(&player)
            .map(|inv| inv.remove(item_id, count))
            .unwrap_or(0)
    }
}
