//! Milestone quest gate and the inventory seam it depends on.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use ascend_data::{MilestoneQuestDef, QuestItemDef};
use log::info;
use uuid::Uuid;

use crate::registry::CategoryRegistry;
use crate::store::ProgressionStore;

/// Item storage owned by the host game.
pub trait Inventory: Send + Sync {
    /// True when the player holds at least `amount` of every listed item.
    fn has_items(&self, player: Uuid, items: &[QuestItemDef]) -> bool;

    /// Remove the listed items. Only called after `has_items` returned true.
    fn remove_items(&self, player: Uuid, items: &[QuestItemDef]);
}

/// Inventory that never holds anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoInventory;

impl Inventory for NoInventory {
    fn has_items(&self, _player: Uuid, items: &[QuestItemDef]) -> bool {
        items.is_empty()
    }

    fn remove_items(&self, _player: Uuid, _items: &[QuestItemDef]) {}
}

/// In-memory inventory for tests and the admin REPL.
#[derive(Debug, Default)]
pub struct MemoryInventory {
    items: Mutex<HashMap<(Uuid, String), u32>>,
}

impl MemoryInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn give(&self, player: Uuid, item_id: &str, amount: u32) {
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        *items.entry((player, item_id.to_string())).or_insert(0) += amount;
    }

    pub fn count(&self, player: Uuid, item_id: &str) -> u32 {
        let items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        items.get(&(player, item_id.to_string())).copied().unwrap_or(0)
    }
}

impl Inventory for MemoryInventory {
    fn has_items(&self, player: Uuid, items: &[QuestItemDef]) -> bool {
        items.iter().all(|item| self.count(player, &item.item_id) >= item.amount)
    }

    fn remove_items(&self, player: Uuid, items: &[QuestItemDef]) {
        let mut held = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        for item in items {
            if let Some(count) = held.get_mut(&(player, item.item_id.clone())) {
                *count = count.saturating_sub(item.amount);
            }
        }
    }
}

/// Result of trying to complete a milestone quest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestOutcome {
    UnknownCategory,
    NoQuest,
    AlreadyCompleted,
    RequirementsMissing,
    /// Completed; `gate_open` tells whether experience gain resumed.
    Completed { gate_open: bool },
}

impl QuestOutcome {
    pub fn completed(self) -> bool {
        matches!(self, QuestOutcome::Completed { .. })
    }
}

pub struct QuestGate {
    categories: Arc<CategoryRegistry>,
    store: Arc<ProgressionStore>,
    inventory: Arc<dyn Inventory>,
}

impl std::fmt::Debug for QuestGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuestGate").finish_non_exhaustive()
    }
}

impl QuestGate {
    pub fn new(categories: Arc<CategoryRegistry>, store: Arc<ProgressionStore>, inventory: Arc<dyn Inventory>) -> Self {
        Self {
            categories,
            store,
            inventory,
        }
    }

    pub fn quest_at(&self, category_id: &str, level: u32) -> Option<MilestoneQuestDef> {
        self.categories.get(category_id)?.milestone(level).cloned()
    }

    pub fn requires_quest(&self, category_id: &str, level: u32) -> bool {
        self.categories
            .get(category_id)
            .is_some_and(|category| category.has_quest_at(level))
    }

    pub fn is_completed(&self, player: Uuid, category_id: &str, level: u32) -> bool {
        self.store
            .peek(player, |record| record.is_quest_completed(category_id, level))
    }

    /// Whether the player meets the quest at `level`. No quest means satisfied.
    pub fn is_satisfied(&self, player: Uuid, category_id: &str, level: u32) -> bool {
        match self.quest_at(category_id, level) {
            None => true,
            Some(quest) => self.meets(player, &quest),
        }
    }

    fn meets(&self, player: Uuid, quest: &MilestoneQuestDef) -> bool {
        !quest.kind.requires_items() || self.inventory.has_items(player, &quest.required_items)
    }

    /// Complete the quest at `level`, consuming items and reopening the gate
    /// once no level-ups remain pending.
    pub fn complete(&self, player: Uuid, category_id: &str, level: u32) -> QuestOutcome {
        let Some(category) = self.categories.get(category_id) else {
            return QuestOutcome::UnknownCategory;
        };
        let Some(quest) = category.milestone(level) else {
            return QuestOutcome::NoQuest;
        };

        self.store.with_record(player, |record| {
            if record.is_quest_completed(category_id, level) {
                return QuestOutcome::AlreadyCompleted;
            }
            if !self.meets(player, quest) {
                return QuestOutcome::RequirementsMissing;
            }
            record.mark_quest_completed(category_id, level);
            if quest.kind.requires_items() {
                self.inventory.remove_items(player, &quest.required_items);
            }
            let progress = record.progress_mut(category_id, || category.exp_curve.exp_for_level(1));
            if progress.pending_level_ups == 0 {
                progress.can_gain_exp = true;
            }
            info!("{player} completed the level {level} milestone in {category_id}");
            QuestOutcome::Completed {
                gate_open: progress.can_gain_exp,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ascend_data::{CategoryDef, QuestKind};

    fn gate(dir: &std::path::Path, inventory: Arc<dyn Inventory>) -> (QuestGate, Arc<ProgressionStore>) {
        let categories = Arc::new(CategoryRegistry::new());
        let mut mining = CategoryDef::new("mining");
        mining.milestones.insert(10, MilestoneQuestDef::default());
        mining.milestones.insert(
            20,
            MilestoneQuestDef {
                kind: QuestKind::ItemCollection,
                required_items: vec![QuestItemDef {
                    item_id: "iron_ore".into(),
                    amount: 50,
                }],
                ..MilestoneQuestDef::default()
            },
        );
        categories.register(mining);
        let store = Arc::new(ProgressionStore::new(dir));
        (QuestGate::new(categories, Arc::clone(&store), inventory), store)
    }

    #[test]
    fn talk_quests_are_always_satisfied() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let (gate, _) = gate(dir.path(), Arc::new(NoInventory));
        let player = Uuid::new_v4();
        assert!(gate.is_satisfied(player, "mining", 10));
        assert!(gate.is_satisfied(player, "mining", 11));
        assert!(!gate.is_satisfied(player, "mining", 20));
        assert_eq!(gate.complete(player, "mining", 20), QuestOutcome::RequirementsMissing);
        assert_eq!(gate.complete(player, "mining", 11), QuestOutcome::NoQuest);
        Ok(())
    }

    #[test]
    fn completion_consumes_items_once() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let inventory = Arc::new(MemoryInventory::new());
        let (gate, store) = gate(dir.path(), inventory.clone());
        let player = Uuid::new_v4();
        inventory.give(player, "iron_ore", 60);
        store.with_record(player, |record| {
            let progress = record.progress_mut("mining", || 100.0);
            progress.level = 20;
            progress.can_gain_exp = false;
        });

        assert!(gate.is_satisfied(player, "mining", 20));
        assert_eq!(gate.complete(player, "mining", 20), QuestOutcome::Completed { gate_open: true });
        assert_eq!(inventory.count(player, "iron_ore"), 10);
        assert_eq!(gate.complete(player, "mining", 20), QuestOutcome::AlreadyCompleted);
        assert_eq!(inventory.count(player, "iron_ore"), 10);
        assert!(gate.is_completed(player, "mining", 20));
        Ok(())
    }

    #[test]
    fn pending_level_ups_keep_gate_closed() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let (gate, store) = gate(dir.path(), Arc::new(NoInventory));
        let player = Uuid::new_v4();
        store.with_record(player, |record| {
            let progress = record.progress_mut("mining", || 100.0);
            progress.level = 10;
            progress.pending_level_ups = 1;
            progress.can_gain_exp = false;
        });
        assert_eq!(gate.complete(player, "mining", 10), QuestOutcome::Completed { gate_open: false });
        Ok(())
    }
}
