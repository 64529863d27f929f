//! Modifier aggregation: level bonuses plus skill effects, summed per id.
//! Reads never load a player into the cache.

use std::collections::BTreeMap;
use std::sync::Arc;

use ascend_data::CategoryDef;
use uuid::Uuid;

use crate::progress::PlayerRecord;
use crate::registry::CategoryRegistry;
use crate::store::ProgressionStore;

pub type ModifierMap = BTreeMap<String, f64>;

#[derive(Debug)]
pub struct ModifierAggregator {
    categories: Arc<CategoryRegistry>,
    store: Arc<ProgressionStore>,
}

impl ModifierAggregator {
    pub fn new(categories: Arc<CategoryRegistry>, store: Arc<ProgressionStore>) -> Self {
        Self { categories, store }
    }

    /// Every modifier the player has, summed across all registered categories.
    pub fn compute(&self, player: Uuid) -> ModifierMap {
        let categories = self.categories.all();
        self.store.peek(player, |record| {
            let mut totals = ModifierMap::new();
            for category in &categories {
                accumulate(record, category, &mut totals);
            }
            totals
        })
    }

    /// Modifiers contributed by one category only.
    pub fn compute_for_category(&self, player: Uuid, category_id: &str) -> ModifierMap {
        let mut totals = ModifierMap::new();
        if let Some(category) = self.categories.get(category_id) {
            self.store
                .peek(player, |record| accumulate(record, &category, &mut totals));
        }
        totals
    }

    /// Total for one modifier id, 0.0 when nothing contributes.
    pub fn value(&self, player: Uuid, modifier_id: &str) -> f64 {
        self.compute(player).get(modifier_id).copied().unwrap_or(0.0)
    }
}

/// Add one category's contributions. Categories without progress contribute nothing.
fn accumulate(record: &PlayerRecord, category: &CategoryDef, totals: &mut ModifierMap) {
    let Some(progress) = record.progress(&category.id) else {
        return;
    };
    for bonus in category
        .level_bonuses
        .iter()
        .filter(|bonus| bonus.level >= 1 && bonus.level <= progress.level)
    {
        for (id, value) in &bonus.modifiers {
            *totals.entry(id.clone()).or_insert(0.0) += value;
        }
    }
    if let Some(ranks) = record.skills.get(&category.id) {
        for (skill_id, rank) in ranks.iter().filter(|(_, rank)| **rank > 0) {
            let Some(skill) = category.skill(skill_id) else { continue };
            for (id, per_rank) in &skill.effects {
                *totals.entry(id.clone()).or_insert(0.0) += per_rank * f64::from(*rank);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ascend_data::{LevelBonusDef, SkillDef};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn sums_bonuses_up_to_level_and_skill_ranks() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let categories = Arc::new(CategoryRegistry::new());
        let mut mining = CategoryDef::new("mining");
        mining.level_bonuses = vec![
            LevelBonusDef::new(1).with("mining_speed", 0.01),
            LevelBonusDef::new(2).with("mining_speed", 0.01),
            LevelBonusDef::new(3).with("mining_speed", 0.01).with("max_health", 2.0),
        ];
        let mut skill = SkillDef::new("efficient_mining");
        skill.effects.insert("mining_speed".into(), 0.02);
        mining.skills.push(skill);
        categories.register(mining);
        let store = Arc::new(ProgressionStore::new(dir.path()));
        let aggregator = ModifierAggregator::new(Arc::clone(&categories), Arc::clone(&store));
        let player = Uuid::new_v4();

        assert!(aggregator.compute(player).is_empty());
        assert!(!store.is_cached(player));

        store.with_record(player, |record| {
            record.progress_mut("mining", || 100.0).level = 2;
            record.set_skill_rank("mining", "efficient_mining", 3);
        });
        let totals = aggregator.compute(player);
        assert!(close(totals["mining_speed"], 0.02 + 0.06));
        assert!(!totals.contains_key("max_health"));
        assert!(close(aggregator.value(player, "unknown"), 0.0));
        assert_eq!(aggregator.compute_for_category(player, "mining"), totals);
        Ok(())
    }
}
