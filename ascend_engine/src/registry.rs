//! Category and action registries.
//!
//! Both are last-writer-wins maps behind an `RwLock`, so config loading and
//! runtime registration from feature packs can interleave with lookups.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use ascend_data::{ActionSetDef, CategoryDef, normalize_difficulty};
use log::debug;

/// Resolved mapping for a single action id.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionMapping {
    pub action_id: String,
    pub category_id: String,
    pub base_exp: f64,
    /// Informational only; never applied to grants automatically.
    pub difficulty_factor: f64,
}

impl ActionMapping {
    /// Base experience scaled by the difficulty factor, for callers that opt in.
    pub fn scaled_exp(&self) -> f64 {
        self.base_exp * self.difficulty_factor
    }
}

#[derive(Debug, Default)]
pub struct CategoryRegistry {
    categories: RwLock<HashMap<String, Arc<CategoryDef>>>,
}

impl CategoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a category.
    pub fn register(&self, category: CategoryDef) {
        debug!("registering category '{}'", category.id);
        let mut map = self.categories.write().unwrap_or_else(PoisonError::into_inner);
        map.insert(category.id.clone(), Arc::new(category));
    }

    pub fn get(&self, id: &str) -> Option<Arc<CategoryDef>> {
        let map = self.categories.read().unwrap_or_else(PoisonError::into_inner);
        map.get(id).cloned()
    }

    pub fn has(&self, id: &str) -> bool {
        let map = self.categories.read().unwrap_or_else(PoisonError::into_inner);
        map.contains_key(id)
    }

    /// All categories, sorted by id.
    pub fn all(&self) -> Vec<Arc<CategoryDef>> {
        let map = self.categories.read().unwrap_or_else(PoisonError::into_inner);
        let mut all: Vec<_> = map.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    pub fn ids(&self) -> Vec<String> {
        self.all().iter().map(|cat| cat.id.clone()).collect()
    }

    /// Replace every entry with the given set.
    pub fn load_from(&self, categories: impl IntoIterator<Item = CategoryDef>) {
        let fresh: HashMap<_, _> = categories
            .into_iter()
            .map(|cat| (cat.id.clone(), Arc::new(cat)))
            .collect();
        let mut map = self.categories.write().unwrap_or_else(PoisonError::into_inner);
        *map = fresh;
    }
}

#[derive(Debug, Default)]
pub struct ActionRegistry {
    actions: RwLock<HashMap<String, ActionMapping>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an action. Non-positive factors read as 1.0.
    pub fn register(&self, action_id: &str, category_id: &str, base_exp: f64, difficulty_factor: Option<f64>) {
        let mapping = ActionMapping {
            action_id: action_id.to_string(),
            category_id: category_id.to_string(),
            base_exp,
            difficulty_factor: normalize_difficulty(difficulty_factor),
        };
        let mut map = self.actions.write().unwrap_or_else(PoisonError::into_inner);
        map.insert(action_id.to_string(), mapping);
    }

    pub fn get(&self, action_id: &str) -> Option<ActionMapping> {
        let map = self.actions.read().unwrap_or_else(PoisonError::into_inner);
        map.get(action_id).cloned()
    }

    pub fn has(&self, action_id: &str) -> bool {
        let map = self.actions.read().unwrap_or_else(PoisonError::into_inner);
        map.contains_key(action_id)
    }

    /// All action ids, sorted.
    pub fn action_ids(&self) -> Vec<String> {
        let map = self.actions.read().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<_> = map.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.actions.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace every entry with the actions of the given sets.
    pub fn load_from<'a>(&self, sets: impl IntoIterator<Item = &'a ActionSetDef>) {
        let mut fresh = HashMap::new();
        for set in sets {
            for action in &set.actions {
                fresh.insert(
                    action.action_id.clone(),
                    ActionMapping {
                        action_id: action.action_id.clone(),
                        category_id: set.category.clone(),
                        base_exp: action.exp,
                        difficulty_factor: action.effective_difficulty(),
                    },
                );
            }
        }
        let mut map = self.actions.write().unwrap_or_else(PoisonError::into_inner);
        *map = fresh;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_registration_wins() {
        let registry = CategoryRegistry::new();
        let mut first = CategoryDef::new("mining");
        first.display_name = "Miner".into();
        registry.register(first);
        let mut second = CategoryDef::new("mining");
        second.display_name = "Deep Miner".into();
        registry.register(second);

        assert_eq!(registry.all().len(), 1);
        assert_eq!(registry.get("mining").unwrap().display_name, "Deep Miner");
    }

    #[test]
    fn difficulty_defaults_to_one() {
        let actions = ActionRegistry::new();
        actions.register("break_iron_ore", "mining", 10.0, Some(1.2));
        actions.register("walk", "exploration", 1.0, Some(-3.0));
        actions.register("talk", "social", 1.0, None);

        assert!((actions.get("break_iron_ore").unwrap().difficulty_factor - 1.2).abs() < f64::EPSILON);
        assert!((actions.get("walk").unwrap().difficulty_factor - 1.0).abs() < f64::EPSILON);
        assert!((actions.get("talk").unwrap().difficulty_factor - 1.0).abs() < f64::EPSILON);
        assert!(!actions.has("fly"));
    }

    #[test]
    fn load_from_replaces_entries() {
        let actions = ActionRegistry::new();
        actions.register("stale", "mining", 1.0, None);
        let set = ActionSetDef::new("mining").with("break_Ore_Iron", 2.0, Some(1.0));
        actions.load_from([&set]);
        assert_eq!(actions.action_ids(), vec!["break_Ore_Iron".to_string()]);
        assert_eq!(actions.get("break_Ore_Iron").unwrap().category_id, "mining");
    }
}
