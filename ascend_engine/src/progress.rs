//! Per-player progression state.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Progress of one player in one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryProgress {
    pub level: u32,
    pub current_exp: f64,
    pub exp_for_next_level: f64,
    pub pending_level_ups: u32,
    pub can_gain_exp: bool,
}

impl CategoryProgress {
    /// Fresh level-1 progress with the given requirement for level 2.
    pub fn new(exp_for_next_level: f64) -> Self {
        Self {
            level: 1,
            current_exp: 0.0,
            exp_for_next_level,
            pending_level_ups: 0,
            can_gain_exp: true,
        }
    }

    /// Whether experience is currently blocked.
    pub fn is_blocked(&self) -> bool {
        !self.can_gain_exp
    }

    /// Share of the current level completed, in `0.0..=1.0`.
    pub fn fraction(&self) -> f64 {
        if self.exp_for_next_level <= 0.0 {
            return 1.0;
        }
        (self.current_exp / self.exp_for_next_level).clamp(0.0, 1.0)
    }
}

impl Default for CategoryProgress {
    fn default() -> Self {
        Self::new(100.0)
    }
}

/// Everything persisted for one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub player_id: Uuid,
    #[serde(default)]
    pub categories: BTreeMap<String, CategoryProgress>,
    #[serde(default)]
    pub skill_points: BTreeMap<String, u32>,
    #[serde(default)]
    pub skills: BTreeMap<String, BTreeMap<String, u32>>,
    #[serde(default)]
    pub completed_quests: BTreeMap<String, BTreeSet<u32>>,
}

impl PlayerRecord {
    pub fn new(player_id: Uuid) -> Self {
        Self {
            player_id,
            categories: BTreeMap::new(),
            skill_points: BTreeMap::new(),
            skills: BTreeMap::new(),
            completed_quests: BTreeMap::new(),
        }
    }

    pub fn progress(&self, category: &str) -> Option<&CategoryProgress> {
        self.categories.get(category)
    }

    /// Progress for `category`, created with `exp_for_next_level` when missing.
    pub fn progress_mut(&mut self, category: &str, exp_for_next_level: impl FnOnce() -> f64) -> &mut CategoryProgress {
        self.categories
            .entry(category.to_string())
            .or_insert_with(|| CategoryProgress::new(exp_for_next_level()))
    }

    pub fn level(&self, category: &str) -> u32 {
        self.progress(category).map_or(1, |progress| progress.level)
    }

    pub fn points(&self, category: &str) -> u32 {
        self.skill_points.get(category).copied().unwrap_or(0)
    }

    pub fn add_points(&mut self, category: &str, amount: u32) {
        let points = self.skill_points.entry(category.to_string()).or_insert(0);
        *points = points.saturating_add(amount);
    }

    pub fn skill_rank(&self, category: &str, skill: &str) -> u32 {
        self.skills
            .get(category)
            .and_then(|ranks| ranks.get(skill))
            .copied()
            .unwrap_or(0)
    }

    pub fn set_skill_rank(&mut self, category: &str, skill: &str, rank: u32) {
        let ranks = self.skills.entry(category.to_string()).or_default();
        if rank == 0 {
            ranks.remove(skill);
        } else {
            ranks.insert(skill.to_string(), rank);
        }
    }

    pub fn is_quest_completed(&self, category: &str, level: u32) -> bool {
        self.completed_quests
            .get(category)
            .is_some_and(|levels| levels.contains(&level))
    }

    /// Record completion; false when it was already recorded.
    pub fn mark_quest_completed(&mut self, category: &str, level: u32) -> bool {
        self.completed_quests.entry(category.to_string()).or_default().insert(level)
    }
}
