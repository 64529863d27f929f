//! Skill-point economy and skill ranks.

use std::sync::Arc;

use log::{info, warn};
use uuid::Uuid;

use crate::config::Settings;
use crate::registry::CategoryRegistry;
use crate::store::ProgressionStore;

#[derive(Debug)]
pub struct SkillEconomy {
    categories: Arc<CategoryRegistry>,
    store: Arc<ProgressionStore>,
    settings: Arc<Settings>,
}

impl SkillEconomy {
    pub fn new(categories: Arc<CategoryRegistry>, store: Arc<ProgressionStore>, settings: Arc<Settings>) -> Self {
        Self {
            categories,
            store,
            settings,
        }
    }

    /// True iff the skill exists, points cover its cost and it is below max rank.
    pub fn can_activate(&self, player: Uuid, category_id: &str, skill_id: &str) -> bool {
        let Some(category) = self.categories.get(category_id) else {
            return false;
        };
        let Some(skill) = category.skill(skill_id) else {
            return false;
        };
        self.store.peek(player, |record| {
            record.points(category_id) >= skill.cost && record.skill_rank(category_id, skill_id) < skill.max_ranks
        })
    }

    /// Spend `cost` points for one more rank. No mutation when the check fails.
    pub fn activate(&self, player: Uuid, category_id: &str, skill_id: &str) -> bool {
        let Some(category) = self.categories.get(category_id) else {
            return false;
        };
        let Some(skill) = category.skill(skill_id) else {
            return false;
        };
        self.store.with_record(player, |record| {
            let points = record.points(category_id);
            let rank = record.skill_rank(category_id, skill_id);
            if points < skill.cost || rank >= skill.max_ranks {
                return false;
            }
            record.skill_points.insert(category_id.to_string(), points - skill.cost);
            record.set_skill_rank(category_id, skill_id, rank + 1);
            info!("{player} raised {category_id}/{skill_id} to rank {}", rank + 1);
            true
        })
    }

    /// Zero one skill and refund `cost × rank`. `None` when respec is disabled
    /// or the skill does not exist.
    pub fn deactivate(&self, player: Uuid, category_id: &str, skill_id: &str) -> Option<u32> {
        if !self.settings.get().allow_skill_respec {
            return None;
        }
        let category = self.categories.get(category_id)?;
        let skill = category.skill(skill_id)?;
        let refund = self.store.with_record(player, |record| {
            let rank = record.skill_rank(category_id, skill_id);
            let refund = skill.cost.saturating_mul(rank);
            record.set_skill_rank(category_id, skill_id, 0);
            record.add_points(category_id, refund);
            refund
        });
        Some(refund)
    }

    /// Zero every skill in the category and refund `Σ cost × rank`, ignoring the
    /// respec policy. Ranks of skills no longer defined are dropped without refund.
    pub fn reset_all(&self, player: Uuid, category_id: &str) -> u32 {
        let Some(category) = self.categories.get(category_id) else {
            return 0;
        };
        let refund = self.store.with_record(player, |record| {
            let Some(ranks) = record.skills.remove(category_id) else {
                return 0;
            };
            let mut refund: u32 = 0;
            for (skill_id, rank) in ranks {
                match category.skill(&skill_id) {
                    Some(skill) => refund = refund.saturating_add(skill.cost.saturating_mul(rank)),
                    None => warn!("dropping {rank} rank(s) of undefined skill '{skill_id}' in {category_id}"),
                }
            }
            record.add_points(category_id, refund);
            refund
        });
        info!("{player} reset {category_id} skills, refunded {refund}");
        refund
    }

    /// Player-initiated reset; `None` when respec is disabled.
    pub fn respec(&self, player: Uuid, category_id: &str) -> Option<u32> {
        if !self.settings.get().allow_skill_respec {
            return None;
        }
        Some(self.reset_all(player, category_id))
    }

    pub fn skill_rank(&self, player: Uuid, category_id: &str, skill_id: &str) -> u32 {
        self.store.peek(player, |record| record.skill_rank(category_id, skill_id))
    }

    pub fn has_skill(&self, player: Uuid, category_id: &str, skill_id: &str) -> bool {
        self.skill_rank(player, category_id, skill_id) > 0
    }

    pub fn available_points(&self, player: Uuid, category_id: &str) -> u32 {
        self.store.peek(player, |record| record.points(category_id))
    }

    /// Credit points directly (admin).
    pub fn grant_points(&self, player: Uuid, category_id: &str, amount: u32) {
        self.store.with_record(player, |record| record.add_points(category_id, amount));
    }
}
