//! The experience state machine.
//!
//! Per (player, category) progress is either gaining or blocked. A grant that
//! crosses the requirement banks one pending level-up and blocks further gain.
//! Level-ups are applied only by an explicit claim; a milestone quest at the
//! newly reached level keeps the category blocked until the quest is completed.

use std::sync::Arc;

use ascend_data::CategoryDef;
use log::{debug, info};
use uuid::Uuid;

use crate::config::Settings;
use crate::error::{ProgressionError, ProgressionResult};
use crate::progress::{CategoryProgress, PlayerRecord};
use crate::registry::{ActionRegistry, CategoryRegistry};
use crate::store::ProgressionStore;

/// Requirement reported for categories that are not registered.
pub const UNKNOWN_CATEGORY_REQUIREMENT: f64 = 100.0;

/// Result of an experience grant.
#[derive(Debug, Clone, PartialEq)]
pub enum GrantOutcome {
    UnknownCategory,
    UnknownAction,
    InvalidAmount,
    /// Gate closed: a level-up is pending or a quest is outstanding.
    Blocked,
    MaxLevel,
    Gained { current_exp: f64, required: f64 },
    /// The grant crossed the requirement; a level-up is waiting to be claimed.
    LevelUpReady { next_level: u32 },
}

impl GrantOutcome {
    /// Whether experience was actually added.
    pub fn applied(&self) -> bool {
        matches!(self, GrantOutcome::Gained { .. } | GrantOutcome::LevelUpReady { .. })
    }
}

/// Result of claiming a pending level-up.
#[derive(Debug, Clone, PartialEq)]
pub enum ClaimOutcome {
    UnknownCategory,
    NothingPending,
    MaxLevel,
    /// The current level's milestone quest must be completed first.
    QuestRequired { level: u32 },
    LeveledUp {
        level: u32,
        points_granted: u32,
        /// The new level carries a quest that now blocks gain.
        quest_gated: bool,
        pending: u32,
    },
}

impl ClaimOutcome {
    pub fn leveled_up(&self) -> bool {
        matches!(self, ClaimOutcome::LeveledUp { .. })
    }
}

#[derive(Debug)]
pub struct ExperienceEngine {
    categories: Arc<CategoryRegistry>,
    actions: Arc<ActionRegistry>,
    store: Arc<ProgressionStore>,
    settings: Arc<Settings>,
}

impl ExperienceEngine {
    pub fn new(
        categories: Arc<CategoryRegistry>,
        actions: Arc<ActionRegistry>,
        store: Arc<ProgressionStore>,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            categories,
            actions,
            store,
            settings,
        }
    }

    /// Add `amount` experience in `category_id`.
    pub fn grant(&self, player: Uuid, category_id: &str, amount: f64) -> GrantOutcome {
        let Some(category) = self.categories.get(category_id) else {
            debug!("ignoring grant for unknown category '{category_id}'");
            return GrantOutcome::UnknownCategory;
        };
        if !amount.is_finite() || amount <= 0.0 {
            return GrantOutcome::InvalidAmount;
        }
        let max_level = self.settings.get().max_level;

        self.store.with_record(player, |record| {
            let progress = progress_entry(record, &category);
            if progress.is_blocked() {
                return GrantOutcome::Blocked;
            }
            if progress.level >= max_level {
                return GrantOutcome::MaxLevel;
            }
            progress.current_exp += amount;
            if progress.current_exp >= progress.exp_for_next_level {
                progress.pending_level_ups += 1;
                progress.can_gain_exp = false;
                info!("{player} can level {} to {}", category.id, progress.level + 1);
                GrantOutcome::LevelUpReady {
                    next_level: progress.level + 1,
                }
            } else {
                GrantOutcome::Gained {
                    current_exp: progress.current_exp,
                    required: progress.exp_for_next_level,
                }
            }
        })
    }

    /// Grant the base experience of `action_id` times `quantity`.
    ///
    /// The difficulty factor is informational and never applied here.
    pub fn grant_action(&self, player: Uuid, action_id: &str, quantity: u32) -> GrantOutcome {
        let Some(mapping) = self.actions.get(action_id) else {
            debug!("ignoring unmapped action '{action_id}'");
            return GrantOutcome::UnknownAction;
        };
        debug!("{player} performed {action_id} x{quantity}");
        self.grant(player, &mapping.category_id, mapping.base_exp * f64::from(quantity))
    }

    /// Apply one pending level-up.
    pub fn claim_level_up(&self, player: Uuid, category_id: &str) -> ClaimOutcome {
        let Some(category) = self.categories.get(category_id) else {
            return ClaimOutcome::UnknownCategory;
        };
        let settings = self.settings.get();

        self.store.with_record(player, |record| {
            let current = progress_entry(record, &category).clone();
            if current.pending_level_ups == 0 {
                return ClaimOutcome::NothingPending;
            }
            if current.level >= settings.max_level {
                return ClaimOutcome::MaxLevel;
            }
            if category.has_quest_at(current.level) && !record.is_quest_completed(&category.id, current.level) {
                return ClaimOutcome::QuestRequired { level: current.level };
            }

            let new_level = current.level + 1;
            let quest_gated = category.has_quest_at(new_level) && !record.is_quest_completed(&category.id, new_level);
            record.add_points(&category.id, settings.skill_points_per_level);

            let progress = progress_entry(record, &category);
            progress.level = new_level;
            progress.current_exp = 0.0;
            progress.pending_level_ups -= 1;
            progress.exp_for_next_level = category.exp_curve.exp_for_level(new_level);
            if quest_gated {
                progress.can_gain_exp = false;
            } else if progress.pending_level_ups == 0 {
                progress.can_gain_exp = true;
            }

            info!("{player} leveled {} to {new_level}", category.id);
            ClaimOutcome::LeveledUp {
                level: new_level,
                points_granted: settings.skill_points_per_level,
                quest_gated,
                pending: progress.pending_level_ups,
            }
        })
    }

    /// Force a level (admin). Clamped to `1..=max_level`; returns the level set.
    ///
    /// # Errors
    /// Returns [`ProgressionError::UnknownCategory`] for unregistered categories.
    pub fn set_level(&self, player: Uuid, category_id: &str, level: u32) -> ProgressionResult<u32> {
        let category = self
            .categories
            .get(category_id)
            .ok_or_else(|| ProgressionError::UnknownCategory(category_id.to_string()))?;
        let level = level.clamp(1, self.settings.get().max_level.max(1));

        self.store.with_record(player, |record| {
            let progress = progress_entry(record, &category);
            progress.level = level;
            progress.current_exp = 0.0;
            progress.exp_for_next_level = category.exp_curve.exp_for_level(level);
            progress.pending_level_ups = 0;
            progress.can_gain_exp = true;
        });
        info!("{player} set to level {level} in {category_id}");
        Ok(level)
    }

    /// Curve requirement for `level`, or 100.0 for unknown categories.
    pub fn exp_for_level(&self, category_id: &str, level: u32) -> f64 {
        self.categories
            .get(category_id)
            .map_or(UNKNOWN_CATEGORY_REQUIREMENT, |category| category.exp_curve.exp_for_level(level))
    }

    pub fn can_gain_exp(&self, player: Uuid, category_id: &str) -> bool {
        self.store
            .peek(player, |record| record.progress(category_id).is_none_or(|p| p.can_gain_exp))
    }

    /// Level in `category_id`; 1 when the player has no progress there.
    pub fn level_of(&self, player: Uuid, category_id: &str) -> u32 {
        self.store.peek(player, |record| record.level(category_id))
    }

    pub fn progress_of(&self, player: Uuid, category_id: &str) -> Option<CategoryProgress> {
        self.store.peek(player, |record| record.progress(category_id).cloned())
    }

    /// Ensure an entry exists for every registered category.
    pub fn initialize_player(&self, player: Uuid) {
        let categories = self.categories.all();
        self.store.with_record(player, |record| {
            for category in &categories {
                progress_entry(record, category);
            }
        });
    }
}

fn progress_entry<'a>(record: &'a mut PlayerRecord, category: &CategoryDef) -> &'a mut CategoryProgress {
    record.progress_mut(&category.id, || category.exp_curve.exp_for_level(1))
}
