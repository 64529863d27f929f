//! Optional feature packs that extend the engine at startup.
//!
//! A pack registers its own categories and actions through the public
//! [`Progression`] API. Installed packs are kept by id and can be fetched back
//! by concrete type.

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use ascend_data::{CategoryDef, ExpCurveDef, LevelBonusDef, MilestoneQuestDef};
use log::info;

use crate::api::Progression;
use crate::defaults::{category, skill};

pub trait FeaturePack: Send + Sync {
    /// Stable identifier; a second pack with the same id is refused.
    fn id(&self) -> &'static str;

    /// Register categories, actions or anything else the pack contributes.
    fn install(&self, progression: &Progression);
}

#[derive(Default)]
pub struct PackRegistry {
    packs: RwLock<BTreeMap<&'static str, Arc<dyn Any + Send + Sync>>>,
}

impl std::fmt::Debug for PackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackRegistry").field("ids", &self.ids()).finish()
    }
}

impl PackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `pack` into `progression` unless a pack with its id is present.
    pub fn install<P: FeaturePack + 'static>(&self, pack: P, progression: &Progression) -> bool {
        let id = pack.id();
        if self.contains(id) {
            info!("feature pack '{id}' already installed");
            return false;
        }
        let pack = Arc::new(pack);
        pack.install(progression);
        self.packs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, pack);
        info!("installed feature pack '{id}'");
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.packs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(id)
    }

    /// Installed pack ids, sorted.
    pub fn ids(&self) -> Vec<&'static str> {
        self.packs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect()
    }

    /// First installed pack of concrete type `T`.
    pub fn get<T: FeaturePack + 'static>(&self) -> Option<Arc<T>> {
        let packs = self.packs.read().unwrap_or_else(PoisonError::into_inner);
        packs
            .values()
            .find_map(|pack| Arc::clone(pack).downcast::<T>().ok())
    }
}

pub const MAGIC_CATEGORY: &str = "magic";

/// Spell-casting category and its cast actions.
#[derive(Debug, Clone, Copy, Default)]
pub struct MagicPack;

impl MagicPack {
    /// Experience per cast, by spell rarity.
    pub const CAST_ACTIONS: &'static [(&'static str, f64)] = &[
        ("cast_spell_common", 10.0),
        ("cast_spell_uncommon", 20.0),
        ("cast_spell_rare", 40.0),
        ("cast_spell_epic", 80.0),
        ("cast_spell_legendary", 150.0),
    ];

    pub fn category() -> CategoryDef {
        let mut magic = category(
            MAGIC_CATEGORY,
            "Magic",
            "Master the arcane arts and powerful spells",
            "Magic",
            ExpCurveDef::exponential(150.0, 1.25),
        );
        magic.level_bonuses = (1..=100)
            .map(|level| {
                let bonus = LevelBonusDef::new(level).with("max_mana", 5.0).with("spell_power", 1.0);
                if level % 5 == 0 { bonus.with("mana_regen", 0.5) } else { bonus }
            })
            .collect();
        magic.skills = vec![
            skill(
                "mana_efficiency",
                1,
                "Mana Efficiency",
                "Reduces mana costs by 5% per point",
                1,
                5,
                ("mana_cost_reduction", 0.05),
            ),
            skill(
                "spell_mastery",
                1,
                "Spell Mastery",
                "Increases spell damage by 8% per point",
                1,
                5,
                ("spell_damage", 0.08),
            ),
            skill(
                "arcane_focus",
                2,
                "Arcane Focus",
                "Reduces spell cooldowns by 10% per point",
                2,
                3,
                ("spell_cooldown_reduction", 0.10),
            ),
            skill(
                "elemental_mastery",
                3,
                "Elemental Mastery",
                "Increases elemental damage by 15% per point",
                3,
                3,
                ("elemental_damage", 0.15),
            ),
        ];
        for level in [10, 25] {
            magic.milestones.insert(
                level,
                MilestoneQuestDef {
                    npc_id: "arcane_master".into(),
                    dialog_key: format!("magic_milestone_{level}"),
                    ..MilestoneQuestDef::default()
                },
            );
        }
        magic
    }
}

impl FeaturePack for MagicPack {
    fn id(&self) -> &'static str {
        "magic"
    }

    fn install(&self, progression: &Progression) {
        if progression.has_category(MAGIC_CATEGORY) {
            info!("'{MAGIC_CATEGORY}' category already defined, leaving it untouched");
        } else {
            progression.register_category(Self::category());
        }
        for (action_id, exp) in Self::CAST_ACTIONS {
            if !progression.has_action(action_id) {
                progression.register_action(action_id, MAGIC_CATEGORY, *exp, None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magic_category_shape() {
        let magic = MagicPack::category();
        assert_eq!(magic.level_bonuses.len(), 100);
        assert!(magic.level_bonus(5).unwrap().modifiers.contains_key("mana_regen"));
        assert!(!magic.level_bonus(4).unwrap().modifiers.contains_key("mana_regen"));
        assert_eq!(magic.skill("arcane_focus").unwrap().cost, 2);
        assert!(magic.has_quest_at(25));
    }

    #[test]
    fn packs_install_once_and_are_found_by_type() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let progression = Progression::open(dir.path());
        let packs = PackRegistry::new();

        assert!(packs.install(MagicPack, &progression));
        assert!(!packs.install(MagicPack, &progression));
        assert!(progression.has_category(MAGIC_CATEGORY));
        assert!(progression.has_action("cast_spell_rare"));
        assert!(packs.get::<MagicPack>().is_some());
        assert_eq!(packs.ids(), vec!["magic"]);
        Ok(())
    }
}
