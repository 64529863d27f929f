//! Layered configuration merging.
//!
//! Built-in defaults are full entities. Files on disk are read as partial
//! `*Patch` documents where every field is optional, then merged onto the
//! default: scalars take the patch value when present, keyed lists are merged
//! entry by entry and maps key by key. Base-only entries always survive and
//! keep their position; patch-only entries are appended in patch order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::defs::*;

/// Apply a partial override onto a complete value.
///
/// Implementations must be idempotent: merging the same patch twice leaves
/// the value unchanged after the first merge.
pub trait Merge {
    type Patch;

    fn merge(&mut self, patch: &Self::Patch);

    /// Consume `self`, merge, and return the result.
    fn merged(mut self, patch: &Self::Patch) -> Self
    where
        Self: Sized,
    {
        self.merge(patch);
        self
    }
}

fn apply<T: Clone>(slot: &mut T, value: Option<&T>) {
    if let Some(value) = value {
        slot.clone_from(value);
    }
}

fn merge_map<V: Clone>(base: &mut BTreeMap<Id, V>, patch: &BTreeMap<Id, V>) {
    for (key, value) in patch {
        base.insert(key.clone(), value.clone());
    }
}

/// Merge a keyed list in place. Matching entries are merged, unknown keys are
/// created with `make` and appended.
fn merge_keyed<T, P, K>(
    base: &mut Vec<T>,
    patches: &[P],
    base_key: impl Fn(&T) -> K,
    patch_key: impl Fn(&P) -> K,
    make: impl Fn(&P) -> T,
) where
    T: Merge<Patch = P>,
    K: PartialEq,
{
    for patch in patches {
        let key = patch_key(patch);
        match base.iter_mut().find(|entry| base_key(entry) == key) {
            Some(existing) => existing.merge(patch),
            None => {
                let mut fresh = make(patch);
                fresh.merge(patch);
                base.push(fresh);
            },
        }
    }
}

// ----- main.json -----

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MainConfigPatch {
    #[serde(default)]
    pub mod_info: Option<ModInfoPatch>,
    #[serde(default)]
    pub global_settings: Option<GlobalSettingsPatch>,
    #[serde(default)]
    pub milestone_intervals: Option<MilestoneIntervalsPatch>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ModInfoPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GlobalSettingsPatch {
    #[serde(default)]
    pub max_level: Option<u32>,
    #[serde(default)]
    pub exp_overflow_enabled: Option<bool>,
    #[serde(default)]
    pub skill_points_per_level: Option<u32>,
    #[serde(default)]
    pub allow_skill_respec: Option<bool>,
    #[serde(default)]
    pub respec_cost_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MilestoneIntervalsPatch {
    #[serde(default)]
    pub quest_every_n_levels: Option<u32>,
    #[serde(default)]
    pub levels_requiring_quest: Option<Vec<u32>>,
}

impl Merge for MainConfig {
    type Patch = MainConfigPatch;

    fn merge(&mut self, patch: &MainConfigPatch) {
        if let Some(info) = &patch.mod_info {
            self.mod_info.merge(info);
        }
        if let Some(settings) = &patch.global_settings {
            self.global_settings.merge(settings);
        }
        if let Some(intervals) = &patch.milestone_intervals {
            self.milestone_intervals.merge(intervals);
        }
    }
}

impl Merge for ModInfo {
    type Patch = ModInfoPatch;

    fn merge(&mut self, patch: &ModInfoPatch) {
        apply(&mut self.name, patch.name.as_ref());
        apply(&mut self.version, patch.version.as_ref());
        apply(&mut self.author, patch.author.as_ref());
    }
}

impl Merge for GlobalSettings {
    type Patch = GlobalSettingsPatch;

    fn merge(&mut self, patch: &GlobalSettingsPatch) {
        apply(&mut self.max_level, patch.max_level.as_ref());
        apply(&mut self.exp_overflow_enabled, patch.exp_overflow_enabled.as_ref());
        apply(&mut self.skill_points_per_level, patch.skill_points_per_level.as_ref());
        apply(&mut self.allow_skill_respec, patch.allow_skill_respec.as_ref());
        apply(&mut self.respec_cost_type, patch.respec_cost_type.as_ref());
    }
}

impl Merge for MilestoneIntervals {
    type Patch = MilestoneIntervalsPatch;

    fn merge(&mut self, patch: &MilestoneIntervalsPatch) {
        apply(&mut self.quest_every_n_levels, patch.quest_every_n_levels.as_ref());
        apply(&mut self.levels_requiring_quest, patch.levels_requiring_quest.as_ref());
    }
}

// ----- categories/<id>.json -----

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CategoryPatch {
    #[serde(default)]
    pub id: Option<Id>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub notification_icon: Option<String>,
    #[serde(default)]
    pub exp_curve: Option<ExpCurvePatch>,
    #[serde(default)]
    pub level_bonuses: Vec<LevelBonusPatch>,
    #[serde(default)]
    pub skills: Vec<SkillPatch>,
    #[serde(default)]
    pub milestones: BTreeMap<u32, MilestoneQuestPatch>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ExpCurvePatch {
    #[serde(rename = "type", default)]
    pub kind: Option<CurveKind>,
    #[serde(default)]
    pub base: Option<f64>,
    #[serde(default)]
    pub multiplier: Option<f64>,
    #[serde(default)]
    pub custom_formula: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelBonusPatch {
    pub level: u32,
    #[serde(default)]
    pub modifiers: BTreeMap<Id, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillPatch {
    pub id: Id,
    #[serde(default)]
    pub tier: Option<u32>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cost: Option<u32>,
    #[serde(default, alias = "max_points")]
    pub max_ranks: Option<u32>,
    #[serde(default)]
    pub effects: BTreeMap<Id, f64>,
}

impl SkillPatch {
    pub fn new(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            tier: None,
            name: None,
            description: None,
            cost: None,
            max_ranks: None,
            effects: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MilestoneQuestPatch {
    #[serde(rename = "type", default)]
    pub kind: Option<QuestKind>,
    #[serde(default)]
    pub npc_id: Option<String>,
    #[serde(default)]
    pub dialog_key: Option<String>,
    #[serde(default)]
    pub required_items: Option<Vec<QuestItemDef>>,
}

impl Merge for CategoryDef {
    type Patch = CategoryPatch;

    /// Merge a category override.
    ///
    /// ```
    /// use ascend_data::{CategoryDef, CategoryPatch, Merge, SkillDef, SkillPatch};
    ///
    /// let mut mining = CategoryDef::new("mining");
    /// mining.skills.push(SkillDef::new("efficient_mining"));
    /// mining.skills.push(SkillDef::new("fortune_miner"));
    ///
    /// let mut cheaper = SkillPatch::new("fortune_miner");
    /// cheaper.cost = Some(1);
    /// let patch = CategoryPatch {
    ///     skills: vec![cheaper, SkillPatch::new("deep_delver")],
    ///     ..CategoryPatch::default()
    /// };
    /// mining.merge(&patch);
    ///
    /// let ids: Vec<_> = mining.skills.iter().map(|s| s.id.as_str()).collect();
    /// assert_eq!(ids, ["efficient_mining", "fortune_miner", "deep_delver"]);
    /// assert_eq!(mining.skill("fortune_miner").unwrap().cost, 1);
    /// ```
    fn merge(&mut self, patch: &CategoryPatch) {
        apply(&mut self.id, patch.id.as_ref());
        apply(&mut self.display_name, patch.display_name.as_ref());
        apply(&mut self.description, patch.description.as_ref());
        apply(&mut self.icon, patch.icon.as_ref());
        if let Some(icon) = &patch.notification_icon {
            self.notification_icon = Some(icon.clone());
        }
        if let Some(curve) = &patch.exp_curve {
            self.exp_curve.merge(curve);
        }
        merge_keyed(
            &mut self.level_bonuses,
            &patch.level_bonuses,
            |bonus| bonus.level,
            |bonus| bonus.level,
            |bonus| LevelBonusDef::new(bonus.level),
        );
        self.level_bonuses.sort_by_key(|bonus| bonus.level);
        merge_keyed(
            &mut self.skills,
            &patch.skills,
            |skill| skill.id.clone(),
            |skill| skill.id.clone(),
            |skill| SkillDef::new(skill.id.clone()),
        );
        for (level, quest) in &patch.milestones {
            self.milestones.entry(*level).or_default().merge(quest);
        }
    }
}

impl Merge for ExpCurveDef {
    type Patch = ExpCurvePatch;

    fn merge(&mut self, patch: &ExpCurvePatch) {
        apply(&mut self.kind, patch.kind.as_ref());
        apply(&mut self.base, patch.base.as_ref());
        apply(&mut self.multiplier, patch.multiplier.as_ref());
        apply(&mut self.custom_formula, patch.custom_formula.as_ref());
    }
}

impl Merge for LevelBonusDef {
    type Patch = LevelBonusPatch;

    fn merge(&mut self, patch: &LevelBonusPatch) {
        merge_map(&mut self.modifiers, &patch.modifiers);
    }
}

impl Merge for SkillDef {
    type Patch = SkillPatch;

    fn merge(&mut self, patch: &SkillPatch) {
        apply(&mut self.tier, patch.tier.as_ref());
        apply(&mut self.name, patch.name.as_ref());
        apply(&mut self.description, patch.description.as_ref());
        apply(&mut self.cost, patch.cost.as_ref());
        apply(&mut self.max_ranks, patch.max_ranks.as_ref());
        merge_map(&mut self.effects, &patch.effects);
    }
}

impl Merge for MilestoneQuestDef {
    type Patch = MilestoneQuestPatch;

    fn merge(&mut self, patch: &MilestoneQuestPatch) {
        apply(&mut self.kind, patch.kind.as_ref());
        apply(&mut self.npc_id, patch.npc_id.as_ref());
        apply(&mut self.dialog_key, patch.dialog_key.as_ref());
        apply(&mut self.required_items, patch.required_items.as_ref());
    }
}

// ----- actions/<category>.json -----

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ActionSetPatch {
    #[serde(default)]
    pub category: Option<Id>,
    #[serde(default)]
    pub actions: Vec<ActionPatch>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionPatch {
    pub action_id: Id,
    #[serde(default)]
    pub exp: Option<f64>,
    #[serde(default)]
    pub difficulty_factor: Option<f64>,
}

impl ActionPatch {
    pub fn new(action_id: impl Into<Id>, exp: f64) -> Self {
        Self {
            action_id: action_id.into(),
            exp: Some(exp),
            difficulty_factor: None,
        }
    }
}

impl Merge for ActionSetDef {
    type Patch = ActionSetPatch;

    fn merge(&mut self, patch: &ActionSetPatch) {
        apply(&mut self.category, patch.category.as_ref());
        merge_keyed(
            &mut self.actions,
            &patch.actions,
            |action| action.action_id.clone(),
            |action| action.action_id.clone(),
            |action| ActionDef {
                action_id: action.action_id.clone(),
                exp: 0.0,
                difficulty_factor: None,
            },
        );
    }
}

impl Merge for ActionDef {
    type Patch = ActionPatch;

    fn merge(&mut self, patch: &ActionPatch) {
        apply(&mut self.exp, patch.exp.as_ref());
        if let Some(factor) = patch.difficulty_factor {
            self.difficulty_factor = Some(factor);
        }
    }
}

// ----- farming_harvest.json -----

impl Merge for HarvestOverrides {
    type Patch = HarvestOverrides;

    fn merge(&mut self, patch: &HarvestOverrides) {
        merge_map(&mut self.overrides, &patch.overrides);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mining() -> CategoryDef {
        let mut cat = CategoryDef::new("mining");
        cat.display_name = "Mining".into();
        cat.exp_curve = ExpCurveDef::exponential(100.0, 1.15);
        cat.level_bonuses = vec![
            LevelBonusDef::new(1).with("mining_speed", 0.01),
            LevelBonusDef::new(5).with("max_health", 2.0),
        ];
        let mut efficient = SkillDef::new("efficient_mining");
        efficient.max_ranks = 5;
        efficient.effects.insert("mining_speed_ores".into(), 0.02);
        let mut fortune = SkillDef::new("fortune_miner");
        fortune.tier = 2;
        fortune.cost = 2;
        fortune.max_ranks = 3;
        cat.skills = vec![efficient, fortune];
        cat.milestones.insert(
            10,
            MilestoneQuestDef {
                kind: QuestKind::SimpleTalk,
                npc_id: "mining_master".into(),
                dialog_key: "mining_milestone_10".into(),
                required_items: Vec::new(),
            },
        );
        cat
    }

    #[test]
    fn skill_subset_override_preserves_default_skills() {
        let mut fortune = SkillPatch::new("fortune_miner");
        fortune.max_ranks = Some(4);
        let mut extra = SkillPatch::new("gem_finder");
        extra.cost = Some(3);
        let patch = CategoryPatch {
            skills: vec![fortune, extra],
            ..CategoryPatch::default()
        };

        let merged = mining().merged(&patch);
        let ids: Vec<_> = merged.skills.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["efficient_mining", "fortune_miner", "gem_finder"]);

        let fortune = merged.skill("fortune_miner").unwrap();
        assert_eq!(fortune.max_ranks, 4);
        assert_eq!(fortune.cost, 2, "unspecified fields keep the default");
        assert_eq!(merged.skill("gem_finder").unwrap().cost, 3);
        assert_eq!(merged.skill("efficient_mining"), mining().skill("efficient_mining"));
    }

    #[test]
    fn merging_twice_is_idempotent() {
        let json = r#"{
            "display_name": "Deep Mining",
            "exp_curve": { "multiplier": 1.2 },
            "level_bonuses": [ { "level": 3, "modifiers": { "mining_speed": 0.5 } } ],
            "skills": [ { "id": "fortune_miner", "cost": 1 }, { "id": "new_skill" } ],
            "milestones": { "20": { "type": "item_collection",
                "required_items": [ { "item_id": "iron_ore", "amount": 50 } ] } }
        }"#;
        let patch: CategoryPatch = serde_json::from_str(json).unwrap();

        let once = mining().merged(&patch);
        let twice = once.clone().merged(&patch);
        assert_eq!(once, twice);
        assert_eq!(once.display_name, "Deep Mining");
        assert!((once.exp_curve.base - 100.0).abs() < f64::EPSILON);
        assert!((once.exp_curve.multiplier - 1.2).abs() < f64::EPSILON);
    }

    #[test]
    fn level_bonuses_merge_by_level_and_stay_sorted() {
        let patch = CategoryPatch {
            level_bonuses: vec![
                LevelBonusPatch {
                    level: 5,
                    modifiers: BTreeMap::from([("armor".to_string(), 1.0)]),
                },
                LevelBonusPatch {
                    level: 3,
                    modifiers: BTreeMap::from([("mining_speed".to_string(), 0.5)]),
                },
            ],
            ..CategoryPatch::default()
        };
        let merged = mining().merged(&patch);
        let levels: Vec<_> = merged.level_bonuses.iter().map(|b| b.level).collect();
        assert_eq!(levels, [1, 3, 5]);

        let five = merged.level_bonus(5).unwrap();
        assert_eq!(five.modifiers.get("max_health"), Some(&2.0));
        assert_eq!(five.modifiers.get("armor"), Some(&1.0));
    }

    #[test]
    fn milestone_patch_merges_by_level() {
        let json = r#"{ "milestones": {
            "10": { "npc_id": "old_miner" },
            "20": { "type": "item_collection",
                    "required_items": [ { "item_id": "iron_ore", "amount": 50 } ] }
        } }"#;
        let patch: CategoryPatch = serde_json::from_str(json).unwrap();
        let merged = mining().merged(&patch);

        let ten = merged.milestone(10).unwrap();
        assert_eq!(ten.npc_id, "old_miner");
        assert_eq!(ten.dialog_key, "mining_milestone_10");
        let twenty = merged.milestone(20).unwrap();
        assert_eq!(twenty.kind, QuestKind::ItemCollection);
        assert_eq!(twenty.required_items.len(), 1);
    }

    #[test]
    fn action_set_merge_appends_new_actions() {
        let base = ActionSetDef::new("mining")
            .with("break_Ore_Iron", 2.0, Some(1.0))
            .with("break_Ore_Gold", 6.0, Some(1.2));
        let patch = ActionSetPatch {
            category: None,
            actions: vec![
                ActionPatch::new("break_Ore_Gold", 7.5),
                ActionPatch::new("break_Ore_Mithril", 50.0),
            ],
        };
        let merged = base.merged(&patch);
        assert_eq!(merged.category, "mining");
        assert_eq!(merged.actions.len(), 3);
        let gold = merged.action("break_Ore_Gold").unwrap();
        assert!((gold.exp - 7.5).abs() < f64::EPSILON);
        assert_eq!(gold.difficulty_factor, Some(1.2));
        assert_eq!(merged.actions[2].action_id, "break_Ore_Mithril");
    }

    #[test]
    fn main_config_partial_override() {
        let patch: MainConfigPatch =
            serde_json::from_str(r#"{ "global_settings": { "max_level": 50 } }"#).unwrap();
        let merged = MainConfig::default().merged(&patch);
        assert_eq!(merged.global_settings.max_level, 50);
        assert_eq!(merged.global_settings.skill_points_per_level, 1);
        assert!(merged.global_settings.allow_skill_respec);
        assert_eq!(merged.milestone_intervals, MilestoneIntervals::default());
    }
}
