use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Stable identifier used for categories, actions, skills and modifiers.
pub type Id = String;

/// Top-level engine configuration (`main.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MainConfig {
    #[serde(default)]
    pub mod_info: ModInfo,
    #[serde(default)]
    pub global_settings: GlobalSettings,
    #[serde(default)]
    pub milestone_intervals: MilestoneIntervals,
}

/// Descriptive metadata written at the top of `main.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModInfo {
    pub name: String,
    pub version: String,
    pub author: String,
}

impl Default for ModInfo {
    fn default() -> Self {
        Self {
            name: "Ascend Progression".to_string(),
            version: "1.0.0".to_string(),
            author: "Ascend Developers".to_string(),
        }
    }
}

/// Settings shared by every category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalSettings {
    pub max_level: u32,
    pub exp_overflow_enabled: bool,
    pub skill_points_per_level: u32,
    pub allow_skill_respec: bool,
    pub respec_cost_type: String,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            max_level: 100,
            exp_overflow_enabled: false,
            skill_points_per_level: 1,
            allow_skill_respec: true,
            respec_cost_type: "items".to_string(),
        }
    }
}

/// Levels at which default milestone quests are expected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestoneIntervals {
    pub quest_every_n_levels: u32,
    pub levels_requiring_quest: Vec<u32>,
}

impl Default for MilestoneIntervals {
    fn default() -> Self {
        Self {
            quest_every_n_levels: 10,
            levels_requiring_quest: vec![10, 20, 30, 40, 50],
        }
    }
}

/// A progression track such as mining or combat (`categories/<id>.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CategoryDef {
    pub id: Id,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub notification_icon: Option<String>,
    #[serde(default)]
    pub exp_curve: ExpCurveDef,
    #[serde(default)]
    pub level_bonuses: Vec<LevelBonusDef>,
    #[serde(default)]
    pub skills: Vec<SkillDef>,
    #[serde(default)]
    pub milestones: BTreeMap<u32, MilestoneQuestDef>,
}

impl CategoryDef {
    /// Create an empty category with the given id and default curve.
    pub fn new(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Bonus modifiers granted on reaching `level`, if any are configured.
    pub fn level_bonus(&self, level: u32) -> Option<&LevelBonusDef> {
        self.level_bonuses.iter().find(|bonus| bonus.level == level)
    }

    pub fn skill(&self, skill_id: &str) -> Option<&SkillDef> {
        self.skills.iter().find(|skill| skill.id == skill_id)
    }

    pub fn milestone(&self, level: u32) -> Option<&MilestoneQuestDef> {
        self.milestones.get(&level)
    }

    pub fn has_quest_at(&self, level: u32) -> bool {
        self.milestones.contains_key(&level)
    }

    /// Name shown to players, falling back to the id when unset.
    pub fn label(&self) -> &str {
        if self.display_name.trim().is_empty() {
            &self.id
        } else {
            &self.display_name
        }
    }
}

/// Shape of the level -> required experience function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum CurveKind {
    Linear,
    #[default]
    Exponential,
    Custom,
}

impl From<String> for CurveKind {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "linear" => CurveKind::Linear,
            "custom" => CurveKind::Custom,
            // unknown kinds evaluate exponentially
            _ => CurveKind::Exponential,
        }
    }
}

impl From<CurveKind> for String {
    fn from(value: CurveKind) -> Self {
        value.to_string()
    }
}

impl fmt::Display for CurveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CurveKind::Linear => "linear",
            CurveKind::Exponential => "exponential",
            CurveKind::Custom => "custom",
        };
        f.write_str(name)
    }
}

/// Experience curve settings for a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpCurveDef {
    #[serde(rename = "type", default)]
    pub kind: CurveKind,
    #[serde(default = "default_curve_base")]
    pub base: f64,
    #[serde(default = "default_curve_multiplier")]
    pub multiplier: f64,
    #[serde(default = "default_custom_formula")]
    pub custom_formula: String,
}

impl Default for ExpCurveDef {
    fn default() -> Self {
        Self {
            kind: CurveKind::Exponential,
            base: default_curve_base(),
            multiplier: default_curve_multiplier(),
            custom_formula: default_custom_formula(),
        }
    }
}

impl ExpCurveDef {
    pub fn linear(base: f64) -> Self {
        Self {
            kind: CurveKind::Linear,
            base,
            multiplier: 1.0,
            ..Self::default()
        }
    }

    pub fn exponential(base: f64, multiplier: f64) -> Self {
        Self {
            kind: CurveKind::Exponential,
            base,
            multiplier,
            ..Self::default()
        }
    }

    pub fn custom(base: f64, multiplier: f64, formula: impl Into<String>) -> Self {
        Self {
            kind: CurveKind::Custom,
            base,
            multiplier,
            custom_formula: formula.into(),
        }
    }
}

fn default_curve_base() -> f64 {
    100.0
}

fn default_curve_multiplier() -> f64 {
    1.5
}

fn default_custom_formula() -> String {
    "base * pow(multiplier, level - 1)".to_string()
}

/// Modifiers granted once a category reaches `level`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct LevelBonusDef {
    pub level: u32,
    #[serde(default)]
    pub modifiers: BTreeMap<Id, f64>,
}

impl LevelBonusDef {
    pub fn new(level: u32) -> Self {
        Self {
            level,
            modifiers: BTreeMap::new(),
        }
    }

    /// Builder-style helper used by the built-in defaults.
    pub fn with(mut self, modifier: &str, value: f64) -> Self {
        self.modifiers.insert(modifier.to_string(), value);
        self
    }
}

/// A purchasable skill within a category's tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillDef {
    pub id: Id,
    #[serde(default = "default_one")]
    pub tier: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Skill points spent per rank.
    #[serde(default = "default_one")]
    pub cost: u32,
    #[serde(default = "default_one", alias = "max_points")]
    pub max_ranks: u32,
    /// Effect id -> value added per rank.
    #[serde(default)]
    pub effects: BTreeMap<Id, f64>,
}

impl SkillDef {
    pub fn new(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            tier: 1,
            name: String::new(),
            description: String::new(),
            cost: 1,
            max_ranks: 1,
            effects: BTreeMap::new(),
        }
    }
}

fn default_one() -> u32 {
    1
}

/// How a milestone quest is fulfilled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum QuestKind {
    /// Talking to the quest NPC is enough.
    #[default]
    SimpleTalk,
    /// The player must hand over the required items.
    ItemCollection,
    /// Talk to the NPC and hand over items.
    Both,
}

impl QuestKind {
    pub fn requires_items(self) -> bool {
        matches!(self, QuestKind::ItemCollection | QuestKind::Both)
    }
}

impl From<String> for QuestKind {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "item_collection" => QuestKind::ItemCollection,
            "both" => QuestKind::Both,
            _ => QuestKind::SimpleTalk,
        }
    }
}

impl From<QuestKind> for String {
    fn from(value: QuestKind) -> Self {
        value.to_string()
    }
}

impl fmt::Display for QuestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QuestKind::SimpleTalk => "simple_talk",
            QuestKind::ItemCollection => "item_collection",
            QuestKind::Both => "both",
        };
        f.write_str(name)
    }
}

/// Quest that gates further progress once its level is reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MilestoneQuestDef {
    #[serde(rename = "type", default)]
    pub kind: QuestKind,
    #[serde(default)]
    pub npc_id: String,
    #[serde(default)]
    pub dialog_key: String,
    #[serde(default)]
    pub required_items: Vec<QuestItemDef>,
}

/// A single item requirement of a milestone quest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestItemDef {
    pub item_id: Id,
    pub amount: u32,
}

/// Action -> experience mappings for one category (`actions/<category>.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ActionSetDef {
    pub category: Id,
    #[serde(default)]
    pub actions: Vec<ActionDef>,
}

impl ActionSetDef {
    pub fn new(category: impl Into<Id>) -> Self {
        Self {
            category: category.into(),
            actions: Vec::new(),
        }
    }

    pub fn action(&self, action_id: &str) -> Option<&ActionDef> {
        self.actions.iter().find(|action| action.action_id == action_id)
    }

    pub fn action_mut(&mut self, action_id: &str) -> Option<&mut ActionDef> {
        self.actions.iter_mut().find(|action| action.action_id == action_id)
    }

    /// Append a mapping (builder style).
    pub fn with(mut self, action_id: &str, exp: f64, difficulty_factor: Option<f64>) -> Self {
        self.actions.push(ActionDef {
            action_id: action_id.to_string(),
            exp,
            difficulty_factor,
        });
        self
    }
}

/// Experience granted for one occurrence of an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDef {
    pub action_id: Id,
    #[serde(default)]
    pub exp: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty_factor: Option<f64>,
}

impl ActionDef {
    /// Difficulty factor with absent or non-positive values read as 1.0.
    pub fn effective_difficulty(&self) -> f64 {
        normalize_difficulty(self.difficulty_factor)
    }
}

/// Normalize an optional difficulty factor: absent, non-positive or non-finite becomes 1.0.
pub fn normalize_difficulty(factor: Option<f64>) -> f64 {
    match factor {
        Some(value) if value > 0.0 && value.is_finite() => value,
        _ => 1.0,
    }
}

/// Per-block farming harvest experience overrides (`farming_harvest.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct HarvestOverrides {
    #[serde(default)]
    pub overrides: BTreeMap<Id, f64>,
}

/// Applied-migrations sidecar (`migrations.json`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AppliedMigrations {
    #[serde(default)]
    pub applied: Vec<String>,
}

impl AppliedMigrations {
    pub fn contains(&self, id: &str) -> bool {
        self.applied.iter().any(|applied| applied == id)
    }
}
