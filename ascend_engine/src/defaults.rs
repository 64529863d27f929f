//! Built-in default configuration.
//!
//! These are the base layer every file on disk is merged onto. A fresh data
//! directory ends up containing exactly these values after the first load.

use ascend_data::{
    ActionSetDef, CategoryDef, ExpCurveDef, HarvestOverrides, LevelBonusDef, MainConfig, MilestoneQuestDef,
    QuestItemDef, QuestKind, SkillDef,
};

/// Highest level the default bonus ladders cover.
const LADDER_TOP: u32 = 100;

pub fn main_config() -> MainConfig {
    MainConfig::default()
}

pub fn categories() -> Vec<CategoryDef> {
    vec![
        mining(),
        woodcutting(),
        combat_melee(),
        combat_ranged(),
        exploration(),
        farming(),
        crafting(),
    ]
}

pub fn action_sets() -> Vec<ActionSetDef> {
    vec![
        mining_actions(),
        woodcutting_actions(),
        combat_melee_actions(),
        combat_ranged_actions(),
        exploration_actions(),
        farming_actions(),
        crafting_actions(),
    ]
}

pub fn harvest_overrides() -> HarvestOverrides {
    HarvestOverrides::default()
}

pub(crate) fn category(id: &str, display_name: &str, description: &str, icon: &str, curve: ExpCurveDef) -> CategoryDef {
    CategoryDef {
        id: id.to_string(),
        display_name: display_name.to_string(),
        description: description.to_string(),
        icon: format!("Server/Item/Icons/{icon}.png"),
        notification_icon: None,
        exp_curve: curve,
        ..CategoryDef::default()
    }
}

/// One bonus entry per level: `per_level` at every level plus `periodic` every `every` levels.
fn bonus_ladder(per_level: (&str, f64), every: u32, periodic: (&str, f64)) -> Vec<LevelBonusDef> {
    (1..=LADDER_TOP)
        .map(|level| {
            let bonus = LevelBonusDef::new(level).with(per_level.0, per_level.1);
            if level % every == 0 {
                bonus.with(periodic.0, periodic.1)
            } else {
                bonus
            }
        })
        .collect()
}

pub(crate) fn skill(id: &str, tier: u32, name: &str, description: &str, cost: u32, max_ranks: u32, effect: (&str, f64)) -> SkillDef {
    let mut skill = SkillDef::new(id);
    skill.tier = tier;
    skill.name = name.to_string();
    skill.description = description.to_string();
    skill.cost = cost;
    skill.max_ranks = max_ranks;
    skill.effects.insert(effect.0.to_string(), effect.1);
    skill
}

fn mining() -> CategoryDef {
    let mut cat = category(
        "mining",
        "Miner",
        "Mine ores and gather resources from the depths",
        "Mining",
        ExpCurveDef::exponential(100.0, 1.15),
    );
    cat.level_bonuses = bonus_ladder(("mining_speed", 0.01), 5, ("max_health", 2.0));
    cat.skills = vec![
        skill(
            "efficient_mining",
            1,
            "Efficient Mining",
            "Increases ore mining speed by 2% per point",
            1,
            5,
            ("mining_speed_ores", 0.02),
        ),
        skill(
            "fortune_miner",
            2,
            "Fortunate Miner",
            "5% chance for double ores",
            2,
            3,
            ("mining_fortune", 0.05),
        ),
    ];
    cat.milestones.insert(
        10,
        MilestoneQuestDef {
            kind: QuestKind::SimpleTalk,
            npc_id: "mining_master".to_string(),
            dialog_key: "mining_milestone_10".to_string(),
            required_items: Vec::new(),
        },
    );
    cat.milestones.insert(
        20,
        MilestoneQuestDef {
            kind: QuestKind::ItemCollection,
            npc_id: "mining_master".to_string(),
            dialog_key: "mining_milestone_20".to_string(),
            required_items: vec![QuestItemDef {
                item_id: "iron_ore".to_string(),
                amount: 50,
            }],
        },
    );
    cat
}

/// (ore family, exp, difficulty, rock variants)
const ORE_FAMILIES: &[(&str, f64, f64, &[&str])] = &[
    ("Ore_Iron", 2.0, 1.0, &["Basalt", "Sandstone", "Shale", "Slate", "Stone", "Volcanic"]),
    ("Ore_Copper", 2.0, 1.0, &["Basalt", "Sandstone", "Shale", "Stone", "Volcanic"]),
    ("Ore_Gold", 6.0, 1.2, &["Basalt", "Sandstone", "Shale", "Stone", "Volcanic"]),
    ("Ore_Silver", 8.0, 1.3, &["Basalt", "Sandstone", "Shale", "Slate", "Stone", "Volcanic"]),
    ("Ore_Thorium", 8.0, 1.3, &["Basalt", "Sandstone", "Shale", "Stone", "Volcanic"]),
    ("Ore_Cobalt", 18.0, 1.7, &["Basalt", "Sandstone", "Shale", "Slate", "Stone", "Volcanic"]),
    ("Ore_Adamantite", 40.0, 2.2, &["Basalt", "Shale", "Slate", "Stone", "Volcanic"]),
    ("Ore_Prisma", 25.0, 1.8, &[]),
    ("Rock_Gem_Emerald", 30.0, 2.0, &[]),
    ("Ore_Mithril", 50.0, 2.5, &["Stone"]),
    ("Ore_Onyxium", 50.0, 2.5, &["Basalt", "Sandstone", "Shale", "Stone", "Volcanic"]),
];

fn mining_actions() -> ActionSetDef {
    let mut set = ActionSetDef::new("mining").with("break_Stone", 1.0, Some(1.0));
    for (family, exp, difficulty, variants) in ORE_FAMILIES {
        set = set.with(&format!("break_{family}"), *exp, Some(*difficulty));
        for variant in *variants {
            set = set.with(&format!("break_{family}_{variant}"), *exp, Some(*difficulty));
        }
    }
    set
}

fn woodcutting() -> CategoryDef {
    let mut cat = category(
        "woodcutting",
        "Woodcutter",
        "Chop trees and gather wood resources",
        "Woodcutting",
        ExpCurveDef::exponential(80.0, 1.12),
    );
    cat.level_bonuses = bonus_ladder(("woodcutting_speed", 0.01), 10, ("max_stamina", 5.0));
    cat.skills = vec![skill(
        "tree_feller",
        1,
        "Tree Feller",
        "Increases wood cutting speed by 3% per point",
        1,
        5,
        ("woodcutting_speed", 0.03),
    )];
    cat
}

const WOOD_BLOCKS: &[(&str, f64)] = &[
    ("Wood_Amber_Trunk", 1.0),
    ("Wood_Ash_Trunk", 1.0),
    ("Wood_Aspen_Trunk", 1.0),
    ("Wood_Azure_Trunk", 1.0),
    ("Wood_Bamboo_Trunk", 1.0),
    ("Wood_Bamboo_Trunk_Deco", 1.0),
    ("Wood_Banyan_Trunk", 1.0),
    ("Wood_Beech_Trunk", 1.0),
    ("Wood_Birch_Trunk", 1.0),
    ("Wood_Bottletree_Trunk", 1.0),
    ("Wood_Burnt_Trunk", 1.0),
    ("Wood_Camphor_Trunk", 1.0),
    ("Wood_Cedar_Trunk", 1.0),
    ("Wood_Crystal_Trunk", 2.0),
    ("Wood_Dry_Trunk", 1.0),
    ("Wood_Fig_Blue_Trunk", 1.0),
    ("Wood_Fire_Trunk", 1.5),
    ("Wood_Fir_Trunk", 1.0),
    ("Wood_Gumboab_Trunk", 1.0),
    ("Wood_Ice_Trunk", 1.5),
    ("Wood_Jungle_Trunk", 1.0),
    ("Wood_Maple_Trunk", 1.0),
    ("Wood_Oak_Trunk", 1.0),
    ("Wood_Palm_Trunk", 1.0),
    ("Wood_Palo_Trunk", 1.0),
    ("Wood_Petrified_Trunk", 1.5),
    ("Wood_Poisoned_Trunk", 1.0),
    ("Wood_Redwood_Trunk", 1.0),
    ("Wood_Sallow_Trunk", 1.0),
    ("Wood_Spiral_Trunk", 1.0),
    ("Wood_Stormbark_Trunk", 1.0),
    ("Wood_Stripped_Deco", 1.0),
    ("Wood_Windwillow_Trunk", 1.0),
    ("Wood_Wisteria_Wild_Trunk", 1.0),
];

fn woodcutting_actions() -> ActionSetDef {
    WOOD_BLOCKS
        .iter()
        .fold(ActionSetDef::new("woodcutting"), |set, (block, difficulty)| {
            set.with(&format!("break_{block}"), 5.0, Some(*difficulty))
        })
}

fn combat_melee() -> CategoryDef {
    let mut cat = category(
        "combat_melee",
        "Melee Fighter",
        "Master close combat with sword and axe",
        "CombatMelee",
        ExpCurveDef::exponential(120.0, 1.18),
    );
    cat.level_bonuses = bonus_ladder(("melee_damage", 0.5), 5, ("max_health", 5.0));
    cat.skills = vec![
        skill(
            "sword_mastery",
            1,
            "Sword Master",
            "Increases sword damage by 5% per point",
            1,
            5,
            ("sword_damage", 0.05),
        ),
        skill(
            "critical_strike",
            2,
            "Critical Strike",
            "10% chance for critical damage",
            2,
            3,
            ("crit_chance", 0.10),
        ),
    ];
    cat
}

fn combat_melee_actions() -> ActionSetDef {
    ActionSetDef::new("combat_melee").with("kill_enemy_melee", 20.0, None)
}

fn combat_ranged() -> CategoryDef {
    let mut cat = category(
        "combat_ranged",
        "Ranged Fighter",
        "Master ranged combat with bow and crossbow",
        "CombatRanged",
        ExpCurveDef::exponential(120.0, 1.18),
    );
    cat.level_bonuses = bonus_ladder(("ranged_damage", 0.5), 10, ("accuracy", 0.02));
    cat.skills = vec![skill(
        "bow_mastery",
        1,
        "Bow Master",
        "Increases bow damage by 5% per point",
        1,
        5,
        ("bow_damage", 0.05),
    )];
    cat
}

fn combat_ranged_actions() -> ActionSetDef {
    ActionSetDef::new("combat_ranged").with("kill_enemy_ranged", 25.0, None)
}

fn exploration() -> CategoryDef {
    let mut cat = category(
        "exploration",
        "Explorer",
        "Explore the world and discover new places",
        "Exploration",
        ExpCurveDef::linear(150.0),
    );
    cat.level_bonuses = bonus_ladder(("movement_speed", 0.01), 5, ("max_stamina", 3.0));
    cat.skills = vec![skill(
        "pathfinder",
        1,
        "Pathfinder",
        "Increases movement speed by 1% per point",
        1,
        5,
        ("movement_speed", 0.01),
    )];
    cat
}

fn exploration_actions() -> ActionSetDef {
    ActionSetDef::new("exploration")
        .with("explore_steps", 2.0, None)
        .with("discover_zone", 15.0, None)
        .with("discover_new_chunk", 10.0, None)
        .with("discover_new_biome", 100.0, None)
        .with("discover_instance", 50.0, None)
}

fn farming() -> CategoryDef {
    let mut cat = category(
        "farming",
        "Farmer",
        "Grow crops and raise animals",
        "Farming",
        ExpCurveDef::exponential(90.0, 1.14),
    );
    cat.level_bonuses = bonus_ladder(("farming_speed", 0.01), 5, ("max_stamina", 4.0));
    cat.skills = vec![
        skill(
            "green_thumb",
            1,
            "Green Thumb",
            "Increases crop growth speed by 2% per point",
            1,
            5,
            ("farming_speed", 0.02),
        ),
        skill(
            "fast_harvest",
            2,
            "Fast Harvest",
            "5% chance for double harvest yield",
            2,
            3,
            ("harvest_bonus", 0.05),
        ),
    ];
    cat
}

/// Common crops with a rising exp ladder, easiest first.
const LADDER_CROPS: &[&str] = &[
    "Wheat",
    "Lettuce",
    "Carrot",
    "Corn",
    "Cauliflower",
    "Turnip",
    "Aubergine",
    "Pumpkin",
    "Tomato",
    "Chilli",
    "Cotton",
    "Rice",
    "Onion",
    "Potato",
];

/// Other harvestable crop blocks, granted the flat default.
const OTHER_CROP_BLOCKS: &[&str] = &[
    "Plant_Crop_Apple_Block",
    "Plant_Crop_Berry_Block",
    "Plant_Crop_Berry_Wet_Block",
    "Plant_Crop_Berry_Winter_Block",
    "Plant_Crop_Health1_Block",
    "Plant_Crop_Health2_Block",
    "Plant_Crop_Health3_Block",
    "Plant_Crop_Mana1_Block",
    "Plant_Crop_Mana2_Block",
    "Plant_Crop_Mana3_Block",
    "Plant_Crop_Mushroom_Block",
    "Plant_Crop_Mushroom_Block_Blue",
    "Plant_Crop_Mushroom_Block_Brown",
    "Plant_Crop_Mushroom_Block_Green",
    "Plant_Crop_Mushroom_Block_Purple",
    "Plant_Crop_Mushroom_Block_Red",
    "Plant_Crop_Mushroom_Block_White",
    "Plant_Crop_Mushroom_Block_Yellow",
    "Plant_Crop_Mushroom_Boomshroom_Large",
    "Plant_Crop_Mushroom_Boomshroom_Small",
    "Plant_Crop_Mushroom_Cap_Brown",
    "Plant_Crop_Mushroom_Cap_Green",
    "Plant_Crop_Mushroom_Cap_Poison",
    "Plant_Crop_Mushroom_Cap_Red",
    "Plant_Crop_Mushroom_Cap_White",
    "Plant_Crop_Mushroom_Common_Blue",
    "Plant_Crop_Mushroom_Common_Brown",
    "Plant_Crop_Mushroom_Common_Lime",
    "Plant_Crop_Mushroom_Flatcap_Blue",
    "Plant_Crop_Mushroom_Flatcap_Green",
    "Plant_Crop_Mushroom_Glowing_Blue",
    "Plant_Crop_Mushroom_Glowing_Green",
    "Plant_Crop_Mushroom_Glowing_Orange",
    "Plant_Crop_Mushroom_Glowing_Purple",
    "Plant_Crop_Mushroom_Glowing_Red",
    "Plant_Crop_Mushroom_Glowing_Violet",
    "Plant_Crop_Mushroom_Shelve_Brown",
    "Plant_Crop_Mushroom_Shelve_Green",
    "Plant_Crop_Mushroom_Shelve_Yellow",
    "Plant_Crop_Stamina1_Block",
    "Plant_Crop_Stamina2_Block",
    "Plant_Crop_Stamina3_Block",
    "Plant_Crop_Wheat_Stage_4_Burnt",
];

fn farming_actions() -> ActionSetDef {
    let mut set = ActionSetDef::new("farming")
        .with("harvest_crop", 5.0, None)
        .with("harvest_animal", 15.0, None);
    let mut exp = 3.0;
    for crop in LADDER_CROPS {
        set = set.with(&format!("harvest_Plant_Crop_{crop}_Block"), exp, None);
        exp += 0.2;
    }
    for block in OTHER_CROP_BLOCKS {
        set = set.with(&format!("harvest_{block}"), 4.0, None);
    }
    set
}

fn crafting() -> CategoryDef {
    let mut cat = category(
        "crafting",
        "Crafter",
        "Craft items and refine materials",
        "Crafting",
        ExpCurveDef::exponential(80.0, 1.12),
    );
    cat.level_bonuses = bonus_ladder(("crafting_speed", 0.01), 10, ("craft_bonus_output", 0.01));
    cat.skills = vec![
        skill(
            "efficient_craft",
            1,
            "Efficient Craft",
            "Increases crafting speed by 2% per point",
            1,
            5,
            ("crafting_speed", 0.02),
        ),
        skill(
            "master_crafter",
            2,
            "Master Crafter",
            "3% chance for bonus craft output",
            2,
            3,
            ("craft_bonus_output", 0.03),
        ),
    ];
    cat
}

fn crafting_actions() -> ActionSetDef {
    ActionSetDef::new("crafting").with("craft_item", 3.0, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ascend_data::{validate_action_set, validate_category};

    #[test]
    fn defaults_are_internally_valid() {
        let cats = categories();
        let ids: Vec<&str> = cats.iter().map(|c| c.id.as_str()).collect();
        for cat in &cats {
            assert!(validate_category(cat).is_empty(), "{}: {:?}", cat.id, validate_category(cat));
        }
        for set in action_sets() {
            let errors = validate_action_set(&set, ids.iter().copied());
            assert!(errors.is_empty(), "{}: {errors:?}", set.category);
        }
    }

    #[test]
    fn every_category_has_an_action_set() {
        let sets = action_sets();
        for cat in categories() {
            assert!(sets.iter().any(|s| s.category == cat.id), "no actions for {}", cat.id);
        }
    }

    #[test]
    fn mining_ladder_has_periodic_health() {
        let mining = mining();
        assert_eq!(mining.level_bonuses.len(), 100);
        assert_eq!(mining.level_bonus(5).unwrap().modifiers.get("max_health"), Some(&2.0));
        assert!(mining.level_bonus(4).unwrap().modifiers.get("max_health").is_none());
    }

    #[test]
    fn ore_actions_carry_difficulty() {
        let set = mining_actions();
        let gold = set.action("break_Ore_Gold_Shale").unwrap();
        assert!((gold.exp - 6.0).abs() < f64::EPSILON);
        assert_eq!(gold.difficulty_factor, Some(1.2));
        assert!(set.action("break_Ore_Mithril_Stone").is_some());
    }

    #[test]
    fn crop_ladder_rises() {
        let set = farming_actions();
        let wheat = set.action("harvest_Plant_Crop_Wheat_Block").unwrap().exp;
        let potato = set.action("harvest_Plant_Crop_Potato_Block").unwrap().exp;
        assert!((wheat - 3.0).abs() < 1e-9);
        assert!((potato - 5.6).abs() < 1e-9);
    }
}
