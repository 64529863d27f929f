use std::fs;

use ascend_data::CurveKind;
use ascend_engine as ae;
use ae::Progression;
use ae::data_paths::{config_dir, player_data_dir};
use uuid::Uuid;

#[test]
fn disconnect_flushes_and_reopen_restores() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let player = Uuid::new_v4();
    {
        let progression = Progression::open(dir.path());
        progression.on_player_ready(player);
        progression.experience().set_level(player, "crafting", 7)?;
        progression.skills().grant_points(player, "crafting", 4);
        assert!(progression.on_player_disconnect(player));
        assert!(!progression.store().is_cached(player));
    }
    assert!(player_data_dir(dir.path()).join(format!("{player}.ron")).exists());

    let reopened = Progression::open(dir.path());
    assert_eq!(reopened.get_player_level(player, "crafting"), 7);
    assert_eq!(reopened.skills().available_points(player, "crafting"), 4);
    Ok(())
}

#[test]
fn shutdown_saves_every_cached_player() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let progression = Progression::open(dir.path());
    let players: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
    for player in &players {
        progression.grant_experience(*player, "farming", 12.0);
    }
    assert_eq!(progression.shutdown(), 0);
    for player in &players {
        assert!(progression.store().record_path(*player).exists());
    }
    Ok(())
}

#[test]
fn queries_do_not_load_or_save_unseen_players() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let progression = Progression::open(dir.path());
    let stranger = Uuid::new_v4();

    assert!(progression.get_modifier_value(stranger, "max_health").abs() < f64::EPSILON);
    assert_eq!(progression.get_player_level(stranger, "mining"), 1);
    assert!(progression.experience().can_gain_exp(stranger, "mining"));
    assert!(!progression.has_skill(stranger, "mining", "efficient_mining"));
    assert_eq!(progression.skills().available_points(stranger, "mining"), 0);
    assert!(!progression.quests().is_completed(stranger, "mining", 10));

    assert!(!progression.store().is_cached(stranger));
    assert_eq!(progression.shutdown(), 0);
    assert!(!progression.store().record_path(stranger).exists());
    Ok(())
}

#[test]
fn user_overrides_survive_and_reload_picks_up_edits() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let categories = config_dir(dir.path()).join("categories");
    fs::create_dir_all(&categories)?;
    fs::write(
        categories.join("mining.json"),
        r#"{ "exp_curve": { "type": "linear", "base": 40.0 } }"#,
    )?;

    let progression = Progression::open(dir.path());
    let mining = progression.categories().get("mining").unwrap();
    assert_eq!(mining.exp_curve.kind, CurveKind::Linear);
    assert!((progression.experience().exp_for_level("mining", 3) - 120.0).abs() < 1e-9);
    // defaults filled in around the override
    assert!(!mining.skills.is_empty());

    let written = fs::read_to_string(categories.join("mining.json"))?;
    assert!(written.contains("\"skills\""));

    fs::write(
        config_dir(dir.path()).join("main.json"),
        r#"{ "global_settings": { "max_level": 3 } }"#,
    )?;
    progression.reload_config();
    assert_eq!(progression.settings().get().max_level, 3);
    assert_eq!(progression.main_config().global_settings.skill_points_per_level, 1);
    Ok(())
}
