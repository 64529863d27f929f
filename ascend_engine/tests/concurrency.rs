use std::thread;

use ascend_data::{CategoryDef, ExpCurveDef, SkillDef};
use ascend_engine as ae;
use ae::Progression;
use uuid::Uuid;

const THREADS: usize = 8;

fn progression(dir: &std::path::Path) -> Progression {
    let progression = Progression::open(dir);
    let mut endurance = CategoryDef::new("endurance");
    endurance.exp_curve = ExpCurveDef::linear(1_000_000.0);
    let mut stamina = SkillDef::new("stamina");
    stamina.max_ranks = 100;
    endurance.skills.push(stamina);
    progression.register_category(endurance);
    progression
}

#[test]
fn parallel_grants_lose_nothing() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let progression = progression(dir.path());
    let player = Uuid::new_v4();

    thread::scope(|scope| {
        for _ in 0..THREADS {
            scope.spawn(|| {
                for _ in 0..50 {
                    progression.grant_experience(player, "endurance", 1.0);
                }
            });
        }
    });

    let progress = progression.experience().progress_of(player, "endurance").unwrap();
    assert!((progress.current_exp - 400.0).abs() < 1e-9);
    Ok(())
}

#[test]
fn parallel_activations_never_overspend() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let progression = progression(dir.path());
    let player = Uuid::new_v4();
    progression.skills().grant_points(player, "endurance", 5);

    let successes: usize = thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| scope.spawn(|| usize::from(progression.skills().activate(player, "endurance", "stamina"))))
            .collect();
        handles.into_iter().map(|handle| handle.join().unwrap_or(0)).sum()
    });

    assert_eq!(successes, 5);
    assert_eq!(progression.skills().skill_rank(player, "endurance", "stamina"), 5);
    assert_eq!(progression.skills().available_points(player, "endurance"), 0);
    Ok(())
}

#[test]
fn walk_tracking_is_per_player() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let progression = progression(dir.path());
    let players: Vec<Uuid> = (0..THREADS).map(|_| Uuid::new_v4()).collect();

    thread::scope(|scope| {
        for player in &players {
            let progression = &progression;
            scope.spawn(move || {
                for step in 0..=20 {
                    progression.record_movement(*player, (f64::from(step) * 10.0, 0.0, 0.0));
                }
            });
        }
    });

    for player in &players {
        // 200 units walked in capped 10-unit steps
        let progress = progression.experience().progress_of(*player, "exploration").unwrap();
        assert!((progress.current_exp - 4.0).abs() < 1e-9);
        assert!(progression.on_player_disconnect(*player));
    }
    assert_eq!(progression.walk().tracked(), 0);
    Ok(())
}

#[test]
fn disconnects_racing_grants_lose_nothing() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let progression = progression(dir.path());
    let player = Uuid::new_v4();

    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..100 {
                    progression.grant_experience(player, "endurance", 1.0);
                }
            });
        }
        scope.spawn(|| {
            for _ in 0..50 {
                progression.on_player_disconnect(player);
                thread::yield_now();
            }
        });
    });

    let progress = progression.experience().progress_of(player, "endurance").unwrap();
    assert!((progress.current_exp - 400.0).abs() < 1e-9);
    assert!(progression.on_player_disconnect(player));
    let reopened = Progression::open(dir.path());
    let progress = reopened.experience().progress_of(player, "endurance").unwrap();
    assert!((progress.current_exp - 400.0).abs() < 1e-9);
    Ok(())
}
