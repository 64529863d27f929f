//! Additive config migrations.
//!
//! A migration inserts one missing action into an existing action file. It never
//! edits or removes anything already present, so running it again is harmless.
//! Applied ids are tracked in `migrations.json` next to the config files.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use ascend_data::AppliedMigrations;
use log::{info, warn};
use serde_json::{Value, json};

pub const SIDECAR_FILE: &str = "migrations.json";

/// One known migration: add `action_id` to `actions/<category>.json` when missing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Migration {
    pub id: &'static str,
    pub category: &'static str,
    pub action_id: &'static str,
    pub exp: f64,
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        id: "add_explore_steps",
        category: "exploration",
        action_id: "explore_steps",
        exp: 2.0,
    },
    Migration {
        id: "add_discover_zone",
        category: "exploration",
        action_id: "discover_zone",
        exp: 15.0,
    },
];

/// What a migration run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub fresh_install: bool,
    pub applied: Vec<String>,
    pub failed: Vec<String>,
}

/// Run every unapplied migration against `config_dir`.
pub fn run(config_dir: &Path) -> MigrationReport {
    run_with(config_dir, MIGRATIONS)
}

/// Run the given migrations against `config_dir`.
pub fn run_with(config_dir: &Path, migrations: &[Migration]) -> MigrationReport {
    let sidecar = config_dir.join(SIDECAR_FILE);
    let mut report = MigrationReport::default();

    if !sidecar.exists() && !has_entity_files(config_dir) {
        report.fresh_install = true;
        let applied = AppliedMigrations {
            applied: migrations.iter().map(|m| m.id.to_string()).collect(),
        };
        if let Err(err) = write_sidecar(&sidecar, &applied) {
            warn!("could not record migrations for fresh install: {err:#}");
        }
        info!("fresh install: marked {} migration(s) as applied", applied.applied.len());
        return report;
    }

    let mut applied = match read_sidecar(&sidecar) {
        Ok(applied) => applied,
        Err(err) => {
            warn!("ignoring unreadable {}: {err:#}", sidecar.display());
            AppliedMigrations::default()
        },
    };

    for migration in migrations {
        if applied.contains(migration.id) {
            continue;
        }
        match apply(config_dir, migration) {
            Ok(changed) => {
                if changed {
                    info!("migration '{}' added {}", migration.id, migration.action_id);
                }
                applied.applied.push(migration.id.to_string());
                report.applied.push(migration.id.to_string());
            },
            Err(err) => {
                warn!("migration '{}' failed, will retry next start: {err:#}", migration.id);
                report.failed.push(migration.id.to_string());
            },
        }
    }

    if !report.applied.is_empty() || !sidecar.exists() {
        if let Err(err) = write_sidecar(&sidecar, &applied) {
            warn!("could not update {}: {err:#}", sidecar.display());
        }
    }
    report
}

fn has_entity_files(config_dir: &Path) -> bool {
    ["categories", "actions"]
        .iter()
        .any(|sub| !json_files(&config_dir.join(sub)).is_empty())
}

/// `*.json` files directly inside `dir`, sorted. Missing directories yield nothing.
pub(crate) fn json_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    files
}

/// Insert the migration's action when the action file exists and lacks it.
fn apply(config_dir: &Path, migration: &Migration) -> Result<bool> {
    let path = config_dir.join("actions").join(format!("{}.json", migration.category));
    if !path.exists() {
        // defaults will provide the action on the next merge
        return Ok(false);
    }
    let raw = fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    let mut doc: Value = serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;

    let Some(root) = doc.as_object_mut() else {
        bail!("{} is not a JSON object", path.display());
    };
    let actions = root.entry("actions").or_insert_with(|| Value::Array(Vec::new()));
    let Some(list) = actions.as_array_mut() else {
        bail!("'actions' in {} is not a list", path.display());
    };
    let present = list
        .iter()
        .any(|entry| entry.get("action_id").and_then(Value::as_str) == Some(migration.action_id));
    if present {
        return Ok(false);
    }
    list.push(json!({ "action_id": migration.action_id, "exp": migration.exp }));

    let text = serde_json::to_string_pretty(&doc)?;
    fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;
    Ok(true)
}

fn read_sidecar(path: &Path) -> Result<AppliedMigrations> {
    if !path.exists() {
        return Ok(AppliedMigrations::default());
    }
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn write_sidecar(path: &Path, applied: &AppliedMigrations) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let text = serde_json::to_string_pretty(applied)?;
    fs::write(path, text).with_context(|| format!("writing {}", path.display()))
}

/// Ids already recorded in the sidecar.
pub fn applied_ids(config_dir: &Path) -> Vec<String> {
    read_sidecar(&config_dir.join(SIDECAR_FILE))
        .map(|applied| applied.applied)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_actions(dir: &Path, category: &str, body: &str) -> Result<()> {
        let actions = dir.join("actions");
        fs::create_dir_all(&actions)?;
        fs::write(actions.join(format!("{category}.json")), body)?;
        Ok(())
    }

    #[test]
    fn fresh_install_marks_everything_applied() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let report = run(dir.path());
        assert!(report.fresh_install);
        assert_eq!(applied_ids(dir.path()), vec!["add_explore_steps", "add_discover_zone"]);
        Ok(())
    }

    #[test]
    fn existing_install_gets_missing_actions_once() -> Result<()> {
        let dir = tempfile::tempdir()?;
        write_actions(
            dir.path(),
            "exploration",
            r#"{ "category": "exploration", "actions": [ { "action_id": "discover_zone", "exp": 99.0 } ] }"#,
        )?;

        let report = run(dir.path());
        assert!(!report.fresh_install);
        assert_eq!(report.applied.len(), 2);

        let raw = fs::read_to_string(dir.path().join("actions/exploration.json"))?;
        let doc: Value = serde_json::from_str(&raw)?;
        let actions = doc["actions"].as_array().unwrap();
        assert_eq!(actions.len(), 2);
        // existing entries are never modified
        assert_eq!(actions[0]["exp"], json!(99.0));
        assert_eq!(actions[1]["action_id"], json!("explore_steps"));

        let again = run(dir.path());
        assert!(again.applied.is_empty());
        let raw_again = fs::read_to_string(dir.path().join("actions/exploration.json"))?;
        assert_eq!(raw, raw_again);
        Ok(())
    }

    #[test]
    fn broken_file_leaves_migration_unapplied() -> Result<()> {
        let dir = tempfile::tempdir()?;
        write_actions(dir.path(), "exploration", "{ not json")?;
        let report = run(dir.path());
        assert_eq!(report.failed.len(), 2);
        assert!(applied_ids(dir.path()).is_empty());
        Ok(())
    }
}
