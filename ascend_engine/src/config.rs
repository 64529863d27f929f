//! Layered configuration service.
//!
//! Every entity starts from its built-in default, has the matching file from
//! the config directory merged over it, and is written straight back so the
//! files on disk always show the effective configuration. Unreadable files are
//! logged and ignored; loading never fails.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use anyhow::{Context, Result};
use ascend_data::{
    ActionDef, ActionSetDef, ActionSetPatch, CategoryDef, CategoryPatch, GlobalSettings, HarvestOverrides, MainConfig, Merge,
    validate_action_set, validate_category,
};
use log::{debug, info, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::defaults;
use crate::error::ProgressionError;
use crate::migrations::{self, MigrationReport, json_files};

pub const MAIN_FILE: &str = "main.json";
pub const HARVEST_FILE: &str = "farming_harvest.json";
pub const CATEGORY_DIR: &str = "categories";
pub const ACTION_DIR: &str = "actions";
/// Category that receives `harvest_<block>` overrides.
pub const HARVEST_CATEGORY: &str = "farming";

/// Live global settings, swapped on reload.
#[derive(Debug, Default)]
pub struct Settings {
    inner: RwLock<GlobalSettings>,
}

impl Settings {
    pub fn new(settings: GlobalSettings) -> Self {
        Self {
            inner: RwLock::new(settings),
        }
    }

    pub fn get(&self) -> GlobalSettings {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn replace(&self, settings: GlobalSettings) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = settings;
    }
}

/// Effective configuration after merging defaults with files.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoadedConfig {
    pub main: MainConfig,
    pub categories: Vec<CategoryDef>,
    pub action_sets: Vec<ActionSetDef>,
    pub harvest: HarvestOverrides,
    pub migrations: MigrationReport,
}

impl LoadedConfig {
    pub fn category(&self, id: &str) -> Option<&CategoryDef> {
        self.categories.iter().find(|cat| cat.id == id)
    }

    pub fn action_set(&self, category: &str) -> Option<&ActionSetDef> {
        self.action_sets.iter().find(|set| set.category == category)
    }
}

#[derive(Debug, Clone)]
pub struct ConfigService {
    dir: PathBuf,
}

impl ConfigService {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Run migrations, merge every file over the defaults, write the result back.
    pub fn load(&self) -> LoadedConfig {
        let migrations = migrations::run(&self.dir);

        let main = merge_file(defaults::main_config(), &self.dir.join(MAIN_FILE));
        let categories = self.load_categories();
        let mut action_sets = self.load_action_sets();
        let harvest = merge_file(defaults::harvest_overrides(), &self.dir.join(HARVEST_FILE));
        apply_harvest_overrides(&mut action_sets, &harvest);

        let loaded = LoadedConfig {
            main,
            categories,
            action_sets,
            harvest,
            migrations,
        };
        self.save(&loaded);
        report_validation(&loaded);
        info!(
            "loaded {} categories and {} action sets from {}",
            loaded.categories.len(),
            loaded.action_sets.len(),
            self.dir.display()
        );
        loaded
    }

    fn load_categories(&self) -> Vec<CategoryDef> {
        let dir = self.dir.join(CATEGORY_DIR);
        let mut categories: Vec<CategoryDef> = defaults::categories()
            .into_iter()
            .map(|cat| {
                let id = cat.id.clone();
                let path = dir.join(format!("{id}.json"));
                let mut merged = merge_file(cat, &path);
                pin_id(&mut merged.id, &id, &path);
                merged
            })
            .collect();

        for path in json_files(&dir) {
            let Some(stem) = file_stem(&path) else { continue };
            if categories.iter().any(|cat| cat.id == stem) {
                continue;
            }
            if let Some(patch) = read_patch::<CategoryPatch>(&path) {
                let mut custom = CategoryDef::new(stem.clone()).merged(&patch);
                pin_id(&mut custom.id, &stem, &path);
                debug!("loaded custom category '{}' from {}", custom.id, path.display());
                categories.push(custom);
            }
        }
        categories
    }

    fn load_action_sets(&self) -> Vec<ActionSetDef> {
        let dir = self.dir.join(ACTION_DIR);
        let mut sets: Vec<ActionSetDef> = defaults::action_sets()
            .into_iter()
            .map(|set| {
                let category = set.category.clone();
                let path = dir.join(format!("{category}.json"));
                let mut merged = merge_file(set, &path);
                pin_id(&mut merged.category, &category, &path);
                merged
            })
            .collect();

        for path in json_files(&dir) {
            let Some(stem) = file_stem(&path) else { continue };
            if sets.iter().any(|set| set.category == stem) {
                continue;
            }
            if let Some(patch) = read_patch::<ActionSetPatch>(&path) {
                let mut custom = ActionSetDef::new(stem.clone()).merged(&patch);
                pin_id(&mut custom.category, &stem, &path);
                debug!("loaded custom action set '{}' from {}", custom.category, path.display());
                sets.push(custom);
            }
        }
        sets
    }

    /// Write the effective configuration back to disk. Failures are logged only.
    pub fn save(&self, config: &LoadedConfig) {
        let mut failures = 0;
        let mut write = |path: PathBuf, result: Result<()>| {
            if let Err(err) = result {
                warn!("could not save {}: {err:#}", path.display());
                failures += 1;
            }
        };

        let main_path = self.dir.join(MAIN_FILE);
        write(main_path.clone(), save_json(&main_path, &config.main));
        for cat in &config.categories {
            let path = self.dir.join(CATEGORY_DIR).join(format!("{}.json", cat.id));
            write(path.clone(), save_json(&path, cat));
        }
        for set in &config.action_sets {
            let path = self.dir.join(ACTION_DIR).join(format!("{}.json", set.category));
            write(path.clone(), save_json(&path, set));
        }
        let harvest_path = self.dir.join(HARVEST_FILE);
        write(harvest_path.clone(), save_json(&harvest_path, &config.harvest));

        if failures > 0 {
            warn!("{failures} config file(s) could not be written");
        }
    }
}

/// Merge the patch stored at `path` onto `base`, if one is readable.
fn merge_file<T>(base: T, path: &Path) -> T
where
    T: Merge,
    T::Patch: DeserializeOwned,
{
    match read_patch::<T::Patch>(path) {
        Some(patch) => base.merged(&patch),
        None => base,
    }
}

/// Files are keyed by their name; an id inside the file cannot rename the entity.
fn pin_id(id: &mut String, expected: &str, path: &Path) {
    if id.as_str() != expected {
        warn!("{} declares id '{id}', keeping '{expected}' from the file name", path.display());
        *id = expected.to_string();
    }
}

/// Read an override file, logging and discarding parse failures.
fn read_patch<T: DeserializeOwned>(path: &Path) -> Option<T> {
    match try_read_patch(path) {
        Ok(patch) => patch,
        Err(err) => {
            warn!("{err}; using defaults");
            None
        },
    }
}

/// Read an override file. Missing files are `Ok(None)`.
///
/// # Errors
/// Returns [`ProgressionError::ConfigParse`] when the file exists but cannot be read or parsed.
pub fn try_read_patch<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, ProgressionError> {
    if !path.exists() {
        return Ok(None);
    }
    let parse_err = |message: String| ProgressionError::ConfigParse {
        path: path.to_path_buf(),
        message,
    };
    let raw = fs::read_to_string(path).map_err(|err| parse_err(err.to_string()))?;
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|err| parse_err(err.to_string()))
}

fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let text = serde_json::to_string_pretty(value).with_context(|| format!("serializing {}", path.display()))?;
    fs::write(path, text).with_context(|| format!("writing {}", path.display()))
}

fn file_stem(path: &Path) -> Option<String> {
    path.file_stem().and_then(|stem| stem.to_str()).map(str::to_string)
}

/// Set or add `harvest_<block>` in the farming action set for every override.
pub fn apply_harvest_overrides(sets: &mut Vec<ActionSetDef>, harvest: &HarvestOverrides) {
    if harvest.overrides.is_empty() {
        return;
    }
    if !sets.iter().any(|set| set.category == HARVEST_CATEGORY) {
        sets.push(ActionSetDef::new(HARVEST_CATEGORY));
    }
    let Some(farming) = sets.iter_mut().find(|set| set.category == HARVEST_CATEGORY) else {
        return;
    };
    for (block, exp) in &harvest.overrides {
        let action_id = format!("harvest_{block}");
        match farming.action_mut(&action_id) {
            Some(action) => action.exp = *exp,
            None => farming.actions.push(ActionDef {
                action_id,
                exp: *exp,
                difficulty_factor: None,
            }),
        }
    }
}

fn report_validation(config: &LoadedConfig) {
    let ids: Vec<&str> = config.categories.iter().map(|cat| cat.id.as_str()).collect();
    for cat in &config.categories {
        for err in validate_category(cat) {
            warn!("config: {err}");
        }
    }
    for set in &config.action_sets {
        for err in validate_action_set(set, ids.iter().copied()) {
            warn!("config: {err}");
        }
    }
}
