//! Public entry point.
//!
//! [`Progression`] is built once per data root and owns every service. Hosts
//! feed it actions, movement and lifecycle events; consumers read levels,
//! skills and modifiers from it.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use ascend_data::{CategoryDef, MainConfig};
use log::{debug, info, warn};
use uuid::Uuid;

use crate::config::{ConfigService, LoadedConfig, Settings};
use crate::data_paths::{self, config_dir, player_data_dir};
use crate::error::{ProgressionError, ProgressionResult};
use crate::experience::{ExperienceEngine, GrantOutcome};
use crate::modifiers::ModifierAggregator;
use crate::packs::{FeaturePack, PackRegistry};
use crate::quest::{Inventory, NoInventory, QuestGate};
use crate::registry::{ActionMapping, ActionRegistry, CategoryRegistry};
use crate::skills::SkillEconomy;
use crate::store::ProgressionStore;
use crate::walk::{EXPLORE_ACTION, Position, WalkTracker};

/// Categories and actions registered at runtime, replayed after every reload.
#[derive(Debug, Default)]
struct RuntimeRegistrations {
    categories: Vec<CategoryDef>,
    actions: Vec<ActionMapping>,
}

#[derive(Debug)]
pub struct Progression {
    root: PathBuf,
    config: ConfigService,
    main: Mutex<MainConfig>,
    settings: Arc<Settings>,
    categories: Arc<CategoryRegistry>,
    actions: Arc<ActionRegistry>,
    store: Arc<ProgressionStore>,
    experience: ExperienceEngine,
    skills: SkillEconomy,
    modifiers: ModifierAggregator,
    quests: QuestGate,
    walk: WalkTracker,
    packs: PackRegistry,
    runtime: Mutex<RuntimeRegistrations>,
}

impl Progression {
    /// Open the engine rooted at `root` with no inventory collaborator.
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self::with_inventory(root, Arc::new(NoInventory))
    }

    /// Open the engine at the resolved default data root.
    pub fn open_default() -> Self {
        Self::open(data_paths::data_root())
    }

    /// Open the engine rooted at `root`, checking quest items against `inventory`.
    pub fn with_inventory(root: impl Into<PathBuf>, inventory: Arc<dyn Inventory>) -> Self {
        let root = root.into();
        let config = ConfigService::new(config_dir(&root));
        let loaded = config.load();

        let settings = Arc::new(Settings::new(loaded.main.global_settings.clone()));
        let categories = Arc::new(CategoryRegistry::new());
        let actions = Arc::new(ActionRegistry::new());
        let store = Arc::new(ProgressionStore::new(player_data_dir(&root)));
        apply_loaded(&loaded, &categories, &actions);

        let experience = ExperienceEngine::new(
            Arc::clone(&categories),
            Arc::clone(&actions),
            Arc::clone(&store),
            Arc::clone(&settings),
        );
        let skills = SkillEconomy::new(Arc::clone(&categories), Arc::clone(&store), Arc::clone(&settings));
        let modifiers = ModifierAggregator::new(Arc::clone(&categories), Arc::clone(&store));
        let quests = QuestGate::new(Arc::clone(&categories), Arc::clone(&store), inventory);

        info!("progression engine ready at {}", root.display());
        Self {
            root,
            config,
            main: Mutex::new(loaded.main),
            settings,
            categories,
            actions,
            store,
            experience,
            skills,
            modifiers,
            quests,
            walk: WalkTracker::new(),
            packs: PackRegistry::new(),
            runtime: Mutex::new(RuntimeRegistrations::default()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn experience(&self) -> &ExperienceEngine {
        &self.experience
    }

    pub fn skills(&self) -> &SkillEconomy {
        &self.skills
    }

    pub fn modifiers(&self) -> &ModifierAggregator {
        &self.modifiers
    }

    pub fn quests(&self) -> &QuestGate {
        &self.quests
    }

    pub fn store(&self) -> &ProgressionStore {
        &self.store
    }

    pub fn categories(&self) -> &CategoryRegistry {
        &self.categories
    }

    pub fn actions(&self) -> &ActionRegistry {
        &self.actions
    }

    pub fn walk(&self) -> &WalkTracker {
        &self.walk
    }

    pub fn packs(&self) -> &PackRegistry {
        &self.packs
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Main config as of the last load.
    pub fn main_config(&self) -> MainConfig {
        self.main.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Register (or replace) a category. Survives config reloads.
    pub fn register_category(&self, category: CategoryDef) {
        info!("registered category '{}'", category.id);
        let mut runtime = self.runtime.lock().unwrap_or_else(PoisonError::into_inner);
        runtime.categories.retain(|existing| existing.id != category.id);
        runtime.categories.push(category.clone());
        self.categories.register(category);
    }

    /// Map an action to a category, with an optional difficulty factor (1.0 when
    /// absent). Survives config reloads.
    pub fn register_action(&self, action_id: &str, category_id: &str, exp: f64, difficulty_factor: Option<f64>) {
        debug!("registered action '{action_id}' -> {category_id} ({exp})");
        let mut runtime = self.runtime.lock().unwrap_or_else(PoisonError::into_inner);
        self.actions.register(action_id, category_id, exp, difficulty_factor);
        runtime.actions.retain(|existing| existing.action_id != action_id);
        if let Some(mapping) = self.actions.get(action_id) {
            runtime.actions.push(mapping);
        }
    }

    pub fn install_pack<P: FeaturePack + 'static>(&self, pack: P) -> bool {
        self.packs.install(pack, self)
    }

    pub fn grant_experience(&self, player: Uuid, category_id: &str, amount: f64) -> GrantOutcome {
        self.experience.grant(player, category_id, amount)
    }

    /// Like [`Self::grant_experience`], but reports bad input as an error.
    ///
    /// # Errors
    /// Returns [`ProgressionError::UnknownCategory`] or
    /// [`ProgressionError::InvalidAmount`] when the grant was rejected for those reasons.
    pub fn try_grant_experience(&self, player: Uuid, category_id: &str, amount: f64) -> ProgressionResult<GrantOutcome> {
        match self.experience.grant(player, category_id, amount) {
            GrantOutcome::UnknownCategory => Err(ProgressionError::UnknownCategory(category_id.to_string())),
            GrantOutcome::InvalidAmount => Err(ProgressionError::InvalidAmount(amount)),
            outcome => Ok(outcome),
        }
    }

    pub fn get_player_level(&self, player: Uuid, category_id: &str) -> u32 {
        self.experience.level_of(player, category_id)
    }

    pub fn has_skill(&self, player: Uuid, category_id: &str, skill_id: &str) -> bool {
        self.skills.has_skill(player, category_id, skill_id)
    }

    pub fn get_modifier_value(&self, player: Uuid, modifier_id: &str) -> f64 {
        self.modifiers.value(player, modifier_id)
    }

    pub fn has_category(&self, category_id: &str) -> bool {
        self.categories.has(category_id)
    }

    pub fn has_action(&self, action_id: &str) -> bool {
        self.actions.has(action_id)
    }

    /// An action happened `quantity` times.
    pub fn record_action(&self, player: Uuid, action_id: &str, quantity: u32) -> GrantOutcome {
        self.experience.grant_action(player, action_id, quantity)
    }

    /// A player moved; grants `explore_steps` for every full step walked.
    pub fn record_movement(&self, player: Uuid, position: Position) -> u32 {
        let steps = self.walk.update(player, position);
        if steps > 0 {
            self.experience.grant_action(player, EXPLORE_ACTION, steps);
        }
        steps
    }

    /// Load (or create) the player's record and fill in every category.
    pub fn on_player_ready(&self, player: Uuid) {
        self.experience.initialize_player(player);
        debug!("{player} ready");
    }

    /// Flush and evict the player's record, forget their walk state.
    pub fn on_player_disconnect(&self, player: Uuid) -> bool {
        self.walk.remove(player);
        self.store.unload(player)
    }

    /// Flush every cached record. Returns the number of failed saves.
    pub fn save_all(&self) -> usize {
        self.store.save_all()
    }

    /// Final flush before the host stops.
    pub fn shutdown(&self) -> usize {
        let failures = self.save_all();
        if failures > 0 {
            warn!("{failures} player record(s) could not be saved on shutdown");
        }
        info!("progression engine shut down");
        failures
    }

    /// Re-read configuration from disk, then replay runtime registrations.
    pub fn reload_config(&self) -> LoadedConfig {
        let loaded = self.config.load();
        self.settings.replace(loaded.main.global_settings.clone());
        apply_loaded(&loaded, &self.categories, &self.actions);

        let runtime = self.runtime.lock().unwrap_or_else(PoisonError::into_inner);
        for category in &runtime.categories {
            self.categories.register(category.clone());
        }
        for mapping in &runtime.actions {
            self.actions.register(
                &mapping.action_id,
                &mapping.category_id,
                mapping.base_exp,
                Some(mapping.difficulty_factor),
            );
        }
        drop(runtime);

        *self.main.lock().unwrap_or_else(PoisonError::into_inner) = loaded.main.clone();
        info!("configuration reloaded");
        loaded
    }
}

fn apply_loaded(loaded: &LoadedConfig, categories: &CategoryRegistry, actions: &ActionRegistry) {
    categories.load_from(loaded.categories.iter().cloned());
    actions.load_from(&loaded.action_sets);
}
