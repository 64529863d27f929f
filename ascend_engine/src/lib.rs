#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]

pub const ASCEND_VERSION: &str = env!("CARGO_PKG_VERSION");

// Core modules
pub mod api;
pub mod command;
pub mod config;
pub mod data_paths;
pub mod defaults;
pub mod error;
pub mod experience;
pub mod migrations;
pub mod modifiers;
pub mod packs;
pub mod progress;
pub mod quest;
pub mod registry;
pub mod repl;
pub mod skills;
pub mod store;
pub mod walk;

// Re-exports for convenience
pub use api::Progression;
pub use error::{ProgressionError, ProgressionResult};
pub use experience::{ClaimOutcome, GrantOutcome};
pub use progress::{CategoryProgress, PlayerRecord};
pub use quest::{Inventory, MemoryInventory, NoInventory, QuestOutcome};
pub use repl::run_repl;
