#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
//! ** Ascend **
//! Admin console for the progression engine

use ascend_engine::packs::MagicPack;
use ascend_engine::{ASCEND_VERSION, Progression, data_paths, run_repl};

use anyhow::Result;
use colored::Colorize;

use log::info;

fn main() -> Result<()> {
    env_logger::init();
    let root = data_paths::data_root();
    info!("Start: opening progression data at {}", root.display());
    let progression = Progression::open(root);
    if std::env::var_os("ASCEND_MAGIC").is_some() {
        progression.install_pack(MagicPack);
    }

    println!(
        "{:^72}",
        format!("ASCEND {ASCEND_VERSION}: PROGRESSION ADMIN").bright_yellow().underline()
    );
    println!(
        "\n{} categories, {} actions loaded from {}",
        progression.categories().ids().len().to_string().bold(),
        progression.actions().len().to_string().bold(),
        root.display().to_string().bright_blue()
    );
    println!("{}\n", "Type 'help' for commands.".dimmed());

    run_repl(&progression)
}
